//! Configuration module for the launchpad orchestrator
//!
//! Loaded from an optional TOML file layered with `LAUNCHPAD__`-prefixed
//! environment variables (e.g. `LAUNCHPAD__RPC__URL`), after `.env` is read.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::str::FromStr;
use std::time::Duration;

use crate::engine::EngineSettings;
use crate::ledger::RpcLedgerConfig;
use crate::pda::{AddressDeriver, METADATA_PROGRAM_ID};
use crate::readiness::ReadinessPolicy;
use crate::tx_builder::{ComputeBudget, LaunchpadProgram};
use crate::types::TokenProgram;

pub const ENV_PREFIX: &str = "LAUNCHPAD";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    pub program: ProgramConfig,

    pub wallet: WalletConfig,

    #[serde(default)]
    pub transaction: TransactionConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// processed | confirmed | finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    #[serde(default = "default_confirm_poll_interval")]
    pub confirm_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Launchpad program id
    pub program_id: String,

    #[serde(default = "default_metadata_program_id")]
    pub metadata_program_id: String,

    /// Overrides the derived config singleton
    #[serde(default)]
    pub config_address: Option<String>,

    #[serde(default = "default_quote_mint")]
    pub quote_mint: String,

    #[serde(default = "default_base_token_program")]
    pub base_token_program: TokenProgram,

    #[serde(default = "default_quote_token_program")]
    pub quote_token_program: TokenProgram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to the wallet keypair file
    pub keypair_path: String,

    /// Path to the delegated swap authority keypair file
    pub swap_authority_keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,

    /// Micro-lamports per compute unit
    #[serde(default)]
    pub compute_unit_price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_readiness_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_readiness_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

// Default value functions
fn default_rpc_url() -> String {
    "http://127.0.0.1:8899".to_string()
}
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_rpc_timeout() -> u64 { 30 }
fn default_confirm_timeout() -> u64 { 60 }
fn default_confirm_poll_interval() -> u64 { 500 }
fn default_metadata_program_id() -> String {
    METADATA_PROGRAM_ID.to_string()
}
fn default_quote_mint() -> String {
    spl_token::native_mint::id().to_string()
}
fn default_base_token_program() -> TokenProgram { TokenProgram::Extended }
fn default_quote_token_program() -> TokenProgram { TokenProgram::Legacy }
fn default_compute_unit_limit() -> u32 { 400_000 }
fn default_readiness_initial_delay() -> u64 { 200 }
fn default_readiness_max_delay() -> u64 { 5_000 }
fn default_readiness_timeout() -> u64 { 60 }
fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            commitment: default_commitment(),
            timeout_secs: default_rpc_timeout(),
            confirm_timeout_secs: default_confirm_timeout(),
            confirm_poll_interval_ms: default_confirm_poll_interval(),
        }
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            compute_unit_limit: default_compute_unit_limit(),
            compute_unit_price: 0,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_readiness_initial_delay(),
            max_delay_ms: default_readiness_max_delay(),
            timeout_secs: default_readiness_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Validated, typed view of the `program` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSettings {
    pub program_id: Pubkey,
    pub metadata_program_id: Pubkey,
    pub config_address: Pubkey,
    pub quote_mint: Pubkey,
    pub base_token_program: TokenProgram,
    pub quote_token_program: TokenProgram,
}

impl Config {
    /// Load configuration: `.env`, then the TOML file if present, then
    /// `LAUNCHPAD__*` environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(path)
    }

    /// Same as [`Config::load`] without reading `.env`
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {path}"))?;
        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn commitment(&self) -> anyhow::Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.rpc.commitment)
            .map_err(|_| anyhow::anyhow!("Invalid commitment level: {}", self.rpc.commitment))
    }

    /// Check all values and resolve addresses.
    pub fn validate(&self) -> anyhow::Result<ProgramSettings> {
        if self.rpc.url.trim().is_empty() {
            bail!("rpc.url must not be empty");
        }
        if self.rpc.timeout_secs == 0 || self.rpc.confirm_timeout_secs == 0 {
            bail!("rpc timeouts must be greater than 0");
        }
        self.commitment()?;
        if self.readiness.initial_delay_ms == 0 {
            bail!("readiness.initial_delay_ms must be greater than 0");
        }
        if self.readiness.max_delay_ms < self.readiness.initial_delay_ms {
            bail!("readiness.max_delay_ms must be >= readiness.initial_delay_ms");
        }
        if self.readiness.timeout_secs == 0 {
            bail!("readiness.timeout_secs must be greater than 0");
        }

        let program_id = parse_pubkey("program.program_id", &self.program.program_id)?;
        let metadata_program_id =
            parse_pubkey("program.metadata_program_id", &self.program.metadata_program_id)?;
        let quote_mint = parse_pubkey("program.quote_mint", &self.program.quote_mint)?;
        let config_address = match &self.program.config_address {
            Some(address) => parse_pubkey("program.config_address", address)?,
            None => AddressDeriver::new(program_id).config().0,
        };

        Ok(ProgramSettings {
            program_id,
            metadata_program_id,
            config_address,
            quote_mint,
            base_token_program: self.program.base_token_program,
            quote_token_program: self.program.quote_token_program,
        })
    }

    pub fn rpc_ledger_config(&self) -> anyhow::Result<RpcLedgerConfig> {
        Ok(RpcLedgerConfig {
            url: self.rpc.url.clone(),
            commitment: self.commitment()?,
            request_timeout: Duration::from_secs(self.rpc.timeout_secs),
            confirm_timeout: Duration::from_secs(self.rpc.confirm_timeout_secs),
            confirm_poll_interval: Duration::from_millis(self.rpc.confirm_poll_interval_ms),
        })
    }

    pub fn engine_settings(&self) -> anyhow::Result<EngineSettings> {
        let program = self.validate()?;
        let deriver = AddressDeriver::new(program.program_id)
            .with_metadata_program(program.metadata_program_id);
        Ok(EngineSettings {
            program: LaunchpadProgram::new(
                deriver,
                program.base_token_program,
                program.quote_token_program,
            ),
            config_address: program.config_address,
            quote_mint: program.quote_mint,
            compute_budget: ComputeBudget {
                unit_limit: self.transaction.compute_unit_limit,
                unit_price: self.transaction.compute_unit_price,
            },
            readiness: ReadinessPolicy {
                initial_delay: Duration::from_millis(self.readiness.initial_delay_ms),
                max_delay: Duration::from_millis(self.readiness.max_delay_ms),
                timeout: Duration::from_secs(self.readiness.timeout_secs),
            },
        })
    }
}

fn parse_pubkey(field: &str, value: &str) -> anyhow::Result<Pubkey> {
    Pubkey::from_str(value.trim())
        .with_context(|| format!("{field} is not a valid address: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[program]
program_id = "11111111111111111111111111111112"

[wallet]
keypair_path = "wallet.json"
swap_authority_keypair_path = "authority.json"
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.rpc.url, "http://127.0.0.1:8899");
        assert_eq!(config.transaction.compute_unit_limit, 400_000);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.program.base_token_program, TokenProgram::Extended);

        let settings = config.validate().unwrap();
        assert_eq!(settings.quote_mint, spl_token::native_mint::id());
        assert_eq!(
            settings.config_address,
            AddressDeriver::new(settings.program_id).config().0
        );
    }

    #[test]
    fn test_config_address_override() {
        let override_addr = Pubkey::new_unique();
        let contents = MINIMAL.replace(
            "[wallet]",
            &format!("config_address = \"{override_addr}\"\n\n[wallet]"),
        );
        let file = write_config(&contents);
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.validate().unwrap().config_address, override_addr);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config(&MINIMAL.replace("11111111111111111111111111111112", "nope"));
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("program.program_id"));

        let file = write_config(&format!("{MINIMAL}\n[rpc]\ncommitment = \"sometimes\"\n"));
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_settings() {
        let file = write_config(&format!(
            "{MINIMAL}\n[transaction]\ncompute_unit_price = 5000\n\n[readiness]\ntimeout_secs = 5\n"
        ));
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        let settings = config.engine_settings().unwrap();
        assert_eq!(settings.compute_budget.unit_price, 5_000);
        assert_eq!(settings.readiness.timeout, Duration::from_secs(5));
        assert_eq!(
            settings.program.program_id().to_string(),
            "11111111111111111111111111111112"
        );
    }

    #[test]
    fn test_missing_required_section() {
        let file = write_config("[rpc]\nurl = \"http://localhost:8899\"\n");
        assert!(Config::load_from(file.path().to_str().unwrap()).is_err());
    }
}
