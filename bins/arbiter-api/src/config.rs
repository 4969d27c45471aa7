// Judge service configuration, read from the environment
use anyhow::{bail, Context, Result};

/// Which execution provider integration to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Free public multi-language runner (Piston-compatible API)
    Piston,
    /// Paid alternative with a flat response shape
    OneCompiler,
}

impl ProviderKind {
    pub fn from_str(s: &str) -> Option<ProviderKind> {
        match s.to_lowercase().as_str() {
            "piston" => Some(ProviderKind::Piston),
            "onecompiler" => Some(ProviderKind::OneCompiler),
            _ => None,
        }
    }
}

/// Default compile stage ceiling - compilers get more slack than runs
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 10_000;
/// Default run stage ceiling per test case
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 3_000;
/// Submissions larger than this are rejected before any network call
pub const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub provider: ProviderKind,
    pub provider_url: String,
    pub provider_api_key: Option<String>,
    pub compile_timeout_ms: u64,
    pub run_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults suitable for local development
    pub fn from_env() -> Result<Self> {
        let bind_addr =
            std::env::var("ARBITER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let provider_str =
            std::env::var("EXECUTOR_PROVIDER").unwrap_or_else(|_| "piston".to_string());
        let provider = match ProviderKind::from_str(&provider_str) {
            Some(p) => p,
            None => bail!(
                "Invalid EXECUTOR_PROVIDER '{}' (valid: piston, onecompiler)",
                provider_str
            ),
        };

        let provider_url = std::env::var("EXECUTOR_URL")
            .unwrap_or_else(|_| "https://emkc.org/api/v2/piston".to_string());

        let provider_api_key = std::env::var("EXECUTOR_API_KEY").ok();
        if provider == ProviderKind::OneCompiler && provider_api_key.is_none() {
            bail!("EXECUTOR_API_KEY is required when EXECUTOR_PROVIDER=onecompiler");
        }

        let compile_timeout_ms = env_u64("COMPILE_TIMEOUT_MS", DEFAULT_COMPILE_TIMEOUT_MS)?;
        let run_timeout_ms = env_u64("RUN_TIMEOUT_MS", DEFAULT_RUN_TIMEOUT_MS)?;

        Ok(Self {
            bind_addr,
            provider,
            provider_url,
            provider_api_key,
            compile_timeout_ms,
            run_timeout_ms,
        })
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{} must be an integer, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
