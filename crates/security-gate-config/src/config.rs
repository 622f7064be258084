// crates/security-gate-config/src/config.rs
// ============================================================================
// Module: Security Gate Configuration
// Description: Configuration loading and validation for security gate runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: security-gate-core, security-gate gate crates, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys, out-of-range values, and contradictory settings are rejected
//! rather than ignored. Sections:
//! - `[runner]`: the outer gate runner policy.
//! - `[audit]`: where gate and run events are written.
//! - `[crypto]`: a named security policy or explicit toggles.
//! - `[network]`: network gate threshold and analyzer toggles.
//! - `[testing]`: the testing gate's nested runner policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use security_gate_core::FileAuditSink;
use security_gate_core::GateAuditSink;
use security_gate_core::GateRunnerConfig;
use security_gate_core::NoopAuditSink;
use security_gate_core::StderrAuditSink;
use security_gate_crypto::CryptoGate;
use security_gate_crypto::CryptoGateConfig;
use security_gate_crypto::SecurityPolicy;
use security_gate_network::NetworkGateConfig;
use security_gate_testing::TestingGate;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "security-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SECURITY_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum per-gate timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Maximum retry count.
pub(crate) const MAX_RETRIES: u32 = 10;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for a security gate run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityGateConfig {
    /// Outer runner policy.
    #[serde(default)]
    pub runner: GateRunnerConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Crypto gate policy.
    #[serde(default)]
    pub crypto: CryptoConfig,
    /// Network gate settings.
    #[serde(default)]
    pub network: NetworkGateConfig,
    /// Testing gate nested runner policy.
    #[serde(default)]
    pub testing: GateRunnerConfig,
}

impl SecurityGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`] in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_runner("runner", &self.runner)?;
        validate_runner("testing", &self.testing)?;
        self.audit.validate()?;
        self.crypto.validate()?;
        let problems = self.network.validate();
        if let Some(problem) = problems.first() {
            return Err(ConfigError::Invalid(format!("network: {problem}")));
        }
        Ok(())
    }

    /// Builds an empty testing gate whose nested runner uses `[testing]`.
    ///
    /// Suites are code, so callers register them with
    /// [`TestingGate::add_suite`] before running the gate.
    #[must_use]
    pub fn build_testing_gate(&self) -> TestingGate {
        TestingGate::new(self.testing.clone())
    }
}

/// Validates runner timeout and retry ranges.
fn validate_runner(section: &str, runner: &GateRunnerConfig) -> Result<(), ConfigError> {
    if runner.timeout_ms == 0 || runner.timeout_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{section}.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
        )));
    }
    if runner.retries > MAX_RETRIES {
        return Err(ConfigError::Invalid(format!(
            "{section}.retries must be between 0 and {MAX_RETRIES}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    pub sink: AuditSinkKind,
    /// Log file path; required for the `file` sink.
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates the sink selection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a file sink has no usable path or
    /// another sink names one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid for the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn GateAuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let sink = FileAuditSink::new(path).map_err(|err| {
                    ConfigError::Io(format!("audit log {}: {err}", path.display()))
                })?;
                Ok(Arc::new(sink))
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        }
    }
}

// ============================================================================
// SECTION: Crypto
// ============================================================================

/// Crypto gate configuration: a named policy or explicit toggles.
///
/// # Invariants
/// - `policy` and the toggles are mutually exclusive.
/// - With neither set, the staging preset applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CryptoConfig {
    /// Security policy preset name.
    pub policy: Option<String>,
    /// Escalate advisories to errors.
    pub strict_mode: Option<bool>,
    /// Permit warnings under strict mode.
    pub allow_warnings: Option<bool>,
    /// Run the post-quantum advisory stage.
    pub quantum_resistance_check: Option<bool>,
    /// Run the derivation timing stage.
    pub timing_attack_check: Option<bool>,
}

impl CryptoConfig {
    /// Returns true when any explicit toggle is set.
    fn has_toggles(&self) -> bool {
        self.strict_mode.is_some()
            || self.allow_warnings.is_some()
            || self.quantum_resistance_check.is_some()
            || self.timing_attack_check.is_some()
    }

    /// Validates the policy name and toggle exclusivity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unknown policies or mixed forms.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.is_some() && self.has_toggles() {
            return Err(ConfigError::Invalid(
                "crypto.policy cannot be combined with explicit toggles".to_string(),
            ));
        }
        self.resolved_policy().map(|_| ())
    }

    /// Resolves the named policy, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the name is not a known preset.
    pub fn resolved_policy(&self) -> Result<Option<SecurityPolicy>, ConfigError> {
        self.policy
            .as_deref()
            .map(SecurityPolicy::from_name)
            .transpose()
            .map_err(|err| ConfigError::Invalid(format!("crypto.policy: {err}")))
    }

    /// Returns the effective pipeline toggles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the policy name is unknown.
    pub fn settings(&self) -> Result<CryptoGateConfig, ConfigError> {
        if let Some(policy) = self.resolved_policy()? {
            return Ok(policy.config());
        }
        let base = CryptoGateConfig::default();
        Ok(CryptoGateConfig {
            strict_mode: self.strict_mode.unwrap_or(base.strict_mode),
            allow_warnings: self.allow_warnings.unwrap_or(base.allow_warnings),
            quantum_resistance_check: self
                .quantum_resistance_check
                .unwrap_or(base.quantum_resistance_check),
            timing_attack_check: self.timing_attack_check.unwrap_or(base.timing_attack_check),
        })
    }

    /// Builds the crypto gate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the policy name is unknown.
    pub fn build_gate(&self) -> Result<CryptoGate, ConfigError> {
        match self.resolved_policy()? {
            Some(policy) => Ok(CryptoGate::with_policy(policy)),
            None => Ok(CryptoGate::new(self.settings()?)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an explicit path or environment value.
fn resolve_path(path: Option<&Path>, env_path: Option<String>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
