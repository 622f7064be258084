// crates/security-gate-config/src/lib.rs
// ============================================================================
// Module: Security Gate Config
// Description: Configuration model and loader for security gate runs.
// Purpose: Expose the TOML configuration surface shared by the CLI and hosts.
// Dependencies: security-gate-core plus the gate crates
// ============================================================================

//! ## Overview
//! [`SecurityGateConfig::load`] reads `security-gate.toml`, enforces size and
//! path limits, and validates every section fail-closed. Each section has
//! defaults, so an empty file is a valid configuration.

pub mod config;

pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::CryptoConfig;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::SecurityGateConfig;
