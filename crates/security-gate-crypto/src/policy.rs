// crates/security-gate-crypto/src/policy.rs
// ============================================================================
// Module: Security Policies
// Description: Crypto gate configuration and named policy presets.
// Purpose: Map policy names to fixed pipeline configurations.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`CryptoGateConfig`] toggles the optional pipeline stages. The four
//! [`SecurityPolicy`] presets are constant lookup data; nothing mutates them
//! at runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::error::CryptoGateError;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Toggles for the optional crypto pipeline stages.
///
/// # Invariants
/// - Warnings fail an envelope only when `strict_mode && !allow_warnings`.
/// - Timing and quantum findings escalate to errors only under `strict_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CryptoGateConfig {
    /// Escalate advisories to errors and enable the strictness stage.
    pub strict_mode: bool,
    /// Permit warnings under strict mode.
    pub allow_warnings: bool,
    /// Run the post-quantum advisory stage.
    pub quantum_resistance_check: bool,
    /// Run the derivation timing stage.
    pub timing_attack_check: bool,
}

impl Default for CryptoGateConfig {
    fn default() -> Self {
        SecurityPolicy::Staging.config()
    }
}

// ============================================================================
// SECTION: Policies
// ============================================================================

/// Named security policy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityPolicy {
    /// Strict, no warnings, timing check on.
    Production,
    /// Lenient, timing check on.
    Staging,
    /// Lenient, timing check off.
    Development,
    /// Strict, no warnings, quantum and timing checks on.
    FutureProof,
}

impl SecurityPolicy {
    /// Returns every preset in a stable order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Production, Self::Staging, Self::Development, Self::FutureProof]
    }

    /// Returns the preset's wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::FutureProof => "future-proof",
        }
    }

    /// Resolves a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoGateError::UnknownPolicy`] for unrecognized names.
    pub fn from_name(name: &str) -> Result<Self, CryptoGateError> {
        Self::all()
            .into_iter()
            .find(|policy| policy.name() == name)
            .ok_or_else(|| CryptoGateError::UnknownPolicy(name.to_string()))
    }

    /// Returns the pipeline configuration for this preset.
    #[must_use]
    pub const fn config(self) -> CryptoGateConfig {
        match self {
            Self::Production => CryptoGateConfig {
                strict_mode: true,
                allow_warnings: false,
                quantum_resistance_check: false,
                timing_attack_check: true,
            },
            Self::Staging => CryptoGateConfig {
                strict_mode: false,
                allow_warnings: true,
                quantum_resistance_check: false,
                timing_attack_check: true,
            },
            Self::Development => CryptoGateConfig {
                strict_mode: false,
                allow_warnings: true,
                quantum_resistance_check: false,
                timing_attack_check: false,
            },
            Self::FutureProof => CryptoGateConfig {
                strict_mode: true,
                allow_warnings: false,
                quantum_resistance_check: true,
                timing_attack_check: true,
            },
        }
    }
}
