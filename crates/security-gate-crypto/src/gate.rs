// crates/security-gate-crypto/src/gate.rs
// ============================================================================
// Module: Crypto Envelope Gate
// Description: Staged envelope validation pipeline and SecurityGate adapter.
// Purpose: Validate single envelopes, batches, and named policies.
// Dependencies: async-trait, security-gate-core, serde, serde_json, time
// ============================================================================

//! ## Overview
//! [`CryptoGate`] runs the envelope pipeline under one [`CryptoGateConfig`].
//! Each stage only runs when every earlier stage produced no errors, so a
//! malformed envelope never reaches the structural or KDF rules.
//!
//! As a [`SecurityGate`], the gate accepts an envelope object, an array of
//! envelopes, or `{ "envelope" | "envelopes": ..., "policy"?: name }`. The
//! execution context timestamp is the reference time for AAD freshness.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::GateResult;
use security_gate_core::SecurityGate;
use security_gate_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;

use crate::envelope::CryptoEnvelope;
use crate::error::CryptoGateError;
use crate::policy::CryptoGateConfig;
use crate::policy::SecurityPolicy;
use crate::primitives::quantum_advisory;
use crate::primitives::validate_algorithm;
use crate::primitives::validate_kdf_params;
use crate::primitives::validate_timing_resistance;
use crate::schema::SCHEMA_ERROR_PREFIX;
use crate::schema::validate_schema;
use crate::structure::validate_structure;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registered gate name.
pub const CRYPTO_GATE_NAME: &str = "crypto-envelope";
/// Gate version reported to the runner.
const CRYPTO_GATE_VERSION: &str = "1.0.0";
/// Final error appended when strict mode rejects warnings.
pub const STRICT_MODE_ERROR: &str = "Strict mode: warnings not allowed";
/// Recognized keys in a JSON gate configuration.
const CONFIG_KEYS: [&str; 4] =
    ["strictMode", "allowWarnings", "quantumResistanceCheck", "timingAttackCheck"];

// ============================================================================
// SECTION: Batch Types
// ============================================================================

/// Aggregate counters for a batch validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Envelopes validated.
    pub total: usize,
    /// Envelopes that passed.
    pub valid: usize,
    /// Envelopes that failed.
    pub invalid: usize,
    /// Errors across all envelopes.
    pub total_errors: usize,
    /// Warnings across all envelopes.
    pub total_warnings: usize,
}

impl BatchSummary {
    /// Computes counters from per-envelope results.
    #[must_use]
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let valid = results.iter().filter(|result| result.valid).count();
        Self {
            total: results.len(),
            valid,
            invalid: results.len() - valid,
            total_errors: results.iter().map(|result| result.errors.len()).sum(),
            total_warnings: results.iter().map(|result| result.warnings.len()).sum(),
        }
    }
}

/// Per-envelope results plus summary, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchValidation {
    /// One result per input envelope.
    pub results: Vec<ValidationResult>,
    /// Aggregate counters.
    pub summary: BatchSummary,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Crypto envelope validation gate.
#[derive(Debug, Clone, Default)]
pub struct CryptoGate {
    /// Active pipeline configuration.
    config: CryptoGateConfig,
    /// Preset the configuration came from, if any.
    policy: Option<SecurityPolicy>,
}

impl CryptoGate {
    /// Creates a gate with an explicit configuration.
    #[must_use]
    pub const fn new(config: CryptoGateConfig) -> Self {
        Self {
            config,
            policy: None,
        }
    }

    /// Creates a gate configured from a policy preset.
    #[must_use]
    pub const fn with_policy(policy: SecurityPolicy) -> Self {
        Self {
            config: policy.config(),
            policy: Some(policy),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn settings(&self) -> CryptoGateConfig {
        self.config
    }

    /// Returns the policy label used in results (`custom` for explicit configs).
    #[must_use]
    pub fn policy_label(&self) -> &'static str {
        self.policy.map_or("custom", SecurityPolicy::name)
    }

    /// Validates a raw envelope value against the current time.
    #[must_use]
    pub fn validate_crypto_envelope(&self, envelope: &Value) -> ValidationResult {
        self.validate_at(envelope, OffsetDateTime::now_utc())
    }

    /// Validates a raw envelope value against a fixed reference time.
    #[must_use]
    pub fn validate_at(&self, envelope: &Value, now: OffsetDateTime) -> ValidationResult {
        let schema = validate_schema(envelope);
        if !schema.valid {
            return schema;
        }
        match serde_json::from_value::<CryptoEnvelope>(envelope.clone()) {
            Ok(typed) => self.run_stages(&typed, now, schema),
            Err(err) => ValidationResult::error(format!("{SCHEMA_ERROR_PREFIX}{err}")),
        }
    }

    /// Validates a typed envelope, rerunning the schema patterns on its fields.
    #[must_use]
    pub fn validate_envelope(&self, envelope: &CryptoEnvelope) -> ValidationResult {
        match serde_json::to_value(envelope) {
            Ok(value) => self.validate_crypto_envelope(&value),
            Err(err) => ValidationResult::error(format!("{SCHEMA_ERROR_PREFIX}{err}")),
        }
    }

    /// Validates each envelope independently.
    #[must_use]
    pub fn validate_batch(&self, envelopes: &[Value]) -> BatchValidation {
        self.validate_batch_at(envelopes, OffsetDateTime::now_utc())
    }

    /// Validates each envelope independently against a fixed reference time.
    #[must_use]
    pub fn validate_batch_at(&self, envelopes: &[Value], now: OffsetDateTime) -> BatchValidation {
        let results: Vec<ValidationResult> =
            envelopes.iter().map(|envelope| self.validate_at(envelope, now)).collect();
        let summary = BatchSummary::from_results(&results);
        BatchValidation {
            results,
            summary,
        }
    }

    /// Validates an envelope under a named policy preset.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoGateError::UnknownPolicy`] when the name is not a
    /// preset. This is a configuration error, distinct from an invalid
    /// envelope.
    pub fn validate_security_policy(
        envelope: &Value,
        policy_name: &str,
    ) -> Result<ValidationResult, CryptoGateError> {
        let policy = SecurityPolicy::from_name(policy_name)?;
        Ok(Self::with_policy(policy).validate_crypto_envelope(envelope))
    }

    /// Runs the post-schema stages, stopping at the first stage with errors.
    fn run_stages(
        &self,
        envelope: &CryptoEnvelope,
        now: OffsetDateTime,
        mut result: ValidationResult,
    ) -> ValidationResult {
        result.merge(validate_structure(envelope, now));
        if !result.valid {
            return result;
        }

        result.merge(validate_algorithm(&envelope.algorithm));
        result.merge(validate_kdf_params(&envelope.kdf_params));
        if !result.valid {
            return result;
        }

        if self.config.timing_attack_check {
            result.merge(validate_timing_resistance(&envelope.kdf_params, self.config.strict_mode));
            if !result.valid {
                return result;
            }
        }

        if self.config.quantum_resistance_check {
            result.merge(quantum_advisory(&envelope.algorithm, self.config.strict_mode));
            if !result.valid {
                return result;
            }
        }

        if self.config.strict_mode && !self.config.allow_warnings && !result.warnings.is_empty() {
            result.push_error(STRICT_MODE_ERROR);
        }
        result
    }
}

// ============================================================================
// SECTION: Gate Input
// ============================================================================

/// Parsed gate input.
enum GateInput<'a> {
    /// One envelope.
    Single(&'a Value),
    /// Several envelopes.
    Batch(&'a [Value]),
}

/// Splits gate input into envelopes and an optional policy override.
fn parse_input(input: &Value) -> Result<(GateInput<'_>, Option<SecurityPolicy>), GateError> {
    match input {
        Value::Array(items) => Ok((GateInput::Batch(items), None)),
        Value::Object(map) if map.contains_key("envelope") || map.contains_key("envelopes") => {
            let policy = match map.get("policy") {
                None | Some(Value::Null) => None,
                Some(Value::String(name)) => Some(
                    SecurityPolicy::from_name(name)
                        .map_err(|err| GateError::InvalidInput(err.to_string()))?,
                ),
                Some(_) => {
                    return Err(GateError::InvalidInput("policy must be a string".to_string()));
                }
            };
            let envelopes = match (map.get("envelope"), map.get("envelopes")) {
                (Some(envelope), None) => GateInput::Single(envelope),
                (None, Some(Value::Array(items))) => GateInput::Batch(items),
                (None, Some(_)) => {
                    return Err(GateError::InvalidInput("envelopes must be an array".to_string()));
                }
                _ => {
                    return Err(GateError::InvalidInput(
                        "provide either envelope or envelopes, not both".to_string(),
                    ));
                }
            };
            Ok((envelopes, policy))
        }
        Value::Object(_) => Ok((GateInput::Single(input), None)),
        _ => Err(GateError::InvalidInput(
            "expected an envelope object or an array of envelopes".to_string(),
        )),
    }
}

/// Folds batch results into one result with indexed messages.
fn fold_batch(batch: &BatchValidation) -> ValidationResult {
    let mut folded = ValidationResult::new();
    for (index, result) in batch.results.iter().enumerate() {
        for error in &result.errors {
            folded.push_error(format!("envelope[{index}]: {error}"));
        }
        for warning in &result.warnings {
            folded.push_warning(format!("envelope[{index}]: {warning}"));
        }
    }
    folded
}

// ============================================================================
// SECTION: SecurityGate
// ============================================================================

#[async_trait]
impl SecurityGate for CryptoGate {
    fn name(&self) -> &str {
        CRYPTO_GATE_NAME
    }

    fn description(&self) -> &str {
        "Validates encryption envelopes against schema, length, algorithm, and KDF rules"
    }

    fn version(&self) -> &str {
        CRYPTO_GATE_VERSION
    }

    async fn execute(
        &self,
        input: &Value,
        context: GateExecutionContext,
    ) -> Result<GateResult, GateError> {
        let (envelopes, policy) = parse_input(input)?;
        let gate = policy.map_or_else(|| self.clone(), Self::with_policy);
        let now = context.timestamp;

        let result = match envelopes {
            GateInput::Single(envelope) => {
                let validation = gate.validate_at(envelope, now);
                let details = if validation.valid {
                    "Crypto envelope is valid".to_string()
                } else {
                    format!("Crypto envelope is invalid ({} errors)", validation.errors.len())
                };
                GateResult::from_validation(validation, details).with_metadata("envelopes", 1)
            }
            GateInput::Batch(items) => {
                let batch = gate.validate_batch_at(items, now);
                let details = format!(
                    "Validated {} envelopes: {} valid, {} invalid",
                    batch.summary.total, batch.summary.valid, batch.summary.invalid
                );
                let summary = serde_json::to_value(batch.summary)
                    .map_err(|err| GateError::Execution(err.to_string()))?;
                GateResult::from_validation(fold_batch(&batch), details)
                    .with_metadata("envelopes", batch.summary.total)
                    .with_metadata("batch", summary)
            }
        };
        Ok(result.with_metadata("policy", gate.policy_label()))
    }

    fn config(&self) -> Value {
        serde_json::to_value(self.config).unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> GateResult {
        let validation = match config {
            Value::Object(map) => validate_config_map(map),
            _ => ValidationResult::error("Crypto gate configuration must be an object"),
        };
        let details = if validation.valid {
            "Crypto gate configuration is valid"
        } else {
            "Crypto gate configuration is invalid"
        };
        GateResult::from_validation(validation, details)
    }
}

/// Checks option names and types of a JSON configuration object.
fn validate_config_map(map: &Map<String, Value>) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (key, value) in map {
        if !CONFIG_KEYS.contains(&key.as_str()) {
            result.push_error(format!("Unknown crypto gate option: {key}"));
        } else if !value.is_boolean() {
            result.push_error(format!("Crypto gate option {key} must be a boolean"));
        }
    }
    let enabled = |key: &str| map.get(key).and_then(Value::as_bool).unwrap_or(false);
    if enabled("strictMode") && enabled("allowWarnings") {
        result.push_warning("allowWarnings disables the strict-mode warning check");
    }
    result
}
