// crates/security-gate-crypto/tests/gate.rs
// ============================================================================
// Module: Crypto SecurityGate Tests
// Description: Gate input forms, config validation, and runner integration.
// ============================================================================
//! ## Overview
//! Drives [`CryptoGate`] through the [`SecurityGate`] contract.

#![allow(
    clippy::unwrap_used,
    clippy::use_debug,
    reason = "Tests use unwrap and debug output on deterministic fixtures."
)]

mod common;

use security_gate_core::ContextOverrides;
use security_gate_core::Environment;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::GateRunner;
use security_gate_core::GateRunnerConfig;
use security_gate_core::SecurityGate;
use security_gate_crypto::CryptoGate;
use security_gate_crypto::SecurityPolicy;
use serde_json::json;

use crate::common::envelope_for;
use crate::common::fresh_envelope;
use crate::common::reference_time;
use crate::common::valid_envelope;
use crate::common::with;

fn context() -> GateExecutionContext {
    GateExecutionContext::at(Environment::Staging, reference_time(), ContextOverrides::default())
}

#[tokio::test]
async fn executes_a_single_envelope_at_context_time() {
    let gate = CryptoGate::with_policy(SecurityPolicy::Production);
    let result = gate.execute(&valid_envelope(), context()).await.unwrap();
    assert!(result.valid, "{result:?}");
    assert_eq!(result.metadata.get("policy"), Some(&json!("production")));
    assert_eq!(result.metadata.get("envelopes"), Some(&json!(1)));
}

#[tokio::test]
async fn executes_batches_with_indexed_messages() {
    let gate = CryptoGate::default();
    let bad = with(valid_envelope(), "/keyId", json!("k"));
    let input = json!([valid_envelope(), bad]);
    let result = gate.execute(&input, context()).await.unwrap();
    assert!(!result.valid);
    assert!(result.errors.iter().all(|error| error.starts_with("envelope[1]: ")));
    assert_eq!(result.metadata.get("batch").unwrap()["invalid"], json!(1));
    assert_eq!(result.details, "Validated 2 envelopes: 1 valid, 1 invalid");
}

#[tokio::test]
async fn wrapper_input_selects_a_policy() {
    let gate = CryptoGate::default();
    let gcm = envelope_for("AES-256-GCM");
    let lenient = gate.execute(&json!({"envelope": gcm}), context()).await.unwrap();
    assert!(lenient.valid);
    assert_eq!(lenient.metadata.get("policy"), Some(&json!("staging")));

    let strict = gate
        .execute(&json!({"envelope": gcm, "policy": "production"}), context())
        .await
        .unwrap();
    assert!(!strict.valid);
    assert_eq!(strict.metadata.get("policy"), Some(&json!("production")));

    let batch = gate
        .execute(&json!({"envelopes": [valid_envelope()], "policy": "development"}), context())
        .await
        .unwrap();
    assert!(batch.valid);
}

#[tokio::test]
async fn malformed_input_is_an_operational_error() {
    let gate = CryptoGate::default();
    let unknown = gate
        .execute(&json!({"envelope": valid_envelope(), "policy": "paranoid"}), context())
        .await
        .unwrap_err();
    assert_eq!(
        unknown,
        GateError::InvalidInput("Unknown security policy: paranoid".to_string())
    );
    assert!(matches!(
        gate.execute(&json!("envelope"), context()).await,
        Err(GateError::InvalidInput(_))
    ));
    assert!(matches!(
        gate.execute(&json!({"envelopes": {}}), context()).await,
        Err(GateError::InvalidInput(_))
    ));
}

#[test]
fn validate_config_checks_keys_and_types() {
    let gate = CryptoGate::default();
    assert!(gate.validate_config(&json!({"strictMode": false})).valid);

    let bad = gate.validate_config(&json!({"strictMode": "yes", "paranoid": true}));
    assert!(!bad.valid);
    assert_eq!(bad.errors.len(), 2);

    let odd = gate.validate_config(&json!({"strictMode": true, "allowWarnings": true}));
    assert!(odd.valid);
    assert_eq!(odd.warnings.len(), 1);

    assert!(!gate.validate_config(&json!([])).valid);
    assert_eq!(gate.config()["timingAttackCheck"], json!(true));
}

#[tokio::test]
async fn runs_inside_the_gate_runner() {
    let runner = GateRunner::new(GateRunnerConfig::default());
    runner.register_gate(CryptoGate::with_policy(SecurityPolicy::Staging)).unwrap();
    let names: Vec<String> = runner.list_gates().into_iter().map(|gate| gate.name).collect();
    assert_eq!(names, vec!["crypto-envelope"]);

    let result =
        runner.execute_gate("crypto-envelope", &fresh_envelope("XChaCha20Poly1305"), None).await;
    assert!(result.valid, "{result:?}");
    assert_eq!(result.metadata.get("gate_name"), Some(&json!("crypto-envelope")));
}
