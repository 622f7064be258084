// crates/security-gate-rls/tests/rls_gate.rs
// ============================================================================
// Module: RLS Gate Tests
// Description: Policy checks, probes, and migration dry runs on a fake database.
// ============================================================================
//! ## Overview
//! Uses an in-memory catalog that snapshots policies on `begin` and restores
//! them on `rollback`.

#![allow(
    clippy::unwrap_used,
    clippy::use_debug,
    reason = "Tests use unwrap and debug output on deterministic fixtures."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use security_gate_core::ContextOverrides;
use security_gate_core::Environment;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::SecurityGate;
use security_gate_rls::AccessProbe;
use security_gate_rls::DatabaseClient;
use security_gate_rls::DatabaseError;
use security_gate_rls::PolicyExpectation;
use security_gate_rls::ProbeCategory;
use security_gate_rls::ProbeExpectation;
use security_gate_rls::RlsGate;
use security_gate_rls::RlsGateConfig;
use security_gate_rls::Row;
use security_gate_rls::TableExpectation;
use security_gate_rls::expectations::POLICIES_SQL;
use security_gate_rls::expectations::RLS_STATUS_SQL;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fake Database
// ============================================================================

#[derive(Debug, Clone)]
struct PolicyRow {
    table: String,
    name: String,
    cmd: String,
    qual: String,
}

#[derive(Debug, Default)]
struct FakeState {
    rls: BTreeMap<String, bool>,
    policies: Vec<PolicyRow>,
    snapshot: Option<Vec<PolicyRow>>,
    executed: Vec<String>,
    events: Vec<&'static str>,
}

#[derive(Default)]
struct FakeDatabase {
    state: Mutex<FakeState>,
    user_rows: BTreeMap<(String, String), Result<usize, DatabaseError>>,
    offline: bool,
}

const READ_NOTES: &str = "SELECT * FROM notes";
const READ_OTHER: &str = "SELECT * FROM notes WHERE user_id = $1";
const ESCALATE: &str = "UPDATE roles SET role = 'admin'";

impl FakeDatabase {
    fn healthy() -> Self {
        let mut state = FakeState::default();
        state.rls.insert("notes".to_string(), true);
        state.rls.insert("audit_log".to_string(), false);
        state.policies.push(PolicyRow {
            table: "notes".to_string(),
            name: "notes_owner".to_string(),
            cmd: "ALL".to_string(),
            qual: "(user_id = auth.uid())".to_string(),
        });
        let mut user_rows = BTreeMap::new();
        user_rows.insert(("alice".to_string(), READ_NOTES.to_string()), Ok(3));
        user_rows.insert(("alice".to_string(), READ_OTHER.to_string()), Ok(0));
        user_rows.insert(
            ("alice".to_string(), ESCALATE.to_string()),
            Err(DatabaseError::AccessDenied("permission denied for table roles".to_string())),
        );
        Self {
            state: Mutex::new(state),
            user_rows,
            offline: false,
        }
    }

    fn with_user_rows(mut self, user: &str, sql: &str, rows: Result<usize, DatabaseError>) -> Self {
        self.user_rows.insert((user.to_string(), sql.to_string()), rows);
        self
    }

    fn events(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().events.clone()
    }

    fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    fn policy_names(&self) -> Vec<String> {
        self.state.lock().unwrap().policies.iter().map(|policy| policy.name.clone()).collect()
    }
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

#[async_trait]
impl DatabaseClient for FakeDatabase {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DatabaseError> {
        if self.offline {
            return Err(DatabaseError::Connection("connection refused".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let table = params.first().and_then(Value::as_str).unwrap_or_default().to_string();
        if sql == RLS_STATUS_SQL {
            return Ok(state
                .rls
                .get(&table)
                .map(|enabled| vec![row(json!({"relrowsecurity": enabled}))])
                .unwrap_or_default());
        }
        if sql == POLICIES_SQL {
            return Ok(state
                .policies
                .iter()
                .filter(|policy| policy.table == table)
                .map(|policy| {
                    row(json!({
                        "policyname": policy.name,
                        "cmd": policy.cmd,
                        "qual": policy.qual,
                        "with_check": null
                    }))
                })
                .collect());
        }
        state.executed.push(sql.to_string());
        if sql.contains("FAIL") {
            return Err(DatabaseError::Query("syntax error at or near FAIL".to_string()));
        }
        let words: Vec<&str> = sql.split_whitespace().collect();
        if sql.starts_with("ALTER POLICY") && sql.contains("RENAME TO") {
            let (old, new) = (words[2].to_string(), words[words.len() - 1].to_string());
            for policy in &mut state.policies {
                if policy.name == old {
                    policy.name.clone_from(&new);
                }
            }
        }
        Ok(Vec::new())
    }

    async fn query_as_user(
        &self,
        sql: &str,
        user_id: &str,
        _params: &[Value],
    ) -> Result<Vec<Row>, DatabaseError> {
        if self.offline {
            return Err(DatabaseError::Connection("connection refused".to_string()));
        }
        match self.user_rows.get(&(user_id.to_string(), sql.to_string())) {
            Some(Ok(count)) => Ok((0..*count).map(|id| row(json!({"id": id}))).collect()),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn begin(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("begin");
        state.snapshot = Some(state.policies.clone());
        Ok(())
    }

    async fn commit(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("commit");
        state.snapshot = None;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("rollback");
        if let Some(snapshot) = state.snapshot.take() {
            state.policies = snapshot;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn context() -> GateExecutionContext {
    GateExecutionContext::new(Environment::Staging, ContextOverrides::default())
}

fn notes_expectation() -> TableExpectation {
    TableExpectation::enabled("notes").with_policy(PolicyExpectation {
        name: "notes_owner".to_string(),
        command: Some("all".to_string()),
        condition_contains: Some("auth.uid()".to_string()),
    })
}

fn probe(name: &str, category: ProbeCategory, sql: &str, expect: ProbeExpectation) -> AccessProbe {
    AccessProbe {
        name: name.to_string(),
        category,
        user_id: "alice".to_string(),
        sql: sql.to_string(),
        params: Vec::new(),
        expect,
    }
}

fn standard_config() -> RlsGateConfig {
    RlsGateConfig {
        tables: vec![notes_expectation()],
        probes: vec![
            probe("owner-read", ProbeCategory::Authorization, READ_NOTES, ProbeExpectation::Authorized),
            probe(
                "role-escalation",
                ProbeCategory::PrivilegeEscalation,
                ESCALATE,
                ProbeExpectation::Denied,
            ),
            probe(
                "cross-user-read",
                ProbeCategory::CrossUserIsolation,
                READ_OTHER,
                ProbeExpectation::Isolated,
            ),
        ],
    }
}

fn gate(database: &Arc<FakeDatabase>) -> RlsGate {
    RlsGate::new(database.clone(), standard_config())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn healthy_database_passes_all_checks() {
    let database = Arc::new(FakeDatabase::healthy());
    let result = gate(&database).execute(&Value::Null, context()).await.unwrap();
    assert!(result.valid, "{result:?}");
    assert_eq!(result.metadata.get("tables_checked"), Some(&json!(1)));
    assert_eq!(result.metadata.get("probes_run"), Some(&json!(3)));
    assert_eq!(result.metadata.get("migration_statements"), Some(&json!(0)));
    assert!(database.events().is_empty());
}

#[tokio::test]
async fn catalog_mismatches_are_reported() {
    let database = Arc::new(FakeDatabase::healthy());
    let tables = json!([
        {"table": "audit_log"},
        {"table": "ghosts"},
        {"table": "notes", "policies": [
            {"name": "notes_admin"},
            {"name": "notes_owner", "command": "SELECT", "condition_contains": "tenant_id"}
        ]}
    ]);
    let result = gate(&database)
        .execute(&json!({"tables": tables, "probes": []}), context())
        .await
        .unwrap();
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec![
            "Row level security is not enabled on table audit_log",
            "Table ghosts not found",
            "Policy notes_admin missing on table notes",
            "Policy notes_owner on table notes applies to ALL, expected SELECT",
            "Policy notes_owner on table notes condition does not contain 'tenant_id'",
        ]
    );
}

#[tokio::test]
async fn probe_failures_name_their_category() {
    let database = Arc::new(
        FakeDatabase::healthy()
            .with_user_rows("alice", ESCALATE, Ok(1))
            .with_user_rows("alice", READ_OTHER, Ok(2))
            .with_user_rows(
                "alice",
                READ_NOTES,
                Err(DatabaseError::AccessDenied("policy violation".to_string())),
            ),
    );
    let result = gate(&database).execute(&Value::Null, context()).await.unwrap();
    assert_eq!(
        result.errors,
        vec![
            "Probe owner-read (authorization): expected success, got access denied: policy \
             violation",
            "Probe role-escalation (privilege_escalation): expected access denied, query \
             succeeded with 1 rows",
            "Probe cross-user-read (cross_user_isolation): returned 2 rows that should be \
             invisible to user alice",
        ]
    );
}

#[tokio::test]
async fn denied_migrations_never_reach_the_database() {
    let database = Arc::new(FakeDatabase::healthy());
    let input = json!({"migration": "DROP POLICY notes_owner ON notes; SELECT 1;", "probes": []});
    let result = gate(&database).execute(&input, context()).await.unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["Migration statement 1 matches forbidden pattern DROP POLICY"]);
    assert!(database.events().is_empty());
    assert!(database.executed().is_empty());
}

#[tokio::test]
async fn dry_run_detects_policy_loss_and_rolls_back() {
    let database = Arc::new(FakeDatabase::healthy());
    let input = json!({
        "migration": ["ALTER POLICY notes_owner ON notes RENAME TO notes_legacy"],
        "probes": []
    });
    let result = gate(&database).execute(&input, context()).await.unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["after migration: Policy notes_owner missing on table notes"]);
    assert_eq!(database.events(), vec!["begin", "rollback"]);
    assert_eq!(database.policy_names(), vec!["notes_owner"]);
    assert_eq!(result.metadata.get("migration_statements"), Some(&json!(1)));
}

#[tokio::test]
async fn failing_statement_still_rolls_back() {
    let database = Arc::new(FakeDatabase::healthy());
    let input = json!({"migration": "CREATE INDEX notes_idx ON notes (user_id); FAIL HERE", "probes": []});
    let result = gate(&database).execute(&input, context()).await.unwrap();
    assert_eq!(
        result.errors,
        vec!["Migration statement 2 failed: query failed: syntax error at or near FAIL"]
    );
    assert_eq!(database.events(), vec!["begin", "rollback"]);
}

#[tokio::test]
async fn concurrent_runs_are_serialized() {
    let database = Arc::new(FakeDatabase::healthy());
    let gate = Arc::new(gate(&database));
    let input = json!({"migration": "CREATE INDEX a ON notes (id)", "probes": []});
    let (first, second) = tokio::join!(
        gate.execute(&input, context()),
        gate.execute(&input, context())
    );
    assert!(first.unwrap().valid);
    assert!(second.unwrap().valid);
    assert_eq!(database.events(), vec!["begin", "rollback", "begin", "rollback"]);
}

#[tokio::test]
async fn connection_failures_are_unavailable_faults() {
    let database = Arc::new(FakeDatabase {
        offline: true,
        ..FakeDatabase::healthy()
    });
    let err = gate(&database).execute(&Value::Null, context()).await.unwrap_err();
    assert_eq!(
        err,
        GateError::Unavailable("database connection failed: connection refused".to_string())
    );
}

#[tokio::test]
async fn malformed_input_is_rejected() {
    let database = Arc::new(FakeDatabase::healthy());
    let err = gate(&database).execute(&json!({"tables": "notes"}), context()).await.unwrap_err();
    assert!(matches!(err, GateError::InvalidInput(_)));
}

#[test]
fn validate_config_round_trips_the_declared_model() {
    let database = Arc::new(FakeDatabase::healthy());
    let gate = gate(&database);
    let config = gate.config();
    assert!(gate.validate_config(&config).valid);
    let empty = gate.validate_config(&json!({}));
    assert!(empty.valid);
    assert_eq!(empty.warnings.len(), 1);
    assert!(!gate.validate_config(&json!({"tables": [{"table": ""}]})).valid);
    assert!(!gate.validate_config(&json!({"unknown": true})).valid);
}
