// crates/security-gate-rls/src/gate.rs
// ============================================================================
// Module: RLS Gate
// Description: SecurityGate adapter over expectations, probes, and migrations.
// Purpose: Run row-level security checks under the gate runner.
// Dependencies: async-trait, security-gate-core, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Gate input (all fields optional):
//! `{ "tables": [...], "probes": [...], "migration": "sql" | ["stmt", ...] }`.
//! Input `tables`/`probes` replace the configured ones for that run.
//!
//! The gate owns one database session, so runs are serialized with an async
//! mutex held across the whole run. Connection failures surface as
//! [`GateError::Unavailable`]; other catalog failures as
//! [`GateError::Execution`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::GateResult;
use security_gate_core::SecurityGate;
use security_gate_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::client::DatabaseClient;
use crate::error::DatabaseError;
use crate::expectations::TableExpectation;
use crate::expectations::check_tables;
use crate::migration::split_statements;
use crate::migration::validate_migration;
use crate::probes::AccessProbe;
use crate::probes::run_probes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registered gate name.
pub const RLS_GATE_NAME: &str = "rls-policies";
/// Gate version reported to the runner.
const RLS_GATE_VERSION: &str = "1.0.0";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Declared access model checked on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RlsGateConfig {
    /// Tables and their expected policies.
    pub tables: Vec<TableExpectation>,
    /// Behavioral access probes.
    pub probes: Vec<AccessProbe>,
}

impl RlsGateConfig {
    /// Returns configuration problems, empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for table in &self.tables {
            if table.table.trim().is_empty() {
                problems.push("table expectation has an empty table name".to_string());
            }
            if !table.rls_enabled && !table.policies.is_empty() {
                problems.push(format!(
                    "table {} expects policies but not row level security",
                    table.table
                ));
            }
        }
        let mut names = BTreeSet::new();
        for probe in &self.probes {
            if !names.insert(probe.name.as_str()) {
                problems.push(format!("duplicate probe name: {}", probe.name));
            }
            if probe.sql.trim().is_empty() {
                problems.push(format!("probe {} has no statement", probe.name));
            }
        }
        problems
    }
}

/// Migration supplied as a script or as pre-split statements.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MigrationInput {
    /// Script split on `;`.
    Script(String),
    /// Individual statements.
    Statements(Vec<String>),
}

/// Per-run gate input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RlsGateInput {
    /// Table expectations replacing the configured ones.
    tables: Option<Vec<TableExpectation>>,
    /// Probes replacing the configured ones.
    probes: Option<Vec<AccessProbe>>,
    /// Migration to validate.
    migration: Option<MigrationInput>,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Row-level security gate.
pub struct RlsGate {
    /// Database session.
    client: Arc<dyn DatabaseClient>,
    /// Declared access model.
    config: RlsGateConfig,
    /// Serializes runs over the single session.
    session: Mutex<()>,
}

impl RlsGate {
    /// Creates a gate over a database client.
    #[must_use]
    pub fn new(client: Arc<dyn DatabaseClient>, config: RlsGateConfig) -> Self {
        Self {
            client,
            config,
            session: Mutex::new(()),
        }
    }

    /// Runs expectations, probes, and an optional migration.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the database cannot be queried.
    pub async fn run_checks(
        &self,
        tables: &[TableExpectation],
        probes: &[AccessProbe],
        migration: Option<&[String]>,
    ) -> Result<ValidationResult, DatabaseError> {
        let _session = self.session.lock().await;
        let client = self.client.as_ref();
        let mut result = check_tables(client, tables).await?;
        result.merge(run_probes(client, probes).await?);
        if let Some(statements) = migration {
            result.merge(validate_migration(client, statements, tables).await?);
        }
        Ok(result)
    }
}

/// Maps database failures onto gate faults.
fn gate_error(err: DatabaseError) -> GateError {
    match err {
        DatabaseError::Connection(_) => GateError::Unavailable(err.to_string()),
        DatabaseError::AccessDenied(_) | DatabaseError::Query(_) => {
            GateError::Execution(err.to_string())
        }
    }
}

#[async_trait]
impl SecurityGate for RlsGate {
    fn name(&self) -> &str {
        RLS_GATE_NAME
    }

    fn description(&self) -> &str {
        "Verifies row level security policies, access probes, and migration safety"
    }

    fn version(&self) -> &str {
        RLS_GATE_VERSION
    }

    async fn execute(
        &self,
        input: &Value,
        _context: GateExecutionContext,
    ) -> Result<GateResult, GateError> {
        let input: RlsGateInput = if input.is_null() {
            RlsGateInput::default()
        } else {
            serde_json::from_value(input.clone())
                .map_err(|err| GateError::InvalidInput(format!("invalid rls input: {err}")))?
        };
        let tables = input.tables.as_deref().unwrap_or(self.config.tables.as_slice());
        let probes = input.probes.as_deref().unwrap_or(self.config.probes.as_slice());
        let migration = input.migration.map(|migration| match migration {
            MigrationInput::Script(script) => split_statements(&script),
            MigrationInput::Statements(statements) => statements,
        });

        let validation =
            self.run_checks(tables, probes, migration.as_deref()).await.map_err(gate_error)?;
        let details = format!(
            "Checked {} tables and {} probes{}",
            tables.len(),
            probes.len(),
            migration
                .as_ref()
                .map(|statements| format!(", dry-ran {} migration statements", statements.len()))
                .unwrap_or_default()
        );
        let statements = migration.map_or(0, |statements| statements.len());
        Ok(GateResult::from_validation(validation, details)
            .with_metadata("tables_checked", tables.len())
            .with_metadata("probes_run", probes.len())
            .with_metadata("migration_statements", statements))
    }

    fn config(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> GateResult {
        let validation = match serde_json::from_value::<RlsGateConfig>(config.clone()) {
            Ok(parsed) => {
                let mut validation = ValidationResult::new();
                for problem in parsed.validate() {
                    validation.push_error(problem);
                }
                if parsed.tables.is_empty() && parsed.probes.is_empty() {
                    validation.push_warning("RLS gate has no tables or probes to check");
                }
                validation
            }
            Err(err) => ValidationResult::error(format!("invalid rls gate config: {err}")),
        };
        let details = if validation.valid {
            "RLS gate configuration is valid"
        } else {
            "RLS gate configuration is invalid"
        };
        GateResult::from_validation(validation, details)
    }
}
