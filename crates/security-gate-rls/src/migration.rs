// crates/security-gate-rls/src/migration.rs
// ============================================================================
// Module: Migration Validation
// Description: Deny-list screening and rollback-guarded migration dry runs.
// Purpose: Catch migrations that weaken row-level security before they ship.
// Dependencies: regex, security-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Validation runs in two phases:
//! 1. Static screening: each statement is matched against the deny-list. Any
//!    match fails validation and nothing is executed.
//! 2. Dry run: inside a transaction, table expectations are checked, the
//!    statements are executed, and expectations are checked again. The
//!    transaction is always rolled back, including after failures.
//!
//! Statement splitting is a plain split on `;` and does not understand
//! dollar-quoted function bodies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use regex::Regex;
use security_gate_core::ValidationResult;

use crate::client::DatabaseClient;
use crate::error::DatabaseError;
use crate::expectations::TableExpectation;
use crate::expectations::check_tables;

// ============================================================================
// SECTION: Deny-List
// ============================================================================

/// Forbidden statement patterns with human-readable labels.
const DENIED_PATTERNS: [(&str, &str); 5] = [
    ("DROP POLICY", r"(?i)\bDROP\s+POLICY\b"),
    ("DISABLE ROW LEVEL SECURITY", r"(?i)\bDISABLE\s+ROW\s+LEVEL\s+SECURITY\b"),
    ("NO FORCE ROW LEVEL SECURITY", r"(?i)\bNO\s+FORCE\s+ROW\s+LEVEL\s+SECURITY\b"),
    ("GRANT ALL TO PUBLIC", r"(?is)\bGRANT\s+ALL\b.*\bTO\s+PUBLIC\b"),
    ("BYPASSRLS", r"(?is)\bALTER\s+(?:ROLE|USER)\b.*\bBYPASSRLS\b"),
];

/// Returns the compiled deny-list.
fn denied_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DENIED_PATTERNS
            .iter()
            .filter_map(|(label, pattern)| Regex::new(pattern).ok().map(|regex| (*label, regex)))
            .collect()
    })
}

// ============================================================================
// SECTION: Screening
// ============================================================================

/// Splits a migration script into trimmed, non-empty statements.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Screens statements against the deny-list without executing anything.
#[must_use]
pub fn screen_migration(statements: &[String]) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (index, statement) in statements.iter().enumerate() {
        for (label, regex) in denied_patterns() {
            if regex.is_match(statement) {
                result.push_error(format!(
                    "Migration statement {} matches forbidden pattern {label}",
                    index + 1
                ));
            }
        }
    }
    result
}

// ============================================================================
// SECTION: Dry Run
// ============================================================================

/// Screens and dry-runs a migration inside a rolled-back transaction.
///
/// Check messages are prefixed with `before migration: ` or
/// `after migration: `.
///
/// # Errors
///
/// Returns [`DatabaseError`] when the transaction cannot be opened or a
/// catalog query fails. Rollback is still attempted after catalog failures.
pub async fn validate_migration(
    client: &dyn DatabaseClient,
    statements: &[String],
    expectations: &[TableExpectation],
) -> Result<ValidationResult, DatabaseError> {
    let screened = screen_migration(statements);
    if !screened.valid {
        return Ok(screened);
    }

    client.begin().await?;
    let outcome = dry_run(client, statements, expectations).await;
    let rollback = client.rollback().await;

    let mut result = outcome?;
    if let Err(err) = rollback {
        result.push_error(format!("Migration rollback failed: {err}"));
    }
    Ok(result)
}

/// Runs checks and statements inside an open transaction.
async fn dry_run(
    client: &dyn DatabaseClient,
    statements: &[String],
    expectations: &[TableExpectation],
) -> Result<ValidationResult, DatabaseError> {
    let mut result = ValidationResult::new();
    let before = check_tables(client, expectations).await?;
    absorb(&mut result, before, "before migration");

    for (index, statement) in statements.iter().enumerate() {
        match client.query(statement, &[]).await {
            Ok(_) => {}
            Err(err @ DatabaseError::Connection(_)) => return Err(err),
            Err(err) => {
                result.push_error(format!("Migration statement {} failed: {err}", index + 1));
                return Ok(result);
            }
        }
    }

    let after = check_tables(client, expectations).await?;
    absorb(&mut result, after, "after migration");
    Ok(result)
}

/// Merges `source` into `target` with a phase prefix on every message.
fn absorb(target: &mut ValidationResult, source: ValidationResult, phase: &str) {
    for error in source.errors {
        target.push_error(format!("{phase}: {error}"));
    }
    for warning in source.warnings {
        target.push_warning(format!("{phase}: {warning}"));
    }
}
