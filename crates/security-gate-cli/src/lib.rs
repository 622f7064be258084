// crates/security-gate-cli/src/lib.rs
// ============================================================================
// Module: Security Gate CLI Library
// Description: Shared helpers for the security gate command-line interface.
// Purpose: Keep output rendering testable apart from the binary entry point.
// Dependencies: security-gate-core, security-gate-crypto
// ============================================================================

//! ## Overview
//! The binary (`src/main.rs`) parses arguments and performs I/O; this library
//! turns validation results and run reports into the text it prints.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Text rendering for envelope reports, policies, and run summaries.
pub mod render;
