//! Orchestrator: validate, then analyze, then transform.
//!
//! Each pass short-circuits the next. A structurally invalid tree never
//! reaches semantic analysis, so the caller sees exactly one
//! `SCHEMA_INVALID` (or `UNSUPPORTED_VERSION` / `MAX_NESTING_EXCEEDED`)
//! instead of a cascade.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyze::analyze_with_options;
use crate::error::{CompileError, ConstelaError, InternalError};
use crate::ir::CompiledProgram;
use crate::options::CompileOptions;
use crate::transform::transform;
use crate::validate::validate_with_options;

pub fn compile(raw: &Value) -> Result<CompiledProgram, CompileError> {
    compile_with_options(raw, &CompileOptions::default())
}

pub fn compile_with_options(
    raw: &Value,
    options: &CompileOptions,
) -> Result<CompiledProgram, CompileError> {
    let program = validate_with_options(raw, options).map_err(|e| {
        log::debug!("[constela] validate failed: {}", e);
        CompileError::from(e)
    })?;
    log::debug!("[constela] validate ok");

    let context = analyze_with_options(&program, options)?;
    let compiled = transform(&program, &context)?;
    Ok(compiled)
}

/// Parses JSON text and compiles it. A syntax error is reported the same way
/// as any other schema violation, at the root.
pub fn compile_str(source: &str) -> Result<CompiledProgram, CompileError> {
    compile_str_with_options(source, &CompileOptions::default())
}

pub fn compile_str_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<CompiledProgram, CompileError> {
    let raw: Value = serde_json::from_str(source)
        .map_err(|e| ConstelaError::schema("", format!("Invalid JSON: {}", e)))?;
    compile_with_options(&raw, options)
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE ENVELOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// `{ok: true, program}` or `{ok: false, errors}`, for callers on the other
/// side of a process or FFI boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileOutput {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<CompiledProgram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ConstelaError>>,
}

impl CompileOutput {
    /// Internal faults have no user-facing shape and are handed back as-is.
    pub fn from_result(result: Result<CompiledProgram, CompileError>) -> Result<Self, InternalError> {
        match result {
            Ok(program) => Ok(CompileOutput {
                ok: true,
                program: Some(program),
                errors: None,
            }),
            Err(CompileError::Invalid(errors)) => Ok(CompileOutput {
                ok: false,
                program: None,
                errors: Some(errors),
            }),
            Err(CompileError::Internal(fault)) => Err(fault),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
