//! Error Model for the Constela Compiler
//!
//! Every user-facing failure is a [`ConstelaError`] carrying a closed
//! [`ErrorCode`], a message and, almost always, a JSON Pointer into the
//! offending input. Transformer invariant violations travel on a separate
//! channel ([`InternalError`]) because they are compiler bugs, not user errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SchemaInvalid,
    UnsupportedVersion,
    MaxNestingExceeded,
    ExpansionLimitExceeded,
    UndefinedState,
    UndefinedAction,
    DuplicateAction,
    VarUndefined,
    UndefinedRef,
    ComponentNotFound,
    ComponentPropMissing,
    ComponentCycle,
    ParamUndefined,
    OperationInvalidForType,
    OperationMissingField,
    UndefinedRouteParam,
    RouteNotDefined,
    UndefinedImport,
    UndefinedData,
    UndefinedStyle,
    UndefinedVariant,
    LayoutNotFound,
    LayoutMissingSlot,
    SlotOutsideComponent,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchemaInvalid => "SCHEMA_INVALID",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::MaxNestingExceeded => "MAX_NESTING_EXCEEDED",
            ErrorCode::ExpansionLimitExceeded => "EXPANSION_LIMIT_EXCEEDED",
            ErrorCode::UndefinedState => "UNDEFINED_STATE",
            ErrorCode::UndefinedAction => "UNDEFINED_ACTION",
            ErrorCode::DuplicateAction => "DUPLICATE_ACTION",
            ErrorCode::VarUndefined => "VAR_UNDEFINED",
            ErrorCode::UndefinedRef => "UNDEFINED_REF",
            ErrorCode::ComponentNotFound => "COMPONENT_NOT_FOUND",
            ErrorCode::ComponentPropMissing => "COMPONENT_PROP_MISSING",
            ErrorCode::ComponentCycle => "COMPONENT_CYCLE",
            ErrorCode::ParamUndefined => "PARAM_UNDEFINED",
            ErrorCode::OperationInvalidForType => "OPERATION_INVALID_FOR_TYPE",
            ErrorCode::OperationMissingField => "OPERATION_MISSING_FIELD",
            ErrorCode::UndefinedRouteParam => "UNDEFINED_ROUTE_PARAM",
            ErrorCode::RouteNotDefined => "ROUTE_NOT_DEFINED",
            ErrorCode::UndefinedImport => "UNDEFINED_IMPORT",
            ErrorCode::UndefinedData => "UNDEFINED_DATA",
            ErrorCode::UndefinedStyle => "UNDEFINED_STYLE",
            ErrorCode::UndefinedVariant => "UNDEFINED_VARIANT",
            ErrorCode::LayoutNotFound => "LAYOUT_NOT_FOUND",
            ErrorCode::LayoutMissingSlot => "LAYOUT_MISSING_SLOT",
            ErrorCode::SlotOutsideComponent => "SLOT_OUTSIDE_COMPONENT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// USER DIAGNOSTIC
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct ConstelaError {
    pub code: ErrorCode,
    pub message: String,
    /// RFC 6901 pointer into the raw input. The root is the empty string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<IndexMap<String, Value>>,
}

impl ConstelaError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ConstelaError {
            code,
            message: message.into(),
            path: None,
            suggestion: None,
            context: None,
        }
    }

    /// Shorthand for the Validator's single error kind.
    pub fn schema(path: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SchemaInvalid, message).at(path)
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context
            .get_or_insert_with(IndexMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNAL FAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Raised only when an earlier pass let something through that it should
/// have rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InternalError {
    #[error("component '{name}' reached lowering without being registered by analysis")]
    UnregisteredComponent { name: String },
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("compilation failed with {} error(s)", .0.len())]
    Invalid(Vec<ConstelaError>),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl CompileError {
    /// User diagnostics. Empty for internal faults.
    pub fn diagnostics(&self) -> &[ConstelaError] {
        match self {
            CompileError::Invalid(errors) => errors,
            CompileError::Internal(_) => &[],
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

impl From<ConstelaError> for CompileError {
    fn from(error: ConstelaError) -> Self {
        CompileError::Invalid(vec![error])
    }
}

impl From<Vec<ConstelaError>> for CompileError {
    fn from(errors: Vec<ConstelaError>) -> Self {
        CompileError::Invalid(errors)
    }
}
