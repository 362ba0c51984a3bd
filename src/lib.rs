//! # Constela Compiler
//!
//! Compiles a JSON-encoded UI program (state, actions, a view tree and
//! optional components, styles, routes and layouts) into a
//! [`CompiledProgram`] that renderers consume read-only.
//!
//! ## Passes
//!
//! 1. **Validate** ([`validate`]): raw JSON to a typed [`Program`]. Stops at
//!    the first structural problem.
//! 2. **Analyze** ([`analyze`]): resolves every name against lexical scope,
//!    detects component cycles and bounds the expanded nesting depth.
//!    Reports every problem it finds, with "Did you mean" suggestions.
//! 3. **Transform** ([`transform`]): inlines components, fills slots, binds
//!    params by reference and indexes actions by name. Never fails on input
//!    that analysis accepted.
//!
//! [`compile`] chains the three and short-circuits: a schema error is never
//! mixed with semantic errors.
//!
//! ## Errors
//!
//! User diagnostics are [`ConstelaError`]s with a closed [`ErrorCode`] and a
//! JSON Pointer `path`. Transformer faults are [`InternalError`]s, kept
//! apart because they are compiler bugs.

mod analyze;
mod ast;
mod batch;
mod cache;
mod compile;
mod component;
mod error;
mod ir;
mod layout;
mod nesting;
mod options;
mod pointer;
mod route;
mod scope;
mod suggest;
mod transform;
mod validate;
mod visitor;

#[cfg(test)]
mod component_tests;
#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod transform_tests;
#[cfg(test)]
mod validate_tests;

pub use analyze::{
    analyze, analyze_layout_with_options, analyze_with_options, AnalysisContext,
    ComponentSignature, ACTION_VARS,
};
pub use ast::*;
pub use batch::{compile_batch, compile_batch_with_cache, BatchInput, BatchOutcome};
pub use cache::{CompileCache, CompileResult};
pub use compile::{compile, compile_str, compile_str_with_options, compile_with_options, CompileOutput};
pub use error::{CompileError, ConstelaError, ErrorCode, InternalError};
pub use ir::*;
pub use layout::{compile_layout, compile_layout_with_options, CompiledLayout, LayoutRegistry};
pub use nesting::{ComponentExtent, Extent, Size};
pub use options::{
    CompileOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_EXPANDED_NODES, DEFAULT_SUGGESTION_DISTANCE,
};
pub use route::extract_route_params;
pub use suggest::{closest_match, did_you_mean, levenshtein};
pub use transform::transform;
pub use validate::{
    is_event_handler_shape, validate, validate_layout_with_options, validate_with_options,
    ACTION_STEP_TYPES, EXPRESSION_TYPES, VIEW_KINDS,
};
