//! Layouts: shared page chrome with a slot for the page view.
//!
//! A layout is compiled once and applied to any number of already-compiled
//! pages. Applying merges the layout's state, actions, styles, imports and
//! data under the page's (the page wins on name clashes) and lowers the
//! layout view with every slot filled by the page view and every `param`
//! bound to the page's `route.layoutParams`. A layout has no route of its
//! own: its `route` expressions read the route of the page it is applied to
//! and are not checked against any path.

use indexmap::IndexMap;
use serde_json::Value;

use crate::analyze::{analyze_layout_with_options, AnalysisContext};
use crate::ast::Program;
use crate::component::PropEnv;
use crate::error::{CompileError, ConstelaError, ErrorCode, InternalError};
use crate::ir::CompiledProgram;
use crate::options::CompileOptions;
use crate::suggest::did_you_mean;
use crate::transform::{Expansion, Lowerer};
use crate::validate::validate_layout_with_options;

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLayout {
    pub program: Program,
    pub context: AnalysisContext,
}

pub fn compile_layout(raw: &Value) -> Result<CompiledLayout, CompileError> {
    compile_layout_with_options(raw, &CompileOptions::default())
}

pub fn compile_layout_with_options(
    raw: &Value,
    options: &CompileOptions,
) -> Result<CompiledLayout, CompileError> {
    let program = validate_layout_with_options(raw, options)?;
    let context = analyze_layout_with_options(&program, options)?;
    Ok(CompiledLayout { program, context })
}

/// Later entries of `over` replace earlier ones of `base` in place.
fn merge<V: Clone>(base: &IndexMap<String, V>, over: &IndexMap<String, V>) -> IndexMap<String, V> {
    let mut merged = base.clone();
    for (name, value) in over {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

impl CompiledLayout {
    pub fn apply(&self, page: &CompiledProgram) -> Result<CompiledProgram, InternalError> {
        let params: PropEnv = page
            .route
            .as_ref()
            .map(|route| route.layout_params.clone())
            .unwrap_or_default();
        let slot = std::slice::from_ref(&page.view);
        let env = Expansion {
            params: Some(&params),
            slot,
        };

        let mut lowerer = Lowerer::new(&self.program, &self.context);
        let view = lowerer.lower_single(&self.program.view, env)?;
        let layout_actions = lowerer.lower_actions(&self.program.actions, env);

        log::debug!(
            "[constela] applied layout: {} layout param(s), {} component instance(s) inlined",
            params.len(),
            lowerer.instances
        );

        Ok(CompiledProgram {
            version: page.version.clone(),
            route: page.route.clone(),
            imports: merge(&self.program.imports, &page.imports),
            data: merge(&self.program.data, &page.data),
            lifecycle: page.lifecycle.clone(),
            state: merge(&self.program.state, &page.state),
            actions: merge(&layout_actions, &page.actions),
            view,
            styles: merge(&self.program.styles, &page.styles),
            widgets: page.widgets.clone(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Named layouts, looked up by a page's `route.layout`.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: IndexMap<String, CompiledLayout>,
    options: CompileOptions,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        LayoutRegistry {
            layouts: IndexMap::new(),
            options,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, layout: CompiledLayout) -> Option<CompiledLayout> {
        self.layouts.insert(name.into(), layout)
    }

    /// Compiles `raw` as a layout and registers it under `name`.
    pub fn register(&mut self, name: impl Into<String>, raw: &Value) -> Result<(), CompileError> {
        let layout = compile_layout_with_options(raw, &self.options)?;
        self.insert(name, layout);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CompiledLayout> {
        self.layouts.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    /// Applies the page's layout, if it names one. Pages without
    /// `route.layout` come back unchanged.
    pub fn resolve(&self, page: &CompiledProgram) -> Result<CompiledProgram, CompileError> {
        let Some(name) = page.route.as_ref().and_then(|r| r.layout.as_deref()) else {
            return Ok(page.clone());
        };
        let Some(layout) = self.layouts.get(name) else {
            let error = ConstelaError::new(
                ErrorCode::LayoutNotFound,
                format!("Layout '{}' is not defined", name),
            )
            .at("/route/layout")
            .with_suggestion(did_you_mean(name, self.names(), self.options.suggestion_distance))
            .with_context("layout", name);
            return Err(error.into());
        };

        log::trace!("[constela] resolving layout '{}'", name);
        Ok(layout.apply(page)?)
    }
}
