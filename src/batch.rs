//! Parallel compilation of independent sources.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::{CompileCache, CompileResult};
use crate::options::CompileOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInput {
    /// Caller's label for the source, usually a file path.
    pub name: String,
    pub source: String,
}

impl BatchInput {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        BatchInput {
            name: name.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub name: String,
    pub fingerprint: String,
    pub result: CompileResult,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes come back in input order. Identical sources share one cache
/// entry; two identical sources racing on a miss may both compile, which
/// only costs time.
pub fn compile_batch(inputs: &[BatchInput], options: &CompileOptions) -> Vec<BatchOutcome> {
    compile_batch_with_cache(inputs, options, &CompileCache::new())
}

pub fn compile_batch_with_cache(
    inputs: &[BatchInput],
    options: &CompileOptions,
    cache: &CompileCache,
) -> Vec<BatchOutcome> {
    let outcomes: Vec<BatchOutcome> = inputs
        .par_iter()
        .map(|input| {
            let (fingerprint, result) = cache.compile(&input.source, options);
            BatchOutcome {
                name: input.name.clone(),
                fingerprint,
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    log::debug!(
        "[constela] batch compiled {} source(s), {} failed, {} distinct",
        outcomes.len(),
        failed,
        cache.len()
    );
    outcomes
}
