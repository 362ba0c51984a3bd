use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::compile::compile_str_with_options;
use crate::error::CompileError;
use crate::ir::CompiledProgram;
use crate::options::CompileOptions;

pub type CompileResult = Result<CompiledProgram, CompileError>;

/// Memoizes compile outcomes by content. Safe to share across threads; the
/// compiler itself stays stateless.
#[derive(Debug, Default)]
pub struct CompileCache {
    entries: RwLock<HashMap<String, CompileResult>>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex SHA-256 over the options and the source text. Options are part of
    /// the key because they change which programs are accepted.
    pub fn fingerprint(source: &str, options: &CompileOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(options.max_depth.to_le_bytes());
        hasher.update(options.suggestion_distance.to_le_bytes());
        hasher.update(options.max_expanded_nodes.to_le_bytes());
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, fingerprint: &str) -> Option<CompileResult> {
        match self.entries.read() {
            Ok(entries) => entries.get(fingerprint).cloned(),
            Err(poisoned) => poisoned.into_inner().get(fingerprint).cloned(),
        }
    }

    pub fn insert(&self, fingerprint: String, result: CompileResult) {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(fingerprint, result);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(fingerprint, result);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached outcome for `source`, compiling it on a miss.
    /// Returns the fingerprint alongside so callers can report it.
    pub fn compile(&self, source: &str, options: &CompileOptions) -> (String, CompileResult) {
        let fingerprint = Self::fingerprint(source, options);
        if let Some(hit) = self.get(&fingerprint) {
            log::trace!("[constela] cache hit {}", &fingerprint[..12]);
            return (fingerprint, hit);
        }

        let result = compile_str_with_options(source, options);
        self.insert(fingerprint.clone(), result.clone());
        (fingerprint, result)
    }
}
