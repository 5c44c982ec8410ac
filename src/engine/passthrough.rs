// src/engine/passthrough.rs

//! Identity engine

use super::{ClassPayload, RewriteEngine};
use tracing::{debug, info};

/// Engine that returns every class unchanged
///
/// Transformers are accepted and kept but never applied. Useful for
/// verifying classpath plumbing without a real rewrite engine, and as the
/// engine behind the command-line front end.
pub struct PassthroughEngine<S> {
    transformers: Vec<(String, S)>,
    classes: Vec<ClassPayload>,
}

impl<S> PassthroughEngine<S> {
    pub fn new() -> Self {
        Self {
            transformers: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Names of registered transformers, in registration order
    pub fn transformer_names(&self) -> Vec<&str> {
        self.transformers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of classes waiting for `process`
    pub fn pending_classes(&self) -> usize {
        self.classes.len()
    }
}

impl<S> Default for PassthroughEngine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RewriteEngine for PassthroughEngine<S> {
    type Script = S;

    fn register_transformer(&mut self, name: &str, script: S) {
        debug!("Registered transformer {}", name);
        self.transformers.push((name.to_string(), script));
    }

    fn register_class(&mut self, payload: ClassPayload) {
        self.classes.push(payload);
    }

    fn process(&mut self) -> anyhow::Result<Vec<ClassPayload>> {
        info!(
            "Passing {} classes through unchanged ({} transformers ignored)",
            self.pending_classes(),
            self.transformers.len()
        );
        debug!("Ignored transformers: {:?}", self.transformer_names());
        Ok(std::mem::take(&mut self.classes))
    }
}
