// src/engine/mod.rs

//! Rewrite engine interface
//!
//! The engine that actually rewrites classes lives outside this crate. The
//! pipeline only needs to hand it transformers and class payloads, then ask
//! for the final list of payloads once. Any type implementing
//! [`RewriteEngine`] can be plugged in.
//!
//! # Contract
//!
//! - All transformers are registered before the first class.
//! - `process` is called exactly once, after all registrations.
//! - Each returned payload keeps the provenance it was registered with
//!   unless the engine deliberately reassigns it. Payloads the engine
//!   creates from nothing should carry [`Provenance::Unassigned`].

mod passthrough;

pub use passthrough::PassthroughEngine;

use crate::provenance::Provenance;

/// A class payload with its routing metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPayload {
    /// Raw class file bytes
    pub bytes: Vec<u8>,
    /// Output container the payload belongs to
    pub provenance: Provenance,
}

impl ClassPayload {
    pub fn new(bytes: Vec<u8>, provenance: Provenance) -> Self {
        Self { bytes, provenance }
    }
}

/// Common interface for class rewrite engines
pub trait RewriteEngine {
    /// Parsed transformer type this engine accepts
    type Script;

    /// Register a parsed transformer
    ///
    /// Registration order is discovery order and may decide which
    /// transformer wins when rewrites overlap.
    fn register_transformer(&mut self, name: &str, script: Self::Script);

    /// Register a class payload for processing
    fn register_class(&mut self, payload: ClassPayload);

    /// Run all transformers over all registered classes
    ///
    /// A single blocking call; on error no partial result is used.
    fn process(&mut self) -> anyhow::Result<Vec<ClassPayload>>;
}
