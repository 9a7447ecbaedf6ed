//! Call contract for the external bytecode remap engine.
//!
//! The engine itself lives outside this crate; everything here is the shape
//! of one engine run: construction parameters, the ordered post-apply hook
//! list, and the call sequence the orchestrator drives. An engine instance
//! is never reused across units and is finalized on every exit path.

use anyhow::Result;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::namespace::Namespace;
use crate::unit::Environment;

/// Post-apply transform hooks, applied by the engine in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineHook {
    /// Replace recorded generic signature strings per the given rename table.
    FixSignatures(HashMap<String, String>),
    /// Mark every class in the output as restricted to one environment.
    MarkSided(Environment),
}

/// Construction parameters for one engine run.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub source: Namespace,
    pub target: Namespace,
    /// True when the source namespace carries the platform's default
    /// symbolic names; the engine widens member lookups otherwise.
    pub source_is_platform_default: bool,
    pub hooks: Vec<EngineHook>,
}

/// One engine run. Calls arrive in a fixed order: resource passthrough,
/// classpath registration (any number of times), input read, apply.
pub trait RemapEngine {
    /// Copies the non-class payload of `input` into the output verbatim.
    fn add_non_class_files(&mut self, input: &Path) -> Result<()>;

    /// Registers an archive for symbol resolution only; never remapped.
    fn read_classpath(&mut self, path: &Path) -> Result<()>;

    fn read_inputs(&mut self, input: &Path) -> Result<()>;

    fn apply(&mut self, output: &Path) -> Result<()>;

    /// Releases engine resources. Invoked exactly once per run.
    fn finish(&mut self);
}

pub trait EngineFactory {
    fn create(&self, request: EngineRequest) -> Result<Box<dyn RemapEngine>>;
}

/// Signature-correction collaborator. Produces the rename table for classes
/// renamed to or through the target namespace; injected into the engine as
/// the first post-apply hook.
pub trait SignatureProvider {
    fn remapped_signatures(
        &self,
        target_is_platform_default: bool,
        target: Namespace,
    ) -> Result<HashMap<String, String>>;
}

/// Signature provider with nothing to correct.
pub struct NoSignatures;

impl SignatureProvider for NoSignatures {
    fn remapped_signatures(
        &self,
        _target_is_platform_default: bool,
        _target: Namespace,
    ) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

/// Finalizes the wrapped engine when dropped, so resources are released on
/// success, engine failure and post-processing failure alike.
pub struct EngineGuard {
    engine: Box<dyn RemapEngine>,
}

impl EngineGuard {
    pub fn new(engine: Box<dyn RemapEngine>) -> Self {
        Self { engine }
    }
}

impl Deref for EngineGuard {
    type Target = dyn RemapEngine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref()
    }
}

impl DerefMut for EngineGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine.as_mut()
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        self.engine.finish();
    }
}
