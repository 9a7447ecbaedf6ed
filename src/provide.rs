//! The remap orchestration pipeline.
//!
//! One orchestrator serves every variant: it decides whether a batch of
//! remap units is already satisfied by the artifact store, otherwise runs
//! the external engine once per unit, and registers dependency coordinates
//! afterward. Caching is all-or-nothing per batch: if any unit is stale,
//! every output is deleted and every unit is rebuilt, so a batch's outputs
//! are always on the same mapping identifier.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::config::RemapConfig;
use crate::engine::{EngineFactory, EngineGuard, EngineHook, EngineRequest, SignatureProvider};
use crate::namespace::Namespace;
use crate::store::{ArtifactStore, StoreScope};
use crate::unit::{JarKind, RemapUnit};
use crate::variant::Variant;

/// Logical artifact name for one output of a batch. Named outputs keep the
/// plain product prefix; every other namespace is spelled out.
pub fn logical_name(target: Namespace, kind: JarKind) -> String {
    if target == Namespace::Named {
        format!("minecraft-{}", kind.name())
    } else {
        format!("{}-{}", target.as_str(), kind.name())
    }
}

/// A dependency slot one remapped output should be registered into.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyTarget {
    pub kind: JarKind,
    pub slot: String,
}

/// External dependency-registration collaborator.
pub trait DependencySink {
    fn register(&mut self, coordinate: &str, slot: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RemapRequest {
    pub variant: Variant,
    pub target: Namespace,
    pub scope: StoreScope,
    /// Declared by the caller planning this batch; when empty, dependency
    /// registration is skipped entirely.
    pub dependency_targets: Vec<DependencyTarget>,
}

pub struct RemapOrchestrator<'a> {
    config: &'a RemapConfig,
    engines: &'a dyn EngineFactory,
    signatures: &'a dyn SignatureProvider,
}

impl<'a> RemapOrchestrator<'a> {
    pub fn new(
        config: &'a RemapConfig,
        engines: &'a dyn EngineFactory,
        signatures: &'a dyn SignatureProvider,
    ) -> Self {
        Self {
            config,
            engines,
            signatures,
        }
    }

    /// Ensures every output of the request exists in the store, remapping
    /// where needed, then optionally registers dependency coordinates.
    ///
    /// Existence is the cache key; content is never hashed. On any per-unit
    /// failure all batch outputs are deleted before the error propagates, so
    /// no partially remapped artifact is ever left behind.
    pub fn provide(
        &self,
        request: &RemapRequest,
        refresh: bool,
        mut dependencies: Option<&mut dyn DependencySink>,
    ) -> Result<()> {
        let units = request.variant.remap_units();
        assert!(!units.is_empty(), "variant planned no remap units");

        let store = self.open_store(request.scope)?;
        let version = self.config.version();

        if refresh || !self.outputs_valid(&store, request.target, &units, &version) {
            if let Err(err) = self.remap_inputs(&store, request, &units, &version) {
                self.clean_outputs(&store, request.target, &units, &version)
                    .context("Failed to clean outputs after remap failure")?;
                return Err(err.context("Failed to remap game archives"));
            }
        }

        if let Some(sink) = dependencies.as_deref_mut() {
            if request.dependency_targets.is_empty() {
                return Ok(());
            }
            for target in &request.dependency_targets {
                let coordinate = format!(
                    "{}:{}:{}",
                    self.config.group,
                    logical_name(request.target, target.kind),
                    version
                );
                sink.register(&coordinate, &target.slot)?;
            }
        }

        Ok(())
    }

    /// Output path a unit of this request will be written to.
    pub fn output_jar(&self, scope: StoreScope, target: Namespace, kind: JarKind) -> Result<PathBuf> {
        let store = self.open_store(scope)?;
        Ok(store.jar_path(&logical_name(target, kind), &self.config.version()))
    }

    fn open_store(&self, scope: StoreScope) -> Result<ArtifactStore> {
        ArtifactStore::open(self.config.store_root(scope), &self.config.group)
    }

    fn outputs_valid(
        &self,
        store: &ArtifactStore,
        target: Namespace,
        units: &[RemapUnit],
        version: &str,
    ) -> bool {
        units
            .iter()
            .all(|unit| store.exists(&logical_name(target, unit.output), version))
    }

    fn remap_inputs(
        &self,
        store: &ArtifactStore,
        request: &RemapRequest,
        units: &[RemapUnit],
        version: &str,
    ) -> Result<()> {
        self.clean_outputs(store, request.target, units, version)?;

        for unit in units {
            self.remap_jar(store, request, unit, version)?;
        }
        Ok(())
    }

    fn remap_jar(
        &self,
        store: &ArtifactStore,
        request: &RemapRequest,
        unit: &RemapUnit,
        version: &str,
    ) -> Result<()> {
        let name = logical_name(request.target, unit.output);
        let output_path = store.jar_path(&name, version);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create artifact directory: {}", parent.display())
            })?;
        }
        if output_path.exists() {
            fs::remove_file(&output_path).with_context(|| {
                format!("Failed to remove stale output: {}", output_path.display())
            })?;
        }

        let signatures = self
            .signatures
            .remapped_signatures(request.target.is_platform_default(), request.target)?;
        let mut hooks = vec![EngineHook::FixSignatures(signatures)];
        request.variant.configure_engine(unit, &mut hooks);

        let engine = self.engines.create(EngineRequest {
            source: unit.source,
            target: request.target,
            source_is_platform_default: unit.source.is_platform_default(),
            hooks,
        })?;
        let mut engine = EngineGuard::new(engine);

        self.run_engine(&mut engine, unit, &output_path)
            .with_context(|| {
                format!(
                    "Failed to remap {} with mappings from {}",
                    unit.input.display(),
                    self.config.mappings.path().display()
                )
            })?;
        drop(engine);

        store.save_descriptor(&name, version)
    }

    fn run_engine(
        &self,
        engine: &mut EngineGuard,
        unit: &RemapUnit,
        output_path: &std::path::Path,
    ) -> Result<()> {
        engine.add_non_class_files(&unit.input)?;
        for path in &self.config.runtime_classpath {
            engine.read_classpath(path)?;
        }
        for path in &unit.classpath {
            engine.read_classpath(path)?;
        }
        engine.read_inputs(&unit.input)?;
        engine.apply(output_path)
    }

    fn clean_outputs(
        &self,
        store: &ArtifactStore,
        target: Namespace,
        units: &[RemapUnit],
        version: &str,
    ) -> Result<()> {
        for unit in units {
            store.delete(&logical_name(target, unit.output), version)?;
        }
        Ok(())
    }
}
