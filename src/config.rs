//! Explicit configuration for the remap pipeline. Everything the
//! orchestrator and planners consult is passed in here; there are no
//! ambient or global lookups.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::store::StoreScope;

pub const DEFAULT_GROUP: &str = "net.minecraft";

/// The active mappings and the identifier derived from them. The identifier
/// participates in every artifact version string, so changing the mappings
/// name or file content invalidates all cached outputs.
#[derive(Debug, Clone)]
pub struct MappingConfiguration {
    path: PathBuf,
    name: String,
    identifier: String,
}

impl MappingConfiguration {
    /// Reads the mappings file once to derive the identifier.
    pub fn load(path: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let name = name.into();
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read mappings file: {}", path.display()))?;
        let digest = hex::encode(Sha256::digest(&bytes));
        let identifier = format!("{}.{}", name, &digest[..12]);
        Ok(Self {
            path,
            name,
            identifier,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone)]
pub struct RemapConfig {
    pub group: String,
    pub minecraft_version: String,
    pub mappings: MappingConfiguration,
    /// Platform runtime archives fed to the engine as classpath before any
    /// per-unit extras.
    pub runtime_classpath: Vec<PathBuf>,
    pub local_repo_root: PathBuf,
    pub global_repo_root: PathBuf,
}

impl RemapConfig {
    pub fn new(
        minecraft_version: impl Into<String>,
        mappings: MappingConfiguration,
        local_repo_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            group: DEFAULT_GROUP.to_string(),
            minecraft_version: minecraft_version.into(),
            mappings,
            runtime_classpath: Vec::new(),
            local_repo_root: local_repo_root.into(),
            global_repo_root: default_global_repo_root()?,
        })
    }

    /// Version string shared by every artifact of this configuration.
    pub fn version(&self) -> String {
        format!("{}-{}", self.minecraft_version, self.mappings.identifier())
    }

    pub fn store_root(&self, scope: StoreScope) -> &Path {
        match scope {
            StoreScope::Project => &self.local_repo_root,
            StoreScope::Global => &self.global_repo_root,
        }
    }
}

pub fn default_global_repo_root() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("jarmap").join("repo"))
}

pub fn default_local_repo_root(project_dir: &Path) -> PathBuf {
    project_dir.join(".jarmap").join("repo")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "jarmap_config_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn identifier_tracks_name_and_content() -> Result<()> {
        let a = temp_file("mappings_a.tiny", b"class a -> Alpha");
        let b = temp_file("mappings_b.tiny", b"class a -> Beta");

        let named_a = MappingConfiguration::load(&a, "yarn")?;
        let renamed_a = MappingConfiguration::load(&a, "mojmap")?;
        let named_b = MappingConfiguration::load(&b, "yarn")?;

        assert!(named_a.identifier().starts_with("yarn."));
        assert_ne!(named_a.identifier(), renamed_a.identifier());
        assert_ne!(named_a.identifier(), named_b.identifier());

        let _ = std::fs::remove_file(a);
        let _ = std::fs::remove_file(b);
        Ok(())
    }

    #[test]
    fn version_combines_game_version_and_identifier() -> Result<()> {
        let mappings = temp_file("mappings_v.tiny", b"v");
        let config = RemapConfig::new(
            "1.20.1",
            MappingConfiguration::load(&mappings, "yarn")?,
            std::env::temp_dir().join("jarmap-local-repo"),
        )?;
        let version = config.version();
        assert!(version.starts_with("1.20.1-yarn."));

        let _ = std::fs::remove_file(mappings);
        Ok(())
    }
}
