//! Scoped on-disk store for remapped artifacts.
//!
//! Layout mirrors a local dependency repository:
//! `<root>/<group path>/<name>/<version>/` holds the output archive and a
//! small JSON descriptor. Presence of both is the cache contract; content is
//! never hashed. The root differs by scope: per-project or shared/global.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a batch's outputs live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreScope {
    /// Output files are stored per project.
    Project,
    /// Output files are stored in the shared user-wide root.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub group: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    group: String,
}

impl ArtifactStore {
    pub fn open(root: impl Into<PathBuf>, group: impl Into<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store root: {}", root.display()))?;
        Ok(Self {
            root,
            group: group.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, name: &str, version: &str) -> PathBuf {
        let mut dir = self.root.clone();
        for part in self.group.split('.') {
            dir.push(part);
        }
        dir.join(name).join(version)
    }

    pub fn jar_path(&self, name: &str, version: &str) -> PathBuf {
        self.artifact_dir(name, version)
            .join(format!("{name}-{version}.jar"))
    }

    pub fn descriptor_path(&self, name: &str, version: &str) -> PathBuf {
        self.artifact_dir(name, version)
            .join(format!("{name}-{version}.json"))
    }

    /// The cache key: descriptor and archive both present.
    pub fn exists(&self, name: &str, version: &str) -> bool {
        self.descriptor_path(name, version).exists() && self.jar_path(name, version).exists()
    }

    /// Records a successfully produced artifact. Written only after the
    /// archive itself is complete, so a descriptor never outlives a missing
    /// output for long-lived entries.
    pub fn save_descriptor(&self, name: &str, version: &str) -> Result<()> {
        let descriptor = ArtifactDescriptor {
            group: self.group.clone(),
            name: name.to_string(),
            version: version.to_string(),
        };
        let path = self.descriptor_path(name, version);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create artifact directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(&descriptor)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write descriptor: {}", path.display()))
    }

    /// Removes the archive and descriptor. Missing files are not an error.
    pub fn delete(&self, name: &str, version: &str) -> Result<()> {
        remove_file_if_exists(&self.jar_path(name, version), "artifact")?;
        remove_file_if_exists(&self.descriptor_path(name, version), "descriptor")?;
        Ok(())
    }

    /// Every descriptor currently present under the root, sorted.
    pub fn list(&self) -> Result<Vec<ArtifactDescriptor>> {
        let mut found = Vec::new();
        let walker = ignore::WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .build();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
                let descriptor: ArtifactDescriptor = serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse descriptor: {}", path.display()))?;
                found.push(descriptor);
            }
        }
        found.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
        Ok(found)
    }
}

fn remove_file_if_exists(path: &Path, kind: &str) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove {kind} file: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "jarmap_store_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    #[test]
    fn exists_requires_both_descriptor_and_archive() -> Result<()> {
        let root = temp_root("exists");
        let store = ArtifactStore::open(&root, "net.minecraft")?;

        assert!(!store.exists("minecraft-merged", "1.20.1-test"));

        store.save_descriptor("minecraft-merged", "1.20.1-test")?;
        assert!(!store.exists("minecraft-merged", "1.20.1-test"));

        let jar = store.jar_path("minecraft-merged", "1.20.1-test");
        fs::write(&jar, b"jar")?;
        assert!(store.exists("minecraft-merged", "1.20.1-test"));

        let _ = fs::remove_dir_all(root);
        Ok(())
    }

    #[test]
    fn delete_is_idempotent() -> Result<()> {
        let root = temp_root("delete");
        let store = ArtifactStore::open(&root, "net.minecraft")?;

        store.save_descriptor("common", "1.0-x")?;
        fs::write(store.jar_path("common", "1.0-x"), b"jar")?;
        store.delete("common", "1.0-x")?;
        assert!(!store.exists("common", "1.0-x"));
        store.delete("common", "1.0-x")?;

        let _ = fs::remove_dir_all(root);
        Ok(())
    }

    #[test]
    fn layout_nests_group_name_version() -> Result<()> {
        let root = temp_root("layout");
        let store = ArtifactStore::open(&root, "net.minecraft")?;
        let jar = store.jar_path("minecraft-common", "1.20.1-yarn.abc");
        assert_eq!(
            jar,
            root.join("net/minecraft/minecraft-common/1.20.1-yarn.abc/minecraft-common-1.20.1-yarn.abc.jar")
        );
        let _ = fs::remove_dir_all(root);
        Ok(())
    }

    #[test]
    fn list_returns_sorted_descriptors() -> Result<()> {
        let root = temp_root("list");
        let store = ArtifactStore::open(&root, "net.minecraft")?;
        store.save_descriptor("b-name", "1")?;
        store.save_descriptor("a-name", "2")?;

        let names: Vec<String> = store.list()?.into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a-name".to_string(), "b-name".to_string()]);

        let _ = fs::remove_dir_all(root);
        Ok(())
    }
}
