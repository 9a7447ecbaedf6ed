use anyhow::{Context, Result};
use clap::Parser;
use jarmap::cli::{Cli, Commands, VariantKind};
use jarmap::config::{
    MappingConfiguration, RemapConfig, default_global_repo_root, default_local_repo_root,
};
use jarmap::linemap::LineMapTable;
use jarmap::namespace::Namespace;
use jarmap::provide::logical_name;
use jarmap::rewrite::LineNumberRewriter;
use jarmap::store::{ArtifactDescriptor, ArtifactStore, StoreScope};
use jarmap::unit::Environment;
use jarmap::variant::Variant;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.clone() {
        Commands::RemapLines {
            line_map,
            input,
            output,
        } => {
            let result = remap_lines(&line_map, &input, &output)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Plan {
            variant,
            target,
            scope,
            minecraft_version,
            mappings,
            mappings_name,
            merged_jar,
            common_jar,
            client_only_jar,
            env_jar,
        } => {
            let variant = build_variant(variant, merged_jar, common_jar, client_only_jar, env_jar)?;
            let config = build_config(minecraft_version, &mappings, mappings_name)?;
            let root = resolve_store_root(&cli, &config, scope);
            let plan = build_plan(&config, &root, &variant, target)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Stats { scope } => {
            let root = match (cli.store_root.clone(), scope) {
                (Some(root), _) => root,
                (None, StoreScope::Global) => default_global_repo_root()?,
                (None, StoreScope::Project) => default_local_repo_root(
                    &std::env::current_dir().context("Failed to resolve working directory")?,
                ),
            };
            let stats = store_stats(&root)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct RemapLinesResult {
    input: String,
    output: String,
    mapped_classes: usize,
    classes_rewritten: usize,
    entries_copied: usize,
    duration_ms: u64,
}

fn remap_lines(line_map: &Path, input: &Path, output: &Path) -> Result<RemapLinesResult> {
    let start = Instant::now();
    let table = LineMapTable::from_path(line_map)?;
    let summary = LineNumberRewriter::new(&table).process(input, output)?;

    Ok(RemapLinesResult {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        mapped_classes: table.len(),
        classes_rewritten: summary.classes_rewritten,
        entries_copied: summary.entries_copied,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn build_variant(
    kind: VariantKind,
    merged_jar: Option<PathBuf>,
    common_jar: Option<PathBuf>,
    client_only_jar: Option<PathBuf>,
    env_jar: Option<PathBuf>,
) -> Result<Variant> {
    Ok(match kind {
        VariantKind::Merged => Variant::Merged {
            merged_jar: required(merged_jar, "--merged-jar")?,
        },
        VariantKind::Split => Variant::Split {
            common_jar: required(common_jar, "--common-jar")?,
            client_only_jar: required(client_only_jar, "--client-only-jar")?,
        },
        VariantKind::SingleClient => Variant::SingleJar {
            env: Environment::Client,
            jar: required(env_jar, "--env-jar")?,
        },
        VariantKind::SingleServer => Variant::SingleJar {
            env: Environment::Server,
            jar: required(env_jar, "--env-jar")?,
        },
        VariantKind::Glued => Variant::Glued {
            merged_jar: required(merged_jar, "--merged-jar")?,
        },
    })
}

fn required(value: Option<PathBuf>, flag: &str) -> Result<PathBuf> {
    value.with_context(|| format!("{flag} is required for this variant"))
}

fn build_config(
    minecraft_version: String,
    mappings: &Path,
    mappings_name: String,
) -> Result<RemapConfig> {
    let mappings = MappingConfiguration::load(mappings, mappings_name)?;
    let project_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    RemapConfig::new(
        minecraft_version,
        mappings,
        default_local_repo_root(&project_dir),
    )
}

fn resolve_store_root(cli: &Cli, config: &RemapConfig, scope: StoreScope) -> PathBuf {
    cli.store_root
        .clone()
        .unwrap_or_else(|| config.store_root(scope).to_path_buf())
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    version: String,
    units: Vec<PlannedUnit>,
}

#[derive(Debug, Serialize)]
struct PlannedUnit {
    name: String,
    input: String,
    source: Namespace,
    output_jar: String,
    classpath: Vec<String>,
}

fn build_plan(
    config: &RemapConfig,
    store_root: &Path,
    variant: &Variant,
    target: Namespace,
) -> Result<PlanOutput> {
    let store = ArtifactStore::open(store_root, &config.group)?;
    let version = config.version();

    let units = variant
        .remap_units()
        .into_iter()
        .map(|unit| {
            let name = logical_name(target, unit.output);
            let output_jar = store.jar_path(&name, &version);
            PlannedUnit {
                name,
                input: unit.input.to_string_lossy().to_string(),
                source: unit.source,
                output_jar: output_jar.to_string_lossy().to_string(),
                classpath: unit
                    .classpath
                    .iter()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect(),
            }
        })
        .collect();

    Ok(PlanOutput { version, units })
}

#[derive(Debug, Serialize)]
struct StoreStats {
    root: String,
    artifact_count: usize,
    artifacts: Vec<ArtifactDescriptor>,
}

fn store_stats(root: &Path) -> Result<StoreStats> {
    let store = ArtifactStore::open(root, jarmap::config::DEFAULT_GROUP)?;
    let artifacts = store.list()?;
    Ok(StoreStats {
        root: root.to_string_lossy().to_string(),
        artifact_count: artifacts.len(),
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_reports_the_missing_flag() {
        let err = required(None, "--merged-jar").unwrap_err();
        assert!(format!("{err}").contains("--merged-jar"));
        assert_eq!(
            required(Some(PathBuf::from("a.jar")), "--merged-jar").unwrap(),
            PathBuf::from("a.jar")
        );
    }

    #[test]
    fn build_variant_rejects_missing_inputs() {
        assert!(build_variant(VariantKind::Split, None, None, None, None).is_err());
        let variant = build_variant(
            VariantKind::Split,
            None,
            Some("common.jar".into()),
            Some("client.jar".into()),
            None,
        )
        .unwrap();
        assert!(matches!(variant, Variant::Split { .. }));
    }
}
