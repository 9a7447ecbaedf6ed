//! Build-shape strategies. A variant only decides the remap unit list and
//! any extra engine hooks for a unit; cache validity and failure cleanup
//! live in the orchestrator and are shared by every variant.

use std::path::PathBuf;

use crate::engine::EngineHook;
use crate::namespace::Namespace;
use crate::unit::{Environment, JarKind, RemapUnit};

#[derive(Debug, Clone)]
pub enum Variant {
    /// One combined archive.
    Merged { merged_jar: PathBuf },
    /// Separate common and client-only archives. The client-only half
    /// resolves shared symbols against the common pre-remap input.
    Split {
        common_jar: PathBuf,
        client_only_jar: PathBuf,
    },
    /// A client-only or server-only build of an engine that ships both.
    SingleJar { env: Environment, jar: PathBuf },
    /// Merged through the glue namespace instead of official.
    Glued { merged_jar: PathBuf },
}

impl Variant {
    /// Plans the batch. Sibling inputs are all original pre-remap archives,
    /// so units within one batch never read each other's outputs.
    pub fn remap_units(&self) -> Vec<RemapUnit> {
        match self {
            Variant::Merged { merged_jar } => vec![RemapUnit::new(
                merged_jar,
                JarKind::Merged,
                Namespace::Official,
            )],
            Variant::Split {
                common_jar,
                client_only_jar,
            } => vec![
                RemapUnit::new(common_jar, JarKind::Common, Namespace::Official),
                RemapUnit::new(client_only_jar, JarKind::ClientOnly, Namespace::Official)
                    .with_classpath(common_jar),
            ],
            Variant::SingleJar { env, jar } => {
                vec![RemapUnit::new(jar, env.jar_kind(), Namespace::Official)]
            }
            Variant::Glued { merged_jar } => vec![RemapUnit::new(
                merged_jar,
                JarKind::Merged,
                Namespace::Glue,
            )],
        }
    }

    /// Appends variant-specific hooks for one unit.
    ///
    /// The split assertions are internal invariants: a split output is never
    /// merged, and a client-including output must not include the server.
    /// Violations are planner bugs, not recoverable errors.
    pub fn configure_engine(&self, unit: &RemapUnit, hooks: &mut Vec<EngineHook>) {
        if let Variant::Split { .. } = self {
            assert!(
                !unit.output.is_merged(),
                "split variant planned a merged output"
            );
            if unit.output.includes_client() {
                assert!(
                    !unit.output.includes_server(),
                    "split output includes both environments"
                );
                hooks.push(EngineHook::MarkSided(Environment::Client));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_plans_one_official_unit() {
        let units = Variant::Merged {
            merged_jar: "merged.jar".into(),
        }
        .remap_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].output, JarKind::Merged);
        assert_eq!(units[0].source, Namespace::Official);
        assert!(units[0].classpath.is_empty());
    }

    #[test]
    fn split_plans_common_before_client_only() {
        let units = Variant::Split {
            common_jar: "common.jar".into(),
            client_only_jar: "client.jar".into(),
        }
        .remap_units();
        assert_eq!(units.len(), 2);

        assert_eq!(units[0].output, JarKind::Common);
        assert!(units[0].classpath.is_empty());

        assert_eq!(units[1].output, JarKind::ClientOnly);
        assert_eq!(units[1].classpath, vec![PathBuf::from("common.jar")]);
    }

    #[test]
    fn single_jar_plans_the_requested_environment() {
        let units = Variant::SingleJar {
            env: Environment::Server,
            jar: "server.jar".into(),
        }
        .remap_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].output, JarKind::ServerOnly);
    }

    #[test]
    fn glued_plans_from_the_glue_namespace() {
        let units = Variant::Glued {
            merged_jar: "glued.jar".into(),
        }
        .remap_units();
        assert_eq!(units[0].source, Namespace::Glue);
        assert_eq!(units[0].output, JarKind::Merged);
    }

    #[test]
    fn split_marks_client_including_outputs() {
        let variant = Variant::Split {
            common_jar: "common.jar".into(),
            client_only_jar: "client.jar".into(),
        };
        let units = variant.remap_units();

        let mut hooks = Vec::new();
        variant.configure_engine(&units[0], &mut hooks);
        assert!(hooks.is_empty());

        variant.configure_engine(&units[1], &mut hooks);
        assert_eq!(hooks, vec![EngineHook::MarkSided(Environment::Client)]);
    }

    #[test]
    #[should_panic(expected = "split variant planned a merged output")]
    fn split_rejects_merged_outputs() {
        let variant = Variant::Split {
            common_jar: "common.jar".into(),
            client_only_jar: "client.jar".into(),
        };
        let bogus = RemapUnit::new("merged.jar", JarKind::Merged, Namespace::Official);
        variant.configure_engine(&bogus, &mut Vec::new());
    }

    #[test]
    fn other_variants_add_no_hooks() {
        let variant = Variant::Merged {
            merged_jar: "merged.jar".into(),
        };
        let units = variant.remap_units();
        let mut hooks = Vec::new();
        variant.configure_engine(&units[0], &mut hooks);
        assert!(hooks.is_empty());
    }
}
