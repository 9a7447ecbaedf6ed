use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::namespace::Namespace;
use crate::store::StoreScope;

#[derive(Debug, Clone, Parser)]
#[command(name = "jarmap")]
#[command(about = "Remap game archives between naming schemes and realign debug line numbers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the artifact store root for the selected scope.
    #[arg(long, value_name = "DIR")]
    pub store_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Rewrite debug line numbers in a compiled tree or jar.
    RemapLines {
        #[arg(long, value_name = "FILE")]
        line_map: PathBuf,

        input: PathBuf,

        output: PathBuf,
    },
    /// Compute the remap units for a variant without executing anything.
    Plan {
        #[arg(long, value_enum)]
        variant: VariantKind,

        #[arg(long, value_enum, default_value_t = Namespace::Named)]
        target: Namespace,

        #[arg(long, value_enum, default_value = "global")]
        scope: StoreScope,

        #[arg(long, value_name = "VER")]
        minecraft_version: String,

        #[arg(long, value_name = "FILE")]
        mappings: PathBuf,

        #[arg(long, value_name = "NAME", default_value = "mappings")]
        mappings_name: String,

        #[arg(long, value_name = "JAR")]
        merged_jar: Option<PathBuf>,

        #[arg(long, value_name = "JAR")]
        common_jar: Option<PathBuf>,

        #[arg(long, value_name = "JAR")]
        client_only_jar: Option<PathBuf>,

        #[arg(long, value_name = "JAR")]
        env_jar: Option<PathBuf>,
    },
    /// List the artifacts present in a store root.
    Stats {
        #[arg(long, value_enum, default_value = "global")]
        scope: StoreScope,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum VariantKind {
    Merged,
    Split,
    SingleClient,
    SingleServer,
    Glued,
}
