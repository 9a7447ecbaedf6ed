use std::fmt::{self, Display, Formatter};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A symbol-naming scheme that class and member names can be expressed in.
///
/// A remap unit names its own source namespace; the target namespace is fixed
/// per batch. There is no global ordering between namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// The obfuscated names the game ships with.
    Official,
    /// Stable intermediate names; the platform's default symbolic namespace.
    Intermediary,
    /// Human-readable names.
    Named,
    /// Names carried by archives merged through the glue step.
    Glue,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Official => "official",
            Namespace::Intermediary => "intermediary",
            Namespace::Named => "named",
            Namespace::Glue => "glue",
        }
    }

    /// Whether names in this namespace are the platform's default symbolic
    /// names. The remap engine relaxes lookups for every other namespace.
    pub fn is_platform_default(self) -> bool {
        self == Namespace::Intermediary
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
