use std::path::PathBuf;

use serde::Serialize;

use crate::namespace::Namespace;

/// The shape of one output archive of a remap batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JarKind {
    /// Client and server combined into one archive.
    Merged,
    /// The server plus everything the client shares with it.
    Common,
    ClientOnly,
    ServerOnly,
}

impl JarKind {
    /// Stable lowercase name used in logical artifact names.
    pub fn name(self) -> &'static str {
        match self {
            JarKind::Merged => "merged",
            JarKind::Common => "common",
            JarKind::ClientOnly => "client-only",
            JarKind::ServerOnly => "server-only",
        }
    }

    pub fn includes_client(self) -> bool {
        matches!(self, JarKind::Merged | JarKind::ClientOnly)
    }

    pub fn includes_server(self) -> bool {
        matches!(self, JarKind::Merged | JarKind::Common | JarKind::ServerOnly)
    }

    pub fn is_merged(self) -> bool {
        matches!(self, JarKind::Merged)
    }
}

/// A runtime environment a class can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Client,
    Server,
}

impl Environment {
    pub fn jar_kind(self) -> JarKind {
        match self {
            Environment::Client => JarKind::ClientOnly,
            Environment::Server => JarKind::ServerOnly,
        }
    }
}

/// One input-archive-to-output-archive remap job.
///
/// Units are immutable once planned. A unit may list sibling pre-remap inputs
/// as extra classpath; those archives are read for symbol resolution only and
/// are never remapped by this unit.
#[derive(Debug, Clone, Serialize)]
pub struct RemapUnit {
    pub input: PathBuf,
    pub output: JarKind,
    pub source: Namespace,
    pub classpath: Vec<PathBuf>,
}

impl RemapUnit {
    pub fn new(input: impl Into<PathBuf>, output: JarKind, source: Namespace) -> Self {
        Self {
            input: input.into(),
            output,
            source,
            classpath: Vec::new(),
        }
    }

    pub fn with_classpath(mut self, entry: impl Into<PathBuf>) -> Self {
        self.classpath.push(entry.into());
        self
    }
}
