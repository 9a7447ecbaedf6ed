//! Applies a [`LineMapTable`] to a compiled tree or archive.
//!
//! Classes are looked up by binary name truncated at the first `$`: only
//! enclosing class names are tracked, so inner classes share their outer
//! class's table. An entry with no record passes through byte-for-byte;
//! newly added classes are deliberately not an error.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use memmap2::Mmap;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::classfile;
use crate::linemap::LineMapTable;

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RewriteSummary {
    pub classes_rewritten: usize,
    pub entries_copied: usize,
}

pub struct LineNumberRewriter<'a> {
    table: &'a LineMapTable,
}

impl<'a> LineNumberRewriter<'a> {
    pub fn new(table: &'a LineMapTable) -> Self {
        Self { table }
    }

    /// Processes a directory tree or a jar, chosen by what `input` is.
    pub fn process(&self, input: &Path, output: &Path) -> Result<RewriteSummary> {
        if input.is_dir() {
            self.process_tree(input, output)
        } else {
            self.process_jar(input, output)
        }
    }

    /// Mirrors `input` into `output`, rewriting mapped classes along the way.
    /// Existing destination files are overwritten. Entries are independent,
    /// so the fan-out is parallel; the table is read-only throughout.
    pub fn process_tree(&self, input: &Path, output: &Path) -> Result<RewriteSummary> {
        let files = collect_files(input);

        let rewritten: Vec<bool> = files
            .par_iter()
            .map(|file| -> Result<bool> {
                let rel = file.strip_prefix(input).with_context(|| {
                    format!("walked file escapes the input root: {}", file.display())
                })?;
                let dst = output.join(rel);
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }

                let record = entry_class(&rel.to_string_lossy())
                    .and_then(|name| self.table.class(&name));
                match record {
                    Some(class_map) => {
                        let bytes = fs::read(file)
                            .with_context(|| format!("Failed to read class: {}", file.display()))?;
                        let patched = classfile::remap_line_numbers(&bytes, class_map)
                            .with_context(|| {
                                format!("Failed to rewrite line numbers: {}", file.display())
                            })?;
                        fs::write(&dst, patched)
                            .with_context(|| format!("Failed to write: {}", dst.display()))?;
                        Ok(true)
                    }
                    None => {
                        fs::copy(file, &dst).with_context(|| {
                            format!("Failed to copy {} -> {}", file.display(), dst.display())
                        })?;
                        Ok(false)
                    }
                }
            })
            .collect::<Result<_>>()?;

        Ok(summarize(&rewritten))
    }

    /// Same pass over an input archive into a freshly written output archive.
    pub fn process_jar(&self, input: &Path, output: &Path) -> Result<RewriteSummary> {
        let file = File::open(input)
            .with_context(|| format!("Failed to open jar: {}", input.display()))?;
        // SAFETY: The file is opened read-only and remains valid for the
        // lifetime of the mmap. The mmap is dropped before the file.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to mmap jar: {}", input.display()))?;
        let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
            .with_context(|| format!("Failed to read zip structure: {}", input.display()))?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }
        let out_file = File::create(output)
            .with_context(|| format!("Failed to create output jar: {}", output.display()))?;
        let mut writer = ZipWriter::new(out_file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut summary = RewriteSummary::default();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if entry.is_dir() {
                writer.add_directory(name, options)?;
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;

            match entry_class(&name).and_then(|cls| self.table.class(&cls)) {
                Some(class_map) => {
                    data = classfile::remap_line_numbers(&data, class_map)
                        .with_context(|| format!("Failed to rewrite line numbers: {name}"))?;
                    summary.classes_rewritten += 1;
                }
                None => summary.entries_copied += 1,
            }

            writer.start_file(name, options)?;
            writer.write_all(&data)?;
        }
        writer
            .finish()
            .with_context(|| format!("Failed to finish output jar: {}", output.display()))?;

        Ok(summary)
    }
}

/// Binary name an entry is looked up under, or `None` for non-class entries.
/// Anything after the first `$` is dropped: the line map only tracks
/// enclosing classes.
fn entry_class(entry_name: &str) -> Option<String> {
    let stem = entry_name.strip_suffix(".class")?;
    let stem = stem.replace('\\', "/");
    match stem.find('$') {
        Some(dollar) => Some(stem[..dollar].to_string()),
        None => Some(stem),
    }
}

fn collect_files(base: &Path) -> Vec<PathBuf> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                if entry.file_type().is_some_and(|t| t.is_file()) {
                    let _ = tx.send(entry.path().to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    rx.iter().collect()
}

fn summarize(rewritten: &[bool]) -> RewriteSummary {
    let classes_rewritten = rewritten.iter().filter(|&&r| r).count();
    RewriteSummary {
        classes_rewritten,
        entries_copied: rewritten.len() - classes_rewritten,
    }
}
