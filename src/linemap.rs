//! Parser for the tab-delimited line-mapping format emitted next to
//! decompiled sources, and the per-line correction rule it drives.
//!
//! A line that does not start with a tab opens a class record:
//! `binaryName<TAB>maxLine<TAB>maxLineDist`. A line starting with a tab adds
//! `originalLine<TAB>correctedLine` to the most recently opened record.
//! Blank lines are skipped. A partial table is never returned: any malformed
//! line fails the whole load with its 1-based line number and raw text.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::Path;

/// Line corrections for one enclosing class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassLineMap {
    pub max_line: i32,
    pub max_line_dist: i32,
    lines: HashMap<i32, i32>,
}

impl ClassLineMap {
    /// Corrects one original line number.
    ///
    /// Lines at or past `max_line` collapse to `max_line_dist`. Otherwise the
    /// first explicitly mapped line at or after the original wins, which
    /// tolerates gaps left when statements are deleted from hand-edited
    /// source. An exhausted scan also falls back to `max_line_dist`.
    /// Non-positive lines are synthetic and pass through untouched.
    pub fn remap_line(&self, line: i32) -> i32 {
        if line <= 0 {
            return line;
        }
        if line >= self.max_line {
            return self.max_line_dist;
        }

        let mut probe = line;
        while probe <= self.max_line {
            if let Some(&corrected) = self.lines.get(&probe) {
                return corrected;
            }
            probe += 1;
        }
        self.max_line_dist
    }

    pub fn mapped_lines(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub(crate) fn mapping(&self, line: i32) -> Option<i32> {
        self.lines.get(&line).copied()
    }
}

/// All class records from one line-mapping file, keyed by slash-separated
/// binary class name. Built once per invocation, read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct LineMapTable {
    classes: HashMap<String, ClassLineMap>,
}

impl LineMapTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read line map file: {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("Failed to parse line map file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut classes: HashMap<String, ClassLineMap> = HashMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let lineno = index + 1;
            if raw.is_empty() {
                continue;
            }

            if let Some(body) = raw.strip_prefix('\t') {
                let Some(name) = current.as_deref() else {
                    bail!("line mapping entry before any class header at line {lineno}: {raw:?}");
                };
                let mut fields = body.trim().split('\t');
                let original = parse_field(fields.next(), lineno, raw)?;
                let corrected = parse_field(fields.next(), lineno, raw)?;
                // Last write wins on duplicate original lines.
                let record = classes
                    .get_mut(name)
                    .expect("current class header was just inserted");
                record.lines.insert(original, corrected);
            } else {
                let mut fields = raw.trim().split('\t');
                let name = match fields.next() {
                    Some(name) if !name.is_empty() => name,
                    _ => bail!("missing class name at line {lineno}: {raw:?}"),
                };
                let max_line = parse_field(fields.next(), lineno, raw)?;
                let max_line_dist = parse_field(fields.next(), lineno, raw)?;
                // A repeated header reopens the record; accumulated per-line
                // entries are kept and the max fields are overwritten.
                let record = classes.entry(name.to_string()).or_default();
                record.max_line = max_line;
                record.max_line_dist = max_line_dist;
                current = Some(name.to_string());
            }
        }

        Ok(Self { classes })
    }

    pub fn class(&self, binary_name: &str) -> Option<&ClassLineMap> {
        self.classes.get(binary_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn parse_field(field: Option<&str>, lineno: usize, raw: &str) -> Result<i32> {
    let Some(field) = field else {
        bail!("missing field at line {lineno}: {raw:?}");
    };
    field
        .parse::<i32>()
        .with_context(|| format!("invalid number {field:?} at line {lineno}: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_class_record_with_line_mappings() {
        let table = LineMapTable::parse("Foo\t10\t99\n\t3\t7\n\t5\t5\n").unwrap();
        let foo = table.class("Foo").unwrap();
        assert_eq!(foo.max_line, 10);
        assert_eq!(foo.max_line_dist, 99);
        assert_eq!(foo.mapped_lines(), 2);
        assert_eq!(foo.mapping(3), Some(7));
        assert_eq!(foo.mapping(5), Some(5));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table = LineMapTable::parse("\nFoo\t10\t99\n\n\t3\t7\n\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.class("Foo").unwrap().mapped_lines(), 1);
    }

    #[test]
    fn duplicate_original_line_last_write_wins() {
        let table = LineMapTable::parse("Foo\t10\t99\n\t3\t7\n\t3\t8\n").unwrap();
        assert_eq!(table.class("Foo").unwrap().mapping(3), Some(8));
    }

    #[test]
    fn repeated_header_reopens_the_record() {
        let table =
            LineMapTable::parse("Foo\t10\t99\n\t3\t7\nBar\t5\t6\nFoo\t20\t30\n\t4\t9\n").unwrap();
        let foo = table.class("Foo").unwrap();
        assert_eq!(foo.max_line, 20);
        assert_eq!(foo.max_line_dist, 30);
        assert_eq!(foo.mapping(3), Some(7));
        assert_eq!(foo.mapping(4), Some(9));
    }

    #[test]
    fn entry_before_header_fails_with_line_context() {
        let err = LineMapTable::parse("\t3\t7\n").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("line 1"), "unexpected error: {msg}");
        assert!(msg.contains("\\t3\\t7"), "unexpected error: {msg}");
    }

    #[test]
    fn non_numeric_field_fails_with_line_context() {
        let err = LineMapTable::parse("Foo\t10\t99\n\tthree\t7\n").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 2"), "unexpected error: {msg}");
        assert!(msg.contains("three"), "unexpected error: {msg}");
    }

    #[test]
    fn missing_header_field_fails() {
        let err = LineMapTable::parse("Foo\t10\n").unwrap_err();
        assert!(format!("{err}").contains("line 1"));
    }

    #[test]
    fn trailing_extra_fields_are_ignored() {
        let table = LineMapTable::parse("Foo\t10\t99\textra\n\t3\t7\tmore\n").unwrap();
        let foo = table.class("Foo").unwrap();
        assert_eq!(foo.max_line_dist, 99);
        assert_eq!(foo.mapping(3), Some(7));
    }

    #[test]
    fn remap_line_rule() {
        let table = LineMapTable::parse("Foo\t10\t99\n\t3\t7\n\t5\t5\n").unwrap();
        let foo = table.class("Foo").unwrap();
        assert_eq!(foo.remap_line(3), 7);
        assert_eq!(foo.remap_line(5), 5);
        // Unmapped line scans forward to the nearest mapped line.
        assert_eq!(foo.remap_line(4), 5);
        // At or past the table end collapses to the fallback tail line.
        assert_eq!(foo.remap_line(10), 99);
        assert_eq!(foo.remap_line(11), 99);
        // Synthetic lines never move.
        assert_eq!(foo.remap_line(0), 0);
        assert_eq!(foo.remap_line(-1), -1);
        // Exhausted scan falls back to the tail line.
        assert_eq!(foo.remap_line(6), 99);
    }
}
