//! Textual pre-fix pass.
//!
//! Runs on raw lines before any structured parsing: markup embedded in the
//! INFO column is not valid in the structured model, so it has to go first.

use std::borrow::Cow;

use serde::Serialize;

use crate::core::record::{is_header_line, MIN_COLUMNS, MISSING};
use crate::reconcile::config::FixConfig;

const CHROM_COLUMN: usize = 0;
const INFO_COLUMN: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeStats {
    /// Data lines that were modified
    pub lines_changed: u64,
    pub chromosomes_prefixed: u64,
    pub markup_entries_removed: u64,
}

/// Applies chromosome prefixing and markup stripping to single lines
#[derive(Debug, Clone)]
pub struct LineSanitizer {
    prefix: Option<String>,
    strip_markup: bool,
    stats: SanitizeStats,
}

impl LineSanitizer {
    #[must_use]
    pub fn new(config: &FixConfig) -> Self {
        let prefix = (config.normalize_contig_prefix && !config.contig_prefix.is_empty())
            .then(|| config.contig_prefix.clone());

        Self {
            prefix,
            strip_markup: config.strip_markup,
            stats: SanitizeStats::default(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.prefix.is_some() || self.strip_markup
    }

    #[must_use]
    pub fn stats(&self) -> SanitizeStats {
        self.stats
    }

    /// Sanitize one line (without terminator).
    ///
    /// Header lines and lines with fewer than [`MIN_COLUMNS`] columns come back
    /// untouched; the latter are left for the record parser to reject.
    pub fn sanitize<'a>(&mut self, line: &'a str) -> Cow<'a, str> {
        if !self.is_active() || is_header_line(line) {
            return Cow::Borrowed(line);
        }

        let mut columns: Vec<Cow<'a, str>> = line.split('\t').map(Cow::Borrowed).collect();
        if columns.len() < MIN_COLUMNS {
            return Cow::Borrowed(line);
        }

        let mut changed = false;

        if let Some(prefix) = &self.prefix {
            if !columns[CHROM_COLUMN].starts_with(prefix.as_str()) {
                columns[CHROM_COLUMN] = Cow::Owned(format!("{prefix}{}", columns[CHROM_COLUMN]));
                self.stats.chromosomes_prefixed += 1;
                changed = true;
            }
        }

        if self.strip_markup {
            if let Some((info, removed)) = strip_markup_entries(&columns[INFO_COLUMN]) {
                columns[INFO_COLUMN] = Cow::Owned(info);
                self.stats.markup_entries_removed += removed;
                changed = true;
            }
        }

        if !changed {
            return Cow::Borrowed(line);
        }

        self.stats.lines_changed += 1;
        Cow::Owned(columns.join("\t"))
    }
}

/// Whether an INFO entry is HTML-like markup, e.g. `<a href="...">link</a>`
#[must_use]
pub fn is_markup_entry(entry: &str) -> bool {
    let mut chars = entry.trim_start().chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/')
}

/// Drop markup entries, keeping the order of the rest.
/// Returns `None` when nothing was removed.
fn strip_markup_entries(info: &str) -> Option<(String, u64)> {
    let mut removed = 0;
    let kept: Vec<&str> = info
        .split(';')
        .filter(|entry| {
            let markup = is_markup_entry(entry);
            if markup {
                removed += 1;
            }
            !markup
        })
        .collect();

    if removed == 0 {
        return None;
    }

    let info = if kept.iter().all(|entry| entry.is_empty()) {
        MISSING.to_string()
    } else {
        kept.join(";")
    };
    Some((info, removed))
}
