use std::io::{BufRead, Write};
use std::path::Path;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::core::header::VcfHeader;
use crate::core::record::is_header_line;
use crate::reconcile::FixError;
use crate::utils::io::LineReader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub records_written: u64,
    pub records_dropped: u64,
}

/// Writes the patched header followed by the body of a (sanitized) stream.
///
/// The source's own header lines are replaced by `header`. Records keep their
/// order and bytes, except records on dropped contigs, which are omitted.
/// Comment lines inside the body are copied through; blank lines are not.
pub struct StreamRewriter<'a> {
    header: &'a VcfHeader,
    dropped_contigs: &'a IndexSet<String>,
}

impl<'a> StreamRewriter<'a> {
    #[must_use]
    pub fn new(header: &'a VcfHeader, dropped_contigs: &'a IndexSet<String>) -> Self {
        Self {
            header,
            dropped_contigs,
        }
    }

    /// Stream `source` into `out`. `source_path` and `output_path` are used in errors only.
    ///
    /// # Errors
    ///
    /// Returns `FixError::Io` if reading the source fails and
    /// `FixError::OutputWriteFailure` if writing fails.
    pub fn rewrite<R: BufRead, W: Write + ?Sized>(
        &self,
        source: &mut LineReader<R>,
        source_path: &Path,
        out: &mut W,
        output_path: &Path,
    ) -> Result<RewriteStats, FixError> {
        let write_failure = |source| FixError::OutputWriteFailure {
            path: output_path.to_path_buf(),
            source,
        };

        self.header.write_to(out).map_err(write_failure)?;

        let mut stats = RewriteStats::default();
        let mut in_header = true;

        while let Some((_, line)) = source.next_line().map_err(|source| FixError::Io {
            path: source_path.to_path_buf(),
            source,
        })? {
            if line.is_empty() {
                continue;
            }
            if is_header_line(&line) {
                if !in_header {
                    write_line(out, &line).map_err(write_failure)?;
                }
                continue;
            }
            in_header = false;

            if self.is_dropped(&line) {
                stats.records_dropped += 1;
                continue;
            }

            write_line(out, &line).map_err(write_failure)?;
            stats.records_written += 1;
        }

        debug!(
            written = stats.records_written,
            dropped = stats.records_dropped,
            "Rewrote records"
        );
        Ok(stats)
    }

    fn is_dropped(&self, line: &str) -> bool {
        if self.dropped_contigs.is_empty() {
            return false;
        }
        let chrom = line.split_once('\t').map_or(line, |(chrom, _)| chrom);
        self.dropped_contigs.contains(chrom)
    }
}

fn write_line<W: Write + ?Sized>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")
}
