//! Header reconciliation engine.
//!
//! A run is four strictly ordered passes over one VCF stream:
//!
//! 1. **Sanitize** ([`sanitize`]): textual fixes on raw lines, spilled to a
//!    temporary file next to the output
//! 2. **Scan** ([`scan`]): collect identifiers used by the records
//! 3. **Patch** ([`patch`]): add the declarations the header is missing
//! 4. **Rewrite** ([`rewrite`]): stream the patched header and the body to a
//!    staged output that is published only on success
//!
//! When [`FixConfig::is_noop`] holds the input is copied byte for byte instead.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vcf_fix::reconcile::{config::FixConfig, resolver::ContigLengthResolver, Reconciler};
//!
//! let config = FixConfig::from_json(r#"{"synthesize_contig_headers": true}"#).unwrap();
//! let resolver = ContigLengthResolver::without_source();
//! let report = Reconciler::new(&config, &resolver)
//!     .run(Path::new("in.vcf.gz"), Path::new("out.vcf.gz"))
//!     .unwrap();
//! println!("{} contigs declared", report.synthesized.contig);
//! ```

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::declaration::Category;
use crate::core::header::{HeaderError, VcfHeader};
use crate::core::record::{is_header_line, Record, RecordError};
use crate::parsing::ParseError;
use crate::utils::io::{
    copy_verbatim, open_input, parent_dir, CopyError, LineReader, StagedOutput,
};

pub mod config;
pub mod patch;
pub mod resolver;
pub mod rewrite;
pub mod sanitize;
pub mod scan;

use config::FixConfig;
use patch::{HeaderPatcher, PatchOutcome, SynthesisCounts};
use resolver::{ContigLengthResolver, ContigSource};
use rewrite::StreamRewriter;
use sanitize::{LineSanitizer, SanitizeStats};
use scan::{SchemaScanner, UsageSets};

#[derive(Error, Debug)]
pub enum FixError {
    #[error("{}:{line}: malformed record: {source}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: u64,
        source: RecordError,
    },

    #[error("{}:{line}: malformed header line: {source}", path.display())]
    MalformedHeader {
        path: PathBuf,
        line: u64,
        source: ParseError,
    },

    #[error("Duplicate {category} declaration for '{id}'")]
    DuplicateDeclaration { category: Category, id: String },

    #[error("Failed to write {}: {source}", path.display())]
    OutputWriteFailure { path: PathBuf, source: io::Error },

    #[error("Failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<HeaderError> for FixError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::DuplicateDeclaration { category, id } => {
                FixError::DuplicateDeclaration { category, id }
            }
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Input was copied verbatim because no repair is enabled
    pub fast_path: bool,
    pub records_read: u64,
    pub records_written: u64,
    pub records_dropped: u64,
    pub sanitize: SanitizeStats,
    pub synthesized: SynthesisCounts,
    pub placeholders_replaced: usize,
    pub sentinel_contigs: Vec<String>,
    pub dropped_contigs: Vec<String>,
    pub contig_source: ContigSource,
}

/// What a run would do, computed without writing anything
#[derive(Debug, Clone, Serialize)]
pub struct FixPlan {
    pub input: PathBuf,
    pub records: u64,
    pub sanitize: SanitizeStats,
    pub usage: UsageSets,
    pub patch: PatchOutcome,
    pub contig_source: ContigSource,
    #[serde(skip)]
    pub header: VcfHeader,
}

/// Header and usage gathered by the scan pass
struct Scanned {
    header: VcfHeader,
    usage: UsageSets,
    records: u64,
}

/// One configured reconciliation, reusable across any number of files.
///
/// Holds no per-file state, so independent files may be fixed in parallel
/// with one `Reconciler` each (or a shared one) and a shared resolver.
pub struct Reconciler<'a> {
    config: &'a FixConfig,
    resolver: &'a ContigLengthResolver,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(config: &'a FixConfig, resolver: &'a ContigLengthResolver) -> Self {
        Self { config, resolver }
    }

    /// Reconcile `input` into `output`.
    ///
    /// Nothing appears at `output` unless the whole run succeeds; `input` is
    /// never modified.
    ///
    /// # Errors
    ///
    /// Returns `FixError::MalformedLine` for a data line with too few columns,
    /// `FixError::MalformedHeader` for an unparseable declaration,
    /// `FixError::Io` / `FixError::OutputWriteFailure` for I/O failures.
    pub fn run(&self, input: &Path, output: &Path) -> Result<FixReport, FixError> {
        if self.config.is_noop() {
            info!(input = %input.display(), "No repairs enabled, copying input verbatim");
            copy_verbatim(input, output).map_err(|err| match err {
                CopyError::Read(source) => FixError::Io {
                    path: input.to_path_buf(),
                    source,
                },
                CopyError::Write(source) => FixError::OutputWriteFailure {
                    path: output.to_path_buf(),
                    source,
                },
            })?;
            return Ok(self.report(input, output, true));
        }

        let mut sanitizer = LineSanitizer::new(self.config);

        // Pass 1: sanitized lines go to a spill file that the later passes re-read
        let spill = if sanitizer.is_active() {
            Some(self.sanitize_to_spill(input, output, &mut sanitizer)?)
        } else {
            None
        };
        let reopen = || -> Result<LineReader<Box<dyn BufRead>>, FixError> {
            let reader: Box<dyn BufRead> = match &spill {
                Some(file) => Box::new(BufReader::new(file.reopen().map_err(|source| {
                    FixError::Io {
                        path: file.path().to_path_buf(),
                        source,
                    }
                })?)),
                None => open_input(input).map_err(|source| FixError::Io {
                    path: input.to_path_buf(),
                    source,
                })?,
            };
            Ok(LineReader::new(reader))
        };

        // Pass 2
        let Scanned {
            mut header,
            usage,
            records,
        } = self.scan(&mut reopen()?, input, None)?;

        // Pass 3
        let outcome = HeaderPatcher::new(self.config, self.resolver).patch(&mut header, &usage)?;

        // Pass 4
        let staged = StagedOutput::create(output).map_err(|source| FixError::OutputWriteFailure {
            path: output.to_path_buf(),
            source,
        })?;
        let write_failure = |source| FixError::OutputWriteFailure {
            path: output.to_path_buf(),
            source,
        };
        let mut writer = staged.writer().map_err(write_failure)?;
        let stats = StreamRewriter::new(&header, &outcome.dropped_contigs).rewrite(
            &mut reopen()?,
            input,
            &mut writer,
            output,
        )?;
        writer.finish().map_err(write_failure)?;
        staged.publish().map_err(write_failure)?;

        info!(
            output = %output.display(),
            records = stats.records_written,
            dropped = stats.records_dropped,
            synthesized = outcome.synthesized.total(),
            "Wrote reconciled VCF"
        );

        Ok(FixReport {
            records_read: records,
            records_written: stats.records_written,
            records_dropped: stats.records_dropped,
            sanitize: sanitizer.stats(),
            synthesized: outcome.synthesized,
            placeholders_replaced: outcome.placeholders_replaced,
            sentinel_contigs: outcome.sentinel_contigs,
            dropped_contigs: outcome.dropped_contigs.into_iter().collect(),
            ..self.report(input, output, false)
        })
    }

    /// Sanitize, scan and patch in memory, reporting what [`Reconciler::run`] would change
    ///
    /// # Errors
    ///
    /// Same as [`Reconciler::run`], minus output failures.
    pub fn plan(&self, input: &Path) -> Result<FixPlan, FixError> {
        let mut sanitizer = LineSanitizer::new(self.config);
        let reader = open_input(input).map_err(|source| FixError::Io {
            path: input.to_path_buf(),
            source,
        })?;

        let Scanned {
            mut header,
            usage,
            records,
        } = self.scan(&mut LineReader::new(reader), input, Some(&mut sanitizer))?;
        let patch = HeaderPatcher::new(self.config, self.resolver).patch(&mut header, &usage)?;

        Ok(FixPlan {
            input: input.to_path_buf(),
            records,
            sanitize: sanitizer.stats(),
            usage,
            patch,
            contig_source: self.resolver.source().clone(),
            header,
        })
    }

    fn sanitize_to_spill(
        &self,
        input: &Path,
        output: &Path,
        sanitizer: &mut LineSanitizer,
    ) -> Result<NamedTempFile, FixError> {
        let read_failure = |source| FixError::Io {
            path: input.to_path_buf(),
            source,
        };
        let spill_failure = |source| FixError::OutputWriteFailure {
            path: parent_dir(output).to_path_buf(),
            source,
        };

        let spill = tempfile::Builder::new()
            .prefix(".vcf-fix-")
            .suffix(".sanitized")
            .tempfile_in(parent_dir(output))
            .map_err(spill_failure)?;
        let mut writer = BufWriter::new(spill.as_file());
        let mut lines = LineReader::new(open_input(input).map_err(read_failure)?);

        while let Some((_, line)) = lines.next_line().map_err(read_failure)? {
            let line = sanitizer.sanitize(&line);
            writer.write_all(line.as_bytes()).map_err(spill_failure)?;
            writer.write_all(b"\n").map_err(spill_failure)?;
        }
        writer.flush().map_err(spill_failure)?;
        drop(writer);

        let stats = sanitizer.stats();
        debug!(
            lines_changed = stats.lines_changed,
            chromosomes_prefixed = stats.chromosomes_prefixed,
            markup_entries_removed = stats.markup_entries_removed,
            "Sanitized input"
        );
        Ok(spill)
    }

    /// Parse the header and collect usage. Line numbers in errors refer to `path`.
    fn scan<R: BufRead>(
        &self,
        lines: &mut LineReader<R>,
        path: &Path,
        mut sanitizer: Option<&mut LineSanitizer>,
    ) -> Result<Scanned, FixError> {
        let placeholders = &self.config.placeholder_descriptions;
        let mut header = VcfHeader::new();
        let mut scanner = SchemaScanner::new(self.config);
        let mut in_header = true;

        while let Some((number, line)) = lines.next_line().map_err(|source| FixError::Io {
            path: path.to_path_buf(),
            source,
        })? {
            let line = match sanitizer.as_deref_mut() {
                Some(sanitizer) => Cow::Owned(sanitizer.sanitize(&line).into_owned()),
                None => line,
            };
            if line.is_empty() {
                continue;
            }
            if is_header_line(&line) {
                if in_header {
                    header
                        .push_line(&line, placeholders)
                        .map_err(|source| FixError::MalformedHeader {
                            path: path.to_path_buf(),
                            line: number,
                            source,
                        })?;
                }
                continue;
            }
            in_header = false;

            let record = Record::parse(&line).map_err(|source| FixError::MalformedLine {
                path: path.to_path_buf(),
                line: number,
                source,
            })?;
            scanner.observe(&record);
        }

        let records = scanner.records_seen();
        let usage = scanner.finish();
        debug!(
            records,
            info = usage.info.len(),
            format = usage.format.len(),
            filter = usage.filter.len(),
            contigs = usage.contigs.len(),
            "Scanned records"
        );

        Ok(Scanned {
            header,
            usage,
            records,
        })
    }

    fn report(&self, input: &Path, output: &Path, fast_path: bool) -> FixReport {
        FixReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            fast_path,
            records_read: 0,
            records_written: 0,
            records_dropped: 0,
            sanitize: SanitizeStats::default(),
            synthesized: SynthesisCounts::default(),
            placeholders_replaced: 0,
            sentinel_contigs: Vec::new(),
            dropped_contigs: Vec::new(),
            contig_source: self.resolver.source().clone(),
        }
    }
}
