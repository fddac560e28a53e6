//! # vcf-fix
//!
//! A library for reconciling VCF headers with the records they describe.
//!
//! VCFs produced by ad-hoc pipelines often use INFO keys, FORMAT keys, FILTER
//! tags or contigs that their header never declares, name chromosomes `1`
//! where the rest of a pipeline expects `chr1`, or carry HTML links in the INFO
//! column. Strict readers (htslib, GATK) reject such files.
//!
//! `vcf-fix` repairs them in a few streaming passes without loading the file
//! into memory.
//!
//! ## Features
//!
//! - **Chromosome prefixing**: `2` becomes `chr2`, `chrX` is left alone
//! - **Markup stripping**: removes `<a href=...>`-style INFO entries
//! - **Declaration synthesis**: adds missing `##INFO`, `##FORMAT`, `##FILTER`
//!   and `##contig` lines, with metadata from a config where given
//! - **Contig lengths**: from the reference's `.fai` or `.dict`, or a sentinel
//! - **Placeholder replacement**: `Description="Dummy"` declarations left by
//!   other tools are replaced in place
//! - **Atomic output**: nothing appears at the output path unless the run succeeds
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vcf_fix::{ContigLengthResolver, FixConfig, Reconciler};
//!
//! let mut config = FixConfig::default();
//! config.normalize_contig_prefix = true;
//! config.synthesize_contig_headers.enable();
//!
//! let resolver = ContigLengthResolver::discover(Path::new("hg38.fa")).unwrap();
//! let report = Reconciler::new(&config, &resolver)
//!     .run(Path::new("calls.vcf.gz"), Path::new("fixed.vcf.gz"))
//!     .unwrap();
//!
//! println!("{} records written", report.records_written);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Records, declarations, headers and contig tables
//! - [`parsing`]: Parsers for header lines, `.fai` and `.dict` files
//! - [`reconcile`]: The reconciliation passes and the engine that runs them
//! - [`utils`]: Compressed input, staged output and limits
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod parsing;
pub mod reconcile;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::contig::{Contig, ContigLengthTable};
pub use core::declaration::{Category, Declaration, DeclarationStatus, Number, ValueType};
pub use core::header::VcfHeader;
pub use reconcile::config::FixConfig;
pub use reconcile::resolver::{ContigLengthResolver, SENTINEL_CONTIG_LENGTH};
pub use reconcile::{FixError, FixReport, Reconciler};
