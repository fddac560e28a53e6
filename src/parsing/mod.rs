//! Parsers for the header lines and reference sidecar files the reconciler reads.
//!
//! This module provides parsers for:
//!
//! - **VCF header lines**: `##INFO`, `##FORMAT`, `##FILTER`, and `##contig` declarations
//! - **FASTA index (.fai) files**: contig names and lengths
//! - **Picard .dict files**: contig names and lengths from `@SQ` lines
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcf_fix::parsing::fai::parse_fai_file;
//! use std::path::Path;
//!
//! let table = parse_fai_file(Path::new("hg38.fa.fai")).unwrap();
//! println!("chr1 is {:?} bp", table.get("chr1"));
//! ```

use thiserror::Error;

pub mod dict;
pub mod fai;
pub mod vcf;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Too many contigs: {0} exceeds maximum allowed (100000)")]
    TooManyContigs(usize),
}
