//! Core data types for VCF header reconciliation.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Record`]: A borrowed, column-split view over one data line
//! - [`Declaration`]: One `##INFO`, `##FORMAT`, `##FILTER`, or `##contig` header entry
//! - [`VcfHeader`]: The ordered header with declarations indexed by category and ID
//! - [`Contig`], [`ContigLengthTable`]: Contig lengths from a reference index or dictionary
//!
//! ## Namespaces
//!
//! | Category | Header key | Used by records in |
//! |----------|------------|--------------------|
//! | Info     | `INFO`     | column 8 (`key=value;...`) |
//! | Format   | `FORMAT`   | column 9 (`key:key:...`) |
//! | Filter   | `FILTER`   | column 7 (`tag;tag`) |
//! | Contig   | `contig`   | column 1 |
//!
//! Identifiers are unique within a category only.
//!
//! [`Record`]: record::Record
//! [`Declaration`]: declaration::Declaration
//! [`VcfHeader`]: header::VcfHeader
//! [`Contig`]: contig::Contig
//! [`ContigLengthTable`]: contig::ContigLengthTable

pub mod contig;
pub mod declaration;
pub mod header;
pub mod record;
