//! Parser for FASTA index (.fai) files using noodles.
//!
//! FAI format provides name and length for each contig.
//! Format: `name\tlength\toffset\tline_bases\tline_width`
//!
//! Plain `name\tlength` tables are accepted too; only the first two columns
//! are needed for contig lengths.

use std::path::Path;

use tracing::debug;

use crate::core::contig::{Contig, ContigLengthTable};
use crate::parsing::ParseError;
use crate::utils::validation::check_contig_limit;

/// Parse a FASTA index (.fai) file using noodles
///
/// # Errors
///
/// Full five-column indexes go through noodles; anything noodles rejects is
/// retried as a two-column name/length table.
///
/// Returns `ParseError::Io` if the file cannot be read,
/// `ParseError::InvalidFormat` if a length is not an integer or no contigs
/// are found, or `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_fai_file(path: &Path) -> Result<ContigLengthTable, ParseError> {
    use noodles::fasta;

    let text = std::fs::read_to_string(path)?;

    match fasta::fai::io::Reader::new(text.as_bytes()).read_index() {
        Ok(index) => index_to_table(&index),
        Err(e) => {
            debug!(
                path = %path.display(),
                error = %e,
                "Not a full FASTA index, reading name/length columns"
            );
            parse_fai_text(&text)
        }
    }
}

/// Convert noodles FAI index to a `ContigLengthTable`
fn index_to_table(index: &noodles::fasta::fai::Index) -> Result<ContigLengthTable, ParseError> {
    let mut contigs = Vec::new();

    for record in index.as_ref() {
        if check_contig_limit(contigs.len()).is_some() {
            return Err(ParseError::TooManyContigs(contigs.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        contigs.push(Contig::new(name, record.length()));
    }

    if contigs.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No contigs found in FAI file".to_string(),
        ));
    }

    Ok(ContigLengthTable::new(contigs))
}

/// Parse FAI from text. Only the first two columns are required.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a length is not an integer or no
/// contigs are found, or `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_fai_text(text: &str) -> Result<ContigLengthTable, ParseError> {
    let mut contigs = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            continue;
        }

        if check_contig_limit(contigs.len()).is_some() {
            return Err(ParseError::TooManyContigs(contigs.len()));
        }

        let name = fields[0].to_string();
        let length: u64 = fields[1].parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid length for contig '{}': {}",
                name, fields[1]
            ))
        })?;

        contigs.push(Contig::new(name, length));
    }

    if contigs.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No contigs found in FAI file".to_string(),
        ));
    }

    Ok(ContigLengthTable::new(contigs))
}
