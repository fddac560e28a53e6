use std::path::Path;

use crate::core::contig::{Contig, ContigLengthTable};
use crate::parsing::ParseError;
use crate::utils::validation::check_contig_limit;

/// Parse a Picard sequence dictionary (.dict) file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_dict_file(path: &Path) -> Result<ContigLengthTable, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_dict_text(&content)
}

/// Parse dictionary from text.
///
/// .dict files are SAM headers with only `@HD` and `@SQ` lines; the name and
/// length come from the `SN` and `LN` tags of each `@SQ` line.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if an `@SQ` line lacks `SN`/`LN` or has a
/// non-integer length, or no `@SQ` lines are found, or
/// `ParseError::TooManyContigs` if the number of contigs exceeds the maximum.
pub fn parse_dict_text(text: &str) -> Result<ContigLengthTable, ParseError> {
    let mut contigs = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if !line.starts_with("@SQ") {
            continue;
        }

        let mut name: Option<&str> = None;
        let mut length: Option<&str> = None;

        for field in line.split('\t').skip(1) {
            if let Some((tag, value)) = field.split_once(':') {
                match tag {
                    "SN" => name = Some(value),
                    "LN" => length = Some(value),
                    _ => {}
                }
            }
        }

        let line_num = i + 1;
        let (Some(name), Some(length)) = (name, length) else {
            return Err(ParseError::InvalidFormat(format!(
                "@SQ line {line_num} is missing SN or LN"
            )));
        };
        let length: u64 = length.parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid length on line {line_num}: '{length}'"
            ))
        })?;

        if check_contig_limit(contigs.len()).is_some() {
            return Err(ParseError::TooManyContigs(contigs.len()));
        }

        contigs.push(Contig::new(name, length));
    }

    if contigs.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No @SQ lines found in dictionary".to_string(),
        ));
    }

    Ok(ContigLengthTable::new(contigs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dict_text() {
        let dict = "@HD\tVN:1.6\n\
                    @SQ\tSN:chr1\tLN:248956422\tM5:6aef897c3d6ff0c78aff06ac189178dd\tUR:file:///reference/hg38.fa\n\
                    @SQ\tSN:chr2\tLN:242193529\tM5:f98db672eb0993dcfdabafe2a882905c\n";

        let table = parse_dict_text(dict).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("chr1"), Some(248_956_422));
        assert_eq!(table.get("chr2"), Some(242_193_529));
    }

    #[test]
    fn test_parse_dict_tag_order_irrelevant() {
        let table = parse_dict_text("@SQ\tLN:16569\tSN:chrM\n").unwrap();
        assert_eq!(table.get("chrM"), Some(16569));
    }

    #[test]
    fn test_parse_dict_missing_length() {
        let result = parse_dict_text("@SQ\tSN:chr1\n");
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_dict_no_sq() {
        let result = parse_dict_text("@HD\tVN:1.6\n");
        assert!(result.is_err());
    }
}
