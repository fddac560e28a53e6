use std::collections::HashMap;
use std::io::{self, Write};

use thiserror::Error;
use tracing::warn;

use crate::core::declaration::{Category, Declaration, DeclarationStatus, Provenance};
use crate::parsing::vcf::parse_declaration_line;
use crate::parsing::ParseError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Duplicate {category} declaration for '{id}'")]
    DuplicateDeclaration { category: Category, id: String },
}

/// What [`VcfHeader::declare`] did with a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareOutcome {
    /// Appended to the end of the meta-information block
    Added,
    /// Replaced an auto-placeholder in place
    ReplacedPlaceholder,
}

#[derive(Debug, Clone)]
struct HeaderEntry {
    /// Line as it will be written (no terminator)
    text: String,
    declaration: Option<Declaration>,
}

/// The header of a VCF stream: meta-information lines in input order plus the
/// `#CHROM` column line.
///
/// Lines read from the input are written back verbatim. Managed declarations
/// are indexed by `(category, id)`; the first declaration of an identifier is
/// the one that counts. Comment lines between the column line and the first
/// record stay after the column line.
#[derive(Debug, Clone, Default)]
pub struct VcfHeader {
    entries: Vec<HeaderEntry>,
    column_line: Option<String>,
    trailing: Vec<String>,
    index: HashMap<(Category, String), usize>,
}

impl VcfHeader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete header from text (lines starting with `#`; stops at the first data line)
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if a managed declaration line is malformed.
    pub fn parse(text: &str, placeholders: &[String]) -> Result<Self, ParseError> {
        let mut header = Self::new();
        for line in text.lines() {
            if !line.starts_with('#') {
                break;
            }
            header.push_line(line, placeholders)?;
        }
        Ok(header)
    }

    /// Append one header line (without terminator) read from the input
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if a managed declaration line is
    /// malformed, or a meta-information line follows the column line.
    pub fn push_line(&mut self, line: &str, placeholders: &[String]) -> Result<(), ParseError> {
        if self.column_line.is_some() {
            if line.starts_with("##") {
                return Err(ParseError::InvalidFormat(format!(
                    "Meta-information line after the #CHROM line: {line}"
                )));
            }
            self.trailing.push(line.to_string());
            return Ok(());
        }
        if !line.starts_with("##") {
            self.column_line = Some(line.to_string());
            return Ok(());
        }

        let declaration = parse_declaration_line(line, placeholders)?;
        if let Some(decl) = &declaration {
            let key = (decl.category, decl.id.clone());
            if self.index.contains_key(&key) {
                warn!(
                    category = %decl.category,
                    id = %decl.id,
                    "Identifier declared more than once in input header, keeping the first"
                );
            } else {
                self.index.insert(key, self.entries.len());
            }
        }

        self.entries.push(HeaderEntry {
            text: line.to_string(),
            declaration,
        });
        Ok(())
    }

    #[must_use]
    pub fn get(&self, category: Category, id: &str) -> Option<&Declaration> {
        self.index
            .get(&(category, id.to_string()))
            .and_then(|&i| self.entries[i].declaration.as_ref())
    }

    #[must_use]
    pub fn status(&self, category: Category, id: &str) -> DeclarationStatus {
        self.get(category, id)
            .map_or(DeclarationStatus::Unset, |decl| decl.provenance.into())
    }

    /// Add a declaration, or replace an auto-placeholder for the same identifier.
    ///
    /// Real declarations are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::DuplicateDeclaration` if the identifier already has
    /// a real declaration in this category.
    pub fn declare(&mut self, declaration: Declaration) -> Result<DeclareOutcome, HeaderError> {
        let key = (declaration.category, declaration.id.clone());
        let entry = HeaderEntry {
            text: declaration.render(),
            declaration: Some(declaration),
        };

        match self.index.get(&key) {
            Some(&i) => {
                let existing = self.entries[i]
                    .declaration
                    .as_ref()
                    .map(|d| d.provenance);
                if existing != Some(Provenance::AutoPlaceholder) {
                    return Err(HeaderError::DuplicateDeclaration {
                        category: key.0,
                        id: key.1,
                    });
                }
                self.entries[i] = entry;
                Ok(DeclareOutcome::ReplacedPlaceholder)
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
                Ok(DeclareOutcome::Added)
            }
        }
    }

    /// Number of meta-information lines (excluding the column line)
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.column_line.is_none()
    }

    /// Write every header line followed by `\n`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            writer.write_all(entry.text.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        for line in self.column_line.iter().chain(&self.trailing) {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// The header as text, one `\n`-terminated line per entry
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::declaration::{Number, ValueType};

    const HEADER: &str = r#"##fileformat=VCFv4.2
##INFO=<ID=AF,Number=A,Type=Float,Description="Allele frequency">
##INFO=<ID=XX,Number=1,Type=String,Description="Dummy">
##FILTER=<ID=q10,Description="Quality below 10">
##contig=<ID=chr1,length=248956422>
##source=test
#CHROM	POS	ID	REF	ALT	QUAL	FILTER	INFO
"#;

    fn placeholders() -> Vec<String> {
        vec!["Dummy".to_string()]
    }

    #[test]
    fn test_parse_header() {
        let header = VcfHeader::parse(HEADER, &placeholders()).unwrap();
        assert_eq!(header.len(), 6);
        assert!(header
            .to_text()
            .ends_with("\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"));
        assert_eq!(header.status(Category::Info, "AF"), DeclarationStatus::Real);
        assert_eq!(
            header.status(Category::Info, "XX"),
            DeclarationStatus::AutoPlaceholder
        );
        assert_eq!(header.status(Category::Info, "DP"), DeclarationStatus::Unset);
        assert_eq!(header.status(Category::Filter, "q10"), DeclarationStatus::Real);
        assert_eq!(header.get(Category::Contig, "chr1").unwrap().length, Some(248_956_422));
    }

    #[test]
    fn test_categories_are_independent() {
        let header = VcfHeader::parse(HEADER, &placeholders()).unwrap();
        assert_eq!(header.status(Category::Format, "AF"), DeclarationStatus::Unset);
    }

    #[test]
    fn test_roundtrip_verbatim() {
        let header = VcfHeader::parse(HEADER, &placeholders()).unwrap();
        assert_eq!(header.to_text(), HEADER);
    }

    #[test]
    fn test_declare_appends_before_column_line() {
        let mut header = VcfHeader::parse(HEADER, &placeholders()).unwrap();
        let outcome = header
            .declare(Declaration::field(
                Category::Info,
                "DP",
                Number::Count(1),
                ValueType::Integer,
                "Depth",
            ))
            .unwrap();
        assert_eq!(outcome, DeclareOutcome::Added);

        let text = header.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[lines.len() - 2],
            "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">"
        );
        assert!(lines[lines.len() - 1].starts_with("#CHROM"));
        assert_eq!(header.status(Category::Info, "DP"), DeclarationStatus::Real);
    }

    #[test]
    fn test_declare_replaces_placeholder_in_place() {
        let mut header = VcfHeader::parse(HEADER, &placeholders()).unwrap();
        let outcome = header
            .declare(Declaration::field(
                Category::Info,
                "XX",
                Number::Count(1),
                ValueType::String,
                "XX",
            ))
            .unwrap();
        assert_eq!(outcome, DeclareOutcome::ReplacedPlaceholder);
        assert_eq!(header.len(), 6);

        let text = header.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[2],
            "##INFO=<ID=XX,Number=1,Type=String,Description=\"XX\">"
        );
    }

    #[test]
    fn test_declare_never_overwrites_real() {
        let mut header = VcfHeader::parse(HEADER, &placeholders()).unwrap();
        let err = header
            .declare(Declaration::field(
                Category::Info,
                "AF",
                Number::Count(1),
                ValueType::String,
                "AF",
            ))
            .unwrap_err();
        assert_eq!(
            err,
            HeaderError::DuplicateDeclaration {
                category: Category::Info,
                id: "AF".to_string()
            }
        );
        assert_eq!(header.to_text(), HEADER);
    }

    #[test]
    fn test_duplicate_input_declaration_keeps_first() {
        let text = "##contig=<ID=1,length=10>\n##contig=<ID=1,length=20>\n";
        let header = VcfHeader::parse(text, &[]).unwrap();
        assert_eq!(header.get(Category::Contig, "1").unwrap().length, Some(10));
        assert_eq!(header.len(), 2);
        assert_eq!(header.to_text(), text);
    }

    #[test]
    fn test_comment_after_column_line_stays_after_it() {
        let text = "##fileformat=VCFv4.2\n#CHROM\tPOS\n#note\n";
        let mut header = VcfHeader::parse(text, &[]).unwrap();
        header.declare(Declaration::contig("1", 10)).unwrap();
        assert_eq!(
            header.to_text(),
            "##fileformat=VCFv4.2\n##contig=<ID=1,length=10>\n#CHROM\tPOS\n#note\n"
        );
    }

    #[test]
    fn test_meta_line_after_column_line_rejected() {
        let text = "##fileformat=VCFv4.2\n#CHROM\tPOS\n##source=late\n";
        let result = VcfHeader::parse(text, &[]);
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_stops_at_data() {
        let text = "##fileformat=VCFv4.2\n#CHROM\tPOS\n1\t1\n";
        let header = VcfHeader::parse(text, &[]).unwrap();
        assert_eq!(header.len(), 1);
        assert_eq!(header.to_text(), "##fileformat=VCFv4.2\n#CHROM\tPOS\n");
    }
}
