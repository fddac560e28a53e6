use thiserror::Error;

/// Fixed columns every data line must carry (CHROM through INFO)
pub const MIN_COLUMNS: usize = 8;

/// Header/comment line marker
pub const COMMENT_PREFIX: char = '#';

/// Filter value meaning "passed all filters"; implicitly declared
pub const PASS_FILTER: &str = "PASS";

/// Placeholder for an empty column
pub const MISSING: &str = ".";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Expected at least {MIN_COLUMNS} tab-delimited columns, found {0}")]
    TooFewColumns(usize),
}

/// A borrowed view over one tab-delimited data line.
///
/// Only the structure is checked; values are not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub chrom: &'a str,
    pub pos: &'a str,
    pub id: &'a str,
    pub reference_bases: &'a str,
    pub alternate_bases: &'a str,
    pub quality: &'a str,
    pub filter: &'a str,
    pub info: &'a str,
    pub format: Option<&'a str>,
    pub samples: Vec<&'a str>,
}

impl<'a> Record<'a> {
    /// Split a data line (without its line terminator) into columns
    ///
    /// # Errors
    ///
    /// Returns `RecordError::TooFewColumns` if the line has fewer than
    /// [`MIN_COLUMNS`] columns.
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let columns: Vec<&'a str> = line.split('\t').collect();
        if columns.len() < MIN_COLUMNS {
            return Err(RecordError::TooFewColumns(columns.len()));
        }

        Ok(Self {
            chrom: columns[0],
            pos: columns[1],
            id: columns[2],
            reference_bases: columns[3],
            alternate_bases: columns[4],
            quality: columns[5],
            filter: columns[6],
            info: columns[7],
            format: columns.get(8).copied(),
            samples: columns.get(9..).map(|s| s.to_vec()).unwrap_or_default(),
        })
    }

    /// `key` or `key=value` entries of the INFO column, in order
    pub fn info_entries(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        self.info
            .split(';')
            .filter(|entry| !entry.is_empty() && *entry != MISSING)
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (entry, None),
            })
    }

    /// INFO keys used by this record; entries with an empty key name nothing
    pub fn info_keys(&self) -> impl Iterator<Item = &'a str> {
        self.info_entries()
            .map(|(key, _)| key)
            .filter(|key| !key.is_empty())
    }

    /// Keys of the FORMAT column
    pub fn format_keys(&self) -> impl Iterator<Item = &'a str> {
        self.format
            .unwrap_or(MISSING)
            .split(':')
            .filter(|key| !key.is_empty() && *key != MISSING)
    }

    /// Filter tags other than `PASS`; the column may be `;` or `,` delimited
    pub fn filter_tags(&self) -> impl Iterator<Item = &'a str> {
        self.filter
            .split([';', ','])
            .filter(|tag| !tag.is_empty() && *tag != MISSING && *tag != PASS_FILTER)
    }
}

/// Whether a line belongs to the header (or is a comment)
#[must_use]
pub fn is_header_line(line: &str) -> bool {
    line.starts_with(COMMENT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str =
        "chr1\t100\trs1\tA\tG\t50\tq10;lowDP\tDP=10;DB;AF=0.5\tGT:AD:DP\t0/1:5,5:10\t1/1:0,8:8";

    #[test]
    fn test_parse_full_record() {
        let record = Record::parse(LINE).unwrap();
        assert_eq!(record.chrom, "chr1");
        assert_eq!(record.pos, "100");
        assert_eq!(record.id, "rs1");
        assert_eq!(record.reference_bases, "A");
        assert_eq!(record.alternate_bases, "G");
        assert_eq!(record.quality, "50");
        assert_eq!(record.format, Some("GT:AD:DP"));
        assert_eq!(record.samples.len(), 2);
    }

    #[test]
    fn test_parse_sites_only() {
        let record = Record::parse("1\t5\t.\tC\tT\t.\tPASS\t.").unwrap();
        assert!(record.format.is_none());
        assert!(record.samples.is_empty());
        assert_eq!(record.info_keys().count(), 0);
        assert_eq!(record.format_keys().count(), 0);
        assert_eq!(record.filter_tags().count(), 0);
    }

    #[test]
    fn test_parse_too_few_columns() {
        let err = Record::parse("chr1\t100\trs1\tA\tG").unwrap_err();
        assert_eq!(err, RecordError::TooFewColumns(5));
    }

    #[test]
    fn test_info_entries() {
        let record = Record::parse(LINE).unwrap();
        let entries: Vec<_> = record.info_entries().collect();
        assert_eq!(
            entries,
            vec![("DP", Some("10")), ("DB", None), ("AF", Some("0.5"))]
        );
        let keys: Vec<_> = record.info_keys().collect();
        assert_eq!(keys, vec!["DP", "DB", "AF"]);
    }

    #[test]
    fn test_info_keys_skip_empty_key() {
        let record = Record::parse("1\t5\t.\tC\tT\t.\t.\t=x;DP=1;=").unwrap();
        let keys: Vec<_> = record.info_keys().collect();
        assert_eq!(keys, vec!["DP"]);
    }

    #[test]
    fn test_format_keys() {
        let record = Record::parse(LINE).unwrap();
        let keys: Vec<_> = record.format_keys().collect();
        assert_eq!(keys, vec!["GT", "AD", "DP"]);
    }

    #[test]
    fn test_filter_tags() {
        let record = Record::parse(LINE).unwrap();
        let tags: Vec<_> = record.filter_tags().collect();
        assert_eq!(tags, vec!["q10", "lowDP"]);

        let record = Record::parse("1\t5\t.\tC\tT\t.\tq10,s50\t.").unwrap();
        let tags: Vec<_> = record.filter_tags().collect();
        assert_eq!(tags, vec!["q10", "s50"]);
    }

    #[test]
    fn test_is_header_line() {
        assert!(is_header_line("##fileformat=VCFv4.2"));
        assert!(is_header_line("#CHROM\tPOS"));
        assert!(!is_header_line("chr1\t1"));
    }
}
