//! Contig lengths for synthesized `##contig` declarations.
//!
//! Lengths come from exactly one authoritative source per resolver: a FASTA
//! index (`.fai`) or a sequence dictionary (`.dict`) found next to the
//! reference. Contigs the source does not list (or every contig, when there is
//! no source) get [`SENTINEL_CONTIG_LENGTH`].
//!
//! A resolver holds no global state. Build one and pass it by reference to
//! every reconciliation that should share the loaded table.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::contig::ContigLengthTable;
use crate::parsing::dict::parse_dict_file;
use crate::parsing::fai::parse_fai_file;
use crate::parsing::ParseError;
use crate::reconcile::config::FixConfig;

/// Length declared for contigs with no authoritative length
pub const SENTINEL_CONTIG_LENGTH: u64 = 999_999_999;

/// Where a resolver's lengths came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ContigSource {
    Index(PathBuf),
    Dictionary(PathBuf),
    #[default]
    None,
}

impl std::fmt::Display for ContigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContigSource::Index(path) => write!(f, "index {}", path.display()),
            ContigSource::Dictionary(path) => write!(f, "dictionary {}", path.display()),
            ContigSource::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContigLengthResolver {
    source: ContigSource,
    table: ContigLengthTable,
}

impl ContigLengthResolver {
    /// A resolver that answers every lookup with the sentinel length
    #[must_use]
    pub fn without_source() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_table(source: ContigSource, table: ContigLengthTable) -> Self {
        Self { source, table }
    }

    /// Find and load the length source for a reference.
    ///
    /// `reference` may be the FASTA itself, or an explicit `.fai`/`.dict`.
    /// The index is preferred over the dictionary. When neither exists the
    /// resolver has no source and falls back to the sentinel length.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the chosen source exists but cannot be parsed.
    pub fn discover(reference: &Path) -> Result<Self, ParseError> {
        let Some(source) = find_source(reference) else {
            warn!(
                reference = %reference.display(),
                "No .fai or .dict found for reference, contig lengths will use the sentinel"
            );
            return Ok(Self::without_source());
        };

        let table = match &source {
            ContigSource::Index(path) => parse_fai_file(path)?,
            ContigSource::Dictionary(path) => parse_dict_file(path)?,
            ContigSource::None => ContigLengthTable::default(),
        };

        info!(source = %source, contigs = table.len(), "Loaded contig lengths");
        Ok(Self { source, table })
    }

    /// The resolver a config asks for: discovered from `reference` when contig
    /// lengths are needed at all, sourceless otherwise
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the reference's length source is malformed.
    pub fn for_config(config: &FixConfig) -> Result<Self, ParseError> {
        match &config.reference {
            Some(reference) if config.needs_contig_lengths() => Self::discover(reference),
            Some(reference) => {
                debug!(
                    reference = %reference.display(),
                    "Contig lengths not needed, reference ignored"
                );
                Ok(Self::without_source())
            }
            None => Ok(Self::without_source()),
        }
    }

    /// Authoritative length for a contig, if the source lists it
    #[must_use]
    pub fn lookup(&self, contig: &str) -> Option<u64> {
        self.table.get(contig)
    }

    /// Length to declare for a contig, falling back to [`SENTINEL_CONTIG_LENGTH`]
    #[must_use]
    pub fn resolve(&self, contig: &str) -> u64 {
        self.lookup(contig).unwrap_or_else(|| {
            debug!(contig = %contig, "No authoritative length, using sentinel");
            SENTINEL_CONTIG_LENGTH
        })
    }

    /// Whether a table was loaded, so that "not listed" means something
    #[must_use]
    pub fn has_authority(&self) -> bool {
        self.source != ContigSource::None
    }

    #[must_use]
    pub fn source(&self) -> &ContigSource {
        &self.source
    }
}

fn find_source(reference: &Path) -> Option<ContigSource> {
    let lower = reference.to_string_lossy().to_lowercase();
    if lower.ends_with(".fai") {
        return reference
            .is_file()
            .then(|| ContigSource::Index(reference.to_path_buf()));
    }
    if lower.ends_with(".dict") {
        return reference
            .is_file()
            .then(|| ContigSource::Dictionary(reference.to_path_buf()));
    }

    let index = append_extension(reference, "fai");
    if index.is_file() {
        return Some(ContigSource::Index(index));
    }

    dictionary_candidates(reference)
        .into_iter()
        .find(|path| path.is_file())
        .map(ContigSource::Dictionary)
}

/// `ref.fa.gz` -> `ref.dict`, then `ref.fa.gz.dict`
fn dictionary_candidates(reference: &Path) -> Vec<PathBuf> {
    let is_compressed = reference
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"));
    let uncompressed = if is_compressed {
        reference.with_extension("")
    } else {
        reference.to_path_buf()
    };

    let mut candidates = vec![uncompressed.with_extension("dict")];
    let appended = append_extension(reference, "dict");
    if !candidates.contains(&appended) {
        candidates.push(appended);
    }
    candidates
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;
    use tempfile::tempdir;

    const FAI: &str = "chr1\t248956422\t112\t70\t71\nchr2\t242193529\t253404903\t70\t71\n";
    const DICT: &str = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n@SQ\tSN:chrM\tLN:16569\n";

    #[test]
    fn test_without_source_uses_sentinel() {
        let resolver = ContigLengthResolver::without_source();
        assert!(!resolver.has_authority());
        assert_eq!(resolver.lookup("1"), None);
        assert_eq!(resolver.resolve("1"), SENTINEL_CONTIG_LENGTH);
        assert_eq!(resolver.resolve("chrUn_xyz"), 999_999_999);
    }

    #[test]
    fn test_from_table() {
        let table = ContigLengthTable::new(vec![Contig::new("chr1", 100)]);
        let resolver = ContigLengthResolver::from_table(ContigSource::None, table);
        assert_eq!(resolver.resolve("chr1"), 100);
        assert_eq!(resolver.resolve("chr2"), SENTINEL_CONTIG_LENGTH);
    }

    #[test]
    fn test_discover_prefers_index() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        std::fs::write(&fasta, ">chr1\nACGT\n").unwrap();
        std::fs::write(dir.path().join("ref.fa.fai"), FAI).unwrap();
        std::fs::write(dir.path().join("ref.dict"), DICT).unwrap();

        let resolver = ContigLengthResolver::discover(&fasta).unwrap();
        assert_eq!(
            resolver.source(),
            &ContigSource::Index(dir.path().join("ref.fa.fai"))
        );
        assert_eq!(resolver.resolve("chr1"), 248_956_422);
        assert_eq!(resolver.lookup("chrM"), None);
    }

    #[test]
    fn test_discover_two_column_index() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        std::fs::write(dir.path().join("ref.fa.fai"), "chr1\t1000\nchr2\t2000\n").unwrap();

        let resolver = ContigLengthResolver::discover(&fasta).unwrap();
        assert!(resolver.has_authority());
        assert_eq!(resolver.resolve("chr1"), 1000);
        assert_eq!(resolver.resolve("chr2"), 2000);
    }

    #[test]
    fn test_discover_dictionary_replaces_extension() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("ref.fasta.gz");
        std::fs::write(dir.path().join("ref.dict"), DICT).unwrap();

        let resolver = ContigLengthResolver::discover(&fasta).unwrap();
        assert_eq!(
            resolver.source(),
            &ContigSource::Dictionary(dir.path().join("ref.dict"))
        );
        assert_eq!(resolver.resolve("chrM"), 16_569);
        assert!(resolver.has_authority());
    }

    #[test]
    fn test_discover_dictionary_appended() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        std::fs::write(dir.path().join("ref.fa.dict"), DICT).unwrap();

        let resolver = ContigLengthResolver::discover(&fasta).unwrap();
        assert_eq!(
            resolver.source(),
            &ContigSource::Dictionary(dir.path().join("ref.fa.dict"))
        );
    }

    #[test]
    fn test_discover_explicit_paths() {
        let dir = tempdir().unwrap();
        let fai = dir.path().join("lengths.fai");
        let dict = dir.path().join("lengths.dict");
        std::fs::write(&fai, FAI).unwrap();
        std::fs::write(&dict, DICT).unwrap();

        let from_fai = ContigLengthResolver::discover(&fai).unwrap();
        assert_eq!(from_fai.source(), &ContigSource::Index(fai));
        let from_dict = ContigLengthResolver::discover(&dict).unwrap();
        assert_eq!(from_dict.source(), &ContigSource::Dictionary(dict));
    }

    #[test]
    fn test_discover_nothing_found() {
        let dir = tempdir().unwrap();
        let resolver = ContigLengthResolver::discover(&dir.path().join("missing.fa")).unwrap();
        assert_eq!(resolver.source(), &ContigSource::None);
        assert_eq!(resolver.resolve("chr1"), SENTINEL_CONTIG_LENGTH);
    }

    #[test]
    fn test_discover_malformed_source_is_error() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        std::fs::write(dir.path().join("ref.dict"), "@SQ\tSN:chr1\n").unwrap();
        assert!(ContigLengthResolver::discover(&fasta).is_err());
    }

    #[test]
    fn test_for_config_skips_unneeded_reference() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        std::fs::write(dir.path().join("ref.fa.fai"), FAI).unwrap();

        let config = FixConfig {
            reference: Some(fasta),
            ..FixConfig::default()
        };
        let resolver = ContigLengthResolver::for_config(&config).unwrap();
        assert!(!resolver.has_authority());
    }

    #[test]
    fn test_dictionary_candidates() {
        assert_eq!(
            dictionary_candidates(Path::new("/r/hg38.fa")),
            vec![PathBuf::from("/r/hg38.dict"), PathBuf::from("/r/hg38.fa.dict")]
        );
        assert_eq!(
            dictionary_candidates(Path::new("/r/hg38.fa.bgz")),
            vec![PathBuf::from("/r/hg38.dict"), PathBuf::from("/r/hg38.fa.bgz.dict")]
        );
    }
}
