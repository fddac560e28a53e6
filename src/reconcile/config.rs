use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::declaration::{Category, Number, ValueType};

/// Default prefix added by chromosome-name normalization
pub const DEFAULT_CONTIG_PREFIX: &str = "chr";

/// Description other tools give declarations they invent without metadata
pub const DEFAULT_PLACEHOLDER_DESCRIPTION: &str = "Dummy";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read fix config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse fix config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Caller-supplied metadata for one synthesized declaration.
///
/// Unset fields fall back to the defaults (`Number=1`, `Type=String`,
/// description = uppercased ID, length from the contig resolver).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationOverride {
    #[serde(default, alias = "Number", skip_serializing_if = "Option::is_none")]
    pub number: Option<Number>,

    #[serde(
        default,
        rename = "type",
        alias = "Type",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_type: Option<ValueType>,

    #[serde(default, alias = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// contig only
    #[serde(default, alias = "Length", skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

/// A `synthesize_*` option: `true`/`false`, or a map of per-ID overrides (which implies `true`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Synthesize {
    Enabled(bool),
    Overrides(IndexMap<String, DeclarationOverride>),
}

impl Default for Synthesize {
    fn default() -> Self {
        Synthesize::Enabled(false)
    }
}

impl Synthesize {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Synthesize::Enabled(enabled) => *enabled,
            Synthesize::Overrides(_) => true,
        }
    }

    #[must_use]
    pub fn override_for(&self, id: &str) -> Option<&DeclarationOverride> {
        match self {
            Synthesize::Enabled(_) => None,
            Synthesize::Overrides(overrides) => overrides.get(id),
        }
    }

    /// Turn on synthesis without discarding any overrides already configured
    pub fn enable(&mut self) {
        if !self.is_enabled() {
            *self = Synthesize::Enabled(true);
        }
    }
}

/// What to do with records on contigs the authoritative reference does not list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownContigPolicy {
    /// Declare them (with the sentinel length) and keep their records
    #[default]
    Keep,
    /// Leave them undeclared and omit their records
    Drop,
}

/// Which repairs to apply, and the metadata to use for synthesized declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixConfig {
    /// Prefix chromosome names that lack `contig_prefix`
    pub normalize_contig_prefix: bool,

    pub contig_prefix: String,

    /// Remove HTML-like markup entries from the INFO column
    pub strip_markup: bool,

    pub synthesize_annotation_headers: Synthesize,

    pub synthesize_format_headers: Synthesize,

    pub synthesize_filter_headers: Synthesize,

    pub synthesize_contig_headers: Synthesize,

    /// Reference FASTA (or its .fai/.dict) used to look up contig lengths
    pub reference: Option<PathBuf>,

    pub unknown_contigs: UnknownContigPolicy,

    /// Descriptions that mark a declaration as an auto-placeholder
    pub placeholder_descriptions: Vec<String>,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            normalize_contig_prefix: false,
            contig_prefix: DEFAULT_CONTIG_PREFIX.to_string(),
            strip_markup: false,
            synthesize_annotation_headers: Synthesize::default(),
            synthesize_format_headers: Synthesize::default(),
            synthesize_filter_headers: Synthesize::default(),
            synthesize_contig_headers: Synthesize::default(),
            reference: None,
            unknown_contigs: UnknownContigPolicy::default(),
            placeholder_descriptions: vec![DEFAULT_PLACEHOLDER_DESCRIPTION.to_string()],
        }
    }
}

impl FixConfig {
    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read or
    /// `ConfigError::Json` if it is not a valid config.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a config from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the text is not a valid config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn synthesis(&self, category: Category) -> &Synthesize {
        match category {
            Category::Info => &self.synthesize_annotation_headers,
            Category::Format => &self.synthesize_format_headers,
            Category::Filter => &self.synthesize_filter_headers,
            Category::Contig => &self.synthesize_contig_headers,
        }
    }

    pub fn synthesis_mut(&mut self, category: Category) -> &mut Synthesize {
        match category {
            Category::Info => &mut self.synthesize_annotation_headers,
            Category::Format => &mut self.synthesize_format_headers,
            Category::Filter => &mut self.synthesize_filter_headers,
            Category::Contig => &mut self.synthesize_contig_headers,
        }
    }

    /// Whether records must be scanned for identifiers of this category
    #[must_use]
    pub fn scans(&self, category: Category) -> bool {
        self.synthesis(category).is_enabled()
            || (category == Category::Contig && self.unknown_contigs == UnknownContigPolicy::Drop)
    }

    /// Whether the textual pre-fix pass has anything to do
    #[must_use]
    pub fn needs_sanitize(&self) -> bool {
        self.normalize_contig_prefix || self.strip_markup
    }

    /// True when no repair is enabled; the input is then copied verbatim
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.needs_sanitize() && !Category::ALL.iter().any(|&c| self.scans(c))
    }

    /// Whether a contig length source is needed at all
    #[must_use]
    pub fn needs_contig_lengths(&self) -> bool {
        self.scans(Category::Contig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_noop() {
        let config = FixConfig::default();
        assert!(config.is_noop());
        assert_eq!(config.contig_prefix, "chr");
        assert_eq!(config.placeholder_descriptions, vec!["Dummy".to_string()]);
    }

    #[test]
    fn test_parse_bool_and_mapping() {
        let json = r#"{
            "normalize_contig_prefix": true,
            "synthesize_annotation_headers": {"DP4": {"type": "Integer", "number": 4}},
            "synthesize_format_headers": true,
            "synthesize_filter_headers": false
        }"#;
        let config = FixConfig::from_json(json).unwrap();

        assert!(config.normalize_contig_prefix);
        assert!(!config.strip_markup);
        assert!(config.synthesize_annotation_headers.is_enabled());
        assert!(config.synthesize_format_headers.is_enabled());
        assert!(!config.synthesize_filter_headers.is_enabled());
        assert!(!config.synthesize_contig_headers.is_enabled());

        let dp4 = config
            .synthesize_annotation_headers
            .override_for("DP4")
            .unwrap();
        assert_eq!(dp4.number, Some(Number::Count(4)));
        assert_eq!(dp4.value_type, Some(ValueType::Integer));
        assert!(dp4.description.is_none());
        assert!(config
            .synthesize_annotation_headers
            .override_for("DP")
            .is_none());
    }

    #[test]
    fn test_parse_capitalized_override_keys() {
        let json = r#"{"synthesize_format_headers": {"AD": {"Number": "R", "Type": "Integer", "Description": "Allelic depths"}}}"#;
        let config = FixConfig::from_json(json).unwrap();
        let ad = config.synthesize_format_headers.override_for("AD").unwrap();
        assert_eq!(ad.number, Some(Number::ReferenceAlternateBases));
        assert_eq!(ad.description.as_deref(), Some("Allelic depths"));
    }

    #[test]
    fn test_parse_contig_options() {
        let json = r#"{
            "synthesize_contig_headers": {"chrUn": {"length": 5000}},
            "reference": "/ref/hg38.fa",
            "unknown_contigs": "drop"
        }"#;
        let config = FixConfig::from_json(json).unwrap();
        assert_eq!(config.reference, Some(PathBuf::from("/ref/hg38.fa")));
        assert_eq!(config.unknown_contigs, UnknownContigPolicy::Drop);
        assert_eq!(
            config
                .synthesize_contig_headers
                .override_for("chrUn")
                .and_then(|o| o.length),
            Some(5000)
        );
    }

    #[test]
    fn test_empty_mapping_enables() {
        let config = FixConfig::from_json(r#"{"synthesize_filter_headers": {}}"#).unwrap();
        assert!(config.synthesize_filter_headers.is_enabled());
        assert!(!config.is_noop());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FixConfig::from_json(r#"{"add_chr": true}"#).is_err());
        assert!(FixConfig::from_json(
            r#"{"synthesize_annotation_headers": {"DP": {"kind": "Integer"}}}"#
        )
        .is_err());
    }

    #[test]
    fn test_enable_keeps_overrides() {
        let mut config = FixConfig::from_json(
            r#"{"synthesize_annotation_headers": {"DP": {"type": "Integer"}}}"#,
        )
        .unwrap();
        config.synthesis_mut(Category::Info).enable();
        assert!(config
            .synthesize_annotation_headers
            .override_for("DP")
            .is_some());

        config.synthesis_mut(Category::Filter).enable();
        assert_eq!(config.synthesize_filter_headers, Synthesize::Enabled(true));
    }

    #[test]
    fn test_drop_policy_scans_contigs() {
        let config = FixConfig {
            unknown_contigs: UnknownContigPolicy::Drop,
            ..FixConfig::default()
        };
        assert!(config.scans(Category::Contig));
        assert!(!config.scans(Category::Info));
        assert!(!config.is_noop());
        assert!(config.needs_contig_lengths());
    }

    #[test]
    fn test_sanitize_only_is_not_noop() {
        let config = FixConfig {
            strip_markup: true,
            ..FixConfig::default()
        };
        assert!(config.needs_sanitize());
        assert!(!config.is_noop());
    }
}
