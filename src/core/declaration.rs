use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("Invalid Number value: '{0}'")]
    InvalidNumber(String),

    #[error("Invalid Type value: '{0}'")]
    InvalidType(String),
}

/// Header namespace a declaration lives in.
///
/// Identifiers are unique within a category only; `DP` may be declared both
/// as an INFO and a FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Info,
    Format,
    Filter,
    Contig,
}

impl Category {
    /// All categories, in the order synthesized declarations are emitted
    pub const ALL: [Category; 4] = [
        Category::Info,
        Category::Format,
        Category::Filter,
        Category::Contig,
    ];

    /// Key used in `##KEY=<...>` header lines
    #[must_use]
    pub fn header_key(self) -> &'static str {
        match self {
            Category::Info => "INFO",
            Category::Format => "FORMAT",
            Category::Filter => "FILTER",
            Category::Contig => "contig",
        }
    }

    #[must_use]
    pub fn from_header_key(key: &str) -> Option<Self> {
        match key {
            "INFO" => Some(Category::Info),
            "FORMAT" => Some(Category::Format),
            "FILTER" => Some(Category::Filter),
            "contig" => Some(Category::Contig),
            _ => None,
        }
    }

    /// Whether declarations in this category carry a free-text description
    #[must_use]
    pub fn has_description(self) -> bool {
        !matches!(self, Category::Contig)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header_key())
    }
}

/// Number-of-values indicator for INFO and FORMAT fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    /// A fixed count
    Count(u32),
    /// One value per alternate allele (`A`)
    AlternateBases,
    /// One value per allele including the reference (`R`)
    ReferenceAlternateBases,
    /// One value per genotype (`G`)
    Genotypes,
    /// Varies or unknown (`.`)
    Unknown,
}

impl Default for Number {
    fn default() -> Self {
        Number::Count(1)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Count(n) => write!(f, "{n}"),
            Number::AlternateBases => write!(f, "A"),
            Number::ReferenceAlternateBases => write!(f, "R"),
            Number::Genotypes => write!(f, "G"),
            Number::Unknown => write!(f, "."),
        }
    }
}

impl FromStr for Number {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(Number::AlternateBases),
            "R" => Ok(Number::ReferenceAlternateBases),
            "G" => Ok(Number::Genotypes),
            "." => Ok(Number::Unknown),
            other => other
                .parse()
                .map(Number::Count)
                .map_err(|_| DeclarationError::InvalidNumber(other.to_string())),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::Count(n) => serializer.serialize_u32(*n),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

// Accepts both `4` and `"4"` / `"A"` so config files can be written either way
impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Number::Count(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Value type of an INFO or FORMAT field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(alias = "integer")]
    Integer,
    #[serde(alias = "float")]
    Float,
    #[serde(alias = "flag")]
    Flag,
    #[serde(alias = "character")]
    Character,
    #[default]
    #[serde(alias = "string")]
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Flag => "Flag",
            ValueType::Character => "Character",
            ValueType::String => "String",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ValueType {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "integer" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "flag" => Ok(ValueType::Flag),
            "character" => Ok(ValueType::Character),
            "string" => Ok(ValueType::String),
            _ => Err(DeclarationError::InvalidType(s.to_string())),
        }
    }
}

/// Where a declaration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Declared in the input with real metadata
    Real,
    /// Declared in the input by a tool that had no metadata to give it
    AutoPlaceholder,
    /// Added during reconciliation
    Synthesized,
}

/// Declaration state of an identifier, as seen by reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationStatus {
    /// Declared with real metadata (from the input or synthesized earlier)
    Real,
    /// Declared only as an auto-placeholder; treated as absent
    AutoPlaceholder,
    /// Not declared at all
    Unset,
}

impl From<Provenance> for DeclarationStatus {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Real | Provenance::Synthesized => DeclarationStatus::Real,
            Provenance::AutoPlaceholder => DeclarationStatus::AutoPlaceholder,
        }
    }
}

/// A single structured header declaration (`##INFO`, `##FORMAT`, `##FILTER`, `##contig`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub category: Category,

    pub id: String,

    /// INFO/FORMAT only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<Number>,

    /// INFO/FORMAT only
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,

    /// INFO/FORMAT/FILTER only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// contig only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,

    pub provenance: Provenance,
}

impl Declaration {
    fn bare(category: Category, id: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            category,
            id: id.into(),
            number: None,
            value_type: None,
            description: None,
            length: None,
            provenance,
        }
    }

    /// A field declaration (INFO or FORMAT)
    pub fn field(
        category: Category,
        id: impl Into<String>,
        number: Number,
        value_type: ValueType,
        description: impl Into<String>,
    ) -> Self {
        let mut decl = Self::bare(category, id, Provenance::Synthesized);
        decl.number = Some(number);
        decl.value_type = Some(value_type);
        decl.description = Some(description.into());
        decl
    }

    pub fn filter(id: impl Into<String>, description: impl Into<String>) -> Self {
        let mut decl = Self::bare(Category::Filter, id, Provenance::Synthesized);
        decl.description = Some(description.into());
        decl
    }

    pub fn contig(id: impl Into<String>, length: u64) -> Self {
        let mut decl = Self::bare(Category::Contig, id, Provenance::Synthesized);
        decl.length = Some(length);
        decl
    }

    /// An empty declaration as read from a header line, to be filled in by the parser
    pub(crate) fn parsed(category: Category, id: impl Into<String>) -> Self {
        Self::bare(category, id, Provenance::Real)
    }

    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Render as a `##KEY=<...>` header line (no trailing newline)
    #[must_use]
    pub fn render(&self) -> String {
        let mut line = format!("##{}=<ID={}", self.category.header_key(), self.id);

        match self.category {
            Category::Info | Category::Format => {
                let number = self.number.unwrap_or_default();
                let value_type = self.value_type.unwrap_or_default();
                line.push_str(&format!(",Number={number},Type={value_type}"));
                line.push_str(&format!(
                    ",Description=\"{}\"",
                    escape_description(self.description.as_deref().unwrap_or(""))
                ));
            }
            Category::Filter => {
                line.push_str(&format!(
                    ",Description=\"{}\"",
                    escape_description(self.description.as_deref().unwrap_or(""))
                ));
            }
            Category::Contig => {
                if let Some(length) = self.length {
                    line.push_str(&format!(",length={length}"));
                }
            }
        }

        line.push('>');
        line
    }
}

fn escape_description(description: &str) -> String {
    description.replace('\\', "\\\\").replace('"', "\\\"")
}
