use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single contig/sequence in a reference genome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    /// Sequence name (SN tag in a dictionary, first column of a FASTA index)
    pub name: String,

    /// Sequence length (LN tag in a dictionary, second column of a FASTA index)
    pub length: u64,
}

impl Contig {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Contig name to length mapping loaded from one authoritative source.
///
/// Preserves the order of the source; when a name is listed twice the first
/// entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContigLengthTable {
    lengths: IndexMap<String, u64>,
}

impl ContigLengthTable {
    #[must_use]
    pub fn new(contigs: Vec<Contig>) -> Self {
        let mut lengths = IndexMap::with_capacity(contigs.len());
        for contig in contigs {
            lengths.entry(contig.name).or_insert(contig.length);
        }
        Self { lengths }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.lengths.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}
