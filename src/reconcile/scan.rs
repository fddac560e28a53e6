use indexmap::IndexSet;
use serde::Serialize;

use crate::core::declaration::Category;
use crate::core::record::Record;
use crate::reconcile::config::FixConfig;

/// Distinct identifiers used by the records of a stream, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageSets {
    pub info: IndexSet<String>,
    pub format: IndexSet<String>,
    pub filter: IndexSet<String>,
    pub contigs: IndexSet<String>,
}

impl UsageSets {
    #[must_use]
    pub fn get(&self, category: Category) -> &IndexSet<String> {
        match category {
            Category::Info => &self.info,
            Category::Format => &self.format,
            Category::Filter => &self.filter,
            Category::Contig => &self.contigs,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut IndexSet<String> {
        match category {
            Category::Info => &mut self.info,
            Category::Format => &mut self.format,
            Category::Filter => &mut self.filter,
            Category::Contig => &mut self.contigs,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|&c| self.get(c).is_empty())
    }
}

/// Accumulates [`UsageSets`] over parsed records.
///
/// Only categories the config scans are collected. Memory is bounded by the
/// number of distinct identifiers, not the number of records.
#[derive(Debug, Clone)]
pub struct SchemaScanner {
    enabled: [bool; 4],
    usage: UsageSets,
    records: u64,
}

impl SchemaScanner {
    #[must_use]
    pub fn new(config: &FixConfig) -> Self {
        Self {
            enabled: Category::ALL.map(|c| config.scans(c)),
            usage: UsageSets::default(),
            records: 0,
        }
    }

    fn scans(&self, category: Category) -> bool {
        self.enabled[category as usize]
    }

    pub fn observe(&mut self, record: &Record<'_>) {
        self.records += 1;

        if self.scans(Category::Contig) {
            insert(self.usage.get_mut(Category::Contig), record.chrom);
        }
        if self.scans(Category::Info) {
            let set = self.usage.get_mut(Category::Info);
            for key in record.info_keys() {
                insert(set, key);
            }
        }
        if self.scans(Category::Format) {
            let set = self.usage.get_mut(Category::Format);
            for key in record.format_keys() {
                insert(set, key);
            }
        }
        if self.scans(Category::Filter) {
            let set = self.usage.get_mut(Category::Filter);
            for tag in record.filter_tags() {
                insert(set, tag);
            }
        }
    }

    #[must_use]
    pub fn records_seen(&self) -> u64 {
        self.records
    }

    /// Freeze the collected usage
    #[must_use]
    pub fn finish(self) -> UsageSets {
        self.usage
    }
}

fn insert(set: &mut IndexSet<String>, id: &str) {
    if !set.contains(id) {
        set.insert(id.to_string());
    }
}
