use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::declaration::{Category, Declaration, DeclarationStatus, Number, ValueType};
use crate::core::header::{DeclareOutcome, HeaderError, VcfHeader};
use crate::reconcile::config::{DeclarationOverride, FixConfig, UnknownContigPolicy};
use crate::reconcile::resolver::{ContigLengthResolver, SENTINEL_CONTIG_LENGTH};
use crate::reconcile::scan::UsageSets;

/// Declarations synthesized per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisCounts {
    pub info: usize,
    pub format: usize,
    pub filter: usize,
    pub contig: usize,
}

impl SynthesisCounts {
    #[must_use]
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Info => self.info,
            Category::Format => self.format,
            Category::Filter => self.filter,
            Category::Contig => self.contig,
        }
    }

    fn increment(&mut self, category: Category) {
        match category {
            Category::Info => self.info += 1,
            Category::Format => self.format += 1,
            Category::Filter => self.filter += 1,
            Category::Contig => self.contig += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.info + self.format + self.filter + self.contig
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchOutcome {
    /// Includes replaced placeholders
    pub synthesized: SynthesisCounts,
    pub placeholders_replaced: usize,
    /// Contigs declared with [`SENTINEL_CONTIG_LENGTH`]
    pub sentinel_contigs: Vec<String>,
    /// Contigs whose records the rewriter must omit
    pub dropped_contigs: IndexSet<String>,
    /// Every declaration written, in the order it was declared
    pub declarations: Vec<Declaration>,
}

/// Adds the declarations a set of used identifiers is missing from a header.
///
/// Real declarations are never touched. Auto-placeholders count as missing and
/// are replaced in place; everything else is appended in category order
/// (INFO, FORMAT, FILTER, contig) and first-seen order within a category.
pub struct HeaderPatcher<'a> {
    config: &'a FixConfig,
    resolver: &'a ContigLengthResolver,
}

impl<'a> HeaderPatcher<'a> {
    #[must_use]
    pub fn new(config: &'a FixConfig, resolver: &'a ContigLengthResolver) -> Self {
        Self { config, resolver }
    }

    /// Patch `header` so every identifier in `usage` from an enabled category is declared
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::DuplicateDeclaration` if a declaration would
    /// overwrite a real one. That indicates a bug, not bad input.
    pub fn patch(
        &self,
        header: &mut VcfHeader,
        usage: &UsageSets,
    ) -> Result<PatchOutcome, HeaderError> {
        let mut outcome = PatchOutcome::default();

        let dropping = self.config.unknown_contigs == UnknownContigPolicy::Drop;
        if dropping && !self.resolver.has_authority() && !usage.contigs.is_empty() {
            warn!("Unknown contigs cannot be dropped without a .fai or .dict, keeping all records");
        }

        for category in Category::ALL {
            let synthesis = self.config.synthesis(category);

            for id in usage.get(category) {
                let status = header.status(category, id);
                if status == DeclarationStatus::Real {
                    continue;
                }

                let overrides = synthesis.override_for(id);

                if category == Category::Contig && dropping && self.should_drop(id, overrides) {
                    debug!(contig = %id, "Contig not in reference, dropping its records");
                    outcome.dropped_contigs.insert(id.clone());
                    continue;
                }

                if !synthesis.is_enabled() {
                    continue;
                }

                let declaration = match category {
                    Category::Contig => {
                        let length = self.contig_length(id, overrides);
                        if length == SENTINEL_CONTIG_LENGTH {
                            outcome.sentinel_contigs.push(id.clone());
                        }
                        Declaration::contig(id.as_str(), length)
                    }
                    Category::Filter => Declaration::filter(id.as_str(), description(id, overrides)),
                    Category::Info | Category::Format => Declaration::field(
                        category,
                        id.as_str(),
                        overrides.and_then(|o| o.number).unwrap_or(Number::Count(1)),
                        overrides.and_then(|o| o.value_type).unwrap_or(ValueType::String),
                        description(id, overrides),
                    ),
                };

                outcome.declarations.push(declaration.clone());
                match header.declare(declaration)? {
                    DeclareOutcome::ReplacedPlaceholder => {
                        debug!(category = %category, id = %id, "Replaced placeholder declaration");
                        outcome.placeholders_replaced += 1;
                    }
                    DeclareOutcome::Added => {
                        debug!(category = %category, id = %id, "Synthesized declaration");
                    }
                }
                outcome.synthesized.increment(category);
            }

            let count = outcome.synthesized.get(category);
            if count > 0 {
                info!(category = %category, count, "Synthesized header declarations");
            }
        }

        if !outcome.dropped_contigs.is_empty() {
            info!(
                contigs = outcome.dropped_contigs.len(),
                "Contigs marked for drop"
            );
        }

        Ok(outcome)
    }

    /// Only undeclared contigs are judged, and only against a loaded table
    fn should_drop(&self, contig: &str, overrides: Option<&DeclarationOverride>) -> bool {
        self.resolver.has_authority()
            && self.resolver.lookup(contig).is_none()
            && overrides.and_then(|o| o.length).is_none()
    }

    fn contig_length(&self, contig: &str, overrides: Option<&DeclarationOverride>) -> u64 {
        overrides
            .and_then(|o| o.length)
            .unwrap_or_else(|| self.resolver.resolve(contig))
    }
}

fn description(id: &str, overrides: Option<&DeclarationOverride>) -> String {
    overrides
        .and_then(|o| o.description.clone())
        .unwrap_or_else(|| id.to_uppercase())
}
