//! Command-line interface for vcf-fix.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **fix**: Reconcile a VCF's header with its records and write the result
//! - **scan**: Report what `fix` would change, without writing anything
//!
//! ## Usage
//!
//! ```text
//! # Declare every contig used by the records, lengths from the reference's .fai
//! vcf-fix fix calls.vcf.gz -o fixed.vcf.gz --contig --reference hg38.fa
//!
//! # Add "chr" prefixes and strip HTML from INFO
//! vcf-fix fix clinvar.vcf -o clinvar.fixed.vcf --add-chr --strip-markup
//!
//! # Use a JSON config with per-field metadata
//! vcf-fix fix in.vcf -o out.vcf --config fixes.json
//!
//! # See what would change, as JSON
//! vcf-fix scan in.vcf --info --format-fields --filter --format json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::core::declaration::Category;
use crate::reconcile::config::{FixConfig, UnknownContigPolicy};

pub mod fix;
pub mod scan;

#[derive(Parser)]
#[command(name = "vcf-fix")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Repair VCF headers so every field, filter and contig used by the records is declared")]
#[command(
    long_about = "vcf-fix reconciles a VCF's header with its records.\n\nIt can:\n- Add a prefix (e.g. \"chr\") to chromosome names\n- Strip HTML-like markup from the INFO column\n- Declare INFO, FORMAT and FILTER identifiers the header is missing\n- Declare contigs, with lengths from the reference's .fai or .dict\n\nOutput is written to a temporary file and only moved into place once complete."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a VCF and write the repaired copy
    Fix(fix::FixArgs),

    /// Report what fix would change without writing output
    Scan(scan::ScanArgs),
}

/// Repairs to apply, shared by `fix` and `scan`.
///
/// Flags switch repairs on; they never switch off what `--config` enables.
#[derive(Args, Debug, Default)]
pub struct FixOptions {
    /// JSON fix config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Prefix chromosome names that lack it
    #[arg(long)]
    pub add_chr: bool,

    /// Prefix added by --add-chr (implies --add-chr)
    #[arg(long, value_name = "PREFIX")]
    pub chr_prefix: Option<String>,

    /// Remove HTML-like markup entries from the INFO column
    #[arg(long)]
    pub strip_markup: bool,

    /// Declare INFO keys used by the records
    #[arg(long)]
    pub info: bool,

    /// Declare FORMAT keys used by the records
    #[arg(long)]
    pub format_fields: bool,

    /// Declare FILTER tags used by the records
    #[arg(long)]
    pub filter: bool,

    /// Declare contigs used by the records
    #[arg(long)]
    pub contig: bool,

    /// Reference FASTA, or its .fai / .dict, for contig lengths
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Omit records on contigs the reference does not list
    #[arg(long)]
    pub drop_unknown_contigs: bool,

    /// Description marking a declaration as a placeholder (repeatable)
    #[arg(long, value_name = "TEXT")]
    pub placeholder_description: Vec<String>,
}

impl FixOptions {
    /// Load `--config` (or the defaults) and apply the flags on top
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn to_config(&self) -> anyhow::Result<FixConfig> {
        let mut config = match &self.config {
            Some(path) => FixConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => FixConfig::default(),
        };

        if let Some(prefix) = &self.chr_prefix {
            config.contig_prefix.clone_from(prefix);
            config.normalize_contig_prefix = true;
        }
        if self.add_chr {
            config.normalize_contig_prefix = true;
        }
        if self.strip_markup {
            config.strip_markup = true;
        }

        for (enabled, category) in [
            (self.info, Category::Info),
            (self.format_fields, Category::Format),
            (self.filter, Category::Filter),
            (self.contig, Category::Contig),
        ] {
            if enabled {
                config.synthesis_mut(category).enable();
            }
        }

        if let Some(reference) = &self.reference {
            config.reference = Some(reference.clone());
        }
        if self.drop_unknown_contigs {
            config.unknown_contigs = UnknownContigPolicy::Drop;
        }
        if !self.placeholder_description.is_empty() {
            config
                .placeholder_descriptions
                .clone_from(&self.placeholder_description);
        }

        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
