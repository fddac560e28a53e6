use std::path::PathBuf;

use clap::Args;

use crate::cli::{FixOptions, OutputFormat};
use crate::reconcile::resolver::ContigLengthResolver;
use crate::reconcile::{FixReport, Reconciler};

#[derive(Args)]
pub struct FixArgs {
    /// Input VCF (plain or gzip/BGZF)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output VCF; BGZF-compressed when it ends in .gz or .bgz
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    #[command(flatten)]
    pub options: FixOptions,
}

pub fn run(args: FixArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if args.input == args.output {
        anyhow::bail!(
            "Output path must differ from input: {}",
            args.input.display()
        );
    }

    let config = args.options.to_config()?;
    let resolver = ContigLengthResolver::for_config(&config)?;

    if verbose {
        eprintln!("Contig lengths from: {}", resolver.source());
    }

    let report = Reconciler::new(&config, &resolver).run(&args.input, &args.output)?;

    match format {
        OutputFormat::Text => print_text_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    Ok(())
}

fn print_text_report(report: &FixReport) {
    println!("Fix Results");
    println!("{}", "=".repeat(60));
    println!("\nInput:  {}", report.input.display());
    println!("Output: {}", report.output.display());

    if report.fast_path {
        println!("\nNo repairs enabled; input copied unchanged.");
        return;
    }

    println!("\nRecords:");
    println!("  Read: {}", report.records_read);
    println!("  Written: {}", report.records_written);
    if report.records_dropped > 0 {
        println!("  Dropped: {}", report.records_dropped);
    }

    let sanitize = &report.sanitize;
    if sanitize.lines_changed > 0 {
        println!("\nSanitized lines: {}", sanitize.lines_changed);
        println!("  Chromosomes prefixed: {}", sanitize.chromosomes_prefixed);
        println!("  Markup entries removed: {}", sanitize.markup_entries_removed);
    }

    println!("\nDeclarations added:");
    println!("  INFO: {}", report.synthesized.info);
    println!("  FORMAT: {}", report.synthesized.format);
    println!("  FILTER: {}", report.synthesized.filter);
    println!("  contig: {}", report.synthesized.contig);
    if report.placeholders_replaced > 0 {
        println!("  (replaced {} placeholders)", report.placeholders_replaced);
    }

    println!("\nContig lengths from: {}", report.contig_source);
    if !report.sentinel_contigs.is_empty() {
        println!(
            "  Sentinel length used for: {}",
            report.sentinel_contigs.join(", ")
        );
    }
    if !report.dropped_contigs.is_empty() {
        println!(
            "  Dropped contigs: {}",
            report.dropped_contigs.join(", ")
        );
    }
}

fn print_tsv_report(report: &FixReport) {
    println!(
        "input\toutput\tfast_path\trecords_read\trecords_written\trecords_dropped\tlines_sanitized\tinfo\tformat\tfilter\tcontig\tplaceholders_replaced\tsentinel_contigs\tdropped_contigs"
    );
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        report.input.display(),
        report.output.display(),
        report.fast_path,
        report.records_read,
        report.records_written,
        report.records_dropped,
        report.sanitize.lines_changed,
        report.synthesized.info,
        report.synthesized.format,
        report.synthesized.filter,
        report.synthesized.contig,
        report.placeholders_replaced,
        report.sentinel_contigs.len(),
        report.dropped_contigs.len(),
    );
}
