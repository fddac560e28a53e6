use std::path::PathBuf;

use clap::Args;

use crate::cli::{FixOptions, OutputFormat};
use crate::core::declaration::Category;
use crate::reconcile::resolver::ContigLengthResolver;
use crate::reconcile::{FixPlan, Reconciler};

#[derive(Args)]
pub struct ScanArgs {
    /// Input VCF (plain or gzip/BGZF)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub options: FixOptions,
}

pub fn run(args: ScanArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.options.to_config()?;
    let resolver = ContigLengthResolver::for_config(&config)?;
    let plan = Reconciler::new(&config, &resolver).plan(&args.input)?;

    match format {
        OutputFormat::Text => print_text_plan(&plan, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Tsv => print_tsv_plan(&plan),
    }

    Ok(())
}

fn print_text_plan(plan: &FixPlan, verbose: bool) {
    println!("Scan Results");
    println!("{}", "=".repeat(60));
    println!("\nInput: {}", plan.input.display());
    println!("Records: {}", plan.records);

    if plan.sanitize.lines_changed > 0 {
        println!(
            "Lines to sanitize: {} ({} chromosomes prefixed, {} markup entries)",
            plan.sanitize.lines_changed,
            plan.sanitize.chromosomes_prefixed,
            plan.sanitize.markup_entries_removed
        );
    }

    println!("\nIdentifiers used:");
    for category in Category::ALL {
        let used = plan.usage.get(category);
        if used.is_empty() {
            continue;
        }
        println!("  {category}: {}", used.len());
        if verbose {
            for id in used {
                println!("    {id}");
            }
        }
    }

    if plan.patch.declarations.is_empty() {
        println!("\nNo declarations to add.");
    } else {
        println!("\nDeclarations to add:");
        for declaration in &plan.patch.declarations {
            println!("  {}", declaration.render());
        }
    }

    if !plan.patch.dropped_contigs.is_empty() {
        println!("\nRecords dropped on contigs:");
        for contig in &plan.patch.dropped_contigs {
            println!("  {contig}");
        }
    }

    println!("\nContig lengths from: {}", plan.contig_source);
}

fn print_tsv_plan(plan: &FixPlan) {
    println!("action\tcategory\tid\tline");
    for declaration in &plan.patch.declarations {
        println!(
            "declare\t{}\t{}\t{}",
            declaration.category,
            declaration.id,
            declaration.render()
        );
    }
    for contig in &plan.patch.dropped_contigs {
        println!("drop\t{}\t{contig}\t", Category::Contig);
    }
}
