//! Batch command - process many PDF invoices into a ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use fapiao_core::models::config::PdfConfig;
use fapiao_core::{
    read_first_page, Field, InvoiceParser, InvoiceRecord, InvoiceTable, RuleInvoiceParser,
};

use super::config::load_config;
use super::extract::display_name;
use super::ledger::write_export;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern (e.g. "invoices/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Ledger file to update incrementally
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Write the spreadsheet export (CSV) here
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Also write one JSON record per file into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of parallel workers (default from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Re-extract files already present in the ledger
    #[arg(long)]
    refresh: bool,

    /// Stop with an error if any file cannot be read
    #[arg(long)]
    fail_fast: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    record: InvoiceRecord,
    missing: Vec<Field>,
    error: Option<String>,
}

impl FileOutcome {
    fn unreadable(name: &str, error: String) -> Self {
        Self {
            record: InvoiceRecord::unreadable(name),
            missing: vec![Field::InvoiceNumber, Field::SellerName, Field::Amount],
            error: Some(error),
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    println!("{} Found {} files", style("ℹ").blue(), files.len());

    let mut table = match &args.table {
        Some(path) => InvoiceTable::load_or_default(path)?,
        None => InvoiceTable::new(),
    };

    let current: BTreeSet<String> = files.keys().cloned().collect();
    let plan = table.sync(&current);
    for name in &plan.removed {
        debug!("Dropped {} from ledger", name);
    }

    let pending: Vec<(String, PathBuf)> = if args.refresh {
        files.into_iter().collect()
    } else {
        files
            .into_iter()
            .filter(|(name, _)| plan.added.contains(name))
            .collect()
    };

    if pending.is_empty() {
        println!("{} Ledger is up to date", style("✓").green());
    }

    let parser = RuleInvoiceParser::new().with_seller_strategy(config.extraction.seller_strategy);
    let jobs = args.jobs.unwrap_or(config.batch.jobs);
    let mut outcomes = process_files(pending, parser, config.pdf.clone(), jobs).await?;

    // Workers finish in any order; keep the ledger deterministic
    outcomes.sort_by(|a, b| a.record.filename().cmp(b.record.filename()));

    let failed: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    if !failed.is_empty() && (args.fail_fast || !config.batch.continue_on_error) {
        print_failures(&failed);
        anyhow::bail!("{} file(s) could not be read", failed.len());
    }

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
        for outcome in &outcomes {
            write_record_json(output_dir, &outcome.record)?;
        }
    }

    let incomplete: Vec<&FileOutcome> = outcomes
        .iter()
        .filter(|o| o.error.is_none() && !o.missing.is_empty())
        .collect();

    let processed = outcomes.len();
    for outcome in &outcomes {
        table.insert(outcome.record.clone());
    }

    if let Some(path) = &args.table {
        table.save(path)?;
        println!("{} Ledger saved to {}", style("✓").green(), path.display());
    }

    if let Some(path) = &args.export {
        write_export(&table, path)?;
        println!("{} Export written to {}", style("✓").green(), path.display());
    }

    println!();
    println!(
        "{} Processed {} files in {:?} ({} rows in ledger)",
        style("✓").green(),
        processed,
        start.elapsed(),
        table.len()
    );
    println!(
        "   {} complete, {} incomplete, {} unreadable",
        style(processed - incomplete.len() - failed.len()).green(),
        style(incomplete.len()).yellow(),
        style(failed.len()).red()
    );

    for outcome in &incomplete {
        let missing: Vec<String> = outcome.missing.iter().map(|f| f.to_string()).collect();
        println!("  - {}: no {}", outcome.record.filename(), missing.join(", "));
    }
    print_failures(&failed);

    Ok(())
}

/// Expand the glob into PDF files keyed by file name.
fn collect_files(pattern: &str) -> anyhow::Result<BTreeMap<String, PathBuf>> {
    let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();

    for path in glob(pattern)?.filter_map(|r| r.ok()) {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf || !path.is_file() {
            continue;
        }

        let name = display_name(&path);
        if let Some(existing) = files.get(&name) {
            warn!(
                "Skipping {}: file name already used by {}",
                path.display(),
                existing.display()
            );
            continue;
        }
        files.insert(name, path);
    }

    Ok(files)
}

/// Run extraction on a bounded pool of blocking workers.
///
/// The progress bar only tracks how many files have completed.
async fn process_files(
    pending: Vec<(String, PathBuf)>,
    parser: RuleInvoiceParser,
    pdf_config: PdfConfig,
    jobs: usize,
) -> anyhow::Result<Vec<FileOutcome>> {
    let pb = ProgressBar::new(pending.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let parser = Arc::new(parser);
    let pdf_config = Arc::new(pdf_config);
    let mut workers = JoinSet::new();

    for (name, path) in pending {
        let permit = semaphore.clone().acquire_owned().await?;
        let parser = parser.clone();
        let pdf_config = pdf_config.clone();
        let pb = pb.clone();

        workers.spawn_blocking(move || {
            let _permit = permit;
            // A panic must cost one file, not the whole batch
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                process_single_file(&name, &path, &parser, &pdf_config)
            }))
            .unwrap_or_else(|_| {
                warn!("Worker panicked on {}", path.display());
                FileOutcome::unreadable(&name, "extraction panicked".to_string())
            });
            pb.inc(1);
            outcome
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!("Worker did not finish: {}", e),
        }
    }

    pb.finish_and_clear();
    Ok(outcomes)
}

fn process_single_file(
    name: &str,
    path: &Path,
    parser: &RuleInvoiceParser,
    pdf_config: &PdfConfig,
) -> FileOutcome {
    match read_first_page(path, pdf_config) {
        Ok(text) => {
            let result = parser.parse(text.as_deref());
            debug!("{}: extracted in {}ms", name, result.processing_time_ms);
            FileOutcome {
                record: InvoiceRecord::new(name, result.fields),
                missing: result.missing,
                error: None,
            }
        }
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            FileOutcome::unreadable(name, e.to_string())
        }
    }
}

fn write_record_json(output_dir: &Path, record: &InvoiceRecord) -> anyhow::Result<()> {
    let stem = Path::new(record.filename())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    let output_path = output_dir.join(format!("{}.json", stem));

    fs::write(&output_path, serde_json::to_string_pretty(record)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn print_failures(failed: &[&FileOutcome]) {
    if failed.is_empty() {
        return;
    }
    println!();
    println!("{}", style("Could not parse:").red());
    for outcome in failed {
        println!(
            "  - {}: {}",
            outcome.record.filename(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}
