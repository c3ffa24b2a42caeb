//! Extract command - fields from a single PDF invoice.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::{info, warn};

use fapiao_core::{
    read_first_page, ExtractionResult, FapiaoError, InvoiceParser, InvoiceRecord, PdfError,
    RuleInvoiceParser,
};

use super::config::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let parser = RuleInvoiceParser::new().with_seller_strategy(config.extraction.seller_strategy);
    let filename = display_name(&args.input);

    // An unreadable PDF still yields a record so the user can fill it in by hand
    let read = panic::catch_unwind(AssertUnwindSafe(|| read_first_page(&args.input, &config.pdf)))
        .unwrap_or_else(|_| {
            Err(FapiaoError::Pdf(PdfError::TextExtraction(
                "extraction panicked".to_string(),
            )))
        });

    let record = match read {
        Ok(text) => {
            let result = parser.parse(text.as_deref());
            report_missing(&filename, &result);
            InvoiceRecord::new(filename, result.fields)
        }
        Err(e) => {
            warn!("Failed to read {}: {}", args.input.display(), e);
            eprintln!("{} Could not parse {}: {}", style("⚠").yellow(), filename, e);
            InvoiceRecord::unreadable(filename)
        }
    };

    write_output(&record, args.format, args.output.as_deref())
}

/// File name used as the record key.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print a soft notice for fields that were not found.
pub fn report_missing(filename: &str, result: &ExtractionResult) {
    if result.missing.is_empty() {
        return;
    }
    let missing: Vec<String> = result.missing.iter().map(|f| f.to_string()).collect();
    eprintln!(
        "{} {}: no {} found, please check manually",
        style("ℹ").blue(),
        filename,
        missing.join(", ")
    );
}

/// Format a record and write it to a file or stdout.
pub fn write_output(
    record: &InvoiceRecord,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let content = format_record(record, format)?;

    match output {
        Some(path) => {
            fs::write(path, &content)?;
            eprintln!("{} Output written to {}", style("✓").green(), path.display());
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}

pub fn format_record(record: &InvoiceRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let amount = record.fields().amount_or_zero().to_string();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["filename", "invoice_number", "seller_name", "amount"])?;
    wtr.write_record([
        record.filename(),
        record.invoice_number().unwrap_or_default(),
        record.seller_name().unwrap_or_default(),
        amount.as_str(),
    ])?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(record: &InvoiceRecord) -> String {
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();

    let mut output = String::new();
    output.push_str(&format!("File:    {}\n", record.filename()));
    output.push_str(&format!("Invoice: {}\n", or_dash(record.invoice_number())));
    output.push_str(&format!("Seller:  {}\n", or_dash(record.seller_name())));
    output.push_str(&format!(
        "Amount:  {}\n",
        record.amount().map(|a| format!("{:.2}", a)).unwrap_or_else(|| "-".to_string())
    ));
    output
}
