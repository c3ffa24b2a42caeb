//! Text command - run the extractor over text from another provider.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use fapiao_core::{InvoiceParser, InvoiceRecord, RuleInvoiceParser};

use super::config::load_config;
use super::extract::{display_name, report_missing, write_output, OutputFormat};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Text file holding the first page of an invoice ("-" or omitted for stdin)
    input: Option<PathBuf>,

    /// Filename to record (defaults to the input file name, or "stdin")
    #[arg(long)]
    name: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let (text, default_name) = match &args.input {
        Some(path) if path.as_os_str() != "-" => (std::fs::read_to_string(path)?, display_name(path)),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            (buf, "stdin".to_string())
        }
    };
    let filename = args.name.unwrap_or(default_name);

    let parser = RuleInvoiceParser::new().with_seller_strategy(config.extraction.seller_strategy);
    let result = parser.parse(Some(&text));
    report_missing(&filename, &result);

    let record = InvoiceRecord::new(filename, result.fields);
    write_output(&record, args.format, args.output.as_deref())
}
