//! Ledger command - inspect, annotate and export the invoice ledger.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use fapiao_core::{InvoiceFields, InvoiceTable};

/// Arguments for the ledger command.
#[derive(Args)]
pub struct LedgerArgs {
    /// Ledger file
    #[arg(short, long, required = true)]
    table: PathBuf,

    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand)]
enum LedgerCommand {
    /// List all rows
    Show,

    /// Set payer and/or reimbursement date for a file
    Annotate {
        /// File name of the invoice
        filename: String,

        /// Person claiming the invoice
        #[arg(long)]
        payer: Option<String>,

        /// Reimbursement date
        #[arg(long)]
        date: Option<String>,
    },

    /// Correct extracted fields by hand
    Correct {
        /// File name of the invoice
        filename: String,

        /// Invoice number
        #[arg(long)]
        invoice_number: Option<String>,

        /// Seller name
        #[arg(long)]
        seller: Option<String>,

        /// Total amount
        #[arg(long)]
        amount: Option<f64>,

        /// Discard earlier corrections first
        #[arg(long)]
        reset: bool,
    },

    /// Remove the row for a file
    Remove {
        /// File name of the invoice
        filename: String,
    },

    /// Write the spreadsheet export as CSV (stdout if no output given)
    Export {
        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove all rows
    Clear,
}

pub async fn run(args: LedgerArgs) -> anyhow::Result<()> {
    match args.command {
        LedgerCommand::Show => {
            let table = InvoiceTable::load_or_default(&args.table)?;
            print_table(&table);
        }
        LedgerCommand::Annotate {
            filename,
            payer,
            date,
        } => {
            if payer.is_none() && date.is_none() {
                anyhow::bail!("Nothing to annotate: pass --payer and/or --date");
            }
            let mut table = InvoiceTable::load(&args.table)?;
            table.annotate(&filename, payer.as_deref(), date.as_deref())?;
            table.save(&args.table)?;
            println!("{} Updated {}", style("✓").green(), filename);
        }
        LedgerCommand::Correct {
            filename,
            invoice_number,
            seller,
            amount,
            reset,
        } => {
            let correction = InvoiceFields {
                invoice_number,
                seller_name: seller,
                amount,
            };
            if correction.is_empty() && !reset {
                anyhow::bail!(
                    "Nothing to correct: pass --invoice-number, --seller, --amount or --reset"
                );
            }
            if correction.amount.is_some_and(|a| !a.is_finite()) {
                anyhow::bail!("Amount must be a finite number");
            }

            let mut table = InvoiceTable::load(&args.table)?;
            if reset {
                table.reset_correction(&filename)?;
            }
            table.correct(&filename, correction)?;
            table.save(&args.table)?;
            println!("{} Corrected {}", style("✓").green(), filename);
        }
        LedgerCommand::Remove { filename } => {
            let mut table = InvoiceTable::load(&args.table)?;
            if table.remove(&filename).is_none() {
                anyhow::bail!("No invoice row for file: {}", filename);
            }
            table.save(&args.table)?;
            println!("{} Removed {}", style("✓").green(), filename);
        }
        LedgerCommand::Export { output } => {
            let table = InvoiceTable::load(&args.table)?;
            match output {
                Some(path) => {
                    write_export(&table, &path)?;
                    println!("{} Export written to {}", style("✓").green(), path.display());
                }
                None => {
                    let stdout = std::io::stdout();
                    export_csv(&table, stdout.lock())?;
                }
            }
        }
        LedgerCommand::Clear => {
            let mut table = InvoiceTable::load_or_default(&args.table)?;
            let count = table.len();
            table.clear();
            table.save(&args.table)?;
            println!("{} Cleared {} rows", style("✓").green(), count);
        }
    }

    Ok(())
}

/// Write the export rows as CSV.
pub fn export_csv<W: Write>(table: &InvoiceTable, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    if table.is_empty() {
        wtr.write_record(fapiao_core::ExportRow::HEADERS)?;
    }
    for row in table.export_rows() {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the export CSV to a file.
pub fn write_export(table: &InvoiceTable, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    export_csv(table, file)
}

fn print_table(table: &InvoiceTable) {
    if table.is_empty() {
        println!("{} Ledger is empty", style("ℹ").blue());
        return;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let fields = row.fields();
        let marker = if row.is_corrected() { " (corrected)" } else { "" };
        println!(
            "{:>3}. {}{}",
            i + 1,
            style(row.filename()).bold(),
            style(marker).dim()
        );
        println!(
            "     invoice: {}  seller: {}  amount: {}",
            fields.invoice_number.as_deref().unwrap_or("-"),
            fields.seller_name.as_deref().unwrap_or("-"),
            fields
                .amount
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| style("-").yellow().to_string())
        );
        if !row.payer.is_empty() || !row.date.is_empty() {
            println!("     payer: {}  date: {}", row.payer, row.date);
        }
    }

    let total: f64 = table.export_rows().iter().map(|r| r.amount).sum();
    println!();
    println!("{} rows, total {:.2}", table.len(), total);
}
