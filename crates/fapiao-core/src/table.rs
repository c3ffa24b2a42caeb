//! Invoice ledger: one row per source file, with user annotations.
//!
//! Rows are keyed by filename and kept in insertion order. The ledger is
//! explicit state; callers load it, apply changes and save it back.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TableError;
use crate::models::record::{InvoiceFields, InvoiceRecord};

/// A ledger row: an extracted record plus annotations entered by a user.
///
/// Manual corrections live next to the record and take precedence over it;
/// the extracted record itself is never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    /// Extraction result for the file.
    pub record: InvoiceRecord,

    /// Person claiming the invoice (报销人).
    #[serde(default)]
    pub payer: String,

    /// Reimbursement date (报销时间), free text.
    #[serde(default)]
    pub date: String,

    /// Field values entered by hand, overriding the extracted ones.
    #[serde(default, skip_serializing_if = "InvoiceFields::is_empty")]
    pub correction: InvoiceFields,
}

impl InvoiceRow {
    fn new(record: InvoiceRecord) -> Self {
        Self {
            record,
            payer: String::new(),
            date: String::new(),
            correction: InvoiceFields::default(),
        }
    }

    pub fn filename(&self) -> &str {
        self.record.filename()
    }

    /// Fields as shown to the user: corrections first, then extraction.
    pub fn fields(&self) -> InvoiceFields {
        let extracted = self.record.fields();
        InvoiceFields {
            invoice_number: self
                .correction
                .invoice_number
                .clone()
                .or_else(|| extracted.invoice_number.clone()),
            seller_name: self
                .correction
                .seller_name
                .clone()
                .or_else(|| extracted.seller_name.clone()),
            amount: self.correction.amount.or(extracted.amount),
        }
    }

    pub fn is_corrected(&self) -> bool {
        !self.correction.is_empty()
    }
}

/// Exported row, filename excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub payer: String,
    pub date: String,
    pub invoice_number: String,
    pub seller_name: String,
    pub amount: f64,
}

impl ExportRow {
    /// Column headers in export order.
    pub const HEADERS: [&'static str; 5] = ["payer", "date", "invoice_number", "seller_name", "amount"];
}

/// Difference between the ledger and the current set of source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Files not yet in the ledger; these need extraction.
    pub added: Vec<String>,
    /// Files whose rows were dropped.
    pub removed: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered collection of invoice rows keyed by filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTable {
    rows: Vec<InvoiceRow>,
}

impl InvoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a ledger from a JSON file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&content).map_err(TableError::from)?;
        debug!("Loaded ledger with {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load a ledger, or start an empty one if the file does not exist.
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save the ledger as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(TableError::from)?;
        std::fs::write(path, content)?;
        debug!("Saved ledger with {} rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[InvoiceRow] {
        &self.rows
    }

    pub fn get(&self, filename: &str) -> Option<&InvoiceRow> {
        self.rows.iter().find(|row| row.filename() == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    /// Filenames currently in the ledger.
    pub fn filenames(&self) -> BTreeSet<String> {
        self.rows.iter().map(|row| row.filename().to_string()).collect()
    }

    /// Reconcile the ledger with the current set of source files.
    ///
    /// Rows for vanished files are dropped. The returned plan lists the new
    /// files, sorted, which the caller is expected to extract and insert.
    pub fn sync(&mut self, current: &BTreeSet<String>) -> SyncPlan {
        let known = self.filenames();

        let removed: Vec<String> = known.difference(current).cloned().collect();
        let added: Vec<String> = current.difference(&known).cloned().collect();

        if !removed.is_empty() {
            self.rows.retain(|row| current.contains(row.filename()));
        }

        info!(
            "Ledger sync: {} new, {} removed, {} kept",
            added.len(),
            removed.len(),
            self.rows.len()
        );

        SyncPlan { added, removed }
    }

    /// Insert a record; an existing row for the same file is replaced in
    /// place and keeps its annotations.
    pub fn insert(&mut self, record: InvoiceRecord) {
        match self.rows.iter_mut().find(|row| row.filename() == record.filename()) {
            Some(row) => row.record = record,
            None => self.rows.push(InvoiceRow::new(record)),
        }
    }

    /// Set the payer and date annotations of a row.
    pub fn annotate(
        &mut self,
        filename: &str,
        payer: Option<&str>,
        date: Option<&str>,
    ) -> Result<(), TableError> {
        let row = self.row_mut(filename)?;

        if let Some(payer) = payer {
            row.payer = payer.to_string();
        }
        if let Some(date) = date {
            row.date = date.to_string();
        }
        Ok(())
    }

    /// Override extracted fields of a row by hand.
    ///
    /// Only the fields set in `correction` are changed; earlier corrections
    /// to other fields are kept. Re-extraction does not discard them.
    pub fn correct(&mut self, filename: &str, correction: InvoiceFields) -> Result<(), TableError> {
        let row = self.row_mut(filename)?;

        if let Some(number) = correction.invoice_number {
            row.correction.invoice_number = Some(number);
        }
        if let Some(seller) = correction.seller_name {
            row.correction.seller_name = Some(seller);
        }
        if let Some(amount) = correction.amount {
            row.correction.amount = Some(amount);
        }
        debug!("Corrected {}: {:?}", filename, row.correction);
        Ok(())
    }

    /// Drop all manual corrections of a row, returning to extracted values.
    pub fn reset_correction(&mut self, filename: &str) -> Result<(), TableError> {
        self.row_mut(filename)?.correction = InvoiceFields::default();
        Ok(())
    }

    fn row_mut(&mut self, filename: &str) -> Result<&mut InvoiceRow, TableError> {
        self.rows
            .iter_mut()
            .find(|row| row.filename() == filename)
            .ok_or_else(|| TableError::UnknownFile(filename.to_string()))
    }

    /// Remove a row, returning it if present.
    pub fn remove(&mut self, filename: &str) -> Option<InvoiceRow> {
        let idx = self.rows.iter().position(|row| row.filename() == filename)?;
        Some(self.rows.remove(idx))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Rows in ledger order, ready for the spreadsheet.
    ///
    /// Corrections win over extracted values. Missing text fields become
    /// empty strings and a missing amount becomes `0.0`.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.rows
            .iter()
            .map(|row| {
                let fields = row.fields();
                let amount = fields.amount_or_zero();
                ExportRow {
                    payer: row.payer.clone(),
                    date: row.date.clone(),
                    invoice_number: fields.invoice_number.unwrap_or_default(),
                    seller_name: fields.seller_name.unwrap_or_default(),
                    amount,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(filename: &str, number: Option<&str>, amount: Option<f64>) -> InvoiceRecord {
        InvoiceRecord::new(
            filename,
            InvoiceFields {
                invoice_number: number.map(String::from),
                seller_name: Some("某公司".to_string()),
                amount,
            },
        )
    }

    fn names(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sync_reports_added_and_removed() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", None, None));
        table.insert(record("b.pdf", None, None));

        let plan = table.sync(&names(&["b.pdf", "c.pdf"]));
        assert_eq!(
            plan,
            SyncPlan {
                added: vec!["c.pdf".to_string()],
                removed: vec!["a.pdf".to_string()],
            }
        );
        assert_eq!(table.filenames(), names(&["b.pdf"]));

        assert!(table.sync(&names(&["b.pdf"])).is_empty());
    }

    #[test]
    fn test_sync_with_empty_set_clears() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", None, None));

        let plan = table.sync(&BTreeSet::new());
        assert_eq!(plan.removed, vec!["a.pdf".to_string()]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_insert_replaces_and_keeps_annotations() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", None, None));
        table.insert(record("b.pdf", None, None));
        table.annotate("a.pdf", Some("张三"), Some("2024-01-31")).unwrap();

        table.insert(record("a.pdf", Some("12345678"), Some(10.0)));

        assert_eq!(table.len(), 2);
        let row = &table.rows()[0];
        assert_eq!(row.filename(), "a.pdf");
        assert_eq!(row.record.invoice_number(), Some("12345678"));
        assert_eq!(row.payer, "张三");
        assert_eq!(row.date, "2024-01-31");
    }

    #[test]
    fn test_annotate_unknown_file() {
        let mut table = InvoiceTable::new();
        let err = table.annotate("missing.pdf", Some("x"), None).unwrap_err();
        assert!(matches!(err, TableError::UnknownFile(ref f) if f == "missing.pdf"));
    }

    #[test]
    fn test_annotate_partial() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", None, None));
        table.annotate("a.pdf", Some("李四"), None).unwrap();
        table.annotate("a.pdf", None, Some("3月")).unwrap();

        let row = table.get("a.pdf").unwrap();
        assert_eq!((row.payer.as_str(), row.date.as_str()), ("李四", "3月"));
    }

    #[test]
    fn test_export_applies_defaults() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", Some("12345678"), Some(99.5)));
        table.insert(InvoiceRecord::unreadable("bad.pdf"));
        table.annotate("a.pdf", Some("王五"), Some("2024-02-01")).unwrap();

        assert_eq!(
            table.export_rows(),
            vec![
                ExportRow {
                    payer: "王五".to_string(),
                    date: "2024-02-01".to_string(),
                    invoice_number: "12345678".to_string(),
                    seller_name: "某公司".to_string(),
                    amount: 99.5,
                },
                ExportRow {
                    payer: String::new(),
                    date: String::new(),
                    invoice_number: String::new(),
                    seller_name: String::new(),
                    amount: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", None, None));
        table.insert(record("b.pdf", None, None));

        assert!(table.remove("a.pdf").is_some());
        assert!(table.remove("a.pdf").is_none());
        assert!(table.contains("b.pdf"));

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        assert!(InvoiceTable::load_or_default(&path).unwrap().is_empty());

        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", Some("12345678"), None));
        table.annotate("a.pdf", Some("张三"), None).unwrap();
        table.save(&path).unwrap();

        assert_eq!(InvoiceTable::load(&path).unwrap(), table);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "[1, 2").unwrap();

        assert!(matches!(
            InvoiceTable::load(&path),
            Err(crate::FapiaoError::Table(TableError::Format(_)))
        ));
    }

    #[test]
    fn test_correction_overrides_export_only() {
        let mut table = InvoiceTable::new();
        table.insert(InvoiceRecord::unreadable("scan.pdf"));
        table.insert(record("a.pdf", Some("12345678"), Some(10.0)));

        table
            .correct(
                "scan.pdf",
                InvoiceFields {
                    invoice_number: Some("24312000000012345678".to_string()),
                    seller_name: None,
                    amount: Some(88.0),
                },
            )
            .unwrap();
        table
            .correct(
                "scan.pdf",
                InvoiceFields {
                    seller_name: Some("上海某贸易有限公司".to_string()),
                    ..InvoiceFields::default()
                },
            )
            .unwrap();

        let row = table.get("scan.pdf").unwrap();
        assert!(row.is_corrected());
        assert!(row.record.fields().is_empty());
        assert_eq!(
            row.fields(),
            InvoiceFields {
                invoice_number: Some("24312000000012345678".to_string()),
                seller_name: Some("上海某贸易有限公司".to_string()),
                amount: Some(88.0),
            }
        );

        let exported = table.export_rows();
        assert_eq!(exported[0].invoice_number, "24312000000012345678");
        assert_eq!(exported[0].amount, 88.0);
        assert_eq!(exported[1].invoice_number, "12345678");
    }

    #[test]
    fn test_partial_correction_falls_back_to_extracted() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", Some("12345678"), None));
        table
            .correct(
                "a.pdf",
                InvoiceFields {
                    amount: Some(12.5),
                    ..InvoiceFields::default()
                },
            )
            .unwrap();

        let fields = table.get("a.pdf").unwrap().fields();
        assert_eq!(fields.invoice_number.as_deref(), Some("12345678"));
        assert_eq!(fields.seller_name.as_deref(), Some("某公司"));
        assert_eq!(fields.amount, Some(12.5));
    }

    #[test]
    fn test_correction_survives_reinsert_and_reset() {
        let mut table = InvoiceTable::new();
        table.insert(record("a.pdf", None, None));
        table
            .correct(
                "a.pdf",
                InvoiceFields {
                    invoice_number: Some("87654321".to_string()),
                    ..InvoiceFields::default()
                },
            )
            .unwrap();

        table.insert(record("a.pdf", Some("12345678"), None));
        assert_eq!(
            table.get("a.pdf").unwrap().fields().invoice_number.as_deref(),
            Some("87654321")
        );

        table.reset_correction("a.pdf").unwrap();
        let row = table.get("a.pdf").unwrap();
        assert!(!row.is_corrected());
        assert_eq!(row.fields().invoice_number.as_deref(), Some("12345678"));
    }

    #[test]
    fn test_correct_unknown_file() {
        let mut table = InvoiceTable::new();
        let err = table.correct("missing.pdf", InvoiceFields::default()).unwrap_err();
        assert!(matches!(err, TableError::UnknownFile(ref f) if f == "missing.pdf"));
        assert!(table.reset_correction("missing.pdf").is_err());
    }

    #[test]
    fn test_ledger_without_corrections_still_loads() {
        let json = r#"{"rows": [{"record": {"filename": "a.pdf", "invoice_number": "12345678",
            "seller_name": null, "amount": null}, "payer": "张三"}]}"#;
        let table: InvoiceTable = serde_json::from_str(json).unwrap();
        let row = table.get("a.pdf").unwrap();
        assert!(!row.is_corrected());
        assert_eq!(row.payer, "张三");
        assert_eq!(row.date, "");
    }
}
