//! Loads the repayments and batches sheets.
//!
//! The sheets come either from one workbook (`.xlsx`, `.xls`, `.ods`) or as
//! one CSV file each. Row 1 of a sheet holds the column headers and fields are
//! mapped by header name, so column order is free. Columns the engine does not
//! know about are carried through untouched.

use crate::batch::Batch;
use crate::columns;
use crate::config::InputSource;
use crate::error::{Result, WaterfallError};
use crate::money::Money;
use crate::repayment::Repayment;
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

const REPAYMENTS_SHEET: &str = "repayments";
const BATCHES_SHEET: &str = "batches";

/// Column positions resolved from a header row.
#[derive(Debug)]
struct HeaderMap {
    headers: Vec<String>,
}

impl HeaderMap {
    fn new(record: &StringRecord) -> Self {
        HeaderMap {
            headers: record.iter().map(|h| h.trim().to_string()).collect(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, sheet: &'static str, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| WaterfallError::Configuration {
                sheet,
                message: format!("missing required column '{}'", name),
            })
    }

    /// Non-empty cells from columns not in `known`, in sheet order.
    fn passthrough(&self, record: &StringRecord, known: &[&str]) -> Vec<(String, String)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty() && !known.contains(&h.as_str()))
            .filter_map(|(i, h)| cell(record, Some(i)).map(|v| (h.clone(), v)))
            .collect()
    }
}

/// Trimmed cell value; empty cells are absent.
fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Parses an amount cell, logging why a row is unusable.
fn parse_amount(
    record: &StringRecord,
    col: usize,
    sheet: &str,
    column: &str,
    row_num: usize,
) -> Option<Money> {
    let raw = match cell(record, Some(col)) {
        Some(raw) => raw,
        None => {
            warn!("{} row {}: missing '{}', skipping", sheet, row_num, column);
            return None;
        }
    };
    match Money::from_str(&raw) {
        Ok(amount) => Some(amount),
        Err(e) => {
            warn!(
                "{} row {}: invalid '{}' value '{}' ({}), skipping",
                sheet, row_num, column, raw, e
            );
            None
        }
    }
}

fn repayments_from_records<I>(header: &StringRecord, records: I) -> Result<Vec<Repayment>>
where
    I: IntoIterator<Item = Result<StringRecord>>,
{
    let header = HeaderMap::new(header);

    let amount_col = header.require(REPAYMENTS_SHEET, columns::REPAYMENT_AMOUNT)?;
    let date_col = header.position(columns::REPAYMENT_DATE);
    let payment_ref_col = header.position(columns::PAYMENT_REFERENCE);
    let batch_ref_col = header.position(columns::BATCH_REFERENCE);
    let known = [
        columns::REPAYMENT_AMOUNT,
        columns::REPAYMENT_DATE,
        columns::PAYMENT_REFERENCE,
        columns::BATCH_REFERENCE,
    ];

    let mut repayments = Vec::new();
    for (row_idx, result) in records.into_iter().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let amount = match parse_amount(
            &record,
            amount_col,
            "Repayments",
            columns::REPAYMENT_AMOUNT,
            row_num,
        ) {
            Some(amount) => amount,
            None => continue,
        };
        if amount.is_negative() {
            warn!("Repayments row {}: negative amount {}", row_num, amount);
        }

        repayments.push(Repayment {
            date: cell(&record, date_col),
            payment_reference: cell(&record, payment_ref_col),
            batch_reference: cell(&record, batch_ref_col),
            amount,
            passthrough: header.passthrough(&record, &known),
        });
    }

    debug!("Loaded {} repayments", repayments.len());
    Ok(repayments)
}

fn batches_from_records<I>(header: &StringRecord, records: I) -> Result<Vec<Batch>>
where
    I: IntoIterator<Item = Result<StringRecord>>,
{
    let header = HeaderMap::new(header);

    let reference_col = header.require(BATCHES_SHEET, columns::BATCH_REFERENCE)?;
    let due_col = header.require(BATCHES_SHEET, columns::TOTAL_AMOUNT_DUE)?;
    let known = [columns::BATCH_REFERENCE, columns::TOTAL_AMOUNT_DUE];

    let mut batches = Vec::new();
    for (row_idx, result) in records.into_iter().enumerate() {
        let row_num = row_idx + 2;
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let total_amount_due = match parse_amount(
            &record,
            due_col,
            "Batches",
            columns::TOTAL_AMOUNT_DUE,
            row_num,
        ) {
            Some(amount) => amount,
            None => continue,
        };

        let mut batch = Batch::new(
            cell(&record, Some(reference_col)).unwrap_or_default(),
            total_amount_due,
        );
        batch.passthrough = header.passthrough(&record, &known);
        batches.push(batch);
    }

    debug!("Loaded {} batches", batches.len());
    Ok(batches)
}

fn sheet_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Reads a repayments sheet from CSV.
///
/// Rows with a missing or unusable `Repayment Amount` (not a decimal, more
/// than 4 decimal places, or beyond the supported magnitude) are logged at
/// warn level and skipped.
pub fn read_repayments<R: Read>(reader: R) -> Result<Vec<Repayment>> {
    let mut csv_reader = sheet_reader(reader);
    let header = csv_reader.headers()?.clone();
    repayments_from_records(&header, csv_reader.into_records().map(|r| r.map_err(WaterfallError::from)))
}

/// Reads a batches sheet from CSV.
///
/// Rows with a missing or unusable `Total Amount Due` are skipped the same
/// way. A batch with an empty reference is kept; no repayment can match it
/// directly but it still takes part in the cascade.
pub fn read_batches<R: Read>(reader: R) -> Result<Vec<Batch>> {
    let mut csv_reader = sheet_reader(reader);
    let header = csv_reader.headers()?.clone();
    batches_from_records(&header, csv_reader.into_records().map(|r| r.map_err(WaterfallError::from)))
}

/// Text form of a spreadsheet cell, as the CSV path would have seen it.
fn cell_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}

/// Splits a worksheet range into its header row and data rows.
fn range_records(range: &Range<Data>) -> (StringRecord, Vec<StringRecord>) {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<StringRecord>());
    let header = rows.next().unwrap_or_default();
    (header, rows.collect())
}

/// Picks a sheet by name, else by position.
///
/// Position follows the usual workbook layout: a cover sheet first, then
/// repayments, then batches.
fn select_sheet(
    names: &[String],
    sheet: &'static str,
    fallback_index: usize,
) -> Result<String> {
    if let Some(name) = names.iter().find(|n| n.trim().eq_ignore_ascii_case(sheet)) {
        return Ok(name.clone());
    }
    names
        .get(fallback_index)
        .cloned()
        .ok_or_else(|| WaterfallError::Configuration {
            sheet,
            message: format!(
                "workbook has no sheet named '{}' and only {} sheet(s); expected it at position {}",
                sheet,
                names.len(),
                fallback_index + 1
            ),
        })
}

/// Reads both sheets from one workbook.
pub fn read_workbook(path: &Path) -> Result<(Vec<Repayment>, Vec<Batch>)> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();

    let repayments_name = select_sheet(&names, REPAYMENTS_SHEET, 1)?;
    let batches_name = select_sheet(&names, BATCHES_SHEET, 2)?;
    info!(
        "Reading sheets '{}' and '{}' from {}",
        repayments_name,
        batches_name,
        path.display()
    );

    let (header, rows) = range_records(&workbook.worksheet_range(&repayments_name)?);
    let repayments = repayments_from_records(&header, rows.into_iter().map(Ok))?;

    let (header, rows) = range_records(&workbook.worksheet_range(&batches_name)?);
    let batches = batches_from_records(&header, rows.into_iter().map(Ok))?;

    Ok((repayments, batches))
}

/// Loads both sheets. Any failure aborts before allocation starts.
pub fn load(input: &InputSource) -> Result<(Vec<Repayment>, Vec<Batch>)> {
    match input {
        InputSource::Workbook(path) => read_workbook(path),
        InputSource::Sheets {
            repayments,
            batches,
        } => {
            let repayments = read_repayments(BufReader::new(File::open(repayments)?))?;
            let batches = read_batches(BufReader::new(File::open(batches)?))?;
            Ok((repayments, batches))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_repayments_by_header_name() {
        let csv = "Repayment Amount,Jia Advance #,Ref No.,Repayment Date\n\
                   40.5,B-1,PAY-1,2021-01-05\n";

        let repayments = read_repayments(Cursor::new(csv)).unwrap();
        assert_eq!(repayments.len(), 1);
        let r = &repayments[0];
        assert_eq!(r.amount, Money::from_str("40.5").unwrap());
        assert_eq!(r.batch_reference.as_deref(), Some("B-1"));
        assert_eq!(r.payment_reference.as_deref(), Some("PAY-1"));
        assert_eq!(r.date.as_deref(), Some("2021-01-05"));
        assert!(r.passthrough.is_empty());
    }

    #[test]
    fn test_empty_batch_reference_is_absent() {
        let csv = "Repayment Date,Ref No.,Repayment Amount,Jia Advance #\n\
                   2021-01-05,PAY-1,10,\n";

        let repayments = read_repayments(Cursor::new(csv)).unwrap();
        assert_eq!(repayments[0].batch_reference, None);
    }

    #[test]
    fn test_keeps_unknown_columns() {
        let csv = "Jia Advance #,Total Amount Due,Borrower,Notes\n\
                   B-1,100,Acme,\n";

        let batches = read_batches(Cursor::new(csv)).unwrap();
        assert_eq!(
            batches[0].passthrough,
            vec![("Borrower".to_string(), "Acme".to_string())]
        );
    }

    #[test]
    fn test_skips_invalid_and_blank_rows() {
        let csv = "Jia Advance #,Repayment Amount\n\
                   B-1,abc\n\
                   ,\n\
                   B-2,\n\
                   B-3,5\n";

        let repayments = read_repayments(Cursor::new(csv)).unwrap();
        assert_eq!(repayments.len(), 1);
        assert_eq!(repayments[0].batch_reference.as_deref(), Some("B-3"));
    }

    #[test]
    fn test_trims_headers_and_values() {
        let csv = " Jia Advance # , Total Amount Due \n  B-1 ,  100.25 \n";

        let batches = read_batches(Cursor::new(csv)).unwrap();
        assert_eq!(batches[0].reference, "B-1");
        assert_eq!(batches[0].total_amount_due, Money::from_str("100.25").unwrap());
    }

    #[test]
    fn test_missing_required_column_is_configuration_error() {
        let csv = "Jia Advance #,Amount\nB-1,100\n";

        let err = read_batches(Cursor::new(csv)).unwrap_err();
        match err {
            WaterfallError::Configuration { sheet, message } => {
                assert_eq!(sheet, "batches");
                assert!(message.contains("Total Amount Due"));
            }
            other => panic!("Expected Configuration, got {:?}", other),
        }

        let err = read_repayments(Cursor::new("Jia Advance #\nB-1\n")).unwrap_err();
        assert!(matches!(err, WaterfallError::Configuration { .. }));
    }

    #[test]
    fn test_skips_amounts_that_would_round() {
        let csv = "Repayment Amount,Jia Advance #\n\
                   0.00004,A\n\
                   1.00005,A\n\
                   1.5000,A\n";

        let repayments = read_repayments(Cursor::new(csv)).unwrap();
        assert_eq!(repayments.len(), 1);
        assert_eq!(repayments[0].amount, Money::from_str("1.5").unwrap());
    }

    #[test]
    fn test_skips_amounts_beyond_limit() {
        let csv = "Jia Advance #,Total Amount Due\n\
                   A,40000000000000000000000000000\n\
                   B,1000000000000000\n";

        let batches = read_batches(Cursor::new(csv)).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].reference, "B");
    }

    #[test]
    fn test_cell_text_matches_csv_form() {
        assert_eq!(cell_text(&Data::Float(70.0)), "70");
        assert_eq!(cell_text(&Data::Float(10.1)), "10.1");
        assert_eq!(cell_text(&Data::Int(1001)), "1001");
        assert_eq!(cell_text(&Data::String("B-1".to_string())), "B-1");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_select_sheet_by_name_then_position() {
        let named = vec![
            "Summary".to_string(),
            "Batches".to_string(),
            "Repayments".to_string(),
        ];
        assert_eq!(select_sheet(&named, REPAYMENTS_SHEET, 1).unwrap(), "Repayments");
        assert_eq!(select_sheet(&named, BATCHES_SHEET, 2).unwrap(), "Batches");

        let positional = vec!["Cover".to_string(), "In".to_string(), "Loans".to_string()];
        assert_eq!(select_sheet(&positional, REPAYMENTS_SHEET, 1).unwrap(), "In");
        assert_eq!(select_sheet(&positional, BATCHES_SHEET, 2).unwrap(), "Loans");

        let short = vec!["Only".to_string()];
        let err = select_sheet(&short, BATCHES_SHEET, 2).unwrap_err();
        assert!(matches!(err, WaterfallError::Configuration { sheet: "batches", .. }));
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let batches = read_batches(Cursor::new("Jia Advance #,Total Amount Due\n")).unwrap();
        assert!(batches.is_empty());
    }
}
