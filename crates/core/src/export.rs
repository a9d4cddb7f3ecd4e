use chrono::NaiveDate;

use crate::error::{ExportError, ExportKind};
use crate::types::Customer;

/// UTF-8 byte-order mark so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub const HISTORY_HEADER: [&str; 2] = ["日付", "施術内容"];
pub const DIRECTORY_HEADER: [&str; 5] = ["お客様ID", "お名前", "フリガナ", "電話番号", "来店回数"];

const LINE_SEPARATOR: &str = "\n";

/// Deterministic CSV serialization of visit histories and the customer list.
pub struct CsvExporter;

impl CsvExporter {
    /// Serializes one customer's visit history, most recent visit first.
    pub fn export_history(customer: &Customer) -> Result<Vec<u8>, ExportError> {
        if customer.history.is_empty() {
            return Err(ExportError::EmptyData(ExportKind::History));
        }

        let rows = customer
            .history
            .iter()
            .map(|record| format!("{},{}", record.date, quote(&record.note)));

        Ok(render(&HISTORY_HEADER, rows))
    }

    /// Serializes the given customers in input order.
    pub fn export_directory<'a, I>(customers: I) -> Result<Vec<u8>, ExportError>
    where
        I: IntoIterator<Item = &'a Customer>,
    {
        let mut customers = customers.into_iter().peekable();
        if customers.peek().is_none() {
            return Err(ExportError::EmptyData(ExportKind::Directory));
        }

        let rows = customers.map(|customer| {
            format!(
                "{},{},{},{},{}",
                customer.id,
                quote(&customer.name),
                quote(&customer.kana),
                quote(customer.phone.as_deref().unwrap_or_default()),
                customer.visit_count
            )
        });

        Ok(render(&DIRECTORY_HEADER, rows))
    }

    /// Suggested download name for a history export.
    pub fn history_file_name(customer: &Customer) -> String {
        format!("{}_施術記録.csv", customer.name)
    }

    /// Suggested download name for a full listing exported on `today`.
    pub fn directory_file_name(today: NaiveDate) -> String {
        format!("全顧客リスト_{}.csv", today.format("%Y-%m-%d"))
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn render<I>(header: &[&str], rows: I) -> Vec<u8>
where
    I: Iterator<Item = String>,
{
    let mut lines = vec![header.join(",")];
    lines.extend(rows);
    let body = lines.join(LINE_SEPARATOR);

    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + body.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(body.as_bytes());
    bytes
}
