use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use reserve_core::{
    ledger::DISCOUNT_RATE_PERCENT, Customer, CustomerBackend, CustomerId, CsvExporter,
    Directory, DirectoryError, DiscountStatus, ExportError, NewCustomer, VisitLedger,
};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("refusing to delete {0} without --yes; this cannot be undone")]
    ConfirmationRequired(CustomerId),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Prints customers matching `search`, grouped by phonetic row.
pub fn list(directory: &Directory, search: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let groups = directory.grouped(search);
    if groups.is_empty() {
        if search.is_empty() {
            writeln!(out, "顧客が登録されていません。`reserve add` で登録してください。")?;
        } else {
            writeln!(out, "見つかりませんでした。")?;
        }
        return Ok(());
    }

    for row in groups.iter() {
        writeln!(out, "{}", row.label)?;
        for customer in &row.customers {
            write!(
                out,
                "  {}  {}  {}  {}回",
                customer.id, customer.name, customer.kana, customer.visit_count
            )?;
            if let Some(last) = customer.last_visit() {
                write!(out, "  最終来店 {}", last.date)?;
            }
            if VisitLedger::is_discount_eligible(customer) {
                write!(out, "  [次回{DISCOUNT_RATE_PERCENT}%オフ]")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Registers a customer and prints the assigned id.
pub fn add<B>(
    directory: &mut Directory,
    backend: &mut B,
    candidate: NewCustomer,
    out: &mut impl Write,
) -> Result<Customer, CommandError>
where
    B: CustomerBackend + ?Sized,
{
    let customer = directory.add(backend, candidate)?;
    info!(stage = "directory", customer = %customer.id, "customer registered");
    writeln!(out, "登録しました: {} ({})", customer.name, customer.id)?;
    Ok(customer)
}

/// Prints one customer's card: contact details, discount progress and history.
pub fn show(directory: &Directory, id: &CustomerId, out: &mut impl Write) -> Result<(), CommandError> {
    let customer = directory.get(id)?;

    writeln!(out, "{} 様", customer.name)?;
    if !customer.kana.is_empty() {
        writeln!(out, "{}", customer.kana)?;
    }
    writeln!(out, "{}", customer.phone.as_deref().unwrap_or("電話番号なし"))?;
    if let Some(email) = &customer.email {
        writeln!(out, "{email}")?;
    }
    writeln!(out)?;
    writeln!(out, "来店 {} 回", customer.visit_count)?;
    write_discount_status(customer, out)?;
    writeln!(out)?;

    writeln!(out, "過去の施術記録")?;
    if customer.history.is_empty() {
        writeln!(out, "  まだ記録がありません。")?;
    }
    for record in &customer.history {
        let note = if record.note.is_empty() {
            "（メモなし）"
        } else {
            record.note.as_str()
        };
        writeln!(out, "  {}  {}", record.date, note)?;
    }
    Ok(())
}

/// Records a visit, defaulting the date to `today`.
pub fn visit<B>(
    directory: &mut Directory,
    backend: &mut B,
    id: &CustomerId,
    date: Option<&str>,
    note: &str,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<Customer, CommandError>
where
    B: CustomerBackend + ?Sized,
{
    let date = date.map_or_else(|| today.format("%Y-%m-%d").to_string(), str::to_string);
    let customer = directory.record_visit(backend, id, &date, note)?;
    info!(
        stage = "ledger",
        customer = %customer.id,
        visit_count = customer.visit_count,
        "visit recorded"
    );

    writeln!(out, "記録しました！ ({} 回目の来店)", customer.visit_count)?;
    write_discount_status(&customer, out)?;
    Ok(customer)
}

/// Deletes a customer once the caller has confirmed.
pub fn remove<B>(
    directory: &mut Directory,
    backend: &mut B,
    id: &CustomerId,
    confirmed: bool,
    out: &mut impl Write,
) -> Result<(), CommandError>
where
    B: CustomerBackend + ?Sized,
{
    let name = directory.get(id)?.name.clone();
    if !confirmed {
        return Err(CommandError::ConfirmationRequired(id.clone()));
    }

    directory.remove(backend, id)?;
    info!(stage = "directory", customer = %id, "customer deleted");
    writeln!(out, "削除しました: {name}")?;
    Ok(())
}

/// Writes the full customer list into `dir` and returns the file path.
pub fn export_all(
    directory: &Directory,
    dir: &Path,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<PathBuf, CommandError> {
    let bytes = CsvExporter::export_directory(directory.customers())?;
    let path = write_export(dir, &CsvExporter::directory_file_name(today), &bytes)?;
    info!(stage = "export", path = %path.display(), customers = directory.len(), "directory exported");
    writeln!(out, "{}", path.display())?;
    Ok(path)
}

/// Writes one customer's visit history into `dir` and returns the file path.
pub fn export_history(
    directory: &Directory,
    id: &CustomerId,
    dir: &Path,
    out: &mut impl Write,
) -> Result<PathBuf, CommandError> {
    let customer = directory.get(id)?;
    let bytes = CsvExporter::export_history(customer)?;
    let path = write_export(dir, &CsvExporter::history_file_name(customer), &bytes)?;
    info!(stage = "export", path = %path.display(), customer = %customer.id, "history exported");
    writeln!(out, "{}", path.display())?;
    Ok(path)
}

fn write_discount_status(customer: &Customer, out: &mut impl Write) -> io::Result<()> {
    match VisitLedger::discount_status(customer) {
        DiscountStatus::NextVisit => writeln!(out, "次回 {DISCOUNT_RATE_PERCENT}% OFF!"),
        DiscountStatus::Remaining(visits) => writeln!(out, "あと {visits} 回で割引です"),
    }
}

fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(sanitize_file_name(file_name));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Customer names end up in file names; keep them inside the export directory.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect()
}
