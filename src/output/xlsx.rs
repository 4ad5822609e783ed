//! Spreadsheet export
//!
//! Writes one workbook per run with an overview sheet of every record, a
//! sheet per non-empty category and a per-category summary.

use crate::output::traits::{Exporter, HarvestReport, OutputError, OutputResult};
use crate::record::{ProductRecord, COLUMN_HEADERS};
use crate::state::RunContext;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::collections::HashSet;
use std::path::PathBuf;

pub const OVERVIEW_SHEET: &str = "Produtos Leveros";
pub const SUMMARY_SHEET: &str = "Resumo";

/// Column widths, in `COLUMN_HEADERS` order
const COLUMN_WIDTHS: [f64; 9] = [15.0, 40.0, 10.0, 15.0, 15.0, 15.0, 15.0, 40.0, 40.0];

/// Excel's limit on sheet name length
const MAX_SHEET_NAME: usize = 31;

impl From<XlsxError> for OutputError {
    fn from(e: XlsxError) -> Self {
        OutputError::Xlsx(e.to_string())
    }
}

/// Writes `ProdutosLeveros_<timestamp>.xlsx`
pub struct XlsxExporter;

impl XlsxExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for XlsxExporter {
    fn name(&self) -> &'static str {
        "xlsx"
    }

    fn target_path(&self, context: &RunContext) -> PathBuf {
        context.spreadsheet_path()
    }

    fn export(&self, report: &HarvestReport) -> OutputResult<PathBuf> {
        let path = self.target_path(&report.context);
        let mut workbook = Workbook::new();
        let header = header_format();

        let overview = workbook.add_worksheet();
        overview.set_name(OVERVIEW_SHEET)?;
        write_records(overview, report.records.iter(), &header)?;

        let mut used: HashSet<String> = [OVERVIEW_SHEET, SUMMARY_SHEET]
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        for category in report.non_empty_categories() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(unique_sheet_name(category, &mut used))?;
            write_records(sheet, report.records_for(category), &header)?;
        }

        let summary = workbook.add_worksheet();
        summary.set_name(SUMMARY_SHEET)?;
        write_summary(summary, report, &header)?;

        workbook.save(&path)?;
        tracing::info!(
            "Spreadsheet with {} records saved to {}",
            report.total_records(),
            path.display()
        );
        Ok(path)
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(0x4F6228))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin)
}

/// Writes the header row, one row per record, widths and an autofilter
fn write_records<'a>(
    sheet: &mut Worksheet,
    records: impl Iterator<Item = &'a ProductRecord>,
    header: &Format,
) -> Result<(), XlsxError> {
    for (col, title) in COLUMN_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header)?;
    }

    let mut last_row = 0;
    for (index, record) in records.enumerate() {
        let row = index as u32 + 1;
        for (col, value) in record.values().iter().enumerate() {
            sheet.write_string(row, col as u16, *value)?;
        }
        last_row = row;
    }

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    sheet.autofilter(0, 0, last_row, (COLUMN_HEADERS.len() - 1) as u16)?;
    Ok(())
}

fn write_summary(
    sheet: &mut Worksheet,
    report: &HarvestReport,
    header: &Format,
) -> Result<(), XlsxError> {
    sheet.write_string_with_format(0, 0, "Categoria", header)?;
    sheet.write_string_with_format(0, 1, "Quantidade de Produtos", header)?;

    let mut row = 1;
    for (category, count) in report.category_counts() {
        sheet.write_string(row, 0, category)?;
        sheet.write_number(row, 1, count as f64)?;
        row += 1;
    }

    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 25)?;
    Ok(())
}

/// Makes a category name acceptable as a sheet name
///
/// Drops the characters Excel rejects and truncates to 31 characters.
pub fn sheet_name(category: &str) -> String {
    let cleaned: String = category
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();

    if cleaned.is_empty() {
        "Categoria".to_string()
    } else {
        cleaned
    }
}

/// Sanitizes a category name and suffixes it until no earlier sheet has it
///
/// Excel compares sheet names case-insensitively; `used` holds lowercased
/// names and receives the returned one.
pub fn unique_sheet_name(category: &str, used: &mut HashSet<String>) -> String {
    let base = sheet_name(category);
    let mut candidate = base.clone();
    let mut counter = 2;

    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", counter);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        let stem: String = base.chars().take(keep).collect();
        candidate = format!("{}{}", stem.trim_end(), suffix);
        counter += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}
