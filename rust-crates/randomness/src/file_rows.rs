use crate::{
    Error,
    Result,
};
use calamine::{
    Reader,
    open_workbook_auto_from_rs,
};
use std::{
    io::Cursor,
    path::Path,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowFormat {
    Delimited(u8),
    Workbook,
    Lines,
}

impl RowFormat {
    fn from_file_name(file_name: &str) -> Self {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => RowFormat::Delimited(b','),
            "tsv" => RowFormat::Delimited(b'\t'),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => RowFormat::Workbook,
            _ => RowFormat::Lines,
        }
    }
}

/// Turns an uploaded file into one string per row.
///
/// Delimited and workbook rows drop empty cells and join the rest with `", "`;
/// rows left with nothing are discarded. Other files yield their non-blank
/// lines unchanged.
pub fn parse_rows(file_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let format = RowFormat::from_file_name(file_name);
    tracing::debug!("parsing {file_name} as {format:?}");
    match format {
        RowFormat::Delimited(delimiter) => parse_delimited(bytes, delimiter),
        RowFormat::Workbook => parse_workbook(bytes),
        RowFormat::Lines => parse_lines(bytes),
    }
}

fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(row) = join_cells(record.iter()) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn parse_workbook(bytes: &[u8]) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::FileFormat("workbook has no worksheets".to_string()))??;
    let rows = range
        .rows()
        .filter_map(|cells| {
            let rendered: Vec<String> = cells.iter().map(ToString::to_string).collect();
            join_cells(rendered.iter().map(String::as_str))
        })
        .collect();
    Ok(rows)
}

fn parse_lines(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::FileFormat(format!("file is not valid UTF-8: {e}")))?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>) -> Option<String> {
    let kept: Vec<&str> = cells
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect();
    (!kept.is_empty()).then(|| kept.join(", "))
}
