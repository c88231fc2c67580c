// CSV export parsing

use super::{CellValue, Table};
use crate::sheet::SheetError;

/// Parse a CSV export into a [`Table`]. The first record is the header row.
///
/// Column typing mirrors how the sheet behaves in practice: a column is
/// numeric only when every non-empty cell parses as a number; otherwise it is
/// a text column and each cell is trimmed of leading/trailing whitespace so
/// incidental spacing in the source cannot defeat equality filters.
pub fn parse_csv(bytes: &[u8]) -> Result<Table, SheetError> {
    let content = decode_utf8(bytes);
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SheetError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(SheetError::Parse("export has no header row".into()));
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::Parse(e.to_string()))?;
        raw_rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    let numeric = numeric_columns(&headers, &raw_rows);

    let rows = raw_rows
        .into_iter()
        .map(|raw| {
            (0..headers.len())
                .map(|col| {
                    let field = raw.get(col).map(|s| s.trim()).unwrap_or("");
                    if field.is_empty() {
                        CellValue::Missing
                    } else if numeric[col] {
                        // The column scan vetted every cell; keep text on a
                        // pathological record instead of panicking.
                        field
                            .parse::<f64>()
                            .map(CellValue::Number)
                            .unwrap_or_else(|_| CellValue::Text(field.to_string()))
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect()
        })
        .collect();

    Ok(Table::new(headers, rows))
}

/// A column is numeric when it has at least one non-empty cell and all of its
/// non-empty cells parse as f64.
fn numeric_columns(headers: &[String], rows: &[Vec<String>]) -> Vec<bool> {
    (0..headers.len())
        .map(|col| {
            let mut any = false;
            for row in rows {
                let field = row.get(col).map(|s| s.trim()).unwrap_or("");
                if field.is_empty() {
                    continue;
                }
                any = true;
                if field.parse::<f64>().is_err() {
                    return false;
                }
            }
            any
        })
        .collect()
}

/// Decode bytes as UTF-8, falling back to Windows-1252 (common for
/// Excel-produced exports).
fn decode_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
