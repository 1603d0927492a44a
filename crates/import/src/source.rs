use std::path::Path;

use crate::error::ImportError;
use crate::row::{FieldValue, Row};

/// Parse CSV text (first line = headers) into rows. Headers are kept
/// verbatim, including dotted association paths; every cell enters as a
/// raw string; coercion happens later, against the schema.
pub fn rows_from_csv_text(text: &str) -> Result<Vec<Row>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Csv(e.to_string()))?;
        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(cell) = record.get(i) {
                row.set(header.as_str(), FieldValue::Raw(cell.to_string()));
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn rows_from_csv_file(path: &Path) -> Result<Vec<Row>, ImportError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ImportError::Io(format!("{}: {e}", path.display())))?;
    rows_from_csv_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic() {
        let csv = "\
name,price
Beer,2.5
Wine,12.0
";
        let rows = rows_from_csv_text(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&FieldValue::Raw("Beer".into())));
        assert_eq!(rows[1].get("price"), Some(&FieldValue::Raw("12.0".into())));
    }

    #[test]
    fn dotted_headers_preserved() {
        let csv = "\
name,category.name
Beer,Ale
";
        let rows = rows_from_csv_text(csv).unwrap();
        assert_eq!(rows[0].get("category.name"), Some(&FieldValue::Raw("Ale".into())));
    }

    #[test]
    fn header_order_preserved() {
        let csv = "\
b,a,c
1,2,3
";
        let rows = rows_from_csv_text(csv).unwrap();
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn empty_cells_come_through_raw() {
        let csv = "\
name,price
Beer,
";
        let rows = rows_from_csv_text(csv).unwrap();
        assert!(rows[0].get("price").unwrap().is_blank());
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let csv = "\
name,price
Beer,2.5,extra
";
        assert!(matches!(rows_from_csv_text(csv), Err(ImportError::Csv(_))));
    }
}
