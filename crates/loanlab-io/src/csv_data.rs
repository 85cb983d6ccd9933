use std::path::Path;

use loanlab_core::{Column, Frame, LabError, LabResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

fn parse_err(path: &Path, err: impl std::fmt::Display) -> LabError {
    LabError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Read a CSV file into a typed frame. A column whose non-empty fields all
/// parse as numbers becomes numeric; anything else is categorical. Empty
/// fields are missing values (NaN or None).
pub fn read_frame(path: impl AsRef<Path>) -> LabResult<Frame> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).map_err(|e| parse_err(path, e))?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| parse_err(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result.map_err(|e| parse_err(path, e))?;
        if record.len() != headers.len() {
            return Err(parse_err(
                path,
                format!("row has {} fields, expected {}", record.len(), headers.len()),
            ));
        }
        for (j, field) in record.iter().enumerate() {
            raw[j].push(field.to_string());
        }
    }

    let mut frame = Frame::new();
    for (name, fields) in headers.iter().zip(raw) {
        frame.push_column(name, sniff_column(&fields))?;
    }
    if frame.n_rows() == 0 {
        return Err(LabError::EmptyFrame);
    }
    Ok(frame)
}

fn sniff_column(fields: &[String]) -> Column {
    let numeric = fields
        .iter()
        .filter(|f| !f.trim().is_empty())
        .all(|f| f.trim().parse::<f64>().is_ok());
    let any_value = fields.iter().any(|f| !f.trim().is_empty());

    if numeric && any_value {
        Column::Numeric(
            fields
                .iter()
                .map(|f| {
                    let t = f.trim();
                    if t.is_empty() {
                        f64::NAN
                    } else {
                        t.parse().unwrap_or(f64::NAN)
                    }
                })
                .collect(),
        )
    } else {
        Column::Categorical(
            fields
                .iter()
                .map(|f| {
                    let t = f.trim();
                    if t.is_empty() {
                        None
                    } else {
                        Some(t.to_string())
                    }
                })
                .collect(),
        )
    }
}

/// Write serializable records to a CSV file, headers included.
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> LabResult<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path).map_err(|e| parse_err(path, e))?;
    for record in records {
        wtr.serialize(record)
            .map_err(|e| LabError::Serialize(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read CSV rows back into typed records.
pub fn read_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> LabResult<Vec<T>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).map_err(|e| parse_err(path, e))?;
    rdr.deserialize()
        .map(|r| r.map_err(|e| parse_err(path, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[test]
    fn test_read_frame_sniffs_column_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "income,grade,approved").unwrap();
        writeln!(file, "45000,B,1").unwrap();
        writeln!(file, ",A,0").unwrap();
        writeln!(file, "61000,,1").unwrap();
        drop(file);

        let frame = read_frame(&path).unwrap();
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.numeric_names(), vec!["income", "approved"]);
        assert_eq!(frame.categorical_names(), vec!["grade"]);

        let income = frame.numeric("income").unwrap();
        assert!(income[1].is_nan());
        let grade = frame.categorical("grade").unwrap();
        assert_eq!(grade[2], None);
    }

    #[test]
    fn test_read_frame_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        assert!(read_frame(&path).is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        model: String,
        score: f64,
    }

    #[test]
    fn test_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![
            Row {
                model: "forest".to_string(),
                score: 0.84,
            },
            Row {
                model: "gboost".to_string(),
                score: 0.86,
            },
        ];
        write_records(&path, &rows).unwrap();
        let back: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(back, rows);
    }
}
