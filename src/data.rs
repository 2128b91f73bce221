//! Loading ligand corpora from delimited text: a headerless single-column file of
//! structure strings, and a headerless numeric label matrix keyed by the same row order.
//! Row order is the only join key between the two files, so both loaders preserve it.

use std::{
    io::{self, ErrorKind, Read},
    path::Path,
};

use ndarray::Array2;

/// Read the first column of a headerless CSV as structure strings, in file order.
pub fn read_structure_column(path: &Path) -> io::Result<Vec<String>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    structure_column(reader)
}

/// As `read_structure_column`, from any reader. Useful for tests and in-memory data.
pub fn read_structure_column_from_reader(reader: impl Read) -> io::Result<Vec<String>> {
    structure_column(
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader),
    )
}

fn structure_column<R: Read>(mut reader: csv::Reader<R>) -> io::Result<Vec<String>> {
    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let field = record.get(0).ok_or_else(|| {
            io::Error::new(ErrorKind::InvalidData, format!("Empty record at row {i}"))
        })?;
        out.push(field.trim().to_string());
    }
    Ok(out)
}

/// Read a headerless CSV of numbers as a row-major matrix. Every row must have the same
/// width; values are typically 0/1 assay indicators but any float parses.
pub fn read_label_matrix(path: &Path) -> io::Result<Array2<f64>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    label_matrix(reader)
}

/// As `read_label_matrix`, from any reader.
pub fn read_label_matrix_from_reader(reader: impl Read) -> io::Result<Array2<f64>> {
    label_matrix(
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader),
    )
}

fn label_matrix<R: Read>(mut reader: csv::Reader<R>) -> io::Result<Array2<f64>> {
    let mut flat: Vec<f64> = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows = 0;

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;

        match n_cols {
            None => n_cols = Some(record.len()),
            Some(w) if w != record.len() => {
                return Err(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("Row {i} has {} fields; expected {w}", record.len()),
                ));
            }
            _ => {}
        }

        for (c, field) in record.iter().enumerate() {
            let v: f64 = field.trim().parse().map_err(|_| {
                io::Error::new(
                    ErrorKind::InvalidData,
                    format!("Could not parse '{field}' at row {i}, column {c}"),
                )
            })?;
            flat.push(v);
        }
        n_rows += 1;
    }

    let n_cols = n_cols.unwrap_or(0);
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))
}

fn csv_err(e: csv::Error) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_column_in_order() {
        let data = "CCO\nc1ccccc1\nCC(=O)O\n";
        let smiles = read_structure_column_from_reader(data.as_bytes()).unwrap();
        assert_eq!(smiles, vec!["CCO", "c1ccccc1", "CC(=O)O"]);
    }

    #[test]
    fn label_matrix_shape_and_values() {
        let data = "1,0,0\n0,1,1\n0,0,0\n";
        let y = read_label_matrix_from_reader(data.as_bytes()).unwrap();
        assert_eq!(y.dim(), (3, 3));
        assert_eq!(y[[0, 0]], 1.);
        assert_eq!(y[[1, 2]], 1.);
        assert_eq!(y[[2, 1]], 0.);
    }

    #[test]
    fn ragged_rows_rejected() {
        // csv is strict about field counts by default; the width check backs it up.
        let data = "1,0\n0,1,1\n";
        assert!(read_label_matrix_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn junk_value_rejected() {
        let data = "1,0\n0,x\n";
        assert!(read_label_matrix_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn missing_file_errors() {
        assert!(read_structure_column(Path::new("/nonexistent/smiles.csv")).is_err());
    }
}
