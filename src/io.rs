//! Tab-separated curve and label tables.
//!
//! Both file kinds share one layout: a single header line followed by one row
//! of numbers per line, cells separated by `\t`.
//!
//! - curve files: `q, curve_1, ..., curve_M` (one row per q sample)
//! - label files: `param_1, ..., param_K` (one row per instance)
//!
//! Any problem with a file is reported as [`Error::DataFormat`] with the path
//! and line number.

use std::path::Path;

use crate::data::Matrix;
use crate::{Error, Result};

/// Reflectivity curves sharing one q axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Curves {
    /// Scattering-vector magnitudes, strictly increasing.
    pub q: Vec<f64>,
    /// One curve per row, aligned to `q` by column.
    pub reflectivity: Matrix,
}

impl Curves {
    #[inline]
    pub fn num_curves(&self) -> usize {
        self.reflectivity.rows()
    }

    #[inline]
    pub fn num_q(&self) -> usize {
        self.q.len()
    }
}

/// Raw physical parameters, one instance per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    /// Column names from the header line.
    pub names: Vec<String>,
    pub values: Matrix,
}

impl Labels {
    #[inline]
    pub fn num_params(&self) -> usize {
        self.values.cols()
    }
}

/// Load a curve table: first column is q, every other column is one curve.
pub fn load_curves<P: AsRef<Path>>(path: P) -> Result<Curves> {
    let path = path.as_ref();
    let (_, table) = read_table(path)?;

    let q: Vec<f64> = table.column(0).collect();
    if let Some(i) = q.iter().position(|v| !v.is_finite()) {
        return Err(Error::DataFormat(format!(
            "{}: q[{i}]={} is not finite",
            path.display(),
            q[i]
        )));
    }
    if let Some(&q0) = q.first().filter(|&&v| v <= 0.0) {
        return Err(Error::DataFormat(format!(
            "{}: q must be positive, but q[0]={q0}",
            path.display()
        )));
    }
    if let Some(i) = q.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(Error::DataFormat(format!(
            "{}: q must be strictly increasing, but q[{}]={} follows q[{}]={}",
            path.display(),
            i + 1,
            q[i + 1],
            i,
            q[i]
        )));
    }

    let curve_cols: Vec<usize> = (1..table.cols()).collect();
    let reflectivity = table.select_columns(&curve_cols).transpose();

    log::debug!(
        "loaded {} curves x {} q points from {}",
        reflectivity.rows(),
        q.len(),
        path.display()
    );
    Ok(Curves { q, reflectivity })
}

/// Load a label table, preserving file row order.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Labels> {
    let path = path.as_ref();
    let (header, values) = read_table(path)?;

    let names = if header.len() == values.cols() {
        header
    } else {
        log::warn!(
            "{}: header has {} names for {} columns; using positional names",
            path.display(),
            header.len(),
            values.cols()
        );
        (0..values.cols()).map(|k| format!("param_{k}")).collect()
    };

    log::debug!(
        "loaded {} label rows x {} parameters from {}",
        values.rows(),
        values.cols(),
        path.display()
    );
    Ok(Labels { names, values })
}

/// Read a header line plus a rectangular numeric body with at least two columns.
fn read_table(path: &Path) -> Result<(Vec<String>, Matrix)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::DataFormat(format!("failed to open {}: {e}", path.display())))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| Error::DataFormat(format!("{}: failed to read header: {e}", path.display())))?
        .iter()
        .map(|h| h.to_owned())
        .collect();

    let mut data = Vec::new();
    let mut width = None;

    for (idx, result) in reader.records().enumerate() {
        // +2: one header line, 1-based line numbers.
        let line = idx + 2;
        let record = result
            .map_err(|e| Error::DataFormat(format!("{}:{line}: {e}", path.display())))?;

        let cols = *width.get_or_insert(record.len());
        if record.len() != cols {
            return Err(Error::DataFormat(format!(
                "{}:{line}: expected {cols} cells, found {}",
                path.display(),
                record.len()
            )));
        }

        for (col, cell) in record.iter().enumerate() {
            let value = cell.parse::<f64>().map_err(|_| {
                Error::DataFormat(format!(
                    "{}:{line}: cell {col} ('{cell}') is not a number",
                    path.display()
                ))
            })?;
            data.push(value);
        }
    }

    let cols = width
        .ok_or_else(|| Error::DataFormat(format!("{}: no data rows", path.display())))?;
    if cols < 2 {
        return Err(Error::DataFormat(format!(
            "{}: expected at least 2 columns, found {cols}",
            path.display()
        )));
    }

    let table = Matrix::from_flat(data, cols)
        .map_err(|e| Error::DataFormat(format!("{}: {e}", path.display())))?;
    Ok((header, table))
}
