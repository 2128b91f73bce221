//! Compressed sparse row storage for fingerprint matrices. CATS vectors are mostly
//! zero for drug-sized molecules, so a corpus persists far smaller as CSR than dense.
//! Binary [de]serialization is behind the `encode` feature.

use std::io;
#[cfg(feature = "encode")]
use std::{
    io::ErrorKind,
    path::Path,
};

use ndarray::Array2;

#[cfg(feature = "encode")]
use bincode::{Decode, Encode};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(Encode, Decode))]
pub struct CsrMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    /// Row pointers; `indptr[r]..indptr[r+1]` slices `indices`/`data` for row r.
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<f64>,
}

impl CsrMatrix {
    pub fn from_dense(m: &Array2<f64>) -> Self {
        let (n_rows, n_cols) = m.dim();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);
        for row in m.rows() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0. {
                    indices.push(c);
                    data.push(v);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            data,
        }
    }

    pub fn to_dense(&self) -> io::Result<Array2<f64>> {
        let mut out = Array2::zeros((self.n_rows, self.n_cols));
        for r in 0..self.n_rows {
            for k in self.indptr[r]..self.indptr[r + 1] {
                let c = self.indices[k];
                if c >= self.n_cols {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Column index {c} out of range for {} columns", self.n_cols),
                    ));
                }
                out[[r, c]] = self.data[k];
            }
        }
        Ok(out)
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    #[cfg(feature = "encode")]
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let buf = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, buf)
    }

    #[cfg(feature = "encode")]
    pub fn load(path: &Path) -> io::Result<Self> {
        let buf = std::fs::read(path)?;
        let (matrix, _) = bincode::decode_from_slice(&buf, bincode::config::standard())
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(matrix)
    }
}
