//! Constraint Jacobian storage and row views.
//!
//! The assembled Jacobian is either a full `nefc × nv` matrix or a
//! row-compressed sparse matrix holding, per row, only the DOFs that can
//! influence that constraint. Both representations expose their rows
//! through the [`JacobianRow`] trait so downstream code never needs to
//! know which one was selected.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use sim_types::SimError;

/// Read-only access to one constraint row, independent of storage.
pub trait JacobianRow {
    /// Number of generalized velocities (row width).
    fn nv(&self) -> usize;

    /// Number of stored entries (`nv` for dense rows).
    fn nnz(&self) -> usize;

    /// Coefficient at `dof`; zero for DOFs outside a sparse pattern.
    fn value_at(&self, dof: usize) -> f64;

    /// Row · `qvel`.
    fn dot(&self, qvel: &DVector<f64>) -> f64;

    /// `buffer += scale · row`, with `buffer` of length `nv`.
    fn scale_into(&self, scale: f64, buffer: &mut [f64]);
}

/// One row of a dense Jacobian.
#[derive(Debug, Clone, Copy)]
pub struct DenseRow<'a> {
    /// Backing matrix.
    pub matrix: &'a DMatrix<f64>,
    /// Row index.
    pub row: usize,
}

impl JacobianRow for DenseRow<'_> {
    fn nv(&self) -> usize {
        self.matrix.ncols()
    }

    fn nnz(&self) -> usize {
        self.matrix.ncols()
    }

    fn value_at(&self, dof: usize) -> f64 {
        self.matrix[(self.row, dof)]
    }

    fn dot(&self, qvel: &DVector<f64>) -> f64 {
        self.matrix.row(self.row).transpose().dot(qvel)
    }

    fn scale_into(&self, scale: f64, buffer: &mut [f64]) {
        for (dof, b) in buffer.iter_mut().enumerate() {
            *b += scale * self.matrix[(self.row, dof)];
        }
    }
}

/// One row of a sparse Jacobian: strictly increasing `indices` with the
/// matching `values`.
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    /// DOF indices, strictly increasing, each `< nv`.
    pub indices: &'a [usize],
    /// Values, same length as `indices`.
    pub values: &'a [f64],
    /// Row width.
    pub nv: usize,
}

impl JacobianRow for SparseRow<'_> {
    fn nv(&self) -> usize {
        self.nv
    }

    fn nnz(&self) -> usize {
        self.indices.len()
    }

    fn value_at(&self, dof: usize) -> f64 {
        self.indices
            .binary_search(&dof)
            .map_or(0.0, |k| self.values[k])
    }

    fn dot(&self, qvel: &DVector<f64>) -> f64 {
        self.indices
            .iter()
            .zip(self.values)
            .map(|(&dof, &v)| v * qvel[dof])
            .sum()
    }

    fn scale_into(&self, scale: f64, buffer: &mut [f64]) {
        for (&dof, &v) in self.indices.iter().zip(self.values) {
            buffer[dof] += scale * v;
        }
    }
}

/// Row of either representation.
#[derive(Debug, Clone, Copy)]
pub enum RowView<'a> {
    /// Dense row.
    Dense(DenseRow<'a>),
    /// Sparse row.
    Sparse(SparseRow<'a>),
}

impl JacobianRow for RowView<'_> {
    fn nv(&self) -> usize {
        match self {
            Self::Dense(r) => r.nv(),
            Self::Sparse(r) => r.nv(),
        }
    }

    fn nnz(&self) -> usize {
        match self {
            Self::Dense(r) => r.nnz(),
            Self::Sparse(r) => r.nnz(),
        }
    }

    fn value_at(&self, dof: usize) -> f64 {
        match self {
            Self::Dense(r) => r.value_at(dof),
            Self::Sparse(r) => r.value_at(dof),
        }
    }

    fn dot(&self, qvel: &DVector<f64>) -> f64 {
        match self {
            Self::Dense(r) => r.dot(qvel),
            Self::Sparse(r) => r.dot(qvel),
        }
    }

    fn scale_into(&self, scale: f64, buffer: &mut [f64]) {
        match self {
            Self::Dense(r) => r.scale_into(scale, buffer),
            Self::Sparse(r) => r.scale_into(scale, buffer),
        }
    }
}

/// Row-compressed sparse Jacobian (MuJoCo's `efc_J_rownnz/rowadr/colind`).
///
/// Row `i` occupies `colind[rowadr[i]..rowadr[i] + rownnz[i]]` and the same
/// range of `values`. Rows are stored back to back, so
/// `rowadr[i + 1] == rowadr[i] + rownnz[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseConstraintJacobian {
    /// Number of columns.
    pub nv: usize,
    /// Nonzeros per row.
    pub rownnz: Vec<usize>,
    /// Start of each row in `colind`/`values`.
    pub rowadr: Vec<usize>,
    /// Column (DOF) indices.
    pub colind: Vec<usize>,
    /// Values.
    pub values: Vec<f64>,
    /// Rows written so far by `push_row`.
    next_row: usize,
}

impl SparseConstraintJacobian {
    /// Allocate for `nrow` rows with the given per-row counts.
    ///
    /// `colind`/`values` get exactly `Σ rownnz` capacity and are filled by
    /// [`SparseConstraintJacobian::push_row`].
    #[must_use]
    pub fn with_row_counts(nv: usize, rownnz: Vec<usize>) -> Self {
        let mut rowadr = Vec::with_capacity(rownnz.len());
        let mut adr = 0;
        for &n in &rownnz {
            rowadr.push(adr);
            adr += n;
        }
        Self {
            nv,
            rownnz,
            rowadr,
            colind: Vec::with_capacity(adr),
            values: Vec::with_capacity(adr),
            next_row: 0,
        }
    }

    /// Append the next row. Its length must equal the count reserved for it.
    ///
    /// # Panics
    ///
    /// Panics if every reserved row is already written, if the length
    /// differs from the reserved count, or if `indices` is not strictly
    /// increasing within `0..nv`.
    pub fn push_row(&mut self, indices: &[usize], values: &[f64]) {
        let row = self.next_row;
        assert!(row < self.rownnz.len(), "sparse Jacobian overflow: row {row}");
        assert_eq!(
            indices.len(),
            self.rownnz[row],
            "sparse Jacobian row {row}: nnz count mismatch"
        );
        assert_eq!(indices.len(), values.len(), "sparse row length mismatch");
        assert!(
            crate::linalg::is_strictly_increasing(indices) && indices.last().map_or(true, |&d| d < self.nv),
            "sparse Jacobian row {row}: invalid indices {indices:?} for nv={}",
            self.nv
        );
        self.colind.extend_from_slice(indices);
        self.values.extend_from_slice(values);
        self.next_row += 1;
    }

    /// Whether every reserved row has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.next_row == self.rownnz.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.rownnz.len()
    }

    /// Total stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.colind.len()
    }

    /// Row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let range = self.rowadr[i]..self.rowadr[i] + self.rownnz[i];
        SparseRow {
            indices: &self.colind[range.clone()],
            values: &self.values[range],
            nv: self.nv,
        }
    }
}

/// The assembled constraint Jacobian (`efc_J`).
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintJacobian {
    /// Full `nefc × nv` matrix.
    Dense(DMatrix<f64>),
    /// Row-compressed sparse matrix.
    Sparse(SparseConstraintJacobian),
}

impl ConstraintJacobian {
    /// Empty dense Jacobian with `nv` columns.
    #[must_use]
    pub fn empty(nv: usize) -> Self {
        Self::Dense(DMatrix::zeros(0, nv))
    }

    /// Whether the sparse representation is in use.
    #[must_use]
    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    /// Number of rows (`nefc`).
    #[must_use]
    pub fn nrows(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows(),
            Self::Sparse(s) => s.nrows(),
        }
    }

    /// Number of columns (`nv`).
    #[must_use]
    pub fn ncols(&self) -> usize {
        match self {
            Self::Dense(m) => m.ncols(),
            Self::Sparse(s) => s.nv,
        }
    }

    /// Stored entries: `nefc · nv` for dense, `Σ rownnz` for sparse.
    #[must_use]
    pub fn nnz(&self) -> usize {
        match self {
            Self::Dense(m) => m.len(),
            Self::Sparse(s) => s.nnz(),
        }
    }

    /// Row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> RowView<'_> {
        match self {
            Self::Dense(m) => RowView::Dense(DenseRow { matrix: m, row: i }),
            Self::Sparse(s) => RowView::Sparse(s.row(i)),
        }
    }

    /// `J · qvel`.
    #[must_use]
    pub fn mul_vec(&self, qvel: &DVector<f64>) -> DVector<f64> {
        match self {
            Self::Dense(m) => m * qvel,
            Self::Sparse(s) => DVector::from_fn(s.nrows(), |i, _| s.row(i).dot(qvel)),
        }
    }

    /// Dense copy.
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Self::Dense(m) => m.clone(),
            Self::Sparse(s) => {
                let mut m = DMatrix::zeros(s.nrows(), s.nv);
                for i in 0..s.nrows() {
                    let row = s.row(i);
                    for (&dof, &v) in row.indices.iter().zip(row.values) {
                        m[(i, dof)] = v;
                    }
                }
                m
            }
        }
    }

    /// Convert to a `nalgebra-sparse` CSR matrix.
    ///
    /// Dense Jacobians keep every entry, including zeros.
    pub fn to_csr(&self) -> Result<CsrMatrix<f64>, SimError> {
        let (nrows, ncols) = (self.nrows(), self.ncols());
        let (offsets, colind, values) = match self {
            Self::Dense(m) => {
                let offsets = (0..=nrows).map(|i| i * ncols).collect();
                let colind = (0..nrows).flat_map(|_| 0..ncols).collect();
                let values = (0..nrows)
                    .flat_map(|i| (0..ncols).map(move |j| m[(i, j)]))
                    .collect();
                (offsets, colind, values)
            }
            Self::Sparse(s) => {
                let mut offsets = s.rowadr.clone();
                offsets.push(s.nnz());
                (offsets, s.colind.clone(), s.values.clone())
            }
        };
        CsrMatrix::try_from_csr_data(nrows, ncols, offsets, colind, values).map_err(|e| {
            SimError::SparseFormat {
                reason: e.to_string(),
            }
        })
    }
}
