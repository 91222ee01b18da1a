use glam::DVec2;

use crate::error::{FlowError, Result};

/// Immutable vector of `f64` values.
///
/// All operations return new vectors. Elementwise operations require both
/// operands to have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at index `i`, or `None` when out of range.
    pub fn value(&self, i: usize) -> Option<f64> {
        self.data.get(i).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// Euclidean (L2) norm.
    pub fn magnitude(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Elementwise product.
    pub fn multiply(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Elementwise sum.
    pub fn sum(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise difference.
    pub fn minus(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn scalar_multiply(&self, scalar: f64) -> Vector {
        self.transform(|e, _| e * scalar)
    }

    /// Apply `f(value, index)` to every element.
    pub fn transform<F: Fn(f64, usize) -> f64>(&self, f: F) -> Vector {
        Vector::new(self.data.iter().enumerate().map(|(i, &e)| f(e, i)).collect())
    }

    /// First two components as a point. Missing components are zero.
    pub fn to_dvec2(&self) -> DVec2 {
        DVec2::new(self.value(0).unwrap_or(0.0), self.value(1).unwrap_or(0.0))
    }

    fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Vector, f: F) -> Result<Vector> {
        if self.len() != other.len() {
            return Err(FlowError::DimensionMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }
        Ok(Vector::new(
            self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect(),
        ))
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Vector::new(data)
    }
}

impl From<&[f64]> for Vector {
    fn from(data: &[f64]) -> Self {
        Vector::new(data.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Vector {
    fn from(data: [f64; N]) -> Self {
        Vector::new(data.to_vec())
    }
}

impl From<DVec2> for Vector {
    fn from(v: DVec2) -> Self {
        Vector::new(vec![v.x, v.y])
    }
}

impl From<Vector> for Vec<f64> {
    fn from(v: Vector) -> Self {
        v.data
    }
}

impl<'a> IntoIterator for &'a Vector {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// Dense row-major matrix of `f64` values.
///
/// `len()` is the number of rows and `row_length()` the number of columns.
/// An empty matrix has both equal to zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    columns: usize,
}

impl Matrix {
    /// Build from rows. All rows must have the same length.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * columns);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(FlowError::RaggedMatrix {
                    row: index,
                    expected: columns,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        if columns == 0 {
            return Ok(Matrix::default());
        }
        Ok(Self {
            data,
            rows: rows.len(),
            columns,
        })
    }

    /// Build from fixed-size rows; cannot be ragged.
    pub fn from_array<const R: usize, const C: usize>(rows: [[f64; C]; R]) -> Self {
        if R == 0 || C == 0 {
            return Matrix::default();
        }
        Self {
            data: rows.iter().flatten().copied().collect(),
            rows: R,
            columns: C,
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self {
            data,
            rows: n,
            columns: n,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn row_length(&self) -> usize {
        self.columns
    }

    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.rows && j < self.columns {
            Some(self.data[i * self.columns + j])
        } else {
            None
        }
    }

    pub fn row(&self, i: usize) -> Option<Vector> {
        if i >= self.rows {
            return None;
        }
        let start = i * self.columns;
        Some(Vector::from(&self.data[start..start + self.columns]))
    }

    pub fn column(&self, j: usize) -> Option<Vector> {
        if j >= self.columns {
            return None;
        }
        Some(Vector::new((0..self.rows).map(|i| self.at(i, j)).collect()))
    }

    pub fn rows(&self) -> impl Iterator<Item = Vector> + '_ {
        (0..self.rows).filter_map(move |i| self.row(i))
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data
            .chunks(self.columns.max(1))
            .take(self.rows)
            .map(<[f64]>::to_vec)
            .collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.columns {
            for i in 0..self.rows {
                data.push(self.at(i, j));
            }
        }
        Matrix {
            data,
            rows: self.columns,
            columns: self.rows,
        }
    }

    /// Matrix product `self × other`; requires `self.row_length() == other.len()`.
    /// The product of two empty matrices is empty.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.columns != other.rows {
            return Err(FlowError::DimensionMismatch {
                expected: self.columns,
                found: other.rows,
            });
        }
        if self.is_empty() || other.is_empty() {
            return Ok(Matrix::default());
        }
        let mut data = vec![0.0; self.rows * other.columns];
        for i in 0..self.rows {
            for j in 0..other.columns {
                let mut acc = 0.0;
                for k in 0..self.columns {
                    acc += self.at(i, k) * other.at(k, j);
                }
                data[i * other.columns + j] = acc;
            }
        }
        Ok(Matrix {
            data,
            rows: self.rows,
            columns: other.columns,
        })
    }

    pub fn scalar_multiply(&self, scalar: f64) -> Matrix {
        Matrix {
            data: self.data.iter().map(|e| e * scalar).collect(),
            rows: self.rows,
            columns: self.columns,
        }
    }

    /// Row vector times matrix: `result[j] = Σ_i v[i] * self[i][j]`.
    pub fn vector_multiply(&self, vector: &Vector) -> Result<Vector> {
        if self.is_empty() {
            return Ok(Vector::default());
        }
        if vector.len() != self.rows {
            return Err(FlowError::DimensionMismatch {
                expected: self.rows,
                found: vector.len(),
            });
        }
        let values = vector.values();
        Ok(Vector::new(
            (0..self.columns)
                .map(|j| (0..self.rows).map(|i| self.at(i, j) * values[i]).sum())
                .collect(),
        ))
    }

    /// Determinant of a square matrix.
    ///
    /// Sizes up to 2 use the closed form, larger matrices LU decomposition
    /// with partial pivoting. The empty matrix has determinant 1.
    pub fn determinant(&self) -> Result<f64> {
        self.ensure_square()?;
        match self.rows {
            0 => Ok(1.0),
            1 => Ok(self.data[0]),
            2 => Ok(self.at(0, 0) * self.at(1, 1) - self.at(1, 0) * self.at(0, 1)),
            n => {
                let mut lu = self.data.clone();
                let mut det = 1.0;
                for col in 0..n {
                    let pivot = (col..n)
                        .max_by(|&a, &b| lu[a * n + col].abs().total_cmp(&lu[b * n + col].abs()))
                        .unwrap_or(col);
                    if lu[pivot * n + col] == 0.0 {
                        return Ok(0.0);
                    }
                    if pivot != col {
                        for k in 0..n {
                            lu.swap(pivot * n + k, col * n + k);
                        }
                        det = -det;
                    }
                    let p = lu[col * n + col];
                    det *= p;
                    for row in col + 1..n {
                        let factor = lu[row * n + col] / p;
                        for k in col..n {
                            lu[row * n + k] -= factor * lu[col * n + k];
                        }
                    }
                }
                Ok(det)
            }
        }
    }

    /// Inverse by Gauss-Jordan elimination.
    pub fn inverse(&self) -> Result<Matrix> {
        self.ensure_square()?;
        let n = self.rows;
        let mut a = self.data.clone();
        let mut inv = Matrix::identity(n).data;
        for col in 0..n {
            let pivot = (col..n)
                .max_by(|&x, &y| a[x * n + col].abs().total_cmp(&a[y * n + col].abs()))
                .unwrap_or(col);
            let p = a[pivot * n + col];
            if p == 0.0 || !p.is_finite() {
                return Err(FlowError::SingularMatrix);
            }
            for k in 0..n {
                a.swap(pivot * n + k, col * n + k);
                inv.swap(pivot * n + k, col * n + k);
            }
            for k in 0..n {
                a[col * n + k] /= p;
                inv[col * n + k] /= p;
            }
            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[row * n + col];
                for k in 0..n {
                    a[row * n + k] -= factor * a[col * n + k];
                    inv[row * n + k] -= factor * inv[col * n + k];
                }
            }
        }
        Ok(Matrix {
            data: inv,
            rows: n,
            columns: n,
        })
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.columns + j]
    }

    fn ensure_square(&self) -> Result<()> {
        if self.rows != self.columns {
            return Err(FlowError::NotSquare {
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(())
    }
}

/// True when the vectors are linearly independent.
///
/// Tested through the Gram matrix `V Vᵀ`, which is non-singular exactly when
/// the rows of `V` are independent, for any count up to the dimension.
pub fn linear_independent(vectors: &[Vector]) -> Result<bool> {
    let Some(first) = vectors.first() else {
        return Ok(true);
    };
    if vectors.len() > first.len() {
        return Ok(false);
    }
    let rows = Matrix::new(vectors.iter().map(|v| v.values().to_vec()).collect())?;
    if rows.is_empty() {
        return Ok(false);
    }
    let gram = rows.multiply(&rows.transpose())?;
    Ok(gram.determinant()? != 0.0)
}

/// True when the points are affinely independent, i.e. the differences
/// from the first point are linearly independent.
pub fn affine_independent(points: &[Vector]) -> Result<bool> {
    let Some((origin, rest)) = points.split_first() else {
        return Ok(true);
    };
    let differences = rest
        .iter()
        .map(|p| p.minus(origin))
        .collect::<Result<Vec<_>>>()?;
    linear_independent(&differences)
}
