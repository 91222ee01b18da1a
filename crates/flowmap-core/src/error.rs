use std::fmt;

/// Errors produced while decoding flow data, building grids or simulating.
#[derive(Debug)]
pub enum FlowError {
    /// Two operands of an elementwise or matrix operation disagree in size.
    DimensionMismatch { expected: usize, found: usize },
    /// A matrix row has a different length than the first row.
    RaggedMatrix { row: usize, expected: usize, found: usize },
    /// Operation is only defined for square matrices.
    NotSquare { rows: usize, columns: usize },
    /// Matrix has no inverse.
    SingularMatrix,
    /// A normalized coordinate was outside `[0, 1]²`.
    OutsideUnitSquare { x: f64, y: f64 },
    /// The cell at `(i, j)` has (near) zero area somewhere.
    DegenerateCell { i: u32, j: u32 },
    /// Newton iteration for the inverse bilinear map did not converge.
    NoConvergence { i: u32, j: u32, iterations: u32 },
    /// Two cells were given the same `(i, j)` position.
    DuplicatePosition { i: u32, j: u32 },
    /// A cell id that does not belong to the grid.
    UnknownCell(usize),
    /// A dataset row is missing required columns.
    RowTooShort { row: usize, expected: usize, found: usize },
    /// A dataset index column (i, j or k) is not a non-negative integer.
    InvalidIndex { row: usize, column: usize, value: f64 },
    /// A linear scale of zero cannot be decoded.
    InvalidScale(&'static str),
    /// A linear scale required by the decoding path is absent.
    MissingScale(&'static str),
    /// Layer index out of range.
    UnknownLayer(usize),
    /// No cells to place particles in.
    EmptyField,
    /// A widget configuration failed validation.
    InvalidConfig(&'static str),
    /// JSON decoding or encoding failed.
    Json(serde_json::Error),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {}, found {}", expected, found)
            }
            FlowError::RaggedMatrix { row, expected, found } => write!(
                f,
                "matrix row {} has length {}, expected {}",
                row, found, expected
            ),
            FlowError::NotSquare { rows, columns } => {
                write!(f, "matrix of size {}x{} is not square", rows, columns)
            }
            FlowError::SingularMatrix => write!(f, "matrix is singular"),
            FlowError::OutsideUnitSquare { x, y } => {
                write!(f, "point outside unit square: {}, {}", x, y)
            }
            FlowError::DegenerateCell { i, j } => write!(f, "degenerate cell at ({}, {})", i, j),
            FlowError::NoConvergence { i, j, iterations } => write!(
                f,
                "inverse mapping in cell ({}, {}) did not converge after {} iterations",
                i, j, iterations
            ),
            FlowError::DuplicatePosition { i, j } => {
                write!(f, "duplicate cell position ({}, {})", i, j)
            }
            FlowError::UnknownCell(id) => write!(f, "unknown cell id {}", id),
            FlowError::RowTooShort { row, expected, found } => write!(
                f,
                "data row {} has {} columns, expected at least {}",
                row, found, expected
            ),
            FlowError::InvalidIndex { row, column, value } => write!(
                f,
                "data row {} column {} is not a valid index: {}",
                row, column, value
            ),
            FlowError::InvalidScale(name) => write!(f, "linear scale '{}' is zero", name),
            FlowError::MissingScale(name) => write!(f, "linear scale '{}' not provided", name),
            FlowError::UnknownLayer(index) => write!(f, "no layer with index {}", index),
            FlowError::EmptyField => write!(f, "field has no cells"),
            FlowError::InvalidConfig(msg) => write!(f, "{}", msg),
            FlowError::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for FlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlowError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(e: serde_json::Error) -> Self {
        FlowError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
