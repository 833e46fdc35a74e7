use std::fmt;

/// Errors produced while accessing dataset rows.
#[derive(Debug)]
pub enum DataErr {
    /// The requested row index is out of bounds.
    OutOfBounds { index: usize, len: usize },

    /// The buffers given to `read_row` don't match the row shape.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// The dataset has no rows.
    Empty,

    /// The dataset could not provide a valid row due to domain constraints.
    InvalidRow(&'static str),
}

impl fmt::Display for DataErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataErr::OutOfBounds { index, len } => {
                write!(f, "row index {index} is out of bounds for {len} rows")
            }
            DataErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            DataErr::Empty => write!(f, "the dataset has no rows"),
            DataErr::InvalidRow(msg) => write!(f, "invalid row: {msg}"),
        }
    }
}

impl std::error::Error for DataErr {}

/// A random access collection of supervised rows.
///
/// A `Dataset` is only responsible for *providing access* to rows, the training
/// engine is agnostic to how they are stored or produced.
pub trait Dataset: Send + Sync {
    /// Returns the amount of rows.
    fn len(&self) -> usize;

    /// Returns `true` if there are no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the amount of input values per row.
    fn x_size(&self) -> usize;

    /// Returns the amount of ideal values per row.
    fn y_size(&self) -> usize;

    /// Copies a row into the given buffers.
    ///
    /// # Arguments
    /// * `index` - The row to read.
    /// * `x` - Where the input values will be written, must be `x_size` long.
    /// * `y` - Where the ideal values will be written, must be `y_size` long.
    ///
    /// # Errors
    /// `DataErr::OutOfBounds` if `index` is invalid, `DataErr::ShapeMismatch`
    /// if the buffers have the wrong length.
    fn read_row(&self, index: usize, x: &mut [f64], y: &mut [f64]) -> Result<(), DataErr>;
}

/// An in-memory dataset where each row is stored as its input values followed
/// by its ideal values.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    x_size: usize,
    y_size: usize,
    len: usize,
    data: Vec<f64>,
}

impl InMemoryDataset {
    /// Creates a new `InMemoryDataset`.
    ///
    /// # Arguments
    /// * `data` - The rows laid out one after the other.
    /// * `x_size` - The amount of input values per row.
    /// * `y_size` - The amount of ideal values per row.
    ///
    /// # Returns
    /// A new `InMemoryDataset` or a `DataErr` if `data` can't be split evenly into rows.
    pub fn new(data: Vec<f64>, x_size: usize, y_size: usize) -> Result<Self, DataErr> {
        if x_size == 0 || y_size == 0 {
            return Err(DataErr::InvalidRow("rows need at least one input and one ideal value"));
        }

        let row_size = x_size + y_size;
        if data.len() % row_size != 0 {
            return Err(DataErr::ShapeMismatch {
                what: "data",
                got: data.len(),
                expected: data.len() - data.len() % row_size,
            });
        }

        Ok(Self {
            x_size,
            y_size,
            len: data.len() / row_size,
            data,
        })
    }

    /// Builds a dataset from separate input and ideal rows.
    ///
    /// # Errors
    /// A `DataErr::ShapeMismatch` if the rows don't all share the first row's shape.
    pub fn from_rows<X, Y>(rows: impl IntoIterator<Item = (X, Y)>) -> Result<Self, DataErr>
    where
        X: AsRef<[f64]>,
        Y: AsRef<[f64]>,
    {
        let mut data = Vec::new();
        let mut shape = None;

        for (x, y) in rows {
            let (x, y) = (x.as_ref(), y.as_ref());
            let (x_size, y_size) = *shape.get_or_insert((x.len(), y.len()));

            if x.len() != x_size {
                return Err(DataErr::ShapeMismatch {
                    what: "x",
                    got: x.len(),
                    expected: x_size,
                });
            }

            if y.len() != y_size {
                return Err(DataErr::ShapeMismatch {
                    what: "y",
                    got: y.len(),
                    expected: y_size,
                });
            }

            data.extend_from_slice(x);
            data.extend_from_slice(y);
        }

        let (x_size, y_size) = shape.ok_or(DataErr::Empty)?;
        Self::new(data, x_size, y_size)
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.len
    }

    fn x_size(&self) -> usize {
        self.x_size
    }

    fn y_size(&self) -> usize {
        self.y_size
    }

    fn read_row(&self, index: usize, x: &mut [f64], y: &mut [f64]) -> Result<(), DataErr> {
        if index >= self.len {
            return Err(DataErr::OutOfBounds {
                index,
                len: self.len,
            });
        }

        if x.len() != self.x_size {
            return Err(DataErr::ShapeMismatch {
                what: "x",
                got: x.len(),
                expected: self.x_size,
            });
        }

        if y.len() != self.y_size {
            return Err(DataErr::ShapeMismatch {
                what: "y",
                got: y.len(),
                expected: self.y_size,
            });
        }

        let start = index * (self.x_size + self.y_size);
        let (row_x, row_y) = self.data[start..start + self.x_size + self.y_size].split_at(self.x_size);
        x.copy_from_slice(row_x);
        y.copy_from_slice(row_y);
        Ok(())
    }
}
