use smallvec::SmallVec;
use std::fmt;

/// Tensor shape with stack-allocated storage for ≤4 dimensions.
///
/// Exported parameter tensors are at most 4-D (conv kernels), so the common
/// case never touches the heap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Create a new shape from dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Scalar shape (0 dimensions).
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Get dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get size of a specific dimension.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Whether this is a scalar (0-dimensional).
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Size of the innermost dimension. A scalar counts as a single element.
    pub fn innermost(&self) -> usize {
        self.dims.last().copied().unwrap_or(1)
    }

    /// Compute default strides for a contiguous row-major layout.
    pub fn contiguous_strides(&self) -> SmallVec<[usize; 4]> {
        let ndim = self.dims.len();
        if ndim == 0 {
            return SmallVec::new();
        }
        let mut strides = SmallVec::from_elem(0usize, ndim);
        strides[ndim - 1] = 1;
        for i in (0..ndim - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Shape with all axes in reverse order. For a matrix this swaps rows and
    /// columns; rank 0 and 1 are unchanged.
    pub fn reversed(&self) -> Shape {
        let mut dims = self.dims.clone();
        dims.reverse();
        Shape { dims }
    }

    /// Left-pad with unit dimensions up to `rank`. Shapes that already have
    /// `rank` or more dimensions are returned unchanged.
    pub fn left_padded(&self, rank: usize) -> Shape {
        let missing = rank.saturating_sub(self.ndim());
        let mut dims: SmallVec<[usize; 4]> = SmallVec::from_elem(1, missing);
        dims.extend_from_slice(&self.dims);
        Shape { dims }
    }

    /// Shape without its leading dimension (the shape of one row).
    pub fn without_leading(&self) -> Shape {
        Shape {
            dims: self.dims.iter().skip(1).copied().collect(),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
