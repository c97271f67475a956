use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::SmaugError;
use crate::shape::Shape;
use crate::Result;

/// An immutable n-dimensional array of f32 values.
///
/// Data is reference-counted, so views produced by [`Tensor::t`] and
/// [`Tensor::row`] share storage with the tensor they came from. Element
/// order is always reported in logical row-major order of the view.
///
/// # Examples
///
/// ```
/// use smaug_core::Tensor;
///
/// let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
/// assert_eq!(t.shape().dims(), &[2, 3]);
///
/// let tr = t.t();
/// assert_eq!(tr.shape().dims(), &[3, 2]);
/// assert_eq!(tr.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
/// ```
#[derive(Clone)]
pub struct Tensor {
    data: Arc<[f32]>,
    shape: Shape,
    strides: SmallVec<[usize; 4]>,
    offset: usize,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a tensor that takes ownership of `data`.
    pub fn new(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        let s = Shape::new(shape);
        if s.numel() != data.len() {
            return Err(SmaugError::ShapeMismatch {
                shape: shape.to_vec(),
                expected: s.numel(),
                got: data.len(),
            });
        }
        let strides = s.contiguous_strides();
        Ok(Self {
            data: data.into(),
            shape: s,
            strides,
            offset: 0,
        })
    }

    /// Create a tensor from f32 data with the given shape.
    ///
    /// # Panics
    /// Panics if the number of elements does not match the shape. Use
    /// [`Tensor::new`] for a fallible version.
    pub fn from_f32(data: &[f32], shape: &[usize]) -> Self {
        let s = Shape::new(shape);
        assert_eq!(
            s.numel(),
            data.len(),
            "Shape {:?} requires {} elements, got {}",
            shape,
            s.numel(),
            data.len()
        );
        let strides = s.contiguous_strides();
        Self {
            data: data.into(),
            shape: s,
            strides,
            offset: 0,
        }
    }

    /// Create a tensor of zeros with the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        let numel = Shape::new(shape).numel();
        Self::from_f32(&vec![0.0; numel], shape)
    }

    /// Create a 0-dimensional tensor holding a single value.
    pub fn scalar(value: f32) -> Self {
        Self::from_f32(&[value], &[])
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Shape of the tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Strides (in elements) of this view.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Whether the view is laid out row-major without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.strides == self.shape.contiguous_strides()
    }

    /// Borrow the elements as a slice (contiguous views only).
    pub fn as_f32_slice(&self) -> Option<&[f32]> {
        if !self.is_contiguous() {
            return None;
        }
        self.data.get(self.offset..self.offset + self.numel())
    }

    /// Get a single element by logical (row-major) flat index.
    pub fn get_f32(&self, flat_index: usize) -> Option<f32> {
        let physical = self.flat_to_physical(flat_index)?;
        self.data.get(physical).copied()
    }

    /// Iterate elements in logical row-major order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.numel()).filter_map(move |i| self.get_f32(i))
    }

    /// Copy the elements out in logical row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        match self.as_f32_slice() {
            Some(slice) => slice.to_vec(),
            None => self.iter().collect(),
        }
    }

    fn flat_to_physical(&self, flat_index: usize) -> Option<usize> {
        if flat_index >= self.numel() {
            return None;
        }

        let mut remaining = flat_index;
        let mut physical = self.offset;
        let contiguous_strides = self.shape.contiguous_strides();

        for (i, &cs) in contiguous_strides.iter().enumerate() {
            let idx = remaining / cs;
            remaining %= cs;
            physical += idx * self.strides[i];
        }

        Some(physical)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Reverse the order of all axes (zero-copy view).
    ///
    /// For a matrix this is the usual transpose; rank 0 and 1 tensors are
    /// returned unchanged.
    pub fn t(&self) -> Tensor {
        let mut strides = self.strides.clone();
        strides.reverse();
        Tensor {
            data: Arc::clone(&self.data),
            shape: self.shape.reversed(),
            strides,
            offset: self.offset,
        }
    }

    /// Select entry `index` along the leading axis (zero-copy view).
    ///
    /// The result has the shape with the leading dimension removed; the rows
    /// of a 1-D tensor are scalars.
    pub fn row(&self, index: usize) -> Result<Tensor> {
        let size = self.shape.dim(0).ok_or_else(|| {
            SmaugError::InvalidArgument("cannot take a row of a scalar tensor".into())
        })?;
        if index >= size {
            return Err(SmaugError::IndexOutOfRange { index, size });
        }
        Ok(Tensor {
            data: Arc::clone(&self.data),
            shape: self.shape.without_leading(),
            strides: self.strides.iter().skip(1).copied().collect(),
            offset: self.offset + index * self.strides[0],
        })
    }

    // =========================================================================
    // Reductions
    // =========================================================================

    /// Flat index of the largest element, or `None` for an empty tensor.
    ///
    /// Ties resolve to the first occurrence. A NaN counts as larger than any
    /// number, so the first NaN wins.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, v) in self.iter().enumerate() {
            match best {
                None => best = Some((i, v)),
                Some((_, b)) if b.is_nan() => break,
                Some((_, b)) if v.is_nan() || v > b => best = Some((i, v)),
                _ => {}
            }
        }
        best.map(|(i, _)| i)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, contiguous={})",
            self.shape,
            self.is_contiguous(),
        )
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.numel();
        if n <= 20 {
            write!(f, "tensor({:?}, shape={})", self.to_vec(), self.shape)
        } else {
            let first = self.get_f32(0).unwrap_or(f32::NAN);
            let second = self.get_f32(1).unwrap_or(f32::NAN);
            let last = self.get_f32(n - 1).unwrap_or(f32::NAN);
            write!(
                f,
                "tensor([{first:.4}, {second:.4}, ..., {last:.4}], shape={})",
                self.shape
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(t.shape().dims(), &[2, 3]);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.numel(), 6);
        assert!(t.is_contiguous());
    }

    #[test]
    fn test_new_rejects_bad_length() {
        let err = Tensor::new(vec![1.0, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(
            err,
            SmaugError::ShapeMismatch { expected: 4, got: 3, .. }
        ));
    }

    #[test]
    fn test_scalar() {
        let t = Tensor::scalar(3.5);
        assert!(t.shape().is_scalar());
        assert_eq!(t.numel(), 1);
        assert_eq!(t.get_f32(0), Some(3.5));
        assert_eq!(t.as_f32_slice(), Some(&[3.5][..]));
    }

    #[test]
    fn test_transpose_view() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let tr = t.t();
        assert_eq!(tr.shape().dims(), &[3, 2]);
        assert!(!tr.is_contiguous());
        assert!(tr.as_f32_slice().is_none());
        assert_eq!(tr.get_f32(1), Some(4.0));
        assert_eq!(tr.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_transpose_vector_is_identity() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0], &[3]);
        let tr = t.t();
        assert_eq!(tr.shape().dims(), &[3]);
        assert!(tr.is_contiguous());
        assert_eq!(tr.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_row() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
        let r = t.row(1).unwrap();
        assert_eq!(r.shape().dims(), &[2]);
        assert_eq!(r.as_f32_slice().unwrap(), &[3.0, 4.0]);

        let v = Tensor::from_f32(&[7.0, 8.0], &[2]);
        let s = v.row(1).unwrap();
        assert!(s.shape().is_scalar());
        assert_eq!(s.get_f32(0), Some(8.0));

        assert!(matches!(
            t.row(3),
            Err(SmaugError::IndexOutOfRange { index: 3, size: 3 })
        ));
        assert!(Tensor::scalar(1.0).row(0).is_err());
    }

    #[test]
    fn test_row_of_transposed() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let r = t.t().row(2).unwrap();
        assert_eq!(r.to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_argmax() {
        let t = Tensor::from_f32(&[0.1, 0.7, 0.2], &[3]);
        assert_eq!(t.argmax(), Some(1));

        let tie = Tensor::from_f32(&[0.5, 0.5, 0.1], &[3]);
        assert_eq!(tie.argmax(), Some(0));

        let nan = Tensor::from_f32(&[0.1, f32::NAN, 9.0, f32::NAN], &[4]);
        assert_eq!(nan.argmax(), Some(1));

        assert_eq!(Tensor::zeros(&[0]).argmax(), None);
        assert_eq!(Tensor::scalar(-2.0).argmax(), Some(0));
    }

    #[test]
    fn test_debug_display() {
        let t = Tensor::from_f32(&[1.0, 2.0], &[2]);
        assert!(format!("{t:?}").contains("Tensor"));
        assert!(format!("{t}").contains("tensor"));

        let big = Tensor::zeros(&[5, 5]);
        assert!(format!("{big}").contains("..."));
    }
}
