//! Flattening of tensors into comma-terminated runs of numbers.

use std::io::{self, Write};

use smaug_core::Tensor;

use crate::padding::calc_padding;

/// Rank every tensor is brought up to before flattening.
pub const CANONICAL_RANK: usize = 4;

/// How each element is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Fixed-point with five decimals (`0.25000`).
    Float,
    /// Plain integer; fractional parts are truncated toward zero.
    Int,
}

impl ValueFormat {
    fn write_value<W: Write>(self, out: &mut W, value: f32) -> io::Result<()> {
        match self {
            ValueFormat::Float if value.is_nan() => out.write_all(b"  nan"),
            ValueFormat::Float if value.is_infinite() => {
                out.write_all(if value > 0.0 { b"  inf" } else { b" -inf" })
            }
            ValueFormat::Float => write!(out, "{:.5}", f64::from(value)),
            ValueFormat::Int => write!(out, "{}", value as i64),
        }
    }
}

/// Write `tensor` as one line-less run of values.
///
/// The shape is left-padded with ones to rank 4 and walked row-major. Each
/// innermost row is written as its values joined by commas, followed by
/// `calc_padding(row_len, alignment)` literal `,0` entries and a single
/// trailing comma. Shapes of rank above 4 keep all leading axes as the outer
/// loop.
pub fn write_padded_array<W: Write>(
    out: &mut W,
    tensor: &Tensor,
    alignment: usize,
    format: ValueFormat,
) -> io::Result<()> {
    let shape = tensor.shape().left_padded(CANONICAL_RANK);
    let inner = shape.innermost();
    let rows: usize = shape.dims()[..shape.ndim() - 1].iter().product();
    let pad = calc_padding(inner, alignment);
    let values = tensor.to_vec();

    for r in 0..rows {
        let row = &values[r * inner..(r + 1) * inner];
        for (i, &v) in row.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            format.write_value(out, v)?;
        }
        for _ in 0..pad {
            out.write_all(b",0")?;
        }
        out.write_all(b",")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tensor: &Tensor, alignment: usize, format: ValueFormat) -> String {
        let mut buf = Vec::new();
        write_padded_array(&mut buf, tensor, alignment, format).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_matrix_with_padding() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(
            render(&t, 4, ValueFormat::Float),
            "1.00000,2.00000,3.00000,0,4.00000,5.00000,6.00000,0,"
        );
    }

    #[test]
    fn test_no_alignment_never_pads() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(
            render(&t, 0, ValueFormat::Float),
            "1.00000,2.00000,3.00000,4.00000,5.00000,6.00000,"
        );
        assert_eq!(render(&t, 0, ValueFormat::Float), render(&t, 1, ValueFormat::Float));
        assert_eq!(render(&t, 0, ValueFormat::Float), render(&t, 3, ValueFormat::Float));
    }

    #[test]
    fn test_rank4_order() {
        let data: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let t = Tensor::from_f32(&data, &[2, 1, 2, 2]);
        assert_eq!(render(&t, 0, ValueFormat::Int), "0,1,2,3,4,5,6,7,");
        assert_eq!(render(&t, 3, ValueFormat::Int), "0,1,0,2,3,0,4,5,0,6,7,0,");
    }

    #[test]
    fn test_vector_and_scalar() {
        let v = Tensor::from_f32(&[0.5, -0.25, 0.125], &[3]);
        assert_eq!(render(&v, 8, ValueFormat::Float), "0.50000,-0.25000,0.12500,0,0,0,0,0,");

        let s = Tensor::scalar(7.0);
        assert_eq!(render(&s, 0, ValueFormat::Int), "7,");
        assert_eq!(render(&s, 2, ValueFormat::Int), "7,0,");
    }

    #[test]
    fn test_transposed_view_order() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(render(&t.t(), 0, ValueFormat::Int), "1,4,2,5,3,6,");
    }

    #[test]
    fn test_empty_innermost_rows_keep_their_comma() {
        let t = Tensor::zeros(&[2, 0]);
        assert_eq!(render(&t, 4, ValueFormat::Float), ",,");
    }

    #[test]
    fn test_float_format() {
        let t = Tensor::from_f32(&[0.123456, -1.5, 100.0, -0.0], &[4]);
        assert_eq!(
            render(&t, 0, ValueFormat::Float),
            "0.12346,-1.50000,100.00000,-0.00000,"
        );
    }

    #[test]
    fn test_non_finite_values() {
        let t = Tensor::from_f32(&[f32::NAN, f32::INFINITY, f32::NEG_INFINITY], &[3]);
        assert_eq!(render(&t, 0, ValueFormat::Float), "  nan,  inf, -inf,");
    }

    #[test]
    fn test_int_format_truncates() {
        let t = Tensor::from_f32(&[2.9, -2.9, 3.0], &[3]);
        assert_eq!(render(&t, 0, ValueFormat::Int), "2,-2,3,");
    }
}
