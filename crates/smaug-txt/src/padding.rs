//! Padding and size calculations.
//!
//! [`calc_padding`] is the only place the padding rule lives; element counts
//! in section headers and the zeros written into section bodies both go
//! through it.

use smaug_core::Tensor;
use smaug_nn::InspectedLayer;

/// Number of zeros needed after `value` elements so the total becomes a
/// multiple of `alignment`. An alignment of 0 disables padding.
pub fn calc_padding(value: usize, alignment: usize) -> usize {
    if alignment == 0 || value % alignment == 0 {
        return 0;
    }
    alignment - value % alignment
}

/// Element count of a tensor once its innermost dimension is padded.
///
/// A rank-0 shape is treated as `[1]`.
pub fn padded_element_count(shape: &[usize], alignment: usize) -> usize {
    match shape.split_last() {
        None => 1 + calc_padding(1, alignment),
        Some((&inner, outer)) => {
            outer.iter().product::<usize>() * (inner + calc_padding(inner, alignment))
        }
    }
}

/// Padded size of all weights that are exported, in row-major layout.
pub fn total_exported_parameters(layers: &[InspectedLayer], alignment: usize) -> usize {
    total_written_parameters(layers, alignment, false)
}

/// Padded size of all exported weights as they are written, i.e. after Dense
/// kernels are transposed when `transpose_weights` is set. Transposing moves
/// a different axis innermost, so the padded size can change.
pub fn total_written_parameters(
    layers: &[InspectedLayer],
    alignment: usize,
    transpose_weights: bool,
) -> usize {
    written_tensors(layers, transpose_weights)
        .map(|(_, w)| padded_element_count(w.shape().dims(), alignment))
        .sum()
}

/// Every tensor of the weights section, in write order, paired with the layer
/// that owns it.
pub(crate) fn written_tensors(
    layers: &[InspectedLayer],
    transpose_weights: bool,
) -> impl Iterator<Item = (&InspectedLayer, Tensor)> + '_ {
    layers.iter().flat_map(move |layer| {
        let transpose = transpose_weights && layer.kind().is_transposable();
        layer
            .exported_weights()
            .map(move |w| (layer, if transpose { w.t() } else { w.clone() }))
    })
}
