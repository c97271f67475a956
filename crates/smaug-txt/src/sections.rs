//! The four sections of a SMAUG text model file.

use std::fmt;
use std::io::{self, Write};

use smaug_core::Tensor;
use smaug_nn::InspectedLayer;

use crate::padding::{padded_element_count, total_written_parameters, written_tensors};
use crate::writer::{write_padded_array, ValueFormat};

/// Section names, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Global,
    Weights,
    Data,
    Labels,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Global,
        SectionKind::Weights,
        SectionKind::Data,
        SectionKind::Labels,
    ];

    /// Upper-case name used in the marker lines.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Global => "GLOBAL",
            SectionKind::Weights => "WEIGHTS",
            SectionKind::Data => "DATA",
            SectionKind::Labels => "LABELS",
        }
    }

    pub fn from_name(name: &str) -> Option<SectionKind> {
        SectionKind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn begin_marker(self) -> String {
        format!("==={} BEGIN===", self.as_str())
    }

    pub fn end_marker(self) -> String {
        format!("==={} END===", self.as_str())
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write the header section. `exported_layers` does not include the input
/// layer; the runtime counts the input as a layer, so one is added here.
pub fn write_global_section<W: Write>(
    out: &mut W,
    architecture: &str,
    exported_layers: usize,
    data_alignment: usize,
) -> io::Result<()> {
    writeln!(out, "{}", SectionKind::Global.begin_marker())?;
    writeln!(out, "# ARCHITECTURE = {architecture}")?;
    writeln!(out, "# NUM_LAYERS = {}", exported_layers + 1)?;
    writeln!(out, "# DATA_ALIGNMENT = {data_alignment}")?;
    writeln!(out, "{}", SectionKind::Global.end_marker())
}

/// Write every exported weight tensor. Returns the declared element count.
pub fn write_weights_section<W: Write>(
    out: &mut W,
    layers: &[InspectedLayer],
    data_alignment: usize,
    transpose_weights: bool,
) -> io::Result<usize> {
    let num_elems = total_written_parameters(layers, data_alignment, transpose_weights);

    writeln!(out, "{}", SectionKind::Weights.begin_marker())?;
    writeln!(out, "# NUM_ELEMS {num_elems}")?;
    writeln!(out, "# TYPE float")?;
    for (layer, tensor) in written_tensors(layers, transpose_weights) {
        tracing::debug!(
            "{} [{}]: writing tensor with shape {}",
            layer.name(),
            layer.kind(),
            tensor.shape()
        );
        write_padded_array(out, &tensor, data_alignment, ValueFormat::Float)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", SectionKind::Weights.end_marker())?;
    Ok(num_elems)
}

/// Write one sample input. Returns the declared element count.
pub fn write_data_section<W: Write>(
    out: &mut W,
    sample: &Tensor,
    data_alignment: usize,
) -> io::Result<usize> {
    let num_elems = padded_element_count(sample.shape().dims(), data_alignment);

    writeln!(out, "{}", SectionKind::Data.begin_marker())?;
    writeln!(out, "# NUM_ELEMS {num_elems}")?;
    writeln!(out, "# TYPE float")?;
    write_padded_array(out, sample, data_alignment, ValueFormat::Float)?;
    writeln!(out)?;
    writeln!(out, "{}", SectionKind::Data.end_marker())?;
    Ok(num_elems)
}

/// Write the class index of one sample. Labels are never padded.
pub fn write_labels_section<W: Write>(out: &mut W, label: usize) -> io::Result<()> {
    writeln!(out, "{}", SectionKind::Labels.begin_marker())?;
    writeln!(out, "# NUM_ELEMS 1")?;
    writeln!(out, "# TYPE int")?;
    writeln!(out, "{label},")?;
    writeln!(out, "{}", SectionKind::Labels.end_marker())
}
