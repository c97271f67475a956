//! Export entry point: validates a request and writes the four sections to
//! `<output_dir>/<model_name><architecture>.txt`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use smaug_core::{Result, SmaugError, Tensor};
use smaug_nn::{count_depthwise_layers, count_exported_layers, InspectedLayer, Sequential};

use crate::sections::{
    write_data_section, write_global_section, write_labels_section, write_weights_section,
};

/// Everything needed to produce one SMAUG text file.
///
/// Built with [`ExportRequest::builder`]; `build` checks the preconditions so
/// an invalid request never reaches the file system.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    layers: Vec<InspectedLayer>,
    sample_inputs: Tensor,
    sample_labels: Tensor,
    model_name: String,
    architecture: String,
    data_alignment: usize,
    transpose_weights: bool,
    output_dir: PathBuf,
}

impl ExportRequest {
    pub fn builder() -> ExportRequestBuilder {
        ExportRequestBuilder::default()
    }

    pub fn layers(&self) -> &[InspectedLayer] {
        &self.layers
    }

    pub fn sample_inputs(&self) -> &Tensor {
        &self.sample_inputs
    }

    pub fn sample_labels(&self) -> &Tensor {
        &self.sample_labels
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn data_alignment(&self) -> usize {
        self.data_alignment
    }

    pub fn transpose_weights(&self) -> bool {
        self.transpose_weights
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<model_name><architecture in lower case>.txt`
    pub fn file_name(&self) -> String {
        format!("{}{}.txt", self.model_name, self.architecture.to_lowercase())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.file_name())
    }

    fn validate(&self) -> Result<()> {
        if self.model_name.is_empty() {
            return Err(SmaugError::InvalidArgument("model name must not be empty".into()));
        }
        if self.architecture.is_empty() {
            return Err(SmaugError::InvalidArgument(
                "architecture name must not be empty".into(),
            ));
        }
        check_sample("input", &self.sample_inputs)?;
        check_sample("label", &self.sample_labels)?;
        Ok(())
    }
}

/// Sample tensors are batches: rank ≥ 2 with at least one entry.
fn check_sample(what: &'static str, tensor: &Tensor) -> Result<()> {
    let dims = tensor.shape().dims();
    if dims.len() < 2 || dims[0] == 0 {
        return Err(SmaugError::InvalidSample {
            what,
            shape: dims.to_vec(),
        });
    }
    Ok(())
}

/// Builder for [`ExportRequest`].
#[derive(Default)]
pub struct ExportRequestBuilder {
    layers: Vec<InspectedLayer>,
    sample_inputs: Option<Tensor>,
    sample_labels: Option<Tensor>,
    model_name: String,
    architecture: String,
    data_alignment: usize,
    transpose_weights: bool,
    output_dir: Option<PathBuf>,
}

impl ExportRequestBuilder {
    /// Use already inspected layers.
    pub fn layers(mut self, layers: Vec<InspectedLayer>) -> Self {
        self.layers = layers;
        self
    }

    /// Inspect every layer of `model`.
    pub fn model(mut self, model: &Sequential) -> Self {
        self.layers = model.inspect();
        self
    }

    /// The sample input batch; only its first entry is exported.
    pub fn sample_inputs(mut self, inputs: Tensor) -> Self {
        self.sample_inputs = Some(inputs);
        self
    }

    /// The sample label batch; only its first entry is exported.
    pub fn sample_labels(mut self, labels: Tensor) -> Self {
        self.sample_labels = Some(labels);
        self
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn architecture(mut self, arch: impl Into<String>) -> Self {
        self.architecture = arch.into();
        self
    }

    /// Alignment of the innermost dimension. 0 disables padding.
    pub fn data_alignment(mut self, alignment: usize) -> Self {
        self.data_alignment = alignment;
        self
    }

    /// Write Dense weights transposed (column-major).
    pub fn transpose_weights(mut self, enable: bool) -> Self {
        self.transpose_weights = enable;
        self
    }

    /// Directory for the output file. Defaults to the current directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<ExportRequest> {
        let sample_inputs = self
            .sample_inputs
            .ok_or_else(|| SmaugError::InvalidArgument("sample inputs are required".into()))?;
        let sample_labels = self
            .sample_labels
            .ok_or_else(|| SmaugError::InvalidArgument("sample labels are required".into()))?;

        let request = ExportRequest {
            layers: self.layers,
            sample_inputs,
            sample_labels,
            model_name: self.model_name,
            architecture: self.architecture,
            data_alignment: self.data_alignment,
            transpose_weights: self.transpose_weights,
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
        };
        request.validate()?;
        Ok(request)
    }
}

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// `NUM_LAYERS` header value (exported layers plus the input layer).
    pub num_layers: usize,
    pub weight_elems: usize,
    pub data_elems: usize,
    pub label: usize,
    pub depthwise_layers: usize,
    pub skipped_layers: usize,
    pub bytes_written: u64,
}

/// Counts produced by [`write_model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenCounts {
    pub num_layers: usize,
    pub weight_elems: usize,
    pub data_elems: usize,
    pub label: usize,
}

/// Write all four sections of `request` to `out`.
pub fn write_model<W: Write>(out: &mut W, request: &ExportRequest) -> Result<WrittenCounts> {
    request.validate()?;

    let exported = count_exported_layers(&request.layers);
    let sample = request.sample_inputs.row(0)?;
    let label_row = request.sample_labels.row(0)?;
    let label = label_row.argmax().ok_or_else(|| SmaugError::InvalidSample {
        what: "label",
        shape: request.sample_labels.shape().dims().to_vec(),
    })?;

    write_global_section(out, &request.architecture, exported, request.data_alignment)?;
    let weight_elems = write_weights_section(
        out,
        &request.layers,
        request.data_alignment,
        request.transpose_weights,
    )?;
    let data_elems = write_data_section(out, &sample, request.data_alignment)?;
    write_labels_section(out, label)?;

    Ok(WrittenCounts {
        num_layers: exported + 1,
        weight_elems,
        data_elems,
        label,
    })
}

/// Export a model to its SMAUG text file.
///
/// The file is created (or truncated), written through a buffer and closed
/// before returning. On an I/O error a partially written file may remain.
pub fn export(request: &ExportRequest) -> Result<ExportSummary> {
    let path = request.output_path();

    tracing::info!(
        "Exporting {} layers to {} (alignment {}, transpose {})",
        request.layers.len(),
        path.display(),
        request.data_alignment,
        request.transpose_weights
    );

    let with_path = |e: SmaugError| match e {
        SmaugError::Io(source) => SmaugError::file(&path, source),
        other => other,
    };

    let file = File::create(&path).map_err(|e| SmaugError::file(&path, e))?;
    let mut out = BufWriter::new(file);
    let counts = write_model(&mut out, request).map_err(with_path)?;
    out.flush().map_err(|e| SmaugError::file(&path, e))?;
    drop(out);

    let bytes_written = std::fs::metadata(&path)
        .map_err(|e| SmaugError::file(&path, e))?
        .len();

    let summary = ExportSummary {
        num_layers: counts.num_layers,
        weight_elems: counts.weight_elems,
        data_elems: counts.data_elems,
        label: counts.label,
        depthwise_layers: count_depthwise_layers(&request.layers),
        skipped_layers: request
            .layers
            .iter()
            .filter(|l| !l.kind().is_exported())
            .count(),
        bytes_written,
        path,
    };
    tracing::info!("Model parameters saved to {}", summary.path.display());
    Ok(summary)
}
