use std::fmt;

/// The closed set of layer kinds the SMAUG runtime understands.
///
/// Anything that is not recognized becomes [`LayerKind::Other`] and is skipped
/// by the exporter, but stays in the layer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Dense,
    Conv2D,
    DepthwiseConv2D,
    AveragePooling2D,
    MaxPooling2D,
    BatchNormalization,
    Other,
}

impl LayerKind {
    /// All kinds that are counted in the header and exported.
    pub const EXPORTED: [LayerKind; 6] = [
        LayerKind::Dense,
        LayerKind::Conv2D,
        LayerKind::AveragePooling2D,
        LayerKind::MaxPooling2D,
        LayerKind::BatchNormalization,
        LayerKind::DepthwiseConv2D,
    ];

    /// Classify a framework layer class name.
    ///
    /// `Conv2DTranspose` is a `Conv2D` subclass in Keras and is classified as
    /// such. Unknown names map to `Other`.
    pub fn classify(class_name: &str) -> LayerKind {
        match class_name {
            "Dense" => LayerKind::Dense,
            "Conv2D" | "Convolution2D" | "Conv2DTranspose" | "Convolution2DTranspose" => {
                LayerKind::Conv2D
            }
            "DepthwiseConv2D" => LayerKind::DepthwiseConv2D,
            "AveragePooling2D" | "AvgPool2D" => LayerKind::AveragePooling2D,
            "MaxPooling2D" | "MaxPool2D" => LayerKind::MaxPooling2D,
            "BatchNormalization" => LayerKind::BatchNormalization,
            _ => LayerKind::Other,
        }
    }

    /// Whether layers of this kind are counted and have their weights written.
    pub fn is_exported(self) -> bool {
        !matches!(self, LayerKind::Other)
    }

    /// Convolutions never export their rank-1 (bias) tensors. Depthwise
    /// convolutions are convolutions too, which is why their bias is lost.
    pub fn skips_bias(self) -> bool {
        matches!(self, LayerKind::Conv2D | LayerKind::DepthwiseConv2D)
    }

    /// Only fully-connected weights are affected by the transpose option.
    pub fn is_transposable(self) -> bool {
        matches!(self, LayerKind::Dense)
    }

    /// Canonical class name.
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Dense => "Dense",
            LayerKind::Conv2D => "Conv2D",
            LayerKind::DepthwiseConv2D => "DepthwiseConv2D",
            LayerKind::AveragePooling2D => "AveragePooling2D",
            LayerKind::MaxPooling2D => "MaxPooling2D",
            LayerKind::BatchNormalization => "BatchNormalization",
            LayerKind::Other => "Other",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
