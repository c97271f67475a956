use smaug_core::Tensor;

use crate::kind::LayerKind;
use crate::layer::Layer;

/// A layer after classification: its kind is fixed and its weights have been
/// extracted.
#[derive(Debug, Clone)]
pub struct InspectedLayer {
    name: String,
    kind: LayerKind,
    weights: Vec<Tensor>,
}

impl InspectedLayer {
    pub fn new(name: impl Into<String>, kind: LayerKind, weights: Vec<Tensor>) -> Self {
        Self {
            name: name.into(),
            kind,
            weights,
        }
    }

    /// Classify and extract a layer through its [`Layer`] capability.
    pub fn from_layer(layer: &dyn Layer) -> Self {
        Self::new(layer.name(), layer.kind(), layer.weights())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// All weight tensors, including ones the exporter skips.
    pub fn weights(&self) -> &[Tensor] {
        &self.weights
    }

    /// The tensors that end up in the weights section, in order.
    ///
    /// Empty for unrecognized layers; rank-1 tensors are dropped for
    /// convolutions. Header sizes and the written body both come from here.
    pub fn exported_weights(&self) -> impl Iterator<Item = &Tensor> + '_ {
        let kind = self.kind;
        self.weights
            .iter()
            .filter(move |_| kind.is_exported())
            .filter(move |w| !(kind.skips_bias() && w.ndim() == 1))
    }
}

impl Layer for InspectedLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &str {
        self.kind.as_str()
    }

    fn weights(&self) -> Vec<Tensor> {
        self.weights.clone()
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }
}

/// Classify every layer of a model, in order.
pub fn inspect(layers: &[Box<dyn Layer>]) -> Vec<InspectedLayer> {
    layers
        .iter()
        .map(|layer| {
            let inspected = InspectedLayer::from_layer(layer.as_ref());
            if !inspected.kind.is_exported() {
                tracing::debug!(
                    "layer '{}' ({}) is not supported and will be skipped",
                    inspected.name,
                    layer.class_name()
                );
            }
            inspected
        })
        .collect()
}

/// Number of layers whose kind is exported.
///
/// Emits one warning per call when depthwise convolutions are present, since
/// their biases are not exported.
pub fn count_exported_layers(layers: &[InspectedLayer]) -> usize {
    let depthwise = count_depthwise_layers(layers);
    if depthwise > 0 {
        tracing::warn!(
            "{} depthwise convolution layer(s) found: depthwise layers are not fully \
             supported and their biases are not exported",
            depthwise
        );
    }
    layers.iter().filter(|l| l.kind.is_exported()).count()
}

/// Number of depthwise convolution layers.
pub fn count_depthwise_layers(layers: &[InspectedLayer]) -> usize {
    layers
        .iter()
        .filter(|l| l.kind == LayerKind::DepthwiseConv2D)
        .count()
}
