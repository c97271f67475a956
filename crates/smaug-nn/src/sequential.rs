use crate::inspect::{inspect, InspectedLayer};
use crate::layer::Layer;

/// An ordered container of layers, as produced by a model framework or by
/// [`crate::load_model`].
///
/// # Example
/// ```
/// use smaug_core::Tensor;
/// use smaug_nn::{InspectedLayer, LayerKind, Sequential};
///
/// let model = Sequential::new(vec![
///     Box::new(InspectedLayer::new("fc1", LayerKind::Dense, vec![Tensor::zeros(&[4, 2])])),
///     Box::new(InspectedLayer::new("drop", LayerKind::Other, vec![])),
/// ]);
/// assert_eq!(model.len(), 2);
/// assert_eq!(model.inspect()[1].kind(), LayerKind::Other);
/// ```
pub struct Sequential {
    name: Option<String>,
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    /// Create a new Sequential container from an ordered list of layers.
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Self {
        Self { name: None, layers }
    }

    /// Create an empty Sequential container.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Attach a model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Append a layer to the end of the sequence.
    pub fn push(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    /// Number of layers, including unsupported ones.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get a reference to the layer at the given index.
    pub fn get(&self, index: usize) -> Option<&dyn Layer> {
        self.layers.get(index).map(|l| l.as_ref())
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Classify every layer and extract its weights.
    pub fn inspect(&self) -> Vec<InspectedLayer> {
        inspect(&self.layers)
    }
}

impl std::fmt::Debug for Sequential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layers: Vec<&str> = self.layers.iter().map(|l| l.name()).collect();
        f.debug_struct("Sequential")
            .field("name", &self.name)
            .field("layers", &layers)
            .finish()
    }
}

impl std::fmt::Display for Sequential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sequential(")?;
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(f, "  ({i}): {} [{}]", layer.name(), layer.kind())?;
        }
        write!(f, ")")
    }
}
