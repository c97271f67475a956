//! # smaug-nn
//!
//! Layer inspection for the SMAUG exporter.
//!
//! A model is any ordered sequence of [`Layer`] implementations. Each layer is
//! classified once into a [`LayerKind`] when it is inspected; everything
//! downstream works on [`InspectedLayer`] values and never on the concrete
//! model type.

pub mod inspect;
pub mod kind;
pub mod layer;
pub mod loader;
pub mod prelude;
pub mod sequential;

pub use inspect::{count_depthwise_layers, count_exported_layers, inspect, InspectedLayer};
pub use kind::LayerKind;
pub use layer::Layer;
pub use loader::{
    load_model, load_tensor, model_from_bytes, LayerEntry, ManifestLayer, ModelManifest,
};
pub use sequential::Sequential;
