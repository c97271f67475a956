use smaug_core::Tensor;

use crate::kind::LayerKind;

/// The capability the exporter needs from a model layer.
///
/// Implement this for whatever object a model framework hands out; the
/// exporter never looks past these methods.
pub trait Layer: Send + Sync {
    /// Layer name, used only for logging and inspection output.
    fn name(&self) -> &str;

    /// Framework class name, e.g. `"Conv2D"` or `"Dropout"`.
    fn class_name(&self) -> &str;

    /// Weight tensors in framework order (kernel first, then bias).
    fn weights(&self) -> Vec<Tensor>;

    /// Classified kind. Defaults to classifying [`Layer::class_name`].
    fn kind(&self) -> LayerKind {
        LayerKind::classify(self.class_name())
    }
}
