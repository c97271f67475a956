//! Convenience re-exports for common smaug-nn types.
//!
//! ```rust
//! use smaug_nn::prelude::*;
//! ```

pub use crate::InspectedLayer;
pub use crate::Layer;
pub use crate::LayerKind;
pub use crate::Sequential;
pub use crate::{count_exported_layers, inspect};
