//! Convenience re-exports for common smaug-core types.
//!
//! ```rust
//! use smaug_core::prelude::*;
//! ```

pub use crate::Result;
pub use crate::Shape;
pub use crate::SmaugError;
pub use crate::Tensor;
