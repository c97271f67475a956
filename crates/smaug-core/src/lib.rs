//! # smaug-core
//!
//! Core types shared by the SMAUG exporter crates.
//!
//! Provides:
//! - `Tensor`: an immutable f32 array with zero-copy transposed and row views
//! - `Shape`: stack-allocated dimensions for the common ≤4-D case
//! - `SmaugError` / `Result`: the error type used across the workspace
//! - `logging`: `tracing-subscriber` setup for binaries and tests

pub mod error;
pub mod logging;
pub mod prelude;
pub mod shape;
pub mod tensor;

pub use error::SmaugError;
pub use shape::Shape;
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, SmaugError>;
