//! # smaug-txt
//!
//! The SMAUG text model format: a single file with four sections, each framed
//! by `===NAME BEGIN===` / `===NAME END===` marker lines.
//!
//! ```text
//! ===GLOBAL BEGIN===
//! # ARCHITECTURE = SMIV
//! # NUM_LAYERS = 4
//! # DATA_ALIGNMENT = 8
//! ===GLOBAL END===
//! ===WEIGHTS BEGIN===
//! # NUM_ELEMS 96
//! # TYPE float
//! 0.12500,-0.50000,...,0,0,
//! ===WEIGHTS END===
//! ===DATA BEGIN===
//! ...
//! ===LABELS END===
//! ```
//!
//! Tensors are flattened row-major over a canonical 4-D shape, and each
//! innermost row is zero-padded to a multiple of the data alignment.

pub mod export;
pub mod padding;
pub mod reader;
pub mod sections;
pub mod writer;

pub use export::{
    export, write_model, ExportRequest, ExportRequestBuilder, ExportSummary, WrittenCounts,
};
pub use padding::{
    calc_padding, padded_element_count, total_exported_parameters, total_written_parameters,
};
pub use reader::{SectionData, SectionValues, TxtModel};
pub use sections::SectionKind;
pub use writer::{write_padded_array, ValueFormat};
