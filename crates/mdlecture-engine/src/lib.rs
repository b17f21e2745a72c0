pub mod convert;
pub mod error;
pub mod io;
pub mod lint;
pub mod models;
pub mod mparser;
pub mod pagenumbering;
pub mod roman;
pub mod toc;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use error::{Error, FormattingError, Result, StructuralError, SubprocessError};
pub use models::*;
