//! Input tokenization and analysis-context construction (key inference) for
//! the harmonic analysis engine.

pub mod context;
pub mod error;
pub mod tokens;

pub use context::{build_context, AnalysisContext};
pub use error::{ContextError, ContextResult};
pub use tokens::{tokenize, InputKind, Token};
