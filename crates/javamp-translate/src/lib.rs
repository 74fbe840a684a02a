//! javamp translation stage: rewrites pragma-annotated Java regions into
//! standalone fork/join code.
//!
//! Pipeline, leaves first:
//! - `frontend` - tree-sitter Java front end adapter
//! - `pragma` - pragma lexing and clause parsing
//! - `analyze` - class discovery and scope inheritance
//! - `rewrite` - span-scoped edits over the original text
//! - `translate` - per-directive capture visitor, orchestration, synthesis
//! - `diagnostics` - collected per-unit diagnostics and rendering

pub mod analyze;
pub mod diagnostics;
pub mod frontend;
pub mod pragma;
pub mod rewrite;
pub mod translate;

pub use diagnostics::{Diagnostic, Diagnostics, DiagnosticsPrinter, Severity, Span};
pub use translate::{Config, DirectiveReport, Translation, translate_unit};

/// Result type for passes that produce output alongside diagnostics.
///
/// Non-fatal findings travel in the `Diagnostics`; unit-fatal conditions use
/// the outer `Result`.
pub type PassResult<T> = std::result::Result<(T, Diagnostics), Error>;

/// Unit-fatal errors of the translation stage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The grammar produced error nodes, or the tree disagrees with the
    /// class map built from it.
    #[error("parse error at {0}")]
    Parse(Span),

    /// An internal invariant broke: overlapping edits, class stack
    /// underflow, a tree shape the grammar promises cannot occur.
    #[error("internal inconsistency: {0}")]
    Internal(String),

    /// Well-formed source the translator cannot honor.
    #[error("unsupported construct at {span}: {what}")]
    Unsupported { span: Span, what: String },

    /// The unit accumulated error diagnostics.
    #[error("translation failed with {} errors", .0.error_count())]
    Translate(Diagnostics),
}

/// Result type for unit-level operations.
pub type Result<T> = std::result::Result<T, Error>;
