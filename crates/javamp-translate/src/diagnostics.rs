//! Per-unit diagnostics: collection and rendering.

use annotate_snippets::{Level, Renderer, Snippet};
use serde::Serialize;

/// A byte span plus the 1-based line/column of its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }

    pub fn of(node: &arborium_tree_sitter::Node) -> Self {
        let pos = node.start_position();
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
            line: pos.row + 1,
            column: pos.column + 1,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

/// Diagnostics collected while processing one compilation unit.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            span,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            span,
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

/// Renders diagnostics against the unit source.
pub struct DiagnosticsPrinter<'a> {
    source: &'a str,
    origin: Option<&'a str>,
    color: bool,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            origin: None,
            color: false,
        }
    }

    pub fn origin(mut self, origin: &'a str) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn colored(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn render(&self, diagnostics: &Diagnostics) -> String {
        let renderer = if self.color {
            Renderer::styled()
        } else {
            Renderer::plain()
        };
        let mut out = String::new();
        for diagnostic in diagnostics.iter() {
            let level = match diagnostic.severity {
                Severity::Error => Level::Error,
                Severity::Warning => Level::Warning,
            };
            let span = clamp(diagnostic.span, self.source.len());
            let mut snippet = Snippet::source(self.source)
                .line_start(1)
                .fold(true)
                .annotation(level.span(span.start..span.end));
            if let Some(origin) = self.origin {
                snippet = snippet.origin(origin);
            }
            let message = level.title(&diagnostic.message).snippet(snippet);
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&renderer.render(message).to_string());
            out.push('\n');
        }
        out
    }
}

fn clamp(span: Span, len: usize) -> Span {
    Span {
        start: span.start.min(len),
        end: span.end.min(len).max(span.start.min(len)),
        ..span
    }
}
