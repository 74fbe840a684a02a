pub mod check;
pub mod translate;


use std::io::IsTerminal;
use std::path::Path;

use javamp_translate::DiagnosticsPrinter;

/// Printer for one unit's diagnostics, colored when stderr is a TTY.
pub(crate) fn printer<'a>(source: &'a str, origin: &'a str) -> DiagnosticsPrinter<'a> {
    DiagnosticsPrinter::new(source)
        .origin(origin)
        .colored(std::io::stderr().is_terminal())
}

pub(crate) fn display_path(path: &Path) -> String {
    path.display().to_string()
}
