//! `javamp check`: analyze units and report directives without rewriting.

use std::fs;

use serde::Serialize;

use javamp_translate::{Config, DirectiveReport, Error, translate_unit};

use super::display_path;
use crate::cli::CheckParams;

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    ok: bool,
    directives: Vec<DirectiveReport>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

pub fn run(params: CheckParams) -> anyhow::Result<bool> {
    let mut reports = Vec::new();
    for path in &params.files {
        let file = display_path(path);
        let report = match fs::read_to_string(path) {
            Ok(source) => check_unit(file, &source),
            Err(e) => FileReport {
                file: display_path(path),
                ok: false,
                directives: Vec::new(),
                errors: vec![e.to_string()],
                warnings: Vec::new(),
            },
        };
        reports.push(report);
    }

    if params.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            render_text(report);
        }
    }
    Ok(reports.iter().all(|r| r.ok))
}

fn check_unit(file: String, source: &str) -> FileReport {
    match translate_unit(source, &Config::default()) {
        Ok((translation, diags)) => FileReport {
            file,
            ok: true,
            directives: translation.directives,
            errors: Vec::new(),
            warnings: diags.iter().map(|d| d.to_string()).collect(),
        },
        Err(Error::Translate(diags)) => FileReport {
            file,
            ok: false,
            directives: Vec::new(),
            errors: diags.iter().map(|d| d.to_string()).collect(),
            warnings: Vec::new(),
        },
        Err(e) => FileReport {
            file,
            ok: false,
            directives: Vec::new(),
            errors: vec![e.to_string()],
            warnings: Vec::new(),
        },
    }
}

fn render_text(report: &FileReport) {
    if report.directives.is_empty() && report.errors.is_empty() {
        println!("{}: no directives", report.file);
    } else {
        println!("{}: {} directive(s)", report.file, report.directives.len());
    }
    for d in &report.directives {
        let captured: Vec<&str> = d.captured.iter().map(|v| v.name.as_str()).collect();
        println!(
            "  line {}: {} captures [{}]{}",
            d.span.line,
            d.kind,
            captured.join(", "),
            if d.captured_this { " + this" } else { "" },
        );
    }
    for w in &report.warnings {
        println!("  warning: {w}");
    }
    for e in &report.errors {
        println!("  error: {e}");
    }
}
