//! Error rendering using ariadne
//!
//! Diagnostics only carry spans; the renderer is handed the source text they
//! point into and prints a snippet with the primary span, any related spans
//! and the help note.

use crate::Diagnostic;
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;
use std::ops::Range;

const SOURCE_ID: &str = "<input>";

/// Render a diagnostic to stderr
///
/// # Example
/// ```no_run
/// use quill::{Engine, render_error};
///
/// let source = "let x be";
/// if let Err(e) = Engine::default().run(source) {
///     render_error(source, &e);
/// }
/// ```
pub fn render_error(source: &str, diagnostic: &Diagnostic) {
    render_error_to_writer(source, diagnostic, &mut std::io::stderr(), true).ok();
}

/// Render a diagnostic to a specific writer
pub fn render_error_to(
    source: &str,
    diagnostic: &Diagnostic,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    render_error_to_writer(source, diagnostic, writer, true)
}

/// Render a diagnostic to a String
pub fn render_error_to_string(source: &str, diagnostic: &Diagnostic) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(source, diagnostic, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render a diagnostic to a String without color codes
///
/// Same as `render_error_to_string` but without ANSI escapes, which keeps
/// output comparable in tests.
pub fn render_error_to_string_no_color(source: &str, diagnostic: &Diagnostic) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(source, diagnostic, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Clamp a span to the source so ariadne never indexes past the end.
fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let start = range.start.min(len);
    start..range.end.clamp(start, len)
}

fn render_error_to_writer(
    source: &str,
    diagnostic: &Diagnostic,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let Some(span) = diagnostic.span else {
        return writeln!(writer, "{}", diagnostic);
    };

    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let primary = clamp(span.range(), source.len());
    let mut report = Report::build(ReportKind::Error, (SOURCE_ID, primary.clone()))
        .with_message(format!("{} error: {}", diagnostic.phase, diagnostic.message))
        .with_config(
            ariadne::Config::default()
                .with_color(use_color)
                .with_index_type(ariadne::IndexType::Byte),
        );

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code);
    }

    let color = colors.next();
    report = report.with_label(
        Label::new((SOURCE_ID, primary))
            .with_message(&diagnostic.message)
            .with_color(color),
    );

    // Context breadcrumbs as secondary labels
    for related in &diagnostic.related {
        let color = colors.next();
        report = report.with_label(
            Label::new((SOURCE_ID, clamp(related.span.range(), source.len())))
                .with_message(&related.message)
                .with_color(color),
        );
    }

    if let Some(help) = &diagnostic.help {
        report = report.with_help(help);
    }

    report
        .finish()
        .write((SOURCE_ID, Source::from(source)), &mut *writer)
}
