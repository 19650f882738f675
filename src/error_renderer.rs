//! Error rendering using ariadne
//!
//! Compile diagnostics carry byte spans into the source the host parsed.
//! These helpers print them against that source with labels for related
//! locations (overload candidates and the like) and help text.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

const SOURCE_ID: &str = "<expression>";

/// Render an error for `source` to stderr
///
/// # Example
/// ```no_run
/// use cppsim::{Engine, EngineOptions, render_error};
/// use cppsim::ast::{ArithmeticOp, Span, build};
/// use bumpalo::Bump;
///
/// let arena = Bump::new();
/// let engine = Engine::new(&arena, EngineOptions::default(), |_, _| Ok(())).unwrap();
///
/// let source = "1 + y";
/// let expr = build::binary(ArithmeticOp::Add, build::int(1), build::ident("y"))
///     .with_span(Span::new(0, 5));
/// if let Err(e) = engine.compile(&expr) {
///     render_error(&e, source);
/// }
/// ```
pub fn render_error(error: &Error, source: &str) {
    render_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, source, writer, true)
}

/// Render an error to a String (useful for web UIs and logs)
pub fn render_error_to_string(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Compilation { diagnostics } => {
            render_diagnostics(source, diagnostics, writer, use_color)
        }
        Error::Execution(e) if e.is_resource_exceeded() => {
            writeln!(writer, "Resource limit exceeded: {}", e)
        }
        Error::Execution(e) => writeln!(writer, "Execution error: {}", e),
        Error::Declaration(e) => writeln!(writer, "Declaration error: {}", e),
        Error::Api(msg) => writeln!(writer, "API error: {}", msg),
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let mut report = Report::build(kind, (SOURCE_ID, diag.span.0.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(
            Label::new((SOURCE_ID, diag.span.0.clone()))
                .with_message(&diag.message)
                .with_color(color),
        );

        // Candidates and declarations as secondary labels
        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new((SOURCE_ID, related.span.0.clone()))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        if let Some(help) = &diag.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .write((SOURCE_ID, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Span, build};
    use crate::entities::VariableKind;
    use crate::{Engine, EngineOptions};
    use bumpalo::Bump;

    fn engine(arena: &Bump) -> Engine<'_> {
        Engine::new(arena, EngineOptions::default(), |types, env| {
            let c = types.declare_variable("c", types.const_of(types.int()), VariableKind::Global);
            env.declare_variable(c)?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn test_render_const_assignment() {
        let arena = Bump::new();
        let engine = engine(&arena);

        let source = "c = 5";
        let expr = build::assign(
            build::ident("c").with_span(Span::new(0, 1)),
            build::int(5).with_span(Span::new(4, 5)),
        )
        .with_span(Span::new(0, 5));
        let error = engine.compile(&expr).unwrap_err();

        let output = render_error_to_string_no_color(&error, source);
        assert!(output.contains("Error"));
        assert!(output.contains("c = 5"));
        assert!(output.contains("expr.assignment.lhs_const"));
        assert!(output.contains("Help"));
    }

    #[test]
    fn test_render_unknown_name() {
        let arena = Bump::new();
        let engine = engine(&arena);

        let source = "nope";
        let expr = build::ident("nope").with_span(Span::new(0, 4));
        let error = engine.compile(&expr).unwrap_err();

        let output = render_error_to_string_no_color(&error, source);
        assert!(output.contains("nope"));
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_api_error() {
        let output = render_error_to_string_no_color(&Error::Api("bad".into()), "");
        assert_eq!(output, "API error: bad\n");
    }
}
