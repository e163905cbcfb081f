//! Error adapter for converting InsetError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan};

use inset::InsetError;

/// A reportable error that can be rendered by miette.
///
/// Each variant of [`InsetError`] maps to a stable diagnostic code and, where
/// the fix is obvious, a help message.
pub struct Reportable<'a>(pub &'a InsetError);

impl fmt::Debug for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            InsetError::EmptyComposite => "inset::empty",
            InsetError::DuplicateEntry(_) => "inset::duplicate",
            InsetError::AmbiguousConfiguration(_) => "inset::ambiguous",
            InsetError::UnknownTerritory(_) => "inset::territory",
            InsetError::UnknownFamily(_) => "inset::family",
            InsetError::Projection(_) => "inset::projection",
            InsetError::Config(_) => "inset::config",
            InsetError::Io(_) => "inset::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            InsetError::EmptyComposite => "declare at least one [[territories]] table",
            InsetError::DuplicateEntry(_) => "give every territory a unique id",
            InsetError::AmbiguousConfiguration(_) => {
                "make territory bounds disjoint, or set engine.validation = \"warn\""
            }
            InsetError::UnknownFamily(_) => {
                "use one of: mercator, equirectangular, conic_equal_area, conic_conformal, azimuthal_equal_area, azimuthal_equidistant"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Convert an [`InsetError`] into a list of reportable errors.
pub fn to_reportables(err: &InsetError) -> Vec<Reportable<'_>> {
    vec![Reportable(err)]
}

/// Renders every reportable of `err` with miette's graphical handler.
///
/// A report that fails to render falls back to the plain error message.
pub fn render_reports(err: &InsetError) -> Vec<String> {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    to_reportables(err)
        .iter()
        .map(|reportable| {
            let mut rendered = String::new();
            match handler.render_report(&mut rendered, reportable) {
                Ok(()) => rendered,
                Err(_) => reportable.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use inset::identifier::Id;

    use super::*;

    #[test]
    fn test_single_reportable() {
        let err = InsetError::DuplicateEntry(Id::new("mainland"));
        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        assert_eq!(reportables[0].to_string(), "duplicate entry id `mainland`");
        assert_eq!(reportables[0].code().unwrap().to_string(), "inset::duplicate");
        assert!(reportables[0].help().is_some());
    }

    #[test]
    fn test_rendered_report_carries_code_and_help() {
        let err = InsetError::UnknownFamily("gnomonic".to_string());
        let reports = render_reports(&err);

        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("inset::family"));
        assert!(reports[0].contains("gnomonic"));
        assert!(reports[0].contains("azimuthal_equidistant"));
    }

    #[test]
    fn test_io_error_has_no_help() {
        let err = InsetError::Io(std::io::Error::other("disk on fire"));
        let reportables = to_reportables(&err);

        assert_eq!(reportables[0].code().unwrap().to_string(), "inset::io");
        assert!(reportables[0].help().is_none());
        assert!(std::error::Error::source(&reportables[0]).is_some());
    }
}
