//! Parser for pylint's `parseable` output format.
//!
//! Each message line has the shape
//!
//! ```text
//! path/to/module.py:42: [C0111(missing-docstring), Widget.draw] Missing docstring
//! ```
//!
//! where the symbol in parentheses and the object after the comma are
//! optional. Module banners (`************* Module foo`) and blank lines are
//! skipped; any other unrecognized line is reported without aborting.

use std::path::PathBuf;

use log::debug;
use winnow::{
    Parser as _,
    ascii::{dec_uint, space0},
    combinator::{delimited, opt, preceded},
    error::ModalResult,
    token::{take_till, take_while},
};

use lintmap_core::semantic::MessageKind;

use crate::error::LintOutputError;

const MODULE_BANNER: &str = "*************";

/// A single lint message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub filepath: PathBuf,
    pub line: u32,
    pub code: String,
    pub kind: MessageKind,
    pub symbol: Option<String>,
    /// Dotted object the message is about, `None` for module-level messages.
    pub object: Option<String>,
    pub message: String,
}

/// Everything recovered from one lint run.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub findings: Vec<Finding>,
    pub errors: Vec<LintOutputError>,
}

fn message_code<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric()).parse_next(input)
}

fn finding(input: &mut &str) -> ModalResult<Finding> {
    let filepath = take_till(1.., ':').parse_next(input)?;
    let line: u32 = delimited(':', dec_uint, ':').parse_next(input)?;
    (space0, '[').void().parse_next(input)?;
    let (code, kind) = message_code
        .verify_map(|code: &str| MessageKind::from_code(code).map(|kind| (code, kind)))
        .parse_next(input)?;
    let symbol = opt(delimited('(', take_till(0.., ')'), ')')).parse_next(input)?;
    let object = opt(preceded((',', space0), take_till(0.., ']'))).parse_next(input)?;
    (']', space0).void().parse_next(input)?;
    let message = take_while(0.., |_: char| true).parse_next(input)?;

    Ok(Finding {
        filepath: PathBuf::from(filepath.trim()),
        line,
        code: code.to_string(),
        kind,
        symbol: symbol.filter(|s| !s.is_empty()).map(str::to_string),
        object: object
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string),
        message: message.trim_end().to_string(),
    })
}

/// Parses a single message line.
pub fn parse_finding(line: &str) -> Option<Finding> {
    finding.parse(line).ok()
}

/// Parses a complete lint output.
///
/// # Examples
///
/// ```
/// use lintmap_parser::lint_output::parse_lint_output;
///
/// let report = parse_lint_output(
///     "************* Module shapes\nshapes.py:3: [C0111(missing-docstring), Shape] Missing docstring\n",
/// );
/// assert_eq!(report.findings.len(), 1);
/// assert_eq!(report.findings[0].object.as_deref(), Some("Shape"));
/// assert!(report.errors.is_empty());
/// ```
pub fn parse_lint_output(text: &str) -> LintReport {
    let mut report = LintReport::default();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(MODULE_BANNER) {
            continue;
        }
        match parse_finding(trimmed) {
            Some(finding) => report.findings.push(finding),
            None => {
                debug!(line = index + 1; "Unrecognized lint line");
                report.errors.push(LintOutputError::new(index + 1, trimmed));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_message() {
        let finding =
            parse_finding("pkg/shapes.py:12: [W0612(unused-variable), Shape.area] Unused variable 'x'")
                .unwrap();
        assert_eq!(finding.filepath, PathBuf::from("pkg/shapes.py"));
        assert_eq!(finding.line, 12);
        assert_eq!(finding.code, "W0612");
        assert_eq!(finding.kind, MessageKind::Warning);
        assert_eq!(finding.symbol.as_deref(), Some("unused-variable"));
        assert_eq!(finding.object.as_deref(), Some("Shape.area"));
        assert_eq!(finding.message, "Unused variable 'x'");
    }

    #[test]
    fn test_module_level_message_without_symbol() {
        let finding = parse_finding("shapes.py:1: [C0111, ] Missing module docstring").unwrap();
        assert_eq!(finding.symbol, None);
        assert_eq!(finding.object, None);
        assert_eq!(finding.kind, MessageKind::Convention);
    }

    #[test]
    fn test_code_only() {
        let finding = parse_finding("shapes.py:7: [E1101] Instance has no member").unwrap();
        assert_eq!(finding.kind, MessageKind::Error);
        assert_eq!(finding.object, None);
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert_eq!(parse_finding("shapes.py:7: [X1101] Whatever"), None);
    }

    #[test]
    fn test_garbage_lines_are_reported() {
        let report = parse_lint_output("\nnot a message\nshapes.py:2: [R0903, Shape] Too few public methods\n");
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line(), 2);
    }
}
