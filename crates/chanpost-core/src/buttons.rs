//! Link-button parser: free-form `Name - URL` lines into validated buttons.

use crate::draft::LinkButton;

/// Why a submitted line produced no button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("missing `-` separator; use the `Name - URL` format")]
    MissingSeparator,

    #[error("the button name is empty")]
    EmptyLabel,

    #[error("the URL must start with `http`")]
    InvalidScheme,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidLine {
    pub line: String,
    pub reason: LineError,
}

/// Outcome of one multi-line submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub added: usize,
    pub invalid: Vec<InvalidLine>,
}

/// Parse a multi-line submission, appending valid buttons to `out`.
///
/// Each non-blank line is split on its *first* `-` (URLs may contain dashes).
/// If no line in the whole submission has a separator, the submission is
/// malformed as a unit and nothing is added. Otherwise lines are evaluated
/// independently: one bad line never discards the rest.
pub fn parse_button_lines(text: &str, out: &mut Vec<LinkButton>) -> ParseReport {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut report = ParseReport::default();

    if !lines.iter().any(|l| l.contains('-')) {
        report.invalid.push(InvalidLine {
            line: text.trim().to_string(),
            reason: LineError::MissingSeparator,
        });
        return report;
    }

    for line in lines {
        let Some((name, url)) = line.split_once('-') else {
            report.invalid.push(InvalidLine {
                line: line.to_string(),
                reason: LineError::MissingSeparator,
            });
            continue;
        };

        let name = name.trim();
        let url = url.trim();

        if name.is_empty() {
            report.invalid.push(InvalidLine {
                line: line.to_string(),
                reason: LineError::EmptyLabel,
            });
            continue;
        }
        if !url.starts_with("http") {
            report.invalid.push(InvalidLine {
                line: line.to_string(),
                reason: LineError::InvalidScheme,
            });
            continue;
        }

        out.push(LinkButton::new(name, url));
        report.added += 1;
    }

    report
}
