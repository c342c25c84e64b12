//! YAML syntax diagnostics.
//!
//! [`map_yaml_error`] turns a `serde_saphyr` error into a [`miette`]
//! diagnostic pointing at the offending character of the `Mkplanfile`. A hint
//! is attached when the failure matches a mistake commonly made while writing
//! project lists by hand.

#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use super::{ManifestName, ManifestSource};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

/// Parser message fragments paired with the advice shown for them.
const HINTS: [(&str, &str); 5] = [
    (
        "did not find expected '-'",
        "List entries such as `depends` items start with '-', or use the `[a, b]` form.",
    ),
    (
        "expected ':'",
        "Each project and option needs a ':' after its name.",
    ),
    (
        "mapping values are not allowed",
        "Quote values containing ':' such as test commands.",
    ),
    (
        "found character that cannot start any token",
        "Quote values that start with '%', '@' or '`'.",
    ),
    (
        "unknown escape character",
        "Use single quotes for paths and commands containing '\\'.",
    ),
];

const TAB_HINT: &str = "Indent with spaces; YAML does not allow tabs.";

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(mkplan::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    message: String,
}

/// Text of the one-based `line`, without its line ending, and its byte offset.
fn line_at(src: &str, line: u64) -> Option<(usize, &str)> {
    let wanted = usize::try_from(line.checked_sub(1)?).ok()?;
    let mut start = 0;
    for (idx, raw) in src.split_inclusive('\n').enumerate() {
        if idx == wanted {
            let text = raw.trim_end_matches(['\n', '\r']);
            return Some((start, text));
        }
        start += raw.len();
    }
    None
}

/// Byte offset of a one-based `line` and `column`.
///
/// Columns past the line end clamp to it; lines past the end of the source
/// clamp to its length.
fn offset_of(src: &str, line: u64, column: u64) -> usize {
    let Some((start, text)) = line_at(src, line) else {
        return src.len();
    };
    let skip = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let within = text
        .char_indices()
        .map(|(byte, _)| byte)
        .nth(skip)
        .unwrap_or(text.len());
    start + within
}

/// One-character span at `loc`, or the character before it at a line end.
fn span_at(src: &str, loc: Location) -> SourceSpan {
    let at = offset_of(src, loc.line(), loc.column());
    let breaks = |b: &u8| matches!(b, b'\n' | b'\r');
    let bytes = src.as_bytes();
    let start = match bytes.get(at) {
        Some(b) if !breaks(b) => at,
        _ if at > 0 && bytes.get(at - 1).is_some_and(|b| !breaks(b)) => at - 1,
        _ => at,
    };
    let len = usize::from(start < at || bytes.get(at).is_some_and(|b| !breaks(b)));
    SourceSpan::from((start, len))
}

fn hint_for(message: &str, src: &str, loc: Option<Location>) -> Option<&'static str> {
    let tabbed = loc
        .and_then(|l| line_at(src, l.line()))
        .is_some_and(|(_, text)| {
            text.chars()
                .take_while(|c| c.is_whitespace())
                .any(|c| c == '\t')
        });
    if tabbed {
        return Some(TAB_HINT);
    }
    let lower = message.to_lowercase();
    HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| *hint)
}

/// Map a `serde_saphyr` YAML parse error into a [`miette`] diagnostic with
/// the offending span and, where one applies, a hint.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &ManifestSource,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let text = src.as_ref();
    let loc = err.location();
    let reason = err.to_string();
    let help = hint_for(&reason, text, loc).map(str::to_owned);
    let (line, column) = loc.map_or((1, 1), |l| (l.line(), l.column()));
    let mut message = format!("YAML parse error at line {line}, column {column}: {reason}");
    if let Some(hint) = &help {
        message.push_str("\nhelp: ");
        message.push_str(hint);
    }

    Box::new(YamlDiagnostic {
        src: NamedSource::new(name.as_ref(), text.to_owned()),
        span: loc.map(|l| span_at(text, l)),
        help,
        source: err,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow, ensure};
    use rstest::rstest;

    #[rstest]
    fn tab_indentation_gets_a_hint() -> Result<()> {
        let src = ManifestSource::from("\tkey: \"unterminated");
        let Err(err) = serde_saphyr::from_str::<serde_json::Value>(src.as_ref()) else {
            return Err(anyhow!("expected YAML parse error"));
        };
        let diag = map_yaml_error(err, &src, &ManifestName::from("Mkplanfile"));
        let msg = diag.to_string();
        ensure!(msg.contains(TAB_HINT), "message missing tab hint: {msg}");
        Ok(())
    }

    #[rstest]
    #[case("core: 1", 1, 3, 2)]
    #[case("one\ntwo\nthree", 3, 3, 10)]
    #[case("one\r\ntwo", 2, 2, 6)]
    #[case("short", 1, 42, 5)]
    #[case("caf\u{e9}: x", 1, 5, 5)]
    #[case("one", 4, 1, 3)]
    fn offsets_track_lines_and_columns(
        #[case] src: &str,
        #[case] line: u64,
        #[case] column: u64,
        #[case] expected: usize,
    ) {
        assert_eq!(offset_of(src, line, column), expected);
    }

    #[rstest]
    #[case("mapping values are not allowed in this context", Some(HINTS[2].1))]
    #[case("something else", None)]
    fn hints_match_parser_messages(#[case] message: &str, #[case] expected: Option<&str>) {
        assert_eq!(hint_for(message, "", None), expected);
    }
}
