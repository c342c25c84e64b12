//! Test command rendering.
//!
//! Test projects declare a command template such as `python3 {0} {1}`.
//! Positional placeholders expand to the test files, shell-quoted; `{}` takes
//! the next file in turn and doubled braces produce literal ones.

use shell_quote::{QuoteRefExt, Sh};
use thiserror::Error;

/// Reasons a test command template cannot be rendered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TestCommandError {
    /// A placeholder refers past the end of the file list.
    #[error("placeholder {{{index}}} has no matching test file ({count} given)")]
    MissingFile {
        /// Requested position.
        index: usize,
        /// Number of test files.
        count: usize,
    },
    /// A placeholder is not a number.
    #[error("invalid placeholder `{{{text}}}`")]
    InvalidPlaceholder {
        /// Placeholder contents.
        text: String,
    },
    /// A `{` has no closing brace.
    #[error("unterminated placeholder at offset {offset}")]
    Unterminated {
        /// Byte offset of the opening brace.
        offset: usize,
    },
    /// A lone `}` appears outside a placeholder.
    #[error("unmatched `}}` at offset {offset}")]
    StrayBrace {
        /// Byte offset of the brace.
        offset: usize,
    },
    /// The rendered command does not split into shell words.
    #[error("rendered command is not valid shell syntax")]
    Unparseable,
}

/// Returns `true` when the command contains an odd number of backticks.
fn has_unmatched_backticks(s: &str) -> bool {
    s.chars().filter(|&c| c == '`').count().rem_euclid(2) != 0
}

fn quote(file: &str) -> String {
    let bytes: Vec<u8> = file.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug_assert!(false, "shell quoting produced non UTF-8 bytes: {err}");
            String::from_utf8_lossy(&err.into_bytes()).into_owned()
        }
    }
}

/// Expand `template` with `files`.
///
/// # Errors
///
/// Returns a [`TestCommandError`] when a placeholder is malformed or out of
/// range, or when the result is not a well-formed shell command.
///
/// # Examples
///
/// ```
/// use mkplan::ir::render_test_command;
///
/// let files = ["tests/run.py".to_owned(), "tests/cases.json".to_owned()];
/// let command = render_test_command("python3 {0} {1}", &files).unwrap();
/// assert_eq!(command, "python3 tests/run.py tests/cases.json");
/// ```
pub fn render_test_command(template: &str, files: &[String]) -> Result<String, TestCommandError> {
    let quoted: Vec<String> = files.iter().map(|f| quote(f)).collect();
    let rendered = substitute(template, &quoted)?;
    if has_unmatched_backticks(&rendered) || shlex::split(&rendered).is_none() {
        return Err(TestCommandError::Unparseable);
    }
    Ok(rendered)
}

fn substitute(template: &str, files: &[String]) -> Result<String, TestCommandError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    let mut next_auto = 0;
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '{' if chars.next_if(|(_, c)| *c == '{').is_some() => out.push('{'),
            '}' if chars.next_if(|(_, c)| *c == '}').is_some() => out.push('}'),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => field.push(c),
                        None => return Err(TestCommandError::Unterminated { offset }),
                    }
                }
                let index = if field.is_empty() {
                    next_auto += 1;
                    next_auto - 1
                } else {
                    field
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| TestCommandError::InvalidPlaceholder {
                            text: field.clone(),
                        })?
                };
                let file = files.get(index).ok_or(TestCommandError::MissingFile {
                    index,
                    count: files.len(),
                })?;
                out.push_str(file);
            }
            '}' => return Err(TestCommandError::StrayBrace { offset }),
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn files(list: &[&str]) -> Vec<String> {
        list.iter().map(|f| (*f).to_owned()).collect()
    }

    #[rstest]
    #[case("python3 {0} {1}", "python3 tests/run.py tests/cases.json")]
    #[case("python3 {1} {0}", "python3 tests/cases.json tests/run.py")]
    #[case("run {} {}", "run tests/run.py tests/cases.json")]
    #[case("echo {{0}} {0}", "echo {0} tests/run.py")]
    #[case("./target/test", "./target/test")]
    fn render_expands_placeholders(#[case] template: &str, #[case] expected: &str) {
        let rendered = render_test_command(template, &files(&["tests/run.py", "tests/cases.json"]))
            .expect("render");
        assert_eq!(rendered, expected);
    }

    #[rstest]
    fn render_quotes_unsafe_paths() {
        let rendered = render_test_command("cat {0}", &files(&["my tests.txt"])).expect("render");
        assert_ne!(rendered, "cat my tests.txt");
        let words = shlex::split(&rendered).expect("split");
        assert_eq!(words, vec!["cat".to_owned(), "my tests.txt".to_owned()]);
    }

    #[rstest]
    #[case("run {2}", TestCommandError::MissingFile { index: 2, count: 1 })]
    #[case("run {x}", TestCommandError::InvalidPlaceholder { text: "x".into() })]
    #[case("run {0", TestCommandError::Unterminated { offset: 4 })]
    #[case("run }", TestCommandError::StrayBrace { offset: 4 })]
    #[case("run `{0}", TestCommandError::Unparseable)]
    #[case("run \"{0}", TestCommandError::Unparseable)]
    fn render_rejects_malformed_templates(
        #[case] template: &str,
        #[case] expected: TestCommandError,
    ) {
        let err = render_test_command(template, &files(&["a"])).expect_err("should fail");
        assert_eq!(err, expected);
    }
}
