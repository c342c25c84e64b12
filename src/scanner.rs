//! Direct include extraction.
//!
//! The scan is textual: each line is trimmed and matched against
//! `#include "name"`. Angle-bracket includes, macro-expanded includes and
//! conditional compilation are not interpreted. A quoted name only becomes a
//! dependency when it is exactly a key of the current dependency universe;
//! anything else is treated as an external header and ignored.

use camino::Utf8Path;
use indexmap::IndexSet;
use std::{fs, io};

use crate::inventory::FileSet;

const INCLUDE_DIRECTIVE: &str = "#include";

/// Extract the quoted name from a local include directive.
///
/// Whitespace between `#include` and the opening quote is optional. The name
/// ends at the first closing quote.
///
/// # Examples
///
/// ```
/// use mkplan::scanner::parse_include;
///
/// assert_eq!(parse_include("  #include \"util/list.h\""), Some("util/list.h"));
/// assert_eq!(parse_include("#include <stdio.h>"), None);
/// ```
#[must_use]
pub fn parse_include(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix(INCLUDE_DIRECTIVE)?.trim_start();
    let quoted = rest.strip_prefix('"')?;
    let end = quoted.find('"')?;
    quoted.get(..end)
}

/// Collect the direct dependencies of `text` that resolve in `universe`.
///
/// Keys are returned in order of first appearance, each once.
#[must_use]
pub fn includes_in(text: &str, universe: &FileSet) -> IndexSet<String> {
    text.lines()
        .filter_map(parse_include)
        .filter(|name| universe.contains_key(*name))
        .map(str::to_owned)
        .collect()
}

/// Read `path` and collect its direct dependencies within `universe`.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; directives are
/// plain ASCII either way.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be read.
pub fn scan_file(path: &Utf8Path, universe: &FileSet) -> io::Result<IndexSet<String>> {
    let bytes = fs::read(path)?;
    Ok(includes_in(&String::from_utf8_lossy(&bytes), universe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn universe(keys: &[&str]) -> FileSet {
        keys.iter()
            .map(|key| ((*key).to_owned(), Utf8PathBuf::from("/p").join(key)))
            .collect()
    }

    #[rstest]
    #[case("#include \"a.h\"", Some("a.h"))]
    #[case("#include\"a.h\"", Some("a.h"))]
    #[case("\t#include   \"dir/a.h\"  // note", Some("dir/a.h"))]
    #[case("#include \"a.h\" /* \"b.h\" */", Some("a.h"))]
    #[case("#include <a.h>", None)]
    #[case("# include \"a.h\"", None)]
    #[case("#include \"unterminated.h", None)]
    #[case("int include = 1;", None)]
    fn parse_include_matches_local_directives(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_include(line), expected);
    }

    #[rstest]
    fn includes_in_keeps_only_known_keys() {
        let text = concat!(
            "#include <stdio.h>\n",
            "#include \"b.h\"\n",
            "#include \"missing.h\"\n",
            "#include \"a.h\"\n",
        );
        let found = includes_in(text, &universe(&["a.h", "b.h"]));
        let keys: Vec<_> = found.into_iter().collect();
        assert_eq!(keys, vec!["b.h".to_owned(), "a.h".to_owned()]);
    }

    #[rstest]
    fn includes_in_records_repeated_include_once() {
        let text = "#include \"a.h\"\n#include \"a.h\"\n";
        assert_eq!(includes_in(text, &universe(&["a.h"])).len(), 1);
    }
}
