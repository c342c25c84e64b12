//! Directory conventions of a project root.
//!
//! ```text
//! <root>/include/           public headers
//! <root>/src/               translation units
//! <root>/src/include/       private headers
//! <root>/src/yy/            grammar sources
//! <root>/target/            build root
//! <root>/target/obj/        objects
//! <root>/target/include/    exported headers
//! <root>/target/Makefile    project script
//! ```

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use itertools::Itertools;

/// Name of the build directory under every project root and under the
/// common ancestor of all roots.
pub const BUILD_DIR: &str = "target";
/// File name of each project's script.
pub const MAKEFILE_NAME: &str = "Makefile";
/// File name of the aggregate script.
pub const AGGREGATE_NAME: &str = "Projects.mk";

/// Absolute locations derived from a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Project root.
    pub root: Utf8PathBuf,
    /// `target/`.
    pub build_root: Utf8PathBuf,
    /// `src/`.
    pub source: Utf8PathBuf,
    /// `include/`.
    pub include: Utf8PathBuf,
    /// `src/include/`.
    pub internal: Utf8PathBuf,
    /// `target/obj/`.
    pub obj: Utf8PathBuf,
    /// `target/include/`.
    pub export: Utf8PathBuf,
    /// `src/yy/`.
    pub grammar: Utf8PathBuf,
    /// `target/generated-src/`.
    pub generated: Utf8PathBuf,
    /// `target/obj/generated/`.
    pub generated_obj: Utf8PathBuf,
    /// `target/tests/`.
    pub tests: Utf8PathBuf,
    /// `target/Makefile`.
    pub makefile: Utf8PathBuf,
}

impl ProjectLayout {
    /// Derive the layout of `root`.
    #[must_use]
    pub fn new(root_dir: &Utf8Path) -> Self {
        let root = normalize(root_dir);
        let build_root = root.join(BUILD_DIR);
        let source = root.join("src");
        let obj = build_root.join("obj");
        Self {
            include: root.join("include"),
            internal: source.join("include"),
            grammar: source.join("yy"),
            export: build_root.join("include"),
            generated: build_root.join("generated-src"),
            generated_obj: obj.join("generated"),
            tests: build_root.join("tests"),
            makefile: build_root.join(MAKEFILE_NAME),
            obj,
            source,
            build_root,
            root,
        }
    }

    /// Render `path` the way the project script refers to it.
    ///
    /// Paths under the root become root-relative; all others stay absolute.
    /// Separators are always `/`.
    #[must_use]
    pub fn relative(&self, path: &Utf8Path) -> String {
        let normalized = normalize(path);
        let shown = normalized.strip_prefix(&self.root).unwrap_or(&normalized);
        if shown.as_str().is_empty() {
            return ".".to_owned();
        }
        shown.as_str().replace('\\', "/")
    }
}

/// Characters `make` treats specially in a target or prerequisite list.
const MAKE_SPECIAL: &[char] = &[':', '#', '$', '%', ';', '=', '\\', '*', '?', '[', ']'];

/// Whether `word` can appear verbatim as one target or prerequisite.
///
/// # Examples
///
/// ```
/// use mkplan::ir::is_make_word;
///
/// assert!(is_make_word("tests/run.py"));
/// assert!(!is_make_word("in put.txt"));
/// assert!(!is_make_word("a:b"));
/// ```
#[must_use]
pub fn is_make_word(word: &str) -> bool {
    !word.is_empty() && !word.chars().any(|c| c.is_whitespace() || MAKE_SPECIAL.contains(&c))
}

/// Lexically normalise `path`, resolving `.` and `..` components.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mkplan::ir::normalize;
///
/// assert_eq!(normalize(Utf8Path::new("/w/a/../b/./c")), Utf8Path::new("/w/b/c"));
/// ```
#[must_use]
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// Longest directory shared by every path in `paths`.
///
/// Returns `None` for an empty input.
#[must_use]
pub fn common_ancestor<'a, I>(paths: I) -> Option<Utf8PathBuf>
where
    I: IntoIterator<Item = &'a Utf8Path>,
{
    paths
        .into_iter()
        .map(|path| normalize(path).components().map(|c| c.as_str().to_owned()).collect_vec())
        .reduce(|shared, next| {
            shared
                .into_iter()
                .zip(next)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect()
        })
        .map(|parts| parts.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn layout_follows_directory_conventions() {
        let layout = ProjectLayout::new(Utf8Path::new("/w/parser"));
        assert_eq!(layout.internal, Utf8Path::new("/w/parser/src/include"));
        assert_eq!(layout.export, Utf8Path::new("/w/parser/target/include"));
        assert_eq!(
            layout.generated_obj,
            Utf8Path::new("/w/parser/target/obj/generated")
        );
        assert_eq!(layout.makefile, Utf8Path::new("/w/parser/target/Makefile"));
    }

    #[rstest]
    #[case("/w/p/src/a.c", "src/a.c")]
    #[case("/w/p/target/../include/x.h", "include/x.h")]
    #[case("/w/q/target/libq.a", "/w/q/target/libq.a")]
    #[case("/w/pp/x.c", "/w/pp/x.c")]
    #[case("/w/p", ".")]
    fn relative_shortens_paths_under_root(#[case] path: &str, #[case] expected: &str) {
        let layout = ProjectLayout::new(Utf8Path::new("/w/p"));
        assert_eq!(layout.relative(Utf8Path::new(path)), expected);
    }

    #[rstest]
    fn common_ancestor_of_siblings_is_parent() {
        let roots = [Utf8Path::new("/w/a"), Utf8Path::new("/w/b/c")];
        assert_eq!(common_ancestor(roots), Some(Utf8PathBuf::from("/w")));
    }

    #[rstest]
    fn common_ancestor_of_single_root_is_itself() {
        assert_eq!(
            common_ancestor([Utf8Path::new("/w/a")]),
            Some(Utf8PathBuf::from("/w/a"))
        );
    }

    #[rstest]
    fn common_ancestor_of_nothing_is_none() {
        assert_eq!(common_ancestor(std::iter::empty::<&Utf8Path>()), None);
    }

    #[rstest]
    #[case("cases/in.txt", true)]
    #[case("run-1.py", true)]
    #[case("", false)]
    #[case("in put.txt", false)]
    #[case("a:b", false)]
    #[case("$(HOME)", false)]
    #[case("%.c", false)]
    #[case("x#y", false)]
    fn make_words_reject_special_characters(#[case] word: &str, #[case] expected: bool) {
        assert_eq!(is_make_word(word), expected);
    }
}
