//! Transitive closure of the include relation.
//!
//! Each key's dependency list doubles as its work queue: the list is walked
//! front to back and, for every entry that has a list of its own, the missing
//! entries of that list are appended to the end. Membership is checked before
//! every insertion, so cyclic include graphs terminate and every reachable key
//! appears exactly once.
//!
//! Lists borrowed from other keys may themselves be partially expanded. That
//! is enough for completeness because every list always contains at least the
//! direct dependencies of its key, but it means a wide graph can rescan the
//! same list from several origins.

use indexmap::{IndexMap, IndexSet};

/// Dependency lists keyed by file key.
pub type DependencyMap = IndexMap<String, IndexSet<String>>;

/// Expand the list of `key` in place into its transitive closure.
///
/// Keys absent from `deps` are left alone.
pub fn expand_key(deps: &mut DependencyMap, key: &str) {
    let Some(slot) = deps.get_mut(key) else {
        return;
    };
    // A key in a cycle reaches itself; its entries live in `pending` until
    // the slot is restored, so nothing is lost while the slot is empty.
    let mut pending = std::mem::take(slot);
    let mut cursor = 0;
    while let Some(dep) = pending.get_index(cursor).cloned() {
        if let Some(transitive) = deps.get(&dep) {
            pending.extend(transitive.iter().cloned());
        }
        cursor += 1;
    }
    if let Some(restored) = deps.get_mut(key) {
        *restored = pending;
    }
}

/// Expand every key in `keys`, in order.
pub fn expand_all<'a, I>(deps: &mut DependencyMap, keys: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for key in keys {
        expand_key(deps, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn relation(edges: &[(&str, &[&str])]) -> DependencyMap {
        edges
            .iter()
            .map(|(key, direct)| {
                (
                    (*key).to_owned(),
                    direct.iter().map(|d| (*d).to_owned()).collect(),
                )
            })
            .collect()
    }

    fn closure_of(deps: &DependencyMap, key: &str) -> Vec<String> {
        deps.get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[rstest]
    fn chain_is_fully_expanded() {
        let mut deps = relation(&[("x.c", &["y.h"]), ("y.h", &["z.h"]), ("z.h", &[])]);
        expand_all(&mut deps, ["x.c", "y.h", "z.h"]);
        assert_eq!(closure_of(&deps, "x.c"), vec!["y.h", "z.h"]);
        assert_eq!(closure_of(&deps, "y.h"), vec!["z.h"]);
    }

    #[rstest]
    fn cycle_terminates_with_single_entries() {
        let mut deps = relation(&[("x.h", &["y.h"]), ("y.h", &["x.h"])]);
        expand_all(&mut deps, ["x.h", "y.h"]);
        assert_eq!(closure_of(&deps, "x.h"), vec!["y.h", "x.h"]);
        assert_eq!(closure_of(&deps, "y.h"), vec!["x.h", "y.h"]);
    }

    #[rstest]
    fn self_include_is_kept_once() {
        let mut deps = relation(&[("a.h", &["a.h", "b.h"]), ("b.h", &[])]);
        expand_key(&mut deps, "a.h");
        assert_eq!(closure_of(&deps, "a.h"), vec!["a.h", "b.h"]);
    }

    #[rstest]
    fn diamond_lists_shared_dependency_once() {
        let mut deps = relation(&[
            ("m.c", &["l.h", "r.h"]),
            ("l.h", &["base.h"]),
            ("r.h", &["base.h"]),
            ("base.h", &[]),
        ]);
        expand_key(&mut deps, "m.c");
        assert_eq!(closure_of(&deps, "m.c"), vec!["l.h", "r.h", "base.h"]);
    }

    #[rstest]
    fn expansion_reads_unexpanded_lists_of_later_keys() {
        let mut deps = relation(&[
            ("a.c", &["b.h"]),
            ("b.h", &["c.h"]),
            ("c.h", &["d.h"]),
            ("d.h", &[]),
        ]);
        expand_key(&mut deps, "a.c");
        assert_eq!(closure_of(&deps, "a.c"), vec!["b.h", "c.h", "d.h"]);
    }

    #[rstest]
    fn unknown_dependencies_stay_leaves() {
        let mut deps = relation(&[("a.c", &["foreign.h"])]);
        expand_key(&mut deps, "a.c");
        assert_eq!(closure_of(&deps, "a.c"), vec!["foreign.h"]);
    }
}
