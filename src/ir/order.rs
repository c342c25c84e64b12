//! Depth-first topological ordering of the project graph.
//!
//! Nodes move from unvisited to visiting on entry and from visiting to
//! visited on exit, at which point they are appended to the order. Meeting a
//! visiting node again means the graph has a cycle. Roots are tried in
//! declaration order and dependencies in `depends` order, so the result is
//! stable for a given manifest.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::PlanError;

/// Project name mapped to its declared dependencies.
pub type ProjectGraph = IndexMap<String, Vec<String>>;

/// Tracks the visitation state of a node during traversal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Order `graph` so that every project follows all of its dependencies.
///
/// # Errors
///
/// Returns [`PlanError::CircularDependency`] when a cycle is found and
/// [`PlanError::UnknownDependency`] when a dependency is not a key of
/// `graph`. No partial order is returned.
///
/// # Examples
///
/// ```
/// use mkplan::ir::{ProjectGraph, topological_order};
///
/// let mut graph = ProjectGraph::new();
/// graph.insert("b".into(), vec!["a".into()]);
/// graph.insert("a".into(), Vec::new());
/// assert_eq!(topological_order(&graph).unwrap(), vec!["a", "b"]);
/// ```
pub fn topological_order(graph: &ProjectGraph) -> Result<Vec<String>, PlanError> {
    let mut sorter = TopoSorter::new(graph);
    for name in graph.keys() {
        sorter.visit(name, None)?;
    }
    Ok(sorter.ordered)
}

struct TopoSorter<'a> {
    graph: &'a ProjectGraph,
    stack: Vec<&'a str>,
    states: HashMap<&'a str, VisitState>,
    ordered: Vec<String>,
}

impl<'a> TopoSorter<'a> {
    fn new(graph: &'a ProjectGraph) -> Self {
        Self {
            graph,
            stack: Vec::new(),
            states: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    fn visit(&mut self, node: &'a str, dependent: Option<&'a str>) -> Result<(), PlanError> {
        match self.states.get(node) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => return Err(self.cycle_error(node)),
            None => {}
        }
        let graph = self.graph;
        let Some(depends) = graph.get(node) else {
            return Err(PlanError::UnknownDependency {
                project: dependent.unwrap_or(node).to_owned(),
                dependency: node.to_owned(),
            });
        };

        self.states.insert(node, VisitState::Visiting);
        self.stack.push(node);
        for dep in depends {
            self.visit(dep, Some(node))?;
        }
        self.stack.pop();
        self.states.insert(node, VisitState::Visited);
        self.ordered.push(node.to_owned());
        Ok(())
    }

    fn cycle_error(&self, node: &str) -> PlanError {
        let idx = self
            .stack
            .iter()
            .position(|n| *n == node)
            .unwrap_or_else(|| {
                debug_assert!(false, "visiting node must be on the stack");
                0
            });
        let mut cycle: Vec<String> = self
            .stack
            .iter()
            .skip(idx)
            .map(|n| (*n).to_owned())
            .collect();
        cycle.push(node.to_owned());
        PlanError::CircularDependency {
            project: node.to_owned(),
            cycle: canonicalize_cycle(cycle),
        }
    }
}

fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}
