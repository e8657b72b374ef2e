//! A topological sorter implemented as a graph with a cycle detection
//! algorithm.
//!
//! Edges are inserted as `(dependent, dependency)` pairs. Nodes are
//! numbered in order of first appearance, and the traversal follows that
//! numbering, so the resulting order depends only on the order in which
//! edges were inserted.
//!
//! Unlike a strict scheduler, a cycle does not abort the sort: the nodes
//! of each strongly connected component of size greater than 1 (or with
//! a self-loop) are set aside as a cycle, and every other node is ordered
//! after all of its dependencies. A node that merely depends on a cycle
//! without being part of it stays ordered; its dependencies inside the
//! cycle are not yet computed when it is.

use std::collections::HashMap;

/// The manipulations in this file are prone to out-of-bounds accesses,
/// and because we may be in a proc macro we won't get a nice error message
/// if that happens.
/// It is strongly discouraged to access any array other than through
/// this macro that will at the very least produce an actionable error message.
macro_rules! at {
    ( $arr:expr, $idx:expr ) => {{
        let arr = &$arr;
        let idx: usize = $idx;
        if let Some(val) = arr.get(idx) {
            val
        } else {
            dda_err::abort!(
                "Out-of-bounds access: no index {} on array of length {}",
                idx,
                arr.len()
            )
        }
    }};
    ( mut $arr:expr, $idx:expr ) => {{
        let arr = &mut $arr;
        let idx: usize = $idx;
        if let Some(val) = arr.get_mut(idx) {
            val
        } else {
            dda_err::abort!(
                "Out-of-bounds access: no index {} on array of length {}",
                idx,
                arr.len()
            )
        }
    }};
}

/// Dependency graph over names.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Bidirectional map of the nodes.
    atomics: (Vec<String>, HashMap<String, usize>),
    /// `constraints[i]` is the list of nodes that `i` depends on.
    constraints: Vec<Vec<usize>>,
    /// `self_loop[i]` iff `i` depends on itself.
    self_loop: Vec<bool>,
}

/// Result of the sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sorted {
    /// Nodes that are not part of a cycle, each after all its dependencies.
    pub ordered: Vec<String>,
    /// Strongly connected components, each in order of discovery.
    pub cycles: Vec<Vec<String>>,
}

impl Sorted {
    /// All nodes that belong to a cycle.
    pub fn cyclic(&self) -> impl Iterator<Item = &String> {
        self.cycles.iter().flatten()
    }
}

/// Exploration helper.
///
/// This has no knowledge of the objects that it is working on, so at the
/// level of this module all nodes are `usize`.
///
/// It expects a graph represented as a `[[usize]]` where `graph[i]` is the
/// list of vertices accessible from `i`, and will produce a vector of SCCs.
mod explore {
    /// Per-node information on the status of the traversal.
    #[derive(Default, Clone)]
    struct Extra {
        /// This node is currently being explored.
        on_stack: bool,
        /// Best temporary approximation of the lowest index
        /// of a node in this one's SCC.
        low_link: Option<usize>,
        /// Unique identifier.
        index: Option<usize>,
    }

    /// Stack of the traversal, and other mutable state.
    pub struct SccExplorer {
        /// Count nodes and attribute IDs by order of DFS traversal.
        index: usize,
        /// Nodes left to handle.
        stk: Vec<usize>,
        /// Extra info for each node (visited status).
        extra: Vec<Extra>,
        /// Building the SCC.
        scc: Vec<Vec<usize>>,
    }

    impl SccExplorer {
        /// Exploration procedure for one node (Tarjan).
        pub fn run(&mut self, v: usize, graph: &[Vec<usize>]) {
            at!(mut self.extra, v).index = Some(self.index);
            at!(mut self.extra, v).low_link = Some(self.index);
            self.index += 1;
            self.stk.push(v);
            at!(mut self.extra, v).on_stack = true;

            // A child with a smaller `low_link` closes a cycle.
            for &w in at!(graph, v) {
                if at!(self.extra, w).index.is_none() {
                    self.run(w, graph);
                    at!(mut self.extra, v).low_link =
                        at!(self.extra, v).low_link.min(at!(self.extra, w).low_link);
                } else if at!(self.extra, w).on_stack {
                    // Still being explored: its `low_link` is not final yet.
                    at!(mut self.extra, v).low_link =
                        at!(self.extra, v).low_link.min(at!(self.extra, w).index);
                }
            }

            // Pop the scc, as given by all the nodes above `v` on the stack.
            if at!(self.extra, v).low_link == at!(self.extra, v).index {
                let mut scc = Vec::new();
                while let Some(w) = self.stk.pop() {
                    at!(mut self.extra, w).on_stack = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                // Popped in reverse order of discovery.
                scc.reverse();
                self.scc.push(scc);
            }
        }

        /// Construct a new explorer for a graph of given size.
        pub fn for_graph_of_size(nb: usize) -> Self {
            Self {
                index: 0,
                stk: Vec::new(),
                extra: vec![Extra::default(); nb],
                scc: Vec::new(),
            }
        }

        /// Determine if a vertex was already explored or not.
        pub fn unexplored(&self, idx: usize) -> bool {
            at!(self.extra, idx).index.is_none()
        }

        /// Get the SCC out at the end of the exploration,
        /// each one after all those it depends on.
        pub fn extract(self) -> Vec<Vec<usize>> {
            self.scc
        }
    }
}

impl Graph {
    /// Get the identifier of a node if it exists,
    /// or insert a new one with a fresh id.
    fn get_or_insert_atomic(&mut self, o: &str) -> usize {
        if let Some(uid) = self.atomics.1.get(o) {
            *uid
        } else {
            let uid = self.atomics.0.len();
            self.atomics.0.push(o.to_owned());
            self.atomics.1.insert(o.to_owned(), uid);
            self.constraints.push(Vec::new());
            self.self_loop.push(false);
            uid
        }
    }

    /// Declare that `dependent` must come after `dependency`.
    pub fn insert_edge(&mut self, dependent: &str, dependency: &str) {
        let a = self.get_or_insert_atomic(dependent);
        let b = self.get_or_insert_atomic(dependency);
        if a == b {
            *at!(mut self.self_loop, a) = true;
        }
        at!(mut self.constraints, a).push(b);
    }

    /// Number of distinct nodes.
    fn len(&self) -> usize {
        self.atomics.0.len()
    }

    /// Order the nodes, setting aside those that are part of a cycle.
    #[must_use]
    pub fn scheduling(self) -> Sorted {
        let nb = self.len();
        // Tarjan's algorithm for computing the SCCs of a graph.
        // This does two things:
        //   1. an SCC of size >1 is a cycle,
        //   2. the order in which the SCCs are closed gives a scheduling.
        let scc = {
            let mut expl = explore::SccExplorer::for_graph_of_size(nb);
            for v in 0..nb {
                if expl.unexplored(v) {
                    expl.run(v, &self.constraints);
                }
            }
            expl.extract()
        };
        let name = |i: usize| at!(self.atomics.0, i).clone();
        let mut sorted = Sorted::default();
        for c in scc {
            match c.as_slice() {
                [] => dda_err::malformed!(),
                [v] if !*at!(self.self_loop, *v) => sorted.ordered.push(name(*v)),
                _ => sorted.cycles.push(c.iter().map(|i| name(*i)).collect()),
            }
        }
        sorted
    }
}

/// Sort the nodes of a list of `(dependent, dependency)` edges.
pub fn topological_sort<'a, I>(edges: I) -> Sorted
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut g = Graph::default();
    for (a, b) in edges {
        g.insert_edge(a, b);
    }
    g.scheduling()
}

#[cfg(test)]
mod test {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn two_cycle() {
        let s = topological_sort([("a", "b"), ("b", "a")]);
        assert!(s.ordered.is_empty());
        assert_eq!(s.cycles, vec![strings(&["a", "b"])]);
    }

    #[test]
    fn acyclic_order() {
        let edges = [("a", "b"), ("b", "d"), ("c", "b"), ("a", "c")];
        let s = topological_sort(edges);
        assert!(s.cycles.is_empty());
        assert_eq!(s.ordered, strings(&["d", "b", "c", "a"]));
        let pos = |x: &str| s.ordered.iter().position(|y| y == x);
        for (a, b) in edges {
            assert!(pos(b) < pos(a), "{b} should come before {a}");
        }
    }

    #[test]
    fn self_loop() {
        let s = topological_sort([("a", "a"), ("b", "a")]);
        assert_eq!(s.ordered, strings(&["b"]));
        assert_eq!(s.cycles, vec![strings(&["a"])]);
    }

    #[test]
    fn cycle_does_not_block_the_rest() {
        let s = topological_sort([("c", "a"), ("a", "b"), ("b", "a"), ("d", "e")]);
        assert_eq!(s.ordered, strings(&["c", "e", "d"]));
        assert_eq!(s.cycles, vec![strings(&["a", "b"])]);
        assert_eq!(s.cyclic().count(), 2);
    }

    #[test]
    fn empty() {
        let s = topological_sort(std::iter::empty::<(&str, &str)>());
        assert_eq!(s, Sorted::default());
    }
}
