//! Order the computation of the auxiliaries.
//!
//! Most of the hard work is delegated to `graph` for cycle detection
//! and `depends` for constraint definition.
//! Only references from an auxiliary to another auxiliary constrain the
//! order: state variables are read from the current state, and every
//! derivative is computed after the auxiliaries it may read.
//!
//! The evaluation of one derivative proceeds in four phases:
//! 1. auxiliaries in topological order,
//! 2. auxiliaries that are part of a cycle,
//! 3. derivatives of the state variables,
//! 4. auxiliaries that touch no other auxiliary ("isolated").
//!
//! Cycles and reads of an auxiliary computed in a later phase are
//! reported as warnings, and the order is left as is.

use std::collections::{BTreeSet, HashSet};

use dda_err::{self as err, EAccum};

use crate::classify::Classified;
use crate::sp::Sp;

pub mod depends;
pub mod graph;

use depends::Depends;

/// A classified program along with the order of evaluation of its
/// auxiliaries.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Output of classification.
    pub classified: Classified,
    /// Every `(dependent, dependency)` pair.
    pub edges: Vec<(String, String)>,
    /// Only the pairs whose ends are both auxiliaries.
    pub aux_edges: Vec<(String, String)>,
    /// Phase 1, each after its dependencies.
    pub ordered: Vec<String>,
    /// Phase 2, as reported by the sort.
    pub cyclic: Vec<String>,
    /// Phase 2 grouped by cycle.
    pub cycles: Vec<Vec<String>>,
    /// Phase 4, sorted by name.
    pub isolated: Vec<String>,
}

/// When a value is computed, relative to its readers.
const AFTER_DERIVATIVES: &str = "only after the state derivatives";
/// Same, for cyclic auxiliaries.
const AFTER_ORDERED: &str = "only after the auxiliaries without cycles";

impl Classified {
    /// Build the dependency graph and sort the auxiliaries.
    ///
    /// Fatal errors: references to variables that are never defined
    /// (all of them are reported).
    /// Warnings: cycles, stale reads.
    pub fn causality(self, eaccum: &mut EAccum) -> Option<Schedule> {
        self.program.check_references(eaccum)?;

        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for def in self.program.iter() {
            let mut provided = Vec::new();
            def.provides(&mut provided);
            let mut refs = Vec::new();
            def.requires(&mut refs);
            for p in &provided {
                for r in &refs {
                    let edge = (p.t.clone(), r.t.clone());
                    if seen.insert(edge.clone()) {
                        edges.push(edge);
                    }
                }
            }
        }
        let aux_edges: Vec<_> = edges
            .iter()
            .filter(|(a, b)| self.aux.contains(a) && self.aux.contains(b))
            .cloned()
            .collect();
        let sorted = graph::topological_sort(
            aux_edges.iter().map(|(a, b)| (a.as_str(), b.as_str())),
        );
        let cyclic: Vec<String> = sorted.cyclic().cloned().collect();
        let isolated: Vec<String> = {
            let placed: BTreeSet<&String> = sorted.ordered.iter().chain(&cyclic).collect();
            self.aux
                .iter()
                .filter(|v| !placed.contains(v))
                .cloned()
                .collect()
        };
        tracing::debug!(
            edges = edges.len(),
            aux_edges = aux_edges.len(),
            ordered = sorted.ordered.len(),
            cyclic = cyclic.len(),
            isolated = isolated.len(),
            "causality done"
        );

        let schedule = Schedule {
            classified: self,
            edges,
            aux_edges,
            ordered: sorted.ordered,
            cyclic,
            cycles: sorted.cycles,
            isolated,
        };
        schedule.report_cycles(eaccum);
        schedule.report_stale_reads(eaccum);
        Some(schedule)
    }
}

impl Schedule {
    /// One warning per cycle.
    fn report_cycles(&self, eaccum: &mut EAccum) {
        for cycle in &self.cycles {
            let Some((head, rest)) = cycle.split_first() else {
                continue;
            };
            eaccum.warning(err::Cycle {
                head,
                site: self.classified.program.get(head).map(|d| d.site()),
                items: rest,
            });
        }
    }

    /// Warn about every value read before it is computed in the current
    /// evaluation.
    fn report_stale_reads(&self, eaccum: &mut EAccum) {
        let isolated: BTreeSet<&String> = self.isolated.iter().collect();
        let cyclic: BTreeSet<&String> = self.cyclic.iter().collect();
        let readers = self
            .classified
            .state
            .iter()
            .map(|v| (v, &isolated, AFTER_DERIVATIVES))
            .chain(self.ordered.iter().map(|v| (v, &cyclic, AFTER_ORDERED)));
        for (reader, late, when) in readers {
            let Some(def) = self.classified.program.get(reader) else {
                continue;
            };
            let mut refs: Vec<Sp<String>> = Vec::new();
            def.requires(&mut refs);
            let mut reported = HashSet::new();
            for r in refs {
                if late.contains(&r.t) && reported.insert(r.t.clone()) {
                    eaccum.warning(err::StaleRead {
                        reader,
                        source: &r,
                        site: r.span,
                        when,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{Expr, Program};
    use dda_err::Kind;

    fn schedule(p: Program) -> (Option<Schedule>, EAccum) {
        let mut eaccum = EAccum::default();
        let s = p
            .classify(&mut eaccum)
            .and_then(|c| c.causality(&mut eaccum));
        (s, eaccum)
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn cycle_scenario() {
        let p = Program::default()
            .with("a", Expr::apply("add", [Expr::var("b"), Expr::lit(1.0)]))
            .with("b", Expr::apply("add", [Expr::var("a"), Expr::lit(1.0)]));
        let (s, eaccum) = schedule(p);
        let Some(s) = s else { panic!("causality failed") };
        assert!(s.ordered.is_empty());
        let cyclic: BTreeSet<String> = s.cyclic.iter().cloned().collect();
        let expected: BTreeSet<String> = strings(&["a", "b"]).into_iter().collect();
        assert_eq!(cyclic, expected);
        assert!(s.isolated.is_empty());
        let (errs, warns) = eaccum.fetch();
        assert!(errs.is_empty());
        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0].kind, Kind::Cycle);
    }

    #[test]
    fn isolated_scenario() {
        let p = Program::default().with("c", Expr::apply("const", [Expr::lit(5.0)]));
        let (s, eaccum) = schedule(p);
        let Some(s) = s else { panic!("causality failed") };
        assert!(s.ordered.is_empty());
        assert!(s.cyclic.is_empty());
        assert_eq!(s.isolated, strings(&["c"]));
        assert!(eaccum.warnings().is_empty());
    }

    #[test]
    fn only_aux_edges_constrain() {
        // y' = a, a = mult(k, y), k = 2
        let p = Program::default()
            .with("k", Expr::lit(2.0))
            .with("a", Expr::apply("mult", [Expr::var("k"), Expr::var("y")]))
            .with(
                "y",
                Expr::apply("int", [Expr::var("a"), Expr::lit(0.1), Expr::lit(1.0)]),
            );
        let (s, eaccum) = schedule(p);
        let Some(s) = s else { panic!("causality failed") };
        assert_eq!(
            s.edges,
            vec![
                ("a".to_owned(), "k".to_owned()),
                ("a".to_owned(), "y".to_owned()),
                ("y".to_owned(), "a".to_owned()),
            ]
        );
        assert_eq!(s.aux_edges, vec![("a".to_owned(), "k".to_owned())]);
        assert_eq!(s.ordered, strings(&["k", "a"]));
        assert!(s.cyclic.is_empty() && s.isolated.is_empty());
        assert!(eaccum.warnings().is_empty());
    }

    #[test]
    fn stale_reads() {
        // The derivative of y reads the isolated `k`,
        // and the ordered `d` reads the cyclic `a`.
        let p = Program::default()
            .with("k", Expr::lit(2.0))
            .with(
                "y",
                Expr::apply(
                    "int",
                    [
                        Expr::apply("mult", [Expr::var("k"), Expr::var("k")]),
                        Expr::lit(0.1),
                        Expr::lit(1.0),
                    ],
                ),
            )
            .with("a", Expr::apply("neg", [Expr::var("b")]))
            .with("b", Expr::apply("neg", [Expr::var("a")]))
            .with("d", Expr::apply("abs", [Expr::var("a")]));
        let (s, eaccum) = schedule(p);
        assert!(s.is_some());
        let (_, warns) = eaccum.fetch();
        let mut kinds: Vec<_> = warns.iter().map(|w| w.kind).collect();
        kinds.sort_by_key(ToString::to_string);
        assert_eq!(kinds, vec![Kind::Cycle, Kind::StaleRead, Kind::StaleRead]);
        assert!(warns
            .iter()
            .any(|w| w.headline() == "`y` reads auxiliary `k`, which is computed only after the state derivatives"));
        assert!(warns
            .iter()
            .any(|w| w.headline() == "`d` reads auxiliary `a`, which is computed only after the auxiliaries without cycles"));
    }

    #[test]
    fn dependents_of_a_cycle_stay_ordered() {
        let p = Program::default()
            .with("a", Expr::apply("abs", [Expr::var("b")]))
            .with("b", Expr::apply("neg", [Expr::var("c")]))
            .with("c", Expr::apply("neg", [Expr::var("b")]));
        let (s, eaccum) = schedule(p);
        let Some(s) = s else { panic!("causality failed") };
        assert_eq!(s.ordered, strings(&["a"]));
        let cyclic: BTreeSet<String> = s.cyclic.iter().cloned().collect();
        let expected: BTreeSet<String> = strings(&["b", "c"]).into_iter().collect();
        assert_eq!(cyclic, expected);
        let (_, warns) = eaccum.fetch();
        assert_eq!(warns.len(), 2);
        assert!(warns
            .iter()
            .any(|w| w.headline() == "`a` reads auxiliary `b`, which is computed only after the auxiliaries without cycles"));
    }

    #[test]
    fn undeclared() {
        let p = Program::default()
            .with("a", Expr::apply("add", [Expr::var("x"), Expr::var("z")]));
        let (s, eaccum) = schedule(p);
        assert!(s.is_none());
        assert_eq!(eaccum.errors().len(), 2);
        assert!(eaccum.errors().iter().all(|e| e.kind == Kind::Reference));
    }
}
