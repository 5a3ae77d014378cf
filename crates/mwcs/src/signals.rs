//! Signal registry: weighted labels shared by graph elements.
//!
//! Purpose
//! - Own the signal weights and the many-to-many membership between elements
//!   and signals.
//! - Score element sets with at-most-once semantics: a signal contributes its
//!   weight once if any member is in the set.
//!
//! Notes
//! - A weight of `+∞` marks a mandatory signal. It contributes nothing to
//!   scores; the model builder turns it into a coverage constraint.
//! - A negative signal may have at most one member (`validate`). Costs are then
//!   attributable to a single element, which the reduction rules and the
//!   separator rely on.

use std::collections::{BTreeSet, HashMap};

use crate::error::{MwcsError, Result};
use crate::graph::{EdgeId, Elem};

/// Signal id, stable for the registry's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(pub usize);

#[derive(Clone, Debug, Default)]
pub struct Signals {
    weights: Vec<f64>,
    members: Vec<BTreeSet<Elem>>,
    of: HashMap<Elem, Vec<SignalId>>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SignalId> {
        (0..self.weights.len()).map(SignalId)
    }

    pub fn add_signal(&mut self, weight: f64) -> SignalId {
        self.weights.push(weight);
        self.members.push(BTreeSet::new());
        SignalId(self.weights.len() - 1)
    }

    /// Make `elem` a member of `sig`; repeated calls are no-ops.
    pub fn attach(&mut self, elem: Elem, sig: SignalId) {
        if !self.members[sig.0].insert(elem) {
            return;
        }
        let list = self.of.entry(elem).or_default();
        if let Err(pos) = list.binary_search(&sig) {
            list.insert(pos, sig);
        }
    }

    /// Fresh singleton signal for `elem` (plain weighting).
    pub fn add_weighted(&mut self, elem: Elem, weight: f64) -> SignalId {
        let s = self.add_signal(weight);
        self.attach(elem, s);
        s
    }

    pub fn weight(&self, sig: SignalId) -> f64 {
        self.weights[sig.0]
    }

    pub fn set_weight(&mut self, sig: SignalId, weight: f64) {
        self.weights[sig.0] = weight;
    }

    pub fn is_mandatory(&self, sig: SignalId) -> bool {
        self.weights[sig.0] == f64::INFINITY
    }

    pub fn mandatory(&self) -> Vec<SignalId> {
        self.ids().filter(|&s| self.is_mandatory(s)).collect()
    }

    pub fn members(&self, sig: SignalId) -> &BTreeSet<Elem> {
        &self.members[sig.0]
    }

    /// Sorted signals of `elem` (empty if it carries none).
    pub fn signals_of(&self, elem: Elem) -> &[SignalId] {
        self.of.get(&elem).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Weight of the scoring contribution of `sig` (mandatory counts zero).
    pub fn contribution(&self, sig: SignalId) -> f64 {
        let w = self.weights[sig.0];
        if w.is_finite() {
            w
        } else {
            0.0
        }
    }

    /// Sum over distinct signals.
    pub fn sum(&self, sigs: impl IntoIterator<Item = SignalId>) -> f64 {
        let distinct: BTreeSet<SignalId> = sigs.into_iter().collect();
        distinct.into_iter().map(|s| self.contribution(s)).sum()
    }

    /// Score of an element set: every touched signal counted once.
    pub fn score<'a>(&self, elems: impl IntoIterator<Item = &'a Elem>) -> f64 {
        self.sum(
            elems
                .into_iter()
                .flat_map(|&x| self.signals_of(x).iter().copied()),
        )
    }

    /// Weight of a single element.
    pub fn weight_of(&self, elem: Elem) -> f64 {
        self.sum(self.signals_of(elem).iter().copied())
    }

    /// Part of an element's weight it contributes no matter what else is
    /// selected: negative signals plus signals it carries alone.
    pub fn min_sum(&self, elem: Elem) -> f64 {
        self.signals_of(elem)
            .iter()
            .filter(|&&s| self.weights[s.0] < 0.0 || self.members[s.0].len() == 1)
            .map(|&s| self.contribution(s))
            .sum()
    }

    pub fn positive_of(&self, elem: Elem) -> Vec<SignalId> {
        self.signals_of(elem)
            .iter()
            .copied()
            .filter(|&s| self.weights[s.0] > 0.0)
            .collect()
    }

    pub fn negative_of(&self, elem: Elem) -> Vec<SignalId> {
        self.signals_of(elem)
            .iter()
            .copied()
            .filter(|&s| self.weights[s.0] < 0.0)
            .collect()
    }

    /// All signals of `elem` are carried by `elem` alone.
    pub fn is_bijective(&self, elem: Elem) -> bool {
        let sigs = self.signals_of(elem);
        !sigs.is_empty() && sigs.iter().all(|s| self.members[s.0].len() == 1)
    }

    /// Charge `penalty` (< 0) on each edge: folded into the edge's own signal
    /// when it owns exactly one, otherwise as a fresh singleton signal.
    pub fn add_edge_penalties(&mut self, edges: impl IntoIterator<Item = EdgeId>, penalty: f64) {
        for e in edges {
            let x = Elem::Edge(e);
            let sigs = self.signals_of(x);
            if sigs.len() == 1 && self.is_bijective(x) {
                let s = sigs[0];
                if self.weights[s.0].is_finite() {
                    self.weights[s.0] += penalty;
                    continue;
                }
            }
            self.add_weighted(x, penalty);
        }
    }

    /// Registry restricted to `elems`. Ids are kept; memberships of other
    /// elements are dropped, so signals without kept members become empty.
    pub fn restricted<'a>(&self, elems: impl IntoIterator<Item = &'a Elem>) -> Signals {
        let keep: BTreeSet<Elem> = elems.into_iter().copied().collect();
        let members = self
            .members
            .iter()
            .map(|m| m.intersection(&keep).copied().collect())
            .collect();
        let of = self
            .of
            .iter()
            .filter(|(x, _)| keep.contains(x))
            .map(|(x, s)| (*x, s.clone()))
            .collect();
        Signals {
            weights: self.weights.clone(),
            members,
            of,
        }
    }

    /// Check weights are usable and negative signals have a single member.
    pub fn validate(&self) -> Result<()> {
        for s in self.ids() {
            let w = self.weights[s.0];
            if w.is_nan() || w == f64::NEG_INFINITY {
                return Err(MwcsError::invariant(format!(
                    "signal {} has unusable weight {w}",
                    s.0
                )));
            }
            if w < 0.0 && self.members[s.0].len() > 1 {
                return Err(MwcsError::invariant(format!(
                    "negative signal {} has {} members",
                    s.0,
                    self.members[s.0].len()
                )));
            }
        }
        Ok(())
    }

    /// Whether every signal has at most one member (plain weighting).
    pub fn is_plain(&self) -> bool {
        self.members.iter().all(|m| m.len() <= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use proptest::prelude::*;

    fn node(i: usize) -> Elem {
        Elem::Node(NodeId(i))
    }

    fn edge(i: usize) -> Elem {
        Elem::Edge(EdgeId(i))
    }

    #[test]
    fn shared_signal_counts_once() {
        let mut s = Signals::new();
        let a = s.add_signal(5.0);
        let b = s.add_signal(-2.0);
        s.attach(node(0), a);
        s.attach(node(1), a);
        s.attach(node(1), b);
        assert_eq!(s.score(&[node(0)]), 5.0);
        assert_eq!(s.score(&[node(0), node(1)]), 3.0);
        assert_eq!(s.weight_of(node(1)), 3.0);
        assert_eq!(s.min_sum(node(1)), -2.0);
        assert!(!s.is_bijective(node(1)));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn mandatory_signals_score_zero() {
        let mut s = Signals::new();
        let m = s.add_signal(f64::INFINITY);
        s.attach(node(0), m);
        s.add_weighted(node(0), 1.5);
        assert_eq!(s.score(&[node(0)]), 1.5);
        assert_eq!(s.mandatory(), vec![m]);
    }

    #[test]
    fn shared_negative_signal_is_rejected() {
        let mut s = Signals::new();
        let b = s.add_signal(-1.0);
        s.attach(node(0), b);
        s.attach(edge(0), b);
        assert!(matches!(s.validate(), Err(MwcsError::Invariant { .. })));
    }

    #[test]
    fn edge_penalties_fold_into_own_signal() {
        let mut s = Signals::new();
        let own = s.add_weighted(edge(0), 2.0);
        let shared = s.add_signal(1.0);
        s.attach(edge(1), shared);
        s.attach(edge(2), shared);
        let before = s.len();
        s.add_edge_penalties([EdgeId(0), EdgeId(1)], -0.5);
        assert_eq!(s.weight(own), 1.5);
        assert_eq!(s.len(), before + 1);
        assert_eq!(s.weight_of(edge(1)), 0.5);
        assert_eq!(s.weight(shared), 1.0);
    }

    #[test]
    fn restricted_keeps_ids_and_drops_members() {
        let mut s = Signals::new();
        let a = s.add_signal(3.0);
        s.attach(node(0), a);
        s.attach(node(1), a);
        let r = s.restricted(&[node(1)]);
        assert_eq!(r.len(), s.len());
        assert_eq!(r.members(a).len(), 1);
        assert!(r.signals_of(node(0)).is_empty());
        assert!(r.is_plain());
    }

    proptest! {
        #[test]
        fn score_ignores_duplicate_coverage(
            weights in prop::collection::vec(-5.0f64..5.0, 1..6),
            picks in prop::collection::vec((0usize..6, 0usize..6), 1..12),
            extra in 0usize..6,
        ) {
            let mut s = Signals::new();
            let ids: Vec<_> = weights.iter().map(|&w| s.add_signal(w)).collect();
            for &(x, sig) in &picks {
                s.attach(node(x), ids[sig % ids.len()]);
            }
            let set: Vec<Elem> = (0..6).map(node).collect();
            let base = s.score(&set);
            let mut doubled = set.clone();
            doubled.extend(set.iter().copied());
            prop_assert!((s.score(&doubled) - base).abs() < 1e-12);
            // A new element covering only already-touched signals adds nothing.
            let covered: Vec<SignalId> = set
                .iter()
                .flat_map(|&x| s.signals_of(x).to_vec())
                .collect();
            if let Some(&sig) = covered.get(extra % covered.len().max(1)) {
                s.attach(node(100), sig);
                let mut with_dup = set.clone();
                with_dup.push(node(100));
                prop_assert!((s.score(&with_dup) - base).abs() < 1e-12);
            }
        }
    }
}
