//! Absorption ledger: reversible merges keyed by stable element ids.

use std::collections::HashMap;

use crate::graph::Elem;
use crate::signals::{SignalId, Signals};

/// Append-only merge log per surviving element plus its carried signals.
///
/// Logs are kept flat: absorbing an element also moves everything it had
/// absorbed, so a log only ever lists original elements. Elements without an
/// entry carry their own registry signals.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    absorbed: HashMap<Elem, Vec<Elem>>,
    carried: HashMap<Elem, Vec<SignalId>>,
}

impl Ledger {
    pub fn absorbed(&self, x: Elem) -> &[Elem] {
        self.absorbed.get(&x).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn carried<'a>(&'a self, signals: &'a Signals, x: Elem) -> &'a [SignalId] {
        match self.carried.get(&x) {
            Some(list) => list,
            None => signals.signals_of(x),
        }
    }

    /// Record `victim` (and its log) under `survivor`. Returns the signals
    /// the survivor did not carry before.
    pub(crate) fn merge(&mut self, signals: &Signals, survivor: Elem, victim: Elem) -> Vec<SignalId> {
        let moved = self.absorbed.remove(&victim).unwrap_or_default();
        let victim_sigs = self.carried(signals, victim).to_vec();
        self.carried.remove(&victim);
        let log = self.absorbed.entry(survivor).or_default();
        log.extend(moved);
        log.push(victim);
        self.union_into(signals, survivor, &victim_sigs)
    }

    /// Record already-expanded originals under `survivor`.
    pub(crate) fn merge_originals(
        &mut self,
        signals: &Signals,
        survivor: Elem,
        originals: &[Elem],
    ) -> Vec<SignalId> {
        let sigs: Vec<SignalId> = originals
            .iter()
            .flat_map(|&x| signals.signals_of(x).iter().copied())
            .collect();
        self.absorbed
            .entry(survivor)
            .or_default()
            .extend(originals.iter().copied());
        self.union_into(signals, survivor, &sigs)
    }

    fn union_into(&mut self, signals: &Signals, survivor: Elem, sigs: &[SignalId]) -> Vec<SignalId> {
        let current = self.carried(signals, survivor).to_vec();
        let mut merged = current.clone();
        let mut fresh = Vec::new();
        for &s in sigs {
            if let Err(pos) = merged.binary_search(&s) {
                merged.insert(pos, s);
                fresh.push(s);
            }
        }
        self.carried.insert(survivor, merged);
        fresh
    }

    /// Forget everything `x` absorbed. Returns the signals it no longer carries.
    pub(crate) fn clear(&mut self, signals: &Signals, x: Elem) -> Vec<SignalId> {
        self.absorbed.remove(&x);
        let Some(list) = self.carried.remove(&x) else {
            return Vec::new();
        };
        let own = signals.signals_of(x);
        list.into_iter()
            .filter(|s| own.binary_search(s).is_err())
            .collect()
    }

    /// Drop all state of a removed element.
    pub(crate) fn forget(&mut self, x: Elem) {
        self.absorbed.remove(&x);
        self.carried.remove(&x);
    }

    /// Copy of the entries for elements accepted by `keep`.
    pub(crate) fn filtered(&self, keep: impl Fn(Elem) -> bool) -> Ledger {
        Ledger {
            absorbed: self
                .absorbed
                .iter()
                .filter(|(x, _)| keep(**x))
                .map(|(x, v)| (*x, v.clone()))
                .collect(),
            carried: self
                .carried
                .iter()
                .filter(|(x, _)| keep(**x))
                .map(|(x, v)| (*x, v.clone()))
                .collect(),
        }
    }
}
