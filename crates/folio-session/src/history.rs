//! The append-only logs behind undo and redo.
//!
//! Three streams grow independently: one queue entry per player action, one
//! asset entry per distinct set of active assets, and one value history per
//! variable. A single chronological change log records `(variable, length)`
//! for every value entry, so the state at any point is recoverable from log
//! lengths alone (see [`Snapshot`]).

use std::collections::HashMap;

use crate::snapshot::Snapshot;

/// The session's history logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    queue: Vec<String>,
    assets: Vec<Vec<String>>,
    var_names: Vec<String>,
    var_index: HashMap<String, usize>,
    var_histories: Vec<Vec<String>>,
    changes: Vec<(usize, usize)>,
}

impl History {
    /// Create empty logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a queue entry. Queue entries are never deduplicated.
    pub fn record_action(&mut self, entry: impl Into<String>) {
        self.queue.push(entry.into());
    }

    /// Append the set of active assets unless it equals the last one recorded.
    /// An empty log counts as "no assets active".
    pub fn record_assets(&mut self, mut active: Vec<String>) -> bool {
        active.sort();
        let last = self.assets.last().map(Vec::as_slice).unwrap_or_default();
        if last == active.as_slice() {
            return false;
        }
        self.assets.push(active);
        true
    }

    /// Index of a tracked variable, registering it on first touch.
    pub fn register(&mut self, name: &str) -> usize {
        if let Some(&id) = self.var_index.get(name) {
            return id;
        }
        let id = self.var_names.len();
        self.var_names.push(name.to_string());
        self.var_index.insert(name.to_string(), id);
        self.var_histories.push(Vec::new());
        id
    }

    /// Append a serialized value to a variable's history unless it equals the
    /// last entry, logging the change. Returns whether anything was written.
    pub fn record_value(&mut self, name: &str, serialized: String) -> bool {
        let id = self.register(name);
        let history = &mut self.var_histories[id];
        if history.last() == Some(&serialized) {
            return false;
        }
        history.push(serialized);
        self.changes.push((id, history.len()));
        true
    }

    /// Current lengths of every log.
    pub fn tip(&self) -> Snapshot {
        Snapshot::new(self.queue.len(), self.assets.len(), self.changes.len())
    }

    /// Serialized value of every variable as of the first `changes` log
    /// entries. Variables untouched by then are absent.
    pub fn values_at(&self, changes: usize) -> Vec<(&str, &str)> {
        let mut latest: Vec<Option<usize>> = vec![None; self.var_names.len()];
        for &(id, len) in self.changes.iter().take(changes) {
            if let Some(slot) = latest.get_mut(id) {
                *slot = Some(len);
            }
        }
        latest
            .into_iter()
            .enumerate()
            .filter_map(|(id, len)| {
                let value = self.var_histories[id].get(len? - 1)?;
                Some((self.var_names[id].as_str(), value.as_str()))
            })
            .collect()
    }

    /// Active assets as of the first `assets` asset entries.
    pub fn assets_at(&self, assets: usize) -> &[String] {
        match assets {
            0 => &[],
            n => self.assets.get(n - 1).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    /// Drop everything recorded after `snapshot`.
    ///
    /// Each variable history is cut to the highest length the surviving
    /// change log still references.
    pub fn truncate(&mut self, snapshot: &Snapshot) {
        self.queue.truncate(snapshot.queue);
        self.assets.truncate(snapshot.assets);
        self.changes.truncate(snapshot.changes);

        let mut keep = vec![0usize; self.var_names.len()];
        for &(id, len) in &self.changes {
            if let Some(k) = keep.get_mut(id) {
                *k = (*k).max(len);
            }
        }
        for (history, len) in self.var_histories.iter_mut().zip(keep) {
            history.truncate(len);
        }
    }

    /// Queue entries in order.
    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    /// Recorded asset sets in order.
    pub fn asset_entries(&self) -> &[Vec<String>] {
        &self.assets
    }

    /// Tracked variable names in registration order.
    pub fn variables(&self) -> &[String] {
        &self.var_names
    }

    /// Value history of a variable, oldest first.
    pub fn variable_history(&self, name: &str) -> Option<&[String]> {
        let &id = self.var_index.get(name)?;
        self.var_histories.get(id).map(Vec::as_slice)
    }

    /// The chronological change log.
    pub fn changes(&self) -> &[(usize, usize)] {
        &self.changes
    }

    pub(crate) fn from_parts(
        queue: Vec<String>,
        assets: Vec<Vec<String>>,
        variables: Vec<(String, Vec<String>)>,
        changes: Vec<(usize, usize)>,
    ) -> Self {
        let mut history = Self {
            queue,
            assets,
            changes,
            ..Self::default()
        };
        for (name, values) in variables {
            let id = history.register(&name);
            history.var_histories[id] = values;
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_deduplicated_per_variable() {
        let mut h = History::new();
        assert!(h.record_value("apple", "red,#0".into()));
        assert!(!h.record_value("apple", "red,#0".into()));
        assert!(h.record_value("apple", "green,#0".into()));
        assert_eq!(h.variable_history("apple").unwrap().len(), 2);
        assert_eq!(h.changes(), &[(0, 1), (0, 2)]);
    }

    #[test]
    fn assets_are_deduplicated_and_sorted() {
        let mut h = History::new();
        assert!(!h.record_assets(vec![]));
        assert!(h.record_assets(vec!["rain".into(), "music".into()]));
        assert!(!h.record_assets(vec!["music".into(), "rain".into()]));
        assert_eq!(h.assets_at(1), ["music", "rain"]);
        assert!(h.assets_at(0).is_empty());
    }

    #[test]
    fn values_at_reads_last_change_before_point() {
        let mut h = History::new();
        h.record_value("a", "1".into());
        h.record_value("b", "x".into());
        h.record_value("a", "2".into());
        assert_eq!(h.values_at(0), vec![]);
        assert_eq!(h.values_at(2), vec![("a", "1"), ("b", "x")]);
        assert_eq!(h.values_at(3), vec![("a", "2"), ("b", "x")]);
    }

    #[test]
    fn truncate_cuts_every_log() {
        let mut h = History::new();
        h.record_action("apple:eat");
        h.record_value("a", "1".into());
        let point = h.tip();
        h.record_action("apple:throw");
        h.record_assets(vec!["splash".into()]);
        h.record_value("a", "2".into());
        h.record_value("b", "x".into());

        h.truncate(&point);
        assert_eq!(h.queue(), ["apple:eat"]);
        assert!(h.asset_entries().is_empty());
        assert_eq!(h.variable_history("a").unwrap(), ["1"]);
        assert!(h.variable_history("b").unwrap().is_empty());
        assert_eq!(h.tip(), point);
    }
}
