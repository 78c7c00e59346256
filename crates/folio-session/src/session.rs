//! Play-through state and time travel.
//!
//! A `Session` holds the player's overrides of noun values, the state of
//! assets (sounds, images) the story switched on, and the [`History`] that
//! lets the player step back and forth between actions. A noun without an
//! override takes its value from the story; the session never needs to know
//! those defaults.

use std::collections::BTreeMap;

use folio_core::Properties;

use crate::config::SessionConfig;
use crate::history::History;
use crate::snapshot::Snapshot;

/// Mutable state of one play-through.
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    user_values: BTreeMap<String, Properties>,
    asset_states: BTreeMap<String, bool>,
    history: History,
    snapshots: Vec<Snapshot>,
    current: usize,
    bookmarks: BTreeMap<usize, String>,
    pending_action: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Create a session positioned at the story start.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            name: config.name,
            user_values: BTreeMap::new(),
            asset_states: BTreeMap::new(),
            history: History::new(),
            snapshots: vec![Snapshot::START],
            current: 0,
            bookmarks: BTreeMap::new(),
            pending_action: None,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        history: History,
        snapshots: Vec<Snapshot>,
        bookmarks: BTreeMap<usize, String>,
    ) -> Self {
        let mut session = Self {
            name,
            history,
            bookmarks,
            ..Self::default()
        };
        session.snapshots.extend(snapshots);
        session.current = session.snapshots.len() - 1;
        session.restore(session.current);
        session
    }

    /// Session title.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the session.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = SessionConfig::default().with_name(name).name;
    }

    // -- Values --

    /// The override of a noun's value, if the session holds one.
    pub fn value(&self, noun: &str) -> Option<&Properties> {
        self.user_values.get(noun)
    }

    /// Mutable override of a noun's value, created from `default` on first
    /// touch. The copy starts clean; mutating it raises its dirty flag.
    pub fn value_mut(&mut self, noun: &str, default: &Properties) -> &mut Properties {
        self.user_values.entry(noun.to_string()).or_insert_with(|| {
            let mut value = default.clone();
            value.clear_dirty();
            value
        })
    }

    /// Replace a noun's override, marking it dirty.
    pub fn set_value(&mut self, noun: &str, mut value: Properties) {
        value.mark_dirty();
        self.user_values.insert(noun.to_string(), value);
    }

    /// All overrides, by noun.
    pub fn user_values(&self) -> &BTreeMap<String, Properties> {
        &self.user_values
    }

    // -- Assets --

    /// Switch an asset on or off.
    pub fn set_asset(&mut self, name: &str, active: bool) {
        if active {
            self.asset_states.insert(name.to_string(), true);
        } else {
            self.asset_states.remove(name);
        }
    }

    /// Whether an asset is switched on.
    pub fn asset_active(&self, name: &str) -> bool {
        self.asset_states.get(name).copied().unwrap_or(false)
    }

    /// Names of active assets, sorted.
    pub fn active_assets(&self) -> Vec<String> {
        self.asset_states
            .iter()
            .filter(|(_, active)| **active)
            .map(|(name, _)| name.clone())
            .collect()
    }

    // -- Snapshots --

    /// Remember which action the next snapshot records, as `noun:verb`.
    pub fn set_action(&mut self, noun: &str, verb: &str) {
        self.pending_action = Some(format!("{noun}:{verb}"));
    }

    /// The `noun:verb` entry the next snapshot will record, if an action is
    /// under way. Moving through history or replacing the session clears it.
    pub fn pending_action(&self) -> Option<&str> {
        self.pending_action.as_deref()
    }

    /// Whether the current snapshot is the newest one.
    pub fn is_at_tip(&self) -> bool {
        self.current + 1 == self.snapshots.len()
    }

    /// Record the state after an action and advance to it.
    ///
    /// Mid-undo the next snapshot already exists, so this only moves the
    /// pointer forward. At the tip it appends the pending queue entry, the
    /// asset set if it changed, and every dirty value that differs from its
    /// variable's last entry. Returns the new snapshot index.
    pub fn create_snapshot(&mut self) -> usize {
        let action = self.pending_action.take().unwrap_or_default();
        if !self.is_at_tip() {
            self.current += 1;
            for value in self.user_values.values_mut() {
                value.clear_dirty();
            }
            tracing::debug!(snapshot = self.current, "snapshot replayed");
            return self.current;
        }

        let active = self.active_assets();
        self.history.record_action(action);
        self.history.record_assets(active);
        for (noun, value) in self.user_values.iter_mut() {
            if value.is_dirty() {
                self.history.record_value(noun, value.print_values());
                value.clear_dirty();
            }
        }

        self.snapshots.push(self.history.tip());
        self.current = self.snapshots.len() - 1;
        tracing::debug!(snapshot = self.current, "snapshot created");
        self.current
    }

    /// Rebuild values and assets as of snapshot `index`.
    ///
    /// Index 0 (the story start) and indices past the newest snapshot are
    /// rejected.
    pub fn load_snapshot(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.snapshots.len() {
            return false;
        }
        self.restore(index);
        self.current = index;
        tracing::debug!(snapshot = index, "snapshot loaded");
        true
    }

    fn restore(&mut self, index: usize) {
        let snapshot = self.snapshots[index];
        self.user_values = self
            .history
            .values_at(snapshot.changes)
            .into_iter()
            .map(|(name, serialized)| (name.to_string(), Properties::parse(serialized)))
            .collect();
        self.asset_states = self
            .history
            .assets_at(snapshot.assets)
            .iter()
            .map(|name| (name.clone(), true))
            .collect();
        self.pending_action = None;
    }

    /// Step back one snapshot. Stepping back from the first action returns
    /// to the story start; at the story start this fails.
    pub fn undo_snapshot(&mut self) -> bool {
        match self.current {
            0 => false,
            1 => {
                self.user_values.clear();
                self.asset_states.clear();
                self.pending_action = None;
                self.current = 0;
                tracing::debug!(snapshot = 0, "returned to story start");
                true
            }
            n => self.load_snapshot(n - 1),
        }
    }

    /// Step forward one snapshot.
    pub fn redo_snapshot(&mut self) -> bool {
        self.load_snapshot(self.current + 1)
    }

    /// Discard every snapshot after the current one, and all history they
    /// alone referenced. Called when the player acts mid-undo.
    pub fn trim(&mut self) {
        if self.is_at_tip() {
            return;
        }
        let point = self.snapshots[self.current];
        let dropped = self.snapshots.len() - self.current - 1;
        self.snapshots.truncate(self.current + 1);
        self.history.truncate(&point);
        self.bookmarks.retain(|&queue, _| queue < point.queue);
        tracing::debug!(snapshot = self.current, dropped, "history trimmed");
    }

    /// Index of the current snapshot; 0 is the story start.
    pub fn current_snapshot(&self) -> usize {
        self.current
    }

    /// All snapshots, the story start included.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The queue entry (`noun:verb`) recorded by snapshot `index`.
    pub fn snapshot_action(&self, index: usize) -> Option<&str> {
        let queue = self.snapshots.get(index)?.queue;
        let entry = queue.checked_sub(1)?;
        self.history.queue().get(entry).map(String::as_str)
    }

    /// The underlying history logs.
    pub fn history(&self) -> &History {
        &self.history
    }

    // -- Bookmarks --

    /// Bookmark the action that led to the current snapshot. Without a
    /// description the action's `noun:verb` is used. Returns the bookmarked
    /// queue index, or `None` at the story start.
    pub fn add_bookmark(&mut self, description: Option<&str>) -> Option<usize> {
        let queue = self.snapshots[self.current].queue.checked_sub(1)?;
        self.add_bookmark_at(queue, description).then_some(queue)
    }

    /// Bookmark queue entry `queue`.
    pub fn add_bookmark_at(&mut self, queue: usize, description: Option<&str>) -> bool {
        let Some(entry) = self.history.queue().get(queue) else {
            return false;
        };
        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(entry.as_str())
            .replace(['\r', '\n'], " ");
        self.bookmarks.insert(queue, description);
        true
    }

    /// Bookmarks by queue index.
    pub fn bookmarks(&self) -> &BTreeMap<usize, String> {
        &self.bookmarks
    }

    /// The snapshot reached right after queue entry `queue`.
    pub fn snapshot_for_queue(&self, queue: usize) -> Option<usize> {
        self.snapshots.iter().position(|s| s.queue == queue + 1)
    }

    /// Forget everything and return to the story start, keeping the name.
    pub fn reset(&mut self) {
        *self = Self::new(SessionConfig {
            name: std::mem::take(&mut self.name),
        });
        tracing::debug!("session reset");
    }
}
