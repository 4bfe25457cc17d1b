use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type ChannelId = i64;

/// Catalog entry as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Entries that omit the flag are treated as inactive.
    #[serde(default)]
    pub is_active: bool,
}

impl ChannelSummary {
    /// `title (@username)`, falling back to the numeric id.
    pub fn display_name(&self) -> String {
        match self.username.as_deref().filter(|name| !name.is_empty()) {
            Some(username) => format!("{} (@{})", self.title, username),
            None => format!("{} (@{})", self.title, self.id),
        }
    }
}

/// The subset of active channels chosen for a job.
///
/// Only active channels can be selected; an empty selection means "all
/// active channels" and is a valid state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelSelectionSet {
    available: Vec<ChannelSummary>,
    selected: BTreeSet<ChannelId>,
}

impl ChannelSelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: impl IntoIterator<Item = ChannelSummary>) -> Self {
        let mut set = Self::new();
        set.replace_catalog(catalog);
        set
    }

    /// Swaps in a fresh catalog, keeping selections that are still active.
    pub fn replace_catalog(&mut self, catalog: impl IntoIterator<Item = ChannelSummary>) {
        self.available = catalog.into_iter().filter(|ch| ch.is_active).collect();
        let available = &self.available;
        self.selected.retain(|id| available.iter().any(|ch| ch.id == *id));
    }

    pub fn select_all(&mut self) {
        self.selected = self.available.iter().map(|ch| ch.id).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Flips membership of each id; ids outside the active catalog are ignored.
    ///
    /// Returns how many ids were toggled.
    pub fn toggle(&mut self, ids: &[ChannelId]) -> usize {
        let mut toggled = 0;
        for id in ids {
            if !self.available.iter().any(|ch| ch.id == *id) {
                continue;
            }
            if !self.selected.remove(id) {
                self.selected.insert(*id);
            }
            toggled += 1;
        }
        toggled
    }

    pub fn channel_ids(&self) -> BTreeSet<ChannelId> {
        self.selected.clone()
    }

    pub fn is_selected(&self, id: ChannelId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_all_active(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn available(&self) -> &[ChannelSummary] {
        &self.available
    }

    /// Selected channels in catalog order.
    pub fn selected(&self) -> impl Iterator<Item = &ChannelSummary> {
        self.available
            .iter()
            .filter(|ch| self.selected.contains(&ch.id))
    }
}
