//! Bounded version history for editable content payloads.
//!
//! [`VersionHistory`] is a fixed-capacity ring buffer: pushing past
//! [`MAX_VERSION_SNAPSHOTS`] evicts the oldest snapshot, so the list never
//! grows beyond its capacity even transiently.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{DbId, Timestamp};

/// Number of previous payloads retained per entity.
pub const MAX_VERSION_SNAPSHOTS: usize = 10;

/// A previous payload archived before an edit replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub version: i32,
    pub content: Value,
    pub saved_at: Timestamp,
    pub saved_by: DbId,
}

/// Most recent snapshots, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ContentSnapshot>", into = "Vec<ContentSnapshot>")]
pub struct VersionHistory {
    snapshots: VecDeque<ContentSnapshot>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self {
            snapshots: VecDeque::with_capacity(MAX_VERSION_SNAPSHOTS),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ContentSnapshot> {
        self.snapshots.iter()
    }

    pub fn latest(&self) -> Option<&ContentSnapshot> {
        self.snapshots.back()
    }

    /// Append a snapshot, evicting the oldest when full.
    pub fn push(&mut self, snapshot: ContentSnapshot) {
        if self.snapshots.len() == MAX_VERSION_SNAPSHOTS {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Archive `previous` ahead of a payload change and return the new
    /// version number.
    ///
    /// Empty payloads are not archived and do not bump the version.
    pub fn archive(
        &mut self,
        current_version: i32,
        previous: &Value,
        previous_non_empty: bool,
        saved_by: DbId,
        now: Timestamp,
    ) -> i32 {
        if !previous_non_empty {
            return current_version;
        }
        self.push(ContentSnapshot {
            version: current_version,
            content: previous.clone(),
            saved_at: now,
            saved_by,
        });
        current_version + 1
    }
}

impl From<Vec<ContentSnapshot>> for VersionHistory {
    fn from(list: Vec<ContentSnapshot>) -> Self {
        let mut history = Self::new();
        for snapshot in list {
            history.push(snapshot);
        }
        history
    }
}

impl From<VersionHistory> for Vec<ContentSnapshot> {
    fn from(history: VersionHistory) -> Self {
        history.snapshots.into()
    }
}
