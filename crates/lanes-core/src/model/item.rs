use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::status::StatusKey;

/// Opaque, stable identifier of a work item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Borrow the raw identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A card on the board.
///
/// Only `status` and `position` are interpreted by the engine. `labels`,
/// `assignee` and `due_date` are carried through every operation verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,
    pub title: String,
    pub status: StatusKey,
    /// Zero-based rank within `status`; dense and unique per status.
    pub position: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl WorkItem {
    /// Minimal item with no metadata.
    pub fn new(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        status: impl Into<StatusKey>,
        position: usize,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: status.into(),
            position,
            labels: Vec::new(),
            assignee: None,
            due_date: None,
        }
    }
}

/// Creation payload for an item whose position is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub id: ItemId,
    pub title: String,
    pub status: StatusKey,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewItem {
    pub fn new(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        status: impl Into<StatusKey>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: status.into(),
            labels: Vec::new(),
            assignee: None,
            due_date: None,
        }
    }

    /// Materialize the item at `position`.
    #[must_use]
    pub fn into_item(self, position: usize) -> WorkItem {
        WorkItem {
            id: self.id,
            title: self.title,
            status: self.status,
            position,
            labels: self.labels,
            assignee: self.assignee,
            due_date: self.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_serializes_as_plain_string() {
        let id = ItemId::from("t-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-7\"");
        assert_eq!(id.to_string(), "t-7");
    }

    #[test]
    fn empty_metadata_is_omitted_from_json() {
        let item = WorkItem::new("t-1", "Write docs", "TODO", 0);
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("labels").is_none());
        assert!(json.get("assignee").is_none());
        assert!(json.get("due_date").is_none());
        assert_eq!(json["status"], "TODO");
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let mut item = WorkItem::new("t-2", "Ship", "DOING", 3);
        item.labels = vec!["release".into()];
        item.assignee = Some("kim".into());
        item.due_date = NaiveDate::from_ymd_opt(2026, 11, 2);

        let text = serde_json::to_string(&item).unwrap();
        let back: WorkItem = serde_json::from_str(&text).unwrap();
        assert_eq!(back, item);
        assert!(text.contains("\"due_date\":\"2026-11-02\""));
    }

    #[test]
    fn new_item_keeps_metadata_on_insert() {
        let mut new = NewItem::new("t-3", "Review", "REVIEW");
        new.assignee = Some("sam".into());
        let item = new.into_item(4);
        assert_eq!(item.position, 4);
        assert_eq!(item.assignee.as_deref(), Some("sam"));
    }
}
