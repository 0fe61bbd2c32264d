//! Field-level delta between an event's `previous` and `current`
//! snapshots.

use serde::{Deserialize, Serialize};

use crate::models::event::TicketSnapshot;

/// A single changed scalar field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    /// Value before the change.
    pub from: Option<String>,
    /// Value after the change.
    pub to: Option<String>,
}

/// Assignee change carrying the raw external agent identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssigneeChange {
    /// Agent before the change.
    pub from: Option<i64>,
    /// Agent after the change.
    pub to: Option<i64>,
}

/// Order-insensitive tag set difference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagChanges {
    /// Tags present now but not before.
    pub added: Vec<String>,
    /// Tags present before but not now.
    pub removed: Vec<String>,
}

/// The set of changed fields between two ticket snapshots.
///
/// Unchanged fields are omitted from the serialized form, so a
/// status-only change serializes as `{"status":{"from":..,"to":..}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationDelta {
    /// External status change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FieldChange>,
    /// Priority change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<FieldChange>,
    /// Assignee change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<AssigneeChange>,
    /// Subject change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<FieldChange>,
    /// Tag set difference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagChanges>,
}

impl ConversationDelta {
    /// Compute the delta between a previous and a current snapshot.
    #[must_use]
    pub fn between(previous: &TicketSnapshot, current: &TicketSnapshot) -> Self {
        Self {
            status: scalar_change(previous.status.as_deref(), current.status.as_deref()),
            priority: scalar_change(previous.priority.as_deref(), current.priority.as_deref()),
            assignee: assignee_change(previous.assignee_id, current.assignee_id),
            subject: scalar_change(previous.subject.as_deref(), current.subject.as_deref()),
            tags: tag_changes(previous.tags.as_deref(), current.tags.as_deref()),
        }
    }

    /// Whether no field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.subject.is_none()
            && self.tags.is_none()
    }

    /// Whether the assignee changed.
    #[must_use]
    pub fn assignee_changed(&self) -> bool {
        self.assignee.is_some()
    }
}

fn scalar_change(from: Option<&str>, to: Option<&str>) -> Option<FieldChange> {
    if from == to {
        return None;
    }
    Some(FieldChange {
        from: from.map(ToOwned::to_owned),
        to: to.map(ToOwned::to_owned),
    })
}

fn assignee_change(from: Option<i64>, to: Option<i64>) -> Option<AssigneeChange> {
    if from == to {
        return None;
    }
    Some(AssigneeChange { from, to })
}

/// Tag comparison is order-insensitive: `["a","b"]` vs `["b","a"]` is no
/// change. Added tags keep current-snapshot order, removed tags keep
/// previous-snapshot order.
fn tag_changes(previous: Option<&[String]>, current: Option<&[String]>) -> Option<TagChanges> {
    let previous = previous.unwrap_or_default();
    let current = current.unwrap_or_default();

    let added: Vec<String> = current
        .iter()
        .filter(|t| !previous.contains(t))
        .cloned()
        .collect();
    let removed: Vec<String> = previous
        .iter()
        .filter(|t| !current.contains(t))
        .cloned()
        .collect();

    if added.is_empty() && removed.is_empty() {
        return None;
    }
    Some(TagChanges { added, removed })
}
