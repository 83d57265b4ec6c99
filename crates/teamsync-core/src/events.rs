//! Workspace push-event types.
//!
//! One event family: task mutations broadcast to every client sharing a
//! workspace. Each mutation arrives as a named server-sent event whose data
//! field carries a JSON [`EventEnvelope`].
//!
//! Envelopes are transient (never persisted). Decoding is best-effort by
//! design: a malformed envelope is dropped by the receiver without tearing
//! down the subscription, so the wire types here stay deliberately loose
//! (every payload field optional).

use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, TaskId, WorkspaceId};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind — the named task mutation events
// ─────────────────────────────────────────────────────────────────────────────

/// The task mutation kinds the server broadcasts.
///
/// Each kind doubles as the SSE event name on the wire (`event: task.updated`)
/// and as the `type` tag inside the JSON envelope. Frames carrying any other
/// name are ignored by the receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A task was created in the workspace.
    #[serde(rename = "task.created")]
    TaskCreated,

    /// A task was updated.
    #[serde(rename = "task.updated")]
    TaskUpdated,

    /// A task was deleted.
    #[serde(rename = "task.deleted")]
    TaskDeleted,
}

impl EventKind {
    /// Every kind the client subscribes to, in a stable order.
    pub const ALL: [EventKind; 3] = [
        EventKind::TaskCreated,
        EventKind::TaskUpdated,
        EventKind::TaskDeleted,
    ];

    /// Wire name of this kind (both the SSE event name and the envelope tag).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::TaskCreated => "task.created",
            EventKind::TaskUpdated => "task.updated",
            EventKind::TaskDeleted => "task.deleted",
        }
    }

    /// Parse a wire name into a kind. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "task.created" => Some(EventKind::TaskCreated),
            "task.updated" => Some(EventKind::TaskUpdated),
            "task.deleted" => Some(EventKind::TaskDeleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload types
// ─────────────────────────────────────────────────────────────────────────────

/// The task a mutation event refers to.
///
/// Only the scoping identifiers travel on the wire; full task bodies are
/// re-fetched through the query cache, never pushed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// Task identifier.
    pub id: TaskId,
    /// Owning project, when the task belongs to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Owning workspace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
}

impl TaskRef {
    /// A task reference with no project or workspace scope attached.
    #[must_use]
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            project_id: None,
            workspace_id: None,
        }
    }

    /// Attach the owning project.
    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Attach the owning workspace.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }
}

/// Body of a task mutation event.
///
/// Every field is optional: deletion events may carry only `task_id`, and
/// older server builds omit fields newer ones send. Receivers must treat
/// absence as "no further scope", not as an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// The mutated task, when the server includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskRef>,
    /// Bare task identifier, sent even when the full reference is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}

impl EventPayload {
    /// Payload carrying a full task reference.
    #[must_use]
    pub fn for_task(task: TaskRef) -> Self {
        Self {
            task_id: Some(task.id.clone()),
            task: Some(task),
        }
    }

    /// The project the mutated task belongs to, if the payload names one.
    #[must_use]
    pub fn project_id(&self) -> Option<&ProjectId> {
        self.task.as_ref().and_then(|t| t.project_id.as_ref())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventEnvelope — one decoded push notification
// ─────────────────────────────────────────────────────────────────────────────

/// One decoded push notification: a kind tag plus its payload.
///
/// The `type` tag inside the JSON body is authoritative for the kind; the SSE
/// event name only gates which frames reach the decoder. A body without a
/// recognizable tag is malformed and gets dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Which mutation happened.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Scoping identifiers for the mutation.
    #[serde(default)]
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// Build an envelope from parts.
    #[must_use]
    pub fn new(kind: EventKind, payload: EventPayload) -> Self {
        Self { kind, payload }
    }

    /// Decode an envelope from the data field of a received frame.
    pub fn decode(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Serialize to the wire JSON form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn kind_wire_names_roundtrip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn kind_unknown_name_is_none() {
        assert_eq!(EventKind::from_name("task.archived"), None);
        assert_eq!(EventKind::from_name(""), None);
    }

    #[test]
    fn kind_serializes_as_dotted_name() {
        let json = serde_json::to_string(&EventKind::TaskUpdated).unwrap();
        assert_eq!(json, "\"task.updated\"");
    }

    #[test]
    fn decode_full_envelope() {
        let data = r#"{
            "type": "task.updated",
            "payload": {
                "task": {"id": "t1", "projectId": "p1", "workspaceId": "w1"},
                "taskId": "t1"
            }
        }"#;
        let env = EventEnvelope::decode(data).unwrap();
        assert_eq!(env.kind, EventKind::TaskUpdated);
        let task = env.payload.task.as_ref().unwrap();
        assert_eq!(task.id.as_str(), "t1");
        assert_eq!(task.project_id.as_ref().unwrap().as_str(), "p1");
        assert_eq!(task.workspace_id.as_ref().unwrap().as_str(), "w1");
        assert_eq!(env.payload.task_id.as_ref().unwrap().as_str(), "t1");
    }

    #[test]
    fn decode_without_project() {
        let data = r#"{"type":"task.created","payload":{"task":{"id":"t2"}}}"#;
        let env = EventEnvelope::decode(data).unwrap();
        assert_eq!(env.kind, EventKind::TaskCreated);
        assert_eq!(env.payload.project_id(), None);
    }

    #[test]
    fn decode_deletion_with_bare_task_id() {
        let data = r#"{"type":"task.deleted","payload":{"taskId":"t3"}}"#;
        let env = EventEnvelope::decode(data).unwrap();
        assert!(env.payload.task.is_none());
        assert_eq!(env.payload.task_id.as_ref().unwrap().as_str(), "t3");
    }

    #[test]
    fn decode_missing_payload_defaults_empty() {
        let env = EventEnvelope::decode(r#"{"type":"task.deleted"}"#).unwrap();
        assert_eq!(env.payload, EventPayload::default());
    }

    #[test]
    fn decode_rejects_unknown_kind() {
        assert_matches!(
            EventEnvelope::decode(r#"{"type":"task.archived","payload":{}}"#),
            Err(_)
        );
    }

    #[test]
    fn decode_rejects_missing_kind() {
        assert_matches!(EventEnvelope::decode(r#"{"payload":{}}"#), Err(_));
    }

    #[test]
    fn decode_rejects_non_json() {
        assert_matches!(EventEnvelope::decode("not json at all"), Err(_));
        assert_matches!(EventEnvelope::decode(""), Err(_));
    }

    #[test]
    fn decode_ignores_extra_fields() {
        let data = r#"{"type":"task.updated","payload":{"taskId":"t1","actor":"u9"},"ts":123}"#;
        let env = EventEnvelope::decode(data).unwrap();
        assert_eq!(env.kind, EventKind::TaskUpdated);
    }

    #[test]
    fn encode_uses_camel_case_and_skips_absent_fields() {
        let env = EventEnvelope::new(
            EventKind::TaskCreated,
            EventPayload::for_task(TaskRef::new("t1").with_project("p1")),
        );
        let json = env.encode().unwrap();
        assert!(json.contains(r#""type":"task.created""#));
        assert!(json.contains(r#""projectId":"p1""#));
        assert!(json.contains(r#""taskId":"t1""#));
        assert!(!json.contains("workspaceId"));
    }

    #[test]
    fn payload_project_id_reads_through_task() {
        let with = EventPayload::for_task(TaskRef::new("t1").with_project("p1"));
        assert_eq!(with.project_id().map(AsRef::as_ref), Some("p1"));

        let without = EventPayload::for_task(TaskRef::new("t1"));
        assert_eq!(without.project_id(), None);

        assert_eq!(EventPayload::default().project_id(), None);
    }

    proptest! {
        #[test]
        fn decode_never_panics(data in ".*") {
            let _ = EventEnvelope::decode(&data);
        }

        #[test]
        fn decode_inverts_encode(
            kind_idx in 0usize..3,
            task_id in "[a-z0-9-]{1,12}",
            project in proptest::option::of("[a-z0-9-]{1,12}"),
        ) {
            let mut task = TaskRef::new(task_id.as_str());
            if let Some(p) = &project {
                task = task.with_project(p.as_str());
            }
            let env = EventEnvelope::new(EventKind::ALL[kind_idx], EventPayload::for_task(task));
            let back = EventEnvelope::decode(&env.encode().unwrap()).unwrap();
            prop_assert_eq!(back, env);
        }
    }
}
