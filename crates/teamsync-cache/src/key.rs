//! Logical identifiers for cached read results.
//!
//! A [`QueryKey`] is an ordered tuple: a query name followed by the scoping
//! identifiers for that query. Two keys address the same cache entry exactly
//! when their tuples are equal, so key construction is the whole contract
//! between the reading side (which caches under a key) and the invalidating
//! side (which marks that key stale).
//!
//! The well-known keys the task-mutation path invalidates are built through
//! the named constructors here rather than ad-hoc string tuples, so the
//! reading and invalidating sides cannot drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;

use teamsync_core::ids::{ProjectId, WorkspaceId};

/// Query name for the full task list of a workspace.
pub const ALL_TASKS: &str = "all-tasks";
/// Query name for workspace-level analytics rollups.
pub const WORKSPACE_ANALYTICS: &str = "workspace-analytics";
/// Query name for per-project analytics rollups.
pub const PROJECT_ANALYTICS: &str = "project-analytics";

/// Ordered identifier for one cached query result.
///
/// Serializes as a JSON array (`["all-tasks","w1"]`), the same shape the
/// reading side uses for its cache keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Build a key from its ordered segments.
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Key for a workspace's full task list.
    #[must_use]
    pub fn all_tasks(workspace: &WorkspaceId) -> Self {
        Self::new([ALL_TASKS, workspace.as_str()])
    }

    /// Key for a workspace's analytics rollup.
    #[must_use]
    pub fn workspace_analytics(workspace: &WorkspaceId) -> Self {
        Self::new([WORKSPACE_ANALYTICS, workspace.as_str()])
    }

    /// Key for a project's analytics rollup.
    #[must_use]
    pub fn project_analytics(project: &ProjectId) -> Self {
        Self::new([PROJECT_ANALYTICS, project.as_str()])
    }

    /// The query name (first segment). Empty for a degenerate empty key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// All segments in order, name included.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{segment:?}")?;
        }
        write!(f, "]")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_constructors_use_wire_names() {
        let ws = WorkspaceId::from("w1");
        let proj = ProjectId::from("p1");

        assert_eq!(
            QueryKey::all_tasks(&ws).segments(),
            &["all-tasks".to_owned(), "w1".to_owned()]
        );
        assert_eq!(
            QueryKey::workspace_analytics(&ws).segments(),
            &["workspace-analytics".to_owned(), "w1".to_owned()]
        );
        assert_eq!(
            QueryKey::project_analytics(&proj).segments(),
            &["project-analytics".to_owned(), "p1".to_owned()]
        );
    }

    #[test]
    fn equality_is_tuple_equality() {
        let ws = WorkspaceId::from("w1");
        assert_eq!(QueryKey::all_tasks(&ws), QueryKey::new(["all-tasks", "w1"]));
        assert_ne!(
            QueryKey::all_tasks(&ws),
            QueryKey::all_tasks(&WorkspaceId::from("w2"))
        );
        assert_ne!(
            QueryKey::all_tasks(&ws),
            QueryKey::workspace_analytics(&ws)
        );
    }

    #[test]
    fn segment_order_matters() {
        assert_ne!(QueryKey::new(["a", "b"]), QueryKey::new(["b", "a"]));
    }

    #[test]
    fn name_is_first_segment() {
        let key = QueryKey::all_tasks(&WorkspaceId::from("w1"));
        assert_eq!(key.name(), "all-tasks");
        assert_eq!(QueryKey::new(Vec::<String>::new()).name(), "");
    }

    #[test]
    fn serializes_as_array() {
        let key = QueryKey::all_tasks(&WorkspaceId::from("w1"));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["all-tasks","w1"]"#);
        let back: QueryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn display_is_bracketed_tuple() {
        let key = QueryKey::project_analytics(&ProjectId::from("p1"));
        assert_eq!(key.to_string(), r#"["project-analytics", "p1"]"#);
    }
}
