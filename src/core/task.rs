use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::{self, Session};

/// Opaque task identity, generated once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A unit of tracked work. Sessions are owned exclusively by their task and are
/// only mutated through [TaskRegistry](super::registry::TaskRegistry) operations.
///
/// Whether a task is running is derived from its sessions instead of being
/// stored, so the "running iff an open session exists" invariant holds by
/// construction and survives serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub tags: Vec<String>,
    pub sessions: Vec<Session>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task that is already running since `at`.
    pub(crate) fn started_at(title: String, tags: Vec<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::generate(),
            title,
            tags,
            sessions: vec![Session::open_at(at)],
            created_at: at,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sessions.last().is_some_and(Session::is_open)
    }

    pub fn elapsed(&self, as_of: DateTime<Utc>) -> Duration {
        session::elapsed(&self.sessions, as_of)
    }

    pub fn elapsed_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Duration {
        session::elapsed_within(&self.sessions, from, to, as_of)
    }
}

/// Changes applied by [TaskRegistry::update_task](super::registry::TaskRegistry::update_task).
/// Unset fields keep their current value. A manual start/end pair replaces the
/// whole recorded history with one closed session of that length.
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub manual_start: Option<DateTime<Utc>>,
    pub manual_end: Option<DateTime<Utc>>,
}
