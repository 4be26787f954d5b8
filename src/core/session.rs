use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::CoreError;

/// One contiguous interval during which a task was actively timed. An unset end
/// means the session is still open and the owning task is running.
///
/// Closed sessions are immutable. The only mutation a session list ever sees is
/// appending a new open session and writing the end of the last one.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub end: Option<DateTime<Utc>>,
}

impl Session {
    pub fn open_at(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length of the session, reading an open session as if it ended at `as_of`.
    /// An `as_of` before the start counts as zero.
    pub fn length(&self, as_of: DateTime<Utc>) -> Duration {
        (self.end.unwrap_or(as_of) - self.start).max(Duration::zero())
    }

    /// Length of the part of the session that falls inside `[from, to)`.
    /// Sessions wholly outside the window contribute zero.
    pub fn length_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Duration {
        let end = self.end.unwrap_or(as_of);
        (end.min(to) - self.start.max(from)).max(Duration::zero())
    }
}

/// Appends a new open session starting at `at`. The caller must have closed the
/// previous session first; anything else means the exclusive-running discipline
/// broke down somewhere upstream.
pub fn open_session(sessions: &mut Vec<Session>, at: DateTime<Utc>) -> Result<(), CoreError> {
    if sessions.last().is_some_and(Session::is_open) {
        return Err(CoreError::InvariantViolation(
            "task already has an open session",
        ));
    }
    sessions.push(Session::open_at(at));
    Ok(())
}

/// Closes the last session at `at`. Historical sessions are never touched.
/// A close at or before the start recorded no time, so the session is dropped
/// instead, keeping every closed entry spanning a positive interval.
pub fn close_session(sessions: &mut Vec<Session>, at: DateTime<Utc>) -> Result<(), CoreError> {
    match sessions.last_mut() {
        Some(session) if session.is_open() => {
            if at > session.start {
                session.end = Some(at);
            } else {
                sessions.pop();
            }
            Ok(())
        }
        _ => Err(CoreError::NoOpenSession),
    }
}

/// Total tracked time across all sessions as of `as_of`. Pure, so it can back
/// both the live one-second display and historical analysis.
pub fn elapsed(sessions: &[Session], as_of: DateTime<Utc>) -> Duration {
    sessions
        .iter()
        .fold(Duration::zero(), |acc, session| {
            acc + session.length(as_of)
        })
}

/// Like [elapsed], with every session clipped to `[from, to)` first.
pub fn elapsed_within(
    sessions: &[Session],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> Duration {
    sessions.iter().fold(Duration::zero(), |acc, session| {
        acc + session.length_within(from, to, as_of)
    })
}
