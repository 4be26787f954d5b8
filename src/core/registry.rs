use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{
    error::CoreError,
    session::{self, Session},
    tags::TagIndex,
    task::{Task, TaskId, TaskPatch},
};

/// Owns the task collection and guards the one-running-task rule.
///
/// Every mutation goes through here. Whatever needs to happen before a session
/// opens, closing the previous runner in particular, happens inside the same
/// operation, so the collection is consistent between any two calls.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    tags: TagIndex,
}

impl TaskRegistry {
    pub fn from_parts(tasks: Vec<Task>, tags: TagIndex) -> Self {
        Self { tasks, tags }
    }

    pub fn into_parts(self) -> (Vec<Task>, TagIndex) {
        (self.tasks, self.tags)
    }

    /// Tasks in display order, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn running_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|task| task.is_running())
    }

    /// Creates a task that immediately starts running. Whatever was running
    /// before is paused at the same instant, the close always happens before the
    /// new session opens.
    pub fn add_task(
        &mut self,
        title: &str,
        tags: &[String],
        at: DateTime<Utc>,
    ) -> Result<TaskId, CoreError> {
        let title = validated_title(title)?;
        let tags = normalized_tags(tags);

        self.release_active(at);

        let task = Task::started_at(title, tags.clone(), at);
        let id = task.id;
        debug!("Adding task {id} at {at}");
        self.tasks.insert(0, task);
        self.tags.register(&tags);
        Ok(id)
    }

    /// Pauses the task when it is running, otherwise starts it, pausing whichever
    /// other task was running instead. Returns whether the task runs afterwards.
    pub fn toggle(&mut self, id: TaskId, at: DateTime<Utc>) -> Result<bool, CoreError> {
        let index = self.index_of(id)?;
        if self.tasks[index].is_running() {
            session::close_session(&mut self.tasks[index].sessions, at)?;
            Ok(false)
        } else {
            self.release_active(at);
            session::open_session(&mut self.tasks[index].sessions, at)?;
            Ok(true)
        }
    }

    /// Stops the task if it is running. Stopping a stopped task changes nothing.
    pub fn stop(&mut self, id: TaskId, at: DateTime<Utc>) -> Result<(), CoreError> {
        let index = self.index_of(id)?;
        if self.tasks[index].is_running() {
            session::close_session(&mut self.tasks[index].sessions, at)?;
        }
        Ok(())
    }

    /// Applies title/tag changes and, when a manual start/end pair is given,
    /// replaces the recorded history with one closed session of that length
    /// ending at `at`.
    ///
    /// The whole patch is validated before anything is written, a rejected
    /// update leaves the task untouched.
    pub fn update_task(
        &mut self,
        id: TaskId,
        patch: TaskPatch,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let index = self.index_of(id)?;
        if self.tasks[index].is_running() {
            return Err(CoreError::InvalidState("cannot edit a running task"));
        }

        let title = patch.title.as_deref().map(validated_title).transpose()?;
        let manual_length = manual_session_length(patch.manual_start, patch.manual_end)?;

        let task = &mut self.tasks[index];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(tags) = patch.tags {
            let tags = normalized_tags(&tags);
            task.tags = tags.clone();
            self.tags.register(&tags);
        }
        if let Some(length) = manual_length {
            debug!("Replacing session history of {id} with {length}");
            task.sessions = vec![Session::closed(at - length, at)];
        }
        Ok(())
    }

    /// Removes the task together with everything it recorded.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, CoreError> {
        let index = self.index_of(id)?;
        Ok(self.tasks.remove(index))
    }

    /// Closes every open session at `at`. There is at most one in any state this
    /// registry produced, but persisted data is not trusted to uphold that, so
    /// all tasks are swept.
    pub fn release_active(&mut self, at: DateTime<Utc>) {
        for task in &mut self.tasks {
            // tasks with nothing open are left alone
            let _ = session::close_session(&mut task.sessions, at);
        }
    }

    fn index_of(&self, id: TaskId) -> Result<usize, CoreError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(CoreError::NotFound(id))
    }
}

fn validated_title(title: &str) -> Result<String, CoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::Validation("task title cannot be empty".into()));
    }
    Ok(title.to_string())
}

/// Trims entries and drops empty ones. Duplicates survive and order is kept,
/// the list stays the way the user wrote it.
fn normalized_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn manual_session_length(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Option<Duration>, CoreError> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) if end > start => Ok(Some(end - start)),
        (Some(_), Some(_)) => Err(CoreError::Validation(
            "end time must be after start time".into(),
        )),
        _ => Err(CoreError::Validation(
            "both start and end time must be set to manually log time".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use super::*;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::seconds(seconds)
    }

    fn open_session_count(registry: &TaskRegistry) -> usize {
        registry
            .tasks()
            .iter()
            .filter(|task| task.is_running())
            .count()
    }

    #[test]
    fn interrupted_tracking_accumulates_across_sessions() {
        let mut registry = TaskRegistry::default();

        let a = registry.add_task("task a", &[], at(0)).unwrap();
        let b = registry.add_task("task b", &[], at(10)).unwrap();

        // adding b paused a
        assert_eq!(registry.get(a).unwrap().elapsed(at(10)), Duration::seconds(10));
        assert!(registry.get(b).unwrap().is_running());

        registry.stop(b, at(15)).unwrap();
        assert_eq!(registry.get(b).unwrap().elapsed(at(15)), Duration::seconds(5));
        assert_eq!(open_session_count(&registry), 0);

        registry.toggle(a, at(20)).unwrap();
        assert_eq!(registry.get(a).unwrap().elapsed(at(25)), Duration::seconds(15));
        assert_eq!(open_session_count(&registry), 1);
    }

    #[test]
    fn at_most_one_session_is_open_after_any_operation() {
        let mut registry = TaskRegistry::default();

        let a = registry.add_task("a", &[], at(0)).unwrap();
        registry.add_task("b", &[], at(5)).unwrap();
        assert_eq!(open_session_count(&registry), 1);

        registry.toggle(a, at(10)).unwrap();
        assert_eq!(open_session_count(&registry), 1);
        assert!(registry.get(a).unwrap().is_running());

        registry.add_task("c", &[], at(15)).unwrap();
        assert_eq!(open_session_count(&registry), 1);
    }

    #[test]
    fn add_task_rejects_blank_titles() {
        let mut registry = TaskRegistry::default();

        let result = registry.add_task("   ", &[], at(0));

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(registry.tasks().is_empty());
    }

    #[test]
    fn add_task_normalizes_tags_without_deduplicating() {
        let mut registry = TaskRegistry::default();

        let id = registry
            .add_task(
                "task",
                &[" work ".into(), "".into(), "work".into(), "Deep".into()],
                at(0),
            )
            .unwrap();

        assert_eq!(registry.get(id).unwrap().tags, ["work", "work", "Deep"]);
        assert_eq!(registry.tag_index().as_slice(), ["work", "Deep"]);
    }

    #[test]
    fn newest_task_comes_first() {
        let mut registry = TaskRegistry::default();

        registry.add_task("first", &[], at(0)).unwrap();
        registry.add_task("second", &[], at(5)).unwrap();

        assert_eq!(registry.tasks()[0].title, "second");
        assert_eq!(registry.tasks()[1].title, "first");
    }

    #[test]
    fn stop_is_idempotent() {
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &[], at(0)).unwrap();

        registry.stop(id, at(10)).unwrap();
        let after_first = registry.get(id).unwrap().clone();

        registry.stop(id, at(20)).unwrap();
        assert_eq!(registry.get(id).unwrap(), &after_first);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut registry = TaskRegistry::default();
        let unknown = TaskId::generate();

        assert_eq!(registry.toggle(unknown, at(0)), Err(CoreError::NotFound(unknown)));
        assert_eq!(registry.stop(unknown, at(0)), Err(CoreError::NotFound(unknown)));
        assert_eq!(
            registry.delete_task(unknown).unwrap_err(),
            CoreError::NotFound(unknown)
        );
    }

    #[test]
    fn editing_a_running_task_is_refused() {
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &[], at(0)).unwrap();

        let result = registry.update_task(
            id,
            TaskPatch {
                title: Some("renamed".into()),
                ..TaskPatch::default()
            },
            at(10),
        );

        assert!(matches!(result, Err(CoreError::InvalidState(_))));
        assert_eq!(registry.get(id).unwrap().title, "task");
    }

    #[test]
    fn manual_override_replaces_the_session_history() {
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &[], at(0)).unwrap();
        registry.stop(id, at(50)).unwrap();

        registry
            .update_task(
                id,
                TaskPatch {
                    manual_start: Some(at(1000)),
                    manual_end: Some(at(4600)),
                    ..TaskPatch::default()
                },
                at(5000),
            )
            .unwrap();

        let task = registry.get(id).unwrap();
        assert_eq!(task.sessions.len(), 1);
        assert!(!task.is_running());
        // one closed hour, independent of when it is read
        assert_eq!(task.elapsed(at(5000)), Duration::seconds(3600));
        assert_eq!(task.elapsed(at(100_000)), Duration::seconds(3600));
    }

    #[test]
    fn one_sided_manual_times_are_rejected_without_mutation() {
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &[], at(0)).unwrap();
        registry.stop(id, at(50)).unwrap();
        let before = registry.get(id).unwrap().clone();

        let result = registry.update_task(
            id,
            TaskPatch {
                title: Some("renamed".into()),
                manual_start: Some(at(1000)),
                ..TaskPatch::default()
            },
            at(5000),
        );

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(registry.get(id).unwrap(), &before);
    }

    #[test]
    fn backwards_manual_range_is_rejected_without_mutation() {
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &[], at(0)).unwrap();
        registry.stop(id, at(50)).unwrap();
        let before = registry.get(id).unwrap().clone();

        let result = registry.update_task(
            id,
            TaskPatch {
                manual_start: Some(at(4600)),
                manual_end: Some(at(1000)),
                ..TaskPatch::default()
            },
            at(5000),
        );

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(registry.get(id).unwrap().elapsed(at(5000)), before.elapsed(at(5000)));
    }

    #[test]
    fn update_registers_new_tags_in_the_index() {
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &["old".into()], at(0)).unwrap();
        registry.stop(id, at(10)).unwrap();

        registry
            .update_task(
                id,
                TaskPatch {
                    tags: Some(vec!["fresh".into()]),
                    ..TaskPatch::default()
                },
                at(20),
            )
            .unwrap();

        assert_eq!(registry.get(id).unwrap().tags, ["fresh"]);
        // replaced tags stay in the index for suggestions
        assert_eq!(registry.tag_index().as_slice(), ["old", "fresh"]);
    }

    #[test]
    fn deleting_the_running_task_leaves_a_consistent_registry() {
        let mut registry = TaskRegistry::default();
        registry.add_task("stopped", &[], at(0)).unwrap();
        let running = registry.add_task("running", &[], at(10)).unwrap();

        let removed = registry.delete_task(running).unwrap();

        assert!(removed.is_running());
        assert_eq!(registry.tasks().len(), 1);
        assert_eq!(open_session_count(&registry), 0);
        assert!(registry.running_task().is_none());
    }

    #[test]
    fn release_active_repairs_states_with_several_runners() {
        // malformed persisted data could contain two open sessions
        let tasks = vec![
            Task::started_at("a".into(), vec![], at(0)),
            Task::started_at("b".into(), vec![], at(5)),
        ];
        let mut registry = TaskRegistry::from_parts(tasks, TagIndex::default());
        assert_eq!(open_session_count(&registry), 2);

        registry.add_task("c", &[], at(10)).unwrap();

        assert_eq!(open_session_count(&registry), 1);
    }
}
