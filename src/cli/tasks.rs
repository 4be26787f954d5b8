use ansi_term::Colour;
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local, NaiveTime, Utc};
use clap::Parser;

use crate::{
    core::{
        registry::TaskRegistry,
        task::{Task, TaskId, TaskPatch},
    },
    storage::store::TaskStore,
    utils::{clock::Clock, time::format_duration},
};

pub async fn process_add_command(
    store: &TaskStore,
    clock: &dyn Clock,
    title: &str,
    tags: Vec<String>,
) -> Result<()> {
    let mut registry = load_registry(store).await?;
    let id = registry.add_task(title, &tags, clock.time())?;
    save_registry(store, &registry).await?;

    if let Some(task) = registry.get(id) {
        println!("Started {} ({})", task.title, short_id(&task.id));
    }
    Ok(())
}

pub async fn process_toggle_command(
    store: &TaskStore,
    clock: &dyn Clock,
    reference: &str,
) -> Result<()> {
    let mut registry = load_registry(store).await?;
    let id = resolve_task(&registry, reference)?;
    let now = clock.time();
    let running = registry.toggle(id, now)?;
    save_registry(store, &registry).await?;

    if let Some(task) = registry.get(id) {
        if running {
            println!("Started {}", task.title);
        } else {
            println!("Paused {} at {}", task.title, format_duration(task.elapsed(now)));
        }
    }
    Ok(())
}

pub async fn process_stop_command(
    store: &TaskStore,
    clock: &dyn Clock,
    reference: &str,
) -> Result<()> {
    let mut registry = load_registry(store).await?;
    let id = resolve_task(&registry, reference)?;
    let now = clock.time();
    registry.stop(id, now)?;
    save_registry(store, &registry).await?;

    if let Some(task) = registry.get(id) {
        println!("Stopped {} at {}", task.title, format_duration(task.elapsed(now)));
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub struct EditCommand {
    #[arg(help = "Task id or an unambiguous prefix of one")]
    task: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, value_delimiter = ',')]
    tags: Option<Vec<String>>,
    #[arg(
        long,
        help = "Manual time entry start as HH:MM on today's date. Together with --end this replaces the recorded history"
    )]
    start: Option<String>,
    #[arg(long, help = "Manual time entry end as HH:MM on today's date")]
    end: Option<String>,
}

pub async fn process_edit_command(
    store: &TaskStore,
    clock: &dyn Clock,
    EditCommand {
        task,
        title,
        tags,
        start,
        end,
    }: EditCommand,
) -> Result<()> {
    let mut registry = load_registry(store).await?;
    let id = resolve_task(&registry, &task)?;

    // the registry refuses this too, checking here gives a friendlier message
    if registry.get(id).is_some_and(Task::is_running) {
        bail!("pause or stop the task before editing it");
    }

    let now = clock.time();
    let patch = TaskPatch {
        title,
        tags,
        manual_start: start.as_deref().map(|v| manual_moment(v, now)).transpose()?,
        manual_end: end.as_deref().map(|v| manual_moment(v, now)).transpose()?,
    };

    registry.update_task(id, patch, now)?;
    save_registry(store, &registry).await?;

    if let Some(task) = registry.get(id) {
        println!("Updated {}", task.title);
    }
    Ok(())
}

pub async fn process_delete_command(store: &TaskStore, reference: &str) -> Result<()> {
    let mut registry = load_registry(store).await?;
    let id = resolve_task(&registry, reference)?;
    let removed = registry.delete_task(id)?;
    save_registry(store, &registry).await?;

    println!("Deleted {}", removed.title);
    Ok(())
}

pub async fn process_list_command(store: &TaskStore, clock: &dyn Clock) -> Result<()> {
    let registry = load_registry(store).await?;
    if registry.tasks().is_empty() {
        println!("No tasks tracked yet.");
        return Ok(());
    }

    let now = clock.time();
    for task in registry.tasks() {
        println!("{}", render_task_line(task, now));
    }
    Ok(())
}

pub async fn process_tags_command(store: &TaskStore, partial: &str, entered: &str) -> Result<()> {
    let registry = load_registry(store).await?;
    for tag in registry.tag_index().suggest(partial, entered) {
        println!("{tag}");
    }
    Ok(())
}

pub(crate) async fn load_registry(store: &TaskStore) -> Result<TaskRegistry> {
    let tasks = store.load_tasks().await?;
    let tags = store.load_tags().await?;
    Ok(TaskRegistry::from_parts(tasks, tags))
}

pub(crate) async fn save_registry(store: &TaskStore, registry: &TaskRegistry) -> Result<()> {
    store.save_tasks(registry.tasks()).await?;
    store.save_tags(registry.tag_index()).await?;
    Ok(())
}

/// Resolves a full task id or an unambiguous prefix of one.
fn resolve_task(registry: &TaskRegistry, reference: &str) -> Result<TaskId> {
    if let Ok(id) = reference.parse::<TaskId>() {
        return Ok(id);
    }

    let matches = registry
        .tasks()
        .iter()
        .filter(|task| task.id.to_string().starts_with(reference))
        .map(|task| task.id)
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no task id starts with \"{reference}\""),
        _ => bail!("task id \"{reference}\" is ambiguous"),
    }
}

/// Interprets a `HH:MM` (or `HH:MM:SS`) manual entry on the local date of `now`,
/// the way the edit form always has.
fn manual_moment(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| anyhow!("can't parse \"{value}\" as a time of day"))?;

    let moment = now.with_timezone(&Local).with_time(time).unwrap();
    Ok(moment.with_timezone(&Utc))
}

fn short_id(id: &TaskId) -> String {
    id.to_string().chars().take(8).collect()
}

fn render_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", task.tags.join(", "))
    };
    let line = format!(
        "{}  {}  {}{}",
        short_id(&task.id),
        format_duration(task.elapsed(now)),
        task.title,
        tags
    );

    if task.is_running() {
        Colour::Green.bold().paint(format!("{line}  (running)")).to_string()
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::core::registry::TaskRegistry;

    use super::{manual_moment, render_task_line, resolve_task};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    #[test]
    fn prefixes_resolve_to_exactly_one_task() {
        let start = Utc.from_utc_datetime(&TEST_START_DATE);
        let mut registry = TaskRegistry::default();
        let id = registry.add_task("task", &[], start).unwrap();

        let prefix = id.to_string().chars().take(12).collect::<String>();
        assert_eq!(resolve_task(&registry, &prefix).unwrap(), id);
        assert_eq!(resolve_task(&registry, &id.to_string()).unwrap(), id);
        assert!(resolve_task(&registry, "zzzz").is_err());
        // every id matches the empty prefix once two tasks exist
        registry.add_task("other", &[], start).unwrap();
        assert!(resolve_task(&registry, "").is_err());
    }

    #[test]
    fn manual_entries_land_on_the_local_date_of_now() {
        let now = Local
            .with_ymd_and_hms(2018, 7, 4, 15, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        let moment = manual_moment("09:30", now).unwrap();

        let local = moment.with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2018, 7, 4).unwrap());
        assert_eq!(local.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(manual_moment("quarter past", now).is_err());
    }

    #[test]
    fn stopped_tasks_render_without_highlighting() {
        let start = Utc.from_utc_datetime(&TEST_START_DATE);
        let mut registry = TaskRegistry::default();
        let id = registry
            .add_task("write report", &["work".into()], start)
            .unwrap();
        registry.stop(id, start + Duration::seconds(90)).unwrap();

        let line = render_task_line(registry.get(id).unwrap(), start + Duration::seconds(500));

        assert_eq!(
            line,
            format!("{}  00:01:30  write report  [work]", &id.to_string()[..8])
        );
    }
}
