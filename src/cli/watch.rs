use std::{io::Write, time::Duration};

use ansi_term::Colour;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    core::task::Task,
    storage::store::TaskStore,
    utils::{
        clock::Clock,
        time::{day_bounds, format_duration},
    },
};

use super::tasks::load_registry;

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Command to process `watch`. Keeps a status line for the running task on
/// screen until interrupted. Rendering only reads session data, the displayed
/// elapsed time is recomputed from scratch on every tick.
pub async fn process_watch_command(store: &TaskStore, clock: &dyn Clock) -> Result<()> {
    let registry = load_registry(store).await?;
    let Some(task) = registry.running_task() else {
        println!("No task is running.");
        return Ok(());
    };

    let cancellation = CancellationToken::new();
    let (_, render_result) = tokio::join!(
        detect_interrupt(cancellation.clone()),
        render_loop(task, clock, cancellation.clone()),
    );
    render_result
}

async fn detect_interrupt(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
    };
}

/// Redraws the status line once per second until cancelled.
async fn render_loop(
    task: &Task,
    clock: &dyn Clock,
    cancellation: CancellationToken,
) -> Result<()> {
    let mut tick = clock.instant();
    loop {
        print!("\r{}", status_line(task, clock.time()));
        std::io::stdout().flush()?;

        tick += REFRESH_INTERVAL;
        select! {
            // Cancelation stops the redraw loop, nothing needs flushing beyond a
            // final newline because the loop never mutates any state.
            _ = cancellation.cancelled() => {
                println!();
                return Ok(());
            }
            _ = clock.sleep_until(tick) => ()
        }
    }
}

fn status_line(task: &Task, now: DateTime<Utc>) -> String {
    let (day_start, day_end) = day_bounds(now.with_timezone(&Local).date_naive());
    format!(
        "{}  {} today  {} total",
        Colour::Green.bold().paint(task.title.as_str()),
        format_duration(task.elapsed_within(day_start, day_end, now)),
        format_duration(task.elapsed(now)),
    )
}
