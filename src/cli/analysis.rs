use ansi_term::Colour;
use anyhow::{anyhow, Result};
use chrono::Local;
use chrono_english::{parse_date_string, Dialect};

use crate::{
    core::analysis::{analyze, available_days, AnalysisReport, Period},
    storage::store::TaskStore,
    utils::{
        clock::Clock,
        percentage::duration_percentage,
        time::{format_day, format_duration},
    },
};

use super::tasks::load_registry;

/// Command to process `analysis`. Produces the time spent in the selected
/// period, split by tag and by task.
pub async fn process_analysis_command(
    store: &TaskStore,
    clock: &dyn Clock,
    day: &str,
) -> Result<()> {
    let registry = load_registry(store).await?;
    let period = parse_period(day, clock)?;
    let report = analyze(registry.tasks(), period, clock.time());

    if report.tasks.is_empty() {
        println!("No tasks tracked for this period.");
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

/// Command to process `days`. Lists the selectable days, newest first.
pub async fn process_days_command(store: &TaskStore) -> Result<()> {
    let registry = load_registry(store).await?;
    let days = available_days(registry.tasks());

    if days.is_empty() {
        println!("No days tracked yet.");
        return Ok(());
    }

    for day in days {
        println!("{}", format_day(day));
    }
    Ok(())
}

/// Turns the user supplied selector into a [Period]. "today" and "all" are
/// always understood, anything else goes through natural date parsing.
fn parse_period(day: &str, clock: &dyn Clock) -> Result<Period> {
    let now = clock.time().with_timezone(&Local);
    match day.trim().to_lowercase().as_str() {
        "all" | "all time" | "all-time" => Ok(Period::AllTime),
        "today" => Ok(Period::Day(now.date_naive())),
        other => {
            let parsed = parse_date_string(other, now, Dialect::Uk)
                .map_err(|e| anyhow!("can't parse \"{other}\" as a day: {e}"))?;
            Ok(Period::Day(parsed.date_naive()))
        }
    }
}

fn print_report(report: &AnalysisReport) {
    println!("{}", Colour::Cyan.bold().paint("Summary"));
    println!("{}", format_duration(report.total));
    println!();

    println!("{}", Colour::Cyan.bold().paint("Time by tag"));
    for usage in &report.by_tag {
        println!(
            "{}\t{}\t{}",
            format_duration(usage.duration),
            duration_percentage(usage.duration, report.total),
            usage.tag
        );
    }
    println!();

    println!("{}", Colour::Cyan.bold().paint("Task breakdown"));
    for usage in &report.tasks {
        println!("{}\t{}", format_duration(usage.duration), usage.title);
    }
}
