//! Command handlers for the CLI.

use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use boardline_app::{BoardSource, Notifier, SettingsStore, TimelineService};
use boardline_core::{DateRange, DragController, DragKind, LayoutResult, Task, TimelineSettings};

use crate::{Command, SettingsAction};

pub async fn run<S, St, N>(command: Command, service: &TimelineService<S, St, N>) -> Result<()>
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    match command {
        Command::Tasks { json } => handle_tasks(service, json).await,
        Command::Layout { width, json } => handle_layout(service, width, json).await,
        Command::Drag { task, kind, dx, width } => handle_drag(service, &task, kind, dx, width).await,
        Command::Settings { action } => handle_settings(service, action),
    }
}

async fn refreshed_settings<S, St, N>(service: &TimelineService<S, St, N>) -> TimelineSettings
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    let settings = service.settings();
    let failures = service.refresh(&settings).await;
    if !failures.is_empty() {
        eprintln!("{} board request(s) failed; results may be incomplete", failures.len());
    }
    settings
}

async fn handle_tasks<S, St, N>(service: &TimelineService<S, St, N>, json: bool) -> Result<()>
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    let settings = refreshed_settings(service).await;
    let tasks = service.tasks(&settings).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    let mut current_group: Option<&str> = None;
    for task in &tasks {
        if current_group != Some(task.group.as_str()) {
            println!("{}", task.group);
            current_group = Some(task.group.as_str());
        }
        let indent = if task.is_root() { "  " } else { "    " };
        println!(
            "{indent}{}  {}  {}  {:.0}%  [{}]",
            task.id,
            task.name,
            format_range(&task.range),
            task.progress,
            task.board_name
        );
    }
    Ok(())
}

async fn handle_layout<S, St, N>(service: &TimelineService<S, St, N>, width: f64, json: bool) -> Result<()>
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    let settings = refreshed_settings(service).await;
    let (tasks, layout) = service.layout(&settings, width).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }
    print_layout(&tasks, &layout);
    Ok(())
}

async fn handle_drag<S, St, N>(
    service: &TimelineService<S, St, N>,
    task_id: &str,
    kind: DragKind,
    dx: f64,
    width: f64,
) -> Result<()>
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    let settings = refreshed_settings(service).await;
    let (tasks, layout) = service.layout(&settings, width).await;
    let window = layout
        .window
        .ok_or_else(|| anyhow!("no task has both a start and an end date"))?;
    let task = tasks
        .iter()
        .find(|task| task.id.as_str() == task_id)
        .ok_or_else(|| anyhow!("Task not found: {task_id}"))?;

    let mut controller = DragController::new();
    controller
        .begin(task, kind, 0.0, window.pixels_per_day)
        .with_context(|| format!("cannot drag task {task_id}"))?;
    let Some(update) = controller.end(dx) else {
        bail!("drag ended without a result");
    };
    println!(
        "{}: {} -> {}",
        task.id,
        format_range(&task.range),
        format_range(&update.range)
    );

    service.apply_drag(update).await;
    let (tasks, layout) = service.layout(&settings, width).await;
    print_layout(&tasks, &layout);
    Ok(())
}

fn handle_settings<S, St, N>(service: &TimelineService<S, St, N>, action: SettingsAction) -> Result<()>
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    let settings = match action {
        SettingsAction::Show => service.settings(),
        SettingsAction::Set { key, value } => service.update_setting(&key, &value)?,
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn print_layout(tasks: &[Task], layout: &LayoutResult) {
    let Some(window) = layout.window else {
        println!("Nothing to lay out.");
        return;
    };
    println!(
        "{} .. {}  ({} days, {:.2} px/day, {:.0} px)",
        window.start,
        window.end,
        window.day_count(),
        window.pixels_per_day,
        layout.total_width_px
    );
    for bar in &layout.bars {
        let name = tasks.get(bar.row).map_or("", |task| task.name.as_str());
        println!(
            "  row {:>3}  {:<12} x={:>8.1} w={:>8.1}  {name}",
            bar.row, bar.task_id, bar.geometry.offset_px, bar.geometry.width_px
        );
    }
}

fn format_range(range: &DateRange) -> String {
    format!("{} .. {}", format_day(range.start), format_day(range.end))
}

fn format_day<D: fmt::Display>(day: Option<D>) -> String {
    day.map_or_else(|| "?".to_owned(), |day| day.to_string())
}
