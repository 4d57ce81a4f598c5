//! CLI entry point for boardline.

use std::path::{Path, PathBuf};

use anyhow::Result;
use boardline_app::{FileSettingsStore, JsonSnapshotSource, TimelineService, TracingNotifier};
use boardline_core::DragKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Board items as a timeline.
#[derive(Parser, Debug)]
#[command(
    name = "boardline",
    version,
    about = "boardline: derive tasks from board items and lay them out on a timeline"
)]
struct Cli {
    /// JSON board snapshot to read items from.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Directory holding `.boardline/settings.toml` (defaults to current).
    #[arg(long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print derived tasks, grouped and ordered.
    Tasks {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the timeline window and bar geometry.
    Layout {
        /// Viewport width in pixels.
        #[arg(long, default_value_t = 1440.0)]
        width: f64,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Replay a drag gesture on one bar and print the resulting range.
    Drag {
        #[arg(long)]
        task: String,
        /// move, resize-start or resize-end.
        #[arg(long, default_value = "move")]
        kind: DragKind,
        /// Horizontal pointer travel in pixels.
        #[arg(long, allow_negative_numbers = true)]
        dx: f64,
        /// Viewport width in pixels.
        #[arg(long, default_value_t = 1440.0)]
        width: f64,
    },

    /// Show or change persisted settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the current settings.
    Show,
    /// Change one setting; an empty value clears it.
    Set {
        #[arg(long)]
        key: String,
        #[arg(long, default_value = "")]
        value: String,
    },
}

fn main() -> Result<()> {
    let Cli { snapshot, dir, cmd } = Cli::parse();
    install_tracing();

    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    let source = load_source(snapshot.as_deref(), &cmd)?;
    let service = TimelineService::new(source, FileSettingsStore::from_workdir(&dir), TracingNotifier);
    tokio::runtime::Runtime::new()?.block_on(commands::run(cmd, &service))
}

fn load_source(snapshot: Option<&Path>, cmd: &Command) -> Result<JsonSnapshotSource> {
    match snapshot {
        Some(path) => Ok(JsonSnapshotSource::open(path)?),
        None if needs_snapshot(cmd) => anyhow::bail!("--snapshot <file> is required for this command"),
        None => Ok(JsonSnapshotSource::default()),
    }
}

const fn needs_snapshot(cmd: &Command) -> bool {
    !matches!(cmd, Command::Settings { .. })
}

fn install_tracing() {
    // RUST_LOG is honoured; INFO by default.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drag_command() {
        let cli = Cli::parse_from([
            "boardline",
            "--snapshot",
            "boards.json",
            "drag",
            "--task",
            "123",
            "--kind",
            "resize-end",
            "--dx",
            "-40",
        ]);

        assert_eq!(cli.snapshot, Some(PathBuf::from("boards.json")));
        match cli.cmd {
            Command::Drag { task, kind, dx, width } => {
                assert_eq!(task, "123");
                assert_eq!(kind, DragKind::ResizeEnd);
                assert!((dx + 40.0).abs() < f64::EPSILON);
                assert!((width - 1440.0).abs() < f64::EPSILON);
            }
            _ => panic!("expected drag command"),
        }
    }

    #[test]
    fn parse_settings_set_command() {
        let cli = Cli::parse_from([
            "boardline",
            "--dir",
            "/tmp/project",
            "settings",
            "set",
            "--key",
            "sortDirection",
            "--value",
            "desc",
        ]);

        match cli.cmd {
            Command::Settings {
                action: SettingsAction::Set { key, value },
            } => {
                assert_eq!(key, "sortDirection");
                assert_eq!(value, "desc");
            }
            _ => panic!("expected settings set command"),
        }
    }

    #[test]
    fn rejects_unknown_drag_kind() {
        let parsed = Cli::try_parse_from(["boardline", "drag", "--task", "1", "--kind", "stretch", "--dx", "5"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn settings_commands_work_without_snapshot() {
        let settings = Command::Settings {
            action: SettingsAction::Show,
        };
        assert!(!needs_snapshot(&settings));
        assert!(load_source(None, &settings).is_ok());
        assert!(load_source(None, &Command::Tasks { json: false }).is_err());
    }
}
