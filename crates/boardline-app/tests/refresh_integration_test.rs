//! Integration tests for multi-board refresh and derivation.
//!
//! These tests drive [`TimelineService`] through a source that fails for some
//! boards and verify that the remaining boards still derive, lay out and persist.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use boardline_app::{
    BoardSource, CollectingNotifier, FailureKind, FileSettingsStore, JsonSnapshotSource, Severity, SourceError,
    TimelineService,
};
use boardline_core::{
    Board, BoardId, CatalogEntry, DEFAULT_COLOR, DragController, DragKind, Item, ItemId, TimelineSettings,
};
use tempfile::TempDir;
use time::macros::date;

const SNAPSHOT: &str = r##"{
    "boards": [
        {
            "id": "1",
            "name": "Delivery",
            "fields": [
                {"id": "phase", "title": "Phase", "type": "mirror",
                 "settings": "{\"displayed_linked_columns\":{\"9\":[\"status\"]}}"}
            ],
            "groups": [{"id": "g1", "title": "Design", "color": "#ff0000", "position": 0}],
            "items": [
                {
                    "id": "a",
                    "name": "Wireframes",
                    "group_id": "g1",
                    "fields": [
                        {"id": "timeline", "title": "Timeline", "type": "timeline",
                         "value": "{\"from\":\"2024-01-10\",\"to\":\"2024-01-15\"}"},
                        {"id": "pct", "title": "Progress", "type": "numbers", "value": "\"150\""}
                    ],
                    "subitems": [
                        {"id": "a1", "name": "Review", "fields": [
                            {"id": "due", "title": "Due", "type": "date", "value": "{\"date\":\"2024-01-16\"}"}
                        ]}
                    ]
                }
            ]
        },
        {"id": "2", "name": "Broken", "items": [{"id": "x", "name": "Never seen"}]},
        {
            "id": "3",
            "name": "Ops",
            "groups": [{"id": "g9", "title": "Ops"}],
            "items": [
                {"id": "c", "name": "Rollout", "group_id": "g9", "fields": [
                    {"id": "timeline", "title": "Timeline", "type": "timeline",
                     "value": "{\"from\":\"2024-01-20\",\"to\":\"2024-01-22\"}"}
                ]}
            ]
        }
    ]
}"##;

/// Source that fails item fetches for board 2 and catalog fetches for board 9.
struct FlakySource {
    inner: JsonSnapshotSource,
}

impl BoardSource for FlakySource {
    async fn fetch_boards(&self, ids: Option<&[BoardId]>) -> Result<Vec<Board>, SourceError> {
        self.inner.fetch_boards(ids).await
    }

    async fn fetch_items(&self, board: &BoardId, limit: usize) -> Result<Vec<Item>, SourceError> {
        if board.as_str() == "2" {
            return Err(SourceError::Remote("rate limited".into()));
        }
        self.inner.fetch_items(board, limit).await
    }

    async fn fetch_field_catalog(&self, board: &BoardId) -> Result<CatalogEntry, SourceError> {
        if board.as_str() == "9" {
            return Err(SourceError::Remote("forbidden".into()));
        }
        self.inner.fetch_field_catalog(board).await
    }
}

fn flaky_service(dir: &TempDir) -> TimelineService<FlakySource, FileSettingsStore, CollectingNotifier> {
    let inner = JsonSnapshotSource::from_json(SNAPSHOT).expect("parse snapshot");
    TimelineService::new(
        FlakySource { inner },
        FileSettingsStore::from_workdir(dir.path()),
        CollectingNotifier::new(),
    )
}

#[tokio::test]
async fn failing_boards_do_not_block_the_others() {
    let dir = TempDir::with_prefix("boardline-refresh-").expect("create temp dir");
    let service = flaky_service(&dir);
    let settings = TimelineSettings {
        show_subitems: true,
        ..TimelineSettings::default()
    };

    let failures = service.refresh(&settings).await;
    let kinds: Vec<_> = failures.iter().map(|failure| failure.kind.clone()).collect();
    assert_eq!(
        kinds,
        [
            FailureKind::MirrorCatalog {
                board: "1".into(),
                source: "9".into(),
            },
            FailureKind::Items("2".into()),
        ]
    );

    let tasks = service.tasks(&settings).await;
    let ids: Vec<_> = tasks.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, ["a", "a1", "c"]);

    let parent = &tasks[0];
    assert!((parent.progress - 100.0).abs() < f64::EPSILON);
    assert_eq!(parent.color, "#ff0000");
    assert_eq!(parent.group, "Design");
    assert!(parent.mirror_data.is_empty());

    let child = &tasks[1];
    assert_eq!(child.parent_id, Some(ItemId::from("a")));
    assert_eq!(child.group, "Design");
    assert_eq!(tasks[2].color, DEFAULT_COLOR);
}

#[tokio::test]
async fn failures_carry_severity_and_source_message() {
    let dir = TempDir::with_prefix("boardline-notify-").expect("create temp dir");
    let service = flaky_service(&dir);
    let failures = service.refresh(&TimelineSettings::default()).await;
    assert_eq!(failures.len(), 2);

    let severities: Vec<_> = failures.iter().map(boardline_app::BoardFailure::severity).collect();
    assert_eq!(severities, [Severity::Warning, Severity::Error]);
    assert!(failures[1].to_string().contains("rate limited"));
}

#[tokio::test]
async fn persisted_settings_drive_the_next_derivation() {
    let dir = TempDir::with_prefix("boardline-settings-").expect("create temp dir");
    let service = flaky_service(&dir);
    service.update_setting("selectedBoards", "3").expect("select board");
    service.update_setting("sortByColumn", "start_date").expect("sort");

    let reopened = flaky_service(&dir);
    let settings = reopened.settings();
    assert_eq!(settings.selected_boards, [BoardId::from("3")]);

    assert!(reopened.refresh(&settings).await.is_empty());
    let (tasks, layout) = reopened.layout(&settings, 1200.0).await;
    assert_eq!(tasks.len(), 1);
    let window = layout.window.expect("window");
    assert_eq!(window.start, date!(2024 - 01 - 13));
    assert_eq!(window.end, date!(2024 - 01 - 29));
}

#[tokio::test]
async fn finished_drag_moves_the_bar() {
    let dir = TempDir::with_prefix("boardline-drag-").expect("create temp dir");
    let service = flaky_service(&dir);
    let settings = TimelineSettings::default();
    let _ = service.refresh(&settings).await;

    let (tasks, layout) = service.layout(&settings, 1200.0).await;
    let window = layout.window.expect("window");
    let task = tasks.iter().find(|task| task.id.as_str() == "c").expect("task c");

    let mut controller = DragController::new();
    controller
        .begin(task, DragKind::Move, 500.0, window.pixels_per_day)
        .expect("begin drag");
    let update = controller
        .end(window.pixels_per_day.mul_add(3.0, 500.0))
        .expect("drag result");
    service.apply_drag(update).await;

    let tasks = service.tasks(&settings).await;
    let moved = tasks.iter().find(|task| task.id.as_str() == "c").expect("task c");
    assert_eq!(moved.range.start, Some(date!(2024 - 01 - 23)));
    assert_eq!(moved.range.end, Some(date!(2024 - 01 - 25)));
}
