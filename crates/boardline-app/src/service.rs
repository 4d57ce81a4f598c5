//! Service façade over a board source, persisted settings and notifications.

use std::collections::HashMap;

use anyhow::{Context, Result};
use boardline_core::{DateRange, DerivationContext, DragUpdate, ItemId, LayoutResult, Task, TimelineSettings, compute_layout};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use crate::notify::{Notifier, Severity};
use crate::refresh::{BoardFailure, DEFAULT_ITEM_LIMIT, refresh};
use crate::settings::{SettingsStore, apply_setting};
use crate::source::BoardSource;

#[derive(Debug, Default)]
struct ServiceState {
    context: DerivationContext,
    overrides: HashMap<ItemId, DateRange>,
    last_refresh: Option<OffsetDateTime>,
}

/// Service façade tying a board source, settings persistence and notifications together.
pub struct TimelineService<S, St, N> {
    source: S,
    store: St,
    notifier: N,
    item_limit: usize,
    state: Mutex<ServiceState>,
}

impl<S, St, N> TimelineService<S, St, N>
where
    S: BoardSource,
    St: SettingsStore,
    N: Notifier,
{
    /// Service with the default item limit and an empty cache.
    pub fn new(source: S, store: St, notifier: N) -> Self {
        Self {
            source,
            store,
            notifier,
            item_limit: DEFAULT_ITEM_LIMIT,
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// Override the per-board item limit.
    #[must_use]
    pub const fn with_item_limit(mut self, limit: usize) -> Self {
        self.item_limit = limit;
        self
    }

    /// Stored settings, or defaults when none are stored or they cannot be read.
    #[must_use]
    pub fn settings(&self) -> TimelineSettings {
        match self.store.load() {
            Ok(settings) => settings.unwrap_or_default(),
            Err(err) => {
                self.notifier
                    .notify(&format!("Using default settings: {err}"), Severity::Warning);
                TimelineSettings::default()
            }
        }
    }

    /// Persist `settings`.
    ///
    /// # Errors
    /// Returns an error when the settings store rejects the write.
    pub fn save_settings(&self, settings: &TimelineSettings) -> Result<()> {
        self.store.save(settings).context("failed to save settings")
    }

    /// Change one stored option and return the updated settings.
    ///
    /// # Errors
    /// Returns an error for unknown keys, invalid values, or a failed write.
    pub fn update_setting(&self, key: &str, value: &str) -> Result<TimelineSettings> {
        let mut settings = self.settings();
        apply_setting(&mut settings, key, value)?;
        self.save_settings(&settings)?;
        Ok(settings)
    }

    /// Reload every selected board, replacing the cached snapshots.
    ///
    /// Local date edits are discarded. Returns the failures of this refresh, which
    /// have already been passed to the notifier.
    pub async fn refresh(&self, settings: &TimelineSettings) -> Vec<BoardFailure> {
        let report = refresh(&self.source, settings, self.item_limit, &self.notifier).await;
        let mut state = self.state.lock().await;
        state.context = report.context;
        state.overrides.clear();
        state.last_refresh = Some(OffsetDateTime::now_utc());
        drop(state);
        report.failures
    }

    /// When the last refresh completed.
    pub async fn last_refresh(&self) -> Option<OffsetDateTime> {
        self.state.lock().await.last_refresh
    }

    /// Display-ordered tasks from the cached snapshots, with local date edits applied.
    pub async fn tasks(&self, settings: &TimelineSettings) -> Vec<Task> {
        let state = self.state.lock().await;
        state.context.derive_with(settings, &state.overrides)
    }

    /// Tasks together with their timeline layout.
    pub async fn layout(&self, settings: &TimelineSettings, viewport_width: f64) -> (Vec<Task>, LayoutResult) {
        let tasks = self.tasks(settings).await;
        let layout = compute_layout(&tasks, viewport_width);
        (tasks, layout)
    }

    /// Keep the range produced by a finished drag until the next refresh.
    pub async fn apply_drag(&self, update: DragUpdate) {
        debug!(task = %update.task_id, "recording dragged range");
        self.state
            .lock()
            .await
            .overrides
            .insert(update.task_id, update.range);
    }
}
