//! Application layer for boardline.
//!
//! This crate connects the pure derivation and layout logic in `boardline-core`
//! to board sources, persisted settings and user notifications.

pub mod notify;
pub mod refresh;
pub mod service;
pub mod settings;
pub mod source;

// Re-exports for convenience
pub use notify::{CollectingNotifier, Notifier, Severity, TracingNotifier};
pub use refresh::{BoardFailure, DEFAULT_ITEM_LIMIT, FailureKind, RefreshReport, refresh};
pub use service::TimelineService;
pub use settings::{FileSettingsStore, SettingsError, SettingsStore, apply_setting};
pub use source::{BoardEntry, BoardSource, JsonSnapshotSource, SnapshotFile, SourceError};
