//! Concurrent board loading.
//!
//! One future per board fetches its items and the field catalogs of any
//! boards its mirror fields point at. A board that fails to load contributes
//! no items; the failure is reported and the other boards still derive.

use std::fmt;

use boardline_core::{
    Board, BoardCatalog, BoardId, BoardSnapshot, CatalogEntry, DerivationContext, FieldCatalog, TimelineSettings,
    mirror_sources,
};
use futures::future::join_all;
use tracing::{debug, info};

use crate::notify::{Notifier, Severity};
use crate::source::{BoardSource, SourceError};

/// Maximum number of top-level items fetched per board.
pub const DEFAULT_ITEM_LIMIT: usize = 500;

/// What could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The board list itself.
    Boards,
    /// Items of a board.
    Items(BoardId),
    /// Field catalog of a mirror source board.
    MirrorCatalog {
        /// Board whose mirror fields needed the catalog.
        board: BoardId,
        /// Board the catalog belongs to.
        source: BoardId,
    },
}

/// A single load failure, isolated from the rest of the refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFailure {
    /// Failed step.
    pub kind: FailureKind,
    /// Error text from the source.
    pub message: String,
}

impl BoardFailure {
    fn new(kind: FailureKind, err: &SourceError) -> Self {
        Self {
            kind,
            message: err.to_string(),
        }
    }

    /// Severity shown to the user. Missing items are errors, missing catalogs only degrade mirrors.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.kind {
            FailureKind::Boards | FailureKind::Items(_) => Severity::Error,
            FailureKind::MirrorCatalog { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for BoardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Boards => write!(f, "Failed to load boards: {}", self.message),
            FailureKind::Items(board) => write!(f, "Failed to load items for board {board}: {}", self.message),
            FailureKind::MirrorCatalog { board, source } => write!(
                f,
                "Mirror fields of board {board} unavailable, board {source} could not be read: {}",
                self.message
            ),
        }
    }
}

/// Outcome of a refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Snapshots ready for derivation.
    pub context: DerivationContext,
    /// Everything that failed to load.
    pub failures: Vec<BoardFailure>,
}

impl RefreshReport {
    /// True when every request succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load the selected boards (all boards when none are selected).
///
/// Never fails as a whole: each failure is recorded in the report and passed to
/// `notifier`, and the affected board is treated as having no items.
pub async fn refresh<S, N>(source: &S, settings: &TimelineSettings, limit: usize, notifier: &N) -> RefreshReport
where
    S: BoardSource + ?Sized,
    N: Notifier + ?Sized,
{
    let selection = (!settings.selected_boards.is_empty()).then_some(settings.selected_boards.as_slice());
    let boards = match source.fetch_boards(selection).await {
        Ok(boards) => boards,
        Err(err) => {
            let failure = BoardFailure::new(FailureKind::Boards, &err);
            notifier.notify(&failure.to_string(), failure.severity());
            return RefreshReport {
                context: DerivationContext::default(),
                failures: vec![failure],
            };
        }
    };
    debug!(boards = boards.len(), limit, "refreshing boards");

    let known: BoardCatalog = boards.iter().collect();
    let loads = boards.into_iter().map(|board| load_board(source, board, limit, &known));
    let mut snapshots = Vec::new();
    let mut failures = Vec::new();
    for (snapshot, board_failures) in join_all(loads).await {
        snapshots.push(snapshot);
        failures.extend(board_failures);
    }
    for failure in &failures {
        notifier.notify(&failure.to_string(), failure.severity());
    }

    info!(boards = snapshots.len(), failures = failures.len(), "refresh finished");
    RefreshReport {
        context: DerivationContext::new(snapshots),
        failures,
    }
}

async fn load_board<S>(source: &S, board: Board, limit: usize, known: &BoardCatalog) -> (BoardSnapshot, Vec<BoardFailure>)
where
    S: BoardSource + ?Sized,
{
    let missing: Vec<BoardId> = mirror_sources(&board)
        .into_iter()
        .filter(|id| !known.contains(id))
        .collect();
    let catalogs = join_all(missing.iter().map(|id| async move { (id, source.fetch_field_catalog(id).await) }));
    let (items, catalogs) = futures::join!(source.fetch_items(&board.id, limit), catalogs);

    let mut failures = Vec::new();
    let items = items.unwrap_or_else(|err| {
        failures.push(BoardFailure::new(FailureKind::Items(board.id.clone()), &err));
        Vec::new()
    });
    let mut fetched = BoardCatalog::new();
    for (id, result) in catalogs {
        match result {
            Ok(entry) => fetched.insert(id.clone(), entry),
            Err(err) => failures.push(BoardFailure::new(
                FailureKind::MirrorCatalog {
                    board: board.id.clone(),
                    source: id.clone(),
                },
                &err,
            )),
        }
    }
    debug!(board = %board.id, items = items.len(), catalogs = fetched.len(), "board loaded");

    let catalog = LayeredCatalog {
        known,
        fetched: &fetched,
    };
    (BoardSnapshot::resolve(board, items, &catalog), failures)
}

struct LayeredCatalog<'a> {
    known: &'a BoardCatalog,
    fetched: &'a BoardCatalog,
}

impl FieldCatalog for LayeredCatalog<'_> {
    fn board_fields(&self, board: &BoardId) -> Option<CatalogEntry> {
        self.known
            .board_fields(board)
            .or_else(|| self.fetched.board_fields(board))
    }
}
