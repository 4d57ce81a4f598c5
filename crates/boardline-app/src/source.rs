//! Board data sources.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use boardline_core::{Board, BoardId, CatalogEntry, Item};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while fetching board data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Snapshot file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Snapshot contents are not valid JSON.
    #[error("failed to parse board snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// The requested board is not known to the source.
    #[error("board {0} not found")]
    BoardNotFound(BoardId),
    /// Remote backend rejected or failed the request.
    #[error("remote request failed: {0}")]
    Remote(String),
}

/// Read-only access to boards, their items and field catalogs.
#[allow(async_fn_in_trait)]
pub trait BoardSource: Send + Sync {
    /// Fetch board metadata. `None` fetches every board the source knows.
    ///
    /// # Errors
    /// Returns a source-specific error when the boards cannot be listed.
    async fn fetch_boards(&self, ids: Option<&[BoardId]>) -> Result<Vec<Board>, SourceError>;

    /// Fetch up to `limit` top-level items of a board, subitems included.
    ///
    /// # Errors
    /// Returns a source-specific error when the items cannot be read.
    async fn fetch_items(&self, board: &BoardId, limit: usize) -> Result<Vec<Item>, SourceError>;

    /// Fetch the field catalog of a board, used to resolve mirror fields.
    ///
    /// # Errors
    /// Returns a source-specific error when the board is unknown or unreachable.
    async fn fetch_field_catalog(&self, board: &BoardId) -> Result<CatalogEntry, SourceError>;
}

/// On-disk snapshot layout: `{"boards":[{...board, "items":[...]}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Boards with their items.
    #[serde(default)]
    pub boards: Vec<BoardEntry>,
}

/// One board of a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    /// Board metadata.
    #[serde(flatten)]
    pub board: Board,
    /// Top-level items.
    #[serde(default)]
    pub items: Vec<Item>,
}

/// [`BoardSource`] backed by a JSON snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct JsonSnapshotSource {
    snapshot: SnapshotFile,
}

impl JsonSnapshotSource {
    /// Read and parse a snapshot file.
    ///
    /// # Errors
    /// Returns [`SourceError::Io`] or [`SourceError::Json`] when the file is unusable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse a snapshot from a JSON string.
    ///
    /// # Errors
    /// Returns [`SourceError::Json`] when the JSON does not match the snapshot layout.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Wrap an already parsed snapshot.
    #[must_use]
    pub const fn new(snapshot: SnapshotFile) -> Self {
        Self { snapshot }
    }

    fn entry(&self, board: &BoardId) -> Result<&BoardEntry, SourceError> {
        self.snapshot
            .boards
            .iter()
            .find(|entry| &entry.board.id == board)
            .ok_or_else(|| SourceError::BoardNotFound(board.clone()))
    }
}

impl BoardSource for JsonSnapshotSource {
    async fn fetch_boards(&self, ids: Option<&[BoardId]>) -> Result<Vec<Board>, SourceError> {
        Ok(self
            .snapshot
            .boards
            .iter()
            .filter(|entry| ids.is_none_or(|ids| ids.contains(&entry.board.id)))
            .map(|entry| entry.board.clone())
            .collect())
    }

    async fn fetch_items(&self, board: &BoardId, limit: usize) -> Result<Vec<Item>, SourceError> {
        Ok(self.entry(board)?.items.iter().take(limit).cloned().collect())
    }

    async fn fetch_field_catalog(&self, board: &BoardId) -> Result<CatalogEntry, SourceError> {
        self.entry(board).map(|entry| CatalogEntry::from(&entry.board))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "boards": [
            {"id": 1, "name": "Delivery", "items": [
                {"id": "a", "name": "A"},
                {"id": "b", "name": "B"},
                {"id": "c", "name": "C"}
            ]},
            {"id": "2", "name": "Roadmap", "fields": [{"id": "status", "title": "Phase", "type": "status"}]}
        ]
    }"#;

    fn source() -> JsonSnapshotSource {
        JsonSnapshotSource::from_json(SNAPSHOT).unwrap_or_else(|err| panic!("snapshot: {err}"))
    }

    #[tokio::test]
    async fn filters_boards_by_id() {
        let source = source();
        let all = source.fetch_boards(None).await.unwrap_or_else(|err| panic!("boards: {err}"));
        assert_eq!(all.len(), 2);

        let only = source
            .fetch_boards(Some(&[BoardId::from("2")]))
            .await
            .unwrap_or_else(|err| panic!("boards: {err}"));
        assert_eq!(only.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), ["Roadmap"]);
    }

    #[tokio::test]
    async fn item_limit_and_unknown_boards() {
        let source = source();
        let items = source
            .fetch_items(&BoardId::from("1"), 2)
            .await
            .unwrap_or_else(|err| panic!("items: {err}"));
        assert_eq!(items.len(), 2);

        let missing = source.fetch_items(&BoardId::from("9"), 10).await;
        assert!(matches!(missing, Err(SourceError::BoardNotFound(id)) if id.as_str() == "9"));
    }

    #[tokio::test]
    async fn catalog_comes_from_board_fields() {
        let catalog = source()
            .fetch_field_catalog(&BoardId::from("2"))
            .await
            .unwrap_or_else(|err| panic!("catalog: {err}"));
        assert_eq!(catalog.board_name, "Roadmap");
        assert_eq!(catalog.fields.len(), 1);
    }

    #[test]
    fn open_reads_files_and_reports_paths() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|err| panic!("tempfile: {err}"));
        file.write_all(SNAPSHOT.as_bytes())
            .unwrap_or_else(|err| panic!("write: {err}"));
        let opened = JsonSnapshotSource::open(file.path()).unwrap_or_else(|err| panic!("open: {err}"));
        assert_eq!(opened.snapshot.boards.len(), 2);

        let err = JsonSnapshotSource::open("/nonexistent/boards.json").err();
        assert!(matches!(err, Some(SourceError::Io { .. })));
    }
}
