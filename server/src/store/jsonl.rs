//! Append-only JSON-lines row store
//!
//! One row per line, each a JSON array of cells. Blank lines are ignored.
//! A row counts only once its newline is on disk; an unterminated tail left
//! by an interrupted write is skipped on read and cut off by the next append.

use super::{RowStore, StoreError};
use async_trait::async_trait;
use labsense_shared::{codec, SensorRow};
use std::io::{ErrorKind, SeekFrom};
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

/// Bytes read per step when scanning backwards from the end
const TAIL_CHUNK: u64 = 4096;

/// File-backed store that survives restarts
pub struct JsonlRowStore {
    path: PathBuf,
    /// Cached row count; `None` until the file has been scanned once
    count: Mutex<Option<usize>>,
}

impl JsonlRowStore {
    /// Create a store over `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            count: Mutex::new(None),
        }
    }

    async fn scan_count(&self) -> Result<usize, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        Ok(contents
            .split_inclusive('\n')
            .filter(|l| l.ends_with('\n') && !l.trim().is_empty())
            .count())
    }
}

/// Offset just past the last `\n` before `end`, or 0 if there is none
async fn line_start_before(file: &mut File, end: u64) -> std::io::Result<u64> {
    let mut pos = end;
    let mut buf = vec![0u8; TAIL_CHUNK as usize];
    while pos > 0 {
        let n = TAIL_CHUNK.min(pos);
        pos -= n;
        let chunk = &mut buf[..n as usize];
        file.seek(SeekFrom::Start(pos)).await?;
        file.read_exact(chunk).await?;
        if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(pos + i as u64 + 1);
        }
    }
    Ok(0)
}

async fn read_range(file: &mut File, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
    let mut bytes = vec![0u8; (end - start) as usize];
    file.seek(SeekFrom::Start(start)).await?;
    file.read_exact(&mut bytes).await?;
    Ok(bytes)
}

#[async_trait]
impl RowStore for JsonlRowStore {
    async fn append_row(&self, row: SensorRow) -> Result<usize, StoreError> {
        let mut line = codec::encode_row(&row)?;
        line.push('\n');

        // Holding the count lock serializes appends within this process
        let mut count = self.count.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;

        let len = file.metadata().await?.len();
        let committed = line_start_before(&mut file, len).await?;
        if committed < len {
            warn!(
                "Dropping {} byte unterminated tail of {}",
                len - committed,
                self.path.display()
            );
            file.set_len(committed).await?;
        }

        let current = match *count {
            Some(n) => n,
            None => self.scan_count().await?,
        };

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *count = Some(current + 1);
        Ok(current + 1)
    }

    async fn last_row(&self) -> Result<Option<SensorRow>, StoreError> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata().await?.len();
        let mut end = line_start_before(&mut file, len).await?;
        while end > 0 {
            let line_end = end - 1;
            let start = line_start_before(&mut file, line_end).await?;
            let bytes = read_range(&mut file, start, line_end).await?;
            let line = String::from_utf8_lossy(&bytes);
            if !line.trim().is_empty() {
                return codec::decode_row(&line)
                    .map(Some)
                    .map_err(|source| StoreError::Corrupt {
                        offset: start,
                        source,
                    });
            }
            end = start;
        }
        Ok(None)
    }

    async fn row_count(&self) -> Result<usize, StoreError> {
        let mut count = self.count.lock().await;
        match *count {
            Some(n) => Ok(n),
            None => {
                let n = self.scan_count().await?;
                *count = Some(n);
                Ok(n)
            }
        }
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsense_shared::Cell;
    use tempfile::tempdir;

    fn row(value: f64) -> SensorRow {
        SensorRow::new(vec![Cell::Empty, Cell::Number(value)])
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().expect("tempdir");
        let store = JsonlRowStore::new(dir.path().join("rows.jsonl"));

        assert_eq!(store.row_count().await.unwrap(), 0);
        assert!(store.last_row().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");

        let store = JsonlRowStore::new(&path);
        store.append_row(row(1.0)).await.unwrap();
        assert_eq!(store.append_row(row(2.0)).await.unwrap(), 2);
        drop(store);

        let reopened = JsonlRowStore::new(&path);
        assert_eq!(reopened.row_count().await.unwrap(), 2);
        assert_eq!(reopened.append_row(row(3.0)).await.unwrap(), 3);

        let last = reopened.last_row().await.unwrap().expect("row");
        assert_eq!(last.cell(1), &Cell::Number(3.0));
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "[\"empty\",{\"number\":4.0}]\n\n  \n").unwrap();

        let store = JsonlRowStore::new(&path);
        assert_eq!(store.row_count().await.unwrap(), 1);
        let last = store.last_row().await.unwrap().expect("row");
        assert_eq!(last.cell(1), &Cell::Number(4.0));
    }

    #[tokio::test]
    async fn test_corrupt_last_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "[\"empty\"]\n{not json\n").unwrap();

        let store = JsonlRowStore::new(&path);
        let result = store.last_row().await;
        assert!(matches!(result, Err(StoreError::Corrupt { offset: 10, .. })));
    }

    #[tokio::test]
    async fn test_torn_tail_is_ignored_then_replaced() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");
        let committed = "[\"empty\",{\"number\":1.0}]\n";
        std::fs::write(&path, format!("{committed}[\"empty\",{{\"numb")).unwrap();

        let store = JsonlRowStore::new(&path);
        assert_eq!(store.row_count().await.unwrap(), 1);
        let last = store.last_row().await.unwrap().expect("row");
        assert_eq!(last.cell(1), &Cell::Number(1.0));

        assert_eq!(store.append_row(row(2.0)).await.unwrap(), 2);
        let last = store.last_row().await.unwrap().expect("row");
        assert_eq!(last.cell(1), &Cell::Number(2.0));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{committed}[\"empty\",{{\"number\":2.0}}]\n"));
        assert_eq!(JsonlRowStore::new(&path).row_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_last_row_spans_read_chunks() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");
        let store = JsonlRowStore::new(&path);

        let wide = SensorRow::new(vec![Cell::Empty, Cell::Text("x".repeat(10_000))]);
        store.append_row(row(1.0)).await.unwrap();
        store.append_row(wide.clone()).await.unwrap();

        assert_eq!(store.last_row().await.unwrap(), Some(wide));
    }
}
