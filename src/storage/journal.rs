use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fs4::tokio::AsyncFileExt;
use futures::{StreamExt, stream};
use serde::Deserialize;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::tasks::entities::{Task, TaskId, TaskStatus};

/// A single journal line. Tasks are stored log-structured: the latest `Put`
/// for an id wins, a `Remove` tombstones it. Keeping superseded lines around
/// is what makes completion history reconstructable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TaskRecord {
    Put { task: Task },
    Remove { id: TaskId },
}

impl TaskRecord {
    /// Two consecutive puts collapse into one line when they describe the same
    /// task with an unchanged completion state. Metadata edits rewrite in
    /// place instead of growing the journal; every status transition keeps its
    /// own line so history survives.
    fn collapses_with(&self, next: &TaskRecord) -> bool {
        match (self, next) {
            (TaskRecord::Put { task: a }, TaskRecord::Put { task: b }) => {
                a.id == b.id && a.status == b.status && a.completed_at == b.completed_at
            }
            _ => false,
        }
    }
}

/// Segment file name for a given day. One file per calendar month keeps
/// individual files small without fragmenting history queries.
pub fn month_segment_name(date: NaiveDate) -> String {
    date.format("%Y-%m.jsonl").to_string()
}

/// Interface for abstracting storage of task records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskJournal: Send + Sync {
    /// Appends a record to the segment for `date`.
    async fn append(&self, date: NaiveDate, record: TaskRecord) -> Result<()>;

    /// All records across all segments, in write order.
    async fn records(&self) -> Result<Vec<TaskRecord>>;
}

/// The main realization of [TaskJournal]: month-segmented JSON-lines files in
/// a journal directory, guarded by advisory file locks.
pub struct TaskJournalImpl {
    journal_dir: PathBuf,
}

impl TaskJournalImpl {
    pub fn new(journal_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&journal_dir)?;

        Ok(Self { journal_dir })
    }

    /// Segment paths in chronological order. The `%Y-%m` names sort
    /// lexicographically in time order.
    fn segment_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = std::fs::read_dir(&self.journal_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
            .collect::<Vec<_>>();
        paths.sort();
        Ok(paths)
    }

    async fn read_segment(path: &Path) -> Result<Vec<TaskRecord>> {
        debug!("Extracting {path:?}");
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut records = vec![];
        while let Ok(Some(line)) = lines.next_line().await {
            match serde_json::from_str::<TaskRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // ignore illegal values. Might happen after shutdowns
                    warn!("During parsing in path {path:?} found illegal json string {line}: {e}")
                }
            }
        }
        lines.into_inner().into_inner().unlock_async().await?;
        Ok(records)
    }

    async fn append_with_file(file: &mut File, record: TaskRecord) -> Result<()> {
        // Appending a record:
        // 1. Find the last line of the segment.
        // 2. Collapse it with the incoming record where possible; a corrupt
        //    tail gets overwritten instead of poisoning the file.
        // 3. Rewrite from the last line's offset.
        let (offset, mut lines) = match last_line_of(file).await? {
            Some((offset, line)) => match serde_json::from_str::<TaskRecord>(&line) {
                Ok(last) if last.collapses_with(&record) => (offset, vec![]),
                Ok(last) => (offset, vec![last]),
                Err(e) => {
                    // Might happen due to shutdown cutting off the write.
                    warn!("Last record was corrupted {e}");
                    (offset, vec![])
                }
            },
            None => (file.seek(SeekFrom::End(0)).await?, vec![]),
        };
        lines.push(record);

        let mut buffer = Vec::<u8>::new();
        for line in lines {
            serde_json::to_writer(&mut buffer, &line)?;
            buffer.push(b'\n');
        }

        file.set_len(offset).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TaskJournal for TaskJournalImpl {
    async fn append(&self, date: NaiveDate, record: TaskRecord) -> Result<()> {
        let path = self.journal_dir.join(month_segment_name(date));
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, record).await;
        file.unlock_async().await?;
        result
    }

    async fn records(&self) -> Result<Vec<TaskRecord>> {
        let segments = self.segment_paths()?;
        let mut files = stream::iter(segments)
            .map(|path| async move {
                let records = Self::read_segment(&path).await;
                (path, records)
            })
            .buffered(4);

        let mut records = vec![];
        while let Some((path, segment)) = files.next().await {
            match segment {
                Ok(mut segment) => records.append(&mut segment),
                Err(e) => {
                    warn!("Failed to read segment {path:?}: {e}");
                    return Err(e);
                }
            }
        }
        Ok(records)
    }
}

/// How far from the end of a segment we look for the final line break. Task
/// records are a few hundred bytes, so one chunk is plenty; in the unlikely
/// case a line outgrows it, the record is treated as opaque and appends skip
/// collapsing.
const TAIL_CHUNK: u64 = 8 * 1024;

/// Returns the byte offset and content of the file's last line, ignoring a
/// trailing newline. `None` for an empty file or when the last line couldn't
/// be located within [TAIL_CHUNK].
async fn last_line_of(file: &mut File) -> Result<Option<(u64, String)>> {
    let len = file.seek(SeekFrom::End(0)).await?;
    if len == 0 {
        return Ok(None);
    }
    let chunk_start = len.saturating_sub(TAIL_CHUNK);
    file.seek(SeekFrom::Start(chunk_start)).await?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail).await?;

    let content_end = if tail.last() == Some(&b'\n') {
        tail.len() - 1
    } else {
        tail.len()
    };
    let line_start = match tail[..content_end].iter().rposition(|b| *b == b'\n') {
        Some(newline) => newline + 1,
        None if chunk_start == 0 => 0,
        None => return Ok(None),
    };
    let line = String::from_utf8_lossy(&tail[line_start..content_end]).to_string();
    Ok(Some((chunk_start + line_start as u64, line)))
}

/// Folds raw records into the current set of tasks, in first-seen order.
pub fn fold_records(records: Vec<TaskRecord>) -> Vec<Task> {
    let mut tasks: Vec<Task> = vec![];
    for record in records {
        match record {
            TaskRecord::Put { task } => {
                match tasks.iter_mut().find(|existing| existing.id == task.id) {
                    Some(existing) => *existing = task,
                    None => tasks.push(task),
                }
            }
            TaskRecord::Remove { id } => tasks.retain(|task| task.id != id),
        }
    }
    tasks
}

/// A point in time a task was checked off. Derived from superseded journal
/// lines, so completions survive later resets and edits.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEvent {
    pub task_id: TaskId,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

/// Extracts every distinct completion from the raw record stream, ordered by
/// completion time.
pub fn completion_events(records: &[TaskRecord]) -> Vec<CompletionEvent> {
    let mut events: Vec<CompletionEvent> = vec![];
    for record in records {
        let TaskRecord::Put { task } = record else {
            continue;
        };
        let Some(completed_at) = task.completed_at else {
            continue;
        };
        if task.status != TaskStatus::Completed {
            continue;
        }
        let seen = events
            .iter()
            .any(|event| event.task_id == task.id && event.completed_at == completed_at);
        if !seen {
            events.push(CompletionEvent {
                task_id: task.id,
                title: task.title.clone(),
                completed_at,
            });
        }
    }
    events.sort_by_key(|event| event.completed_at);
    events
}
