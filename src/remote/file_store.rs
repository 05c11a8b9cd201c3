use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::day_log::entities::ActivityId;

use super::{ActivityRecord, NewActivityRecord, RecordPatch, RemoteActivityStore};

const RECORD_FILE: &str = "activities.jsonl";

/// Keeps every record in one JSON lines file. Reads take a shared lock and writes an exclusive
/// one, so several processes can use the same directory.
pub struct FileActivityStore {
    path: PathBuf,
    // File locks don't order writers inside one process
    writer: Mutex<()>,
}

impl FileActivityStore {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self {
            path: record_dir.join(RECORD_FILE),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ActivityRecord>> {
        async fn extract(path: &Path) -> std::result::Result<String, std::io::Error> {
            let mut file = File::open(path).await?;
            file.lock_shared()?;
            let mut content = String::new();
            let result = file.read_to_string(&mut content).await;
            file.unlock_async().await?;
            result.map(|_| content)
        }

        match extract(&self.path).await {
            Ok(content) => Ok(parse_records(&self.path, &content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", self.path)),
        }
    }

    /// Reads every record, lets `change` edit them and writes the result back.
    async fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<ActivityRecord>) -> Result<T>,
    ) -> Result<T> {
        let _writer = self.writer.lock().await;

        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {:?}", self.path))?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::modify_with_file(&self.path, &mut file, change).await;
        file.unlock_async().await?;
        result
    }

    async fn modify_with_file<T>(
        path: &Path,
        file: &mut File,
        change: impl FnOnce(&mut Vec<ActivityRecord>) -> Result<T>,
    ) -> Result<T> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        let mut records = parse_records(path, &content);

        let value = change(&mut records)?;

        let mut buffer = Vec::<u8>::new();
        for record in &records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(value)
    }
}

fn parse_records(path: &Path, content: &str) -> Vec<ActivityRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<ActivityRecord>(line) {
            Ok(v) => Some(v),
            Err(e) => {
                // ignore illegal values. Might happen if a write was cut off
                warn!(
                    "During parsing in path {:?} found illegal json string {}:  {e}",
                    path, line
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl RemoteActivityStore for FileActivityStore {
    async fn select(&self, date: NaiveDate) -> Result<Vec<ActivityRecord>> {
        debug!("Selecting {date} from {:?}", self.path);
        let records = self.read_all().await?;
        Ok(records.into_iter().filter(|r| r.date == date).collect())
    }

    async fn insert(&self, record: NewActivityRecord) -> Result<ActivityRecord> {
        let id = ActivityId::new(Uuid::new_v4().to_string());
        let mut stored = ActivityRecord::from_new(id, record);
        stored.name = stored.name.trim().to_string();

        self.modify(|records| {
            records.push(stored.clone());
            Ok(stored)
        })
        .await
    }

    async fn update(&self, id: &ActivityId, patch: RecordPatch) -> Result<()> {
        self.modify(|records| {
            let record = records
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or_else(|| anyhow!("No activity with id {id}"))?;
            record.apply(patch);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &ActivityId) -> Result<()> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|r| &r.id != id);
            if records.len() == before {
                debug!("Nothing to delete for {id}");
            }
            Ok(())
        })
        .await
    }
}
