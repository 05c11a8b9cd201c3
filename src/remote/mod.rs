//! Contract of the record store activities are persisted in. The store is a plain record
//! collection without business logic: selectable by date, addressable by id.
//!
//! [file_store::FileActivityStore] keeps records on the local disk,
//! [rest_store::RestActivityStore] talks to a PostgREST style HTTP backend.

pub mod file_store;
pub mod rest_store;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::day_log::entities::ActivityId;

/// A stored activity row, as the remote store knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub date: NaiveDate,
    pub hour: u8,
    pub name: String,
    pub duration: u32,
    pub color_theme: String,
}

/// A row to be created. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivityRecord {
    pub date: NaiveDate,
    pub hour: u8,
    pub name: String,
    pub duration: u32,
    pub color_theme: String,
}

/// Columns to overwrite on an existing row. Absent columns are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<String>,
}

impl ActivityRecord {
    pub fn from_new(id: ActivityId, record: NewActivityRecord) -> Self {
        Self {
            id,
            date: record.date,
            hour: record.hour,
            name: record.name,
            duration: record.duration,
            color_theme: record.color_theme,
        }
    }

    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(color_theme) = patch.color_theme {
            self.color_theme = color_theme;
        }
    }
}

/// Interface for abstracting the remote record store. Every call may fail, callers are expected
/// to compensate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteActivityStore: Send + Sync {
    /// All records of one calendar date.
    async fn select(&self, date: NaiveDate) -> Result<Vec<ActivityRecord>>;

    /// Creates a record and returns it the way the store saved it.
    async fn insert(&self, record: NewActivityRecord) -> Result<ActivityRecord>;

    async fn update(&self, id: &ActivityId, patch: RecordPatch) -> Result<()>;

    async fn delete(&self, id: &ActivityId) -> Result<()>;
}

#[async_trait]
impl<T: RemoteActivityStore + ?Sized> RemoteActivityStore for Arc<T> {
    async fn select(&self, date: NaiveDate) -> Result<Vec<ActivityRecord>> {
        (**self).select(date).await
    }

    async fn insert(&self, record: NewActivityRecord) -> Result<ActivityRecord> {
        (**self).insert(record).await
    }

    async fn update(&self, id: &ActivityId, patch: RecordPatch) -> Result<()> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &ActivityId) -> Result<()> {
        (**self).delete(id).await
    }
}
