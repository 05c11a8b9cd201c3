use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

use crate::{day_log::entities::ActivityId, utils::time::date_to_record_key};

use super::{ActivityRecord, NewActivityRecord, RecordPatch, RemoteActivityStore};

const ACTIVITIES_PATH: &str = "rest/v1/activities";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client of a PostgREST style backend exposing an `activities` table.
pub struct RestActivityStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RestActivityStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/{ACTIVITIES_PATH}", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let builder = self.client.request(method, &self.endpoint);
        match &self.api_key {
            Some(key) => builder.header("apikey", key.as_str()).bearer_auth(key),
            None => builder,
        }
    }
}

fn eq_filter(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl RemoteActivityStore for RestActivityStore {
    async fn select(&self, date: NaiveDate) -> Result<Vec<ActivityRecord>> {
        debug!("GET {} for {date}", self.endpoint);
        let records = self
            .request(Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("date", eq_filter(date_to_record_key(date))),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ActivityRecord>>()
            .await
            .context("Malformed activity list")?;
        Ok(records)
    }

    async fn insert(&self, record: NewActivityRecord) -> Result<ActivityRecord> {
        debug!("POST {} {record:?}", self.endpoint);
        let created = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ActivityRecord>>()
            .await
            .context("Malformed insert response")?;
        created
            .into_iter()
            .next()
            .context("Insert response didn't contain the created activity")
    }

    async fn update(&self, id: &ActivityId, patch: RecordPatch) -> Result<()> {
        debug!("PATCH {} {id} {patch:?}", self.endpoint);
        self.request(Method::PATCH)
            .query(&[("id", eq_filter(id))])
            .json(&patch)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, id: &ActivityId) -> Result<()> {
        debug!("DELETE {} {id}", self.endpoint);
        self.request(Method::DELETE)
            .query(&[("id", eq_filter(id))])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
