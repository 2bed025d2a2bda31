//! # HTTP entry backend
//!
//! [`HttpBackend`] talks to the entry endpoints of the backend service:
//!
//! | Request | Endpoint |
//! |---------|----------|
//! | create | `POST /api/entries` with the fields as JSON, returns the stored entry |
//! | update | `PUT /api/entries/{id}` |
//! | delete | `DELETE /api/entries/{id}` |
//! | snapshot | `GET /api/entries` |
//!
//! The service has no push channel, so [`observe`](EntryBackend::observe)
//! polls the snapshot endpoint on a fixed interval and publishes a snapshot
//! only when it differs from the previous one. The polling task lives as long
//! as the returned feed.

use std::time::Duration;

use owl_store::{
    BackendError, Entry, EntryBackend, EntryFields, OwlConfig, SnapshotFeed, TaskHandle,
};
use reqwest::{Client, Response};
use tokio::sync::watch;

use crate::config::BackendConfig;

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    poll_interval: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: OwlConfig::default().remote.poll_interval(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.api_url.clone()).with_poll_interval(config.poll_interval)
    }

    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = every;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the current entry list.
    pub async fn fetch(&self) -> Result<Vec<Entry>, BackendError> {
        let resp = self
            .client
            .get(self.url("/api/entries"))
            .send()
            .await
            .map_err(request_error)?;
        check(resp)?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

fn request_error(e: reqwest::Error) -> BackendError {
    if e.is_connect() || e.is_timeout() {
        BackendError::Unavailable
    } else {
        BackendError::Request(e.to_string())
    }
}

fn check(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(BackendError::Status(status.as_u16()))
    }
}

impl EntryBackend for HttpBackend {
    async fn create(&self, fields: EntryFields) -> Result<Entry, BackendError> {
        let resp = self
            .client
            .post(self.url("/api/entries"))
            .json(&fields)
            .send()
            .await
            .map_err(request_error)?;
        check(resp)?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn update(&self, id: &str, fields: EntryFields) -> Result<(), BackendError> {
        let resp = self
            .client
            .put(self.url(&format!("/api/entries/{id}")))
            .json(&fields)
            .send()
            .await
            .map_err(request_error)?;
        check(resp)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/entries/{id}")))
            .send()
            .await
            .map_err(request_error)?;
        check(resp)?;
        Ok(())
    }

    /// Must be called inside a tokio runtime.
    fn observe(&self) -> SnapshotFeed {
        let (tx, rx) = watch::channel(Vec::new());
        let backend = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(backend.poll_interval);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            while !tx.is_closed() {
                ticks.tick().await;
                match backend.fetch().await {
                    Ok(entries) => {
                        tx.send_if_modified(|current| {
                            if *current == entries {
                                false
                            } else {
                                *current = entries;
                                true
                            }
                        });
                    }
                    Err(e) => tracing::warn!("snapshot poll failed: {e}"),
                }
            }
        });
        SnapshotFeed::with_keepalive(rx, TaskHandle::new(handle))
    }
}
