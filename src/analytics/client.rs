use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::params::TimeWindow;
use super::records::{DeltaRecord, SeriesRecord};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("response from {endpoint} could not be decoded: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} answered with status {status:?}")]
    Status { endpoint: String, status: String },
    #[error("{endpoint} answered without a data payload")]
    MissingData { endpoint: String },
}

pub trait AnalyticsSource: Send + Sync {
    fn deltas(&self, window: TimeWindow) -> Result<Vec<DeltaRecord>, AnalyticsError>;

    fn series(&self, window: TimeWindow) -> Result<Vec<SeriesRecord>, AnalyticsError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<Vec<T>>,
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>, serde_json::Error> {
    serde_json::from_str(body)
}

pub struct HttpAnalytics {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpAnalytics {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        window: TimeWindow,
    ) -> Result<Vec<T>, AnalyticsError> {
        let endpoint = format!("{}/{path}", self.base_url);
        let http_error = |source| AnalyticsError::Http {
            endpoint: endpoint.clone(),
            source,
        };

        debug!(%endpoint, minutes = window.minutes(), "requesting analytics");
        let body = self
            .client
            .get(&endpoint)
            .query(&window.query())
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(http_error)?;
        let envelope = decode_envelope::<T>(&body).map_err(|source| AnalyticsError::Decode {
            endpoint: endpoint.clone(),
            source,
        })?;

        if envelope.status != "ok" {
            return Err(AnalyticsError::Status {
                endpoint,
                status: envelope.status,
            });
        }

        envelope
            .data
            .ok_or(AnalyticsError::MissingData { endpoint })
    }
}

impl AnalyticsSource for HttpAnalytics {
    fn deltas(&self, window: TimeWindow) -> Result<Vec<DeltaRecord>, AnalyticsError> {
        self.get("deltas", window)
    }

    fn series(&self, window: TimeWindow) -> Result<Vec<SeriesRecord>, AnalyticsError> {
        self.get("series", window)
    }
}
