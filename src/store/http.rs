use async_trait::async_trait;
use tracing::debug;

use super::{DataUnavailable, ReadingQuery, ReadingRow, ReadingStore};

/// [`ReadingStore`] backed by an HTTP endpoint serving rows as JSON.
///
/// Issues `GET {base_url}/readings?owner=..&since=..[&zone=..]` and expects
/// a JSON array of [`ReadingRow`] objects in the response body.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReadingStore for HttpStore {
    async fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<ReadingRow>, DataUnavailable> {
        let url = format!("{}/readings", self.base_url.trim_end_matches('/'));

        let mut req = self.client.get(&url).query(&[
            ("owner", query.owner.to_string()),
            ("since", query.since.to_rfc3339()),
        ]);
        if let Some(zone) = &query.zone {
            req = req.query(&[("zone", zone.as_str())]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DataUnavailable::new(e.to_string()))?
            .error_for_status()
            .map_err(|e| DataUnavailable::new(e.to_string()))?;

        let rows: Vec<ReadingRow> = resp
            .json()
            .await
            .map_err(|e| DataUnavailable::new(format!("bad rows payload: {e}")))?;

        debug!(url, rows = rows.len(), "Store query complete");
        Ok(rows)
    }
}
