//! Listings and diffs served by a running changeset server.
//!
//! Two URL schemes are understood:
//! - live: `GET /changed_files`, `GET /children?key=<id>`, `GET /diff?key=<id>`
//! - content addressed (a published export): `GET <base>/changed_files`,
//!   `GET <base>/children/<sha1>`, `GET <base>/diff/<sha1>`

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::source::{content_address, ChangesetSource};
use crate::tree::node::{Node, NodeId};

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    content_addressed: bool,
}

impl HttpSource {
    pub fn new(base_url: &str, content_addressed: bool, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            content_addressed,
        })
    }

    /// URL and query for a per-node resource (`children` or `diff`).
    fn node_request(&self, resource: &str, id: &NodeId) -> reqwest::RequestBuilder {
        if self.content_addressed {
            let url = format!("{}/{}/{}", self.base_url, resource, content_address(id));
            self.client.get(url)
        } else {
            let url = format!("{}/{}", self.base_url, resource);
            self.client.get(url).query(&[("key", id.as_str())])
        }
    }

    async fn fetch_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
        let resp = request.send().await?;
        debug!(url = %resp.url(), status = %resp.status(), "response");
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(resp.url().to_string()));
        }
        if !resp.status().is_success() {
            return Err(AppError::Transport(format!("HTTP {}", resp.status())));
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl ChangesetSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn initial_listing(&self) -> Result<Vec<Node>> {
        let url = format!("{}/changed_files", self.base_url);
        Self::fetch_json(self.client.get(url)).await
    }

    async fn children(&self, id: &NodeId) -> Result<Vec<Node>> {
        Self::fetch_json(self.node_request("children", id)).await
    }

    async fn diff_lines(&self, id: &NodeId) -> Result<Vec<String>> {
        let lines: Option<Vec<String>> = Self::fetch_json(self.node_request("diff", id)).await?;
        lines.ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}
