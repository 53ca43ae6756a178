//! Remote release tags of the template repository.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::ReleaseError;

/// A release tag as listed by `GET /repos/{owner}/{repo}/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(rename = "zipball_url")]
    pub archive_url: String,
}

impl Tag {
    /// Tag name with `prefix` removed, e.g. `v1.2.0` -> `1.2.0`.
    pub fn version<'a>(&'a self, prefix: &str) -> &'a str {
        self.name.strip_prefix(prefix).unwrap_or(&self.name)
    }
}

/// The tag for `version`, accepting either the bare version or the full tag
/// name.
pub fn find_version<'a>(tags: &'a [Tag], version: &str, prefix: &str) -> Result<&'a Tag, ReleaseError> {
    tags.iter()
        .find(|t| t.version(prefix) == version || t.name == version)
        .ok_or_else(|| ReleaseError::VersionNotFound(version.to_string()))
}

/// Newest tag. The API lists tags newest first.
pub fn latest(tags: &[Tag]) -> Result<&Tag, ReleaseError> {
    tags.first().ok_or(ReleaseError::NoReleases)
}

/// Asynchronous client for the template repository's tag list.
#[derive(Clone)]
pub struct TagClient {
    http: reqwest::Client,
    api_url: String,
    repo: String,
    token: Option<String>,
}

impl TagClient {
    pub fn new(
        api_url: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ReleaseError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("templsync/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        info!(api_url = %api_url, "created TagClient");
        Ok(Self {
            http,
            api_url,
            repo: repo.into(),
            token,
        })
    }

    fn tags_url(&self) -> String {
        format!("{}/repos/{}/tags", self.api_url, self.repo)
    }

    /// Fetch the first page (up to 100) of tags, newest first.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ReleaseError> {
        let mut req = self.http.get(self.tags_url()).query(&[("per_page", "100")]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReleaseError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        let tags: Vec<Tag> = resp.json().await?;
        debug!(count = tags.len(), "fetched tags");
        Ok(tags)
    }
}
