use super::payload::ReviewPayload;
use crate::config::Credentials;
use crate::infrastructure::{BatchError, BatchResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// workspace 成员
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkspaceMember {
    pub uuid: String,
    pub display_name: String,
}

/// 提交 PR 的结果；非 201 不视为错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Created,
    Rejected { status: u16, body: String },
}

/// 代码评审服务
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn workspace_members(&self, workspace: &str) -> BatchResult<Vec<WorkspaceMember>>;

    async fn current_user_uuid(&self) -> BatchResult<String>;

    async fn submit(
        &self,
        payload: &ReviewPayload,
        workspace: &str,
        project: &str,
    ) -> BatchResult<ReviewOutcome>;
}

#[derive(Deserialize)]
struct MembersPage {
    values: Vec<MemberEntry>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct MemberEntry {
    user: WorkspaceMember,
}

#[derive(Deserialize)]
struct CurrentUser {
    uuid: String,
}

/// Bitbucket Cloud REST 2.0 客户端
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
}

impl BitbucketClient {
    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> BatchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(format!("repo-batch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BatchError::network(format!("Failed to create HTTP client: {}", e), None))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            timeout,
        })
    }

    fn is_own_url(&self, url: &str) -> bool {
        url == self.base_url
            || url
                .strip_prefix(self.base_url.as_str())
                .map_or(false, |rest| rest.starts_with('/'))
    }

    fn map_send_error(&self, operation: &str, error: reqwest::Error) -> BatchError {
        if error.is_timeout() {
            BatchError::timeout(operation, self.timeout.as_secs())
        } else {
            BatchError::from(error)
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> BatchResult<T> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.identity, Some(&self.credentials.secret))
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BatchError::network(
                format!("HTTP error: {} {}", status, body.trim()),
                Some(url.to_string()),
            ));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ReviewService for BitbucketClient {
    async fn workspace_members(&self, workspace: &str) -> BatchResult<Vec<WorkspaceMember>> {
        let mut members = Vec::new();
        let mut visited = HashSet::new();
        let mut url = Some(format!("{}/2.0/workspaces/{}/members", self.base_url, workspace));

        // 按 next 链接翻页；凭据只发往 base_url
        while let Some(current) = url {
            if !self.is_own_url(&current) {
                return Err(BatchError::network(
                    "refusing to follow pagination link outside the API base URL",
                    Some(current),
                ));
            }
            if !visited.insert(current.clone()) {
                tracing::warn!(url = %current, "pagination link repeats, stopping");
                break;
            }
            let page: MembersPage = self.get_json(&current).await?;
            members.extend(page.values.into_iter().map(|entry| entry.user));
            url = page.next;
        }

        tracing::debug!(workspace, count = members.len(), "fetched workspace members");
        Ok(members)
    }

    async fn current_user_uuid(&self) -> BatchResult<String> {
        let url = format!("{}/2.0/user/", self.base_url);
        let user: CurrentUser = self.get_json(&url).await?;
        Ok(user.uuid)
    }

    async fn submit(
        &self,
        payload: &ReviewPayload,
        workspace: &str,
        project: &str,
    ) -> BatchResult<ReviewOutcome> {
        let url = format!(
            "{}/2.0/repositories/{}/{}/pullrequests",
            self.base_url, workspace, project
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.identity, Some(&self.credentials.secret))
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(ReviewOutcome::Created);
        }

        let body = response.text().await.unwrap_or_default();
        Ok(ReviewOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
