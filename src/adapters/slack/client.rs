//! Implements SlackGateway over the Slack Web API.
//!
//! Cursor pagination on channel listing and history; the shared RateLimiter
//! spaces every continuation request. The thread_not_found race is absorbed
//! here; any other API failure propagates.

use crate::adapters::slack::mapper::{
    self, ChannelListResponse, HistoryResponse, UserInfoResponse,
};
use crate::domain::{Channel, DomainError, Identity, RawMessage, RawReply};
use crate::ports::SlackGateway;
use crate::shared::RateLimiter;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size for listing and history requests.
const PAGE_LIMIT: &str = "200";

/// Slack gateway adapter. Wraps reqwest with bearer-token auth and the
/// shared rate-limit gate.
pub struct SlackApiGateway {
    client: reqwest::Client,
    token: String,
    limiter: Arc<RateLimiter>,
}

impl SlackApiGateway {
    pub fn new(token: String, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            limiter,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, DomainError> {
        let url = format!("{}/{}", SLACK_API_BASE, method);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .map_err(|e| DomainError::SlackGateway(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::SlackGateway(format!(
                "{} returned {}: {}",
                method,
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response.json::<T>().await.map_err(|e| {
            DomainError::SlackGateway(format!("{} response decode failed: {}", method, e))
        })
    }
}

#[async_trait]
impl SlackGateway for SlackApiGateway {
    async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("types", "public_channel,private_channel".to_string()),
                ("exclude_archived", "true".to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(c) = cursor.as_ref() {
                self.limiter.wait().await;
                params.push(("cursor", c.clone()));
            }

            let page: ChannelListResponse = self.get_json("conversations.list", &params).await?;
            if !page.ok {
                return Err(DomainError::SlackGateway(format!(
                    "conversations.list failed: {}",
                    page.error.unwrap_or_else(|| "unknown".to_string())
                )));
            }

            channels.extend(
                page.channels
                    .into_iter()
                    .filter(|ch| ch.is_member)
                    .map(mapper::channel_to_domain),
            );

            cursor = page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        debug!(count = channels.len(), "channels listed");
        Ok(channels)
    }

    async fn fetch_history(
        &self,
        channel_id: &str,
        oldest: i64,
    ) -> Result<Vec<RawMessage>, DomainError> {
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("channel", channel_id.to_string()),
                ("oldest", oldest.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(c) = cursor.as_ref() {
                self.limiter.wait().await;
                params.push(("cursor", c.clone()));
            }

            let page: HistoryResponse = self.get_json("conversations.history", &params).await?;
            if !page.ok {
                return Err(DomainError::SlackGateway(format!(
                    "conversations.history failed for {}: {}",
                    channel_id,
                    page.error.unwrap_or_else(|| "unknown".to_string())
                )));
            }

            // Native API order is preserved; only non-substantive records
            // (bots, subtypes) are dropped here.
            messages.extend(
                page.messages
                    .into_iter()
                    .filter(mapper::is_substantive)
                    .map(mapper::message_to_raw),
            );

            cursor = page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(messages)
    }

    async fn fetch_thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<RawReply>, DomainError> {
        let params: Vec<(&str, String)> = vec![
            ("channel", channel_id.to_string()),
            ("ts", thread_ts.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];

        let page: HistoryResponse = self.get_json("conversations.replies", &params).await?;
        if !page.ok {
            // Benign race: the thread was deleted between listing and fetch.
            if page.error.as_deref() == Some("thread_not_found") {
                debug!(channel_id, thread_ts, "thread vanished, returning empty");
                return Ok(Vec::new());
            }
            return Err(DomainError::SlackGateway(format!(
                "conversations.replies failed for {}: {}",
                thread_ts,
                page.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        // The API returns the parent as the first element of the thread.
        Ok(page
            .messages
            .into_iter()
            .skip(1)
            .map(mapper::reply_to_raw)
            .collect())
    }

    async fn lookup_identity(&self, user_id: &str) -> Result<Identity, DomainError> {
        let params: Vec<(&str, String)> = vec![("user", user_id.to_string())];

        let response: UserInfoResponse = self.get_json("users.info", &params).await?;
        if !response.ok {
            return Err(DomainError::SlackGateway(format!(
                "users.info failed for {}: {}",
                user_id,
                response.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        response
            .user
            .map(mapper::user_to_identity)
            .ok_or_else(|| {
                DomainError::SlackGateway(format!("users.info returned no user for {}", user_id))
            })
    }
}
