//! Ingestion: list channels -> fetch history -> enrich with identities and
//! thread replies.
//!
//! Strictly sequential across channels and within a channel's reply
//! resolution, so the shared RateLimiter accounting stays trivial.

use crate::domain::{Channel, ChannelMessages, DomainError, Message, Reply};
use crate::ports::SlackGateway;
use crate::shared::RateLimiter;
use crate::usecases::identity::IdentityCache;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the full per-channel message set for one run.
pub struct IngestService {
    gateway: Arc<dyn SlackGateway>,
    identities: Arc<IdentityCache>,
    limiter: Arc<RateLimiter>,
}

impl IngestService {
    pub fn new(
        gateway: Arc<dyn SlackGateway>,
        identities: Arc<IdentityCache>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            gateway,
            identities,
            limiter,
        }
    }

    /// Fetch all substantive messages from the last `hours_back` hours.
    ///
    /// Channels are processed in listing order. A channel yielding zero
    /// substantive messages is dropped from the result entirely; callers must
    /// not assume channel count in equals channel count out.
    pub async fn fetch_recent(
        &self,
        hours_back: i64,
        name_filter: Option<&[String]>,
    ) -> Result<Vec<ChannelMessages>, DomainError> {
        let oldest = (Utc::now() - chrono::Duration::hours(hours_back)).timestamp();

        let channels = self.gateway.list_channels().await?;
        let channels = filter_channels(channels, name_filter);
        info!(
            channels = channels.len(),
            hours_back, "fetching channel history"
        );

        let mut results = Vec::new();

        for channel in channels {
            debug!(channel = %channel.name, "fetching history");
            self.limiter.wait().await;

            let raw = self.gateway.fetch_history(&channel.id, oldest).await?;
            if raw.is_empty() {
                debug!(channel = %channel.name, "no substantive messages, skipping");
                continue;
            }

            let mut messages = Vec::with_capacity(raw.len());
            for entry in raw {
                let author = match &entry.user_id {
                    Some(id) => Some(self.identities.resolve(id).await),
                    None => None,
                };

                let thread_replies = if entry.reply_count > 0 {
                    self.fetch_replies(&channel.id, &entry.ts).await?
                } else {
                    Vec::new()
                };

                messages.push(Message {
                    id: entry.ts.clone(),
                    author,
                    text: entry.text,
                    timestamp: entry.ts,
                    thread_replies,
                    reactions: entry.reactions,
                });
            }

            info!(
                channel = %channel.name,
                count = messages.len(),
                "channel ingested"
            );
            results.push(ChannelMessages { channel, messages });
        }

        Ok(results)
    }

    /// Rate-limit, fetch a thread's replies, and resolve their authors.
    async fn fetch_replies(
        &self,
        channel_id: &str,
        parent_ts: &str,
    ) -> Result<Vec<Reply>, DomainError> {
        self.limiter.wait().await;
        let raw_replies = self
            .gateway
            .fetch_thread_replies(channel_id, parent_ts)
            .await?;

        let mut replies = Vec::with_capacity(raw_replies.len());
        for raw in raw_replies {
            let author = match &raw.user_id {
                Some(id) => Some(self.identities.resolve(id).await),
                None => None,
            };
            replies.push(Reply {
                author,
                text: raw.text,
                timestamp: raw.ts,
            });
        }
        Ok(replies)
    }
}

/// Case-insensitive channel name filter; a leading '#' on a filter entry is
/// ignored. A pure post-pass over the full listing, not pushed into
/// pagination.
fn filter_channels(channels: Vec<Channel>, names: Option<&[String]>) -> Vec<Channel> {
    let Some(names) = names else {
        return channels;
    };
    if names.is_empty() {
        return channels;
    }
    let wanted: Vec<String> = names
        .iter()
        .map(|n| n.trim_start_matches('#').to_lowercase())
        .collect();
    channels
        .into_iter()
        .filter(|ch| wanted.contains(&ch.name.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, RawMessage, RawReply, Reaction};
    use std::collections::HashMap;

    /// In-memory gateway with a fixed channel/history/thread layout.
    struct FixtureGateway {
        channels: Vec<Channel>,
        history: HashMap<String, Vec<RawMessage>>,
        threads: HashMap<(String, String), Vec<RawReply>>,
    }

    #[async_trait::async_trait]
    impl SlackGateway for FixtureGateway {
        async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
            Ok(self.channels.clone())
        }

        async fn fetch_history(
            &self,
            channel_id: &str,
            _oldest: i64,
        ) -> Result<Vec<RawMessage>, DomainError> {
            Ok(self.history.get(channel_id).cloned().unwrap_or_default())
        }

        async fn fetch_thread_replies(
            &self,
            channel_id: &str,
            thread_ts: &str,
        ) -> Result<Vec<RawReply>, DomainError> {
            // A missing thread behaves like the thread_not_found race: empty.
            Ok(self
                .threads
                .get(&(channel_id.to_string(), thread_ts.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn lookup_identity(&self, user_id: &str) -> Result<Identity, DomainError> {
            Ok(Identity {
                id: user_id.to_string(),
                handle: user_id.to_lowercase(),
                display_name: format!("User {}", user_id),
            })
        }
    }

    fn raw_message(ts: &str, user: Option<&str>, text: &str, reply_count: u32) -> RawMessage {
        RawMessage {
            ts: ts.to_string(),
            user_id: user.map(String::from),
            text: text.to_string(),
            reply_count,
            reactions: vec![Reaction {
                name: "eyes".to_string(),
                count: 2,
            }],
        }
    }

    fn service(gateway: FixtureGateway) -> IngestService {
        let gateway: Arc<dyn SlackGateway> = Arc::new(gateway);
        let identities = Arc::new(IdentityCache::new(Arc::clone(&gateway)));
        let limiter = Arc::new(RateLimiter::new(std::time::Duration::from_millis(0)));
        IngestService::new(gateway, identities, limiter)
    }

    fn two_channel_fixture() -> FixtureGateway {
        let channels = vec![
            Channel {
                id: "C001".to_string(),
                name: "engineering".to_string(),
            },
            Channel {
                id: "C002".to_string(),
                name: "random".to_string(),
            },
        ];
        let mut history = HashMap::new();
        history.insert(
            "C001".to_string(),
            vec![
                raw_message("1.0001", Some("U001"), "Deploy vandaag graag", 1),
                raw_message("1.0002", None, "systeembericht", 0),
            ],
        );
        history.insert("C002".to_string(), vec![]);

        let mut threads = HashMap::new();
        threads.insert(
            ("C001".to_string(), "1.0001".to_string()),
            vec![RawReply {
                ts: "1.0003".to_string(),
                user_id: Some("U002".to_string()),
                text: "Ik pak het op".to_string(),
            }],
        );
        FixtureGateway {
            channels,
            history,
            threads,
        }
    }

    #[tokio::test]
    async fn empty_channels_are_dropped() {
        let result = service(two_channel_fixture())
            .fetch_recent(24, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].channel.id, "C001");
        assert_eq!(result[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn threads_are_enriched_only_when_replies_exist() {
        let result = service(two_channel_fixture())
            .fetch_recent(24, None)
            .await
            .unwrap();

        let messages = &result[0].messages;
        assert_eq!(messages[0].thread_replies.len(), 1);
        assert_eq!(
            messages[0].thread_replies[0]
                .author
                .as_ref()
                .unwrap()
                .display_name,
            "User U002"
        );
        assert!(messages[1].thread_replies.is_empty());
    }

    #[tokio::test]
    async fn system_messages_keep_null_author() {
        let result = service(two_channel_fixture())
            .fetch_recent(24, None)
            .await
            .unwrap();

        let messages = &result[0].messages;
        assert!(messages[0].author.is_some());
        assert!(messages[1].author.is_none());
    }

    #[tokio::test]
    async fn vanished_thread_yields_empty_replies() {
        let mut fixture = two_channel_fixture();
        fixture.threads.clear();

        let result = service(fixture).fetch_recent(24, None).await.unwrap();
        assert!(result[0].messages[0].thread_replies.is_empty());
    }

    #[test]
    fn name_filter_is_case_insensitive_and_strips_hash() {
        let channels = vec![
            Channel {
                id: "C1".to_string(),
                name: "Engineering".to_string(),
            },
            Channel {
                id: "C2".to_string(),
                name: "product".to_string(),
            },
        ];
        let names = vec!["#engineering".to_string()];
        let filtered = filter_channels(channels, Some(&names));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "C1");
    }
}
