//! Mock Slack gateway for dry runs and tests without API calls.
//!
//! Serves a small fixed workspace: three channels, a handful of messages,
//! one thread per channel where relevant. Timestamps are relative to now so
//! any reasonable lookback window includes them.

use crate::domain::{Channel, DomainError, Identity, RawMessage, RawReply, Reaction};
use crate::ports::SlackGateway;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tracing::info;

/// In-memory gateway with predetermined workspace content.
pub struct MockSlackGateway {
    channels: Vec<Channel>,
    history: HashMap<String, Vec<RawMessage>>,
    threads: HashMap<(String, String), Vec<RawReply>>,
    directory: HashMap<String, Identity>,
}

impl MockSlackGateway {
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        let ts = |offset: i64| format!("{}.000000", now - offset);

        let channels = vec![
            channel("C001", "engineering"),
            channel("C002", "product"),
            channel("C003", "general"),
        ];

        let mut history = HashMap::new();
        history.insert(
            "C001".to_string(),
            vec![
                raw(
                    &ts(3600),
                    Some("U001"),
                    "Kun je de v2.1 hotfix deployen naar productie vandaag? Het is dringend.",
                    1,
                    vec![reaction("eyes", 2)],
                ),
                raw(
                    &ts(7200),
                    Some("U003"),
                    "We hebben besloten om over te stappen naar PostgreSQL voor de nieuwe service. Migration plan volgt volgende week.",
                    0,
                    vec![reaction("+1", 5)],
                ),
                raw(
                    &ts(5400),
                    Some("U002"),
                    "Heads up: de API rate limits worden per 1 maart aangepast. Zie docs voor details.",
                    0,
                    vec![],
                ),
                raw(
                    &ts(4800),
                    Some("U004"),
                    "Weet iemand of we al een staging environment hebben voor de nieuwe microservice?",
                    1,
                    vec![],
                ),
            ],
        );
        history.insert(
            "C002".to_string(),
            vec![
                raw(
                    &ts(6000),
                    Some("U005"),
                    "<@U008> Kun je de client presentatie voorbereiden voor vrijdag? Graag de nieuwe features meenemen.",
                    0,
                    vec![],
                ),
                raw(
                    &ts(2400),
                    Some("U006"),
                    "NPS score van deze maand is 72, een stijging van 8 punten. Goed bezig team!",
                    0,
                    vec![reaction("tada", 8), reaction("rocket", 3)],
                ),
            ],
        );
        history.insert(
            "C003".to_string(),
            vec![
                raw(
                    &ts(1800),
                    Some("U007"),
                    "Nieuwe collega Lisa begint maandag! Ze gaat bij het design team zitten. Welkom!",
                    0,
                    vec![reaction("wave", 12)],
                ),
                raw(
                    &ts(900),
                    Some("U001"),
                    "Todo voor iedereen: vul je OKRs in voor Q2. Deadline is aanstaande vrijdag.",
                    0,
                    vec![],
                ),
            ],
        );

        let mut threads = HashMap::new();
        threads.insert(
            ("C001".to_string(), ts(3600)),
            vec![RawReply {
                ts: ts(3400),
                user_id: Some("U002".to_string()),
                text: "Ik pak het op, wordt voor 15:00.".to_string(),
            }],
        );
        threads.insert(
            ("C001".to_string(), ts(4800)),
            vec![RawReply {
                ts: ts(4600),
                user_id: Some("U001".to_string()),
                text: "Nog niet, staat op de roadmap voor Q2.".to_string(),
            }],
        );

        let directory = [
            identity("U001", "janedoe", "Jane"),
            identity("U002", "bob", "Bob"),
            identity("U003", "alice", "Alice"),
            identity("U004", "charlie", "Charlie"),
            identity("U005", "diana", "Diana"),
            identity("U006", "erik", "Erik"),
            identity("U007", "frank", "Frank"),
        ]
        .into_iter()
        .map(|id| (id.id.clone(), id))
        .collect();

        Self {
            channels,
            history,
            threads,
            directory,
        }
    }
}

impl Default for MockSlackGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlackGateway for MockSlackGateway {
    async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
        info!("[MOCK] listing channels");
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
        Ok(self
            .threads
            .get(&(channel_id.to_string(), thread_ts.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn lookup_identity(&self, user_id: &str) -> Result<Identity, DomainError> {
        self.directory
            .get(user_id)
            .cloned()
            .ok_or_else(|| DomainError::SlackGateway(format!("user {} not found", user_id)))
    }
}

fn channel(id: &str, name: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn raw(
    ts: &str,
    user: Option<&str>,
    text: &str,
    reply_count: u32,
    reactions: Vec<Reaction>,
) -> RawMessage {
    RawMessage {
        ts: ts.to_string(),
        user_id: user.map(String::from),
        text: text.to_string(),
        reply_count,
        reactions,
    }
}

fn reaction(name: &str, count: u32) -> Reaction {
    Reaction {
        name: name.to_string(),
        count,
    }
}

fn identity(id: &str, handle: &str, display_name: &str) -> Identity {
    Identity {
        id: id.to_string(),
        handle: handle.to_string(),
        display_name: display_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_workspace_shape() {
        let gateway = MockSlackGateway::new();

        let channels = gateway.list_channels().await.unwrap();
        assert_eq!(channels.len(), 3);

        let engineering = gateway.fetch_history("C001", 0).await.unwrap();
        assert_eq!(engineering.len(), 4);

        let replies = gateway
            .fetch_thread_replies("C001", &engineering[0].ts)
            .await
            .unwrap();
        assert_eq!(replies.len(), 1);

        let jane = gateway.lookup_identity("U001").await.unwrap();
        assert_eq!(jane.display_name, "Jane");
        assert!(gateway.lookup_identity("U999").await.is_err());
    }
}
