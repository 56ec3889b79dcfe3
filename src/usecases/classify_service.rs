//! Classification and ranking: model-backed with a rule-based fallback.
//!
//! The strategy is fixed at construction. Model-backed classification batches
//! messages into chunks; a chunk whose request fails or whose response is
//! incomplete degrades to the rule-based path for that chunk only. Every
//! ingested message yields exactly one item.

use crate::domain::{
    Category, Channel, ChannelMessages, ChunkEntry, ClassifiedItem, DigestResult, DigestStats,
    Message, ModelVerdict, Priority,
};
use crate::ports::ModelPort;
use crate::shared::config::DEFAULT_CHUNK_SIZE;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

static ACTION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(todo|task|actie|graag|kun je|moet|deadline|voor\s+\w+dag|dringend|asap|urgent)\b")
        .unwrap()
});
static DECISION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(besloten|besluit|akkoord|goedgekeurd|we gaan|approved|decided)\b").unwrap()
});
static QUESTION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\?\s*$|\b(vraag|question|weet iemand|heeft iemand|wie kan)\b").unwrap()
});
static ANNOUNCEMENT_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(heads up|fyi|mededeling|announcement|update|nieuws|let op)\b").unwrap()
});
static URGENCY_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(dringend|asap|urgent)\b").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@(\w+)>").unwrap());

/// Classifies ingested messages and produces the ranked digest.
pub struct ClassifyService {
    model: Option<Arc<dyn ModelPort>>,
    chunk_size: usize,
}

impl ClassifyService {
    /// Strategy is chosen here, once per run: model-backed when a port is
    /// given, rule-based otherwise.
    pub fn new(model: Option<Arc<dyn ModelPort>>) -> Self {
        Self {
            model,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Classify every ingested message and produce the ranked digest.
    ///
    /// Output invariants: one item per input message; items sorted by
    /// priority, then category precedence, ties broken by input order.
    pub async fn classify(&self, channel_messages: &[ChannelMessages]) -> DigestResult {
        let mut items = Vec::new();

        for group in channel_messages {
            if group.messages.is_empty() {
                continue;
            }

            let entries: Vec<ChunkEntry> = group
                .messages
                .iter()
                .map(|m| chunk_entry(&group.channel, m))
                .collect();

            let verdicts = match &self.model {
                Some(model) => self.classify_chunked(model.as_ref(), &entries).await,
                None => rule_based(&entries),
            };

            for (verdict, message) in verdicts.iter().zip(&group.messages) {
                items.push(build_item(&group.channel, message, verdict));
            }
        }

        // Stable sort keeps the input order (channel listing order, then
        // message order) as the tie breaker.
        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.category.cmp(&b.category))
        });

        let stats = compute_stats(channel_messages, &items);
        info!(
            items = items.len(),
            action_items = stats.action_items,
            decisions = stats.decisions,
            questions = stats.questions,
            "classification complete"
        );

        DigestResult { items, stats }
    }

    /// Run the model over fixed-size chunks. Returns verdicts in entry order.
    ///
    /// Partial degradation: a chunk whose call fails, or whose response does
    /// not answer every id in the chunk, falls back to the rule-based path
    /// for that chunk only.
    async fn classify_chunked(
        &self,
        model: &dyn ModelPort,
        entries: &[ChunkEntry],
    ) -> Vec<ModelVerdict> {
        let mut verdicts = Vec::with_capacity(entries.len());

        for chunk in entries.chunks(self.chunk_size) {
            match model.classify_chunk(chunk).await {
                Ok(answers) => {
                    let by_id: HashMap<String, ModelVerdict> =
                        answers.into_iter().map(|v| (v.id.clone(), v)).collect();
                    if chunk.iter().all(|e| by_id.contains_key(&e.id)) {
                        verdicts.extend(chunk.iter().map(|e| by_id[&e.id].clone()));
                    } else {
                        warn!(
                            chunk = chunk.len(),
                            answered = by_id.len(),
                            "model response incomplete, falling back to rules for chunk"
                        );
                        verdicts.extend(rule_based(chunk));
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        chunk = chunk.len(),
                        "model classification failed, falling back to rules for chunk"
                    );
                    verdicts.extend(rule_based(chunk));
                }
            }
        }

        verdicts
    }
}

/// Shape one message the way the classifier sees it: display name, text,
/// concatenated thread text and reaction summary.
fn chunk_entry(channel: &Channel, message: &Message) -> ChunkEntry {
    let thread = if message.thread_replies.is_empty() {
        None
    } else {
        Some(
            message
                .thread_replies
                .iter()
                .map(|r| {
                    let name = r
                        .author
                        .as_ref()
                        .map(|a| a.display_name.as_str())
                        .unwrap_or("?");
                    format!("{}: {}", name, r.text)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    };

    let reactions = if message.reactions.is_empty() {
        None
    } else {
        Some(
            message
                .reactions
                .iter()
                .map(|r| format!("{} ({})", r.name, r.count))
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    ChunkEntry {
        id: message.id.clone(),
        channel: channel.name.clone(),
        user: message
            .author
            .as_ref()
            .map(|a| a.display_name.clone())
            .unwrap_or_else(|| "Onbekend".to_string()),
        text: message.text.clone(),
        thread,
        reactions,
    }
}

fn build_item(channel: &Channel, message: &Message, verdict: &ModelVerdict) -> ClassifiedItem {
    ClassifiedItem {
        id: message.id.clone(),
        category: verdict.category,
        summary: truncate_summary(&verdict.summary),
        priority: verdict.priority,
        assignee: verdict.assignee.clone(),
        deadline: verdict.deadline.clone(),
        channel: channel.clone(),
        source_message: message.clone(),
        timestamp: message.timestamp.clone(),
    }
}

/// Deterministic keyword classification over the message text concatenated
/// with its thread text, in fixed precedence order: action intent, decision,
/// question, announcement, else FYI. Never fabricates a summary; it
/// truncates the raw text. Deadline extraction is not attempted.
pub fn rule_based(entries: &[ChunkEntry]) -> Vec<ModelVerdict> {
    entries.iter().map(rule_verdict).collect()
}

fn rule_verdict(entry: &ChunkEntry) -> ModelVerdict {
    let text = format!("{} {}", entry.text, entry.thread.as_deref().unwrap_or(""));

    let (category, priority) = if ACTION_WORDS.is_match(&text) {
        let priority = if URGENCY_WORDS.is_match(&text) {
            Priority::High
        } else {
            Priority::Medium
        };
        (Category::ActionItem, priority)
    } else if DECISION_WORDS.is_match(&text) {
        (Category::Decision, Priority::Medium)
    } else if QUESTION_WORDS.is_match(&text) {
        (Category::Question, Priority::Medium)
    } else if ANNOUNCEMENT_WORDS.is_match(&text) {
        (Category::Announcement, Priority::Low)
    } else {
        (Category::Fyi, Priority::Low)
    };

    let assignee = MENTION
        .captures(&text)
        .map(|caps| caps[1].to_string());

    ModelVerdict {
        id: entry.id.clone(),
        category,
        summary: truncate_summary(&entry.text),
        priority,
        assignee,
        deadline: None,
    }
}

/// Truncate to 100 characters with an ellipsis marker, on a char boundary.
pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() > 100 {
        let head: String = text.chars().take(97).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Pure fold over the ingestion output and the classified items.
pub fn compute_stats(
    channel_messages: &[ChannelMessages],
    items: &[ClassifiedItem],
) -> DigestStats {
    let mut stats = DigestStats::default();

    for group in channel_messages {
        stats.total_messages += group.messages.len();
        stats.total_threads += group
            .messages
            .iter()
            .filter(|m| !m.thread_replies.is_empty())
            .count();
        if !group.messages.is_empty() {
            stats.total_channels += 1;
        }
    }

    for item in items {
        match item.category {
            Category::ActionItem => stats.action_items += 1,
            Category::Decision => stats.decisions += 1,
            Category::Question => stats.questions += 1,
            Category::Announcement => stats.announcements += 1,
            Category::Fyi => stats.fyi += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    fn entry(id: &str, text: &str) -> ChunkEntry {
        ChunkEntry {
            id: id.to_string(),
            channel: "engineering".to_string(),
            user: "Jane".to_string(),
            text: text.to_string(),
            thread: None,
            reactions: None,
        }
    }

    fn message(id: &str, text: &str) -> Message {
        Message {
            id: id.to_string(),
            author: None,
            text: text.to_string(),
            timestamp: id.to_string(),
            thread_replies: vec![],
            reactions: vec![],
        }
    }

    fn group(channel_id: &str, messages: Vec<Message>) -> ChannelMessages {
        ChannelMessages {
            channel: Channel {
                id: channel_id.to_string(),
                name: channel_id.to_lowercase(),
            },
            messages,
        }
    }

    #[test]
    fn urgent_action_phrase_is_high_priority_action_item() {
        let verdicts = rule_based(&[entry("1", "Kun je dit vandaag dringend deployen?")]);
        assert_eq!(verdicts[0].category, Category::ActionItem);
        assert_eq!(verdicts[0].priority, Priority::High);
    }

    #[test]
    fn decision_phrase_is_medium_priority_decision() {
        let verdicts = rule_based(&[entry(
            "1",
            "We hebben besloten om PostgreSQL te gebruiken",
        )]);
        assert_eq!(verdicts[0].category, Category::Decision);
        assert_eq!(verdicts[0].priority, Priority::Medium);
    }

    #[test]
    fn trailing_question_mark_is_question() {
        let verdicts = rule_based(&[entry("1", "Hebben we al een staging omgeving?")]);
        assert_eq!(verdicts[0].category, Category::Question);
        assert_eq!(verdicts[0].priority, Priority::Medium);
    }

    #[test]
    fn announcement_marker_is_low_priority() {
        let verdicts = rule_based(&[entry("1", "Heads up: rate limits wijzigen per 1 maart")]);
        assert_eq!(verdicts[0].category, Category::Announcement);
        assert_eq!(verdicts[0].priority, Priority::Low);
    }

    #[test]
    fn unmatched_text_defaults_to_fyi_low() {
        let verdicts = rule_based(&[entry("1", "NPS score van deze maand is 72")]);
        assert_eq!(verdicts[0].category, Category::Fyi);
        assert_eq!(verdicts[0].priority, Priority::Low);
        assert!(verdicts[0].deadline.is_none());
    }

    #[test]
    fn mention_token_becomes_assignee() {
        let verdicts = rule_based(&[entry("1", "<@U042> kun je de presentatie voorbereiden?")]);
        assert_eq!(verdicts[0].assignee.as_deref(), Some("U042"));
    }

    #[test]
    fn thread_text_participates_in_matching() {
        let mut e = entry("1", "Zie de laatste stand van zaken");
        e.thread = Some("Bob: dit is dringend, graag vandaag oppakken".to_string());
        let verdicts = rule_based(&[e]);
        assert_eq!(verdicts[0].category, Category::ActionItem);
        assert_eq!(verdicts[0].priority, Priority::High);
    }

    #[test]
    fn rules_are_deterministic() {
        let input = entry("1", "Kun je de v2.1 hotfix deployen? Het is dringend.");
        let a = rule_based(&[input.clone()]);
        let b = rule_based(&[input]);
        assert_eq!(a[0].category, b[0].category);
        assert_eq!(a[0].priority, b[0].priority);
        assert_eq!(a[0].summary, b[0].summary);
        assert_eq!(a[0].assignee, b[0].assignee);
    }

    #[test]
    fn summary_truncates_at_100_chars() {
        let long = "x".repeat(150);
        let summary = truncate_summary(&long);
        assert_eq!(summary.chars().count(), 100);
        assert!(summary.ends_with("..."));

        let short = "korte tekst";
        assert_eq!(truncate_summary(short), short);
    }

    #[tokio::test]
    async fn rule_based_run_keeps_every_message() {
        let groups = vec![
            group(
                "C001",
                vec![
                    message("1", "Kun je dit dringend oppakken?"),
                    message("2", "We hebben besloten te migreren"),
                    message("3", "gewoon een berichtje"),
                ],
            ),
            group("C002", vec![message("4", "Weet iemand hoe dit werkt?")]),
        ];

        let digest = ClassifyService::new(None).classify(&groups).await;
        assert_eq!(digest.items.len(), 4);
        assert_eq!(digest.stats.total_messages, 4);
        assert_eq!(digest.stats.total_channels, 2);
    }

    #[tokio::test]
    async fn items_are_ranked_by_priority_then_category() {
        let groups = vec![group(
            "C001",
            vec![
                message("1", "gewoon een berichtje"),
                message("2", "We hebben besloten om te migreren"),
                message("3", "Dit is dringend: kun je de fix deployen"),
                message("4", "Weet iemand of dit al live is?"),
            ],
        )];

        let digest = ClassifyService::new(None).classify(&groups).await;

        let priorities: Vec<Priority> = digest.items.iter().map(|i| i.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);

        // Within the medium band, decision precedes question.
        assert_eq!(digest.items[0].priority, Priority::High);
        assert_eq!(digest.items[1].category, Category::Decision);
        assert_eq!(digest.items[2].category, Category::Question);
        assert_eq!(digest.items[3].category, Category::Fyi);
    }

    #[test]
    fn stats_are_idempotent() {
        let groups = vec![group(
            "C001",
            vec![message("1", "bericht"), message("2", "nog een bericht")],
        )];
        let items: Vec<ClassifiedItem> = vec![];
        let a = compute_stats(&groups, &items);
        let b = compute_stats(&groups, &items);
        assert_eq!(a, b);
        assert_eq!(a.total_messages, 2);
        assert_eq!(a.total_threads, 0);
    }

    /// Model that always fails, to exercise the per-chunk fallback.
    struct FailingModel;

    #[async_trait::async_trait]
    impl ModelPort for FailingModel {
        async fn classify_chunk(
            &self,
            _chunk: &[ChunkEntry],
        ) -> Result<Vec<ModelVerdict>, DomainError> {
            Err(DomainError::Model("boom".to_string()))
        }
    }

    /// Model that answers only the first id of each chunk.
    struct PartialModel;

    #[async_trait::async_trait]
    impl ModelPort for PartialModel {
        async fn classify_chunk(
            &self,
            chunk: &[ChunkEntry],
        ) -> Result<Vec<ModelVerdict>, DomainError> {
            Ok(chunk
                .iter()
                .take(1)
                .map(|e| ModelVerdict {
                    id: e.id.clone(),
                    category: Category::Decision,
                    summary: "model summary".to_string(),
                    priority: Priority::Medium,
                    assignee: None,
                    deadline: None,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn failing_model_still_classifies_every_message() {
        let messages: Vec<Message> = (0..30)
            .map(|i| message(&i.to_string(), "Kun je dit dringend oppakken?"))
            .collect();
        let groups = vec![group("C001", messages)];

        let digest = ClassifyService::new(Some(Arc::new(FailingModel)))
            .classify(&groups)
            .await;

        assert_eq!(digest.items.len(), 30);
        // Fallback classified them via rules.
        assert!(
            digest
                .items
                .iter()
                .all(|i| i.category == Category::ActionItem)
        );
    }

    #[tokio::test]
    async fn incomplete_model_response_fails_the_whole_chunk() {
        let groups = vec![group(
            "C001",
            vec![
                message("1", "eerste bericht zonder keywords"),
                message("2", "tweede bericht zonder keywords"),
            ],
        )];

        let digest = ClassifyService::new(Some(Arc::new(PartialModel)))
            .classify(&groups)
            .await;

        // Both messages present, and neither got the model's Decision verdict:
        // the chunk as a whole degraded to rules (FYI).
        assert_eq!(digest.items.len(), 2);
        assert!(digest.items.iter().all(|i| i.category == Category::Fyi));
    }

    #[tokio::test]
    async fn model_verdicts_are_matched_by_id_not_order() {
        /// Answers every id, in reverse order.
        struct ReversingModel;

        #[async_trait::async_trait]
        impl ModelPort for ReversingModel {
            async fn classify_chunk(
                &self,
                chunk: &[ChunkEntry],
            ) -> Result<Vec<ModelVerdict>, DomainError> {
                Ok(chunk
                    .iter()
                    .rev()
                    .map(|e| ModelVerdict {
                        id: e.id.clone(),
                        category: Category::Announcement,
                        summary: format!("samenvatting van {}", e.id),
                        priority: Priority::Low,
                        assignee: None,
                        deadline: None,
                    })
                    .collect())
            }
        }

        let groups = vec![group(
            "C001",
            vec![message("1", "eerste"), message("2", "tweede")],
        )];
        let digest = ClassifyService::new(Some(Arc::new(ReversingModel)))
            .classify(&groups)
            .await;

        assert_eq!(digest.items[0].id, "1");
        assert_eq!(digest.items[0].summary, "samenvatting van 1");
        assert_eq!(digest.items[1].id, "2");
    }
}
