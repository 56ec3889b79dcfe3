//! Domain entities. Pure data structures for the core business.
//!
//! No Slack/IO types here — these are mapped from adapters.

use serde::{Deserialize, Serialize};

/// A Slack channel the credential is a member of. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

/// A resolved workspace member. Keyed by `id`; resolution is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub handle: String,
    pub display_name: String,
}

impl Identity {
    /// Fallback when the directory lookup fails: the raw id doubles as handle
    /// and display name.
    pub fn fallback(id: &str) -> Self {
        Self {
            id: id.to_string(),
            handle: id.to_string(),
            display_name: id.to_string(),
        }
    }
}

/// Emoji reaction tally on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub count: u32,
}

/// History entry as returned by the gateway, before identity and thread
/// enrichment. `ts` is Slack's native message timestamp, unique per channel.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub ts: String,
    pub user_id: Option<String>,
    pub text: String,
    pub reply_count: u32,
    pub reactions: Vec<Reaction>,
}

/// Thread reply as returned by the gateway, parent already stripped.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub ts: String,
    pub user_id: Option<String>,
    pub text: String,
}

/// A reply attached to a parent message's thread, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub author: Option<Identity>,
    pub text: String,
    pub timestamp: String,
}

/// A fully enriched channel message. System messages keep `author = None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Slack ts, stable and unique within a channel. Classification output is
    /// correlated back to its source through this id.
    pub id: String,
    pub author: Option<Identity>,
    pub text: String,
    pub timestamp: String,
    pub thread_replies: Vec<Reply>,
    pub reactions: Vec<Reaction>,
}

/// The unit exchanged between ingestion and classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessages {
    pub channel: Channel,
    pub messages: Vec<Message>,
}

/// Semantic category of a classified message.
///
/// Declaration order is ranking precedence; the derived `Ord` drives the
/// digest's total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    ActionItem,
    Decision,
    Question,
    Announcement,
    Fyi,
}

impl Category {
    /// All categories in ranking precedence order.
    pub const ORDERED: [Category; 5] = [
        Category::ActionItem,
        Category::Decision,
        Category::Question,
        Category::Announcement,
        Category::Fyi,
    ];

    /// Section label shown in the rendered digest.
    pub fn label(&self) -> &'static str {
        match self {
            Category::ActionItem => "Taken",
            Category::Decision => "Beslissingen",
            Category::Question => "Open Vragen",
            Category::Announcement => "Mededelingen",
            Category::Fyi => "Om te Onthouden",
        }
    }

    /// Accent color used by the renderer.
    pub fn color(&self) -> &'static str {
        match self {
            Category::ActionItem => "#007AFF",
            Category::Decision => "#34C759",
            Category::Question => "#FF9500",
            Category::Announcement => "#AF52DE",
            Category::Fyi => "#8E8E93",
        }
    }
}

/// Item priority. Declaration order is ranking precedence: high sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One message as presented to the classification model inside a chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkEntry {
    pub id: String,
    pub channel: String,
    pub user: String,
    pub text: String,
    /// Concatenated thread-reply text, or None when the message has no thread.
    pub thread: Option<String>,
    /// Concatenated reaction summary, or None when the message has none.
    pub reactions: Option<String>,
}

/// Per-message verdict parsed from a model response (or produced by the
/// rule-based path).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelVerdict {
    pub id: String,
    pub category: Category,
    pub summary: String,
    pub priority: Priority,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

/// A classified message. Exactly one per ingested message, never split,
/// never dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedItem {
    pub id: String,
    pub category: Category,
    /// At most 100 characters, ellipsis-truncated.
    pub summary: String,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub deadline: Option<String>,
    pub channel: Channel,
    pub source_message: Message,
    pub timestamp: String,
}

/// Digest statistics. A pure fold over the ingestion output and the items;
/// recomputable from the same inputs at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigestStats {
    pub total_messages: usize,
    /// Channels that contributed at least one message.
    pub total_channels: usize,
    /// Messages with at least one thread reply.
    pub total_threads: usize,
    pub action_items: usize,
    pub decisions: usize,
    pub questions: usize,
    pub announcements: usize,
    pub fyi: usize,
}

/// Terminal artifact of a run: ranked items plus statistics. Owned solely by
/// the caller after production.
#[derive(Debug, Clone, Serialize)]
pub struct DigestResult {
    pub items: Vec<ClassifiedItem>,
    pub stats: DigestStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names_are_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Category::ActionItem).unwrap(),
            "\"ACTION_ITEM\""
        );
        assert_eq!(serde_json::to_string(&Category::Fyi).unwrap(), "\"FYI\"");
        let parsed: Category = serde_json::from_str("\"DECISION\"").unwrap();
        assert_eq!(parsed, Category::Decision);
    }

    #[test]
    fn priority_orders_high_first() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
    }

    #[test]
    fn category_order_matches_precedence() {
        assert!(Category::ActionItem < Category::Decision);
        assert!(Category::Decision < Category::Question);
        assert!(Category::Question < Category::Announcement);
        assert!(Category::Announcement < Category::Fyi);
    }

    #[test]
    fn fallback_identity_uses_raw_id() {
        let id = Identity::fallback("U123");
        assert_eq!(id.id, "U123");
        assert_eq!(id.handle, "U123");
        assert_eq!(id.display_name, "U123");
    }
}
