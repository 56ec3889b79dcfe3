//! Notion adapter. Implements ExportPort by creating a digest page via the
//! Notion REST API.

use crate::domain::{Category, ClassifiedItem, DigestResult, DomainError, Priority};
use crate::ports::ExportPort;
use chrono::{Datelike, Local};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

const NOTION_PAGES_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion caps page creation at 100 children blocks per request.
const MAX_CHILDREN: usize = 100;

const MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

/// Notion API adapter for pushing digest pages into a database.
///
/// Requires an integration token and a database id the integration has been
/// shared with.
pub struct NotionAdapter {
    client: Client,
    api_key: String,
    database_id: String,
}

#[derive(Deserialize)]
struct PageResponse {
    url: String,
}

impl NotionAdapter {
    /// # Arguments
    /// * `api_key` - Notion integration token
    /// * `database_id` - ID of the database where digest pages are created
    pub fn new(api_key: String, database_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            database_id,
        }
    }

    fn category_emoji(category: Category) -> &'static str {
        match category {
            Category::ActionItem => "\u{2705}",
            Category::Decision => "\u{1F7E2}",
            Category::Announcement => "\u{1F4E2}",
            Category::Question => "\u{2753}",
            Category::Fyi => "\u{1F4CC}",
        }
    }

    fn rich_text(item: &ClassifiedItem) -> Vec<Value> {
        let mut parts = vec![json!({
            "type": "text",
            "text": { "content": item.summary },
            "annotations": { "bold": item.priority == Priority::High },
        })];

        let mut meta = Vec::new();
        if let Some(assignee) = &item.assignee {
            meta.push(format!("@{}", assignee));
        }
        meta.push(format!("#{}", item.channel.name));
        if let Some(deadline) = &item.deadline {
            meta.push(format!("\u{1F4C5} {}", deadline));
        }

        if !meta.is_empty() {
            parts.push(json!({
                "type": "text",
                "text": { "content": format!("  \u{2014}  {}", meta.join("  ")) },
                "annotations": { "color": "gray" },
            }));
        }

        parts
    }

    fn build_children(digest: &DigestResult) -> Vec<Value> {
        let stats = &digest.stats;
        let today = format_date_nl();

        let mut children = vec![
            json!({
                "object": "block",
                "type": "heading_2",
                "heading_2": {
                    "rich_text": [{ "type": "text", "text": { "content": format!("Overzicht - {}", today) } }],
                },
            }),
            json!({
                "object": "block",
                "type": "callout",
                "callout": {
                    "icon": { "type": "emoji", "emoji": "\u{1F4CA}" },
                    "rich_text": [{
                        "type": "text",
                        "text": { "content": format!(
                            "{} berichten | {} kanalen | {} taken | {} beslissingen",
                            stats.total_messages, stats.total_channels,
                            stats.action_items, stats.decisions,
                        ) },
                    }],
                },
            }),
            json!({ "object": "block", "type": "divider", "divider": {} }),
        ];

        for category in Category::ORDERED {
            let items: Vec<&ClassifiedItem> = digest
                .items
                .iter()
                .filter(|i| i.category == category)
                .collect();
            if items.is_empty() {
                continue;
            }

            children.push(json!({
                "object": "block",
                "type": "heading_3",
                "heading_3": {
                    "rich_text": [{
                        "type": "text",
                        "text": { "content": format!(
                            "{} {}",
                            Self::category_emoji(category),
                            category.label(),
                        ) },
                    }],
                },
            }));

            for item in items {
                if category == Category::ActionItem {
                    children.push(json!({
                        "object": "block",
                        "type": "to_do",
                        "to_do": { "checked": false, "rich_text": Self::rich_text(item) },
                    }));
                } else {
                    children.push(json!({
                        "object": "block",
                        "type": "bulleted_list_item",
                        "bulleted_list_item": { "rich_text": Self::rich_text(item) },
                    }));
                }
            }

            children.push(json!({ "object": "block", "type": "divider", "divider": {} }));
        }

        children.truncate(MAX_CHILDREN);
        children
    }
}

#[async_trait::async_trait]
impl ExportPort for NotionAdapter {
    async fn push_digest(&self, digest: &DigestResult) -> Result<String, DomainError> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": {
                "title": {
                    "title": [{ "text": { "content": format!("Daily Summary - {}", format_date_nl()) } }],
                },
            },
            "children": Self::build_children(digest),
        });

        let response = self
            .client
            .post(NOTION_PAGES_URL)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Export(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::Export(format!(
                "Notion API error {}: {}",
                status, text
            )));
        }

        let page: PageResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Export(format!("Failed to parse Notion response: {}", e)))?;

        info!(url = %page.url, "digest page created");
        Ok(page.url)
    }
}

fn format_date_nl() -> String {
    let now = Local::now();
    format!(
        "{} {} {}",
        now.day(),
        MONTHS[now.month0() as usize],
        now.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, DigestStats, Message};

    fn digest_with_action_item() -> DigestResult {
        let message = Message {
            id: "1.0".to_string(),
            author: None,
            text: "Deploy vandaag".to_string(),
            timestamp: "1.0".to_string(),
            thread_replies: vec![],
            reactions: vec![],
        };
        DigestResult {
            items: vec![ClassifiedItem {
                id: "1.0".to_string(),
                category: Category::ActionItem,
                summary: "Hotfix deployen".to_string(),
                priority: Priority::High,
                assignee: Some("Bob".to_string()),
                deadline: Some("vrijdag".to_string()),
                channel: Channel {
                    id: "C001".to_string(),
                    name: "engineering".to_string(),
                },
                source_message: message,
                timestamp: "1.0".to_string(),
            }],
            stats: DigestStats {
                total_messages: 1,
                total_channels: 1,
                action_items: 1,
                ..Default::default()
            },
        }
    }

    #[test]
    fn action_items_become_todo_blocks() {
        let children = NotionAdapter::build_children(&digest_with_action_item());

        let todos: Vec<&Value> = children
            .iter()
            .filter(|c| c["type"] == "to_do")
            .collect();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0]["to_do"]["checked"], false);

        // Bold because of high priority, with assignee and channel in the meta.
        let rich = &todos[0]["to_do"]["rich_text"];
        assert_eq!(rich[0]["annotations"]["bold"], true);
        let meta = rich[1]["text"]["content"].as_str().unwrap();
        assert!(meta.contains("@Bob"));
        assert!(meta.contains("#engineering"));
    }

    #[test]
    fn children_stay_under_notion_limit() {
        let mut digest = digest_with_action_item();
        let template = digest.items[0].clone();
        for i in 0..200 {
            let mut it = template.clone();
            it.id = format!("1.{}", i);
            digest.items.push(it);
        }

        let children = NotionAdapter::build_children(&digest);
        assert!(children.len() <= MAX_CHILDREN);
    }

    #[test]
    fn empty_digest_builds_header_only() {
        let digest = DigestResult {
            items: vec![],
            stats: DigestStats::default(),
        };
        let children = NotionAdapter::build_children(&digest);
        // Heading, stats callout, divider; no category sections.
        assert_eq!(children.len(), 3);
    }
}
