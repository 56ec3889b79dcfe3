//! HTML dashboard renderer. Pure and stateless: consumes a DigestResult and
//! produces a self-contained page, with a defined empty state when no items
//! were found.

use crate::domain::{Category, ClassifiedItem, DigestResult, DigestStats, Priority};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

const WEEKDAYS: [&str; 7] = [
    "maandag",
    "dinsdag",
    "woensdag",
    "donderdag",
    "vrijdag",
    "zaterdag",
    "zondag",
];

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

/// Render the digest to a full HTML page.
pub fn render(digest: &DigestResult, now: DateTime<Local>) -> String {
    let date_formatted = format!(
        "{} {} {}",
        now.day(),
        MONTHS[now.month0() as usize],
        now.year()
    );
    let date_weekday = WEEKDAYS[now.weekday().num_days_from_monday() as usize];
    let generated_at = format!("{:02}:{:02}", now.hour(), now.minute());

    let mut sections = Vec::new();
    for category in Category::ORDERED {
        let items: Vec<&ClassifiedItem> = digest
            .items
            .iter()
            .filter(|i| i.category == category)
            .collect();
        if !items.is_empty() {
            sections.push(render_section(category, &items));
        }
    }

    if sections.is_empty() {
        sections.push(
            r#"
      <div class="empty-state">
        <div class="empty-state-icon">&#9728;</div>
        <div class="empty-state-text">Geen belangrijke items gevonden in de afgelopen periode.</div>
      </div>"#
                .to_string(),
        );
    }

    TEMPLATE
        .replace("{{DATE_FORMATTED}}", &date_formatted)
        .replace("{{DATE_WEEKDAY}}", date_weekday)
        .replace("{{GENERATED_AT}}", &generated_at)
        .replace("{{STATS_HTML}}", &render_stats(&digest.stats))
        .replace("{{SECTIONS_HTML}}", &sections.join("\n"))
}

fn render_stats(stats: &DigestStats) -> String {
    let cards = [
        (stats.total_messages, "Berichten", ""),
        (stats.total_channels, "Kanalen", ""),
        (stats.action_items, "Taken", "accent"),
        (stats.decisions, "Beslissingen", "green"),
    ];

    cards
        .iter()
        .map(|(value, label, css)| {
            format!(
                r#"
      <div class="stat-card {}">
        <div class="stat-value">{}</div>
        <div class="stat-label">{}</div>
      </div>"#,
                css,
                value,
                escape_html(label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_section(category: Category, items: &[&ClassifiedItem]) -> String {
    let items_html: String = items.iter().map(|item| render_item(item)).collect();

    format!(
        r#"
    <div class="section">
      <div class="section-header">
        <div class="section-dot" style="background:{}"></div>
        <div class="section-title">{}</div>
        <div class="section-count">{}</div>
      </div>
      <div class="card">
        {}
      </div>
    </div>"#,
        category.color(),
        escape_html(category.label()),
        items.len(),
        items_html
    )
}

fn render_item(item: &ClassifiedItem) -> String {
    let left = if item.category == Category::ActionItem {
        r#"<div class="item-check" role="checkbox" aria-checked="false" tabindex="0"></div>"#
            .to_string()
    } else {
        format!(
            r#"<div class="item-dot" style="background:{}"></div>"#,
            item.category.color()
        )
    };

    let summary_class = if item.priority == Priority::High {
        "item-summary high"
    } else {
        "item-summary"
    };

    let mut meta = Vec::new();
    meta.push(format!(
        r#"<span class="item-tag item-tag-channel">#{}</span>"#,
        escape_html(&item.channel.name)
    ));
    if let Some(assignee) = &item.assignee {
        meta.push(format!(
            r#"<span class="item-tag item-tag-assignee">@{}</span>"#,
            escape_html(assignee)
        ));
    }
    if let Some(deadline) = &item.deadline {
        meta.push(format!(
            r#"<span class="item-tag item-tag-deadline">{}</span>"#,
            escape_html(deadline)
        ));
    }
    match item.priority {
        Priority::High => meta.push(
            r#"<span class="item-tag item-tag-priority priority-high">Hoog</span>"#.to_string(),
        ),
        Priority::Medium => meta.push(
            r#"<span class="item-tag item-tag-priority priority-medium">Medium</span>"#.to_string(),
        ),
        Priority::Low => {}
    }
    meta.push(format!(
        r#"<span class="item-tag">{}</span>"#,
        format_timestamp(&item.timestamp)
    ));

    format!(
        r#"
        <div class="item">
          {}
          <div class="item-content">
            <div class="{}">{}</div>
            <div class="item-meta">{}</div>
            {}
          </div>
        </div>"#,
        left,
        summary_class,
        escape_html(&item.summary),
        meta.join(""),
        render_thread(item)
    )
}

fn render_thread(item: &ClassifiedItem) -> String {
    let replies = &item.source_message.thread_replies;
    let Some(first) = replies.first() else {
        return String::new();
    };

    let reply_line = |author: Option<&str>, text: &str| {
        format!(
            r#"<div class="thread-reply"><span class="thread-reply-user">{}:</span> {}</div>"#,
            escape_html(author.unwrap_or("?")),
            escape_html(&preview_text(text))
        )
    };

    let first_html = reply_line(
        first.author.as_ref().map(|a| a.display_name.as_str()),
        &first.text,
    );

    let rest = &replies[1..];
    let rest_html = if rest.is_empty() {
        String::new()
    } else {
        let lines: String = rest
            .iter()
            .map(|r| reply_line(r.author.as_ref().map(|a| a.display_name.as_str()), &r.text))
            .collect();
        format!(
            r#"<details class="item-thread-more"><summary>{} meer reacties</summary>{}</details>"#,
            rest.len(),
            lines
        )
    };

    format!(
        r#"
            <div class="item-thread">
              {}
              {}
            </div>"#,
        first_html, rest_html
    )
}

/// Thread replies are previewed at 120 characters.
fn preview_text(text: &str) -> String {
    if text.chars().count() > 120 {
        let head: String = text.chars().take(117).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Slack ts (epoch seconds with fractional part) to a local HH:MM label.
fn format_timestamp(ts: &str) -> String {
    let Ok(epoch) = ts.parse::<f64>() else {
        return String::new();
    };
    match Local.timestamp_opt(epoch as i64, 0) {
        chrono::LocalResult::Single(dt) => format!("{:02}:{:02}", dt.hour(), dt.minute()),
        _ => String::new(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="nl">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Slack Digest - {{DATE_FORMATTED}}</title>
<style>
  :root {
    --bg: #F5F5F7;
    --card: #FFFFFF;
    --text: #1D1D1F;
    --text-secondary: #6E6E73;
    --accent: #007AFF;
    --green: #34C759;
    --amber: #FF9500;
    --border: rgba(0, 0, 0, 0.08);
  }
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: var(--bg);
    color: var(--text);
    -webkit-font-smoothing: antialiased;
  }
  .container { max-width: 760px; margin: 0 auto; padding: 48px 24px; }
  .header { margin-bottom: 32px; }
  .header-weekday {
    color: var(--text-secondary);
    font-size: 15px;
    text-transform: capitalize;
  }
  .header-date { font-size: 32px; font-weight: 700; letter-spacing: -0.02em; }
  .header-sub { color: var(--text-secondary); font-size: 13px; margin-top: 4px; }
  .stats { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; margin-bottom: 40px; }
  .stat-card {
    background: var(--card);
    border-radius: 14px;
    padding: 16px;
    border: 1px solid var(--border);
  }
  .stat-value { font-size: 28px; font-weight: 700; letter-spacing: -0.02em; }
  .stat-card.accent .stat-value { color: var(--accent); }
  .stat-card.green .stat-value { color: var(--green); }
  .stat-label { color: var(--text-secondary); font-size: 13px; margin-top: 2px; }
  .section { margin-bottom: 28px; }
  .section-header { display: flex; align-items: center; gap: 8px; margin-bottom: 10px; }
  .section-dot { width: 10px; height: 10px; border-radius: 5px; }
  .section-title { font-size: 17px; font-weight: 600; }
  .section-count {
    background: var(--border);
    border-radius: 10px;
    padding: 1px 8px;
    font-size: 12px;
    color: var(--text-secondary);
  }
  .card { background: var(--card); border-radius: 14px; border: 1px solid var(--border); }
  .item { display: flex; gap: 12px; padding: 14px 16px; border-bottom: 1px solid var(--border); }
  .item:last-child { border-bottom: none; }
  .item-check {
    width: 18px; height: 18px; margin-top: 2px; flex-shrink: 0;
    border: 1.5px solid var(--accent); border-radius: 9px;
  }
  .item-dot { width: 8px; height: 8px; border-radius: 4px; margin-top: 7px; flex-shrink: 0; }
  .item-content { flex: 1; min-width: 0; }
  .item-summary { font-size: 15px; line-height: 1.4; }
  .item-summary.high { font-weight: 600; }
  .item-meta { display: flex; flex-wrap: wrap; gap: 6px; margin-top: 6px; }
  .item-tag {
    font-size: 12px;
    color: var(--text-secondary);
    background: var(--bg);
    border-radius: 6px;
    padding: 2px 7px;
  }
  .item-tag-channel { color: var(--accent); }
  .item-tag-priority.priority-high { color: #FF3B30; font-weight: 600; }
  .item-tag-priority.priority-medium { color: var(--amber); }
  .item-thread {
    margin-top: 10px;
    padding: 10px 12px;
    background: var(--bg);
    border-radius: 10px;
    font-size: 13px;
  }
  .thread-reply { line-height: 1.5; }
  .thread-reply-user { font-weight: 600; }
  .item-thread-more { margin-top: 6px; }
  .item-thread-more summary { cursor: pointer; color: var(--accent); font-size: 12px; }
  .empty-state { text-align: center; padding: 64px 24px; }
  .empty-state-icon { font-size: 40px; margin-bottom: 12px; }
  .empty-state-text { color: var(--text-secondary); font-size: 15px; }
  .footer {
    text-align: center;
    color: var(--text-secondary);
    font-size: 12px;
    margin-top: 40px;
  }
</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <div class="header-weekday">{{DATE_WEEKDAY}}</div>
      <div class="header-date">{{DATE_FORMATTED}}</div>
      <div class="header-sub">Gegenereerd om {{GENERATED_AT}}</div>
    </div>
    <div class="stats">
{{STATS_HTML}}
    </div>
{{SECTIONS_HTML}}
    <div class="footer">Slack Digest</div>
  </div>
</body>
</html>
"#;
