//! Slack Web API wire types and mapping to domain entities.
//!
//! Every envelope carries `ok` plus an optional `error` string; the client
//! checks those before touching the payload.

use crate::domain::{Channel, Identity, RawMessage, RawReply, Reaction};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channels: Vec<WireChannel>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct WireChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub reply_count: Option<u32>,
    #[serde(default)]
    pub reactions: Vec<WireReaction>,
}

#[derive(Debug, Deserialize)]
pub struct WireReaction {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: WireProfile,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireProfile {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A message is substantive when human-authored and not a subtyped record
/// (joins, edits, and other system subtypes).
pub fn is_substantive(msg: &WireMessage) -> bool {
    msg.bot_id.is_none() && msg.subtype.is_none()
}

pub fn channel_to_domain(ch: WireChannel) -> Channel {
    Channel {
        id: ch.id,
        name: ch.name,
    }
}

pub fn message_to_raw(msg: WireMessage) -> RawMessage {
    RawMessage {
        user_id: msg.user,
        text: msg.text,
        reply_count: msg.reply_count.unwrap_or(0),
        reactions: msg
            .reactions
            .into_iter()
            .map(|r| Reaction {
                name: r.name,
                count: r.count,
            })
            .collect(),
        ts: msg.ts,
    }
}

pub fn reply_to_raw(msg: WireMessage) -> RawReply {
    RawReply {
        user_id: msg.user,
        text: msg.text,
        ts: msg.ts,
    }
}

/// Display name preference mirrors the workspace profile: display name, then
/// real name, then the account handle.
pub fn user_to_identity(user: WireUser) -> Identity {
    let display_name = user
        .profile
        .display_name
        .filter(|s| !s.is_empty())
        .or(user.real_name)
        .unwrap_or_else(|| user.name.clone());
    Identity {
        id: user.id,
        handle: user.name,
        display_name,
    }
}
