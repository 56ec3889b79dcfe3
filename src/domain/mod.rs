//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    Category, Channel, ChannelMessages, ChunkEntry, ClassifiedItem, DigestResult, DigestStats,
    Identity, Message, ModelVerdict, Priority, RawMessage, RawReply, Reaction, Reply,
};
pub use errors::DomainError;
