//! Model adapter module. Implements ModelPort for LLM-backed classification.

pub mod anthropic_adapter;

pub use anthropic_adapter::AnthropicAdapter;
