//! Render adapter module. Turns a DigestResult into a shareable document.

pub mod html;

pub use html::render;
