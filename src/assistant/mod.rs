//! Remote assistant fallback

pub mod client;

pub use client::AssistantClient;
