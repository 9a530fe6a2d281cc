//! IPC module for daemon-host communication

mod protocol;
mod server;

pub use server::{GuideLink, Server};
