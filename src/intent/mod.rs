//! Intent resolution for finalized utterances
//!
//! A layered, order-sensitive keyword classifier: control words first, then
//! the navigation and FAQ tables, and finally a hand-off to the remote
//! assistant.

mod resolver;
pub mod rules;

pub use resolver::{resolve, ControlAction, IntentMatch, NavigationContext};
