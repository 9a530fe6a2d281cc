//! Pure utterance classifier
//!
//! Evaluation order: control words, navigation help, FAQ, broad topics,
//! then the remote fallback. First match wins at every step.

use tracing::debug;

use super::rules::{
    self, BROAD_TOPICS, CLEAR_MEMORY, FAQ, FAQ_FALLBACK, FIRST_SLIDE, NAVIGATION_HELP,
    NEXT_SLIDE, PREVIOUS_SLIDE, SILENCE,
};

/// Side effect requested by a control word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Stop speaking now
    Silence,
    /// Forget the conversation so far
    ClearMemory,
    /// Show the home section at this index
    NavigateSlide { target: usize },
}

/// Outcome of resolving one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentMatch {
    ControlCommand(ControlAction),
    LocalAnswer(&'static str),
    NeedsRemote,
}

/// Where the host is currently showing the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationContext {
    pub slide_index: usize,
    pub slide_count: usize,
}

impl NavigationContext {
    fn next(&self) -> usize {
        (self.slide_index + 1).min(self.slide_count.saturating_sub(1))
    }

    fn previous(&self) -> usize {
        self.slide_index.saturating_sub(1)
    }
}

/// Classify a finalized utterance
pub fn resolve(utterance: &str, context: &NavigationContext) -> IntentMatch {
    let lower = utterance.to_lowercase();

    let intent = if SILENCE.matches(&lower) {
        IntentMatch::ControlCommand(ControlAction::Silence)
    } else if CLEAR_MEMORY.matches(&lower) {
        IntentMatch::ControlCommand(ControlAction::ClearMemory)
    } else if NEXT_SLIDE.matches(&lower) {
        IntentMatch::ControlCommand(ControlAction::NavigateSlide {
            target: context.next(),
        })
    } else if PREVIOUS_SLIDE.matches(&lower) {
        IntentMatch::ControlCommand(ControlAction::NavigateSlide {
            target: context.previous(),
        })
    } else if FIRST_SLIDE.matches(&lower) {
        IntentMatch::ControlCommand(ControlAction::NavigateSlide { target: 0 })
    } else if let Some(rule) = rules::first_match(NAVIGATION_HELP, &lower) {
        debug!(rule = rule.name, "navigation help matched");
        IntentMatch::LocalAnswer(rule.answer)
    } else if let Some(rule) = rules::first_match(FAQ, &lower) {
        debug!(rule = rule.name, "faq matched");
        IntentMatch::LocalAnswer(rule.answer)
    } else if BROAD_TOPICS.matches(&lower) {
        IntentMatch::LocalAnswer(FAQ_FALLBACK)
    } else {
        IntentMatch::NeedsRemote
    };

    debug!(?intent, "utterance resolved");
    intent
}
