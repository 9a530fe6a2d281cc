//! Events module for guide side effects
//!
//! Every observable effect of the guide (panel visibility, listening state,
//! transcripts, replies, speech requests) is published as a `GuideEvent`.
//! The host UI renders from these and drives the platform speech engines.

use serde::{Deserialize, Serialize};

use crate::config::{RecognitionSettings, VoiceSettings};
use crate::guide::GuideState;

/// Events emitted by the guide controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuideEvent {
    /// Panel or listening state changed
    StateChanged { from: GuideState, to: GuideState },

    /// Host should start its speech recognition engine
    RecognitionRequested { settings: RecognitionSettings },

    /// Host should halt its speech recognition engine
    RecognitionStopped,

    /// No speech recognition capability on this host (sticky)
    RecognitionUnsupported,

    /// Live transcript while the user is still speaking
    Transcript { text: String },

    /// A finalized utterance was heard
    Heard { text: String },

    /// Reply text to display
    Reply { text: String },

    /// The remote assistant call started or finished
    CallingBackend { active: bool },

    /// Host should speak this text, preempting anything in flight
    Speak {
        token: u64,
        text: String,
        voice: VoiceSettings,
    },

    /// Host should stop all speech now
    CancelSpeech,

    /// Home section changed
    SlideChanged { index: usize, section_id: String },

    /// Conversation memory grew or was reset
    MemoryChanged { turns: usize },
}

impl std::fmt::Display for GuideEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuideEvent::StateChanged { from, to } => {
                write!(f, "STATE_CHANGED ({} -> {})", from, to)
            }
            GuideEvent::RecognitionRequested { .. } => write!(f, "RECOGNITION_REQUESTED"),
            GuideEvent::RecognitionStopped => write!(f, "RECOGNITION_STOPPED"),
            GuideEvent::RecognitionUnsupported => write!(f, "RECOGNITION_UNSUPPORTED"),
            GuideEvent::Transcript { text } => write!(f, "TRANSCRIPT ({} chars)", text.len()),
            GuideEvent::Heard { text } => write!(f, "HEARD ({} chars)", text.len()),
            GuideEvent::Reply { text } => write!(f, "REPLY ({} chars)", text.len()),
            GuideEvent::CallingBackend { active } => write!(f, "CALLING_BACKEND ({})", active),
            GuideEvent::Speak { token, .. } => write!(f, "SPEAK (#{})", token),
            GuideEvent::CancelSpeech => write!(f, "CANCEL_SPEECH"),
            GuideEvent::SlideChanged { index, .. } => write!(f, "SLIDE_CHANGED ({})", index),
            GuideEvent::MemoryChanged { turns } => write!(f, "MEMORY_CHANGED ({})", turns),
        }
    }
}
