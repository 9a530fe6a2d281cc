//! Observable state of the guide panel

use serde::{Deserialize, Serialize};

use crate::capture::CaptureState;

/// Panel visibility combined with the capture state
///
/// `Closed` implies no capture is running: closing the panel stops it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideState {
    #[default]
    Closed,
    /// Open, not listening
    Idle,
    /// Open, recognition running
    Listening,
    /// Open, waiting out the silence window
    Finalizing,
}

impl GuideState {
    pub fn new(panel_open: bool, capture: CaptureState) -> Self {
        match (panel_open, capture) {
            (false, _) => GuideState::Closed,
            (true, CaptureState::Idle) => GuideState::Idle,
            (true, CaptureState::Listening) => GuideState::Listening,
            (true, CaptureState::Finalizing) => GuideState::Finalizing,
        }
    }
}

impl std::fmt::Display for GuideState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuideState::Closed => write!(f, "Closed"),
            GuideState::Idle => write!(f, "Idle"),
            GuideState::Listening => write!(f, "Listening"),
            GuideState::Finalizing => write!(f, "Finalizing"),
        }
    }
}
