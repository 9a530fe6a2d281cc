//! Boundary with the platform speech-to-text engine

use serde::{Deserialize, Serialize};

use crate::config::RecognitionSettings;

use super::CaptureError;

/// Platform speech recognition collaborator
///
/// The capture session only needs to start and stop the engine; results,
/// errors and end-of-stream arrive later as separate events.
pub trait SpeechRecognizer: Send {
    /// Begin a continuous recognition episode
    fn start(&mut self, settings: &RecognitionSettings) -> Result<(), CaptureError>;

    /// Halt recognition immediately
    fn stop(&mut self);
}

/// One recognition update from the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionUpdate {
    /// Fragments the engine has confirmed, in arrival order
    #[serde(default)]
    pub finals: Vec<String>,

    /// Best-effort text still being spoken
    #[serde(default)]
    pub interim: Option<String>,
}

#[cfg(test)]
impl RecognitionUpdate {
    pub fn finals<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            finals: fragments.into_iter().map(Into::into).collect(),
            interim: None,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            finals: Vec::new(),
            interim: Some(text.into()),
        }
    }
}
