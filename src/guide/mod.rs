//! Guide module: the voice tour guide behind the host's help panel
//!
//! Composes capture, intent resolution, conversation memory, the remote
//! assistant and the speech arbiter into one controller.

mod controller;
mod host;
mod signal;
mod slides;
mod state;

pub use controller::{GuideController, GuideInput};
pub use host::{HostCapabilities, HostRecognizer, HostSynthesizer};
pub use signal::OpenSignal;
pub use state::GuideState;
