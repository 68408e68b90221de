//! Gateway adapters shipped with the session crate.
//!
//! | Adapter | Port |
//! |---------|------|
//! | [`SimulatedCapture`] | [`CapturePort`](aurasight_core::CapturePort) |
//! | [`SimulatedPerception`] | [`PerceptionPort`](aurasight_core::PerceptionPort) |
//! | [`SimulatedSynthesis`] | [`SynthesisPort`](aurasight_core::SynthesisPort) |
//! | [`SimulatedOutput`], `RodioOutput` | [`AudioOutput`](aurasight_core::AudioOutput) |
//! | [`ChannelListener`] | [`AmbientListener`](aurasight_core::AmbientListener) |

#[cfg(feature = "local-audio")]
mod rodio_output;
mod simulated;

#[cfg(feature = "local-audio")]
pub use rodio_output::RodioOutput;
pub use simulated::{
    ChannelListener, SimulatedCapture, SimulatedOutput, SimulatedPerception, SimulatedSynthesis,
    TimedPlayback,
};
