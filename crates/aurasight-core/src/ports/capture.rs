//! Camera and microphone acquisition.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AudioClip, Image};
use crate::error::CaptureError;

/// Acquires one image or one fixed-length recording per call.
#[async_trait]
pub trait CapturePort: Send + Sync {
    /// Grab a single camera frame.
    async fn capture_image(&self) -> Result<Image, CaptureError>;

    /// Record exactly `duration` of microphone audio.
    ///
    /// Not preemptible: the call returns only once the clip is complete or
    /// the device failed.
    async fn capture_audio(&self, duration: Duration) -> Result<AudioClip, CaptureError>;
}
