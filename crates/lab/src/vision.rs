//! Bottle recognition.
//!
//! [`FixedRecognizer`] is a stand-in: whatever image it is given, it reports
//! the same YSL match after a delay. Real recognition would implement
//! [`BottleRecognizer`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A recognised bottle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub brand: String,
    pub name: String,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f32,
}

/// Identifies a fragrance from a photo of its bottle.
pub trait BottleRecognizer {
    fn identify(&self, image: &[u8]) -> impl Future<Output = Detection> + Send;
}

/// Recognizer that always reports the same detection.
#[derive(Debug, Clone)]
pub struct FixedRecognizer {
    delay: Duration,
    detection: Detection,
}

impl FixedRecognizer {
    /// The stock YSL "Libre Eau de Parfum" answer after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self::with_detection(
            delay,
            Detection {
                brand: "YSL Beauty".to_owned(),
                name: "Libre Eau de Parfum".to_owned(),
                confidence: 0.98,
            },
        )
    }

    #[must_use]
    pub const fn with_detection(delay: Duration, detection: Detection) -> Self {
        Self { delay, detection }
    }
}

impl Default for FixedRecognizer {
    fn default() -> Self {
        Self::new(Duration::from_millis(1800))
    }
}

impl BottleRecognizer for FixedRecognizer {
    fn identify(&self, image: &[u8]) -> impl Future<Output = Detection> + Send {
        debug!(bytes = image.len(), "Analyzing bottle geometry");
        let delay = self.delay;
        let detection = self.detection.clone();
        async move {
            tokio::time::sleep(delay).await;
            detection
        }
    }
}
