use serde::{Deserialize, Serialize};

/// Configuration for the change bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Per-subscription queue capacity.
    ///
    /// When a subscriber is not consuming, notifications beyond this
    /// bound are dropped; the subscriber's next pass re-reads full state,
    /// so staleness is bounded by the next retained event.
    /// Default: 16
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    16
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}
