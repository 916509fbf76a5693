//! Level-triggered configuration signal.

use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Receives the minimal-configuration flag after every processed batch.
pub trait ConfigObserver: Send + Sync {
    fn config_changed(&self, has_config: bool);
}

/// Rendezvous hand-off. With a zero-capacity channel the synchronizer
/// blocks until the consumer takes the value.
impl ConfigObserver for Sender<bool> {
    fn config_changed(&self, has_config: bool) {
        if self.send(has_config).is_err() {
            warn!(has_config, "config signal receiver gone");
        }
    }
}

impl<T: ConfigObserver + ?Sized> ConfigObserver for Arc<T> {
    fn config_changed(&self, has_config: bool) {
        (**self).config_changed(has_config)
    }
}

/// One emission observed through a [`ConfigSignal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Emission {
    /// Number of emissions so far, starting at 1.
    pub generation: u64,
    pub has_config: bool,
}

#[derive(Default)]
struct SignalState {
    generation: u64,
    has_config: bool,
}

/// Single-slot latest-value cell. Publishing never blocks; consumers see
/// every emission through the generation counter even if they sample late.
#[derive(Default)]
pub struct ConfigSignal {
    state: Mutex<SignalState>,
    changed: Condvar,
}

impl ConfigSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest emission, or `None` before the first one.
    pub fn latest(&self) -> Option<Emission> {
        let state = self.state.lock();
        if state.generation == 0 {
            None
        } else {
            Some(Emission {
                generation: state.generation,
                has_config: state.has_config,
            })
        }
    }

    /// Wait for an emission newer than generation `after`.
    pub fn wait_newer(&self, after: u64, timeout: Duration) -> Option<Emission> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.generation <= after {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }

        if state.generation > after {
            Some(Emission {
                generation: state.generation,
                has_config: state.has_config,
            })
        } else {
            None
        }
    }
}

impl ConfigObserver for ConfigSignal {
    fn config_changed(&self, has_config: bool) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.has_config = has_config;
        self.changed.notify_all();
    }
}
