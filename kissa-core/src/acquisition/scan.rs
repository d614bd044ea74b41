use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::util::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Ready,
    Scanning,
}

/// Single-flight guard for photo scans
#[derive(Debug, Clone, Default)]
pub struct ScanGate {
    state: Arc<Mutex<ScanState>>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the scanning state, or `None` if a scan is already running.
    /// The gate reopens when the permit is dropped.
    pub fn try_acquire(&self) -> Option<ScanPermit> {
        let mut state = lock(&self.state);
        match *state {
            ScanState::Scanning => None,
            ScanState::Ready => {
                *state = ScanState::Scanning;
                Some(ScanPermit {
                    state: self.state.clone(),
                })
            }
        }
    }

    pub fn state(&self) -> ScanState {
        *lock(&self.state)
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScanState::Scanning
    }
}

/// Held for the duration of one scan
#[derive(Debug)]
pub struct ScanPermit {
    state: Arc<Mutex<ScanState>>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        *lock(&self.state) = ScanState::Ready;
        debug!("Scan gate released");
    }
}
