//! Request/response heartbeat with the relay.
//!
//! The board sends a status request every request interval. Any status
//! response marks the relay connected; a silence longer than the timeout
//! marks it disconnected. Each transition is reported once, as a
//! [`LinkEvent`], and mirrored into a [`SharedLinkFlag`] for the display task.
//!
//! ```text
//! Disconnected --response--> Connected
//! Connected --timeout elapsed--> Disconnected
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use gridboard_core::constants::STATUS_REQUEST_PAYLOAD;
use gridboard_protocol::{ByteSink, FrameEncoder};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// One-time notification of a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
}

/// Connection flag readable from another thread.
#[derive(Debug, Clone, Default)]
pub struct SharedLinkFlag(Arc<AtomicBool>);

impl SharedLinkFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::Relaxed);
    }
}

/// Heartbeat state machine.
#[derive(Debug)]
pub struct LinkHealthMonitor {
    request_interval: Duration,
    timeout: Duration,
    last_request_at: Option<Instant>,
    last_response_at: Option<Instant>,
    state: LinkState,
    flag: SharedLinkFlag,
}

impl LinkHealthMonitor {
    /// New monitor, initially disconnected.
    ///
    /// `timeout` should exceed `request_interval` so that at least one
    /// retry happens before the link is declared lost.
    pub fn new(request_interval: Duration, timeout: Duration) -> Self {
        Self {
            request_interval,
            timeout,
            last_request_at: None,
            last_response_at: None,
            state: LinkState::Disconnected,
            flag: SharedLinkFlag::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Handle mirroring the connection state.
    pub fn flag(&self) -> SharedLinkFlag {
        self.flag.clone()
    }

    pub fn last_response_at(&self) -> Option<Instant> {
        self.last_response_at
    }

    /// Send a status request unless one was sent less than an interval ago.
    ///
    /// Returns `true` if a request was written. A failed write is logged and
    /// still counts as an attempt; the next interval retries.
    pub fn request_status<S: ByteSink + ?Sized>(
        &mut self,
        now: Instant,
        encoder: &FrameEncoder,
        sink: &mut S,
    ) -> bool {
        if let Some(last) = self.last_request_at {
            if now.saturating_duration_since(last) < self.request_interval {
                return false;
            }
        }
        self.last_request_at = Some(now);

        match encoder.send(&STATUS_REQUEST_PAYLOAD, sink) {
            Ok(_) => {
                debug!("status request sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "status request failed");
                false
            }
        }
    }

    /// Record a status response received at `now`.
    pub fn on_response(&mut self, now: Instant) -> Option<LinkEvent> {
        self.last_response_at = Some(now);
        if self.state == LinkState::Connected {
            return None;
        }
        self.state = LinkState::Connected;
        self.flag.set(true);
        info!("relay connected (status response received)");
        Some(LinkEvent::Connected)
    }

    /// Send a request if due, then check the response timeout.
    pub fn tick<S: ByteSink + ?Sized>(
        &mut self,
        now: Instant,
        encoder: &FrameEncoder,
        sink: &mut S,
    ) -> Option<LinkEvent> {
        self.request_status(now, encoder, sink);

        if self.state != LinkState::Connected {
            return None;
        }
        let silent_for = self
            .last_response_at
            .map_or(Duration::MAX, |at| now.saturating_duration_since(at));
        if silent_for <= self.timeout {
            return None;
        }
        self.state = LinkState::Disconnected;
        self.flag.set(false);
        info!(silent_ms = silent_for.as_millis() as u64, "relay disconnected (timeout)");
        Some(LinkEvent::Disconnected)
    }
}
