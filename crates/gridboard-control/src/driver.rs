//! Periodic attraction driver.
//!
//! Every run commits expired inventory decreases first, then sends exactly
//! one command per kind with connected devices. Commands are fire and
//! forget: a lost frame is repaired by the next run, so the driver never
//! waits for or tracks acknowledgements.

use std::time::{Duration, Instant};

use gridboard_core::{BoardConfig, Command, DeviceKind};
use gridboard_protocol::{ByteSink, CommandPayload, FrameEncoder};
use tracing::{trace, warn};

use crate::board::SharedState;
use crate::control_law::{derive_command, storage_command};
use crate::inventory::InventoryReconciler;

/// Throttled command loop.
#[derive(Debug)]
pub struct AttractionDriver {
    interval: Duration,
    last_run: Option<Instant>,
    config: BoardConfig,
}

impl AttractionDriver {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            interval: config.driver_interval(),
            last_run: None,
            config: config.clone(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drive every present kind, at most once per interval.
    ///
    /// Returns `None` when throttled, otherwise the commands written to the
    /// sink. Kinds with a zero count get no command at all.
    pub fn run<S: ByteSink + ?Sized>(
        &mut self,
        now: Instant,
        inventory: &mut InventoryReconciler,
        shared: &SharedState,
        encoder: &FrameEncoder,
        sink: &mut S,
    ) -> Option<Vec<CommandPayload>> {
        if let Some(last) = self.last_run {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_run = Some(now);

        inventory.commit_expired(now);

        let mut sent = Vec::new();
        for entry in inventory.present() {
            let command = self.command_for(entry.kind, shared);
            if let Some(channel) = shared.channel(entry.kind) {
                channel.record_command(command);
            }

            let payload = CommandPayload::new(entry.kind, command);
            match encoder.send(&payload.to_bytes(), sink) {
                Ok(_) => {
                    trace!(kind = %entry.kind, %command, count = entry.count, "command sent");
                    sent.push(payload);
                }
                Err(e) => warn!(kind = %entry.kind, error = %e, "command send failed"),
            }
        }
        Some(sent)
    }

    /// Command for one present kind.
    ///
    /// Kinds without a local channel are switched off. Hydro storage shares
    /// its indicator with the battery, so when both channels exist its level
    /// follows the battery channel.
    fn command_for(&self, kind: DeviceKind, shared: &SharedState) -> Command {
        let game_active = shared.is_game_active();

        let Some(channel) = shared.channel(kind) else {
            return Command::Off;
        };

        if let Some(sibling) = kind.shared_with().and_then(|k| shared.channel(k)) {
            return storage_command(&sibling.snapshot(), game_active);
        }

        derive_command(
            &channel.snapshot(),
            shared.coefficient(kind),
            self.config.coefficient_threshold(kind),
            game_active,
        )
    }
}
