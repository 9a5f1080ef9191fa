//! The control-board aggregate.
//!
//! [`Board`] owns the decoder, encoder, inventory, driver and heartbeat, and
//! is driven by a single loop:
//!
//! ```text
//! serial bytes --on_bytes--> decoder --> status response --> LinkHealthMonitor
//!                                    \-> inventory report --> InventoryReconciler
//! knobs  --sample_inputs-->  channels
//! server --refresh_remote--> channels, coefficients, game flag
//! tick  --> LinkHealthMonitor::tick --> AttractionDriver::run --> serial bytes
//! ```
//!
//! # Examples
//!
//! ```
//! use std::time::Instant;
//! use gridboard_control::Board;
//! use gridboard_control::mock::{MockAnalog, MockRemote};
//! use gridboard_core::{BoardConfig, ChannelConfig, DeviceKind};
//! use gridboard_protocol::FrameEncoder;
//!
//! let config = BoardConfig {
//!     channels: vec![ChannelConfig { kind: DeviceKind::Coal, analog_input: 0 }],
//!     ..BoardConfig::default()
//! };
//! let mut board = Board::new(config).unwrap();
//!
//! let remote = MockRemote::new().with_range(DeviceKind::Coal, 0.0, 500.0).active(true);
//! board.refresh_remote(&remote);
//! board.sample_inputs(&MockAnalog::new().with_input(0, 0.6));
//!
//! let now = Instant::now();
//! let frame = FrameEncoder::new().encode(&[0x07, 0x02]).unwrap();
//! board.on_bytes(&frame, now);
//!
//! let mut wire: Vec<u8> = Vec::new();
//! let outcome = board.tick(now, &mut wire);
//! assert_eq!(outcome.commands.map(|c| c.len()), Some(1));
//! assert_eq!(board.production_report().total_production, 600.0);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use gridboard_core::{BoardConfig, DeviceKind, Result};
use gridboard_protocol::{
    ByteSink, CommandPayload, DecoderStats, FrameDecoder, FrameEncoder, LinkPayload,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::channel::{AtomicF32, ControlChannel};
use crate::control_law::total_power_for_type;
use crate::driver::AttractionDriver;
use crate::inventory::InventoryReconciler;
use crate::link_health::{LinkEvent, LinkHealthMonitor, SharedLinkFlag};
use crate::sources::{AnalogSource, CoefficientSource, GameState, ProductionSource};

/// State shared with the display task.
///
/// The channel set is fixed at construction; every value inside is an
/// atomic cell, so the display task reads it without locking.
#[derive(Debug)]
pub struct SharedState {
    channels: Vec<ControlChannel>,
    coefficients: [AtomicF32; DeviceKind::ALL.len()],
    game_active: AtomicBool,
    link: SharedLinkFlag,
    total_production: AtomicF32,
    total_consumption: AtomicF32,
}

impl SharedState {
    pub fn new(config: &BoardConfig) -> Self {
        Self::with_link_flag(config, SharedLinkFlag::new())
    }

    fn with_link_flag(config: &BoardConfig, link: SharedLinkFlag) -> Self {
        Self {
            channels: config.channels.iter().map(ControlChannel::from).collect(),
            coefficients: std::array::from_fn(|_| AtomicF32::new(0.0)),
            game_active: AtomicBool::new(false),
            link,
            total_production: AtomicF32::new(0.0),
            total_consumption: AtomicF32::new(0.0),
        }
    }

    pub fn channels(&self) -> &[ControlChannel] {
        &self.channels
    }

    /// Channel registered for `kind`, if any.
    pub fn channel(&self, kind: DeviceKind) -> Option<&ControlChannel> {
        self.channels.iter().find(|c| c.kind() == kind)
    }

    pub fn has_channel(&self, kind: DeviceKind) -> bool {
        self.channel(kind).is_some()
    }

    /// Last remote coefficient for `kind` (0 when never supplied).
    pub fn coefficient(&self, kind: DeviceKind) -> f32 {
        self.coefficients[Self::slot(kind)].load()
    }

    pub fn set_coefficient(&self, kind: DeviceKind, value: f32) {
        self.coefficients[Self::slot(kind)].store(value);
    }

    pub fn is_game_active(&self) -> bool {
        self.game_active.load(Ordering::Relaxed)
    }

    pub fn set_game_active(&self, active: bool) {
        self.game_active.store(active, Ordering::Relaxed);
    }

    pub fn is_link_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Sum of positive per-kind totals, as of the last tick.
    pub fn total_production(&self) -> f32 {
        self.total_production.load()
    }

    /// Sum of negative per-kind totals as a positive number, as of the last tick.
    pub fn total_consumption(&self) -> f32 {
        self.total_consumption.load()
    }

    fn slot(kind: DeviceKind) -> usize {
        kind.as_u8() as usize - 1
    }
}

/// Power of one connected kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KindPower {
    pub kind: DeviceKind,
    pub count: u8,
    pub power: f32,
}

/// Production figures for the server client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionReport {
    /// Every kind with connected devices, in first-seen order.
    pub kinds: Vec<KindPower>,
    pub total_production: f32,
    pub total_consumption: f32,
}

/// What one [`Board::tick`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Heartbeat state change, if any.
    pub link_event: Option<LinkEvent>,

    /// Commands written, or `None` when the driver was throttled.
    pub commands: Option<Vec<CommandPayload>>,
}

/// Control-board state, owned by the control loop.
#[derive(Debug)]
pub struct Board {
    decoder: FrameDecoder,
    encoder: FrameEncoder,
    inventory: InventoryReconciler,
    driver: AttractionDriver,
    link: LinkHealthMonitor,
    shared: Arc<SharedState>,
}

impl Board {
    /// Build a board from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration fails validation.
    pub fn new(config: BoardConfig) -> Result<Self> {
        config.validate()?;

        let link = LinkHealthMonitor::new(config.status_request_interval(), config.status_timeout());
        let shared = Arc::new(SharedState::with_link_flag(&config, link.flag()));

        info!(
            channels = shared.channels().len(),
            max_payload = config.max_payload,
            "board initialized"
        );

        Ok(Self {
            decoder: FrameDecoder::with_max_payload(config.max_payload),
            encoder: FrameEncoder::with_max_payload(config.max_payload),
            inventory: InventoryReconciler::new(config.grace_period()),
            driver: AttractionDriver::new(&config),
            link,
            shared,
        })
    }

    /// Handle for the display task.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    pub fn inventory(&self) -> &InventoryReconciler {
        &self.inventory
    }

    pub fn link(&self) -> &LinkHealthMonitor {
        &self.link
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Feed received bytes.
    ///
    /// Each complete frame is classified and dispatched, then the decoder is
    /// reset. Returns the number of frames handled.
    pub fn on_bytes(&mut self, bytes: &[u8], now: Instant) -> usize {
        let mut frames = 0;
        for &byte in bytes {
            if !self.decoder.push(byte) {
                continue;
            }
            let classified = self.decoder.payload().map(LinkPayload::classify);
            self.decoder.reset();

            match classified {
                Some(Ok(payload)) => {
                    self.on_payload(payload, now);
                    frames += 1;
                }
                Some(Err(e)) => warn!(error = %e, "dropping malformed payload"),
                None => {}
            }
        }
        frames
    }

    /// Dispatch an already decoded payload (e.g. from `RelayCodec`).
    pub fn on_payload(&mut self, payload: LinkPayload, now: Instant) -> Option<LinkEvent> {
        match payload {
            LinkPayload::Status { .. } => self.link.on_response(now),
            LinkPayload::Inventory(report) => {
                self.inventory.apply_report(&report, now);
                None
            }
        }
    }

    /// Heartbeat, then the throttled attraction driver.
    pub fn tick<S: ByteSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> TickOutcome {
        let link_event = self.link.tick(now, &self.encoder, sink);
        let commands = self.driver.run(
            now,
            &mut self.inventory,
            &self.shared,
            &self.encoder,
            sink,
        );
        self.publish_totals();
        TickOutcome {
            link_event,
            commands,
        }
    }

    /// Copy remote ranges, coefficients and the game flag.
    ///
    /// Missing data reads as coefficient 0 and range `(0, 0)`.
    pub fn refresh_remote<R>(&mut self, remote: &R)
    where
        R: CoefficientSource + GameState + ?Sized,
    {
        for kind in DeviceKind::ALL {
            self.shared
                .set_coefficient(kind, remote.coefficient(kind).unwrap_or(0.0));
        }
        for channel in self.shared.channels() {
            let (min, max) = remote.range(channel.kind()).unwrap_or((0.0, 0.0));
            channel.set_range(min, max);
        }
        self.shared.set_game_active(remote.is_active());
    }

    /// Sample the knob of every regulated channel.
    pub fn sample_inputs<A: AnalogSource + ?Sized>(&mut self, analog: &A) {
        for channel in self.shared.channels() {
            if channel.kind().is_regulated() {
                channel.set_percentage(analog.read_percentage(channel.analog_input()));
            }
        }
    }

    /// Total power of every connected device of `kind`.
    pub fn total_power_for_type(&self, kind: DeviceKind) -> f32 {
        let snapshot = self.shared.channel(kind).map(ControlChannel::snapshot);
        total_power_for_type(
            snapshot.as_ref(),
            self.inventory.count(kind),
            self.shared.is_game_active(),
        )
    }

    /// Per-kind power of every connected kind plus the aggregates.
    pub fn production_report(&self) -> ProductionReport {
        let kinds: Vec<KindPower> = self
            .inventory
            .present()
            .map(|entry| KindPower {
                kind: entry.kind,
                count: entry.count,
                power: self.total_power_for_type(entry.kind),
            })
            .collect();

        let total_production = kinds.iter().map(|k| k.power).filter(|p| *p > 0.0).sum();
        let total_consumption = kinds.iter().map(|k| k.power).filter(|p| *p < 0.0).map(f32::abs).sum();

        ProductionReport {
            kinds,
            total_production,
            total_consumption,
        }
    }

    /// Publish per-channel totals and aggregates for the display task.
    fn publish_totals(&self) {
        for channel in self.shared.channels() {
            channel.publish_total(self.total_power_for_type(channel.kind()));
        }
        let report = self.production_report();
        self.shared.total_production.store(report.total_production);
        self.shared.total_consumption.store(report.total_consumption);
    }
}

impl ProductionSource for Board {
    fn production(&self) -> ProductionReport {
        self.production_report()
    }
}
