//! Display state for the panel refresh task.
//!
//! The refresh task runs on its own schedule and only reads [`SharedState`].
//! [`DisplayModel::snapshot`] turns those atomics into what the seven-segment
//! displays and bargraphs should show; writing them to hardware is the
//! caller's job.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use gridboard_control::{AggregateDisplay, DisplayModel, SharedState};
//! use gridboard_core::BoardConfig;
//!
//! let shared = SharedState::new(&BoardConfig::default());
//! let mut model = DisplayModel::new(Duration::from_millis(500));
//!
//! let t0 = Instant::now();
//! // Disconnected: the aggregates blink.
//! assert_eq!(model.snapshot(&shared, t0).production, AggregateDisplay::Value(0.0));
//! assert_eq!(
//!     model.snapshot(&shared, t0 + Duration::from_millis(500)).production,
//!     AggregateDisplay::Blank
//! );
//! ```

use std::time::{Duration, Instant};

use gridboard_core::DeviceKind;
use gridboard_core::constants::BARGRAPH_LEVELS;

use crate::board::SharedState;
use crate::channel::ControlChannel;

/// What one aggregate display shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateDisplay {
    Value(f32),
    /// Off phase of the disconnected blink.
    Blank,
}

/// Display state of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelDisplay {
    pub kind: DeviceKind,
    /// Whether the channel's display and bargraph are lit.
    pub enabled: bool,
    pub power: f32,
    /// Lit bargraph segments, `0..=10`.
    pub bargraph: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    /// Visible channels in configuration order.
    pub channels: Vec<ChannelDisplay>,
    pub production: AggregateDisplay,
    pub consumption: AggregateDisplay,
    pub link_connected: bool,
}

impl DisplaySnapshot {
    pub fn channel(&self, kind: DeviceKind) -> Option<&ChannelDisplay> {
        self.channels.iter().find(|c| c.kind == kind)
    }
}

/// Computes display snapshots and keeps the blink phase.
#[derive(Debug)]
pub struct DisplayModel {
    blink_interval: Duration,
    epoch: Option<Instant>,
}

impl DisplayModel {
    pub fn new(blink_interval: Duration) -> Self {
        Self {
            blink_interval,
            epoch: None,
        }
    }

    pub fn snapshot(&mut self, shared: &SharedState, now: Instant) -> DisplaySnapshot {
        let has_battery = shared.has_channel(DeviceKind::Battery);

        let channels = shared
            .channels()
            .iter()
            .filter(|c| !(c.kind() == DeviceKind::HydroStorage && has_battery))
            .map(|c| channel_display(c, shared, has_battery))
            .collect();

        let link_connected = shared.is_link_connected();
        let visible = link_connected || self.blink_on(now);
        let aggregate = |value: f32| {
            if visible {
                AggregateDisplay::Value(value)
            } else {
                AggregateDisplay::Blank
            }
        };

        DisplaySnapshot {
            channels,
            production: aggregate(shared.total_production()),
            consumption: aggregate(shared.total_consumption()),
            link_connected,
        }
    }

    /// On phase of the blink cycle. The first snapshot starts the cycle.
    fn blink_on(&mut self, now: Instant) -> bool {
        let epoch = *self.epoch.get_or_insert(now);
        let period = self.blink_interval.as_millis().max(1);
        let phase = now.saturating_duration_since(epoch).as_millis() / period;
        phase % 2 == 0
    }
}

fn channel_display(channel: &ControlChannel, shared: &SharedState, has_battery: bool) -> ChannelDisplay {
    let kind = channel.kind();
    let storage_coefficient = shared.coefficient(DeviceKind::HydroStorage);

    let enabled = match kind {
        DeviceKind::HydroStorage if !has_battery => true,
        DeviceKind::Battery => shared.coefficient(kind) > 0.0 || storage_coefficient > 0.0,
        _ => shared.coefficient(kind) > 0.0,
    };

    let mut power = channel.total_power();
    if kind == DeviceKind::Battery {
        if let Some(storage) = shared.channel(DeviceKind::HydroStorage) {
            power += storage.total_power();
        }
    }

    let level = if kind.is_regulated() {
        channel.percentage()
    } else {
        shared.coefficient(kind)
    };

    ChannelDisplay {
        kind,
        enabled,
        power,
        bargraph: bargraph_level(level),
    }
}

/// Segments lit for a `0..=1` value.
pub fn bargraph_level(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value * f32::from(BARGRAPH_LEVELS))
        .floor()
        .clamp(0.0, f32::from(BARGRAPH_LEVELS)) as u8
}
