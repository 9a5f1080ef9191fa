//! Power computation and per-kind command derivation.
//!
//! Everything here is a pure function of a [`ChannelSnapshot`] and a few
//! scalars. The tolerances in [`compute_power`] were tuned against real knob
//! jitter and must be kept exactly.
//!
//! # Examples
//!
//! ```
//! use gridboard_control::{ChannelSnapshot, compute_power, derive_command};
//! use gridboard_core::{Command, DeviceKind};
//!
//! let coal = ChannelSnapshot::new(DeviceKind::Coal, 0.0, 500.0, 0.6);
//! assert_eq!(compute_power(&coal, true), 300.0);
//! assert_eq!(compute_power(&coal, false), 0.0);
//! assert_eq!(derive_command(&coal, 0.0, 0.5, true), Command::On);
//! ```

use gridboard_core::constants::{
    CENTER_DEADBAND, GAS_LEVELS, GAS_OFF_BELOW, ON_THRESHOLD_PERCENT, STORAGE_HEAVY_THRESHOLD,
    STORAGE_LIGHT_THRESHOLD, SYMMETRY_TOLERANCE, ZERO_SNAP_TOLERANCE,
};
use gridboard_core::{Command, DeviceKind, StorageLevel};

use crate::channel::ChannelSnapshot;

/// Power produced (positive) or consumed (negative) by one device.
///
/// Zero when the game is inactive or the kind is disabled (`max <= 0`).
/// Symmetric envelopes get a center deadband, and values within rounding
/// noise of zero snap to exactly zero.
pub fn compute_power(channel: &ChannelSnapshot, game_active: bool) -> f32 {
    let (min, max) = (channel.min_power, channel.max_power);
    if !game_active || max <= 0.0 {
        return 0.0;
    }

    let pct = channel.percentage;
    let value = min + pct * (max - min);

    let symmetric = (max + min).abs() <= SYMMETRY_TOLERANCE * (max.abs() + min.abs() + 1.0);
    if symmetric && (pct - 0.5).abs() <= CENTER_DEADBAND {
        return 0.0;
    }

    if value.abs() <= ZERO_SNAP_TOLERANCE * (max.abs() + min.abs()) {
        return 0.0;
    }
    value
}

/// Total power of every connected device of `channel`'s kind.
///
/// Zero without a channel, without connected devices, or when the kind is
/// disabled.
pub fn total_power_for_type(channel: Option<&ChannelSnapshot>, count: u8, game_active: bool) -> f32 {
    match channel {
        Some(channel) if count > 0 && channel.max_power > 0.0 => {
            compute_power(channel, game_active) * f32::from(count)
        }
        _ => 0.0,
    }
}

/// Command for the devices of `channel.kind`.
///
/// `coefficient` and `threshold` only matter for the coefficient-gated
/// kinds (photovoltaic, wind, hydro).
pub fn derive_command(
    channel: &ChannelSnapshot,
    coefficient: f32,
    threshold: f32,
    game_active: bool,
) -> Command {
    match channel.kind {
        DeviceKind::Nuclear | DeviceKind::Coal => threshold_command(channel),
        DeviceKind::Wind | DeviceKind::Hydro => {
            if coefficient > threshold {
                Command::On
            } else {
                Command::Off
            }
        }
        // Lit at or below the solar threshold, idle light above it.
        DeviceKind::Photovoltaic => {
            if coefficient <= threshold {
                Command::On
            } else {
                Command::Idle
            }
        }
        DeviceKind::Gas => gas_command(channel),
        DeviceKind::Battery => battery_command(compute_power(channel, game_active)),
        DeviceKind::HydroStorage => storage_command(channel, game_active),
    }
}

/// ON above half throttle, OFF otherwise or when disabled.
pub fn threshold_command(channel: &ChannelSnapshot) -> Command {
    if channel.percentage > ON_THRESHOLD_PERCENT && channel.max_power > 0.0 {
        Command::On
    } else {
        Command::Off
    }
}

/// Gas output band: OFF below 5%, otherwise one of ten levels.
pub fn gas_command(channel: &ChannelSnapshot) -> Command {
    if channel.max_power <= 0.0 || channel.percentage < GAS_OFF_BELOW {
        return Command::Off;
    }
    let band = (channel.percentage * f32::from(GAS_LEVELS)).floor();
    let level = (band as u8).clamp(1, GAS_LEVELS);
    Command::GasLevel(level)
}

/// Battery state from the sign of its power.
pub fn battery_command(power: f32) -> Command {
    if power == 0.0 {
        Command::Idle
    } else if power < 0.0 {
        Command::Charge
    } else {
        Command::Discharge
    }
}

/// Five-level storage indicator from power normalized to the half range.
pub fn storage_command(channel: &ChannelSnapshot, game_active: bool) -> Command {
    if channel.max_power <= 0.0 {
        return Command::Off;
    }
    let power = compute_power(channel, game_active);
    let range = channel.range();
    let normalized = if range > 0.0 { power / (range * 0.5) } else { 0.0 };

    let level = if normalized <= -STORAGE_HEAVY_THRESHOLD {
        StorageLevel::Empty
    } else if normalized <= -STORAGE_LIGHT_THRESHOLD {
        StorageLevel::Low
    } else if normalized >= STORAGE_HEAVY_THRESHOLD {
        StorageLevel::Full
    } else if normalized >= STORAGE_LIGHT_THRESHOLD {
        StorageLevel::High
    } else {
        StorageLevel::Half
    };
    Command::Storage(level)
}
