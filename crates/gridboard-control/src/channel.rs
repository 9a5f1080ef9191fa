//! Locally controlled channels and their lock-free cells.
//!
//! A [`ControlChannel`] is written by the control loop (knob samples, remote
//! ranges, transmitted commands, published totals) and read concurrently by
//! the display task. Every field is an independent single-value cell, so
//! atomics are enough; no update spans two fields.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use gridboard_core::{ChannelConfig, Command, DeviceKind};

/// `f32` cell stored as raw bits in an `AtomicU32`.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Raw command byte meaning "nothing transmitted yet".
const NO_COMMAND: u8 = 0;

/// Plain copy of a channel's inputs, taken once per evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSnapshot {
    pub kind: DeviceKind,
    pub min_power: f32,
    pub max_power: f32,
    pub percentage: f32,
}

impl ChannelSnapshot {
    pub fn new(kind: DeviceKind, min_power: f32, max_power: f32, percentage: f32) -> Self {
        Self {
            kind,
            min_power,
            max_power,
            percentage,
        }
    }

    /// `max_power - min_power`.
    pub fn range(&self) -> f32 {
        self.max_power - self.min_power
    }
}

/// One locally controlled device kind.
#[derive(Debug)]
pub struct ControlChannel {
    kind: DeviceKind,

    /// Knob index sampled for regulated kinds.
    analog_input: u8,

    min_power: AtomicF32,
    max_power: AtomicF32,

    /// Live knob position in `0..=1`, fixed at 1.0 for unregulated kinds.
    percentage: AtomicF32,

    /// Last `total_power_for_type` published by the control loop.
    total_power: AtomicF32,

    last_command: AtomicU8,
}

impl ControlChannel {
    /// New channel with an empty envelope.
    pub fn new(kind: DeviceKind, analog_input: u8) -> Self {
        let percentage = if kind.is_regulated() { 0.0 } else { 1.0 };
        Self {
            kind,
            analog_input,
            min_power: AtomicF32::new(0.0),
            max_power: AtomicF32::new(0.0),
            percentage: AtomicF32::new(percentage),
            total_power: AtomicF32::new(0.0),
            last_command: AtomicU8::new(NO_COMMAND),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn analog_input(&self) -> u8 {
        self.analog_input
    }

    pub fn min_power(&self) -> f32 {
        self.min_power.load()
    }

    pub fn max_power(&self) -> f32 {
        self.max_power.load()
    }

    pub fn set_range(&self, min_power: f32, max_power: f32) {
        self.min_power.store(min_power);
        self.max_power.store(max_power);
    }

    pub fn percentage(&self) -> f32 {
        self.percentage.load()
    }

    /// Store a knob sample.
    ///
    /// Unregulated kinds ignore samples and stay at 1.0. Out-of-range values
    /// are clamped and NaN reads as 0.
    pub fn set_percentage(&self, value: f32) {
        if !self.kind.is_regulated() {
            return;
        }
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.percentage.store(value);
    }

    pub fn total_power(&self) -> f32 {
        self.total_power.load()
    }

    pub(crate) fn publish_total(&self, total: f32) {
        self.total_power.store(total);
    }

    /// Most recently transmitted command, if any.
    pub fn last_command(&self) -> Option<Command> {
        match self.last_command.load(Ordering::Relaxed) {
            NO_COMMAND => None,
            code => Command::decode(self.kind, code).ok(),
        }
    }

    pub(crate) fn record_command(&self, command: Command) {
        self.last_command.store(command.code(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot::new(
            self.kind,
            self.min_power.load(),
            self.max_power.load(),
            self.percentage.load(),
        )
    }
}

impl From<&ChannelConfig> for ControlChannel {
    fn from(config: &ChannelConfig) -> Self {
        Self::new(config.kind, config.analog_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;

    #[test]
    fn test_atomic_f32_roundtrip() {
        let cell = AtomicF32::new(-12.5);
        assert_eq!(cell.load(), -12.5);
        cell.store(f32::MAX);
        assert_eq!(cell.load(), f32::MAX);
        assert_eq!(AtomicF32::default().load(), 0.0);
    }

    #[test]
    fn test_atomic_f32_across_threads() {
        let cell = Arc::new(AtomicF32::new(0.0));
        let writer = Arc::clone(&cell);
        std::thread::spawn(move || writer.store(0.75)).join().unwrap();
        assert_eq!(cell.load(), 0.75);
    }

    #[test]
    fn test_unregulated_channel_fixed_at_full() {
        let channel = ControlChannel::new(DeviceKind::Wind, 0);
        assert_eq!(channel.percentage(), 1.0);
        channel.set_percentage(0.2);
        assert_eq!(channel.percentage(), 1.0);
    }

    #[rstest]
    #[case(0.3, 0.3)]
    #[case(-0.5, 0.0)]
    #[case(1.7, 1.0)]
    #[case(f32::NAN, 0.0)]
    fn test_percentage_clamped(#[case] input: f32, #[case] stored: f32) {
        let channel = ControlChannel::new(DeviceKind::Gas, 2);
        channel.set_percentage(input);
        assert_eq!(channel.percentage(), stored);
    }

    #[test]
    fn test_snapshot_reflects_range() {
        let channel = ControlChannel::new(DeviceKind::Battery, 4);
        channel.set_range(-100.0, 100.0);
        channel.set_percentage(0.25);
        let snapshot = channel.snapshot();
        assert_eq!(snapshot, ChannelSnapshot::new(DeviceKind::Battery, -100.0, 100.0, 0.25));
        assert_eq!(snapshot.range(), 200.0);
    }

    #[test]
    fn test_last_command_tracking() {
        let channel = ControlChannel::new(DeviceKind::Gas, 1);
        assert_eq!(channel.last_command(), None);
        channel.record_command(Command::GasLevel(3));
        assert_eq!(channel.last_command(), Some(Command::GasLevel(3)));
    }

    #[test]
    fn test_from_config() {
        let config = ChannelConfig {
            kind: DeviceKind::Coal,
            analog_input: 5,
        };
        let channel = ControlChannel::from(&config);
        assert_eq!(channel.kind(), DeviceKind::Coal);
        assert_eq!(channel.analog_input(), 5);
    }
}
