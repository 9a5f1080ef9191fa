//! Mock collaborators for tests and the bootstrap binary.
//!
//! These stand in for the game-server client, the knob drivers and the
//! serial port so the board can run without the exhibit hardware.

use std::collections::HashMap;
use std::io;

use gridboard_core::DeviceKind;
use gridboard_protocol::{CommandPayload, FrameDecoder, payload::is_status_request};

use crate::sources::{AnalogSource, CoefficientSource, GameState};

/// Remote coefficients, ranges and game flag.
///
/// # Examples
///
/// ```
/// use gridboard_control::CoefficientSource;
/// use gridboard_control::mock::MockRemote;
/// use gridboard_core::DeviceKind;
///
/// let remote = MockRemote::new()
///     .with_coefficient(DeviceKind::Wind, 0.7)
///     .with_range(DeviceKind::Wind, 0.0, 150.0);
///
/// assert_eq!(remote.coefficient(DeviceKind::Wind), Some(0.7));
/// assert_eq!(remote.range(DeviceKind::Coal), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    coefficients: HashMap<DeviceKind, f32>,
    ranges: HashMap<DeviceKind, (f32, f32)>,
    active: bool,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coefficient(mut self, kind: DeviceKind, coefficient: f32) -> Self {
        self.set_coefficient(kind, coefficient);
        self
    }

    pub fn with_range(mut self, kind: DeviceKind, min: f32, max: f32) -> Self {
        self.set_range(kind, min, max);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn set_coefficient(&mut self, kind: DeviceKind, coefficient: f32) {
        self.coefficients.insert(kind, coefficient);
    }

    pub fn set_range(&mut self, kind: DeviceKind, min: f32, max: f32) {
        self.ranges.insert(kind, (min, max));
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Forget everything known about `kind`.
    pub fn clear(&mut self, kind: DeviceKind) {
        self.coefficients.remove(&kind);
        self.ranges.remove(&kind);
    }
}

impl CoefficientSource for MockRemote {
    fn coefficient(&self, kind: DeviceKind) -> Option<f32> {
        self.coefficients.get(&kind).copied()
    }

    fn range(&self, kind: DeviceKind) -> Option<(f32, f32)> {
        self.ranges.get(&kind).copied()
    }
}

impl GameState for MockRemote {
    fn is_active(&self) -> bool {
        self.active
    }
}

/// Fixed knob positions. Unset inputs read 0.
#[derive(Debug, Clone, Default)]
pub struct MockAnalog {
    inputs: HashMap<u8, f32>,
}

impl MockAnalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: u8, percentage: f32) -> Self {
        self.set_input(input, percentage);
        self
    }

    pub fn set_input(&mut self, input: u8, percentage: f32) {
        self.inputs.insert(input, percentage);
    }
}

impl AnalogSource for MockAnalog {
    fn read_percentage(&self, input: u8) -> f32 {
        self.inputs.get(&input).copied().unwrap_or(0.0)
    }
}

/// Serial sink that keeps everything written to it.
///
/// Implements [`io::Write`], so it is a `ByteSink` through the blanket impl.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    bytes: Vec<u8>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Payloads of every complete frame written so far.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        let mut decoder = FrameDecoder::new();
        let mut payloads = Vec::new();
        for &byte in &self.bytes {
            if decoder.push(byte) {
                if let Some(payload) = decoder.payload() {
                    payloads.push(payload.to_vec());
                }
                decoder.reset();
            }
        }
        payloads
    }

    /// Command frames written so far, in order.
    pub fn commands(&self) -> Vec<CommandPayload> {
        self.payloads()
            .iter()
            .filter(|p| !is_status_request(p))
            .filter_map(|p| CommandPayload::parse(p).ok())
            .collect()
    }

    pub fn status_requests(&self) -> usize {
        self.payloads().iter().filter(|p| is_status_request(p)).count()
    }
}

impl io::Write for RecordingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::Command;
    use gridboard_protocol::FrameEncoder;

    #[test]
    fn test_remote_clear_forgets_kind() {
        let mut remote = MockRemote::new()
            .with_coefficient(DeviceKind::Hydro, 0.3)
            .with_range(DeviceKind::Hydro, 0.0, 80.0);
        remote.clear(DeviceKind::Hydro);
        assert_eq!(remote.coefficient(DeviceKind::Hydro), None);
        assert_eq!(remote.range(DeviceKind::Hydro), None);
    }

    #[test]
    fn test_analog_defaults_to_zero() {
        let analog = MockAnalog::new().with_input(2, 0.25);
        assert_eq!(analog.read_percentage(2), 0.25);
        assert_eq!(analog.read_percentage(3), 0.0);
    }

    #[test]
    fn test_recording_sink_splits_frames() {
        let encoder = FrameEncoder::new();
        let mut sink = RecordingSink::new();
        encoder.send(&[0xFF, 0x33], &mut sink).unwrap();
        encoder
            .send(&CommandPayload::new(DeviceKind::Gas, Command::On).to_bytes(), &mut sink)
            .unwrap();

        assert_eq!(sink.status_requests(), 1);
        assert_eq!(
            sink.commands(),
            vec![CommandPayload::new(DeviceKind::Gas, Command::On)]
        );
        sink.clear();
        assert!(sink.bytes().is_empty());
    }
}
