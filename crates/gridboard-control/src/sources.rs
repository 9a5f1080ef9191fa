//! Collaborator interfaces consumed by the control core.
//!
//! The game-server client, the knob drivers and the game clock live outside
//! this crate. They are injected through these narrow traits, so the board
//! can run against the mocks in [`mock`](crate::mock) in tests and in the
//! bootstrap binary.

use gridboard_core::DeviceKind;

use crate::board::ProductionReport;

/// Remote coefficients and capacity ranges, refreshed by the server client.
///
/// Missing data is reported as `None`; the board treats it as a coefficient
/// of 0 and a range of `(0, 0)`.
pub trait CoefficientSource {
    /// Production coefficient for a kind, typically within `0..=1`.
    fn coefficient(&self, kind: DeviceKind) -> Option<f32>;

    /// Capacity envelope `(min, max)` for a kind, in watts.
    fn range(&self, kind: DeviceKind) -> Option<(f32, f32)>;
}

/// Local analog controls (knobs).
pub trait AnalogSource {
    /// Position of the knob wired to `input`, within `0..=1`.
    fn read_percentage(&self, input: u8) -> f32;
}

/// Whether a game round is running.
pub trait GameState {
    fn is_active(&self) -> bool;
}

/// Production figures the server client posts upstream.
pub trait ProductionSource {
    fn production(&self) -> ProductionReport;
}
