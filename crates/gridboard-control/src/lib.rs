//! Control core of the exhibit board.
//!
//! Everything here is synchronous and non-blocking: one control loop owns a
//! [`Board`] and feeds it received bytes, analog samples and remote
//! coefficients, then calls [`Board::tick`] to drive the attractions. Time
//! is always passed in explicitly, which keeps every timer testable.
//!
//! State read by the display task lives in [`SharedState`] behind an `Arc`,
//! as lock-free atomic cells.

pub mod board;
pub mod channel;
pub mod control_law;
pub mod display;
pub mod driver;
pub mod inventory;
pub mod link_health;
pub mod mock;
pub mod sources;

pub use board::{Board, KindPower, ProductionReport, SharedState, TickOutcome};
pub use channel::{AtomicF32, ChannelSnapshot, ControlChannel};
pub use control_law::{compute_power, derive_command, total_power_for_type};
pub use display::{AggregateDisplay, ChannelDisplay, DisplayModel, DisplaySnapshot};
pub use driver::AttractionDriver;
pub use inventory::{InventoryEntry, InventoryReconciler, PendingChange};
pub use link_health::{LinkEvent, LinkHealthMonitor, LinkState, SharedLinkFlag};
pub use sources::{AnalogSource, CoefficientSource, GameState, ProductionSource};
