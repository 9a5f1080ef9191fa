//! Authoritative device inventory reconciled from relay reports.
//!
//! Growth is applied as soon as it is reported. Shrinkage, including a kind
//! missing from a report, is staged as a [`PendingChange`] and only
//! committed once it has been observed for the grace period. A relay resend
//! gap or a brownout therefore never flaps the attractions, while a device
//! coming online drives control immediately.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use gridboard_control::InventoryReconciler;
//! use gridboard_core::DeviceKind;
//! use gridboard_protocol::InventoryReport;
//!
//! let mut inventory = InventoryReconciler::new(Duration::from_millis(500));
//! let t0 = Instant::now();
//!
//! let report: InventoryReport = [(DeviceKind::Coal, 3)].into_iter().collect();
//! inventory.apply_report(&report, t0);
//! assert_eq!(inventory.count(DeviceKind::Coal), 3);
//!
//! let report: InventoryReport = [(DeviceKind::Coal, 1)].into_iter().collect();
//! inventory.apply_report(&report, t0 + Duration::from_millis(100));
//! assert_eq!(inventory.count(DeviceKind::Coal), 3);
//!
//! inventory.commit_expired(t0 + Duration::from_millis(600));
//! assert_eq!(inventory.count(DeviceKind::Coal), 1);
//! ```

use std::time::{Duration, Instant};

use gridboard_core::DeviceKind;
use gridboard_protocol::InventoryReport;
use tracing::{debug, info, warn};

/// Current count for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryEntry {
    pub kind: DeviceKind,
    pub count: u8,
}

/// A decrease awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChange {
    pub kind: DeviceKind,
    pub target: u8,
    pub first_observed_at: Instant,
    pub previous: u8,
}

/// Inventory with immediate growth and debounced shrinkage.
///
/// Entries keep their first-seen order and are never removed; a committed
/// disconnect leaves the kind at count 0. Invalid type bytes are dropped on
/// ingestion, so every stored entry names a valid [`DeviceKind`].
#[derive(Debug)]
pub struct InventoryReconciler {
    grace_period: Duration,
    entries: Vec<InventoryEntry>,

    /// At most one per kind.
    pending: Vec<PendingChange>,
}

impl InventoryReconciler {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            entries: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Reconcile one inventory report received at `now`.
    ///
    /// Kinds present in the inventory but missing from the report are
    /// treated as a decrease to 0. Expired pending changes are committed
    /// before returning.
    pub fn apply_report(&mut self, report: &InventoryReport, now: Instant) {
        let mut seen: Vec<DeviceKind> = Vec::with_capacity(report.len());

        for entry in report.iter() {
            let Some(kind) = entry.kind() else {
                warn!(
                    device_type = entry.device_type,
                    count = entry.count,
                    "dropping invalid device type"
                );
                continue;
            };
            seen.push(kind);
            self.observe(kind, entry.count, now);
        }

        let missing: Vec<DeviceKind> = self
            .entries
            .iter()
            .map(|e| e.kind)
            .filter(|kind| !seen.contains(kind))
            .collect();
        for kind in missing {
            self.observe(kind, 0, now);
        }

        self.commit_expired(now);
    }

    /// Commit every pending change observed for at least the grace period.
    ///
    /// Returns the number of committed changes.
    pub fn commit_expired(&mut self, now: Instant) -> usize {
        let grace = self.grace_period;
        let (expired, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| now.saturating_duration_since(p.first_observed_at) >= grace);
        self.pending = waiting;

        for change in &expired {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.kind == change.kind) {
                entry.count = change.target;
                info!(
                    kind = %change.kind,
                    from = change.previous,
                    to = change.target,
                    "inventory decrease committed"
                );
            }
        }
        expired.len()
    }

    /// Authoritative count for `kind` (0 if never reported).
    pub fn count(&self, kind: DeviceKind) -> u8 {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map_or(0, |e| e.count)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    /// Kinds with a non-zero count, in first-seen order.
    pub fn present(&self) -> impl Iterator<Item = InventoryEntry> + '_ {
        self.entries.iter().copied().filter(|e| e.count > 0)
    }

    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    pub fn pending_for(&self, kind: DeviceKind) -> Option<&PendingChange> {
        self.pending.iter().find(|p| p.kind == kind)
    }

    fn observe(&mut self, kind: DeviceKind, count: u8, now: Instant) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.kind == kind) else {
            self.entries.push(InventoryEntry { kind, count });
            self.cancel_pending(kind);
            info!(%kind, count, "new device type");
            return;
        };

        let current = entry.count;
        if count > current {
            entry.count = count;
            self.cancel_pending(kind);
            debug!(%kind, from = current, to = count, "inventory increase applied");
        } else if count < current {
            self.stage_decrease(kind, count, current, now);
        } else if self.cancel_pending(kind) {
            debug!(%kind, count, "pending decrease retracted");
        }
    }

    fn stage_decrease(&mut self, kind: DeviceKind, target: u8, current: u8, now: Instant) {
        match self.pending.iter_mut().find(|p| p.kind == kind) {
            Some(pending) if pending.target == target => {}
            Some(pending) => {
                debug!(%kind, from = pending.target, to = target, "pending decrease re-targeted");
                pending.target = target;
                pending.first_observed_at = now;
            }
            None => {
                debug!(
                    %kind,
                    from = current,
                    to = target,
                    grace_ms = self.grace_period.as_millis() as u64,
                    "inventory decrease staged"
                );
                self.pending.push(PendingChange {
                    kind,
                    target,
                    first_observed_at: now,
                    previous: current,
                });
            }
        }
    }

    fn cancel_pending(&mut self, kind: DeviceKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.kind != kind);
        self.pending.len() != before
    }
}
