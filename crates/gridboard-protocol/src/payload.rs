//! Payload shapes carried inside frames.
//!
//! The frame layer knows nothing about payload meaning. This module gives
//! names to the three shapes the board and relay exchange:
//!
//! | Shape | Direction | Layout |
//! |-------|-----------|--------|
//! | Inventory report | relay -> board | `[type, count]*` |
//! | Command | board -> relay | `[type, command]` |
//! | Status | both | `[0xFF, ..]` |
//!
//! # Examples
//!
//! ```
//! use gridboard_protocol::{InventoryReport, LinkPayload};
//!
//! match LinkPayload::classify(&[0x07, 0x02, 0x03, 0x01]).unwrap() {
//!     LinkPayload::Inventory(report) => assert_eq!(report.len(), 2),
//!     LinkPayload::Status { .. } => unreachable!(),
//! }
//!
//! assert!(LinkPayload::classify(&[0xFF, 0x33]).unwrap().is_status());
//! assert!(InventoryReport::parse(&[0x07]).is_err());
//! ```

use gridboard_core::constants::{COMMAND_PAYLOAD_LEN, STATUS_REQUEST_PAYLOAD, STATUS_TYPE};
use gridboard_core::{Command, DeviceKind, Error, Result};

/// One `[type, count]` pair of an inventory report.
///
/// The type byte is kept raw: invalid types are dropped by the inventory
/// reconciler, not by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportEntry {
    pub device_type: u8,
    pub count: u8,
}

impl ReportEntry {
    pub fn new(device_type: u8, count: u8) -> Self {
        Self { device_type, count }
    }

    /// Decoded device kind, if the type byte is valid.
    pub fn kind(&self) -> Option<DeviceKind> {
        DeviceKind::try_from(self.device_type).ok()
    }
}

/// Inventory report sent by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryReport {
    entries: Vec<ReportEntry>,
}

impl InventoryReport {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        Self { entries }
    }

    /// Split a payload into `[type, count]` pairs.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedReport` if the payload length is odd.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() % 2 != 0 {
            return Err(Error::MalformedReport { len: payload.len() });
        }
        let entries = payload
            .chunks_exact(2)
            .map(|pair| ReportEntry::new(pair[0], pair[1]))
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last reported count for a raw type byte, if present.
    pub fn count_of(&self, device_type: u8) -> Option<u8> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.device_type == device_type)
            .map(|e| e.count)
    }

    /// Wire bytes of this report.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries
            .iter()
            .flat_map(|e| [e.device_type, e.count])
            .collect()
    }
}

impl FromIterator<(u8, u8)> for InventoryReport {
    fn from_iter<I: IntoIterator<Item = (u8, u8)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(device_type, count)| ReportEntry::new(device_type, count))
                .collect(),
        }
    }
}

impl FromIterator<(DeviceKind, u8)> for InventoryReport {
    fn from_iter<I: IntoIterator<Item = (DeviceKind, u8)>>(iter: I) -> Self {
        iter.into_iter().map(|(kind, count)| (kind.as_u8(), count)).collect()
    }
}

/// Command addressed to every device of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPayload {
    pub kind: DeviceKind,
    pub command: Command,
}

impl CommandPayload {
    pub fn new(kind: DeviceKind, command: Command) -> Self {
        Self { kind, command }
    }

    /// `[type, code]` with the code masked to its low nibble.
    pub fn to_bytes(&self) -> [u8; COMMAND_PAYLOAD_LEN] {
        [self.kind.as_u8(), self.command.code()]
    }

    /// Decode a command payload (relay side).
    ///
    /// # Errors
    ///
    /// Returns `Error::UnexpectedPayload` if the payload is not two bytes,
    /// `Error::InvalidDeviceType` or `Error::InvalidCommandCode` otherwise.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let &[raw_kind, code] = payload else {
            return Err(Error::UnexpectedPayload { len: payload.len() });
        };
        let kind = DeviceKind::try_from(raw_kind)?;
        let command = Command::decode(kind, code)?;
        Ok(Self { kind, command })
    }
}

/// Payload received by the control board, classified by its first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPayload {
    /// Status traffic. `code` is the second byte, if any.
    Status { code: Option<u8> },

    Inventory(InventoryReport),
}

impl LinkPayload {
    /// Classify a CRC-valid payload.
    ///
    /// A first byte of `0xFF` marks status traffic; everything else is an
    /// inventory report.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnexpectedPayload` for an empty payload and
    /// `Error::MalformedReport` for an odd-length inventory report.
    pub fn classify(payload: &[u8]) -> Result<Self> {
        match payload.first() {
            None => Err(Error::UnexpectedPayload { len: 0 }),
            Some(&STATUS_TYPE) => Ok(LinkPayload::Status {
                code: payload.get(1).copied(),
            }),
            Some(_) => InventoryReport::parse(payload).map(LinkPayload::Inventory),
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, LinkPayload::Status { .. })
    }
}

/// Whether a payload is the status request sent by the board.
pub fn is_status_request(payload: &[u8]) -> bool {
    payload == STATUS_REQUEST_PAYLOAD
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::StorageLevel;
    use rstest::rstest;

    #[test]
    fn test_parse_report() {
        let report = InventoryReport::parse(&[0x07, 0x02, 0x08, 0x01]).unwrap();
        assert_eq!(
            report.entries(),
            &[ReportEntry::new(7, 2), ReportEntry::new(8, 1)]
        );
        assert_eq!(report.entries()[0].kind(), Some(DeviceKind::Coal));
    }

    #[test]
    fn test_parse_report_keeps_invalid_types() {
        let report = InventoryReport::parse(&[0x00, 0x02, 0x63, 0x01]).unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|e| e.kind().is_none()));
    }

    #[rstest]
    #[case(&[0x07])]
    #[case(&[0x07, 0x02, 0x08])]
    fn test_odd_report_is_malformed(#[case] payload: &[u8]) {
        assert!(matches!(
            InventoryReport::parse(payload),
            Err(Error::MalformedReport { .. })
        ));
    }

    #[test]
    fn test_report_to_bytes() {
        let report: InventoryReport = [(DeviceKind::Gas, 3), (DeviceKind::Wind, 1)]
            .into_iter()
            .collect();
        assert_eq!(report.to_bytes(), vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_count_of_uses_last_duplicate() {
        let report = InventoryReport::parse(&[0x07, 0x02, 0x07, 0x05]).unwrap();
        assert_eq!(report.count_of(7), Some(5));
        assert_eq!(report.count_of(8), None);
    }

    #[rstest]
    #[case(CommandPayload::new(DeviceKind::Coal, Command::On), [0x07, 0x01])]
    #[case(CommandPayload::new(DeviceKind::Gas, Command::GasLevel(4)), [0x04, 0x09])]
    #[case(CommandPayload::new(DeviceKind::Battery, Command::Charge), [0x08, 0x04])]
    #[case(
        CommandPayload::new(DeviceKind::HydroStorage, Command::Storage(StorageLevel::Low)),
        [0x06, 0x0E]
    )]
    fn test_command_bytes(#[case] command: CommandPayload, #[case] bytes: [u8; 2]) {
        assert_eq!(command.to_bytes(), bytes);
        assert_eq!(CommandPayload::parse(&bytes).unwrap(), command);
    }

    #[test]
    fn test_command_parse_rejects_wrong_shape() {
        assert!(matches!(
            CommandPayload::parse(&[0x07, 0x01, 0x00]),
            Err(Error::UnexpectedPayload { len: 3 })
        ));
        assert!(matches!(
            CommandPayload::parse(&[0x00, 0x01]),
            Err(Error::InvalidDeviceType(0))
        ));
    }

    #[rstest]
    #[case(&[0xFF, 0x33], Some(0x33))]
    #[case(&[0xFF, 0x01, 0x02], Some(0x01))]
    #[case(&[0xFF], None)]
    fn test_classify_status(#[case] payload: &[u8], #[case] code: Option<u8>) {
        assert_eq!(
            LinkPayload::classify(payload).unwrap(),
            LinkPayload::Status { code }
        );
    }

    #[test]
    fn test_classify_inventory() {
        let payload = LinkPayload::classify(&[0x03, 0x01]).unwrap();
        assert!(!payload.is_status());
        assert!(matches!(payload, LinkPayload::Inventory(r) if r.count_of(3) == Some(1)));
    }

    #[test]
    fn test_classify_empty() {
        assert!(LinkPayload::classify(&[]).is_err());
    }

    #[test]
    fn test_status_request_sentinel() {
        assert!(is_status_request(&[0xFF, 0x33]));
        assert!(!is_status_request(&[0xFF, 0x34]));
    }
}
