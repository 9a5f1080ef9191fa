use crate::{
    Result,
    constants::{
        CMD_CHARGE, CMD_DISCHARGE, CMD_IDLE, CMD_OFF, CMD_ON, CMD_STORAGE_EMPTY, CMD_STORAGE_FULL,
        CMD_STORAGE_HALF, CMD_STORAGE_HIGH, CMD_STORAGE_LOW, COMMAND_MASK, GAS_LEVEL_BASE,
        GAS_LEVELS,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of physical device attached behind the relay.
///
/// The discriminant is the byte used on the wire. Zero is reserved and
/// every value above [`DeviceKind::Battery`] is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DeviceKind {
    Photovoltaic = 1,
    Wind = 2,
    Nuclear = 3,
    Gas = 4,
    Hydro = 5,
    HydroStorage = 6,
    Coal = 7,
    Battery = 8,
}

impl DeviceKind {
    /// Every kind, in wire order.
    pub const ALL: [DeviceKind; 8] = [
        DeviceKind::Photovoltaic,
        DeviceKind::Wind,
        DeviceKind::Nuclear,
        DeviceKind::Gas,
        DeviceKind::Hydro,
        DeviceKind::HydroStorage,
        DeviceKind::Coal,
        DeviceKind::Battery,
    ];

    /// Wire byte of this kind.
    #[inline]
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check whether a raw wire byte names a defined kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridboard_core::DeviceKind;
    ///
    /// assert!(DeviceKind::is_valid(1));
    /// assert!(DeviceKind::is_valid(8));
    /// assert!(!DeviceKind::is_valid(0));
    /// assert!(!DeviceKind::is_valid(9));
    /// ```
    #[inline]
    #[must_use]
    pub fn is_valid(raw: u8) -> bool {
        Self::try_from(raw).is_ok()
    }

    /// Regulated kinds read their live percentage from a local knob.
    ///
    /// Photovoltaic and wind are unregulated: their percentage is fixed at
    /// 1.0 and their output follows the remote coefficient.
    #[must_use]
    pub fn is_regulated(self) -> bool {
        !matches!(self, DeviceKind::Photovoltaic | DeviceKind::Wind)
    }

    /// Bidirectional storage kinds (may consume or produce power).
    #[must_use]
    pub fn is_storage(self) -> bool {
        matches!(self, DeviceKind::HydroStorage | DeviceKind::Battery)
    }

    /// Kind whose update path also drives this kind's hardware, if any.
    ///
    /// Hydro storage shares its indicator with the battery.
    #[must_use]
    pub fn shared_with(self) -> Option<DeviceKind> {
        match self {
            DeviceKind::HydroStorage => Some(DeviceKind::Battery),
            _ => None,
        }
    }
}

impl TryFrom<u8> for DeviceKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(DeviceKind::Photovoltaic),
            2 => Ok(DeviceKind::Wind),
            3 => Ok(DeviceKind::Nuclear),
            4 => Ok(DeviceKind::Gas),
            5 => Ok(DeviceKind::Hydro),
            6 => Ok(DeviceKind::HydroStorage),
            7 => Ok(DeviceKind::Coal),
            8 => Ok(DeviceKind::Battery),
            other => Err(Error::InvalidDeviceType(other)),
        }
    }
}

impl From<DeviceKind> for u8 {
    fn from(kind: DeviceKind) -> Self {
        kind.as_u8()
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Photovoltaic => "Photovoltaic",
            DeviceKind::Wind => "Wind",
            DeviceKind::Nuclear => "Nuclear",
            DeviceKind::Gas => "Gas",
            DeviceKind::Hydro => "Hydro",
            DeviceKind::HydroStorage => "HydroStorage",
            DeviceKind::Coal => "Coal",
            DeviceKind::Battery => "Battery",
        };
        write!(f, "{}", name)
    }
}

/// Five-level storage indicator state, from full to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StorageLevel {
    /// 100%, heavy discharging.
    Full = CMD_STORAGE_FULL,
    /// 75%, light discharging.
    High = CMD_STORAGE_HIGH,
    /// 50%, idle.
    Half = CMD_STORAGE_HALF,
    /// 25%, light charging.
    Low = CMD_STORAGE_LOW,
    /// 0%, heavy charging.
    Empty = CMD_STORAGE_EMPTY,
}

/// Command sent to the devices of one kind.
///
/// The on-wire code is the low nibble returned by [`Command::code`]. Codes
/// above 0x05 are kind-specific, so decoding needs the target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    On,
    Off,
    Idle,
    Charge,
    Discharge,
    /// Gas output level, 1..=10.
    GasLevel(u8),
    Storage(StorageLevel),
}

impl Command {
    /// Build a gas level command.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommandCode` if the level is not in 1..=10.
    pub fn gas_level(level: u8) -> Result<Self> {
        if !(1..=GAS_LEVELS).contains(&level) {
            return Err(Error::InvalidCommandCode {
                kind: DeviceKind::Gas.to_string(),
                code: GAS_LEVEL_BASE.wrapping_add(level),
            });
        }
        Ok(Command::GasLevel(level))
    }

    /// Wire code (low nibble).
    ///
    /// # Examples
    ///
    /// ```
    /// use gridboard_core::{Command, StorageLevel};
    ///
    /// assert_eq!(Command::On.code(), 0x01);
    /// assert_eq!(Command::GasLevel(10).code(), 0x0F);
    /// assert_eq!(Command::Storage(StorageLevel::Half).code(), 0x0D);
    /// ```
    #[must_use]
    pub fn code(self) -> u8 {
        let raw = match self {
            Command::On => CMD_ON,
            Command::Off => CMD_OFF,
            Command::Idle => CMD_IDLE,
            Command::Charge => CMD_CHARGE,
            Command::Discharge => CMD_DISCHARGE,
            Command::GasLevel(level) => GAS_LEVEL_BASE + level,
            Command::Storage(level) => level as u8,
        };
        raw & COMMAND_MASK
    }

    /// Decode a wire code addressed to `kind`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommandCode` if the code has no meaning for
    /// that kind.
    pub fn decode(kind: DeviceKind, code: u8) -> Result<Self> {
        let code = code & COMMAND_MASK;
        let command = match (kind, code) {
            (_, CMD_ON) => Some(Command::On),
            (_, CMD_OFF) => Some(Command::Off),
            (DeviceKind::Battery | DeviceKind::Photovoltaic, CMD_IDLE) => Some(Command::Idle),
            (DeviceKind::Battery, CMD_CHARGE) => Some(Command::Charge),
            (DeviceKind::Battery, CMD_DISCHARGE) => Some(Command::Discharge),
            (DeviceKind::Gas, c) if c > GAS_LEVEL_BASE => Some(Command::GasLevel(c - GAS_LEVEL_BASE)),
            (DeviceKind::HydroStorage, CMD_STORAGE_FULL) => Some(Command::Storage(StorageLevel::Full)),
            (DeviceKind::HydroStorage, CMD_STORAGE_HIGH) => Some(Command::Storage(StorageLevel::High)),
            (DeviceKind::HydroStorage, CMD_STORAGE_HALF) => Some(Command::Storage(StorageLevel::Half)),
            (DeviceKind::HydroStorage, CMD_STORAGE_LOW) => Some(Command::Storage(StorageLevel::Low)),
            (DeviceKind::HydroStorage, CMD_STORAGE_EMPTY) => {
                Some(Command::Storage(StorageLevel::Empty))
            }
            _ => None,
        };
        command.ok_or_else(|| Error::InvalidCommandCode {
            kind: kind.to_string(),
            code,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::On => write!(f, "ON"),
            Command::Off => write!(f, "OFF"),
            Command::Idle => write!(f, "IDLE"),
            Command::Charge => write!(f, "CHARGE"),
            Command::Discharge => write!(f, "DISCHARGE"),
            Command::GasLevel(level) => write!(f, "GAS L{}", level),
            Command::Storage(level) => write!(f, "STORAGE {:?}", level),
        }
    }
}
