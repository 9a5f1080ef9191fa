use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Wire errors
    #[error("Invalid payload length {len} (allowed 1..={max})")]
    InvalidPayloadLength { len: usize, max: usize },

    #[error("Invalid device type: {0}")]
    InvalidDeviceType(u8),

    #[error("Malformed inventory report: odd payload length {len}")]
    MalformedReport { len: usize },

    #[error("Unexpected payload of {len} bytes")]
    UnexpectedPayload { len: usize },

    #[error("Invalid command code 0x{code:02X} for {kind}")]
    InvalidCommandCode { kind: String, code: u8 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_payload_length_display() {
        let err = Error::InvalidPayloadLength { len: 0, max: 250 };
        assert_eq!(err.to_string(), "Invalid payload length 0 (allowed 1..=250)");
    }

    #[test]
    fn test_invalid_command_code_display() {
        let err = Error::InvalidCommandCode {
            kind: "Battery".to_string(),
            code: 0x0A,
        };
        assert_eq!(err.to_string(), "Invalid command code 0x0A for Battery");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
