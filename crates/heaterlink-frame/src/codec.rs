use std::fmt;

use crate::error::{FrameError, Result};

/// Marker byte at offset 0 of every frame, in both directions.
pub const MARKER: u8 = 0xAA;

/// Size of an outbound command frame.
pub const COMMAND_FRAME_LEN: usize = 8;

/// Variant byte for frames authenticated with the numeric passkey.
pub const VARIANT_NORMAL: u8 = 0x55;

/// Variant byte for pairing frames carrying random auth bytes.
pub const VARIANT_PAIRING: u8 = 0x66;

/// A numeric heater passkey (0-9999).
///
/// The passkey is split into `passkey / 100` and `passkey % 100` for the two
/// auth bytes, so values above 9999 cannot be represented on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Passkey(u16);

impl Passkey {
    /// Largest representable passkey.
    pub const MAX: u16 = 9999;

    /// Factory default passkey of most units.
    pub const DEFAULT: Passkey = Passkey(1234);

    /// Create a passkey, rejecting values above [`Passkey::MAX`].
    pub fn new(value: u16) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// The numeric passkey.
    pub fn get(self) -> u16 {
        self.0
    }

    /// Auth bytes `(hundreds, remainder)` as sent on the wire.
    pub fn auth_bytes(self) -> [u8; 2] {
        [(self.0 / 100) as u8, (self.0 % 100) as u8]
    }
}

impl Default for Passkey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passkey(<redacted>)")
    }
}

/// Authentication scheme for an outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Normal framing, auth bytes derived from the passkey.
    Passkey(Passkey),
    /// Pairing framing, auth bytes are random.
    Pairing,
}

impl Auth {
    /// The variant byte written at offset 1.
    pub fn variant_byte(self) -> u8 {
        match self {
            Auth::Passkey(_) => VARIANT_NORMAL,
            Auth::Pairing => VARIANT_PAIRING,
        }
    }

    fn auth_bytes(self) -> [u8; 2] {
        match self {
            Auth::Passkey(passkey) => passkey.auth_bytes(),
            Auth::Pairing => rand::random(),
        }
    }
}

/// An encoded 8-byte command frame.
///
/// Wire format:
/// ```text
/// ┌────────┬─────────┬─────────┬─────────┬─────────┬─────────┬─────────┬──────────┐
/// │ 0xAA   │ variant │ auth_hi │ auth_lo │ command │ arg_lo  │ arg_hi  │ checksum │
/// └────────┴─────────┴─────────┴─────────┴─────────┴─────────┴─────────┴──────────┘
/// checksum = (byte2 + byte3 + byte4 + byte5 + byte6) mod 256
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandFrame {
    bytes: [u8; COMMAND_FRAME_LEN],
}

impl CommandFrame {
    /// Parse a command frame received from the wire.
    ///
    /// Verifies the marker, the variant byte and the checksum.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let bytes: [u8; COMMAND_FRAME_LEN] = raw.try_into().map_err(|_| {
            FrameError::MalformedFrame(format!(
                "command frame must be {COMMAND_FRAME_LEN} bytes, got {}",
                raw.len()
            ))
        })?;

        if bytes[0] != MARKER {
            return Err(FrameError::MalformedFrame(format!(
                "bad marker byte 0x{:02X}",
                bytes[0]
            )));
        }
        if bytes[1] != VARIANT_NORMAL && bytes[1] != VARIANT_PAIRING {
            return Err(FrameError::MalformedFrame(format!(
                "unknown auth variant 0x{:02X}",
                bytes[1]
            )));
        }

        let expected = checksum(&bytes[2..7]);
        if bytes[7] != expected {
            return Err(FrameError::ChecksumMismatch {
                expected,
                found: bytes[7],
            });
        }

        Ok(Self { bytes })
    }

    /// The raw wire bytes.
    pub fn as_bytes(&self) -> &[u8; COMMAND_FRAME_LEN] {
        &self.bytes
    }

    /// Variant byte ([`VARIANT_NORMAL`] or [`VARIANT_PAIRING`]).
    pub fn variant(&self) -> u8 {
        self.bytes[1]
    }

    /// Whether this frame uses pairing framing.
    pub fn is_pairing(&self) -> bool {
        self.bytes[1] == VARIANT_PAIRING
    }

    /// The two auth bytes `(hi, lo)`.
    pub fn auth(&self) -> [u8; 2] {
        [self.bytes[2], self.bytes[3]]
    }

    /// Whether the auth bytes match the given passkey.
    pub fn authenticates(&self, passkey: Passkey) -> bool {
        !self.is_pairing() && self.auth() == passkey.auth_bytes()
    }

    pub fn command(&self) -> u8 {
        self.bytes[4]
    }

    pub fn argument(&self) -> u16 {
        u16::from_le_bytes([self.bytes[5], self.bytes[6]])
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[7]
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFrame")
            .field("variant", &format_args!("0x{:02X}", self.variant()))
            .field("command", &self.command())
            .field("argument", &self.argument())
            .field("checksum", &format_args!("0x{:02X}", self.checksum()))
            .finish()
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Single-byte modulo-256 sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode a command frame.
///
/// The checksum is always computed here. For [`Auth::Pairing`] the auth bytes
/// are random, otherwise the output is fully determined by the inputs.
pub fn encode(command: u8, argument: u16, auth: Auth) -> CommandFrame {
    let [auth_hi, auth_lo] = auth.auth_bytes();
    let [arg_lo, arg_hi] = argument.to_le_bytes();

    let mut bytes = [
        MARKER,
        auth.variant_byte(),
        auth_hi,
        auth_lo,
        command,
        arg_lo,
        arg_hi,
        0,
    ];
    bytes[7] = checksum(&bytes[2..7]);

    CommandFrame { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{SET_LEVEL, START_STOP, STATUS};

    fn passkey(value: u16) -> Auth {
        Auth::Passkey(Passkey::new(value).unwrap())
    }

    #[test]
    fn encode_start_with_default_passkey() {
        let frame = encode(START_STOP, 1, Auth::Passkey(Passkey::DEFAULT));
        // 12 + 34 + 3 + 1 + 0 = 50
        assert_eq!(frame.as_bytes(), &[0xAA, 0x55, 12, 34, 3, 1, 0, 50]);
    }

    #[test]
    fn encode_splits_argument_little_endian() {
        let frame = encode(SET_LEVEL, 0x0123, passkey(0));
        assert_eq!(frame.as_bytes()[5], 0x23);
        assert_eq!(frame.as_bytes()[6], 0x01);
        assert_eq!(frame.argument(), 0x0123);
    }

    #[test]
    fn checksum_covers_bytes_two_through_six() {
        for (command, argument, key) in [
            (STATUS, 0u16, 0u16),
            (START_STOP, 1, 9999),
            (SET_LEVEL, 36, 4321),
            (0xFF, 0xFFFF, 9999),
        ] {
            let frame = encode(command, argument, passkey(key));
            let bytes = frame.as_bytes();
            let sum: u32 = bytes[2..=6].iter().map(|b| u32::from(*b)).sum();
            assert_eq!(u32::from(frame.checksum()), sum % 256);
        }
    }

    #[test]
    fn parse_recovers_encoded_fields() {
        let frame = encode(SET_LEVEL, 20, passkey(1234));
        let parsed = CommandFrame::parse(frame.as_bytes()).unwrap();

        assert_eq!(parsed.variant(), VARIANT_NORMAL);
        assert_eq!(parsed.auth(), [12, 34]);
        assert_eq!(parsed.command(), SET_LEVEL);
        assert_eq!(parsed.argument(), 20);
        assert!(parsed.authenticates(Passkey::DEFAULT));
        assert!(!parsed.authenticates(Passkey::new(4321).unwrap()));
    }

    #[test]
    fn pairing_frames_use_pairing_variant() {
        let frame = encode(STATUS, 0, Auth::Pairing);
        assert_eq!(frame.variant(), VARIANT_PAIRING);
        assert!(frame.is_pairing());
        assert_eq!(frame.checksum(), checksum(&frame.as_bytes()[2..7]));

        let parsed = CommandFrame::parse(frame.as_bytes()).unwrap();
        assert_eq!(parsed, frame);
        assert!(!parsed.authenticates(Passkey::DEFAULT));
    }

    #[test]
    fn parse_rejects_bad_marker() {
        let mut bytes = *encode(STATUS, 0, passkey(1234)).as_bytes();
        bytes[0] = 0xAB;
        assert!(matches!(
            CommandFrame::parse(&bytes),
            Err(FrameError::MalformedFrame(_))
        ));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(
            CommandFrame::parse(&[0xAA, 0x55, 0, 0]),
            Err(FrameError::MalformedFrame(_))
        ));
    }

    #[test]
    fn parse_rejects_corrupted_checksum() {
        let mut bytes = *encode(START_STOP, 1, passkey(1234)).as_bytes();
        bytes[7] = bytes[7].wrapping_add(1);
        assert!(matches!(
            CommandFrame::parse(&bytes),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn passkey_range_is_enforced() {
        assert!(Passkey::new(9999).is_some());
        assert!(Passkey::new(10_000).is_none());
        let passkey = Passkey::new(905).unwrap();
        assert_eq!(passkey.get(), 905);
        assert_eq!(passkey.auth_bytes(), [9, 5]);
    }

    #[test]
    fn passkey_debug_is_redacted() {
        let rendered = format!("{:?}", Passkey::DEFAULT);
        assert!(!rendered.contains("1234"));
    }
}
