use thiserror::Error;

/// Failure to read a wire value. Shared by every codec in the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer did not contain enough bytes to decode the requested value.
    #[error("Unexpected EoF, not enough bytes to read requested type.")]
    UnexpectedEof,

    /// A control packet ID was not recognised by the registry.
    #[error("Unknown Packet, ID: {0}")]
    UnknownId(u8),

    /// An address encoding used an unsupported version field.
    #[error(
        "An invalid IpAddress version was encountered:\n\
        Provided: {0}, expected: 4 or 6."
    )]
    InvalidAddrVersion(u8),

    /// A length-prefixed string declared a negative length other than -1.
    #[error("Invalid string length: {0}")]
    InvalidStringLength(i32),

    #[error("String payload is not valid UTF-8.")]
    InvalidUtf8,

    /// An encapsulated packet declared more payload bits than the datagram holds.
    #[error("Declared bit length {bit_length} needs {needed} bytes, only {available} left.")]
    BitLengthMismatch {
        bit_length: u16,
        needed: usize,
        available: usize,
    },
}

/// Errors raised while encoding values that do not fit their wire field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("String of {0} bytes does not fit a 4-byte signed length.")]
    StringTooLong(usize),

    #[error("Payload of {0} bytes does not fit a 16-bit bit length.")]
    PayloadTooLarge(usize),

    /// The frame flags call for a field the packet does not carry.
    #[error("Frame flags require a field that is not set.")]
    MissingField,

    #[error("{0} ack records do not fit a 16-bit count.")]
    TooManyRanges(usize),
}
