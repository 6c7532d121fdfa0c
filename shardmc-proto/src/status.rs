//! Response status codes.
//!
//! A non-zero status in a well-formed response is data, not a transport
//! fault: operations surface it in their result instead of failing.

/// Status code carried at bytes 6..8 of a response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    NoError,
    KeyNotFound,
    KeyExists,
    ValueTooLarge,
    InvalidArguments,
    ItemNotStored,
    NonNumericValue,
    WrongServer,
    AuthError,
    AuthContinue,
    UnknownCommand,
    OutOfMemory,
    NotSupported,
    InternalError,
    Busy,
    TemporaryFailure,
    /// Status code outside the published table.
    Other(u16),
}

impl Status {
    /// Maps a wire status code to its enumeration value.
    pub fn from_u16(code: u16) -> Status {
        match code {
            0x0000 => Status::NoError,
            0x0001 => Status::KeyNotFound,
            0x0002 => Status::KeyExists,
            0x0003 => Status::ValueTooLarge,
            0x0004 => Status::InvalidArguments,
            0x0005 => Status::ItemNotStored,
            0x0006 => Status::NonNumericValue,
            0x0007 => Status::WrongServer,
            0x0008 => Status::AuthError,
            0x0009 => Status::AuthContinue,
            0x0081 => Status::UnknownCommand,
            0x0082 => Status::OutOfMemory,
            0x0083 => Status::NotSupported,
            0x0084 => Status::InternalError,
            0x0085 => Status::Busy,
            0x0086 => Status::TemporaryFailure,
            other => Status::Other(other),
        }
    }

    /// Wire code for this status.
    pub fn as_u16(self) -> u16 {
        match self {
            Status::NoError => 0x0000,
            Status::KeyNotFound => 0x0001,
            Status::KeyExists => 0x0002,
            Status::ValueTooLarge => 0x0003,
            Status::InvalidArguments => 0x0004,
            Status::ItemNotStored => 0x0005,
            Status::NonNumericValue => 0x0006,
            Status::WrongServer => 0x0007,
            Status::AuthError => 0x0008,
            Status::AuthContinue => 0x0009,
            Status::UnknownCommand => 0x0081,
            Status::OutOfMemory => 0x0082,
            Status::NotSupported => 0x0083,
            Status::InternalError => 0x0084,
            Status::Busy => 0x0085,
            Status::TemporaryFailure => 0x0086,
            Status::Other(code) => code,
        }
    }

    /// True only for `NoError`.
    pub fn is_success(self) -> bool {
        self == Status::NoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        for code in (0x0000..=0x0009).chain(0x0081..=0x0086) {
            let status = Status::from_u16(code);
            assert_ne!(status, Status::Other(code));
            assert_eq!(status.as_u16(), code);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(Status::from_u16(0x0042), Status::Other(0x0042));
        assert_eq!(Status::Other(0x0042).as_u16(), 0x0042);
    }

    #[test]
    fn only_no_error_is_success() {
        assert!(Status::NoError.is_success());
        assert!(!Status::KeyNotFound.is_success());
        assert!(!Status::Other(1234).is_success());
    }
}
