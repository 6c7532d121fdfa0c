//! Operation codes for the binary cache protocol.
//!
//! The full opcode table is declared for wire fidelity; only the subset
//! used by the client operations is exercised. Quiet, range, SASL, and
//! TAP opcodes are reserved.

/// Request/response opcode, byte 1 of every frame header.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Get = 0x00,
    Set = 0x01,
    Add = 0x02,
    Replace = 0x03,
    Delete = 0x04,
    Increment = 0x05,
    Decrement = 0x06,
    Quit = 0x07,
    Flush = 0x08,
    GetQ = 0x09,
    NoOp = 0x0a,
    Version = 0x0b,
    GetK = 0x0c,
    GetKQ = 0x0d,
    Append = 0x0e,
    Prepend = 0x0f,
    Stat = 0x10,
    SetQ = 0x11,
    AddQ = 0x12,
    ReplaceQ = 0x13,
    DeleteQ = 0x14,
    IncrementQ = 0x15,
    DecrementQ = 0x16,
    QuitQ = 0x17,
    FlushQ = 0x18,
    AppendQ = 0x19,
    PrependQ = 0x1a,
    Verbosity = 0x1b,
    Touch = 0x1c,
    Gat = 0x1d,
    GatQ = 0x1e,
    SaslListMechs = 0x20,
    SaslAuth = 0x21,
    SaslStep = 0x22,
    RGet = 0x30,
    RSet = 0x31,
    RSetQ = 0x32,
    RAppend = 0x33,
    RAppendQ = 0x34,
    RPrepend = 0x35,
    RPrependQ = 0x36,
    RDelete = 0x37,
    RDeleteQ = 0x38,
    RIncr = 0x39,
    RIncrQ = 0x3a,
    RDecr = 0x3b,
    RDecrQ = 0x3c,
    SetVbucket = 0x3d,
    GetVbucket = 0x3e,
    DelVbucket = 0x3f,
    TapConnect = 0x40,
    TapMutation = 0x41,
    TapDelete = 0x42,
    TapFlush = 0x43,
    TapOpaque = 0x44,
    TapVbucketSet = 0x45,
    TapCheckpointStart = 0x46,
    TapCheckpointEnd = 0x47,
}

impl Opcode {
    /// Wire byte for this opcode.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Maps a wire byte back to an opcode, `None` for bytes outside the table.
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        use Opcode::*;
        let opcode = match byte {
            0x00 => Get,
            0x01 => Set,
            0x02 => Add,
            0x03 => Replace,
            0x04 => Delete,
            0x05 => Increment,
            0x06 => Decrement,
            0x07 => Quit,
            0x08 => Flush,
            0x09 => GetQ,
            0x0a => NoOp,
            0x0b => Version,
            0x0c => GetK,
            0x0d => GetKQ,
            0x0e => Append,
            0x0f => Prepend,
            0x10 => Stat,
            0x11 => SetQ,
            0x12 => AddQ,
            0x13 => ReplaceQ,
            0x14 => DeleteQ,
            0x15 => IncrementQ,
            0x16 => DecrementQ,
            0x17 => QuitQ,
            0x18 => FlushQ,
            0x19 => AppendQ,
            0x1a => PrependQ,
            0x1b => Verbosity,
            0x1c => Touch,
            0x1d => Gat,
            0x1e => GatQ,
            0x20 => SaslListMechs,
            0x21 => SaslAuth,
            0x22 => SaslStep,
            0x30 => RGet,
            0x31 => RSet,
            0x32 => RSetQ,
            0x33 => RAppend,
            0x34 => RAppendQ,
            0x35 => RPrepend,
            0x36 => RPrependQ,
            0x37 => RDelete,
            0x38 => RDeleteQ,
            0x39 => RIncr,
            0x3a => RIncrQ,
            0x3b => RDecr,
            0x3c => RDecrQ,
            0x3d => SetVbucket,
            0x3e => GetVbucket,
            0x3f => DelVbucket,
            0x40 => TapConnect,
            0x41 => TapMutation,
            0x42 => TapDelete,
            0x43 => TapFlush,
            0x44 => TapOpaque,
            0x45 => TapVbucketSet,
            0x46 => TapCheckpointStart,
            0x47 => TapCheckpointEnd,
            _ => return None,
        };
        Some(opcode)
    }
}

/// Filter option for the multi-response stat operation.
///
/// The binary protocol supports fewer stat groups than the text variant;
/// the filter travels as the request key when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatFilter {
    /// No filter; the server returns its general stat group.
    #[default]
    All,
    Items,
    Slabs,
    Sizes,
}

impl StatFilter {
    /// Key bytes to send for this filter, `None` for the unfiltered form.
    pub fn as_key(self) -> Option<&'static [u8]> {
        match self {
            StatFilter::All => None,
            StatFilter::Items => Some(b"items"),
            StatFilter::Slabs => Some(b"slabs"),
            StatFilter::Sizes => Some(b"sizes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_round_trips_through_wire_byte() {
        for byte in 0u8..=0x47 {
            if let Some(opcode) = Opcode::from_u8(byte) {
                assert_eq!(opcode.as_u8(), byte);
            }
        }
    }

    #[test]
    fn gaps_in_the_table_are_rejected() {
        assert_eq!(Opcode::from_u8(0x1f), None);
        assert_eq!(Opcode::from_u8(0x23), None);
        assert_eq!(Opcode::from_u8(0xff), None);
    }

    #[test]
    fn stat_filter_keys() {
        assert_eq!(StatFilter::All.as_key(), None);
        assert_eq!(StatFilter::Items.as_key(), Some(&b"items"[..]));
        assert_eq!(StatFilter::Slabs.as_key(), Some(&b"slabs"[..]));
        assert_eq!(StatFilter::Sizes.as_key(), Some(&b"sizes"[..]));
    }
}
