/// RakNet reliability types, as carried in the top three bits of an
/// encapsulated packet's flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reliability {
    Unreliable = 0,
    UnreliableSequenced = 1,
    Reliable = 2,
    ReliableOrdered = 3,
    ReliableSequenced = 4,
    UnreliableWithAckReceipt = 5,
    ReliableWithAckReceipt = 6,
    ReliableOrderedWithAckReceipt = 7,
}

impl Reliability {
    /// Reads the low three bits of `v`; higher bits are ignored.
    pub fn from_bits(v: u8) -> Self {
        match v & 0b111 {
            0 => Reliability::Unreliable,
            1 => Reliability::UnreliableSequenced,
            2 => Reliability::Reliable,
            3 => Reliability::ReliableOrdered,
            4 => Reliability::ReliableSequenced,
            5 => Reliability::UnreliableWithAckReceipt,
            6 => Reliability::ReliableWithAckReceipt,
            _ => Reliability::ReliableOrderedWithAckReceipt,
        }
    }

    /// Type 2 and above carry a 3-byte reliable index.
    pub fn has_reliable_index(self) -> bool {
        self as u8 >= Reliability::Reliable as u8
    }

    /// Type 3 and above also carry a 4-byte ordering block.
    pub fn has_ordering(self) -> bool {
        self as u8 >= Reliability::ReliableOrdered as u8
    }
}
