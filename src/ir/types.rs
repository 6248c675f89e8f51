use std::fmt;

/// IR type system. Types are bit flags to allow compatibility checks via bitwise OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Type {
    Void = 0,
    Opaque = 1 << 0,
    U1 = 1 << 1,
    U8 = 1 << 2,
    U16 = 1 << 3,
    U32 = 1 << 4,
    U64 = 1 << 5,
    U128 = 1 << 6,
}

impl Type {
    /// Returns the raw bit value of this type.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Bit width of values of this type, as tracked by the register allocator.
    pub fn bit_width(self) -> usize {
        match self {
            Type::Void | Type::Opaque => 0,
            Type::U1 => 1,
            Type::U8 => 8,
            Type::U16 => 16,
            Type::U32 => 32,
            Type::U64 => 64,
            Type::U128 => 128,
        }
    }

    /// Check if two types are compatible.
    /// Opaque is compatible with any non-Void type.
    pub fn is_compatible_with(self, other: Type) -> bool {
        if self == other {
            return true;
        }
        if self == Type::Opaque && other != Type::Void {
            return true;
        }
        if other == Type::Opaque && self != Type::Void {
            return true;
        }
        false
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "Void"),
            Type::Opaque => write!(f, "Opaque"),
            Type::U1 => write!(f, "U1"),
            Type::U8 => write!(f, "U8"),
            Type::U16 => write!(f, "U16"),
            Type::U32 => write!(f, "U32"),
            Type::U64 => write!(f, "U64"),
            Type::U128 => write!(f, "U128"),
        }
    }
}
