use std::fmt;

use crate::ir::types::Type;

/// Vector micro-operations, one variant per (operation, element width).
///
/// Every operation views its 128-bit operands as `128/esize` lanes; the
/// element width and signedness interpretation are part of the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Void,
    Identity,

    // Basic arithmetic and logic
    Add8, Add16, Add32, Add64,
    Sub8, Sub16, Sub32, Sub64,
    And,
    AndNot, // a & ~b
    Or,
    Eor,
    Not,
    ZeroVector,
    ZeroUpper,
    Abs8, Abs16, Abs32, Abs64,
    Neg8, Neg16, Neg32, Neg64,

    // Lane arrangement
    Broadcast8, Broadcast16, Broadcast32, Broadcast64,
    BroadcastLower8, BroadcastLower16, BroadcastLower32,
    BroadcastElement8, BroadcastElement16, BroadcastElement32, BroadcastElement64,
    GetElement8, GetElement16, GetElement32, GetElement64,
    SetElement8, SetElement16, SetElement32, SetElement64,
    Extract, // byte-wise concatenation rotate of (a, b) by an immediate bit position
    ExtractLower, // as Extract, over the low halves; result upper half is zero
    ShuffleLowHalfwords, ShuffleHighHalfwords, ShuffleWords, // pshuflw/pshufhw/pshufd-style
    SignExtend8, SignExtend16, SignExtend32, SignExtend64,
    ZeroExtend8, ZeroExtend16, ZeroExtend32, ZeroExtend64,
    NarrowTruncate16, NarrowTruncate32, NarrowTruncate64,
    InterleaveLower8, InterleaveLower16, InterleaveLower32, InterleaveLower64,
    InterleaveUpper8, InterleaveUpper16, InterleaveUpper32, InterleaveUpper64,
    DeinterleaveEven8, DeinterleaveEven16, DeinterleaveEven32, DeinterleaveEven64,
    DeinterleaveOdd8, DeinterleaveOdd16, DeinterleaveOdd32, DeinterleaveOdd64,

    // Comparison (result lanes are all-ones or all-zero masks)
    Equal8, Equal16, Equal32, Equal64, Equal128,
    GreaterSigned8, GreaterSigned16, GreaterSigned32, GreaterSigned64,
    GreaterUnsigned8, GreaterUnsigned16, GreaterUnsigned32, GreaterUnsigned64,
    GreaterEqualSigned8, GreaterEqualSigned16, GreaterEqualSigned32, GreaterEqualSigned64,
    GreaterEqualUnsigned8, GreaterEqualUnsigned16, GreaterEqualUnsigned32, GreaterEqualUnsigned64,

    // Min / max
    MaxSigned8, MaxSigned16, MaxSigned32, MaxSigned64,
    MaxUnsigned8, MaxUnsigned16, MaxUnsigned32, MaxUnsigned64,
    MinSigned8, MinSigned16, MinSigned32, MinSigned64,
    MinUnsigned8, MinUnsigned16, MinUnsigned32, MinUnsigned64,

    // Shifts by immediate
    LogicalShiftLeft8, LogicalShiftLeft16, LogicalShiftLeft32, LogicalShiftLeft64,
    LogicalShiftRight8, LogicalShiftRight16, LogicalShiftRight32, LogicalShiftRight64,
    ArithmeticShiftRight8, ArithmeticShiftRight16, ArithmeticShiftRight32, ArithmeticShiftRight64,

    // Per-lane variable shifts (amount = low byte of each lane of b, sign-extended)
    LogicalVShift8, LogicalVShift16, LogicalVShift32, LogicalVShift64,
    ArithmeticVShift8, ArithmeticVShift16, ArithmeticVShift32, ArithmeticVShift64,
    RoundingShiftLeftSigned8, RoundingShiftLeftSigned16,
    RoundingShiftLeftSigned32, RoundingShiftLeftSigned64,
    RoundingShiftLeftUnsigned8, RoundingShiftLeftUnsigned16,
    RoundingShiftLeftUnsigned32, RoundingShiftLeftUnsigned64,

    // Multiplication
    Multiply8, Multiply16, Multiply32, Multiply64,
    PolynomialMultiply8,
    PolynomialMultiplyLong8,
    PolynomialMultiplyLong64,
    SignedAbsoluteDifference8, SignedAbsoluteDifference16, SignedAbsoluteDifference32,
    UnsignedAbsoluteDifference8, UnsignedAbsoluteDifference16, UnsignedAbsoluteDifference32,

    // Pairwise reductions
    PairedAdd8, PairedAdd16, PairedAdd32, PairedAdd64,
    PairedAddLower8, PairedAddLower16, PairedAddLower32,
    PairedAddSignedWiden8, PairedAddSignedWiden16, PairedAddSignedWiden32,
    PairedAddUnsignedWiden8, PairedAddUnsignedWiden16, PairedAddUnsignedWiden32,
    PairedMaxSigned8, PairedMaxSigned16, PairedMaxSigned32,
    PairedMaxUnsigned8, PairedMaxUnsigned16, PairedMaxUnsigned32,
    PairedMinSigned8, PairedMinSigned16, PairedMinSigned32,
    PairedMinUnsigned8, PairedMinUnsigned16, PairedMinUnsigned32,

    // Halving arithmetic
    HalvingAddSigned8, HalvingAddSigned16, HalvingAddSigned32,
    HalvingAddUnsigned8, HalvingAddUnsigned16, HalvingAddUnsigned32,
    HalvingSubSigned8, HalvingSubSigned16, HalvingSubSigned32,
    HalvingSubUnsigned8, HalvingSubUnsigned16, HalvingSubUnsigned32,
    RoundingHalvingAddSigned8, RoundingHalvingAddSigned16, RoundingHalvingAddSigned32,
    RoundingHalvingAddUnsigned8, RoundingHalvingAddUnsigned16, RoundingHalvingAddUnsigned32,

    // Bit counting and reversal
    PopulationCount,
    CountLeadingZeros8, CountLeadingZeros16, CountLeadingZeros32,
    ReverseBits,
    ReverseElementsInHalfGroups8,
    ReverseElementsInWordGroups8, ReverseElementsInWordGroups16,
    ReverseElementsInLongGroups8, ReverseElementsInLongGroups16, ReverseElementsInLongGroups32,

    // Table lookup: args = (defaults, indices, t0, t1, t2, t3), trailing tables Void
    TableLookup,

    // Saturating operations — these OR into the sticky saturation flag
    SignedSaturatedAdd8, SignedSaturatedAdd16, SignedSaturatedAdd32, SignedSaturatedAdd64,
    SignedSaturatedSub8, SignedSaturatedSub16, SignedSaturatedSub32, SignedSaturatedSub64,
    UnsignedSaturatedAdd8, UnsignedSaturatedAdd16, UnsignedSaturatedAdd32, UnsignedSaturatedAdd64,
    UnsignedSaturatedSub8, UnsignedSaturatedSub16, UnsignedSaturatedSub32, UnsignedSaturatedSub64,
    SignedSaturatedAbs8, SignedSaturatedAbs16, SignedSaturatedAbs32, SignedSaturatedAbs64,
    SignedSaturatedNeg8, SignedSaturatedNeg16, SignedSaturatedNeg32, SignedSaturatedNeg64,
    SignedSaturatedNarrowToSigned16, SignedSaturatedNarrowToSigned32, SignedSaturatedNarrowToSigned64,
    SignedSaturatedNarrowToUnsigned16, SignedSaturatedNarrowToUnsigned32, SignedSaturatedNarrowToUnsigned64,
    UnsignedSaturatedNarrow16, UnsignedSaturatedNarrow32, UnsignedSaturatedNarrow64,
    SignedSaturatedAccumulateUnsigned8, SignedSaturatedAccumulateUnsigned16,
    SignedSaturatedAccumulateUnsigned32, SignedSaturatedAccumulateUnsigned64,
    UnsignedSaturatedAccumulateSigned8, UnsignedSaturatedAccumulateSigned16,
    UnsignedSaturatedAccumulateSigned32, UnsignedSaturatedAccumulateSigned64,
    SignedSaturatedDoublingMultiplyHigh16, SignedSaturatedDoublingMultiplyHigh32,
    SignedSaturatedDoublingMultiplyHighRounding16, SignedSaturatedDoublingMultiplyHighRounding32,
    SignedSaturatedDoublingMultiplyLong16, SignedSaturatedDoublingMultiplyLong32,
    SignedSaturatedShiftLeft8, SignedSaturatedShiftLeft16,
    SignedSaturatedShiftLeft32, SignedSaturatedShiftLeft64,
    UnsignedSaturatedShiftLeft8, UnsignedSaturatedShiftLeft16,
    UnsignedSaturatedShiftLeft32, UnsignedSaturatedShiftLeft64,
}

impl Opcode {
    /// Number of arguments this opcode takes.
    pub fn num_args(self) -> usize {
        use Opcode::*;
        match self {
            Void | ZeroVector => 0,

            Identity | Not | ZeroUpper
            | Abs8 | Abs16 | Abs32 | Abs64
            | Neg8 | Neg16 | Neg32 | Neg64
            | Broadcast8 | Broadcast16 | Broadcast32 | Broadcast64
            | BroadcastLower8 | BroadcastLower16 | BroadcastLower32
            | SignExtend8 | SignExtend16 | SignExtend32 | SignExtend64
            | ZeroExtend8 | ZeroExtend16 | ZeroExtend32 | ZeroExtend64
            | NarrowTruncate16 | NarrowTruncate32 | NarrowTruncate64
            | PairedAddSignedWiden8 | PairedAddSignedWiden16 | PairedAddSignedWiden32
            | PairedAddUnsignedWiden8 | PairedAddUnsignedWiden16 | PairedAddUnsignedWiden32
            | PopulationCount
            | CountLeadingZeros8 | CountLeadingZeros16 | CountLeadingZeros32
            | ReverseBits
            | ReverseElementsInHalfGroups8
            | ReverseElementsInWordGroups8 | ReverseElementsInWordGroups16
            | ReverseElementsInLongGroups8 | ReverseElementsInLongGroups16
            | ReverseElementsInLongGroups32
            | SignedSaturatedAbs8 | SignedSaturatedAbs16
            | SignedSaturatedAbs32 | SignedSaturatedAbs64
            | SignedSaturatedNeg8 | SignedSaturatedNeg16
            | SignedSaturatedNeg32 | SignedSaturatedNeg64
            | SignedSaturatedNarrowToSigned16 | SignedSaturatedNarrowToSigned32
            | SignedSaturatedNarrowToSigned64
            | SignedSaturatedNarrowToUnsigned16 | SignedSaturatedNarrowToUnsigned32
            | SignedSaturatedNarrowToUnsigned64
            | UnsignedSaturatedNarrow16 | UnsignedSaturatedNarrow32
            | UnsignedSaturatedNarrow64 => 1,

            SetElement8 | SetElement16 | SetElement32 | SetElement64
            | Extract | ExtractLower => 3,

            TableLookup => 6,

            _ => 2,
        }
    }

    /// Result type of this opcode.
    pub fn return_type(self) -> Type {
        use Opcode::*;
        match self {
            Void => Type::Void,
            Identity => Type::Opaque,
            GetElement8 => Type::U8,
            GetElement16 => Type::U16,
            GetElement32 => Type::U32,
            GetElement64 => Type::U64,
            _ => Type::U128,
        }
    }

    /// Saturating opcodes have an observable side effect beyond their result:
    /// they OR into the sticky saturation flag.
    pub fn has_side_effects(self) -> bool {
        self.is_saturating()
    }

    /// Whether this opcode updates the sticky saturation flag.
    pub fn is_saturating(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            SignedSaturatedAdd8 | SignedSaturatedAdd16 | SignedSaturatedAdd32 | SignedSaturatedAdd64
            | SignedSaturatedSub8 | SignedSaturatedSub16 | SignedSaturatedSub32 | SignedSaturatedSub64
            | UnsignedSaturatedAdd8 | UnsignedSaturatedAdd16
            | UnsignedSaturatedAdd32 | UnsignedSaturatedAdd64
            | UnsignedSaturatedSub8 | UnsignedSaturatedSub16
            | UnsignedSaturatedSub32 | UnsignedSaturatedSub64
            | SignedSaturatedAbs8 | SignedSaturatedAbs16
            | SignedSaturatedAbs32 | SignedSaturatedAbs64
            | SignedSaturatedNeg8 | SignedSaturatedNeg16
            | SignedSaturatedNeg32 | SignedSaturatedNeg64
            | SignedSaturatedNarrowToSigned16 | SignedSaturatedNarrowToSigned32
            | SignedSaturatedNarrowToSigned64
            | SignedSaturatedNarrowToUnsigned16 | SignedSaturatedNarrowToUnsigned32
            | SignedSaturatedNarrowToUnsigned64
            | UnsignedSaturatedNarrow16 | UnsignedSaturatedNarrow32 | UnsignedSaturatedNarrow64
            | SignedSaturatedAccumulateUnsigned8 | SignedSaturatedAccumulateUnsigned16
            | SignedSaturatedAccumulateUnsigned32 | SignedSaturatedAccumulateUnsigned64
            | UnsignedSaturatedAccumulateSigned8 | UnsignedSaturatedAccumulateSigned16
            | UnsignedSaturatedAccumulateSigned32 | UnsignedSaturatedAccumulateSigned64
            | SignedSaturatedDoublingMultiplyHigh16 | SignedSaturatedDoublingMultiplyHigh32
            | SignedSaturatedDoublingMultiplyHighRounding16
            | SignedSaturatedDoublingMultiplyHighRounding32
            | SignedSaturatedDoublingMultiplyLong16 | SignedSaturatedDoublingMultiplyLong32
            | SignedSaturatedShiftLeft8 | SignedSaturatedShiftLeft16
            | SignedSaturatedShiftLeft32 | SignedSaturatedShiftLeft64
            | UnsignedSaturatedShiftLeft8 | UnsignedSaturatedShiftLeft16
            | UnsignedSaturatedShiftLeft32 | UnsignedSaturatedShiftLeft64
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert_eq!(Opcode::ZeroVector.num_args(), 0);
        assert_eq!(Opcode::Not.num_args(), 1);
        assert_eq!(Opcode::Add8.num_args(), 2);
        assert_eq!(Opcode::SetElement32.num_args(), 3);
        assert_eq!(Opcode::TableLookup.num_args(), 6);
    }

    #[test]
    fn test_return_types() {
        assert_eq!(Opcode::Add64.return_type(), Type::U128);
        assert_eq!(Opcode::GetElement8.return_type(), Type::U8);
        assert_eq!(Opcode::GetElement64.return_type(), Type::U64);
        assert_eq!(Opcode::Void.return_type(), Type::Void);
    }

    #[test]
    fn test_saturating_side_effects() {
        assert!(Opcode::SignedSaturatedAdd8.has_side_effects());
        assert!(Opcode::UnsignedSaturatedShiftLeft64.has_side_effects());
        assert!(!Opcode::Add8.has_side_effects());
        assert!(!Opcode::Abs8.has_side_effects());
    }
}
