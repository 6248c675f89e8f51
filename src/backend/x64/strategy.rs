//! Strategy selection: one ranked table of (capability requirement, emitter)
//! per opcode, consulted at code-generation time.

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_arrangement::*;
use crate::backend::x64::emit_vector_basic::*;
use crate::backend::x64::emit_vector_compare::*;
use crate::backend::x64::emit_vector_misc::*;
use crate::backend::x64::emit_vector_multiply::*;
use crate::backend::x64::emit_vector_paired::*;
use crate::backend::x64::emit_vector_saturated::*;
use crate::backend::x64::emit_vector_shift::*;
use crate::backend::x64::emit_vector_table::*;
use crate::backend::x64::hostcaps::HostCaps;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::opcode::Opcode;
use crate::ir::value::InstRef;

pub type EmitFn = fn(&EmitContext, &mut RegAlloc, InstRef, &Inst);

/// One lowering candidate: usable when the host has `requires`.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub requires: HostCaps,
    pub emit: EmitFn,
}

// `HostCaps::empty()` is a const-fn call, which the compiler will not promote
// inside a static slice literal; a named const works everywhere.
const BASELINE: HostCaps = HostCaps::empty();

macro_rules! single {
    ($f:path) => {
        &[Strategy { requires: BASELINE, emit: $f }]
    };
}

macro_rules! tiered {
    ($(($caps:expr, $f:path)),+ $(,)?) => {
        &[$(Strategy { requires: $caps, emit: $f }),+]
    };
}

/// The ranked strategy table for `op`, most capable first. The last entry
/// always carries an empty requirement, so selection cannot fail.
pub fn strategies(op: Opcode) -> &'static [Strategy] {
    use Opcode::*;
    match op {
        Void | Identity => panic!("{:?} reaches the backend without lowering", op),

        Add8 => single!(emit_vector_add8),
        Add16 => single!(emit_vector_add16),
        Add32 => single!(emit_vector_add32),
        Add64 => single!(emit_vector_add64),
        Sub8 => single!(emit_vector_sub8),
        Sub16 => single!(emit_vector_sub16),
        Sub32 => single!(emit_vector_sub32),
        Sub64 => single!(emit_vector_sub64),
        And => single!(emit_vector_and),
        AndNot => single!(emit_vector_and_not),
        Or => single!(emit_vector_or),
        Eor => single!(emit_vector_eor),
        Not => single!(emit_vector_not),
        ZeroVector => single!(emit_vector_zero),
        ZeroUpper => single!(emit_vector_zero_upper),
        Abs8 => tiered![(HostCaps::SSSE3, emit_vector_abs8_ssse3), (BASELINE, emit_vector_abs8)],
        Abs16 => tiered![(HostCaps::SSSE3, emit_vector_abs16_ssse3), (BASELINE, emit_vector_abs16)],
        Abs32 => tiered![(HostCaps::SSSE3, emit_vector_abs32_ssse3), (BASELINE, emit_vector_abs32)],
        Abs64 => tiered![(HostCaps::AVX512_ORTHO, emit_vector_abs64_avx512), (BASELINE, emit_vector_abs64)],
        Neg8 => single!(emit_vector_neg8),
        Neg16 => single!(emit_vector_neg16),
        Neg32 => single!(emit_vector_neg32),
        Neg64 => single!(emit_vector_neg64),

        Broadcast8 => tiered![(HostCaps::AVX2, emit_vector_broadcast8_avx2), (BASELINE, emit_vector_broadcast8)],
        Broadcast16 => tiered![(HostCaps::AVX2, emit_vector_broadcast16_avx2), (BASELINE, emit_vector_broadcast16)],
        Broadcast32 => tiered![(HostCaps::AVX2, emit_vector_broadcast32_avx2), (BASELINE, emit_vector_broadcast32)],
        Broadcast64 => tiered![(HostCaps::AVX2, emit_vector_broadcast64_avx2), (BASELINE, emit_vector_broadcast64)],
        BroadcastLower8 => tiered![(HostCaps::AVX2, emit_vector_broadcast_lower8_avx2), (BASELINE, emit_vector_broadcast_lower8)],
        BroadcastLower16 => single!(emit_vector_broadcast_lower16),
        BroadcastLower32 => single!(emit_vector_broadcast_lower32),
        BroadcastElement8 => single!(emit_vector_broadcast_element8),
        BroadcastElement16 => single!(emit_vector_broadcast_element16),
        BroadcastElement32 => single!(emit_vector_broadcast_element32),
        BroadcastElement64 => single!(emit_vector_broadcast_element64),
        GetElement8 => tiered![(HostCaps::SSE41, emit_vector_get_element8_sse41), (BASELINE, emit_vector_get_element8)],
        GetElement16 => single!(emit_vector_get_element16),
        GetElement32 => tiered![(HostCaps::SSE41, emit_vector_get_element32_sse41), (BASELINE, emit_vector_get_element32)],
        GetElement64 => tiered![(HostCaps::SSE41, emit_vector_get_element64_sse41), (BASELINE, emit_vector_get_element64)],
        SetElement8 => tiered![(HostCaps::SSE41, emit_vector_set_element8_sse41), (BASELINE, emit_vector_set_element8)],
        SetElement16 => single!(emit_vector_set_element16),
        SetElement32 => tiered![(HostCaps::SSE41, emit_vector_set_element32_sse41), (BASELINE, emit_vector_set_element32)],
        SetElement64 => tiered![(HostCaps::SSE41, emit_vector_set_element64_sse41), (BASELINE, emit_vector_set_element64)],
        Extract => tiered![(HostCaps::SSSE3, emit_vector_extract_ssse3), (BASELINE, emit_vector_extract)],
        ExtractLower => single!(emit_vector_extract_lower),
        ShuffleLowHalfwords => single!(emit_vector_shuffle_low_halfwords),
        ShuffleHighHalfwords => single!(emit_vector_shuffle_high_halfwords),
        ShuffleWords => single!(emit_vector_shuffle_words),
        SignExtend8 => tiered![(HostCaps::SSE41, emit_vector_sign_extend8_sse41), (BASELINE, emit_vector_sign_extend8)],
        SignExtend16 => tiered![(HostCaps::SSE41, emit_vector_sign_extend16_sse41), (BASELINE, emit_vector_sign_extend16)],
        SignExtend32 => tiered![(HostCaps::SSE41, emit_vector_sign_extend32_sse41), (BASELINE, emit_vector_sign_extend32)],
        SignExtend64 => single!(emit_vector_sign_extend64),
        ZeroExtend8 => tiered![(HostCaps::SSE41, emit_vector_zero_extend8_sse41), (BASELINE, emit_vector_zero_extend8)],
        ZeroExtend16 => tiered![(HostCaps::SSE41, emit_vector_zero_extend16_sse41), (BASELINE, emit_vector_zero_extend16)],
        ZeroExtend32 => tiered![(HostCaps::SSE41, emit_vector_zero_extend32_sse41), (BASELINE, emit_vector_zero_extend32)],
        ZeroExtend64 => single!(emit_vector_zero_extend64),
        NarrowTruncate16 => single!(emit_vector_narrow_truncate16),
        NarrowTruncate32 => tiered![(HostCaps::SSE41, emit_vector_narrow_truncate32_sse41), (BASELINE, emit_vector_narrow_truncate32)],
        NarrowTruncate64 => single!(emit_vector_narrow_truncate64),
        InterleaveLower8 => single!(emit_vector_interleave_lower8),
        InterleaveLower16 => single!(emit_vector_interleave_lower16),
        InterleaveLower32 => single!(emit_vector_interleave_lower32),
        InterleaveLower64 => single!(emit_vector_interleave_lower64),
        InterleaveUpper8 => single!(emit_vector_interleave_upper8),
        InterleaveUpper16 => single!(emit_vector_interleave_upper16),
        InterleaveUpper32 => single!(emit_vector_interleave_upper32),
        InterleaveUpper64 => single!(emit_vector_interleave_upper64),
        DeinterleaveEven8 => single!(emit_vector_deinterleave_even8),
        DeinterleaveEven16 => single!(emit_vector_deinterleave_even16),
        DeinterleaveEven32 => single!(emit_vector_deinterleave_even32),
        DeinterleaveEven64 => single!(emit_vector_deinterleave_even64),
        DeinterleaveOdd8 => single!(emit_vector_deinterleave_odd8),
        DeinterleaveOdd16 => single!(emit_vector_deinterleave_odd16),
        DeinterleaveOdd32 => single!(emit_vector_deinterleave_odd32),
        DeinterleaveOdd64 => single!(emit_vector_deinterleave_odd64),

        Equal8 => single!(emit_vector_equal8),
        Equal16 => single!(emit_vector_equal16),
        Equal32 => single!(emit_vector_equal32),
        Equal64 => tiered![(HostCaps::SSE41, emit_vector_equal64_sse41), (BASELINE, emit_vector_equal64)],
        Equal128 => tiered![(HostCaps::SSE41, emit_vector_equal128_sse41), (BASELINE, emit_vector_equal128)],
        GreaterSigned8 => single!(emit_vector_greater_signed8),
        GreaterSigned16 => single!(emit_vector_greater_signed16),
        GreaterSigned32 => single!(emit_vector_greater_signed32),
        GreaterSigned64 => tiered![(HostCaps::SSE42, emit_vector_greater_signed64_sse42), (BASELINE, emit_vector_greater_signed64)],
        GreaterUnsigned8 => single!(emit_vector_greater_unsigned8),
        GreaterUnsigned16 => single!(emit_vector_greater_unsigned16),
        GreaterUnsigned32 => single!(emit_vector_greater_unsigned32),
        GreaterUnsigned64 => tiered![(HostCaps::SSE42, emit_vector_greater_unsigned64_sse42), (BASELINE, emit_vector_greater_unsigned64)],
        GreaterEqualSigned8 => single!(emit_vector_greater_equal_signed8),
        GreaterEqualSigned16 => single!(emit_vector_greater_equal_signed16),
        GreaterEqualSigned32 => single!(emit_vector_greater_equal_signed32),
        GreaterEqualSigned64 => single!(emit_vector_greater_equal_signed64),
        GreaterEqualUnsigned8 => single!(emit_vector_greater_equal_unsigned8),
        GreaterEqualUnsigned16 => single!(emit_vector_greater_equal_unsigned16),
        GreaterEqualUnsigned32 => single!(emit_vector_greater_equal_unsigned32),
        GreaterEqualUnsigned64 => single!(emit_vector_greater_equal_unsigned64),

        MaxSigned8 => tiered![(HostCaps::SSE41, emit_vector_max_signed8_sse41), (BASELINE, emit_vector_max_signed8)],
        MaxSigned16 => single!(emit_vector_max_signed16),
        MaxSigned32 => tiered![(HostCaps::SSE41, emit_vector_max_signed32_sse41), (BASELINE, emit_vector_max_signed32)],
        MaxSigned64 => single!(emit_vector_max_signed64),
        MaxUnsigned8 => single!(emit_vector_max_unsigned8),
        MaxUnsigned16 => tiered![(HostCaps::SSE41, emit_vector_max_unsigned16_sse41), (BASELINE, emit_vector_max_unsigned16)],
        MaxUnsigned32 => tiered![(HostCaps::SSE41, emit_vector_max_unsigned32_sse41), (BASELINE, emit_vector_max_unsigned32)],
        MaxUnsigned64 => single!(emit_vector_max_unsigned64),
        MinSigned8 => tiered![(HostCaps::SSE41, emit_vector_min_signed8_sse41), (BASELINE, emit_vector_min_signed8)],
        MinSigned16 => single!(emit_vector_min_signed16),
        MinSigned32 => tiered![(HostCaps::SSE41, emit_vector_min_signed32_sse41), (BASELINE, emit_vector_min_signed32)],
        MinSigned64 => single!(emit_vector_min_signed64),
        MinUnsigned8 => single!(emit_vector_min_unsigned8),
        MinUnsigned16 => tiered![(HostCaps::SSE41, emit_vector_min_unsigned16_sse41), (BASELINE, emit_vector_min_unsigned16)],
        MinUnsigned32 => tiered![(HostCaps::SSE41, emit_vector_min_unsigned32_sse41), (BASELINE, emit_vector_min_unsigned32)],
        MinUnsigned64 => single!(emit_vector_min_unsigned64),

        LogicalShiftLeft8 => single!(emit_vector_logical_shift_left8),
        LogicalShiftLeft16 => single!(emit_vector_logical_shift_left16),
        LogicalShiftLeft32 => single!(emit_vector_logical_shift_left32),
        LogicalShiftLeft64 => single!(emit_vector_logical_shift_left64),
        LogicalShiftRight8 => single!(emit_vector_logical_shift_right8),
        LogicalShiftRight16 => single!(emit_vector_logical_shift_right16),
        LogicalShiftRight32 => single!(emit_vector_logical_shift_right32),
        LogicalShiftRight64 => single!(emit_vector_logical_shift_right64),
        ArithmeticShiftRight8 => single!(emit_vector_arithmetic_shift_right8),
        ArithmeticShiftRight16 => single!(emit_vector_arithmetic_shift_right16),
        ArithmeticShiftRight32 => single!(emit_vector_arithmetic_shift_right32),
        ArithmeticShiftRight64 => single!(emit_vector_arithmetic_shift_right64),
        LogicalVShift8 => single!(emit_vector_logical_vshift8),
        LogicalVShift16 => single!(emit_vector_logical_vshift16),
        LogicalVShift32 => single!(emit_vector_logical_vshift32),
        LogicalVShift64 => single!(emit_vector_logical_vshift64),
        ArithmeticVShift8 => single!(emit_vector_arithmetic_vshift8),
        ArithmeticVShift16 => single!(emit_vector_arithmetic_vshift16),
        ArithmeticVShift32 => single!(emit_vector_arithmetic_vshift32),
        ArithmeticVShift64 => single!(emit_vector_arithmetic_vshift64),
        RoundingShiftLeftSigned8 => single!(emit_vector_rounding_shift_left_signed8),
        RoundingShiftLeftSigned16 => single!(emit_vector_rounding_shift_left_signed16),
        RoundingShiftLeftSigned32 => single!(emit_vector_rounding_shift_left_signed32),
        RoundingShiftLeftSigned64 => single!(emit_vector_rounding_shift_left_signed64),
        RoundingShiftLeftUnsigned8 => single!(emit_vector_rounding_shift_left_unsigned8),
        RoundingShiftLeftUnsigned16 => single!(emit_vector_rounding_shift_left_unsigned16),
        RoundingShiftLeftUnsigned32 => single!(emit_vector_rounding_shift_left_unsigned32),
        RoundingShiftLeftUnsigned64 => single!(emit_vector_rounding_shift_left_unsigned64),

        Multiply8 => single!(emit_vector_multiply8),
        Multiply16 => single!(emit_vector_multiply16),
        Multiply32 => tiered![(HostCaps::SSE41, emit_vector_multiply32_sse41), (BASELINE, emit_vector_multiply32)],
        Multiply64 => single!(emit_vector_multiply64),
        PolynomialMultiply8 => single!(emit_vector_polynomial_multiply8),
        PolynomialMultiplyLong8 => single!(emit_vector_polynomial_multiply_long8),
        PolynomialMultiplyLong64 => tiered![
            (HostCaps::PCLMULQDQ, emit_vector_polynomial_multiply_long64_pclmul),
            (BASELINE, emit_vector_polynomial_multiply_long64),
        ],
        SignedAbsoluteDifference8 => single!(emit_vector_signed_absolute_difference8),
        SignedAbsoluteDifference16 => single!(emit_vector_signed_absolute_difference16),
        SignedAbsoluteDifference32 => single!(emit_vector_signed_absolute_difference32),
        UnsignedAbsoluteDifference8 => single!(emit_vector_unsigned_absolute_difference8),
        UnsignedAbsoluteDifference16 => single!(emit_vector_unsigned_absolute_difference16),
        UnsignedAbsoluteDifference32 => single!(emit_vector_unsigned_absolute_difference32),

        PairedAdd8 => single!(emit_vector_paired_add8),
        PairedAddLower8 => single!(emit_vector_paired_add_lower8),
        PairedAddLower16 => tiered![(HostCaps::SSSE3, emit_vector_paired_add_lower16_ssse3), (BASELINE, emit_vector_paired_add_lower16)],
        PairedAddLower32 => tiered![(HostCaps::SSSE3, emit_vector_paired_add_lower32_ssse3), (BASELINE, emit_vector_paired_add_lower32)],
        PairedAdd16 => tiered![(HostCaps::SSSE3, emit_vector_paired_add16_ssse3), (BASELINE, emit_vector_paired_add16)],
        PairedAdd32 => tiered![(HostCaps::SSSE3, emit_vector_paired_add32_ssse3), (BASELINE, emit_vector_paired_add32)],
        PairedAdd64 => single!(emit_vector_paired_add64),
        PairedAddSignedWiden8 => tiered![
            (HostCaps::SSSE3, emit_vector_paired_add_signed_widen8_ssse3),
            (BASELINE, emit_vector_paired_add_signed_widen8),
        ],
        PairedAddSignedWiden16 => single!(emit_vector_paired_add_signed_widen16),
        PairedAddSignedWiden32 => single!(emit_vector_paired_add_signed_widen32),
        PairedAddUnsignedWiden8 => tiered![
            (HostCaps::SSSE3, emit_vector_paired_add_unsigned_widen8_ssse3),
            (BASELINE, emit_vector_paired_add_unsigned_widen8),
        ],
        PairedAddUnsignedWiden16 => single!(emit_vector_paired_add_unsigned_widen16),
        PairedAddUnsignedWiden32 => single!(emit_vector_paired_add_unsigned_widen32),
        PairedMaxSigned8 => single!(emit_vector_paired_max_signed8),
        PairedMaxSigned16 => single!(emit_vector_paired_max_signed16),
        PairedMaxSigned32 => tiered![(HostCaps::SSE41, emit_vector_paired_max_signed32_sse41), (BASELINE, emit_vector_paired_max_signed32)],
        PairedMaxUnsigned8 => single!(emit_vector_paired_max_unsigned8),
        PairedMaxUnsigned16 => single!(emit_vector_paired_max_unsigned16),
        PairedMaxUnsigned32 => tiered![(HostCaps::SSE41, emit_vector_paired_max_unsigned32_sse41), (BASELINE, emit_vector_paired_max_unsigned32)],
        PairedMinSigned8 => single!(emit_vector_paired_min_signed8),
        PairedMinSigned16 => single!(emit_vector_paired_min_signed16),
        PairedMinSigned32 => tiered![(HostCaps::SSE41, emit_vector_paired_min_signed32_sse41), (BASELINE, emit_vector_paired_min_signed32)],
        PairedMinUnsigned8 => single!(emit_vector_paired_min_unsigned8),
        PairedMinUnsigned16 => single!(emit_vector_paired_min_unsigned16),
        PairedMinUnsigned32 => tiered![(HostCaps::SSE41, emit_vector_paired_min_unsigned32_sse41), (BASELINE, emit_vector_paired_min_unsigned32)],

        HalvingAddSigned8 => single!(emit_vector_halving_add_signed8),
        HalvingAddSigned16 => single!(emit_vector_halving_add_signed16),
        HalvingAddSigned32 => single!(emit_vector_halving_add_signed32),
        HalvingAddUnsigned8 => single!(emit_vector_halving_add_unsigned8),
        HalvingAddUnsigned16 => single!(emit_vector_halving_add_unsigned16),
        HalvingAddUnsigned32 => single!(emit_vector_halving_add_unsigned32),
        HalvingSubSigned8 => single!(emit_vector_halving_sub_signed8),
        HalvingSubSigned16 => single!(emit_vector_halving_sub_signed16),
        HalvingSubSigned32 => single!(emit_vector_halving_sub_signed32),
        HalvingSubUnsigned8 => single!(emit_vector_halving_sub_unsigned8),
        HalvingSubUnsigned16 => single!(emit_vector_halving_sub_unsigned16),
        HalvingSubUnsigned32 => single!(emit_vector_halving_sub_unsigned32),
        RoundingHalvingAddSigned8 => single!(emit_vector_rounding_halving_add_signed8),
        RoundingHalvingAddSigned16 => single!(emit_vector_rounding_halving_add_signed16),
        RoundingHalvingAddSigned32 => single!(emit_vector_rounding_halving_add_signed32),
        RoundingHalvingAddUnsigned8 => single!(emit_vector_rounding_halving_add_unsigned8),
        RoundingHalvingAddUnsigned16 => single!(emit_vector_rounding_halving_add_unsigned16),
        RoundingHalvingAddUnsigned32 => single!(emit_vector_rounding_halving_add_unsigned32),

        PopulationCount => tiered![
            (HostCaps::AVX512_BITALG, emit_vector_population_count_bitalg),
            (HostCaps::SSSE3, emit_vector_population_count_ssse3),
            (BASELINE, emit_vector_population_count),
        ],
        CountLeadingZeros8 => tiered![
            (HostCaps::SSSE3, emit_vector_count_leading_zeros8_ssse3),
            (BASELINE, emit_vector_count_leading_zeros8),
        ],
        CountLeadingZeros16 => single!(emit_vector_count_leading_zeros16),
        CountLeadingZeros32 => single!(emit_vector_count_leading_zeros32),
        ReverseBits => tiered![
            (HostCaps::GFNI, emit_vector_reverse_bits_gfni),
            (HostCaps::SSSE3, emit_vector_reverse_bits_ssse3),
            (BASELINE, emit_vector_reverse_bits),
        ],
        ReverseElementsInHalfGroups8 => tiered![
            (HostCaps::SSSE3, emit_vector_reverse_elements_in_half_groups8_ssse3),
            (BASELINE, emit_vector_reverse_elements_in_half_groups8),
        ],
        ReverseElementsInWordGroups8 => tiered![
            (HostCaps::SSSE3, emit_vector_reverse_elements_in_word_groups8_ssse3),
            (BASELINE, emit_vector_reverse_elements_in_word_groups8),
        ],
        ReverseElementsInWordGroups16 => tiered![
            (HostCaps::SSSE3, emit_vector_reverse_elements_in_word_groups16_ssse3),
            (BASELINE, emit_vector_reverse_elements_in_word_groups16),
        ],
        ReverseElementsInLongGroups8 => tiered![
            (HostCaps::SSSE3, emit_vector_reverse_elements_in_long_groups8_ssse3),
            (BASELINE, emit_vector_reverse_elements_in_long_groups8),
        ],
        ReverseElementsInLongGroups16 => tiered![
            (HostCaps::SSSE3, emit_vector_reverse_elements_in_long_groups16_ssse3),
            (BASELINE, emit_vector_reverse_elements_in_long_groups16),
        ],
        ReverseElementsInLongGroups32 => tiered![
            (HostCaps::SSSE3, emit_vector_reverse_elements_in_long_groups32_ssse3),
            (BASELINE, emit_vector_reverse_elements_in_long_groups32),
        ],

        TableLookup => tiered![
            (HostCaps::SSE41, emit_vector_table_lookup_sse41),
            (BASELINE, emit_vector_table_lookup),
        ],

        SignedSaturatedAdd8 => single!(emit_vector_signed_saturated_add8),
        SignedSaturatedAdd16 => single!(emit_vector_signed_saturated_add16),
        SignedSaturatedAdd32 => single!(emit_vector_signed_saturated_add32),
        SignedSaturatedAdd64 => single!(emit_vector_signed_saturated_add64),
        SignedSaturatedSub8 => single!(emit_vector_signed_saturated_sub8),
        SignedSaturatedSub16 => single!(emit_vector_signed_saturated_sub16),
        SignedSaturatedSub32 => single!(emit_vector_signed_saturated_sub32),
        SignedSaturatedSub64 => single!(emit_vector_signed_saturated_sub64),
        UnsignedSaturatedAdd8 => single!(emit_vector_unsigned_saturated_add8),
        UnsignedSaturatedAdd16 => single!(emit_vector_unsigned_saturated_add16),
        UnsignedSaturatedAdd32 => single!(emit_vector_unsigned_saturated_add32),
        UnsignedSaturatedAdd64 => single!(emit_vector_unsigned_saturated_add64),
        UnsignedSaturatedSub8 => single!(emit_vector_unsigned_saturated_sub8),
        UnsignedSaturatedSub16 => single!(emit_vector_unsigned_saturated_sub16),
        UnsignedSaturatedSub32 => single!(emit_vector_unsigned_saturated_sub32),
        UnsignedSaturatedSub64 => single!(emit_vector_unsigned_saturated_sub64),
        SignedSaturatedAbs8 => tiered![
            (HostCaps::SSSE3, emit_vector_signed_saturated_abs8_ssse3),
            (BASELINE, emit_vector_signed_saturated_abs8),
        ],
        SignedSaturatedAbs16 => tiered![
            (HostCaps::SSSE3, emit_vector_signed_saturated_abs16_ssse3),
            (BASELINE, emit_vector_signed_saturated_abs16),
        ],
        SignedSaturatedAbs32 => tiered![
            (HostCaps::SSSE3, emit_vector_signed_saturated_abs32_ssse3),
            (BASELINE, emit_vector_signed_saturated_abs32),
        ],
        SignedSaturatedAbs64 => tiered![
            (HostCaps::SSE41, emit_vector_signed_saturated_abs64_sse41),
            (BASELINE, emit_vector_signed_saturated_abs64),
        ],
        SignedSaturatedNeg8 => single!(emit_vector_signed_saturated_neg8),
        SignedSaturatedNeg16 => single!(emit_vector_signed_saturated_neg16),
        SignedSaturatedNeg32 => single!(emit_vector_signed_saturated_neg32),
        SignedSaturatedNeg64 => single!(emit_vector_signed_saturated_neg64),
        SignedSaturatedNarrowToSigned16 => single!(emit_vector_signed_saturated_narrow_to_signed16),
        SignedSaturatedNarrowToSigned32 => single!(emit_vector_signed_saturated_narrow_to_signed32),
        SignedSaturatedNarrowToSigned64 => single!(emit_vector_signed_saturated_narrow_to_signed64),
        SignedSaturatedNarrowToUnsigned16 => single!(emit_vector_signed_saturated_narrow_to_unsigned16),
        SignedSaturatedNarrowToUnsigned32 => tiered![
            (HostCaps::SSE41, emit_vector_signed_saturated_narrow_to_unsigned32_sse41),
            (BASELINE, emit_vector_signed_saturated_narrow_to_unsigned32),
        ],
        SignedSaturatedNarrowToUnsigned64 => single!(emit_vector_signed_saturated_narrow_to_unsigned64),
        UnsignedSaturatedNarrow16 => single!(emit_vector_unsigned_saturated_narrow16),
        UnsignedSaturatedNarrow32 => single!(emit_vector_unsigned_saturated_narrow32),
        UnsignedSaturatedNarrow64 => single!(emit_vector_unsigned_saturated_narrow64),
        SignedSaturatedAccumulateUnsigned8 => single!(emit_vector_signed_saturated_accumulate_unsigned8),
        SignedSaturatedAccumulateUnsigned16 => single!(emit_vector_signed_saturated_accumulate_unsigned16),
        SignedSaturatedAccumulateUnsigned32 => single!(emit_vector_signed_saturated_accumulate_unsigned32),
        SignedSaturatedAccumulateUnsigned64 => single!(emit_vector_signed_saturated_accumulate_unsigned64),
        UnsignedSaturatedAccumulateSigned8 => single!(emit_vector_unsigned_saturated_accumulate_signed8),
        UnsignedSaturatedAccumulateSigned16 => single!(emit_vector_unsigned_saturated_accumulate_signed16),
        UnsignedSaturatedAccumulateSigned32 => single!(emit_vector_unsigned_saturated_accumulate_signed32),
        UnsignedSaturatedAccumulateSigned64 => single!(emit_vector_unsigned_saturated_accumulate_signed64),
        SignedSaturatedDoublingMultiplyHigh16 => single!(emit_vector_signed_saturated_doubling_multiply_high16),
        SignedSaturatedDoublingMultiplyHigh32 => tiered![
            (HostCaps::SSE41, emit_vector_signed_saturated_doubling_multiply_high32_sse41),
            (BASELINE, emit_vector_signed_saturated_doubling_multiply_high32),
        ],
        SignedSaturatedDoublingMultiplyHighRounding16 => single!(emit_vector_signed_saturated_doubling_multiply_high_rounding16),
        SignedSaturatedDoublingMultiplyHighRounding32 => single!(emit_vector_signed_saturated_doubling_multiply_high_rounding32),
        SignedSaturatedDoublingMultiplyLong16 => single!(emit_vector_signed_saturated_doubling_multiply_long16),
        SignedSaturatedDoublingMultiplyLong32 => single!(emit_vector_signed_saturated_doubling_multiply_long32),
        SignedSaturatedShiftLeft8 => single!(emit_vector_signed_saturated_shift_left8),
        SignedSaturatedShiftLeft16 => single!(emit_vector_signed_saturated_shift_left16),
        SignedSaturatedShiftLeft32 => single!(emit_vector_signed_saturated_shift_left32),
        SignedSaturatedShiftLeft64 => single!(emit_vector_signed_saturated_shift_left64),
        UnsignedSaturatedShiftLeft8 => single!(emit_vector_unsigned_saturated_shift_left8),
        UnsignedSaturatedShiftLeft16 => single!(emit_vector_unsigned_saturated_shift_left16),
        UnsignedSaturatedShiftLeft32 => single!(emit_vector_unsigned_saturated_shift_left32),
        UnsignedSaturatedShiftLeft64 => single!(emit_vector_unsigned_saturated_shift_left64),
    }
}

/// Pick the most capable usable strategy and run it.
///
/// Capability shortfalls are not errors: every table ends in an unguarded
/// baseline entry, so selection always succeeds.
pub fn lower(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let table = strategies(inst.opcode);
    for strategy in table {
        if ctx.caps.supports(strategy.requires) {
            (strategy.emit)(ctx, ra, inst_ref, inst);
            return;
        }
    }
    unreachable!("strategy table for {:?} has no baseline entry", inst.opcode);
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPRESENTATIVE: &[Opcode] = &[
        Opcode::Add8,
        Opcode::Abs64,
        Opcode::Equal64,
        Opcode::Equal128,
        Opcode::BroadcastLower8,
        Opcode::ExtractLower,
        Opcode::ShuffleWords,
        Opcode::GreaterUnsigned64,
        Opcode::MaxSigned32,
        Opcode::LogicalShiftLeft8,
        Opcode::RoundingShiftLeftUnsigned16,
        Opcode::Multiply32,
        Opcode::PolynomialMultiplyLong64,
        Opcode::PairedAdd16,
        Opcode::PairedAddLower32,
        Opcode::PopulationCount,
        Opcode::ReverseBits,
        Opcode::TableLookup,
        Opcode::SignedSaturatedAbs8,
        Opcode::SignedSaturatedNarrowToUnsigned32,
        Opcode::UnsignedSaturatedShiftLeft64,
    ];

    #[test]
    fn test_every_table_ends_in_baseline() {
        for &op in REPRESENTATIVE {
            let table = strategies(op);
            assert!(!table.is_empty(), "{:?} has no strategies", op);
            let last = table.last().unwrap();
            assert_eq!(last.requires, HostCaps::empty(), "{:?} lacks an unguarded baseline", op);
        }
    }

    #[test]
    fn test_tables_are_ranked_most_capable_first() {
        for &op in REPRESENTATIVE {
            let table = strategies(op);
            for pair in table.windows(2) {
                assert!(
                    !pair[0].requires.is_empty() || pair[1].requires.is_empty(),
                    "{:?} lists a guarded strategy after the baseline",
                    op
                );
            }
        }
    }

    #[test]
    fn test_selection_respects_capabilities() {
        let table = strategies(Opcode::PopulationCount);
        assert_eq!(table.len(), 3);

        let bare = HostCaps::empty();
        let ssse3 = HostCaps::SSSE3;
        let bitalg = HostCaps::SSSE3 | HostCaps::AVX512_BITALG;
        let pick = |caps: HostCaps| {
            table.iter().position(|s| caps.supports(s.requires)).unwrap()
        };
        assert_eq!(pick(bare), 2);
        assert_eq!(pick(ssse3), 1);
        assert_eq!(pick(bitalg), 0);
    }

    #[test]
    #[should_panic]
    fn test_unlowered_opcode_panics() {
        let _ = strategies(Opcode::Void);
    }
}
