#![allow(clippy::missing_transmute_annotations, clippy::useless_transmute, unnecessary_transmutes)]

use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// Shifts by immediate.
//
// 16/32/64-bit lanes shift natively. 8-bit lanes shift as 16-bit lanes and
// mask off the bits that crossed a byte boundary; arithmetic-shift-right 8
// widens each byte to a word, shifts, and re-packs.
// ---------------------------------------------------------------------------

pub fn emit_vector_logical_shift_left8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let shift = args[1].get_immediate_u8();
    assert!(shift < 8, "shift amount {} out of range for 8-bit lanes", shift);
    if shift > 0 {
        let lane_mask = (0xFFu8 << shift) as u8;
        let splat = u64::from_ne_bytes([lane_mask; 8]);
        let mask = ra.scratch_xmm();
        load_const128(ra, mask, splat, splat);
        ra.asm.psllw(result, shift as u32).unwrap();
        ra.asm.pand(result, mask).unwrap();
        ra.release(mask);
    }
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_logical_shift_left16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psllw(d, i));
}
pub fn emit_vector_logical_shift_left32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.pslld(d, i));
}
pub fn emit_vector_logical_shift_left64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psllq(d, i));
}

pub fn emit_vector_logical_shift_right8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let shift = args[1].get_immediate_u8();
    assert!(shift < 8, "shift amount {} out of range for 8-bit lanes", shift);
    if shift > 0 {
        let lane_mask = 0xFFu8 >> shift;
        let splat = u64::from_ne_bytes([lane_mask; 8]);
        let mask = ra.scratch_xmm();
        load_const128(ra, mask, splat, splat);
        ra.asm.psrlw(result, shift as u32).unwrap();
        ra.asm.pand(result, mask).unwrap();
        ra.release(mask);
    }
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_logical_shift_right16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psrlw(d, i));
}
pub fn emit_vector_logical_shift_right32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psrld(d, i));
}
pub fn emit_vector_logical_shift_right64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psrlq(d, i));
}

pub fn emit_vector_arithmetic_shift_right8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let shift = args[1].get_immediate_u8();
    assert!(shift < 8, "shift amount {} out of range for 8-bit lanes", shift);
    let tmp = ra.scratch_xmm();
    // Widen to words (byte duplicated into both halves), shift by 8+n, re-pack.
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.punpckhbw(tmp, tmp).unwrap();
    ra.asm.punpcklbw(result, result).unwrap();
    ra.asm.psraw(tmp, 8 + shift as u32).unwrap();
    ra.asm.psraw(result, 8 + shift as u32).unwrap();
    ra.asm.packsswb(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_arithmetic_shift_right16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psraw(d, i));
}
pub fn emit_vector_arithmetic_shift_right32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op_imm(ra, inst_ref, inst, |a, d, i| a.psrad(d, i));
}

extern "C" fn fallback_arithmetic_shift_right64(result: *mut [u8; 16], a: *const [u8; 16], shift: u8) {
    unsafe {
        let va: [i64; 2] = std::mem::transmute(*a);
        let out: [i64; 2] = [va[0] >> shift as u32, va[1] >> shift as u32];
        *result = std::mem::transmute(out);
    }
}

pub fn emit_vector_arithmetic_shift_right64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_with_imm(ra, inst_ref, inst, fallback_arithmetic_shift_right64 as usize);
}

// ---------------------------------------------------------------------------
// Per-lane variable shifts.
//
// The shift amount is the low byte of the corresponding lane of b,
// sign-extended; negative amounts shift the other way. Amounts at or beyond
// the lane width drain to zero (or to the sign fill for arithmetic shifts).
// ---------------------------------------------------------------------------

macro_rules! define_logical_vshift {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$ty>() as i32 * 8;
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    let shift = (vb[i] as u8 as i8) as i32;
                    out[i] = if shift <= -bits || shift >= bits {
                        0
                    } else if shift < 0 {
                        va[i] >> (-shift) as u32
                    } else {
                        va[i] << shift as u32
                    };
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_logical_vshift!(fallback_logical_vshift8, u8, 16);
define_logical_vshift!(fallback_logical_vshift16, u16, 8);
define_logical_vshift!(fallback_logical_vshift32, u32, 4);
define_logical_vshift!(fallback_logical_vshift64, u64, 2);

pub fn emit_vector_logical_vshift8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_logical_vshift8 as usize);
}
pub fn emit_vector_logical_vshift16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_logical_vshift16 as usize);
}
pub fn emit_vector_logical_vshift32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_logical_vshift32 as usize);
}
pub fn emit_vector_logical_vshift64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_logical_vshift64 as usize);
}

macro_rules! define_arithmetic_vshift {
    ($name:ident, $sty:ty, $uty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$sty; $count] = std::mem::transmute(*a);
                let vb: [$sty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$sty>() as i32 * 8;
                let mut out = [0 as $sty; $count];
                for i in 0..$count {
                    let shift = (vb[i] as u8 as i8) as i32;
                    out[i] = if shift >= bits {
                        0
                    } else if shift <= -bits {
                        va[i] >> (bits - 1) as u32
                    } else if shift < 0 {
                        va[i] >> (-shift) as u32
                    } else {
                        ((va[i] as $uty) << shift as u32) as $sty
                    };
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_arithmetic_vshift!(fallback_arithmetic_vshift8, i8, u8, 16);
define_arithmetic_vshift!(fallback_arithmetic_vshift16, i16, u16, 8);
define_arithmetic_vshift!(fallback_arithmetic_vshift32, i32, u32, 4);
define_arithmetic_vshift!(fallback_arithmetic_vshift64, i64, u64, 2);

pub fn emit_vector_arithmetic_vshift8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_arithmetic_vshift8 as usize);
}
pub fn emit_vector_arithmetic_vshift16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_arithmetic_vshift16 as usize);
}
pub fn emit_vector_arithmetic_vshift32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_arithmetic_vshift32 as usize);
}
pub fn emit_vector_arithmetic_vshift64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_arithmetic_vshift64 as usize);
}

// ---------------------------------------------------------------------------
// Rounding shift left.
//
// Positive amounts shift left; negative amounts shift right and add back the
// last bit shifted out (the round bit). The signed form drains to zero at
// amounts <= -bits; the unsigned form keeps a distinct branch at exactly
// -bits, where the result is the round bit alone.
// ---------------------------------------------------------------------------

macro_rules! define_rounding_shift_left_signed {
    ($name:ident, $sty:ty, $uty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$sty; $count] = std::mem::transmute(*a);
                let vb: [$sty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$sty>() as i32 * 8;
                let mut out = [0 as $sty; $count];
                for i in 0..$count {
                    let shift = (vb[i] as u8 as i8) as i32;
                    out[i] = if shift >= 0 {
                        if shift >= bits {
                            0
                        } else {
                            ((va[i] as $uty) << shift as u32) as $sty
                        }
                    } else if shift <= -bits {
                        0
                    } else {
                        let round = (va[i] >> (-shift - 1) as u32) & 1;
                        (va[i] >> (-shift) as u32).wrapping_add(round)
                    };
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_rounding_shift_left_signed!(fallback_rounding_shift_left_s8, i8, u8, 16);
define_rounding_shift_left_signed!(fallback_rounding_shift_left_s16, i16, u16, 8);
define_rounding_shift_left_signed!(fallback_rounding_shift_left_s32, i32, u32, 4);
define_rounding_shift_left_signed!(fallback_rounding_shift_left_s64, i64, u64, 2);

pub fn emit_vector_rounding_shift_left_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_s8 as usize);
}
pub fn emit_vector_rounding_shift_left_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_s16 as usize);
}
pub fn emit_vector_rounding_shift_left_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_s32 as usize);
}
pub fn emit_vector_rounding_shift_left_signed64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_s64 as usize);
}

macro_rules! define_rounding_shift_left_unsigned {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$ty>() as i32 * 8;
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    let shift = (vb[i] as u8 as i8) as i32;
                    out[i] = if shift >= 0 {
                        if shift >= bits {
                            0
                        } else {
                            va[i] << shift as u32
                        }
                    } else if shift < -bits {
                        0
                    } else {
                        let round = (va[i] >> (-shift - 1) as u32) & 1;
                        if shift == -bits {
                            round
                        } else {
                            (va[i] >> (-shift) as u32).wrapping_add(round)
                        }
                    };
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_rounding_shift_left_unsigned!(fallback_rounding_shift_left_u8, u8, 16);
define_rounding_shift_left_unsigned!(fallback_rounding_shift_left_u16, u16, 8);
define_rounding_shift_left_unsigned!(fallback_rounding_shift_left_u32, u32, 4);
define_rounding_shift_left_unsigned!(fallback_rounding_shift_left_u64, u64, 2);

pub fn emit_vector_rounding_shift_left_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_u8 as usize);
}
pub fn emit_vector_rounding_shift_left_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_u16 as usize);
}
pub fn emit_vector_rounding_shift_left_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_u32 as usize);
}
pub fn emit_vector_rounding_shift_left_unsigned64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_shift_left_u64 as usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lanes16(v: [i16; 8]) -> [u8; 16] {
        unsafe { std::mem::transmute(v) }
    }

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_logical_shift_left8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_arithmetic_shift_right64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_logical_vshift64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_arithmetic_vshift8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_rounding_shift_left_signed16;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_rounding_shift_left_unsigned64;
    }

    #[test]
    fn test_logical_vshift_negative_amounts() {
        let a: [u8; 16] = lanes16([0x0100i16 as i16, 0x0100, -1, 0x0100, 0, 0, 0, 0]);
        let b: [u8; 16] = lanes16([-4, -16, -1, 4, 0, 0, 0, 0]);
        let mut result = [0u8; 16];
        fallback_logical_vshift16(&mut result, &a, &b);
        let out: [u16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], 0x0010);
        assert_eq!(out[1], 0); // amount == width drains
        assert_eq!(out[2], 0x7FFF); // logical right fills with zero
        assert_eq!(out[3], 0x1000);
    }

    #[test]
    fn test_arithmetic_vshift_sign_fill() {
        let a: [u8; 16] = lanes16([-32768, -32768, 1, -2, 0, 0, 0, 0]);
        let b: [u8; 16] = lanes16([-15, -100, 14, -1, 0, 0, 0, 0]);
        let mut result = [0u8; 16];
        fallback_arithmetic_vshift16(&mut result, &a, &b);
        let out: [i16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], -1);
        assert_eq!(out[1], -1); // beyond width keeps the sign fill
        assert_eq!(out[2], 16384);
        assert_eq!(out[3], -1);
    }

    #[test]
    fn test_rounding_shift_by_negative_17_drains_16_bit_lanes() {
        let a: [u8; 16] = lanes16([0x7FFF, -1, 0x1234, -32768, 0, 0, 0, 0]);
        let b: [u8; 16] = lanes16([-17, -17, -17, -17, 0, 0, 0, 0]);
        let mut result = [0xAAu8; 16];
        fallback_rounding_shift_left_s16(&mut result, &a, &b);
        assert_eq!(result[..8], [0u8; 8]);
        fallback_rounding_shift_left_u16(&mut result, &a, &b);
        assert_eq!(result[..8], [0u8; 8]);
    }

    #[test]
    fn test_rounding_shift_unsigned_at_exact_width_yields_round_bit() {
        let a: [u8; 16] = lanes16([-32768i16, 0x7FFF, 0, 0, 0, 0, 0, 0]);
        let b: [u8; 16] = lanes16([-16, -16, 0, 0, 0, 0, 0, 0]);
        let mut result = [0u8; 16];
        fallback_rounding_shift_left_u16(&mut result, &a, &b);
        let out: [u16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], 1); // bit 15 was set
        assert_eq!(out[1], 0); // bit 15 clear
    }

    #[test]
    fn test_rounding_shift_signed_rounds_toward_positive() {
        let a: [u8; 16] = lanes16([5, -5, 6, -6, 0, 0, 0, 0]);
        let b: [u8; 16] = lanes16([-1, -1, -1, -1, 0, 0, 0, 0]);
        let mut result = [0u8; 16];
        fallback_rounding_shift_left_s16(&mut result, &a, &b);
        let out: [i16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], 3); // (5 >> 1) + 1
        assert_eq!(out[1], -2); // (-5 >> 1) + 1
        assert_eq!(out[2], 3);
        assert_eq!(out[3], -3);
    }
}
