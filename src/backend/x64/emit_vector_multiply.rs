#![allow(clippy::missing_transmute_annotations, clippy::useless_transmute, unnecessary_transmutes)]

use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// Lanewise multiply.
// ---------------------------------------------------------------------------

pub fn emit_vector_multiply8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp_a = ra.scratch_xmm();
    let tmp_b = ra.scratch_xmm();
    let mask = ra.scratch_xmm();

    // Odd lanes multiply in the high half of each word, even lanes in the low
    // half; the two halves are recombined through a 0x00FF mask.
    ra.asm.movdqa(tmp_a, result).unwrap();
    ra.asm.movdqa(tmp_b, b).unwrap();
    ra.asm.psrlw(tmp_a, 8).unwrap();
    ra.asm.psrlw(tmp_b, 8).unwrap();
    ra.asm.pmullw(result, b).unwrap();
    ra.asm.pmullw(tmp_a, tmp_b).unwrap();
    ra.asm.psllw(tmp_a, 8).unwrap();
    load_const128(ra, mask, 0x00FF_00FF_00FF_00FF, 0x00FF_00FF_00FF_00FF);
    ra.asm.pand(result, mask).unwrap();
    ra.asm.por(result, tmp_a).unwrap();

    ra.release(tmp_a);
    ra.release(tmp_b);
    ra.release(mask);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_multiply16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmullw(d, s));
}

pub fn emit_vector_multiply32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmulld(d, s));
}

pub fn emit_vector_multiply32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let odd_a = ra.scratch_xmm();
    let odd_b = ra.scratch_xmm();

    // pmuludq multiplies the even dword lanes; the odd lanes are shuffled
    // down, multiplied separately, and interleaved back.
    ra.asm.pshufd(odd_a, result, 0b1111_0101).unwrap();
    ra.asm.pshufd(odd_b, b, 0b1111_0101).unwrap();
    ra.asm.pmuludq(result, b).unwrap();
    ra.asm.pmuludq(odd_a, odd_b).unwrap();
    ra.asm.pshufd(result, result, 0b0000_1000).unwrap();
    ra.asm.pshufd(odd_a, odd_a, 0b0000_1000).unwrap();
    ra.asm.punpckldq(result, odd_a).unwrap();

    ra.release(odd_a);
    ra.release(odd_b);
    ra.define_value(inst_ref, result);
}

extern "C" fn fallback_multiply64(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
    unsafe {
        let va: [u64; 2] = std::mem::transmute(*a);
        let vb: [u64; 2] = std::mem::transmute(*b);
        let out: [u64; 2] = [va[0].wrapping_mul(vb[0]), va[1].wrapping_mul(vb[1])];
        *result = std::mem::transmute(out);
    }
}

pub fn emit_vector_multiply64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_multiply64 as usize);
}

// ---------------------------------------------------------------------------
// Polynomial (carryless) multiply.
// ---------------------------------------------------------------------------

extern "C" fn fallback_polynomial_multiply8(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
    unsafe {
        let va: [u8; 16] = *a;
        let vb: [u8; 16] = *b;
        let mut out = [0u8; 16];
        for i in 0..16 {
            let mut acc = 0u8;
            for bit in 0..8 {
                if vb[i] & (1 << bit) != 0 {
                    acc ^= va[i].wrapping_shl(bit);
                }
            }
            out[i] = acc;
        }
        *result = out;
    }
}

pub fn emit_vector_polynomial_multiply8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_polynomial_multiply8 as usize);
}

extern "C" fn fallback_polynomial_multiply_long8(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
    unsafe {
        let va: [u8; 16] = *a;
        let vb: [u8; 16] = *b;
        let mut out = [0u16; 8];
        for i in 0..8 {
            let mut acc = 0u16;
            for bit in 0..8 {
                if vb[i] & (1 << bit) != 0 {
                    acc ^= (va[i] as u16) << bit;
                }
            }
            out[i] = acc;
        }
        *result = std::mem::transmute(out);
    }
}

pub fn emit_vector_polynomial_multiply_long8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_polynomial_multiply_long8 as usize);
}

pub fn emit_vector_polynomial_multiply_long64_pclmul(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    ra.asm.pclmulqdq(result, b, 0).unwrap();
    ra.define_value(inst_ref, result);
}

extern "C" fn fallback_polynomial_multiply_long64(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
    unsafe {
        let va: [u64; 2] = std::mem::transmute(*a);
        let vb: [u64; 2] = std::mem::transmute(*b);
        let mut acc = 0u128;
        for bit in 0..64 {
            if vb[0] & (1 << bit) != 0 {
                acc ^= (va[0] as u128) << bit;
            }
        }
        *result = std::mem::transmute(acc);
    }
}

pub fn emit_vector_polynomial_multiply_long64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_polynomial_multiply_long64 as usize);
}

// ---------------------------------------------------------------------------
// Absolute difference.
// ---------------------------------------------------------------------------

macro_rules! define_signed_abs_diff {
    ($name:ident, $ty:ty, $wide:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = (va[i] as $wide - vb[i] as $wide).unsigned_abs() as $ty;
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_signed_abs_diff!(fallback_signed_abs_diff8, i8, i16, 16);
define_signed_abs_diff!(fallback_signed_abs_diff16, i16, i32, 8);
define_signed_abs_diff!(fallback_signed_abs_diff32, i32, i64, 4);

pub fn emit_vector_signed_absolute_difference8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_signed_abs_diff8 as usize);
}
pub fn emit_vector_signed_absolute_difference16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_signed_abs_diff16 as usize);
}
pub fn emit_vector_signed_absolute_difference32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_signed_abs_diff32 as usize);
}

pub fn emit_vector_unsigned_absolute_difference8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    // max(a, b) - min(a, b)
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.pminub(tmp, b).unwrap();
    ra.asm.pmaxub(result, b).unwrap();
    ra.asm.psubb(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

macro_rules! define_unsigned_abs_diff {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = va[i].max(vb[i]) - va[i].min(vb[i]);
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_unsigned_abs_diff!(fallback_unsigned_abs_diff16, u16, 8);
define_unsigned_abs_diff!(fallback_unsigned_abs_diff32, u32, 4);

pub fn emit_vector_unsigned_absolute_difference16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_unsigned_abs_diff16 as usize);
}
pub fn emit_vector_unsigned_absolute_difference32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_unsigned_abs_diff32 as usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_multiply8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_multiply32_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_polynomial_multiply_long64_pclmul;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_signed_absolute_difference32;
    }

    #[test]
    fn test_fallback_multiply64_wraps() {
        let a: [u8; 16] = unsafe { std::mem::transmute([u64::MAX, 3u64]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([2u64, 5u64]) };
        let mut result = [0u8; 16];
        fallback_multiply64(&mut result, &a, &b);
        let out: [u64; 2] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], u64::MAX.wrapping_mul(2));
        assert_eq!(out[1], 15);
    }

    #[test]
    fn test_fallback_polynomial_multiply8() {
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        a[0] = 0b0000_0101;
        b[0] = 0b0000_0011;
        let mut result = [0u8; 16];
        fallback_polynomial_multiply8(&mut result, &a, &b);
        assert_eq!(result[0], 0b0000_1111); // (x^2+1)(x+1) = x^3+x^2+x+1
    }

    #[test]
    fn test_fallback_polynomial_multiply_long64() {
        let a: [u8; 16] = unsafe { std::mem::transmute([1u64 << 63, 0u64]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([2u64, 0u64]) };
        let mut result = [0u8; 16];
        fallback_polynomial_multiply_long64(&mut result, &a, &b);
        let out: u128 = unsafe { std::mem::transmute(result) };
        assert_eq!(out, 1u128 << 64);
    }

    #[test]
    fn test_fallback_signed_abs_diff_handles_extremes() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i32::MIN, 10, -3, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([i32::MAX, 4, 3, 0]) };
        let mut result = [0u8; 16];
        fallback_signed_abs_diff32(&mut result, &a, &b);
        let out: [u32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], u32::MAX); // |MIN - MAX| wraps to all-ones in lane width
        assert_eq!(out[1], 6);
        assert_eq!(out[2], 6);
    }
}
