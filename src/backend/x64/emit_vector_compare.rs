#![allow(clippy::missing_transmute_annotations, clippy::useless_transmute, unnecessary_transmutes)]

use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// VectorEqual — pcmpeq; the 64-bit form needs SSE4.1, below that qword
// equality is both dword halves equal.
// ---------------------------------------------------------------------------

pub fn emit_vector_equal8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpeqb(d, s));
}
pub fn emit_vector_equal16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpeqw(d, s));
}
pub fn emit_vector_equal32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpeqd(d, s));
}
pub fn emit_vector_equal64_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpeqq(d, s));
}

pub fn emit_vector_equal64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let op2 = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.pcmpeqd(result, op2).unwrap();
    // Both dword halves of a qword must compare equal.
    ra.asm.pshufd(tmp, result, 0b1011_0001).unwrap();
    ra.asm.pand(result, tmp).unwrap();
    ra.release(op2);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_equal128_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let op2 = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.pcmpeqq(result, op2).unwrap();
    ra.asm.pshufd(tmp, result, 0b0100_1110).unwrap();
    ra.asm.pand(result, tmp).unwrap();
    ra.release(op2);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_equal128(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let op2 = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.pcmpeqd(result, op2).unwrap();
    // All four dwords must compare equal.
    ra.asm.pshufd(tmp, result, 0b1011_0001).unwrap();
    ra.asm.pand(result, tmp).unwrap();
    ra.asm.pshufd(tmp, result, 0b0100_1110).unwrap();
    ra.asm.pand(result, tmp).unwrap();
    ra.release(op2);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// VectorGreaterSigned — pcmpgt; 64-bit needs SSE4.2
// ---------------------------------------------------------------------------

pub fn emit_vector_greater_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpgtb(d, s));
}
pub fn emit_vector_greater_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpgtw(d, s));
}
pub fn emit_vector_greater_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpgtd(d, s));
}
pub fn emit_vector_greater_signed64_sse42(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pcmpgtq(d, s));
}

extern "C" fn fallback_greater_signed64(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
    unsafe {
        let va: [i64; 2] = std::mem::transmute(*a);
        let vb: [i64; 2] = std::mem::transmute(*b);
        let out: [u64; 2] = [
            if va[0] > vb[0] { u64::MAX } else { 0 },
            if va[1] > vb[1] { u64::MAX } else { 0 },
        ];
        *result = std::mem::transmute(out);
    }
}

pub fn emit_vector_greater_signed64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_signed64 as usize);
}

// ---------------------------------------------------------------------------
// VectorGreaterUnsigned — bias both sides by the sign bit, then the signed
// compare orders the unsigned values.
// ---------------------------------------------------------------------------

fn emit_greater_unsigned(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, sign_splat: u64, gt: BinOp) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let op2 = ra.use_scratch_xmm(&mut args[1]);
    let sign = ra.scratch_xmm();
    load_const128(ra, sign, sign_splat, sign_splat);
    ra.asm.pxor(result, sign).unwrap();
    ra.asm.pxor(op2, sign).unwrap();
    gt(ra.asm, result, op2).unwrap();
    ra.release(op2);
    ra.release(sign);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_greater_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_greater_unsigned(ra, inst_ref, inst, 0x8080_8080_8080_8080, |a, d, s| a.pcmpgtb(d, s));
}
pub fn emit_vector_greater_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_greater_unsigned(ra, inst_ref, inst, 0x8000_8000_8000_8000, |a, d, s| a.pcmpgtw(d, s));
}
pub fn emit_vector_greater_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_greater_unsigned(ra, inst_ref, inst, 0x8000_0000_8000_0000, |a, d, s| a.pcmpgtd(d, s));
}
pub fn emit_vector_greater_unsigned64_sse42(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_greater_unsigned(ra, inst_ref, inst, 0x8000_0000_0000_0000, |a, d, s| a.pcmpgtq(d, s));
}

extern "C" fn fallback_greater_unsigned64(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
    unsafe {
        let va: [u64; 2] = std::mem::transmute(*a);
        let vb: [u64; 2] = std::mem::transmute(*b);
        let out: [u64; 2] = [
            if va[0] > vb[0] { u64::MAX } else { 0 },
            if va[1] > vb[1] { u64::MAX } else { 0 },
        ];
        *result = std::mem::transmute(out);
    }
}

pub fn emit_vector_greater_unsigned64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_unsigned64 as usize);
}

// ---------------------------------------------------------------------------
// VectorGreaterEqual — fallback
// ---------------------------------------------------------------------------

macro_rules! define_greater_equal {
    ($name:ident, $cmp_ty:ty, $out_ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$cmp_ty; $count] = std::mem::transmute(*a);
                let vb: [$cmp_ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $out_ty; $count];
                for i in 0..$count {
                    out[i] = if va[i] >= vb[i] { <$out_ty>::MAX } else { 0 };
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_greater_equal!(fallback_greater_equal_signed8, i8, u8, 16);
define_greater_equal!(fallback_greater_equal_signed16, i16, u16, 8);
define_greater_equal!(fallback_greater_equal_signed32, i32, u32, 4);
define_greater_equal!(fallback_greater_equal_signed64, i64, u64, 2);
define_greater_equal!(fallback_greater_equal_unsigned8, u8, u8, 16);
define_greater_equal!(fallback_greater_equal_unsigned16, u16, u16, 8);
define_greater_equal!(fallback_greater_equal_unsigned32, u32, u32, 4);
define_greater_equal!(fallback_greater_equal_unsigned64, u64, u64, 2);

pub fn emit_vector_greater_equal_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_signed8 as usize);
}
pub fn emit_vector_greater_equal_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_signed16 as usize);
}
pub fn emit_vector_greater_equal_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_signed32 as usize);
}
pub fn emit_vector_greater_equal_signed64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_signed64 as usize);
}
pub fn emit_vector_greater_equal_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_unsigned8 as usize);
}
pub fn emit_vector_greater_equal_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_unsigned16 as usize);
}
pub fn emit_vector_greater_equal_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_unsigned32 as usize);
}
pub fn emit_vector_greater_equal_unsigned64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_greater_equal_unsigned64 as usize);
}

// ---------------------------------------------------------------------------
// VectorMax / VectorMin — native where SSE2 provides it, SSE4.1 tier for the
// remaining 8/16/32 widths, fallback below that and for 64-bit lanes.
// ---------------------------------------------------------------------------

pub fn emit_vector_max_signed8_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmaxsb(d, s));
}
pub fn emit_vector_max_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmaxsw(d, s));
}
pub fn emit_vector_max_signed32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmaxsd(d, s));
}
pub fn emit_vector_max_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmaxub(d, s));
}
pub fn emit_vector_max_unsigned16_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmaxuw(d, s));
}
pub fn emit_vector_max_unsigned32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pmaxud(d, s));
}
pub fn emit_vector_min_signed8_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pminsb(d, s));
}
pub fn emit_vector_min_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pminsw(d, s));
}
pub fn emit_vector_min_signed32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pminsd(d, s));
}
pub fn emit_vector_min_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pminub(d, s));
}
pub fn emit_vector_min_unsigned16_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pminuw(d, s));
}
pub fn emit_vector_min_unsigned32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pminud(d, s));
}

macro_rules! define_minmax {
    ($name:ident, $ty:ty, $count:expr, $op:ident) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = va[i].$op(vb[i]);
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_minmax!(fallback_max_signed8, i8, 16, max);
define_minmax!(fallback_max_signed32, i32, 4, max);
define_minmax!(fallback_max_signed64, i64, 2, max);
define_minmax!(fallback_max_unsigned16, u16, 8, max);
define_minmax!(fallback_max_unsigned32, u32, 4, max);
define_minmax!(fallback_max_unsigned64, u64, 2, max);
define_minmax!(fallback_min_signed8, i8, 16, min);
define_minmax!(fallback_min_signed32, i32, 4, min);
define_minmax!(fallback_min_signed64, i64, 2, min);
define_minmax!(fallback_min_unsigned16, u16, 8, min);
define_minmax!(fallback_min_unsigned32, u32, 4, min);
define_minmax!(fallback_min_unsigned64, u64, 2, min);

pub fn emit_vector_max_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_max_signed8 as usize);
}
pub fn emit_vector_max_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_max_signed32 as usize);
}
pub fn emit_vector_max_signed64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_max_signed64 as usize);
}
pub fn emit_vector_max_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_max_unsigned16 as usize);
}
pub fn emit_vector_max_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_max_unsigned32 as usize);
}
pub fn emit_vector_max_unsigned64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_max_unsigned64 as usize);
}
pub fn emit_vector_min_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_min_signed8 as usize);
}
pub fn emit_vector_min_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_min_signed32 as usize);
}
pub fn emit_vector_min_signed64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_min_signed64 as usize);
}
pub fn emit_vector_min_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_min_unsigned16 as usize);
}
pub fn emit_vector_min_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_min_unsigned32 as usize);
}
pub fn emit_vector_min_unsigned64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_min_unsigned64 as usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_equal8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_equal64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_equal128_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_equal128;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_greater_signed64_sse42;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_greater_unsigned8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_greater_equal_unsigned64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_max_signed8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_min_unsigned32_sse41;
    }

    #[test]
    fn test_fallback_greater_signed64() {
        let a: [u8; 16] = unsafe { std::mem::transmute([1i64, -5]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([0i64, -4]) };
        let mut result = [0u8; 16];
        fallback_greater_signed64(&mut result, &a, &b);
        let out: [u64; 2] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [u64::MAX, 0]);
    }

    #[test]
    fn test_fallback_greater_unsigned64_differs_from_signed() {
        let a: [u8; 16] = unsafe { std::mem::transmute([u64::MAX, 1]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([1u64, 1]) };
        let mut result = [0u8; 16];
        fallback_greater_unsigned64(&mut result, &a, &b);
        let out: [u64; 2] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [u64::MAX, 0]);
    }

    #[test]
    fn test_fallback_greater_equal_includes_equality() {
        let a: [u8; 16] = [7; 16];
        let b: [u8; 16] = [7; 16];
        let mut result = [0u8; 16];
        fallback_greater_equal_unsigned8(&mut result, &a, &b);
        assert_eq!(result, [0xFF; 16]);
    }

    #[test]
    fn test_fallback_minmax() {
        let a: [u8; 16] = unsafe { std::mem::transmute([-3i32, 5, i32::MIN, i32::MAX]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([2i32, 4, 0, 0]) };
        let mut result = [0u8; 16];
        fallback_max_signed32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [2, 5, 0, i32::MAX]);
        fallback_min_signed32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [-3, 4, i32::MIN, 0]);
    }
}
