#![allow(clippy::missing_transmute_annotations, clippy::useless_transmute, unnecessary_transmutes)]

use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// Paired add: adjacent lane pairs summed, low half from a, high half from b.
// ---------------------------------------------------------------------------

pub fn emit_vector_paired_add8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    let mask = ra.scratch_xmm();
    load_const128(ra, mask, 0x00FF_00FF_00FF_00FF, 0x00FF_00FF_00FF_00FF);

    // Sum even and odd bytes as words, then pack the word sums back to bytes.
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.pand(result, mask).unwrap();
    ra.asm.psrlw(tmp, 8).unwrap();
    ra.asm.paddw(result, tmp).unwrap();
    ra.asm.movdqa(tmp, b).unwrap();
    ra.asm.pand(b, mask).unwrap();
    ra.asm.psrlw(tmp, 8).unwrap();
    ra.asm.paddw(b, tmp).unwrap();
    ra.asm.pand(result, mask).unwrap();
    ra.asm.pand(b, mask).unwrap();
    ra.asm.packuswb(result, b).unwrap();

    ra.release(tmp);
    ra.release(mask);
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add16_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.phaddw(d, s));
}

pub fn emit_vector_paired_add32_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.phaddd(d, s));
}

macro_rules! define_paired_add {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count / 2 {
                    out[i] = va[2 * i].wrapping_add(va[2 * i + 1]);
                    out[$count / 2 + i] = vb[2 * i].wrapping_add(vb[2 * i + 1]);
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_paired_add!(fallback_paired_add16, u16, 8);
define_paired_add!(fallback_paired_add32, u32, 4);

pub fn emit_vector_paired_add16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_add16 as usize);
}

pub fn emit_vector_paired_add32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_add32 as usize);
}

// Lower-half paired adds: both operands' low halves are concatenated and
// summed pairwise; the result's upper half is zero.

pub fn emit_vector_paired_add_lower8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.psllw(result, 8).unwrap();
    ra.asm.paddw(result, tmp).unwrap();
    ra.asm.pxor(tmp, tmp).unwrap();
    ra.asm.psrlw(result, 8).unwrap();
    ra.asm.packuswb(result, tmp).unwrap();
    ra.release(b);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_lower16_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.asm.pxor(tmp, tmp).unwrap();
    ra.asm.phaddw(result, tmp).unwrap();
    ra.release(b);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_lower16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.pslld(result, 16).unwrap();
    ra.asm.paddd(result, tmp).unwrap();
    ra.asm.pxor(tmp, tmp).unwrap();
    // packusdw is SSE4.1, hence the arithmetic shift before packing.
    ra.asm.psrad(result, 16).unwrap();
    ra.asm.packssdw(result, tmp).unwrap();
    ra.release(b);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_lower32_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.asm.pxor(tmp, tmp).unwrap();
    ra.asm.phaddd(result, tmp).unwrap();
    ra.release(b);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_lower32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.psllq(result, 32).unwrap();
    ra.asm.paddq(result, tmp).unwrap();
    ra.asm.psrlq(result, 32).unwrap();
    ra.asm.pshufd(result, result, 0b1101_1000).unwrap();
    ra.release(b);
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let tmp = ra.scratch_xmm();
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.asm.punpckhqdq(tmp, b).unwrap();
    ra.asm.paddq(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Paired add widening: adjacent pairs summed into lanes of twice the width.
// ---------------------------------------------------------------------------

pub fn emit_vector_paired_add_signed_widen8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    // pmaddubsw treats the destination as unsigned; a vector of unsigned ones
    // on that side leaves the signed source lanes as the addends.
    load_const128(ra, result, 0x0101_0101_0101_0101, 0x0101_0101_0101_0101);
    ra.asm.pmaddubsw(result, source).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_unsigned_widen8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let ones = ra.scratch_xmm();
    load_const128(ra, ones, 0x0101_0101_0101_0101, 0x0101_0101_0101_0101);
    ra.asm.pmaddubsw(result, ones).unwrap();
    ra.release(ones);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_signed_widen16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let ones = ra.scratch_xmm();
    load_const128(ra, ones, 0x0001_0001_0001_0001, 0x0001_0001_0001_0001);
    ra.asm.pmaddwd(result, ones).unwrap();
    ra.release(ones);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_add_unsigned_widen16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let ones = ra.scratch_xmm();
    let bias = ra.scratch_xmm();
    // Bias lanes into signed range for pmaddwd, then add the bias back
    // (2 * 0x8000 = 0x10000 per dword sum).
    load_const128(ra, bias, 0x8000_8000_8000_8000, 0x8000_8000_8000_8000);
    ra.asm.pxor(result, bias).unwrap();
    load_const128(ra, ones, 0x0001_0001_0001_0001, 0x0001_0001_0001_0001);
    ra.asm.pmaddwd(result, ones).unwrap();
    load_const128(ra, bias, 0x0001_0000_0001_0000, 0x0001_0000_0001_0000);
    ra.asm.paddd(result, bias).unwrap();
    ra.release(ones);
    ra.release(bias);
    ra.define_value(inst_ref, result);
}

macro_rules! define_paired_add_widen {
    ($name:ident, $ty:ty, $wide:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let mut out = [0 as $wide; $count / 2];
                for i in 0..$count / 2 {
                    out[i] = (va[2 * i] as $wide).wrapping_add(va[2 * i + 1] as $wide);
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_paired_add_widen!(fallback_paired_add_signed_widen8, i8, i16, 16);
define_paired_add_widen!(fallback_paired_add_unsigned_widen8, u8, u16, 16);
define_paired_add_widen!(fallback_paired_add_signed_widen32, i32, i64, 4);
define_paired_add_widen!(fallback_paired_add_unsigned_widen32, u32, u64, 4);

pub fn emit_vector_paired_add_signed_widen8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_paired_add_signed_widen8 as usize);
}
pub fn emit_vector_paired_add_unsigned_widen8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_paired_add_unsigned_widen8 as usize);
}
pub fn emit_vector_paired_add_signed_widen32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_paired_add_signed_widen32 as usize);
}
pub fn emit_vector_paired_add_unsigned_widen32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_paired_add_unsigned_widen32 as usize);
}

// ---------------------------------------------------------------------------
// Paired max/min.
// ---------------------------------------------------------------------------

fn emit_paired_minmax32_sse41(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, op: BinOp) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let evens = ra.scratch_xmm();
    // shufps gathers the even lanes of (a, b) into one register and the odd
    // lanes into another.
    ra.asm.movdqa(evens, result).unwrap();
    ra.asm.shufps(evens, b, 0b1000_1000).unwrap();
    ra.asm.shufps(result, b, 0b1101_1101).unwrap();
    op(ra.asm, result, evens).unwrap();
    ra.release(evens);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_paired_max_signed32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_paired_minmax32_sse41(ra, inst_ref, inst, |a, d, s| a.pmaxsd(d, s));
}
pub fn emit_vector_paired_max_unsigned32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_paired_minmax32_sse41(ra, inst_ref, inst, |a, d, s| a.pmaxud(d, s));
}
pub fn emit_vector_paired_min_signed32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_paired_minmax32_sse41(ra, inst_ref, inst, |a, d, s| a.pminsd(d, s));
}
pub fn emit_vector_paired_min_unsigned32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_paired_minmax32_sse41(ra, inst_ref, inst, |a, d, s| a.pminud(d, s));
}

macro_rules! define_paired_minmax {
    ($name:ident, $ty:ty, $count:expr, $op:ident) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count / 2 {
                    out[i] = va[2 * i].$op(va[2 * i + 1]);
                    out[$count / 2 + i] = vb[2 * i].$op(vb[2 * i + 1]);
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_paired_minmax!(fallback_paired_max_s8, i8, 16, max);
define_paired_minmax!(fallback_paired_max_s16, i16, 8, max);
define_paired_minmax!(fallback_paired_max_s32, i32, 4, max);
define_paired_minmax!(fallback_paired_max_u8, u8, 16, max);
define_paired_minmax!(fallback_paired_max_u16, u16, 8, max);
define_paired_minmax!(fallback_paired_max_u32, u32, 4, max);
define_paired_minmax!(fallback_paired_min_s8, i8, 16, min);
define_paired_minmax!(fallback_paired_min_s16, i16, 8, min);
define_paired_minmax!(fallback_paired_min_s32, i32, 4, min);
define_paired_minmax!(fallback_paired_min_u8, u8, 16, min);
define_paired_minmax!(fallback_paired_min_u16, u16, 8, min);
define_paired_minmax!(fallback_paired_min_u32, u32, 4, min);

pub fn emit_vector_paired_max_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_max_s8 as usize);
}
pub fn emit_vector_paired_max_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_max_s16 as usize);
}
pub fn emit_vector_paired_max_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_max_s32 as usize);
}
pub fn emit_vector_paired_max_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_max_u8 as usize);
}
pub fn emit_vector_paired_max_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_max_u16 as usize);
}
pub fn emit_vector_paired_max_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_max_u32 as usize);
}
pub fn emit_vector_paired_min_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_min_s8 as usize);
}
pub fn emit_vector_paired_min_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_min_s16 as usize);
}
pub fn emit_vector_paired_min_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_min_s32 as usize);
}
pub fn emit_vector_paired_min_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_min_u8 as usize);
}
pub fn emit_vector_paired_min_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_min_u16 as usize);
}
pub fn emit_vector_paired_min_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_paired_min_u32 as usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_add8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_add16_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_add_lower8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_add_lower16;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_add_lower32_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_add_unsigned_widen16;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_max_signed32_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_paired_min_unsigned8;
    }

    #[test]
    fn test_fallback_paired_add_halves() {
        let a: [u8; 16] = unsafe { std::mem::transmute([1u32, 2, 3, 4]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([10u32, 20, 30, 40]) };
        let mut result = [0u8; 16];
        fallback_paired_add32(&mut result, &a, &b);
        let out: [u32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [3, 7, 30, 70]);
    }

    #[test]
    fn test_fallback_paired_add_widen_keeps_full_sum() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i8::MIN; 16]) };
        let mut result = [0u8; 16];
        fallback_paired_add_signed_widen8(&mut result, &a);
        let out: [i16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [-256i16; 8]);
    }

    #[test]
    fn test_fallback_paired_minmax() {
        let a: [u8; 16] = unsafe { std::mem::transmute([-5i32, 3, 7, -9]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([1i32, 2, -1, -2]) };
        let mut result = [0u8; 16];
        fallback_paired_max_s32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [3, 7, 2, -1]);
        fallback_paired_min_s32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [-5, -9, 1, -2]);
    }
}
