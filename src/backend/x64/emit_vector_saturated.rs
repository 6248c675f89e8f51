#![allow(clippy::missing_transmute_annotations, clippy::useless_transmute, unnecessary_transmutes)]

use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::{EmitContext, SatSink};
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::hostloc::{reg32_of, reg8_of};
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

/// OR "any byte of `mask` is set" into the sticky flag.
fn emit_qc_from_mask(ra: &mut RegAlloc, sat: &SatSink, mask: AsmRegisterXmm) {
    let flag = ra.scratch_gpr();
    ra.asm.pmovmskb(reg32_of(flag), mask).unwrap();
    ra.asm.test(reg32_of(flag), reg32_of(flag)).unwrap();
    ra.asm.setne(reg8_of(flag)).unwrap();
    sat.or_byte(ra.asm, reg8_of(flag)).unwrap();
    ra.release(flag);
}

// ---------------------------------------------------------------------------
// Saturating add/sub, 8/16-bit lanes: native saturating instruction plus a
// wrapping copy; any lane where the two disagree saturated.
// ---------------------------------------------------------------------------

fn emit_saturated_arith(
    ctx: &EmitContext,
    ra: &mut RegAlloc,
    inst_ref: InstRef,
    inst: &Inst,
    sat_op: BinOp,
    wrap_op: BinOp,
    cmp_op: BinOp,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let wrapped = ra.scratch_xmm();
    ra.asm.movdqa(wrapped, result).unwrap();
    sat_op(ra.asm, result, b).unwrap();
    wrap_op(ra.asm, wrapped, b).unwrap();
    cmp_op(ra.asm, wrapped, result).unwrap();

    let flag = ra.scratch_gpr();
    ra.asm.pmovmskb(reg32_of(flag), wrapped).unwrap();
    ra.asm.cmp(reg32_of(flag), 0xFFFF).unwrap();
    ra.asm.setne(reg8_of(flag)).unwrap();
    ctx.sat.or_byte(ra.asm, reg8_of(flag)).unwrap();

    ra.release(flag);
    ra.release(wrapped);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_signed_saturated_add8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.paddsb(d, s), |a, d, s| a.paddb(d, s), |a, d, s| a.pcmpeqb(d, s));
}
pub fn emit_vector_signed_saturated_add16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.paddsw(d, s), |a, d, s| a.paddw(d, s), |a, d, s| a.pcmpeqw(d, s));
}
pub fn emit_vector_signed_saturated_sub8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.psubsb(d, s), |a, d, s| a.psubb(d, s), |a, d, s| a.pcmpeqb(d, s));
}
pub fn emit_vector_signed_saturated_sub16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.psubsw(d, s), |a, d, s| a.psubw(d, s), |a, d, s| a.pcmpeqw(d, s));
}
pub fn emit_vector_unsigned_saturated_add8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.paddusb(d, s), |a, d, s| a.paddb(d, s), |a, d, s| a.pcmpeqb(d, s));
}
pub fn emit_vector_unsigned_saturated_add16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.paddusw(d, s), |a, d, s| a.paddw(d, s), |a, d, s| a.pcmpeqw(d, s));
}
pub fn emit_vector_unsigned_saturated_sub8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.psubusb(d, s), |a, d, s| a.psubb(d, s), |a, d, s| a.pcmpeqb(d, s));
}
pub fn emit_vector_unsigned_saturated_sub16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_saturated_arith(ctx, ra, inst_ref, inst, |a, d, s| a.psubusw(d, s), |a, d, s| a.psubw(d, s), |a, d, s| a.pcmpeqw(d, s));
}

macro_rules! define_sat_arith {
    ($name:ident, $ty:ty, $count:expr, $sat:ident, $wrap:ident) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    out[i] = va[i].$sat(vb[i]);
                    if out[i] != va[i].$wrap(vb[i]) {
                        qc = 1;
                    }
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_arith!(fallback_sat_add_s32, i32, 4, saturating_add, wrapping_add);
define_sat_arith!(fallback_sat_add_s64, i64, 2, saturating_add, wrapping_add);
define_sat_arith!(fallback_sat_add_u32, u32, 4, saturating_add, wrapping_add);
define_sat_arith!(fallback_sat_add_u64, u64, 2, saturating_add, wrapping_add);
define_sat_arith!(fallback_sat_sub_s32, i32, 4, saturating_sub, wrapping_sub);
define_sat_arith!(fallback_sat_sub_s64, i64, 2, saturating_sub, wrapping_sub);
define_sat_arith!(fallback_sat_sub_u32, u32, 4, saturating_sub, wrapping_sub);
define_sat_arith!(fallback_sat_sub_u64, u64, 2, saturating_sub, wrapping_sub);

pub fn emit_vector_signed_saturated_add32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_add_s32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_add64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_add_s64 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_add32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_add_u32 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_add64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_add_u64 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_sub32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_sub_s32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_sub64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_sub_s64 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_sub32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_sub_u32 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_sub64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_sub_u64 as usize, &ctx.sat);
}

// ---------------------------------------------------------------------------
// Saturating absolute value and negation. Only the minimum lane value
// saturates, so the pre-compare against it doubles as the flag condition.
// ---------------------------------------------------------------------------

fn emit_sat_abs_ssse3(
    ctx: &EmitContext,
    ra: &mut RegAlloc,
    inst_ref: InstRef,
    inst: &Inst,
    min_splat: u64,
    cmp_op: BinOp,
    abs_op: BinOp,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let mask = ra.scratch_xmm();
    let result = ra.scratch_xmm();
    load_const128(ra, mask, min_splat, min_splat);
    cmp_op(ra.asm, mask, src).unwrap();
    abs_op(ra.asm, result, src).unwrap();
    // abs(MIN) wraps to MIN; xor with the all-ones lanes flips it to MAX.
    ra.asm.pxor(result, mask).unwrap();
    emit_qc_from_mask(ra, &ctx.sat, mask);
    ra.release(mask);
    ra.release(src);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_signed_saturated_abs8_ssse3(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_sat_abs_ssse3(ctx, ra, inst_ref, inst, 0x8080_8080_8080_8080, |a, d, s| a.pcmpeqb(d, s), |a, d, s| a.pabsb(d, s));
}
pub fn emit_vector_signed_saturated_abs16_ssse3(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_sat_abs_ssse3(ctx, ra, inst_ref, inst, 0x8000_8000_8000_8000, |a, d, s| a.pcmpeqw(d, s), |a, d, s| a.pabsw(d, s));
}
pub fn emit_vector_signed_saturated_abs32_ssse3(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_sat_abs_ssse3(ctx, ra, inst_ref, inst, 0x8000_0000_8000_0000, |a, d, s| a.pcmpeqd(d, s), |a, d, s| a.pabsd(d, s));
}

pub fn emit_vector_signed_saturated_abs64_sse41(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let mask = ra.scratch_xmm();
    let sign = ra.scratch_xmm();
    load_const128(ra, mask, 0x8000_0000_0000_0000, 0x8000_0000_0000_0000);
    ra.asm.pcmpeqq(mask, result).unwrap();
    ra.asm.pshufd(sign, result, 0b1111_0101).unwrap();
    ra.asm.psrad(sign, 31).unwrap();
    ra.asm.pxor(result, sign).unwrap();
    ra.asm.psubq(result, sign).unwrap();
    ra.asm.pxor(result, mask).unwrap();
    emit_qc_from_mask(ra, &ctx.sat, mask);
    ra.release(mask);
    ra.release(sign);
    ra.define_value(inst_ref, result);
}

macro_rules! define_sat_abs {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let mut out = [0 as $ty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    if va[i] == <$ty>::MIN {
                        out[i] = <$ty>::MAX;
                        qc = 1;
                    } else {
                        out[i] = va[i].abs();
                    }
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_abs!(fallback_sat_abs8, i8, 16);
define_sat_abs!(fallback_sat_abs16, i16, 8);
define_sat_abs!(fallback_sat_abs32, i32, 4);
define_sat_abs!(fallback_sat_abs64, i64, 2);

pub fn emit_vector_signed_saturated_abs8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_abs8 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_abs16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_abs16 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_abs32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_abs32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_abs64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_abs64 as usize, &ctx.sat);
}

macro_rules! define_sat_neg {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let mut out = [0 as $ty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    if va[i] == <$ty>::MIN {
                        out[i] = <$ty>::MAX;
                        qc = 1;
                    } else {
                        out[i] = -va[i];
                    }
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_neg!(fallback_sat_neg8, i8, 16);
define_sat_neg!(fallback_sat_neg16, i16, 8);
define_sat_neg!(fallback_sat_neg32, i32, 4);
define_sat_neg!(fallback_sat_neg64, i64, 2);

pub fn emit_vector_signed_saturated_neg8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_neg8 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_neg16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_neg16 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_neg32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_neg32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_neg64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_neg64 as usize, &ctx.sat);
}

// ---------------------------------------------------------------------------
// Saturating narrows. The narrowed low half is re-widened and compared
// against the source; any mismatch means a lane clamped.
// ---------------------------------------------------------------------------

pub fn emit_vector_signed_saturated_narrow_to_signed16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    let widened = ra.scratch_xmm();
    let zero = ra.scratch_xmm();
    ra.asm.pxor(zero, zero).unwrap();
    ra.asm.movdqa(result, src).unwrap();
    ra.asm.packsswb(result, zero).unwrap();
    ra.asm.movdqa(widened, result).unwrap();
    ra.asm.punpcklbw(widened, widened).unwrap();
    ra.asm.psraw(widened, 8).unwrap();
    ra.asm.pcmpeqw(widened, src).unwrap();

    let flag = ra.scratch_gpr();
    ra.asm.pmovmskb(reg32_of(flag), widened).unwrap();
    ra.asm.cmp(reg32_of(flag), 0xFFFF).unwrap();
    ra.asm.setne(reg8_of(flag)).unwrap();
    ctx.sat.or_byte(ra.asm, reg8_of(flag)).unwrap();

    ra.release(flag);
    ra.release(widened);
    ra.release(zero);
    ra.release(src);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_signed_saturated_narrow_to_signed32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    let widened = ra.scratch_xmm();
    let zero = ra.scratch_xmm();
    ra.asm.pxor(zero, zero).unwrap();
    ra.asm.movdqa(result, src).unwrap();
    ra.asm.packssdw(result, zero).unwrap();
    ra.asm.movdqa(widened, result).unwrap();
    ra.asm.punpcklwd(widened, widened).unwrap();
    ra.asm.psrad(widened, 16).unwrap();
    ra.asm.pcmpeqd(widened, src).unwrap();

    let flag = ra.scratch_gpr();
    ra.asm.pmovmskb(reg32_of(flag), widened).unwrap();
    ra.asm.cmp(reg32_of(flag), 0xFFFF).unwrap();
    ra.asm.setne(reg8_of(flag)).unwrap();
    ctx.sat.or_byte(ra.asm, reg8_of(flag)).unwrap();

    ra.release(flag);
    ra.release(widened);
    ra.release(zero);
    ra.release(src);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_signed_saturated_narrow_to_unsigned16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    let widened = ra.scratch_xmm();
    let zero = ra.scratch_xmm();
    ra.asm.pxor(zero, zero).unwrap();
    ra.asm.movdqa(result, src).unwrap();
    ra.asm.packuswb(result, zero).unwrap();
    ra.asm.movdqa(widened, result).unwrap();
    ra.asm.punpcklbw(widened, zero).unwrap();
    ra.asm.pcmpeqw(widened, src).unwrap();

    let flag = ra.scratch_gpr();
    ra.asm.pmovmskb(reg32_of(flag), widened).unwrap();
    ra.asm.cmp(reg32_of(flag), 0xFFFF).unwrap();
    ra.asm.setne(reg8_of(flag)).unwrap();
    ctx.sat.or_byte(ra.asm, reg8_of(flag)).unwrap();

    ra.release(flag);
    ra.release(widened);
    ra.release(zero);
    ra.release(src);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_signed_saturated_narrow_to_unsigned32_sse41(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    let widened = ra.scratch_xmm();
    let zero = ra.scratch_xmm();
    ra.asm.pxor(zero, zero).unwrap();
    ra.asm.movdqa(result, src).unwrap();
    ra.asm.packusdw(result, zero).unwrap();
    ra.asm.movdqa(widened, result).unwrap();
    ra.asm.punpcklwd(widened, zero).unwrap();
    ra.asm.pcmpeqd(widened, src).unwrap();

    let flag = ra.scratch_gpr();
    ra.asm.pmovmskb(reg32_of(flag), widened).unwrap();
    ra.asm.cmp(reg32_of(flag), 0xFFFF).unwrap();
    ra.asm.setne(reg8_of(flag)).unwrap();
    ctx.sat.or_byte(ra.asm, reg8_of(flag)).unwrap();

    ra.release(flag);
    ra.release(widened);
    ra.release(zero);
    ra.release(src);
    ra.define_value(inst_ref, result);
}

// clamp() requires matching signedness at the bound types, so the three
// narrow families get their own bound expressions.
macro_rules! define_sat_narrow_signed {
    ($name:ident, $src:ty, $dst:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$src; $count] = std::mem::transmute(*a);
                let mut out = [[0 as $dst; $count]; 2];
                let mut qc = 0u32;
                for i in 0..$count {
                    let clamped = va[i].clamp(<$dst>::MIN as $src, <$dst>::MAX as $src);
                    if clamped != va[i] {
                        qc = 1;
                    }
                    out[0][i] = clamped as $dst;
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

macro_rules! define_sat_narrow_to_unsigned {
    ($name:ident, $src:ty, $dst:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$src; $count] = std::mem::transmute(*a);
                let mut out = [[0 as $dst; $count]; 2];
                let mut qc = 0u32;
                for i in 0..$count {
                    let clamped = va[i].clamp(0, <$dst>::MAX as $src);
                    if clamped != va[i] {
                        qc = 1;
                    }
                    out[0][i] = clamped as $dst;
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

macro_rules! define_sat_narrow_unsigned {
    ($name:ident, $src:ty, $dst:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$src; $count] = std::mem::transmute(*a);
                let mut out = [[0 as $dst; $count]; 2];
                let mut qc = 0u32;
                for i in 0..$count {
                    let clamped = va[i].min(<$dst>::MAX as $src);
                    if clamped != va[i] {
                        qc = 1;
                    }
                    out[0][i] = clamped as $dst;
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_narrow_signed!(fallback_sat_narrow_ss16, i16, i8, 8);
define_sat_narrow_signed!(fallback_sat_narrow_ss32, i32, i16, 4);
define_sat_narrow_signed!(fallback_sat_narrow_ss64, i64, i32, 2);
define_sat_narrow_to_unsigned!(fallback_sat_narrow_su16, i16, u8, 8);
define_sat_narrow_to_unsigned!(fallback_sat_narrow_su32, i32, u16, 4);
define_sat_narrow_to_unsigned!(fallback_sat_narrow_su64, i64, u32, 2);
define_sat_narrow_unsigned!(fallback_sat_narrow_uu16, u16, u8, 8);
define_sat_narrow_unsigned!(fallback_sat_narrow_uu32, u32, u16, 4);
define_sat_narrow_unsigned!(fallback_sat_narrow_uu64, u64, u32, 2);

pub fn emit_vector_signed_saturated_narrow_to_signed64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_narrow_ss64 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_narrow_to_unsigned32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_narrow_su32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_narrow_to_unsigned64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_narrow_su64 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_narrow16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_narrow_uu16 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_narrow32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_narrow_uu32 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_narrow64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_narrow_uu64 as usize, &ctx.sat);
}

// ---------------------------------------------------------------------------
// Saturating accumulate across signedness: a supplies the addend in the
// opposite signedness, b the accumulator, and the sum clamps to the
// accumulator's range.
// ---------------------------------------------------------------------------

macro_rules! define_sat_accumulate_unsigned_into_signed {
    ($name:ident, $sty:ty, $uty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$uty; $count] = std::mem::transmute(*a);
                let vb: [$sty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $sty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    let sum = va[i] as i128 + vb[i] as i128;
                    let clamped = sum.clamp(<$sty>::MIN as i128, <$sty>::MAX as i128);
                    if clamped != sum {
                        qc = 1;
                    }
                    out[i] = clamped as $sty;
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

macro_rules! define_sat_accumulate_signed_into_unsigned {
    ($name:ident, $sty:ty, $uty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$sty; $count] = std::mem::transmute(*a);
                let vb: [$uty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $uty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    let sum = va[i] as i128 + vb[i] as i128;
                    let clamped = sum.clamp(0, <$uty>::MAX as i128);
                    if clamped != sum {
                        qc = 1;
                    }
                    out[i] = clamped as $uty;
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_accumulate_unsigned_into_signed!(fallback_sat_accumulate_su8, i8, u8, 16);
define_sat_accumulate_unsigned_into_signed!(fallback_sat_accumulate_su16, i16, u16, 8);
define_sat_accumulate_unsigned_into_signed!(fallback_sat_accumulate_su32, i32, u32, 4);
define_sat_accumulate_unsigned_into_signed!(fallback_sat_accumulate_su64, i64, u64, 2);
define_sat_accumulate_signed_into_unsigned!(fallback_sat_accumulate_us8, i8, u8, 16);
define_sat_accumulate_signed_into_unsigned!(fallback_sat_accumulate_us16, i16, u16, 8);
define_sat_accumulate_signed_into_unsigned!(fallback_sat_accumulate_us32, i32, u32, 4);
define_sat_accumulate_signed_into_unsigned!(fallback_sat_accumulate_us64, i64, u64, 2);

pub fn emit_vector_signed_saturated_accumulate_unsigned8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_su8 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_accumulate_unsigned16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_su16 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_accumulate_unsigned32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_su32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_accumulate_unsigned64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_su64 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_accumulate_signed8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_us8 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_accumulate_signed16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_us16 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_accumulate_signed32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_us32 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_accumulate_signed64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_accumulate_us64 as usize, &ctx.sat);
}

// ---------------------------------------------------------------------------
// Saturating doubling multiply returning the high half. Only MIN * MIN
// overflows (the doubled product exceeds MAX), so the post-compare against
// the lane minimum is the flag condition.
// ---------------------------------------------------------------------------

pub fn emit_vector_signed_saturated_doubling_multiply_high16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let lo = ra.scratch_xmm();
    let mask = ra.scratch_xmm();
    ra.asm.movdqa(lo, result).unwrap();
    ra.asm.pmullw(lo, b).unwrap();
    ra.asm.pmulhw(result, b).unwrap();
    ra.asm.psllw(result, 1).unwrap();
    ra.asm.psrlw(lo, 15).unwrap();
    ra.asm.por(result, lo).unwrap();
    load_const128(ra, mask, 0x8000_8000_8000_8000, 0x8000_8000_8000_8000);
    ra.asm.pcmpeqw(mask, result).unwrap();
    ra.asm.pxor(result, mask).unwrap();
    emit_qc_from_mask(ra, &ctx.sat, mask);
    ra.release(lo);
    ra.release(mask);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_signed_saturated_doubling_multiply_high32_sse41(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_xmm(&mut args[1]);
    let odd_a = ra.scratch_xmm();
    let odd_b = ra.scratch_xmm();
    ra.asm.pshufd(odd_a, result, 0b1111_0101).unwrap();
    ra.asm.pshufd(odd_b, b, 0b1111_0101).unwrap();
    ra.asm.pmuldq(result, b).unwrap();
    ra.asm.pmuldq(odd_a, odd_b).unwrap();
    // Doubling the product and keeping bits [63:32] is a right shift by 31.
    ra.asm.psrlq(result, 31).unwrap();
    ra.asm.psrlq(odd_a, 31).unwrap();
    ra.asm.pshufd(result, result, 0b0000_1000).unwrap();
    ra.asm.pshufd(odd_a, odd_a, 0b0000_1000).unwrap();
    ra.asm.punpckldq(result, odd_a).unwrap();
    load_const128(ra, odd_b, 0x8000_0000_8000_0000, 0x8000_0000_8000_0000);
    ra.asm.pcmpeqd(odd_b, result).unwrap();
    ra.asm.pxor(result, odd_b).unwrap();
    emit_qc_from_mask(ra, &ctx.sat, odd_b);
    ra.release(odd_a);
    ra.release(odd_b);
    ra.define_value(inst_ref, result);
}

macro_rules! define_sat_doubling_mul_high {
    ($name:ident, $ty:ty, $wide:ty, $count:expr, $round:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$ty>() as u32 * 8;
                let mut out = [0 as $ty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    // 2ab >> bits == ab >> (bits - 1); the undoubled product
                    // fits $wide even at MIN * MIN, where the doubled one
                    // would not.
                    let round: $wide = if $round { 1 << (bits - 2) } else { 0 };
                    let product = (va[i] as $wide) * (vb[i] as $wide) + round;
                    let shifted = product >> (bits - 1);
                    if shifted > <$ty>::MAX as $wide {
                        out[i] = <$ty>::MAX;
                        qc = 1;
                    } else if shifted < <$ty>::MIN as $wide {
                        out[i] = <$ty>::MIN;
                        qc = 1;
                    } else {
                        out[i] = shifted as $ty;
                    }
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_doubling_mul_high!(fallback_sat_qdmulh32, i32, i64, 4, false);
define_sat_doubling_mul_high!(fallback_sat_qrdmulh16, i16, i32, 8, true);
define_sat_doubling_mul_high!(fallback_sat_qrdmulh32, i32, i64, 4, true);

pub fn emit_vector_signed_saturated_doubling_multiply_high32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_qdmulh32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_doubling_multiply_high_rounding16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_qrdmulh16 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_doubling_multiply_high_rounding32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_qrdmulh32 as usize, &ctx.sat);
}

macro_rules! define_sat_doubling_mul_long {
    ($name:ident, $ty:ty, $wide:ty, $acc:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $wide; $count / 2];
                let mut qc = 0u32;
                for i in 0..$count / 2 {
                    let product = 2 * (va[i] as $acc) * (vb[i] as $acc);
                    let clamped = product.clamp(<$wide>::MIN as $acc, <$wide>::MAX as $acc);
                    if clamped != product {
                        qc = 1;
                    }
                    out[i] = clamped as $wide;
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_doubling_mul_long!(fallback_sat_qdmull16, i16, i32, i64, 8);
define_sat_doubling_mul_long!(fallback_sat_qdmull32, i32, i64, i128, 4);

pub fn emit_vector_signed_saturated_doubling_multiply_long16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_qdmull16 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_doubling_multiply_long32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_qdmull32 as usize, &ctx.sat);
}

// ---------------------------------------------------------------------------
// Saturating shift left with per-lane amounts. Left shifts saturate on
// overflow; negative amounts shift right without saturating.
// ---------------------------------------------------------------------------

macro_rules! define_sat_shift_left_signed {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$ty>() as i32 * 8;
                let mut out = [0 as $ty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    let shift = (vb[i] as u8 as i8) as i32;
                    out[i] = if shift <= -bits {
                        va[i] >> (bits - 1) as u32
                    } else if shift < 0 {
                        va[i] >> (-shift) as u32
                    } else if shift >= bits {
                        if va[i] == 0 {
                            0
                        } else {
                            qc = 1;
                            if va[i] > 0 { <$ty>::MAX } else { <$ty>::MIN }
                        }
                    } else {
                        let shifted = (va[i] as i128) << shift as u32;
                        let clamped = shifted.clamp(<$ty>::MIN as i128, <$ty>::MAX as i128);
                        if clamped != shifted {
                            qc = 1;
                        }
                        clamped as $ty
                    };
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

macro_rules! define_sat_shift_left_unsigned {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) -> u32 {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let bits = std::mem::size_of::<$ty>() as i32 * 8;
                let mut out = [0 as $ty; $count];
                let mut qc = 0u32;
                for i in 0..$count {
                    let shift = (vb[i] as u8 as i8) as i32;
                    out[i] = if shift <= -bits {
                        0
                    } else if shift < 0 {
                        va[i] >> (-shift) as u32
                    } else if shift >= bits {
                        if va[i] == 0 {
                            0
                        } else {
                            qc = 1;
                            <$ty>::MAX
                        }
                    } else {
                        let shifted = (va[i] as u128) << shift as u32;
                        if shifted > <$ty>::MAX as u128 {
                            qc = 1;
                            <$ty>::MAX
                        } else {
                            shifted as $ty
                        }
                    };
                }
                *result = std::mem::transmute(out);
                qc
            }
        }
    };
}

define_sat_shift_left_signed!(fallback_sat_shift_left_s8, i8, 16);
define_sat_shift_left_signed!(fallback_sat_shift_left_s16, i16, 8);
define_sat_shift_left_signed!(fallback_sat_shift_left_s32, i32, 4);
define_sat_shift_left_signed!(fallback_sat_shift_left_s64, i64, 2);
define_sat_shift_left_unsigned!(fallback_sat_shift_left_u8, u8, 16);
define_sat_shift_left_unsigned!(fallback_sat_shift_left_u16, u16, 8);
define_sat_shift_left_unsigned!(fallback_sat_shift_left_u32, u32, 4);
define_sat_shift_left_unsigned!(fallback_sat_shift_left_u64, u64, 2);

pub fn emit_vector_signed_saturated_shift_left8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_s8 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_shift_left16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_s16 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_shift_left32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_s32 as usize, &ctx.sat);
}
pub fn emit_vector_signed_saturated_shift_left64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_s64 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_shift_left8(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_u8 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_shift_left16(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_u16 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_shift_left32(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_u32 as usize, &ctx.sat);
}
pub fn emit_vector_unsigned_saturated_shift_left64(ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback_saturated(ra, inst_ref, inst, fallback_sat_shift_left_u64 as usize, &ctx.sat);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_signed_saturated_add8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_signed_saturated_abs64_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_signed_saturated_narrow_to_unsigned32_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_signed_saturated_doubling_multiply_high16;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_unsigned_saturated_shift_left64;
    }

    #[test]
    fn test_fallback_sat_add_sets_flag_only_on_saturation() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i32::MAX, 1, -1, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([1i32, 1, -1, 0]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_add_s32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [i32::MAX, 2, -2, 0]);
        assert_eq!(qc, 1);

        let c: [u8; 16] = unsafe { std::mem::transmute([1i32, 2, 3, 4]) };
        let qc = fallback_sat_add_s32(&mut result, &c, &c);
        assert_eq!(qc, 0);
    }

    #[test]
    fn test_fallback_sat_abs_min_lane() {
        let mut a = [0u8; 16];
        a[0] = 0x80; // i8::MIN
        a[1] = 0x7F;
        let mut result = [0u8; 16];
        let qc = fallback_sat_abs8(&mut result, &a);
        assert_eq!(result[0], 0x7F);
        assert_eq!(result[1], 0x7F);
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_sat_narrow_clamps_min_32_to_16() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i32::MIN, 1, -1, 0x12345]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_narrow_ss32(&mut result, &a);
        let out: [i16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], i16::MIN);
        assert_eq!(out[1], 1);
        assert_eq!(out[2], -1);
        assert_eq!(out[3], i16::MAX);
        assert_eq!(&out[4..], &[0i16; 4]); // upper half zeroed
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_sat_narrow_to_unsigned_clamps_negative_to_zero() {
        let a: [u8; 16] = unsafe { std::mem::transmute([-1i32, 0x1_0000, 42, 0]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_narrow_su32(&mut result, &a);
        let out: [u16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], 0);
        assert_eq!(out[1], u16::MAX);
        assert_eq!(out[2], 42);
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_sat_accumulate() {
        let a: [u8; 16] = unsafe { std::mem::transmute([200u32, 1, 0, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([i32::MAX, -5, 0, 0]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_accumulate_su32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], i32::MAX);
        assert_eq!(out[1], -4);
        assert_eq!(qc, 1);

        let c: [u8; 16] = unsafe { std::mem::transmute([-10i32, 5, 0, 0]) };
        let d: [u8; 16] = unsafe { std::mem::transmute([3u32, u32::MAX, 0, 0]) };
        let qc = fallback_sat_accumulate_us32(&mut result, &c, &d);
        let out: [u32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], 0);
        assert_eq!(out[1], u32::MAX);
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_doubling_multiply_min_times_min() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i32::MIN, 2, 0, 0]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_qdmulh32(&mut result, &a, &a);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], i32::MAX);
        assert_eq!(out[1], 0); // 2*2*2 >> 32
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_doubling_multiply_min_times_min_all_lanes() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i32::MIN; 4]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_qdmulh32(&mut result, &a, &a);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [i32::MAX; 4]);
        assert_eq!(qc, 1);

        let qc = fallback_sat_qrdmulh32(&mut result, &a, &a);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out, [i32::MAX; 4]);
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_rounding_doubling_multiply16() {
        let a: [u8; 16] = unsafe { std::mem::transmute([i16::MIN, 0x4000, -0x4000, 3, 0, 0, 0, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([i16::MIN, 0x4000, 0x4000, 3, 0, 0, 0, 0]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_qrdmulh16(&mut result, &a, &b);
        let out: [i16; 8] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], i16::MAX); // MIN * MIN saturates
        assert_eq!(out[1], 0x2000); // 0.5 * 0.5 = 0.25
        assert_eq!(out[2], -0x2000);
        assert_eq!(out[3], 0); // 2*9 + 0x8000 >> 16 rounds to zero
        assert_eq!(qc, 1);
    }

    #[test]
    fn test_fallback_sat_shift_left() {
        let a: [u8; 16] = unsafe { std::mem::transmute([0x4000_0000i32, -1, 16, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([2i32, 40, -2, 0]) };
        let mut result = [0u8; 16];
        let qc = fallback_sat_shift_left_s32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], i32::MAX); // overflowing left shift clamps
        assert_eq!(out[1], i32::MIN); // nonzero lane shifted out entirely
        assert_eq!(out[2], 4);
        assert_eq!(qc, 1);
    }
}
