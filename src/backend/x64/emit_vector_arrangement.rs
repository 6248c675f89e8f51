use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::hostloc::{reg32_of, reg8_of};
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// Element extraction to a general register.
// ---------------------------------------------------------------------------

pub fn emit_vector_get_element8_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 16, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    ra.asm.pextrb(reg32_of(result), source, index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_get_element8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 16, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    // pextrw grabs the containing word; the byte is isolated in the GPR.
    ra.asm.pextrw(reg32_of(result), source, (index / 2) as u32).unwrap();
    if index % 2 == 1 {
        ra.asm.shr(reg32_of(result), 8).unwrap();
    } else {
        ra.asm.and(reg32_of(result), 0xFF).unwrap();
    }
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_get_element16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 8, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    ra.asm.pextrw(reg32_of(result), source, index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_get_element32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 4, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    ra.asm.pextrd(reg32_of(result), source, index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_get_element32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 4, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    if index == 0 {
        ra.asm.movd(reg32_of(result), source).unwrap();
    } else {
        let tmp = ra.scratch_xmm();
        ra.asm.pshufd(tmp, source, index as u32).unwrap();
        ra.asm.movd(reg32_of(result), tmp).unwrap();
        ra.release(tmp);
    }
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_get_element64_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 2, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    ra.asm.pextrq(result, source, index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_get_element64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let source = ra.use_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 2, "lane index {} out of range", index);
    let result = ra.scratch_gpr();
    if index == 0 {
        ra.asm.movq(result, source).unwrap();
    } else {
        let tmp = ra.scratch_xmm();
        ra.asm.pshufd(tmp, source, 0b1110_1110).unwrap();
        ra.asm.movq(result, tmp).unwrap();
        ra.release(tmp);
    }
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Element insertion from a general register.
// ---------------------------------------------------------------------------

pub fn emit_vector_set_element8_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 16, "lane index {} out of range", index);
    let value = ra.use_gpr(&mut args[2]);
    ra.asm.pinsrb(result, reg32_of(value), index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_set_element8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 16, "lane index {} out of range", index);
    let value = ra.use_scratch_gpr(&mut args[2]);
    let tmp = ra.scratch_gpr();
    // Merge the byte into the containing word and reinsert it.
    ra.asm.pextrw(reg32_of(tmp), result, (index / 2) as u32).unwrap();
    ra.asm.movzx(reg32_of(value), reg8_of(value)).unwrap();
    if index % 2 == 1 {
        ra.asm.shl(reg32_of(value), 8).unwrap();
        ra.asm.and(reg32_of(tmp), 0x00FF).unwrap();
    } else {
        ra.asm.and(reg32_of(tmp), 0xFF00).unwrap();
    }
    ra.asm.or(reg32_of(value), reg32_of(tmp)).unwrap();
    ra.asm.pinsrw(result, reg32_of(value), (index / 2) as u32).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_set_element16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 8, "lane index {} out of range", index);
    let value = ra.use_gpr(&mut args[2]);
    ra.asm.pinsrw(result, reg32_of(value), index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_set_element32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 4, "lane index {} out of range", index);
    let value = ra.use_gpr(&mut args[2]);
    ra.asm.pinsrd(result, reg32_of(value), index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_set_element32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 4, "lane index {} out of range", index);
    let value = ra.use_scratch_gpr(&mut args[2]);
    ra.asm.pinsrw(result, reg32_of(value), (index * 2) as u32).unwrap();
    ra.asm.shr(reg32_of(value), 16).unwrap();
    ra.asm.pinsrw(result, reg32_of(value), (index * 2 + 1) as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_set_element64_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 2, "lane index {} out of range", index);
    let value = ra.use_gpr(&mut args[2]);
    ra.asm.pinsrq(result, value, index as u32).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_set_element64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!(index < 2, "lane index {} out of range", index);
    let value = ra.use_scratch_gpr(&mut args[2]);
    for word in 0..4u32 {
        ra.asm.pinsrw(result, reg32_of(value), index as u32 * 4 + word).unwrap();
        if word < 3 {
            ra.asm.shr(value, 16).unwrap();
        }
    }
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Broadcast from a general register, and broadcast of a single lane.
// ---------------------------------------------------------------------------

pub fn emit_vector_broadcast8_avx2(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.vpbroadcastb(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.punpcklbw(result, result).unwrap();
    ra.asm.pshuflw(result, result, 0).unwrap();
    ra.asm.punpcklqdq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast16_avx2(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.vpbroadcastw(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.pshuflw(result, result, 0).unwrap();
    ra.asm.punpcklqdq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast32_avx2(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.vpbroadcastd(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.pshufd(result, result, 0).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast64_avx2(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movq(result, value).unwrap();
    ra.asm.vpbroadcastq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movq(result, value).unwrap();
    ra.asm.punpcklqdq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

// Lower-half broadcasts: the scalar fills the low 64 bits, the upper half
// stays zero (movd/movq already cleared it).

pub fn emit_vector_broadcast_lower8_avx2(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.vpbroadcastb(result, result).unwrap();
    ra.asm.movq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast_lower8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.punpcklbw(result, result).unwrap();
    ra.asm.pshuflw(result, result, 0).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast_lower16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.pshuflw(result, result, 0).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast_lower32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let value = ra.use_gpr(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.movd(result, reg32_of(value)).unwrap();
    ra.asm.pshuflw(result, result, 0b0100_0100).unwrap();
    ra.define_value(inst_ref, result);
}

fn broadcast_lane0(ra: &mut RegAlloc, result: AsmRegisterXmm, esize: usize) {
    match esize {
        8 => {
            ra.asm.punpcklbw(result, result).unwrap();
            ra.asm.pshuflw(result, result, 0).unwrap();
            ra.asm.punpcklqdq(result, result).unwrap();
        }
        16 => {
            ra.asm.pshuflw(result, result, 0).unwrap();
            ra.asm.punpcklqdq(result, result).unwrap();
        }
        32 => {
            ra.asm.pshufd(result, result, 0).unwrap();
        }
        64 => {
            ra.asm.punpcklqdq(result, result).unwrap();
        }
        _ => unreachable!(),
    }
}

fn emit_broadcast_element(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, esize: usize) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let index = args[1].get_immediate_u8();
    assert!((index as usize) < 128 / esize, "lane index {} out of range", index);
    if index > 0 {
        ra.asm.psrldq(result, index as u32 * (esize / 8) as u32).unwrap();
    }
    broadcast_lane0(ra, result, esize);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_broadcast_element8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_broadcast_element(ra, inst_ref, inst, 8);
}
pub fn emit_vector_broadcast_element16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_broadcast_element(ra, inst_ref, inst, 16);
}
pub fn emit_vector_broadcast_element32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_broadcast_element(ra, inst_ref, inst, 32);
}
pub fn emit_vector_broadcast_element64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_broadcast_element(ra, inst_ref, inst, 64);
}

// ---------------------------------------------------------------------------
// Extract: concatenated halves of two vectors, shifted down by a bit position.
// ---------------------------------------------------------------------------

pub fn emit_vector_extract_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let position = args[2].get_immediate_u8();
    assert!(position % 8 == 0, "extract position {} is not byte aligned", position);
    let byte = (position / 8) as u32;
    if byte == 0 {
        let result = ra.use_scratch_xmm(&mut args[0]);
        ra.define_value(inst_ref, result);
        return;
    }
    let result = ra.use_scratch_xmm(&mut args[1]);
    let a = ra.use_xmm(&mut args[0]);
    ra.asm.palignr(result, a, byte).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_extract(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let position = args[2].get_immediate_u8();
    assert!(position % 8 == 0, "extract position {} is not byte aligned", position);
    let byte = (position / 8) as u32;
    let result = ra.use_scratch_xmm(&mut args[0]);
    if byte > 0 {
        let high = ra.use_scratch_xmm(&mut args[1]);
        ra.asm.psrldq(result, byte).unwrap();
        ra.asm.pslldq(high, 16 - byte).unwrap();
        ra.asm.por(result, high).unwrap();
        ra.release(high);
    }
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_extract_lower(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let position = args[2].get_immediate_u8();
    assert!(position % 8 == 0, "extract position {} is not byte aligned", position);
    let byte = (position / 8) as u32;
    let result = ra.use_scratch_xmm(&mut args[0]);
    if byte > 0 {
        let high = ra.use_xmm(&mut args[1]);
        ra.asm.punpcklqdq(result, high).unwrap();
        ra.asm.psrldq(result, byte).unwrap();
        ra.release(high);
    }
    // Zero the upper half.
    ra.asm.movq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Halfword/word shuffles by immediate control byte.
// ---------------------------------------------------------------------------

pub fn emit_vector_shuffle_low_halfwords(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_shuffle_op(ra, inst_ref, inst, |a, d, s, imm| a.pshuflw(d, s, imm));
}
pub fn emit_vector_shuffle_high_halfwords(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_shuffle_op(ra, inst_ref, inst, |a, d, s, imm| a.pshufhw(d, s, imm));
}
pub fn emit_vector_shuffle_words(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_shuffle_op(ra, inst_ref, inst, |a, d, s, imm| a.pshufd(d, s, imm));
}

// ---------------------------------------------------------------------------
// Widening and narrowing.
// ---------------------------------------------------------------------------

pub fn emit_vector_sign_extend8_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pmovsxbw(d, s));
}
pub fn emit_vector_sign_extend16_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pmovsxwd(d, s));
}
pub fn emit_vector_sign_extend32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pmovsxdq(d, s));
}

pub fn emit_vector_sign_extend8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    ra.asm.punpcklbw(result, result).unwrap();
    ra.asm.psraw(result, 8).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_sign_extend16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    ra.asm.punpcklwd(result, result).unwrap();
    ra.asm.psrad(result, 16).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_sign_extend32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let sign = ra.scratch_xmm();
    ra.asm.movdqa(sign, result).unwrap();
    ra.asm.psrad(sign, 31).unwrap();
    ra.asm.punpckldq(result, sign).unwrap();
    ra.release(sign);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_sign_extend64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let sign = ra.scratch_xmm();
    ra.asm.pshufd(sign, result, 0b1111_0101).unwrap();
    ra.asm.psrad(sign, 31).unwrap();
    ra.asm.punpcklqdq(result, sign).unwrap();
    ra.release(sign);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_zero_extend8_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pmovzxbw(d, s));
}
pub fn emit_vector_zero_extend16_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pmovzxwd(d, s));
}
pub fn emit_vector_zero_extend32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pmovzxdq(d, s));
}

fn emit_zero_extend_unpack(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, esize: usize) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let zero = ra.scratch_xmm();
    ra.asm.pxor(zero, zero).unwrap();
    match esize {
        8 => ra.asm.punpcklbw(result, zero).unwrap(),
        16 => ra.asm.punpcklwd(result, zero).unwrap(),
        32 => ra.asm.punpckldq(result, zero).unwrap(),
        _ => unreachable!(),
    }
    ra.release(zero);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_zero_extend8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_zero_extend_unpack(ra, inst_ref, inst, 8);
}
pub fn emit_vector_zero_extend16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_zero_extend_unpack(ra, inst_ref, inst, 16);
}
pub fn emit_vector_zero_extend32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_zero_extend_unpack(ra, inst_ref, inst, 32);
}

pub fn emit_vector_zero_extend64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    ra.asm.movq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_narrow_truncate16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let zero = ra.scratch_xmm();
    let mask = ra.scratch_xmm();
    load_const128(ra, mask, 0x00FF_00FF_00FF_00FF, 0x00FF_00FF_00FF_00FF);
    ra.asm.pxor(zero, zero).unwrap();
    ra.asm.pand(result, mask).unwrap();
    ra.asm.packuswb(result, zero).unwrap();
    ra.release(zero);
    ra.release(mask);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_narrow_truncate32_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let zero = ra.scratch_xmm();
    let mask = ra.scratch_xmm();
    load_const128(ra, mask, 0x0000_FFFF_0000_FFFF, 0x0000_FFFF_0000_FFFF);
    ra.asm.pxor(zero, zero).unwrap();
    ra.asm.pand(result, mask).unwrap();
    ra.asm.packusdw(result, zero).unwrap();
    ra.release(zero);
    ra.release(mask);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_narrow_truncate32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    ra.asm.pshuflw(result, result, 0b0000_1000).unwrap();
    ra.asm.pshufhw(result, result, 0b0000_1000).unwrap();
    ra.asm.pshufd(result, result, 0b0000_1000).unwrap();
    ra.asm.movq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_narrow_truncate64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    ra.asm.pshufd(result, result, 0b0000_1000).unwrap();
    ra.asm.movq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Interleave and deinterleave.
// ---------------------------------------------------------------------------

pub fn emit_vector_interleave_lower8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpcklbw(d, s));
}
pub fn emit_vector_interleave_lower16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpcklwd(d, s));
}
pub fn emit_vector_interleave_lower32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpckldq(d, s));
}
pub fn emit_vector_interleave_lower64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpcklqdq(d, s));
}

pub fn emit_vector_interleave_upper8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpckhbw(d, s));
}
pub fn emit_vector_interleave_upper16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpckhwd(d, s));
}
pub fn emit_vector_interleave_upper32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpckhdq(d, s));
}
pub fn emit_vector_interleave_upper64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpckhqdq(d, s));
}

pub fn emit_vector_deinterleave_even8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    // Even bytes re-sign-extended through a word shift, then packed.
    ra.asm.psllw(result, 8).unwrap();
    ra.asm.psraw(result, 8).unwrap();
    ra.asm.psllw(b, 8).unwrap();
    ra.asm.psraw(b, 8).unwrap();
    ra.asm.packsswb(result, b).unwrap();
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_deinterleave_odd8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    ra.asm.psraw(result, 8).unwrap();
    ra.asm.psraw(b, 8).unwrap();
    ra.asm.packsswb(result, b).unwrap();
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_deinterleave_even16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    ra.asm.pslld(result, 16).unwrap();
    ra.asm.psrad(result, 16).unwrap();
    ra.asm.pslld(b, 16).unwrap();
    ra.asm.psrad(b, 16).unwrap();
    ra.asm.packssdw(result, b).unwrap();
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_deinterleave_odd16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    ra.asm.psrad(result, 16).unwrap();
    ra.asm.psrad(b, 16).unwrap();
    ra.asm.packssdw(result, b).unwrap();
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_deinterleave_even32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    ra.asm.pshufd(result, result, 0b1000_1000).unwrap();
    ra.asm.pshufd(b, b, 0b1000_1000).unwrap();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_deinterleave_odd32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    ra.asm.pshufd(result, result, 0b1101_1101).unwrap();
    ra.asm.pshufd(b, b, 0b1101_1101).unwrap();
    ra.asm.punpcklqdq(result, b).unwrap();
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_deinterleave_even64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpcklqdq(d, s));
}
pub fn emit_vector_deinterleave_odd64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.punpckhqdq(d, s));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::x64::emit_vector_basic::emit_vector_zero;
    use crate::backend::x64::hostcaps::HostCaps;
    use crate::ir::opcode::Opcode;
    use crate::ir::value::Value;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_get_element8_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_set_element64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_broadcast_element32;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_extract_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_narrow_truncate64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_deinterleave_odd32;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_broadcast_lower8_avx2;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_broadcast_lower32;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_extract_lower;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_shuffle_low_halfwords;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_shuffle_words;
    }

    #[test]
    fn test_extract_lower_position_zero_zero_extends() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let mut ra = RegAlloc::new_default(&mut asm, vec![(1, 128), (1, 128), (1, 128)]);
        let ctx = EmitContext::new(HostCaps::empty());
        let zero = Inst::new(Opcode::ZeroVector, &[]);
        emit_vector_zero(&ctx, &mut ra, InstRef(0), &zero);
        emit_vector_zero(&ctx, &mut ra, InstRef(1), &zero);
        ra.end_of_alloc_scope();
        let inst = Inst::new(
            Opcode::ExtractLower,
            &[Value::Inst(InstRef(0)), Value::Inst(InstRef(1)), Value::ImmU8(0)],
        );
        let before = ra.asm.instructions().len();
        emit_vector_extract_lower(&ctx, &mut ra, InstRef(2), &inst);
        // operand-preserving spill + movq; the high operand is never touched
        assert_eq!(ra.asm.instructions().len() - before, 2);
        assert_eq!(
            ra.asm.instructions().last().unwrap().mnemonic(),
            iced_x86::Mnemonic::Movq
        );
        ra.end_of_alloc_scope();
    }

    #[test]
    fn test_zero_extend64_lowers_to_movq() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let mut ra = RegAlloc::new_default(&mut asm, vec![(1, 128), (1, 128)]);
        let ctx = EmitContext::new(HostCaps::empty());
        let zero = Inst::new(Opcode::ZeroVector, &[]);
        emit_vector_zero(&ctx, &mut ra, InstRef(0), &zero);
        ra.end_of_alloc_scope();
        let inst = Inst::new(Opcode::ZeroExtend64, &[Value::Inst(InstRef(0))]);
        let before = ra.asm.instructions().len();
        emit_vector_zero_extend64(&ctx, &mut ra, InstRef(1), &inst);
        // operand-preserving spill + movq
        assert_eq!(ra.asm.instructions().len() - before, 2);
        assert_eq!(
            ra.asm.instructions().last().unwrap().mnemonic(),
            iced_x86::Mnemonic::Movq
        );
        ra.end_of_alloc_scope();
    }

    #[test]
    fn test_extract_position_zero_copies_low_operand() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let mut ra = RegAlloc::new_default(&mut asm, vec![(1, 128), (1, 128), (1, 128)]);
        let ctx = EmitContext::new(HostCaps::empty());
        let zero = Inst::new(Opcode::ZeroVector, &[]);
        emit_vector_zero(&ctx, &mut ra, InstRef(0), &zero);
        emit_vector_zero(&ctx, &mut ra, InstRef(1), &zero);
        ra.end_of_alloc_scope();
        let inst = Inst::new(
            Opcode::Extract,
            &[Value::Inst(InstRef(0)), Value::Inst(InstRef(1)), Value::ImmU8(0)],
        );
        let before = ra.asm.instructions().len();
        emit_vector_extract(&ctx, &mut ra, InstRef(2), &inst);
        // no shift or blend, only the allocator preserving the low operand
        assert_eq!(ra.asm.instructions().len() - before, 1);
        assert_eq!(
            ra.asm.instructions().last().unwrap().mnemonic(),
            iced_x86::Mnemonic::Movaps
        );
        ra.end_of_alloc_scope();
    }
}
