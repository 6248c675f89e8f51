use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// VectorAdd / VectorSub — padd / psub
// ---------------------------------------------------------------------------

pub fn emit_vector_add8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.paddb(d, s));
}
pub fn emit_vector_add16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.paddw(d, s));
}
pub fn emit_vector_add32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.paddd(d, s));
}
pub fn emit_vector_add64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.paddq(d, s));
}

pub fn emit_vector_sub8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.psubb(d, s));
}
pub fn emit_vector_sub16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.psubw(d, s));
}
pub fn emit_vector_sub32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.psubd(d, s));
}
pub fn emit_vector_sub64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.psubq(d, s));
}

// ---------------------------------------------------------------------------
// Bitwise — pand / pandn / por / pxor
// ---------------------------------------------------------------------------

pub fn emit_vector_and(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pand(d, s));
}

/// a & ~b. pandn computes ~dst & src, so b lands in the destination.
pub fn emit_vector_and_not(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[1]);
    let op2 = ra.use_xmm(&mut args[0]);
    ra.asm.pandn(result, op2).unwrap();
    ra.release(op2);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_or(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.por(d, s));
}
pub fn emit_vector_eor(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pxor(d, s));
}

pub fn emit_vector_not(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let ones = ra.scratch_xmm();
    ra.asm.pcmpeqw(ones, ones).unwrap();
    ra.asm.pxor(result, ones).unwrap();
    ra.release(ones);
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// VectorZero / VectorZeroUpper
// ---------------------------------------------------------------------------

pub fn emit_vector_zero(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, _inst: &Inst) {
    let result = ra.scratch_xmm();
    ra.asm.xorps(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_zero_upper(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    // movq xmm, xmm zeroes bits 127:64
    ra.asm.movq(result, result).unwrap();
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// VectorAbs — pabs where SSSE3 is available, sign-mask arithmetic below that.
// Wrapping semantics: the most negative lane stays itself.
// ---------------------------------------------------------------------------

pub fn emit_vector_abs8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pabsb(d, s));
}

pub fn emit_vector_abs8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let tmp = ra.scratch_xmm();
    ra.asm.pxor(tmp, tmp).unwrap();
    ra.asm.psubb(tmp, result).unwrap();
    ra.asm.pminub(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_abs16_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pabsw(d, s));
}

pub fn emit_vector_abs16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let tmp = ra.scratch_xmm();
    ra.asm.pxor(tmp, tmp).unwrap();
    ra.asm.psubw(tmp, result).unwrap();
    ra.asm.pmaxsw(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_abs32_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.pabsd(d, s));
}

pub fn emit_vector_abs32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let tmp = ra.scratch_xmm();
    ra.asm.movdqa(tmp, result).unwrap();
    ra.asm.psrad(tmp, 31).unwrap();
    ra.asm.pxor(result, tmp).unwrap();
    ra.asm.psubd(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_abs64_avx512(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.vpabsq(d, s));
}

pub fn emit_vector_abs64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let tmp = ra.scratch_xmm();
    // Replicate each qword's sign across the qword, then xor-subtract.
    ra.asm.pshufd(tmp, result, 0b1111_0101).unwrap();
    ra.asm.psrad(tmp, 31).unwrap();
    ra.asm.pxor(result, tmp).unwrap();
    ra.asm.psubq(result, tmp).unwrap();
    ra.release(tmp);
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// VectorNeg — psub from zero
// ---------------------------------------------------------------------------

fn emit_neg(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, sub: BinOp) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    ra.asm.pxor(result, result).unwrap();
    sub(ra.asm, result, src).unwrap();
    ra.release(src);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_neg8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_neg(ra, inst_ref, inst, |a, d, s| a.psubb(d, s));
}
pub fn emit_vector_neg16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_neg(ra, inst_ref, inst, |a, d, s| a.psubw(d, s));
}
pub fn emit_vector_neg32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_neg(ra, inst_ref, inst, |a, d, s| a.psubd(d, s));
}
pub fn emit_vector_neg64(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_neg(ra, inst_ref, inst, |a, d, s| a.psubq(d, s));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::x64::hostcaps::HostCaps;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_add8;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_sub64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_and_not;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_not;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_zero;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_abs8_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_abs64;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_neg64;
    }

    #[test]
    fn test_zero_vector_emits_single_xorps() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let mut ra = RegAlloc::new_default(&mut asm, vec![]);
        let ctx = EmitContext::new(HostCaps::empty());
        let inst = Inst::new(crate::ir::opcode::Opcode::ZeroVector, &[]);
        emit_vector_zero(&ctx, &mut ra, InstRef(0), &inst);
        assert_eq!(ra.asm.instructions().len(), 1);
        ra.end_of_alloc_scope();
    }

    #[test]
    fn test_abs8_baseline_sequence_length() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let mut ra = RegAlloc::new_default(&mut asm, vec![(1, 128), (1, 128)]);
        let ctx = EmitContext::new(HostCaps::empty());
        let zero = Inst::new(crate::ir::opcode::Opcode::ZeroVector, &[]);
        emit_vector_zero(&ctx, &mut ra, InstRef(0), &zero);
        ra.end_of_alloc_scope();
        let abs = Inst::new(
            crate::ir::opcode::Opcode::Abs8,
            &[crate::ir::value::Value::Inst(InstRef(0))],
        );
        let before = ra.asm.instructions().len();
        emit_vector_abs8(&ctx, &mut ra, InstRef(1), &abs);
        // operand-preserving spill + pxor + psubb + pminub
        assert_eq!(ra.asm.instructions().len() - before, 4);
        ra.end_of_alloc_scope();
    }
}
