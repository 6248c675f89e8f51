use iced_x86::code_asm::*;
use iced_x86::IcedError;

use crate::backend::x64::emit_context::SatSink;
use crate::backend::x64::hostloc::reg32_of;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

/// Shorthand for the assembler-instruction callbacks the helpers accept.
pub type BinOp = fn(&mut CodeAssembler, AsmRegisterXmm, AsmRegisterXmm) -> Result<(), IcedError>;
pub type BinOpImm = fn(&mut CodeAssembler, AsmRegisterXmm, u32) -> Result<(), IcedError>;
pub type ShuffleOp =
    fn(&mut CodeAssembler, AsmRegisterXmm, AsmRegisterXmm, u32) -> Result<(), IcedError>;

// ---------------------------------------------------------------------------
// Native SSE binary op: result = op(arg0, arg1)
// UseScratchXmm(arg0) + UseXmm(arg1) → op(result, op2) → DefineValue
// ---------------------------------------------------------------------------

pub fn emit_vector_op(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, op: BinOp) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let op2 = ra.use_xmm(&mut args[1]);
    op(ra.asm, result, op2).unwrap();
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Native SSE binary op with immediate: result = op(arg0, imm)
// UseScratchXmm(arg0) → op(result, imm) → DefineValue
// ---------------------------------------------------------------------------

pub fn emit_vector_op_imm(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, op: BinOpImm) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let imm = args[1].get_immediate_u8();
    op(ra.asm, result, imm as u32).unwrap();
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Native SSE op with imm8 in 3-operand form (pshufd/palignr-like):
//   result = op(arg0, arg1, imm)
// ScratchXmm → op(dst, src, imm) → DefineValue
// ---------------------------------------------------------------------------

pub fn emit_vector_shuffle_op(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, op: ShuffleOp) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let imm = args[1].get_immediate_u8();
    let result = ra.scratch_xmm();
    op(ra.asm, result, src, imm as u32).unwrap();
    ra.release(src);
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// Native SSE unary op: result = op(arg0)
// For ops with separate dst and src registers (e.g., pabsb dst,src)
// ---------------------------------------------------------------------------

pub fn emit_vector_unary_op(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, op: BinOp) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let src = ra.use_xmm(&mut args[0]);
    let result = ra.scratch_xmm();
    op(ra.asm, result, src).unwrap();
    ra.release(src);
    ra.define_value(inst_ref, result);
}

// ---------------------------------------------------------------------------
// 128-bit constant materialization (no constant pool)
// ---------------------------------------------------------------------------

/// Fill `dst` with the 128-bit constant `hi:lo` using a GPR bounce.
pub fn load_const128(ra: &mut RegAlloc, dst: AsmRegisterXmm, lo: u64, hi: u64) {
    if lo == 0 && hi == 0 {
        ra.asm.pxor(dst, dst).unwrap();
        return;
    }
    if lo == u64::MAX && hi == u64::MAX {
        ra.asm.pcmpeqw(dst, dst).unwrap();
        return;
    }

    let tmp = ra.scratch_gpr();
    if lo == hi {
        ra.asm.mov(tmp, lo).unwrap();
        ra.asm.movq(dst, tmp).unwrap();
        ra.asm.punpcklqdq(dst, dst).unwrap();
    } else {
        let upper = ra.scratch_xmm();
        ra.asm.mov(tmp, lo).unwrap();
        ra.asm.movq(dst, tmp).unwrap();
        ra.asm.mov(tmp, hi).unwrap();
        ra.asm.movq(upper, tmp).unwrap();
        ra.asm.punpcklqdq(dst, upper).unwrap();
        ra.release(upper);
    }
    ra.release(tmp);
}

// ---------------------------------------------------------------------------
// Stack-marshalled fallbacks
//
// Operands travel through a 16-byte-aligned scratch area below RSP:
//   [rsp+0]  result
//   [rsp+16] a
//   [rsp+32] b
//   [rsp+48] c
// Pointer parameters go in RDI/RSI/RDX/RCX per the System V ABI; the callee
// address is loaded into RAX and called indirectly. Saturating fallbacks
// return their lane-saturation mask in EAX, which is ORed into the sink.
// ---------------------------------------------------------------------------

// fn(result: *mut [u8;16], a: *const [u8;16])
pub fn emit_one_arg_fallback(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, func: usize) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);

    // Spill all caller-saved
    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(32, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

// fn(result: *mut [u8;16], a: *const [u8;16], b: *const [u8;16])
pub fn emit_two_arg_fallback(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, func: usize) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);
    let arg2 = ra.use_xmm(&mut args[1]);

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(48, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();
        ra.asm.movaps(xmmword_ptr(rsp + 32), arg2).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();
        ra.asm.lea(rdx, xmmword_ptr(rsp + 32)).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

// fn(result: *mut [u8;16], a: *const [u8;16], b: *const [u8;16], imm: u8)
pub fn emit_two_arg_fallback_with_imm(
    ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst,
    func: usize,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);
    let arg2 = ra.use_xmm(&mut args[1]);
    let imm = args[2].get_immediate_u8();

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(48, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();
        ra.asm.movaps(xmmword_ptr(rsp + 32), arg2).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();
        ra.asm.lea(rdx, xmmword_ptr(rsp + 32)).unwrap();
        ra.asm.mov(rcx, imm as u64).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

// fn(result: *mut [u8;16], a: *const [u8;16], b: *const [u8;16], c: *const [u8;16])
pub fn emit_three_arg_fallback(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, func: usize) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);
    let arg2 = ra.use_xmm(&mut args[1]);
    let arg3 = ra.use_xmm(&mut args[2]);

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(64, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();
        ra.asm.movaps(xmmword_ptr(rsp + 32), arg2).unwrap();
        ra.asm.movaps(xmmword_ptr(rsp + 48), arg3).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();
        ra.asm.lea(rdx, xmmword_ptr(rsp + 32)).unwrap();
        ra.asm.lea(rcx, xmmword_ptr(rsp + 48)).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

// fn(result: *mut [u8;16], a: *const [u8;16], imm: u8)
pub fn emit_one_arg_fallback_with_imm(
    ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst,
    func: usize,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);
    let imm = args[1].get_immediate_u8();

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(32, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();
        ra.asm.mov(rdx, imm as u64).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

// fn(result: *mut [u8;16], a: *const [u8;16], b: *const [u8;16]) -> u32
pub fn emit_two_arg_fallback_saturated(
    ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst,
    func: usize, sat: &SatSink,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);
    let arg2 = ra.use_xmm(&mut args[1]);

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(48, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();
        ra.asm.movaps(xmmword_ptr(rsp + 32), arg2).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();
        ra.asm.lea(rdx, xmmword_ptr(rsp + 32)).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        // Sticky flag |= returned mask
        sat.or_dword(ra.asm, reg32_of(rax)).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

// fn(result: *mut [u8;16], a: *const [u8;16]) -> u32
pub fn emit_one_arg_fallback_saturated(
    ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst,
    func: usize, sat: &SatSink,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let arg1 = ra.use_xmm(&mut args[0]);

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space(32, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp + 16), arg1).unwrap();

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();

        ra.asm.mov(rax, func as u64).unwrap();
        ra.asm.call(rax).unwrap();

        sat.or_dword(ra.asm, reg32_of(rax)).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_fn_signatures() {
        let _: fn(&mut RegAlloc, InstRef, &Inst, BinOp) = emit_vector_op;
        let _: fn(&mut RegAlloc, InstRef, &Inst, BinOpImm) = emit_vector_op_imm;
        let _: fn(&mut RegAlloc, InstRef, &Inst, ShuffleOp) = emit_vector_shuffle_op;
        let _: fn(&mut RegAlloc, InstRef, &Inst, BinOp) = emit_vector_unary_op;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize) = emit_one_arg_fallback;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize) = emit_two_arg_fallback;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize) = emit_two_arg_fallback_with_imm;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize) = emit_three_arg_fallback;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize) = emit_one_arg_fallback_with_imm;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize, &SatSink) = emit_two_arg_fallback_saturated;
        let _: fn(&mut RegAlloc, InstRef, &Inst, usize, &SatSink) = emit_one_arg_fallback_saturated;
    }

    #[test]
    fn test_load_const128_special_cases() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let mut ra = RegAlloc::new_default(&mut asm, vec![]);
        let dst = ra.scratch_xmm();

        load_const128(&mut ra, dst, 0, 0);
        assert_eq!(ra.asm.instructions().len(), 1); // single pxor

        load_const128(&mut ra, dst, u64::MAX, u64::MAX);
        assert_eq!(ra.asm.instructions().len(), 2); // single pcmpeqw

        load_const128(&mut ra, dst, 0x8080_8080_8080_8080, 0x8080_8080_8080_8080);
        assert_eq!(ra.asm.instructions().len(), 5); // mov + movq + punpcklqdq
        ra.end_of_alloc_scope();
    }
}
