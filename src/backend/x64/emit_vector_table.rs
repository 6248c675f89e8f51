use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::hostloc::{reg32_of, HostLoc};
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// Args are (defaults, indices, t0..t3); trailing table slots are Void.
fn num_tables(inst: &Inst) -> usize {
    inst.args[2..].iter().filter(|v| !matches!(v, crate::ir::value::Value::Void)).count()
}

// ---------------------------------------------------------------------------
// Native path: per-table pshufb with biased indices, accumulated by OR, then
// a pblendvb against the defaults for out-of-range indices.
//
// Index bytes at or beyond 16*n select the default lane. pshufb zeroes any
// lane whose control byte has bit 7 set, which a saturating add of 0x70
// produces exactly for indices >= 16.
// ---------------------------------------------------------------------------

pub fn emit_vector_table_lookup_sse41(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let n = num_tables(inst);
    assert!((1..=4).contains(&n), "table lookup requires 1-4 tables, got {}", n);

    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let defaults = ra.use_xmm(&mut args[0]);
    let indices = ra.use_xmm(&mut args[1]);
    // pblendvb reads its mask from xmm0.
    let blend_mask = ra.scratch_xmm_at(HostLoc::Xmm(0));
    let acc = ra.scratch_xmm();
    let biased = ra.scratch_xmm();
    let masked = ra.scratch_xmm();
    let ctrl = ra.scratch_xmm();

    ra.asm.pxor(acc, acc).unwrap();
    ra.asm.movdqa(biased, indices).unwrap();
    for i in 0..n {
        if i > 0 {
            load_const128(ra, ctrl, 0x1010_1010_1010_1010, 0x1010_1010_1010_1010);
            ra.asm.psubb(biased, ctrl).unwrap();
        }
        load_const128(ra, ctrl, 0x7070_7070_7070_7070, 0x7070_7070_7070_7070);
        ra.asm.movdqa(masked, biased).unwrap();
        ra.asm.paddusb(masked, ctrl).unwrap();
        let table = ra.use_scratch_xmm(&mut args[2 + i]);
        ra.asm.pshufb(table, masked).unwrap();
        ra.asm.por(acc, table).unwrap();
        ra.release(table);
    }

    // Saturating add pushes every out-of-range index byte to >= 0x80.
    let bias = 0x80 - 16 * n as u64;
    let splat = bias * 0x0101_0101_0101_0101;
    load_const128(ra, ctrl, splat, splat);
    ra.asm.movdqa(blend_mask, indices).unwrap();
    ra.asm.paddusb(blend_mask, ctrl).unwrap();
    ra.asm.pblendvb(acc, defaults).unwrap();

    ra.release(blend_mask);
    ra.release(biased);
    ra.release(masked);
    ra.release(ctrl);
    ra.define_value(inst_ref, acc);
}

// ---------------------------------------------------------------------------
// Fallback path: defaults preload the result slot, tables are marshalled
// contiguously, and the lane loop runs out of line.
// ---------------------------------------------------------------------------

extern "C" fn fallback_table_lookup(
    result: *mut [u8; 16],
    indices: *const [u8; 16],
    tables: *const [u8; 16],
    num: usize,
) {
    unsafe {
        let tables = std::slice::from_raw_parts(tables, num);
        for i in 0..16 {
            let idx = (*indices)[i] as usize;
            if idx < num * 16 {
                (*result)[i] = tables[idx / 16][idx % 16];
            }
        }
    }
}

pub fn emit_vector_table_lookup(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let n = num_tables(inst);
    assert!((1..=4).contains(&n), "table lookup requires 1-4 tables, got {}", n);

    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let defaults = ra.use_xmm(&mut args[0]);
    let indices = ra.use_xmm(&mut args[1]);
    let mut tables = [None; 4];
    for (i, slot) in tables.iter_mut().enumerate().take(n) {
        *slot = Some(ra.use_xmm(&mut args[2 + i]));
    }

    ra.host_call(None, &mut [None, None, None, None]);

    let result = ra.with_stack_space((2 + n) * 16, |ra| {
        ra.asm.movaps(xmmword_ptr(rsp), defaults).unwrap();
        ra.asm.movaps(xmmword_ptr(rsp + 16), indices).unwrap();
        for (i, table) in tables.iter().enumerate().take(n) {
            ra.asm.movaps(xmmword_ptr(rsp + 32 + 16 * i as i32), table.unwrap()).unwrap();
        }

        ra.asm.lea(rdi, xmmword_ptr(rsp)).unwrap();
        ra.asm.lea(rsi, xmmword_ptr(rsp + 16)).unwrap();
        ra.asm.lea(rdx, xmmword_ptr(rsp + 32)).unwrap();
        ra.asm.mov(reg32_of(rcx), n as u32).unwrap();

        ra.asm.mov(rax, fallback_table_lookup as usize as u64).unwrap();
        ra.asm.call(rax).unwrap();

        let result = ra.scratch_xmm();
        ra.asm.movaps(result, xmmword_ptr(rsp)).unwrap();
        result
    });

    ra.define_value(inst_ref, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::opcode::Opcode;
    use crate::ir::value::Value;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_table_lookup_sse41;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_table_lookup;
    }

    #[test]
    fn test_num_tables_counts_trailing_voids() {
        let inst = Inst::new(
            Opcode::TableLookup,
            &[
                Value::Inst(InstRef(0)),
                Value::Inst(InstRef(1)),
                Value::Inst(InstRef(2)),
                Value::Inst(InstRef(3)),
                Value::Void,
                Value::Void,
            ],
        );
        assert_eq!(num_tables(&inst), 2);
    }

    #[test]
    fn test_fallback_in_range_and_default_lanes() {
        let mut result = [0xEEu8; 16]; // defaults preloaded by the caller
        let mut indices = [0u8; 16];
        indices[0] = 0;
        indices[1] = 17;
        indices[2] = 31;
        indices[3] = 32; // out of range for two tables
        let tables: [[u8; 16]; 2] = [
            std::array::from_fn(|i| i as u8),
            std::array::from_fn(|i| 0x40 + i as u8),
        ];
        fallback_table_lookup(&mut result, &indices, tables.as_ptr(), 2);
        assert_eq!(result[0], 0);
        assert_eq!(result[1], 0x41);
        assert_eq!(result[2], 0x4F);
        assert_eq!(result[3], 0xEE); // untouched default
    }

    #[test]
    fn test_fallback_single_table() {
        let mut result = [0u8; 16];
        let indices: [u8; 16] = std::array::from_fn(|i| 15 - i as u8);
        let tables: [[u8; 16]; 1] = [std::array::from_fn(|i| i as u8 * 2)];
        fallback_table_lookup(&mut result, &indices, tables.as_ptr(), 1);
        assert_eq!(result[0], 30);
        assert_eq!(result[15], 0);
    }
}
