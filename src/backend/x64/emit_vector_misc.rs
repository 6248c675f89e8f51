#![allow(clippy::missing_transmute_annotations, clippy::useless_transmute, unnecessary_transmutes)]

use iced_x86::code_asm::*;

use crate::backend::x64::emit_context::EmitContext;
use crate::backend::x64::emit_vector_helpers::*;
use crate::backend::x64::reg_alloc::RegAlloc;
use crate::ir::inst::Inst;
use crate::ir::value::InstRef;

// ---------------------------------------------------------------------------
// Population count.
// ---------------------------------------------------------------------------

pub fn emit_vector_population_count_bitalg(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_unary_op(ra, inst_ref, inst, |a, d, s| a.vpopcntb(d, s));
}

pub fn emit_vector_population_count_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let low = ra.use_scratch_xmm(&mut args[0]);
    let high = ra.scratch_xmm();
    let counts = ra.scratch_xmm();
    let mask = ra.scratch_xmm();

    // Nibble-indexed popcount table, applied to each half of every byte.
    load_const128(ra, mask, 0x0F0F_0F0F_0F0F_0F0F, 0x0F0F_0F0F_0F0F_0F0F);
    ra.asm.movdqa(high, low).unwrap();
    ra.asm.pand(low, mask).unwrap();
    ra.asm.psrlw(high, 4).unwrap();
    ra.asm.pand(high, mask).unwrap();
    load_const128(ra, counts, 0x0302_0201_0201_0100, 0x0403_0302_0302_0201);
    ra.asm.movdqa(mask, counts).unwrap();
    ra.asm.pshufb(counts, low).unwrap();
    ra.asm.pshufb(mask, high).unwrap();
    ra.asm.paddb(counts, mask).unwrap();

    ra.release(low);
    ra.release(high);
    ra.release(mask);
    ra.define_value(inst_ref, counts);
}

extern "C" fn fallback_population_count(result: *mut [u8; 16], a: *const [u8; 16]) {
    unsafe {
        let va: [u8; 16] = *a;
        let mut out = [0u8; 16];
        for i in 0..16 {
            out[i] = va[i].count_ones() as u8;
        }
        *result = out;
    }
}

pub fn emit_vector_population_count(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_population_count as usize);
}

// ---------------------------------------------------------------------------
// Count leading zeros.
// ---------------------------------------------------------------------------

pub fn emit_vector_count_leading_zeros8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let low = ra.use_scratch_xmm(&mut args[0]);
    let high = ra.scratch_xmm();
    let lzc_high = ra.scratch_xmm();
    let mask = ra.scratch_xmm();

    // Leading zeros of the high nibble; where the high nibble is zero, its
    // table entry is 8 so the low-nibble count (4..8) wins the pminub.
    load_const128(ra, mask, 0x0F0F_0F0F_0F0F_0F0F, 0x0F0F_0F0F_0F0F_0F0F);
    ra.asm.movdqa(high, low).unwrap();
    ra.asm.pand(low, mask).unwrap();
    ra.asm.psrlw(high, 4).unwrap();
    ra.asm.pand(high, mask).unwrap();
    load_const128(ra, lzc_high, 0x0101_0101_0202_0308, 0x0000_0000_0000_0000);
    ra.asm.pshufb(lzc_high, high).unwrap();
    load_const128(ra, mask, 0x0505_0505_0606_0708, 0x0404_0404_0404_0404);
    ra.asm.pshufb(mask, low).unwrap();
    ra.asm.pminub(lzc_high, mask).unwrap();

    ra.release(low);
    ra.release(high);
    ra.release(mask);
    ra.define_value(inst_ref, lzc_high);
}

extern "C" fn fallback_count_leading_zeros8(result: *mut [u8; 16], a: *const [u8; 16]) {
    unsafe {
        let va: [u8; 16] = *a;
        let mut out = [0u8; 16];
        for i in 0..16 {
            out[i] = va[i].leading_zeros() as u8;
        }
        *result = out;
    }
}

extern "C" fn fallback_count_leading_zeros16(result: *mut [u8; 16], a: *const [u8; 16]) {
    unsafe {
        let va: [u16; 8] = std::mem::transmute(*a);
        let mut out = [0u16; 8];
        for i in 0..8 {
            out[i] = va[i].leading_zeros() as u16;
        }
        *result = std::mem::transmute(out);
    }
}

extern "C" fn fallback_count_leading_zeros32(result: *mut [u8; 16], a: *const [u8; 16]) {
    unsafe {
        let va: [u32; 4] = std::mem::transmute(*a);
        let mut out = [0u32; 4];
        for i in 0..4 {
            out[i] = va[i].leading_zeros();
        }
        *result = std::mem::transmute(out);
    }
}

pub fn emit_vector_count_leading_zeros8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_count_leading_zeros8 as usize);
}
pub fn emit_vector_count_leading_zeros16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_count_leading_zeros16 as usize);
}
pub fn emit_vector_count_leading_zeros32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_count_leading_zeros32 as usize);
}

// ---------------------------------------------------------------------------
// Bit reversal within each byte.
// ---------------------------------------------------------------------------

pub fn emit_vector_reverse_bits_gfni(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let matrix = ra.scratch_xmm();
    // The anti-diagonal bit matrix permutes bit i to bit 7-i.
    load_const128(ra, matrix, 0x8040_2010_0804_0201, 0x8040_2010_0804_0201);
    ra.asm.gf2p8affineqb(result, matrix, 0).unwrap();
    ra.release(matrix);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_reverse_bits_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let low = ra.use_scratch_xmm(&mut args[0]);
    let high = ra.scratch_xmm();
    let rev_high = ra.scratch_xmm();
    let mask = ra.scratch_xmm();

    // Nibble-reversal tables; the low-nibble table is pre-shifted left by 4.
    load_const128(ra, mask, 0x0F0F_0F0F_0F0F_0F0F, 0x0F0F_0F0F_0F0F_0F0F);
    ra.asm.movdqa(high, low).unwrap();
    ra.asm.pand(low, mask).unwrap();
    ra.asm.psrlw(high, 4).unwrap();
    ra.asm.pand(high, mask).unwrap();
    load_const128(ra, rev_high, 0x0E06_0A02_0C04_0800, 0x0F07_0B03_0D05_0901);
    ra.asm.pshufb(rev_high, high).unwrap();
    load_const128(ra, mask, 0xE060_A020_C040_8000, 0xF070_B030_D050_9010);
    ra.asm.pshufb(mask, low).unwrap();
    ra.asm.por(rev_high, mask).unwrap();

    ra.release(low);
    ra.release(high);
    ra.release(mask);
    ra.define_value(inst_ref, rev_high);
}

extern "C" fn fallback_reverse_bits(result: *mut [u8; 16], a: *const [u8; 16]) {
    unsafe {
        let va: [u8; 16] = *a;
        let mut out = [0u8; 16];
        for i in 0..16 {
            out[i] = va[i].reverse_bits();
        }
        *result = out;
    }
}

pub fn emit_vector_reverse_bits(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_bits as usize);
}

// ---------------------------------------------------------------------------
// Element reversal within fixed-size groups.
// ---------------------------------------------------------------------------

fn emit_reverse_shuffle(ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst, ctl_lo: u64, ctl_hi: u64) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let control = ra.scratch_xmm();
    load_const128(ra, control, ctl_lo, ctl_hi);
    ra.asm.pshufb(result, control).unwrap();
    ra.release(control);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_reverse_elements_in_half_groups8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_reverse_shuffle(ra, inst_ref, inst, 0x0607_0405_0203_0001, 0x0E0F_0C0D_0A0B_0809);
}
pub fn emit_vector_reverse_elements_in_word_groups8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_reverse_shuffle(ra, inst_ref, inst, 0x0405_0607_0001_0203, 0x0C0D_0E0F_0809_0A0B);
}
pub fn emit_vector_reverse_elements_in_word_groups16_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_reverse_shuffle(ra, inst_ref, inst, 0x0504_0706_0100_0302, 0x0D0C_0F0E_0908_0B0A);
}
pub fn emit_vector_reverse_elements_in_long_groups8_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_reverse_shuffle(ra, inst_ref, inst, 0x0001_0203_0405_0607, 0x0809_0A0B_0C0D_0E0F);
}
pub fn emit_vector_reverse_elements_in_long_groups16_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_reverse_shuffle(ra, inst_ref, inst, 0x0100_0302_0504_0706, 0x0908_0B0A_0D0C_0F0E);
}
pub fn emit_vector_reverse_elements_in_long_groups32_ssse3(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_reverse_shuffle(ra, inst_ref, inst, 0x0302_0100_0706_0504, 0x0B0A_0908_0F0E_0D0C);
}

macro_rules! define_reverse_elements {
    ($name:ident, $ty:ty, $count:expr, $xor:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = va[i ^ $xor];
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_reverse_elements!(fallback_reverse_half_groups8, u8, 16, 1);
define_reverse_elements!(fallback_reverse_word_groups8, u8, 16, 3);
define_reverse_elements!(fallback_reverse_word_groups16, u16, 8, 1);
define_reverse_elements!(fallback_reverse_long_groups8, u8, 16, 7);
define_reverse_elements!(fallback_reverse_long_groups16, u16, 8, 3);
define_reverse_elements!(fallback_reverse_long_groups32, u32, 4, 1);

pub fn emit_vector_reverse_elements_in_half_groups8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_half_groups8 as usize);
}
pub fn emit_vector_reverse_elements_in_word_groups8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_word_groups8 as usize);
}
pub fn emit_vector_reverse_elements_in_word_groups16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_word_groups16 as usize);
}
pub fn emit_vector_reverse_elements_in_long_groups8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_long_groups8 as usize);
}
pub fn emit_vector_reverse_elements_in_long_groups16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_long_groups16 as usize);
}
pub fn emit_vector_reverse_elements_in_long_groups32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_one_arg_fallback(ra, inst_ref, inst, fallback_reverse_long_groups32 as usize);
}

// ---------------------------------------------------------------------------
// Halving add/sub: (a op b) >> 1 computed without losing the carry bit.
// ---------------------------------------------------------------------------

macro_rules! define_halving_add {
    ($name:ident, $ty:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = (va[i] & vb[i]).wrapping_add((va[i] ^ vb[i]) >> 1);
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_halving_add!(fallback_halving_add_s8, i8, 16);
define_halving_add!(fallback_halving_add_s16, i16, 8);
define_halving_add!(fallback_halving_add_s32, i32, 4);
define_halving_add!(fallback_halving_add_u8, u8, 16);
define_halving_add!(fallback_halving_add_u16, u16, 8);
define_halving_add!(fallback_halving_add_u32, u32, 4);

macro_rules! define_halving_sub {
    ($name:ident, $ty:ty, $wide:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = ((va[i] as $wide - vb[i] as $wide) >> 1) as $ty;
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_halving_sub!(fallback_halving_sub_s8, i8, i16, 16);
define_halving_sub!(fallback_halving_sub_s16, i16, i32, 8);
define_halving_sub!(fallback_halving_sub_s32, i32, i64, 4);
define_halving_sub!(fallback_halving_sub_u8, u8, i16, 16);
define_halving_sub!(fallback_halving_sub_u16, u16, i32, 8);
define_halving_sub!(fallback_halving_sub_u32, u32, i64, 4);

pub fn emit_vector_halving_add_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_add_s8 as usize);
}
pub fn emit_vector_halving_add_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_add_s16 as usize);
}
pub fn emit_vector_halving_add_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_add_s32 as usize);
}
pub fn emit_vector_halving_add_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_add_u8 as usize);
}
pub fn emit_vector_halving_add_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_add_u16 as usize);
}
pub fn emit_vector_halving_add_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_add_u32 as usize);
}
pub fn emit_vector_halving_sub_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_sub_s8 as usize);
}
pub fn emit_vector_halving_sub_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_sub_s16 as usize);
}
pub fn emit_vector_halving_sub_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_sub_s32 as usize);
}
pub fn emit_vector_halving_sub_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_sub_u8 as usize);
}
pub fn emit_vector_halving_sub_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_sub_u16 as usize);
}
pub fn emit_vector_halving_sub_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_halving_sub_u32 as usize);
}

// ---------------------------------------------------------------------------
// Rounding halving add: (a + b + 1) >> 1.
// ---------------------------------------------------------------------------

pub fn emit_vector_rounding_halving_add_unsigned8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pavgb(d, s));
}
pub fn emit_vector_rounding_halving_add_unsigned16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_vector_op(ra, inst_ref, inst, |a, d, s| a.pavgw(d, s));
}

fn emit_rounding_halving_add_signed(
    ra: &mut RegAlloc,
    inst_ref: InstRef,
    inst: &Inst,
    splat: u64,
    avg: BinOp,
) {
    let mut args = ra.get_argument_info(inst_ref, &inst.args, inst.num_args());
    let result = ra.use_scratch_xmm(&mut args[0]);
    let b = ra.use_scratch_xmm(&mut args[1]);
    let bias = ra.scratch_xmm();
    // pavg is unsigned; biasing both operands by the sign bit makes the
    // average order-preserving for signed lanes, and the bias survives it.
    load_const128(ra, bias, splat, splat);
    ra.asm.pxor(result, bias).unwrap();
    ra.asm.pxor(b, bias).unwrap();
    avg(ra.asm, result, b).unwrap();
    ra.asm.pxor(result, bias).unwrap();
    ra.release(bias);
    ra.release(b);
    ra.define_value(inst_ref, result);
}

pub fn emit_vector_rounding_halving_add_signed8(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_rounding_halving_add_signed(ra, inst_ref, inst, 0x8080_8080_8080_8080, |a, d, s| a.pavgb(d, s));
}
pub fn emit_vector_rounding_halving_add_signed16(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_rounding_halving_add_signed(ra, inst_ref, inst, 0x8000_8000_8000_8000, |a, d, s| a.pavgw(d, s));
}

macro_rules! define_rounding_halving_add {
    ($name:ident, $ty:ty, $wide:ty, $count:expr) => {
        extern "C" fn $name(result: *mut [u8; 16], a: *const [u8; 16], b: *const [u8; 16]) {
            unsafe {
                let va: [$ty; $count] = std::mem::transmute(*a);
                let vb: [$ty; $count] = std::mem::transmute(*b);
                let mut out = [0 as $ty; $count];
                for i in 0..$count {
                    out[i] = ((va[i] as $wide + vb[i] as $wide + 1) >> 1) as $ty;
                }
                *result = std::mem::transmute(out);
            }
        }
    };
}

define_rounding_halving_add!(fallback_rounding_halving_add_s32, i32, i64, 4);
define_rounding_halving_add!(fallback_rounding_halving_add_u32, u32, u64, 4);

pub fn emit_vector_rounding_halving_add_signed32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_halving_add_s32 as usize);
}
pub fn emit_vector_rounding_halving_add_unsigned32(_ctx: &EmitContext, ra: &mut RegAlloc, inst_ref: InstRef, inst: &Inst) {
    emit_two_arg_fallback(ra, inst_ref, inst, fallback_rounding_halving_add_u32 as usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signatures() {
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_population_count_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_count_leading_zeros8_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_reverse_bits_gfni;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_reverse_elements_in_long_groups32_ssse3;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_halving_sub_unsigned32;
        let _: fn(&EmitContext, &mut RegAlloc, InstRef, &Inst) = emit_vector_rounding_halving_add_signed8;
    }

    #[test]
    fn test_fallback_population_count() {
        let mut a = [0u8; 16];
        a[0] = 0xFF;
        a[1] = 0x00;
        a[2] = 0xA5;
        let mut result = [0u8; 16];
        fallback_population_count(&mut result, &a);
        assert_eq!(result[0], 8);
        assert_eq!(result[1], 0);
        assert_eq!(result[2], 4);
    }

    #[test]
    fn test_fallback_count_leading_zeros() {
        let mut a = [0u8; 16];
        a[0] = 0x00;
        a[1] = 0x01;
        a[2] = 0x80;
        let mut result = [0u8; 16];
        fallback_count_leading_zeros8(&mut result, &a);
        assert_eq!(result[0], 8);
        assert_eq!(result[1], 7);
        assert_eq!(result[2], 0);
    }

    #[test]
    fn test_fallback_reverse_bits() {
        let mut a = [0u8; 16];
        a[0] = 0b1000_0000;
        a[1] = 0b1100_0101;
        let mut result = [0u8; 16];
        fallback_reverse_bits(&mut result, &a);
        assert_eq!(result[0], 0b0000_0001);
        assert_eq!(result[1], 0b1010_0011);
    }

    #[test]
    fn test_fallback_reverse_elements() {
        let a: [u8; 16] = std::array::from_fn(|i| i as u8);
        let mut result = [0u8; 16];
        fallback_reverse_long_groups8(&mut result, &a);
        assert_eq!(&result[..8], &[7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(&result[8..], &[15, 14, 13, 12, 11, 10, 9, 8]);
    }

    #[test]
    fn test_fallback_halving_add_no_intermediate_overflow() {
        let a: [u8; 16] = [0xFF; 16];
        let b: [u8; 16] = [0xFD; 16];
        let mut result = [0u8; 16];
        fallback_halving_add_u8(&mut result, &a, &b);
        assert_eq!(result[0], 0xFE);
    }

    #[test]
    fn test_fallback_halving_sub_signed() {
        let a: [u8; 16] = unsafe { std::mem::transmute([-100i32, 50, i32::MIN, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([100i32, -50, i32::MAX, 0]) };
        let mut result = [0u8; 16];
        fallback_halving_sub_s32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], -100);
        assert_eq!(out[1], 50);
        assert_eq!(out[2], (((i32::MIN as i64) - (i32::MAX as i64)) >> 1) as i32);
    }

    #[test]
    fn test_fallback_rounding_halving_add() {
        let a: [u8; 16] = unsafe { std::mem::transmute([1i32, -1, i32::MAX, 0]) };
        let b: [u8; 16] = unsafe { std::mem::transmute([2i32, -2, i32::MAX, 0]) };
        let mut result = [0u8; 16];
        fallback_rounding_halving_add_s32(&mut result, &a, &b);
        let out: [i32; 4] = unsafe { std::mem::transmute(result) };
        assert_eq!(out[0], 2);
        assert_eq!(out[1], -1);
        assert_eq!(out[2], i32::MAX);
    }
}
