/// Emulated-CPU state block visible to generated code.
///
/// R15 points to this struct while generated code executes.
/// Fields are laid out for efficient access from x86-64 addressing modes.
#[repr(C, align(16))]
pub struct VmState {
    /// Vector registers (v0-v31 as 64 × u64 = 32 × 128-bit).
    pub vec: [u64; 64],
    /// Sticky saturation flag (QC). Generated code only ever ORs into it;
    /// it is initialized and read by the surrounding runtime.
    pub fpsr_qc: u32,
    _pad: [u32; 3],
}

impl VmState {
    /// Create a new zeroed state.
    pub fn new() -> Self {
        Self {
            vec: [0; 64],
            fpsr_qc: 0,
            _pad: [0; 3],
        }
    }

    /// Byte offset of a 128-bit vector register from the struct base.
    pub const fn offset_of_vec(index: usize) -> usize {
        core::mem::offset_of!(VmState, vec) + index * 16
    }

    /// Byte offset of the sticky saturation flag from the struct base.
    pub const fn offset_of_fpsr_qc() -> usize {
        core::mem::offset_of!(VmState, fpsr_qc)
    }

    /// Read a 128-bit vector register as two u64 halves.
    pub fn get_vector(&self, index: usize) -> [u64; 2] {
        [self.vec[index * 2], self.vec[index * 2 + 1]]
    }

    /// Write a 128-bit vector register from two u64 halves.
    pub fn set_vector(&mut self, index: usize, value: [u64; 2]) {
        self.vec[index * 2] = value[0];
        self.vec[index * 2 + 1] = value[1];
    }
}

impl Default for VmState {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(
    core::mem::size_of::<VmState>() % 16 == 0,
    "VmState must stay 16-byte aligned in size"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_accessors() {
        let mut state = VmState::new();
        state.set_vector(3, [0x1122_3344_5566_7788, 0x99AA_BBCC_DDEE_FF00]);
        assert_eq!(state.get_vector(3), [0x1122_3344_5566_7788, 0x99AA_BBCC_DDEE_FF00]);
        assert_eq!(state.get_vector(2), [0, 0]);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(VmState::offset_of_vec(1) - VmState::offset_of_vec(0), 16);
        // QC sits right after the vector file.
        assert_eq!(VmState::offset_of_fpsr_qc(), 64 * 8);
    }
}
