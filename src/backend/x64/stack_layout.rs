/// Number of 128-bit spill slots for register allocation.
pub const SPILL_COUNT: usize = 64;

/// Stack frame layout reserved below generated code's frame.
///
/// This structure lives on the x86-64 stack while generated code runs.
/// Must be 16-byte aligned for XMM spill stores.
#[repr(C, align(16))]
pub struct StackLayout {
    /// Spill area for register allocation (64 × 128-bit = 1024 bytes).
    pub spill: [[u64; 2]; SPILL_COUNT],
}

impl StackLayout {
    /// Byte offset of a spill slot from the base of StackLayout.
    pub const fn spill_offset(index: usize) -> usize {
        core::mem::offset_of!(StackLayout, spill) + index * 16
    }
}

const _: () = assert!(
    core::mem::size_of::<StackLayout>() % 16 == 0,
    "StackLayout must be 16-byte aligned in size"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_layout_alignment() {
        assert_eq!(core::mem::align_of::<StackLayout>(), 16);
        assert_eq!(core::mem::size_of::<StackLayout>() % 16, 0);
    }

    #[test]
    fn test_spill_offset() {
        let offset0 = StackLayout::spill_offset(0);
        let offset1 = StackLayout::spill_offset(1);
        assert_eq!(offset1 - offset0, 16); // each spill slot is 128 bits
    }
}
