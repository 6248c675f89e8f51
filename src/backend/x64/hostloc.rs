use iced_x86::code_asm::*;
use iced_x86::Register;

/// Host location: abstracts GPRs, XMM registers, and spill slots
/// for the register allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostLoc {
    // General-purpose registers (0-15)
    Gpr(u8),
    // XMM registers (0-15)
    Xmm(u8),
    // Spill slot index
    Spill(u8),
}

impl HostLoc {
    pub fn is_gpr(self) -> bool { matches!(self, HostLoc::Gpr(_)) }
    pub fn is_xmm(self) -> bool { matches!(self, HostLoc::Xmm(_)) }
    pub fn is_register(self) -> bool { self.is_gpr() || self.is_xmm() }
    pub fn is_spill(self) -> bool { matches!(self, HostLoc::Spill(_)) }

    /// Bit width of the location (64 for GPR, 128 for XMM/spill).
    pub fn bit_width(self) -> usize {
        match self {
            HostLoc::Gpr(_) => 64,
            HostLoc::Xmm(_) => 128,
            HostLoc::Spill(_) => 128,
        }
    }

    /// Get the GPR index.
    pub fn gpr_index(self) -> u8 {
        match self {
            HostLoc::Gpr(i) => i,
            _ => panic!("gpr_index called on non-GPR HostLoc"),
        }
    }

    /// Get the XMM index.
    pub fn xmm_index(self) -> u8 {
        match self {
            HostLoc::Xmm(i) => i,
            _ => panic!("xmm_index called on non-XMM HostLoc"),
        }
    }

    /// Convert to a 64-bit assembler register.
    pub fn to_reg64(self) -> AsmRegister64 {
        match self {
            HostLoc::Gpr(i) => gpr64(i),
            _ => panic!("to_reg64 called on non-GPR HostLoc"),
        }
    }

    /// Convert to an assembler XMM register.
    pub fn to_xmm(self) -> AsmRegisterXmm {
        match self {
            HostLoc::Xmm(i) => xmm(i),
            _ => panic!("to_xmm called on non-XMM HostLoc"),
        }
    }
}

impl From<AsmRegister64> for HostLoc {
    fn from(reg: AsmRegister64) -> Self {
        HostLoc::Gpr(Register::from(reg).number() as u8)
    }
}

impl From<AsmRegisterXmm> for HostLoc {
    fn from(reg: AsmRegisterXmm) -> Self {
        HostLoc::Xmm(Register::from(reg).number() as u8)
    }
}

/// 64-bit GPR by index (0-15).
pub fn gpr64(idx: u8) -> AsmRegister64 {
    const TABLE: [AsmRegister64; 16] = [
        rax, rcx, rdx, rbx, rsp, rbp, rsi, rdi,
        r8, r9, r10, r11, r12, r13, r14, r15,
    ];
    TABLE[idx as usize]
}

/// 32-bit GPR by index (0-15).
pub fn gpr32(idx: u8) -> AsmRegister32 {
    const TABLE: [AsmRegister32; 16] = [
        eax, ecx, edx, ebx, esp, ebp, esi, edi,
        r8d, r9d, r10d, r11d, r12d, r13d, r14d, r15d,
    ];
    TABLE[idx as usize]
}

/// 16-bit GPR by index (0-15).
pub fn gpr16(idx: u8) -> AsmRegister16 {
    const TABLE: [AsmRegister16; 16] = [
        ax, cx, dx, bx, sp, bp, si, di,
        r8w, r9w, r10w, r11w, r12w, r13w, r14w, r15w,
    ];
    TABLE[idx as usize]
}

/// 8-bit GPR by index (0-15), REX low-byte forms.
pub fn gpr8(idx: u8) -> AsmRegister8 {
    const TABLE: [AsmRegister8; 16] = [
        al, cl, dl, bl, spl, bpl, sil, dil,
        r8b, r9b, r10b, r11b, r12b, r13b, r14b, r15b,
    ];
    TABLE[idx as usize]
}

/// XMM register by index (0-15).
pub fn xmm(idx: u8) -> AsmRegisterXmm {
    const TABLE: [AsmRegisterXmm; 16] = [
        xmm0, xmm1, xmm2, xmm3, xmm4, xmm5, xmm6, xmm7,
        xmm8, xmm9, xmm10, xmm11, xmm12, xmm13, xmm14, xmm15,
    ];
    TABLE[idx as usize]
}

/// 32-bit view of a 64-bit register.
pub fn reg32_of(reg: AsmRegister64) -> AsmRegister32 {
    gpr32(Register::from(reg).number() as u8)
}

/// 16-bit view of a 64-bit register.
pub fn reg16_of(reg: AsmRegister64) -> AsmRegister16 {
    gpr16(Register::from(reg).number() as u8)
}

/// 8-bit view of a 64-bit register.
pub fn reg8_of(reg: AsmRegister64) -> AsmRegister8 {
    gpr8(Register::from(reg).number() as u8)
}

// Named GPR HostLoc constants
pub const HOST_RAX: HostLoc = HostLoc::Gpr(0);
pub const HOST_RCX: HostLoc = HostLoc::Gpr(1);
pub const HOST_RDX: HostLoc = HostLoc::Gpr(2);
pub const HOST_RBX: HostLoc = HostLoc::Gpr(3);
pub const HOST_RSP: HostLoc = HostLoc::Gpr(4);
pub const HOST_RBP: HostLoc = HostLoc::Gpr(5);
pub const HOST_RSI: HostLoc = HostLoc::Gpr(6);
pub const HOST_RDI: HostLoc = HostLoc::Gpr(7);
pub const HOST_R8:  HostLoc = HostLoc::Gpr(8);
pub const HOST_R9:  HostLoc = HostLoc::Gpr(9);
pub const HOST_R10: HostLoc = HostLoc::Gpr(10);
pub const HOST_R11: HostLoc = HostLoc::Gpr(11);
pub const HOST_R12: HostLoc = HostLoc::Gpr(12);
pub const HOST_R13: HostLoc = HostLoc::Gpr(13);
pub const HOST_R14: HostLoc = HostLoc::Gpr(14);
pub const HOST_R15: HostLoc = HostLoc::Gpr(15);

/// Available GPRs for register allocation.
/// Excludes RSP (stack pointer) and R15 (reserved for the VmState pointer).
pub const ANY_GPR: &[HostLoc] = &[
    HOST_RAX, HOST_RBX, HOST_RCX, HOST_RDX,
    HOST_RSI, HOST_RDI, HOST_RBP,
    HOST_R8, HOST_R9, HOST_R10, HOST_R11,
    HOST_R12, HOST_R13, HOST_R14,
];

/// Available XMM registers for register allocation.
/// Excludes XMM0 (reserved as scratch/implicit blend operand).
pub const ANY_XMM: &[HostLoc] = &[
    HostLoc::Xmm(1),  HostLoc::Xmm(2),  HostLoc::Xmm(3),
    HostLoc::Xmm(4),  HostLoc::Xmm(5),  HostLoc::Xmm(6),
    HostLoc::Xmm(7),  HostLoc::Xmm(8),  HostLoc::Xmm(9),
    HostLoc::Xmm(10), HostLoc::Xmm(11), HostLoc::Xmm(12),
    HostLoc::Xmm(13), HostLoc::Xmm(14), HostLoc::Xmm(15),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostloc_classification() {
        assert!(HOST_RAX.is_gpr());
        assert!(!HOST_RAX.is_xmm());
        assert!(HOST_RAX.is_register());

        let xmm1_loc = HostLoc::Xmm(1);
        assert!(!xmm1_loc.is_gpr());
        assert!(xmm1_loc.is_xmm());
        assert!(xmm1_loc.is_register());

        let spill0 = HostLoc::Spill(0);
        assert!(!spill0.is_register());
        assert!(spill0.is_spill());
    }

    #[test]
    fn test_register_round_trip() {
        for i in 0..16u8 {
            assert_eq!(HostLoc::from(gpr64(i)), HostLoc::Gpr(i));
            assert_eq!(HostLoc::from(xmm(i)), HostLoc::Xmm(i));
        }
    }

    #[test]
    fn test_any_gpr_excludes_rsp_r15() {
        assert!(!ANY_GPR.contains(&HOST_RSP));
        assert!(!ANY_GPR.contains(&HOST_R15));
        assert_eq!(ANY_GPR.len(), 14);
    }

    #[test]
    fn test_any_xmm_excludes_xmm0() {
        assert!(!ANY_XMM.contains(&HostLoc::Xmm(0)));
        assert_eq!(ANY_XMM.len(), 15);
    }

    #[test]
    fn test_bit_width() {
        assert_eq!(HOST_RAX.bit_width(), 64);
        assert_eq!(HostLoc::Xmm(0).bit_width(), 128);
        assert_eq!(HostLoc::Spill(0).bit_width(), 128);
    }
}
