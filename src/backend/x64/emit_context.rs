use iced_x86::code_asm::*;
use iced_x86::IcedError;

use crate::backend::x64::hostcaps::HostCaps;
use crate::backend::x64::vm_state::VmState;

/// Descriptor for the sticky saturation flag's backing storage.
///
/// Saturating emitters OR through this; nothing in the engine ever reads or
/// clears the flag. The owning context injects the descriptor so emitters
/// never reach into fixed global state.
#[derive(Debug, Clone, Copy)]
pub struct SatSink {
    /// Register holding the state-block base pointer in generated code.
    pub base: AsmRegister64,
    /// Byte offset of the flag within the state block.
    pub offset: i32,
}

impl SatSink {
    /// The default sink: `VmState::fpsr_qc` behind R15.
    pub fn vm_qc() -> Self {
        Self {
            base: r15,
            offset: VmState::offset_of_fpsr_qc() as i32,
        }
    }

    /// OR a single byte-sized condition into the flag.
    pub fn or_byte(&self, asm: &mut CodeAssembler, flag: AsmRegister8) -> Result<(), IcedError> {
        asm.or(byte_ptr(self.base + self.offset), flag)
    }

    /// OR a 32-bit condition word into the flag.
    pub fn or_dword(&self, asm: &mut CodeAssembler, flag: AsmRegister32) -> Result<(), IcedError> {
        asm.or(dword_ptr(self.base + self.offset), flag)
    }
}

/// Per-emission context.
///
/// Carries the immutable host capability set consulted by strategy selection
/// and the sticky saturation sink used by saturating emitters.
pub struct EmitContext {
    /// Host capability tier, detected once, never mutated.
    pub caps: HostCaps,
    /// Sticky saturation flag descriptor.
    pub sat: SatSink,
}

impl EmitContext {
    pub fn new(caps: HostCaps) -> Self {
        Self {
            caps,
            sat: SatSink::vm_qc(),
        }
    }

    /// Context for the running host.
    pub fn for_host() -> Self {
        Self::new(HostCaps::detect())
    }

    pub fn with_sat_sink(caps: HostCaps, sat: SatSink) -> Self {
        Self { caps, sat }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sink_targets_qc() {
        let sink = SatSink::vm_qc();
        assert_eq!(sink.offset as usize, VmState::offset_of_fpsr_qc());
    }

    #[test]
    fn test_context_carries_caps() {
        let ctx = EmitContext::new(HostCaps::SSSE3 | HostCaps::SSE41);
        assert!(ctx.caps.supports(HostCaps::SSSE3));
        assert!(!ctx.caps.supports(HostCaps::AVX2));
    }

    #[test]
    fn test_sink_emits_or() {
        let mut asm = CodeAssembler::new(64).unwrap();
        let sink = SatSink::vm_qc();
        sink.or_byte(&mut asm, al).unwrap();
        sink.or_dword(&mut asm, eax).unwrap();
        assert_eq!(asm.instructions().len(), 2);
    }
}
