use bitflags::bitflags;

bitflags! {
    /// Host instruction-set extensions relevant to vector lowering.
    ///
    /// Detected once per process and treated as immutable afterwards.
    /// An empty set is the SSE2 baseline every x86-64 host guarantees.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HostCaps: u32 {
        const SSSE3         = 1 << 0;
        const SSE41         = 1 << 1;
        const SSE42         = 1 << 2;
        const AVX           = 1 << 3;
        const AVX2          = 1 << 4;
        /// AVX-512 F + VL + DQ + BW together (the orthogonal 128-bit EVEX set).
        const AVX512_ORTHO  = 1 << 5;
        const AVX512_BITALG = 1 << 6;
        const PCLMULQDQ     = 1 << 7;
        const GFNI          = 1 << 8;
    }
}

impl HostCaps {
    /// Detect the capabilities of the running host.
    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Self {
        let mut caps = HostCaps::empty();
        if std::arch::is_x86_feature_detected!("ssse3") {
            caps |= HostCaps::SSSE3;
        }
        if std::arch::is_x86_feature_detected!("sse4.1") {
            caps |= HostCaps::SSE41;
        }
        if std::arch::is_x86_feature_detected!("sse4.2") {
            caps |= HostCaps::SSE42;
        }
        if std::arch::is_x86_feature_detected!("avx") {
            caps |= HostCaps::AVX;
        }
        if std::arch::is_x86_feature_detected!("avx2") {
            caps |= HostCaps::AVX2;
        }
        if std::arch::is_x86_feature_detected!("avx512f")
            && std::arch::is_x86_feature_detected!("avx512vl")
            && std::arch::is_x86_feature_detected!("avx512dq")
            && std::arch::is_x86_feature_detected!("avx512bw")
        {
            caps |= HostCaps::AVX512_ORTHO;
        }
        if std::arch::is_x86_feature_detected!("avx512bitalg")
            && std::arch::is_x86_feature_detected!("avx512vl")
        {
            caps |= HostCaps::AVX512_BITALG;
        }
        if std::arch::is_x86_feature_detected!("pclmulqdq") {
            caps |= HostCaps::PCLMULQDQ;
        }
        if std::arch::is_x86_feature_detected!("gfni") {
            caps |= HostCaps::GFNI;
        }
        caps
    }

    #[cfg(not(target_arch = "x86_64"))]
    pub fn detect() -> Self {
        HostCaps::empty()
    }

    /// True when every capability in `required` is present.
    /// An empty requirement is always satisfied (the baseline strategy).
    pub fn supports(self, required: HostCaps) -> bool {
        self.contains(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_requirement_always_satisfied() {
        assert!(HostCaps::empty().supports(HostCaps::empty()));
        assert!(HostCaps::SSSE3.supports(HostCaps::empty()));
    }

    #[test]
    fn test_supports_is_subset_check() {
        let caps = HostCaps::SSSE3 | HostCaps::SSE41;
        assert!(caps.supports(HostCaps::SSSE3));
        assert!(caps.supports(HostCaps::SSSE3 | HostCaps::SSE41));
        assert!(!caps.supports(HostCaps::AVX2));
        assert!(!caps.supports(HostCaps::SSE41 | HostCaps::SSE42));
    }

    #[test]
    fn test_detect_is_stable() {
        // Immutable for the process lifetime: two detections agree.
        assert_eq!(HostCaps::detect(), HostCaps::detect());
    }
}
