// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::interrupt::Msip;

/// Addresses and bit patterns a target supplies to the primitives.
///
/// The defaults match the common CLINT layout used by riscv-arch-test
/// targets. A platform with the software interrupt register elsewhere
/// builds its own value instead of editing the primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Machine software interrupt pending register (32 bits wide).
    pub msip_addr: usize,
    /// Pattern written to `msip_addr` to assert the interrupt.
    pub msip_set: u32,
    /// Initial value of every reserved signature word.
    pub signature_fill: u32,
}

impl PlatformConfig {
    pub const DEFAULT: Self = Self {
        msip_addr: 0x0200_0000,
        msip_set: Msip::PENDING.bits(),
        signature_fill: 0,
    };

    pub const fn with_msip_addr(self, msip_addr: usize) -> Self {
        Self { msip_addr, ..self }
    }

    pub const fn with_signature_fill(self, signature_fill: u32) -> Self {
        Self {
            signature_fill,
            ..self
        }
    }
}

/// A target platform, fixed at compile time.
///
/// The target-side primitives and `signature_region!` are generic over this,
/// so moving MSIP or changing the fill value is a new impl in the test
/// program rather than an edit here.
pub trait Platform {
    const CONFIG: PlatformConfig;
}

/// The conventional CLINT layout, [`PlatformConfig::DEFAULT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlatform;

impl Platform for DefaultPlatform {
    const CONFIG: PlatformConfig = PlatformConfig::DEFAULT;
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_clint_convention() {
        let cfg = PlatformConfig::default();
        assert_eq!(cfg.msip_addr, 0x200_0000);
        assert_eq!(cfg.msip_set, 1);
        assert_eq!(cfg.signature_fill, 0);
    }

    #[test]
    fn test_override_keeps_other_fields() {
        let cfg = PlatformConfig::DEFAULT.with_msip_addr(0x0c00_0000);
        assert_eq!(cfg.msip_addr, 0x0c00_0000);
        assert_eq!(cfg.msip_set, PlatformConfig::DEFAULT.msip_set);
    }

    struct Board;

    impl Platform for Board {
        const CONFIG: PlatformConfig = PlatformConfig::DEFAULT
            .with_msip_addr(0x0c00_0000)
            .with_signature_fill(0xdead_beef);
    }

    #[test]
    fn test_platform_impls() {
        assert_eq!(DefaultPlatform::CONFIG, PlatformConfig::DEFAULT);
        assert_eq!(Board::CONFIG.msip_addr, 0x0c00_0000);
        assert_eq!(Board::CONFIG.signature_fill, 0xdead_beef);
        assert_eq!(Board::CONFIG.msip_set, 1);
    }
}
