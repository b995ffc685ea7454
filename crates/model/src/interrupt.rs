// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Interrupt control primitives.
//!
//! Only the machine software interrupt has a defined sequence: a 32-bit
//! store to the MSIP register. Timer and external interrupt clearing are
//! no-ops unless a target overrides them.
//!
//! The ordering of an MSIP store against a trap already in flight from an
//! earlier assertion is platform-defined. These primitives issue a plain
//! volatile store with no fence.

use crate::platform::{Platform, PlatformConfig};
use bitflags::bitflags;

bitflags! {
    /// Machine software interrupt pending register.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct Msip: u32 {
        const PENDING = 1 << 0;
    }
}

/// 32-bit register access at absolute addresses.
pub trait Mmio {
    fn read_u32(&mut self, addr: usize) -> u32;
    fn write_u32(&mut self, addr: usize, value: u32);
}

/// Direct volatile access to physical addresses.
#[derive(Debug)]
pub struct Volatile {
    _private: (),
}

impl Volatile {
    /// # Safety
    ///
    /// Every address later passed through this handle must be a mapped,
    /// 4-byte aligned register that tolerates 32-bit volatile access.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Mmio for Volatile {
    fn read_u32(&mut self, addr: usize) -> u32 {
        // SAFETY: guaranteed by the contract of `Volatile::new`.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    fn write_u32(&mut self, addr: usize, value: u32) {
        // SAFETY: guaranteed by the contract of `Volatile::new`.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

/// The interrupt primitive surface a trap test programs against.
///
/// A target with real timer or external interrupt sources overrides
/// `clear_mtimer_int` and `clear_mext_int`; everyone else keeps the no-ops.
pub trait InterruptControl {
    /// Asserts the machine software interrupt. The trap itself is taken
    /// whenever the architecture says so, not necessarily before return.
    fn set_msw_int(&mut self);

    /// Deasserts the machine software interrupt. A trap already taken is
    /// not undone.
    fn clear_msw_int(&mut self);

    fn clear_mtimer_int(&mut self) {}

    fn clear_mext_int(&mut self) {}
}

/// Software interrupt control through a CLINT-style MSIP register.
#[derive(Debug)]
pub struct Clint<M> {
    mmio: M,
    config: PlatformConfig,
}

impl<M: Mmio> Clint<M> {
    pub const fn new(mmio: M, config: PlatformConfig) -> Self {
        Self { mmio, config }
    }

    pub const fn for_platform<P: Platform>(mmio: M) -> Self {
        Self::new(mmio, P::CONFIG)
    }

    /// Current contents of the MSIP register.
    pub fn msip(&mut self) -> Msip {
        Msip::from_bits_retain(self.mmio.read_u32(self.config.msip_addr))
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn into_inner(self) -> M {
        self.mmio
    }
}

impl<M: Mmio> InterruptControl for Clint<M> {
    fn set_msw_int(&mut self) {
        self.mmio.write_u32(self.config.msip_addr, self.config.msip_set);
    }

    fn clear_msw_int(&mut self) {
        self.mmio.write_u32(self.config.msip_addr, 0);
    }
}
