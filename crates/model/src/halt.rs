// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Boot hook and halt point.
//!
//! A test program runs from the boot hook until it jumps to [`HALT_SYMBOL`].
//! The harness treats arrival at that address as the only completion signal.
//! `_halt` sits in its own section (see [`crate::rt`]) so straight-line code
//! can never fall into it; the only way in is an explicit jump.

pub const ENTRY_SYMBOL: &str = "_start";
pub const HALT_SYMBOL: &str = "_halt";

/// Boot hook. The target's reset sequence and the test program own all
/// initialisation, so there is nothing to do here.
#[inline(always)]
pub fn rvmodel_boot() {}

/// Control-flow state of one test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HaltState {
    #[default]
    Running,
    Halted,
}

impl HaltState {
    /// Next state for a hart whose program counter is now `pc`.
    ///
    /// `Halted` is absorbing: once the halt address has been seen, later
    /// observations never leave it.
    pub fn observe(self, pc: u64, halt_addr: u64) -> Self {
        match self {
            HaltState::Running if pc == halt_addr => HaltState::Halted,
            state => state,
        }
    }

    pub fn is_halted(self) -> bool {
        self == HaltState::Halted
    }
}
