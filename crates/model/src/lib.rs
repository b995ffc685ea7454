// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Target side of the RISC-V architectural test contract.
//!
//! A compliance harness needs three things from a device under test: a
//! signature region it can locate and dump, a halt label it can trap on, and
//! a handful of interrupt primitives that trap tests call. This crate defines
//! all three as constants, types and small inline functions. On riscv targets
//! the [`rt`] module also emits the link-time labels.
//!
//! Nothing here validates anything at run time. The layout and reachability
//! rules are preconditions; breaking them leaves the harness reading
//! undefined data.

#![cfg_attr(not(test), no_std)]

pub mod halt;
pub mod interrupt;
pub mod io;
pub mod platform;
pub mod signature;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod rt;

pub use halt::{rvmodel_boot, HaltState};
pub use interrupt::{Clint, InterruptControl, Mmio, Msip, Volatile};
pub use io::{IoReporter, NullIo};
pub use platform::{DefaultPlatform, Platform, PlatformConfig};
pub use signature::{LayoutViolation, RegStateHeader, SignatureBlock, SignatureWriter};
