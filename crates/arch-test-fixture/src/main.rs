// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![no_std]
#![no_main]

use panic_halt as _;
use riscv_rt::entry;
use rvmodel::io::{rvmodel_io_check, rvmodel_io_init};
use rvmodel::rt::{
    clear_mext_int, clear_msw_int, clear_mtimer_int, msw_int_pending, rvmodel_halt, set_msw_int,
    signature_writer,
};
use rvmodel::{Platform, PlatformConfig};

/// QEMU `virt` and spike both map the CLINT at the conventional address.
struct Board;

impl Platform for Board {
    const CONFIG: PlatformConfig = PlatformConfig::DEFAULT.with_msip_addr(0x0200_0000);
}

const SIGNATURE_WORDS: usize = 3;

// Signature, in order:
//   0xdeadbeef
//   MSIP seen pending after assert (1)
//   MSIP seen pending after clear (0)
rvmodel::signature_region!(SIGNATURE_WORDS, Board);

#[entry]
fn main() -> ! {
    rvmodel::rvmodel_boot();
    rvmodel_io_init();

    // mstatus.MIE is clear out of reset, so the pending bit is observable
    // without taking the trap.
    set_msw_int::<Board>();
    let asserted = msw_int_pending();
    clear_msw_int::<Board>();
    let cleared = msw_int_pending();

    clear_mtimer_int::<Board>();
    clear_mext_int::<Board>();

    // SAFETY: the only signature writer in this program.
    let mut sig = unsafe { signature_writer() };
    sig.write_word(0xDEAD_BEEF);
    sig.write_word(asserted as u32);
    sig.write_word(cleared as u32);

    rvmodel_io_check();
    rvmodel_halt()
}
