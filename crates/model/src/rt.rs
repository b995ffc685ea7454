// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Link-time labels and the primitive call sites for riscv targets.
//!
//! The halt label lives here. The signature labels are emitted by the test
//! program through [`signature_region!`](crate::signature_region), which sizes
//! the region so that `end_signature` follows the last word it reserves.

use crate::interrupt::{Clint, InterruptControl, Volatile};
use crate::platform::{DefaultPlatform, Platform};
use crate::signature::{region_words, SignatureWriter};
use core::arch::{asm, global_asm};

/// Emits the register-state header followed by `$words` signature words.
///
/// Every word starts out as the platform's `signature_fill`. Invoke exactly
/// once per program, sized to the words the program writes:
///
/// ```ignore
/// rvmodel::signature_region!(3);
/// rvmodel::signature_region!(3, MyBoard);
/// ```
#[macro_export]
macro_rules! signature_region {
    ($words:expr) => {
        $crate::signature_region!($words, $crate::platform::DefaultPlatform);
    };
    ($words:expr, $platform:ty) => {
        ::core::arch::global_asm!(
            ".pushsection .data.rvmodel, \"aw\", @progbits",
            ".balign {header_align}",
            ".globl begin_regstate",
            "begin_regstate:",
            ".word {regstate_size}",
            ".globl end_regstate",
            "end_regstate:",
            ".word {word_size}",
            ".balign {data_align}",
            ".globl begin_signature",
            "begin_signature:",
            ".fill {words}, 4, {fill}",
            ".globl end_signature",
            "end_signature:",
            ".popsection",
            header_align = const $crate::signature::HEADER_ALIGN,
            regstate_size = const $crate::signature::REGSTATE_SIZE,
            word_size = const $crate::signature::SIGNATURE_WORD_SIZE,
            data_align = const $crate::signature::DATA_ALIGN,
            words = const $words,
            fill = const <$platform as $crate::platform::Platform>::CONFIG.signature_fill,
        );
    };
}

// `_halt` is a single nop; the self-loop after it keeps a hart that runs past
// the trap point idle instead of executing whatever follows.
global_asm!(
    ".pushsection .text.rvmodel_halt, \"ax\", @progbits",
    ".globl _halt",
    "_halt:",
    "    nop",
    "1:  j 1b",
    ".popsection",
);

extern "C" {
    static mut begin_signature: u32;
    static mut end_signature: u32;
}

/// Jumps to `_halt`. The signature must be complete before this is called.
#[inline(always)]
pub fn rvmodel_halt() -> ! {
    // SAFETY: `_halt` is defined above and never returns.
    unsafe { asm!("la t0, _halt", "jr t0", options(noreturn)) }
}

/// Writer over the region declared with `signature_region!`.
///
/// # Safety
///
/// The program must invoke `signature_region!`, and at most one writer may
/// exist at a time.
pub unsafe fn signature_writer() -> SignatureWriter<'static> {
    let begin = core::ptr::addr_of_mut!(begin_signature);
    let end = core::ptr::addr_of_mut!(end_signature);
    SignatureWriter::from_raw_parts(begin, region_words(begin as usize, end as usize))
}

fn clint<P: Platform>() -> Clint<Volatile> {
    // SAFETY: a `Platform` impl names a mapped MSIP register.
    Clint::for_platform::<P>(unsafe { Volatile::new() })
}

#[inline]
pub fn set_msw_int<P: Platform>() {
    clint::<P>().set_msw_int();
}

#[inline]
pub fn clear_msw_int<P: Platform>() {
    clint::<P>().clear_msw_int();
}

#[inline(always)]
pub fn clear_mtimer_int<P: Platform>() {
    clint::<P>().clear_mtimer_int();
}

#[inline(always)]
pub fn clear_mext_int<P: Platform>() {
    clint::<P>().clear_mext_int();
}

#[inline]
pub fn rvmodel_set_msw_int() {
    set_msw_int::<DefaultPlatform>();
}

#[inline]
pub fn rvmodel_clear_msw_int() {
    clear_msw_int::<DefaultPlatform>();
}

#[inline(always)]
pub fn rvmodel_clear_mtimer_int() {
    clear_mtimer_int::<DefaultPlatform>();
}

#[inline(always)]
pub fn rvmodel_clear_mext_int() {
    clear_mext_int::<DefaultPlatform>();
}

/// Whether the hart currently sees a machine software interrupt pending.
pub fn msw_int_pending() -> bool {
    riscv::register::mip::read().msoft()
}
