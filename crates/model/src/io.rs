// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Console reporting hooks.
//!
//! Test suites call these unconditionally. Targets that report results over a
//! console implement [`IoReporter`]; the default configuration reports
//! nothing and relies on the signature alone.

pub trait IoReporter {
    fn io_init(&mut self) {}

    fn io_write_str(&mut self, _text: &str) {}

    fn io_check(&mut self) {}

    /// `reg` is the integer register number holding `value`.
    fn io_assert_gpr_eq(&mut self, _reg: u8, _value: usize, _expected: usize) {}

    fn io_assert_sfpr_eq(&mut self, _freg: u8, _bits: u32, _expected: u32) {}

    fn io_assert_dfpr_eq(&mut self, _freg: u8, _bits: u64, _expected: u64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullIo;

impl IoReporter for NullIo {}

#[inline(always)]
pub fn rvmodel_io_init() {
    NullIo.io_init();
}

#[inline(always)]
pub fn rvmodel_io_write_str(text: &str) {
    NullIo.io_write_str(text);
}

#[inline(always)]
pub fn rvmodel_io_check() {
    NullIo.io_check();
}

#[inline(always)]
pub fn rvmodel_io_assert_gpr_eq(reg: u8, value: usize, expected: usize) {
    NullIo.io_assert_gpr_eq(reg, value, expected);
}

#[inline(always)]
pub fn rvmodel_io_assert_sfpr_eq(freg: u8, bits: u32, expected: u32) {
    NullIo.io_assert_sfpr_eq(freg, bits, expected);
}

#[inline(always)]
pub fn rvmodel_io_assert_dfpr_eq(freg: u8, bits: u64, expected: u64) {
    NullIo.io_assert_dfpr_eq(freg, bits, expected);
}
