// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{Peripheral, SimResult};
use rvmodel::Msip;
use std::any::Any;

pub const MSIP_OFFSET: u64 = 0x0000;
pub const CLINT_SIZE: u64 = 0x1_0000;

/// Core-local interruptor, reduced to the software interrupt register.
///
/// Only bit 0 of MSIP is writable; everything else in the window reads as
/// zero and ignores writes.
#[derive(Debug, Default)]
pub struct Clint {
    msip: Msip,
}

impl Clint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msip(&self) -> Msip {
        self.msip
    }

    pub fn is_pending(&self) -> bool {
        self.msip.contains(Msip::PENDING)
    }
}

impl Peripheral for Clint {
    fn read(&self, offset: u64) -> SimResult<u8> {
        match offset {
            MSIP_OFFSET..=3 => {
                let byte_offset = (offset - MSIP_OFFSET) as u32;
                Ok(((self.msip.bits() >> (byte_offset * 8)) & 0xFF) as u8)
            }
            _ => Ok(0),
        }
    }

    fn write(&mut self, offset: u64, value: u8) -> SimResult<()> {
        if !(MSIP_OFFSET..=3).contains(&offset) {
            return Ok(());
        }
        let byte_offset = (offset - MSIP_OFFSET) as u32;
        let mask = 0xFF << (byte_offset * 8);
        let reg = (self.msip.bits() & !mask) | ((value as u32) << (byte_offset * 8));

        let next = Msip::from_bits_truncate(reg);
        if next != self.msip {
            tracing::debug!("CLINT: MSIP {:#x} -> {:#x}", self.msip.bits(), next.bits());
        }
        self.msip = next;
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
