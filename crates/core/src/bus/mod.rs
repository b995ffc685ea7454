// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::memory::{LinearMemory, Segment};
use crate::peripherals::clint::{Clint, CLINT_SIZE};
use crate::{Peripheral, SimResult, SimulationError};
use anyhow::Context;
use rvmodel_config::PlatformDescriptor;

#[derive(Debug)]
pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub dev: Box<dyn Peripheral>,
}

impl PeripheralEntry {
    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.base + self.size
    }
}

#[derive(Debug)]
pub struct SystemBus {
    pub ram: LinearMemory,
    pub peripherals: Vec<PeripheralEntry>,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    /// RAM at 0x8000_0000 and a CLINT at the conventional MSIP address.
    pub fn new() -> Self {
        Self::with_layout(
            0x8000_0000,
            2 * 1024 * 1024,
            rvmodel::PlatformConfig::DEFAULT.msip_addr as u64,
        )
    }

    pub fn with_layout(ram_base: u64, ram_size: usize, clint_base: u64) -> Self {
        Self {
            ram: LinearMemory::new(ram_size, ram_base),
            peripherals: vec![PeripheralEntry {
                name: "clint".to_string(),
                base: clint_base,
                size: CLINT_SIZE,
                dev: Box::new(Clint::new()),
            }],
        }
    }

    pub fn from_config(platform: &PlatformDescriptor) -> anyhow::Result<Self> {
        let ram_size = platform.ram_size()?;
        let ram_size = usize::try_from(ram_size)
            .with_context(|| format!("RAM size {} does not fit in host memory", ram_size))?;
        tracing::debug!(
            "Platform '{}': RAM {:#x}+{:#x}, CLINT {:#x}",
            platform.name,
            platform.ram.base,
            ram_size,
            platform.clint.base
        );
        Ok(Self::with_layout(
            platform.ram.base,
            ram_size,
            platform.clint.base,
        ))
    }

    pub fn clint(&self) -> Option<&Clint> {
        self.peripherals
            .iter()
            .find(|p| p.name == "clint")
            .and_then(|p| p.dev.as_any())
            .and_then(|any| any.downcast_ref::<Clint>())
    }

    pub fn load_segment(&mut self, segment: &Segment) -> bool {
        self.ram.load_from_segment(segment)
    }

    /// Copies a raw memory dump taken from a target into RAM.
    pub fn overlay(&mut self, start_addr: u64, bytes: &[u8]) -> usize {
        self.ram.overlay(start_addr, bytes)
    }

    fn peripheral(&self, addr: u64) -> Option<&PeripheralEntry> {
        self.peripherals.iter().find(|p| p.contains(addr))
    }

    fn peripheral_mut(&mut self, addr: u64) -> Option<&mut PeripheralEntry> {
        self.peripherals.iter_mut().find(|p| p.contains(addr))
    }
}

impl crate::Bus for SystemBus {
    fn read_u8(&self, addr: u64) -> SimResult<u8> {
        if let Some(byte) = self.ram.read_u8(addr) {
            return Ok(byte);
        }
        if let Some(p) = self.peripheral(addr) {
            return p.dev.read(addr - p.base);
        }
        Err(SimulationError::MemoryViolation(addr))
    }

    fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()> {
        if self.ram.write_u8(addr, value) {
            return Ok(());
        }
        if let Some(p) = self.peripheral_mut(addr) {
            let offset = addr - p.base;
            return p.dev.write(offset, value);
        }
        Err(SimulationError::MemoryViolation(addr))
    }
}
