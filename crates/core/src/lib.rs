// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Host-side model of the architectural test contract.
//!
//! The instruction set is executed elsewhere: anything implementing [`Hart`]
//! can be driven by [`Machine`], which watches for the halt address, enforces
//! run limits and hands the final memory to [`signature`].

pub mod bus;
pub mod memory;
pub mod peripherals;
pub mod signature;

use rvmodel::{HaltState, Mmio};
use rvmodel_config::{RunLimits, StopReason};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod tests;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u64),
    #[error("Hart fault at {pc:#x}: {reason}")]
    HartFault { pc: u64, reason: String },
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait for observing simulation events in a modular way.
pub trait SimulationObserver: std::fmt::Debug + Send + Sync {
    fn on_simulation_start(&self) {}
    fn on_simulation_stop(&self, _reason: &StopReason) {}
    fn on_step_start(&self, _pc: u64) {}
    fn on_halt(&self, _pc: u64) {}
}

/// An instruction executor for one hart.
pub trait Hart {
    fn reset(&mut self, entry: u64);
    fn step(&mut self, bus: &mut dyn Bus) -> SimResult<()>;
    fn pc(&self) -> u64;
}

/// Trait representing a memory-mapped peripheral
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u64) -> SimResult<u8>;
    fn write(&mut self, offset: u64, value: u8) -> SimResult<()>;
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

/// Trait representing the system bus
pub trait Bus {
    fn read_u8(&self, addr: u64) -> SimResult<u8>;
    fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()>;

    fn read_u16(&self, addr: u64) -> SimResult<u16> {
        let b0 = self.read_u8(addr)? as u16;
        let b1 = self.read_u8(addr + 1)? as u16;
        // Little Endian
        Ok(b0 | (b1 << 8))
    }

    fn read_u32(&self, addr: u64) -> SimResult<u32> {
        let b0 = self.read_u8(addr)? as u32;
        let b1 = self.read_u8(addr + 1)? as u32;
        let b2 = self.read_u8(addr + 2)? as u32;
        let b3 = self.read_u8(addr + 3)? as u32;
        Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        self.write_u8(addr + 2, ((value >> 16) & 0xFF) as u8)?;
        self.write_u8(addr + 3, ((value >> 24) & 0xFF) as u8)?;
        Ok(())
    }

    fn write_u16(&mut self, addr: u64, value: u16) -> SimResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        Ok(())
    }
}

/// Lets the target-side primitives run against a simulated bus.
///
/// `Mmio` has no failure path, so the first bus error is kept for the caller
/// to inspect and reads of unmapped registers return zero.
pub struct BusMmio<'a> {
    bus: &'a mut dyn Bus,
    fault: Option<SimulationError>,
}

impl<'a> BusMmio<'a> {
    pub fn new(bus: &'a mut dyn Bus) -> Self {
        Self { bus, fault: None }
    }

    pub fn finish(self) -> SimResult<()> {
        match self.fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn record(&mut self, err: SimulationError) {
        tracing::warn!("MMIO access failed: {}", err);
        self.fault.get_or_insert(err);
    }
}

impl Mmio for BusMmio<'_> {
    fn read_u32(&mut self, addr: usize) -> u32 {
        match self.bus.read_u32(addr as u64) {
            Ok(v) => v,
            Err(e) => {
                self.record(e);
                0
            }
        }
    }

    fn write_u32(&mut self, addr: usize, value: u32) {
        if let Err(e) = self.bus.write_u32(addr as u64, value) {
            self.record(e);
        }
    }
}

pub struct Machine<H: Hart> {
    pub hart: H,
    pub bus: bus::SystemBus,
    pub halt_addr: u64,
    pub state: HaltState,
    pub observers: Vec<Arc<dyn SimulationObserver>>,
}

impl<H: Hart> Machine<H> {
    pub fn new(hart: H, bus: bus::SystemBus, halt_addr: u64) -> Self {
        Self {
            hart,
            bus,
            halt_addr,
            state: HaltState::Running,
            observers: Vec::new(),
        }
    }

    pub fn load_program(&mut self, image: &memory::ProgramImage) -> SimResult<()> {
        for segment in &image.segments {
            if !self.bus.load_segment(segment) {
                tracing::warn!(
                    "Failed to load segment at {:#x} - outside of memory map",
                    segment.start_addr
                );
            }
        }

        for observer in &self.observers {
            observer.on_simulation_start();
        }
        self.reset(image.entry_point);
        Ok(())
    }

    pub fn reset(&mut self, entry: u64) {
        self.hart.reset(entry);
        self.state = HaltState::Running;
        self.observe_pc();
    }

    /// Executes one instruction, or idles in place once halted.
    pub fn step(&mut self) -> SimResult<HaltState> {
        if self.state.is_halted() {
            return Ok(self.state);
        }

        for observer in &self.observers {
            observer.on_step_start(self.hart.pc());
        }
        self.hart.step(&mut self.bus)?;
        self.observe_pc();
        Ok(self.state)
    }

    /// Runs until the hart reaches the halt address or a limit is hit.
    pub fn run(&mut self, limits: &RunLimits) -> StopReason {
        let start = Instant::now();
        let wall_time = limits.wall_time_ms.map(Duration::from_millis);
        let mut steps = 0u64;

        let reason = loop {
            if self.state.is_halted() {
                break StopReason::Halt;
            }
            if wall_time.is_some_and(|limit| start.elapsed() >= limit) {
                break StopReason::WallTime;
            }
            if steps >= limits.max_steps {
                break StopReason::MaxSteps;
            }
            match self.step() {
                Ok(_) => steps += 1,
                Err(SimulationError::MemoryViolation(addr)) => {
                    tracing::info!("Memory violation at {:#x} after {} steps", addr, steps);
                    break StopReason::MemoryViolation;
                }
                Err(e) => {
                    tracing::info!("Simulation error after {} steps: {}", steps, e);
                    break StopReason::Fault;
                }
            }
        };

        tracing::info!(
            "Stopped: {:?} after {} steps, PC={:#x}",
            reason,
            steps,
            self.hart.pc()
        );
        for observer in &self.observers {
            observer.on_simulation_stop(&reason);
        }
        reason
    }

    fn observe_pc(&mut self) {
        let pc = self.hart.pc();
        let next = self.state.observe(pc, self.halt_addr);
        if next != self.state {
            tracing::debug!("Reached halt point at {:#x}", pc);
            for observer in &self.observers {
                observer.on_halt(pc);
            }
        }
        self.state = next;
    }
}
