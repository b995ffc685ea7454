// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::bus::SystemBus;
    use crate::memory::ProgramImage;
    use crate::signature::{Signature, SignatureSymbols};
    use crate::{Bus, BusMmio, Hart, Machine, SimResult, SimulationError, SimulationObserver};
    use rvmodel::signature::RegStateHeader;
    use rvmodel::{Clint, HaltState, InterruptControl, PlatformConfig};
    use rvmodel_config::{RunLimits, StopReason};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    const ENTRY: u64 = 0x8000_0000;
    const HALT: u64 = 0x8000_0100;
    const REGION: u64 = 0x8000_1000;

    /// What a test program does at each 4-byte slot.
    #[derive(Debug, Clone, Copy)]
    enum Op {
        Nop,
        StoreWord { addr: u64, value: u32 },
        SetMsw,
        ClearMsw,
        ReadMsw,
        Jump(u64),
    }

    /// Stand-in for an instruction set simulator: runs a fixed op list and
    /// uses the real primitives for interrupt control.
    #[derive(Debug, Default)]
    struct ScriptedHart {
        pc: u64,
        entry: u64,
        program: Vec<Op>,
        msip_reads: Vec<u32>,
    }

    impl ScriptedHart {
        fn new(program: Vec<Op>) -> Self {
            Self {
                program,
                ..Default::default()
            }
        }
    }

    impl Hart for ScriptedHart {
        fn reset(&mut self, entry: u64) {
            self.entry = entry;
            self.pc = entry;
        }

        fn step(&mut self, bus: &mut dyn Bus) -> SimResult<()> {
            let slot = self.pc.wrapping_sub(self.entry) / 4;
            let op = self
                .program
                .get(slot as usize)
                .copied()
                .ok_or_else(|| SimulationError::HartFault {
                    pc: self.pc,
                    reason: "no instruction".to_string(),
                })?;

            let mut next_pc = self.pc + 4;
            match op {
                Op::Nop => {}
                Op::StoreWord { addr, value } => bus.write_u32(addr, value)?,
                Op::SetMsw | Op::ClearMsw | Op::ReadMsw => {
                    let mut clint = Clint::new(BusMmio::new(bus), PlatformConfig::DEFAULT);
                    match op {
                        Op::SetMsw => clint.set_msw_int(),
                        Op::ClearMsw => clint.clear_msw_int(),
                        _ => {
                            let bits = clint.msip().bits();
                            self.msip_reads.push(bits);
                        }
                    }
                    clint.into_inner().finish()?;
                }
                Op::Jump(target) => next_pc = target,
            }
            self.pc = next_pc;
            Ok(())
        }

        fn pc(&self) -> u64 {
            self.pc
        }
    }

    #[derive(Debug, Default)]
    struct HaltCounter {
        halts: AtomicU32,
        stops: Mutex<Vec<StopReason>>,
    }

    impl SimulationObserver for HaltCounter {
        fn on_halt(&self, _pc: u64) {
            self.halts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_simulation_stop(&self, reason: &StopReason) {
            self.stops.lock().unwrap().push(reason.clone());
        }
    }

    /// Image holding the header at REGION followed by `words` fill words.
    fn image_with_region(words: usize, fill: u32) -> (ProgramImage, SignatureSymbols) {
        let mut image = ProgramImage::new(ENTRY);
        let mut data = RegStateHeader::CONVENTIONAL.to_le_bytes().to_vec();
        for _ in 0..words {
            data.extend_from_slice(&fill.to_le_bytes());
        }
        image.add_segment(REGION, data);
        (image, SignatureSymbols::contiguous(REGION, (words * 4) as u64))
    }

    fn machine(program: Vec<Op>, image: &ProgramImage) -> Machine<ScriptedHart> {
        let mut m = Machine::new(ScriptedHart::new(program), SystemBus::new(), HALT);
        m.load_program(image).unwrap();
        m
    }

    fn limits() -> RunLimits {
        RunLimits {
            max_steps: 1000,
            wall_time_ms: None,
        }
    }

    #[test]
    fn test_deadbeef_signature_then_halt() {
        let (image, symbols) = image_with_region(1, 0);
        let mut m = machine(
            vec![
                Op::StoreWord {
                    addr: symbols.begin_signature,
                    value: 0xDEAD_BEEF,
                },
                Op::Jump(HALT),
            ],
            &image,
        );

        assert_eq!(m.run(&limits()), StopReason::Halt);
        assert_eq!(m.hart.pc(), HALT);

        symbols.check_header(&m.bus).unwrap();
        let sig = Signature::extract(&m.bus, &symbols, m.bus.ram.data.len() as u64).unwrap();
        assert_eq!(sig.bytes, [Some(0xEF), Some(0xBE), Some(0xAD), Some(0xDE)]);
        assert_eq!(sig.to_string(), "deadbeef\n");

        // Post-halt the PC never advances.
        for _ in 0..10 {
            assert_eq!(m.step().unwrap(), HaltState::Halted);
            assert_eq!(m.hart.pc(), HALT);
        }
    }

    #[test]
    fn test_assert_then_read_sees_pending_bit() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(vec![Op::SetMsw, Op::ReadMsw, Op::Jump(HALT)], &image);

        assert_eq!(m.run(&limits()), StopReason::Halt);
        assert_eq!(m.hart.msip_reads, [1]);
        assert!(m.bus.clint().unwrap().is_pending());
    }

    #[test]
    fn test_assert_clear_round_trip() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(
            vec![Op::SetMsw, Op::ClearMsw, Op::ReadMsw, Op::Jump(HALT)],
            &image,
        );

        assert_eq!(m.run(&limits()), StopReason::Halt);
        assert_eq!(m.hart.msip_reads, [0]);
        assert!(!m.bus.clint().unwrap().is_pending());
    }

    #[test]
    fn test_assert_persists_without_clear() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(
            vec![
                Op::SetMsw,
                Op::Nop,
                Op::ReadMsw,
                Op::Nop,
                Op::ReadMsw,
                Op::Jump(HALT),
            ],
            &image,
        );

        assert_eq!(m.run(&limits()), StopReason::Halt);
        assert_eq!(m.hart.msip_reads, [1, 1]);
    }

    #[test]
    fn test_unwritten_signature_keeps_initial_value() {
        let (image, symbols) = image_with_region(2, 0xdead_beef);
        let mut m = machine(vec![Op::Jump(HALT)], &image);

        assert_eq!(m.run(&limits()), StopReason::Halt);
        let sig = Signature::extract(&m.bus, &symbols, m.bus.ram.data.len() as u64).unwrap();
        assert_eq!(sig.words(), [Some(0xdead_beef), Some(0xdead_beef)]);
    }

    #[test]
    fn test_halt_reported_once() {
        let (image, _) = image_with_region(0, 0);
        let counter = Arc::new(HaltCounter::default());
        let mut m = Machine::new(ScriptedHart::new(vec![Op::Jump(HALT)]), SystemBus::new(), HALT);
        m.observers.push(counter.clone());
        m.load_program(&image).unwrap();

        assert_eq!(m.run(&limits()), StopReason::Halt);
        assert_eq!(m.run(&limits()), StopReason::Halt);
        assert_eq!(counter.halts.load(Ordering::SeqCst), 1);
        assert_eq!(
            *counter.stops.lock().unwrap(),
            [StopReason::Halt, StopReason::Halt]
        );
    }

    #[test]
    fn test_never_halting_program_hits_max_steps() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(vec![Op::Nop, Op::Jump(ENTRY)], &image);
        let limits = RunLimits {
            max_steps: 50,
            wall_time_ms: None,
        };
        assert_eq!(m.run(&limits), StopReason::MaxSteps);
        assert_eq!(m.state, HaltState::Running);
    }

    #[test]
    fn test_zero_wall_time_stops_immediately() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(vec![Op::Jump(ENTRY)], &image);
        let limits = RunLimits {
            max_steps: 1_000_000,
            wall_time_ms: Some(0),
        };
        assert_eq!(m.run(&limits), StopReason::WallTime);
    }

    #[test]
    fn test_store_outside_memory_is_violation() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(
            vec![Op::StoreWord {
                addr: 0x1000,
                value: 1,
            }],
            &image,
        );
        assert_eq!(m.run(&limits()), StopReason::MemoryViolation);
    }

    #[test]
    fn test_running_off_the_program_is_a_fault() {
        let (image, _) = image_with_region(0, 0);
        let mut m = machine(vec![Op::Nop], &image);
        assert_eq!(m.run(&limits()), StopReason::Fault);
    }

    #[test]
    fn test_primitives_on_moved_clint_fault_cleanly() {
        // Default primitives point at 0x200_0000; this bus has its CLINT elsewhere.
        let (image, _) = image_with_region(0, 0);
        let mut m = Machine::new(
            ScriptedHart::new(vec![Op::SetMsw, Op::Jump(HALT)]),
            SystemBus::with_layout(ENTRY, 64 * 1024, 0x0210_0000),
            HALT,
        );
        m.load_program(&image).unwrap();
        assert_eq!(m.run(&limits()), StopReason::MemoryViolation);
    }

    #[test]
    fn test_entry_at_halt_is_already_halted() {
        let mut m = Machine::new(ScriptedHart::new(vec![]), SystemBus::new(), ENTRY);
        m.load_program(&ProgramImage::new(ENTRY)).unwrap();
        assert!(m.state.is_halted());
        assert_eq!(m.run(&limits()), StopReason::Halt);
    }
}
