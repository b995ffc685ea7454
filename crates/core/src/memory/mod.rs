// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn end_addr(&self) -> u64 {
        self.start_addr + self.data.len() as u64
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start_addr && addr < self.end_addr()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new(entry_point: u64) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    /// Byte at `addr` as initialised by the image, if any segment covers it.
    pub fn read_u8(&self, addr: u64) -> Option<u8> {
        self.segments
            .iter()
            .find(|s| s.contains(addr))
            .map(|s| s.data[(addr - s.start_addr) as usize])
    }
}

/// A simple flat memory storage
#[derive(Debug)]
pub struct LinearMemory {
    pub data: Vec<u8>,
    pub base_addr: u64,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u64) -> Self {
        Self {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base_addr && addr < self.base_addr + self.data.len() as u64
    }

    pub fn read_u8(&self, addr: u64) -> Option<u8> {
        if self.contains(addr) {
            Some(self.data[(addr - self.base_addr) as usize])
        } else {
            None
        }
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> bool {
        if self.contains(addr) {
            self.data[(addr - self.base_addr) as usize] = value;
            true
        } else {
            false
        }
    }

    pub fn load_from_segment(&mut self, segment: &Segment) -> bool {
        let mem_end = self.base_addr + self.data.len() as u64;

        if segment.start_addr >= self.base_addr && segment.end_addr() <= mem_end {
            let offset = (segment.start_addr - self.base_addr) as usize;
            self.data[offset..offset + segment.data.len()].copy_from_slice(&segment.data);
            return true;
        }
        false
    }

    /// Copies the part of `bytes` (placed at `start_addr`) that falls inside
    /// this memory. Returns how many bytes were copied.
    pub fn overlay(&mut self, start_addr: u64, bytes: &[u8]) -> usize {
        let mem_end = self.base_addr + self.data.len() as u64;
        let start = start_addr.max(self.base_addr);
        let end = (start_addr + bytes.len() as u64).min(mem_end);
        if start >= end {
            return 0;
        }
        let src = (start - start_addr) as usize;
        let dst = (start - self.base_addr) as usize;
        let len = (end - start) as usize;
        self.data[dst..dst + len].copy_from_slice(&bytes[src..src + len]);
        len
    }
}
