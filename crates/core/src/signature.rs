// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Locating, checking and dumping the signature region after a run.

use crate::{Bus, SimulationError};
use rvmodel::signature::{
    self, DATA_ALIGN, END_REGSTATE_OFFSET, HEADER_SIZE, REGSTATE_SIZE, SIGNATURE_WORD_SIZE,
};
use rvmodel::LayoutViolation;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("{0}")]
    Layout(LayoutViolation),
    #[error("Signature region of {len} bytes exceeds the {limit}-byte limit")]
    TooLarge { len: u64, limit: u64 },
    #[error("Header word at {addr:#010x} is {found}, expected {expected}")]
    HeaderValue { addr: u64, found: u32, expected: u32 },
    #[error(transparent)]
    Memory(#[from] SimulationError),
}

impl From<LayoutViolation> for SignatureError {
    fn from(v: LayoutViolation) -> Self {
        Self::Layout(v)
    }
}

/// Resolved addresses of the contract labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureSymbols {
    pub begin_regstate: u64,
    pub end_regstate: u64,
    pub begin_signature: u64,
    pub end_signature: u64,
}

impl SignatureSymbols {
    /// Addresses of a region laid out exactly as the target runtime emits it.
    pub fn contiguous(begin_regstate: u64, signature_len: u64) -> Self {
        let begin_signature = begin_regstate.saturating_add(HEADER_SIZE as u64);
        Self {
            begin_regstate,
            end_regstate: begin_regstate.saturating_add(END_REGSTATE_OFFSET as u64),
            begin_signature,
            end_signature: begin_signature.saturating_add(signature_len),
        }
    }

    pub fn len_bytes(&self) -> u64 {
        self.end_signature.saturating_sub(self.begin_signature)
    }

    /// Address-only checks: alignment, ordering, whole words.
    pub fn check_layout(&self) -> Result<(), SignatureError> {
        signature::check_layout(
            self.begin_regstate,
            self.begin_signature,
            self.end_signature,
        )?;
        Ok(())
    }

    /// Reads both header words and checks them against `(128, 4)`.
    pub fn check_header(&self, bus: &dyn Bus) -> Result<(), SignatureError> {
        for (addr, expected) in [
            (self.begin_regstate, REGSTATE_SIZE),
            (self.end_regstate, SIGNATURE_WORD_SIZE),
        ] {
            let found = bus.read_u32(addr)?;
            if found != expected {
                return Err(SignatureError::HeaderValue {
                    addr,
                    found,
                    expected,
                });
            }
        }
        Ok(())
    }
}

/// Bytes between `begin_signature` and `end_signature`; `None` where the
/// target has no memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub begin: u64,
    pub bytes: Vec<Option<u8>>,
}

impl Signature {
    /// Reads the region off `bus`. Regions longer than `limit` bytes are
    /// refused before anything is allocated.
    pub fn extract(
        bus: &dyn Bus,
        symbols: &SignatureSymbols,
        limit: u64,
    ) -> Result<Self, SignatureError> {
        symbols.check_layout()?;
        let len = symbols.len_bytes();
        if len > limit {
            return Err(SignatureError::TooLarge { len, limit });
        }

        let bytes: Vec<Option<u8>> = (symbols.begin_signature..symbols.end_signature)
            .map(|addr| bus.read_u8(addr).ok())
            .collect();
        let unmapped = bytes.iter().filter(|b| b.is_none()).count();
        if unmapped > 0 {
            tracing::warn!("{} signature bytes fall outside mapped memory", unmapped);
        }
        tracing::debug!(
            "Extracted {} signature bytes from {:#x}",
            bytes.len(),
            symbols.begin_signature
        );

        Ok(Self {
            begin: symbols.begin_signature,
            bytes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Fully mapped words, little-endian.
    pub fn words(&self) -> Vec<Option<u32>> {
        self.bytes
            .chunks(DATA_ALIGN)
            .map(|chunk| {
                chunk
                    .iter()
                    .rev()
                    .try_fold(0u32, |acc, b| b.map(|b| (acc << 8) | b as u32))
            })
            .collect()
    }

    /// One line per word: eight lowercase hex digits, most significant byte
    /// first, `--` standing in for each unmapped byte.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.bytes.chunks(DATA_ALIGN).map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|b| match b {
                    Some(b) => format!("{:02x}", b),
                    None => "--".to_string(),
                })
                .collect::<String>()
        })
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for line in self.lines() {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
