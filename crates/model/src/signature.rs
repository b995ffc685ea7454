// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Signature region layout.
//!
//! ```text
//! begin_regstate  -> +0  u32 128   (8-byte aligned)
//! end_regstate    -> +4  u32 4
//! begin_signature -> +8  test-program data (4-byte aligned)
//! end_signature   -> one past the last signature byte
//! ```
//!
//! The harness locates the region by symbol and dumps the bytes between
//! `begin_signature` and `end_signature`. What those bytes mean is the test
//! program's business.

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr;

/// Register-state size class declared in the header.
pub const REGSTATE_SIZE: u32 = 128;
/// Width of one signature word in bytes, declared in the header.
pub const SIGNATURE_WORD_SIZE: u32 = 4;

pub const HEADER_ALIGN: usize = 8;
pub const DATA_ALIGN: usize = 4;
pub const HEADER_SIZE: usize = mem::size_of::<RegStateHeader>();

/// Offset of `end_regstate` from `begin_regstate`.
pub const END_REGSTATE_OFFSET: usize = mem::size_of::<u32>();


pub const BEGIN_REGSTATE_SYMBOL: &str = "begin_regstate";
pub const END_REGSTATE_SYMBOL: &str = "end_regstate";
pub const BEGIN_SIGNATURE_SYMBOL: &str = "begin_signature";
pub const END_SIGNATURE_SYMBOL: &str = "end_signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct RegStateHeader {
    pub regstate_size: u32,
    pub signature_word_size: u32,
}

impl RegStateHeader {
    pub const CONVENTIONAL: Self = Self {
        regstate_size: REGSTATE_SIZE,
        signature_word_size: SIGNATURE_WORD_SIZE,
    };

    pub const fn to_le_bytes(self) -> [u8; HEADER_SIZE] {
        let a = self.regstate_size.to_le_bytes();
        let b = self.signature_word_size.to_le_bytes();
        [a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]]
    }

    pub fn from_le_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            regstate_size: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            signature_word_size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn is_conventional(&self) -> bool {
        *self == Self::CONVENTIONAL
    }
}

impl Default for RegStateHeader {
    fn default() -> Self {
        Self::CONVENTIONAL
    }
}

/// A way in which a set of label addresses breaks the layout contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutViolation {
    HeaderMisaligned(u64),
    DataMisaligned(u64),
    Inverted { begin: u64, end: u64 },
    PartialWord { begin: u64, end: u64 },
    OverlapsHeader { header: u64, data: u64 },
}

impl fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::HeaderMisaligned(addr) => write!(
                f,
                "Register-state header must be 8-byte aligned, but begins at {:#010x}",
                addr
            ),
            Self::DataMisaligned(addr) => write!(
                f,
                "Signature region must begin at a 4-byte boundary, but begins at {:#010x}",
                addr
            ),
            Self::Inverted { begin, end } => write!(
                f,
                "Signature region ends at {:#010x}, before it begins at {:#010x}",
                end, begin
            ),
            Self::PartialWord { begin, end } => write!(
                f,
                "Signature region must contain a series of 32-bit words, but spans {:#010x}-{:#010x}",
                begin, end
            ),
            Self::OverlapsHeader { header, data } => write!(
                f,
                "Signature data at {:#010x} overlaps the header at {:#010x}",
                data, header
            ),
        }
    }
}

pub const fn is_header_aligned(addr: u64) -> bool {
    addr % HEADER_ALIGN as u64 == 0
}

pub const fn is_data_aligned(addr: u64) -> bool {
    addr % DATA_ALIGN as u64 == 0
}

/// Checks `begin_signature..end_signature` on its own: aligned start,
/// non-negative length, whole words. An empty span is well formed.
pub fn check_bounds(begin: u64, end: u64) -> Result<(), LayoutViolation> {
    if !is_data_aligned(begin) {
        return Err(LayoutViolation::DataMisaligned(begin));
    }
    if end < begin {
        return Err(LayoutViolation::Inverted { begin, end });
    }
    if (end - begin) % DATA_ALIGN as u64 != 0 {
        return Err(LayoutViolation::PartialWord { begin, end });
    }
    Ok(())
}

/// Full address check of the region: header alignment, the data span, and
/// no overlap between the two.
pub fn check_layout(
    begin_regstate: u64,
    begin_signature: u64,
    end_signature: u64,
) -> Result<(), LayoutViolation> {
    if !is_header_aligned(begin_regstate) {
        return Err(LayoutViolation::HeaderMisaligned(begin_regstate));
    }
    check_bounds(begin_signature, end_signature)?;
    let header_end = begin_regstate.saturating_add(HEADER_SIZE as u64);
    if begin_signature < header_end && end_signature > begin_regstate {
        return Err(LayoutViolation::OverlapsHeader {
            header: begin_regstate,
            data: begin_signature,
        });
    }
    Ok(())
}

/// Whole signature words between two label addresses; zero if inverted.
pub const fn region_words(begin: usize, end: usize) -> usize {
    end.saturating_sub(begin) / DATA_ALIGN
}

/// Header plus `N` signature words, laid out exactly as on the target.
///
/// Host code and tests use this in place of the linker-placed region.
#[derive(Debug, Clone)]
#[repr(C, align(8))]
pub struct SignatureBlock<const N: usize> {
    pub header: RegStateHeader,
    pub words: [u32; N],
}

impl<const N: usize> SignatureBlock<N> {
    pub const fn new(fill: u32) -> Self {
        Self {
            header: RegStateHeader::CONVENTIONAL,
            words: [fill; N],
        }
    }

    pub fn writer(&mut self) -> SignatureWriter<'_> {
        SignatureWriter::new(&mut self.words)
    }
}

/// Sequential writer over the signature words.
///
/// Stores are volatile: nothing on the target ever reads the region back, so
/// the compiler must not be allowed to drop them.
#[derive(Debug)]
pub struct SignatureWriter<'a> {
    base: *mut u32,
    capacity: usize,
    len: usize,
    _region: PhantomData<&'a mut [u32]>,
}

impl<'a> SignatureWriter<'a> {
    pub fn new(words: &'a mut [u32]) -> Self {
        Self {
            base: words.as_mut_ptr(),
            capacity: words.len(),
            len: 0,
            _region: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `base` must be valid for volatile writes of `capacity` words, 4-byte
    /// aligned, and not aliased by any live reference for `'a`.
    pub unsafe fn from_raw_parts(base: *mut u32, capacity: usize) -> Self {
        Self {
            base,
            capacity,
            len: 0,
            _region: PhantomData,
        }
    }

    /// Appends one word. Returns `false` and writes nothing once full.
    pub fn write_word(&mut self, word: u32) -> bool {
        if self.len >= self.capacity {
            return false;
        }
        // SAFETY: len < capacity and base covers capacity words.
        unsafe { ptr::write_volatile(self.base.add(self.len), word) };
        self.len += 1;
        true
    }

    /// Appends an XLEN=64 value as two little-endian words, or nothing.
    pub fn write_dword(&mut self, dword: u64) -> bool {
        if self.capacity - self.len < 2 {
            return false;
        }
        self.write_word(dword as u32);
        self.write_word((dword >> 32) as u32);
        true
    }

    pub fn write_words(&mut self, words: &[u32]) -> usize {
        words.iter().take_while(|w| self.write_word(**w)).count()
    }

    /// Bytes written so far, i.e. the offset of `end_signature`.
    pub fn len_bytes(&self) -> usize {
        self.len * DATA_ALIGN
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity * DATA_ALIGN
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
