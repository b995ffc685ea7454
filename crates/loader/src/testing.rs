// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Minimal ELF32 writer for building test images without a cross toolchain.

const EHDR_SIZE: usize = 52;
const PHDR_SIZE: usize = 32;
const SHDR_SIZE: usize = 40;
const SYM_SIZE: usize = 16;

const EM_RISCV: u16 = 0xF3;
const ET_EXEC: u16 = 2;
const PT_LOAD: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const STB_GLOBAL_NOTYPE: u8 = 0x10;
const SHN_ABS: u16 = 0xFFF1;

pub const LOAD_ADDR: u64 = 0x8000_0000;

const NOP: u32 = 0x0000_0013;
const JUMP_SELF: u32 = 0x0000_006F;

#[derive(Debug, Clone)]
pub struct ElfBuilder {
    entry: u64,
    load_addr: u64,
    data: Vec<u8>,
    bss: usize,
    symbols: Vec<(String, u64)>,
}

impl ElfBuilder {
    pub fn new(load_addr: u64) -> Self {
        Self {
            entry: load_addr,
            load_addr,
            data: Vec::new(),
            bss: 0,
            symbols: Vec::new(),
        }
    }

    pub fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn word(self, value: u32) -> Self {
        self.data(&value.to_le_bytes())
    }

    /// Zero-initialised bytes after the file contents.
    pub fn bss(mut self, len: usize) -> Self {
        self.bss = len;
        self
    }

    pub fn symbol(mut self, name: &str, addr: u64) -> Self {
        self.symbols.push((name.to_string(), addr));
        self
    }

    /// Address of the next byte appended with `data`.
    pub fn cursor(&self) -> u64 {
        self.load_addr + self.data.len() as u64
    }

    /// Labels the next byte appended with `data`.
    pub fn label(self, name: &str) -> Self {
        let addr = self.cursor();
        self.symbol(name, addr)
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        for (name, _) in &mut self.symbols {
            if name == from {
                *name = to.to_string();
            }
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let data_off = EHDR_SIZE + PHDR_SIZE;

        let mut strtab = vec![0u8];
        let mut syms = vec![0u8; SYM_SIZE];
        for (name, addr) in &self.symbols {
            let name_off = strtab.len() as u32;
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);

            syms.extend_from_slice(&name_off.to_le_bytes());
            syms.extend_from_slice(&(*addr as u32).to_le_bytes());
            syms.extend_from_slice(&0u32.to_le_bytes());
            syms.push(STB_GLOBAL_NOTYPE);
            syms.push(0);
            syms.extend_from_slice(&SHN_ABS.to_le_bytes());
        }
        let shstrtab = b"\0.symtab\0.strtab\0.shstrtab\0";

        let symtab_off = align4(data_off + self.data.len());
        let strtab_off = symtab_off + syms.len();
        let shstrtab_off = strtab_off + strtab.len();
        let shdr_off = align4(shstrtab_off + shstrtab.len());

        let mut out = Vec::with_capacity(shdr_off + 4 * SHDR_SIZE);

        // ELF header
        out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
        out.extend_from_slice(&[0; 8]);
        push_u16(&mut out, ET_EXEC);
        push_u16(&mut out, EM_RISCV);
        push_u32(&mut out, 1);
        push_u32(&mut out, self.entry as u32);
        push_u32(&mut out, EHDR_SIZE as u32);
        push_u32(&mut out, shdr_off as u32);
        push_u32(&mut out, 0);
        push_u16(&mut out, EHDR_SIZE as u16);
        push_u16(&mut out, PHDR_SIZE as u16);
        push_u16(&mut out, 1);
        push_u16(&mut out, SHDR_SIZE as u16);
        push_u16(&mut out, 4);
        push_u16(&mut out, 3);

        // PT_LOAD
        push_u32(&mut out, PT_LOAD);
        push_u32(&mut out, data_off as u32);
        push_u32(&mut out, self.load_addr as u32);
        push_u32(&mut out, self.load_addr as u32);
        push_u32(&mut out, self.data.len() as u32);
        push_u32(&mut out, (self.data.len() + self.bss) as u32);
        push_u32(&mut out, 7);
        push_u32(&mut out, 4);

        out.extend_from_slice(&self.data);
        out.resize(symtab_off, 0);
        out.extend_from_slice(&syms);
        out.extend_from_slice(&strtab);
        out.extend_from_slice(shstrtab);
        out.resize(shdr_off, 0);

        // Section headers: null, .symtab, .strtab, .shstrtab
        out.extend_from_slice(&[0; SHDR_SIZE]);
        push_shdr(&mut out, 1, SHT_SYMTAB, symtab_off, syms.len(), 2, 1, 4, SYM_SIZE);
        push_shdr(&mut out, 9, SHT_STRTAB, strtab_off, strtab.len(), 0, 0, 1, 0);
        push_shdr(&mut out, 17, SHT_STRTAB, shstrtab_off, shstrtab.len(), 0, 0, 1, 0);
        out
    }
}

/// A complete test image: `_start`, a `_halt` loop, the register-state
/// header and a signature region holding `words`.
pub fn arch_test_elf(words: &[u32]) -> ElfBuilder {
    let mut builder = ElfBuilder::new(LOAD_ADDR)
        .label("_start")
        .word(NOP)
        .label("_halt")
        .word(NOP)
        .word(JUMP_SELF)
        .word(0)
        .label("begin_regstate")
        .word(128)
        .label("end_regstate")
        .word(4)
        .label("begin_signature");
    for &w in words {
        builder = builder.word(w);
    }
    builder.label("end_signature")
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[allow(clippy::too_many_arguments)]
fn push_shdr(
    out: &mut Vec<u8>,
    name: u32,
    kind: u32,
    offset: usize,
    size: usize,
    link: u32,
    info: u32,
    align: u32,
    entsize: usize,
) {
    for v in [
        name,
        kind,
        0,
        0,
        offset as u32,
        size as u32,
        link,
        info,
        align,
        entsize as u32,
    ] {
        push_u32(out, v);
    }
}
