// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{anyhow, Context, Result};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use rvmodel_config::SymbolNames;
use rvmodel_core::memory::ProgramImage;
use rvmodel_core::signature::SignatureSymbols;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Largest PT_LOAD segment the loader will materialise, `.bss` included.
pub const MAX_SEGMENT_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("Cannot find symbol: {0:?}")]
    Missing(String),
    #[error("Symbol {name:?} is not unique ({count} definitions)")]
    NotUnique { name: String, count: usize },
}

pub fn load_elf(path: &Path) -> Result<ProgramImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    parse_image(&buffer)
}

pub fn parse_image(buffer: &[u8]) -> Result<ProgramImage> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;
    image_from_elf(&elf, buffer)
}

fn image_from_elf(elf: &Elf, buffer: &[u8]) -> Result<ProgramImage> {
    info!("ELF Entry Point: {:#x}", elf.entry);

    let mut program_image = ProgramImage::new(elf.entry);

    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD {
            continue;
        }
        // Symbols are virtual addresses, so segments are placed the same way.
        let start_addr = ph.p_vaddr;
        let file_size = ph.p_filesz as usize;
        let mem_size = ph.p_memsz as usize;
        let offset = ph.p_offset as usize;

        if mem_size == 0 {
            continue;
        }
        if mem_size > MAX_SEGMENT_SIZE {
            return Err(anyhow!(
                "Segment at {:#x} needs {} bytes of memory, more than the {}-byte limit",
                start_addr,
                mem_size,
                MAX_SEGMENT_SIZE
            ));
        }
        if file_size > mem_size {
            return Err(anyhow!(
                "Segment at {:#x} has file size {} larger than memory size {}",
                start_addr,
                file_size,
                mem_size
            ));
        }

        debug!(
            "Found Loadable Segment: Addr={:#x}, FileSize={}, MemSize={}, Offset={:#x}",
            start_addr, file_size, mem_size, offset
        );

        let file_bytes = offset
            .checked_add(file_size)
            .and_then(|end| buffer.get(offset..end))
            .ok_or_else(|| anyhow!("Segment out of bounds in ELF file"))?;

        // The tail past p_filesz is zero-initialised (.bss).
        let mut segment_data = file_bytes.to_vec();
        segment_data.resize(mem_size, 0);
        program_image.add_segment(start_addr, segment_data);
    }

    if program_image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    Ok(program_image)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub addr: u64,
    pub size: u64,
}

/// Every named symbol in `.symtab`, keeping duplicates.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Vec<Symbol>>,
}

impl SymbolTable {
    pub fn from_elf(elf: &Elf) -> Self {
        let mut symbols: HashMap<String, Vec<Symbol>> = HashMap::new();
        for sym in elf.syms.iter() {
            let Some(name) = elf.strtab.get_at(sym.st_name) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            symbols.entry(name.to_string()).or_default().push(Symbol {
                addr: sym.st_value,
                size: sym.st_size,
            });
        }
        debug!("Read {} distinct symbol names", symbols.len());
        Self { symbols }
    }

    pub fn get(&self, name: &str) -> &[Symbol] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single definition of `name`; zero or several is an error.
    pub fn unique_symbol(&self, name: &str) -> Result<Symbol, SymbolError> {
        match self.get(name) {
            [] => Err(SymbolError::Missing(name.to_string())),
            [sym] => Ok(*sym),
            many => Err(SymbolError::NotUnique {
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    pub fn unique_addr(&self, name: &str) -> Result<u64, SymbolError> {
        self.unique_symbol(name).map(|sym| sym.addr)
    }
}

/// A test image with its contract labels resolved.
#[derive(Debug)]
pub struct ArchTestElf {
    pub image: ProgramImage,
    pub symbols: SymbolTable,
    pub halt_addr: u64,
    pub signature: SignatureSymbols,
}

impl ArchTestElf {
    pub fn load(path: &Path, names: &SymbolNames) -> Result<Self> {
        let buffer =
            fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
        Self::parse(&buffer, names).with_context(|| format!("Invalid test image {:?}", path))
    }

    pub fn parse(buffer: &[u8], names: &SymbolNames) -> Result<Self> {
        let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;
        let image = image_from_elf(&elf, buffer)?;
        let symbols = SymbolTable::from_elf(&elf);

        let halt_addr = symbols.unique_addr(&names.halt)?;
        let signature = SignatureSymbols {
            begin_regstate: symbols.unique_addr(&names.begin_regstate)?,
            end_regstate: symbols.unique_addr(&names.end_regstate)?,
            begin_signature: symbols.unique_addr(&names.begin_signature)?,
            end_signature: symbols.unique_addr(&names.end_signature)?,
        };
        debug!(
            "Halt at {:#x}, signature {:#x}..{:#x}",
            halt_addr, signature.begin_signature, signature.end_signature
        );

        Ok(Self {
            image,
            symbols,
            halt_addr,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{arch_test_elf, ElfBuilder, LOAD_ADDR};

    #[test]
    fn test_segment_is_zero_filled_to_mem_size() {
        let bytes = ElfBuilder::new(LOAD_ADDR)
            .data(&[1, 2, 3, 4])
            .bss(8)
            .build();
        let image = parse_image(&bytes).unwrap();

        assert_eq!(image.entry_point, LOAD_ADDR);
        assert_eq!(image.segments.len(), 1);
        assert_eq!(image.segments[0].start_addr, LOAD_ADDR);
        assert_eq!(image.segments[0].data, [1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_oversized_bss_is_refused() {
        let bytes = ElfBuilder::new(LOAD_ADDR)
            .data(&[0; 4])
            .bss(0x4000_0000)
            .build();
        let err = parse_image(&bytes).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_image(b"not an elf").is_err());
    }

    #[test]
    fn test_unique_symbol() {
        let bytes = ElfBuilder::new(LOAD_ADDR)
            .data(&[0; 16])
            .symbol("_halt", LOAD_ADDR + 4)
            .symbol("twice", LOAD_ADDR)
            .symbol("twice", LOAD_ADDR + 8)
            .build();
        let elf = Elf::parse(&bytes).unwrap();
        let table = SymbolTable::from_elf(&elf);

        assert_eq!(table.unique_addr("_halt").unwrap(), LOAD_ADDR + 4);
        assert_eq!(
            table.unique_symbol("missing"),
            Err(SymbolError::Missing("missing".to_string()))
        );
        assert_eq!(
            table.unique_symbol("twice"),
            Err(SymbolError::NotUnique {
                name: "twice".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn test_arch_test_elf_resolves_contract_labels() {
        let bytes = arch_test_elf(&[0xDEAD_BEEF, 0]).build();
        let test = ArchTestElf::parse(&bytes, &SymbolNames::default()).unwrap();

        let sig = test.signature;
        assert_eq!(sig.end_regstate, sig.begin_regstate + 4);
        assert_eq!(sig.begin_signature, sig.begin_regstate + 8);
        assert_eq!(sig.len_bytes(), 8);
        assert!(sig.check_layout().is_ok());
        assert_eq!(test.image.read_u8(sig.begin_regstate), Some(128));
        assert_eq!(test.image.read_u8(sig.end_regstate), Some(4));
        assert_eq!(test.image.read_u8(sig.begin_signature), Some(0xEF));
        assert!(test.halt_addr > test.image.entry_point);
    }

    #[test]
    fn test_missing_contract_label_is_an_error() {
        let bytes = ElfBuilder::new(LOAD_ADDR).data(&[0; 4]).build();
        let err = ArchTestElf::parse(&bytes, &SymbolNames::default()).unwrap_err();
        assert!(err.to_string().contains("_halt"));
    }

    #[test]
    fn test_renamed_symbols() {
        let bytes = arch_test_elf(&[1])
            .rename("_halt", "__rvmodel_halt")
            .build();
        let names = SymbolNames {
            halt: "__rvmodel_halt".to_string(),
            ..SymbolNames::default()
        };
        assert!(ArchTestElf::parse(&bytes, &names).is_ok());
        assert!(ArchTestElf::parse(&bytes, &SymbolNames::default()).is_err());
    }
}
