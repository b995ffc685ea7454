// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rvmodel::halt::ENTRY_SYMBOL;
use rvmodel::signature::{
    DATA_ALIGN, END_REGSTATE_OFFSET, HEADER_ALIGN, HEADER_SIZE, REGSTATE_SIZE,
    SIGNATURE_WORD_SIZE,
};
use rvmodel_config::{PlatformDescriptor, SymbolNames};
use rvmodel_core::bus::SystemBus;
use rvmodel_core::signature::{Signature, SignatureSymbols};
use rvmodel_loader::{ArchTestElf, SymbolError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

const EXIT_PASS: u8 = 0;
const EXIT_VIOLATION: u8 = 1;
const EXIT_INPUT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the target contract for a platform
    Layout {
        /// Path to the platform description (YAML)
        #[arg(short, long)]
        platform: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
    /// Validate an architectural test ELF against the contract
    Check {
        /// Path to the test ELF file
        elf: PathBuf,

        /// Path to the platform description (YAML)
        #[arg(short, long)]
        platform: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
    /// Write the signature region of a test, one word per line
    Signature {
        /// Path to the test ELF file
        elf: PathBuf,

        /// Path to the platform description (YAML)
        #[arg(short, long)]
        platform: Option<PathBuf>,

        /// Raw memory dump taken from the target after it halted
        #[arg(long, requires = "dump_base")]
        dump: Option<PathBuf>,

        /// Load address of the first byte of --dump
        #[arg(long, value_parser = parse_addr, requires = "dump")]
        dump_base: Option<u64>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Pass,
    Violation,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Layout { platform, json } => run_layout(platform.as_deref(), json),
        Command::Check {
            elf,
            platform,
            json,
        } => run_check(&elf, platform.as_deref(), json),
        Command::Signature {
            elf,
            platform,
            dump,
            dump_base,
            output,
        } => run_signature(
            &elf,
            platform.as_deref(),
            dump.as_deref().zip(dump_base),
            output.as_deref(),
        ),
    };

    match result {
        Ok(Verdict::Pass) => ExitCode::from(EXIT_PASS),
        Ok(Verdict::Violation) => ExitCode::from(EXIT_VIOLATION),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_INPUT_ERROR)
        }
    }
}

fn parse_addr(s: &str) -> Result<u64, String> {
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

fn load_platform(path: Option<&Path>) -> Result<PlatformDescriptor> {
    match path {
        Some(path) => {
            info!("Loading platform description: {:?}", path);
            PlatformDescriptor::from_file(path)
        }
        None => {
            info!("Using default platform");
            Ok(PlatformDescriptor::default())
        }
    }
}

/// Reads an ELF file and returns it with its SHA-256 digest.
fn read_elf(path: &Path) -> Result<(Vec<u8>, String)> {
    let buffer =
        std::fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    let hash = format!("{:x}", Sha256::digest(&buffer));
    info!("Loaded {:?} ({} bytes, sha256 {})", path, buffer.len(), hash);
    Ok((buffer, hash))
}

fn is_symbol_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<SymbolError>())
}

/// Resolves the contract labels. Missing or duplicate labels are a contract
/// violation rather than an input error.
fn parse_test(buffer: &[u8], names: &SymbolNames) -> Result<Result<ArchTestElf, String>> {
    match ArchTestElf::parse(buffer, names) {
        Ok(test) => Ok(Ok(test)),
        Err(e) if is_symbol_error(&e) => Ok(Err(format!("{:#}", e))),
        Err(e) => Err(e),
    }
}

fn load_into_bus(test: &ArchTestElf, platform: &PlatformDescriptor) -> Result<SystemBus> {
    let mut bus = SystemBus::from_config(platform)?;
    for segment in &test.image.segments {
        if !bus.load_segment(segment) {
            warn!(
                "Segment at {:#x} ({} bytes) lies outside platform RAM",
                segment.start_addr,
                segment.data.len()
            );
        }
    }
    Ok(bus)
}

#[derive(Debug, Serialize)]
struct HeaderLayout {
    regstate_size: u32,
    signature_word_size: u32,
    size: usize,
    align: usize,
    end_regstate_offset: usize,
}

#[derive(Debug, Serialize)]
struct MemoryLayout {
    base: u64,
    size: u64,
}

#[derive(Debug, Serialize)]
struct MsipLayout {
    addr: u64,
    set: u32,
}

#[derive(Debug, Serialize)]
struct LayoutReport<'a> {
    platform: &'a str,
    xlen: u32,
    header: HeaderLayout,
    data_align: usize,
    signature_fill: u32,
    ram: MemoryLayout,
    msip: MsipLayout,
    symbols: &'a SymbolNames,
}

fn run_layout(platform: Option<&Path>, json: bool) -> Result<Verdict> {
    let platform = load_platform(platform)?;
    let report = LayoutReport {
        platform: &platform.name,
        xlen: platform.xlen,
        header: HeaderLayout {
            regstate_size: REGSTATE_SIZE,
            signature_word_size: SIGNATURE_WORD_SIZE,
            size: HEADER_SIZE,
            align: HEADER_ALIGN,
            end_regstate_offset: END_REGSTATE_OFFSET,
        },
        data_align: DATA_ALIGN,
        signature_fill: platform.signature_fill,
        ram: MemoryLayout {
            base: platform.ram.base,
            size: platform.ram_size()?,
        },
        msip: MsipLayout {
            addr: platform.clint.base,
            set: platform.clint.msip_set,
        },
        symbols: &platform.symbols,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(Verdict::Pass);
    }

    let s = report.symbols;
    println!("Platform:  {} (RV{})", report.platform, report.xlen);
    println!("RAM:       {:#010x} + {:#x}", report.ram.base, report.ram.size);
    println!(
        "MSIP:      {:#010x} (assert {:#x}, clear 0)",
        report.msip.addr, report.msip.set
    );
    println!(
        "Header:    {} = {}, {} = {} ({} bytes, {}-byte aligned)",
        s.begin_regstate,
        REGSTATE_SIZE,
        s.end_regstate,
        SIGNATURE_WORD_SIZE,
        HEADER_SIZE,
        HEADER_ALIGN
    );
    println!(
        "Signature: {} at header+{}, {}-byte words up to {} (fill {:#010x})",
        s.begin_signature,
        HEADER_SIZE,
        DATA_ALIGN,
        s.end_signature,
        report.signature_fill
    );
    println!("Halt:      {}", s.halt);
    Ok(Verdict::Pass)
}

#[derive(Debug, Serialize)]
struct CheckReport {
    file: String,
    sha256: String,
    status: &'static str,
    entry_point: u64,
    halt: Option<u64>,
    symbols: Option<SignatureSymbols>,
    signature_words: u64,
    violations: Vec<String>,
    warnings: Vec<String>,
}

fn run_check(path: &Path, platform: Option<&Path>, json: bool) -> Result<Verdict> {
    let platform = load_platform(platform)?;
    let (buffer, sha256) = read_elf(path)?;
    let image = rvmodel_loader::parse_image(&buffer)?;

    let mut report = CheckReport {
        file: path.display().to_string(),
        sha256,
        status: "pass",
        entry_point: image.entry_point,
        halt: None,
        symbols: None,
        signature_words: 0,
        violations: Vec::new(),
        warnings: Vec::new(),
    };

    match parse_test(&buffer, &platform.symbols)? {
        Ok(test) => inspect(&test, &platform, &mut report)?,
        Err(violation) => report.violations.push(violation),
    }

    let verdict = if report.violations.is_empty() {
        Verdict::Pass
    } else {
        report.status = "fail";
        Verdict::Violation
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for w in &report.warnings {
            println!("warning: {}", w);
        }
        for v in &report.violations {
            println!("violation: {}", v);
        }
        println!("{}: {}", report.file, report.status.to_uppercase());
    }
    Ok(verdict)
}

fn inspect(
    test: &ArchTestElf,
    platform: &PlatformDescriptor,
    report: &mut CheckReport,
) -> Result<()> {
    let sig = test.signature;
    report.halt = Some(test.halt_addr);
    report.symbols = Some(sig);
    report.signature_words = sig.len_bytes() / SIGNATURE_WORD_SIZE as u64;

    if let Err(e) = sig.check_layout() {
        report.violations.push(e.to_string());
    }
    let ram_size = platform.ram_size()?;
    if sig.len_bytes() > ram_size {
        report.violations.push(format!(
            "Signature region of {} bytes is larger than platform RAM ({} bytes)",
            sig.len_bytes(),
            ram_size
        ));
    }
    if sig.end_regstate != sig.begin_regstate.saturating_add(END_REGSTATE_OFFSET as u64) {
        report.warnings.push(format!(
            "end_regstate at {:#010x} is not begin_regstate+{}",
            sig.end_regstate, END_REGSTATE_OFFSET
        ));
    }
    if sig.begin_signature != sig.begin_regstate.saturating_add(HEADER_SIZE as u64) {
        report.warnings.push(format!(
            "begin_signature at {:#010x} does not directly follow the header",
            sig.begin_signature
        ));
    }

    let bus = load_into_bus(test, platform)?;
    if let Err(e) = sig.check_header(&bus) {
        report.violations.push(e.to_string());
    }

    if test.image.read_u8(test.image.entry_point).is_none() {
        report.violations.push(format!(
            "Entry point {:#010x} is not inside a loaded segment",
            test.image.entry_point
        ));
    }
    if let Ok(start) = test.symbols.unique_addr(ENTRY_SYMBOL) {
        if start != test.image.entry_point {
            report.warnings.push(format!(
                "ELF entry point {:#010x} is not {} ({:#010x})",
                test.image.entry_point, ENTRY_SYMBOL, start
            ));
        }
    }
    if test.image.read_u8(test.halt_addr).is_none() {
        report.violations.push(format!(
            "Halt label at {:#010x} is not inside a loaded segment",
            test.halt_addr
        ));
    }
    if sig.len_bytes() == 0 {
        report
            .warnings
            .push("Signature region is empty; no signature will be produced".to_string());
    }
    Ok(())
}

fn run_signature(
    path: &Path,
    platform: Option<&Path>,
    dump: Option<(&Path, u64)>,
    output: Option<&Path>,
) -> Result<Verdict> {
    let platform = load_platform(platform)?;
    let (buffer, _) = read_elf(path)?;

    let test = match parse_test(&buffer, &platform.symbols)? {
        Ok(test) => test,
        Err(violation) => {
            error!("{}", violation);
            return Ok(Verdict::Violation);
        }
    };

    let mut bus = load_into_bus(&test, &platform)?;
    if let Some((dump_path, base)) = dump {
        let bytes = std::fs::read(dump_path)
            .with_context(|| format!("Failed to read memory dump: {:?}", dump_path))?;
        let copied = bus.overlay(base, &bytes);
        info!("Overlaid {} dump bytes at {:#x}", copied, base);
        if copied < bytes.len() {
            warn!(
                "{} dump bytes fall outside platform RAM",
                bytes.len() - copied
            );
        }
    }

    let symbols = test.signature;
    let signature = match Signature::extract(&bus, &symbols, platform.ram_size()?) {
        Ok(sig) => sig,
        Err(e) => {
            error!("{}", e);
            return Ok(Verdict::Violation);
        }
    };
    if let Err(e) = symbols.check_header(&bus) {
        error!("{}", e);
        return Ok(Verdict::Violation);
    }

    if signature.is_empty() {
        warn!("No signature produced");
    }

    match output {
        Some(out) => {
            let file = std::fs::File::create(out)
                .with_context(|| format!("Failed to create output file: {:?}", out))?;
            let mut writer = BufWriter::new(file);
            signature.write_to(&mut writer)?;
            writer.flush()?;
            info!("Wrote {} signature words to {:?}", signature.words().len(), out);
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            signature.write_to(&mut lock)?;
            lock.flush()?;
        }
    }
    Ok(Verdict::Pass)
}
