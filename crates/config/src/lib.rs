// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use rvmodel::halt::HALT_SYMBOL;
use rvmodel::signature::{
    BEGIN_REGSTATE_SYMBOL, BEGIN_SIGNATURE_SYMBOL, END_REGSTATE_SYMBOL, END_SIGNATURE_SYMBOL,
};
use rvmodel::{Msip, PlatformConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported xlen {0}. Supported: 32, 64")]
    UnsupportedXlen(u32),
    #[error("RAM size must be greater than zero")]
    EmptyRam,
    #[error("CLINT base {0:#x} is not 4-byte aligned")]
    MisalignedClint(u64),
    #[error("CLINT msip_set {0:#x} is not the MSIP pending bit (0x1)")]
    UnsupportedMsipSet(u32),
    #[error("Limit 'max_steps' must be greater than zero")]
    ZeroMaxSteps,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemoryRange {
    pub base: u64,
    pub size: String, // e.g. "2MiB"
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClintConfig {
    #[serde(default = "default_clint_base")]
    pub base: u64,
    #[serde(default = "default_msip_set")]
    pub msip_set: u32,
}

fn default_clint_base() -> u64 {
    PlatformConfig::DEFAULT.msip_addr as u64
}

fn default_msip_set() -> u32 {
    PlatformConfig::DEFAULT.msip_set
}

impl Default for ClintConfig {
    fn default() -> Self {
        Self {
            base: default_clint_base(),
            msip_set: default_msip_set(),
        }
    }
}

/// Names of the contract symbols, for toolchains that mangle or prefix them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolNames {
    pub halt: String,
    pub begin_regstate: String,
    pub end_regstate: String,
    pub begin_signature: String,
    pub end_signature: String,
}

impl Default for SymbolNames {
    fn default() -> Self {
        Self {
            halt: HALT_SYMBOL.to_string(),
            begin_regstate: BEGIN_REGSTATE_SYMBOL.to_string(),
            end_regstate: END_REGSTATE_SYMBOL.to_string(),
            begin_signature: BEGIN_SIGNATURE_SYMBOL.to_string(),
            end_signature: END_SIGNATURE_SYMBOL.to_string(),
        }
    }
}

fn default_xlen() -> u32 {
    32
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PlatformDescriptor {
    pub name: String,
    #[serde(default = "default_xlen")]
    pub xlen: u32,
    pub ram: MemoryRange,
    #[serde(default)]
    pub clint: ClintConfig,
    #[serde(default)]
    pub signature_fill: u32,
    #[serde(default)]
    pub symbols: SymbolNames,
}

impl Default for PlatformDescriptor {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            xlen: default_xlen(),
            ram: MemoryRange {
                base: 0x8000_0000,
                size: "2MiB".to_string(),
            },
            clint: ClintConfig::default(),
            signature_fill: PlatformConfig::DEFAULT.signature_fill,
            symbols: SymbolNames::default(),
        }
    }
}

impl PlatformDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open platform description at {:?}", path.as_ref()))?;
        let platform: Self =
            serde_yaml::from_reader(f).context("Failed to parse Platform Description")?;
        platform.validate()?;
        Ok(platform)
    }

    pub fn validate(&self) -> Result<()> {
        if self.xlen != 32 && self.xlen != 64 {
            anyhow::bail!(ConfigError::UnsupportedXlen(self.xlen));
        }
        if self.ram_size()? == 0 {
            anyhow::bail!(ConfigError::EmptyRam);
        }
        if self.clint.base % 4 != 0 {
            anyhow::bail!(ConfigError::MisalignedClint(self.clint.base));
        }
        // MSIP implements bit 0 only; any other pattern would not read back.
        if self.clint.msip_set != Msip::PENDING.bits() {
            anyhow::bail!(ConfigError::UnsupportedMsipSet(self.clint.msip_set));
        }
        Ok(())
    }

    pub fn ram_size(&self) -> Result<u64> {
        parse_size(&self.ram.size).with_context(|| format!("Invalid RAM size '{}'", self.ram.size))
    }

    /// The target-side view of this platform.
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            msip_addr: self.clint.base as usize,
            msip_set: self.clint.msip_set,
            signature_fill: self.signature_fill,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunLimits {
    pub max_steps: u64,
    #[serde(default)]
    pub wall_time_ms: Option<u64>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            wall_time_ms: None,
        }
    }
}

impl RunLimits {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            anyhow::bail!(ConfigError::ZeroMaxSteps);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Halt,
    MaxSteps,
    WallTime,
    MemoryViolation,
    Fault,
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    if let Ok(bytes) = size_str.trim().parse::<u64>() {
        return Ok(bytes);
    }
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
