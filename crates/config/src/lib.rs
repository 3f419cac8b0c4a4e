// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! External parameter surface for the core model.
//!
//! Everything an embedder can configure without touching core internals is
//! collected here: variant selection, endianness, compatibility quirks,
//! register-value overrides and the verbosity/debug toggles. The core crate
//! consumes a validated [`SimParams`] and never re-parses user input.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Processor variants understood by the model.
///
/// `Armv7m` is the bare ISA configuration; the Cortex entries carry full
/// ID-register defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Armv7m,
    CortexM3,
    CortexM4,
    CortexM4F,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Armv7m => "ARMv7-M",
            Variant::CortexM3 => "Cortex-M3",
            Variant::CortexM4 => "Cortex-M4",
            Variant::CortexM4F => "Cortex-M4F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Compatibility mode: strict architecture behavior, or quirk-for-quirk
/// compatibility with common debugger / toolchain expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatMode {
    #[default]
    Isa,
    Gdb,
    Toolchain,
}

/// Register-value overrides. `None` keeps the variant default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegOverrides {
    pub cpuid: Option<u32>,
    pub mpu_type: Option<u32>,
    /// Number of implemented priority bits (3..=8).
    pub priority_bits: Option<u8>,
    /// Number of external interrupt lines (1..=496).
    pub num_interrupts: Option<u16>,
    /// Exclusive-reservation granule as log2 words (ERG).
    pub erg_words_log2: Option<u8>,
}

/// Complete simulation parameter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub variant: Variant,
    pub endian: Endian,
    pub compat: CompatMode,
    pub overrides: RegOverrides,
    /// Log the offending PC and reason for every fault/escalation/lockup.
    pub verbose: bool,
    /// Take simulated exceptions for faults; when false, faults terminate
    /// with a diagnostic instead (disassembly/analysis runs want this).
    pub simulate_exceptions: bool,
    /// Use UAL syntax conventions when deriving flag behavior outside
    /// IT blocks.
    pub ual: bool,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            variant: Variant::CortexM3,
            endian: Endian::Little,
            compat: CompatMode::Isa,
            overrides: RegOverrides::default(),
            verbose: false,
            simulate_exceptions: true,
            ual: true,
        }
    }
}

impl SimParams {
    /// Load parameters from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read params from {}", path.display()))?;
        let params: SimParams = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse params from {}", path.display()))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if let Some(bits) = self.overrides.priority_bits {
            if !(3..=8).contains(&bits) {
                bail!("priority_bits override {} outside supported range 3..=8", bits);
            }
        }
        if let Some(n) = self.overrides.num_interrupts {
            if n == 0 || n > 496 {
                bail!("num_interrupts override {} outside supported range 1..=496", n);
            }
        }
        if let Some(erg) = self.overrides.erg_words_log2 {
            if !(1..=9).contains(&erg) {
                bail!("erg_words_log2 override {} outside supported range 1..=9", erg);
            }
        }
        if self.variant == Variant::Armv7m && self.overrides.num_interrupts.is_none() {
            tracing::debug!("bare ISA variant selected; defaulting to 16 interrupt lines");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let params = SimParams::default();
        params.validate().unwrap();
        assert_eq!(params.variant, Variant::CortexM3);
        assert_eq!(params.endian, Endian::Little);
    }

    #[test]
    fn roundtrip_json() {
        let params = SimParams {
            variant: Variant::CortexM4F,
            verbose: true,
            ..Default::default()
        };
        let text = serde_json::to_string(&params).unwrap();
        let back: SimParams = serde_json::from_str(&text).unwrap();
        assert_eq!(back.variant, Variant::CortexM4F);
        assert!(back.verbose);
    }

    #[test]
    fn rejects_bad_priority_bits() {
        let mut params = SimParams::default();
        params.overrides.priority_bits = Some(2);
        assert!(params.validate().is_err());
        params.overrides.priority_bits = Some(8);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn rejects_bad_interrupt_count() {
        let mut params = SimParams::default();
        params.overrides.num_interrupts = Some(0);
        assert!(params.validate().is_err());
        params.overrides.num_interrupts = Some(497);
        assert!(params.validate().is_err());
        params.overrides.num_interrupts = Some(240);
        assert!(params.validate().is_ok());
    }
}
