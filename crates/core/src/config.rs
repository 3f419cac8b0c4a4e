// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Immutable per-variant configuration records.
//!
//! One record per supported variant: architecture feature bits, interrupt
//! line count, alignment/rotation policy and the reset values of the ID and
//! system registers. Records never change after the core is constructed;
//! parameter overrides are applied once at build time.

use armlet_config::{RegOverrides, Variant};
use bitflags::bitflags;

bitflags! {
    /// Architecture option bits. The low nibble holds the instruction-set
    /// version; the remaining bits gate instruction families.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ArchFlags: u16 {
        const V4      = 0x0004;
        const V5      = 0x0005;
        const V6      = 0x0006;
        const V7      = 0x0007;
        const LONGMUL = 0x0010;
        const THUMB   = 0x0020;
        const DSP     = 0x0040;
        const DSP2    = 0x0080;
        const BX      = 0x0200;
        const MP      = 0x0800;
        const THUMB2  = 0x1000;
    }
}

impl ArchFlags {
    pub const VERSION_MASK: u16 = 0xf;

    /// Full ARMv7 option set.
    pub fn v7() -> Self {
        ArchFlags::V7
            | ArchFlags::LONGMUL
            | ArchFlags::THUMB
            | ArchFlags::DSP
            | ArchFlags::DSP2
            | ArchFlags::BX
            | ArchFlags::MP
            | ArchFlags::THUMB2
    }

    pub fn version(self) -> u8 {
        (self.bits() & Self::VERSION_MASK) as u8
    }

    /// Does this configuration provide every option bit in `required`
    /// (ignoring the version nibble) at a sufficient version?
    pub fn satisfies(self, required: ArchFlags) -> bool {
        if required.version() > self.version() {
            return false;
        }
        let feature_bits = required.bits() & !Self::VERSION_MASK;
        (self.bits() & feature_bits) == feature_bits
    }
}

/// Reset values for the ID and system registers carried per variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegDefaults {
    pub cpuid: u32,
    pub id_pfr0: u32,
    pub id_pfr1: u32,
    pub id_dfr0: u32,
    pub id_afr0: u32,
    pub id_mmfr: [u32; 4],
    pub id_isar: [u32; 5],
    pub ictr: u32,
    pub actlr: u32,
    pub mpu_type: u32,
    pub syst_calib: u32,
    pub mvfr0: u32,
    pub mvfr1: u32,
}

/// Immutable description of a processor variant.
#[derive(Debug, Clone)]
pub struct VariantConfig {
    pub name: &'static str,
    pub arch: ArchFlags,
    /// External interrupt line count (exception numbers 16..16+n).
    pub num_interrupts: u16,
    /// Rotate unaligned loads instead of faulting (legacy compatibility).
    pub rotate_unaligned: bool,
    /// 64-bit loads/stores are performed as two 32-bit accesses.
    pub align64_as32: bool,
    /// Implemented priority bits minus one.
    pub priority_bits_m1: u8,
    /// Exclusive-reservation granule, log2 words.
    pub erg_words_log2: u8,
    pub regs: RegDefaults,
}

impl VariantConfig {
    /// Look up the record for a named variant and apply overrides.
    pub fn build(variant: Variant, overrides: &RegOverrides) -> Self {
        let mut cfg = match variant {
            Variant::Armv7m => Self::armv7m(),
            Variant::CortexM3 => Self::cortex_m3(),
            Variant::CortexM4 => Self::cortex_m4(),
            Variant::CortexM4F => Self::cortex_m4f(),
        };
        if let Some(v) = overrides.cpuid {
            cfg.regs.cpuid = v;
        }
        if let Some(v) = overrides.mpu_type {
            cfg.regs.mpu_type = v;
        }
        if let Some(bits) = overrides.priority_bits {
            cfg.priority_bits_m1 = bits - 1;
        }
        if let Some(n) = overrides.num_interrupts {
            cfg.num_interrupts = n;
        }
        if let Some(erg) = overrides.erg_words_log2 {
            cfg.erg_words_log2 = erg;
        }
        cfg
    }

    /// Total exception count (16 system exceptions plus interrupt lines).
    pub fn num_exceptions(&self) -> u32 {
        16 + self.num_interrupts as u32
    }

    /// Mask applied to addresses to form an exclusive-reservation tag.
    pub fn exclusive_tag_mask(&self) -> u32 {
        !((4u32 << self.erg_words_log2) - 1)
    }

    /// Mask selecting the implemented bits of a priority byte.
    pub fn priority_mask(&self) -> u8 {
        let bits = self.priority_bits_m1 as u32 + 1;
        (0xffu32 << (8 - bits)) as u8
    }

    fn armv7m() -> Self {
        // bare ISA configuration: minimal ID registers, unaligned loads
        // rotated as the pre-CCR architecture allowed
        VariantConfig {
            name: "ARMv7-M",
            arch: ArchFlags::v7(),
            num_interrupts: 16,
            rotate_unaligned: true,
            align64_as32: true,
            priority_bits_m1: 2,
            erg_words_log2: 3,
            regs: RegDefaults {
                cpuid: 0x410f_c200,
                ..RegDefaults::default()
            },
        }
    }

    fn cortex_m3() -> Self {
        VariantConfig {
            name: "Cortex-M3",
            arch: ArchFlags::v7(),
            num_interrupts: 16,
            rotate_unaligned: false,
            align64_as32: true,
            priority_bits_m1: 2,
            erg_words_log2: 3,
            regs: RegDefaults {
                cpuid: 0x412f_c230,
                id_pfr0: 0x0000_0030,
                id_pfr1: 0x0000_0200,
                id_dfr0: 0,
                id_afr0: 0,
                id_mmfr: [0x0000_0030, 0, 0, 0],
                id_isar: [
                    0x0114_1110,
                    0x0211_1000,
                    0x2111_2231,
                    0x0111_1110,
                    0x0131_0102,
                ],
                ictr: 0,
                actlr: 0,
                mpu_type: 0x0000_0800,
                syst_calib: 0,
                mvfr0: 0,
                mvfr1: 0,
            },
        }
    }

    fn cortex_m4() -> Self {
        VariantConfig {
            name: "Cortex-M4",
            arch: ArchFlags::v7(),
            num_interrupts: 16,
            rotate_unaligned: false,
            align64_as32: true,
            priority_bits_m1: 2,
            erg_words_log2: 3,
            regs: RegDefaults {
                cpuid: 0x410f_c241,
                id_pfr0: 0x0000_0030,
                id_pfr1: 0x0000_0200,
                id_dfr0: 0,
                id_afr0: 0,
                id_mmfr: [0x0000_0030, 0, 0, 0],
                id_isar: [
                    0x0114_1110,
                    0x0211_2000,
                    0x2123_2231,
                    0x0111_1131,
                    0x0131_0132,
                ],
                ictr: 0,
                actlr: 0,
                mpu_type: 0x0000_0800,
                syst_calib: 0,
                mvfr0: 0,
                mvfr1: 0,
            },
        }
    }

    fn cortex_m4f() -> Self {
        let mut cfg = Self::cortex_m4();
        cfg.name = "Cortex-M4F";
        // single-precision FPv4-SP: 16 doubleword registers, hardware
        // divide/sqrt, fused MAC, half-precision converts
        cfg.regs.mvfr0 = 0x1011_0021;
        cfg.regs.mvfr1 = 0x1100_0011;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_satisfies_version_and_features() {
        let v7 = ArchFlags::v7();
        assert!(v7.satisfies(ArchFlags::THUMB2));
        assert!(v7.satisfies(ArchFlags::V7));
        assert!(v7.satisfies(ArchFlags::V6 | ArchFlags::THUMB));
        let v6t = ArchFlags::V6 | ArchFlags::THUMB;
        assert!(!v6t.satisfies(ArchFlags::V7));
        assert!(!v6t.satisfies(ArchFlags::THUMB2));
    }

    #[test]
    fn variant_records() {
        let m3 = VariantConfig::build(Variant::CortexM3, &RegOverrides::default());
        assert_eq!(m3.regs.cpuid, 0x412f_c230);
        assert_eq!(m3.regs.mvfr0, 0);
        let m4f = VariantConfig::build(Variant::CortexM4F, &RegOverrides::default());
        assert_eq!(m4f.regs.cpuid, 0x410f_c241);
        assert_ne!(m4f.regs.mvfr0, 0);
        assert_eq!(m4f.num_exceptions(), 32);
    }

    #[test]
    fn priority_mask_tracks_bit_count() {
        let mut ov = RegOverrides::default();
        let m3 = VariantConfig::build(Variant::CortexM3, &ov);
        assert_eq!(m3.priority_mask(), 0xe0);
        ov.priority_bits = Some(8);
        let m3 = VariantConfig::build(Variant::CortexM3, &ov);
        assert_eq!(m3.priority_mask(), 0xff);
    }

    #[test]
    fn exclusive_granule_mask() {
        let m3 = VariantConfig::build(Variant::CortexM3, &RegOverrides::default());
        // 8-word granule: low 5 bits masked off
        assert_eq!(m3.exclusive_tag_mask(), !0x1f);
    }
}
