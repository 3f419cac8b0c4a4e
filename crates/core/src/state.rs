// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Long-lived processor state: register file, flags with the derived-flag
//! cache, special registers, VFP bank, IT-block state and the exclusive
//! access reservation.

use crate::exception::ExceptionState;
use serde::Serialize;

pub const REG_SP: u8 = 13;
pub const REG_LR: u8 = 14;
pub const REG_PC: u8 = 15;

/// Reservation value meaning "no exclusive access active".
pub const NO_EXCLUSIVE_TAG: u32 = u32::MAX;

/// The four primitive condition flags plus Q and the SIMD GE bits.
///
/// Flags live unpacked; the PSR image is assembled on demand.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Flags {
    pub n: bool,
    pub z: bool,
    pub c: bool,
    pub v: bool,
    pub q: bool,
    pub ge: u8,
}

/// Which primitive flags an operation wrote, for cache invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagWrites {
    pub n: bool,
    pub z: bool,
    pub c: bool,
    pub v: bool,
}

impl FlagWrites {
    pub const NZCV: FlagWrites = FlagWrites { n: true, z: true, c: true, v: true };
    pub const NZ: FlagWrites = FlagWrites { n: true, z: true, c: false, v: false };
    pub const C: FlagWrites = FlagWrites { n: false, z: false, c: true, v: false };
}

/// One lazily computed derived flag.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CachedFlag {
    pub value: bool,
    pub valid: bool,
}

/// Cache of the three derived condition flags.
///
/// HI = C && !Z, LT = N ^ V, LE = Z || LT. Each entry is either valid and
/// consistent with the primitive flags, or invalid and recomputed on first
/// use. Invalidation is exact: a Z write kills HI and LE, an N or V write
/// kills LT and LE, a C write kills HI only.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FlagCache {
    pub hi: CachedFlag,
    pub lt: CachedFlag,
    pub le: CachedFlag,
}

impl FlagCache {
    pub fn invalidate_all(&mut self) {
        self.hi.valid = false;
        self.lt.valid = false;
        self.le.valid = false;
    }

    pub fn invalidate_for(&mut self, wrote: FlagWrites) {
        if wrote.z {
            self.hi.valid = false;
            self.le.valid = false;
        }
        if wrote.n || wrote.v {
            self.lt.valid = false;
            self.le.valid = false;
        }
        if wrote.c {
            self.hi.valid = false;
        }
    }

    pub fn hi(&mut self, flags: &Flags) -> bool {
        if !self.hi.valid {
            self.hi = CachedFlag { value: flags.c && !flags.z, valid: true };
        }
        self.hi.value
    }

    pub fn lt(&mut self, flags: &Flags) -> bool {
        if !self.lt.valid {
            self.lt = CachedFlag { value: flags.n != flags.v, valid: true };
        }
        self.lt.value
    }

    pub fn le(&mut self, flags: &Flags) -> bool {
        if !self.le.valid {
            let lt = self.lt(flags);
            self.le = CachedFlag { value: flags.z || lt, valid: true };
        }
        self.le.value
    }
}

/// CONTROL special register.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Control {
    /// Thread mode is unprivileged.
    pub npriv: bool,
    /// Thread mode uses the process stack.
    pub spsel: bool,
    /// Floating-point context active.
    pub fpca: bool,
}

impl Control {
    pub fn to_bits(self) -> u32 {
        (self.npriv as u32) | ((self.spsel as u32) << 1) | ((self.fpca as u32) << 2)
    }
}

/// Non-flag PSR fields.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Psr {
    /// Thumb state bit. Always set on a healthy M-profile core; clearing it
    /// is the INVSTATE trap condition.
    pub t: bool,
    /// Active exception number (IPSR). Zero in thread mode.
    pub except_num: u16,
    /// Frame was realigned on exception entry (stacked copies only).
    pub align4: bool,
}

/// Mask selecting which PSR fields a write affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsrWrite {
    All,
    NotFlags,
    FlagsOnly,
}

/// Complete mutable core state.
#[derive(Debug)]
pub struct ProcessorState {
    /// r0-r12, active SP (r13), LR (r14); r15 is not stored here, the
    /// program counter lives in `pc`.
    pub regs: [u32; 16],
    pub pc: u32,
    /// Banked copy of whichever stack pointer is not currently in r13.
    pub sp_other_bank: u32,
    /// True when r13 currently holds the process stack pointer.
    pub sp_is_process: bool,
    pub flags: Flags,
    pub derived: FlagCache,
    pub psr: Psr,
    pub it_state: u8,
    pub control: Control,
    pub primask: bool,
    pub faultmask: bool,
    pub basepri: u8,
    /// VFP extension register bank (s0-s31) and FPSCR.
    pub vfp: [u32; 32],
    pub fpscr: u32,
    pub exclusive_tag: u32,
    pub event_register: bool,
    pub exc: ExceptionState,
}

impl ProcessorState {
    pub fn new(num_exceptions: u32) -> Self {
        ProcessorState {
            regs: [0; 16],
            pc: 0,
            sp_other_bank: 0,
            sp_is_process: false,
            flags: Flags::default(),
            derived: FlagCache::default(),
            psr: Psr { t: true, except_num: 0, align4: false },
            it_state: 0,
            control: Control::default(),
            primask: false,
            faultmask: false,
            basepri: 0,
            vfp: [0; 32],
            fpscr: 0,
            exclusive_tag: NO_EXCLUSIVE_TAG,
            event_register: false,
            exc: ExceptionState::new(num_exceptions),
        }
    }

    pub fn reg(&self, r: u8) -> u32 {
        self.regs[r as usize & 0xf]
    }

    pub fn set_reg(&mut self, r: u8, value: u32) {
        self.regs[r as usize & 0xf] = value;
    }

    pub fn in_handler_mode(&self) -> bool {
        self.psr.except_num != 0
    }

    pub fn in_user_mode(&self) -> bool {
        !self.in_handler_mode() && self.control.npriv
    }

    pub fn in_it_block(&self) -> bool {
        self.it_state & 0xf != 0
    }

    /// Select which stack pointer r13 aliases, preserving both banks.
    pub fn set_sp_process(&mut self, use_process: bool) {
        if self.sp_is_process != use_process {
            let active = self.regs[REG_SP as usize];
            self.regs[REG_SP as usize] = self.sp_other_bank;
            self.sp_other_bank = active;
            self.sp_is_process = use_process;
        }
    }

    /// Assemble the architectural xPSR image.
    pub fn read_psr(&self) -> u32 {
        let f = &self.flags;
        let mut psr = 0u32;
        psr |= (f.n as u32) << 31;
        psr |= (f.z as u32) << 30;
        psr |= (f.c as u32) << 29;
        psr |= (f.v as u32) << 28;
        psr |= (f.q as u32) << 27;
        psr |= ((self.it_state & 0x3) as u32) << 25;
        psr |= (self.psr.t as u32) << 24;
        psr |= ((f.ge & 0xf) as u32) << 16;
        psr |= (((self.it_state >> 2) & 0x3f) as u32) << 10;
        psr |= (self.psr.align4 as u32) << 9;
        psr |= (self.psr.except_num & 0x1ff) as u32;
        psr
    }

    /// Write PSR fields selected by `which`. Flag writes invalidate the
    /// derived-flag cache exactly like any other flag producer.
    pub fn write_psr(&mut self, value: u32, which: PsrWrite) {
        if which != PsrWrite::NotFlags {
            self.flags.n = value & (1 << 31) != 0;
            self.flags.z = value & (1 << 30) != 0;
            self.flags.c = value & (1 << 29) != 0;
            self.flags.v = value & (1 << 28) != 0;
            self.flags.q = value & (1 << 27) != 0;
            self.flags.ge = ((value >> 16) & 0xf) as u8;
            self.derived.invalidate_for(FlagWrites::NZCV);
        }
        if which != PsrWrite::FlagsOnly {
            self.psr.t = value & (1 << 24) != 0;
            self.psr.align4 = value & (1 << 9) != 0;
            self.psr.except_num = (value & 0x1ff) as u16;
            self.it_state = (((value >> 25) & 0x3) | (((value >> 10) & 0x3f) << 2)) as u8;
        }
    }

    /// Advance the IT-block shift register by one executed instruction.
    ///
    /// Terminal state auto-clears; a taken branch must call
    /// [`ProcessorState::clear_it_state`] instead.
    pub fn advance_it_state(&mut self) {
        if self.it_state == 0 {
            return;
        }
        if self.it_state & 0x7 == 0 {
            self.it_state = 0;
        } else {
            self.it_state = (self.it_state & 0xe0) | ((self.it_state << 1) & 0x1f);
        }
    }

    pub fn clear_it_state(&mut self) {
        self.it_state = 0;
    }

    /// Effective condition for the next instruction inside an IT block.
    pub fn it_condition(&self) -> Option<u8> {
        if self.it_state == 0 {
            None
        } else {
            Some(self.it_state >> 4)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state() -> ProcessorState {
        ProcessorState::new(32)
    }

    #[test]
    fn psr_roundtrip_preserves_fields() {
        let mut s = state();
        s.flags = Flags { n: true, z: false, c: true, v: false, q: true, ge: 0b1010 };
        s.it_state = 0xa5;
        s.psr.t = true;
        s.psr.except_num = 0x23;
        let image = s.read_psr();

        let mut t = state();
        t.write_psr(image, PsrWrite::All);
        assert_eq!(t.flags.n, true);
        assert_eq!(t.flags.c, true);
        assert_eq!(t.flags.q, true);
        assert_eq!(t.flags.ge, 0b1010);
        assert_eq!(t.it_state, 0xa5);
        assert_eq!(t.psr.except_num, 0x23);
        assert_eq!(t.read_psr(), image);
    }

    #[test]
    fn derived_flags_match_fresh_computation() {
        let mut s = state();
        s.flags = Flags { n: true, z: false, c: true, v: false, q: false, ge: 0 };
        assert_eq!(s.derived.hi(&s.flags), true); // C && !Z
        assert_eq!(s.derived.lt(&s.flags), true); // N ^ V
        assert_eq!(s.derived.le(&s.flags), true); // Z || LT
        assert!(s.derived.hi.valid && s.derived.lt.valid && s.derived.le.valid);
    }

    #[test]
    fn flag_writes_invalidate_exact_dependents() {
        let mut s = state();
        s.derived.hi(&s.flags);
        s.derived.lt(&s.flags);
        s.derived.le(&s.flags);

        s.derived.invalidate_for(FlagWrites { n: false, z: true, c: false, v: false });
        assert!(!s.derived.hi.valid);
        assert!(s.derived.lt.valid);
        assert!(!s.derived.le.valid);

        s.derived.hi(&s.flags);
        s.derived.le(&s.flags);
        s.derived.invalidate_for(FlagWrites { n: false, z: false, c: true, v: false });
        assert!(!s.derived.hi.valid);
        assert!(s.derived.lt.valid);
        assert!(s.derived.le.valid);

        s.derived.hi(&s.flags);
        s.derived.invalidate_for(FlagWrites { n: true, z: false, c: false, v: false });
        assert!(s.derived.hi.valid);
        assert!(!s.derived.lt.valid);
        assert!(!s.derived.le.valid);
    }

    #[test]
    fn cached_hi_consistent_whenever_valid() {
        let mut s = state();
        for bits in 0..16u8 {
            s.flags.n = bits & 1 != 0;
            s.flags.z = bits & 2 != 0;
            s.flags.c = bits & 4 != 0;
            s.flags.v = bits & 8 != 0;
            s.derived.invalidate_all();
            let hi = s.derived.hi(&s.flags);
            assert_eq!(hi, s.flags.c && !s.flags.z);
        }
    }

    #[test]
    fn it_state_counts_down_in_at_most_four_steps() {
        for initial in 1..=0xffu8 {
            if initial & 0xf == 0 {
                continue; // not an active block encoding
            }
            let mut s = state();
            s.it_state = initial;
            let mut steps = 0;
            while s.it_state != 0 {
                s.advance_it_state();
                steps += 1;
                assert!(steps <= 4, "state {initial:#x} failed to terminate");
            }
        }
    }

    #[test]
    fn it_advance_preserves_condition_while_active() {
        let mut s = state();
        // ITTE EQ: cond=0, mask encodes three more slots
        s.it_state = 0x06;
        let cond = s.it_state >> 4;
        s.advance_it_state();
        assert!(s.in_it_block());
        assert_eq!(s.it_state >> 4, cond);
    }

    #[test]
    fn sp_banking_swaps_and_restores() {
        let mut s = state();
        s.regs[13] = 0x2000_1000; // main
        s.sp_other_bank = 0x2000_2000; // process
        s.set_sp_process(true);
        assert_eq!(s.reg(13), 0x2000_2000);
        s.set_reg(13, 0x2000_1ff0);
        s.set_sp_process(false);
        assert_eq!(s.reg(13), 0x2000_1000);
        assert_eq!(s.sp_other_bank, 0x2000_1ff0);
    }
}
