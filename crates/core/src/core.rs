// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The core façade: fetch/decode/lower/execute stepping, the per-address
//! translation cache, special-register access and the FP value helpers.

use crate::bus::{Bus, MemAccess};
use crate::config::VariantConfig;
use crate::decode::{self, DecodeCtx};
use crate::exception::ExcContext;
use crate::morph::interp::{self, Exec};
use crate::morph::ops::{sysm, FCvt, OpBlock};
use crate::morph::LowerCtx;
use crate::ports::OutputEvent;
use crate::state::{ProcessorState, PsrWrite, REG_SP};
use crate::sysregs::Scs;
use crate::systick::SysTick;
use crate::{CoreError, CoreResult};
use armlet_config::SimParams;
use std::collections::HashMap;

struct CachedBlock {
    raw: u32,
    bytes: u8,
    it_state: u8,
    block: OpBlock,
}

/// One simulated ARMv7-M core.
pub struct Core {
    pub state: ProcessorState,
    pub scs: Scs,
    pub cfg: VariantConfig,
    pub params: SimParams,
    pub systick: SysTick,
    /// Output signal queue; the embedder drains it.
    pub outputs: Vec<OutputEvent>,
    pub lockup: bool,
    pub(crate) sleep_reason: u8,
    pub(crate) sleep_on_exit: bool,
    pub instructions_retired: u64,
    cache: HashMap<u32, CachedBlock>,
}

impl Core {
    pub fn new(params: SimParams) -> Self {
        let cfg = VariantConfig::build(params.variant, &params.overrides);
        let scs = Scs::from_config(&cfg);
        let state = ProcessorState::new(cfg.num_exceptions());
        tracing::info!(variant = cfg.name, interrupts = cfg.num_interrupts, "core created");
        Core {
            state,
            scs,
            cfg,
            params,
            systick: SysTick::new(),
            outputs: Vec::new(),
            lockup: false,
            sleep_reason: 0,
            sleep_on_exit: false,
            instructions_retired: 0,
            cache: HashMap::new(),
        }
    }

    /// Hard reset through the reset exception.
    pub fn reset(&mut self, bus: &mut dyn Bus) {
        self.lockup = false;
        self.sleep_reason = 0;
        self.sleep_on_exit = false;
        self.start_exception_reset(bus);
    }

    fn start_exception_reset(&mut self, bus: &mut dyn Bus) {
        self.state.exc.context = ExcContext::PushStack;
        self.state.exc.derived = crate::exception::EXC_NONE;
        self.take_reset(bus);
        if self.state.exc.derived != crate::exception::EXC_NONE {
            self.lockup(0xffff_ffff);
        }
        self.state.exc.context = ExcContext::None;
        self.state.exc.derived = crate::exception::EXC_NONE;
    }

    /// Memory view of the current execution mode.
    pub fn current_access(&self) -> MemAccess {
        if self.state.in_user_mode() {
            MemAccess::User
        } else {
            MemAccess::Privileged
        }
    }

    /// Drop every cached lowering. Required whenever configuration that is
    /// resolved at lower time changes.
    pub fn flush_translation_cache(&mut self) {
        self.cache.clear();
    }

    /// Execute one instruction (or take one pending exception / sleep
    /// tick). Asynchronous exceptions are only taken here, at the fetch
    /// boundary.
    pub fn step(&mut self, bus: &mut dyn Bus) -> CoreResult<()> {
        if self.lockup {
            return Err(CoreError::Lockup { pc: self.state.pc });
        }

        // pending enabled exceptions preempt at the fetch boundary and
        // wake a waiting core
        let eligible = self.exception_eligible(self.state.in_handler_mode());
        if eligible != crate::exception::EXC_NONE {
            let was_sleeping = self.is_sleeping();
            if !was_sleeping || self.restart(crate::exception::SUSPEND_WFI | crate::exception::SUSPEND_WFE) {
                if self.sleep_on_exit {
                    // wake from sleep-on-exit completes the suspended
                    // return by tail-chaining into the pending exception
                    self.sleep_on_exit = false;
                    let exc_return = self.state.reg(crate::state::REG_LR);
                    self.tail_chain_from_sleep(bus, exc_return);
                } else {
                    let return_address = self.state.pc;
                    self.start_exception(bus, eligible, return_address);
                }
                self.systick_tick(bus);
                return Ok(());
            }
        }

        if self.is_sleeping() {
            self.systick_tick(bus);
            return Ok(());
        }

        let pc = self.state.pc & !1;
        let access = self.current_access();

        let hw1 = match bus.read_u16(pc, access) {
            Ok(v) => v,
            Err(_) => {
                self.prefetch_abort(bus, pc);
                self.systick_tick(bus);
                return Ok(());
            }
        };
        let bytes = decode::thumb_instruction_bytes(hw1);
        let hw2 = if bytes == 4 {
            match bus.read_u16(pc + 2, access) {
                Ok(v) => v,
                Err(_) => {
                    self.prefetch_abort(bus, pc);
                    self.systick_tick(bus);
                    return Ok(());
                }
            }
        } else {
            0
        };
        let raw = if bytes == 4 {
            ((hw1 as u32) << 16) | hw2 as u32
        } else {
            hw1 as u32
        };

        // per-address lowering cache, validated by word and IT state
        let it_state = self.state.it_state;
        let cached_ok = matches!(
            self.cache.get(&pc),
            Some(c) if c.raw == raw && c.it_state == it_state
        );
        if !cached_ok {
            let d = decode::decode(
                &DecodeCtx { it_state, ual: self.params.ual },
                pc,
                hw1,
                hw2,
            );
            let ctx = LowerCtx { scs: &self.scs, cfg: &self.cfg, params: &self.params };
            let block = crate::morph::lower(&ctx, &d, true);
            self.cache.insert(pc, CachedBlock { raw, bytes, it_state, block });
        }

        let cached = self.cache.remove(&pc).expect("block cached above");
        let outcome = interp::execute(self, bus, &cached.block, pc, cached.bytes);
        let bytes = cached.bytes;
        self.cache.insert(pc, cached);

        if outcome == Exec::Continue {
            self.state.pc = pc.wrapping_add(bytes as u32);
        }

        self.instructions_retired += 1;
        self.systick_tick(bus);
        Ok(())
    }

    fn systick_tick(&mut self, _bus: &mut dyn Bus) {
        if self.systick.tick() {
            self.raise(crate::exception::EXC_SYSTICK);
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // special registers
    ////////////////////////////////////////////////////////////////////////

    pub fn read_special(&self, which: u8) -> u32 {
        let psr = self.state.read_psr();
        let apsr = psr & 0xf80f_0000;
        let ipsr = psr & 0x1ff;
        let privileged = !self.state.in_user_mode();
        match which {
            sysm::APSR | sysm::EAPSR => apsr,
            sysm::IAPSR | sysm::XPSR => apsr | ipsr,
            sysm::IPSR | sysm::IEPSR => ipsr,
            sysm::EPSR => 0,
            sysm::MSP => {
                if !privileged {
                    0
                } else if self.state.sp_is_process {
                    self.state.sp_other_bank
                } else {
                    self.state.reg(REG_SP)
                }
            }
            sysm::PSP => {
                if !privileged {
                    0
                } else if self.state.sp_is_process {
                    self.state.reg(REG_SP)
                } else {
                    self.state.sp_other_bank
                }
            }
            sysm::PRIMASK => {
                if privileged {
                    self.state.primask as u32
                } else {
                    0
                }
            }
            sysm::BASEPRI | sysm::BASEPRI_MAX => {
                if privileged {
                    self.state.basepri as u32
                } else {
                    0
                }
            }
            sysm::FAULTMASK => {
                if privileged {
                    self.state.faultmask as u32
                } else {
                    0
                }
            }
            sysm::CONTROL => self.state.control.to_bits(),
            sysm::FPSCR => self.state.fpscr,
            _ => 0,
        }
    }

    pub fn write_special(&mut self, which: u8, value: u32, mask: u8) {
        let privileged = !self.state.in_user_mode();
        match which {
            sysm::APSR | sysm::IAPSR | sysm::EAPSR | sysm::XPSR => {
                // mask bit 1 selects the flags, bit 0 the GE field
                if mask & 2 != 0 {
                    let keep_ge = self.state.flags.ge;
                    self.state.write_psr(value, PsrWrite::FlagsOnly);
                    if mask & 1 == 0 {
                        self.state.flags.ge = keep_ge;
                    }
                } else if mask & 1 != 0 {
                    self.state.flags.ge = ((value >> 16) & 0xf) as u8;
                }
            }
            sysm::MSP => {
                if privileged {
                    if self.state.sp_is_process {
                        self.state.sp_other_bank = value & !3;
                    } else {
                        self.state.set_reg(REG_SP, value & !3);
                    }
                }
            }
            sysm::PSP => {
                if privileged {
                    if self.state.sp_is_process {
                        self.state.set_reg(REG_SP, value & !3);
                    } else {
                        self.state.sp_other_bank = value & !3;
                    }
                }
            }
            sysm::PRIMASK => {
                if privileged {
                    self.state.primask = value & 1 != 0;
                    self.refresh_execution_priority_pending_exception();
                }
            }
            sysm::BASEPRI => {
                if privileged {
                    self.state.basepri = (value as u8) & self.cfg.priority_mask();
                    self.refresh_execution_priority_pending_exception();
                }
            }
            sysm::BASEPRI_MAX => {
                if privileged {
                    let new = (value as u8) & self.cfg.priority_mask();
                    let old = self.state.basepri;
                    if new != 0 && (old == 0 || new < old) {
                        self.state.basepri = new;
                        self.refresh_execution_priority_pending_exception();
                    }
                }
            }
            sysm::FAULTMASK => {
                if privileged {
                    if value & 1 != 0 {
                        if self.state.exc.execution_priority > -1 {
                            self.state.faultmask = true;
                        }
                    } else {
                        self.state.faultmask = false;
                    }
                    self.refresh_execution_priority_pending_exception();
                }
            }
            sysm::CONTROL => {
                if privileged {
                    self.state.control.npriv = value & 1 != 0;
                    if !self.state.in_handler_mode() {
                        self.state.set_sp_process(value & 2 != 0);
                        self.state.control.spsel = value & 2 != 0;
                    }
                    if self.scs.fpu_present() {
                        self.state.control.fpca = value & 4 != 0;
                    }
                }
            }
            sysm::FPSCR => {
                self.state.fpscr = value & 0xf7c0_009f;
            }
            _ => {}
        }
    }

    /// CPS: interrupt enable/disable with the mask precedence rules.
    pub fn change_processor_state(&mut self, enable: bool, primask: bool, faultmask: bool) {
        if self.state.in_user_mode() {
            return;
        }
        if enable {
            if primask {
                self.state.primask = false;
            }
            if faultmask {
                self.state.faultmask = false;
            }
        } else {
            if primask {
                self.state.primask = true;
            }
            if faultmask && self.state.exc.execution_priority > -1 {
                self.state.faultmask = true;
            }
        }
        self.refresh_execution_priority_pending_exception();
    }

    ////////////////////////////////////////////////////////////////////////
    // floating-point value helpers
    ////////////////////////////////////////////////////////////////////////

    fn fpscr_dn(&self) -> bool {
        self.state.fpscr & (1 << 25) != 0
    }

    fn fpscr_fz(&self) -> bool {
        self.state.fpscr & (1 << 24) != 0
    }

    /// Post-process an arithmetic result per FPSCR default-NaN and
    /// flush-to-zero controls.
    pub fn fp_fixup(&mut self, value: f32) -> u32 {
        if value.is_nan() {
            self.state.fpscr |= 1; // IOC accumulates on invalid results
            if self.fpscr_dn() {
                return 0x7fc0_0000;
            }
            return value.to_bits();
        }
        if self.fpscr_fz() && value != 0.0 && value.is_subnormal() {
            self.state.fpscr |= 1 << 3; // UFC
            return if value.is_sign_negative() { 0x8000_0000 } else { 0 };
        }
        value.to_bits()
    }

    /// VCMP: write the FPSCR condition flags; the unordered result is
    /// N=0 Z=0 C=1 V=1.
    pub fn fp_compare(&mut self, a: f32, b: f32, quiet_nan_ok: bool) {
        let signaling = |v: f32| v.is_nan() && v.to_bits() & 0x0040_0000 == 0;
        let (n, z, c, v) = if a.is_nan() || b.is_nan() {
            if !quiet_nan_ok || signaling(a) || signaling(b) {
                self.state.fpscr |= 1; // IOC
            }
            (false, false, true, true)
        } else if a == b {
            (false, true, true, false)
        } else if a < b {
            (true, false, false, false)
        } else {
            (false, false, true, false)
        };
        let mut fpscr = self.state.fpscr & 0x0fff_ffff;
        fpscr |= (n as u32) << 31 | (z as u32) << 30 | (c as u32) << 29 | (v as u32) << 28;
        self.state.fpscr = fpscr;
    }

    fn fpscr_round(&self, value: f32) -> f32 {
        match (self.state.fpscr >> 22) & 3 {
            0 => value.round_ties_even(),
            1 => value.ceil(),
            2 => value.floor(),
            _ => value.trunc(),
        }
    }

    /// Conversions. `rd_old` carries the untouched destination bits for
    /// half-width writes.
    pub fn fp_convert(&mut self, kind: FCvt, raw: u32, rd_old: u32) -> u32 {
        match kind {
            FCvt::IntToF32 { signed } => {
                let value = if signed {
                    raw as i32 as f32
                } else {
                    raw as f32
                };
                self.fp_fixup(value)
            }
            FCvt::F32ToInt { signed, round_fpscr } => {
                let f = f32::from_bits(raw);
                if f.is_nan() {
                    self.state.fpscr |= 1;
                    return 0;
                }
                let rounded = if round_fpscr { self.fpscr_round(f) } else { f.trunc() };
                if signed {
                    let clamped = rounded.clamp(i32::MIN as f32, i32::MAX as f32);
                    clamped as i32 as u32
                } else {
                    let clamped = rounded.clamp(0.0, u32::MAX as f32);
                    clamped as u32
                }
            }
            FCvt::FixToF32 { signed, fbits, size16 } => {
                let int_value = match (signed, size16) {
                    (true, true) => raw as u16 as i16 as i64,
                    (true, false) => raw as i32 as i64,
                    (false, true) => (raw & 0xffff) as i64,
                    (false, false) => raw as i64,
                };
                let value = int_value as f64 / (1u64 << fbits) as f64;
                self.fp_fixup(value as f32)
            }
            FCvt::F32ToFix { signed, fbits, size16 } => {
                let f = f32::from_bits(raw);
                if f.is_nan() {
                    self.state.fpscr |= 1;
                    return 0;
                }
                let scaled = (f as f64 * (1u64 << fbits) as f64).trunc();
                match (signed, size16) {
                    (true, true) => {
                        let v = scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
                        v as i32 as u32
                    }
                    (true, false) => scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32 as u32,
                    (false, true) => scaled.clamp(0.0, u16::MAX as f64) as u32,
                    (false, false) => scaled.clamp(0.0, u32::MAX as f64) as u32,
                }
            }
            FCvt::HalfToF32 { top } => {
                let h = if top { (raw >> 16) as u16 } else { raw as u16 };
                self.fp_fixup(f16_to_f32(h))
            }
            FCvt::F32ToHalf { top } => {
                let h = f32_to_f16(f32::from_bits(raw)) as u32;
                if top {
                    (rd_old & 0x0000_ffff) | (h << 16)
                } else {
                    (rd_old & 0xffff_0000) | h
                }
            }
        }
    }
}

/// IEEE-754 half to single.
fn f16_to_f32(h: u16) -> f32 {
    let sign = (h >> 15) as u32;
    let exp = ((h >> 10) & 0x1f) as u32;
    let frac = (h & 0x3ff) as u32;
    let bits = if exp == 0 {
        if frac == 0 {
            sign << 31
        } else {
            // subnormal half: normalize
            let shift = frac.leading_zeros() - 21;
            let frac = (frac << shift) & 0x3ff;
            let exp = 113 - shift;
            (sign << 31) | (exp << 23) | (frac << 13)
        }
    } else if exp == 0x1f {
        (sign << 31) | 0x7f80_0000 | (frac << 13)
    } else {
        (sign << 31) | ((exp + 127 - 15) << 23) | (frac << 13)
    };
    f32::from_bits(bits)
}

/// IEEE-754 single to half, round to nearest even.
fn f32_to_f16(f: f32) -> u16 {
    let bits = f.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let frac = bits & 0x7f_ffff;

    if exp == 0xff {
        // infinity or NaN
        return if frac == 0 {
            sign | 0x7c00
        } else {
            sign | 0x7e00 | ((frac >> 13) as u16 & 0x1ff) | 0x200
        };
    }

    let unbiased = exp - 127;
    if unbiased > 15 {
        return sign | 0x7c00; // overflow to infinity
    }
    if unbiased >= -14 {
        // normal half
        let mut h = ((unbiased + 15) as u32) << 10 | (frac >> 13);
        // round to nearest even on the truncated bits
        let rem = frac & 0x1fff;
        if rem > 0x1000 || (rem == 0x1000 && h & 1 != 0) {
            h += 1;
        }
        return sign | h as u16;
    }
    if unbiased >= -24 {
        // subnormal half
        let full = frac | 0x80_0000;
        let shift = (-14 - unbiased) as u32 + 13;
        let mut h = full >> shift;
        let rem = full & ((1 << shift) - 1);
        let half_point = 1 << (shift - 1);
        if rem > half_point || (rem == half_point && h & 1 != 0) {
            h += 1;
        }
        return sign | h as u16;
    }
    sign // underflow to zero
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn half_precision_roundtrip() {
        for value in [0.0f32, 1.0, -1.0, 0.5, 65504.0, -2.0, 0.099975586] {
            let h = f32_to_f16(value);
            let back = f16_to_f32(h);
            assert_eq!(back, value, "{value} did not survive the round trip");
        }
    }

    #[test]
    fn half_overflow_saturates_to_infinity() {
        assert_eq!(f32_to_f16(1.0e6), 0x7c00);
        assert_eq!(f32_to_f16(-1.0e6), 0xfc00);
        assert!(f16_to_f32(0x7c00).is_infinite());
    }

    #[test]
    fn half_nan_stays_nan() {
        let h = f32_to_f16(f32::NAN);
        assert!(f16_to_f32(h).is_nan());
    }
}
