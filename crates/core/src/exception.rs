// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Exception and interrupt controller.
//!
//! Maintains per-exception pending/active/enabled state and priorities,
//! recomputes the execution priority (unboosted, then boosted by
//! FAULTMASK/PRIMASK/BASEPRI), and implements the exception entry and
//! return sequences: escalation, frame stacking with derived-fault
//! capture, tail-chaining, lazy floating-point state preservation and the
//! terminal lockup state.

use crate::bus::{Bus, MemAccess};
use crate::core::Core;
use crate::ports::OutputEvent;
use crate::state::{REG_LR, REG_SP};
use crate::sysregs::*;

pub const EXC_NONE: u32 = 0;
pub const EXC_RESET: u32 = 1;
pub const EXC_NMI: u32 = 2;
pub const EXC_HARDFAULT: u32 = 3;
pub const EXC_MEMMANAGE: u32 = 4;
pub const EXC_BUSFAULT: u32 = 5;
pub const EXC_USAGEFAULT: u32 = 6;
pub const EXC_SVCALL: u32 = 11;
pub const EXC_DEBUGMONITOR: u32 = 12;
pub const EXC_PENDSV: u32 = 14;
pub const EXC_SYSTICK: u32 = 15;
pub const EXC_EXTERNAL0: u32 = 16;

/// Priority value above every real priority.
pub const EXC_NO_PRIORITY: i32 = 0x100;

/// Exception-return type field (bits 3:0 of the EXC_RETURN value).
const RET_HANDLER_MAIN: u32 = 1;
const RET_THREAD_MAIN: u32 = 9;
const RET_THREAD_PROCESS: u32 = 13;

/// Suspend reasons (wait-for-event, wait-for-interrupt, lockup).
pub const SUSPEND_WFI: u8 = 0x1;
pub const SUSPEND_WFE: u8 = 0x2;
pub const SUSPEND_LOCKUP: u8 = 0x4;

/// Where the controller currently is, for derived-fault attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcContext {
    #[default]
    None,
    PushStack,
    PopStack,
    PreserveFp,
}

/// Per-exception bookkeeping embedded in the processor state.
#[derive(Debug)]
pub struct ExceptionState {
    num_exceptions: u32,
    pend: Vec<u32>,
    active: Vec<u32>,
    enable: Vec<u32>,
    priority: Vec<u8>,
    pub unboosted_priority: i32,
    pub execution_priority: i32,
    /// Highest-priority pending exception (0 when none).
    pub pending_exception: u32,
    /// Highest-priority pending *and enabled* exception (0 when none).
    pub enabled_exception: u32,
    pub nested_activation: u32,
    pub pending_interrupt: bool,
    pub derived: u32,
    pub context: ExcContext,
}

impl ExceptionState {
    pub fn new(num_exceptions: u32) -> Self {
        let words = ((num_exceptions + 31) / 32) as usize;
        let mut exc = ExceptionState {
            num_exceptions,
            pend: vec![0; words],
            active: vec![0; words],
            enable: vec![0; words],
            priority: vec![0; num_exceptions as usize],
            unboosted_priority: EXC_NO_PRIORITY,
            execution_priority: EXC_NO_PRIORITY,
            pending_exception: EXC_NONE,
            enabled_exception: EXC_NONE,
            nested_activation: 0,
            pending_interrupt: false,
            derived: EXC_NONE,
            context: ExcContext::None,
        };
        for num in [
            EXC_RESET,
            EXC_NMI,
            EXC_HARDFAULT,
            EXC_SVCALL,
            EXC_DEBUGMONITOR,
            EXC_PENDSV,
            EXC_SYSTICK,
        ] {
            exc.set_enable(num, true);
        }
        exc
    }

    pub fn num_exceptions(&self) -> u32 {
        self.num_exceptions
    }

    fn bit(map: &[u32], num: u32) -> bool {
        map[(num / 32) as usize] & (1 << (num % 32)) != 0
    }

    fn set_bit(map: &mut [u32], num: u32, value: bool) {
        let word = &mut map[(num / 32) as usize];
        if value {
            *word |= 1 << (num % 32);
        } else {
            *word &= !(1 << (num % 32));
        }
    }

    pub fn is_pending(&self, num: u32) -> bool {
        Self::bit(&self.pend, num)
    }

    pub fn is_active(&self, num: u32) -> bool {
        Self::bit(&self.active, num)
    }

    pub fn is_enabled(&self, num: u32) -> bool {
        Self::bit(&self.enable, num)
    }

    pub fn set_pending_bit(&mut self, num: u32, value: bool) {
        Self::set_bit(&mut self.pend, num, value);
    }

    pub fn set_active_bit(&mut self, num: u32, value: bool) {
        Self::set_bit(&mut self.active, num, value);
    }

    pub fn set_enable(&mut self, num: u32, value: bool) {
        Self::set_bit(&mut self.enable, num, value);
    }

    pub fn priority_byte(&self, num: u32) -> u8 {
        self.priority[num as usize]
    }

    pub fn set_priority_byte(&mut self, num: u32, value: u8) {
        self.priority[num as usize] = value;
    }

    /// Iterate set bits of a bitmap, in exception-number order.
    fn iter_bits(map: &[u32]) -> impl Iterator<Item = u32> + '_ {
        map.iter().enumerate().flat_map(|(word_idx, &word)| {
            (0..32)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| word_idx as u32 * 32 + bit)
        })
    }
}

/// Candidate during highest-priority selection.
#[derive(Clone, Copy)]
struct ExcDesc {
    num: u32,
    group: i32,
    sub: u32,
}

impl ExcDesc {
    fn none() -> Self {
        ExcDesc { num: EXC_NONE, group: EXC_NO_PRIORITY, sub: 0 }
    }
}

impl Core {
    ////////////////////////////////////////////////////////////////////////
    // priority computation
    ////////////////////////////////////////////////////////////////////////

    fn sub_priority_mask(&self) -> u32 {
        (2 << self.scs.prigroup()) - 1
    }

    /// Group priority: Reset/NMI/HardFault are fixed at -3/-2/-1; the rest
    /// take their configured byte with the sub-priority bits masked off.
    pub fn group_priority(&self, num: u32) -> i32 {
        if num < 4 {
            num as i32 - 4
        } else {
            (self.state.exc.priority_byte(num) as u32 & !self.sub_priority_mask()) as i32
        }
    }

    pub fn sub_priority(&self, num: u32) -> u32 {
        if num < 4 {
            0
        } else {
            self.state.exc.priority_byte(num) as u32 & self.sub_priority_mask()
        }
    }

    /// Enabled *and* strictly higher priority than the current execution
    /// priority.
    fn exception_takeable(&self, num: u32) -> bool {
        self.state.exc.is_enabled(num)
            && self.group_priority(num) < self.state.exc.execution_priority
    }

    /// The pending enabled exception to take now, if any, given the
    /// current mode.
    pub fn exception_eligible(&self, handler_mode: bool) -> u32 {
        let num = self.state.exc.enabled_exception;
        if num == EXC_NONE {
            EXC_NONE
        } else if !handler_mode {
            num
        } else if self.group_priority(num) < self.state.exc.execution_priority {
            num
        } else {
            EXC_NONE
        }
    }

    fn select_highest(&self, desc: &mut ExcDesc, num: u32) {
        let group = self.group_priority(num);
        let sub = self.sub_priority(num);
        if group < desc.group || (group == desc.group && sub < desc.sub) {
            *desc = ExcDesc { num, group, sub };
        }
    }

    fn refresh_boosted_priority(&mut self) {
        let old = self.state.exc.execution_priority;
        let mut new = self.state.exc.unboosted_priority;
        let basepri = self.state.basepri as i32;

        if self.state.faultmask && new > -1 {
            new = -1;
        } else if self.state.primask && new > 0 {
            new = 0;
        } else if basepri != 0 && new > basepri {
            new = basepri;
        }

        if old != new {
            tracing::debug!(old, new, "execution priority change");
            self.state.exc.execution_priority = new;
        }
    }

    pub fn refresh_unboosted_priority(&mut self) {
        let mut desc = ExcDesc::none();
        let active: Vec<u32> = ExceptionState::iter_bits(&self.state.exc.active).collect();
        for num in active {
            self.select_highest(&mut desc, num);
        }
        self.state.exc.unboosted_priority = desc.group;
        self.refresh_boosted_priority();
    }

    pub fn refresh_pending_exception(&mut self) {
        let mut pending_desc = ExcDesc::none();
        let mut enabled_desc = ExcDesc::none();
        let mut pending_interrupt = false;

        let pend: Vec<u32> = ExceptionState::iter_bits(&self.state.exc.pend).collect();
        for num in pend {
            if num >= EXC_EXTERNAL0 {
                pending_interrupt = true;
            }
            self.select_highest(&mut pending_desc, num);
            if self.exception_takeable(num) {
                self.select_highest(&mut enabled_desc, num);
            }
        }

        self.state.exc.pending_interrupt = pending_interrupt;
        if self.state.exc.pending_exception != pending_desc.num {
            tracing::debug!(from = self.state.exc.pending_exception, to = pending_desc.num, "pending exception change");
            self.state.exc.pending_exception = pending_desc.num;
        }
        if self.state.exc.enabled_exception != enabled_desc.num {
            tracing::debug!(from = self.state.exc.enabled_exception, to = enabled_desc.num, "enabled exception change");
            self.state.exc.enabled_exception = enabled_desc.num;
        }
    }

    pub fn refresh_execution_priority_pending_exception(&mut self) {
        self.refresh_unboosted_priority();
        self.refresh_pending_exception();
    }

    /// ICSR.RETTOBASE: no active exception besides the current one.
    pub fn ret_to_base(&self) -> bool {
        ExceptionState::iter_bits(&self.state.exc.active)
            .all(|num| num == self.state.psr.except_num as u32)
    }

    ////////////////////////////////////////////////////////////////////////
    // raise/lower/activate/deactivate
    ////////////////////////////////////////////////////////////////////////

    pub fn raise(&mut self, num: u32) {
        if num == EXC_RESET {
            self.restart(SUSPEND_WFE | SUSPEND_WFI | SUSPEND_LOCKUP);
        } else if !self.state.exc.is_pending(num) && self.scs.sevonpend() {
            self.restart(SUSPEND_WFE);
        }
        // set the pending bit after any restart
        self.state.exc.set_pending_bit(num, true);
        self.refresh_pending_exception();
        // an enabled pending exception ends a wait-for-interrupt
        if self.exception_eligible(self.state.in_handler_mode()) != EXC_NONE {
            self.restart(SUSPEND_WFE | SUSPEND_WFI);
        }
    }

    pub fn lower_exception(&mut self, num: u32) {
        self.state.exc.set_pending_bit(num, false);
        if num == self.state.exc.enabled_exception {
            self.refresh_pending_exception();
        }
    }

    fn activate(&mut self, num: u32) {
        self.state.exc.set_pending_bit(num, false);
        self.state.exc.set_active_bit(num, true);
        self.state.exc.nested_activation += 1;
        self.refresh_unboosted_priority();
        self.refresh_pending_exception();
    }

    fn deactivate(&mut self, num: u32) {
        self.state.exc.set_active_bit(num, false);
        // FAULTMASK clears on any return except from NMI
        if self.state.psr.except_num as u32 != EXC_NMI {
            self.state.faultmask = false;
        }
        self.state.exc.nested_activation = self.state.exc.nested_activation.saturating_sub(1);
        self.refresh_unboosted_priority();
        self.refresh_pending_exception();
    }

    fn deactivate_all(&mut self) {
        for word in self.state.exc.pend.iter_mut() {
            *word = 0;
        }
        for word in self.state.exc.active.iter_mut() {
            *word = 0;
        }
        self.state.exc.nested_activation = 0;
        self.refresh_unboosted_priority();
        self.refresh_pending_exception();
    }

    ////////////////////////////////////////////////////////////////////////
    // suspend and restart
    ////////////////////////////////////////////////////////////////////////

    pub fn suspend(&mut self, reason: u8) {
        self.sleep_reason |= reason;
    }

    /// Clear matching suspend reasons; true when the core was restarted.
    pub fn restart(&mut self, reasons: u8) -> bool {
        if self.sleep_reason & reasons != 0 && self.sleep_reason & SUSPEND_LOCKUP == 0 {
            self.sleep_reason &= !reasons;
            true
        } else {
            false
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleep_reason != 0
    }

    /// Terminal lockup. The simulation continues but the core no longer
    /// executes instructions.
    pub fn lockup(&mut self, halt_pc: u32) {
        if self.params.verbose {
            tracing::error!("processor entered lockup state at {halt_pc:#010x}");
        }
        self.lockup = true;
        self.sleep_reason |= SUSPEND_LOCKUP;
        self.outputs.push(OutputEvent::Lockup);
    }

    fn clear_exclusive_local(&mut self) {
        self.state.exclusive_tag = crate::state::NO_EXCLUSIVE_TAG;
    }

    fn set_event_register(&mut self) {
        self.state.event_register = !self.restart(SUSPEND_WFE);
    }

    pub fn wait_for_event(&mut self) {
        if self.state.event_register {
            self.state.event_register = false;
        } else {
            self.suspend(SUSPEND_WFE);
        }
    }

    pub fn wait_for_interrupt(&mut self) {
        if self.exception_eligible(self.state.in_handler_mode()) == EXC_NONE {
            self.suspend(SUSPEND_WFI);
        }
    }

    pub fn send_event(&mut self) {
        self.set_event_register();
        self.outputs.push(OutputEvent::EventOut);
    }

    ////////////////////////////////////////////////////////////////////////
    // stacking
    ////////////////////////////////////////////////////////////////////////

    /// Memory view used for stacking and vector reads at the given
    /// priority. Without MPU regions every branch resolves to the
    /// privileged view; the structure mirrors the architected selection.
    fn priority_stack_access(&self, _priority: i32) -> MemAccess {
        if !self.scs.mpu_enabled() {
            MemAccess::Privileged
        } else if _priority >= 0 || self.scs.mpu_hfnmiena() {
            MemAccess::Privileged
        } else {
            MemAccess::Privileged
        }
    }

    /// Store one word during exception stacking; a failure records the
    /// context-appropriate fault status and a derived BusFault.
    fn stack_store(&mut self, bus: &mut dyn Bus, access: MemAccess, addr: u32, value: u32) -> bool {
        if self.state.exc.derived != EXC_NONE {
            return false;
        }
        match bus.write_u32(addr, value, access) {
            Ok(()) => true,
            Err(_) => {
                self.record_stacking_fault(addr);
                false
            }
        }
    }

    fn stack_load(&mut self, bus: &mut dyn Bus, access: MemAccess, addr: u32) -> Option<u32> {
        if self.state.exc.derived != EXC_NONE {
            return None;
        }
        match bus.read_u32(addr, access) {
            Ok(v) => Some(v),
            Err(_) => {
                self.record_stacking_fault(addr);
                None
            }
        }
    }

    fn record_stacking_fault(&mut self, addr: u32) {
        match self.state.exc.context {
            ExcContext::PushStack => self.scs.cfsr |= CFSR_STKERR,
            ExcContext::PopStack => self.scs.cfsr |= CFSR_UNSTKERR,
            ExcContext::PreserveFp => self.scs.cfsr |= CFSR_LSPERR,
            ExcContext::None => {
                self.scs.cfsr |= CFSR_PRECISERR | CFSR_BFARVALID;
                self.scs.bfar = addr;
            }
        }
        self.state.exc.derived = EXC_BUSFAULT;
        if self.params.verbose {
            tracing::warn!(
                "bus fault at {addr:#010x} during exception stacking ({:?})",
                self.state.exc.context
            );
        }
    }

    /// Save the FP register file to its reserved stack area.
    fn push_fp(&mut self, bus: &mut dyn Bus, access: MemAccess, frame: u32) -> bool {
        for i in 0..16 {
            let value = self.state.vfp[i as usize];
            if !self.stack_store(bus, access, frame + i * 4, value) {
                return false;
            }
        }
        self.stack_store(bus, access, frame + 64, self.state.fpscr)
    }

    /// UpdateFPCCR: reserve lazy-save space and record readiness bits.
    fn update_fpccr(&mut self, frameptr: u32) {
        if self.state.control.fpca && self.scs.fp_lspen() {
            let fp_frame = frameptr + 0x20;
            let pri = self.state.exc.execution_priority;
            self.scs.fpcar = fp_frame & !7;
            self.scs.set_fp_lspact(true);
            let bfrdy = self.state.exc.is_enabled(EXC_BUSFAULT)
                && pri > self.state.exc.priority_byte(EXC_BUSFAULT) as i32;
            let mmrdy = self.state.exc.is_enabled(EXC_MEMMANAGE)
                && pri > self.state.exc.priority_byte(EXC_MEMMANAGE) as i32;
            let monrdy = self.state.exc.is_enabled(EXC_DEBUGMONITOR)
                && pri > self.state.exc.priority_byte(EXC_DEBUGMONITOR) as i32;
            self.scs.set_fpccr_entry_fields(
                self.state.in_user_mode(),
                !self.state.in_handler_mode(),
                pri > -1,
                bfrdy,
                mmrdy,
                monrdy,
            );
        }
    }

    /// PushStack: write the 8-word frame (plus FP extension when active)
    /// and leave the EXC_RETURN value in LR.
    fn push_stack(&mut self, bus: &mut dyn Bus, access: MemAccess, return_address: u32) {
        let fp_active = self.scs.fpu_present() && self.state.control.fpca;
        let frame_size = if fp_active { 0x68 } else { 0x20 };
        let mut frameptr = self.state.reg(REG_SP).wrapping_sub(frame_size);
        let realign = (self.scs.stkalign() || fp_active) && frameptr & 4 != 0;
        if realign {
            frameptr &= !4;
        }
        self.state.set_reg(REG_SP, frameptr);

        let mut psr = self.state.read_psr();
        if realign {
            psr |= 1 << 9;
        } else {
            psr &= !(1 << 9);
        }

        let all_stored = self.stack_store(bus, access, frameptr, self.state.reg(0))
            && self.stack_store(bus, access, frameptr + 0x4, self.state.reg(1))
            && self.stack_store(bus, access, frameptr + 0x8, self.state.reg(2))
            && self.stack_store(bus, access, frameptr + 0xc, self.state.reg(3))
            && self.stack_store(bus, access, frameptr + 0x10, self.state.reg(12))
            && self.stack_store(bus, access, frameptr + 0x14, self.state.reg(REG_LR))
            && self.stack_store(bus, access, frameptr + 0x18, return_address)
            && self.stack_store(bus, access, frameptr + 0x1c, psr);

        if all_stored && fp_active {
            if !self.scs.fp_lspen() {
                if self.vfp_access_allowed() {
                    self.push_fp(bus, access, frameptr + 0x20);
                }
            } else {
                self.update_fpccr(frameptr);
            }
        }

        let return_type = if self.state.in_handler_mode() {
            RET_HANDLER_MAIN
        } else if !self.state.sp_is_process {
            RET_THREAD_MAIN
        } else {
            RET_THREAD_PROCESS
        };

        let lr = if fp_active {
            0xffff_ffe0 | return_type
        } else {
            0xffff_fff0 | return_type
        };
        self.state.set_reg(REG_LR, lr);
    }

    /// Restore the FP state on exception return. `Some(true)` means the
    /// register file must be loaded from the frame.
    fn pop_fp(
        &mut self,
        bus: &mut dyn Bus,
        access: MemAccess,
        frameptr: u32,
        fp: &mut [u32; 17],
    ) -> Option<bool> {
        if self.scs.fp_lspact() {
            // the interrupted context never used FP: the reservation is
            // simply dropped
            self.scs.set_fp_lspact(false);
            Some(false)
        } else if !self.vfp_access_allowed() {
            None
        } else {
            let fp_frame = frameptr + 0x20;
            for (i, slot) in fp.iter_mut().enumerate().take(16) {
                *slot = self.stack_load(bus, access, fp_frame + i as u32 * 4)?;
            }
            fp[16] = self.stack_load(bus, access, fp_frame + 64)?;
            Some(true)
        }
    }

    /// PopStack: validate and restore the frame; inconsistencies surface
    /// as a derived UsageFault without committing anything.
    fn pop_stack(
        &mut self,
        bus: &mut dyn Bus,
        access: MemAccess,
        exc_return: u32,
        required_handler_mode: bool,
    ) {
        let fpca = exc_return & 0x10 == 0;
        let fp_active = self.scs.fpu_present() && fpca;
        let frame_size: u32 = if fp_active { 0x68 } else { 0x20 };
        let frameptr = self.state.reg(REG_SP);

        let mut fp = [0u32; 17];
        let loaded = (|| {
            let r0 = self.stack_load(bus, access, frameptr)?;
            let r1 = self.stack_load(bus, access, frameptr + 0x4)?;
            let r2 = self.stack_load(bus, access, frameptr + 0x8)?;
            let r3 = self.stack_load(bus, access, frameptr + 0xc)?;
            let r12 = self.stack_load(bus, access, frameptr + 0x10)?;
            let lr = self.stack_load(bus, access, frameptr + 0x14)?;
            let pc = self.stack_load(bus, access, frameptr + 0x18)?;
            let psr = self.stack_load(bus, access, frameptr + 0x1c)?;
            let restore_fp = if fp_active {
                self.pop_fp(bus, access, frameptr, &mut fp)?
            } else {
                false
            };
            Some((r0, r1, r2, r3, r12, lr, pc, psr, restore_fp))
        })();

        let Some((r0, r1, r2, r3, r12, lr, pc, psr, restore_fp)) = loaded else {
            return;
        };

        let actual_handler_mode = psr & 0x1ff != 0;
        let stacked_t = psr & (1 << 24) != 0;

        if self.scs.fpu_present() {
            self.state.control.fpca = fpca;
        }

        if !(stacked_t && required_handler_mode == actual_handler_mode) {
            self.scs.cfsr |= CFSR_INVPC;
            self.state.exc.derived = EXC_USAGEFAULT;
            return;
        }

        self.state.set_reg(0, r0);
        self.state.set_reg(1, r1);
        self.state.set_reg(2, r2);
        self.state.set_reg(3, r3);
        self.state.set_reg(12, r12);
        self.state.set_reg(REG_LR, lr);
        if restore_fp {
            self.state.vfp[..16].copy_from_slice(&fp[..16]);
            self.state.fpscr = fp[16];
        }

        self.state.pc = pc & !1;

        let mut sp = self.state.reg(REG_SP).wrapping_add(frame_size);
        if psr & (1 << 9) != 0 && (self.scs.stkalign() || fp_active) {
            sp |= 4;
        }
        self.state.set_reg(REG_SP, sp);

        self.state.write_psr(psr, crate::state::PsrWrite::All);
    }

    ////////////////////////////////////////////////////////////////////////
    // entry
    ////////////////////////////////////////////////////////////////////////

    /// Reset exception: reinitialize special registers and jump through
    /// vector slot 0/1.
    pub fn take_reset(&mut self, bus: &mut dyn Bus) {
        let table = self.scs.vtor;
        let access = MemAccess::Privileged;
        let sp = match bus.read_u32(table, access) {
            Ok(v) => v,
            Err(_) => {
                self.record_vector_fault(table);
                return;
            }
        };
        let pc = match bus.read_u32(table + 4, access) {
            Ok(v) => v,
            Err(_) => {
                self.record_vector_fault(table + 4);
                return;
            }
        };

        self.state.set_sp_process(false);
        self.state.set_reg(REG_SP, sp & 0xffff_fffc);
        self.state.sp_other_bank = 0;
        self.state.set_reg(REG_LR, 0xffff_ffff);

        self.state.write_psr(0, crate::state::PsrWrite::All);
        self.state.psr.t = pc & 1 != 0;

        self.state.control = Default::default();
        self.state.primask = false;
        self.state.faultmask = false;
        self.state.basepri = 0;
        self.scs.reset_volatile();
        self.systick.reset();
        self.state.fpscr = 0;

        self.deactivate_all();
        self.clear_exclusive_local();
        self.set_event_register();
        self.flush_translation_cache();

        self.state.pc = pc & !1;
    }

    fn record_vector_fault(&mut self, addr: u32) {
        self.scs.hfsr |= HFSR_VECTTBL;
        self.state.exc.derived = EXC_HARDFAULT;
        if self.params.verbose {
            tracing::warn!("vector table read failed at {addr:#010x}");
        }
    }

    /// Common exception entry: load the vector, switch to handler mode on
    /// the main stack, mark active and jump.
    fn take_exception(&mut self, bus: &mut dyn Bus, num: u32) {
        let table = self.scs.vtor;
        let access = self.priority_stack_access(self.group_priority(num));
        let pc = match bus.read_u32(table + 4 * num, access) {
            Ok(v) => v,
            Err(_) => {
                self.record_vector_fault(table + 4 * num);
                return;
            }
        };

        if self.params.verbose {
            tracing::info!("taking exception {num}, handler {:#010x}", pc & !1);
        }

        // all PSR fields except the flags
        self.state.psr.t = pc & 1 != 0;
        self.state.psr.except_num = num as u16;
        self.state.it_state = 0;

        if self.scs.fpu_present() {
            self.state.control.fpca = false;
        }
        self.state.set_sp_process(false);
        self.activate(num);
        self.clear_exclusive_local();
        self.set_event_register();

        if num >= EXC_EXTERNAL0 {
            self.outputs.push(OutputEvent::InterruptServiceStarted(num - EXC_EXTERNAL0));
        }

        self.state.pc = pc & !1;
    }

    /// Escalate to HardFault when the target exception cannot preempt,
    /// recording why.
    fn escalate_priority(&mut self, num: u32) -> u32 {
        if self.exception_takeable(num) {
            num
        } else {
            if num == EXC_DEBUGMONITOR {
                self.scs.hfsr |= HFSR_DEBUGEVT;
            } else {
                self.scs.hfsr |= HFSR_FORCED;
            }
            if self.params.verbose {
                tracing::warn!(from = num, "escalating exception to HardFault");
            }
            EXC_HARDFAULT
        }
    }

    /// Full exception entry from instruction execution or an external
    /// event: escalation, stacking, vector fetch and derived-fault
    /// handling up to lockup.
    pub fn start_exception(&mut self, bus: &mut dyn Bus, num: u32, return_address: u32) {
        let old_priority = self.state.exc.execution_priority;

        if self.state.exc.context == ExcContext::PreserveFp {
            tracing::error!("exception during lazy FP state preservation; entering lockup");
            self.lockup(return_address);
            return;
        }

        let num = self.escalate_priority(num);

        self.state.exc.context = ExcContext::PushStack;
        self.state.exc.derived = EXC_NONE;

        let lockup_derived;
        if num == EXC_RESET {
            lockup_derived = true;
            self.take_reset(bus);
        } else {
            lockup_derived = old_priority < 0;
            let access = self.priority_stack_access(self.group_priority(num));
            self.push_stack(bus, access, return_address);
            if !(lockup_derived && self.state.exc.derived != EXC_NONE) {
                self.take_exception(bus, num);
            }
        }

        let derived = self.state.exc.derived;
        if derived != EXC_NONE {
            if lockup_derived {
                self.lockup(0xffff_ffff);
            } else {
                let escalated = self.escalate_priority(derived);
                self.raise(escalated);
            }
        }
        self.state.exc.context = ExcContext::None;
        self.state.exc.derived = EXC_NONE;
    }

    /// Tail-chained entry into a derived exception: the stacked frame is
    /// preserved, only the vector changes.
    fn derived_exception(&mut self, bus: &mut dyn Bus, num: u32, exc_return: u32) {
        self.state.set_reg(REG_LR, exc_return);
        self.deactivate(self.state.psr.except_num as u32);
        let escalated = self.escalate_priority(num);
        self.take_exception(bus, escalated);
    }

    ////////////////////////////////////////////////////////////////////////
    // return
    ////////////////////////////////////////////////////////////////////////

    pub fn exception_return(&mut self, bus: &mut dyn Bus, exc_return: u32) {
        let returning = self.state.psr.except_num as u32;
        let ret_type = exc_return & 0xf;
        let handler_mode = ret_type == RET_HANDLER_MAIN;

        debug_assert!(self.state.in_handler_mode(), "exception return requires handler mode");

        self.state.exc.derived = EXC_NONE;

        if !self.state.exc.is_active(returning) {
            self.scs.cfsr |= CFSR_INVPC;
            self.state.exc.derived = EXC_USAGEFAULT;
        } else {
            match ret_type {
                RET_HANDLER_MAIN => {
                    if self.state.exc.nested_activation == 1 {
                        self.scs.cfsr |= CFSR_INVPC;
                        self.state.exc.derived = EXC_USAGEFAULT;
                    } else {
                        self.state.set_sp_process(false);
                    }
                }
                RET_THREAD_MAIN => {
                    if self.state.exc.nested_activation != 1 && !self.scs.nonbasethrdena() {
                        self.scs.cfsr |= CFSR_INVPC;
                        self.state.exc.derived = EXC_USAGEFAULT;
                    } else {
                        self.state.set_sp_process(false);
                    }
                }
                RET_THREAD_PROCESS => {
                    if self.state.exc.nested_activation != 1 && !self.scs.nonbasethrdena() {
                        self.scs.cfsr |= CFSR_INVPC;
                        self.state.exc.derived = EXC_USAGEFAULT;
                    } else {
                        self.state.set_sp_process(true);
                    }
                }
                _ => {
                    self.scs.cfsr |= CFSR_INVPC;
                    self.state.exc.derived = EXC_USAGEFAULT;
                }
            }
        }

        if self.state.exc.derived == EXC_NONE {
            // stack view selected before deactivation can change priority
            let access = self.priority_stack_access(self.state.exc.execution_priority);

            self.deactivate(returning);

            let chained = self.exception_eligible(handler_mode);
            if chained != EXC_NONE {
                // tail-chain: skip the pop/push pair entirely
                if self.params.verbose {
                    tracing::info!(from = returning, to = chained, "tail-chaining exception");
                }
                self.state.set_reg(REG_LR, exc_return);
                self.take_exception(bus, chained);
            } else if returning >= EXC_EXTERNAL0 && self.scs.sleeponexit() {
                self.state.set_reg(REG_LR, exc_return);
                self.suspend(SUSPEND_WFI);
                self.sleep_on_exit = true;
            } else {
                self.state.exc.context = ExcContext::PopStack;
                self.pop_stack(bus, access, exc_return, handler_mode);
                self.state.exc.context = ExcContext::None;

                // failed restore: undo the deactivation depth before the
                // derived exception tail-chains at this activation level
                if self.state.exc.derived != EXC_NONE {
                    self.state.exc.nested_activation += 1;
                }
            }

            self.clear_exclusive_local();
            self.set_event_register();
        }

        let derived = self.state.exc.derived;
        if derived != EXC_NONE {
            if self.state.exc.execution_priority < 0 && returning == EXC_NMI {
                self.lockup(0xffff_ffff);
            } else {
                self.derived_exception(bus, derived, exc_return);
            }
            self.state.exc.derived = EXC_NONE;
        }
    }

    /// Complete a return suspended by SCR.SLEEPONEXIT: the stacked frame
    /// is still live, so the wakeup exception tail-chains directly.
    pub(crate) fn tail_chain_from_sleep(&mut self, bus: &mut dyn Bus, exc_return: u32) {
        let handler_mode = exc_return & 0xf == RET_HANDLER_MAIN;
        let chained = self.exception_eligible(handler_mode);
        if chained != EXC_NONE {
            self.state.set_reg(REG_LR, exc_return);
            self.take_exception(bus, chained);
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // fault funnels from instruction execution
    ////////////////////////////////////////////////////////////////////////

    fn simulated_fault(&mut self, pc: u32, what: &str) -> bool {
        if self.params.simulate_exceptions {
            return true;
        }
        tracing::error!(
            "{what} at {pc:#010x} with simulated exceptions disabled; entering lockup"
        );
        self.lockup(pc);
        false
    }

    pub fn usage_fault(&mut self, bus: &mut dyn Bus, pc: u32, reason: u32) {
        self.scs.cfsr |= reason;
        if self.params.verbose {
            tracing::warn!("usage fault at {pc:#010x} (status {reason:#010x})");
        }
        if self.simulated_fault(pc, "usage fault") {
            self.start_exception(bus, EXC_USAGEFAULT, pc);
        }
    }

    /// Precise data bus fault from a load/store.
    pub fn data_abort(&mut self, bus: &mut dyn Bus, pc: u32, addr: u32, is_write: bool) {
        self.scs.cfsr |= CFSR_PRECISERR | CFSR_BFARVALID;
        self.scs.bfar = addr;
        if self.params.verbose {
            tracing::warn!(
                "data bus fault at {pc:#010x}, address {addr:#010x}, write={is_write}"
            );
        }
        if self.simulated_fault(pc, "bus fault") {
            self.start_exception(bus, EXC_BUSFAULT, pc);
        }
    }

    /// Instruction fetch bus fault.
    pub fn prefetch_abort(&mut self, bus: &mut dyn Bus, pc: u32) {
        self.scs.cfsr |= CFSR_IBUSERR;
        if self.params.verbose {
            tracing::warn!("prefetch abort at {pc:#010x}");
        }
        if self.simulated_fault(pc, "prefetch abort") {
            self.start_exception(bus, EXC_BUSFAULT, pc);
        }
    }

    pub fn supervisor_call(&mut self, bus: &mut dyn Bus, return_address: u32) {
        self.start_exception(bus, EXC_SVCALL, return_address);
    }

    pub fn breakpoint(&mut self, bus: &mut dyn Bus, pc: u32) {
        if self.state.exc.execution_priority < 0 {
            self.lockup(pc);
        } else {
            self.start_exception(bus, EXC_DEBUGMONITOR, pc);
        }
    }

    /// Interworking register branch: handler-mode jumps to the EXC_RETURN
    /// sentinel perform an exception return; otherwise bit 0 selects the
    /// (mandatory) Thumb state.
    pub fn branch_interworking(&mut self, bus: &mut dyn Bus, pc: u32, target: u32) {
        if !self.state.in_user_mode()
            && self.state.in_handler_mode()
            && target & 0xf000_0000 == 0xf000_0000
        {
            self.exception_return(bus, target);
            return;
        }
        if target & 1 == 0 {
            // attempted switch out of Thumb state
            self.usage_fault(bus, pc, CFSR_INVSTATE);
        } else {
            self.state.pc = target & !1;
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // floating-point context machinery
    ////////////////////////////////////////////////////////////////////////

    /// CPACR cp10 access check only, recording NOCP on failure.
    pub fn vfp_access_allowed(&mut self) -> bool {
        let cp10 = self.scs.cp10();
        let allowed = if self.state.in_user_mode() {
            cp10 & 2 != 0
        } else {
            cp10 & 1 != 0
        };
        if !allowed {
            self.scs.cfsr |= CFSR_NOCP;
            self.state.exc.derived = EXC_USAGEFAULT;
        }
        allowed
    }

    /// The FP-enablement gate executed before every FP instruction:
    /// permission check, deferred context flush, context activation.
    pub fn fp_enablement_check(&mut self, bus: &mut dyn Bus, pc: u32) -> bool {
        if !self.scs.fpu_present() {
            self.usage_fault(bus, pc, CFSR_NOCP);
            return false;
        }
        let cp10 = self.scs.cp10();
        let allowed = if self.state.in_user_mode() {
            cp10 & 2 != 0
        } else {
            cp10 & 1 != 0
        };
        if !allowed {
            self.usage_fault(bus, pc, CFSR_NOCP);
            return false;
        }

        if self.scs.fp_lspact() {
            self.preserve_fp_state(bus);
        }

        if self.scs.fp_aspen() && !self.state.control.fpca {
            self.state.control.fpca = true;
        }
        true
    }

    /// Deferred save of the interrupted context's FP registers to the
    /// stack slot reserved at exception entry.
    pub fn preserve_fp_state(&mut self, bus: &mut dyn Bus) {
        debug_assert!(self.scs.fp_lspact(), "no lazy FP state to preserve");
        let frame = self.scs.fpcar;
        let old_context = self.state.exc.context;
        self.state.exc.context = ExcContext::PreserveFp;
        self.push_fp(bus, MemAccess::Privileged, frame);
        self.scs.set_fp_lspact(false);
        self.state.exc.context = old_context;
        if self.params.verbose {
            tracing::debug!("flushed lazy FP state to {frame:#010x}");
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // public controller surface
    ////////////////////////////////////////////////////////////////////////

    /// Configure the priority byte of a configurable exception; the value
    /// is masked to the implemented priority bits.
    pub fn set_exception_priority(&mut self, num: u32, priority: u8) {
        if num < 4 || num >= self.state.exc.num_exceptions() {
            return;
        }
        let masked = priority & self.cfg.priority_mask();
        self.state.exc.set_priority_byte(num, masked);
        if num < 16 {
            self.scs.set_shpr_byte(num, masked);
        }
        self.refresh_execution_priority_pending_exception();
    }

    pub fn exception_priority(&self, num: u32) -> u8 {
        self.state.exc.priority_byte(num)
    }

    /// Enable or disable an external interrupt line.
    pub fn set_interrupt_enabled(&mut self, line: u32, enabled: bool) {
        let num = EXC_EXTERNAL0 + line;
        if num >= self.state.exc.num_exceptions() {
            return;
        }
        self.state.exc.set_enable(num, enabled);
        self.refresh_pending_exception();
    }

    /// Propagate the SHCSR fault-enable bits into the enable bitmap.
    pub fn sync_fault_enables(&mut self) {
        let mem = self.scs.memfault_ena();
        let bus_ena = self.scs.busfault_ena();
        let usage = self.scs.usgfault_ena();
        self.state.exc.set_enable(EXC_MEMMANAGE, mem);
        self.state.exc.set_enable(EXC_BUSFAULT, bus_ena);
        self.state.exc.set_enable(EXC_USAGEFAULT, usage);
        self.refresh_pending_exception();
    }

    /// Compose the ICSR image from controller state.
    pub fn read_icsr(&self) -> u32 {
        let mut icsr = self.state.psr.except_num as u32 & 0x1ff;
        if self.ret_to_base() {
            icsr |= 1 << 11;
        }
        icsr |= (self.state.exc.pending_exception & 0x1ff) << 12;
        if self.state.exc.pending_interrupt {
            icsr |= 1 << 22;
        }
        if self.state.exc.is_pending(EXC_SYSTICK) {
            icsr |= 1 << 26;
        }
        if self.state.exc.is_pending(EXC_PENDSV) {
            icsr |= 1 << 28;
        }
        if self.state.exc.is_pending(EXC_NMI) {
            icsr |= 1 << 31;
        }
        icsr
    }

    /// ICSR write: the pend/unpend bits for PendSV, SysTick and NMI.
    pub fn write_icsr(&mut self, value: u32) {
        if value & (1 << 31) != 0 {
            self.raise(EXC_NMI);
        }
        if value & (1 << 28) != 0 {
            self.raise(EXC_PENDSV);
        }
        if value & (1 << 27) != 0 {
            self.lower_exception(EXC_PENDSV);
        }
        if value & (1 << 26) != 0 {
            self.raise(EXC_SYSTICK);
        }
        if value & (1 << 25) != 0 {
            self.lower_exception(EXC_SYSTICK);
        }
    }
}
