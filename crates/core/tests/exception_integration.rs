// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Exception controller behavior: priority arbitration, entry/return,
//! escalation, tail-chaining, lazy FP stacking and lockup.

use armlet_core::bus::MemAccess;
use armlet_core::exception::{
    EXC_BUSFAULT, EXC_EXTERNAL0, EXC_HARDFAULT, EXC_NMI, EXC_SYSTICK, EXC_USAGEFAULT,
};
use armlet_core::ports::OutputEvent;
use armlet_core::sysregs::{CFSR_INVPC, HFSR_FORCED};
use armlet_core::{Bus, Core, FlatMemory};
use armlet_config::{SimParams, Variant};

const CODE: u32 = 0x400;
const STACK_TOP: u32 = 0x8000;
const HANDLER1: u32 = 0x600;
const HANDLER2: u32 = 0x700;

/// Memory with the vector table, main code and two handlers.
fn make_core_with(params: SimParams, program: &[u16]) -> (Core, FlatMemory) {
    let mut mem = FlatMemory::new(0, 0x1_0000);
    mem.poke_u32(0, STACK_TOP);
    mem.poke_u32(4, CODE | 1);
    for vec in 2..48 {
        // default every handler to "BX LR" stubs at HANDLER1
        mem.poke_u32(4 * vec, HANDLER1 | 1);
    }
    mem.load_halfwords(CODE, program);
    mem.load_halfwords(HANDLER1, &[0x4770]); // BX LR
    mem.load_halfwords(HANDLER2, &[0x4770]);
    let mut core = Core::new(params);
    core.reset(&mut mem);
    (core, mem)
}

fn make_core(program: &[u16]) -> (Core, FlatMemory) {
    make_core_with(SimParams::default(), program)
}

fn nops(n: usize) -> Vec<u16> {
    vec![0xbf00; n]
}

#[test]
fn reset_loads_sp_and_pc_from_vector_table() {
    let (core, _mem) = make_core(&nops(4));
    assert_eq!(core.state.reg(13), STACK_TOP);
    assert_eq!(core.state.pc, CODE);
    assert!(core.state.psr.t);
    assert!(!core.state.in_handler_mode());
}

#[test]
fn group_priority_ordering_selects_lowest_number() {
    let (mut core, mut mem) = make_core(&nops(8));
    mem.poke_u32(4 * (EXC_EXTERNAL0 + 1), HANDLER2 | 1);

    core.set_interrupt_enabled(0, true);
    core.set_interrupt_enabled(1, true);
    core.set_exception_priority(EXC_EXTERNAL0, 0x80);
    core.set_exception_priority(EXC_EXTERNAL0 + 1, 0x40);
    core.signal_interrupt(0, true);
    core.signal_interrupt(1, true);

    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_EXTERNAL0 + 1);
    assert_eq!(core.state.pc, HANDLER2);
}

#[test]
fn sub_priority_breaks_group_ties() {
    let (mut core, mut mem) = make_core(&nops(8));
    mem.poke_u32(4 * (EXC_EXTERNAL0 + 1), HANDLER2 | 1);

    // prigroup 5: bits 7:6 group, bits 5:0 sub (3 implemented bits: 7:5)
    core.write_aircr((0x05fa << 16) | (5 << 8));
    core.set_interrupt_enabled(0, true);
    core.set_interrupt_enabled(1, true);
    // same group priority (0x40), different sub-priority
    core.set_exception_priority(EXC_EXTERNAL0, 0x60);
    core.set_exception_priority(EXC_EXTERNAL0 + 1, 0x40);
    core.signal_interrupt(0, true);
    core.signal_interrupt(1, true);

    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_EXTERNAL0 + 1);
}

#[test]
fn nmi_outranks_configurable_exceptions() {
    let (mut core, mut mem) = make_core(&nops(8));
    mem.poke_u32(4 * EXC_NMI, HANDLER2 | 1);

    core.set_interrupt_enabled(0, true);
    core.set_exception_priority(EXC_EXTERNAL0, 0);
    core.signal_interrupt(0, true);
    core.signal_nmi();

    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_NMI);
}

#[test]
fn frame_push_pop_restores_registers_bit_for_bit() {
    let (mut core, mut mem) = make_core(&nops(8));

    for r in 0..13u8 {
        core.state.set_reg(r, 0x1010_0000 + r as u32);
    }
    core.state.set_reg(14, 0x2222_2223);
    core.state.flags.n = true;
    core.state.flags.c = true;
    core.state.flags.q = true;
    core.state.flags.ge = 0b0101;
    let saved_regs: Vec<u32> = (0..15).map(|r| core.state.reg(r)).collect();
    let saved_psr = core.state.read_psr();
    let saved_pc = core.state.pc;

    core.set_interrupt_enabled(0, true);
    core.signal_interrupt(0, true);

    // entry
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_EXTERNAL0);
    assert_eq!(core.state.pc, HANDLER1);
    assert_eq!(core.state.reg(13), STACK_TOP - 0x20);
    assert_eq!(core.state.reg(14), 0xffff_fff9);
    assert_eq!(
        core.outputs.last(),
        Some(&OutputEvent::InterruptServiceStarted(0))
    );
    // stacked return address and PSR
    assert_eq!(
        mem.read_u32(STACK_TOP - 0x20 + 0x18, MemAccess::Privileged).unwrap(),
        saved_pc
    );

    // return (handler is BX LR)
    core.step(&mut mem).unwrap();
    assert!(!core.state.in_handler_mode());
    assert_eq!(core.state.pc, saved_pc);
    assert_eq!(core.state.reg(13), STACK_TOP);
    for (r, saved) in saved_regs.iter().enumerate().take(13) {
        assert_eq!(core.state.reg(r as u8), *saved, "r{r}");
    }
    assert_eq!(core.state.reg(14), saved_regs[14]);
    assert_eq!(core.state.read_psr(), saved_psr);
}

#[test]
fn tail_chaining_skips_pop_push_pair() {
    let (mut core, mut mem) = make_core(&nops(8));
    mem.poke_u32(4 * (EXC_EXTERNAL0 + 1), HANDLER2 | 1);

    core.set_interrupt_enabled(0, true);
    core.set_interrupt_enabled(1, true);
    core.set_exception_priority(EXC_EXTERNAL0, 0x20);
    core.set_exception_priority(EXC_EXTERNAL0 + 1, 0x40);
    core.signal_interrupt(0, true);

    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_EXTERNAL0);
    let sp_in_first = core.state.reg(13);
    let frame_word = mem.read_u32(sp_in_first, MemAccess::Privileged).unwrap();

    // pend the second, lower-priority interrupt while inside the first
    core.signal_interrupt(1, true);

    // the BX LR return tail-chains straight into handler 2
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_EXTERNAL0 + 1);
    assert_eq!(core.state.pc, HANDLER2);
    assert_eq!(core.state.reg(13), sp_in_first, "no pop/push pair");
    assert_eq!(
        mem.read_u32(sp_in_first, MemAccess::Privileged).unwrap(),
        frame_word,
        "original frame preserved"
    );

    // and the final return unwinds to thread mode
    core.step(&mut mem).unwrap();
    assert!(!core.state.in_handler_mode());
    assert_eq!(core.state.reg(13), STACK_TOP);
}

#[test]
fn basepri_masks_lower_priority_interrupts() {
    let (mut core, mut mem) = make_core(&nops(8));
    core.set_interrupt_enabled(0, true);
    core.set_exception_priority(EXC_EXTERNAL0, 0x80);
    core.write_special(armlet_core::morph::ops::sysm::BASEPRI, 0x40, 0);
    assert_eq!(core.state.exc.execution_priority, 0x40);

    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap();
    assert!(!core.state.in_handler_mode(), "0x80 cannot preempt BASEPRI 0x40");

    // a higher-priority source still can
    core.set_exception_priority(EXC_EXTERNAL0, 0x00);
    core.step(&mut mem).unwrap();
    assert!(core.state.in_handler_mode());
}

#[test]
fn faultmask_boosts_to_minus_one() {
    let (mut core, mut mem) = make_core(&nops(8));
    mem.poke_u32(4 * EXC_NMI, HANDLER2 | 1);
    core.state.faultmask = true;
    core.refresh_execution_priority_pending_exception();
    assert_eq!(core.state.exc.execution_priority, -1);

    core.set_interrupt_enabled(0, true);
    core.set_exception_priority(EXC_EXTERNAL0, 0);
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap();
    assert!(!core.state.in_handler_mode());

    // NMI at group -2 still preempts
    core.signal_nmi();
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_NMI);
}

#[test]
fn disabled_fault_escalates_to_hardfault() {
    // UDF in thread mode with UsageFault disabled
    let (mut core, mut mem) = make_core(&[0xde00]);
    mem.poke_u32(4 * EXC_HARDFAULT, HANDLER2 | 1);
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_HARDFAULT);
    assert_ne!(core.scs.hfsr & HFSR_FORCED, 0);
}

#[test]
fn enabled_usagefault_is_taken_directly() {
    let (mut core, mut mem) = make_core(&[0xde00]);
    mem.poke_u32(4 * EXC_USAGEFAULT, HANDLER2 | 1);
    core.write_shcsr(1 << 18);
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_USAGEFAULT);
    assert_eq!(core.scs.hfsr & HFSR_FORCED, 0);
}

#[test]
fn invalid_exception_return_is_invpc_usagefault() {
    // handler overwrites LR with an invalid return type, then BX LR
    let (mut core, mut mem) = make_core(&nops(8));
    // handler: MOVS r0,#2 ; MVNS r1,r0 (0xFFFFFFFD^...) — simpler:
    // LDR r0,[pc,#0] ; BX r0 with a literal 0xFFFFFFF2
    mem.load_halfwords(HANDLER2, &[0x4800, 0x4700, 0x0000, 0x0000]);
    mem.poke_u32(HANDLER2 + 4, 0xffff_fff2);
    mem.poke_u32(4 * EXC_EXTERNAL0, HANDLER2 | 1);
    mem.poke_u32(4 * EXC_USAGEFAULT, HANDLER1 | 1);
    core.write_shcsr(1 << 18); // enable UsageFault

    core.set_interrupt_enabled(0, true);
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap(); // entry
    core.step(&mut mem).unwrap(); // LDR r0
    core.step(&mut mem).unwrap(); // BX r0 -> invalid EXC_RETURN
    assert_ne!(core.scs.cfsr & CFSR_INVPC, 0);
    assert_eq!(core.state.psr.except_num as u32, EXC_USAGEFAULT);
}

#[test]
fn stacking_failure_at_negative_priority_locks_up() {
    // thread code faults into HardFault; the handler wrecks SP and faults
    // again, so stacking the next frame fails at priority -1
    let (mut core, mut mem) = make_core(&[0xde00]);
    mem.poke_u32(4 * EXC_HARDFAULT, HANDLER2 | 1);
    // handler: MOV SP, r0 ; UDF
    mem.load_halfwords(HANDLER2, &[0x4685, 0xde00]);
    core.state.set_reg(0, 0xf000_0000);

    core.step(&mut mem).unwrap(); // into HardFault
    assert_eq!(core.state.psr.except_num as u32, EXC_HARDFAULT);
    core.step(&mut mem).unwrap(); // MOV SP, r0
    core.step(&mut mem).unwrap(); // UDF -> escalate -> push fails -> lockup
    assert!(core.lockup);
    assert!(core.outputs.contains(&OutputEvent::Lockup));
    assert!(core.step(&mut mem).is_err());
}

#[test]
fn systick_countdown_pends_exception_15() {
    let (mut core, mut mem) = make_core(&nops(32));
    mem.poke_u32(4 * EXC_SYSTICK, HANDLER2 | 1);
    core.systick.write_rvr(4);
    core.systick.write_csr(0b011);

    let mut entered = false;
    for _ in 0..16 {
        core.step(&mut mem).unwrap();
        if core.state.psr.except_num as u32 == EXC_SYSTICK {
            entered = true;
            break;
        }
    }
    assert!(entered, "SysTick never fired");
    assert_eq!(core.state.pc, HANDLER2);
}

#[test]
fn wfe_consumes_event_register_then_sleeps() {
    let (mut core, mut mem) = make_core(&[0xbf20, 0xbf20, 0xbf00]); // WFE ; WFE ; NOP
    core.signal_event();
    assert!(core.state.event_register);

    core.step(&mut mem).unwrap();
    assert!(!core.is_sleeping(), "event register consumed without sleeping");
    assert!(!core.state.event_register);

    core.step(&mut mem).unwrap();
    assert!(core.is_sleeping(), "second WFE suspends");

    // sleeping core does not advance
    let pc = core.state.pc;
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.pc, pc);

    core.signal_event();
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.pc, pc + 2);
}

#[test]
fn sevonpend_wakes_wfe_on_disabled_interrupt() {
    let (mut core, mut mem) = make_core(&[0xbf20, 0xbf00]);
    core.scs.scr |= 1 << 4; // SEVONPEND
    core.step(&mut mem).unwrap();
    assert!(core.is_sleeping());

    // pending a *disabled* interrupt still wakes the core
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap();
    assert!(!core.is_sleeping());
}

#[test]
fn wfi_wakes_on_eligible_interrupt() {
    let (mut core, mut mem) = make_core(&[0xbf30, 0xbf00]); // WFI ; NOP
    core.step(&mut mem).unwrap();
    assert!(core.is_sleeping());

    core.set_interrupt_enabled(0, true);
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_EXTERNAL0);
}

#[test]
fn icsr_reports_active_and_pending() {
    let (mut core, mut mem) = make_core(&nops(8));
    core.set_interrupt_enabled(0, true);
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap();

    let icsr = core.read_icsr();
    assert_eq!(icsr & 0x1ff, EXC_EXTERNAL0, "VECTACTIVE");
    assert_ne!(icsr & (1 << 11), 0, "RETTOBASE with a single active handler");

    core.signal_interrupt(0, true);
    let icsr = core.read_icsr();
    assert_eq!((icsr >> 12) & 0x1ff, EXC_EXTERNAL0, "VECTPENDING");
    assert_ne!(icsr & (1 << 22), 0, "ISRPENDING");
}

#[test]
fn external_abort_input_pends_busfault() {
    let (mut core, mut mem) = make_core(&nops(8));
    mem.poke_u32(4 * EXC_BUSFAULT, HANDLER2 | 1);
    core.write_shcsr(1 << 17); // enable BusFault
    core.signal_data_abort();
    core.step(&mut mem).unwrap();
    assert_eq!(core.state.psr.except_num as u32, EXC_BUSFAULT);
    assert_ne!(core.scs.cfsr & armlet_core::sysregs::CFSR_IMPRECISERR, 0);
}

#[test]
fn lazy_fp_state_preserved_on_first_use() {
    let params = SimParams { variant: Variant::CortexM4F, ..Default::default() };
    // VADD.F32 s0,s1,s2 then NOPs
    let mut program = vec![0xee30u16, 0x0a81];
    program.extend(nops(8));
    let (mut core, mut mem) = make_core_with(params, &program);
    // handler performs an FP instruction: VADD.F32 s3,s1,s2
    mem.load_halfwords(HANDLER2, &[0xee70, 0x1a81, 0x4770]);
    mem.poke_u32(4 * EXC_EXTERNAL0, HANDLER2 | 1);
    core.scs.cpacr = 0xf << 20;

    core.state.vfp[1] = 10.0f32.to_bits();
    core.state.vfp[2] = 20.0f32.to_bits();
    core.step(&mut mem).unwrap();
    assert_eq!(f32::from_bits(core.state.vfp[0]), 30.0);
    assert!(core.state.control.fpca);

    core.set_interrupt_enabled(0, true);
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap(); // exception entry with FP context active

    // extended frame reserved, lazy save armed, registers not yet stacked
    assert_eq!(core.state.reg(13), STACK_TOP - 0x68);
    assert_eq!(core.state.reg(14) & 0x10, 0, "EXC_RETURN marks FP frame");
    assert!(core.scs.fp_lspact());
    let fp_slot = core.scs.fpcar;
    assert_eq!(fp_slot, core.state.reg(13) + 0x20);
    assert_eq!(
        mem.read_u32(fp_slot, MemAccess::Privileged).unwrap(),
        0,
        "s0 not written yet"
    );

    // the handler's first FP instruction flushes the interrupted context
    core.step(&mut mem).unwrap();
    assert!(!core.scs.fp_lspact());
    assert_eq!(
        mem.read_u32(fp_slot, MemAccess::Privileged).unwrap(),
        30.0f32.to_bits(),
        "old s0 flushed to the reserved slot"
    );
    assert_eq!(f32::from_bits(core.state.vfp[3]), 30.0, "handler result");
}

#[test]
fn exception_entry_clears_exclusive_reservation() {
    // LDREX r0,[r1] then NOP; the reservation dies on exception entry and
    // a subsequent STREX fails
    let program = [0xe851, 0x0f00, 0xbf00, 0xe841, 0x0200, 0xbf00];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(1, 0x1000);

    core.step(&mut mem).unwrap(); // LDREX
    assert_ne!(core.state.exclusive_tag, u32::MAX);

    core.set_interrupt_enabled(0, true);
    core.signal_interrupt(0, true);
    core.step(&mut mem).unwrap(); // entry
    assert_eq!(core.state.exclusive_tag, u32::MAX);
    core.step(&mut mem).unwrap(); // BX LR back

    core.step(&mut mem).unwrap(); // NOP
    core.step(&mut mem).unwrap(); // STREX
    assert_eq!(core.state.reg(2), 1, "reservation was cleared by the exception");
}
