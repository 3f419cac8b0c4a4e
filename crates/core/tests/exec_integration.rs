// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! End-to-end instruction semantics: decode, lower and execute real Thumb
//! code against a flat memory.

use armlet_core::bus::MemAccess;
use armlet_core::sysregs::{CFSR_DIVBYZERO, CFSR_INVSTATE};
use armlet_core::{Bus, Core, FlatMemory};
use armlet_config::{SimParams, Variant};

const CODE: u32 = 0x200;
const STACK_TOP: u32 = 0x8000;

fn make_core_with(params: SimParams, program: &[u16]) -> (Core, FlatMemory) {
    let mut mem = FlatMemory::new(0, 0x1_0000);
    mem.poke_u32(0, STACK_TOP);
    mem.poke_u32(4, CODE | 1);
    mem.load_halfwords(CODE, program);
    let mut core = Core::new(params);
    core.reset(&mut mem);
    assert_eq!(core.state.pc, CODE);
    (core, mem)
}

fn make_core(program: &[u16]) -> (Core, FlatMemory) {
    make_core_with(SimParams::default(), program)
}

fn run(core: &mut Core, mem: &mut FlatMemory, steps: usize) {
    for _ in 0..steps {
        core.step(mem).expect("step failed");
    }
}

#[test]
fn push_lr_only() {
    // PUSH {LR}
    let (mut core, mut mem) = make_core(&[0xb500]);
    core.state.set_reg(14, 0x1234_5679);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(13), STACK_TOP - 4);
    assert_eq!(
        mem.read_u32(STACK_TOP - 4, MemAccess::Privileged).unwrap(),
        0x1234_5679
    );
    assert_eq!(core.state.pc, CODE + 2);
}

#[test]
fn movs_sets_flags() {
    // MOVS r0, #0 ; MOVS r1, #0x80
    let (mut core, mut mem) = make_core(&[0x2000, 0x2180]);
    run(&mut core, &mut mem, 1);
    assert!(core.state.flags.z);
    run(&mut core, &mut mem, 1);
    assert!(!core.state.flags.z);
    assert_eq!(core.state.reg(1), 0x80);
}

#[test]
fn adds_carry_and_overflow() {
    // MOVS r0,#1 ; MVNS r1,r0 (r1=0xFFFFFFFE) ; ADDS r2,r0,r1 -> 0xFFFFFFFF
    // ADDS r2,r2,r0 -> 0 with carry
    let (mut core, mut mem) = make_core(&[0x2001, 0x43c1, 0x1842, 0x1812]);
    run(&mut core, &mut mem, 3);
    assert_eq!(core.state.reg(2), 0xffff_ffff);
    assert!(!core.state.flags.c);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(2), 0);
    assert!(core.state.flags.c);
    assert!(core.state.flags.z);
    assert!(!core.state.flags.v);
}

#[test]
fn ssat16_saturation_and_q_flag() {
    // SSAT16 r0, #8, r1 twice (re-executed at the same pc would be cached;
    // two copies keep the scenario explicit)
    let program = [0xf321, 0x0007, 0xf321, 0x0007];
    let (mut core, mut mem) = make_core(&program);

    // both lanes fit in signed 8 bits: unchanged, Q untouched
    core.state.set_reg(1, 0x0001_0000);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x0001_0000);
    assert!(!core.state.flags.q);

    // low lane -32768 saturates to -128, Q set
    core.state.set_reg(1, 0x0000_8000);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x0000_ff80);
    assert!(core.state.flags.q);
}

#[test]
fn udiv_by_zero_yields_zero_without_trap() {
    // UDIV r0, r1, r2
    let (mut core, mut mem) = make_core(&[0xfbb1, 0xf0f2]);
    core.state.set_reg(0, 0xdead_beef);
    core.state.set_reg(1, 100);
    core.state.set_reg(2, 0);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0);
    assert_eq!(core.scs.cfsr, 0);
}

#[test]
fn sdiv_min_over_minus_one_saturates() {
    // SDIV r0, r1, r2
    let (mut core, mut mem) = make_core(&[0xfb91, 0xf0f2]);
    core.state.set_reg(1, 0x8000_0000);
    core.state.set_reg(2, 0xffff_ffff);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x8000_0000);
}

#[test]
fn div_by_zero_traps_when_configured() {
    // UDIV r0, r1, r2 with CCR.DIV_0_TRP; UsageFault is disabled so the
    // fault escalates to HardFault
    let (mut core, mut mem) = make_core(&[0xfbb1, 0xf0f2]);
    mem.poke_u32(4 * 3, 0x300 | 1); // HardFault vector
    core.scs.ccr |= 1 << 4;
    core.state.set_reg(2, 0);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & CFSR_DIVBYZERO, 0);
    assert_ne!(core.scs.hfsr & armlet_core::sysregs::HFSR_FORCED, 0);
    assert_eq!(core.state.pc, 0x300);
    assert_eq!(core.state.psr.except_num, 3);
}

#[test]
fn it_block_predication_and_flag_suppression() {
    // CMP r0,#0 ; IT EQ ; MOV r1,#1 ; MOV r2,#2
    let program = [0x2800, 0xbf08, 0x2101, 0x2202];

    // r0 == 0: the IT'd MOV executes but must not touch the flags
    let (mut core, mut mem) = make_core(&program);
    run(&mut core, &mut mem, 2);
    assert!(core.state.in_it_block());
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 1);
    assert!(core.state.flags.z, "flags must survive the IT'd MOV");
    assert!(!core.state.in_it_block());
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(2), 2);

    // r0 != 0: the IT'd MOV is skipped, the successor still runs
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 7);
    run(&mut core, &mut mem, 4);
    assert_eq!(core.state.reg(1), 0);
    assert_eq!(core.state.reg(2), 2);
}

#[test]
fn it_block_advances_through_four_slots() {
    // CMP r0,#0 ; ITTTT EQ (mask 0001) ; 4x ADD r1,#1
    let program = [0x2800, 0xbf01, 0x3101, 0x3101, 0x3101, 0x3101, 0x3101];
    let (mut core, mut mem) = make_core(&program);
    run(&mut core, &mut mem, 6);
    assert!(!core.state.in_it_block(), "block ends after four slots");
    assert_eq!(core.state.reg(1), 4);
    // the fifth ADD is outside the block and sets flags again
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 5);
}

#[test]
fn conditional_branch_uses_derived_hi_flag() {
    // CMP r0,#5 ; BHI over one MOVS ; MOVS r1,#0xAA ; MOVS r1,#0xBB
    let program = [0x2805, 0xd800, 0x21aa, 0x21bb];

    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 7);
    run(&mut core, &mut mem, 2);
    // taken: the derived HI flag was materialized and cached
    assert!(core.state.derived.hi.valid);
    assert!(core.state.derived.hi.value);
    assert_eq!(core.state.pc, CODE + 6);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 0xbb);

    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 3);
    run(&mut core, &mut mem, 3);
    assert_eq!(core.state.reg(1), 0xaa);
}

#[test]
fn derived_flag_cache_matches_fresh_computation() {
    // CMP r0,#5 ; BHI +0 (never mind the target, only the cache matters)
    let program = [0x2805, 0xd800, 0xbf00, 0xbf00];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 9);
    run(&mut core, &mut mem, 2);
    let f = core.state.flags;
    assert_eq!(core.state.derived.hi.value, f.c && !f.z);
}

#[test]
fn exclusive_access_protocol() {
    // LDREX r0,[r1] ; STREX r2,r0,[r1] ; STREX r3,r0,[r1]
    let program = [0xe851, 0x0f00, 0xe841, 0x0200, 0xe841, 0x0300];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(1, 0x1000);
    mem.poke_u32(0x1000, 0x5555_0000);

    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x5555_0000);

    core.state.set_reg(0, 0x1111_2222);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(2), 0, "exclusive store succeeds");
    assert_eq!(mem.peek_u32(0x1000), 0x1111_2222);

    // the reservation was consumed: the second STREX fails
    core.state.set_reg(0, 0x3333_4444);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(3), 1, "no reservation, store refused");
    assert_eq!(mem.peek_u32(0x1000), 0x1111_2222);
}

#[test]
fn bl_and_bx_lr_roundtrip() {
    // 0x200: BL 0x208 ; MOVS r1,#1 ; (pad)
    // 0x208: MOVS r0,#7 ; BX LR
    let program = [
        0xf000, 0xf802, // BL +4 -> 0x208
        0x2101, // MOVS r1,#1
        0xbf00, // NOP
        0x2007, // 0x208: MOVS r0,#7
        0x4770, // BX LR
    ];
    let (mut core, mut mem) = make_core(&program);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.pc, 0x208);
    assert_eq!(core.state.reg(14), (CODE + 4) | 1);
    run(&mut core, &mut mem, 2);
    assert_eq!(core.state.pc, CODE + 4);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 1);
    assert_eq!(core.state.reg(0), 7);
}

#[test]
fn bx_to_arm_state_is_invstate_fault() {
    // BX r0 with bit 0 clear; UsageFault disabled -> HardFault
    let (mut core, mut mem) = make_core(&[0x4700]);
    mem.poke_u32(4 * 3, 0x300 | 1);
    core.state.set_reg(0, 0x1000);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & CFSR_INVSTATE, 0);
    assert_eq!(core.state.pc, 0x300);
}

#[test]
fn movw_movt_compose() {
    // MOVW r0,#0x1234 ; MOVT r0,#0x5678
    let program = [0xf241, 0x2034, 0xf2c5, 0x6078];
    let (mut core, mut mem) = make_core(&program);
    run(&mut core, &mut mem, 2);
    assert_eq!(core.state.reg(0), 0x5678_1234);
}

#[test]
fn umull_into_non_adjacent_pair() {
    // UMULL r0, r5, r2, r3
    let program = [0xfba2, 0x0503];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(2, 0xffff_ffff);
    core.state.set_reg(3, 2);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0xffff_fffe);
    assert_eq!(core.state.reg(5), 1);
}

#[test]
fn umlal_accumulates_64_bit() {
    // UMLAL r0, r1, r2, r3
    let program = [0xfbe2, 0x0103];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 0xffff_ffff);
    core.state.set_reg(1, 0);
    core.state.set_reg(2, 1);
    core.state.set_reg(3, 1);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0);
    assert_eq!(core.state.reg(1), 1);
}

#[test]
fn ldr_literal_is_word_aligned() {
    // NOP ; LDR r0,[pc,#4] — the literal sits at a word-aligned address
    // regardless of the instruction's halfword alignment
    let program = [0xbf00, 0x4801, 0xbf00, 0xbf00, 0x7777, 0x1111];
    let (mut core, mut mem) = make_core(&program);
    // literal pool: align(0x202+4,4) + 4 = 0x208
    mem.poke_u32(0x208, 0xfeed_f00d);
    run(&mut core, &mut mem, 2);
    assert_eq!(core.state.reg(0), 0xfeed_f00d);
}

#[test]
fn ldm_stm_roundtrip_with_writeback() {
    // MOV r0,#... handled by presets; STMIA r4!, {r0-r2} ; LDMIA r5!, {r0-r2}
    let program = [0xc407, 0xcd07];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 0x11);
    core.state.set_reg(1, 0x22);
    core.state.set_reg(2, 0x33);
    core.state.set_reg(4, 0x1000);
    core.state.set_reg(5, 0x1000);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(4), 0x100c);
    assert_eq!(mem.peek_u32(0x1000), 0x11);
    assert_eq!(mem.peek_u32(0x1008), 0x33);
    core.state.set_reg(0, 0);
    core.state.set_reg(1, 0);
    core.state.set_reg(2, 0);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x11);
    assert_eq!(core.state.reg(1), 0x22);
    assert_eq!(core.state.reg(2), 0x33);
    assert_eq!(core.state.reg(5), 0x100c);
}

#[test]
fn tbb_dispatches_through_table() {
    // TBB [pc, r0] at 0x200; table at 0x204 with offsets; entries jump
    // over the MOVS at 0x208
    let program = [
        0xe8df, 0xf000, // TBB [pc, r0]
        0x0202, // table: entry0 = 2 -> 0x204+4 = 0x208, entry1 = 2
        0xbf00, // (table padding viewed as code)
        0x2107, // 0x208: MOVS r1,#7
    ];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 0);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.pc, 0x204 + 4);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 7);
}

#[test]
fn unaligned_word_access_traps_when_configured() {
    // LDR r0,[r1] with r1 unaligned and CCR.UNALIGN_TRP set; UsageFault
    // escalates to HardFault
    let (mut core, mut mem) = make_core(&[0x6808]);
    mem.poke_u32(4 * 3, 0x300 | 1);
    core.scs.ccr |= 1 << 3;
    core.state.set_reg(1, 0x1002);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & armlet_core::sysregs::CFSR_UNALIGNED, 0);
    assert_eq!(core.state.pc, 0x300);
}

#[test]
fn unaligned_word_access_allowed_by_default() {
    let (mut core, mut mem) = make_core(&[0x6808]);
    core.state.set_reg(1, 0x1002);
    mem.poke_u32(0x1000, 0xaabb_ccdd);
    mem.poke_u32(0x1004, 0x1122_3344);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x3344_aabb);
}

#[test]
fn cbz_and_cbnz() {
    // CBZ r0 over one MOVS ; MOVS r1,#1 ; MOVS r2,#2
    let program = [0xb100, 0x2101, 0x2202];
    let (mut core, mut mem) = make_core(&program);
    run(&mut core, &mut mem, 2);
    assert_eq!(core.state.reg(1), 0, "CBZ taken over the MOVS");
    assert_eq!(core.state.reg(2), 2);

    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 5);
    run(&mut core, &mut mem, 3);
    assert_eq!(core.state.reg(1), 1);
}

#[test]
fn undecoded_instruction_raises_usage_fault() {
    // permanently undefined 16-bit encoding
    let (mut core, mut mem) = make_core(&[0xde00]);
    mem.poke_u32(4 * 3, 0x300 | 1);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & armlet_core::sysregs::CFSR_UNDEFINSTR, 0);
    assert_eq!(core.state.pc, 0x300);
}

#[test]
fn dsp_instruction_gated_on_m3() {
    // QADD r0,r1,r2 is DSP-only: UsageFault (escalated) on Cortex-M3,
    // fine on Cortex-M4
    let program = [0xfa82, 0xf081];
    let (mut core, mut mem) = make_core(&program);
    mem.poke_u32(4 * 3, 0x300 | 1);
    core.state.set_reg(1, 1);
    core.state.set_reg(2, 2);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.pc, 0x300, "M3 rejects DSP instructions");

    let params = SimParams { variant: Variant::CortexM4, ..Default::default() };
    let (mut core, mut mem) = make_core_with(params, &program);
    core.state.set_reg(1, 1);
    core.state.set_reg(2, 2);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 3);
}

#[test]
fn qadd_saturates_and_sets_q() {
    let params = SimParams { variant: Variant::CortexM4, ..Default::default() };
    // QADD r0,r1,r2
    let (mut core, mut mem) = make_core_with(params, &[0xfa82, 0xf081]);
    core.state.set_reg(1, 0x7fff_ffff);
    core.state.set_reg(2, 1);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x7fff_ffff);
    assert!(core.state.flags.q);
}

#[test]
fn sadd16_sets_ge_lanes() {
    let params = SimParams { variant: Variant::CortexM4, ..Default::default() };
    // SADD16 r0,r1,r2
    let (mut core, mut mem) = make_core_with(params, &[0xfa91, 0xf002]);
    // low lane: 1 + 1 = 2 (>= 0 -> GE[1:0] set)
    // high lane: -2 + 1 = -1 (< 0 -> GE[3:2] clear)
    core.state.set_reg(1, 0xfffe_0001);
    core.state.set_reg(2, 0x0001_0001);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0xffff_0002);
    assert_eq!(core.state.flags.ge, 0b0011);
}

#[test]
fn vfp_add_on_m4f() {
    let params = SimParams { variant: Variant::CortexM4F, ..Default::default() };
    // VADD.F32 s0, s1, s2
    let (mut core, mut mem) = make_core_with(params, &[0xee30, 0x0a81]);
    core.scs.cpacr = 0xf << 20; // full cp10/cp11 access
    core.state.vfp[1] = 1.5f32.to_bits();
    core.state.vfp[2] = 2.25f32.to_bits();
    run(&mut core, &mut mem, 1);
    assert_eq!(f32::from_bits(core.state.vfp[0]), 3.75);
    assert!(core.state.control.fpca, "FP context becomes active");
}

#[test]
fn vfp_denied_without_cpacr() {
    let params = SimParams { variant: Variant::CortexM4F, ..Default::default() };
    let (mut core, mut mem) = make_core_with(params, &[0xee30, 0x0a81]);
    mem.poke_u32(4 * 3, 0x300 | 1);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & armlet_core::sysregs::CFSR_NOCP, 0);
    assert_eq!(core.state.pc, 0x300);
}

#[test]
fn vfp_rejected_on_m3() {
    // any VFP opcode is not supported on a no-FPU variant
    let (mut core, mut mem) = make_core(&[0xee30, 0x0a81]);
    mem.poke_u32(4 * 3, 0x300 | 1);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & armlet_core::sysregs::CFSR_UNDEFINSTR, 0);
    assert_eq!(core.state.pc, 0x300);
}

#[test]
fn vmov_immediate_expansion() {
    let params = SimParams { variant: Variant::CortexM4F, ..Default::default() };
    // VMOV.F32 s0, #1.0
    let (mut core, mut mem) = make_core_with(params, &[0xeeb7, 0x0a00]);
    core.scs.cpacr = 0xf << 20;
    run(&mut core, &mut mem, 1);
    assert_eq!(f32::from_bits(core.state.vfp[0]), 1.0);
}

#[test]
fn mrs_msr_roundtrip_primask() {
    // MSR PRIMASK, r0 ; MRS r1, PRIMASK
    let program = [0xf380, 0x8810, 0xf3ef, 0x8110];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(0, 1);
    run(&mut core, &mut mem, 1);
    assert!(core.state.primask);
    assert_eq!(core.state.exc.execution_priority, 0);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 1);
}

#[test]
fn cps_id_ie_toggle_primask() {
    // CPSID i ; CPSIE i
    let program = [0xb672, 0xb662];
    let (mut core, mut mem) = make_core(&program);
    run(&mut core, &mut mem, 1);
    assert!(core.state.primask);
    run(&mut core, &mut mem, 1);
    assert!(!core.state.primask);
}

#[test]
fn coprocessor_access_is_nocp_fault() {
    // MRC p15, 0, r0, c0, c0, 0 — no such coprocessor on this family
    let (mut core, mut mem) = make_core(&[0xee10, 0x0f10]);
    mem.poke_u32(4 * 3, 0x300 | 1);
    run(&mut core, &mut mem, 1);
    assert_ne!(core.scs.cfsr & armlet_core::sysregs::CFSR_NOCP, 0);
    assert_eq!(core.state.pc, 0x300);
}

#[test]
fn rev_and_bitfield_ops() {
    // REV r0,r1 ; UBFX r2,r1,#4,#8 ; BFC r1,#0,#8
    let program = [0xba08, 0xf3c1, 0x1207, 0xf36f, 0x0107];
    let (mut core, mut mem) = make_core(&program);
    core.state.set_reg(1, 0x1234_5678);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(0), 0x7856_3412);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(2), 0x67);
    run(&mut core, &mut mem, 1);
    assert_eq!(core.state.reg(1), 0x1234_5600);
}
