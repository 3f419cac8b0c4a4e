// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The semantic lowering engine ("morpher").
//!
//! `lower` maps one decoded instruction to a block of primitive operations.
//! The driver resolves architecture gating, the effective condition (IT
//! block or condition field), the conditional-skip scaffolding and the
//! IT-state advance; the per-class routines live in `functions` (integer)
//! and `vfp` (floating point).

pub mod functions;
pub mod interp;
pub mod ops;
pub mod vfp;

use crate::config::VariantConfig;
use crate::decode::attrs::{Isar, OpcodeClass};
use crate::decode::{Decoded, COND_AL};
use crate::state::REG_PC;
use crate::sysregs::{Scs, CFSR_UNDEFINSTR};
use armlet_config::SimParams;
use ops::{Derived, FlagRef, Label, Op, OpBlock, Operand, Reg, SysCall};

/// Read-only context the lowering pass needs.
pub struct LowerCtx<'a> {
    pub scs: &'a Scs,
    pub cfg: &'a VariantConfig,
    pub params: &'a SimParams,
}

/// Number of lowering temporaries available to one instruction.
pub const TEMP_NUM: u8 = 10;

/// Per-instruction lowering state: the decoded instruction, the block
/// being emitted, the temporary cursor and the pending skip label.
pub struct MorphState<'a> {
    pub d: &'a Decoded,
    pub ctx: &'a LowerCtx<'a>,
    pub block: OpBlock,
    temp_idx: u8,
    skip_label: Option<Label>,
}

/// Lower one instruction to its primitive-op block.
pub fn lower(ctx: &LowerCtx, d: &Decoded, first_in_block: bool) -> OpBlock {
    let mut st = MorphState {
        d,
        ctx,
        block: OpBlock::new(),
        temp_idx: 0,
        skip_label: None,
    };

    if first_in_block {
        st.block.emit(Op::InvalidateDerived);
    }

    if d.attrs.kind == OpcodeClass::Und {
        st.emit_undecoded();
    } else if !supported_on_variant(ctx, d) {
        st.emit_not_variant();
    } else {
        st.emit_implemented();
    }

    st.block
}

/// Is the instruction's required architecture and feature set present on
/// the configured variant?
fn supported_on_variant(ctx: &LowerCtx, d: &Decoded) -> bool {
    if !ctx.cfg.arch.satisfies(d.attrs.support) {
        return false;
    }
    isar_supported(ctx.scs, d.attrs.isar)
}

/// Per-instruction support implied by the ID_ISAR and MVFR registers.
fn isar_supported(scs: &Scs, isar: Isar) -> bool {
    match isar {
        Isar::None => true,
        Isar::Div => scs.isar(0, 24) != 0,
        Isar::Bkpt => scs.isar(0, 20) != 0,
        Isar::Cbz => scs.isar(0, 12) != 0,
        Isar::Bfc => scs.isar(0, 8) != 0,
        Isar::Clz => scs.isar(0, 4) != 0,
        Isar::Bx => scs.isar(1, 24) > 0,
        Isar::Blx => scs.isar(1, 24) > 1,
        Isar::Movt => scs.isar(1, 20) != 0,
        Isar::IfThen => scs.isar(1, 16) != 0,
        Isar::Sxtb => scs.isar(1, 12) > 0,
        Isar::Sxtab => scs.isar(1, 12) > 1,
        Isar::Sxtb16 => scs.isar(1, 12) > 1 && scs.dsp_present(),
        Isar::Rev => scs.isar(2, 28) > 0,
        Isar::Rbit => scs.isar(2, 28) > 1,
        Isar::Umull => scs.isar(2, 20) > 0,
        Isar::Umaal => scs.isar(2, 20) > 1,
        Isar::Smull => scs.isar(2, 16) > 0,
        Isar::Smlabb => scs.isar(2, 16) > 1,
        Isar::Smlad => scs.isar(2, 16) > 2,
        Isar::Mla => scs.isar(2, 12) > 0,
        Isar::Mls => scs.isar(2, 12) > 1,
        Isar::Pld => scs.isar(2, 4) > 0,
        Isar::Pli => scs.isar(2, 4) > 2,
        Isar::Ldrd => scs.isar(2, 0) != 0,
        Isar::Nop => scs.isar(3, 24) != 0,
        Isar::MovLowLow => scs.isar(3, 20) != 0,
        Isar::Tbb => scs.isar(3, 16) != 0,
        Isar::Ldrex => scs.isar(3, 12) > 0,
        Isar::Clrex => scs.isar(3, 12) > 1 || scs.isar(4, 20) == 3,
        Isar::Svc => scs.isar(3, 8) != 0,
        Isar::Ssat => scs.isar(3, 4) > 0,
        Isar::Pkhbt => scs.dsp_present(),
        Isar::Qadd => scs.isar(3, 0) != 0,
        Isar::MrsM => scs.isar(4, 24) != 0,
        Isar::Dmb => scs.isar(4, 16) != 0,
        Isar::Ldrbt => scs.isar(4, 0) > 0,
        Isar::Ldrht => scs.isar(4, 0) > 1,
        Isar::Vmrs => scs.fpu_present(),
        Isar::VfpV2 => scs.vfp_single_level() >= 1,
        Isar::VfpV3 => scs.vfp_single_level() >= 2,
        Isar::VfpFmac => scs.fpu_present() && scs.vfp_has_fmac(),
        Isar::VfpSqrt => scs.vfp_has_sqrt() && scs.vfp_single_level() >= 1,
        Isar::VfpDiv => scs.vfp_has_divide() && scs.vfp_single_level() >= 1,
        Isar::VfpCvt2 => scs.vfp_single_level() >= 1,
        Isar::VfpCvt3 => scs.vfp_single_level() >= 2,
        Isar::VfpHp => scs.fpu_present() && scs.vfp_has_half(),
    }
}

impl<'a> MorphState<'a> {
    ////////////////////////////////////////////////////////////////////////
    // temporaries
    ////////////////////////////////////////////////////////////////////////

    pub fn new_temp(&mut self) -> Reg {
        assert!(self.temp_idx < TEMP_NUM, "out of lowering temporaries");
        let t = Reg::Temp(self.temp_idx);
        self.temp_idx += 1;
        t
    }

    pub fn free_temp(&mut self) {
        assert!(self.temp_idx > 0, "temporary underflow");
        self.temp_idx -= 1;
    }

    /// Allocate an adjacent temporary pair (64-bit staging).
    pub fn new_temp_pair(&mut self) -> (Reg, Reg) {
        let lo = self.new_temp();
        let hi = self.new_temp();
        (lo, hi)
    }

    ////////////////////////////////////////////////////////////////////////
    // register operands
    ////////////////////////////////////////////////////////////////////////

    /// Source register; the PC reads as the pipeline value.
    pub fn rs(&self, r: u8) -> Reg {
        if r == REG_PC {
            Reg::PcVal
        } else {
            Reg::R(r)
        }
    }

    /// Destination register. Writes to the PC go through a temporary and
    /// become an interworking jump at the end of the routine.
    pub fn rd_dest(&mut self) -> (Reg, bool) {
        self.rd_dest_for(self.d.r1)
    }

    pub fn rd_dest_for(&mut self, r: u8) -> (Reg, bool) {
        if r == REG_PC {
            (self.new_temp(), true)
        } else {
            (Reg::R(r), false)
        }
    }

    /// Commit a destination produced by [`MorphState::rd_dest`]. A flag
    /// setting PC write is itself a UsageFault; otherwise it is an
    /// interworking (and possibly exception-return) jump.
    pub fn finish_dest(&mut self, dest: Reg, is_pc: bool) {
        if !is_pc {
            return;
        }
        if self.d.set_flags {
            self.emit_usage_fault(CFSR_UNDEFINSTR);
        } else {
            self.block.emit(Op::JumpReg { rs: dest, link: None, interwork: true });
        }
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // conditions and skips
    ////////////////////////////////////////////////////////////////////////

    /// Map the effective condition to a flag test, materializing derived
    /// flags first. `None` means unconditional.
    pub fn prepare_condition(&mut self) -> Option<(FlagRef, bool)> {
        let (flag, if_true) = match self.d.cond {
            0x0 => (FlagRef::Z, true),
            0x1 => (FlagRef::Z, false),
            0x2 => (FlagRef::C, true),
            0x3 => (FlagRef::C, false),
            0x4 => (FlagRef::N, true),
            0x5 => (FlagRef::N, false),
            0x6 => (FlagRef::V, true),
            0x7 => (FlagRef::V, false),
            0x8 => (FlagRef::Hi, true),
            0x9 => (FlagRef::Hi, false),
            0xa => (FlagRef::Lt, false),
            0xb => (FlagRef::Lt, true),
            0xc => (FlagRef::Le, false),
            0xd => (FlagRef::Le, true),
            // AL and the reserved NV slot execute unconditionally
            _ => return None,
        };
        match flag {
            FlagRef::Hi => self.block.emit(Op::EnsureDerived(Derived::Hi)),
            FlagRef::Lt => self.block.emit(Op::EnsureDerived(Derived::Lt)),
            FlagRef::Le => self.block.emit(Op::EnsureDerived(Derived::Le)),
            _ => {}
        }
        Some((flag, if_true))
    }

    /// Emit the conditional skip around the instruction body, if any.
    fn start_skip(&mut self) -> Option<Label> {
        let cond = self.prepare_condition()?;
        let label = self.block.new_label();
        self.block.emit(Op::CondJumpLabel { flag: cond.0, if_true: !cond.1, label });
        Some(label)
    }

    ////////////////////////////////////////////////////////////////////////
    // fault paths
    ////////////////////////////////////////////////////////////////////////

    pub fn emit_usage_fault(&mut self, reason: u32) {
        self.block.emit(Op::SysCall(SysCall::UsageFault(reason)));
    }

    fn emit_undecoded(&mut self) {
        if self.ctx.params.verbose {
            tracing::warn!("undecoded instruction {:#010x} at {:#010x}", self.d.raw, self.d.pc);
        }
        self.emit_usage_fault(CFSR_UNDEFINSTR);
    }

    fn emit_not_variant(&mut self) {
        if self.ctx.params.verbose {
            tracing::warn!(
                pc = format_args!("{:#010x}", self.d.pc),
                instr = self.d.attrs.name,
                variant = self.ctx.cfg.name,
                "instruction not supported on this variant"
            );
        }
        self.emit_usage_fault(CFSR_UNDEFINSTR);
    }

    ////////////////////////////////////////////////////////////////////////
    // driver
    ////////////////////////////////////////////////////////////////////////

    fn emit_implemented(&mut self) {
        use OpcodeClass as C;
        let kind = self.d.attrs.kind;

        // branch-shaped instructions predicate the jump directly; everything
        // else conditional gets a skip around the body
        let direct = matches!(kind, C::B) && self.d.cond != COND_AL;
        if !direct {
            self.skip_label = self.start_skip();
        }

        match kind {
            C::BinopImm(op) => self.lower_binop_imm(op),
            C::BinopRm(op) => self.lower_binop_rm(op),
            C::BinopRsi(op) => self.lower_binop_rsi(op),
            C::BinopRrx(op) => self.lower_binop_rrx(op),
            C::BinopIt(op) => self.lower_binop_it(op),
            C::BinopRt(op) => self.lower_binop_rt(op),
            C::BinopAdr { sub } => self.lower_binop_adr(sub),
            C::UnopImm(op) => self.lower_unop_imm(op),
            C::UnopRm(op) => self.lower_unop_rm(op),
            C::UnopRsi(op) => self.lower_unop_rsi(op),
            C::UnopRsr(op) => self.lower_unop_rsr(op),
            C::UnopRrx(op) => self.lower_unop_rrx(op),
            C::UnopRsrt(op) => self.lower_unop_rsrt(op),
            C::CmpopImm(op) => self.lower_cmpop_imm(op),
            C::CmpopRm(op) => self.lower_cmpop_rm(op),
            C::CmpopRsi(op) => self.lower_cmpop_rsi(op),
            C::CmpopRrx(op) => self.lower_cmpop_rrx(op),
            C::Movw => self.lower_movw(),
            C::Movt => self.lower_movt(),

            C::Sat { unsigned } => self.lower_sat(unsigned),
            C::Sat16 { unsigned } => self.lower_sat16(unsigned),
            C::Sbfx => self.lower_xbfx(true),
            C::Ubfx => self.lower_xbfx(false),
            C::Bfi => self.lower_bfi(false),
            C::Bfc => self.lower_bfi(true),
            C::Pkh { tb } => self.lower_pkh(tb),
            C::Extend { kind, unsigned, accumulate } => self.lower_extend(kind, unsigned, accumulate),
            C::Pas { prefix, op } => self.lower_pas(prefix, op),
            C::QaddSub { double, sub } => self.lower_qaddsub(double, sub),
            C::Rev => self.lower_unop_misc(ops::Unop::Rev),
            C::Rev16 => self.lower_unop_misc(ops::Unop::Rev16),
            C::Revsh => self.lower_unop_misc(ops::Unop::Revsh),
            C::Rbit => self.lower_unop_misc(ops::Unop::Rbit),
            C::Clz => self.lower_unop_misc(ops::Unop::Clz),
            C::Sel => self.lower_sel(),

            C::Mla => self.lower_mla(false),
            C::Mls => self.lower_mla(true),
            C::Mull { signed } => self.lower_mull(signed),
            C::Mlal { signed } => self.lower_mlal(signed),
            C::Umaal => self.lower_umaal(),
            C::Div { signed } => self.lower_div(signed),
            C::SmlaXy { nx, my } => self.lower_smla_xy(nx, my),
            C::SmulXy { nx, my } => self.lower_smul_xy(nx, my),
            C::SmlalXy { nx, my } => self.lower_smlal_xy(nx, my),
            C::SmlawY { my } => self.lower_smlaw(my),
            C::SmulwY { my } => self.lower_smulw(my),
            C::Smlad { cross } => self.lower_smlad(cross, false),
            C::Smlsd { cross } => self.lower_smlad(cross, true),
            C::Smuad { cross } => self.lower_smuad(cross, false),
            C::Smusd { cross } => self.lower_smuad(cross, true),
            C::Smlald { cross } => self.lower_smlald(cross, false),
            C::Smlsld { cross } => self.lower_smlald(cross, true),
            C::Smmla { round } => self.lower_smmla(round, false),
            C::Smmls { round } => self.lower_smmla(round, true),
            C::Smmul { round } => self.lower_smmul(round),
            C::Usad8 => self.lower_usad8(false),
            C::Usada8 => self.lower_usad8(true),

            C::B => self.lower_b(),
            C::Bl => self.lower_bl(),
            C::BranchReg { link } => self.lower_branch_reg(link),
            C::Cbz { nonzero } => self.lower_cbz(nonzero),
            C::Tb { half } => self.lower_tb(half),
            C::Svc => self.block.emit(Op::SysCall(SysCall::Svc)),
            C::Bkpt => self.block.emit(Op::SysCall(SysCall::Bkpt)),
            C::Mrs => self.lower_mrs(),
            C::Msr => self.lower_msr(),
            C::Cps => self.lower_cps(),
            C::It => self.block.emit(Op::SetItState(self.d.it)),
            C::Nop | C::Yield | C::Dbg => {}
            C::Wfe => self.block.emit(Op::SysCall(SysCall::Wfe)),
            C::Wfi => self.block.emit(Op::SysCall(SysCall::Wfi)),
            C::Sev => self.block.emit(Op::SysCall(SysCall::Sev)),
            C::Clrex => self.block.emit(Op::Unop {
                op: ops::Unop::Mov,
                rd: Reg::ExclTag,
                ra: Operand::Imm(crate::state::NO_EXCLUSIVE_TAG),
                flags: ops::FlagsOp::None,
            }),
            C::Dsb | C::Dmb | C::Isb => self.block.emit(Op::SysCall(SysCall::Barrier)),

            C::LoadImm => self.lower_load_imm(),
            C::LoadReg => self.lower_load_reg(false),
            C::LoadRsi => self.lower_load_reg(true),
            C::StoreImm => self.lower_store_imm(),
            C::StoreReg => self.lower_store_reg(false),
            C::StoreRsi => self.lower_store_reg(true),
            C::Ldm => self.lower_ldm(),
            C::Stm => self.lower_stm(),
            C::LdrdImm => self.lower_ldrd(),
            C::StrdImm => self.lower_strd(),
            C::Ldrex => self.lower_ldrex(),
            C::Strex => self.lower_strex(),

            C::Cp => self.lower_coprocessor(),

            C::VfpBinop(op) => self.lower_vfp_binop(op),
            C::VfpMla { negate_product, negate_acc } => self.lower_vfp_mla(negate_product, negate_acc, false),
            C::VfpFma { negate_product, negate_acc } => self.lower_vfp_mla(negate_product, negate_acc, true),
            C::VfpMovImm => self.lower_vfp_mov_imm(),
            C::VfpMovReg => self.lower_vfp_unop(ops::FUnop::Mov),
            C::VfpAbs => self.lower_vfp_unop(ops::FUnop::Abs),
            C::VfpNeg => self.lower_vfp_unop(ops::FUnop::Neg),
            C::VfpSqrt => self.lower_vfp_unop(ops::FUnop::Sqrt),
            C::VfpCmp { quiet_nan_ok, with_zero } => self.lower_vfp_cmp(quiet_nan_ok, with_zero),
            C::VfpCvtIntToF32 { signed } => self.lower_vfp_cvt(ops::FCvt::IntToF32 { signed }),
            C::VfpCvtF32ToInt { signed, round_fpscr } => {
                self.lower_vfp_cvt(ops::FCvt::F32ToInt { signed, round_fpscr })
            }
            C::VfpCvtFixToF32 { signed, fbits16 } => self.lower_vfp_cvt_fixed(signed, fbits16, true),
            C::VfpCvtF32ToFix { signed, fbits16 } => self.lower_vfp_cvt_fixed(signed, fbits16, false),
            C::VfpCvtHalf { top, to_half } => self.lower_vfp_cvt_half(top, to_half),
            C::VfpLdst { load } => self.lower_vfp_ldst(load),
            C::VfpLdstm { load, writeback, dec } => self.lower_vfp_ldstm(load, writeback, dec),
            C::VfpPushPop { push } => self.lower_vfp_push_pop(push),
            C::Vmrs => self.lower_vmrs(),
            C::Vmsr => self.lower_vmsr(),
            C::VmovCoreSingle { to_core } => self.lower_vmov_core_single(to_core),
            C::VmovCoreScalar { to_core } => self.lower_vmov_core_scalar(to_core),
            C::VmovCorePair { to_core } => self.lower_vmov_core_pair(to_core),

            C::Und => unreachable!("terminator handled by the driver"),
        }

        if let Some(label) = self.skip_label.take() {
            self.block.insert_label(label);
        }

        // the IT state machine advances once per executed instruction; a
        // new IT instruction installs its own state instead
        if kind != C::It {
            self.block.emit(Op::ItAdvance);
        }
    }

    /// Generic coprocessor access: there are no coprocessors besides the
    /// FP extension on this family, so everything funnels into NOCP.
    fn lower_coprocessor(&mut self) {
        if self.ctx.params.verbose {
            tracing::warn!(
                pc = format_args!("{:#010x}", self.d.pc),
                cp = self.d.cpnum,
                "unsupported coprocessor access"
            );
        }
        self.emit_usage_fault(crate::sysregs::CFSR_NOCP);
    }
}
