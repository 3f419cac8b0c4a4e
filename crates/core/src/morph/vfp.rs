// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! VFP lowering (single-precision register file, FPv4-SP style).
//!
//! Every routine emits the FP enablement gate first: at execution time the
//! gate checks CPACR access rights (NOCP UsageFault if denied) and flushes
//! any lazily-reserved FP context of an interrupted frame before this
//! instruction touches the register bank. Double-word load/store forms
//! move register pairs; the arithmetic set is single precision only.

use super::ops::{Binop, FBinop, FCvt, FUnop, FlagsOp, Op, Operand, Reg, SysCall, Unop};
use super::MorphState;
use crate::decode::attrs::VfpAlu;
use crate::state::REG_PC;
use crate::sysregs::CFSR_UNDEFINSTR;

impl<'a> MorphState<'a> {
    fn fp_gate(&mut self) {
        self.block.emit(Op::SysCall(SysCall::FpGate));
    }

    /// Number of implemented single-precision registers.
    fn sreg_count(&self) -> u8 {
        if self.ctx.scs.fpu_present() {
            32
        } else {
            0
        }
    }

    /// A single-precision register operand, faulting the instruction when
    /// the register number is outside the implemented bank.
    fn sreg(&mut self, n: u8) -> Option<Reg> {
        if n >= self.sreg_count() {
            self.emit_usage_fault(CFSR_UNDEFINSTR);
            None
        } else {
            Some(Reg::S(n))
        }
    }

    /// First single of a register operand that may name a double.
    fn base_single(&self, n: u8) -> u8 {
        if self.d.sz == 8 {
            n * 2
        } else {
            n
        }
    }

    pub(super) fn lower_vfp_binop(&mut self, op: VfpAlu) {
        self.fp_gate();
        let (Some(rd), Some(ra), Some(rb)) =
            (self.sreg(self.d.r1), self.sreg(self.d.r2), self.sreg(self.d.r3))
        else {
            return;
        };
        match op {
            VfpAlu::Add => self.block.emit(Op::FBinop { op: FBinop::Add, rd, ra, rb }),
            VfpAlu::Sub => self.block.emit(Op::FBinop { op: FBinop::Sub, rd, ra, rb }),
            VfpAlu::Mul => self.block.emit(Op::FBinop { op: FBinop::Mul, rd, ra, rb }),
            VfpAlu::Div => self.block.emit(Op::FBinop { op: FBinop::Div, rd, ra, rb }),
            VfpAlu::Nmul => {
                self.block.emit(Op::FBinop { op: FBinop::Mul, rd, ra, rb });
                self.block.emit(Op::FUnop { op: FUnop::Neg, rd, ra: rd });
            }
        }
    }

    pub(super) fn lower_vfp_mla(&mut self, negate_product: bool, negate_acc: bool, fused: bool) {
        self.fp_gate();
        let (Some(rd), Some(ra), Some(rb)) =
            (self.sreg(self.d.r1), self.sreg(self.d.r2), self.sreg(self.d.r3))
        else {
            return;
        };
        self.block.emit(Op::FMac { rd, ra, rb, negate_product, negate_acc, fused });
    }

    pub(super) fn lower_vfp_mov_imm(&mut self) {
        self.fp_gate();
        let Some(rd) = self.sreg(self.d.r1) else { return };
        self.block.emit(Op::Unop {
            op: Unop::Mov,
            rd,
            ra: Operand::Imm(self.d.sdfp_mi),
            flags: FlagsOp::None,
        });
    }

    pub(super) fn lower_vfp_unop(&mut self, op: FUnop) {
        self.fp_gate();
        let (Some(rd), Some(ra)) = (self.sreg(self.d.r1), self.sreg(self.d.r2)) else {
            return;
        };
        self.block.emit(Op::FUnop { op, rd, ra });
    }

    pub(super) fn lower_vfp_cmp(&mut self, quiet_nan_ok: bool, with_zero: bool) {
        self.fp_gate();
        let Some(ra) = self.sreg(self.d.r1) else { return };
        let rb = if with_zero {
            Operand::Imm(0)
        } else {
            match self.sreg(self.d.r2) {
                Some(r) => Operand::Reg(r),
                None => return,
            }
        };
        self.block.emit(Op::FCmp { ra, rb, quiet_nan_ok });
    }

    pub(super) fn lower_vfp_cvt(&mut self, kind: FCvt) {
        self.fp_gate();
        let (Some(rd), Some(ra)) = (self.sreg(self.d.r1), self.sreg(self.d.r2)) else {
            return;
        };
        self.block.emit(Op::FCvt { kind, rd, ra });
    }

    /// Fixed-point conversions operate on Sd in place; the fraction-bit
    /// count was folded into the decoded constant.
    pub(super) fn lower_vfp_cvt_fixed(&mut self, signed: bool, fbits16: bool, to_float: bool) {
        self.fp_gate();
        let Some(rd) = self.sreg(self.d.r1) else { return };
        let fbits = self.d.c as u8;
        let kind = if to_float {
            FCvt::FixToF32 { signed, fbits, size16: fbits16 }
        } else {
            FCvt::F32ToFix { signed, fbits, size16: fbits16 }
        };
        self.block.emit(Op::FCvt { kind, rd, ra: rd });
    }

    pub(super) fn lower_vfp_cvt_half(&mut self, top: bool, to_half: bool) {
        let kind = if to_half {
            FCvt::F32ToHalf { top }
        } else {
            FCvt::HalfToF32 { top }
        };
        self.lower_vfp_cvt(kind);
    }

    ////////////////////////////////////////////////////////////////////////
    // extension register load/store
    ////////////////////////////////////////////////////////////////////////

    /// Word count of the transfer (doubles move two words each).
    fn vfp_word_count(&self) -> u8 {
        self.d.nregs
    }

    pub(super) fn lower_vfp_ldst(&mut self, load: bool) {
        self.fp_gate();
        let s = self.base_single(self.d.r1);
        let words = if self.d.sz == 8 { 2 } else { 1 };
        if s + words > self.sreg_count() {
            self.emit_usage_fault(CFSR_UNDEFINSTR);
            return;
        }
        let base = if self.d.r2 == REG_PC {
            Operand::Imm(self.d.pc.wrapping_add(4) & !3)
        } else {
            Operand::Reg(Reg::R(self.d.r2))
        };
        for i in 0..words {
            let sreg = Reg::S(s + i);
            let offset = Operand::Imm(self.d.c.wrapping_add(4 * i as u32));
            if load {
                self.block.emit(Op::Load {
                    bits: 32,
                    sx: false,
                    rd: sreg,
                    base,
                    offset,
                    user: false,
                    strict_align: true,
                });
            } else {
                self.block.emit(Op::Store {
                    bits: 32,
                    rs: sreg,
                    base,
                    offset,
                    user: false,
                    strict_align: true,
                });
            }
        }
    }

    pub(super) fn lower_vfp_ldstm(&mut self, load: bool, writeback: bool, dec: bool) {
        self.fp_gate();
        let s = self.base_single(self.d.r1);
        let words = self.vfp_word_count();
        if words == 0 || s as u32 + words as u32 > self.sreg_count() as u32 {
            self.emit_usage_fault(CFSR_UNDEFINSTR);
            return;
        }
        let base = Reg::R(self.d.r2);
        let bytes = words as u32 * 4;

        let t_addr = self.new_temp();
        if dec {
            self.block.emit(Op::Binop {
                op: Binop::Sub,
                rd: t_addr,
                ra: Operand::Reg(base),
                rb: Operand::Imm(bytes),
                flags: FlagsOp::None,
            });
        } else {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: t_addr, ra: Operand::Reg(base), flags: FlagsOp::None });
        }

        for i in 0..words {
            let sreg = Reg::S(s + i);
            let offset = Operand::Imm(4 * i as u32);
            if load {
                self.block.emit(Op::Load {
                    bits: 32,
                    sx: false,
                    rd: sreg,
                    base: Operand::Reg(t_addr),
                    offset,
                    user: false,
                    strict_align: true,
                });
            } else {
                self.block.emit(Op::Store {
                    bits: 32,
                    rs: sreg,
                    base: Operand::Reg(t_addr),
                    offset,
                    user: false,
                    strict_align: true,
                });
            }
        }

        if writeback {
            let op = if dec { Binop::Sub } else { Binop::Add };
            self.block.emit(Op::Binop {
                op,
                rd: base,
                ra: Operand::Reg(base),
                rb: Operand::Imm(bytes),
                flags: FlagsOp::None,
            });
        }
        self.free_temp();
    }

    pub(super) fn lower_vfp_push_pop(&mut self, push: bool) {
        self.lower_vfp_ldstm(!push, true, push);
    }

    ////////////////////////////////////////////////////////////////////////
    // core <-> extension transfers
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_vmrs(&mut self) {
        self.fp_gate();
        if self.d.r1 == REG_PC {
            // VMRS APSR_nzcv, FPSCR
            self.block.emit(Op::SysCall(SysCall::FpscrToFlags));
        } else {
            self.block.emit(Op::ReadSpecial { rd: Reg::R(self.d.r1), sysm: super::ops::sysm::FPSCR });
        }
    }

    pub(super) fn lower_vmsr(&mut self) {
        self.fp_gate();
        let rs = self.rs(self.d.r1);
        self.block.emit(Op::WriteSpecial { sysm: super::ops::sysm::FPSCR, rs, mask: 0 });
    }

    pub(super) fn lower_vmov_core_single(&mut self, to_core: bool) {
        self.fp_gate();
        let Some(sn) = self.sreg(self.d.r2) else { return };
        if to_core {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(sn), flags: FlagsOp::None });
        } else {
            let rs = self.rs(self.d.r1);
            self.block.emit(Op::Unop { op: Unop::Mov, rd: sn, ra: Operand::Reg(rs), flags: FlagsOp::None });
        }
    }

    pub(super) fn lower_vmov_core_scalar(&mut self, to_core: bool) {
        self.fp_gate();
        let single = self.d.r2 * 2 + self.d.index;
        let Some(s) = self.sreg(single) else { return };
        if to_core {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(s), flags: FlagsOp::None });
        } else {
            let rs = self.rs(self.d.r1);
            self.block.emit(Op::Unop { op: Unop::Mov, rd: s, ra: Operand::Reg(rs), flags: FlagsOp::None });
        }
    }

    pub(super) fn lower_vmov_core_pair(&mut self, to_core: bool) {
        self.fp_gate();
        let base = self.base_single(self.d.r3);
        let (Some(s0), Some(s1)) = (self.sreg(base), self.sreg(base + 1)) else {
            return;
        };
        if to_core {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(s0), flags: FlagsOp::None });
            self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r2), ra: Operand::Reg(s1), flags: FlagsOp::None });
        } else {
            let rt = self.rs(self.d.r1);
            let rt2 = self.rs(self.d.r2);
            self.block.emit(Op::Unop { op: Unop::Mov, rd: s0, ra: Operand::Reg(rt), flags: FlagsOp::None });
            self.block.emit(Op::Unop { op: Unop::Mov, rd: s1, ra: Operand::Reg(rt2), flags: FlagsOp::None });
        }
    }
}
