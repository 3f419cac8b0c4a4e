// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Integer lowering routines.
//!
//! One routine per opcode-class family; each emits the primitive-op
//! sequence for the instruction held in the surrounding `MorphState`.
//! Temporaries are allocated from the per-instruction cursor and freed in
//! reverse order.

use super::ops::{
    Binop, CmpKind, FlagRef, FlagsOp, Op, Operand, Reg, SysCall, Unop,
};
use super::MorphState;
use crate::decode::attrs::{AluOp, CmpOp, ExtKind, MovOp, PasOp, PasPrefix};
use crate::decode::fields::{ShiftOp, UnalignedAction};
use crate::state::{NO_EXCLUSIVE_TAG, REG_PC};

/// Integer operation selector with its flag policy: the base binop, the
/// flag effect when the instruction sets flags, and whether the shifter
/// carry-out feeds C.
fn alu_map(op: AluOp) -> (Binop, FlagsOp, bool) {
    match op {
        AluOp::Adc => (Binop::Adc, FlagsOp::ZnCv, false),
        AluOp::Add => (Binop::Add, FlagsOp::ZnCv, false),
        AluOp::And => (Binop::And, FlagsOp::Zn, true),
        AluOp::Bic => (Binop::Andn, FlagsOp::Zn, true),
        AluOp::Eor => (Binop::Xor, FlagsOp::Zn, true),
        AluOp::Mul => (Binop::Mul, FlagsOp::Zn, true),
        AluOp::Orn => (Binop::Orn, FlagsOp::Zn, true),
        AluOp::Orr => (Binop::Or, FlagsOp::Zn, true),
        AluOp::Rsb => (Binop::Rsub, FlagsOp::ZnBv, false),
        AluOp::Sbc => (Binop::Sbb, FlagsOp::ZnBv, false),
        AluOp::Sub => (Binop::Sub, FlagsOp::ZnBv, false),
    }
}

fn mov_map(op: MovOp) -> (Unop, FlagsOp, bool) {
    match op {
        MovOp::Mov => (Unop::Mov, FlagsOp::Zn, true),
        MovOp::Mvn => (Unop::Not, FlagsOp::Zn, true),
        MovOp::Neg => (Unop::Neg, FlagsOp::ZnBv, false),
    }
}

fn cmp_map(op: CmpOp) -> (Binop, FlagsOp, bool) {
    match op {
        CmpOp::Cmp => (Binop::Sub, FlagsOp::ZnBv, false),
        CmpOp::Cmn => (Binop::Add, FlagsOp::ZnCv, false),
        CmpOp::Tst => (Binop::And, FlagsOp::Zn, true),
        CmpOp::Teq => (Binop::Xor, FlagsOp::Zn, true),
    }
}

fn shift_binop(so: ShiftOp) -> Binop {
    match so {
        ShiftOp::Lsl | ShiftOp::None => Binop::Shl,
        ShiftOp::Lsr => Binop::Shr,
        ShiftOp::Asr => Binop::Sar,
        ShiftOp::Ror => Binop::Ror,
        ShiftOp::Rrx => Binop::Rcr,
    }
}

impl<'a> MorphState<'a> {
    fn flags_if_set(&self, policy: FlagsOp) -> FlagsOp {
        if self.d.set_flags {
            policy
        } else {
            FlagsOp::None
        }
    }

    /// Carry from a rotated modified immediate: only rotated encodings
    /// change C, and only when the instruction both sets flags and uses the
    /// shifter carry.
    fn emit_const_carry(&mut self, cout: bool) {
        if self.d.set_flags && cout && self.d.crotate != 0 {
            self.block.emit(Op::SetCarry(self.d.c & 0x8000_0000 != 0));
        }
    }

    /// Shift `ra` by the decoded constant into `t`, optionally producing
    /// the shifter carry.
    fn emit_shifted_rc(&mut self, t: Reg, ra: Reg, cout: bool) {
        let flags = if self.d.set_flags && cout { FlagsOp::COut } else { FlagsOp::None };
        let (op, amount) = if self.d.so == ShiftOp::Rrx {
            (Binop::Rcr, 1)
        } else {
            (shift_binop(self.d.so), self.d.c)
        };
        self.block.emit(Op::Binop { op, rd: t, ra: Operand::Reg(ra), rb: Operand::Imm(amount), flags });
    }

    ////////////////////////////////////////////////////////////////////////
    // unops (MOV/MVN/NEG and the shift forms)
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_unop_imm(&mut self, op: MovOp) {
        let (unop, policy, cout) = mov_map(op);
        let (rd, is_pc) = self.rd_dest();
        let flags = self.flags_if_set(policy);
        self.block.emit(Op::Unop { op: unop, rd, ra: Operand::Imm(self.d.c), flags });
        self.emit_const_carry(cout);
        self.finish_dest(rd, is_pc);
    }

    pub(super) fn lower_unop_rm(&mut self, op: MovOp) {
        let (unop, policy, _) = mov_map(op);
        let ra = self.rs(self.d.r2);
        let (rd, is_pc) = self.rd_dest();
        let flags = self.flags_if_set(policy);
        self.block.emit(Op::Unop { op: unop, rd, ra: Operand::Reg(ra), flags });
        self.finish_dest(rd, is_pc);
    }

    /// MOV/MVN with an immediate-shifted register operand. A plain MOV
    /// lowers to the shift itself.
    pub(super) fn lower_unop_rsi(&mut self, op: MovOp) {
        let ra = self.rs(self.d.r2);
        let (rd, is_pc) = self.rd_dest();
        match op {
            MovOp::Mov => {
                let flags = self.flags_if_set(FlagsOp::ZnCOut);
                let (sop, amount) = if self.d.so == ShiftOp::Rrx {
                    (Binop::Rcr, 1)
                } else {
                    (shift_binop(self.d.so), self.d.c)
                };
                self.block.emit(Op::Binop {
                    op: sop,
                    rd,
                    ra: Operand::Reg(ra),
                    rb: Operand::Imm(amount),
                    flags,
                });
            }
            _ => {
                let (unop, policy, cout) = mov_map(op);
                let t = self.new_temp();
                self.emit_shifted_rc(t, ra, cout);
                let flags = self.flags_if_set(policy);
                self.block.emit(Op::Unop { op: unop, rd, ra: Operand::Reg(t), flags });
                self.free_temp();
            }
        }
        self.finish_dest(rd, is_pc);
    }

    /// 32-bit register-controlled shift (`rd = rn shift rm`).
    pub(super) fn lower_unop_rsr(&mut self, _op: MovOp) {
        let ra = self.rs(self.d.r2);
        let rb = self.rs(self.d.r3);
        let (rd, is_pc) = self.rd_dest();
        let flags = self.flags_if_set(FlagsOp::ZnCOut);
        self.block.emit(Op::Binop {
            op: shift_binop(self.d.so),
            rd,
            ra: Operand::Reg(ra),
            rb: Operand::Reg(rb),
            flags,
        });
        self.finish_dest(rd, is_pc);
    }

    /// 16-bit register-controlled shift (`rd = rd shift rm`).
    pub(super) fn lower_unop_rsrt(&mut self, _op: MovOp) {
        let rd = Reg::R(self.d.r1);
        let rb = self.rs(self.d.r2);
        let flags = self.flags_if_set(FlagsOp::ZnCOut);
        self.block.emit(Op::Binop {
            op: shift_binop(self.d.so),
            rd,
            ra: Operand::Reg(rd),
            rb: Operand::Reg(rb),
            flags,
        });
    }

    pub(super) fn lower_unop_rrx(&mut self, op: MovOp) {
        self.lower_unop_rsi(op);
    }

    pub(super) fn lower_unop_misc(&mut self, op: Unop) {
        let ra = self.rs(self.d.r2);
        self.block.emit(Op::Unop { op, rd: Reg::R(self.d.r1), ra: Operand::Reg(ra), flags: FlagsOp::None });
    }

    ////////////////////////////////////////////////////////////////////////
    // binops
    ////////////////////////////////////////////////////////////////////////

    fn emit_binop(&mut self, op: AluOp, rd_idx: u8, ra: Reg, rb: Operand) {
        let (binop, policy, cout) = alu_map(op);
        let (rd, is_pc) = self.rd_dest_for(rd_idx);
        let flags = self.flags_if_set(policy);
        self.block.emit(Op::Binop { op: binop, rd, ra: Operand::Reg(ra), rb, flags });
        if let Operand::Imm(_) = rb {
            self.emit_const_carry(cout);
        }
        self.finish_dest(rd, is_pc);
    }

    pub(super) fn lower_binop_imm(&mut self, op: AluOp) {
        let ra = self.rs(self.d.r2);
        self.emit_binop(op, self.d.r1, ra, Operand::Imm(self.d.c));
    }

    pub(super) fn lower_binop_rm(&mut self, op: AluOp) {
        let ra = self.rs(self.d.r2);
        let rb = self.rs(self.d.r3);
        self.emit_binop(op, self.d.r1, ra, Operand::Reg(rb));
    }

    /// Two-operand register form: `rd = rd op rm`.
    pub(super) fn lower_binop_rt(&mut self, op: AluOp) {
        let ra = self.rs(self.d.r1);
        let rb = self.rs(self.d.r2);
        self.emit_binop(op, self.d.r1, ra, Operand::Reg(rb));
    }

    /// Two-operand immediate form: `rd = rd op const`.
    pub(super) fn lower_binop_it(&mut self, op: AluOp) {
        let ra = self.rs(self.d.r1);
        self.emit_binop(op, self.d.r1, ra, Operand::Imm(self.d.c));
    }

    pub(super) fn lower_binop_rsi(&mut self, op: AluOp) {
        let (_, _, cout) = alu_map(op);
        let rm = self.rs(self.d.r3);
        let t = self.new_temp();
        self.emit_shifted_rc(t, rm, cout);
        let ra = self.rs(self.d.r2);
        self.emit_binop(op, self.d.r1, ra, Operand::Reg(t));
        self.free_temp();
    }

    pub(super) fn lower_binop_rrx(&mut self, op: AluOp) {
        self.lower_binop_rsi(op);
    }

    /// PC-relative address formation: the constant is pre-adjusted so the
    /// result stays word aligned for either halfword alignment of the
    /// current instruction.
    pub(super) fn lower_binop_adr(&mut self, sub: bool) {
        let aligned_pc = self.d.pc.wrapping_add(4).wrapping_sub(self.d.pc & 2);
        let value = if sub {
            aligned_pc.wrapping_sub(self.d.c)
        } else {
            aligned_pc.wrapping_add(self.d.c)
        };
        let (rd, is_pc) = self.rd_dest();
        self.block.emit(Op::Unop { op: Unop::Mov, rd, ra: Operand::Imm(value), flags: FlagsOp::None });
        self.finish_dest(rd, is_pc);
    }

    ////////////////////////////////////////////////////////////////////////
    // compares
    ////////////////////////////////////////////////////////////////////////

    fn emit_cmpop(&mut self, op: CmpOp, ra: Reg, rb: Operand) {
        let (binop, policy, cout) = cmp_map(op);
        let t = self.new_temp();
        self.block.emit(Op::Binop { op: binop, rd: t, ra: Operand::Reg(ra), rb, flags: policy });
        if let Operand::Imm(_) = rb {
            if cout && self.d.crotate != 0 {
                self.block.emit(Op::SetCarry(self.d.c & 0x8000_0000 != 0));
            }
        }
        self.free_temp();
    }

    pub(super) fn lower_cmpop_imm(&mut self, op: CmpOp) {
        let ra = self.rs(self.d.r1);
        self.emit_cmpop(op, ra, Operand::Imm(self.d.c));
    }

    pub(super) fn lower_cmpop_rm(&mut self, op: CmpOp) {
        let ra = self.rs(self.d.r1);
        let rb = self.rs(self.d.r2);
        self.emit_cmpop(op, ra, Operand::Reg(rb));
    }

    pub(super) fn lower_cmpop_rsi(&mut self, op: CmpOp) {
        let (_, _, cout) = cmp_map(op);
        let rm = self.rs(self.d.r2);
        let t = self.new_temp();
        self.emit_shifted_rc(t, rm, cout);
        let ra = self.rs(self.d.r1);
        self.emit_cmpop(op, ra, Operand::Reg(t));
        self.free_temp();
    }

    pub(super) fn lower_cmpop_rrx(&mut self, op: CmpOp) {
        self.lower_cmpop_rsi(op);
    }

    ////////////////////////////////////////////////////////////////////////
    // MOVW/MOVT
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_movw(&mut self) {
        let rd = Reg::R(self.d.r1);
        self.block.emit(Op::Unop { op: Unop::Mov, rd, ra: Operand::Imm(self.d.c), flags: FlagsOp::None });
    }

    pub(super) fn lower_movt(&mut self) {
        let rd = Reg::R(self.d.r1);
        self.block.emit(Op::Binop {
            op: Binop::And,
            rd,
            ra: Operand::Reg(rd),
            rb: Operand::Imm(0xffff),
            flags: FlagsOp::None,
        });
        self.block.emit(Op::Binop {
            op: Binop::Or,
            rd,
            ra: Operand::Reg(rd),
            rb: Operand::Imm(self.d.c << 16),
            flags: FlagsOp::None,
        });
    }

    ////////////////////////////////////////////////////////////////////////
    // saturation and bit field
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_sat(&mut self, unsigned: bool) {
        let rn = self.rs(self.d.r2);
        let t = self.new_temp();
        self.emit_shifted_rc(t, rn, false);
        self.block.emit(Op::Saturate {
            rd: Reg::R(self.d.r1),
            rs: t,
            width: self.d.w as u8,
            unsigned,
            lanes16: false,
        });
        self.free_temp();
    }

    pub(super) fn lower_sat16(&mut self, unsigned: bool) {
        let rn = self.rs(self.d.r2);
        self.block.emit(Op::Saturate {
            rd: Reg::R(self.d.r1),
            rs: rn,
            width: self.d.w as u8,
            unsigned,
            lanes16: true,
        });
    }

    pub(super) fn lower_xbfx(&mut self, signed: bool) {
        let lsb = self.d.c;
        let width = self.d.w as u32;
        if width == 0 || lsb + width > 32 {
            return; // UNPREDICTABLE encoding; leave the destination alone
        }
        let rn = self.rs(self.d.r2);
        let rd = Reg::R(self.d.r1);
        let up = 32 - lsb - width;
        self.block.emit(Op::Binop {
            op: Binop::Shl,
            rd,
            ra: Operand::Reg(rn),
            rb: Operand::Imm(up),
            flags: FlagsOp::None,
        });
        self.block.emit(Op::Binop {
            op: if signed { Binop::Sar } else { Binop::Shr },
            rd,
            ra: Operand::Reg(rd),
            rb: Operand::Imm(32 - width),
            flags: FlagsOp::None,
        });
    }

    pub(super) fn lower_bfi(&mut self, clear: bool) {
        let lsb = self.d.c;
        let width = self.d.w;
        if width <= 0 || lsb + width as u32 > 32 {
            return; // msb < lsb is UNPREDICTABLE
        }
        let mask = if width as u32 == 32 {
            u32::MAX
        } else {
            ((1u32 << width) - 1) << lsb
        };
        let rd = Reg::R(self.d.r1);
        self.block.emit(Op::Binop {
            op: Binop::And,
            rd,
            ra: Operand::Reg(rd),
            rb: Operand::Imm(!mask),
            flags: FlagsOp::None,
        });
        if !clear {
            let rn = self.rs(self.d.r2);
            let t = self.new_temp();
            self.block.emit(Op::Binop {
                op: Binop::Shl,
                rd: t,
                ra: Operand::Reg(rn),
                rb: Operand::Imm(lsb),
                flags: FlagsOp::None,
            });
            self.block.emit(Op::Binop {
                op: Binop::And,
                rd: t,
                ra: Operand::Reg(t),
                rb: Operand::Imm(mask),
                flags: FlagsOp::None,
            });
            self.block.emit(Op::Binop {
                op: Binop::Or,
                rd,
                ra: Operand::Reg(rd),
                rb: Operand::Reg(t),
                flags: FlagsOp::None,
            });
            self.free_temp();
        }
    }

    pub(super) fn lower_pkh(&mut self, tb: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let rd = Reg::R(self.d.r1);
        let t1 = self.new_temp();
        let t2 = self.new_temp();
        let (keep_mask, take_mask) = if tb {
            (0xffff_0000u32, 0x0000_ffffu32)
        } else {
            (0x0000_ffffu32, 0xffff_0000u32)
        };
        self.block.emit(Op::Binop {
            op: Binop::And,
            rd: t1,
            ra: Operand::Reg(rn),
            rb: Operand::Imm(keep_mask),
            flags: FlagsOp::None,
        });
        self.emit_shifted_rc(t2, rm, false);
        self.block.emit(Op::Binop {
            op: Binop::And,
            rd: t2,
            ra: Operand::Reg(t2),
            rb: Operand::Imm(take_mask),
            flags: FlagsOp::None,
        });
        self.block.emit(Op::Binop {
            op: Binop::Or,
            rd,
            ra: Operand::Reg(t1),
            rb: Operand::Reg(t2),
            flags: FlagsOp::None,
        });
        self.free_temp();
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // extend and extend-accumulate
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_extend(&mut self, kind: ExtKind, unsigned: bool, accumulate: bool) {
        let src = if accumulate { self.d.r3 } else { self.d.r2 };
        let rm = self.rs(src);
        let rd = Reg::R(self.d.r1);
        let rot = self.d.c;

        let t = self.new_temp();
        if rot != 0 {
            self.block.emit(Op::Binop {
                op: Binop::Ror,
                rd: t,
                ra: Operand::Reg(rm),
                rb: Operand::Imm(rot),
                flags: FlagsOp::None,
            });
        } else {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: t, ra: Operand::Reg(rm), flags: FlagsOp::None });
        }

        let ext_shift = match kind {
            ExtKind::Byte | ExtKind::Byte16 => 24,
            ExtKind::Half => 16,
        };
        let shr = if unsigned { Binop::Shr } else { Binop::Sar };

        match kind {
            ExtKind::Byte | ExtKind::Half => {
                let dest = if accumulate { t } else { rd };
                self.block.emit(Op::Binop {
                    op: Binop::Shl,
                    rd: dest,
                    ra: Operand::Reg(t),
                    rb: Operand::Imm(ext_shift),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: shr,
                    rd: dest,
                    ra: Operand::Reg(dest),
                    rb: Operand::Imm(ext_shift),
                    flags: FlagsOp::None,
                });
                if accumulate {
                    let rn = self.rs(self.d.r2);
                    self.block.emit(Op::Binop {
                        op: Binop::Add,
                        rd,
                        ra: Operand::Reg(rn),
                        rb: Operand::Reg(t),
                        flags: FlagsOp::None,
                    });
                }
            }
            ExtKind::Byte16 => {
                // extend bytes 0 and 2 into halfword lanes
                let t2 = self.new_temp();
                self.block.emit(Op::Binop {
                    op: Binop::Shl,
                    rd: t2,
                    ra: Operand::Reg(t),
                    rb: Operand::Imm(8),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: shr,
                    rd: t2,
                    ra: Operand::Reg(t2),
                    rb: Operand::Imm(24),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: Binop::Shl,
                    rd: t2,
                    ra: Operand::Reg(t2),
                    rb: Operand::Imm(16),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: Binop::Shl,
                    rd: t,
                    ra: Operand::Reg(t),
                    rb: Operand::Imm(24),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: shr,
                    rd: t,
                    ra: Operand::Reg(t),
                    rb: Operand::Imm(24),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: Binop::And,
                    rd: t,
                    ra: Operand::Reg(t),
                    rb: Operand::Imm(0xffff),
                    flags: FlagsOp::None,
                });
                self.block.emit(Op::Binop {
                    op: Binop::Or,
                    rd: t,
                    ra: Operand::Reg(t),
                    rb: Operand::Reg(t2),
                    flags: FlagsOp::None,
                });
                if accumulate {
                    // lanes accumulate independently
                    let rn = self.rs(self.d.r2);
                    self.block.emit(Op::Parallel16 {
                        add1: true,
                        add2: true,
                        exchange: false,
                        signed: false,
                        halve: false,
                        saturate: false,
                        set_ge: false,
                        rd,
                        rn,
                        rm: t,
                    });
                } else {
                    self.block.emit(Op::Unop { op: Unop::Mov, rd, ra: Operand::Reg(t), flags: FlagsOp::None });
                }
                self.free_temp();
            }
        }
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // parallel add/subtract and friends
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_pas(&mut self, prefix: PasPrefix, op: PasOp) {
        let (signed, saturate, halve, set_ge) = match prefix {
            PasPrefix::S => (true, false, false, true),
            PasPrefix::Q => (true, true, false, false),
            PasPrefix::Sh => (true, false, true, false),
            PasPrefix::U => (false, false, false, true),
            PasPrefix::Uq => (false, true, false, false),
            PasPrefix::Uh => (false, false, true, false),
        };
        let rd = Reg::R(self.d.r1);
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        match op {
            PasOp::Add16 | PasOp::Sub16 | PasOp::Asx | PasOp::Sax => {
                let (add1, add2, exchange) = match op {
                    PasOp::Add16 => (true, true, false),
                    PasOp::Sub16 => (false, false, false),
                    PasOp::Asx => (false, true, true),
                    PasOp::Sax => (true, false, true),
                    _ => unreachable!(),
                };
                self.block.emit(Op::Parallel16 {
                    add1,
                    add2,
                    exchange,
                    signed,
                    halve,
                    saturate,
                    set_ge,
                    rd,
                    rn,
                    rm,
                });
            }
            PasOp::Add8 | PasOp::Sub8 => {
                self.block.emit(Op::Parallel8 {
                    add: op == PasOp::Add8,
                    signed,
                    halve,
                    saturate,
                    set_ge,
                    rd,
                    rn,
                    rm,
                });
            }
        }
    }

    pub(super) fn lower_qaddsub(&mut self, double: bool, sub: bool) {
        let rm = self.rs(self.d.r2);
        let rn = self.rs(self.d.r3);
        let rd = Reg::R(self.d.r1);
        let op = if sub { Binop::SubSatS } else { Binop::AddSatS };
        if double {
            let t = self.new_temp();
            self.block.emit(Op::Binop {
                op: Binop::AddSatS,
                rd: t,
                ra: Operand::Reg(rn),
                rb: Operand::Reg(rn),
                flags: FlagsOp::None,
            });
            self.block.emit(Op::Binop { op, rd, ra: Operand::Reg(rm), rb: Operand::Reg(t), flags: FlagsOp::None });
            self.free_temp();
        } else {
            self.block.emit(Op::Binop { op, rd, ra: Operand::Reg(rm), rb: Operand::Reg(rn), flags: FlagsOp::None });
        }
    }

    pub(super) fn lower_sel(&mut self) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        self.block.emit(Op::Sel { rd: Reg::R(self.d.r1), rn, rm });
    }

    ////////////////////////////////////////////////////////////////////////
    // multiply and divide
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_mla(&mut self, subtract: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let ra = self.rs(self.d.r4);
        let rd = Reg::R(self.d.r1);
        let t = self.new_temp();
        self.block.emit(Op::Binop {
            op: Binop::Mul,
            rd: t,
            ra: Operand::Reg(rn),
            rb: Operand::Reg(rm),
            flags: FlagsOp::None,
        });
        if subtract {
            self.block.emit(Op::Binop {
                op: Binop::Sub,
                rd,
                ra: Operand::Reg(ra),
                rb: Operand::Reg(t),
                flags: FlagsOp::None,
            });
        } else {
            self.block.emit(Op::Binop {
                op: Binop::Add,
                rd,
                ra: Operand::Reg(t),
                rb: Operand::Reg(ra),
                flags: FlagsOp::None,
            });
        }
        self.free_temp();
    }

    /// Long multiply. The destination halves may be non-adjacent registers,
    /// so the product is staged through an adjacent temporary pair and only
    /// then committed.
    pub(super) fn lower_mull(&mut self, signed: bool) {
        let rn = self.rs(self.d.r3);
        let rm = self.rs(self.d.r4);
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Mul64 { signed, lo, hi, ra: rn, rb: rm });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r2), ra: Operand::Reg(hi), flags: FlagsOp::None });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(lo), flags: FlagsOp::None });
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_mlal(&mut self, signed: bool) {
        let rn = self.rs(self.d.r3);
        let rm = self.rs(self.d.r4);
        let rdlo = Reg::R(self.d.r1);
        let rdhi = Reg::R(self.d.r2);
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Mul64 { signed, lo, hi, ra: rn, rb: rm });
        self.block.emit(Op::Add64 {
            lo,
            hi,
            add_lo: Operand::Reg(rdlo),
            add_hi: Operand::Reg(rdhi),
        });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: rdhi, ra: Operand::Reg(hi), flags: FlagsOp::None });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: rdlo, ra: Operand::Reg(lo), flags: FlagsOp::None });
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_umaal(&mut self) {
        let rn = self.rs(self.d.r3);
        let rm = self.rs(self.d.r4);
        let rdlo = Reg::R(self.d.r1);
        let rdhi = Reg::R(self.d.r2);
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Mul64 { signed: false, lo, hi, ra: rn, rb: rm });
        self.block.emit(Op::Add64 { lo, hi, add_lo: Operand::Reg(rdhi), add_hi: Operand::Imm(0) });
        self.block.emit(Op::Add64 { lo, hi, add_lo: Operand::Reg(rdlo), add_hi: Operand::Imm(0) });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: rdhi, ra: Operand::Reg(hi), flags: FlagsOp::None });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: rdlo, ra: Operand::Reg(lo), flags: FlagsOp::None });
        self.free_temp();
        self.free_temp();
    }

    /// Divide. Division by zero either traps or yields zero, decided at
    /// run time by CCR.DIV_0_TRP; `MIN_INT / -1` saturates in the divide
    /// primitive itself.
    pub(super) fn lower_div(&mut self, signed: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let rd = Reg::R(self.d.r1);
        let t = self.new_temp();
        let flag = match t {
            Reg::Temp(i) => i,
            _ => unreachable!(),
        };
        let do_div = self.block.new_label();
        let done = self.block.new_label();
        self.block.emit(Op::Cmp { kind: CmpKind::Eq, flag, ra: rm, rb: Operand::Imm(0) });
        self.block.emit(Op::CondJumpLabel { flag: FlagRef::Temp(flag), if_true: false, label: do_div });
        self.block.emit(Op::SysCall(SysCall::DivByZero));
        self.block.emit(Op::Unop { op: Unop::Mov, rd, ra: Operand::Imm(0), flags: FlagsOp::None });
        self.block.emit(Op::JumpLabel(done));
        self.block.insert_label(do_div);
        self.block.emit(Op::Binop {
            op: if signed { Binop::DivS } else { Binop::DivU },
            rd,
            ra: Operand::Reg(rn),
            rb: Operand::Reg(rm),
            flags: FlagsOp::None,
        });
        self.block.insert_label(done);
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // DSP multiplies
    ////////////////////////////////////////////////////////////////////////

    /// Sign-extended halfword of `r` into a fresh temporary.
    fn emit_half(&mut self, r: Reg, top: bool) -> Reg {
        let t = self.new_temp();
        if top {
            self.block.emit(Op::Binop { op: Binop::Sar, rd: t, ra: Operand::Reg(r), rb: Operand::Imm(16), flags: FlagsOp::None });
        } else {
            self.block.emit(Op::Binop { op: Binop::Shl, rd: t, ra: Operand::Reg(r), rb: Operand::Imm(16), flags: FlagsOp::None });
            self.block.emit(Op::Binop { op: Binop::Sar, rd: t, ra: Operand::Reg(t), rb: Operand::Imm(16), flags: FlagsOp::None });
        }
        t
    }

    pub(super) fn lower_smla_xy(&mut self, nx: bool, my: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let ra = self.rs(self.d.r4);
        let t1 = self.emit_half(rn, nx);
        let t2 = self.emit_half(rm, my);
        self.block.emit(Op::Binop { op: Binop::Mul, rd: t1, ra: Operand::Reg(t1), rb: Operand::Reg(t2), flags: FlagsOp::None });
        self.block.emit(Op::Binop {
            op: Binop::Add,
            rd: Reg::R(self.d.r1),
            ra: Operand::Reg(t1),
            rb: Operand::Reg(ra),
            flags: FlagsOp::QOverflow,
        });
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_smul_xy(&mut self, nx: bool, my: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let t1 = self.emit_half(rn, nx);
        let t2 = self.emit_half(rm, my);
        self.block.emit(Op::Binop {
            op: Binop::Mul,
            rd: Reg::R(self.d.r1),
            ra: Operand::Reg(t1),
            rb: Operand::Reg(t2),
            flags: FlagsOp::None,
        });
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_smlal_xy(&mut self, nx: bool, my: bool) {
        let rn = self.rs(self.d.r3);
        let rm = self.rs(self.d.r4);
        let t1 = self.emit_half(rn, nx);
        let t2 = self.emit_half(rm, my);
        self.block.emit(Op::Binop { op: Binop::Mul, rd: t1, ra: Operand::Reg(t1), rb: Operand::Reg(t2), flags: FlagsOp::None });
        self.block.emit(Op::Binop { op: Binop::Sar, rd: t2, ra: Operand::Reg(t1), rb: Operand::Imm(31), flags: FlagsOp::None });
        self.block.emit(Op::Add64 {
            lo: Reg::R(self.d.r1),
            hi: Reg::R(self.d.r2),
            add_lo: Operand::Reg(t1),
            add_hi: Operand::Reg(t2),
        });
        self.free_temp();
        self.free_temp();
    }

    /// SMLAW/SMULW: 32x16 multiply keeping bits 47:16.
    fn emit_mulw(&mut self, my: bool) -> Reg {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let th = self.emit_half(rm, my);
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Mul64 { signed: true, lo, hi, ra: rn, rb: th });
        self.block.emit(Op::Binop { op: Binop::Shr, rd: lo, ra: Operand::Reg(lo), rb: Operand::Imm(16), flags: FlagsOp::None });
        self.block.emit(Op::Binop { op: Binop::Shl, rd: hi, ra: Operand::Reg(hi), rb: Operand::Imm(16), flags: FlagsOp::None });
        self.block.emit(Op::Binop { op: Binop::Or, rd: lo, ra: Operand::Reg(lo), rb: Operand::Reg(hi), flags: FlagsOp::None });
        self.free_temp(); // hi
        lo
    }

    pub(super) fn lower_smlaw(&mut self, my: bool) {
        let ra = self.rs(self.d.r4);
        let lo = self.emit_mulw(my);
        self.block.emit(Op::Binop {
            op: Binop::Add,
            rd: Reg::R(self.d.r1),
            ra: Operand::Reg(lo),
            rb: Operand::Reg(ra),
            flags: FlagsOp::QOverflow,
        });
        self.free_temp(); // lo
        self.free_temp(); // half
    }

    pub(super) fn lower_smulw(&mut self, my: bool) {
        let lo = self.emit_mulw(my);
        self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(lo), flags: FlagsOp::None });
        self.free_temp();
        self.free_temp();
    }

    /// Dual 16x16 products of rn and (possibly swapped) rm halves.
    fn emit_dual_products(&mut self, cross: bool) -> (Reg, Reg) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let nb = self.emit_half(rn, false);
        let nt = self.emit_half(rn, true);
        let mb = self.emit_half(rm, cross);
        let mt = self.emit_half(rm, !cross);
        self.block.emit(Op::Binop { op: Binop::Mul, rd: nb, ra: Operand::Reg(nb), rb: Operand::Reg(mb), flags: FlagsOp::None });
        self.block.emit(Op::Binop { op: Binop::Mul, rd: nt, ra: Operand::Reg(nt), rb: Operand::Reg(mt), flags: FlagsOp::None });
        self.free_temp(); // mt
        self.free_temp(); // mb
        (nb, nt)
    }

    pub(super) fn lower_smlad(&mut self, cross: bool, subtract: bool) {
        let ra = self.rs(self.d.r4);
        let (p1, p2) = self.emit_dual_products(cross);
        if subtract {
            self.block.emit(Op::Binop { op: Binop::Sub, rd: p1, ra: Operand::Reg(p1), rb: Operand::Reg(p2), flags: FlagsOp::None });
        } else {
            self.block.emit(Op::Binop { op: Binop::Add, rd: p1, ra: Operand::Reg(p1), rb: Operand::Reg(p2), flags: FlagsOp::QOverflow });
        }
        self.block.emit(Op::Binop {
            op: Binop::Add,
            rd: Reg::R(self.d.r1),
            ra: Operand::Reg(p1),
            rb: Operand::Reg(ra),
            flags: FlagsOp::QOverflow,
        });
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_smuad(&mut self, cross: bool, subtract: bool) {
        let (p1, p2) = self.emit_dual_products(cross);
        if subtract {
            self.block.emit(Op::Binop {
                op: Binop::Sub,
                rd: Reg::R(self.d.r1),
                ra: Operand::Reg(p1),
                rb: Operand::Reg(p2),
                flags: FlagsOp::None,
            });
        } else {
            self.block.emit(Op::Binop {
                op: Binop::Add,
                rd: Reg::R(self.d.r1),
                ra: Operand::Reg(p1),
                rb: Operand::Reg(p2),
                flags: FlagsOp::QOverflow,
            });
        }
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_smlald(&mut self, cross: bool, subtract: bool) {
        // operands follow the long-multiply layout: rdlo, rdhi, rn, rm
        let rn = self.rs(self.d.r3);
        let rm = self.rs(self.d.r4);
        let nb = self.emit_half(rn, false);
        let nt = self.emit_half(rn, true);
        let mb = self.emit_half(rm, cross);
        let mt = self.emit_half(rm, !cross);
        self.block.emit(Op::Binop { op: Binop::Mul, rd: nb, ra: Operand::Reg(nb), rb: Operand::Reg(mb), flags: FlagsOp::None });
        self.block.emit(Op::Binop { op: Binop::Mul, rd: nt, ra: Operand::Reg(nt), rb: Operand::Reg(mt), flags: FlagsOp::None });
        let rdlo = Reg::R(self.d.r1);
        let rdhi = Reg::R(self.d.r2);
        self.block.emit(Op::Binop { op: Binop::Sar, rd: mb, ra: Operand::Reg(nb), rb: Operand::Imm(31), flags: FlagsOp::None });
        self.block.emit(Op::Add64 { lo: rdlo, hi: rdhi, add_lo: Operand::Reg(nb), add_hi: Operand::Reg(mb) });
        self.block.emit(Op::Binop { op: Binop::Sar, rd: mb, ra: Operand::Reg(nt), rb: Operand::Imm(31), flags: FlagsOp::None });
        if subtract {
            self.block.emit(Op::Sub64 { lo: rdlo, hi: rdhi, sub_lo: Operand::Reg(nt), sub_hi: Operand::Reg(mb) });
        } else {
            self.block.emit(Op::Add64 { lo: rdlo, hi: rdhi, add_lo: Operand::Reg(nt), add_hi: Operand::Reg(mb) });
        }
        self.free_temp();
        self.free_temp();
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_smmla(&mut self, round: bool, subtract: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let ra = self.rs(self.d.r4);
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Mul64 { signed: true, lo, hi, ra: rn, rb: rm });
        if subtract {
            // (ra << 32) - product
            let (slo, shi) = self.new_temp_pair();
            self.block.emit(Op::Unop { op: Unop::Mov, rd: slo, ra: Operand::Imm(0), flags: FlagsOp::None });
            self.block.emit(Op::Unop { op: Unop::Mov, rd: shi, ra: Operand::Reg(ra), flags: FlagsOp::None });
            self.block.emit(Op::Sub64 { lo: slo, hi: shi, sub_lo: Operand::Reg(lo), sub_hi: Operand::Reg(hi) });
            if round {
                self.block.emit(Op::Add64 { lo: slo, hi: shi, add_lo: Operand::Imm(0x8000_0000), add_hi: Operand::Imm(0) });
            }
            self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(shi), flags: FlagsOp::None });
            self.free_temp();
            self.free_temp();
        } else {
            self.block.emit(Op::Add64 { lo, hi, add_lo: Operand::Imm(0), add_hi: Operand::Reg(ra) });
            if round {
                self.block.emit(Op::Add64 { lo, hi, add_lo: Operand::Imm(0x8000_0000), add_hi: Operand::Imm(0) });
            }
            self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(hi), flags: FlagsOp::None });
        }
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_smmul(&mut self, round: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Mul64 { signed: true, lo, hi, ra: rn, rb: rm });
        if round {
            self.block.emit(Op::Add64 { lo, hi, add_lo: Operand::Imm(0x8000_0000), add_hi: Operand::Imm(0) });
        }
        self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(hi), flags: FlagsOp::None });
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_usad8(&mut self, accumulate: bool) {
        let rn = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let acc = if accumulate { Some(self.rs(self.d.r4)) } else { None };
        self.block.emit(Op::Usad8 { rd: Reg::R(self.d.r1), rn, rm, acc });
    }

    ////////////////////////////////////////////////////////////////////////
    // branches
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_b(&mut self) {
        let cond = self.prepare_condition();
        self.block.emit(Op::JumpImm { target: self.d.target, link: None, cond });
    }

    pub(super) fn lower_bl(&mut self) {
        let link = self.d.pc.wrapping_add(4) | 1;
        self.block.emit(Op::JumpImm { target: self.d.target, link: Some(link), cond: None });
    }

    pub(super) fn lower_branch_reg(&mut self, link: bool) {
        let rm = self.rs(self.d.r1);
        let link_value = if link {
            Some(self.d.pc.wrapping_add(self.d.bytes as u32) | 1)
        } else {
            None
        };
        self.block.emit(Op::JumpReg { rs: rm, link: link_value, interwork: true });
    }

    pub(super) fn lower_cbz(&mut self, nonzero: bool) {
        let rn = self.rs(self.d.r1);
        let t = self.new_temp();
        let flag = match t {
            Reg::Temp(i) => i,
            _ => unreachable!(),
        };
        self.block.emit(Op::Cmp { kind: CmpKind::Eq, flag, ra: rn, rb: Operand::Imm(0) });
        self.block.emit(Op::JumpImm {
            target: self.d.target,
            link: None,
            cond: Some((FlagRef::Temp(flag), !nonzero)),
        });
        self.free_temp();
    }

    pub(super) fn lower_tb(&mut self, half: bool) {
        let base = self.rs(self.d.r1);
        let index = self.rs(self.d.r2);
        let t = self.new_temp();
        let strict = self.d.ua == UnalignedAction::Fault;
        if half {
            self.block.emit(Op::Binop { op: Binop::Shl, rd: t, ra: Operand::Reg(index), rb: Operand::Imm(1), flags: FlagsOp::None });
            self.block.emit(Op::Load {
                bits: 16,
                sx: false,
                rd: t,
                base: Operand::Reg(base),
                offset: Operand::Reg(t),
                user: false,
                strict_align: strict,
            });
        } else {
            self.block.emit(Op::Load {
                bits: 8,
                sx: false,
                rd: t,
                base: Operand::Reg(base),
                offset: Operand::Reg(index),
                user: false,
                strict_align: false,
            });
        }
        self.block.emit(Op::Binop { op: Binop::Shl, rd: t, ra: Operand::Reg(t), rb: Operand::Imm(1), flags: FlagsOp::None });
        self.block.emit(Op::Binop {
            op: Binop::Add,
            rd: t,
            ra: Operand::Reg(t),
            rb: Operand::Imm(self.d.pc.wrapping_add(4)),
            flags: FlagsOp::None,
        });
        self.block.emit(Op::JumpReg { rs: t, link: None, interwork: false });
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // system register access
    ////////////////////////////////////////////////////////////////////////

    pub(super) fn lower_mrs(&mut self) {
        self.block.emit(Op::ReadSpecial { rd: Reg::R(self.d.r1), sysm: self.d.c as u8 });
    }

    pub(super) fn lower_msr(&mut self) {
        let rs = self.rs(self.d.r1);
        self.block.emit(Op::WriteSpecial { sysm: self.d.c as u8, rs, mask: self.d.psr_mask });
    }

    pub(super) fn lower_cps(&mut self) {
        self.block.emit(Op::Cps {
            enable: self.d.fact == crate::decode::fields::FlagAction::Enable,
            affect_primask: self.d.faff & 0b010 != 0,
            affect_faultmask: self.d.faff & 0b001 != 0,
        });
    }

    ////////////////////////////////////////////////////////////////////////
    // loads and stores
    ////////////////////////////////////////////////////////////////////////

    fn base_operand(&mut self) -> Operand {
        if self.d.r2 == REG_PC {
            // literal access: base is the word-aligned pipeline PC
            Operand::Imm(self.d.pc.wrapping_add(4) & !3)
        } else {
            Operand::Reg(Reg::R(self.d.r2))
        }
    }

    fn strict_align(&self) -> bool {
        self.d.ua == UnalignedAction::Fault
    }

    /// Immediate-offset load/store skeleton: compute the access address
    /// into a temporary, perform the access, then write back.
    fn emit_ls_imm(&mut self, load: bool) {
        let base = self.base_operand();
        let rt = self.d.r1;
        let strict = self.strict_align();
        let t_addr = self.new_temp();

        if self.d.post_index {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: t_addr, ra: base, flags: FlagsOp::None });
        } else {
            self.block.emit(Op::Binop { op: Binop::Add, rd: t_addr, ra: base, rb: Operand::Imm(self.d.c), flags: FlagsOp::None });
        }

        if load {
            let (dest, is_pc) = self.rd_dest_for(rt);
            self.block.emit(Op::Load {
                bits: self.d.sz * 8,
                sx: self.d.xs,
                rd: dest,
                base: Operand::Reg(t_addr),
                offset: Operand::Imm(0),
                user: self.d.tl,
                strict_align: strict,
            });
            self.emit_ls_writeback(t_addr, rt, load);
            if is_pc {
                self.block.emit(Op::JumpReg { rs: dest, link: None, interwork: true });
                self.free_temp();
            }
        } else {
            let rs = self.rs(rt);
            self.block.emit(Op::Store {
                bits: self.d.sz * 8,
                rs,
                base: Operand::Reg(t_addr),
                offset: Operand::Imm(0),
                user: self.d.tl,
                strict_align: strict,
            });
            self.emit_ls_writeback(t_addr, rt, load);
        }
        self.free_temp();
    }

    fn emit_ls_writeback(&mut self, t_addr: Reg, rt: u8, load: bool) {
        if !self.d.writeback || self.d.r2 == REG_PC {
            return;
        }
        // a loaded base wins over writeback
        if load && self.d.r2 == rt {
            return;
        }
        let base = Reg::R(self.d.r2);
        if self.d.post_index {
            self.block.emit(Op::Binop {
                op: Binop::Add,
                rd: base,
                ra: Operand::Reg(base),
                rb: Operand::Imm(self.d.c),
                flags: FlagsOp::None,
            });
        } else {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: base, ra: Operand::Reg(t_addr), flags: FlagsOp::None });
        }
    }

    /// Register-offset load/store; `shifted` applies the LSL amount from
    /// the decode.
    fn emit_ls_reg(&mut self, load: bool, shifted: bool) {
        let base = self.rs(self.d.r2);
        let rm = self.rs(self.d.r3);
        let strict = self.strict_align();
        let bits = self.d.sz * 8;

        let offset = if shifted && self.d.c != 0 {
            let t = self.new_temp();
            self.block.emit(Op::Binop { op: Binop::Shl, rd: t, ra: Operand::Reg(rm), rb: Operand::Imm(self.d.c), flags: FlagsOp::None });
            Operand::Reg(t)
        } else {
            Operand::Reg(rm)
        };

        if load {
            let (dest, is_pc) = self.rd_dest_for(self.d.r1);
            self.block.emit(Op::Load {
                bits,
                sx: self.d.xs,
                rd: dest,
                base: Operand::Reg(base),
                offset,
                user: self.d.tl,
                strict_align: strict,
            });
            if is_pc {
                self.block.emit(Op::JumpReg { rs: dest, link: None, interwork: true });
                self.free_temp();
            }
        } else {
            let rs = self.rs(self.d.r1);
            self.block.emit(Op::Store {
                bits,
                rs,
                base: Operand::Reg(base),
                offset,
                user: self.d.tl,
                strict_align: strict,
            });
        }

        if shifted && self.d.c != 0 {
            self.free_temp();
        }
    }

    pub(super) fn lower_load_imm(&mut self) {
        self.emit_ls_imm(true);
    }

    pub(super) fn lower_store_imm(&mut self) {
        self.emit_ls_imm(false);
    }

    pub(super) fn lower_load_reg(&mut self, shifted: bool) {
        self.emit_ls_reg(true, shifted);
    }

    pub(super) fn lower_store_reg(&mut self, shifted: bool) {
        self.emit_ls_reg(false, shifted);
    }

    ////////////////////////////////////////////////////////////////////////
    // load/store multiple
    ////////////////////////////////////////////////////////////////////////

    fn transfer_count(&self) -> u32 {
        self.d.rlist.count_ones()
    }

    /// Start address of the transfer region.
    fn emit_lsm_start(&mut self) -> Reg {
        let base = Reg::R(self.d.r1);
        let bytes = self.transfer_count() * 4;
        let t = self.new_temp();
        if self.d.incdec.increment {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: t, ra: Operand::Reg(base), flags: FlagsOp::None });
        } else {
            self.block.emit(Op::Binop { op: Binop::Sub, rd: t, ra: Operand::Reg(base), rb: Operand::Imm(bytes), flags: FlagsOp::None });
        }
        t
    }

    fn emit_lsm_writeback(&mut self) {
        if !self.d.writeback {
            return;
        }
        let base = Reg::R(self.d.r1);
        let bytes = self.transfer_count() * 4;
        let op = if self.d.incdec.increment { Binop::Add } else { Binop::Sub };
        self.block.emit(Op::Binop { op, rd: base, ra: Operand::Reg(base), rb: Operand::Imm(bytes), flags: FlagsOp::None });
    }

    pub(super) fn lower_ldm(&mut self) {
        let t_addr = self.emit_lsm_start();
        let loads_pc = self.d.rlist & (1 << REG_PC) != 0;
        let t_pc = if loads_pc { Some(self.new_temp()) } else { None };
        let base_in_list = self.d.rlist & (1 << self.d.r1) != 0;

        let mut offset = 0u32;
        for r in 0..16u8 {
            if self.d.rlist & (1 << r) == 0 {
                continue;
            }
            let dest = if r == REG_PC { t_pc.unwrap() } else { Reg::R(r) };
            self.block.emit(Op::Load {
                bits: 32,
                sx: false,
                rd: dest,
                base: Operand::Reg(t_addr),
                offset: Operand::Imm(offset),
                user: false,
                strict_align: true,
            });
            offset += 4;
        }

        if !base_in_list {
            self.emit_lsm_writeback();
        }
        if let Some(t) = t_pc {
            self.block.emit(Op::JumpReg { rs: t, link: None, interwork: true });
            self.free_temp();
        }
        self.free_temp();
    }

    pub(super) fn lower_stm(&mut self) {
        let t_addr = self.emit_lsm_start();
        let mut offset = 0u32;
        for r in 0..16u8 {
            if self.d.rlist & (1 << r) == 0 {
                continue;
            }
            self.block.emit(Op::Store {
                bits: 32,
                rs: self.rs(r),
                base: Operand::Reg(t_addr),
                offset: Operand::Imm(offset),
                user: false,
                strict_align: true,
            });
            offset += 4;
        }
        self.emit_lsm_writeback();
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // dual loads/stores
    ////////////////////////////////////////////////////////////////////////

    /// LDRD stages both words through temporaries before committing either
    /// destination, so a fault on the second access leaves both registers
    /// untouched.
    pub(super) fn lower_ldrd(&mut self) {
        let base = self.base_operand();
        let t_addr = self.new_temp();
        if self.d.post_index {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: t_addr, ra: base, flags: FlagsOp::None });
        } else {
            self.block.emit(Op::Binop { op: Binop::Add, rd: t_addr, ra: base, rb: Operand::Imm(self.d.c), flags: FlagsOp::None });
        }
        let (lo, hi) = self.new_temp_pair();
        self.block.emit(Op::Load { bits: 32, sx: false, rd: lo, base: Operand::Reg(t_addr), offset: Operand::Imm(0), user: false, strict_align: true });
        self.block.emit(Op::Load { bits: 32, sx: false, rd: hi, base: Operand::Reg(t_addr), offset: Operand::Imm(4), user: false, strict_align: true });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r1), ra: Operand::Reg(lo), flags: FlagsOp::None });
        self.block.emit(Op::Unop { op: Unop::Mov, rd: Reg::R(self.d.r4), ra: Operand::Reg(hi), flags: FlagsOp::None });
        self.emit_ls_writeback(t_addr, self.d.r1, true);
        self.free_temp();
        self.free_temp();
        self.free_temp();
    }

    pub(super) fn lower_strd(&mut self) {
        let base = self.base_operand();
        let t_addr = self.new_temp();
        if self.d.post_index {
            self.block.emit(Op::Unop { op: Unop::Mov, rd: t_addr, ra: base, flags: FlagsOp::None });
        } else {
            self.block.emit(Op::Binop { op: Binop::Add, rd: t_addr, ra: base, rb: Operand::Imm(self.d.c), flags: FlagsOp::None });
        }
        let rt = self.rs(self.d.r1);
        let rt2 = self.rs(self.d.r4);
        self.block.emit(Op::Store { bits: 32, rs: rt, base: Operand::Reg(t_addr), offset: Operand::Imm(0), user: false, strict_align: true });
        self.block.emit(Op::Store { bits: 32, rs: rt2, base: Operand::Reg(t_addr), offset: Operand::Imm(4), user: false, strict_align: true });
        self.emit_ls_writeback(t_addr, self.d.r1, false);
        self.free_temp();
    }

    ////////////////////////////////////////////////////////////////////////
    // exclusive access
    ////////////////////////////////////////////////////////////////////////

    /// LDREX: record the reservation tag for the address, then load.
    pub(super) fn lower_ldrex(&mut self) {
        let base = self.rs(self.d.r2);
        let mask = self.ctx.cfg.exclusive_tag_mask();
        self.block.emit(Op::Binop {
            op: Binop::Add,
            rd: Reg::ExclTag,
            ra: Operand::Reg(base),
            rb: Operand::Imm(self.d.c),
            flags: FlagsOp::None,
        });
        self.block.emit(Op::Binop {
            op: Binop::And,
            rd: Reg::ExclTag,
            ra: Operand::Reg(Reg::ExclTag),
            rb: Operand::Imm(mask),
            flags: FlagsOp::None,
        });
        self.block.emit(Op::Load {
            bits: self.d.sz * 8,
            sx: false,
            rd: Reg::R(self.d.r1),
            base: Operand::Reg(base),
            offset: Operand::Imm(self.d.c),
            user: false,
            strict_align: true,
        });
    }

    /// STREX: any store fault comes first, then the recomputed tag must
    /// match the reservation for the store to commit. The reservation is
    /// always consumed.
    pub(super) fn lower_strex(&mut self) {
        let rd = Reg::R(self.d.r1);
        let rt = self.rs(self.d.r2);
        let base = self.rs(self.d.r3);
        let mask = self.ctx.cfg.exclusive_tag_mask();
        let bits = self.d.sz * 8;

        let t = self.new_temp();
        let flag = match t {
            Reg::Temp(i) => i,
            _ => unreachable!(),
        };
        let ok = self.block.new_label();
        let done = self.block.new_label();

        self.block.emit(Op::TryStore { bits, base: Operand::Reg(base), offset: Operand::Imm(self.d.c), user: false });
        self.block.emit(Op::Binop { op: Binop::Add, rd: t, ra: Operand::Reg(base), rb: Operand::Imm(self.d.c), flags: FlagsOp::None });
        self.block.emit(Op::Binop { op: Binop::And, rd: t, ra: Operand::Reg(t), rb: Operand::Imm(mask), flags: FlagsOp::None });
        self.block.emit(Op::Cmp { kind: CmpKind::Eq, flag, ra: t, rb: Operand::Reg(Reg::ExclTag) });
        self.block.emit(Op::CondJumpLabel { flag: FlagRef::Temp(flag), if_true: true, label: ok });
        self.block.emit(Op::Unop { op: Unop::Mov, rd, ra: Operand::Imm(1), flags: FlagsOp::None });
        self.block.emit(Op::JumpLabel(done));
        self.block.insert_label(ok);
        self.block.emit(Op::Store {
            bits,
            rs: rt,
            base: Operand::Reg(base),
            offset: Operand::Imm(self.d.c),
            user: false,
            strict_align: true,
        });
        self.block.emit(Op::Unop { op: Unop::Mov, rd, ra: Operand::Imm(0), flags: FlagsOp::None });
        self.block.insert_label(done);
        self.block.emit(Op::Unop {
            op: Unop::Mov,
            rd: Reg::ExclTag,
            ra: Operand::Imm(NO_EXCLUSIVE_TAG),
            flags: FlagsOp::None,
        });
        self.free_temp();
    }
}
