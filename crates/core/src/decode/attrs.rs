// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Canonical opcode classes and per-class static attributes.
//!
//! [`OpcodeClass`] is the canonical instruction identity the decoder
//! produces: one variant per distinct semantic form, with the family
//! parameter (ALU operation, signedness, lane selection) carried as
//! payload. [`InstrAttrs`] is the read-only record describing where each
//! operand field lives in the encoding plus architecture gating; the
//! constructor functions at the bottom mirror the encoding families of the
//! architecture manual, so a decode-table row reads as
//! `row(pri, pattern, family(...))`.

use crate::config::ArchFlags;
use crate::decode::fields::*;

/// Integer ALU operations for the binop families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Adc,
    Add,
    And,
    Bic,
    Eor,
    Mul,
    Orn,
    Orr,
    Rsb,
    Sbc,
    Sub,
}

/// Move-style unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovOp {
    Mov,
    Mvn,
    Neg,
}

/// Compare operations (flag-only binops).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Cmn,
    Cmp,
    Teq,
    Tst,
}

/// Extend/extend-accumulate widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtKind {
    Byte,
    Half,
    /// Dual-byte to dual-halfword (XTB16 forms).
    Byte16,
}

/// Saturation/signedness prefix of the parallel add/subtract family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasPrefix {
    S,
    Q,
    Sh,
    U,
    Uq,
    Uh,
}

/// Lane pattern of the parallel add/subtract family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasOp {
    Add16,
    Asx,
    Sax,
    Sub16,
    Add8,
    Sub8,
}

/// VFP data-processing operations that reduce to one f32 binary op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfpAlu {
    Add,
    Sub,
    Mul,
    Nmul,
    Div,
}

/// Canonical instruction identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    // integer data processing, by operand shape
    BinopImm(AluOp),
    BinopRm(AluOp),
    BinopRsi(AluOp),
    BinopRrx(AluOp),
    /// Two-operand immediate form (`rd = rd op const`).
    BinopIt(AluOp),
    /// Two-operand register form (`rd = rd op rm`).
    BinopRt(AluOp),
    /// PC-relative address formation (ADR and friends).
    BinopAdr { sub: bool },
    UnopImm(MovOp),
    UnopRm(MovOp),
    UnopRsi(MovOp),
    UnopRsr(MovOp),
    UnopRrx(MovOp),
    /// Two-operand register-shift form (`rd = rd shift rm`).
    UnopRsrt(MovOp),
    CmpopImm(CmpOp),
    CmpopRm(CmpOp),
    CmpopRsi(CmpOp),
    CmpopRrx(CmpOp),
    Movw,
    Movt,

    // saturation, packing, bit field
    Sat { unsigned: bool },
    Sat16 { unsigned: bool },
    Sbfx,
    Ubfx,
    Bfi,
    Bfc,
    Pkh { tb: bool },
    Extend { kind: ExtKind, unsigned: bool, accumulate: bool },
    Pas { prefix: PasPrefix, op: PasOp },
    QaddSub { double: bool, sub: bool },
    Rev,
    Rev16,
    Revsh,
    Rbit,
    Clz,
    Sel,

    // multiply, divide, DSP multiply
    Mla,
    Mls,
    Mull { signed: bool },
    Mlal { signed: bool },
    Umaal,
    Div { signed: bool },
    SmlaXy { nx: bool, my: bool },
    SmulXy { nx: bool, my: bool },
    SmlalXy { nx: bool, my: bool },
    SmlawY { my: bool },
    SmulwY { my: bool },
    Smlad { cross: bool },
    Smuad { cross: bool },
    Smlsd { cross: bool },
    Smusd { cross: bool },
    Smlald { cross: bool },
    Smlsld { cross: bool },
    Smmla { round: bool },
    Smmul { round: bool },
    Smmls { round: bool },
    Usad8,
    Usada8,

    // branch and control
    B,
    Bl,
    BranchReg { link: bool },
    Cbz { nonzero: bool },
    Tb { half: bool },
    Svc,
    Bkpt,
    Mrs,
    Msr,
    Cps,
    It,
    Nop,
    Yield,
    Wfe,
    Wfi,
    Sev,
    Dbg,
    Clrex,
    Dsb,
    Dmb,
    Isb,

    // load and store
    LoadImm,
    LoadReg,
    LoadRsi,
    StoreImm,
    StoreReg,
    StoreRsi,
    Ldm,
    Stm,
    LdrdImm,
    StrdImm,
    Ldrex,
    Strex,

    /// Generic coprocessor access (no coprocessors on this family: NOCP).
    Cp,

    // VFP single precision
    VfpBinop(VfpAlu),
    VfpMla { negate_product: bool, negate_acc: bool },
    VfpFma { negate_product: bool, negate_acc: bool },
    VfpMovImm,
    VfpMovReg,
    VfpAbs,
    VfpNeg,
    VfpSqrt,
    VfpCmp { quiet_nan_ok: bool, with_zero: bool },
    VfpCvtIntToF32 { signed: bool },
    VfpCvtF32ToInt { signed: bool, round_fpscr: bool },
    VfpCvtFixToF32 { signed: bool, fbits16: bool },
    VfpCvtF32ToFix { signed: bool, fbits16: bool },
    VfpCvtHalf { top: bool, to_half: bool },
    VfpLdst { load: bool },
    VfpLdstm { load: bool, writeback: bool, dec: bool },
    VfpPushPop { push: bool },
    Vmrs,
    Vmsr,
    VmovCoreSingle { to_core: bool },
    VmovCoreScalar { to_core: bool },
    VmovCorePair { to_core: bool },

    /// Reserved terminator: undecoded instruction.
    Und,
}

/// How the instruction affects the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetFlags {
    /// Never sets flags.
    #[default]
    Never,
    /// Always sets flags (visible `s` suffix).
    Always,
    /// Always sets flags, implicit in the mnemonic (compares).
    Implicit,
    /// Sets flags if the S bit (position 20) is set.
    IfBit20,
    /// Sets flags only when outside an IT block (16-bit Thumb forms).
    OutsideItBlock,
}

/// Instruction support implied by the ID_ISAR/MVFR registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isar {
    #[default]
    None,
    Div,
    Bkpt,
    Cbz,
    Bfc,
    Clz,
    Bx,
    Blx,
    Movt,
    IfThen,
    Sxtb,
    Sxtab,
    Sxtb16,
    Rev,
    Rbit,
    Umull,
    Umaal,
    Smull,
    Smlabb,
    Smlad,
    Mla,
    Mls,
    Pld,
    Pli,
    Ldrd,
    Nop,
    MovLowLow,
    Tbb,
    Ldrex,
    Clrex,
    Svc,
    Ssat,
    Pkhbt,
    Qadd,
    MrsM,
    Dmb,
    Ldrbt,
    Ldrht,
    Vmrs,
    VfpV2,
    VfpV3,
    VfpFmac,
    VfpSqrt,
    VfpDiv,
    VfpCvt2,
    VfpCvt3,
    VfpHp,
}

// support shorthands: version nibble plus feature bits, mirroring the
// architecture option encoding in `ArchFlags`
pub const SUP_T: ArchFlags = ArchFlags::from_bits_retain(0x0020);
pub const SUP_T5: ArchFlags = ArchFlags::from_bits_retain(0x0025);
pub const SUP_T6: ArchFlags = ArchFlags::from_bits_retain(0x0026);
pub const SUP_T2: ArchFlags = ArchFlags::from_bits_retain(0x1000);
pub const SUP_V7: ArchFlags = ArchFlags::from_bits_retain(0x0007);

/// Per-class static attribute record. One instance per decode-table entry,
/// read-only after program start.
#[derive(Debug, Clone, Copy)]
pub struct InstrAttrs {
    pub name: &'static str,
    pub kind: OpcodeClass,
    pub support: ArchFlags,
    pub isar: Isar,
    pub flags: SetFlags,
    pub cond: CondSpec,
    pub r1: RegSpec,
    pub r2: RegSpec,
    pub r3: RegSpec,
    pub r4: RegSpec,
    pub cs: ConstSpec,
    pub ts: TargetSpec,
    pub ss: ShiftSpec,
    /// Load/store access size in bytes (0 when not a memory op).
    pub sz: u8,
    /// Sign-extend loaded value.
    pub xs: bool,
    /// Unprivileged (translate) access.
    pub tl: bool,
    pub pi: PostIndexSpec,
    pub wb: WritebackSpec,
    pub rlist: RListSpec,
    pub incdec: IncDecSpec,
    pub ua: UnalignedAction,
    /// Exclusive access.
    pub ea: bool,
    pub imod: ImodSpec,
    /// A/I/F affect field present (CPS).
    pub aif: bool,
    /// IT specification present.
    pub it: bool,
    pub w: WidthSpec,
    pub u: USpec,
    pub mask: MaskSpec,
    pub cp: bool,
    pub cpop1: CpOp1Spec,
    pub index: IndexSpec,
    pub nregs: NregSpec,
    pub sdfp_mi: SdfpMiSpec,
}

pub const BASE: InstrAttrs = InstrAttrs {
    name: "",
    kind: OpcodeClass::Und,
    support: SUP_T,
    isar: Isar::None,
    flags: SetFlags::Never,
    cond: CondSpec::None,
    r1: RegSpec::None,
    r2: RegSpec::None,
    r3: RegSpec::None,
    r4: RegSpec::None,
    cs: ConstSpec::None,
    ts: TargetSpec::None,
    ss: ShiftSpec::None,
    sz: 0,
    xs: false,
    tl: false,
    pi: PostIndexSpec::Never,
    wb: WritebackSpec::Never,
    rlist: RListSpec::None,
    incdec: IncDecSpec::None,
    ua: UnalignedAction::Allow,
    ea: false,
    imod: ImodSpec::None,
    aif: false,
    it: false,
    w: WidthSpec::None,
    u: USpec::One,
    mask: MaskSpec::None,
    cp: false,
    cpop1: CpOp1Spec::None,
    index: IndexSpec::None,
    nregs: NregSpec::None,
    sdfp_mi: SdfpMiSpec::None,
};

////////////////////////////////////////////////////////////////////////////
// 16-bit attribute families
////////////////////////////////////////////////////////////////////////////

/// rd at 2:0, rm at 5:3, flags outside IT block (ADC/AND/... register forms).
pub const fn t16_rt(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        flags: SetFlags::OutsideItBlock,
        r1: RegSpec::R3_0,
        r2: RegSpec::R3_3,
        ..BASE
    }
}

/// rd at 2:0, rn at 5:3, imm3 at 8:6 (ADD/SUB three-operand immediate).
pub const fn t16_imm3(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        cs: ConstSpec::U3At6,
        ..t16_rt(name, kind)
    }
}

/// rd at 10:8, imm8 at 7:0 (MOV/CMP/ADD/SUB two-operand immediate).
pub const fn t16_imm8(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        flags: SetFlags::OutsideItBlock,
        r1: RegSpec::R3_8,
        cs: ConstSpec::U8At0,
        ..BASE
    }
}

/// rd at 2:0, rn at 5:3, rm at 8:6 (ADD/SUB three-operand register).
pub const fn t16_rrr(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        r3: RegSpec::R3_6,
        ..t16_rt(name, kind)
    }
}

/// High-register forms: rd at 7,2:0, rm at 6,5:3, no flags.
pub const fn t16_high(name: &'static str, kind: OpcodeClass, support: ArchFlags, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support,
        isar,
        r1: RegSpec::R4_0H7,
        r2: RegSpec::R4_3H6,
        ..BASE
    }
}

/// rd at 10:8, rn = PC or SP, imm8*4 (ADR and ADD rd, SP, #imm).
pub const fn t16_adr(name: &'static str, kind: OpcodeClass, base: RegSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::R3_8,
        r2: base,
        cs: ConstSpec::U8At0X4,
        ..BASE
    }
}

/// SP-adjust: rd = SP, imm7*4 (ADD/SUB SP, #imm).
pub const fn t16_adj_sp(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::Sp,
        cs: ConstSpec::U7At0X4,
        ..BASE
    }
}

/// Shift-immediate forms: rd, rm, imm5 with a fixed shift op.
pub const fn t16_shift_imm(name: &'static str, kind: OpcodeClass, ss: ShiftSpec) -> InstrAttrs {
    InstrAttrs {
        cs: ConstSpec::U5At6,
        ss,
        ..t16_rt(name, kind)
    }
}

/// Register-shift forms (`rd = rd shift rm`) with a fixed shift op.
pub const fn t16_shift_reg(name: &'static str, kind: OpcodeClass, ss: ShiftSpec) -> InstrAttrs {
    InstrAttrs {
        ss,
        ..t16_rt(name, kind)
    }
}

/// MOV(2): rd, rm as LSL #0.
pub const fn t16_mov2(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        cs: ConstSpec::U5At6,
        ss: ShiftSpec::Lsl,
        ..t16_rt(name, kind)
    }
}

/// Compare immediate: rn at 10:8, imm8, implicit flags.
pub const fn t16_cmp_imm8(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        flags: SetFlags::Implicit,
        ..t16_imm8(name, kind)
    }
}

/// Compare register: rn at 2:0, rm at 5:3, implicit flags.
pub const fn t16_cmp_rm(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        flags: SetFlags::Implicit,
        ..t16_rt(name, kind)
    }
}

/// Compare high registers.
pub const fn t16_cmp_high(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        flags: SetFlags::Implicit,
        ..t16_high(name, kind, SUP_T, Isar::None)
    }
}

/// Conditional branch with 8-bit target, condition at 11:8.
pub const fn t16_b_cond(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        cond: CondSpec::At8,
        ts: TargetSpec::S8,
        ..BASE
    }
}

/// Unconditional branch with 11-bit target.
pub const fn t16_b(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        ts: TargetSpec::S11,
        ..BASE
    }
}

/// Register branch (BX/BLX): rm at 6,5:3.
pub const fn t16_bx(name: &'static str, kind: OpcodeClass, support: ArchFlags, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support,
        isar,
        r1: RegSpec::R4_3H6,
        ..BASE
    }
}

/// Immediate-only forms (SVC/BKPT).
pub const fn t16_imm_only(
    name: &'static str,
    kind: OpcodeClass,
    support: ArchFlags,
    isar: Isar,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support,
        isar,
        cs: ConstSpec::U8At0,
        ..BASE
    }
}

/// CPS: imod at bit 4, A/I/F at 2:0.
pub const fn t16_cps(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Cps,
        support: SUP_T6,
        isar: Isar::MrsM,
        imod: ImodSpec::At4,
        aif: true,
        ..BASE
    }
}

/// CBZ/CBNZ: rn at 2:0, target at 9,7:3.
pub const fn t16_cbz(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Cbz,
        r1: RegSpec::R3_0,
        ts: TargetSpec::U9_7_3,
        ..BASE
    }
}

/// 16-bit extend/reverse forms: rd at 2:0, rm at 5:3.
pub const fn t16_xt(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T6,
        isar,
        r1: RegSpec::R3_0,
        r2: RegSpec::R3_3,
        ..BASE
    }
}

/// Load/store with scaled 5-bit immediate offset.
pub const fn t16_ls_imm5(
    name: &'static str,
    kind: OpcodeClass,
    sz: u8,
    xs: bool,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::R3_0,
        r2: RegSpec::R3_3,
        cs: ConstSpec::U5At6Sz,
        sz,
        xs,
        ..BASE
    }
}

/// Load/store with register offset.
pub const fn t16_ls_reg(name: &'static str, kind: OpcodeClass, sz: u8, xs: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::R3_0,
        r2: RegSpec::R3_3,
        r3: RegSpec::R3_6,
        sz,
        xs,
        ..BASE
    }
}

/// Load/store PC- or SP-relative with scaled 8-bit immediate.
pub const fn t16_ls_rel(name: &'static str, kind: OpcodeClass, base: RegSpec, sz: u8) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::R3_8,
        r2: base,
        cs: ConstSpec::U8At0Sz,
        sz,
        ..BASE
    }
}

/// LDMIA/STMIA: base at 10:8, 8-bit list, writeback unless base listed.
pub const fn t16_ldm(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::R3_8,
        wb: WritebackSpec::UnlessBaseInList,
        rlist: RListSpec::L16,
        incdec: IncDecSpec::Ia,
        sz: 4,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// STMIA: base at 10:8, always writes back.
pub const fn t16_stm(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::R3_8,
        pi: PostIndexSpec::Always,
        wb: WritebackSpec::Always,
        rlist: RListSpec::L16,
        incdec: IncDecSpec::Ia,
        sz: 4,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// PUSH/POP: SP base, list with LR or PC add-in.
pub const fn t16_push_pop(
    name: &'static str,
    kind: OpcodeClass,
    rlist: RListSpec,
    incdec: IncDecSpec,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        r1: RegSpec::Sp,
        pi: PostIndexSpec::Always,
        wb: WritebackSpec::Always,
        rlist,
        incdec,
        sz: 4,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// IT instruction: firstcond:mask byte at 7:0.
pub const fn t16_it(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::It,
        support: SUP_T2,
        isar: Isar::IfThen,
        cs: ConstSpec::U4At4,
        it: true,
        ..BASE
    }
}

/// Hints (NOP/YIELD/WFE/WFI/SEV).
pub const fn t16_hint(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Nop,
        ..BASE
    }
}

////////////////////////////////////////////////////////////////////////////
// 32-bit attribute families
////////////////////////////////////////////////////////////////////////////

/// Modified-immediate data processing: rd at 11:8, rn at 19:16.
pub const fn t32_dp_imm(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        flags: SetFlags::IfBit20,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        cs: ConstSpec::Modified,
        ..BASE
    }
}

/// Shifted-register data processing: rd, rn, rm with shift at 5:4.
pub const fn t32_dp_rsi(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        flags: SetFlags::IfBit20,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        cs: ConstSpec::Plain5,
        ss: ShiftSpec::At4,
        ..BASE
    }
}

/// RRX form of the shifted-register shape.
pub const fn t32_dp_rrx(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        ss: ShiftSpec::Rrx,
        cs: ConstSpec::None,
        ..t32_dp_rsi(name, kind)
    }
}

/// Compare variants of the three shapes (no rd).
pub const fn t32_cmp_imm(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        flags: SetFlags::Implicit,
        r1: RegSpec::R4_16,
        r2: RegSpec::None,
        ..t32_dp_imm(name, kind)
    }
}

pub const fn t32_cmp_rsi(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        flags: SetFlags::Implicit,
        r1: RegSpec::R4_16,
        r2: RegSpec::R4_0,
        r3: RegSpec::None,
        ..t32_dp_rsi(name, kind)
    }
}

pub const fn t32_cmp_rrx(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        ss: ShiftSpec::Rrx,
        cs: ConstSpec::None,
        ..t32_cmp_rsi(name, kind)
    }
}

/// Move variants (no rn).
pub const fn t32_mov_imm(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        r2: RegSpec::None,
        ..t32_dp_imm(name, kind)
    }
}

pub const fn t32_mov_rsi(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        r2: RegSpec::R4_0,
        r3: RegSpec::None,
        ..t32_dp_rsi(name, kind)
    }
}

pub const fn t32_mov_rrx(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        ss: ShiftSpec::Rrx,
        cs: ConstSpec::None,
        ..t32_mov_rsi(name, kind)
    }
}

/// Plain binary immediate (ADDW/SUBW/MOVW/MOVT): 12- or 16-bit immediate.
pub const fn t32_pi(name: &'static str, kind: OpcodeClass, cs: ConstSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Movt,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        cs,
        ..BASE
    }
}

/// PC-relative plain immediate (ADR.W forms).
pub const fn t32_pi_adr(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        r2: RegSpec::Pc,
        ..t32_pi(name, kind, ConstSpec::Plain12)
    }
}

/// MOVW/MOVT: destination only, 16-bit plain immediate.
pub const fn t32_pi_mov(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        r2: RegSpec::None,
        ..t32_pi(name, kind, ConstSpec::Plain16)
    }
}

/// SSAT/USAT: rd, rn, saturate-to width, shift amount in Plain5 with the
/// shift type at 21:20.
pub const fn t32_sat(name: &'static str, kind: OpcodeClass, w: WidthSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Ssat,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        cs: ConstSpec::Plain5,
        ss: ShiftSpec::At20,
        w,
        ..BASE
    }
}

/// SSAT16/USAT16.
pub const fn t32_sat16(name: &'static str, kind: OpcodeClass, w: WidthSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Pkhbt,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        w,
        ..BASE
    }
}

/// Bit-field forms: BFI/SBFX/UBFX with lsb in Plain5 and width spec.
pub const fn t32_bitfield(name: &'static str, kind: OpcodeClass, w: WidthSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Bfc,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        cs: ConstSpec::Plain5,
        w,
        ..BASE
    }
}

pub const fn t32_bfc(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        r2: RegSpec::None,
        ..t32_bitfield(name, OpcodeClass::Bfc, WidthSpec::Msb)
    }
}

/// PKHBT/PKHTB.
pub const fn t32_pkh(name: &'static str, kind: OpcodeClass, ss: ShiftSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Pkhbt,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        cs: ConstSpec::Plain5,
        ss,
        ..BASE
    }
}

/// Register-controlled shifts (LSL.W etc.): rd, rn, rm.
pub const fn t32_shift_rs(name: &'static str, kind: OpcodeClass, ss: ShiftSpec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        flags: SetFlags::IfBit20,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        ss,
        ..BASE
    }
}

/// Extend-accumulate (SXTAH etc.): rd, rn, rm with rotation at 5:4 * 8.
pub const fn t32_xta(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        cs: ConstSpec::U2At4X8,
        ss: ShiftSpec::Ror,
        ..BASE
    }
}

/// Plain extend (SXTH etc.): rd, rm with rotation at 5:4 * 8.
pub const fn t32_xt(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_0,
        cs: ConstSpec::U2At4X8,
        ss: ShiftSpec::Ror,
        ..BASE
    }
}

/// Parallel add/subtract: rd, rn, rm.
pub const fn t32_pas(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Pkhbt,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        ..BASE
    }
}

/// Misc register ops (REV/CLZ/QADD...): rd, rn(,rm).
pub const fn t32_misc_rr(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_0,
        ..BASE
    }
}

pub const fn t32_misc_rrr(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        ..t32_misc_rr(name, kind, isar)
    }
}

/// Saturating add/subtract: `rd, rm, rn` with rm as the first operand.
pub const fn t32_qadd(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Qadd,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_0,
        r3: RegSpec::R4_16,
        ..BASE
    }
}

/// Multiply-accumulate shapes: rd at 11:8, rn at 19:16, rm at 3:0, ra at 15:12.
pub const fn t32_mla(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        r4: RegSpec::R4_12,
        ..BASE
    }
}

/// Multiply without accumulate (ra slot is 1111).
pub const fn t32_mul(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        r4: RegSpec::None,
        ..t32_mla(name, kind, isar)
    }
}

/// Divide: rd, rn, rm; v7-M requires the divide extension.
pub const fn t32_div(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        support: SUP_V7,
        ..t32_mul(name, kind, Isar::Div)
    }
}

/// Long multiply: rdlo at 15:12, rdhi at 11:8, rn at 19:16, rm at 3:0.
pub const fn t32_mull(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_8,
        r3: RegSpec::R4_16,
        r4: RegSpec::R4_0,
        ..BASE
    }
}

/// Branches.
pub const fn t32_b_cond(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::B,
        support: SUP_T2,
        cond: CondSpec::At22,
        ts: TargetSpec::S20,
        ..BASE
    }
}

pub const fn t32_b(name: &'static str, kind: OpcodeClass, support: ArchFlags) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support,
        ts: TargetSpec::S24,
        ..BASE
    }
}

/// MSR: rn at 19:16, SYSm at 7:0, mask at 11:10.
pub const fn t32_msr(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Msr,
        support: SUP_V7,
        isar: Isar::MrsM,
        r1: RegSpec::R4_16,
        cs: ConstSpec::U8At0,
        mask: MaskSpec::At10,
        ..BASE
    }
}

/// MRS: rd at 11:8, SYSm at 7:0.
pub const fn t32_mrs(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Mrs,
        support: SUP_V7,
        isar: Isar::MrsM,
        r1: RegSpec::R4_8,
        cs: ConstSpec::U8At0,
        ..BASE
    }
}

/// 32-bit hints and barriers.
pub const fn t32_hint(name: &'static str, kind: OpcodeClass, support: ArchFlags, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support,
        isar,
        ..BASE
    }
}

/// Barrier option field at 3:0.
pub const fn t32_barrier(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        cs: ConstSpec::U4At0,
        ..t32_hint(name, kind, SUP_V7, Isar::Dmb)
    }
}

/// Load/store multiple: rn at 19:16, 16-bit list, W at 21.
pub const fn t32_ldm(
    name: &'static str,
    kind: OpcodeClass,
    rlist: RListSpec,
    incdec: IncDecSpec,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        r1: RegSpec::R4_16,
        wb: WritebackSpec::At21,
        rlist,
        incdec,
        sz: 4,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// POP.W/PUSH.W: SP base with writeback.
pub const fn t32_push_pop(
    name: &'static str,
    kind: OpcodeClass,
    rlist: RListSpec,
    incdec: IncDecSpec,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        r1: RegSpec::Sp,
        pi: PostIndexSpec::Always,
        wb: WritebackSpec::Always,
        rlist,
        incdec,
        sz: 4,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// LDRD/STRD: rt at 15:12, base rn at 19:16, rt2 at 11:8, imm8*4 signed
/// by U.
pub const fn t32_ldrd(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Ldrd,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        r4: RegSpec::R4_8,
        cs: ConstSpec::U8At0X4U,
        u: USpec::At23,
        pi: PostIndexSpec::At24,
        wb: WritebackSpec::At21,
        sz: 8,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// LDREX/STREX word: exclusive, imm8*4 offset.
pub const fn t32_ldrex(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar: Isar::Ldrex,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        cs: ConstSpec::U8At0X4,
        sz: 4,
        ea: true,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

pub const fn t32_strex(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Strex,
        support: SUP_T2,
        isar: Isar::Ldrex,
        r1: RegSpec::R4_8,
        r2: RegSpec::R4_12,
        r3: RegSpec::R4_16,
        cs: ConstSpec::U8At0X4,
        sz: 4,
        ea: true,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// Byte/half exclusive forms (no offset, rd for STREX at 3:0).
pub const fn t32_ldrexbh(name: &'static str, sz: u8) -> InstrAttrs {
    InstrAttrs {
        cs: ConstSpec::None,
        sz,
        isar: Isar::Clrex,
        support: SUP_V7,
        ..t32_ldrex(name, OpcodeClass::Ldrex)
    }
}

pub const fn t32_strexbh(name: &'static str, sz: u8) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Strex,
        support: SUP_V7,
        isar: Isar::Clrex,
        r1: RegSpec::R4_0,
        r2: RegSpec::R4_12,
        r3: RegSpec::R4_16,
        sz,
        ea: true,
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// TBB/TBH: rn at 19:16, rm at 3:0.
pub const fn t32_tb(name: &'static str, half: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Tb { half },
        support: SUP_T2,
        isar: Isar::Tbb,
        r1: RegSpec::R4_16,
        r2: RegSpec::R4_0,
        sz: if half { 2 } else { 1 },
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// 32-bit load/store, 12-bit positive immediate.
pub const fn t32_ls_imm12(
    name: &'static str,
    kind: OpcodeClass,
    sz: u8,
    xs: bool,
    isar: Isar,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        cs: ConstSpec::U12At0,
        sz,
        xs,
        ..BASE
    }
}

/// 32-bit load/store, 8-bit immediate with P/U/W.
pub const fn t32_ls_imm8(
    name: &'static str,
    kind: OpcodeClass,
    sz: u8,
    xs: bool,
    isar: Isar,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        cs: ConstSpec::U8At0U,
        u: USpec::At9,
        pi: PostIndexSpec::At10,
        wb: WritebackSpec::At8,
        sz,
        xs,
        ..BASE
    }
}

/// 32-bit load/store, literal (PC base), U at 23.
pub const fn t32_ls_lit(
    name: &'static str,
    kind: OpcodeClass,
    sz: u8,
    xs: bool,
    isar: Isar,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_12,
        r2: RegSpec::Pc,
        cs: ConstSpec::U12At0U,
        u: USpec::At23,
        sz,
        xs,
        ..BASE
    }
}

/// 32-bit load/store, register offset with optional shift at 5:4.
pub const fn t32_ls_reg(
    name: &'static str,
    kind: OpcodeClass,
    sz: u8,
    xs: bool,
    isar: Isar,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        r3: RegSpec::R4_0,
        cs: ConstSpec::U2At4,
        ss: ShiftSpec::Lsl,
        sz,
        xs,
        ..BASE
    }
}

/// Unprivileged (translate) load/store, positive 8-bit immediate.
pub const fn t32_ls_unpriv(
    name: &'static str,
    kind: OpcodeClass,
    sz: u8,
    xs: bool,
    isar: Isar,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_T2,
        isar,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        cs: ConstSpec::U8At0,
        tl: true,
        sz,
        xs,
        ..BASE
    }
}

/// Memory hints (PLD/PLI and the unallocated-hint space): behave as NOP.
pub const fn t32_mem_hint(name: &'static str, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Nop,
        support: SUP_T2,
        isar,
        ..BASE
    }
}

/// Generic coprocessor access: always NOCP on this family.
pub const fn t32_cp(name: &'static str, cpop1: CpOp1Spec) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::Cp,
        support: SUP_T2,
        cp: true,
        cpop1,
        ..BASE
    }
}

////////////////////////////////////////////////////////////////////////////
// VFP attribute families (single precision)
////////////////////////////////////////////////////////////////////////////

/// Three-register VFP data processing: Sd at 15:12,22, Sn at 19:16,7,
/// Sm at 3:0,5.
pub const fn vfp_rrr(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_V7,
        isar,
        r1: RegSpec::V12_22,
        r2: RegSpec::V16_7,
        r3: RegSpec::V0_5,
        ..BASE
    }
}

/// Two-register VFP forms.
pub const fn vfp_rr(name: &'static str, kind: OpcodeClass, isar: Isar) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_V7,
        isar,
        r1: RegSpec::V12_22,
        r2: RegSpec::V0_5,
        ..BASE
    }
}

/// Compare-with-zero forms.
pub const fn vfp_r0(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_V7,
        isar: Isar::VfpV2,
        r1: RegSpec::V12_22,
        ..BASE
    }
}

/// VMOV immediate: Sd plus expanded 8-bit constant.
pub const fn vfp_ri(name: &'static str) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VfpMovImm,
        support: SUP_V7,
        isar: Isar::VfpV3,
        r1: RegSpec::V12_22,
        sdfp_mi: SdfpMiSpec::VfpSingle,
        ..BASE
    }
}

/// Fixed-point conversion: Sd is both source and destination; fraction
/// bits from the 5-bit immediate at 3:0,5.
pub const fn vfp_fix(name: &'static str, kind: OpcodeClass, m32: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_V7,
        isar: Isar::VfpCvt3,
        r1: RegSpec::V12_22,
        cs: if m32 { ConstSpec::U5At0_5M32 } else { ConstSpec::U5At0_5M16 },
        ..BASE
    }
}

/// VLDR/VSTR: Sd or Dd, rn base, imm8*4 signed by U at 23. Double forms
/// carry sz 8 and the double register spec.
pub const fn vfp_ldst(name: &'static str, load: bool, dbl: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VfpLdst { load },
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: if dbl { RegSpec::V22_12 } else { RegSpec::V12_22 },
        r2: RegSpec::R4_16,
        cs: ConstSpec::U8At0X4U,
        u: USpec::At23,
        sz: if dbl { 8 } else { 4 },
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// VLDM/VSTM: first register, word count at 7:0, base rn.
pub const fn vfp_ldstm(
    name: &'static str,
    load: bool,
    writeback: bool,
    dec: bool,
    dbl: bool,
) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VfpLdstm { load, writeback, dec },
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: if dbl { RegSpec::V22_12 } else { RegSpec::V12_22 },
        r2: RegSpec::R4_16,
        nregs: NregSpec::N8At0,
        incdec: IncDecSpec::UP,
        sz: if dbl { 8 } else { 4 },
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// VPUSH/VPOP.
pub const fn vfp_push_pop(name: &'static str, push: bool, dbl: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VfpPushPop { push },
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: if dbl { RegSpec::V22_12 } else { RegSpec::V12_22 },
        r2: RegSpec::Sp,
        nregs: NregSpec::N8At0,
        sz: if dbl { 8 } else { 4 },
        ua: UnalignedAction::Fault,
        ..BASE
    }
}

/// VMRS/VMSR: core register at 15:12.
pub const fn vfp_msr(name: &'static str, kind: OpcodeClass) -> InstrAttrs {
    InstrAttrs {
        name,
        kind,
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: RegSpec::R4_12,
        ..BASE
    }
}

/// Single transfer core<->extension: rt at 15:12, Sn at 19:16,7.
pub const fn vfp_mov_rs(name: &'static str, to_core: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VmovCoreSingle { to_core },
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: RegSpec::R4_12,
        r2: RegSpec::V16_7,
        ..BASE
    }
}

/// Scalar transfer core<->extension: rt at 15:12, Dn[idx] at 7,19:16.
pub const fn vfp_mov_rz(name: &'static str, to_core: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VmovCoreScalar { to_core },
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: RegSpec::R4_12,
        r2: RegSpec::V7_16,
        index: IndexSpec::At21,
        ..BASE
    }
}

/// 64-bit transfers: rt at 15:12, rt2 at 19:16, Dm at 5,3:0 or the first
/// of an Sm pair at 3:0,5.
pub const fn vfp_mov_rr(name: &'static str, to_core: bool, dbl: bool) -> InstrAttrs {
    InstrAttrs {
        name,
        kind: OpcodeClass::VmovCorePair { to_core },
        support: SUP_V7,
        isar: Isar::Vmrs,
        r1: RegSpec::R4_12,
        r2: RegSpec::R4_16,
        r3: if dbl { RegSpec::V5_0 } else { RegSpec::V0_5 },
        sz: if dbl { 8 } else { 4 },
        ..BASE
    }
}

/// Reserved undecoded-instruction attributes (table terminator).
pub const UNDECODED: InstrAttrs = InstrAttrs {
    name: "undef",
    kind: OpcodeClass::Und,
    ..BASE
};
