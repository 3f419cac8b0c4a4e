// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the root of this project for full license information.

//! Declarative decode tables for the 16-bit and 32-bit Thumb encodings.
//!
//! Each entry is a fixed-width bit pattern (literal `0`/`1` plus `.`
//! wildcards; `|` and spaces are separators) tagged with its attribute
//! record and a priority. Overlapping patterns are expected: the entry with
//! the lowest priority number wins, ties resolved by declaration order. A
//! final all-wildcard terminator maps everything else to the reserved
//! undecoded class, so lookup never fails.

use super::attrs::{self as a, AluOp, CmpOp, ExtKind, InstrAttrs, Isar, MovOp, OpcodeClass as C, PasOp, PasPrefix, VfpAlu};
use crate::decode::fields::{IncDecSpec, RegSpec, ShiftSpec, WidthSpec};
use std::sync::OnceLock;

#[derive(Debug)]
pub struct DecodeEntry {
    pub priority: u8,
    pub pattern: &'static str,
    pub attrs: InstrAttrs,
}

const fn row(priority: u8, pattern: &'static str, attrs: InstrAttrs) -> DecodeEntry {
    DecodeEntry { priority, pattern, attrs }
}

/// A pattern compiled to mask/value form.
#[derive(Debug, Clone, Copy)]
pub struct Compiled {
    pub mask: u32,
    pub value: u32,
    pub priority: u8,
    pub order: u32,
    pub entry: &'static DecodeEntry,
}

#[derive(Debug)]
pub struct DecodeTable {
    entries: Vec<Compiled>,
}

impl DecodeTable {
    /// Compile a table. Malformed patterns are programming errors, not
    /// runtime faults.
    fn compile(width: u32, rows: &'static [DecodeEntry]) -> Self {
        let mut entries: Vec<Compiled> = rows
            .iter()
            .enumerate()
            .map(|(order, entry)| {
                let (mask, value, bits) = parse_pattern(entry.pattern);
                assert_eq!(
                    bits, width,
                    "pattern {:?} is {} bits, expected {}",
                    entry.pattern, bits, width
                );
                Compiled { mask, value, priority: entry.priority, order: order as u32, entry }
            })
            .collect();
        entries.sort_by_key(|c| (c.priority, c.order));
        DecodeTable { entries }
    }

    /// Best match for a word: lowest priority number, then declaration
    /// order. The terminator guarantees a result.
    pub fn lookup(&self, word: u32) -> &'static DecodeEntry {
        for c in &self.entries {
            if word & c.mask == c.value {
                return c.entry;
            }
        }
        unreachable!("decode table has no terminator entry")
    }

    /// All matching entries, in precedence order (for the collision audit).
    pub fn matches(&self, word: u32) -> Vec<&Compiled> {
        self.entries.iter().filter(|c| word & c.mask == c.value).collect()
    }

    /// Every compiled entry, in precedence order.
    pub fn all(&self) -> &[Compiled] {
        &self.entries
    }
}

fn parse_pattern(pattern: &str) -> (u32, u32, u32) {
    let mut mask = 0u32;
    let mut value = 0u32;
    let mut bits = 0u32;
    for ch in pattern.chars() {
        match ch {
            '0' | '1' => {
                mask = (mask << 1) | 1;
                value = (value << 1) | (ch == '1') as u32;
                bits += 1;
            }
            '.' => {
                mask <<= 1;
                value <<= 1;
                bits += 1;
            }
            '|' | ' ' => {}
            other => panic!("bad pattern character {other:?} in {pattern:?}"),
        }
    }
    (mask, value, bits)
}

pub fn table16() -> &'static DecodeTable {
    static TABLE: OnceLock<DecodeTable> = OnceLock::new();
    TABLE.get_or_init(|| DecodeTable::compile(16, THUMB16))
}

pub fn table32() -> &'static DecodeTable {
    static TABLE: OnceLock<DecodeTable> = OnceLock::new();
    TABLE.get_or_init(|| DecodeTable::compile(32, THUMB32))
}

/// 16-bit Thumb decode table.
static THUMB16: &[DecodeEntry] = &[
    // data processing
    row(7, "|010000|0101|...|...|", a::t16_rt("adc", C::BinopRt(AluOp::Adc))),
    row(8, "|0001110|...|...|...|", a::t16_imm3("add", C::BinopImm(AluOp::Add))),
    row(8, "|00110|...|........|", a::t16_imm8("add", C::BinopIt(AluOp::Add))),
    row(8, "|0001100|...|...|...|", a::t16_rrr("add", C::BinopRm(AluOp::Add))),
    row(7, "|01000100|0|0|...|...|", a::t16_high("add", C::BinopRt(AluOp::Add), a::SUP_T2, Isar::None)),
    row(7, "|01000100|0|1|...|...|", a::t16_high("add", C::BinopRt(AluOp::Add), a::SUP_T, Isar::None)),
    row(7, "|01000100|1|.|...|...|", a::t16_high("add", C::BinopRt(AluOp::Add), a::SUP_T, Isar::None)),
    row(8, "|10100|...|........|", a::t16_adr("add", C::BinopAdr { sub: false }, RegSpec::Pc)),
    row(8, "|10101|...|........|", a::t16_adr("add", C::BinopImm(AluOp::Add), RegSpec::Sp)),
    row(8, "|101100000|.......|", a::t16_adj_sp("add", C::BinopIt(AluOp::Add))),
    row(7, "|010000|0000|...|...|", a::t16_rt("and", C::BinopRt(AluOp::And))),
    row(8, "|00010|.....|...|...|", a::t16_shift_imm("asr", C::UnopRsi(MovOp::Mov), ShiftSpec::Asr)),
    row(7, "|010000|0100|...|...|", a::t16_shift_reg("asr", C::UnopRsrt(MovOp::Mov), ShiftSpec::Asr)),
    row(7, "|010000|1110|...|...|", a::t16_rt("bic", C::BinopRt(AluOp::Bic))),
    row(7, "|010000|0001|...|...|", a::t16_rt("eor", C::BinopRt(AluOp::Eor))),
    row(8, "|00000|.....|...|...|", a::t16_shift_imm("lsl", C::UnopRsi(MovOp::Mov), ShiftSpec::Lsl)),
    row(7, "|010000|0010|...|...|", a::t16_shift_reg("lsl", C::UnopRsrt(MovOp::Mov), ShiftSpec::Lsl)),
    row(8, "|00001|.....|...|...|", a::t16_shift_imm("lsr", C::UnopRsi(MovOp::Mov), ShiftSpec::Lsr)),
    row(7, "|010000|0011|...|...|", a::t16_shift_reg("lsr", C::UnopRsrt(MovOp::Mov), ShiftSpec::Lsr)),
    row(8, "|00100|...|........|", a::t16_imm8("mov", C::UnopImm(MovOp::Mov))),
    row(7, "|000000|0000|...|...|", a::t16_mov2("mov", C::UnopRsi(MovOp::Mov))),
    row(7, "|01000110|0|0|...|...|", a::t16_high("mov", C::UnopRm(MovOp::Mov), a::SUP_T6, Isar::MovLowLow)),
    row(7, "|01000110|0|1|...|...|", a::t16_high("mov", C::UnopRm(MovOp::Mov), a::SUP_T, Isar::None)),
    row(7, "|01000110|1|.|...|...|", a::t16_high("mov", C::UnopRm(MovOp::Mov), a::SUP_T, Isar::None)),
    row(7, "|010000|1101|...|...|", a::t16_rt("mul", C::BinopRt(AluOp::Mul))),
    row(7, "|010000|1111|...|...|", a::t16_rt("mvn", C::UnopRm(MovOp::Mvn))),
    row(7, "|010000|1001|...|...|", a::t16_rt("neg", C::UnopRm(MovOp::Neg))),
    row(7, "|010000|1100|...|...|", a::t16_rt("orr", C::BinopRt(AluOp::Orr))),
    row(7, "|010000|0111|...|...|", a::t16_shift_reg("ror", C::UnopRsrt(MovOp::Mov), ShiftSpec::Ror)),
    row(7, "|010000|0110|...|...|", a::t16_rt("sbc", C::BinopRt(AluOp::Sbc))),
    row(8, "|0001111|...|...|...|", a::t16_imm3("sub", C::BinopImm(AluOp::Sub))),
    row(8, "|00111|...|........|", a::t16_imm8("sub", C::BinopIt(AluOp::Sub))),
    row(8, "|0001101|...|...|...|", a::t16_rrr("sub", C::BinopRm(AluOp::Sub))),
    row(8, "|101100001|.......|", a::t16_adj_sp("sub", C::BinopIt(AluOp::Sub))),

    // compare
    row(7, "|010000|1011|...|...|", a::t16_cmp_rm("cmn", C::CmpopRm(CmpOp::Cmn))),
    row(8, "|00101|...|........|", a::t16_cmp_imm8("cmp", C::CmpopImm(CmpOp::Cmp))),
    row(7, "|010000|1010|...|...|", a::t16_cmp_rm("cmp", C::CmpopRm(CmpOp::Cmp))),
    row(7, "|01000101|0|1|...|...|", a::t16_cmp_high("cmp", C::CmpopRm(CmpOp::Cmp))),
    row(7, "|01000101|1|.|...|...|", a::t16_cmp_high("cmp", C::CmpopRm(CmpOp::Cmp))),
    row(7, "|010000|1000|...|...|", a::t16_cmp_rm("tst", C::CmpopRm(CmpOp::Tst))),

    // branches
    row(8, "|1101|....|........|", a::t16_b_cond("b", C::B)),
    row(8, "|111|00|...........|", a::t16_b("b", C::B)),
    row(8, "|010001111|....|...|", a::t16_bx("blx", C::BranchReg { link: true }, a::SUP_T5, Isar::Blx)),
    row(8, "|010001110|....|...|", a::t16_bx("bx", C::BranchReg { link: false }, a::SUP_T, Isar::Bx)),
    row(7, "|1101|1111|........|", a::t16_imm_only("svc", C::Svc, a::SUP_T, Isar::Svc)),
    row(7, "|1101|1110|........|", a::UNDECODED),

    // miscellaneous
    row(7, "|1011|0110011|.....|", a::t16_cps("cps")),
    row(7, "|1011|10.1...|.....|", a::t16_cbz("cbnz", C::Cbz { nonzero: true })),
    row(7, "|1011|00.1...|.....|", a::t16_cbz("cbz", C::Cbz { nonzero: false })),
    row(7, "|1011|001000.|.....|", a::t16_xt("sxth", C::Extend { kind: ExtKind::Half, unsigned: false, accumulate: false }, Isar::Sxtb)),
    row(7, "|1011|001001.|.....|", a::t16_xt("sxtb", C::Extend { kind: ExtKind::Byte, unsigned: false, accumulate: false }, Isar::Sxtb)),
    row(7, "|1011|001010.|.....|", a::t16_xt("uxth", C::Extend { kind: ExtKind::Half, unsigned: true, accumulate: false }, Isar::Sxtb)),
    row(7, "|1011|001011.|.....|", a::t16_xt("uxtb", C::Extend { kind: ExtKind::Byte, unsigned: true, accumulate: false }, Isar::Sxtb)),
    row(7, "|1011|101000.|.....|", a::t16_xt("rev", C::Rev, Isar::Rev)),
    row(7, "|1011|101001.|.....|", a::t16_xt("rev16", C::Rev16, Isar::Rev)),
    row(7, "|1011|101011.|.....|", a::t16_xt("revsh", C::Revsh, Isar::Rev)),
    row(7, "|1011|1110...|.....|", a::t16_imm_only("bkpt", C::Bkpt, a::SUP_T5, Isar::Bkpt)),

    // load and store
    row(8, "|01101|.....|...|...|", a::t16_ls_imm5("ldr", C::LoadImm, 4, false)),
    row(8, "|0101100|...|...|...|", a::t16_ls_reg("ldr", C::LoadReg, 4, false)),
    row(8, "|01001|...|........|", a::t16_ls_rel("ldr", C::LoadImm, RegSpec::Pc, 4)),
    row(8, "|10011|...|........|", a::t16_ls_rel("ldr", C::LoadImm, RegSpec::Sp, 4)),
    row(8, "|01111|.....|...|...|", a::t16_ls_imm5("ldrb", C::LoadImm, 1, false)),
    row(8, "|0101110|...|...|...|", a::t16_ls_reg("ldrb", C::LoadReg, 1, false)),
    row(8, "|10001|.....|...|...|", a::t16_ls_imm5("ldrh", C::LoadImm, 2, false)),
    row(8, "|0101101|...|...|...|", a::t16_ls_reg("ldrh", C::LoadReg, 2, false)),
    row(8, "|0101011|...|...|...|", a::t16_ls_reg("ldrsb", C::LoadReg, 1, true)),
    row(8, "|0101111|...|...|...|", a::t16_ls_reg("ldrsh", C::LoadReg, 2, true)),
    row(8, "|01100|.....|...|...|", a::t16_ls_imm5("str", C::StoreImm, 4, false)),
    row(8, "|0101000|...|...|...|", a::t16_ls_reg("str", C::StoreReg, 4, false)),
    row(8, "|10010|...|........|", a::t16_ls_rel("str", C::StoreImm, RegSpec::Sp, 4)),
    row(8, "|01110|.....|...|...|", a::t16_ls_imm5("strb", C::StoreImm, 1, false)),
    row(8, "|0101010|...|...|...|", a::t16_ls_reg("strb", C::StoreReg, 1, false)),
    row(8, "|10000|.....|...|...|", a::t16_ls_imm5("strh", C::StoreImm, 2, false)),
    row(8, "|0101001|...|...|...|", a::t16_ls_reg("strh", C::StoreReg, 2, false)),

    // load and store multiple
    row(8, "|11001|...|........|", a::t16_ldm("ldm", C::Ldm)),
    row(8, "|1011110|.|........|", a::t16_push_pop("pop", C::Ldm, super::fields::RListSpec::L16Pc, IncDecSpec::IaImplicit)),
    row(8, "|1011010|.|........|", a::t16_push_pop("push", C::Stm, super::fields::RListSpec::L16Lr, IncDecSpec::DbImplicit)),
    row(8, "|11000|...|........|", a::t16_stm("stm", C::Stm)),

    // if-then and hints
    row(8, "|1011|1111|....|....|", a::t16_it("it")),
    row(7, "|1011|1111|....|0000|", a::t16_hint("nop", C::Nop)),
    row(6, "|1011|1111|0001|0000|", a::t16_hint("yield", C::Yield)),
    row(6, "|1011|1111|0010|0000|", a::t16_hint("wfe", C::Wfe)),
    row(6, "|1011|1111|0011|0000|", a::t16_hint("wfi", C::Wfi)),
    row(6, "|1011|1111|0100|0000|", a::t16_hint("sev", C::Sev)),

    // terminator
    row(15, "|................|", a::UNDECODED),
];

/// 32-bit Thumb decode table.
static THUMB32: &[DecodeEntry] = &[
    // data processing, modified immediate and shifted register
    row(8, "|111|10.0|0000|.|....|0...|....|........|", a::t32_dp_imm("and", C::BinopImm(AluOp::And))),
    row(8, "|111|0101|0000|.|....|....|....|........|", a::t32_dp_rsi("and", C::BinopRsi(AluOp::And))),
    row(7, "|111|0101|0000|.|....|.000|....|0011|....|", a::t32_dp_rrx("and", C::BinopRrx(AluOp::And))),
    row(6, "|111|10.0|0000|1|....|0...|1111|........|", a::t32_cmp_imm("tst", C::CmpopImm(CmpOp::Tst))),
    row(6, "|111|0101|0000|1|....|....|1111|........|", a::t32_cmp_rsi("tst", C::CmpopRsi(CmpOp::Tst))),
    row(5, "|111|0101|0000|1|....|.000|1111|0011|....|", a::t32_cmp_rrx("tst", C::CmpopRrx(CmpOp::Tst))),
    row(8, "|111|10.0|0001|.|....|0...|....|........|", a::t32_dp_imm("bic", C::BinopImm(AluOp::Bic))),
    row(8, "|111|0101|0001|.|....|....|....|........|", a::t32_dp_rsi("bic", C::BinopRsi(AluOp::Bic))),
    row(7, "|111|0101|0001|.|....|.000|....|0011|....|", a::t32_dp_rrx("bic", C::BinopRrx(AluOp::Bic))),
    row(8, "|111|10.0|0010|.|....|0...|....|........|", a::t32_dp_imm("orr", C::BinopImm(AluOp::Orr))),
    row(8, "|111|0101|0010|.|....|....|....|........|", a::t32_dp_rsi("orr", C::BinopRsi(AluOp::Orr))),
    row(7, "|111|0101|0010|.|....|.000|....|0011|....|", a::t32_dp_rrx("orr", C::BinopRrx(AluOp::Orr))),
    row(6, "|111|10.0|0010|.|1111|0...|....|........|", a::t32_mov_imm("mov", C::UnopImm(MovOp::Mov))),
    row(6, "|111|0101|0010|.|1111|....|....|........|", a::t32_mov_rsi("mov", C::UnopRsi(MovOp::Mov))),
    row(5, "|111|0101|0010|.|1111|.000|....|0011|....|", a::t32_mov_rrx("mov", C::UnopRrx(MovOp::Mov))),
    row(8, "|111|10.0|0011|.|....|0...|....|........|", a::t32_dp_imm("orn", C::BinopImm(AluOp::Orn))),
    row(8, "|111|0101|0011|.|....|....|....|........|", a::t32_dp_rsi("orn", C::BinopRsi(AluOp::Orn))),
    row(7, "|111|0101|0011|.|....|.000|....|0011|....|", a::t32_dp_rrx("orn", C::BinopRrx(AluOp::Orn))),
    row(6, "|111|10.0|0011|.|1111|0...|....|........|", a::t32_mov_imm("mvn", C::UnopImm(MovOp::Mvn))),
    row(6, "|111|0101|0011|.|1111|....|....|........|", a::t32_mov_rsi("mvn", C::UnopRsi(MovOp::Mvn))),
    row(5, "|111|0101|0011|.|1111|.000|....|0011|....|", a::t32_mov_rrx("mvn", C::UnopRrx(MovOp::Mvn))),
    row(8, "|111|10.0|0100|.|....|0...|....|........|", a::t32_dp_imm("eor", C::BinopImm(AluOp::Eor))),
    row(8, "|111|0101|0100|.|....|....|....|........|", a::t32_dp_rsi("eor", C::BinopRsi(AluOp::Eor))),
    row(7, "|111|0101|0100|.|....|.000|....|0011|....|", a::t32_dp_rrx("eor", C::BinopRrx(AluOp::Eor))),
    row(6, "|111|10.0|0100|1|....|0...|1111|........|", a::t32_cmp_imm("teq", C::CmpopImm(CmpOp::Teq))),
    row(6, "|111|0101|0100|1|....|....|1111|........|", a::t32_cmp_rsi("teq", C::CmpopRsi(CmpOp::Teq))),
    row(5, "|111|0101|0100|1|....|.000|1111|0011|....|", a::t32_cmp_rrx("teq", C::CmpopRrx(CmpOp::Teq))),
    row(8, "|111|10.0|1000|.|....|0...|....|........|", a::t32_dp_imm("add", C::BinopImm(AluOp::Add))),
    row(8, "|111|0101|1000|.|....|....|....|........|", a::t32_dp_rsi("add", C::BinopRsi(AluOp::Add))),
    row(7, "|111|0101|1000|.|....|.000|....|0011|....|", a::t32_dp_rrx("add", C::BinopRrx(AluOp::Add))),
    row(6, "|111|10.0|1000|1|....|0...|1111|........|", a::t32_cmp_imm("cmn", C::CmpopImm(CmpOp::Cmn))),
    row(6, "|111|0101|1000|1|....|....|1111|........|", a::t32_cmp_rsi("cmn", C::CmpopRsi(CmpOp::Cmn))),
    row(5, "|111|0101|1000|1|....|.000|1111|0011|....|", a::t32_cmp_rrx("cmn", C::CmpopRrx(CmpOp::Cmn))),
    row(8, "|111|10.0|1010|.|....|0...|....|........|", a::t32_dp_imm("adc", C::BinopImm(AluOp::Adc))),
    row(8, "|111|0101|1010|.|....|....|....|........|", a::t32_dp_rsi("adc", C::BinopRsi(AluOp::Adc))),
    row(7, "|111|0101|1010|.|....|.000|....|0011|....|", a::t32_dp_rrx("adc", C::BinopRrx(AluOp::Adc))),
    row(8, "|111|10.0|1011|.|....|0...|....|........|", a::t32_dp_imm("sbc", C::BinopImm(AluOp::Sbc))),
    row(8, "|111|0101|1011|.|....|....|....|........|", a::t32_dp_rsi("sbc", C::BinopRsi(AluOp::Sbc))),
    row(7, "|111|0101|1011|.|....|.000|....|0011|....|", a::t32_dp_rrx("sbc", C::BinopRrx(AluOp::Sbc))),
    row(8, "|111|10.0|1101|.|....|0...|....|........|", a::t32_dp_imm("sub", C::BinopImm(AluOp::Sub))),
    row(8, "|111|0101|1101|.|....|....|....|........|", a::t32_dp_rsi("sub", C::BinopRsi(AluOp::Sub))),
    row(7, "|111|0101|1101|.|....|.000|....|0011|....|", a::t32_dp_rrx("sub", C::BinopRrx(AluOp::Sub))),
    row(6, "|111|10.0|1101|1|....|0...|1111|........|", a::t32_cmp_imm("cmp", C::CmpopImm(CmpOp::Cmp))),
    row(6, "|111|0101|1101|1|....|....|1111|........|", a::t32_cmp_rsi("cmp", C::CmpopRsi(CmpOp::Cmp))),
    row(5, "|111|0101|1101|1|....|.000|1111|0011|....|", a::t32_cmp_rrx("cmp", C::CmpopRrx(CmpOp::Cmp))),
    row(8, "|111|10.0|1110|.|....|0...|....|........|", a::t32_dp_imm("rsb", C::BinopImm(AluOp::Rsb))),
    row(8, "|111|0101|1110|.|....|....|....|........|", a::t32_dp_rsi("rsb", C::BinopRsi(AluOp::Rsb))),
    row(7, "|111|0101|1110|.|....|.000|....|0011|....|", a::t32_dp_rrx("rsb", C::BinopRrx(AluOp::Rsb))),

    // pack halfword
    row(8, "|111|01|01|0110|0|....|....|....|..00|....|", a::t32_pkh("pkhbt", C::Pkh { tb: false }, ShiftSpec::At4)),
    row(8, "|111|01|01|0110|0|....|....|....|..10|....|", a::t32_pkh("pkhtb", C::Pkh { tb: true }, ShiftSpec::At4)),

    // data processing, plain binary immediate
    row(8, "|111|10|.1|00000|....|0|...|....|........|", a::t32_pi("addw", C::BinopImm(AluOp::Add), super::fields::ConstSpec::Plain12)),
    row(7, "|111|10|.1|00000|1111|0|...|....|........|", a::t32_pi_adr("adr", C::BinopAdr { sub: false })),
    row(8, "|111|10|.1|01010|....|0|...|....|........|", a::t32_pi("subw", C::BinopImm(AluOp::Sub), super::fields::ConstSpec::Plain12)),
    row(7, "|111|10|.1|01010|1111|0|...|....|........|", a::t32_pi_adr("adr", C::BinopAdr { sub: true })),
    row(8, "|111|10|.1|00100|....|0|...|....|........|", a::t32_pi_mov("movw", C::Movw)),
    row(8, "|111|10|.1|01100|....|0|...|....|........|", a::t32_pi_mov("movt", C::Movt)),
    row(8, "|111|10|.1|100.0|....|0|...|....|........|", a::t32_sat("ssat", C::Sat { unsigned: false }, WidthSpec::W5M1)),
    row(7, "|111|10|.1|10010|....|0|000|....|00......|", a::t32_sat16("ssat16", C::Sat16 { unsigned: false }, WidthSpec::W4M1)),
    row(8, "|111|10|.1|10100|....|0|...|....|........|", a::t32_bitfield("sbfx", C::Sbfx, WidthSpec::W5M1)),
    row(8, "|111|10|.1|10110|....|0|...|....|........|", a::t32_bitfield("bfi", C::Bfi, WidthSpec::Msb)),
    row(7, "|111|10|.1|10110|1111|0|...|....|........|", a::t32_bfc("bfc")),
    row(8, "|111|10|.1|11100|....|0|...|....|........|", a::t32_bitfield("ubfx", C::Ubfx, WidthSpec::W5M1)),
    row(8, "|111|10|.1|110.0|....|0|...|....|........|", a::t32_sat("usat", C::Sat { unsigned: true }, WidthSpec::W5)),
    row(7, "|111|10|.1|11010|....|0|000|....|00......|", a::t32_sat16("usat16", C::Sat16 { unsigned: true }, WidthSpec::W4)),

    // data processing, register
    row(8, "|111|1101|0|000.|....|1111|....|0000|....|", a::t32_shift_rs("lsl", C::UnopRsr(MovOp::Mov), ShiftSpec::At21)),
    row(8, "|111|1101|0|001.|....|1111|....|0000|....|", a::t32_shift_rs("lsr", C::UnopRsr(MovOp::Mov), ShiftSpec::At21)),
    row(8, "|111|1101|0|010.|....|1111|....|0000|....|", a::t32_shift_rs("asr", C::UnopRsr(MovOp::Mov), ShiftSpec::At21)),
    row(8, "|111|1101|0|011.|....|1111|....|0000|....|", a::t32_shift_rs("ror", C::UnopRsr(MovOp::Mov), ShiftSpec::At21)),
    row(8, "|111|1101|0|0000|....|1111|....|1...|....|", a::t32_xta("sxtah", C::Extend { kind: ExtKind::Half, unsigned: false, accumulate: true }, Isar::Sxtab)),
    row(7, "|111|1101|0|0000|1111|1111|....|1...|....|", a::t32_xt("sxth", C::Extend { kind: ExtKind::Half, unsigned: false, accumulate: false }, Isar::Sxtb)),
    row(8, "|111|1101|0|0001|....|1111|....|1...|....|", a::t32_xta("uxtah", C::Extend { kind: ExtKind::Half, unsigned: true, accumulate: true }, Isar::Sxtab)),
    row(7, "|111|1101|0|0001|1111|1111|....|1...|....|", a::t32_xt("uxth", C::Extend { kind: ExtKind::Half, unsigned: true, accumulate: false }, Isar::Sxtb)),
    row(8, "|111|1101|0|0010|....|1111|....|1...|....|", a::t32_xta("sxtab16", C::Extend { kind: ExtKind::Byte16, unsigned: false, accumulate: true }, Isar::Sxtb16)),
    row(7, "|111|1101|0|0010|1111|1111|....|1...|....|", a::t32_xt("sxtb16", C::Extend { kind: ExtKind::Byte16, unsigned: false, accumulate: false }, Isar::Sxtb16)),
    row(8, "|111|1101|0|0011|....|1111|....|1...|....|", a::t32_xta("uxtab16", C::Extend { kind: ExtKind::Byte16, unsigned: true, accumulate: true }, Isar::Sxtb16)),
    row(7, "|111|1101|0|0011|1111|1111|....|1...|....|", a::t32_xt("uxtb16", C::Extend { kind: ExtKind::Byte16, unsigned: true, accumulate: false }, Isar::Sxtb16)),
    row(8, "|111|1101|0|0100|....|1111|....|1...|....|", a::t32_xta("sxtab", C::Extend { kind: ExtKind::Byte, unsigned: false, accumulate: true }, Isar::Sxtab)),
    row(7, "|111|1101|0|0100|1111|1111|....|1...|....|", a::t32_xt("sxtb", C::Extend { kind: ExtKind::Byte, unsigned: false, accumulate: false }, Isar::Sxtb)),
    row(8, "|111|1101|0|0101|....|1111|....|1...|....|", a::t32_xta("uxtab", C::Extend { kind: ExtKind::Byte, unsigned: true, accumulate: true }, Isar::Sxtab)),
    row(7, "|111|1101|0|0101|1111|1111|....|1...|....|", a::t32_xt("uxtb", C::Extend { kind: ExtKind::Byte, unsigned: true, accumulate: false }, Isar::Sxtb)),

    // parallel add/subtract
    row(8, "|111|1101|01|001|....|1111|....|0000|....|", a::t32_pas("sadd16", C::Pas { prefix: PasPrefix::S, op: PasOp::Add16 })),
    row(8, "|111|1101|01|001|....|1111|....|0001|....|", a::t32_pas("qadd16", C::Pas { prefix: PasPrefix::Q, op: PasOp::Add16 })),
    row(8, "|111|1101|01|001|....|1111|....|0010|....|", a::t32_pas("shadd16", C::Pas { prefix: PasPrefix::Sh, op: PasOp::Add16 })),
    row(8, "|111|1101|01|001|....|1111|....|0100|....|", a::t32_pas("uadd16", C::Pas { prefix: PasPrefix::U, op: PasOp::Add16 })),
    row(8, "|111|1101|01|001|....|1111|....|0101|....|", a::t32_pas("uqadd16", C::Pas { prefix: PasPrefix::Uq, op: PasOp::Add16 })),
    row(8, "|111|1101|01|001|....|1111|....|0110|....|", a::t32_pas("uhadd16", C::Pas { prefix: PasPrefix::Uh, op: PasOp::Add16 })),
    row(8, "|111|1101|01|010|....|1111|....|0000|....|", a::t32_pas("sasx", C::Pas { prefix: PasPrefix::S, op: PasOp::Asx })),
    row(8, "|111|1101|01|010|....|1111|....|0001|....|", a::t32_pas("qasx", C::Pas { prefix: PasPrefix::Q, op: PasOp::Asx })),
    row(8, "|111|1101|01|010|....|1111|....|0010|....|", a::t32_pas("shasx", C::Pas { prefix: PasPrefix::Sh, op: PasOp::Asx })),
    row(8, "|111|1101|01|010|....|1111|....|0100|....|", a::t32_pas("uasx", C::Pas { prefix: PasPrefix::U, op: PasOp::Asx })),
    row(8, "|111|1101|01|010|....|1111|....|0101|....|", a::t32_pas("uqasx", C::Pas { prefix: PasPrefix::Uq, op: PasOp::Asx })),
    row(8, "|111|1101|01|010|....|1111|....|0110|....|", a::t32_pas("uhasx", C::Pas { prefix: PasPrefix::Uh, op: PasOp::Asx })),
    row(8, "|111|1101|01|110|....|1111|....|0000|....|", a::t32_pas("ssax", C::Pas { prefix: PasPrefix::S, op: PasOp::Sax })),
    row(8, "|111|1101|01|110|....|1111|....|0001|....|", a::t32_pas("qsax", C::Pas { prefix: PasPrefix::Q, op: PasOp::Sax })),
    row(8, "|111|1101|01|110|....|1111|....|0010|....|", a::t32_pas("shsax", C::Pas { prefix: PasPrefix::Sh, op: PasOp::Sax })),
    row(8, "|111|1101|01|110|....|1111|....|0100|....|", a::t32_pas("usax", C::Pas { prefix: PasPrefix::U, op: PasOp::Sax })),
    row(8, "|111|1101|01|110|....|1111|....|0101|....|", a::t32_pas("uqsax", C::Pas { prefix: PasPrefix::Uq, op: PasOp::Sax })),
    row(8, "|111|1101|01|110|....|1111|....|0110|....|", a::t32_pas("uhsax", C::Pas { prefix: PasPrefix::Uh, op: PasOp::Sax })),
    row(8, "|111|1101|01|101|....|1111|....|0000|....|", a::t32_pas("ssub16", C::Pas { prefix: PasPrefix::S, op: PasOp::Sub16 })),
    row(8, "|111|1101|01|101|....|1111|....|0001|....|", a::t32_pas("qsub16", C::Pas { prefix: PasPrefix::Q, op: PasOp::Sub16 })),
    row(8, "|111|1101|01|101|....|1111|....|0010|....|", a::t32_pas("shsub16", C::Pas { prefix: PasPrefix::Sh, op: PasOp::Sub16 })),
    row(8, "|111|1101|01|101|....|1111|....|0100|....|", a::t32_pas("usub16", C::Pas { prefix: PasPrefix::U, op: PasOp::Sub16 })),
    row(8, "|111|1101|01|101|....|1111|....|0101|....|", a::t32_pas("uqsub16", C::Pas { prefix: PasPrefix::Uq, op: PasOp::Sub16 })),
    row(8, "|111|1101|01|101|....|1111|....|0110|....|", a::t32_pas("uhsub16", C::Pas { prefix: PasPrefix::Uh, op: PasOp::Sub16 })),
    row(8, "|111|1101|01|000|....|1111|....|0000|....|", a::t32_pas("sadd8", C::Pas { prefix: PasPrefix::S, op: PasOp::Add8 })),
    row(8, "|111|1101|01|000|....|1111|....|0001|....|", a::t32_pas("qadd8", C::Pas { prefix: PasPrefix::Q, op: PasOp::Add8 })),
    row(8, "|111|1101|01|000|....|1111|....|0010|....|", a::t32_pas("shadd8", C::Pas { prefix: PasPrefix::Sh, op: PasOp::Add8 })),
    row(8, "|111|1101|01|000|....|1111|....|0100|....|", a::t32_pas("uadd8", C::Pas { prefix: PasPrefix::U, op: PasOp::Add8 })),
    row(8, "|111|1101|01|000|....|1111|....|0101|....|", a::t32_pas("uqadd8", C::Pas { prefix: PasPrefix::Uq, op: PasOp::Add8 })),
    row(8, "|111|1101|01|000|....|1111|....|0110|....|", a::t32_pas("uhadd8", C::Pas { prefix: PasPrefix::Uh, op: PasOp::Add8 })),
    row(8, "|111|1101|01|100|....|1111|....|0000|....|", a::t32_pas("ssub8", C::Pas { prefix: PasPrefix::S, op: PasOp::Sub8 })),
    row(8, "|111|1101|01|100|....|1111|....|0001|....|", a::t32_pas("qsub8", C::Pas { prefix: PasPrefix::Q, op: PasOp::Sub8 })),
    row(8, "|111|1101|01|100|....|1111|....|0010|....|", a::t32_pas("shsub8", C::Pas { prefix: PasPrefix::Sh, op: PasOp::Sub8 })),
    row(8, "|111|1101|01|100|....|1111|....|0100|....|", a::t32_pas("usub8", C::Pas { prefix: PasPrefix::U, op: PasOp::Sub8 })),
    row(8, "|111|1101|01|100|....|1111|....|0101|....|", a::t32_pas("uqsub8", C::Pas { prefix: PasPrefix::Uq, op: PasOp::Sub8 })),
    row(8, "|111|1101|01|100|....|1111|....|0110|....|", a::t32_pas("uhsub8", C::Pas { prefix: PasPrefix::Uh, op: PasOp::Sub8 })),

    // miscellaneous operations
    row(8, "|111|1101|0|1000|....|1111|....|1000|....|", a::t32_qadd("qadd", C::QaddSub { double: false, sub: false })),
    row(8, "|111|1101|0|1000|....|1111|....|1001|....|", a::t32_qadd("qdadd", C::QaddSub { double: true, sub: false })),
    row(8, "|111|1101|0|1000|....|1111|....|1010|....|", a::t32_qadd("qsub", C::QaddSub { double: false, sub: true })),
    row(8, "|111|1101|0|1000|....|1111|....|1011|....|", a::t32_qadd("qdsub", C::QaddSub { double: true, sub: true })),
    row(8, "|111|1101|0|1001|....|1111|....|1000|....|", a::t32_misc_rr("rev", C::Rev, Isar::Rev)),
    row(8, "|111|1101|0|1001|....|1111|....|1001|....|", a::t32_misc_rr("rev16", C::Rev16, Isar::Rev)),
    row(8, "|111|1101|0|1001|....|1111|....|1010|....|", a::t32_misc_rr("rbit", C::Rbit, Isar::Rbit)),
    row(8, "|111|1101|0|1001|....|1111|....|1011|....|", a::t32_misc_rr("revsh", C::Revsh, Isar::Rev)),
    row(8, "|111|1101|0|1010|....|1111|....|1000|....|", a::t32_misc_rrr("sel", C::Sel, Isar::Pkhbt)),
    row(8, "|111|1101|0|1011|....|1111|....|1000|....|", a::t32_misc_rr("clz", C::Clz, Isar::Clz)),

    // multiply, divide, multiply accumulate
    row(8, "|111|1101|1|0000|....|....|....|0000|....|", a::t32_mla("mla", C::Mla, Isar::Mla)),
    row(7, "|111|1101|1|0000|....|1111|....|0000|....|", a::t32_mul("mul", C::BinopRm(AluOp::Mul), Isar::None)),
    row(8, "|111|1101|1|0000|....|....|....|0001|....|", a::t32_mla("mls", C::Mls, Isar::Mls)),
    row(8, "|111|1101|1|1001|....|....|....|1111|....|", a::t32_div("sdiv", C::Div { signed: true })),
    row(8, "|111|1101|1|1011|....|....|....|1111|....|", a::t32_div("udiv", C::Div { signed: false })),
    row(8, "|111|1101|1|0001|....|....|....|0000|....|", a::t32_mla("smlabb", C::SmlaXy { nx: false, my: false }, Isar::Smlabb)),
    row(8, "|111|1101|1|0001|....|....|....|0001|....|", a::t32_mla("smlabt", C::SmlaXy { nx: false, my: true }, Isar::Smlabb)),
    row(8, "|111|1101|1|0001|....|....|....|0010|....|", a::t32_mla("smlatb", C::SmlaXy { nx: true, my: false }, Isar::Smlabb)),
    row(8, "|111|1101|1|0001|....|....|....|0011|....|", a::t32_mla("smlatt", C::SmlaXy { nx: true, my: true }, Isar::Smlabb)),
    row(7, "|111|1101|1|0001|....|1111|....|0000|....|", a::t32_mul("smulbb", C::SmulXy { nx: false, my: false }, Isar::Smlabb)),
    row(7, "|111|1101|1|0001|....|1111|....|0001|....|", a::t32_mul("smulbt", C::SmulXy { nx: false, my: true }, Isar::Smlabb)),
    row(7, "|111|1101|1|0001|....|1111|....|0010|....|", a::t32_mul("smultb", C::SmulXy { nx: true, my: false }, Isar::Smlabb)),
    row(7, "|111|1101|1|0001|....|1111|....|0011|....|", a::t32_mul("smultt", C::SmulXy { nx: true, my: true }, Isar::Smlabb)),
    row(8, "|111|1101|1|0010|....|....|....|0000|....|", a::t32_mla("smlad", C::Smlad { cross: false }, Isar::Smlad)),
    row(8, "|111|1101|1|0010|....|....|....|0001|....|", a::t32_mla("smladx", C::Smlad { cross: true }, Isar::Smlad)),
    row(7, "|111|1101|1|0010|....|1111|....|0000|....|", a::t32_mul("smuad", C::Smuad { cross: false }, Isar::Smlad)),
    row(7, "|111|1101|1|0010|....|1111|....|0001|....|", a::t32_mul("smuadx", C::Smuad { cross: true }, Isar::Smlad)),
    row(8, "|111|1101|1|0011|....|....|....|0000|....|", a::t32_mla("smlawb", C::SmlawY { my: false }, Isar::Smlabb)),
    row(8, "|111|1101|1|0011|....|....|....|0001|....|", a::t32_mla("smlawt", C::SmlawY { my: true }, Isar::Smlabb)),
    row(7, "|111|1101|1|0011|....|1111|....|0000|....|", a::t32_mul("smulwb", C::SmulwY { my: false }, Isar::Smlabb)),
    row(7, "|111|1101|1|0011|....|1111|....|0001|....|", a::t32_mul("smulwt", C::SmulwY { my: true }, Isar::Smlabb)),
    row(8, "|111|1101|1|0100|....|....|....|0000|....|", a::t32_mla("smlsd", C::Smlsd { cross: false }, Isar::Smlad)),
    row(8, "|111|1101|1|0100|....|....|....|0001|....|", a::t32_mla("smlsdx", C::Smlsd { cross: true }, Isar::Smlad)),
    row(7, "|111|1101|1|0100|....|1111|....|0000|....|", a::t32_mul("smusd", C::Smusd { cross: false }, Isar::Smlad)),
    row(7, "|111|1101|1|0100|....|1111|....|0001|....|", a::t32_mul("smusdx", C::Smusd { cross: true }, Isar::Smlad)),
    row(8, "|111|1101|1|0101|....|....|....|0000|....|", a::t32_mla("smmla", C::Smmla { round: false }, Isar::Smlad)),
    row(8, "|111|1101|1|0101|....|....|....|0001|....|", a::t32_mla("smmlar", C::Smmla { round: true }, Isar::Smlad)),
    row(7, "|111|1101|1|0101|....|1111|....|0000|....|", a::t32_mul("smmul", C::Smmul { round: false }, Isar::Smlad)),
    row(7, "|111|1101|1|0101|....|1111|....|0001|....|", a::t32_mul("smmulr", C::Smmul { round: true }, Isar::Smlad)),
    row(8, "|111|1101|1|0110|....|....|....|0000|....|", a::t32_mla("smmls", C::Smmls { round: false }, Isar::Smlad)),
    row(8, "|111|1101|1|0110|....|....|....|0001|....|", a::t32_mla("smmlsr", C::Smmls { round: true }, Isar::Smlad)),
    row(7, "|111|1101|1|0111|....|1111|....|0000|....|", a::t32_mul("usad8", C::Usad8, Isar::Pkhbt)),
    row(8, "|111|1101|1|0111|....|....|....|0000|....|", a::t32_mla("usada8", C::Usada8, Isar::Pkhbt)),
    row(8, "|111|1101|1|1100|....|....|....|0000|....|", a::t32_mull("smlal", C::Mlal { signed: true }, Isar::Smull)),
    row(8, "|111|1101|1|1000|....|....|....|0000|....|", a::t32_mull("smull", C::Mull { signed: true }, Isar::Smull)),
    row(8, "|111|1101|1|1110|....|....|....|0110|....|", a::t32_mull("umaal", C::Umaal, Isar::Umaal)),
    row(8, "|111|1101|1|1110|....|....|....|0000|....|", a::t32_mull("umlal", C::Mlal { signed: false }, Isar::Umull)),
    row(8, "|111|1101|1|1010|....|....|....|0000|....|", a::t32_mull("umull", C::Mull { signed: false }, Isar::Umull)),
    row(8, "|111|1101|1|1100|....|....|....|1000|....|", a::t32_mull("smlalbb", C::SmlalXy { nx: false, my: false }, Isar::Smlabb)),
    row(8, "|111|1101|1|1100|....|....|....|1001|....|", a::t32_mull("smlalbt", C::SmlalXy { nx: false, my: true }, Isar::Smlabb)),
    row(8, "|111|1101|1|1100|....|....|....|1010|....|", a::t32_mull("smlaltb", C::SmlalXy { nx: true, my: false }, Isar::Smlabb)),
    row(8, "|111|1101|1|1100|....|....|....|1011|....|", a::t32_mull("smlaltt", C::SmlalXy { nx: true, my: true }, Isar::Smlabb)),
    row(8, "|111|1101|1|1100|....|....|....|1100|....|", a::t32_mull("smlald", C::Smlald { cross: false }, Isar::Smlad)),
    row(8, "|111|1101|1|1100|....|....|....|1101|....|", a::t32_mull("smlaldx", C::Smlald { cross: true }, Isar::Smlad)),
    row(8, "|111|1101|1|1101|....|....|....|1100|....|", a::t32_mull("smlsld", C::Smlsld { cross: false }, Isar::Smlad)),
    row(8, "|111|1101|1|1101|....|....|....|1101|....|", a::t32_mull("smlsldx", C::Smlsld { cross: true }, Isar::Smlad)),

    // branch and miscellaneous control
    row(8, "|111|10|...........|1|0.0|...........|.|", a::t32_b_cond("b")),
    row(8, "|111|10|...........|1|0.1|...........|.|", a::t32_b("b", C::B, a::SUP_T2)),
    row(8, "|111|10|...........|1|1.1|...........|.|", a::t32_b("bl", C::Bl, a::SUP_T)),
    row(6, "|111|10|011100.|....|1|0.0|....|........|", a::t32_msr("msr")),
    row(5, "|111|10|0111010|....|1|0.0|.000|........|", a::t32_hint("nop", C::Nop, a::SUP_T2, Isar::Nop)),
    row(4, "|111|10|0111010|....|1|0.0|.000|00000001|", a::t32_hint("yield", C::Yield, a::SUP_T2, Isar::Nop)),
    row(4, "|111|10|0111010|....|1|0.0|.000|00000010|", a::t32_hint("wfe", C::Wfe, a::SUP_T2, Isar::Nop)),
    row(4, "|111|10|0111010|....|1|0.0|.000|00000011|", a::t32_hint("wfi", C::Wfi, a::SUP_T2, Isar::Nop)),
    row(4, "|111|10|0111010|....|1|0.0|.000|00000100|", a::t32_hint("sev", C::Sev, a::SUP_T2, Isar::Nop)),
    row(4, "|111|10|0111010|....|1|0.0|.000|1111....|", a::t32_hint("dbg", C::Dbg, a::SUP_T2, Isar::Nop)),
    row(6, "|111|10|011111.|....|1|0.0|....|........|", a::t32_mrs("mrs")),
    row(7, "|111|10|.111...|....|1|0.0|....|........|", a::UNDECODED),
    row(6, "|111|10|0111011|....|10.0|....|0010|....|", a::t32_hint("clrex", C::Clrex, a::SUP_V7, Isar::Clrex)),
    row(6, "|111|10|0111011|....|10.0|....|0100|....|", a::t32_barrier("dsb", C::Dsb)),
    row(6, "|111|10|0111011|....|10.0|....|0101|....|", a::t32_barrier("dmb", C::Dmb)),
    row(6, "|111|10|0111011|....|10.0|....|0110|....|", a::t32_barrier("isb", C::Isb)),

    // load and store multiple
    row(7, "|111|0100|10|0|.0....|................|", a::t32_ldm("stm", C::Stm, super::fields::RListSpec::L32NoPcSp, IncDecSpec::Db)),
    row(7, "|111|0100|01|0|.0....|................|", a::t32_ldm("stm", C::Stm, super::fields::RListSpec::L32NoPcSp, IncDecSpec::Ia)),
    row(7, "|111|0100|10|0|.1....|................|", a::t32_ldm("ldm", C::Ldm, super::fields::RListSpec::L32NoSp, IncDecSpec::Db)),
    row(7, "|111|0100|01|0|.1....|................|", a::t32_ldm("ldm", C::Ldm, super::fields::RListSpec::L32NoSp, IncDecSpec::Ia)),
    row(6, "|111|0100|01|0|111101|................|", a::t32_push_pop("pop", C::Ldm, super::fields::RListSpec::L32NoSp, IncDecSpec::IaImplicit)),
    row(6, "|111|0100|10|0|101101|................|", a::t32_push_pop("push", C::Stm, super::fields::RListSpec::L32NoPcSp, IncDecSpec::DbImplicit)),

    // dual and exclusive
    row(8, "|111|0100|0.|1|11|....|........|....|....|", a::t32_ldrd("ldrd", C::LdrdImm)),
    row(8, "|111|0100|1.|1|.1|....|........|....|....|", a::t32_ldrd("ldrd", C::LdrdImm)),
    row(8, "|111|0100|0.|1|10|....|........|....|....|", a::t32_ldrd("strd", C::StrdImm)),
    row(8, "|111|0100|1.|1|.0|....|........|....|....|", a::t32_ldrd("strd", C::StrdImm)),
    row(7, "|111|0100|00|1|01|....|........|....|....|", a::t32_ldrex("ldrex", C::Ldrex)),
    row(7, "|111|0100|01|1|01|....|........|0100|....|", a::t32_ldrexbh("ldrexb", 1)),
    row(7, "|111|0100|01|1|01|....|........|0101|....|", a::t32_ldrexbh("ldrexh", 2)),
    row(7, "|111|0100|00|1|00|....|........|....|....|", a::t32_strex("strex")),
    row(7, "|111|0100|01|1|00|....|........|0100|....|", a::t32_strexbh("strexb", 1)),
    row(7, "|111|0100|01|1|00|....|........|0101|....|", a::t32_strexbh("strexh", 2)),
    row(7, "|111|0100|01|1|01|....|........|0000|....|", a::t32_tb("tbb", false)),
    row(7, "|111|0100|01|1|01|....|........|0001|....|", a::t32_tb("tbh", true)),

    // load instructions
    row(8, "|111|1100|01|10|1|....|....|......|......|", a::t32_ls_imm12("ldr", C::LoadImm, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|1|....|....|1..1..|......|", a::t32_ls_imm8("ldr", C::LoadImm, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|1|....|....|1100..|......|", a::t32_ls_imm8("ldr", C::LoadImm, 4, false, Isar::None)),
    row(5, "|111|1100|00|10|1|1111|....|......|......|", a::t32_ls_lit("ldr", C::LoadImm, 4, false, Isar::None)),
    row(6, "|111|1100|00|10|1|....|....|000000|00....|", a::t32_ls_reg("ldr", C::LoadReg, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|1|....|....|000000|......|", a::t32_ls_reg("ldr", C::LoadRsi, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|1|....|....|1110..|......|", a::t32_ls_unpriv("ldrt", C::LoadImm, 4, false, Isar::Ldrbt)),
    row(8, "|111|1100|01|01|1|....|....|......|......|", a::t32_ls_imm12("ldrh", C::LoadImm, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|1|....|....|1..1..|......|", a::t32_ls_imm8("ldrh", C::LoadImm, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|1|....|....|1100..|......|", a::t32_ls_imm8("ldrh", C::LoadImm, 2, false, Isar::None)),
    row(5, "|111|1100|00|01|1|1111|....|......|......|", a::t32_ls_lit("ldrh", C::LoadImm, 2, false, Isar::None)),
    row(6, "|111|1100|00|01|1|....|....|000000|00....|", a::t32_ls_reg("ldrh", C::LoadReg, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|1|....|....|000000|......|", a::t32_ls_reg("ldrh", C::LoadRsi, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|1|....|....|1110..|......|", a::t32_ls_unpriv("ldrht", C::LoadImm, 2, false, Isar::Ldrht)),
    row(8, "|111|1100|01|00|1|....|....|......|......|", a::t32_ls_imm12("ldrb", C::LoadImm, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|1|....|....|1..1..|......|", a::t32_ls_imm8("ldrb", C::LoadImm, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|1|....|....|1100..|......|", a::t32_ls_imm8("ldrb", C::LoadImm, 1, false, Isar::None)),
    row(5, "|111|1100|00|00|1|1111|....|......|......|", a::t32_ls_lit("ldrb", C::LoadImm, 1, false, Isar::None)),
    row(6, "|111|1100|00|00|1|....|....|000000|00....|", a::t32_ls_reg("ldrb", C::LoadReg, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|1|....|....|000000|......|", a::t32_ls_reg("ldrb", C::LoadRsi, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|1|....|....|1110..|......|", a::t32_ls_unpriv("ldrbt", C::LoadImm, 1, false, Isar::Ldrbt)),
    row(8, "|111|1100|11|01|1|....|....|......|......|", a::t32_ls_imm12("ldrsh", C::LoadImm, 2, true, Isar::None)),
    row(7, "|111|1100|10|01|1|....|....|1..1..|......|", a::t32_ls_imm8("ldrsh", C::LoadImm, 2, true, Isar::None)),
    row(7, "|111|1100|10|01|1|....|....|1100..|......|", a::t32_ls_imm8("ldrsh", C::LoadImm, 2, true, Isar::None)),
    row(5, "|111|1100|10|01|1|1111|....|......|......|", a::t32_ls_lit("ldrsh", C::LoadImm, 2, true, Isar::None)),
    row(6, "|111|1100|10|01|1|....|....|000000|00....|", a::t32_ls_reg("ldrsh", C::LoadReg, 2, true, Isar::None)),
    row(7, "|111|1100|10|01|1|....|....|000000|......|", a::t32_ls_reg("ldrsh", C::LoadRsi, 2, true, Isar::None)),
    row(7, "|111|1100|10|01|1|....|....|1110..|......|", a::t32_ls_unpriv("ldrsht", C::LoadImm, 2, true, Isar::Ldrht)),
    row(8, "|111|1100|11|00|1|....|....|......|......|", a::t32_ls_imm12("ldrsb", C::LoadImm, 1, true, Isar::None)),
    row(7, "|111|1100|10|00|1|....|....|1..1..|......|", a::t32_ls_imm8("ldrsb", C::LoadImm, 1, true, Isar::None)),
    row(7, "|111|1100|10|00|1|....|....|1100..|......|", a::t32_ls_imm8("ldrsb", C::LoadImm, 1, true, Isar::None)),
    row(5, "|111|1100|10|00|1|1111|....|......|......|", a::t32_ls_lit("ldrsb", C::LoadImm, 1, true, Isar::None)),
    row(6, "|111|1100|10|00|1|....|....|000000|00....|", a::t32_ls_reg("ldrsb", C::LoadReg, 1, true, Isar::None)),
    row(7, "|111|1100|10|00|1|....|....|000000|......|", a::t32_ls_reg("ldrsb", C::LoadRsi, 1, true, Isar::None)),
    row(7, "|111|1100|10|00|1|....|....|1110..|......|", a::t32_ls_unpriv("ldrsbt", C::LoadImm, 1, true, Isar::Ldrht)),

    // store instructions
    row(8, "|111|1100|01|10|0|....|....|......|......|", a::t32_ls_imm12("str", C::StoreImm, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|0|....|....|1..1..|......|", a::t32_ls_imm8("str", C::StoreImm, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|0|....|....|1100..|......|", a::t32_ls_imm8("str", C::StoreImm, 4, false, Isar::None)),
    row(5, "|111|1100|00|10|0|1111|....|......|......|", a::t32_ls_lit("str", C::StoreImm, 4, false, Isar::None)),
    row(6, "|111|1100|00|10|0|....|....|000000|00....|", a::t32_ls_reg("str", C::StoreReg, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|0|....|....|000000|......|", a::t32_ls_reg("str", C::StoreRsi, 4, false, Isar::None)),
    row(7, "|111|1100|00|10|0|....|....|1110..|......|", a::t32_ls_unpriv("strt", C::StoreImm, 4, false, Isar::Ldrbt)),
    row(8, "|111|1100|01|01|0|....|....|......|......|", a::t32_ls_imm12("strh", C::StoreImm, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|0|....|....|1..1..|......|", a::t32_ls_imm8("strh", C::StoreImm, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|0|....|....|1100..|......|", a::t32_ls_imm8("strh", C::StoreImm, 2, false, Isar::None)),
    row(5, "|111|1100|00|01|0|1111|....|......|......|", a::t32_ls_lit("strh", C::StoreImm, 2, false, Isar::None)),
    row(6, "|111|1100|00|01|0|....|....|000000|00....|", a::t32_ls_reg("strh", C::StoreReg, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|0|....|....|000000|......|", a::t32_ls_reg("strh", C::StoreRsi, 2, false, Isar::None)),
    row(7, "|111|1100|00|01|0|....|....|1110..|......|", a::t32_ls_unpriv("strht", C::StoreImm, 2, false, Isar::Ldrht)),
    row(8, "|111|1100|01|00|0|....|....|......|......|", a::t32_ls_imm12("strb", C::StoreImm, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|0|....|....|1..1..|......|", a::t32_ls_imm8("strb", C::StoreImm, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|0|....|....|1100..|......|", a::t32_ls_imm8("strb", C::StoreImm, 1, false, Isar::None)),
    row(5, "|111|1100|00|00|0|1111|....|......|......|", a::t32_ls_lit("strb", C::StoreImm, 1, false, Isar::None)),
    row(6, "|111|1100|00|00|0|....|....|000000|00....|", a::t32_ls_reg("strb", C::StoreReg, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|0|....|....|000000|......|", a::t32_ls_reg("strb", C::StoreRsi, 1, false, Isar::None)),
    row(7, "|111|1100|00|00|0|....|....|1110..|......|", a::t32_ls_unpriv("strbt", C::StoreImm, 1, false, Isar::Ldrbt)),

    // memory hints (PLD/PLI and the unallocated hint space)
    row(3, "|111|1100|01|00|1|....|1111|......|......|", a::t32_mem_hint("pld", Isar::Pld)),
    row(2, "|111|1100|00|00|1|....|1111|1100..|......|", a::t32_mem_hint("pld", Isar::Pld)),
    row(0, "|111|1100|00|00|1|1111|1111|......|......|", a::t32_mem_hint("pld", Isar::Pld)),
    row(1, "|111|1100|00|00|1|....|1111|000000|00....|", a::t32_mem_hint("pld", Isar::Pld)),
    row(2, "|111|1100|00|00|1|....|1111|000000|......|", a::t32_mem_hint("pld", Isar::Pld)),
    row(3, "|111|1100|11|00|1|....|1111|......|......|", a::t32_mem_hint("pli", Isar::Pli)),
    row(2, "|111|1100|10|00|1|....|1111|1100..|......|", a::t32_mem_hint("pli", Isar::Pli)),
    row(0, "|111|1100|10|00|1|1111|1111|......|......|", a::t32_mem_hint("pli", Isar::Pli)),
    row(1, "|111|1100|10|00|1|....|1111|000000|00....|", a::t32_mem_hint("pli", Isar::Pli)),
    row(2, "|111|1100|10|00|1|....|1111|000000|......|", a::t32_mem_hint("pli", Isar::Pli)),
    row(4, "|111|1100|..|01|1|....|1111|......|......|", a::t32_mem_hint("nop", Isar::None)),
    row(4, "|111|1100|..|00|1|....|1111|......|......|", a::t32_mem_hint("nop", Isar::None)),

    // coprocessor instructions (NOCP UsageFault on this family)
    row(8, "|....|1110|....|....|....|....|...|0|....|", a::t32_cp("cdp", super::fields::CpOp1Spec::At20W4)),
    row(7, "|1111|1110|....|....|....|....|...|0|....|", a::t32_cp("cdp2", super::fields::CpOp1Spec::At20W4)),
    row(8, "|....|110|....|1|....|....|....|........|", a::t32_cp("ldc", super::fields::CpOp1Spec::None)),
    row(7, "|....|110|0..0|1|....|....|....|........|", a::t32_cp("ldc", super::fields::CpOp1Spec::None)),
    row(6, "|1111|110|....|1|....|....|....|........|", a::t32_cp("ldc2", super::fields::CpOp1Spec::None)),
    row(5, "|1111|110|0..0|1|....|....|....|........|", a::t32_cp("ldc2", super::fields::CpOp1Spec::None)),
    row(8, "|....|1110|...|0|....|....|....|...|1|....|", a::t32_cp("mcr", super::fields::CpOp1Spec::At21W3)),
    row(7, "|1111|1110|...|0|....|....|....|...|1|....|", a::t32_cp("mcr2", super::fields::CpOp1Spec::At21W3)),
    row(8, "|....|1110|...|1|....|....|....|...|1|....|", a::t32_cp("mrc", super::fields::CpOp1Spec::At21W3)),
    row(7, "|1111|1110|...|1|....|....|....|...|1|....|", a::t32_cp("mrc2", super::fields::CpOp1Spec::At21W3)),
    row(8, "|....|110|....|0|....|....|....|........|", a::t32_cp("stc", super::fields::CpOp1Spec::None)),
    row(7, "|....|110|0..0|0|....|....|....|........|", a::t32_cp("stc", super::fields::CpOp1Spec::None)),
    row(6, "|1111|110|....|0|....|....|....|........|", a::t32_cp("stc2", super::fields::CpOp1Spec::None)),
    row(5, "|1111|110|0..0|0|....|....|....|........|", a::t32_cp("stc2", super::fields::CpOp1Spec::None)),
    row(4, "|....|1100010|0|....|....|....|....|....|", a::t32_cp("mcrr", super::fields::CpOp1Spec::At4W4)),
    row(3, "|1111|1100010|0|....|....|....|....|....|", a::t32_cp("mcrr2", super::fields::CpOp1Spec::At4W4)),
    row(4, "|....|1100010|1|....|....|....|....|....|", a::t32_cp("mrrc", super::fields::CpOp1Spec::At4W4)),
    row(3, "|1111|1100010|1|....|....|....|....|....|", a::t32_cp("mrrc2", super::fields::CpOp1Spec::At4W4)),

    // VFP data processing (single precision)
    row(6, "|1110|1110|0.00|....|....|1010|.0.0|....|", a::vfp_rrr("vmla", C::VfpMla { negate_product: false, negate_acc: false }, Isar::VfpV2)),
    row(6, "|1110|1110|0.00|....|....|1010|.1.0|....|", a::vfp_rrr("vmls", C::VfpMla { negate_product: true, negate_acc: false }, Isar::VfpV2)),
    row(6, "|1110|1110|0.01|....|....|1010|.0.0|....|", a::vfp_rrr("vnmls", C::VfpMla { negate_product: false, negate_acc: true }, Isar::VfpV2)),
    row(6, "|1110|1110|0.01|....|....|1010|.1.0|....|", a::vfp_rrr("vnmla", C::VfpMla { negate_product: true, negate_acc: true }, Isar::VfpV2)),
    row(6, "|1110|1110|0.10|....|....|1010|.0.0|....|", a::vfp_rrr("vmul", C::VfpBinop(VfpAlu::Mul), Isar::VfpV2)),
    row(6, "|1110|1110|0.10|....|....|1010|.1.0|....|", a::vfp_rrr("vnmul", C::VfpBinop(VfpAlu::Nmul), Isar::VfpV2)),
    row(6, "|1110|1110|0.11|....|....|1010|.0.0|....|", a::vfp_rrr("vadd", C::VfpBinop(VfpAlu::Add), Isar::VfpV2)),
    row(6, "|1110|1110|0.11|....|....|1010|.1.0|....|", a::vfp_rrr("vsub", C::VfpBinop(VfpAlu::Sub), Isar::VfpV2)),
    row(6, "|1110|1110|1.00|....|....|1010|.0.0|....|", a::vfp_rrr("vdiv", C::VfpBinop(VfpAlu::Div), Isar::VfpDiv)),
    row(6, "|1110|1110|1.01|....|....|1010|.1.0|....|", a::vfp_rrr("vfnma", C::VfpFma { negate_product: true, negate_acc: true }, Isar::VfpFmac)),
    row(6, "|1110|1110|1.01|....|....|1010|.0.0|....|", a::vfp_rrr("vfnms", C::VfpFma { negate_product: false, negate_acc: true }, Isar::VfpFmac)),
    row(6, "|1110|1110|1.10|....|....|1010|.0.0|....|", a::vfp_rrr("vfma", C::VfpFma { negate_product: false, negate_acc: false }, Isar::VfpFmac)),
    row(6, "|1110|1110|1.10|....|....|1010|.1.0|....|", a::vfp_rrr("vfms", C::VfpFma { negate_product: true, negate_acc: false }, Isar::VfpFmac)),
    row(6, "|1110|1110|1.11|....|....|1010|.0.0|....|", a::vfp_ri("vmov")),
    row(6, "|1110|1110|1.11|0000|....|1010|01.0|....|", a::vfp_rr("vmov", C::VfpMovReg, Isar::VfpV2)),
    row(6, "|1110|1110|1.11|0000|....|1010|11.0|....|", a::vfp_rr("vabs", C::VfpAbs, Isar::VfpV2)),
    row(6, "|1110|1110|1.11|0001|....|1010|01.0|....|", a::vfp_rr("vneg", C::VfpNeg, Isar::VfpV2)),
    row(6, "|1110|1110|1.11|0001|....|1010|11.0|....|", a::vfp_rr("vsqrt", C::VfpSqrt, Isar::VfpSqrt)),
    row(6, "|1110|1110|1.11|0010|....|1010|01.0|....|", a::vfp_rr("vcvtb", C::VfpCvtHalf { top: false, to_half: false }, Isar::VfpHp)),
    row(6, "|1110|1110|1.11|0010|....|1010|11.0|....|", a::vfp_rr("vcvtt", C::VfpCvtHalf { top: true, to_half: false }, Isar::VfpHp)),
    row(6, "|1110|1110|1.11|0011|....|1010|01.0|....|", a::vfp_rr("vcvtb", C::VfpCvtHalf { top: false, to_half: true }, Isar::VfpHp)),
    row(6, "|1110|1110|1.11|0011|....|1010|11.0|....|", a::vfp_rr("vcvtt", C::VfpCvtHalf { top: true, to_half: true }, Isar::VfpHp)),
    row(6, "|1110|1110|1.11|0100|....|1010|01.0|....|", a::vfp_rr("vcmp", C::VfpCmp { quiet_nan_ok: true, with_zero: false }, Isar::VfpV2)),
    row(6, "|1110|1110|1.11|0100|....|1010|11.0|....|", a::vfp_rr("vcmpe", C::VfpCmp { quiet_nan_ok: false, with_zero: false }, Isar::VfpV2)),
    row(6, "|1110|1110|1.11|0101|....|1010|01.0|....|", a::vfp_r0("vcmp", C::VfpCmp { quiet_nan_ok: true, with_zero: true })),
    row(6, "|1110|1110|1.11|0101|....|1010|11.0|....|", a::vfp_r0("vcmpe", C::VfpCmp { quiet_nan_ok: false, with_zero: true })),
    row(6, "|1110|1110|1.11|1000|....|1010|01.0|....|", a::vfp_rr("vcvt", C::VfpCvtIntToF32 { signed: false }, Isar::VfpCvt2)),
    row(6, "|1110|1110|1.11|1000|....|1010|11.0|....|", a::vfp_rr("vcvt", C::VfpCvtIntToF32 { signed: true }, Isar::VfpCvt2)),
    row(6, "|1110|1110|1.11|1010|....|1010|01.0|....|", a::vfp_fix("vcvt", C::VfpCvtFixToF32 { signed: true, fbits16: true }, false)),
    row(6, "|1110|1110|1.11|1010|....|1010|11.0|....|", a::vfp_fix("vcvt", C::VfpCvtFixToF32 { signed: true, fbits16: false }, true)),
    row(6, "|1110|1110|1.11|1011|....|1010|01.0|....|", a::vfp_fix("vcvt", C::VfpCvtFixToF32 { signed: false, fbits16: true }, false)),
    row(6, "|1110|1110|1.11|1011|....|1010|11.0|....|", a::vfp_fix("vcvt", C::VfpCvtFixToF32 { signed: false, fbits16: false }, true)),
    row(6, "|1110|1110|1.11|1100|....|1010|01.0|....|", a::vfp_rr("vcvtr", C::VfpCvtF32ToInt { signed: false, round_fpscr: true }, Isar::VfpCvt2)),
    row(6, "|1110|1110|1.11|1100|....|1010|11.0|....|", a::vfp_rr("vcvt", C::VfpCvtF32ToInt { signed: false, round_fpscr: false }, Isar::VfpCvt2)),
    row(6, "|1110|1110|1.11|1101|....|1010|01.0|....|", a::vfp_rr("vcvtr", C::VfpCvtF32ToInt { signed: true, round_fpscr: true }, Isar::VfpCvt2)),
    row(6, "|1110|1110|1.11|1101|....|1010|11.0|....|", a::vfp_rr("vcvt", C::VfpCvtF32ToInt { signed: true, round_fpscr: false }, Isar::VfpCvt2)),
    row(6, "|1110|1110|1.11|1110|....|1010|01.0|....|", a::vfp_fix("vcvt", C::VfpCvtF32ToFix { signed: true, fbits16: true }, false)),
    row(6, "|1110|1110|1.11|1110|....|1010|11.0|....|", a::vfp_fix("vcvt", C::VfpCvtF32ToFix { signed: true, fbits16: false }, true)),
    row(6, "|1110|1110|1.11|1111|....|1010|01.0|....|", a::vfp_fix("vcvt", C::VfpCvtF32ToFix { signed: false, fbits16: true }, false)),
    row(6, "|1110|1110|1.11|1111|....|1010|11.0|....|", a::vfp_fix("vcvt", C::VfpCvtF32ToFix { signed: false, fbits16: false }, true)),

    // extension register load/store
    row(4, "|1110|110|01.00|....|....|1011|....|....|", a::vfp_ldstm("vstm", false, false, false, true)),
    row(4, "|1110|110|01.00|....|....|1010|....|....|", a::vfp_ldstm("vstm", false, false, false, false)),
    row(4, "|1110|110|01.10|....|....|1011|....|....|", a::vfp_ldstm("vstm", false, true, false, true)),
    row(4, "|1110|110|01.10|....|....|1010|....|....|", a::vfp_ldstm("vstm", false, true, false, false)),
    row(4, "|1110|110|1..00|....|....|1011|....|....|", a::vfp_ldst("vstr", false, true)),
    row(4, "|1110|110|1..00|....|....|1010|....|....|", a::vfp_ldst("vstr", false, false)),
    row(4, "|1110|110|10.10|....|....|1011|....|....|", a::vfp_ldstm("vstm", false, true, true, true)),
    row(4, "|1110|110|10.10|....|....|1010|....|....|", a::vfp_ldstm("vstm", false, true, true, false)),
    row(3, "|1110|110|10.10|1101|....|1011|....|....|", a::vfp_push_pop("vpush", true, true)),
    row(3, "|1110|110|10.10|1101|....|1010|....|....|", a::vfp_push_pop("vpush", true, false)),
    row(4, "|1110|110|01.01|....|....|1011|....|....|", a::vfp_ldstm("vldm", true, false, false, true)),
    row(4, "|1110|110|01.01|....|....|1010|....|....|", a::vfp_ldstm("vldm", true, false, false, false)),
    row(4, "|1110|110|01.11|....|....|1011|....|....|", a::vfp_ldstm("vldm", true, true, false, true)),
    row(4, "|1110|110|01.11|....|....|1010|....|....|", a::vfp_ldstm("vldm", true, true, false, false)),
    row(3, "|1110|110|01.11|1101|....|1011|....|....|", a::vfp_push_pop("vpop", false, true)),
    row(3, "|1110|110|01.11|1101|....|1010|....|....|", a::vfp_push_pop("vpop", false, false)),
    row(4, "|1110|110|1..01|....|....|1011|....|....|", a::vfp_ldst("vldr", true, true)),
    row(4, "|1110|110|1..01|....|....|1010|....|....|", a::vfp_ldst("vldr", true, false)),
    row(4, "|1110|110|10.11|....|....|1011|....|....|", a::vfp_ldstm("vldm", true, true, true, true)),
    row(4, "|1110|110|10.11|....|....|1010|....|....|", a::vfp_ldstm("vldm", true, true, true, false)),

    // 8/16/32-bit transfers between core and extension registers
    row(6, "|1110|1110|1111|....|....|1010|...1|....|", a::vfp_msr("vmrs", C::Vmrs)),
    row(6, "|1110|1110|1110|....|....|1010|...1|....|", a::vfp_msr("vmsr", C::Vmsr)),
    row(6, "|1110|1110|0001|....|....|1010|...1|....|", a::vfp_mov_rs("vmov", true)),
    row(6, "|1110|1110|0000|....|....|1010|...1|....|", a::vfp_mov_rs("vmov", false)),
    row(6, "|1110|1110|00.1|....|....|1011|.001|....|", a::vfp_mov_rz("vmov", true)),
    row(6, "|1110|1110|00.0|....|....|1011|.001|....|", a::vfp_mov_rz("vmov", false)),

    // 64-bit transfers between core and extension registers
    row(2, "|1110|1100|0101|....|....|1011|00.1|....|", a::vfp_mov_rr("vmov", true, true)),
    row(2, "|1110|1100|0100|....|....|1011|00.1|....|", a::vfp_mov_rr("vmov", false, true)),
    row(2, "|1110|1100|0101|....|....|1010|00.1|....|", a::vfp_mov_rr("vmov", true, false)),
    row(2, "|1110|1100|0100|....|....|1010|00.1|....|", a::vfp_mov_rr("vmov", false, false)),

    // the floating-point coprocessor space with the 1111 prefix is
    // undefined rather than NOCP
    row(5, "|1111|1110|........|....|101.|....|....|", a::UNDECODED),
    row(2, "|1111|110|.....|....|....|101.|....|....|", a::UNDECODED),

    // terminator
    row(15, "|........|........|........|........|", a::UNDECODED),
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pattern_parser_shapes() {
        let (mask, value, bits) = parse_pattern("|1011|010.|....|....|");
        assert_eq!(bits, 16);
        assert_eq!(mask, 0xfe00);
        assert_eq!(value, 0xb400);
    }

    #[test]
    fn tables_compile() {
        assert!(table16().entries.len() > 80);
        assert!(table32().entries.len() > 300);
    }

    #[test]
    fn push_decodes_with_lr_list() {
        let e = table16().lookup(0xb500);
        assert_eq!(e.attrs.name, "push");
        let rlist = e.attrs.rlist.extract(0xb500);
        assert_eq!(rlist, 1 << 14);
    }

    #[test]
    fn specific_beats_general_in_16bit_table() {
        // SVC and the permanently-undefined slot carve out B1's cond=111x
        assert_eq!(table16().lookup(0xdf01).attrs.name, "svc");
        assert_eq!(table16().lookup(0xde00).attrs.name, "undef");
        assert_eq!(table16().lookup(0xd001).attrs.name, "b");
        // MOV(2) is the imm=0 carve-out of LSL(1)
        assert_eq!(table16().lookup(0x0008).attrs.name, "mov");
        assert_eq!(table16().lookup(0x0048).attrs.name, "lsl");
        // hints carve out IT with mask=0
        assert_eq!(table16().lookup(0xbf00).attrs.name, "nop");
        assert_eq!(table16().lookup(0xbf10).attrs.name, "yield");
        assert_eq!(table16().lookup(0xbf18).attrs.name, "it");
    }

    #[test]
    fn dp32_rd_pc_selects_compare_forms() {
        // TST is AND with rd=1111, S=1
        let tst = table32().lookup(0xf011_0f01);
        assert_eq!(tst.attrs.name, "tst");
        let and = table32().lookup(0xf011_0101);
        assert_eq!(and.attrs.name, "and");
        // MOV.W is ORR with rn=1111
        let mov = table32().lookup(0xf04f_0001);
        assert_eq!(mov.attrs.name, "mov");
    }

    #[test]
    fn mul_is_mla_with_ra_pc() {
        assert_eq!(table32().lookup(0xfb00_f101).attrs.name, "mul");
        assert_eq!(table32().lookup(0xfb00_1101).attrs.name, "mla");
    }

    #[test]
    fn sdiv_udiv_decode() {
        // SDIV r0, r1, r2
        assert_eq!(table32().lookup(0xfb91_f0f2).attrs.name, "sdiv");
        // UDIV r0, r1, r2
        assert_eq!(table32().lookup(0xfbb1_f0f2).attrs.name, "udiv");
    }

    #[test]
    fn vfp_space_with_1111_prefix_is_undefined() {
        // VADD.F32 with cond prefix 1110 decodes; 1111 prefix is undefined
        assert_eq!(table32().lookup(0xee30_0a00).attrs.name, "vadd");
        assert_eq!(table32().lookup(0xfe30_0a00).attrs.name, "undef");
    }

    #[test]
    fn terminator_catches_unallocated_words() {
        let e = table16().lookup(0xba80); // unallocated misc slot
        assert_eq!(e.attrs.name, "undef");
    }
}
