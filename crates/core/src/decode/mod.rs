// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Thumb/Thumb2 instruction decoder.
//!
//! `decode` resolves a raw instruction word to its canonical opcode class
//! and extracts every operand field into a [`Decoded`] record. The record
//! is transient: it lives for one decode/lowering pass and carries no
//! references into processor state.

pub mod attrs;
pub mod fields;
pub mod tables;

use attrs::{InstrAttrs, SetFlags};
use fields::*;

/// Condition code "always".
pub const COND_AL: u8 = 14;

/// Inputs the decoder needs beyond the instruction word itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeCtx {
    /// IT-block state at this instruction (morph-time copy).
    pub it_state: u8,
    /// UAL assembly conventions in effect.
    pub ual: bool,
}

/// A fully decoded instruction.
#[derive(Debug, Clone, Copy)]
pub struct Decoded {
    pub raw: u32,
    /// Instruction length in bytes (2 or 4).
    pub bytes: u8,
    pub pc: u32,
    pub attrs: &'static InstrAttrs,
    /// Resolved flag-setting behavior.
    pub set_flags: bool,
    /// Effective condition (IT-block condition wins over the cond field).
    pub cond: u8,
    pub r1: u8,
    pub r2: u8,
    pub r3: u8,
    pub r4: u8,
    /// Constant value, after scaling/negation/folding.
    pub c: u32,
    /// Rotation of a rotated modified immediate (shifter carry source).
    pub crotate: u8,
    /// Resolved branch target address.
    pub target: u32,
    pub so: ShiftOp,
    pub sz: u8,
    pub xs: bool,
    pub tl: bool,
    /// Bit-field/saturation width.
    pub w: i8,
    pub u_bit: bool,
    pub post_index: bool,
    pub writeback: bool,
    pub rlist: u32,
    pub incdec: IncDec,
    pub ua: UnalignedAction,
    pub ea: bool,
    /// MSR write mask (bits 11:10).
    pub psr_mask: u8,
    /// CPS enable/disable action.
    pub fact: FlagAction,
    /// CPS A/I/F affect bits.
    pub faff: u8,
    /// IT firstcond:mask byte.
    pub it: u8,
    /// VFP scalar index.
    pub index: u8,
    /// VFP register-list length.
    pub nregs: u8,
    /// Expanded VFP modified-immediate constant.
    pub sdfp_mi: u32,
    pub cpnum: u8,
    pub cpop1: u8,
}

/// Length in bytes of the Thumb instruction starting with `hw1`: three
/// top-five-bit groups denote 32-bit encodings, everything else is 16-bit.
pub fn thumb_instruction_bytes(hw1: u16) -> u8 {
    match hw1 & 0xf800 {
        0xe800 | 0xf000 | 0xf800 => 4,
        _ => 2,
    }
}

/// Decode the instruction at `pc`. `hw2` is ignored for 16-bit encodings.
pub fn decode(ctx: &DecodeCtx, pc: u32, hw1: u16, hw2: u16) -> Decoded {
    let bytes = thumb_instruction_bytes(hw1);
    let (word, entry) = if bytes == 2 {
        let word = hw1 as u32;
        (word, tables::table16().lookup(word))
    } else {
        let word = ((hw1 as u32) << 16) | hw2 as u32;
        (word, tables::table32().lookup(word))
    };
    let attrs = &entry.attrs;

    let set_flags = resolve_set_flags(ctx, attrs.flags, word);

    // inside an IT block the block condition replaces the instruction's own
    let cond = if ctx.it_state & 0xf != 0 {
        ctx.it_state >> 4
    } else {
        attrs.cond.extract(word).unwrap_or(COND_AL)
    };

    let r1 = attrs.r1.extract(word);
    let so = attrs.ss.extract(word);
    let sz = attrs.sz;
    let u_bit = attrs.u.extract(word);
    let (c_raw, crotate) = attrs.cs.extract(word, u_bit, sz);
    let c = adjust_shift(c_raw, attrs.cs, so);
    let rlist = attrs.rlist.extract(word);
    let post_index = attrs.pi.extract(word);

    Decoded {
        raw: word,
        bytes,
        pc,
        attrs,
        set_flags,
        cond,
        r1,
        r2: attrs.r2.extract(word),
        r3: attrs.r3.extract(word),
        r4: attrs.r4.extract(word),
        c,
        crotate,
        target: attrs.ts.extract(word, pc),
        so,
        sz,
        xs: attrs.xs,
        tl: attrs.tl,
        w: attrs.w.extract(word),
        u_bit,
        post_index,
        writeback: post_index || attrs.wb.extract(word, r1, rlist),
        rlist,
        incdec: attrs.incdec.extract(word),
        ua: attrs.ua,
        ea: attrs.ea,
        psr_mask: attrs.mask.extract(word),
        fact: attrs.imod.extract(word),
        faff: if attrs.aif { (word & 0x7) as u8 } else { 0 },
        it: if attrs.it { (word & 0xff) as u8 } else { 0 },
        index: attrs.index.extract(word),
        nregs: attrs.nregs.extract(word),
        sdfp_mi: attrs.sdfp_mi.extract(word),
        cpnum: if attrs.cp { ((word >> 8) & 0xf) as u8 } else { 0 },
        cpop1: attrs.cpop1.extract(word),
    }
}

fn resolve_set_flags(ctx: &DecodeCtx, sf: SetFlags, word: u32) -> bool {
    match sf {
        SetFlags::Never => false,
        SetFlags::Always | SetFlags::Implicit => true,
        SetFlags::IfBit20 => word & (1 << 20) != 0,
        // the UAL distinction only affects disassembly; in either mode the
        // 16-bit forms set flags exactly when outside an IT block
        SetFlags::OutsideItBlock => {
            let _ = ctx.ual;
            ctx.it_state & 0xf == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::attrs::{AluOp, CmpOp, OpcodeClass as C};
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec16(hw: u16) -> Decoded {
        decode(&DecodeCtx { it_state: 0, ual: true }, 0x1000, hw, 0)
    }

    fn dec32(hw1: u16, hw2: u16) -> Decoded {
        decode(&DecodeCtx { it_state: 0, ual: true }, 0x1000, hw1, hw2)
    }

    #[test]
    fn length_determination() {
        assert_eq!(thumb_instruction_bytes(0x2000), 2); // MOVS
        assert_eq!(thumb_instruction_bytes(0xbf00), 2); // NOP
        assert_eq!(thumb_instruction_bytes(0xe7fe), 2); // B
        assert_eq!(thumb_instruction_bytes(0xe800), 4);
        assert_eq!(thumb_instruction_bytes(0xf000), 4);
        assert_eq!(thumb_instruction_bytes(0xfb90), 4);
    }

    #[test]
    fn push_with_lr_only() {
        let d = dec16(0xb500);
        assert_eq!(d.attrs.kind, C::Stm);
        assert_eq!(d.rlist, 1 << 14);
        assert_eq!(d.r1, 13);
        assert!(d.writeback);
        assert!(!d.incdec.increment);
    }

    #[test]
    fn movs_imm8() {
        let d = dec16(0x200a); // MOVS r0, #10
        assert_eq!(d.attrs.kind, C::UnopImm(super::attrs::MovOp::Mov));
        assert_eq!(d.r1, 0);
        assert_eq!(d.c, 10);
        assert!(d.set_flags);
    }

    #[test]
    fn adds_reg_three_operand() {
        let d = dec16(0x1888); // ADDS r0, r1, r2
        assert_eq!(d.attrs.kind, C::BinopRm(AluOp::Add));
        assert_eq!((d.r1, d.r2, d.r3), (0, 1, 2));
    }

    #[test]
    fn flags_suppressed_inside_it_block(){
        let ctx = DecodeCtx { it_state: 0x18, ual: true };
        let d = decode(&ctx, 0x1000, 0x1888, 0);
        assert!(!d.set_flags);
        // and the effective condition comes from the block
        assert_eq!(d.cond, 1);
    }

    #[test]
    fn lsr_immediate_zero_means_32() {
        let d = dec16(0x0808); // LSRS r0, r1, #0 -> shift 32
        assert_eq!(d.c, 32);
        assert_eq!(d.so, ShiftOp::Lsr);
        let d = dec16(0x0048); // LSLS r0, r1, #1 stays 1
        assert_eq!(d.so, ShiftOp::Lsl);
        assert_eq!(d.c, 1);
    }

    #[test]
    fn cmp_immediate() {
        let d = dec16(0x290a); // CMP r1, #10
        assert_eq!(d.attrs.kind, C::CmpopImm(CmpOp::Cmp));
        assert_eq!(d.r1, 1);
        assert_eq!(d.c, 10);
        assert!(d.set_flags);
    }

    #[test]
    fn bl_target_roundtrip() {
        // BL with offset 0: target = pc + 4
        let d = dec32(0xf000, 0xf800 | (1 << 13) | (1 << 11));
        assert_eq!(d.attrs.kind, C::Bl);
        assert_eq!(d.target, 0x1004);
    }

    #[test]
    fn t32_add_modified_immediate() {
        // ADD.W r0, r1, #0x00110011: imm12 code 2 replicates the byte in
        // both halfwords
        let d = dec32(0xf101, 0x1011);
        assert_eq!(d.attrs.kind, C::BinopImm(AluOp::Add));
        assert_eq!((d.r1, d.r2), (0, 1));
        assert_eq!(d.c, 0x0011_0011);
        assert_eq!(d.crotate, 0);
    }

    #[test]
    fn t32_ldr_negative_imm8() {
        // LDR r0, [r1, #-4]
        let d = dec32(0xf851, 0x0c04);
        assert_eq!(d.attrs.kind, C::LoadImm);
        assert_eq!(d.c, 4u32.wrapping_neg());
        assert!(!d.post_index);
        assert!(!d.writeback);
    }

    #[test]
    fn t32_ldr_post_index_writeback() {
        // LDR r0, [r1], #4
        let d = dec32(0xf851, 0x0b04);
        assert!(d.post_index);
        assert!(d.writeback);
        assert_eq!(d.c, 4);
    }

    #[test]
    fn strex_operands() {
        // STREX r0, r1, [r2, #4]
        let d = dec32(0xe842, 0x1001);
        assert_eq!(d.attrs.kind, C::Strex);
        assert_eq!((d.r1, d.r2, d.r3), (0, 1, 2));
        assert_eq!(d.c, 4);
        assert!(d.ea);
    }

    #[test]
    fn ssat16_width() {
        // SSAT16 r0, #8, r1 -> saturate both halfword lanes to 8 bits
        let d = dec32(0xf321, 0x0007);
        assert_eq!(d.attrs.kind, C::Sat16 { unsigned: false });
        assert_eq!(d.w, 8);
        assert_eq!((d.r1, d.r2), (0, 1));
    }

    #[test]
    fn tbb_decode() {
        let d = dec32(0xe8d1, 0xf002);
        assert_eq!(d.attrs.kind, C::Tb { half: false });
        assert_eq!((d.r1, d.r2), (1, 2));
    }
}
