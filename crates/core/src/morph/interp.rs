// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Reference interpreter for the primitive-op stream.
//!
//! Executes one lowered block against the processor state. This is the
//! minimal in-tree execution backend: a production embedder may translate
//! the same stream instead. Faults raised mid-block (bus errors, usage
//! faults, SVC) enter the exception machinery directly and abort the rest
//! of the block.

use super::ops::{
    Binop, CmpKind, Derived, FBinop, FCvt, FUnop, FlagRef, FlagsOp, Op, OpBlock, Operand, Reg,
    SysCall, Unop,
};
use crate::bus::{Bus, MemAccess};
use crate::core::Core;
use crate::state::{FlagWrites, REG_PC};
use crate::sysregs::CFSR_UNALIGNED;

/// Block execution outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exec {
    /// Fell off the end; the PC advances by the instruction length.
    Continue,
    /// Control flow was redirected (jump, exception, lockup, sleep).
    Jumped,
}

/// Temporaries plus resolved label positions for one block run.
struct Frame {
    temps: [u32; super::TEMP_NUM as usize],
    labels: Vec<usize>,
}

/// Execute a lowered block for the instruction at `pc`.
pub fn execute(core: &mut Core, bus: &mut dyn Bus, block: &OpBlock, pc: u32, bytes: u8) -> Exec {
    let ops = block.ops();
    let mut frame = Frame {
        temps: [0; super::TEMP_NUM as usize],
        labels: vec![usize::MAX; block.label_count() as usize],
    };
    for (at, op) in ops.iter().enumerate() {
        if let Op::Label(l) = op {
            frame.labels[*l as usize] = at;
        }
    }

    let next_pc = pc.wrapping_add(bytes as u32);
    let mut ip = 0usize;
    while ip < ops.len() {
        let op = ops[ip];
        ip += 1;
        match step(core, bus, &mut frame, op, pc, next_pc) {
            StepOut::Next => {}
            StepOut::Goto(label) => ip = frame.labels[label as usize],
            StepOut::Stop => return Exec::Jumped,
        }
    }
    Exec::Continue
}

enum StepOut {
    Next,
    Goto(u16),
    Stop,
}

fn read_reg(core: &Core, frame: &Frame, r: Reg, pc: u32) -> u32 {
    match r {
        Reg::R(n) => core.state.reg(n),
        Reg::PcVal => pc.wrapping_add(4),
        Reg::Temp(i) => frame.temps[i as usize],
        Reg::S(n) => core.state.vfp[n as usize],
        Reg::ExclTag => core.state.exclusive_tag,
    }
}

fn write_reg(core: &mut Core, frame: &mut Frame, r: Reg, value: u32) {
    match r {
        Reg::R(n) => {
            debug_assert_ne!(n, REG_PC, "the op stream never writes the PC directly");
            core.state.set_reg(n, value);
        }
        Reg::PcVal => unreachable!("PcVal is read-only"),
        Reg::Temp(i) => frame.temps[i as usize] = value,
        Reg::S(n) => core.state.vfp[n as usize] = value,
        Reg::ExclTag => core.state.exclusive_tag = value,
    }
}

fn read_operand(core: &Core, frame: &Frame, op: Operand, pc: u32) -> u32 {
    match op {
        Operand::Reg(r) => read_reg(core, frame, r, pc),
        Operand::Imm(v) => v,
    }
}

fn read_flag(core: &mut Core, frame: &Frame, f: FlagRef) -> bool {
    let state = &mut core.state;
    match f {
        FlagRef::Temp(i) => frame.temps[i as usize] != 0,
        FlagRef::N => state.flags.n,
        FlagRef::Z => state.flags.z,
        FlagRef::C => state.flags.c,
        FlagRef::V => state.flags.v,
        FlagRef::Hi => {
            let flags = state.flags;
            state.derived.hi(&flags)
        }
        FlagRef::Lt => {
            let flags = state.flags;
            state.derived.lt(&flags)
        }
        FlagRef::Le => {
            let flags = state.flags;
            state.derived.le(&flags)
        }
    }
}

/// Apply an integer result's flag effect.
fn apply_flags(core: &mut Core, flags: FlagsOp, result: u32, carry: bool, overflow: bool) {
    let f = &mut core.state.flags;
    match flags {
        FlagsOp::None => return,
        FlagsOp::ZnCv | FlagsOp::ZnBv => {
            f.n = result & 0x8000_0000 != 0;
            f.z = result == 0;
            f.c = carry;
            f.v = overflow;
            core.state.derived.invalidate_for(FlagWrites::NZCV);
        }
        FlagsOp::Zn => {
            f.n = result & 0x8000_0000 != 0;
            f.z = result == 0;
            core.state.derived.invalidate_for(FlagWrites::NZ);
        }
        FlagsOp::ZnCOut => {
            f.n = result & 0x8000_0000 != 0;
            f.z = result == 0;
            f.c = carry;
            core.state.derived.invalidate_for(FlagWrites {
                n: true,
                z: true,
                c: true,
                v: false,
            });
        }
        FlagsOp::COut => {
            f.c = carry;
            core.state.derived.invalidate_for(FlagWrites::C);
        }
        FlagsOp::QOverflow => {
            if overflow {
                f.q = true;
            }
        }
    }
}

/// Integer binop evaluation: result plus carry/overflow candidates.
fn eval_binop(core: &mut Core, op: Binop, a: u32, b: u32) -> (u32, bool, bool) {
    let c_in = core.state.flags.c;
    match op {
        Binop::Add => {
            let (r, c) = a.overflowing_add(b);
            let v = ((a ^ r) & (b ^ r)) & 0x8000_0000 != 0;
            (r, c, v)
        }
        Binop::Adc => {
            let cin = c_in as u32;
            let r = a.wrapping_add(b).wrapping_add(cin);
            let c = (a as u64 + b as u64 + cin as u64) > u32::MAX as u64;
            let v = ((a ^ r) & (b ^ r)) & 0x8000_0000 != 0;
            (r, c, v)
        }
        Binop::Sub => {
            let (r, borrow) = a.overflowing_sub(b);
            let v = ((a ^ b) & (a ^ r)) & 0x8000_0000 != 0;
            (r, !borrow, v)
        }
        Binop::Sbb => {
            let bin = !c_in as u32;
            let r = a.wrapping_sub(b).wrapping_sub(bin);
            let borrow = (b as u64 + bin as u64) > a as u64;
            let v = ((a ^ b) & (a ^ r)) & 0x8000_0000 != 0;
            (r, !borrow, v)
        }
        Binop::Rsub => {
            let (r, borrow) = b.overflowing_sub(a);
            let v = ((b ^ a) & (b ^ r)) & 0x8000_0000 != 0;
            (r, !borrow, v)
        }
        Binop::And => (a & b, false, false),
        Binop::Andn => (a & !b, false, false),
        Binop::Or => (a | b, false, false),
        Binop::Orn => (a | !b, false, false),
        Binop::Xor => (a ^ b, false, false),
        Binop::Mul => (a.wrapping_mul(b), false, false),
        Binop::Shl => {
            let n = b & 0xff;
            if n == 0 {
                (a, c_in, false)
            } else if n < 32 {
                (a << n, a & (1 << (32 - n)) != 0, false)
            } else if n == 32 {
                (0, a & 1 != 0, false)
            } else {
                (0, false, false)
            }
        }
        Binop::Shr => {
            let n = b & 0xff;
            if n == 0 {
                (a, c_in, false)
            } else if n < 32 {
                (a >> n, a & (1 << (n - 1)) != 0, false)
            } else if n == 32 {
                (0, a & 0x8000_0000 != 0, false)
            } else {
                (0, false, false)
            }
        }
        Binop::Sar => {
            let n = b & 0xff;
            if n == 0 {
                (a, c_in, false)
            } else if n < 32 {
                (((a as i32) >> n) as u32, a & (1 << (n - 1)) != 0, false)
            } else {
                let fill = ((a as i32) >> 31) as u32;
                (fill, a & 0x8000_0000 != 0, false)
            }
        }
        Binop::Ror => {
            let n = b & 0xff;
            if n == 0 {
                (a, c_in, false)
            } else {
                let r = a.rotate_right(n % 32);
                (r, r & 0x8000_0000 != 0, false)
            }
        }
        Binop::Rcr => {
            // rotate right through carry by one (RRX)
            let r = (a >> 1) | ((c_in as u32) << 31);
            (r, a & 1 != 0, false)
        }
        Binop::DivS => {
            let a = a as i32;
            let b = b as i32;
            let r = if b == 0 {
                0
            } else if a == i32::MIN && b == -1 {
                i32::MIN
            } else {
                a / b
            };
            (r as u32, false, false)
        }
        Binop::DivU => (if b == 0 { 0 } else { a / b }, false, false),
        Binop::AddSatS => {
            let (r, sat) = sat_add(a as i32, b as i32);
            if sat {
                core.state.flags.q = true;
            }
            (r as u32, false, false)
        }
        Binop::SubSatS => {
            let (r, sat) = sat_sub(a as i32, b as i32);
            if sat {
                core.state.flags.q = true;
            }
            (r as u32, false, false)
        }
    }
}

fn sat_add(a: i32, b: i32) -> (i32, bool) {
    match a.checked_add(b) {
        Some(r) => (r, false),
        None => (if a < 0 { i32::MIN } else { i32::MAX }, true),
    }
}

fn sat_sub(a: i32, b: i32) -> (i32, bool) {
    match a.checked_sub(b) {
        Some(r) => (r, false),
        None => (if a < 0 { i32::MIN } else { i32::MAX }, true),
    }
}

fn saturate_signed(value: i32, width: u8) -> (i32, bool) {
    let max = (1i64 << (width - 1)) - 1;
    let min = -(1i64 << (width - 1));
    let v = value as i64;
    if v > max {
        (max as i32, true)
    } else if v < min {
        (min as i32, true)
    } else {
        (value, false)
    }
}

fn saturate_unsigned(value: i32, width: u8) -> (u32, bool) {
    let max = if width >= 32 { u32::MAX as i64 } else { (1i64 << width) - 1 };
    let v = value as i64;
    if v > max {
        (max as u32, true)
    } else if v < 0 {
        (0, true)
    } else {
        (value as u32, false)
    }
}

fn effective_access(core: &Core, user: bool) -> MemAccess {
    if user || core.state.in_user_mode() {
        MemAccess::User
    } else {
        MemAccess::Privileged
    }
}

/// Alignment policy check. Returns false (after raising the fault) when the
/// access must not proceed.
fn check_alignment(
    core: &mut Core,
    bus: &mut dyn Bus,
    addr: u32,
    bits: u8,
    strict: bool,
    pc: u32,
) -> bool {
    let misaligned = match bits {
        16 => addr & 1 != 0,
        32 => addr & 3 != 0,
        _ => false,
    };
    if !misaligned {
        return true;
    }
    if strict || core.scs.unalign_trp() {
        core.usage_fault(bus, pc, CFSR_UNALIGNED);
        return false;
    }
    true
}

fn load_value(
    core: &mut Core,
    bus: &mut dyn Bus,
    addr: u32,
    bits: u8,
    sx: bool,
    access: MemAccess,
) -> crate::CoreResult<u32> {
    let raw = match bits {
        8 => bus.read_u8(addr, access)? as u32,
        16 => bus.read_u16(addr, access)? as u32,
        _ => {
            if core.cfg.rotate_unaligned && addr & 3 != 0 {
                // legacy rotated unaligned load
                let aligned = bus.read_u32(addr & !3, access)?;
                aligned.rotate_right(8 * (addr & 3))
            } else {
                bus.read_u32(addr, access)?
            }
        }
    };
    Ok(match (bits, sx) {
        (8, true) => raw as u8 as i8 as i32 as u32,
        (16, true) => raw as u16 as i16 as i32 as u32,
        _ => raw,
    })
}

fn step(
    core: &mut Core,
    bus: &mut dyn Bus,
    frame: &mut Frame,
    op: Op,
    pc: u32,
    next_pc: u32,
) -> StepOut {
    match op {
        Op::Binop { op, rd, ra, rb, flags } => {
            let a = read_operand(core, frame, ra, pc);
            let b = read_operand(core, frame, rb, pc);
            let (r, c, v) = eval_binop(core, op, a, b);
            write_reg(core, frame, rd, r);
            apply_flags(core, flags, r, c, v);
        }
        Op::Unop { op, rd, ra, flags } => {
            let a = read_operand(core, frame, ra, pc);
            let (r, c, v) = match op {
                Unop::Mov => (a, false, false),
                Unop::Not => (!a, false, false),
                Unop::Neg => {
                    let (r, borrow) = 0u32.overflowing_sub(a);
                    let v = (a & r) & 0x8000_0000 != 0;
                    (r, !borrow, v)
                }
                Unop::Rev => (a.swap_bytes(), false, false),
                Unop::Rev16 => {
                    let lo = (a & 0xffff).swap_bytes() >> 16;
                    let hi = (a >> 16).swap_bytes() >> 16;
                    ((hi << 16) | lo, false, false)
                }
                Unop::Revsh => {
                    let lo = ((a & 0xffff) as u16).swap_bytes();
                    (lo as i16 as i32 as u32, false, false)
                }
                Unop::Rbit => (a.reverse_bits(), false, false),
                Unop::Clz => (a.leading_zeros(), false, false),
            };
            write_reg(core, frame, rd, r);
            apply_flags(core, flags, r, c, v);
        }
        Op::Cmp { kind, flag, ra, rb } => {
            let a = read_reg(core, frame, ra, pc);
            let b = read_operand(core, frame, rb, pc);
            let hit = match kind {
                CmpKind::Eq => a == b,
                CmpKind::Ne => a != b,
            };
            frame.temps[flag as usize] = hit as u32;
        }
        Op::Mul64 { signed, lo, hi, ra, rb } => {
            let a = read_reg(core, frame, ra, pc);
            let b = read_reg(core, frame, rb, pc);
            let product = if signed {
                (a as i32 as i64).wrapping_mul(b as i32 as i64) as u64
            } else {
                (a as u64) * (b as u64)
            };
            write_reg(core, frame, lo, product as u32);
            write_reg(core, frame, hi, (product >> 32) as u32);
        }
        Op::Add64 { lo, hi, add_lo, add_hi } => {
            let base = ((read_reg(core, frame, hi, pc) as u64) << 32)
                | read_reg(core, frame, lo, pc) as u64;
            let add = ((read_operand(core, frame, add_hi, pc) as u64) << 32)
                | read_operand(core, frame, add_lo, pc) as u64;
            let r = base.wrapping_add(add);
            write_reg(core, frame, lo, r as u32);
            write_reg(core, frame, hi, (r >> 32) as u32);
        }
        Op::Sub64 { lo, hi, sub_lo, sub_hi } => {
            let base = ((read_reg(core, frame, hi, pc) as u64) << 32)
                | read_reg(core, frame, lo, pc) as u64;
            let sub = ((read_operand(core, frame, sub_hi, pc) as u64) << 32)
                | read_operand(core, frame, sub_lo, pc) as u64;
            let r = base.wrapping_sub(sub);
            write_reg(core, frame, lo, r as u32);
            write_reg(core, frame, hi, (r >> 32) as u32);
        }
        Op::SetCarry(value) => {
            core.state.flags.c = value;
            core.state.derived.invalidate_for(FlagWrites::C);
        }
        Op::SetQ => core.state.flags.q = true,

        Op::Load { bits, sx, rd, base, offset, user, strict_align } => {
            let addr = read_operand(core, frame, base, pc)
                .wrapping_add(read_operand(core, frame, offset, pc));
            if !check_alignment(core, bus, addr, bits, strict_align, pc) {
                return StepOut::Stop;
            }
            let access = effective_access(core, user);
            match load_value(core, bus, addr, bits, sx, access) {
                Ok(v) => write_reg(core, frame, rd, v),
                Err(_) => {
                    core.data_abort(bus, pc, addr, false);
                    return StepOut::Stop;
                }
            }
        }
        Op::Store { bits, rs, base, offset, user, strict_align } => {
            let addr = read_operand(core, frame, base, pc)
                .wrapping_add(read_operand(core, frame, offset, pc));
            if !check_alignment(core, bus, addr, bits, strict_align, pc) {
                return StepOut::Stop;
            }
            let access = effective_access(core, user);
            let value = read_reg(core, frame, rs, pc);
            let outcome = match bits {
                8 => bus.write_u8(addr, value as u8, access),
                16 => bus.write_u16(addr, value as u16, access),
                _ => bus.write_u32(addr, value, access),
            };
            if outcome.is_err() {
                core.data_abort(bus, pc, addr, true);
                return StepOut::Stop;
            }
        }
        Op::TryStore { bits, base, offset, user } => {
            let addr = read_operand(core, frame, base, pc)
                .wrapping_add(read_operand(core, frame, offset, pc));
            let access = effective_access(core, user);
            if bus.probe_write(addr, bits as u32 / 8, access).is_err() {
                core.data_abort(bus, pc, addr, true);
                return StepOut::Stop;
            }
        }

        Op::Label(_) => {}
        Op::JumpLabel(label) => return StepOut::Goto(label),
        Op::CondJumpLabel { flag, if_true, label } => {
            if read_flag(core, frame, flag) == if_true {
                return StepOut::Goto(label);
            }
        }
        Op::EnsureDerived(which) => {
            let flags = core.state.flags;
            match which {
                Derived::Hi => {
                    core.state.derived.hi(&flags);
                }
                Derived::Lt => {
                    core.state.derived.lt(&flags);
                }
                Derived::Le => {
                    core.state.derived.le(&flags);
                }
            }
        }
        Op::InvalidateDerived => core.state.derived.invalidate_all(),

        Op::JumpImm { target, link, cond } => {
            if let Some((flag, if_true)) = cond {
                if read_flag(core, frame, flag) != if_true {
                    return StepOut::Next;
                }
            }
            if let Some(link) = link {
                core.state.set_reg(crate::state::REG_LR, link);
            }
            core.state.clear_it_state();
            core.state.pc = target & !1;
            return StepOut::Stop;
        }
        Op::JumpReg { rs, link, interwork } => {
            let value = read_reg(core, frame, rs, pc);
            if let Some(link) = link {
                core.state.set_reg(crate::state::REG_LR, link);
            }
            core.state.clear_it_state();
            if interwork {
                core.branch_interworking(bus, pc, value);
            } else {
                core.state.pc = value & !1;
            }
            return StepOut::Stop;
        }

        Op::ItAdvance => core.state.advance_it_state(),
        Op::SetItState(state) => core.state.it_state = state,

        Op::ReadSpecial { rd, sysm: which } => {
            let value = core.read_special(which);
            write_reg(core, frame, rd, value);
        }
        Op::WriteSpecial { sysm: which, rs, mask } => {
            let value = read_reg(core, frame, rs, pc);
            core.write_special(which, value, mask);
        }
        Op::Cps { enable, affect_primask, affect_faultmask } => {
            core.change_processor_state(enable, affect_primask, affect_faultmask);
        }
        Op::SysCall(call) => return syscall(core, bus, call, pc, next_pc),

        Op::Parallel16 { add1, add2, exchange, signed, halve, saturate, set_ge, rd, rn, rm } => {
            let n = read_reg(core, frame, rn, pc);
            let m = read_reg(core, frame, rm, pc);
            let r = parallel16(core, n, m, add1, add2, exchange, signed, halve, saturate, set_ge);
            write_reg(core, frame, rd, r);
        }
        Op::Parallel8 { add, signed, halve, saturate, set_ge, rd, rn, rm } => {
            let n = read_reg(core, frame, rn, pc);
            let m = read_reg(core, frame, rm, pc);
            let r = parallel8(core, n, m, add, signed, halve, saturate, set_ge);
            write_reg(core, frame, rd, r);
        }
        Op::Saturate { rd, rs, width, unsigned, lanes16 } => {
            let v = read_reg(core, frame, rs, pc);
            let mut any_sat = false;
            let result = if lanes16 {
                let mut lanes = [0u32; 2];
                for (i, lane) in lanes.iter_mut().enumerate() {
                    let value = ((v >> (16 * i)) as u16 as i16) as i32;
                    if unsigned {
                        let (s, sat) = saturate_unsigned(value, width);
                        any_sat |= sat;
                        *lane = s & 0xffff;
                    } else {
                        let (s, sat) = saturate_signed(value, width);
                        any_sat |= sat;
                        *lane = s as u32 & 0xffff;
                    }
                }
                lanes[0] | (lanes[1] << 16)
            } else if unsigned {
                let (s, sat) = saturate_unsigned(v as i32, width);
                any_sat = sat;
                s
            } else {
                let (s, sat) = saturate_signed(v as i32, width);
                any_sat = sat;
                s as u32
            };
            write_reg(core, frame, rd, result);
            if any_sat {
                core.state.flags.q = true;
            }
        }
        Op::Sel { rd, rn, rm } => {
            let n = read_reg(core, frame, rn, pc);
            let m = read_reg(core, frame, rm, pc);
            let ge = core.state.flags.ge;
            let mut r = 0u32;
            for i in 0..4 {
                let src = if ge & (1 << i) != 0 { n } else { m };
                r |= src & (0xff << (8 * i));
            }
            write_reg(core, frame, rd, r);
        }
        Op::Usad8 { rd, rn, rm, acc } => {
            let n = read_reg(core, frame, rn, pc);
            let m = read_reg(core, frame, rm, pc);
            let mut sum = 0u32;
            for i in 0..4 {
                let a = (n >> (8 * i)) & 0xff;
                let b = (m >> (8 * i)) & 0xff;
                sum += a.abs_diff(b);
            }
            if let Some(acc) = acc {
                sum = sum.wrapping_add(read_reg(core, frame, acc, pc));
            }
            write_reg(core, frame, rd, sum);
        }

        Op::FBinop { op, rd, ra, rb } => {
            let a = f32::from_bits(read_reg(core, frame, ra, pc));
            let b = f32::from_bits(read_reg(core, frame, rb, pc));
            let r = match op {
                FBinop::Add => a + b,
                FBinop::Sub => a - b,
                FBinop::Mul => a * b,
                FBinop::Div => a / b,
            };
            let bits = core.fp_fixup(r);
            write_reg(core, frame, rd, bits);
        }
        Op::FUnop { op, rd, ra } => {
            let a_bits = read_reg(core, frame, ra, pc);
            let bits = match op {
                FUnop::Mov => a_bits,
                // abs and neg are pure sign-bit operations
                FUnop::Abs => a_bits & 0x7fff_ffff,
                FUnop::Neg => a_bits ^ 0x8000_0000,
                FUnop::Sqrt => core.fp_fixup(f32::from_bits(a_bits).sqrt()),
            };
            write_reg(core, frame, rd, bits);
        }
        Op::FMac { rd, ra, rb, negate_product, negate_acc, fused } => {
            let a = f32::from_bits(read_reg(core, frame, ra, pc));
            let b = f32::from_bits(read_reg(core, frame, rb, pc));
            let acc = f32::from_bits(read_reg(core, frame, rd, pc));
            let acc = if negate_acc { -acc } else { acc };
            let r = if fused {
                let a = if negate_product { -a } else { a };
                a.mul_add(b, acc)
            } else {
                let p = a * b;
                let p = if negate_product { -p } else { p };
                acc + p
            };
            let bits = core.fp_fixup(r);
            write_reg(core, frame, rd, bits);
        }
        Op::FCmp { ra, rb, quiet_nan_ok } => {
            let a = f32::from_bits(read_reg(core, frame, ra, pc));
            let b = match rb {
                Operand::Imm(_) => 0.0f32,
                Operand::Reg(r) => f32::from_bits(read_reg(core, frame, r, pc)),
            };
            core.fp_compare(a, b, quiet_nan_ok);
        }
        Op::FCvt { kind, rd, ra } => {
            let raw = read_reg(core, frame, ra, pc);
            let rd_old = read_reg(core, frame, rd, pc);
            let bits = core.fp_convert(kind, raw, rd_old);
            write_reg(core, frame, rd, bits);
        }
    }
    StepOut::Next
}

fn syscall(
    core: &mut Core,
    bus: &mut dyn Bus,
    call: SysCall,
    pc: u32,
    next_pc: u32,
) -> StepOut {
    match call {
        SysCall::UsageFault(reason) => {
            core.usage_fault(bus, pc, reason);
            StepOut::Stop
        }
        SysCall::DivByZero => {
            if core.scs.div_0_trp() {
                core.usage_fault(bus, pc, crate::sysregs::CFSR_DIVBYZERO);
                StepOut::Stop
            } else {
                StepOut::Next
            }
        }
        SysCall::Svc => {
            core.supervisor_call(bus, next_pc);
            StepOut::Stop
        }
        SysCall::Bkpt => {
            core.breakpoint(bus, pc);
            StepOut::Stop
        }
        SysCall::Wfe => {
            core.wait_for_event();
            StepOut::Next
        }
        SysCall::Wfi => {
            core.wait_for_interrupt();
            StepOut::Next
        }
        SysCall::Sev => {
            core.send_event();
            StepOut::Next
        }
        SysCall::Barrier => StepOut::Next,
        SysCall::FpGate => {
            if core.fp_enablement_check(bus, pc) {
                StepOut::Next
            } else {
                StepOut::Stop
            }
        }
        SysCall::FpscrToFlags => {
            let fpscr = core.state.fpscr;
            let f = &mut core.state.flags;
            f.n = fpscr & (1 << 31) != 0;
            f.z = fpscr & (1 << 30) != 0;
            f.c = fpscr & (1 << 29) != 0;
            f.v = fpscr & (1 << 28) != 0;
            core.state.derived.invalidate_for(FlagWrites::NZCV);
            StepOut::Next
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn parallel16(
    core: &mut Core,
    n: u32,
    m: u32,
    add_lo: bool,
    add_hi: bool,
    exchange: bool,
    signed: bool,
    halve: bool,
    saturate: bool,
    set_ge: bool,
) -> u32 {
    let lane = |v: u32, hi: bool| -> i32 {
        let raw = if hi { (v >> 16) as u16 } else { v as u16 };
        if signed {
            raw as i16 as i32
        } else {
            raw as i32
        }
    };
    let (m_lo, m_hi) = if exchange {
        (lane(m, true), lane(m, false))
    } else {
        (lane(m, false), lane(m, true))
    };
    let mut ge = 0u8;
    let mut one = |a: i32, b: i32, add: bool, ge_bits: u8| -> u32 {
        let full = if add { a + b } else { a - b };
        let result = if halve {
            full >> 1
        } else if saturate {
            if signed {
                full.clamp(i16::MIN as i32, i16::MAX as i32)
            } else {
                full.clamp(0, u16::MAX as i32)
            }
        } else {
            full
        };
        if set_ge {
            let hit = if signed { full >= 0 } else { full >= if add { 1 << 16 } else { 0 } };
            if hit {
                ge |= ge_bits;
            }
        }
        result as u32 & 0xffff
    };
    let lo = one(lane(n, false), m_lo, add_lo, 0b0011);
    let hi = one(lane(n, true), m_hi, add_hi, 0b1100);
    if set_ge {
        core.state.flags.ge = ge;
    }
    lo | (hi << 16)
}

fn parallel8(
    core: &mut Core,
    n: u32,
    m: u32,
    add: bool,
    signed: bool,
    halve: bool,
    saturate: bool,
    set_ge: bool,
) -> u32 {
    let mut ge = 0u8;
    let mut out = 0u32;
    for i in 0..4 {
        let a_raw = (n >> (8 * i)) & 0xff;
        let b_raw = (m >> (8 * i)) & 0xff;
        let (a, b) = if signed {
            (a_raw as u8 as i8 as i32, b_raw as u8 as i8 as i32)
        } else {
            (a_raw as i32, b_raw as i32)
        };
        let full = if add { a + b } else { a - b };
        let result = if halve {
            full >> 1
        } else if saturate {
            if signed {
                full.clamp(i8::MIN as i32, i8::MAX as i32)
            } else {
                full.clamp(0, u8::MAX as i32)
            }
        } else {
            full
        };
        let hit = if signed { full >= 0 } else { full >= if add { 1 << 8 } else { 0 } };
        if hit {
            ge |= 1 << i;
        }
        out |= (result as u32 & 0xff) << (8 * i);
    }
    if set_ge {
        core.state.flags.ge = ge;
    }
    out
}
