// Armlet - ARMv7-M Core Model
// Copyright (C) 2026 Armlet Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Decode-table collision audit.
//!
//! The tables rely on priority plus declaration order to resolve
//! overlapping patterns. Declaration order is a fragile tie-break, so this
//! suite sweeps every 16-bit word and a structured 32-bit corpus and fails
//! if two entries of *different* identity ever tie at the winning
//! priority. While at it, it pins a set of known decodes.

use armlet_core::decode::tables::{table16, table32};

/// All matches at the winning priority must agree on identity.
fn assert_no_ambiguity(word: u32, is32: bool) {
    let table = if is32 { table32() } else { table16() };
    let matches = table.matches(word);
    assert!(!matches.is_empty(), "no match for {word:#010x}");
    let best = matches[0].priority;
    let winner = &matches[0].entry.attrs;
    for m in matches.iter().take_while(|m| m.priority == best) {
        assert!(
            m.entry.attrs.name == winner.name && m.entry.attrs.kind == winner.kind,
            "ambiguous decode for {word:#010x}: {} vs {} at priority {best}",
            winner.name,
            m.entry.attrs.name,
        );
    }
}

#[test]
fn thumb16_exhaustive_sweep() {
    for word in 0u32..=0xffff {
        assert_no_ambiguity(word, false);
    }
}

#[test]
fn thumb16_every_word_decodes() {
    for word in 0u32..=0xffff {
        let entry = table16().lookup(word);
        assert!(!entry.attrs.name.is_empty(), "unnamed entry for {word:#06x}");
    }
}

/// For every 32-bit entry, probe the all-zero, all-one and two checker
/// wildcard fills; every probe word is checked for winner ambiguity
/// against all other entries.
#[test]
fn thumb32_structured_sweep() {
    let fills = [0x0000_0000u32, 0xffff_ffff, 0xaaaa_aaaa, 0x5555_5555];
    let mut words = Vec::new();
    for fill in fills {
        for compiled in table32().all() {
            let word = compiled.value | (fill & !compiled.mask);
            words.push(word);
        }
    }
    words.sort_unstable();
    words.dedup();

    for word in words {
        // only words in the 32-bit encoding space reach the 32-bit table
        let hw1 = (word >> 16) as u16;
        if armlet_core::decode::thumb_instruction_bytes(hw1) != 4 {
            continue;
        }
        assert_no_ambiguity(word, true);
    }
}

#[test]
fn known_decodes_stay_pinned() {
    // 16-bit spot checks
    let cases16 = [
        (0xb500u32, "push"),
        (0xbd00, "pop"),
        (0x4770, "bx"),
        (0x4408, "add"),
        (0xdf00, "svc"),
        (0xbf20, "wfe"),
        (0xb662, "cps"),
        (0xba18, "rev"),
        (0x41c8, "ror"),
        (0x4248, "neg"),
    ];
    for (word, name) in cases16 {
        assert_eq!(table16().lookup(word).attrs.name, name, "{word:#06x}");
    }

    // 32-bit spot checks
    let cases32 = [
        (0xf3bf_8f4fu32, "dsb"),
        (0xf3bf_8f5f, "dmb"),
        (0xf3bf_8f6f, "isb"),
        (0xf3ef_8000, "mrs"),
        (0xf380_8800, "msr"),
        (0xf3af_8000, "nop"),
        (0xe850_0f00, "ldrex"),
        (0xe840_1000, "strex"),
        (0xe8bd_8000, "pop"),
        (0xe92d_4000, "push"),
        (0xfb90_f0f1, "sdiv"),
        (0xfbb0_f0f1, "udiv"),
        (0xf000_9000, "b"),
        (0xf000_d000, "bl"),
        (0xeeb0_0a40, "vmov"),
        (0xee00_0a10, "vmov"),
        (0xed90_0a00, "vldr"),
        (0xecbd_0a01, "vpop"),
    ];
    for (word, name) in cases32 {
        assert_eq!(table32().lookup(word).attrs.name, name, "{word:#010x}");
    }
}

#[test]
fn reserved_encodings_fall_to_terminator() {
    // permanently-undefined 16-bit slot
    assert_eq!(table16().lookup(0xde00).attrs.name, "undef");
    // system-space catch-all in the 32-bit table
    assert_eq!(table32().lookup(0xf7f0_a000).attrs.name, "undef");
}
