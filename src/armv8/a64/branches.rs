//! the immediate-offset branch groups: `b.cond`/`bc.cond`, `b`/`bl`, `cbz`/`cbnz` and
//! `tbz`/`tbnz`.
//!
//! every offset is counted in instructions and comes out as a byte displacement relative to the
//! address of the branch itself.

// field names follow the manual's spelling (`Rt`, `Rn`), as the rest of the decoder does.
#![allow(non_snake_case)]

use crate::armv8::a64::bits::{corrected_sign, extract, sign_extend, test_bit};
use crate::armv8::a64::{
    BranchGroup, ConditionCode, DecodeError, Instruction, Mnemonic, MnemonicCategory, Operand,
    Register,
};

/// `b.cond` and `bc.cond`.
///
/// ```text
/// 0101010 o1 imm19 o0 cond
/// ```
pub fn conditional_branch(word: u32) -> Result<Instruction, DecodeError> {
    if test_bit(word, 24) {
        return Err(DecodeError::ReservedBit {
            group: BranchGroup::ConditionalImmediate,
            field: "o1",
        });
    }

    let imm19 = extract(word, 5, 19);
    let offset = sign_extend((imm19 as u64) << 2, 21, 64);
    let cond = ConditionCode::from_bits(extract(word, 0, 4) as u8);

    let mnemonic = if test_bit(word, 4) {
        Mnemonic::BC
    } else {
        Mnemonic::B
    };

    Ok(Instruction::new(mnemonic, MnemonicCategory::ConditionalBranch)
        .with_condition(cond)
        .with_operands(&[Operand::PCOffset(offset)]))
}

/// `b` and `bl`. every encoding in this group is allocated.
///
/// ```text
/// op 00101 imm26
/// ```
pub fn unconditional_branch(word: u32) -> Result<Instruction, DecodeError> {
    let imm26 = extract(word, 0, 26);
    let offset = sign_extend((imm26 as u64) << 2, 28, 64);

    let mnemonic = if test_bit(word, 31) {
        Mnemonic::BL
    } else {
        Mnemonic::B
    };

    Ok(Instruction::new(mnemonic, MnemonicCategory::Branch)
        .with_operands(&[Operand::PCOffset(offset)]))
}

/// `tbz` and `tbnz`.
///
/// ```text
/// b5 011011 op b40 imm14 Rt
/// ```
///
/// `b5` is both the high bit of the tested bit number and the register width: bits 32 through 63
/// only exist in an x register, and a w register only has bits 0 through 31 to test.
pub fn test_and_branch(word: u32) -> Result<Instruction, DecodeError> {
    let is_64bit = test_bit(word, 31);
    let b40 = extract(word, 19, 5);
    let imm14 = extract(word, 5, 14);
    let Rt = extract(word, 0, 5);

    let bit = if is_64bit { b40 | 0x20 } else { b40 };
    let offset = corrected_sign(imm14 as u64, 14) * 4;

    let mnemonic = if test_bit(word, 24) {
        Mnemonic::TBNZ
    } else {
        Mnemonic::TBZ
    };

    Ok(Instruction::new(mnemonic, MnemonicCategory::ConditionalBranch)
        .with_operands(&[
            Operand::Register(Register::sized(is_64bit, Rt)),
            Operand::Immediate(bit as i64),
            Operand::PCOffset(offset),
        ]))
}

/// `cbz` and `cbnz`.
///
/// ```text
/// sf 011010 op imm19 Rt
/// ```
pub fn compare_and_branch(word: u32) -> Result<Instruction, DecodeError> {
    let sf = test_bit(word, 31);
    let imm19 = extract(word, 5, 19);
    let Rt = extract(word, 0, 5);

    let offset = corrected_sign(imm19 as u64, 19) * 4;

    let mnemonic = if test_bit(word, 24) {
        Mnemonic::CBNZ
    } else {
        Mnemonic::CBZ
    };

    Ok(Instruction::new(mnemonic, MnemonicCategory::ConditionalBranch)
        .with_operands(&[
            Operand::Register(Register::sized(sf, Rt)),
            Operand::PCOffset(offset),
        ]))
}
