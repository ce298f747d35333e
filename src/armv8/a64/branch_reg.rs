//! unconditional branch (register): `br`, `blr`, `ret`, `eret`, `drps` and their FEAT_PAuth
//! forms.
//!
//! ```text
//! 1101011 opc op2 op3 Rn op4
//!         |   |   |   |  \- bits 0-4
//!         |   |   |   \---- bits 5-9
//!         |   |   \-------- bits 10-15
//!         |   \------------ bits 16-20, always 0b11111
//!         \---------------- bits 21-24
//! ```
//!
//! nearly all of this table is unallocated. every family handler below ends in an arm that
//! rejects whatever its fields did not match.

#![allow(non_snake_case)]

use crate::armv8::a64::bits::extract;
use crate::armv8::a64::{
    BranchGroup, DecodeError, Instruction, Mnemonic, MnemonicCategory, Operand, Register,
};

const GROUP: BranchGroup = BranchGroup::UnconditionalRegister;

#[derive(Copy, Clone, Debug)]
enum Family {
    Br,
    Bl,
    Ret,
    Eret,
    Drps,
    Unallocated,
}

#[derive(Copy, Clone, Debug)]
struct Fields {
    opc: u32,
    op2: u32,
    op3: u32,
    Rn: u32,
    op4: u32,
}

impl Fields {
    fn of(word: u32) -> Fields {
        Fields {
            opc: extract(word, 21, 4),
            op2: extract(word, 16, 5),
            op3: extract(word, 10, 6),
            Rn: extract(word, 5, 5),
            op4: extract(word, 0, 5),
        }
    }
}

fn unallocated(field: &'static str, value: u32) -> DecodeError {
    DecodeError::Unallocated { group: GROUP, field, value }
}

fn malformed(field: &'static str, expected: u32, value: u32) -> DecodeError {
    DecodeError::MalformedField { group: GROUP, field, expected, value }
}

pub fn unconditional_branch_register(word: u32) -> Result<Instruction, DecodeError> {
    let fields = Fields::of(word);

    if fields.op2 != 0b11111 {
        return Err(unallocated("op2", fields.op2));
    }

    let family = [
        Family::Br,                 // 0000
        Family::Bl,                 // 0001
        Family::Ret,                // 0010
        Family::Unallocated,        // 0011
        Family::Eret,               // 0100
        Family::Drps,               // 0101
        Family::Unallocated,        // 0110
        Family::Unallocated,        // 0111
        Family::Br,                 // 1000, register modifier
        Family::Bl,                 // 1001, register modifier
        Family::Unallocated,        // 1010
        Family::Unallocated,        // 1011
        Family::Unallocated,        // 1100
        Family::Unallocated,        // 1101
        Family::Unallocated,        // 1110
        Family::Unallocated,        // 1111
    ][(fields.opc & 0x0f) as usize];

    match family {
        Family::Br => br_family(&fields),
        Family::Bl => bl_family(&fields),
        Family::Ret => ret_family(&fields),
        Family::Eret => eret_family(&fields),
        Family::Drps => drps_family(&fields),
        Family::Unallocated => Err(unallocated("opc", fields.opc)),
    }
}

fn br_family(fields: &Fields) -> Result<Instruction, DecodeError> {
    let target = Operand::Register(Register::x(fields.Rn));

    let (mnemonic, modifier) = match (fields.opc, fields.op3, fields.op4) {
        (0b0000, 0b000000, 0b00000) => (Mnemonic::BR, None),
        (0b0000, 0b000010, 0b11111) => (Mnemonic::BRAAZ, None),
        (0b0000, 0b000011, 0b11111) => (Mnemonic::BRABZ, None),
        (0b1000, 0b000010, Rm) => (Mnemonic::BRAA, Some(Register::x_or_sp(Rm))),
        (0b1000, 0b000011, Rm) => (Mnemonic::BRAB, Some(Register::x_or_sp(Rm))),
        (0b0000, 0b000000, op4) => {
            return Err(malformed("op4", 0b00000, op4));
        }
        (0b0000, 0b000010, op4) |
        (0b0000, 0b000011, op4) => {
            return Err(malformed("op4", 0b11111, op4));
        }
        (_, op3, _) => {
            return Err(unallocated("op3", op3));
        }
    };

    let inst = Instruction::new(mnemonic, MnemonicCategory::Branch);
    Ok(match modifier {
        Some(Rm) => inst.with_operands(&[target, Operand::Register(Rm)]),
        None => inst.with_operands(&[target]),
    })
}

fn bl_family(fields: &Fields) -> Result<Instruction, DecodeError> {
    let target = Operand::Register(Register::x(fields.Rn));
    let inst = |mnemonic| Instruction::new(mnemonic, MnemonicCategory::Branch);

    match (fields.op3, fields.op4) {
        (0b000000, 0b00000) => Ok(inst(Mnemonic::BLR).with_operands(&[target])),
        (0b000000, op4) => Err(malformed("op4", 0b00000, op4)),
        (0b000010, 0b11111) => Ok(inst(Mnemonic::BLRAAZ).with_operands(&[target])),
        (0b000010, Rm) => {
            Ok(inst(Mnemonic::BLRAA).with_operands(&[target, Operand::Register(Register::x_or_sp(Rm))]))
        }
        (0b000011, 0b11111) => Ok(inst(Mnemonic::BLRABZ).with_operands(&[target])),
        (0b000011, Rm) => {
            Ok(inst(Mnemonic::BLRAB).with_operands(&[target, Operand::Register(Register::x_or_sp(Rm))]))
        }
        (op3, _) => Err(unallocated("op3", op3)),
    }
}

fn ret_family(fields: &Fields) -> Result<Instruction, DecodeError> {
    match fields.op3 {
        0b000000 => {
            if fields.op4 != 0b00000 {
                return Err(malformed("op4", 0b00000, fields.op4));
            }

            let inst = Instruction::new(Mnemonic::RET, MnemonicCategory::Return);
            // the target defaults to x30 when omitted, so x30 is left implicit.
            if fields.Rn == 30 {
                Ok(inst)
            } else {
                Ok(inst.with_operands(&[Operand::Register(Register::x(fields.Rn))]))
            }
        }
        op3 @ 0b000010 |
        op3 @ 0b000011 => {
            if fields.Rn != 0b11111 {
                return Err(malformed("Rn", 0b11111, fields.Rn));
            }
            if fields.op4 != 0b11111 {
                return Err(malformed("op4", 0b11111, fields.op4));
            }

            let mnemonic = if op3 == 0b000010 {
                Mnemonic::RETAA
            } else {
                Mnemonic::RETAB
            };
            Ok(Instruction::new(mnemonic, MnemonicCategory::Return))
        }
        op3 => Err(unallocated("op3", op3)),
    }
}

fn eret_family(fields: &Fields) -> Result<Instruction, DecodeError> {
    if fields.op2 != 0b11111 {
        return Err(unallocated("op2", fields.op2));
    }

    let (mnemonic, expected_op4) = match fields.op3 {
        0b000000 => (Mnemonic::ERET, 0b00000),
        0b000010 => (Mnemonic::ERETAA, 0b11111),
        0b000011 => (Mnemonic::ERETAB, 0b11111),
        op3 => {
            return Err(unallocated("op3", op3));
        }
    };

    if fields.Rn != 0b11111 {
        return Err(malformed("Rn", 0b11111, fields.Rn));
    }
    if fields.op4 != expected_op4 {
        return Err(malformed("op4", expected_op4, fields.op4));
    }

    Ok(Instruction::new(mnemonic, MnemonicCategory::Return))
}

// debug restore process state. only meaningful in debug state, so real code should not contain
// it; op3, Rn and op4 are not checked.
fn drps_family(_fields: &Fields) -> Result<Instruction, DecodeError> {
    Ok(Instruction::new(Mnemonic::DRPS, MnemonicCategory::Unspecified))
}
