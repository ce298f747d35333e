use core::fmt::{self, Display, Formatter};

use yaxpeax_arch::{AddressDiff, LengthedInstruction};

use crate::armv8::a64::ARMv8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Mnemonic {
    Invalid,
    B,
    BL,
    BC,
    TBZ,
    TBNZ,
    CBZ,
    CBNZ,
    BR,
    BRAA,
    BRAB,
    BRAAZ,
    BRABZ,
    BLR,
    BLRAA,
    BLRAB,
    BLRAAZ,
    BLRABZ,
    RET,
    RETAA,
    RETAB,
    ERET,
    ERETAA,
    ERETAB,
    DRPS,
}

impl Mnemonic {
    /// `true` for the FEAT_PAuth forms that authenticate the branch target.
    pub fn is_pauth(&self) -> bool {
        match self {
            Mnemonic::BRAA | Mnemonic::BRAB | Mnemonic::BRAAZ | Mnemonic::BRABZ |
            Mnemonic::BLRAA | Mnemonic::BLRAB | Mnemonic::BLRAAZ | Mnemonic::BLRABZ |
            Mnemonic::RETAA | Mnemonic::RETAB |
            Mnemonic::ERETAA | Mnemonic::ERETAB => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mnemonic::Invalid => "invalid",
            Mnemonic::B => "b",
            Mnemonic::BL => "bl",
            Mnemonic::BC => "bc",
            Mnemonic::TBZ => "tbz",
            Mnemonic::TBNZ => "tbnz",
            Mnemonic::CBZ => "cbz",
            Mnemonic::CBNZ => "cbnz",
            Mnemonic::BR => "br",
            Mnemonic::BRAA => "braa",
            Mnemonic::BRAB => "brab",
            Mnemonic::BRAAZ => "braaz",
            Mnemonic::BRABZ => "brabz",
            Mnemonic::BLR => "blr",
            Mnemonic::BLRAA => "blraa",
            Mnemonic::BLRAB => "blrab",
            Mnemonic::BLRAAZ => "blraaz",
            Mnemonic::BLRABZ => "blrabz",
            Mnemonic::RET => "ret",
            Mnemonic::RETAA => "retaa",
            Mnemonic::RETAB => "retab",
            Mnemonic::ERET => "eret",
            Mnemonic::ERETAA => "eretaa",
            Mnemonic::ERETAB => "eretab",
            Mnemonic::DRPS => "drps",
        }
    }
}

impl Display for Mnemonic {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// coarse control-flow classification for consumers building call graphs or basic blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
pub enum MnemonicCategory {
    Unspecified,
    Branch,
    ConditionalBranch,
    Return,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ConditionCode {
    EQ,
    NE,
    HS,
    LO,
    MI,
    PL,
    VS,
    VC,
    HI,
    LS,
    GE,
    LT,
    GT,
    LE,
    AL,
    NV,
}

impl ConditionCode {
    /// every 4-bit value names a condition; only the low four bits of `bits` are used.
    pub fn from_bits(bits: u8) -> ConditionCode {
        [
            ConditionCode::EQ, ConditionCode::NE, ConditionCode::HS, ConditionCode::LO,
            ConditionCode::MI, ConditionCode::PL, ConditionCode::VS, ConditionCode::VC,
            ConditionCode::HI, ConditionCode::LS, ConditionCode::GE, ConditionCode::LT,
            ConditionCode::GT, ConditionCode::LE, ConditionCode::AL, ConditionCode::NV,
        ][(bits & 0x0f) as usize]
    }

    pub fn bits(&self) -> u8 {
        *self as u8
    }

    /// the opposite condition. `AL` and `NV` both mean "always" and invert into each other.
    pub fn invert(&self) -> ConditionCode {
        ConditionCode::from_bits(self.bits() ^ 1)
    }
}

impl Display for ConditionCode {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(match self {
            ConditionCode::EQ => "eq",
            ConditionCode::NE => "ne",
            ConditionCode::HS => "hs",
            ConditionCode::LO => "lo",
            ConditionCode::MI => "mi",
            ConditionCode::PL => "pl",
            ConditionCode::VS => "vs",
            ConditionCode::VC => "vc",
            ConditionCode::HI => "hi",
            ConditionCode::LS => "ls",
            ConditionCode::GE => "ge",
            ConditionCode::LT => "lt",
            ConditionCode::GT => "gt",
            ConditionCode::LE => "le",
            ConditionCode::AL => "al",
            ConditionCode::NV => "nv",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Register {
    X0, X1, X2, X3, X4, X5, X6, X7,
    X8, X9, X10, X11, X12, X13, X14, X15,
    X16, X17, X18, X19, X20, X21, X22, X23,
    X24, X25, X26, X27, X28, X29, X30, XZR,
    W0, W1, W2, W3, W4, W5, W6, W7,
    W8, W9, W10, W11, W12, W13, W14, W15,
    W16, W17, W18, W19, W20, W21, W22, W23,
    W24, W25, W26, W27, W28, W29, W30, WZR,
    SP,
}

// register number 31 is the zero register here; `x_or_sp` covers the operands where it is sp.
const X_REGISTERS: [Register; 32] = [
    Register::X0, Register::X1, Register::X2, Register::X3,
    Register::X4, Register::X5, Register::X6, Register::X7,
    Register::X8, Register::X9, Register::X10, Register::X11,
    Register::X12, Register::X13, Register::X14, Register::X15,
    Register::X16, Register::X17, Register::X18, Register::X19,
    Register::X20, Register::X21, Register::X22, Register::X23,
    Register::X24, Register::X25, Register::X26, Register::X27,
    Register::X28, Register::X29, Register::X30, Register::XZR,
];

const W_REGISTERS: [Register; 32] = [
    Register::W0, Register::W1, Register::W2, Register::W3,
    Register::W4, Register::W5, Register::W6, Register::W7,
    Register::W8, Register::W9, Register::W10, Register::W11,
    Register::W12, Register::W13, Register::W14, Register::W15,
    Register::W16, Register::W17, Register::W18, Register::W19,
    Register::W20, Register::W21, Register::W22, Register::W23,
    Register::W24, Register::W25, Register::W26, Register::W27,
    Register::W28, Register::W29, Register::W30, Register::WZR,
];

impl Register {
    /// the 64-bit register for a 5-bit register field. only the low five bits are used.
    pub fn x(num: u32) -> Register {
        X_REGISTERS[(num & 0x1f) as usize]
    }

    /// the 32-bit register for a 5-bit register field. only the low five bits are used.
    pub fn w(num: u32) -> Register {
        W_REGISTERS[(num & 0x1f) as usize]
    }

    /// register number 31 as the stack pointer, as in pointer-authentication modifier operands.
    pub fn x_or_sp(num: u32) -> Register {
        match num & 0x1f {
            31 => Register::SP,
            n => Register::x(n),
        }
    }

    pub fn sized(is_64bit: bool, num: u32) -> Register {
        if is_64bit {
            Register::x(num)
        } else {
            Register::w(num)
        }
    }

    pub fn is_64bit(&self) -> bool {
        *self == Register::SP || (*self as u8) < 32
    }

    /// the register's encoding number, 31 for the zero register and the stack pointer.
    pub fn number(&self) -> u8 {
        match self {
            Register::SP => 31,
            _ => (*self as u8) & 0x1f,
        }
    }
}

impl Display for Register {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        if *self == Register::SP {
            return fmt.write_str("sp");
        }
        match (self.is_64bit(), self.number()) {
            (true, 31) => fmt.write_str("xzr"),
            (false, 31) => fmt.write_str("wzr"),
            (true, n) => write!(fmt, "x{}", n),
            (false, n) => write!(fmt, "w{}", n),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
pub enum OperandKind {
    None,
    Register,
    Immediate,
    ImmediatePcRelative,
}

/// an operand slot. the variant is the operand's kind, so a kind can never be set without its
/// value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
pub enum Operand {
    Nothing,
    Register(Register),
    Immediate(i64),
    /// byte displacement from the address of the instruction itself.
    PCOffset(i64),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Nothing => OperandKind::None,
            Operand::Register(_) => OperandKind::Register,
            Operand::Immediate(_) => OperandKind::Immediate,
            Operand::PCOffset(_) => OperandKind::ImmediatePcRelative,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="use-serde", derive(Serialize, Deserialize))]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    /// only set for `b.cond` and `bc.cond`.
    pub condition_code: Option<ConditionCode>,
    pub operands: [Operand; 3],
    pub mnemonic_category: MnemonicCategory,
}

impl Instruction {
    pub(crate) fn new(mnemonic: Mnemonic, mnemonic_category: MnemonicCategory) -> Instruction {
        Instruction {
            mnemonic,
            condition_code: None,
            operands: [Operand::Nothing, Operand::Nothing, Operand::Nothing],
            mnemonic_category,
        }
    }

    pub(crate) fn with_operands(mut self, operands: &[Operand]) -> Instruction {
        debug_assert!(operands.len() <= self.operands.len());
        for (slot, op) in self.operands.iter_mut().zip(operands.iter()) {
            *slot = *op;
        }
        self
    }

    pub(crate) fn with_condition(mut self, condition: ConditionCode) -> Instruction {
        self.condition_code = Some(condition);
        self
    }

    pub fn operand_count(&self) -> usize {
        self.operands.iter().take_while(|op| **op != Operand::Nothing).count()
    }

    /// the absolute branch target for an instruction at `address`, if the instruction carries a
    /// pc-relative operand. register-indirect branches have no static target.
    pub fn branch_target(&self, address: u64) -> Option<u64> {
        self.operands.iter().find_map(|op| match op {
            Operand::PCOffset(offset) => Some(address.wrapping_add(*offset as u64)),
            _ => None,
        })
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Instruction::new(Mnemonic::Invalid, MnemonicCategory::Unspecified)
    }
}

impl yaxpeax_arch::Instruction for Instruction {
    fn well_defined(&self) -> bool { self.mnemonic != Mnemonic::Invalid }
}

impl LengthedInstruction for Instruction {
    type Unit = AddressDiff<<ARMv8 as yaxpeax_arch::Arch>::Address>;
    fn min_size() -> Self::Unit {
        AddressDiff::from_const(4)
    }
    fn len(&self) -> Self::Unit {
        AddressDiff::from_const(4)
    }
}
