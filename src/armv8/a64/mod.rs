//! decoding for the aarch64 branch-class encoding groups: conditional branch (immediate),
//! unconditional branch (immediate), compare and branch, test and branch, and unconditional
//! branch (register), including the FEAT_PAuth forms of the latter.
//!
//! group and field names follow the ARMv8-A Architecture Reference Manual, section C4.1.65
//! ("Branches, Exception Generating and System instructions").

use core::fmt;

use yaxpeax_arch::{Arch, Decoder, Reader, ReadError};

pub mod bits;
pub mod branches;
pub mod branch_reg;
mod instruction;

pub use self::instruction::{
    ConditionCode, Instruction, Mnemonic, MnemonicCategory, Operand, OperandKind, Register,
};
pub use self::branches::{
    compare_and_branch, conditional_branch, test_and_branch, unconditional_branch,
};
pub use self::branch_reg::unconditional_branch_register;

use self::bits::extract;

/// the top-level encoding groups this crate decodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BranchGroup {
    ConditionalImmediate,
    UnconditionalImmediate,
    CompareAndBranch,
    TestAndBranch,
    UnconditionalRegister,
}

impl BranchGroup {
    /// the branch group `word` belongs to, or `None` if it is some other kind of instruction.
    pub fn classify(word: u32) -> Option<BranchGroup> {
        /*
         * 0101010- -------- -------- --------  conditional branch (immediate)
         * -00101-- -------- -------- --------  unconditional branch (immediate)
         * -011010- -------- -------- --------  compare and branch (immediate)
         * -011011- -------- -------- --------  test and branch (immediate)
         * 1101011- -------- -------- --------  unconditional branch (register)
         */
        match extract(word, 25, 7) {
            0b0101010 => return Some(BranchGroup::ConditionalImmediate),
            0b1101011 => return Some(BranchGroup::UnconditionalRegister),
            _ => {}
        }
        if extract(word, 26, 5) == 0b00101 {
            return Some(BranchGroup::UnconditionalImmediate);
        }
        match extract(word, 25, 6) {
            0b011010 => Some(BranchGroup::CompareAndBranch),
            0b011011 => Some(BranchGroup::TestAndBranch),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BranchGroup::ConditionalImmediate => "conditional branch (immediate)",
            BranchGroup::UnconditionalImmediate => "unconditional branch (immediate)",
            BranchGroup::CompareAndBranch => "compare and branch (immediate)",
            BranchGroup::TestAndBranch => "test and branch (immediate)",
            BranchGroup::UnconditionalRegister => "unconditional branch (register)",
        }
    }

    /// decode `word` as a member of this group, without checking that it actually is one.
    pub fn decode(&self, word: u32) -> Result<Instruction, DecodeError> {
        match self {
            BranchGroup::ConditionalImmediate => conditional_branch(word),
            BranchGroup::UnconditionalImmediate => unconditional_branch(word),
            BranchGroup::CompareAndBranch => compare_and_branch(word),
            BranchGroup::TestAndBranch => test_and_branch(word),
            BranchGroup::UnconditionalRegister => unconditional_branch_register(word),
        }
    }
}

impl fmt::Display for BranchGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ExhaustedInput,
    NotBranch,
    ReservedBitViolation,
    UnallocatedEncoding,
    MalformedFixedField,
}

/// why a word did not decode. every variant other than `ExhaustedInput` means the word is not a
/// valid instruction for the decoder's configuration; none of them are recoverable for that word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    ExhaustedInput,
    /// the word is not in any branch-class encoding group.
    NotBranch,
    /// a bit that must be zero was set.
    ReservedBit { group: BranchGroup, field: &'static str },
    /// a field holds a value with no assigned encoding.
    Unallocated { group: BranchGroup, field: &'static str, value: u32 },
    /// a field that must hold a specific constant held something else.
    MalformedField { group: BranchGroup, field: &'static str, expected: u32, value: u32 },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::ExhaustedInput => ErrorKind::ExhaustedInput,
            DecodeError::NotBranch => ErrorKind::NotBranch,
            DecodeError::ReservedBit { .. } => ErrorKind::ReservedBitViolation,
            DecodeError::Unallocated { .. } => ErrorKind::UnallocatedEncoding,
            DecodeError::MalformedField { .. } => ErrorKind::MalformedFixedField,
        }
    }

    /// the group the offending word was decoded as, if it got that far.
    pub fn group(&self) -> Option<BranchGroup> {
        match self {
            DecodeError::ExhaustedInput |
            DecodeError::NotBranch => None,
            DecodeError::ReservedBit { group, .. } |
            DecodeError::Unallocated { group, .. } |
            DecodeError::MalformedField { group, .. } => Some(*group),
        }
    }

    /// the manual's name for the offending field, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DecodeError::ExhaustedInput |
            DecodeError::NotBranch => None,
            DecodeError::ReservedBit { field, .. } |
            DecodeError::Unallocated { field, .. } |
            DecodeError::MalformedField { field, .. } => Some(*field),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f:  &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::ExhaustedInput |
            DecodeError::NotBranch => {
                f.write_str(<Self as yaxpeax_arch::DecodeError>::description(self))
            }
            DecodeError::ReservedBit { group, field } => {
                write!(f, "{}: reserved bit {} is set", group, field)
            }
            DecodeError::Unallocated { group, field, value } => {
                write!(f, "{}: unallocated {} = {:#b}", group, field, value)
            }
            DecodeError::MalformedField { group, field, expected, value } => {
                write!(f, "{}: {} must be {:#b}, was {:#b}", group, field, expected, value)
            }
        }
    }
}

#[cfg(feature = "std")]
extern crate std;
#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

impl From<ReadError> for DecodeError {
    fn from(_e: ReadError) -> DecodeError {
        DecodeError::ExhaustedInput
    }
}

impl yaxpeax_arch::DecodeError for DecodeError {
    fn data_exhausted(&self) -> bool { self == &DecodeError::ExhaustedInput }
    fn bad_opcode(&self) -> bool {
        match self.kind() {
            ErrorKind::NotBranch |
            ErrorKind::ReservedBitViolation |
            ErrorKind::UnallocatedEncoding => true,
            _ => false,
        }
    }
    fn bad_operand(&self) -> bool { self.kind() == ErrorKind::MalformedFixedField }
    fn description(&self) -> &'static str {
        match self.kind() {
            ErrorKind::ExhaustedInput => "exhausted input",
            ErrorKind::NotBranch => "not a branch instruction",
            ErrorKind::ReservedBitViolation => "reserved bit set",
            ErrorKind::UnallocatedEncoding => "unallocated encoding",
            ErrorKind::MalformedFixedField => "malformed fixed field",
        }
    }
}

#[cfg(feature="use-serde")]
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ARMv8 { }

#[cfg(not(feature="use-serde"))]
#[derive(Copy, Clone, Debug)]
pub struct ARMv8 { }

impl Arch for ARMv8 {
    type Word = u8;
    type Address = u64;
    type Instruction = Instruction;
    type DecodeError = DecodeError;
    type Decoder = InstDecoder;
    type Operand = Operand;
}

/// a branch decoder. by default every supported extension is accepted; turning one off makes its
/// encodings decode as unallocated, as they would on a core without the feature.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InstDecoder {
    pauth: bool,
    hbc: bool,
}

impl Default for InstDecoder {
    fn default() -> Self {
        InstDecoder {
            pauth: true,
            hbc: true,
        }
    }
}

impl InstDecoder {
    /// a decoder for the ARMv8.0-A base set only: no pointer authentication, no `bc.cond`.
    pub fn minimal() -> Self {
        InstDecoder {
            pauth: false,
            hbc: false,
        }
    }

    /// accept FEAT_PAuth branches (`braa`, `blraaz`, `retab`, `eretaa`, ...).
    pub fn with_pauth(mut self, pauth: bool) -> Self {
        self.pauth = pauth;
        self
    }

    /// accept FEAT_HBC `bc.cond`.
    pub fn with_hbc(mut self, hbc: bool) -> Self {
        self.hbc = hbc;
        self
    }

    pub fn pauth(&self) -> bool {
        self.pauth
    }

    pub fn hbc(&self) -> bool {
        self.hbc
    }

    /// decode one instruction word.
    pub fn decode_word(&self, word: u32) -> Result<Instruction, DecodeError> {
        let group = BranchGroup::classify(word).ok_or(DecodeError::NotBranch)?;

        // without FEAT_PAuth, op3 = 0b00001x and the opc = 100x modifier forms are unallocated
        // regardless of Rn and op4.
        if !self.pauth && group == BranchGroup::UnconditionalRegister {
            let op3 = extract(word, 10, 6);
            if extract(word, 16, 5) == 0b11111 {
                match (extract(word, 21, 4), op3) {
                    (0b0000, 0b000010) | (0b0000, 0b000011) |
                    (0b0001, 0b000010) | (0b0001, 0b000011) |
                    (0b0010, 0b000010) | (0b0010, 0b000011) |
                    (0b0100, 0b000010) | (0b0100, 0b000011) |
                    (0b1000, _) |
                    (0b1001, _) => {
                        return Err(DecodeError::Unallocated { group, field: "op3", value: op3 });
                    }
                    _ => {}
                }
            }
        }

        let inst = group.decode(word)?;

        if !self.hbc && inst.mnemonic == Mnemonic::BC {
            return Err(DecodeError::Unallocated {
                group,
                field: "o0",
                value: 1,
            });
        }

        Ok(inst)
    }
}

impl Decoder<ARMv8> for InstDecoder {
    fn decode_into<T: Reader<<ARMv8 as Arch>::Address, <ARMv8 as Arch>::Word>>(&self, inst: &mut Instruction, words: &mut T) -> Result<(), <ARMv8 as Arch>::DecodeError> {
        let mut word_bytes = [0u8; 4];
        words.next_n(&mut word_bytes)?;
        let word = u32::from_le_bytes(word_bytes);

        match self.decode_word(word) {
            Ok(decoded) => {
                *inst = decoded;
                Ok(())
            }
            Err(e) => {
                trace!("rejected {:#010x}: {}", word, e);
                *inst = Instruction::default();
                Err(e)
            }
        }
    }
}
