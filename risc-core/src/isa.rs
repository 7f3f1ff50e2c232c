//! Definitions shared by the translator and the simulator: the opcode set,
//! the addressing-mode tags, the machine-word shapes, and the process-wide
//! constants. Everything the two tools must agree on lives here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of addressable memory cells.
pub const MEMORY_SIZE: usize = 1_048_567;

/// Largest representable machine number.
pub const MAX_NUMBER: i32 = i32::MAX;

/// Smallest representable machine number.
pub const MIN_NUMBER: i32 = i32::MIN;

/// Port the `in` instruction reads from.
pub const INPUT_PORT_ADDRESS: i32 = 0;

/// Port the `out` instruction writes to.
pub const OUTPUT_PORT_ADDRESS: i32 = 1;

/// Number of general-purpose registers (`r0`..`r12`).
pub const GENERAL_REGISTER_COUNT: usize = 13;

/// The closed set of operation mnemonics. The lowercase mnemonic is the
/// canonical spelling in both assembly source and serialized machine code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Load,
    Store,
    Add,
    Sub,
    Mod,
    Inc,
    Cmp,
    Di,
    Ei,
    In,
    Out,
    Jz,
    Jnz,
    Jmp,
    Move,
    Halt,
    Iret,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mod => "mod",
            Opcode::Inc => "inc",
            Opcode::Cmp => "cmp",
            Opcode::Di => "di",
            Opcode::Ei => "ei",
            Opcode::In => "in",
            Opcode::Out => "out",
            Opcode::Jz => "jz",
            Opcode::Jnz => "jnz",
            Opcode::Jmp => "jmp",
            Opcode::Move => "move",
            Opcode::Halt => "halt",
            Opcode::Iret => "iret",
        }
    }

    pub fn from_mnemonic(string: &str) -> Option<Opcode> {
        let opcode = match string {
            "load" => Opcode::Load,
            "store" => Opcode::Store,
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "mod" => Opcode::Mod,
            "inc" => Opcode::Inc,
            "cmp" => Opcode::Cmp,
            "di" => Opcode::Di,
            "ei" => Opcode::Ei,
            "in" => Opcode::In,
            "out" => Opcode::Out,
            "jz" => Opcode::Jz,
            "jnz" => Opcode::Jnz,
            "jmp" => Opcode::Jmp,
            "move" => Opcode::Move,
            "halt" => Opcode::Halt,
            "iret" => Opcode::Iret,
            _ => return None,
        };
        Some(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Addressing-mode tag carried by every encoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    Direct,   // 0
    Indirect, // 1
    Register, // 2
    None,     // 3
    Port,     // 4
}

impl AddrMode {
    /// The integer tag used in the serialized form.
    pub fn tag(self) -> u8 {
        match self {
            AddrMode::Direct => 0,
            AddrMode::Indirect => 1,
            AddrMode::Register => 2,
            AddrMode::None => 3,
            AddrMode::Port => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<AddrMode> {
        let mode = match tag {
            0 => AddrMode::Direct,
            1 => AddrMode::Indirect,
            2 => AddrMode::Register,
            3 => AddrMode::None,
            4 => AddrMode::Port,
            _ => return None,
        };
        Some(mode)
    }
}

/// Provenance attached to each record: the record index it was encoded at
/// and the label its operand resolved through, if any. Tracing only; no
/// runtime semantics. Serialized as a `[index, label]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, String)", into = "(usize, String)")]
pub struct Term {
    pub index: usize,
    pub related_label: String,
}

impl Term {
    pub fn new(index: usize, related_label: &str) -> Term {
        Term {
            index,
            related_label: related_label.to_string(),
        }
    }
}

impl From<(usize, String)> for Term {
    fn from((index, related_label): (usize, String)) -> Term {
        Term {
            index,
            related_label,
        }
    }
}

impl From<Term> for (usize, String) {
    fn from(term: Term) -> (usize, String) {
        (term.index, term.related_label)
    }
}

/// Condition selector for the conditional jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Zero,    // jz
    NotZero, // jnz
}

/// Source of a `move`: another general register or an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSrc {
    Register(u8),
    Immediate(i32),
}

/// One decoded instruction. The serialized form is a heterogeneous map;
/// the codec mediates between that shape and these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `load rD, X` / `load rD, (X)`: memory to register.
    Load { reg: u8, addr: usize, mode: AddrMode },
    /// `store rS, X` / `store rS, (X)`: register to memory.
    Store { reg: u8, addr: usize, mode: AddrMode },
    /// `add/sub/mod rD, rA, rB`: three-register arithmetic.
    Binary { op: Opcode, dst: u8, lhs: u8, rhs: u8 },
    /// `cmp rA, rB`: flags only.
    Cmp { lhs: u8, rhs: u8 },
    /// `inc rX`.
    Inc { reg: u8 },
    /// `jmp label`.
    Jmp { target: usize },
    /// `jz label` / `jnz label`.
    Jcc { cond: Cond, target: usize },
    /// `move rD, rS` / `move rD, #N`.
    Move { dst: u8, src: MoveSrc },
    /// `in rD, P`.
    In { reg: u8, port: i32 },
    /// `out rS, P`.
    Out { reg: u8, port: i32 },
    Di,
    Ei,
    Halt,
    Iret,
}

impl Instruction {
    /// The mnemonic family this record belongs to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Load { .. } => Opcode::Load,
            Instruction::Store { .. } => Opcode::Store,
            Instruction::Binary { op, .. } => *op,
            Instruction::Cmp { .. } => Opcode::Cmp,
            Instruction::Inc { .. } => Opcode::Inc,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Jcc {
                cond: Cond::Zero, ..
            } => Opcode::Jz,
            Instruction::Jcc {
                cond: Cond::NotZero,
                ..
            } => Opcode::Jnz,
            Instruction::Move { .. } => Opcode::Move,
            Instruction::In { .. } => Opcode::In,
            Instruction::Out { .. } => Opcode::Out,
            Instruction::Di => Opcode::Di,
            Instruction::Ei => Opcode::Ei,
            Instruction::Halt => Opcode::Halt,
            Instruction::Iret => Opcode::Iret,
        }
    }

    /// The addressing-mode tag this record is encoded with.
    pub fn addr_mode(&self) -> AddrMode {
        match self {
            Instruction::Load { mode, .. } | Instruction::Store { mode, .. } => *mode,
            Instruction::Binary { .. } | Instruction::Cmp { .. } | Instruction::Inc { .. } => {
                AddrMode::Register
            }
            Instruction::Move {
                src: MoveSrc::Register(_),
                ..
            } => AddrMode::Register,
            Instruction::Move {
                src: MoveSrc::Immediate(_),
                ..
            } => AddrMode::Direct,
            Instruction::Jmp { .. } | Instruction::Jcc { .. } => AddrMode::Direct,
            Instruction::In { .. } | Instruction::Out { .. } => AddrMode::Port,
            Instruction::Di | Instruction::Ei | Instruction::Halt | Instruction::Iret => {
                AddrMode::None
            }
        }
    }
}

/// One record of a translated program, in translation order.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineWord {
    Instruction { instr: Instruction, term: Term },
    Data { value: i32, term: Term },
    /// The interrupt-vector trailer; `None` when the program has no handler.
    Vector { handler: Option<usize> },
}

/// One memory cell at run time. Program words drop their provenance when
/// loaded; `Empty` cells read as data zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MemCell {
    #[default]
    Empty,
    Data(i32),
    Instr(Box<Instruction>),
    Vector(Option<usize>),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mnemonics_round_trip() {
        for opcode in [
            Opcode::Load,
            Opcode::Store,
            Opcode::Add,
            Opcode::Sub,
            Opcode::Mod,
            Opcode::Inc,
            Opcode::Cmp,
            Opcode::Di,
            Opcode::Ei,
            Opcode::In,
            Opcode::Out,
            Opcode::Jz,
            Opcode::Jnz,
            Opcode::Jmp,
            Opcode::Move,
            Opcode::Halt,
            Opcode::Iret,
        ] {
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        }
        assert_eq!(Opcode::from_mnemonic("nop"), None);
    }

    #[test]
    fn addressing_tags_round_trip() {
        for (mode, tag) in [
            (AddrMode::Direct, 0),
            (AddrMode::Indirect, 1),
            (AddrMode::Register, 2),
            (AddrMode::None, 3),
            (AddrMode::Port, 4),
        ] {
            assert_eq!(mode.tag(), tag);
            assert_eq!(AddrMode::from_tag(tag), Some(mode));
        }
        assert_eq!(AddrMode::from_tag(5), None);
    }

    #[test]
    fn conditional_jumps_pick_their_mnemonic() {
        let jz = Instruction::Jcc {
            cond: Cond::Zero,
            target: 4,
        };
        let jnz = Instruction::Jcc {
            cond: Cond::NotZero,
            target: 4,
        };
        assert_eq!(jz.opcode(), Opcode::Jz);
        assert_eq!(jnz.opcode(), Opcode::Jnz);
    }
}
