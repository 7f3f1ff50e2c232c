//! Machine-code codec: the JSON-array wire format shared by the translator
//! and the simulator. The file is a JSON array with one record per line
//! (`[` first, records joined by `,\n `, `]` last).
//!
//! On disk every record is a flat map (`opcode`, `reg`, `op`, `op1`..`op3`,
//! `addrType`, `term`, `data`, `int1`); in memory it is the
//! [`MachineWord`] sum type. The private [`RawWord`] struct mediates
//! between the two shapes.

use crate::isa::{AddrMode, Cond, Instruction, MachineWord, MoveSrc, Opcode, Term};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeError {
    #[error("failed to read or write the code file: {0}")]
    Io(#[from] std::io::Error),

    #[error("the code file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed record {index}: {reason}")]
    Malformed { index: usize, reason: String },
}

/// The on-disk shape of one record. Field order here is the field order in
/// the serialized output. Keys unknown to this shape are ignored on read.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    opcode: Option<Opcode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reg: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op1: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op2: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op3: Option<i64>,
    #[serde(rename = "addrType", default, skip_serializing_if = "Option::is_none")]
    addr_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    term: Option<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    int1: Option<VectorCell>,
}

/// The `int1` field holds the handler address, or the string `"-"` when the
/// program was translated without a handler.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum VectorCell {
    Address(i64),
    Missing(String),
}

impl From<&MachineWord> for RawWord {
    fn from(word: &MachineWord) -> RawWord {
        let mut raw = RawWord::default();
        match word {
            MachineWord::Instruction { instr, term } => {
                raw.opcode = Some(instr.opcode());
                raw.addr_type = Some(instr.addr_mode().tag());
                raw.term = Some(term.clone());
                match instr {
                    Instruction::Load { reg, addr, .. }
                    | Instruction::Store { reg, addr, .. } => {
                        raw.reg = Some(i64::from(*reg));
                        raw.op = Some(*addr as i64);
                    }
                    Instruction::Binary { dst, lhs, rhs, .. } => {
                        raw.op1 = Some(i64::from(*dst));
                        raw.op2 = Some(i64::from(*lhs));
                        raw.op3 = Some(i64::from(*rhs));
                    }
                    Instruction::Cmp { lhs, rhs } => {
                        raw.op1 = Some(i64::from(*lhs));
                        raw.op2 = Some(i64::from(*rhs));
                    }
                    Instruction::Inc { reg } => {
                        raw.op = Some(i64::from(*reg));
                    }
                    Instruction::Jmp { target } | Instruction::Jcc { target, .. } => {
                        raw.op = Some(*target as i64);
                    }
                    Instruction::Move { dst, src } => {
                        raw.reg = Some(i64::from(*dst));
                        raw.op = Some(match src {
                            MoveSrc::Register(reg) => i64::from(*reg),
                            MoveSrc::Immediate(value) => i64::from(*value),
                        });
                    }
                    Instruction::In { reg, port } | Instruction::Out { reg, port } => {
                        raw.reg = Some(i64::from(*reg));
                        raw.op = Some(i64::from(*port));
                    }
                    Instruction::Di
                    | Instruction::Ei
                    | Instruction::Halt
                    | Instruction::Iret => {}
                }
            }
            MachineWord::Data { value, term } => {
                raw.data = Some(i64::from(*value));
                raw.term = Some(term.clone());
            }
            MachineWord::Vector { handler } => {
                raw.int1 = Some(match handler {
                    Some(addr) => VectorCell::Address(*addr as i64),
                    None => VectorCell::Missing("-".to_string()),
                });
            }
        }
        raw
    }
}

fn malformed(index: usize, reason: &str) -> CodeError {
    CodeError::Malformed {
        index,
        reason: reason.to_string(),
    }
}

fn reg_field(field: Option<i64>, name: &str, index: usize) -> Result<u8, CodeError> {
    let value = field.ok_or_else(|| malformed(index, &format!("missing \"{}\"", name)))?;
    u8::try_from(value).map_err(|_| malformed(index, &format!("\"{}\" out of range", name)))
}

fn addr_field(field: Option<i64>, index: usize) -> Result<usize, CodeError> {
    let value = field.ok_or_else(|| malformed(index, "missing \"op\""))?;
    usize::try_from(value).map_err(|_| malformed(index, "\"op\" is not an address"))
}

fn word_from_raw(raw: RawWord, index: usize) -> Result<MachineWord, CodeError> {
    if let Some(opcode) = raw.opcode {
        let term = raw
            .term
            .ok_or_else(|| malformed(index, "instruction without \"term\""))?;
        let instr = match opcode {
            Opcode::Load | Opcode::Store => {
                let reg = reg_field(raw.reg, "reg", index)?;
                let addr = addr_field(raw.op, index)?;
                let mode = match raw.addr_type {
                    Some(0) => AddrMode::Direct,
                    Some(1) => AddrMode::Indirect,
                    _ => return Err(malformed(index, "memory access with a bad addressing tag")),
                };
                if opcode == Opcode::Load {
                    Instruction::Load { reg, addr, mode }
                } else {
                    Instruction::Store { reg, addr, mode }
                }
            }
            Opcode::Add | Opcode::Sub | Opcode::Mod => Instruction::Binary {
                op: opcode,
                dst: reg_field(raw.op1, "op1", index)?,
                lhs: reg_field(raw.op2, "op2", index)?,
                rhs: reg_field(raw.op3, "op3", index)?,
            },
            Opcode::Cmp => Instruction::Cmp {
                lhs: reg_field(raw.op1, "op1", index)?,
                rhs: reg_field(raw.op2, "op2", index)?,
            },
            Opcode::Inc => Instruction::Inc {
                reg: reg_field(raw.op, "op", index)?,
            },
            Opcode::Jmp => Instruction::Jmp {
                target: addr_field(raw.op, index)?,
            },
            Opcode::Jz => Instruction::Jcc {
                cond: Cond::Zero,
                target: addr_field(raw.op, index)?,
            },
            Opcode::Jnz => Instruction::Jcc {
                cond: Cond::NotZero,
                target: addr_field(raw.op, index)?,
            },
            Opcode::Move => {
                let dst = reg_field(raw.reg, "reg", index)?;
                let op = raw.op.ok_or_else(|| malformed(index, "missing \"op\""))?;
                let src = match raw.addr_type {
                    Some(2) => MoveSrc::Register(
                        u8::try_from(op)
                            .map_err(|_| malformed(index, "\"op\" is not a register"))?,
                    ),
                    Some(0) => MoveSrc::Immediate(
                        i32::try_from(op)
                            .map_err(|_| malformed(index, "\"op\" is out of range"))?,
                    ),
                    _ => return Err(malformed(index, "move with a bad addressing tag")),
                };
                Instruction::Move { dst, src }
            }
            Opcode::In | Opcode::Out => {
                let reg = reg_field(raw.reg, "reg", index)?;
                let op = raw.op.ok_or_else(|| malformed(index, "missing \"op\""))?;
                let port = i32::try_from(op)
                    .map_err(|_| malformed(index, "\"op\" is not a port"))?;
                if opcode == Opcode::In {
                    Instruction::In { reg, port }
                } else {
                    Instruction::Out { reg, port }
                }
            }
            Opcode::Di => Instruction::Di,
            Opcode::Ei => Instruction::Ei,
            Opcode::Halt => Instruction::Halt,
            Opcode::Iret => Instruction::Iret,
        };
        return Ok(MachineWord::Instruction { instr, term });
    }

    if let Some(data) = raw.data {
        let term = raw
            .term
            .ok_or_else(|| malformed(index, "data without \"term\""))?;
        let value = i32::try_from(data)
            .map_err(|_| malformed(index, "\"data\" is out of range"))?;
        return Ok(MachineWord::Data { value, term });
    }

    if let Some(int1) = raw.int1 {
        let handler = match int1 {
            VectorCell::Address(addr) => Some(
                usize::try_from(addr)
                    .map_err(|_| malformed(index, "\"int1\" is not an address"))?,
            ),
            VectorCell::Missing(_) => None,
        };
        return Ok(MachineWord::Vector { handler });
    }

    Err(malformed(index, "no \"opcode\", \"data\", or \"int1\" key"))
}

/// Serialize a program: one JSON record per line inside a single array.
pub fn encode(code: &[MachineWord]) -> Result<String, CodeError> {
    let mut records = Vec::with_capacity(code.len());
    for word in code {
        records.push(serde_json::to_string(&RawWord::from(word))?);
    }
    Ok(format!("[{}]", records.join(",\n ")))
}

/// Parse a serialized program back into machine words.
pub fn decode(text: &str) -> Result<Vec<MachineWord>, CodeError> {
    let raw: Vec<RawWord> = serde_json::from_str(text)?;
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| word_from_raw(record, index))
        .collect()
}

/// Write machine code to a file.
pub fn write_code(filename: &Path, code: &[MachineWord]) -> Result<(), CodeError> {
    fs::write(filename, encode(code)?)?;
    Ok(())
}

/// Read machine code from a file.
pub fn read_code(filename: &Path) -> Result<Vec<MachineWord>, CodeError> {
    decode(&fs::read_to_string(filename)?)
}
