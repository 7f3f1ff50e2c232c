//! Two-pass translator from assembly text to machine-code records.
//!
//! The stream goes through four stages: clean the source (comments,
//! blanks, `section` headers, the synthetic entry jump), expand the
//! `.data:` section in place, collect label lines into an index table
//! (removing them, so a label points at the line that follows it), then
//! encode one record per remaining line and append the interrupt-vector
//! trailer.

use crate::isa::{
    AddrMode, Cond, Instruction, MachineWord, MoveSrc, Opcode, Term, GENERAL_REGISTER_COUNT,
};
use colored::*;
use std::collections::HashMap;
use thiserror::Error;

/// Label that marks the interrupt handler entry.
pub const INTERRUPT_LABEL: &str = ".int1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("line {index}: unresolved label \"{name}\"")]
    UnresolvedLabel { index: usize, name: String },

    #[error("line {index}: malformed operand in \"{line}\"")]
    MalformedOperand { index: usize, line: String },

    #[error("line {index}: \"{token}\" is not a general register")]
    BadRegister { index: usize, token: String },
}

impl TranslateError {
    /// Index into the cleaned, expanded, label-free line stream.
    pub fn index(&self) -> usize {
        match self {
            TranslateError::UnresolvedLabel { index, .. }
            | TranslateError::MalformedOperand { index, .. }
            | TranslateError::BadRegister { index, .. } => *index,
        }
    }

    /// Render the error with an excerpt of the processed stream around the
    /// failure, for terminal display.
    pub fn render(&self, source: &str) -> String {
        let mut lines = clean_lines(source);
        if expand_data_section(&mut lines).is_ok() {
            collect_labels(&mut lines);
        }

        let error_index = self.index();
        let context = 3;
        let mut message = String::from("\n");
        for (index, line) in lines.iter().enumerate() {
            if index + context < error_index {
                continue;
            }
            if index > error_index + context {
                break;
            }
            let gutter = format!("{:4}: ", index);
            message.push_str(&format!("{}", gutter.cyan()));
            message.push_str(&format!("{}\n", line.bright_white()));
            if index == error_index {
                message.push_str("      ");
                message.push_str(&format!("{}\n", format!("^ {}", self).bright_red()));
            }
        }
        message
    }
}

/// Translate assembly text into machine-code records. Pure: the same text
/// always yields the same records.
pub fn translate(text: &str) -> Result<Vec<MachineWord>, TranslateError> {
    let mut lines = clean_lines(text);
    expand_data_section(&mut lines)?;
    let labels = collect_labels(&mut lines);
    encode_lines(&lines, &labels)
}

/// Strip comments and blanks, unwrap `section` headers, and plant the
/// synthetic entry jump so that cell 0 always branches to the code entry.
fn clean_lines(text: &str) -> Vec<String> {
    let mut lines = vec!["jmp .text".to_string()];
    for line in text.split('\n') {
        let stripped = line.split('@').next().unwrap_or(line).trim();
        if stripped.is_empty() {
            continue;
        }
        let stripped = match stripped.strip_prefix("section ") {
            Some(rest) => rest.trim(),
            None => stripped,
        };
        lines.push(stripped.to_string());
    }
    lines
}

/// Expand `.data:` directives in place. `resb N` reserves N zeroed cells,
/// quoted strings become one code-point line per character, and any other
/// value keeps its line. The label line stays ahead of its first cell, so
/// label-to-first-byte alignment survives the expansion.
fn expand_data_section(lines: &mut Vec<String>) -> Result<(), TranslateError> {
    let mut expanded = Vec::with_capacity(lines.len());
    let mut in_data_section = false;
    let mut finished = false;

    for line in lines.iter() {
        if finished {
            expanded.push(line.clone());
            continue;
        }
        if line == ".data:" {
            in_data_section = true;
            expanded.push(line.clone());
            continue;
        }
        if in_data_section && line.starts_with('.') {
            finished = true;
            expanded.push(line.clone());
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) if in_data_section => {
                expand_value(key.trim(), value.trim(), expanded.len(), &mut expanded)?;
            }
            _ => expanded.push(line.clone()),
        }
    }

    *lines = expanded;
    Ok(())
}

fn expand_value(
    key: &str,
    value: &str,
    index: usize,
    out: &mut Vec<String>,
) -> Result<(), TranslateError> {
    if value.contains("resb") {
        let size = value
            .split_whitespace()
            .nth(1)
            .and_then(|count| count.parse::<usize>().ok())
            .ok_or_else(|| TranslateError::MalformedOperand {
                index,
                line: format!("{}: {}", key, value),
            })?;
        out.push(format!("{}:", key));
        out.extend(std::iter::repeat("0".to_string()).take(size));
        return Ok(());
    }

    if value.contains('"') {
        out.push(format!("{}:", key));
        // Toggle on each quote; between quoted spans, spaces and commas
        // are separators and everything else keeps its own line.
        let mut on_str = false;
        for ch in value.chars() {
            if ch == '"' {
                on_str = !on_str;
            } else if on_str {
                out.push((ch as u32).to_string());
            } else if ch != ' ' && ch != ',' {
                out.push(ch.to_string());
            }
        }
        return Ok(());
    }

    out.push(format!("{}:", key));
    out.push(value.to_string());
    Ok(())
}

/// Collect label lines into `name -> index` and drop them from the stream.
/// Removing the line shifts everything after it up by one, which is what
/// makes a label point at the line that follows it.
fn collect_labels(lines: &mut Vec<String>) -> HashMap<String, usize> {
    let mut labels = HashMap::new();
    let mut index = 0;
    while index < lines.len() {
        match lines[index].split_once(':') {
            Some((name, _)) => {
                labels.insert(name.trim().to_string(), index);
                lines.remove(index);
            }
            None => index += 1,
        }
    }
    labels
}

fn encode_lines(
    lines: &[String],
    labels: &HashMap<String, usize>,
) -> Result<Vec<MachineWord>, TranslateError> {
    let mut code = Vec::with_capacity(lines.len() + 1);
    for (pc, line) in lines.iter().enumerate() {
        code.push(encode_line(pc, line, labels)?);
    }
    // The trailer the simulator reads from the last memory cell.
    code.push(MachineWord::Vector {
        handler: labels.get(INTERRUPT_LABEL).copied(),
    });
    Ok(code)
}

fn encode_line(
    pc: usize,
    line: &str,
    labels: &HashMap<String, usize>,
) -> Result<MachineWord, TranslateError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let op = tokens.first().copied().unwrap_or_default();

    if let Some(opcode) = Opcode::from_mnemonic(op) {
        return encode_instruction(pc, opcode, &tokens, line, labels);
    }

    // Not a mnemonic: a data line, either a literal or a label reference.
    if op.chars().all(|ch| ch.is_ascii_digit()) {
        let value = op
            .parse()
            .map_err(|_| TranslateError::MalformedOperand {
                index: pc,
                line: line.to_string(),
            })?;
        return Ok(MachineWord::Data {
            value,
            term: Term::new(pc, ""),
        });
    }
    let target = resolve(pc, op, labels)?;
    Ok(MachineWord::Data {
        value: target as i32,
        term: Term::new(pc, op),
    })
}

fn encode_instruction(
    pc: usize,
    opcode: Opcode,
    tokens: &[&str],
    line: &str,
    labels: &HashMap<String, usize>,
) -> Result<MachineWord, TranslateError> {
    let malformed = || TranslateError::MalformedOperand {
        index: pc,
        line: line.to_string(),
    };
    let operand = |position: usize| tokens.get(position).copied().ok_or_else(malformed);

    let mut related_label = String::new();
    let instr = match opcode {
        Opcode::Load | Opcode::Store => {
            if tokens.len() != 3 {
                return Err(malformed());
            }
            let reg = parse_register(pc, operand(1)?)?;
            let target = operand(2)?;
            let (name, mode) = match target
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
            {
                Some(inner) => (inner, AddrMode::Indirect),
                None => (target, AddrMode::Direct),
            };
            let addr = resolve(pc, name, labels)?;
            related_label = name.to_string();
            if opcode == Opcode::Load {
                Instruction::Load { reg, addr, mode }
            } else {
                Instruction::Store { reg, addr, mode }
            }
        }
        Opcode::Add | Opcode::Sub | Opcode::Mod => {
            if tokens.len() != 4 {
                return Err(malformed());
            }
            Instruction::Binary {
                op: opcode,
                dst: parse_register(pc, operand(1)?)?,
                lhs: parse_register(pc, operand(2)?)?,
                rhs: parse_register(pc, operand(3)?)?,
            }
        }
        Opcode::Cmp => {
            if tokens.len() != 3 {
                return Err(malformed());
            }
            Instruction::Cmp {
                lhs: parse_register(pc, operand(1)?)?,
                rhs: parse_register(pc, operand(2)?)?,
            }
        }
        Opcode::Inc => {
            if tokens.len() != 2 {
                return Err(malformed());
            }
            Instruction::Inc {
                reg: parse_register(pc, operand(1)?)?,
            }
        }
        Opcode::Jmp | Opcode::Jz | Opcode::Jnz => {
            if tokens.len() != 2 {
                return Err(malformed());
            }
            let name = operand(1)?;
            let target = resolve(pc, name, labels)?;
            related_label = name.to_string();
            match opcode {
                Opcode::Jmp => Instruction::Jmp { target },
                Opcode::Jz => Instruction::Jcc {
                    cond: Cond::Zero,
                    target,
                },
                _ => Instruction::Jcc {
                    cond: Cond::NotZero,
                    target,
                },
            }
        }
        Opcode::Move => {
            if tokens.len() != 3 {
                return Err(malformed());
            }
            let dst = parse_register(pc, operand(1)?)?;
            let source = operand(2)?;
            let src = match source.strip_prefix('#') {
                Some(immediate) => {
                    MoveSrc::Immediate(immediate.parse().map_err(|_| malformed())?)
                }
                None => MoveSrc::Register(parse_register(pc, source)?),
            };
            Instruction::Move { dst, src }
        }
        Opcode::In | Opcode::Out => {
            if tokens.len() != 3 {
                return Err(malformed());
            }
            let reg = parse_register(pc, operand(1)?)?;
            let port = operand(2)?.parse().map_err(|_| malformed())?;
            if opcode == Opcode::In {
                Instruction::In { reg, port }
            } else {
                Instruction::Out { reg, port }
            }
        }
        Opcode::Di | Opcode::Ei | Opcode::Halt | Opcode::Iret => {
            if tokens.len() != 1 {
                return Err(malformed());
            }
            match opcode {
                Opcode::Di => Instruction::Di,
                Opcode::Ei => Instruction::Ei,
                Opcode::Halt => Instruction::Halt,
                _ => Instruction::Iret,
            }
        }
    };

    Ok(MachineWord::Instruction {
        instr,
        term: Term::new(pc, &related_label),
    })
}

/// Registers read `rN`, with a trailing comma on non-final positions.
fn parse_register(pc: usize, token: &str) -> Result<u8, TranslateError> {
    let bad = || TranslateError::BadRegister {
        index: pc,
        token: token.to_string(),
    };
    let trimmed = token.strip_suffix(',').unwrap_or(token);
    let number = trimmed.strip_prefix('r').ok_or_else(bad)?;
    let index: u8 = number.parse().map_err(|_| bad())?;
    if usize::from(index) >= GENERAL_REGISTER_COUNT {
        return Err(bad());
    }
    Ok(index)
}

fn resolve(
    pc: usize,
    name: &str,
    labels: &HashMap<String, usize>,
) -> Result<usize, TranslateError> {
    labels
        .get(name)
        .copied()
        .ok_or_else(|| TranslateError::UnresolvedLabel {
            index: pc,
            name: name.to_string(),
        })
}
