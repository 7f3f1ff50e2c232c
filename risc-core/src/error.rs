//! Faults the machine can raise while loading or executing a program.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("invalid register number {0}")]
    InvalidRegister(i64),

    /// The record in IR has no operand field to cut.
    #[error("the instruction register holds a record without an operand")]
    OperandError,

    #[error("memory doesn't have cell with index {0}")]
    MemoryError(i64),

    /// Fetch landed on a cell that is not an instruction record.
    #[error("the record at address {0} is not an executable instruction")]
    UnknownOpcode(usize),

    #[error("port {0} cannot be used for this transfer")]
    InvalidPort(i32),

    #[error("mod by zero")]
    DivisionByZero,

    /// The value latched on the output port is not a Unicode scalar.
    #[error("value {0} is not a valid output character")]
    InvalidCharacter(i32),
}

/// A machine fault stamped with where the machine was when it happened.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{kind} (tick {tick}, pc {pc})")]
pub struct SimulationFault {
    #[source]
    pub kind: MachineError,
    pub tick: u64,
    pub pc: usize,
}
