//! The data path owns everything the control unit steers: the memory
//! array, the program counter, the register file, the ALU, and the two
//! controllers.

use crate::alu::Alu;
use crate::error::MachineError;
use crate::interrupts::InterruptController;
use crate::isa::{MachineWord, MemCell, MEMORY_SIZE};
use crate::ports::PortController;
use crate::registers::RegisterFile;

/// Interpret an ALU value as a memory address.
pub(crate) fn address(value: i32) -> Result<usize, MachineError> {
    usize::try_from(value).map_err(|_| MachineError::MemoryError(i64::from(value)))
}

pub struct DataPath {
    pub register_file: RegisterFile,
    pub pc: usize,
    pub alu: Alu,
    pub interrupt_controller: InterruptController,
    pub ports: PortController,
    memory: Vec<MemCell>,
}

impl DataPath {
    /// Load a program image. Words fill the memory from cell 0 upward,
    /// except the interrupt-vector record, which lives in the last cell.
    pub fn new(program: &[MachineWord]) -> Result<DataPath, MachineError> {
        let mut memory = vec![MemCell::Empty; MEMORY_SIZE];
        let mut next = 0;
        for word in program {
            let cell = match word {
                MachineWord::Instruction { instr, .. } => MemCell::Instr(Box::new(instr.clone())),
                MachineWord::Data { value, .. } => MemCell::Data(*value),
                MachineWord::Vector { handler } => {
                    memory[MEMORY_SIZE - 1] = MemCell::Vector(*handler);
                    continue;
                }
            };
            let slot = memory
                .get_mut(next)
                .ok_or(MachineError::MemoryError(next as i64))?;
            *slot = cell;
            next += 1;
        }
        Ok(DataPath {
            register_file: RegisterFile::new(),
            pc: 0,
            alu: Alu::new(),
            interrupt_controller: InterruptController::new(),
            ports: PortController::new(),
            memory,
        })
    }

    /// Latch a new program counter.
    pub fn signal_latch_pc(&mut self, value: usize) {
        self.pc = value;
    }

    pub fn signal_read_memory(&self, address: usize) -> Result<&MemCell, MachineError> {
        self.memory
            .get(address)
            .ok_or(MachineError::MemoryError(address as i64))
    }

    /// Read a cell as a data value. Empty cells read as zero; a cell that
    /// holds a record without a `data` field cannot be read this way.
    pub fn read_data(&self, address: usize) -> Result<i32, MachineError> {
        match self.signal_read_memory(address)? {
            MemCell::Empty => Ok(0),
            MemCell::Data(value) => Ok(*value),
            MemCell::Instr(_) | MemCell::Vector(_) => Err(MachineError::OperandError),
        }
    }

    pub fn signal_write_memory(&mut self, address: usize, cell: MemCell) -> Result<(), MachineError> {
        let slot = self
            .memory
            .get_mut(address)
            .ok_or(MachineError::MemoryError(address as i64))?;
        *slot = cell;
        Ok(())
    }
}
