//! The control unit drives the data path at tick granularity: an
//! initialization cycle that realizes the entry jump, then one
//! fetch/decode/execute microprogram per instruction, with the interrupt
//! prologue run between instructions.
//!
//! Every microstep costs exactly one tick; tick totals are observable and
//! pinned by tests.

use crate::alu::Alu;
use crate::data_path::{address, DataPath};
use crate::error::MachineError;
use crate::isa::{AddrMode, Instruction, MemCell, Opcode};
use crate::registers::RegSel;
use std::fmt;

pub mod ops_alu;
pub mod ops_jump;
pub mod ops_move;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod test;

/// The interrupt prologue stamps the return address into this register and
/// `iret` jumps back through it.
pub const RETURN_REGISTER: u8 = 12;

/// What the outer loop should do after an instruction retires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halted,
}

pub struct ControlUnit {
    pub data_path: DataPath,
    pub tick_counter: u64,
    pub interruption_enabled: bool,
}

impl ControlUnit {
    pub fn new(data_path: DataPath) -> ControlUnit {
        ControlUnit {
            data_path,
            tick_counter: 0,
            interruption_enabled: false,
        }
    }

    /// One microstep elapses.
    fn tick(&mut self) {
        self.tick_counter += 1;
    }

    /// `MEM[PC] -> IR`. Fetch faults if PC points at anything but an
    /// instruction record.
    fn fetch(&mut self) -> Result<(), MachineError> {
        let instr = match self.data_path.signal_read_memory(self.data_path.pc)? {
            MemCell::Instr(instr) => (**instr).clone(),
            _ => return Err(MachineError::UnknownOpcode(self.data_path.pc)),
        };
        self.data_path.register_file.latch_ir(instr);
        self.tick();
        Ok(())
    }

    /// `cut_operand(IR) -> AR`, one tick.
    fn latch_operand_into_ar(&mut self) -> Result<(), MachineError> {
        let operand = Alu::cut_operand(self.data_path.register_file.instruction()?)?;
        self.data_path.register_file.latch(RegSel::Ar, operand)?;
        self.tick();
        Ok(())
    }

    /// `0 + AR -> PC` through the ALU. The caller owns the tick; this
    /// transfer shares it with whatever else happens in the same microstep.
    fn latch_ar_into_pc(&mut self) -> Result<(), MachineError> {
        self.data_path.register_file.sel_right(RegSel::Ar)?;
        let value = self
            .data_path
            .alu
            .perform(0, self.data_path.register_file.right_out, Opcode::Add)?;
        self.data_path.signal_latch_pc(address(value)?);
        Ok(())
    }

    /// `1 + IPC -> PC` through the ALU, one tick.
    fn restore_pc_from_ipc(&mut self) -> Result<(), MachineError> {
        self.data_path.register_file.sel_right(RegSel::Ipc)?;
        let value = self
            .data_path
            .alu
            .perform(1, self.data_path.register_file.right_out, Opcode::Add)?;
        self.data_path.signal_latch_pc(address(value)?);
        self.tick();
        Ok(())
    }

    /// Plain `PC + 1 -> PC`, outside the ALU. Does not touch the flags and
    /// does not tick on its own.
    fn advance_pc(&mut self) {
        self.data_path.signal_latch_pc(self.data_path.pc + 1);
    }

    /// Runs once before the main loop and realizes the entry jump the
    /// translator plants at cell 0:
    ///
    /// 1. `MEM[PC] -> IR`
    /// 2. `cut_operand(IR) -> AR`
    /// 3. `0 + AR -> PC`
    pub fn initialization_cycle(&mut self) -> Result<(), MachineError> {
        self.fetch()?;
        self.latch_operand_into_ar()?;
        self.latch_ar_into_pc()?;
        self.tick();
        Ok(())
    }

    /// Point PC at the data cell a `load`/`store` names, saving the
    /// pre-resolution PC in IPC:
    ///
    /// 1. `cut_operand(IR) -> AR`
    /// 2. direct: `PC -> IPC; 0 + AR -> PC`
    ///    indirect: the same, then one more hop `MEM[PC] -> AR; 0 + AR -> PC`
    fn address_selection(&mut self, mode: AddrMode) -> Result<(), MachineError> {
        self.latch_operand_into_ar()?;

        let pc = self.data_path.pc as i32;
        self.data_path.register_file.latch(RegSel::Ipc, pc)?;
        self.latch_ar_into_pc()?;
        self.tick();

        if mode == AddrMode::Indirect {
            let pointer = self.data_path.read_data(self.data_path.pc)?;
            self.data_path.register_file.latch(RegSel::Ar, pointer)?;
            self.latch_ar_into_pc()?;
            self.tick();
        }
        Ok(())
    }

    /// Fetch the record at PC and run its microprogram. Returns
    /// [`Step::Halted`] when a `halt` retires.
    pub fn decode_and_execute_instruction(&mut self) -> Result<Step, MachineError> {
        self.fetch()?;
        let instr = self.data_path.register_file.instruction()?.clone();
        match instr {
            Instruction::Load { reg, mode, .. } => ops_move::load(self, reg, mode)?,
            Instruction::Store { reg, mode, .. } => ops_move::store(self, reg, mode)?,
            Instruction::Binary { op, dst, lhs, rhs } => {
                ops_alu::binary(self, op, dst, lhs, rhs)?
            }
            Instruction::Cmp { lhs, rhs } => ops_alu::cmp(self, lhs, rhs)?,
            Instruction::Inc { reg } => ops_alu::inc(self, reg)?,
            Instruction::Jmp { .. } => ops_jump::jmp(self)?,
            Instruction::Jcc { cond, .. } => ops_jump::jcc(self, cond)?,
            Instruction::Move { dst, src } => ops_move::mov(self, dst, src)?,
            Instruction::In { reg, .. } => ops_move::port_in(self, reg)?,
            Instruction::Out { reg, .. } => ops_move::port_out(self, reg)?,
            Instruction::Di => ops_jump::di(self),
            Instruction::Ei => ops_jump::ei(self),
            Instruction::Iret => ops_jump::iret(self)?,
            Instruction::Halt => {
                self.tick();
                return Ok(Step::Halted);
            }
        }
        Ok(Step::Continue)
    }

    /// Run the interrupt prologue if one is due: interrupts enabled, one
    /// pending, and no handler already running.
    ///
    /// 1. `PC -> R12; vector_addr -> PC`
    /// 2. `MEM[PC] -> AR` (the vector record)
    /// 3. `0 + AR.int1 -> PC`
    pub fn check_and_handle_interruption(&mut self) -> Result<(), MachineError> {
        if !self.interruption_enabled {
            return Ok(());
        }
        let Some(vector_addr) = self.data_path.interrupt_controller.pending() else {
            return Ok(());
        };

        self.data_path.interrupt_controller.acknowledge();
        let pc = self.data_path.pc as i32;
        self.data_path
            .register_file
            .latch(RegSel::general(RETURN_REGISTER)?, pc)?;
        self.data_path.signal_latch_pc(vector_addr);
        self.tick();

        let handler = match self.data_path.signal_read_memory(self.data_path.pc)? {
            MemCell::Vector(Some(handler)) => *handler,
            // A vector record without a handler address, or no vector at
            // all: nothing to cut the entry point from.
            _ => return Err(MachineError::OperandError),
        };
        self.data_path
            .register_file
            .latch(RegSel::Ar, handler as i32)?;
        self.tick();

        self.latch_ar_into_pc()?;
        self.tick();
        Ok(())
    }
}

impl fmt::Display for ControlUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ir = self
            .data_path
            .register_file
            .instruction()
            .map(|instr| instr.opcode().mnemonic())
            .unwrap_or("-");
        write!(
            f,
            "TICK: {:5} PC: {:5} Z: {} AR: {} IPC: {} IR: {}",
            self.tick_counter,
            self.data_path.pc,
            self.data_path.alu.zero_flag as u8,
            self.data_path.register_file.ar,
            self.data_path.register_file.ipc,
            ir
        )
    }
}
