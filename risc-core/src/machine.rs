//! Top-level simulation driver: owns the control unit, feeds the input
//! schedule to the interrupt controller, and stops the run on `halt` or
//! when the instruction limit is reached.

use crate::control_unit::{ControlUnit, Step};
use crate::data_path::DataPath;
use crate::error::{MachineError, SimulationFault};
use crate::isa::{MachineWord, MEMORY_SIZE};
use std::collections::VecDeque;

/// Stop runaway programs after this many executed instructions.
pub const INSTRUCTION_LIMIT: u64 = 10_000;

/// One scheduled input: the tick it becomes due at and the key that was
/// pressed, if any.
pub type InputToken = (u64, Option<char>);

/// What a finished run produced.
#[derive(Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub output: String,
    pub instruction_counter: u64,
    pub tick_counter: u64,
}

pub struct Machine {
    pub control_unit: ControlUnit,
    input_tokens: VecDeque<InputToken>,
}

impl Machine {
    pub fn new(
        program: &[MachineWord],
        input_tokens: Vec<InputToken>,
    ) -> Result<Machine, MachineError> {
        Ok(Machine {
            control_unit: ControlUnit::new(DataPath::new(program)?),
            input_tokens: input_tokens.into(),
        })
    }

    /// Raise an interrupt for the next schedule entry once its tick is due,
    /// depositing the key's code point (or zero) on the input port. The
    /// vector address is the last memory cell, where the translator's
    /// trailer record lives.
    fn initiate_interruption(&mut self) {
        let Some(&(at_tick, key)) = self.input_tokens.front() else {
            return;
        };
        if at_tick <= self.control_unit.tick_counter {
            self.control_unit
                .data_path
                .interrupt_controller
                .raise(MEMORY_SIZE - 1);
            self.control_unit
                .data_path
                .ports
                .deposit(key.map_or(0, |ch| ch as i32));
            self.input_tokens.pop_front();
        }
    }

    pub fn run(&mut self) -> Result<RunSummary, SimulationFault> {
        if let Err(kind) = self.control_unit.initialization_cycle() {
            return Err(self.fault(kind));
        }

        let mut instruction_counter: u64 = 0;
        let mut halted = false;
        while instruction_counter < INSTRUCTION_LIMIT {
            match self.control_unit.decode_and_execute_instruction() {
                Ok(Step::Continue) => instruction_counter += 1,
                Ok(Step::Halted) => {
                    instruction_counter += 1;
                    halted = true;
                    break;
                }
                Err(kind) => return Err(self.fault(kind)),
            }
            log::debug!("{}", self.control_unit);

            self.initiate_interruption();
            if let Err(kind) = self.control_unit.check_and_handle_interruption() {
                return Err(self.fault(kind));
            }
        }
        if !halted {
            log::warn!("Instruction limit reached");
        }

        Ok(RunSummary {
            output: self.control_unit.data_path.ports.output().to_string(),
            instruction_counter,
            tick_counter: self.control_unit.tick_counter,
        })
    }

    fn fault(&self, kind: MachineError) -> SimulationFault {
        SimulationFault {
            kind,
            tick: self.control_unit.tick_counter,
            pc: self.control_unit.data_path.pc,
        }
    }
}

/// Run a program against an input schedule and collect what it produced.
pub fn simulate(
    program: &[MachineWord],
    input_tokens: Vec<InputToken>,
) -> Result<RunSummary, SimulationFault> {
    let mut machine = Machine::new(program, input_tokens).map_err(|kind| SimulationFault {
        kind,
        tick: 0,
        pc: 0,
    })?;
    machine.run()
}
