use crate::asm::translate;
use crate::error::SimulationFault;
use crate::machine::{simulate, InputToken, Machine, RunSummary};
use crate::registers::RegSel;

/// Translate a program and run it against an input schedule.
pub fn run_program(text: &str, input_tokens: Vec<InputToken>) -> RunSummary {
    let code = translate(text).unwrap();
    simulate(&code, input_tokens).unwrap()
}

/// Like [`run_program`], but hands the machine back for state inspection.
pub fn run_machine(text: &str, input_tokens: Vec<InputToken>) -> (Machine, RunSummary) {
    let code = translate(text).unwrap();
    let mut machine = Machine::new(&code, input_tokens).unwrap();
    let summary = machine.run().unwrap();
    (machine, summary)
}

/// Run a program that is expected to fault.
pub fn run_expecting_fault(text: &str, input_tokens: Vec<InputToken>) -> SimulationFault {
    let code = translate(text).unwrap();
    simulate(&code, input_tokens).unwrap_err()
}

/// Read a general register after a run.
pub fn general_register(machine: &Machine, index: u8) -> i32 {
    machine
        .control_unit
        .data_path
        .register_file
        .read(RegSel::General(index))
        .unwrap()
}
