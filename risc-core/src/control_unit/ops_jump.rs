//! Control-flow executors: jumps, the interrupt-enable pair, and the
//! return from a handler.

use crate::alu::Alu;
use crate::control_unit::{ControlUnit, RETURN_REGISTER};
use crate::data_path::address;
use crate::error::MachineError;
use crate::isa::Cond;
use crate::registers::RegSel;

fn branch(cu: &mut ControlUnit, do_branch: bool) -> Result<(), MachineError> {
    if do_branch {
        let target = Alu::cut_operand(cu.data_path.register_file.instruction()?)?;
        cu.data_path.signal_latch_pc(address(target)?);
    } else {
        cu.advance_pc();
    }
    cu.tick();
    Ok(())
}

/// Unconditional jump
/// Function: PC := cut_operand(IR)
pub fn jmp(cu: &mut ControlUnit) -> Result<(), MachineError> {
    branch(cu, true)
}

/// Conditional jump (jz, jnz)
/// Function: PC := cut_operand(IR) when the condition holds, else PC + 1
pub fn jcc(cu: &mut ControlUnit, cond: Cond) -> Result<(), MachineError> {
    let zero = cu.data_path.alu.zero_flag;
    let do_branch = match cond {
        Cond::Zero => zero,
        Cond::NotZero => !zero,
    };
    branch(cu, do_branch)
}

/// Enable interruptions
/// Function: interruption_enabled := true; PC := PC + 1
pub fn ei(cu: &mut ControlUnit) {
    cu.interruption_enabled = true;
    cu.advance_pc();
    cu.tick();
}

/// Disable interruptions
/// Function: interruption_enabled := false; PC := PC + 1
pub fn di(cu: &mut ControlUnit) {
    cu.interruption_enabled = false;
    cu.advance_pc();
    cu.tick();
}

/// Return from a handler
/// Function: PC := R12; the controller goes back to normal
pub fn iret(cu: &mut ControlUnit) -> Result<(), MachineError> {
    cu.data_path.interrupt_controller.complete();
    cu.data_path
        .register_file
        .sel_left(RegSel::general(RETURN_REGISTER)?)?;
    cu.data_path
        .signal_latch_pc(address(cu.data_path.register_file.left_out)?);
    cu.tick();
    Ok(())
}
