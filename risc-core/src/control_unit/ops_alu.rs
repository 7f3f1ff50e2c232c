//! Arithmetic executors. All of them retire in a single tick and leave the
//! zero flag describing the value they latched.

use crate::control_unit::ControlUnit;
use crate::error::MachineError;
use crate::isa::Opcode;
use crate::registers::RegSel;

/// Three-register arithmetic (add, sub, mod)
/// Function: R[dst] := R[lhs] op R[rhs]; PC := PC + 1
/// Flags: Z
pub fn binary(
    cu: &mut ControlUnit,
    op: Opcode,
    dst: u8,
    lhs: u8,
    rhs: u8,
) -> Result<(), MachineError> {
    cu.data_path.register_file.sel_left(RegSel::general(lhs)?)?;
    cu.data_path.register_file.sel_right(RegSel::general(rhs)?)?;
    let value = cu.data_path.alu.perform(
        cu.data_path.register_file.left_out,
        cu.data_path.register_file.right_out,
        op,
    )?;
    cu.data_path.register_file.latch(RegSel::general(dst)?, value)?;
    cu.advance_pc();
    cu.tick();
    Ok(())
}

/// Compare
/// Function: R[lhs] - R[rhs], result discarded; PC := PC + 1
/// Flags: Z
pub fn cmp(cu: &mut ControlUnit, lhs: u8, rhs: u8) -> Result<(), MachineError> {
    cu.data_path.register_file.sel_left(RegSel::general(lhs)?)?;
    cu.data_path.register_file.sel_right(RegSel::general(rhs)?)?;
    cu.data_path.alu.perform(
        cu.data_path.register_file.left_out,
        cu.data_path.register_file.right_out,
        Opcode::Cmp,
    )?;
    cu.advance_pc();
    cu.tick();
    Ok(())
}

/// Increment
/// Function: R[reg] := R[reg] + 1; PC := PC + 1
/// Flags: Z
pub fn inc(cu: &mut ControlUnit, reg: u8) -> Result<(), MachineError> {
    cu.data_path.register_file.sel_right(RegSel::general(reg)?)?;
    // The constant 1 is wired on the left input; the unary handler
    // ignores it.
    let value = cu
        .data_path
        .alu
        .perform(1, cu.data_path.register_file.right_out, Opcode::Inc)?;
    cu.data_path.register_file.latch(RegSel::general(reg)?, value)?;
    cu.advance_pc();
    cu.tick();
    Ok(())
}
