//! Data-movement executors: memory loads and stores, register/immediate
//! moves, and the two port transfers.

use crate::control_unit::ControlUnit;
use crate::error::MachineError;
use crate::isa::{AddrMode, MemCell, MoveSrc, Opcode};
use crate::registers::RegSel;

/// Load
/// Function: resolve; R[reg] := MEM[PC]; PC := 1 + IPC
/// Flags: Z (from the PC restore)
pub fn load(cu: &mut ControlUnit, reg: u8, mode: AddrMode) -> Result<(), MachineError> {
    cu.address_selection(mode)?;

    let value = cu.data_path.read_data(cu.data_path.pc)?;
    cu.data_path.register_file.latch(RegSel::general(reg)?, value)?;
    cu.tick();

    cu.restore_pc_from_ipc()
}

/// Store
/// Function: resolve; MEM[PC] := R[reg]; PC := 1 + IPC
/// Flags: Z (from the PC restore)
pub fn store(cu: &mut ControlUnit, reg: u8, mode: AddrMode) -> Result<(), MachineError> {
    cu.address_selection(mode)?;

    cu.data_path.register_file.sel_left(RegSel::general(reg)?)?;
    let value = cu.data_path.register_file.left_out;
    cu.data_path
        .signal_write_memory(cu.data_path.pc, MemCell::Data(value))?;
    cu.tick();

    cu.restore_pc_from_ipc()
}

/// Move
/// Function: R[dst] := R[src] | imm; PC := PC + 1
/// Flags: Z when the source is a register (the value passes the ALU)
pub fn mov(cu: &mut ControlUnit, dst: u8, src: MoveSrc) -> Result<(), MachineError> {
    let value = match src {
        MoveSrc::Register(src) => {
            cu.data_path.register_file.sel_right(RegSel::general(src)?)?;
            cu.data_path
                .alu
                .perform(0, cu.data_path.register_file.right_out, Opcode::Add)?
        }
        MoveSrc::Immediate(value) => value,
    };
    cu.data_path.register_file.latch(RegSel::general(dst)?, value)?;
    cu.advance_pc();
    cu.tick();
    Ok(())
}

/// Port input
/// Function: cut_operand(IR) -> AR; R[reg] := IN[AR]; PC := PC + 1
pub fn port_in(cu: &mut ControlUnit, reg: u8) -> Result<(), MachineError> {
    cu.latch_operand_into_ar()?;

    let value = cu.data_path.ports.read_input(cu.data_path.register_file.ar)?;
    cu.data_path.register_file.latch(RegSel::general(reg)?, value)?;
    cu.advance_pc();
    cu.tick();
    Ok(())
}

/// Port output
/// Function: cut_operand(IR) -> AR; OUT[AR] := R[reg]; PC := PC + 1
pub fn port_out(cu: &mut ControlUnit, reg: u8) -> Result<(), MachineError> {
    cu.latch_operand_into_ar()?;

    cu.data_path.register_file.sel_left(RegSel::general(reg)?)?;
    let value = cu.data_path.register_file.left_out;
    cu.data_path
        .ports
        .write_output(cu.data_path.register_file.ar, value)?;
    cu.advance_pc();
    cu.tick();
    Ok(())
}
