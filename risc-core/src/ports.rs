//! Port controller: two scalar ports bridging the input schedule and the
//! output buffer. Port 0 carries the code point the scheduler deposited;
//! port 1 carries the code point being emitted.

use crate::error::MachineError;
use crate::isa::{INPUT_PORT_ADDRESS, OUTPUT_PORT_ADDRESS};

#[derive(Debug, Default)]
pub struct PortController {
    input: i32,
    output: i32,
    output_buffer: String,
}

impl PortController {
    pub fn new() -> PortController {
        PortController {
            input: 0,
            output: 0,
            output_buffer: String::new(),
        }
    }

    /// Scheduler side: deposit a code point on the input port.
    pub fn deposit(&mut self, value: i32) {
        self.input = value;
    }

    /// `in` side: read the input port.
    pub fn read_input(&self, port: i32) -> Result<i32, MachineError> {
        if port != INPUT_PORT_ADDRESS {
            return Err(MachineError::InvalidPort(port));
        }
        Ok(self.input)
    }

    /// `out` side: latch a code point on the output port and append its
    /// character to the output buffer.
    pub fn write_output(&mut self, port: i32, value: i32) -> Result<(), MachineError> {
        if port != OUTPUT_PORT_ADDRESS {
            return Err(MachineError::InvalidPort(port));
        }
        self.output = value;
        let character = u32::try_from(value)
            .ok()
            .and_then(char::from_u32)
            .ok_or(MachineError::InvalidCharacter(value))?;
        self.output_buffer.push(character);
        Ok(())
    }

    /// The code point currently latched on the output port.
    pub fn output_latch(&self) -> i32 {
        self.output
    }

    /// Everything `out` has emitted so far, in order.
    pub fn output(&self) -> &str {
        &self.output_buffer
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn input_round_trip() {
        let mut ports = PortController::new();
        ports.deposit(65);
        assert_eq!(ports.read_input(0).unwrap(), 65);
    }

    #[test]
    fn output_appends_in_order() {
        let mut ports = PortController::new();
        ports.write_output(1, 72).unwrap();
        ports.write_output(1, 105).unwrap();
        assert_eq!(ports.output(), "Hi");
        assert_eq!(ports.output_latch(), 105);
    }

    #[test]
    fn wrong_ports_are_rejected() {
        let mut ports = PortController::new();
        assert_eq!(ports.read_input(1), Err(MachineError::InvalidPort(1)));
        assert_eq!(ports.write_output(0, 65), Err(MachineError::InvalidPort(0)));
    }

    #[test]
    fn unprintable_values_fault() {
        let mut ports = PortController::new();
        assert_eq!(
            ports.write_output(1, -1),
            Err(MachineError::InvalidCharacter(-1))
        );
    }
}
