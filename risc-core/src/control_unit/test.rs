use super::test_helpers::*;
use crate::error::MachineError;
use crate::machine::INSTRUCTION_LIMIT;

/// These tests drive whole programs through the translator and the
/// machine, asserting the output buffer, the counters, and the registers.
/// Tick totals are part of the machine's observable contract, so several
/// tests pin them exactly.

macro_rules! output_is {
    ($name:ident, $expected:expr, $text:expr) => {
        #[test]
        fn $name() {
            let summary = run_program($text, vec![]);
            assert_eq!(summary.output, $expected);
        }
    };
}

macro_rules! counters_are {
    ($name:ident, $instructions:expr, $ticks:expr, $text:expr) => {
        #[test]
        fn $name() {
            let summary = run_program($text, vec![]);
            assert_eq!(summary.instruction_counter, $instructions);
            assert_eq!(summary.tick_counter, $ticks);
        }
    };
}

mod scenarios {
    use super::*;

    // A counted loop over a string in the data section: the pointer cell is
    // advanced with load/inc/store, the length lives in r1.
    const HELLO: &str = "
        section .data:
        ptr: msg
        msg: \"Hi\"
        section .text:
        .text:
        move r1, #2
        move r3, #1
        loop:
        load r0, (ptr)
        out r0, 1
        load r2, ptr
        inc r2
        store r2, ptr
        sub r1, r1, r3
        jnz loop
        halt
    ";

    #[test]
    fn hello_prints_its_message() {
        let summary = run_program(HELLO, vec![]);
        assert_eq!(summary.output, "Hi");
        assert_eq!(summary.instruction_counter, 17);
    }

    // `ei` then spin; the handler echoes one key from port 0 to port 1.
    const ECHO: &str = "
        section .text:
        .text:
        ei
        spin:
        jmp spin
        .int1:
        in r0, 0
        out r0, 1
        iret
    ";

    #[test]
    fn echo_handles_one_scheduled_key() {
        let (machine, summary) = run_machine(ECHO, vec![(5, Some('A'))]);
        assert_eq!(summary.output, "A");
        // The spin loop never halts; the driver cuts the run off.
        assert_eq!(summary.instruction_counter, INSTRUCTION_LIMIT);
        // The handler saw the key, and the prologue stamped the return
        // address of the interrupted spin into r12.
        assert_eq!(general_register(&machine, 0), 65);
        assert_eq!(general_register(&machine, 12), 2);
    }

    #[test]
    fn a_raise_during_the_handler_is_lost() {
        // The second entry becomes due while the handler runs: no nesting,
        // and the key is gone once `iret` retires.
        let summary = run_program(ECHO, vec![(5, Some('A')), (6, Some('B'))]).output;
        assert_eq!(summary, "A");
    }

    #[test]
    fn interrupts_stay_off_without_ei() {
        let summary = run_program(
            "section .text:\n.text:\nmove r0, #1\nmove r0, #2\nhalt",
            vec![(0, Some('A'))],
        );
        assert_eq!(summary.output, "");
    }

    #[test]
    fn increment_wraps_against_the_upper_bound() {
        let (machine, summary) = run_machine(
            "section .text:\n.text:\nmove r0, #2147483647\ninc r0\nout r0, 1\nhalt",
            vec![],
        );
        // 2^31 wraps by modulus against the bound, landing on 1.
        assert_eq!(general_register(&machine, 0), 1);
        assert_eq!(summary.output, "\u{1}");
    }

    output_is!(
        taken_branch_skips_the_clobber,
        "\u{0}",
        "section .text:\n.text:\nmove r0, #0\nmove r1, #0\ncmp r0, r1\njz L1\nmove r0, #9\nL1:\nout r0, 1\nhalt"
    );

    output_is!(
        untaken_branch_falls_through,
        "\u{9}",
        "section .text:\n.text:\nmove r0, #0\nmove r1, #1\ncmp r0, r1\njz L1\nmove r0, #9\nL1:\nout r0, 1\nhalt"
    );

    #[test]
    fn halt_is_reached_and_counted() {
        let (machine, summary) = run_machine(
            "section .text:\n.text:\ninc r0\ninc r0\ninc r0\ninc r0\ninc r0\nhalt",
            vec![],
        );
        assert_eq!(summary.instruction_counter, 6);
        assert_eq!(general_register(&machine, 0), 5);
    }

    #[test]
    fn the_instruction_limit_cuts_off_spinning_programs() {
        let summary = run_program("section .text:\n.text:\nspin:\njmp spin", vec![]);
        assert_eq!(summary.instruction_counter, INSTRUCTION_LIMIT);
        assert_eq!(summary.output, "");
    }

    #[test]
    fn stores_are_visible_to_later_loads() {
        let (machine, summary) = run_machine(
            "section .data:\nx: 1\nsection .text:\n.text:\nmove r0, #65\nstore r0, x\nload r1, x\nout r1, 1\nhalt",
            vec![],
        );
        assert_eq!(summary.output, "A");
        assert_eq!(general_register(&machine, 1), 65);
    }

    #[test]
    fn output_length_matches_the_out_count() {
        let summary = run_program(HELLO, vec![]);
        assert_eq!(summary.output.chars().count(), 2);
    }
}

mod microcycles {
    use super::*;

    // Initialization costs 3 ticks, fetch 1, and `halt` retires in 1 more.
    counters_are!(bare_halt, 1, 5, "section .text:\n.text:\nhalt");

    // One-tick executors: 3 + (1 + 1) + (1 + 1).
    counters_are!(single_inc, 2, 7, "section .text:\n.text:\ninc r0\nhalt");
    counters_are!(
        single_move,
        2,
        7,
        "section .text:\n.text:\nmove r0, #5\nhalt"
    );

    // A port transfer spends an extra tick latching the port into AR.
    counters_are!(
        out_costs_three_ticks,
        3,
        10,
        "section .text:\n.text:\nmove r0, #65\nout r0, 1\nhalt"
    );

    // Direct memory access: operand cut, one resolution step, the
    // transfer, and the PC restore.
    counters_are!(
        direct_load,
        2,
        10,
        "section .data:\nx: 7\nsection .text:\n.text:\nload r1, x\nhalt"
    );

    #[test]
    fn indirect_load_takes_two_hops_and_saves_the_pc() {
        let (machine, summary) = run_machine(
            "section .data:\nptr: x\nx: 7\nsection .text:\n.text:\nload r1, (ptr)\nhalt",
            vec![],
        );
        assert_eq!(general_register(&machine, 1), 7);
        // IPC still holds the PC of the load itself.
        assert_eq!(machine.control_unit.data_path.register_file.ipc, 3);
        // One more tick than the direct form: 3 + 6 + 2.
        assert_eq!(summary.tick_counter, 11);
    }

    #[test]
    fn the_prologue_stamps_the_return_register() {
        // ei retires at tick 5; injection and the prologue follow, then the
        // handler's iret returns to the spin loop.
        let (machine, _) = run_machine(
            "section .text:\n.text:\nei\nspin:\njmp spin\n.int1:\niret",
            vec![(5, None)],
        );
        // The handler ran: r12 was stamped with the interrupted PC.
        assert_eq!(general_register(&machine, 12), 2);
    }
}

mod faults {
    use super::*;

    #[test]
    fn in_from_the_output_port_faults() {
        let fault = run_expecting_fault("section .text:\n.text:\nin r0, 1\nhalt", vec![]);
        assert_eq!(fault.kind, MachineError::InvalidPort(1));
    }

    #[test]
    fn out_to_the_input_port_faults() {
        let fault = run_expecting_fault("section .text:\n.text:\nout r0, 0\nhalt", vec![]);
        assert_eq!(fault.kind, MachineError::InvalidPort(0));
    }

    #[test]
    fn jumping_into_data_faults_on_fetch() {
        let fault = run_expecting_fault(
            "section .data:\nx: 5\nsection .text:\n.text:\njmp x",
            vec![],
        );
        assert_eq!(fault.kind, MachineError::UnknownOpcode(1));
        assert_eq!(fault.pc, 1);
    }

    #[test]
    fn mod_by_zero_faults() {
        let fault = run_expecting_fault(
            "section .text:\n.text:\nmove r1, #5\nmod r0, r1, r2\nhalt",
            vec![],
        );
        assert_eq!(fault.kind, MachineError::DivisionByZero);
    }

    #[test]
    fn faults_carry_the_tick_and_pc() {
        let fault = run_expecting_fault("section .text:\n.text:\nin r0, 1\nhalt", vec![]);
        // init (3) + fetch (1) + operand cut (1) have elapsed.
        assert_eq!(fault.tick, 5);
        assert_eq!(fault.pc, 1);
    }
}
