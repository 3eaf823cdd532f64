use slog::Drain;

use oisc::{assembler, error::CompileError, program::Program};

#[test]
fn a_full_script_assembles_to_concrete_addresses() {
    let source = "\
; blinker: writes alternating bits into the gate instruction
#capture gate gate

start:\t0 gate +1
\t1 gate start
gate:  0 #0 #0
";

    let program = Program::assemble(source).unwrap();

    assert_eq!(program.dump(), "0 2 1\n1 2 0\n0 0 0");
    assert_eq!(program.labels["start"], 0);
    assert_eq!(program.labels["gate"], 2);
    assert_eq!(program.captures.by_left(&"gate".to_string()), Some(&2));

    // Provenance skips the comment, the directive and the blank line.
    assert_eq!(program.source_map.get_source_line(0), Some(3));
    assert_eq!(program.source_map.get_source_line(1), Some(4));
    assert_eq!(program.source_map.get_source_line(2), Some(5));
}

#[test]
fn well_formed_programs_resolve_every_field() {
    let source = "\
start: 0 +2 +2
       1 #0 #0
loop:  1 start loop
";

    let program = Program::assemble(source).unwrap();

    for instruction in &program.instructions {
        assert!(instruction.bit == "0" || instruction.bit == "1");
        assert!(instruction.copy < program.len());
        assert!(instruction.jump < program.len());
    }
}

#[test]
fn a_relative_reference_matches_the_label_it_lands_on() {
    let source = "\
start: 0 +2 +2
       0 #0 #0
loop:  1 #0 #0
";

    let program = Program::assemble(source).unwrap();

    assert_eq!(program.instructions[0].copy, program.labels["loop"]);
    assert_eq!(program.instructions[0].jump, program.labels["loop"]);
}

#[test]
fn capturing_the_same_address_twice_fails() {
    let source = "\
#capture clk pulse
#capture data pulse
pulse: 1 pulse pulse
";

    let err = Program::assemble(source).unwrap_err();

    assert_eq!(
        err,
        CompileError::DuplicateCaptureBinding {
            signal: "data".to_string(),
            address: 0,
        }
    );
}

#[test]
fn reusing_a_signal_name_fails() {
    let source = "\
#capture clk a
#capture clk b
a: 0 a b
b: 1 b a
";

    let err = Program::assemble(source).unwrap_err();

    assert!(matches!(err, CompileError::DuplicateCaptureBinding { .. }));
}

#[test]
fn assembling_the_same_source_twice_is_deterministic() {
    let source = "\
#capture clk loop
start: 0 +1 loop
loop:  1 -1 #0
";

    assert_eq!(
        assembler::assemble(source).unwrap(),
        assembler::assemble(source).unwrap()
    );
}

#[test]
fn assembly_traces_to_a_logger() {
    let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let logger = slog::Logger::root(drain, slog::o!());

    let program = assembler::assemble_with_logger("start: 1 start start\n", logger).unwrap();

    assert_eq!(program.len(), 1);
}
