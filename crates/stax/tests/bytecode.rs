//! Byte-level properties of the compiled image: header discipline, literal
//! width selection, and the decoder-based consumers (VM and printer) on
//! malformed input.

use stax::{
    disassemble, execute, CollectOutput, Compilation, DecodeError, Reporter, RuntimeError,
    VirtualMachine, HEADER_LEN, MAGIC,
};

fn compile(source: &str) -> Vec<u8> {
    Compilation::new(source).unwrap().into_bytecode()
}

fn image(memory: u32, code: &[u8]) -> Vec<u8> {
    let mut bytes = MAGIC.to_be_bytes().to_vec();
    bytes.extend_from_slice(&memory.to_be_bytes());
    bytes.extend_from_slice(code);
    bytes
}

#[test]
fn every_image_starts_with_magic_and_memory_count() {
    for (source, vars) in [
        ("", 0u32),
        ("print 1;", 0),
        ("a = 1;", 1),
        ("a = 1; b = 2; c = 3;", 3),
    ] {
        let bytes = compile(source);
        assert_eq!(&bytes[..4], &[0x13, 0x37, 0xD0, 0x0D], "source: {source}");
        assert_eq!(&bytes[4..8], &vars.to_be_bytes(), "source: {source}");
    }
}

#[test]
fn assign_and_print_golden_bytes() {
    // a = 1; print a;
    // index 0 as CONST_1B, value via CONST_1, SWAP, STORE;
    // then index 0, LOAD, PRINT.
    let bytes = compile("a = 1; print a;");
    assert_eq!(
        bytes,
        vec![
            0x13, 0x37, 0xD0, 0x0D, 0x00, 0x00, 0x00, 0x01, // header
            0x03, 0x00, 0x0D, 0x0A, 0x02, // CONST_1B 0, CONST_1, SWAP, STORE
            0x03, 0x00, 0x01, 0x0B, // CONST_1B 0, LOAD, PRINT
        ]
    );
}

#[test]
fn literal_width_selection_is_exactly_the_narrowest_fit() {
    let cases: &[(i64, &[u8])] = &[
        (0, &[12]),
        (1, &[13]),
        (2, &[3, 2]),
        (127, &[3, 127]),
        (128, &[4, 0, 128]),
        (32767, &[4, 0x7F, 0xFF]),
        (32768, &[5, 0, 0, 0x80, 0]),
        (2147483647, &[5, 0x7F, 0xFF, 0xFF, 0xFF]),
    ];
    for (value, encoding) in cases {
        let bytes = compile(&format!("print {value};"));
        let mut expected = encoding.to_vec();
        expected.push(11); // PRINT
        assert_eq!(&bytes[HEADER_LEN..], &expected[..], "literal {value}");
    }
}

#[test]
fn negative_literals_reach_their_narrow_encodings_through_negation() {
    // -128 is the positive 128 (CONST_2B) negated, not CONST_1B -128: the
    // scanner never sees a negative literal.
    let bytes = compile("print -128;");
    assert_eq!(&bytes[HEADER_LEN..], &[4, 0, 128, 12, 10, 7, 11]);
}

#[test]
fn compiled_images_round_trip_through_the_vm() {
    let bytes = compile("a = 300; b = 70000; print a + b;");
    let mut out = CollectOutput::new();
    execute(&bytes, &mut out).unwrap();
    assert_eq!(out.output(), "70300\n");
}

#[test]
fn vm_rejects_bad_magic_without_executing() {
    let mut bytes = compile("print 1;");
    bytes[0] = 0xFF;
    let mut out = CollectOutput::new();
    let err = execute(&bytes, &mut out).unwrap_err();
    assert_eq!(err, RuntimeError::BadMagic { found: 0xFF37_D00D });
    assert_eq!(out.output(), "", "nothing may execute after a bad magic");
    assert_eq!(err.to_string(), "Invalid magic number (0xff37d00d)");
}

#[test]
fn vm_faults_on_unknown_opcode_with_its_pc() {
    let program = image(0, &[13, 0xFF]);
    let mut out = CollectOutput::new();
    let err = execute(&program, &mut out).unwrap_err();
    assert_eq!(err, RuntimeError::UnknownInstruction { pc: 9, byte: 0xFF });
    assert_eq!(err.to_string(), "Unknown instruction (0xff) at 9");
}

#[test]
fn printer_reports_unknown_opcode_and_continues() {
    let program = image(0, &[0xFF, 13, 11]);
    let mut out = CollectOutput::new();
    disassemble(&program, &mut out).unwrap();
    let text = out.into_output();
    assert!(text.contains(" 8: Unknown instruction (0xff)\n"));
    assert!(text.contains(" 9: CONST_1\n"));
    assert!(text.contains("10: PRINT\n"));
}

#[test]
fn printer_lists_a_compiled_program() {
    let bytes = compile("a = 1; print a;");
    let mut out = CollectOutput::new();
    disassemble(&bytes, &mut out).unwrap();
    assert_eq!(
        out.output(),
        "PROGRAM INFO:\n\
         Total code size: 17 bytes\n\
         Magic value: 0x1337d00d\n\
         Memory size (number of 4-byte values): 1\n\
         \n\
         CODE:\n\
         \x20 8: CONST_1B (0)\n\
         10: CONST_1\n\
         11: SWAP\n\
         12: STORE\n\
         13: CONST_1B (0)\n\
         15: LOAD\n\
         16: PRINT\n"
    );
}

#[test]
fn truncated_operand_is_a_decode_error_for_both_consumers() {
    let program = image(0, &[4, 1]);

    let mut out = CollectOutput::new();
    let err = disassemble(&program, &mut out).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedOperand { pc: 8, .. }));
    assert_eq!(err.to_string(), "Unexpected end of code in CONST_2B operand at 8");

    let mut out = CollectOutput::new();
    let err = execute(&program, &mut out).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Malformed(DecodeError::TruncatedOperand { pc: 8, .. })
    ));
}

#[test]
fn runtime_diagnostics_render_through_the_reporter() {
    let program = image(0, &[13, 12, 9]);
    let mut out = CollectOutput::new();
    let err = execute(&program, &mut out).unwrap_err();
    let mut diag = CollectOutput::new();
    Reporter::new(&mut diag).error(&err);
    assert_eq!(diag.output(), "[ERROR] Division by zero at 10\n");
}

#[test]
fn vm_is_reusable_after_a_fault() {
    let mut vm = VirtualMachine::new();
    let mut out = CollectOutput::new();
    assert!(vm.execute(&image(0, &[9]), &mut out).is_err());
    vm.execute(&compile("print 6;"), &mut out).unwrap();
    assert_eq!(out.output(), "6\n");
}
