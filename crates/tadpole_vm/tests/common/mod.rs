use core::fmt::Write as _;
use tadpole_heap::GcConfig;
use tadpole_vm::io::BufferContext;
use tadpole_vm::{InterpretError, Vm};

fn run_interpreter(code: &str, config: GcConfig) -> String {
    let mut vm = Vm::with_output_and_config(BufferContext::new(), config);
    vm.register_builtins();
    let result = vm.interpret_source(code);
    let mut output = vm.output_mut().take();

    match result {
        Ok(()) => {}
        Err(InterpretError::Compile(errors)) => {
            for error in errors {
                writeln!(&mut output, "{error}").unwrap();
            }
        }
        Err(InterpretError::Runtime(error)) => {
            writeln!(&mut output, "{}", error.kind).unwrap();
        }
    }
    output
}

fn expected_output(code: &str) -> String {
    let mut output = String::new();
    for line in code.lines() {
        // Prints
        if let Some(pos) = line.rfind("// expect: ") {
            let needle = &line[pos + "// expect: ".len()..];
            if !needle.is_empty() {
                output.push_str(needle);
                output.push('\n');
            }
        }

        // [line 2] Error at `;`: expect expression
        if let Some(pos) = line.find("// [line ") {
            if let Some(error) = line[pos..].strip_prefix("// ") {
                output.push_str(error);
                output.push('\n');
            }
        }

        // Runtime errors
        if let Some(pos) = line.rfind("// expect runtime error: ") {
            let needle = &line[pos + "// expect runtime error: ".len()..];
            if !needle.is_empty() {
                output.push_str(needle);
                output.push('\n');
            }
        }
    }
    output
}

/// Compile and run the source code checking that the expected output and errors appear,
/// once normally and once collecting garbage before every instruction.
///
/// # Panics
/// When the expected output and actual output differ.
#[expect(
    clippy::allow_attributes,
    reason = "clippy/rust-analzyer is confused with the test organisation."
)]
#[allow(unreachable_pub, reason = "used by each test file.")]
pub fn check(code: &str) {
    let expected = expected_output(code);

    let output = run_interpreter(code, GcConfig::default());
    assert_eq!(expected, output, "check failed.");

    let stressed = GcConfig {
        stress: true,
        ..GcConfig::default()
    };
    let output = run_interpreter(code, stressed);
    assert_eq!(expected, output, "check failed under garbage collection stress.");
}
