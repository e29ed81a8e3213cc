use tadpole_bytecode::Opcode;
use tadpole_heap::{Chunk, Function, GcConfig, Handle, Heap, Object, Value};
use tadpole_vm::io::BufferContext;
use tadpole_vm::{InterpretError, RuntimeErrorKind, TraceEntry, Vm};

fn vm() -> Vm<BufferContext> {
    let mut vm = Vm::with_output(BufferContext::new());
    vm.register_builtins();
    vm
}

#[test]
fn equal_strings_are_one_object() {
    let mut vm = vm();
    vm.interpret_source(r#"let a = "tad" + "pole"; let b = "tadpole";"#)
        .unwrap();

    let a = vm.global("a").unwrap();
    let b = vm.global("b").unwrap();
    // Values compare strings by handle, so this is reference identity.
    assert_eq!(a, b);
    let Value::String(handle) = a else {
        panic!("expected a string, got {a:?}");
    };
    assert_eq!(vm.heap().string(handle).unwrap(), "tadpole");

    vm.collect_garbage().unwrap();
    let copies = vm
        .heap()
        .objects()
        .filter(|&(_, object)| {
            matches!(*object, Object::String(ref string) if string.as_str() == "tadpole")
        })
        .count();
    assert_eq!(copies, 1);
    // The pieces only lived in the finished script's constants.
    assert!(
        vm.heap()
            .objects()
            .all(|(_, object)| !matches!(*object, Object::String(ref string) if string.as_str() == "tad"))
    );
}

#[test]
fn runtime_errors_reset_the_vm() {
    let mut vm = vm();
    let error = vm
        .interpret_source("fn f(a) {\n  return a;\n}\nf(1, 2);")
        .unwrap_err();
    let InterpretError::Runtime(error) = error else {
        panic!("expected a runtime error, got {error:?}");
    };
    assert_eq!(
        error.kind,
        RuntimeErrorKind::InvalidArgumentCount {
            name: "f".into(),
            expected: 1,
            actual: 2,
        }
    );
    assert_eq!(error.line, 4);
    assert_eq!(vm.stack_depth(), 0);
    assert_eq!(vm.frame_depth(), 0);

    let error = vm.interpret_source(r#"let s = "s" + 1;"#).unwrap_err();
    assert!(matches!(
        error,
        InterpretError::Runtime(ref error) if error.kind == RuntimeErrorKind::InvalidAddOperands
    ));
    assert_eq!(vm.stack_depth(), 0);
    assert_eq!(vm.frame_depth(), 0);

    // Still usable afterwards, with earlier globals intact.
    vm.interpret_source("print(f(7));").unwrap();
    assert_eq!(vm.output().contents(), "7\n");
}

#[test]
fn traces_list_every_active_call() {
    let mut vm = vm();
    let source = r#"fn inner() {
  return "a" + 1;
}
fn outer() {
  return inner();
}
outer();"#;
    let InterpretError::Runtime(error) = vm.interpret_source(source).unwrap_err() else {
        panic!("expected a runtime error");
    };
    assert_eq!(
        error.trace,
        vec![
            TraceEntry {
                line: 2,
                name: "inner".into()
            },
            TraceEntry {
                line: 5,
                name: "outer".into()
            },
            TraceEntry {
                line: 7,
                name: "script".into()
            },
        ]
    );
    assert_eq!(
        error.to_string(),
        "Traceback (most recent call last):\n  [line 7] in script()\n  [line 5] in outer()\n  [line 2] in inner()\noperands must be two strings or two numerics"
    );
}

#[test]
fn host_calls_run_closures_to_completion() {
    let mut vm = vm();
    vm.interpret_source(
        "fn counter() { let n = 0; fn inc() { n = n + 1; return n; } return inc; }",
    )
    .unwrap();
    let counter = vm.global("counter").unwrap();

    let first = vm.call(counter, &[]).unwrap();
    assert_eq!(vm.call(first, &[]).unwrap(), Value::Number(1.0));
    assert_eq!(vm.call(first, &[]).unwrap(), Value::Number(2.0));
    let second = vm.call(counter, &[]).unwrap();
    assert_eq!(vm.call(second, &[]).unwrap(), Value::Number(1.0));
    assert_eq!(vm.call(first, &[]).unwrap(), Value::Number(3.0));
    assert_eq!(vm.stack_depth(), 0);

    let stringify = vm.global("str").unwrap();
    let Value::String(text) = vm.call(stringify, &[Value::Number(4.5)]).unwrap() else {
        panic!("str should return a string");
    };
    assert_eq!(vm.heap().string(text).unwrap(), "4.5");

    let error = vm.call(Value::Number(1.0), &[]).unwrap_err();
    assert_eq!(error.kind, RuntimeErrorKind::InvalidCallee);
}

#[test]
fn escaped_closures_survive_a_runtime_error() {
    let mut vm = vm();
    let error = vm
        .interpret_source(
            r#"let g;
fn f() {
  let x = "captured";
  fn get() {
    return x;
  }
  g = get;
  return 1 + nil;
}
f();"#,
        )
        .unwrap_err();
    assert!(matches!(error, InterpretError::Runtime(_)));
    assert_eq!(vm.stack_depth(), 0);

    // The stack slot that held `x` is gone, the closure must still see its value.
    vm.interpret_source(r#"let y = "other"; print(g());"#)
        .unwrap();
    assert_eq!(vm.output().contents(), "captured\n");
}

#[test]
fn collector_controls_are_scriptable() {
    let source = r#"print(gc_isenabled());
gc_disable();
print(gc_isenabled());
let before = gc_count();
str(1) + str(2) + str(3);
print(gc_count() - before);
gc_collect();
str(4);
print(gc_count() - before);
gc_enable();
print(gc_isenabled());
gc_disable();
print(gc_threshold(5000), gc_threshold());
let t = time();
let c = clock();
"#;
    let mut vm = Vm::with_output_and_config(
        BufferContext::new(),
        GcConfig {
            baseline: 4,
            growth_factor: 2,
            stress: true,
        },
    );
    vm.register_builtins();
    vm.interpret_source(source).unwrap();
    assert_eq!(
        vm.output().contents(),
        "true\nfalse\n0\n1\ntrue\n5000 5000\n"
    );
    assert_eq!(vm.heap().threshold(), 5000);
    assert!(!vm.heap().is_enabled());
    assert!(matches!(vm.global("t"), Some(Value::Number(seconds)) if seconds > 0.0));
    assert!(matches!(vm.global("c"), Some(Value::Number(seconds)) if seconds >= 0.0));

    let InterpretError::Runtime(error) = vm.interpret_source("gc_threshold(1, 2);").unwrap_err()
    else {
        panic!("expected a runtime error");
    };
    assert_eq!(
        error.kind,
        RuntimeErrorKind::ArgumentCountOutOfRange {
            name: "gc_threshold".into(),
            min: 0,
            max: 1,
            actual: 2,
        }
    );
    assert_eq!(
        error.kind.to_string(),
        "gc_threshold() takes from 0 to 1 arguments (2 given)"
    );
}

#[test]
fn stress_collection_is_transparent() {
    let source = r#"fn build(prefix) {
  let acc = prefix;
  fn add(piece) {
    acc = acc + piece;
    return acc;
  }
  return add;
}
let add = build("<");
add("a");
add("b");
let other = build("[");
other("x");
print(add(">"), other("]"));
gc_collect();
print(add("!"));
"#;
    let mut normal = vm();
    normal.interpret_source(source).unwrap();

    let mut stressed = Vm::with_output_and_config(
        BufferContext::new(),
        GcConfig {
            stress: true,
            ..GcConfig::default()
        },
    );
    stressed.register_builtins();
    stressed.interpret_source(source).unwrap();

    assert_eq!(normal.output().contents(), "<ab> [x]\n<ab>!\n");
    assert_eq!(stressed.output().contents(), normal.output().contents());
    assert!(stressed.heap().stats().collections > normal.heap().stats().collections);
    assert!(normal.heap().stats().collections >= 1);
}

#[test]
fn live_objects_stay_bounded_in_steady_state() {
    let mut vm = Vm::with_output_and_config(
        BufferContext::new(),
        GcConfig {
            baseline: 16,
            growth_factor: 2,
            stress: false,
        },
    );
    vm.register_builtins();
    let source: String = (0..200)
        .map(|index| format!("str({index}) + \"!\";\n"))
        .collect();
    vm.interpret_source(&source).unwrap();
    assert!(vm.heap().stats().collections > 0);
    assert!(vm.heap().stats().freed > 0);
}

fn assert_round_trips(heap: &Heap, handle: Handle<Function>) {
    let function = heap.get(handle).unwrap();
    let chunk = &function.chunk;
    let instructions = chunk.instructions(heap).unwrap();

    let mut encoded = Vec::new();
    let mut referenced: Vec<Option<Value>> = vec![None; chunk.constants.len()];
    for instruction in &instructions {
        instruction.encode(&mut encoded);
        match instruction.opcode {
            Opcode::Constant(index)
            | Opcode::DefineGlobal(index)
            | Opcode::GetGlobal(index)
            | Opcode::SetGlobal(index)
            | Opcode::Closure(index) => {
                let value = chunk.constant(index).unwrap();
                referenced[index.to_usize()] = Some(value);
            }
            _ => {}
        }
    }
    assert_eq!(encoded, chunk.code);
    assert_eq!(chunk.lines.len(), chunk.code.len());

    // Rebuilding the pool from the operands alone gives back the same pool.
    let mut rebuilt = Chunk::default();
    for (position, (value, original)) in referenced.iter().zip(&chunk.constants).enumerate() {
        let value = value.unwrap_or_else(|| panic!("constant {position} is never used"));
        assert!(value.same_constant(*original));
        let index = rebuilt.add_constant(value).unwrap();
        assert_eq!(index.to_usize(), position, "constant {position} is a duplicate");
    }
    assert_eq!(rebuilt.constants.len(), chunk.constants.len());

    for constant in &chunk.constants {
        if let Value::Function(nested) = *constant {
            assert_round_trips(heap, nested);
        }
    }
}

#[test]
fn bytecode_decodes_and_reencodes_identically() {
    let mut vm = vm();
    let function = vm
        .compile(
            r#"let greeting = "hi";
fn outer(a, b) {
  let local = a * b;
  fn inner() {
    local = local - 1;
    return greeting + str(local);
  }
  {
    let scoped = -local;
    fn capture() {
      return scoped;
    }
  }
  return inner;
}
print(outer(2, 3)());
"#,
        )
        .unwrap();
    assert_round_trips(vm.heap(), function);

    let mut listing = String::new();
    vm.heap()
        .get(function)
        .unwrap()
        .disassemble(&mut listing, vm.heap())
        .unwrap();
    assert!(listing.contains("Chunk <script>:"));
    assert!(listing.contains("Chunk <outer>:"));
    assert!(listing.contains("capture local"));
    assert!(listing.contains("closeupval"));
}
