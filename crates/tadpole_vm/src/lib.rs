//! A stack-based virtual machine for Tadpole.

/// Runtime errors.
pub mod error;
/// The IO interface.
pub mod io;
/// Builtin native functions.
mod native;

pub use error::{InterpretError, RuntimeError, RuntimeErrorKind, TraceEntry};

use crate::io::{IoContext, StdoutContext};
use crate::native::{
    Clock, GcCollect, GcCount, GcDisable, GcEnable, GcIsEnabled, GcThreshold, Print, Stringify,
    Time,
};
use compact_str::CompactString;
use core::fmt::Write as _;
use std::collections::HashMap;
use tadpole_bytecode::{ConstantIndex, Opcode, decode_captures};
use tadpole_compiler::CompileError;
use tadpole_heap::{
    Closure, Function, GcConfig, Handle, Heap, HeapError, Native, NativeContext,
    NativeFunction, Roots, StringObject, Upvalue, Value,
};

/// The deepest the call stack may grow.
const MAX_FRAMES: usize = 1024;

/// The control flow of the VM execution.
#[derive(Debug)]
enum ControlFlow {
    /// Continue execution.
    Continue,
    /// The call the run loop was started for returned this value.
    Done(Value),
}

/// A call frame.
#[derive(Debug, Clone, Copy)]
struct CallFrame {
    /// The call frame's closure.
    closure: Handle<Closure>,
    /// The closure's function.
    function: Handle<Function>,
    /// The instruction pointer.
    ip: usize,
    /// The stack slot holding the callee. Arguments follow it.
    base: usize,
}

/// Everything the VM mutates while running, and therefore everything a collection roots.
#[derive(Debug, Default)]
struct State {
    /// The value stack.
    stack: Vec<Value>,
    /// The call stack.
    frames: Vec<CallFrame>,
    /// The globals.
    globals: HashMap<Handle<StringObject>, Value>,
    /// The open upvalues, ordered by descending stack slot.
    open_upvalues: Option<Handle<Upvalue>>,
}

impl State {
    fn reset(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.open_upvalues = None;
    }
}

impl Roots for State {
    fn mark_roots(&self, heap: &mut Heap) -> Result<(), HeapError> {
        for value in &self.stack {
            heap.mark_value(*value)?;
        }

        for frame in &self.frames {
            heap.mark_object(frame.closure)?;
        }

        // Marking the head traces the rest of the chain.
        if let Some(head) = self.open_upvalues {
            heap.mark_object(head)?;
        }

        #[expect(
            clippy::iter_over_hash_type,
            reason = "garbage collection need not be deterministic."
        )]
        for (name, value) in &self.globals {
            heap.mark_object(*name)?;
            heap.mark_value(*value)?;
        }

        Ok(())
    }
}

/// The virtual machine.
pub struct Vm<O: IoContext = StdoutContext> {
    /// The heap every object lives on.
    heap: Heap,
    /// The stacks and globals.
    state: State,
    /// Where builtins write output.
    output: O,
}

impl Vm<StdoutContext> {
    /// A VM writing to standard output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    /// A VM writing to standard output with the given collector tuning.
    #[must_use]
    pub fn with_config(config: GcConfig) -> Self {
        Self::with_output_and_config(StdoutContext, config)
    }
}

impl Default for Vm<StdoutContext> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: IoContext> Vm<O> {
    /// A VM writing to the given output.
    #[must_use]
    pub fn with_output(output: O) -> Self {
        Self::with_output_and_config(output, GcConfig::default())
    }

    /// A VM writing to the given output with the given collector tuning.
    #[must_use]
    pub fn with_output_and_config(output: O, config: GcConfig) -> Self {
        Self {
            heap: Heap::new(config),
            state: State::default(),
            output,
        }
    }

    /// The heap.
    #[must_use]
    pub const fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Where builtins write output.
    #[must_use]
    pub const fn output(&self) -> &O {
        &self.output
    }

    /// Where builtins write output, mutably.
    pub const fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// The number of values on the stack.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.state.stack.len()
    }

    /// The number of active calls.
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.state.frames.len()
    }

    /// Look up a global by name.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Value> {
        self.state
            .globals
            .iter()
            .find(|&(&key, _)| self.heap.string(key).is_ok_and(|text| text == name))
            .map(|(_, &value)| value)
    }

    /// Bind a native function to a global of the same name, replacing any previous binding.
    pub fn define_native(&mut self, function: impl NativeFunction + 'static) {
        let name = self.heap.intern(function.name());
        let native = self.heap.alloc(Native::new(function));
        tracing::debug!("Defined native {}.", name_text(&self.heap, name));
        self.state.globals.insert(name, Value::Native(native));
    }

    /// Define the builtin natives: `print`, `time`, `clock`, `str` and the `gc_*` controls.
    pub fn register_builtins(&mut self) {
        self.define_native(Print);
        self.define_native(Time);
        self.define_native(Clock::default());
        self.define_native(Stringify);
        self.define_native(GcCount);
        self.define_native(GcCollect);
        self.define_native(GcThreshold);
        self.define_native(GcEnable);
        self.define_native(GcDisable);
        self.define_native(GcIsEnabled);
    }

    /// Run a full collection now, rooted in the VM's state. Returns the number of freed objects.
    ///
    /// # Errors
    /// Fails if a root is a stale handle.
    pub fn collect_garbage(&mut self) -> Result<usize, HeapError> {
        self.heap.collect(&self.state)
    }

    /// Lex and compile source code. Collections during compilation keep the VM's state alive.
    ///
    /// # Errors
    /// Returns every compile error found.
    pub fn compile(&mut self, source: &str) -> Result<Handle<Function>, Vec<CompileError>> {
        let tokens = tadpole_lexer::tokenize(source);
        tadpole_compiler::compile_with_roots(&tokens, &mut self.heap, &self.state)
    }

    /// Run a compiled top level function.
    ///
    /// # Errors
    /// This function will error at the first runtime error it encounters. The VM is reset
    /// and can be reused afterwards.
    pub fn interpret(&mut self, function: Handle<Function>) -> Result<(), RuntimeError> {
        let closure = self.heap.alloc(Closure {
            function,
            upvalues: Vec::new(),
        });
        self.call(Value::Closure(closure), &[])?;
        Ok(())
    }

    /// Compile and run source code.
    ///
    /// # Errors
    /// Fails if the source does not compile or if running it fails.
    pub fn interpret_source(&mut self, source: &str) -> Result<(), InterpretError> {
        let function = self.compile(source)?;
        self.interpret(function)?;
        Ok(())
    }

    /// Call a callable value with the given arguments and run it to completion.
    ///
    /// # Errors
    /// This function will error at the first runtime error it encounters. The VM is reset
    /// and can be reused afterwards.
    pub fn call(&mut self, callee: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        let stop_depth = self.state.frames.len();
        self.state.stack.push(callee);
        self.state.stack.extend_from_slice(args);

        let Ok(argc) = u8::try_from(args.len()) else {
            return Err(self.runtime_error(RuntimeErrorKind::TooManyArguments {
                name: self.callee_name(callee),
                actual: args.len(),
            }));
        };

        if let Err(kind) = self.call_value(argc) {
            return Err(self.runtime_error(kind));
        }

        // Natives finish immediately, leaving their result on the stack.
        if self.state.frames.len() == stop_depth {
            return self.pop().map_err(|kind| self.runtime_error(kind));
        }

        self.run(stop_depth)
    }

    /// Execute instructions until the call stack drops back to `stop_depth`.
    fn run(&mut self, stop_depth: usize) -> Result<Value, RuntimeError> {
        loop {
            if self.heap.should_collect() {
                self.heap
                    .collect(&self.state)
                    .map_err(|error| self.runtime_error(error.into()))?;
            }

            match self.step(stop_depth) {
                Ok(ControlFlow::Continue) => {}
                Ok(ControlFlow::Done(value)) => return Ok(value),
                Err(kind) => return Err(self.runtime_error(kind)),
            }
        }
    }

    /// Decode and execute one instruction.
    #[expect(clippy::too_many_lines, reason = "this function is hard to decompose.")]
    fn step(&mut self, stop_depth: usize) -> Result<ControlFlow, RuntimeErrorKind> {
        let frame = *self
            .state
            .frames
            .last()
            .ok_or(RuntimeErrorKind::EmptyCallStack)?;
        let (opcode, length) = {
            let code = &self.heap.get(frame.function)?.chunk.code;
            Opcode::decode(code.get(frame.ip..).unwrap_or_default())?
        };
        self.trace_instruction(&frame, opcode);
        self.current_frame_mut()?.ip = frame.ip + length;

        match opcode {
            Opcode::Constant(index) => {
                let value = self.constant(frame.function, index)?;
                self.push(value);
            }
            Opcode::Nil => self.push(Value::Nil),
            Opcode::True => self.push(Value::Bool(true)),
            Opcode::False => self.push(Value::Bool(false)),
            Opcode::Pop => {
                self.pop()?;
            }
            Opcode::DefineGlobal(index) => {
                let name = self.global_name(frame.function, index)?;
                if self.state.globals.contains_key(&name) {
                    return Err(RuntimeErrorKind::RedefinedGlobal(name_text(
                        &self.heap, name,
                    )));
                }
                let value = self.pop()?;
                self.state.globals.insert(name, value);
            }
            Opcode::GetGlobal(index) => {
                let name = self.global_name(frame.function, index)?;
                let Some(&value) = self.state.globals.get(&name) else {
                    return Err(RuntimeErrorKind::UndefinedGlobal(name_text(
                        &self.heap, name,
                    )));
                };
                self.push(value);
            }
            Opcode::SetGlobal(index) => {
                let name = self.global_name(frame.function, index)?;
                let value = self.peek(0)?;
                match self.state.globals.get_mut(&name) {
                    Some(global) => *global = value,
                    None => {
                        return Err(RuntimeErrorKind::UndefinedGlobal(name_text(
                            &self.heap, name,
                        )));
                    }
                }
            }
            Opcode::GetLocal(slot) => {
                let value = *self
                    .state
                    .stack
                    .get(frame.base + slot.to_usize())
                    .ok_or(RuntimeErrorKind::InvalidLocal)?;
                self.push(value);
            }
            Opcode::SetLocal(slot) => {
                let value = self.peek(0)?;
                *self
                    .state
                    .stack
                    .get_mut(frame.base + slot.to_usize())
                    .ok_or(RuntimeErrorKind::InvalidLocal)? = value;
            }
            Opcode::GetUpvalue(index) => {
                let upvalue = self.upvalue(frame.closure, index.to_usize())?;
                let value = match *self.heap.get(upvalue)? {
                    Upvalue::Open { slot, .. } => *self
                        .state
                        .stack
                        .get(slot)
                        .ok_or(RuntimeErrorKind::InvalidLocal)?,
                    Upvalue::Closed { value } => value,
                };
                self.push(value);
            }
            Opcode::SetUpvalue(index) => {
                let value = self.peek(0)?;
                let upvalue = self.upvalue(frame.closure, index.to_usize())?;
                match *self.heap.get_mut(upvalue)? {
                    Upvalue::Open { slot, .. } => {
                        *self
                            .state
                            .stack
                            .get_mut(slot)
                            .ok_or(RuntimeErrorKind::InvalidLocal)? = value;
                    }
                    Upvalue::Closed {
                        value: ref mut closed_value,
                    } => {
                        *closed_value = value;
                    }
                }
            }
            Opcode::Add => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                let result = Value::add(&mut self.heap, lhs, rhs)?;
                self.push(result);
            }
            Opcode::Sub => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.push(lhs.sub(rhs)?);
            }
            Opcode::Mul => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.push(lhs.mul(rhs)?);
            }
            Opcode::Div => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.push(lhs.div(rhs)?);
            }
            Opcode::Negate => {
                let value = self.pop()?;
                self.push(value.neg()?);
            }
            Opcode::Call(argc) => self.call_value(argc)?,
            Opcode::Closure(index) => {
                let Value::Function(function) = self.constant(frame.function, index)? else {
                    return Err(RuntimeErrorKind::InvalidConstant);
                };
                let count = self.heap.get(function)?.upvalue_count;
                let captures = {
                    let code = &self.heap.get(frame.function)?.chunk.code;
                    decode_captures(code.get(frame.ip + length..).unwrap_or_default(), count)?
                };
                self.current_frame_mut()?.ip += 2 * count;

                let mut upvalues = Vec::with_capacity(count);
                for capture in captures {
                    let upvalue = if capture.is_local {
                        self.capture_upvalue(frame.base + usize::from(capture.index))?
                    } else {
                        self.upvalue(frame.closure, usize::from(capture.index))?
                    };
                    upvalues.push(upvalue);
                }
                let closure = self.heap.alloc(Closure { function, upvalues });
                self.push(Value::Closure(closure));
            }
            Opcode::CloseUpvalue => {
                let top = self
                    .state
                    .stack
                    .len()
                    .checked_sub(1)
                    .ok_or(RuntimeErrorKind::EmptyStack)?;
                self.close_upvalues(top)?;
                self.pop()?;
            }
            Opcode::Return => {
                let result = self.pop()?;
                self.close_upvalues(frame.base)?;
                self.state.frames.pop();
                self.state.stack.truncate(frame.base);
                if self.state.frames.len() <= stop_depth {
                    return Ok(ControlFlow::Done(result));
                }
                self.push(result);
            }
        }

        Ok(ControlFlow::Continue)
    }

    /// Call the value sitting below `argc` arguments.
    fn call_value(&mut self, argc: u8) -> Result<(), RuntimeErrorKind> {
        let slot = self
            .state
            .stack
            .len()
            .checked_sub(usize::from(argc) + 1)
            .ok_or(RuntimeErrorKind::EmptyStack)?;
        let callee = *self
            .state
            .stack
            .get(slot)
            .ok_or(RuntimeErrorKind::EmptyStack)?;
        match callee {
            Value::Closure(closure) => self.call_closure(closure, slot, argc),
            Value::Native(native) => self.call_native(native, slot, argc),
            Value::Nil
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Function(_) => Err(RuntimeErrorKind::InvalidCallee),
        }
    }

    /// Call a closure.
    fn call_closure(
        &mut self,
        closure: Handle<Closure>,
        base: usize,
        argc: u8,
    ) -> Result<(), RuntimeErrorKind> {
        let function = self.heap.get(closure)?.function;
        let arity = self.heap.get(function)?.arity;
        if arity != argc {
            return Err(RuntimeErrorKind::InvalidArgumentCount {
                name: self.function_name(function),
                expected: arity,
                actual: argc,
            });
        }
        if self.state.frames.len() >= MAX_FRAMES {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.state.frames.push(CallFrame {
            closure,
            function,
            ip: 0,
            base,
        });
        Ok(())
    }

    /// Call a native function, replacing the callee and its arguments with the result.
    fn call_native(
        &mut self,
        native: Handle<Native>,
        base: usize,
        argc: u8,
    ) -> Result<(), RuntimeErrorKind> {
        let function = self.heap.get(native)?.function();
        let arity = function.arity();
        if !arity.accepts(argc) {
            let name = CompactString::const_new(function.name());
            return Err(match arity.bounds() {
                (min, max) if min == max => RuntimeErrorKind::InvalidArgumentCount {
                    name,
                    expected: min,
                    actual: argc,
                },
                (min, max) => RuntimeErrorKind::ArgumentCountOutOfRange {
                    name,
                    min,
                    max,
                    actual: argc,
                },
            });
        }

        let args = self
            .state
            .stack
            .get(base + 1..)
            .ok_or(RuntimeErrorKind::EmptyStack)?;
        let mut context = NativeContext {
            heap: &mut self.heap,
            output: &mut self.output,
        };
        let result =
            function
                .call(&mut context, args)
                .map_err(|error| RuntimeErrorKind::Native {
                    name: function.name(),
                    error,
                })?;
        self.state.stack.truncate(base);
        self.push(result);
        Ok(())
    }

    /// Capture a stack slot, reusing the open upvalue already aliasing it.
    fn capture_upvalue(&mut self, slot: usize) -> Result<Handle<Upvalue>, RuntimeErrorKind> {
        let mut previous = None;
        let mut current = self.state.open_upvalues;

        while let Some(handle) = current {
            let Upvalue::Open {
                slot: current_slot,
                next,
            } = *self.heap.get(handle)?
            else {
                return Err(RuntimeErrorKind::InvalidOpenUpvalue);
            };

            if current_slot < slot {
                break;
            }

            if current_slot == slot {
                return Ok(handle);
            }

            previous = Some(handle);
            current = next;
        }

        let created = self.heap.alloc(Upvalue::Open {
            slot,
            next: current,
        });

        match previous {
            // Update previous node's next pointer
            Some(previous) => match *self.heap.get_mut(previous)? {
                Upvalue::Open { ref mut next, .. } => *next = Some(created),
                Upvalue::Closed { .. } => return Err(RuntimeErrorKind::InvalidOpenUpvalue),
            },
            // Insert at head
            None => self.state.open_upvalues = Some(created),
        }

        Ok(created)
    }

    /// Close every open upvalue at or above `last`.
    fn close_upvalues(&mut self, last: usize) -> Result<(), RuntimeErrorKind> {
        while let Some(handle) = self.state.open_upvalues {
            let Upvalue::Open { slot, next } = *self.heap.get(handle)? else {
                return Err(RuntimeErrorKind::InvalidOpenUpvalue);
            };
            if slot < last {
                break;
            }

            let value = *self
                .state
                .stack
                .get(slot)
                .ok_or(RuntimeErrorKind::InvalidLocal)?;
            *self.heap.get_mut(handle)? = Upvalue::Closed { value };
            self.state.open_upvalues = next;
        }
        Ok(())
    }

    fn push(&mut self, value: Value) {
        self.state.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        self.state.stack.pop().ok_or(RuntimeErrorKind::EmptyStack)
    }

    fn peek(&self, distance: usize) -> Result<Value, RuntimeErrorKind> {
        self.state
            .stack
            .len()
            .checked_sub(distance + 1)
            .and_then(|slot| self.state.stack.get(slot))
            .copied()
            .ok_or(RuntimeErrorKind::EmptyStack)
    }

    fn current_frame_mut(&mut self) -> Result<&mut CallFrame, RuntimeErrorKind> {
        self.state
            .frames
            .last_mut()
            .ok_or(RuntimeErrorKind::EmptyCallStack)
    }

    fn constant(
        &self,
        function: Handle<Function>,
        index: ConstantIndex,
    ) -> Result<Value, RuntimeErrorKind> {
        self.heap
            .get(function)?
            .chunk
            .constant(index)
            .ok_or(RuntimeErrorKind::InvalidConstant)
    }

    fn global_name(
        &self,
        function: Handle<Function>,
        index: ConstantIndex,
    ) -> Result<Handle<StringObject>, RuntimeErrorKind> {
        match self.constant(function, index)? {
            Value::String(name) => Ok(name),
            _ => Err(RuntimeErrorKind::InvalidConstant),
        }
    }

    fn upvalue(
        &self,
        closure: Handle<Closure>,
        index: usize,
    ) -> Result<Handle<Upvalue>, RuntimeErrorKind> {
        self.heap
            .get(closure)?
            .upvalues
            .get(index)
            .copied()
            .ok_or(RuntimeErrorKind::InvalidUpvalue)
    }

    /// The name a function shows up as in traces.
    fn function_name(&self, function: Handle<Function>) -> CompactString {
        match self.heap.get(function).map(|function| function.name) {
            Ok(Some(name)) => name_text(&self.heap, name),
            Ok(None) | Err(_) => CompactString::const_new("script"),
        }
    }

    fn callee_name(&self, callee: Value) -> CompactString {
        match callee {
            Value::Closure(closure) => self.heap.get(closure).map_or_else(
                |_err| CompactString::const_new("?"),
                |closure| self.function_name(closure.function),
            ),
            Value::Native(native) => self.heap.get(native).map_or_else(
                |_err| CompactString::const_new("?"),
                |native| CompactString::const_new(native.name()),
            ),
            _ => CompactString::const_new("?"),
        }
    }

    /// Build the error with the current call trace, then reset the VM.
    fn runtime_error(&mut self, kind: RuntimeErrorKind) -> RuntimeError {
        let trace: Vec<TraceEntry> = self
            .state
            .frames
            .iter()
            .rev()
            .map(|frame| TraceEntry {
                line: self
                    .heap
                    .get(frame.function)
                    .ok()
                    .and_then(|function| function.chunk.line(frame.ip.saturating_sub(1)))
                    .unwrap_or(0),
                name: self.function_name(frame.function),
            })
            .collect();
        let line = trace.first().map_or(0, |entry| entry.line);
        tracing::debug!(
            "Runtime error on line {line}: {kind}. Resetting {} frames and {} values.",
            self.state.frames.len(),
            self.state.stack.len()
        );
        // Closures that escaped the unwound frames must not keep aliasing dead slots.
        if let Err(error) = self.close_upvalues(0) {
            tracing::warn!("Failed to close upvalues while resetting: {error}.");
        }
        self.state.reset();
        RuntimeError { kind, line, trace }
    }

    /// Log the stack and the instruction about to run.
    fn trace_instruction(&self, frame: &CallFrame, opcode: Opcode) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        let mut stack = String::new();
        for value in &self.state.stack {
            if write!(stack, "[ {} ]", value.resolve(&self.heap)).is_err() {
                stack.push_str("[ <stale> ]");
            }
        }
        tracing::trace!("{stack}");
        tracing::trace!("{:04} {opcode:?}", frame.ip);
    }
}

/// The text of an interned name, or a placeholder if the handle is stale.
fn name_text(heap: &Heap, name: Handle<StringObject>) -> CompactString {
    heap.string(name)
        .map_or_else(|_err| CompactString::const_new("?"), CompactString::from)
}

#[cfg(test)]
mod test {
    use super::{State, Vm};
    use crate::io::BufferContext;
    use tadpole_heap::{Closure, Function, GcConfig, Roots as _, Upvalue, Value};

    fn vm() -> Vm<BufferContext> {
        let mut vm = Vm::with_output(BufferContext::new());
        vm.register_builtins();
        vm
    }

    #[test]
    fn captures_share_one_cell_per_slot() {
        let mut vm = vm();
        vm.state.stack.extend([Value::Nil, Value::Number(1.0), Value::Number(2.0)]);
        let first = vm.capture_upvalue(1).unwrap();
        let second = vm.capture_upvalue(2).unwrap();
        let again = vm.capture_upvalue(1).unwrap();
        assert_eq!(first, again);
        assert_ne!(first, second);
        // Sorted by descending slot.
        assert_eq!(vm.state.open_upvalues, Some(second));
        assert!(matches!(
            *vm.heap.get(second).unwrap(),
            Upvalue::Open { slot: 2, next: Some(next) } if next == first
        ));
    }

    #[test]
    fn closing_stops_below_the_given_slot() {
        let mut vm = vm();
        vm.state.stack.extend([Value::Nil, Value::Number(1.0), Value::Number(2.0)]);
        let low = vm.capture_upvalue(1).unwrap();
        let high = vm.capture_upvalue(2).unwrap();
        vm.close_upvalues(2).unwrap();
        assert!(matches!(
            *vm.heap.get(high).unwrap(),
            Upvalue::Closed { value: Value::Number(2.0) }
        ));
        assert!(matches!(*vm.heap.get(low).unwrap(), Upvalue::Open { slot: 1, .. }));
        assert_eq!(vm.state.open_upvalues, Some(low));
    }

    #[test]
    fn state_roots_keep_frames_and_globals_alive() {
        let mut vm = Vm::with_output_and_config(BufferContext::new(), GcConfig::default());
        let function = vm.heap.alloc(Function::new(None));
        let closure = vm.heap.alloc(Closure {
            function,
            upvalues: Vec::new(),
        });
        let name = vm.heap.intern("answer");
        let garbage = vm.heap.intern("garbage");
        vm.state.globals.insert(name, Value::Number(42.0));
        vm.state.frames.push(super::CallFrame {
            closure,
            function,
            ip: 0,
            base: 0,
        });

        let freed = vm.heap.collect(&vm.state).unwrap();
        assert_eq!(freed, 1);
        assert!(vm.heap.get(garbage).is_err());
        assert!(vm.heap.get(function).is_ok());
        assert_eq!(vm.global("answer"), Some(Value::Number(42.0)));

        let mut state = State::default();
        state.globals.insert(garbage, Value::Nil);
        assert!(state.mark_roots(&mut vm.heap).is_err());
    }
}
