//! Single pass compiler from tokens to bytecode.

mod error;
mod frame;
mod rule;

pub use error::{CompileError, CompileErrorKind, ErrorLocation};

use core::mem;
use frame::{CompilerFrame, FrameRoots, Local};
use mitsein::vec1::Vec1;
use rule::{Infix, Precedence, Prefix, rule};
use tadpole_bytecode::{Capture, ConstantIndex, LocalSlot, Opcode, UpvalueIndex};
use tadpole_heap::{Function, Handle, Heap, Roots, Value};
use tadpole_lexer::{Token, TokenKind};

/// The most locals a function can have, including the callee slot.
const MAX_LOCALS: usize = 256;
/// The most parameters a function can have and arguments a call can pass.
const MAX_ARITY: usize = 255;

/// Compile a token stream into the top level function.
///
/// # Errors
/// Returns every error found. Any error suppresses the function.
pub fn compile(
    tokens: &[Token<'_>],
    heap: &mut Heap,
) -> Result<Handle<Function>, Vec<CompileError>> {
    compile_with_roots(tokens, heap, &())
}

/// Like [`compile`] but any collection that happens while compiling also marks `roots`.
///
/// # Errors
/// Returns every error found. Any error suppresses the function.
pub fn compile_with_roots(
    tokens: &[Token<'_>],
    heap: &mut Heap,
    roots: &dyn Roots,
) -> Result<Handle<Function>, Vec<CompileError>> {
    tracing::debug!("Compiling {} tokens.", tokens.len());
    let mut compiler = Compiler::new(tokens, heap, roots);
    compiler.advance();
    while !compiler.eat(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.finish()
}

/// How a resolved variable is read and written.
#[derive(Debug, Clone, Copy)]
enum Access {
    Local(LocalSlot),
    Upvalue(UpvalueIndex),
    Global(ConstantIndex),
}

struct Compiler<'src, 'ctx> {
    /// The token stream.
    tokens: &'ctx [Token<'src>],
    /// The index of the token after `current`.
    position: usize,
    /// The token being looked at.
    current: Token<'src>,
    /// The token just consumed.
    previous: Token<'src>,
    /// The heap that constants are allocated in.
    heap: &'ctx mut Heap,
    /// Roots held by whoever asked for the compilation.
    outer_roots: &'ctx dyn Roots,
    /// The chain of functions under compilation, innermost last.
    frames: Vec1<CompilerFrame<'src>>,
    /// Errors reported so far.
    errors: Vec<CompileError>,
    /// Whether errors are suppressed until the next statement boundary.
    panic_mode: bool,
}

impl<'src, 'ctx> Compiler<'src, 'ctx> {
    fn new(
        tokens: &'ctx [Token<'src>],
        heap: &'ctx mut Heap,
        outer_roots: &'ctx dyn Roots,
    ) -> Self {
        let start = Token::eof(0, 1);
        Self {
            tokens,
            position: 0,
            current: start,
            previous: start,
            heap,
            outer_roots,
            frames: Vec1::from_one(CompilerFrame::new(Function::new(None))),
            errors: Vec::new(),
            panic_mode: false,
        }
    }

    fn finish(mut self) -> Result<Handle<Function>, Vec<CompileError>> {
        self.emit_return();
        if !self.errors.is_empty() {
            tracing::debug!("Compilation failed with {} errors.", self.errors.len());
            return Err(self.errors);
        }
        let script = mem::replace(&mut self.frames.last_mut().function, Function::new(None));
        self.log_function(&script, "script");
        Ok(self.heap.alloc(script))
    }
}

// Token handling.
impl<'src> Compiler<'src, '_> {
    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = match self.tokens.get(self.position) {
                Some(&token) => {
                    self.position += 1;
                    token
                }
                None => Token::eof(self.previous.span.end(), self.previous.line),
            };
            let kind = match self.current.tag {
                TokenKind::ErrorUnterminatedString => CompileErrorKind::UnterminatedString,
                TokenKind::ErrorUnknownChar => CompileErrorKind::UnexpectedCharacter,
                _ => break,
            };
            self.error_at(self.current, kind);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.tag == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &'static str) {
        if !self.eat(kind) {
            self.error_at(self.current, CompileErrorKind::Expected(message));
        }
    }

    fn error(&mut self, kind: CompileErrorKind) {
        self.error_at(self.previous, kind);
    }

    fn error_at(&mut self, token: Token<'src>, kind: CompileErrorKind) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        let location = match token.tag {
            TokenKind::Eof => ErrorLocation::AtEnd,
            tag if tag.is_error() => ErrorLocation::Lexical,
            _ => ErrorLocation::At(token.lexeme.into()),
        };
        self.errors.push(CompileError {
            kind,
            line: token.line,
            span: token.span,
            location,
        });
    }

    /// Skip tokens until something that looks like the start of a statement.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while !self.check(TokenKind::Eof) {
            if self.previous.tag == TokenKind::Semicolon {
                return;
            }
            if matches!(
                self.current.tag,
                TokenKind::KeywordFn | TokenKind::KeywordLet | TokenKind::KeywordReturn
            ) {
                return;
            }
            self.advance();
        }
    }
}

// Emission.
impl Compiler<'_, '_> {
    fn frame(&self) -> &CompilerFrame<'_> {
        self.frames.last()
    }

    fn emit(&mut self, opcode: Opcode) {
        let line = self.previous.line;
        self.frames.last_mut().function.chunk.emit(opcode, line);
    }

    fn emit_return(&mut self) {
        self.emit(Opcode::Nil);
        self.emit(Opcode::Return);
    }

    fn make_constant(&mut self, value: Value) -> ConstantIndex {
        if let Some(index) = self.frames.last_mut().function.chunk.add_constant(value) {
            return index;
        }
        self.error(CompileErrorKind::TooManyConstants);
        ConstantIndex::from(0)
    }

    fn identifier_constant(&mut self, name: &str) -> ConstantIndex {
        let name = self.heap.intern(name);
        self.make_constant(Value::String(name))
    }

    /// Collect garbage if the heap asks for it. Called where every handle the compiler
    /// created is stored in some frame's function.
    fn collect_garbage(&mut self) {
        if !self.heap.should_collect() {
            return;
        }
        let roots = FrameRoots {
            frames: &self.frames,
            outer: self.outer_roots,
        };
        if let Err(error) = self.heap.collect(&roots) {
            self.error_at(self.current, CompileErrorKind::Heap(error));
        }
    }

    fn log_function(&self, function: &Function, name: &str) {
        tracing::debug!(
            "Compiled <{name}> with arity {}, {} upvalues and {} bytes of code.",
            function.arity,
            function.upvalue_count,
            function.chunk.code.len()
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut buffer = String::new();
            if function.chunk.disassemble(&mut buffer, self.heap, name).is_ok() {
                tracing::trace!("\n{buffer}");
            }
        }
    }
}

// Scopes and variables.
impl<'src> Compiler<'src, '_> {
    fn begin_scope(&mut self) {
        self.frames.last_mut().depth += 1;
    }

    /// Leave a block, discarding its locals and closing the captured ones.
    fn end_scope(&mut self) {
        let frame = self.frames.last_mut();
        frame.depth -= 1;
        let depth = frame.depth;
        while let Some(&local) = self.frames.last().locals.last() {
            if local.depth.is_some_and(|local_depth| local_depth <= depth) {
                break;
            }
            self.frames.last_mut().locals.pop();
            if local.is_captured {
                self.emit(Opcode::CloseUpvalue);
            } else {
                self.emit(Opcode::Pop);
            }
        }
    }

    fn add_local(&mut self, name: &'src str) {
        let frame = self.frames.last_mut();
        if frame.locals.len() >= MAX_LOCALS {
            self.error(CompileErrorKind::TooManyLocals);
            return;
        }
        frame.locals.push(Local {
            name,
            depth: None,
            is_captured: false,
        });
    }

    /// Declare the local named by the previous token. Globals are not declared.
    fn declare_local(&mut self) {
        if self.frame().depth == 0 {
            return;
        }
        let name = self.previous.lexeme;
        if self.frame().declared_in_scope(name) {
            self.error(CompileErrorKind::Redeclaration(name.into()));
        }
        self.add_local(name);
    }

    fn mark_initialized(&mut self) {
        let frame = self.frames.last_mut();
        if frame.depth == 0 {
            return;
        }
        let depth = frame.depth;
        if let Some(local) = frame.locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    /// Consume a variable name, returning its name constant if it is a global.
    fn parse_variable(&mut self, message: &'static str) -> Option<ConstantIndex> {
        self.consume(TokenKind::Ident, message);
        self.declare_local();
        if self.frame().depth > 0 {
            return None;
        }
        Some(self.identifier_constant(self.previous.lexeme))
    }

    fn define_variable(&mut self, global: Option<ConstantIndex>) {
        match global {
            Some(global) => self.emit(Opcode::DefineGlobal(global)),
            None => self.mark_initialized(),
        }
    }

    /// Find a local of the given frame.
    fn resolve_local(&mut self, frame: usize, name: &str) -> Option<u8> {
        let (slot, initialized) = self.frames.get(frame)?.find_local(name)?;
        if !initialized {
            self.error(CompileErrorKind::SelfReferentialInitializer);
        }
        u8::try_from(slot).ok()
    }

    /// Find a variable of an enclosing function, threading an upvalue through every
    /// function in between.
    fn resolve_upvalue(&mut self, frame: usize, name: &str) -> Option<u8> {
        let enclosing = frame.checked_sub(1)?;
        if let Some(slot) = self.resolve_local(enclosing, name) {
            if let Some(local) = self
                .frames
                .get_mut(enclosing)
                .and_then(|frame| frame.locals.get_mut(usize::from(slot)))
            {
                local.is_captured = true;
            }
            return Some(self.add_upvalue(frame, Capture {
                is_local: true,
                index: slot,
            }));
        }
        let index = self.resolve_upvalue(enclosing, name)?;
        Some(self.add_upvalue(frame, Capture {
            is_local: false,
            index,
        }))
    }

    fn add_upvalue(&mut self, frame: usize, capture: Capture) -> u8 {
        let added = self
            .frames
            .get_mut(frame)
            .and_then(|frame| frame.add_upvalue(capture));
        added.unwrap_or_else(|| {
            self.error(CompileErrorKind::TooManyUpvalues);
            0
        })
    }

    fn resolve(&mut self, name: &str) -> Access {
        let current = usize::from(self.frames.len()) - 1;
        if let Some(slot) = self.resolve_local(current, name) {
            return Access::Local(slot.into());
        }
        if let Some(index) = self.resolve_upvalue(current, name) {
            return Access::Upvalue(index.into());
        }
        Access::Global(self.identifier_constant(name))
    }
}

// Declarations and statements.
impl Compiler<'_, '_> {
    fn declaration(&mut self) {
        self.collect_garbage();
        if self.eat(TokenKind::KeywordFn) {
            self.fn_declaration();
        } else if self.eat(TokenKind::KeywordLet) {
            self.let_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn fn_declaration(&mut self) {
        let global = self.parse_variable("expect function name");
        // A function may refer to itself.
        self.mark_initialized();
        self.function();
        self.define_variable(global);
    }

    fn let_declaration(&mut self) {
        let global = self.parse_variable("expect variable name");
        if self.eat(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit(Opcode::Nil);
        }
        self.consume(
            TokenKind::Semicolon,
            "expect `;` after variable declaration",
        );
        self.define_variable(global);
    }

    /// Compile a function's parameters and body and emit the closure instruction.
    fn function(&mut self) {
        let name = self.heap.intern(self.previous.lexeme);
        self.frames
            .push(CompilerFrame::new(Function::new(Some(name))));
        self.begin_scope();

        self.consume(TokenKind::LeftParenthesis, "expect `(` after function name");
        if !self.check(TokenKind::RightParenthesis) {
            loop {
                let frame = self.frames.last_mut();
                if usize::from(frame.function.arity) == MAX_ARITY {
                    self.error_at(self.current, CompileErrorKind::TooManyParameters);
                } else {
                    frame.function.arity += 1;
                }
                let parameter = self.parse_variable("expect parameter name");
                self.define_variable(parameter);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParenthesis, "expect `)` after parameters");
        self.consume(TokenKind::LeftBrace, "expect `{` before function body");
        // The body's scope is never left: returning discards the whole frame.
        self.block();
        self.emit_return();

        let Some(frame) = self.frames.pop().or_none() else {
            return;
        };
        let CompilerFrame {
            mut function,
            upvalues,
            ..
        } = frame;
        function.upvalue_count = upvalues.len();
        let display_name = self.function_name(&function);
        self.log_function(&function, &display_name);

        let function = self.heap.alloc(function);
        let constant = self.make_constant(Value::Function(function));
        self.emit(Opcode::Closure(constant));
        let line = self.previous.line;
        for capture in upvalues {
            self.frames
                .last_mut()
                .function
                .chunk
                .emit_capture(capture, line);
        }
    }

    fn function_name(&self, function: &Function) -> String {
        function
            .name
            .and_then(|name| self.heap.string(name).ok())
            .unwrap_or("script")
            .to_owned()
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "expect `}` after block");
    }

    fn statement(&mut self) {
        if self.eat(TokenKind::KeywordReturn) {
            self.return_statement();
        } else if self.eat(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn return_statement(&mut self) {
        if usize::from(self.frames.len()) == 1 {
            self.error(CompileErrorKind::TopLevelReturn);
        }
        if self.eat(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            self.expression();
            self.consume(TokenKind::Semicolon, "expect `;` after return value");
            self.emit(Opcode::Return);
        }
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "expect `;` after expression");
        self.emit(Opcode::Pop);
    }
}

// Expressions.
impl Compiler<'_, '_> {
    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule(self.previous.tag).prefix else {
            self.error(CompileErrorKind::ExpectedExpression);
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        self.prefix(prefix, can_assign);

        while precedence <= rule(self.current.tag).precedence {
            self.advance();
            if let Some(infix) = rule(self.previous.tag).infix {
                self.infix(infix);
            }
        }

        if can_assign && self.eat(TokenKind::Equal) {
            self.error(CompileErrorKind::InvalidAssignmentTarget);
        }
    }

    fn prefix(&mut self, prefix: Prefix, can_assign: bool) {
        match prefix {
            Prefix::Grouping => {
                self.expression();
                self.consume(TokenKind::RightParenthesis, "expect `)` after expression");
            }
            Prefix::Unary => {
                self.parse_precedence(Precedence::Unary);
                self.emit(Opcode::Negate);
            }
            Prefix::Number => self.number(),
            Prefix::String => self.string(),
            Prefix::Literal => match self.previous.tag {
                TokenKind::KeywordFalse => self.emit(Opcode::False),
                TokenKind::KeywordTrue => self.emit(Opcode::True),
                _ => self.emit(Opcode::Nil),
            },
            Prefix::Variable => self.variable(can_assign),
        }
    }

    fn infix(&mut self, infix: Infix) {
        match infix {
            Infix::Binary => {
                let operator = self.previous.tag;
                self.parse_precedence(rule(operator).precedence.next());
                match operator {
                    TokenKind::Plus => self.emit(Opcode::Add),
                    TokenKind::Minus => self.emit(Opcode::Sub),
                    TokenKind::Star => self.emit(Opcode::Mul),
                    _ => self.emit(Opcode::Div),
                }
            }
            Infix::Call => {
                let argc = self.argument_list();
                self.emit(Opcode::Call(argc));
            }
        }
    }

    fn number(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => {
                let constant = self.make_constant(Value::Number(value));
                self.emit(Opcode::Constant(constant));
            }
            Err(_err) => self.error(CompileErrorKind::InvalidNumber),
        }
    }

    fn string(&mut self) {
        let lexeme = self.previous.lexeme;
        let text = lexeme
            .strip_prefix('"')
            .and_then(|inner| inner.strip_suffix('"'))
            .unwrap_or(lexeme);
        let string = self.heap.intern(text);
        let constant = self.make_constant(Value::String(string));
        self.emit(Opcode::Constant(constant));
    }

    fn variable(&mut self, can_assign: bool) {
        let access = self.resolve(self.previous.lexeme);
        let (get, set) = match access {
            Access::Local(slot) => (Opcode::GetLocal(slot), Opcode::SetLocal(slot)),
            Access::Upvalue(index) => (Opcode::GetUpvalue(index), Opcode::SetUpvalue(index)),
            Access::Global(name) => (Opcode::GetGlobal(name), Opcode::SetGlobal(name)),
        };
        if can_assign && self.eat(TokenKind::Equal) {
            self.expression();
            self.emit(set);
        } else {
            self.emit(get);
        }
    }

    fn argument_list(&mut self) -> u8 {
        let mut argc: usize = 0;
        if !self.check(TokenKind::RightParenthesis) {
            loop {
                self.expression();
                if argc == MAX_ARITY {
                    self.error(CompileErrorKind::TooManyArguments);
                } else {
                    argc += 1;
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParenthesis, "expect `)` after arguments");
        u8::try_from(argc).unwrap_or(u8::MAX)
    }
}
