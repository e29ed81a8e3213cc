use mitsein::vec1::Vec1;
use tadpole_bytecode::Capture;
use tadpole_heap::{Function, Heap, HeapError, Roots};

/// A local variable slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Local<'src> {
    /// The variable's name. Slot 0 holds the callee and has an empty name.
    pub(crate) name: &'src str,
    /// The scope depth, or `None` while the initializer is still being compiled.
    pub(crate) depth: Option<usize>,
    /// Whether a closure captures the variable.
    pub(crate) is_captured: bool,
}

/// The state of one function under compilation.
#[derive(Debug)]
pub(crate) struct CompilerFrame<'src> {
    /// The function being built. It only moves into the heap once finished.
    pub(crate) function: Function,
    /// Locals in declaration order. Their index is their stack slot.
    pub(crate) locals: Vec<Local<'src>>,
    /// Deduplicated upvalue descriptors.
    pub(crate) upvalues: Vec<Capture>,
    /// The current scope depth.
    pub(crate) depth: usize,
}

impl<'src> CompilerFrame<'src> {
    pub(crate) fn new(function: Function) -> Self {
        Self {
            function,
            locals: vec![Local {
                name: "",
                depth: Some(0),
                is_captured: false,
            }],
            upvalues: Vec::new(),
            depth: 0,
        }
    }

    /// Find a local by name, innermost first. Returns its slot and whether it is initialized.
    pub(crate) fn find_local(&self, name: &str) -> Option<(usize, bool)> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|&(_, local)| local.name == name)
            .map(|(slot, local)| (slot, local.depth.is_some()))
    }

    /// Whether a local with this name already exists in the innermost scope.
    pub(crate) fn declared_in_scope(&self, name: &str) -> bool {
        self.locals
            .iter()
            .rev()
            .take_while(|local| local.depth.is_none_or(|depth| depth >= self.depth))
            .any(|local| local.name == name)
    }

    /// Add an upvalue descriptor, reusing an identical one.
    pub(crate) fn add_upvalue(&mut self, capture: Capture) -> Option<u8> {
        if let Some(index) = self.upvalues.iter().position(|&existing| existing == capture) {
            return u8::try_from(index).ok();
        }
        let index = u8::try_from(self.upvalues.len()).ok()?;
        self.upvalues.push(capture);
        Some(index)
    }
}

/// The roots of a compilation: every function still under construction, then whatever the
/// host already holds.
pub(crate) struct FrameRoots<'frames, 'src> {
    pub(crate) frames: &'frames Vec1<CompilerFrame<'src>>,
    pub(crate) outer: &'frames dyn Roots,
}

impl Roots for FrameRoots<'_, '_> {
    fn mark_roots(&self, heap: &mut Heap) -> Result<(), HeapError> {
        for frame in self.frames.iter() {
            if let Some(name) = frame.function.name {
                heap.mark_object(name)?;
            }
            for &constant in &frame.function.chunk.constants {
                heap.mark_value(constant)?;
            }
        }
        self.outer.mark_roots(heap)
    }
}
