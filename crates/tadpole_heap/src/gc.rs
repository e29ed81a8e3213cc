//! Arena based heap and mark-and-sweep garbage collector.

use crate::object::{HeapObject, Object, StringObject, Trace as _, hash_string};
use crate::value::Value;
use compact_str::CompactString;
use core::any;
use core::fmt;
use core::hash;
use core::iter;
use core::marker;
use core::mem;
use core::num::NonZeroU32;
use std::collections::HashMap;

/// The default number of live objects below which no collection happens.
const GC_BASELINE: usize = 256;
/// The default growth factor relative to the number of survivors of a collection.
const GC_GROWTH_FACTOR: usize = 2;

/// A raw index into the arena.
/// This has no associated generation and is to be used in the
/// internal implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ArenaPtr(NonZeroU32);

impl ArenaPtr {
    /// Create a new arena pointer failing if the index does not fit into
    /// the internal representation or if it is zero i.e. the null pointer.
    fn new(index: usize) -> Option<Self> {
        NonZeroU32::new(u32::try_from(index).ok()?).map(ArenaPtr)
    }

    /// Convert to index to be used when indexing the internal arena data representation.
    fn to_index(self) -> usize {
        (u32::from(self.0) as usize) - 1
    }
}

/// An entry's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// Increment the generation.
    const fn increment(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Return the raw integer.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The color of an entry to be used during mark and sweep garbage collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkColor {
    /// Unvisited.
    White,
    /// Visited but references aren't traced yet.
    Grey,
    /// Visited with references traced.
    Black,
}

/// An entry in the arena.
#[derive(Debug)]
enum Entry {
    /// A free entry in the arena.
    /// Can be reused for new allocations.
    Free {
        /// The entry's generation.
        generation: Generation,
        /// The next free entry if it exists.
        next_free: Option<ArenaPtr>,
    },
    /// A used entry in the arena.
    Used {
        /// The color of the entry.
        color: MarkColor,
        /// The entry's generation.
        generation: Generation,
        /// The next older object in the list of all objects.
        next: Option<ArenaPtr>,
        /// The object itself.
        object: Object,
    },
}

/// An untyped handle to any heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIndex {
    /// The index into the arena.
    ptr: ArenaPtr,
    /// The entry's generation.
    generation: Generation,
}

/// A handle to an object of a known kind.
pub struct Handle<T> {
    /// The untyped handle.
    index: ObjectIndex,
    /// Type marker to tie handle to allocated value type.
    _marker: marker::PhantomData<T>,
}

impl<T> Handle<T> {
    const fn new(index: ObjectIndex) -> Self {
        Self {
            index,
            _marker: marker::PhantomData,
        }
    }

    /// Return the untyped handle.
    #[must_use]
    pub const fn index(self) -> ObjectIndex {
        self.index
    }
}

impl<T> fmt::Debug for Handle<T> {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("slot", &self.index.ptr.to_index())
            .field("generation", &self.index.generation.raw())
            .field("type", &any::type_name::<T>())
            .finish()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> hash::Hash for Handle<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> From<Handle<T>> for ObjectIndex {
    fn from(value: Handle<T>) -> Self {
        value.index
    }
}

/// Errors when dereferencing a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The handle's index is out of bounds.
    OutOfBounds {
        /// The out of bounds index.
        index: usize,
    },
    /// The handle's generation is out of date.
    WrongGeneration {
        /// The entry's generation.
        expected: Generation,
        /// The handle's generation.
        actual: Generation,
    },
    /// The handle points to a freed entry.
    Free {
        /// The index to the free entry.
        index: usize,
    },
    /// The handle points to an object of another kind.
    WrongKind {
        /// The kind the handle expects.
        expected: &'static str,
        /// The kind actually stored.
        actual: &'static str,
    },
}

impl fmt::Display for HeapError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HeapError::OutOfBounds { index } => write!(f, "heap slot {index} is out of bounds"),
            HeapError::WrongGeneration { expected, actual } => write!(
                f,
                "stale handle of generation {} (slot is at generation {})",
                actual.raw(),
                expected.raw()
            ),
            HeapError::Free { index } => write!(f, "heap slot {index} has been freed"),
            HeapError::WrongKind { expected, actual } => {
                write!(f, "expected a {expected} but found a {actual}")
            }
        }
    }
}

/// Garbage collector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcConfig {
    /// The threshold never drops below this many live objects.
    pub baseline: usize,
    /// The threshold after a collection is the number of survivors times this.
    pub growth_factor: usize,
    /// Collect at every safe point.
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            baseline: GC_BASELINE,
            growth_factor: GC_GROWTH_FACTOR,
            stress: false,
        }
    }
}

/// Heap statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
    /// The number of live objects.
    pub live: usize,
    /// The number of collections run so far.
    pub collections: usize,
    /// The total number of objects freed by collections.
    pub freed: usize,
    /// The live object count above which the next collection happens.
    pub threshold: usize,
}

/// Enumerates the roots of a collection.
pub trait Roots {
    /// Mark every root on the heap.
    ///
    /// # Errors
    /// Fails if a root is a stale handle.
    fn mark_roots(&self, heap: &mut Heap) -> Result<(), HeapError>;
}

impl Roots for () {
    fn mark_roots(&self, _heap: &mut Heap) -> Result<(), HeapError> {
        Ok(())
    }
}

/// The garbage collected heap.
#[derive(Debug)]
pub struct Heap {
    /// The underlying data store.
    entries: Vec<Entry>,
    /// The list of free entries.
    free_list: Option<ArenaPtr>,
    /// The most recently allocated object. Every live object is reachable from here through `next`.
    head: Option<ArenaPtr>,
    /// Interned strings keyed by hash. Does not keep its strings alive.
    strings: HashMap<u32, Vec<Handle<StringObject>>>,

    // GC
    /// The work queue for objects to trace.
    grey_stack: Vec<ObjectIndex>,
    /// Tuning.
    config: GcConfig,
    /// The live object count above which a collection is due.
    threshold: usize,
    /// Whether a collection was asked for explicitly.
    requested: bool,
    /// Whether collections start on their own at safe points.
    enabled: bool,
    /// The number of live objects.
    live: usize,
    /// The number of collections run.
    collections: usize,
    /// The total number of objects freed.
    freed: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(GcConfig::default())
    }
}

impl Heap {
    /// Create an empty heap.
    #[must_use]
    pub fn new(config: GcConfig) -> Self {
        Self {
            entries: Vec::new(),
            free_list: None,
            head: None,
            strings: HashMap::new(),
            grey_stack: Vec::new(),
            config,
            threshold: config.baseline,
            requested: false,
            enabled: true,
            live: 0,
            collections: 0,
            freed: 0,
        }
    }

    /// Allocate an object and link it into the object list.
    /// Never collects; collection only happens at safe points through [`Heap::collect`].
    pub fn alloc<T: HeapObject>(&mut self, object: T) -> Handle<T> {
        let object = object.into_object();
        let (ptr, generation) = if let Some(free) = self.next_free() {
            free
        } else {
            let generation = Generation(0);
            self.entries.push(Entry::Free {
                generation,
                next_free: None,
            });
            let ptr = ArenaPtr::new(self.entries.len()).expect("ran out of heap capacity.");
            (ptr, generation)
        };
        self.entries[ptr.to_index()] = Entry::Used {
            color: MarkColor::White,
            generation,
            next: self.head,
            object,
        };
        self.head = Some(ptr);
        self.live += 1;
        Handle::new(ObjectIndex { ptr, generation })
    }

    /// Pop the next free entry if it exists.
    fn next_free(&mut self) -> Option<(ArenaPtr, Generation)> {
        let ptr = self.free_list?;
        match *self.entries.get(ptr.to_index())? {
            Entry::Free {
                generation,
                next_free,
            } => {
                self.free_list = next_free;
                Some((ptr, generation))
            }
            Entry::Used { .. } => {
                tracing::warn!("Heap free list is corrupted, abandoning it.");
                self.free_list = None;
                None
            }
        }
    }

    /// Return the interned string with the given text, allocating it if needed.
    pub fn intern(&mut self, text: &str) -> Handle<StringObject> {
        let hash = hash_string(text);
        if let Some(handle) = self.find_interned(text, hash) {
            return handle;
        }
        self.insert_interned(CompactString::from(text), hash)
    }

    /// Like [`Heap::intern`] but takes ownership of the text.
    pub fn intern_owned(&mut self, text: CompactString) -> Handle<StringObject> {
        let hash = hash_string(&text);
        if let Some(handle) = self.find_interned(&text, hash) {
            return handle;
        }
        self.insert_interned(text, hash)
    }

    fn find_interned(&self, text: &str, hash: u32) -> Option<Handle<StringObject>> {
        self.strings.get(&hash)?.iter().copied().find(|&handle| {
            self.get(handle)
                .is_ok_and(|string| string.as_str() == text)
        })
    }

    fn insert_interned(&mut self, text: CompactString, hash: u32) -> Handle<StringObject> {
        let handle = self.alloc(StringObject::new(text, hash));
        self.strings.entry(hash).or_default().push(handle);
        handle
    }

    /// Dereference an untyped handle.
    ///
    /// # Errors
    /// Fails if the handle is stale or out of bounds.
    pub fn object(&self, index: ObjectIndex) -> Result<&Object, HeapError> {
        let slot = index.ptr.to_index();
        match self.entries.get(slot) {
            None => Err(HeapError::OutOfBounds { index: slot }),
            Some(&Entry::Used {
                generation,
                ref object,
                ..
            }) if generation == index.generation => Ok(object),
            Some(&Entry::Used { generation, .. }) => Err(HeapError::WrongGeneration {
                expected: generation,
                actual: index.generation,
            }),
            Some(&Entry::Free { .. }) => Err(HeapError::Free { index: slot }),
        }
    }

    fn object_mut(&mut self, index: ObjectIndex) -> Result<&mut Object, HeapError> {
        let slot = index.ptr.to_index();
        match self.entries.get_mut(slot) {
            None => Err(HeapError::OutOfBounds { index: slot }),
            Some(&mut Entry::Used {
                generation,
                ref mut object,
                ..
            }) if generation == index.generation => Ok(object),
            Some(&mut Entry::Used { generation, .. }) => Err(HeapError::WrongGeneration {
                expected: generation,
                actual: index.generation,
            }),
            Some(&mut Entry::Free { .. }) => Err(HeapError::Free { index: slot }),
        }
    }

    /// Get a reference to the object pointed to by the handle if it is valid.
    ///
    /// # Errors
    /// Fails if the handle is stale or out of bounds.
    pub fn get<T: HeapObject>(&self, handle: Handle<T>) -> Result<&T, HeapError> {
        let object = self.object(handle.index)?;
        T::from_object(object).ok_or(HeapError::WrongKind {
            expected: T::KIND,
            actual: object.kind(),
        })
    }

    /// Get a mutable reference to the object pointed to by the handle if it is valid.
    ///
    /// # Errors
    /// Fails if the handle is stale or out of bounds.
    pub fn get_mut<T: HeapObject>(&mut self, handle: Handle<T>) -> Result<&mut T, HeapError> {
        let object = self.object_mut(handle.index)?;
        let actual = object.kind();
        T::from_object_mut(object).ok_or(HeapError::WrongKind {
            expected: T::KIND,
            actual,
        })
    }

    /// Return the text of a string.
    ///
    /// # Errors
    /// Fails if the handle is stale or out of bounds.
    pub fn string(&self, handle: Handle<StringObject>) -> Result<&str, HeapError> {
        self.get(handle).map(StringObject::as_str)
    }

    /// Iterate over live objects, newest first.
    #[must_use]
    pub const fn objects(&self) -> ObjectIter<'_> {
        ObjectIter {
            heap: self,
            current: self.head,
        }
    }

    /// Return heap statistics.
    #[must_use]
    pub const fn stats(&self) -> HeapStats {
        HeapStats {
            live: self.live,
            collections: self.collections,
            freed: self.freed,
            threshold: self.threshold,
        }
    }

    /// The number of live objects.
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }
}

/// An iterator over the list of all live objects.
#[derive(Debug)]
pub struct ObjectIter<'heap> {
    /// The heap to iterate over.
    heap: &'heap Heap,
    /// The next entry.
    current: Option<ArenaPtr>,
}

impl<'heap> iter::Iterator for ObjectIter<'heap> {
    type Item = (ObjectIndex, &'heap Object);

    fn next(&mut self) -> Option<Self::Item> {
        let heap = self.heap;
        let ptr = self.current?;
        match *heap.entries.get(ptr.to_index())? {
            Entry::Used {
                generation,
                next,
                ref object,
                ..
            } => {
                self.current = next;
                Some((ObjectIndex { ptr, generation }, object))
            }
            Entry::Free { .. } => {
                self.current = None;
                None
            }
        }
    }
}

impl Heap {
    /// Return whether a collection is due at this safe point.
    /// Explicit requests are honoured even while automatic collection is disabled.
    #[must_use]
    pub const fn should_collect(&self) -> bool {
        self.requested || (self.enabled && (self.config.stress || self.live > self.threshold))
    }

    /// Whether collections start on their own.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn automatic collection on or off.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The live object count above which the next collection happens.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Move the collection threshold, never below the configured baseline.
    /// Returns the threshold now in effect.
    pub fn set_threshold(&mut self, threshold: usize) -> usize {
        self.threshold = threshold.max(self.config.baseline);
        self.threshold
    }

    /// Ask for a collection at the next safe point.
    pub const fn request_collection(&mut self) {
        self.requested = true;
    }

    /// Mark the object a value refers to, if any.
    ///
    /// # Errors
    /// Fails if the value holds a stale handle.
    pub fn mark_value(&mut self, value: Value) -> Result<(), HeapError> {
        match value.as_object() {
            Some(index) => self.mark_object(index),
            None => Ok(()),
        }
    }

    /// Mark an object grey and queue it for tracing unless it was already reached.
    ///
    /// # Errors
    /// Fails if the handle is stale or out of bounds.
    pub fn mark_object(&mut self, index: impl Into<ObjectIndex>) -> Result<(), HeapError> {
        let index = index.into();
        let slot = index.ptr.to_index();
        match self.entries.get_mut(slot) {
            None => Err(HeapError::OutOfBounds { index: slot }),
            Some(&mut Entry::Used {
                generation,
                ref mut color,
                ..
            }) if generation == index.generation => {
                if *color == MarkColor::White {
                    *color = MarkColor::Grey;
                    self.grey_stack.push(index);
                }
                Ok(())
            }
            Some(&mut Entry::Used { generation, .. }) => Err(HeapError::WrongGeneration {
                expected: generation,
                actual: index.generation,
            }),
            Some(&mut Entry::Free { .. }) => Err(HeapError::Free { index: slot }),
        }
    }

    /// Run a full collection: mark from the roots, trace, then sweep everything unreached.
    /// Returns the number of freed objects.
    ///
    /// # Errors
    /// Fails if a root or a traced reference is a stale handle. The heap is left unchanged.
    pub fn collect(&mut self, roots: &dyn Roots) -> Result<usize, HeapError> {
        let before = self.live;
        let marked = roots
            .mark_roots(self)
            .and_then(|()| self.trace_references());
        if let Err(error) = marked {
            self.reset_marks();
            return Err(error);
        }

        let freed = self.sweep();
        self.requested = false;
        self.collections += 1;
        self.freed += freed;
        self.threshold = self
            .config
            .baseline
            .max(self.live.saturating_mul(self.config.growth_factor));
        tracing::debug!(
            "Collected {freed} of {before} objects, next collection above {} objects.",
            self.threshold
        );
        Ok(freed)
    }

    /// Trace all references by blackening all grey objects.
    fn trace_references(&mut self) -> Result<(), HeapError> {
        let mut references = Vec::new();
        while let Some(index) = self.grey_stack.pop() {
            self.object(index)?.trace(&mut references);
            if let Some(&mut Entry::Used { ref mut color, .. }) =
                self.entries.get_mut(index.ptr.to_index())
            {
                *color = MarkColor::Black;
            }
            for reference in references.drain(..) {
                self.mark_object(reference)?;
            }
        }
        Ok(())
    }

    /// Undo a partial mark phase.
    fn reset_marks(&mut self) {
        self.grey_stack.clear();
        for entry in &mut self.entries {
            if let &mut Entry::Used { ref mut color, .. } = entry {
                *color = MarkColor::White;
            }
        }
    }

    /// Walk the object list freeing white objects and whitening the rest.
    fn sweep(&mut self) -> usize {
        let mut freed = 0;
        let mut previous: Option<ArenaPtr> = None;
        let mut current = self.head;
        while let Some(ptr) = current {
            let slot = ptr.to_index();
            let Some(&mut Entry::Used {
                ref mut color,
                generation,
                next,
                ..
            }) = self.entries.get_mut(slot)
            else {
                break;
            };
            current = next;

            if *color != MarkColor::White {
                *color = MarkColor::White;
                previous = Some(ptr);
                continue;
            }

            match previous {
                Some(previous) => self.relink(previous, next),
                None => self.head = next,
            }
            let dead = mem::replace(
                &mut self.entries[slot],
                Entry::Free {
                    generation: generation.increment(),
                    next_free: self.free_list,
                },
            );
            self.free_list = Some(ptr);
            self.live -= 1;
            freed += 1;

            if let Entry::Used {
                object: Object::String(ref string),
                ..
            } = dead
            {
                self.evict_interned(string.hash(), ObjectIndex { ptr, generation });
            }
        }
        freed
    }

    /// Point an object's list link somewhere else.
    fn relink(&mut self, ptr: ArenaPtr, target: Option<ArenaPtr>) {
        if let Some(&mut Entry::Used { ref mut next, .. }) = self.entries.get_mut(ptr.to_index()) {
            *next = target;
        }
    }

    /// Drop a freed string from the intern table.
    fn evict_interned(&mut self, hash: u32, index: ObjectIndex) {
        if let Some(bucket) = self.strings.get_mut(&hash) {
            bucket.retain(|handle| handle.index != index);
            if bucket.is_empty() {
                self.strings.remove(&hash);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{GcConfig, Heap, HeapError, Roots};
    use crate::object::{Closure, Function, Object, Upvalue};
    use crate::value::Value;

    struct ValueRoots(Vec<Value>);

    impl Roots for ValueRoots {
        fn mark_roots(&self, heap: &mut Heap) -> Result<(), HeapError> {
            for &value in &self.0 {
                heap.mark_value(value)?;
            }
            Ok(())
        }
    }

    #[test]
    fn interning_returns_one_object_per_text() {
        let mut heap = Heap::default();
        let first = heap.intern("hello");
        let second = heap.intern_owned("hel".into());
        let third = heap.intern("hello");
        assert_eq!(first, third);
        assert_ne!(first, second);
        assert_eq!(heap.live_count(), 2);
        assert_eq!(heap.string(first), Ok("hello"));
    }

    #[test]
    fn unreachable_strings_are_evicted() {
        let mut heap = Heap::default();
        let kept = heap.intern("kept");
        let dropped = heap.intern("dropped");

        let freed = heap
            .collect(&ValueRoots(vec![Value::String(kept)]))
            .unwrap();
        assert_eq!(freed, 1);
        assert_eq!(heap.live_count(), 1);
        assert!(matches!(
            heap.string(dropped),
            Err(HeapError::Free { .. })
        ));

        // The freed slot is reused with a newer generation.
        let again = heap.intern("dropped");
        assert_ne!(again, dropped);
        assert!(matches!(
            heap.string(dropped),
            Err(HeapError::WrongGeneration { .. })
        ));
        assert_eq!(heap.intern("kept"), kept);
    }

    #[test]
    fn tracing_follows_closures() {
        let mut heap = Heap::default();
        let name = heap.intern("inc");
        let mut function = Function::new(Some(name));
        let constant = heap.intern("constant");
        function.chunk.add_constant(Value::String(constant)).unwrap();
        function.upvalue_count = 1;
        let function = heap.alloc(function);
        let captured = heap.intern("captured");
        let upvalue = heap.alloc(Upvalue::Closed {
            value: Value::String(captured),
        });
        let closure = heap.alloc(Closure {
            function,
            upvalues: vec![upvalue],
        });
        let _garbage = heap.intern("garbage");

        let freed = heap
            .collect(&ValueRoots(vec![Value::Closure(closure)]))
            .unwrap();
        assert_eq!(freed, 1);
        assert_eq!(heap.live_count(), 6);
        assert_eq!(heap.string(captured), Ok("captured"));

        let freed = heap.collect(&()).unwrap();
        assert_eq!(freed, 6);
        assert_eq!(heap.objects().count(), 0);
    }

    #[test]
    fn object_list_survives_unlinking() {
        let mut heap = Heap::default();
        let handles: Vec<_> = (0..5).map(|index| heap.intern(&index.to_string())).collect();
        let roots = ValueRoots(vec![Value::String(handles[1]), Value::String(handles[3])]);
        heap.collect(&roots).unwrap();

        let texts: Vec<_> = heap
            .objects()
            .filter_map(|(_, object)| match *object {
                Object::String(ref string) => Some(string.as_str().to_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["3", "1"]);
    }

    #[test]
    fn threshold_adapts_to_survivors() {
        let mut heap = Heap::new(GcConfig {
            baseline: 4,
            growth_factor: 2,
            stress: false,
        });
        let handles: Vec<_> = (0..6).map(|index| heap.intern(&index.to_string())).collect();
        assert!(heap.should_collect());

        heap.collect(&ValueRoots(handles.iter().copied().map(Value::String).collect()))
            .unwrap();
        assert_eq!(heap.stats().threshold, 12);
        assert!(!heap.should_collect());

        heap.collect(&()).unwrap();
        assert_eq!(heap.stats().threshold, 4);
        assert_eq!(heap.stats().collections, 2);
        assert_eq!(heap.stats().freed, 6);

        heap.request_collection();
        assert!(heap.should_collect());
    }

    #[test]
    fn disabling_only_stops_automatic_collections() {
        let mut heap = Heap::new(GcConfig {
            baseline: 2,
            growth_factor: 2,
            stress: true,
        });
        for index in 0..4 {
            heap.intern(&index.to_string());
        }
        assert!(heap.should_collect());

        heap.set_enabled(false);
        assert!(!heap.is_enabled());
        assert!(!heap.should_collect());
        heap.request_collection();
        assert!(heap.should_collect());
        heap.collect(&()).unwrap();
        assert!(!heap.should_collect());

        heap.set_enabled(true);
        assert!(heap.should_collect());
    }

    #[test]
    fn threshold_never_drops_below_the_baseline() {
        let mut heap = Heap::new(GcConfig {
            baseline: 8,
            growth_factor: 2,
            stress: false,
        });
        assert_eq!(heap.threshold(), 8);
        assert_eq!(heap.set_threshold(100), 100);
        assert_eq!(heap.stats().threshold, 100);
        assert_eq!(heap.set_threshold(3), 8);
        assert_eq!(heap.threshold(), 8);
    }

    #[test]
    fn stale_roots_fail_collection() {
        let mut heap = Heap::default();
        let string = heap.intern("text");
        let stale = Value::String(string);
        heap.collect(&()).unwrap();
        assert!(heap.collect(&ValueRoots(vec![stale])).is_err());

        let function = heap.alloc(Function::new(None));
        let object = heap.object(function.into()).unwrap();
        assert_eq!(object.kind(), "function");
    }
}
