//! Mark-and-sweep garbage collection over a chunked slot arena.
//!
//! Objects are kept alive by being reachable from roots through traced edges.
//! Roots are the objects held by live [`Guard`]s plus whatever the caller hands
//! to [`Heap::collect`]. Owners never free objects: a collection pools every
//! unreachable slot for reuse and bumps its generation, so a stale [`Gc`] is
//! detected instead of silently aliasing the slot's next occupant.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Default threshold: collect at the next safe point after this many net allocations
pub const DEFAULT_GC_THRESHOLD: usize = 100;

/// Slots per chunk (matches the 256-bit mark bitmask)
const CHUNK_CAPACITY: usize = 256;

#[inline]
fn split_index(index: u32) -> (usize, usize) {
    let index = index as usize;
    (index / CHUNK_CAPACITY, index % CHUNK_CAPACITY)
}

// ============================================================================
// ChunkBitmask - 256-bit mark bits for one chunk
// ============================================================================

#[derive(Clone, Copy, Default)]
struct ChunkBitmask {
    /// 4 × u64 = 256 bits
    bits: [u64; 4],
}

impl ChunkBitmask {
    #[inline]
    fn set(&mut self, index: usize) {
        if let Some(word) = self.bits.get_mut(index >> 6) {
            *word |= 1u64 << (index & 63);
        }
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        self.bits
            .get(index >> 6)
            .is_some_and(|word| word & (1u64 << (index & 63)) != 0)
    }

    #[inline]
    fn clear(&mut self) {
        self.bits = [0; 4];
    }

    /// Unmarked indices below `len`, skipping whole words that are fully marked
    fn iter_unmarked(&self, len: usize) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .flat_map(|(word_index, word)| {
                let mut unmarked = !*word;
                std::iter::from_fn(move || {
                    if unmarked == 0 {
                        return None;
                    }
                    let bit = unmarked.trailing_zeros() as usize;
                    unmarked &= unmarked - 1;
                    Some(word_index * 64 + bit)
                })
            })
            .take_while(move |&index| index < len)
    }
}

// ============================================================================
// Gc - handle to a heap slot
// ============================================================================

/// A handle to a GC-managed object.
///
/// Handles are `Copy`; they do not keep their target alive on their own. An
/// object survives a collection only while it is reachable from a root.
pub struct Gc<T> {
    index: u32,
    generation: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Gc<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            marker: PhantomData,
        }
    }

    /// Slot index of this object (stable while the object is alive)
    pub fn id(&self) -> usize {
        self.index as usize
    }

    /// Check if two handles refer to the same object
    pub fn ptr_eq(a: &Gc<T>, b: &Gc<T>) -> bool {
        a == b
    }
}

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Gc<T> {}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Gc<T> {}

impl<T> Hash for Gc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc(#{}@{})", self.index, self.generation)
    }
}

// ============================================================================
// Traceable / Reset
// ============================================================================

/// Trait for types that can be traced by the garbage collector.
///
/// `trace` must hand every owned or referenced `Gc<Self>` to the visitor,
/// including edges held by embedded helper structs. A missing edge lets the
/// target be collected while it is still in use.
pub trait Traceable: Sized {
    fn trace<F: FnMut(Gc<Self>)>(&self, visitor: F);
}

/// Trait for types that can be reset to a clean state for pooling.
///
/// Collected objects are reset so they stop pinning anything they referenced.
pub trait Reset: Default {
    fn reset(&mut self);
}

// ============================================================================
// Heap
// ============================================================================

struct Slot<T> {
    generation: u32,
    pooled: bool,
    data: T,
}

/// Root registrations, shared with every [`Guard`] so guards can unregister
/// themselves on drop without borrowing the heap.
#[derive(Default)]
struct RootTable {
    next_guard_id: u64,
    guards: FxHashMap<u64, Vec<(u32, u32)>>,
}

/// Statistics about the garbage collector
#[derive(Debug, Clone, Serialize)]
pub struct GcStats {
    /// Total number of slots (including pooled)
    pub total_objects: usize,
    /// Number of slots in the pool (available for reuse)
    pub pooled_objects: usize,
    /// Number of live objects
    pub live_objects: usize,
    /// Collections run so far
    pub collections: u64,
    /// Allocations since the last collection
    pub allocs_since_gc: usize,
}

/// The object arena.
///
/// Allocation and collection both take `&mut self`, so no allocation can happen
/// while a trace is running: `Traceable::trace` only ever sees `&T`.
pub struct Heap<T: Traceable + Reset> {
    chunks: Vec<Vec<Slot<T>>>,
    marked_chunks: Vec<ChunkBitmask>,
    slot_count: usize,
    free_list: Vec<u32>,
    /// Reused between cycles so marking does not reallocate
    mark_stack: Vec<(u32, u32)>,
    roots: Rc<RefCell<RootTable>>,
    net_allocs: usize,
    /// 0 disables threshold-driven collection
    gc_threshold: usize,
    collections: u64,
}

impl<T: Traceable + Reset> Heap<T> {
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            marked_chunks: Vec::new(),
            slot_count: 0,
            free_list: Vec::new(),
            mark_stack: Vec::new(),
            roots: Rc::new(RefCell::new(RootTable::default())),
            net_allocs: 0,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            collections: 0,
        }
    }

    /// Create a new guard; objects added to it are roots until it is dropped
    pub fn create_guard(&self) -> Guard<T> {
        let mut table = self.roots.borrow_mut();
        let id = table.next_guard_id;
        table.next_guard_id += 1;
        table.guards.insert(id, Vec::new());
        Guard {
            id,
            roots: Rc::downgrade(&self.roots),
            marker: PhantomData,
        }
    }

    /// Allocate a new object. Never fails: running out of memory aborts.
    pub fn alloc(&mut self, data: T) -> Gc<T> {
        self.net_allocs += 1;

        if let Some(index) = self.free_list.pop() {
            let (chunk_idx, in_chunk) = split_index(index);
            if let Some(slot) = self
                .chunks
                .get_mut(chunk_idx)
                .and_then(|chunk| chunk.get_mut(in_chunk))
            {
                slot.data = data;
                slot.pooled = false;
                return Gc::new(index, slot.generation);
            }
            // A free-list entry always names an existing slot; fall through
            // to a fresh slot if that ever stops being true.
            return self.alloc_fresh(data);
        }

        self.alloc_fresh(data)
    }

    fn alloc_fresh(&mut self, data: T) -> Gc<T> {
        let has_room = self
            .chunks
            .last()
            .is_some_and(|chunk| chunk.len() < CHUNK_CAPACITY);
        if !has_room {
            self.chunks.push(Vec::with_capacity(CHUNK_CAPACITY));
            self.marked_chunks.push(ChunkBitmask::default());
        }

        let index = self.slot_count as u32;
        if let Some(chunk) = self.chunks.last_mut() {
            chunk.push(Slot {
                generation: 0,
                pooled: false,
                data,
            });
        }
        self.slot_count += 1;
        Gc::new(index, 0)
    }

    fn slot(&self, gc: Gc<T>) -> Option<&Slot<T>> {
        let (chunk_idx, in_chunk) = split_index(gc.index);
        self.chunks
            .get(chunk_idx)
            .and_then(|chunk| chunk.get(in_chunk))
            .filter(|slot| !slot.pooled && slot.generation == gc.generation)
    }

    /// Borrow a live object; `None` for a handle whose object was collected
    pub fn get(&self, gc: Gc<T>) -> Option<&T> {
        self.slot(gc).map(|slot| &slot.data)
    }

    /// Mutably borrow a live object; `None` for a stale handle
    pub fn get_mut(&mut self, gc: Gc<T>) -> Option<&mut T> {
        let (chunk_idx, in_chunk) = split_index(gc.index);
        self.chunks
            .get_mut(chunk_idx)
            .and_then(|chunk| chunk.get_mut(in_chunk))
            .filter(|slot| !slot.pooled && slot.generation == gc.generation)
            .map(|slot| &mut slot.data)
    }

    /// Whether `gc` still refers to a live object
    pub fn is_live(&self, gc: Gc<T>) -> bool {
        self.slot(gc).is_some()
    }

    /// Whether enough allocations happened since the last cycle to collect
    pub fn should_collect(&self) -> bool {
        self.gc_threshold > 0 && self.net_allocs >= self.gc_threshold
    }

    /// Run a full mark-and-sweep cycle. Returns the number of objects collected.
    pub fn collect(&mut self, extra_roots: impl IntoIterator<Item = Gc<T>>) -> usize {
        self.mark(extra_roots);
        let collected = self.sweep();
        self.net_allocs = 0;
        self.collections += 1;
        log::debug!(
            "gc cycle {}: collected {} objects, {} live",
            self.collections,
            collected,
            self.slot_count - self.free_list.len()
        );
        collected
    }

    /// Every live object reachable from the guards and `roots`, without sweeping.
    pub fn reachable(&mut self, roots: impl IntoIterator<Item = Gc<T>>) -> Vec<Gc<T>> {
        self.mark(roots);
        let mut reachable = Vec::new();
        for (chunk_idx, (chunk, bitmask)) in
            self.chunks.iter().zip(self.marked_chunks.iter()).enumerate()
        {
            for (in_chunk, slot) in chunk.iter().enumerate() {
                if !slot.pooled && bitmask.get(in_chunk) {
                    let index = (chunk_idx * CHUNK_CAPACITY + in_chunk) as u32;
                    reachable.push(Gc::new(index, slot.generation));
                }
            }
        }
        reachable
    }

    fn mark(&mut self, extra_roots: impl IntoIterator<Item = Gc<T>>) {
        for bitmask in &mut self.marked_chunks {
            bitmask.clear();
        }

        let mut stack = std::mem::take(&mut self.mark_stack);
        stack.clear();
        {
            let table = self.roots.borrow();
            for guarded in table.guards.values() {
                stack.extend(guarded.iter().copied());
            }
        }
        stack.extend(
            extra_roots
                .into_iter()
                .map(|gc| (gc.index, gc.generation)),
        );

        while let Some((index, generation)) = stack.pop() {
            let (chunk_idx, in_chunk) = split_index(index);
            let Some(slot) = self
                .chunks
                .get(chunk_idx)
                .and_then(|chunk| chunk.get(in_chunk))
            else {
                continue;
            };
            if slot.pooled || slot.generation != generation {
                continue;
            }
            let Some(bitmask) = self.marked_chunks.get_mut(chunk_idx) else {
                continue;
            };
            if bitmask.get(in_chunk) {
                continue;
            }
            bitmask.set(in_chunk);

            let marked = &self.marked_chunks;
            slot.data.trace(|child: Gc<T>| {
                let (child_chunk, child_in_chunk) = split_index(child.index);
                let already = marked
                    .get(child_chunk)
                    .is_some_and(|bits| bits.get(child_in_chunk));
                if !already {
                    stack.push((child.index, child.generation));
                }
            });
        }

        self.mark_stack = stack;
    }

    fn sweep(&mut self) -> usize {
        let mut collected = 0;
        for (chunk_idx, (chunk, bitmask)) in self
            .chunks
            .iter_mut()
            .zip(self.marked_chunks.iter())
            .enumerate()
        {
            let len = chunk.len();
            for in_chunk in bitmask.iter_unmarked(len) {
                let Some(slot) = chunk.get_mut(in_chunk) else {
                    continue;
                };
                if slot.pooled {
                    continue;
                }
                slot.data.reset();
                slot.pooled = true;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list
                    .push((chunk_idx * CHUNK_CAPACITY + in_chunk) as u32);
                collected += 1;
            }
        }
        collected
    }

    pub fn stats(&self) -> GcStats {
        GcStats {
            total_objects: self.slot_count,
            pooled_objects: self.free_list.len(),
            live_objects: self.slot_count - self.free_list.len(),
            collections: self.collections,
            allocs_since_gc: self.net_allocs,
        }
    }

    /// Set the GC threshold (0 = disable automatic collection)
    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.gc_threshold = threshold;
    }

    pub fn gc_threshold(&self) -> usize {
        self.gc_threshold
    }
}

impl<T: Traceable + Reset> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Guard - root anchor for objects
// ============================================================================

/// A root anchor that keeps objects alive.
///
/// Objects added to a guard are treated as roots until they are unguarded or
/// the guard is dropped. Hosts use guards for values they hold across safe
/// points (between jobs, across explicit collections).
pub struct Guard<T> {
    id: u64,
    roots: Weak<RefCell<RootTable>>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Guard<T> {
    fn with_entry<R>(&self, f: impl FnOnce(&mut Vec<(u32, u32)>) -> R) -> Option<R> {
        let roots = self.roots.upgrade()?;
        let mut table = roots.borrow_mut();
        table.guards.get_mut(&self.id).map(f)
    }

    /// Add an object to this guard's roots
    pub fn guard(&self, obj: Gc<T>) {
        self.with_entry(|entry| entry.push((obj.index, obj.generation)));
    }

    /// Remove an object from this guard's roots.
    /// Returns true if the object was found and removed.
    pub fn unguard(&self, obj: &Gc<T>) -> bool {
        self.with_entry(|entry| {
            let found = entry
                .iter()
                .position(|&(index, generation)| index == obj.index && generation == obj.generation);
            if let Some(pos) = found {
                entry.swap_remove(pos);
            }
            found.is_some()
        })
        .unwrap_or(false)
    }

    /// Clear all guarded objects
    pub fn clear(&self) {
        self.with_entry(|entry| entry.clear());
    }

    /// Get the number of guarded objects
    pub fn len(&self) -> usize {
        self.with_entry(|entry| entry.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Guard<T> {
    fn drop(&mut self) {
        if let Some(roots) = self.roots.upgrade() {
            roots.borrow_mut().guards.remove(&self.id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
