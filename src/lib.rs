//! # rheap - A Region-Based Heap Manager
//!
//! This crate provides a **first-fit free-list heap** that carves
//! malloc/free/realloc-style allocations out of memory regions supplied by
//! the caller. It never talks to an operating-system allocator, which makes
//! it a fit for embedded targets (hand it a static buffer) or for
//! sub-allocating inside one big buffer obtained elsewhere.
//!
//! ## Overview
//!
//! Every block, free or handed out, starts with a small header stored inside
//! the region itself. Headers are threaded onto one of two lists, both kept in
//! ascending address order:
//!
//! ```text
//!   Region (caller-owned bytes):
//!
//!   ┌────────┬──────────┬────────┬──────────────┬────────┬─────────────────┐
//!   │ header │ payload  │ header │   payload    │ header │    payload      │
//!   │  (A)   │ assigned │  (F)   │    free      │  (A)   │    assigned     │
//!   └────────┴──────────┴────────┴──────────────┴────────┴─────────────────┘
//!        │                   │                       │
//!        │                   └── available list      │
//!        └───────────── assigned list ───────────────┘
//! ```
//!
//! Because both lists are address-ordered, two free blocks are merged simply
//! by checking that one ends exactly where the next begins.
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align    - Word alignment macro (align!)
//!   ├── block    - Header layout, node references, Block handle
//!   ├── error    - HeapError
//!   ├── heap     - Heap instance, regions, accounting
//!   ├── list     - Address-ordered list insert/remove
//!   ├── alloc    - allocate / allocate_zeroed, block splitting
//!   ├── release  - release, coalescing
//!   ├── resize   - shrink, grow in place, relocate
//!   └── stats    - HeapStats snapshot
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::Heap;
//!
//! let mut memory = [0u8; 4096];
//! let mut heap = Heap::new();
//! heap.add_region(&mut memory).unwrap();
//!
//! let block = heap.allocate(64).unwrap();
//! heap.payload_mut(block).unwrap()[..5].copy_from_slice(b"hello");
//!
//! let block = heap.resize(Some(block), 256).unwrap();
//! assert_eq!(b"hello", &heap.payload(block).unwrap()[..5]);
//!
//! heap.release(Some(block)).unwrap();
//! assert_eq!(0, heap.used_bytes());
//! ```
//!
//! ## How It Works
//!
//! Allocation takes the first free block large enough for the request and
//! splits the rest off into a new free block:
//!
//! ```text
//!   allocate(n):
//!
//!   before  ┌────────┬──────────────────────────────────────┐
//!           │ header │             free (m)                 │
//!           └────────┴──────────────────────────────────────┘
//!
//!   after   ┌────────┬───────────┬────────┬─────────────────┐
//!           │ header │  used (n) │ header │ free (m-n-hdr)  │
//!           └────────┴───────────┴────────┴─────────────────┘
//! ```
//!
//! Releasing a block puts it back on the available list and merges it with
//! any free block it touches on either side. Resizing shrinks in place,
//! grows into a free block right behind the payload when one is there, and
//! otherwise moves the data to a new block.
//!
//! ## Memory Safety
//!
//! Regions are borrowed `&mut [u8]` slices and headers are encoded as plain
//! bytes at known offsets; links between headers are `(region, offset)`
//! pairs, not pointers. Callers get a [`Block`] handle and reach its bytes
//! through [`Heap::payload`] / [`Heap::payload_mut`], which never extend
//! past the block. Handles are checked against the assigned list, so a
//! stale or foreign handle yields [`HeapError::UnknownBlock`] rather than
//! corrupting the heap.
//!
//! ## Limitations
//!
//! - **Single-threaded**: no internal locking; wrap the heap in a mutex to
//!   share it.
//! - **No alignment guarantees**: payloads start right after their header,
//!   so only the header's own word alignment carries over.
//! - **No compaction**: a fragmented heap stays fragmented until blocks
//!   next to each other are released.
//! - **32-bit sizes**: a single region may not exceed `u32::MAX` bytes.

pub mod align;
mod alloc;
mod block;
mod error;
mod heap;
mod list;
mod release;
mod resize;
mod stats;

pub use block::{Block, HEADER_SIZE};
pub use error::HeapError;
pub use heap::Heap;
pub use resize::SHRINK_SPLIT_MIN;
pub use stats::HeapStats;
