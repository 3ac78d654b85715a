use std::{error, fmt};

use crate::block::Block;

/// Reasons a heap operation can fail. A failed call never changes the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  /// No free block is large enough. Covers both exhaustion and
  /// fragmentation; the heap does not tell them apart.
  OutOfMemory { requested: usize },
  /// `count * size` does not fit in `usize`.
  SizeOverflow { count: usize, size: usize },
  /// The region cannot even hold one block header.
  RegionTooSmall { len: usize },
  /// The region is longer than a header can describe.
  RegionTooLarge { len: usize },
  /// No more regions can be addressed.
  TooManyRegions,
  /// The handle is not a block currently assigned by this heap.
  UnknownBlock(Block),
}

impl fmt::Display for HeapError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      HeapError::OutOfMemory { requested } => {
        write!(f, "no free block can hold {} bytes", requested)
      }
      HeapError::SizeOverflow { count, size } => {
        write!(f, "{} elements of {} bytes overflow the address space", count, size)
      }
      HeapError::RegionTooSmall { len } => {
        write!(f, "region of {} bytes is smaller than a block header", len)
      }
      HeapError::RegionTooLarge { len } => {
        write!(f, "region of {} bytes exceeds the {} byte limit", len, u32::MAX)
      }
      HeapError::TooManyRegions => write!(f, "region table is full"),
      HeapError::UnknownBlock(block) => write!(
        f,
        "block at offset {} of region {} is not assigned by this heap",
        block.offset(),
        block.region()
      ),
    }
  }
}

impl error::Error for HeapError {}
