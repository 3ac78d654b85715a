use std::fmt;

use crate::heap::Heap;
use crate::list::List;

/// Point-in-time view of a heap's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
  pub total: usize,
  pub free: usize,
  pub used: usize,
  pub overhead: usize,
  pub free_blocks: usize,
  pub assigned_blocks: usize,
  /// Largest single request that could succeed right now.
  pub largest_free: usize,
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "total {} B, used {} B in {} blocks, free {} B in {} blocks (largest {} B), overhead {} B",
      self.total,
      self.used,
      self.assigned_blocks,
      self.free,
      self.free_blocks,
      self.largest_free,
      self.overhead
    )
  }
}

impl Heap<'_> {
  /// Collects the counters along with a walk of both lists.
  pub fn stats(&self) -> HeapStats {
    let sizes = || self.iter(List::Available).map(|node| self.size_of(node));

    HeapStats {
      total: self.total_bytes(),
      free: self.free_bytes(),
      used: self.used_bytes(),
      overhead: self.overhead_bytes(),
      free_blocks: sizes().count(),
      assigned_blocks: self.iter(List::Assigned).count(),
      largest_free: sizes().max().unwrap_or(0),
    }
  }
}
