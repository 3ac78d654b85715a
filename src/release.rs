use log::debug;

use crate::block::{Block, HEADER_SIZE, NodeRef};
use crate::error::HeapError;
use crate::heap::Heap;
use crate::list::List;

impl<'a> Heap<'a> {
  /// Returns a block to the free list, merging it with free neighbors.
  ///
  /// `None` is accepted and ignored. A handle this heap did not hand out, or
  /// already released, is reported as [`HeapError::UnknownBlock`].
  pub fn release(
    &mut self,
    block: Option<Block>,
  ) -> Result<(), HeapError> {
    let Some(block) = block else {
      return Ok(());
    };

    let node = self.assigned_node(block)?;
    self.release_node(node);

    Ok(())
  }

  pub(crate) fn release_node(
    &mut self,
    node: NodeRef,
  ) {
    self.remove(List::Assigned, node);
    self.free_bytes += self.size_of(node);
    self.insert_sorted(List::Available, node);

    debug!("release {:?}: {} bytes", node, self.size_of(node));

    self.merge(node);
  }

  /// Coalesces the run of contiguous free blocks around `node`.
  ///
  /// `node` must be on the available list. The walk first moves back to the
  /// lowest free block that touches the run, then absorbs every touching
  /// free block after it.
  pub(crate) fn merge(
    &mut self,
    node: NodeRef,
  ) {
    let mut anchor = node;

    while let Some(prev) = self.header(anchor).prev {
      if !prev.precedes(self.size_of(prev), anchor) {
        break;
      }
      anchor = prev;
    }

    loop {
      let header = self.header(anchor);
      let Some(next) = header.next else {
        break;
      };
      if !anchor.precedes(header.size, next) {
        break;
      }

      let absorbed = self.size_of(next);

      self.remove(List::Available, next);
      self.node_count -= 1;
      self.free_bytes += HEADER_SIZE;
      self.set_size(anchor, header.size + HEADER_SIZE + absorbed);

      debug!("merge {:?} into {:?}", next, anchor);
    }
  }
}
