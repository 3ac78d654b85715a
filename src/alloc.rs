use log::debug;

use crate::block::{Block, HEADER_SIZE, Header, NodeRef};
use crate::error::HeapError;
use crate::heap::Heap;
use crate::list::List;

impl<'a> Heap<'a> {
  /// Allocates a block of at least `size` payload bytes.
  ///
  /// Takes the first free block, in address order, that is large enough and
  /// splits off whatever it does not need. Fails with
  /// [`HeapError::OutOfMemory`] when no single free block is large enough,
  /// even if the free bytes add up to more than `size`.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Block, HeapError> {
    self.allocate_node(size).map(Block::from_node)
  }

  /// Allocates room for `count` elements of `size` bytes, zero-filled.
  pub fn allocate_zeroed(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<Block, HeapError> {
    let bytes = count
      .checked_mul(size)
      .ok_or(HeapError::SizeOverflow { count, size })?;

    let block = self.allocate(bytes)?;
    self.payload_mut(block)?.fill(0);

    Ok(block)
  }

  pub(crate) fn allocate_node(
    &mut self,
    size: usize,
  ) -> Result<NodeRef, HeapError> {
    let Some(node) = self.find_free(size) else {
      debug!("allocate({}) failed: {} bytes free", size, self.free_bytes);
      return Err(HeapError::OutOfMemory { requested: size });
    };

    self.remove(List::Available, node);
    self.insert_sorted(List::Assigned, node);

    if self.size_of(node) - size >= HEADER_SIZE {
      self.split(node, size);
    }

    self.free_bytes -= self.size_of(node);

    debug!("allocate({}) -> {:?}", size, node);

    Ok(node)
  }

  fn find_free(
    &self,
    size: usize,
  ) -> Option<NodeRef> {
    self.iter(List::Available).find(|&node| self.size_of(node) >= size)
  }

  /// Cuts `node` down to `size` payload bytes and turns the tail into a new
  /// free block, merged with any free neighbor that follows it.
  ///
  /// The tail must be at least `HEADER_SIZE` bytes, and `free_bytes` must
  /// already count them.
  pub(crate) fn split(
    &mut self,
    node: NodeRef,
    size: usize,
  ) {
    let tail = node.following(size);
    let tail_size = self.size_of(node) - size - HEADER_SIZE;

    debug!("split {:?} at {}: {} bytes left over", node, size, tail_size);

    self.set_size(node, size);
    self.set_header(tail, Header::new(tail_size));
    self.insert_sorted(List::Available, tail);

    self.node_count += 1;
    self.free_bytes -= HEADER_SIZE;

    self.merge(tail);
  }
}
