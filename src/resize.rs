use log::debug;

use crate::block::{Block, HEADER_SIZE, NodeRef};
use crate::error::HeapError;
use crate::heap::Heap;
use crate::list::List;

/// Smallest shrink worth carving into a free block of its own.
pub const SHRINK_SPLIT_MIN: usize = 2 * HEADER_SIZE;

impl<'a> Heap<'a> {
  /// Changes the payload size of a block, moving it only when it must.
  ///
  /// - `None` allocates a fresh block.
  /// - Shrinking keeps the block where it is and frees the tail, unless the
  ///   tail is under [`SHRINK_SPLIT_MIN`] bytes, in which case nothing changes.
  /// - Growing first tries to take room from a free block right behind this
  ///   one; otherwise the data is copied into a new block and the old one is
  ///   released.
  ///
  /// On failure the original block, its contents and every counter are left
  /// exactly as they were.
  pub fn resize(
    &mut self,
    block: Option<Block>,
    size: usize,
  ) -> Result<Block, HeapError> {
    let Some(block) = block else {
      return self.allocate(size);
    };

    let node = self.assigned_node(block)?;
    let current = self.size_of(node);

    if size == current {
      return Ok(block);
    }

    if size < current {
      self.shrink(node, size);
      return Ok(block);
    }

    let needed = size - current;
    if needed > self.free_bytes {
      debug!("resize {:?} to {} failed: {} bytes free", node, size, self.free_bytes);
      return Err(HeapError::OutOfMemory { requested: size });
    }

    if self.grow_in_place(node, size) {
      return Ok(block);
    }

    self.relocate(node, size)
  }

  fn shrink(
    &mut self,
    node: NodeRef,
    size: usize,
  ) {
    let current = self.size_of(node);
    let freed = current - size;

    if freed < SHRINK_SPLIT_MIN {
      debug!("shrink {:?} to {} skipped: only {} bytes", node, size, freed);
      return;
    }

    debug!("shrink {:?} from {} to {}", node, current, size);

    self.free_bytes += freed;
    self.split(node, size);
  }

  /// Grows `node` into the free block right behind it, if that has room.
  fn grow_in_place(
    &mut self,
    node: NodeRef,
    size: usize,
  ) -> bool {
    let current = self.size_of(node);
    let needed = size - current;

    let Some(neighbor) = self.free_neighbor(node, current) else {
      return false;
    };

    // Absorbing the neighbor also frees up its header.
    let room = HEADER_SIZE + self.size_of(neighbor);
    if room < needed {
      return false;
    }

    debug!("grow {:?} from {} to {} in place", node, current, size);

    self.remove(List::Available, neighbor);
    self.node_count -= 1;
    self.free_bytes -= room - HEADER_SIZE;
    self.set_size(node, current + room);

    if room - needed >= HEADER_SIZE {
      self.free_bytes += room - needed;
      self.split(node, size);
    }

    true
  }

  /// The free block starting right after the `size` byte payload of `node`.
  fn free_neighbor(
    &self,
    node: NodeRef,
    size: usize,
  ) -> Option<NodeRef> {
    self
      .iter(List::Available)
      .find(|&free| node.precedes(size, free))
  }

  fn relocate(
    &mut self,
    node: NodeRef,
    size: usize,
  ) -> Result<Block, HeapError> {
    let target = self.allocate_node(size)?;
    let len = self.size_of(node);

    debug!("relocate {:?} to {:?}: copying {} bytes", node, target, len);

    self.copy_payload(node, target, len);
    self.release_node(node);

    Ok(Block::from_node(target))
  }

  /// Copies `len` payload bytes from `from` to `to`; the blocks must not overlap.
  fn copy_payload(
    &mut self,
    from: NodeRef,
    to: NodeRef,
    len: usize,
  ) {
    let src = from.payload()..from.payload() + len;

    if from.region == to.region {
      self.regions[from.region].copy_within(src, to.payload());
      return;
    }

    let (low, high) = self.regions.split_at_mut(from.region.max(to.region));
    let (source, target) = if from.region < to.region {
      (&low[from.region], &mut high[0])
    } else {
      (&high[0], &mut low[to.region])
    };

    target[to.payload()..to.payload() + len].copy_from_slice(&source[src]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::heap::tests::{check_invariants, init_logger};

  fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
  }

  fn write_pattern(
    heap: &mut Heap<'_>,
    block: Block,
  ) {
    let payload = heap.payload_mut(block).unwrap();
    let bytes = pattern(payload.len());
    payload.copy_from_slice(&bytes);
  }

  #[test]
  fn none_behaves_like_allocate() {
    let mut memory = vec![0u8; 1024];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.resize(None, 100).unwrap();

    assert_eq!(100, heap.payload_size(block).unwrap());
    assert_eq!(HEADER_SIZE, block.offset());
    check_invariants(&heap);
  }

  #[test]
  fn resize_to_same_size_changes_nothing() {
    let mut memory = vec![0u8; 1024];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();
    let block = heap.allocate(300).unwrap();
    let (free, total) = (heap.free_bytes(), heap.total_bytes());

    let size = heap.payload_size(block).unwrap();
    assert_eq!(Ok(block), heap.resize(Some(block), size));

    assert_eq!(free, heap.free_bytes());
    assert_eq!(total, heap.total_bytes());
    check_invariants(&heap);
  }

  #[test]
  fn grow_shrink_and_keep() {
    init_logger();
    let mut memory = vec![0u8; 65536];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let first = heap.allocate(100).unwrap();
    let second = heap.allocate(200).unwrap();
    let third = heap.allocate(300).unwrap();

    let first = heap.resize(Some(first), 250).unwrap();
    assert_eq!(250, heap.payload_size(first).unwrap());
    check_invariants(&heap);

    let second = heap.resize(Some(second), 150).unwrap();
    assert_eq!(150, heap.payload_size(second).unwrap());
    check_invariants(&heap);

    assert_eq!(Ok(third), heap.resize(Some(third), 300));
    assert_eq!(300, heap.payload_size(third).unwrap());
    check_invariants(&heap);
  }

  #[test]
  fn growing_without_room_fails_and_keeps_block() {
    init_logger();
    let mut memory = vec![0u8; 4096];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let _head = heap.allocate(2048).unwrap();
    let block = heap.allocate(1024).unwrap();
    write_pattern(&mut heap, block);
    let (free, used, overhead) = (heap.free_bytes(), heap.used_bytes(), heap.overhead_bytes());

    assert_eq!(
      Err(HeapError::OutOfMemory { requested: 2048 }),
      heap.resize(Some(block), 2048)
    );

    assert_eq!(1024, heap.payload_size(block).unwrap());
    assert_eq!(pattern(1024), heap.payload(block).unwrap());
    assert_eq!(free, heap.free_bytes());
    assert_eq!(used, heap.used_bytes());
    assert_eq!(overhead, heap.overhead_bytes());
    check_invariants(&heap);
  }

  #[test]
  fn failed_relocation_keeps_block() {
    let mut memory = vec![0u8; 4 * HEADER_SIZE + 400];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let blocks: Vec<Block> = (0..4).map(|_| heap.allocate(100).unwrap()).collect();
    write_pattern(&mut heap, blocks[1]);
    heap.release(Some(blocks[0])).unwrap();
    heap.release(Some(blocks[3])).unwrap();

    // 200 bytes are free, but neither hole sits right behind blocks[1].
    let free = heap.free_bytes();
    assert!(heap.resize(Some(blocks[1]), 150).is_err());

    assert_eq!(free, heap.free_bytes());
    assert_eq!(pattern(100), heap.payload(blocks[1]).unwrap());
    check_invariants(&heap);
  }

  #[test]
  fn shrink_keeps_address_and_frees_tail() {
    let mut memory = vec![0u8; 1024];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(400).unwrap();
    let _guard = heap.allocate(16).unwrap();
    write_pattern(&mut heap, block);
    let free = heap.free_bytes();

    let shrunk = heap.resize(Some(block), 100).unwrap();

    assert_eq!(block, shrunk);
    assert_eq!(100, heap.payload_size(shrunk).unwrap());
    assert_eq!(free + 300 - HEADER_SIZE, heap.free_bytes());
    assert_eq!(&pattern(400)[..100], heap.payload(shrunk).unwrap());
    check_invariants(&heap);

    // The freed tail is reusable right away.
    let reused = heap.allocate(300 - HEADER_SIZE).unwrap();
    assert_eq!(shrunk.offset() + 100 + HEADER_SIZE, reused.offset());
  }

  #[test]
  fn shrink_tail_merges_with_free_neighbor() {
    let mut memory = vec![0u8; 1024];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(400).unwrap();
    let overhead = heap.overhead_bytes();

    heap.resize(Some(block), 100).unwrap();

    assert_eq!(overhead, heap.overhead_bytes());
    assert_eq!(1024 - 2 * HEADER_SIZE - 100, heap.free_bytes());
    check_invariants(&heap);
  }

  #[test]
  fn tiny_shrink_is_declined() {
    let mut memory = vec![0u8; 1024];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(200).unwrap();
    let free = heap.free_bytes();

    let kept = heap.resize(Some(block), 200 - (SHRINK_SPLIT_MIN - 1)).unwrap();

    assert_eq!(block, kept);
    assert_eq!(200, heap.payload_size(kept).unwrap());
    assert_eq!(free, heap.free_bytes());
    check_invariants(&heap);
  }

  #[test]
  fn grow_in_place_takes_from_free_neighbor() {
    let mut memory = vec![0u8; 2048];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(100).unwrap();
    let neighbor = heap.allocate(300).unwrap();
    let _guard = heap.allocate(16).unwrap();
    write_pattern(&mut heap, block);
    heap.release(Some(neighbor)).unwrap();
    let free = heap.free_bytes();

    let grown = heap.resize(Some(block), 250).unwrap();

    assert_eq!(block, grown);
    assert_eq!(250, heap.payload_size(grown).unwrap());
    assert_eq!(free - 150, heap.free_bytes());
    assert_eq!(pattern(100), heap.payload(grown).unwrap()[..100]);
    check_invariants(&heap);
  }

  #[test]
  fn grow_in_place_swallows_unsplittable_neighbor() {
    let mut memory = vec![0u8; 2048];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(100).unwrap();
    let neighbor = heap.allocate(50).unwrap();
    let _guard = heap.allocate(16).unwrap();
    heap.release(Some(neighbor)).unwrap();
    let overhead = heap.overhead_bytes();

    // Ten bytes short of a header would be left over; take them all.
    let grown = heap.resize(Some(block), 160).unwrap();

    assert_eq!(block, grown);
    assert_eq!(150 + HEADER_SIZE, heap.payload_size(grown).unwrap());
    assert_eq!(overhead - HEADER_SIZE, heap.overhead_bytes());
    check_invariants(&heap);
  }

  #[test]
  fn grow_relocates_and_preserves_data() {
    let mut memory = vec![0u8; 2048];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(100).unwrap();
    let _guard = heap.allocate(16).unwrap();
    write_pattern(&mut heap, block);

    let moved = heap.resize(Some(block), 500).unwrap();

    assert_ne!(block, moved);
    assert_eq!(500, heap.payload_size(moved).unwrap());
    assert_eq!(pattern(100), heap.payload(moved).unwrap()[..100]);
    assert_eq!(Err(HeapError::UnknownBlock(block)), heap.payload_size(block));
    check_invariants(&heap);
  }

  #[test]
  fn relocation_crosses_regions() {
    let mut memory = vec![0u8; HEADER_SIZE + 100 + 1024];
    let (small, large) = memory.split_at_mut(HEADER_SIZE + 100);
    let mut heap = Heap::new();
    heap.add_region(small).unwrap();
    heap.add_region(large).unwrap();

    let block = heap.allocate(100).unwrap();
    assert_eq!(0, block.region());
    write_pattern(&mut heap, block);

    let moved = heap.resize(Some(block), 400).unwrap();

    assert_eq!(1, moved.region());
    assert_eq!(pattern(100), heap.payload(moved).unwrap()[..100]);
    check_invariants(&heap);

    // And back again, into the space the first move gave up.
    let back = heap.allocate(100).unwrap();
    write_pattern(&mut heap, back);
    assert_eq!(0, back.region());
  }

  #[test]
  fn unknown_handle_is_rejected() {
    let mut memory = vec![0u8; 1024];
    let mut heap = Heap::new();
    heap.add_region(&mut memory).unwrap();

    let block = heap.allocate(64).unwrap();
    heap.release(Some(block)).unwrap();
    let free = heap.free_bytes();

    assert_eq!(Err(HeapError::UnknownBlock(block)), heap.resize(Some(block), 128));
    assert_eq!(free, heap.free_bytes());
  }
}
