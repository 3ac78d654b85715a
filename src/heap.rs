use std::fmt;

use log::{debug, warn};

use crate::block::{Block, HEADER_SIZE, Header, MAX_REGION_LEN, NodeRef};
use crate::error::HeapError;
use crate::list::List;

/// A heap carved out of caller-supplied memory regions.
///
/// Every block, free or assigned, is preceded by a header stored inside the
/// region itself. Free headers sit on the `available` list and assigned ones
/// on the `assigned` list, both kept in ascending address order.
///
/// The heap borrows its regions for `'a` and never gives memory back to
/// whoever supplied it; releasing a block only returns it to the free list.
/// It is not synchronized: share it across threads only behind a lock.
pub struct Heap<'a> {
  pub(crate) regions: Vec<&'a mut [u8]>,
  pub(crate) available: Option<NodeRef>,
  pub(crate) assigned: Option<NodeRef>,
  pub(crate) free_bytes: usize,
  pub(crate) region_bytes: usize,
  pub(crate) node_count: usize,
}

impl<'a> Heap<'a> {
  /// Creates a heap with no memory; register some with [`Heap::add_region`].
  pub fn new() -> Self {
    Self {
      regions: Vec::new(),
      available: None,
      assigned: None,
      free_bytes: 0,
      region_bytes: 0,
      node_count: 0,
    }
  }

  /// Forgets every region and block, as if freshly created.
  ///
  /// Outstanding [`Block`] handles become unknown to the heap.
  pub fn reset(&mut self) {
    *self = Self::new();
  }

  /// Hands `region` to the heap as one free block.
  ///
  /// Regions need not touch each other; blocks never merge across regions.
  pub fn add_region(
    &mut self,
    region: &'a mut [u8],
  ) -> Result<(), HeapError> {
    let len = region.len();

    if len < HEADER_SIZE {
      warn!("rejecting region of {} bytes: smaller than a header", len);
      return Err(HeapError::RegionTooSmall { len });
    }

    if len > MAX_REGION_LEN {
      warn!("rejecting region of {} bytes: larger than {}", len, MAX_REGION_LEN);
      return Err(HeapError::RegionTooLarge { len });
    }

    if self.regions.len() >= u32::MAX as usize {
      return Err(HeapError::TooManyRegions);
    }

    let node = NodeRef::new(self.regions.len(), 0);
    let size = len - HEADER_SIZE;

    Header::new(size).write(region);
    self.regions.push(region);

    self.insert_sorted(List::Available, node);
    self.node_count += 1;
    self.free_bytes += size;
    self.region_bytes += len;

    debug!(
      "registered region {} at {:#x}: {} bytes, {} usable",
      node.region,
      self.address(node),
      len,
      size
    );

    Ok(())
  }

  /// Payload bytes that are currently free.
  pub fn free_bytes(&self) -> usize {
    self.free_bytes
  }

  /// Payload bytes across all blocks, free or assigned.
  ///
  /// Header overhead is excluded, so this shrinks by one header whenever a
  /// block is split and grows back when blocks merge.
  pub fn total_bytes(&self) -> usize {
    self.region_bytes - self.overhead_bytes()
  }

  /// Payload bytes handed out to callers.
  pub fn used_bytes(&self) -> usize {
    self.total_bytes() - self.free_bytes
  }

  /// Bytes taken by block headers.
  pub fn overhead_bytes(&self) -> usize {
    self.node_count * HEADER_SIZE
  }

  /// Number of registered regions.
  pub fn region_count(&self) -> usize {
    self.regions.len()
  }

  /// Payload size of an assigned block.
  ///
  /// This can exceed the size asked for when the leftover was too small to
  /// become a block of its own.
  pub fn payload_size(
    &self,
    block: Block,
  ) -> Result<usize, HeapError> {
    let node = self.assigned_node(block)?;
    Ok(self.header(node).size)
  }

  /// Payload bytes of an assigned block.
  pub fn payload(
    &self,
    block: Block,
  ) -> Result<&[u8], HeapError> {
    let node = self.assigned_node(block)?;
    let size = self.header(node).size;
    let start = node.payload();

    Ok(&self.regions[node.region][start..start + size])
  }

  /// Mutable payload bytes of an assigned block.
  pub fn payload_mut(
    &mut self,
    block: Block,
  ) -> Result<&mut [u8], HeapError> {
    let node = self.assigned_node(block)?;
    let size = self.header(node).size;
    let start = node.payload();

    Ok(&mut self.regions[node.region][start..start + size])
  }

  /// Resolves a handle to its header, provided the block is assigned here.
  pub(crate) fn assigned_node(
    &self,
    block: Block,
  ) -> Result<NodeRef, HeapError> {
    let known = block
      .node()
      .filter(|node| {
        self
          .regions
          .get(node.region)
          .is_some_and(|region| node.payload() <= region.len())
      })
      .filter(|&node| self.iter(List::Assigned).any(|assigned| assigned == node));

    known.ok_or_else(|| {
      warn!(
        "block at offset {} of region {} is not assigned",
        block.offset(),
        block.region()
      );
      HeapError::UnknownBlock(block)
    })
  }

  /// Memory address of a header, the key both lists are sorted by.
  pub(crate) fn address(
    &self,
    node: NodeRef,
  ) -> usize {
    self.regions[node.region].as_ptr() as usize + node.offset
  }

  pub(crate) fn header(
    &self,
    node: NodeRef,
  ) -> Header {
    Header::read(&self.regions[node.region][node.offset..node.payload()])
  }

  pub(crate) fn set_header(
    &mut self,
    node: NodeRef,
    header: Header,
  ) {
    header.write(&mut self.regions[node.region][node.offset..node.payload()]);
  }

  pub(crate) fn size_of(
    &self,
    node: NodeRef,
  ) -> usize {
    self.header(node).size
  }

  pub(crate) fn set_size(
    &mut self,
    node: NodeRef,
    size: usize,
  ) {
    let mut header = self.header(node);
    header.size = size;
    self.set_header(node, header);
  }

  pub(crate) fn set_prev(
    &mut self,
    node: NodeRef,
    prev: Option<NodeRef>,
  ) {
    let mut header = self.header(node);
    header.prev = prev;
    self.set_header(node, header);
  }

  pub(crate) fn set_next(
    &mut self,
    node: NodeRef,
    next: Option<NodeRef>,
  ) {
    let mut header = self.header(node);
    header.next = next;
    self.set_header(node, header);
  }
}

impl Default for Heap<'_> {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Heap<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Heap")
      .field("regions", &self.regions.len())
      .field("free_bytes", &self.free_bytes)
      .field("total_bytes", &self.total_bytes())
      .field("node_count", &self.node_count)
      .finish()
  }
}
