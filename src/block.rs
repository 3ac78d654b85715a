use crate::align;

const LINK_BYTES: usize = 8;
const SIZE_BYTES: usize = 4;

const PREV_AT: usize = 0;
const NEXT_AT: usize = PREV_AT + LINK_BYTES;
const SIZE_AT: usize = NEXT_AT + LINK_BYTES;

/// Encoded value of an absent link.
const NIL: u64 = u64::MAX;

/// Bytes taken by every block header, in front of its payload.
pub const HEADER_SIZE: usize = align!(LINK_BYTES * 2 + SIZE_BYTES);

/// Largest region (and therefore payload) a header can describe.
pub(crate) const MAX_REGION_LEN: usize = u32::MAX as usize;

/// Location of a block header: region index plus byte offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeRef {
  pub region: usize,
  pub offset: usize,
}

impl NodeRef {
  pub fn new(
    region: usize,
    offset: usize,
  ) -> Self {
    Self { region, offset }
  }

  /// Offset of the first payload byte.
  pub fn payload(self) -> usize {
    self.offset + HEADER_SIZE
  }

  /// Header that would start right after `size` payload bytes of this block.
  pub fn following(
    self,
    size: usize,
  ) -> Self {
    Self::new(self.region, self.payload() + size)
  }

  /// Whether `upper` starts on the byte right after this block's payload.
  pub fn precedes(
    self,
    size: usize,
    upper: NodeRef,
  ) -> bool {
    self.region == upper.region && contiguous(self.offset, size, upper.offset)
  }

  fn encode(link: Option<NodeRef>) -> u64 {
    match link {
      Some(node) => ((node.region as u64) << 32) | node.offset as u64,
      None => NIL,
    }
  }

  fn decode(raw: u64) -> Option<NodeRef> {
    if raw == NIL {
      return None;
    }

    Some(Self::new((raw >> 32) as usize, (raw & u32::MAX as u64) as usize))
  }
}

/// `address + HEADER_SIZE + size == next`: the block at `address` with a
/// `size` byte payload ends exactly where `next` begins.
pub(crate) fn contiguous(
  address: usize,
  size: usize,
  next: usize,
) -> bool {
  address + HEADER_SIZE + size == next
}

/// In-band block metadata, stored in the `HEADER_SIZE` bytes before a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
  pub prev: Option<NodeRef>,
  pub next: Option<NodeRef>,
  pub size: usize,
}

impl Header {
  pub fn new(size: usize) -> Self {
    Self {
      prev: None,
      next: None,
      size,
    }
  }

  /// Decodes a header from the first `HEADER_SIZE` bytes of `bytes`.
  pub fn read(bytes: &[u8]) -> Self {
    let mut link = [0u8; LINK_BYTES];
    let mut size = [0u8; SIZE_BYTES];

    link.copy_from_slice(&bytes[PREV_AT..PREV_AT + LINK_BYTES]);
    let prev = NodeRef::decode(u64::from_ne_bytes(link));

    link.copy_from_slice(&bytes[NEXT_AT..NEXT_AT + LINK_BYTES]);
    let next = NodeRef::decode(u64::from_ne_bytes(link));

    size.copy_from_slice(&bytes[SIZE_AT..SIZE_AT + SIZE_BYTES]);

    Self {
      prev,
      next,
      size: u32::from_ne_bytes(size) as usize,
    }
  }

  /// Encodes the header into the first `HEADER_SIZE` bytes of `bytes`.
  ///
  /// `size` must fit in 32 bits; region registration guarantees it.
  pub fn write(
    &self,
    bytes: &mut [u8],
  ) {
    bytes[PREV_AT..PREV_AT + LINK_BYTES].copy_from_slice(&NodeRef::encode(self.prev).to_ne_bytes());
    bytes[NEXT_AT..NEXT_AT + LINK_BYTES].copy_from_slice(&NodeRef::encode(self.next).to_ne_bytes());
    bytes[SIZE_AT..SIZE_AT + SIZE_BYTES].copy_from_slice(&(self.size as u32).to_ne_bytes());
  }
}

/// Handle to an assigned block, returned by the allocation calls.
///
/// It names the region the block lives in and the offset of its payload
/// inside that region; the header always sits `HEADER_SIZE` bytes earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
  region: usize,
  offset: usize,
}

impl Block {
  pub(crate) fn from_node(node: NodeRef) -> Self {
    Self {
      region: node.region,
      offset: node.payload(),
    }
  }

  /// Header location, if the payload offset leaves room for one.
  pub(crate) fn node(self) -> Option<NodeRef> {
    self
      .offset
      .checked_sub(HEADER_SIZE)
      .map(|offset| NodeRef::new(self.region, offset))
  }

  /// Index of the region, in registration order.
  pub fn region(&self) -> usize {
    self.region
  }

  /// Offset of the payload from the start of its region.
  pub fn offset(&self) -> usize {
    self.offset
  }
}
