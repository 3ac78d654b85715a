use log::trace;

use crate::block::NodeRef;
use crate::heap::Heap;

/// The two address-ordered lists every header lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum List {
  Available,
  Assigned,
}

/// Walks a list from its root, following `next` links.
pub(crate) struct Iter<'h, 'a> {
  heap: &'h Heap<'a>,
  current: Option<NodeRef>,
}

impl Iterator for Iter<'_, '_> {
  type Item = NodeRef;

  fn next(&mut self) -> Option<NodeRef> {
    let node = self.current?;
    self.current = self.heap.header(node).next;
    Some(node)
  }
}

impl<'a> Heap<'a> {
  fn root(
    &mut self,
    list: List,
  ) -> &mut Option<NodeRef> {
    match list {
      List::Available => &mut self.available,
      List::Assigned => &mut self.assigned,
    }
  }

  pub(crate) fn iter(
    &self,
    list: List,
  ) -> Iter<'_, 'a> {
    let current = match list {
      List::Available => self.available,
      List::Assigned => self.assigned,
    };

    Iter {
      heap: self,
      current,
    }
  }

  /// Links `node` into `list`, keeping the list sorted by address.
  pub(crate) fn insert_sorted(
    &mut self,
    list: List,
    node: NodeRef,
  ) {
    trace!("insert {:?} into {:?}", node, list);

    let key = self.address(node);

    let Some(root) = *self.root(list) else {
      self.set_prev(node, None);
      self.set_next(node, None);
      *self.root(list) = Some(node);
      return;
    };

    if key < self.address(root) {
      self.set_prev(node, None);
      self.set_next(node, Some(root));
      self.set_prev(root, Some(node));
      *self.root(list) = Some(node);
      return;
    }

    let mut current = root;
    while let Some(next) = self.header(current).next {
      if key < self.address(next) {
        break;
      }
      current = next;
    }

    let next = self.header(current).next;

    self.set_prev(node, Some(current));
    self.set_next(node, next);
    self.set_next(current, Some(node));
    if let Some(next) = next {
      self.set_prev(next, Some(node));
    }
  }

  /// Unlinks `node` from `list` and clears its links.
  pub(crate) fn remove(
    &mut self,
    list: List,
    node: NodeRef,
  ) {
    trace!("remove {:?} from {:?}", node, list);

    let header = self.header(node);

    if let Some(prev) = header.prev {
      self.set_next(prev, header.next);
    }
    if let Some(next) = header.next {
      self.set_prev(next, header.prev);
    }

    let root = self.root(list);
    if *root == Some(node) {
      *root = header.next;
    }

    self.set_prev(node, None);
    self.set_next(node, None);
  }
}
