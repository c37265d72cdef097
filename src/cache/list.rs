//! Ordered List Module
//!
//! Intrusive doubly linked list used to track recency order.
//!
//! Nodes live in a slot arena owned by the list and are addressed by
//! [`NodeId`] handles, so neighbours link to each other by index instead of
//! by pointer. Freed slots are recycled through a free list.

// == Node Handle ==
/// Stable handle to a node inside an [`OrderedList`].
///
/// A handle stays valid until its node is removed. After that the slot may be
/// reused by a later insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

// == Ordered List ==
/// Doubly linked list with O(1) insertion at either end, removal by handle
/// and move-to-front.
///
/// - Front (head) = most recently used
/// - Back (tail) = least recently used
#[derive(Debug)]
pub struct OrderedList<T> {
    /// Slot arena; `None` marks a free slot
    nodes: Vec<Option<Node<T>>>,
    /// Indices of free slots available for reuse
    free: Vec<usize>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a value as the new head and returns its handle.
    ///
    /// If the list was empty the node becomes both head and tail.
    pub fn push_front(&mut self, value: T) -> NodeId {
        let id = self.alloc(Node {
            value,
            prev: None,
            next: self.head,
        });

        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    // == Push Back ==
    /// Inserts a value as the new tail and returns its handle.
    pub fn push_back(&mut self, value: T) -> NodeId {
        let id = self.alloc(Node {
            value,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(old_tail) => self.node_mut(old_tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    // == Remove ==
    /// Unlinks the node behind `id` and returns its value.
    ///
    /// Returns None if the handle does not refer to a live node.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        self.unlink(id);
        self.len -= 1;
        self.free.push(id.0);
        self.nodes[id.0].take().map(|node| node.value)
    }

    // == Move To Front ==
    /// Relinks an existing node as the head without reallocating it.
    ///
    /// No-op if the node is already the head or the handle is stale.
    pub fn move_to_front(&mut self, id: NodeId) {
        if self.head == Some(id) || !self.contains(id) {
            return;
        }

        // `id` is live and not the head, so the list keeps a head after unlinking
        self.unlink(id);

        let old_head = self.head;
        {
            let node = self.node_mut(id);
            node.prev = None;
            node.next = old_head;
        }
        if let Some(head) = old_head {
            self.node_mut(head).prev = Some(id);
        }
        self.head = Some(id);
    }

    // == Pop Front / Back ==
    /// Removes and returns the head value, or None if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        self.head.and_then(|id| self.remove(id))
    }

    /// Removes and returns the tail value, or None if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        self.tail.and_then(|id| self.remove(id))
    }

    // == Peek ==
    /// Returns the handle of the head (most recently used) node.
    pub fn front(&self) -> Option<NodeId> {
        self.head
    }

    /// Returns the handle of the tail (least recently used) node.
    pub fn back(&self) -> Option<NodeId> {
        self.tail
    }

    /// Returns a reference to the value behind `id`.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|node| &node.value)
    }

    /// Returns a mutable reference to the value behind `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|node| &mut node.value)
    }

    // == Length ==
    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every node and resets the list to empty.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Iteration ==
    /// Iterates values from head (most recent) to tail (least recent).
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    // == Internal Helpers ==
    fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Detaches a live node from its neighbours and fixes head/tail.
    /// The node's own links are left stale for the caller to overwrite.
    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = {
            let node = self.node_mut(id);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        match &self.nodes[id.0] {
            Some(node) => node,
            None => unreachable!("linked handle {:?} points at a free slot", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.nodes[id.0] {
            Some(node) => node,
            None => unreachable!("linked handle {:?} points at a free slot", id),
        }
    }
}

// == Iterator ==
/// Front-to-back iterator over an [`OrderedList`].
pub struct Iter<'a, T> {
    list: &'a OrderedList<T>,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.list.node(id);
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
