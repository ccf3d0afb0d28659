//! Red-black tree keyed by ride id.
//!
//! Nodes live in a vector and link to each other by index. Index 0 is the
//! shared black sentinel standing in for every leaf and for the parent of the
//! root. Deletion relinks nodes rather than copying payloads, so a [`NodeId`]
//! stays attached to the same key for as long as that key is indexed.

use std::cmp::Ordering;

use crate::errors::{IndexError, InvariantError};

pub type NodeId = usize;

/// The sentinel leaf.
pub const NIL: NodeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    live: bool,
}

impl<K: Default, V: Default> Node<K, V> {
    fn sentinel() -> Self {
        Self {
            key: K::default(),
            value: V::default(),
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
            live: false,
        }
    }
}

#[derive(Debug)]
pub struct RedBlackTree<K, V> {
    nodes: Vec<Node<K, V>>,
    root: NodeId,
    free: Vec<NodeId>,
    len: usize,
}

impl<K, V> Default for RedBlackTree<K, V>
where
    K: Ord + Copy + Default,
    V: Copy + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RedBlackTree<K, V>
where
    K: Ord + Copy + Default,
    V: Copy + Default,
{
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::sentinel()],
            root: NIL,
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_node(key).map(|node| &self.nodes[node].value)
    }

    pub fn get_node(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while cur != NIL {
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Less => cur = self.nodes[cur].left,
                Ordering::Greater => cur = self.nodes[cur].right,
                Ordering::Equal => return Some(cur),
            }
        }
        None
    }

    /// Key and value stored at `node`, if it currently holds an entry.
    pub fn entry(&self, node: NodeId) -> Option<(&K, &V)> {
        self.nodes
            .get(node)
            .filter(|n| n.live)
            .map(|n| (&n.key, &n.value))
    }

    pub fn insert(&mut self, key: K, value: V) -> Result<NodeId, IndexError> {
        let mut parent = NIL;
        let mut cur = self.root;
        let mut go_left = false;
        while cur != NIL {
            parent = cur;
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Less => {
                    go_left = true;
                    cur = self.nodes[cur].left;
                }
                Ordering::Greater => {
                    go_left = false;
                    cur = self.nodes[cur].right;
                }
                Ordering::Equal => return Err(IndexError::DuplicateKey),
            }
        }

        let node = self.alloc(key, value, parent);
        if parent == NIL {
            self.root = node;
        } else if go_left {
            self.nodes[parent].left = node;
        } else {
            self.nodes[parent].right = node;
        }

        self.insert_fixup(node);
        self.len += 1;
        Ok(node)
    }

    /// Removes `key` and hands back the value it carried.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let z = self.get_node(key)?;

        let mut removed_color = self.nodes[z].color;
        let x;
        if self.nodes[z].left == NIL {
            x = self.nodes[z].right;
            self.transplant(z, x);
        } else if self.nodes[z].right == NIL {
            x = self.nodes[z].left;
            self.transplant(z, x);
        } else {
            // Splice in the in-order successor.
            let y = self.minimum(self.nodes[z].right);
            removed_color = self.nodes[y].color;
            x = self.nodes[y].right;
            if self.nodes[y].parent == z {
                self.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                self.nodes[y].right = self.nodes[z].right;
                let right = self.nodes[y].right;
                self.nodes[right].parent = y;
            }
            self.transplant(z, y);
            self.nodes[y].left = self.nodes[z].left;
            let left = self.nodes[y].left;
            self.nodes[left].parent = y;
            self.nodes[y].color = self.nodes[z].color;
        }

        if removed_color == Color::Black {
            self.delete_fixup(x);
        }
        self.nodes[NIL].parent = NIL;

        let value = self.nodes[z].value;
        self.release(z);
        self.len -= 1;
        Some(value)
    }

    /// Entries with `low <= key <= high`, ascending by key.
    pub fn range(&self, low: &K, high: &K) -> Vec<(K, V)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        let mut cur = self.root;

        loop {
            while cur != NIL {
                stack.push(cur);
                let node = &self.nodes[cur];
                cur = if *low < node.key { node.left } else { NIL };
            }

            let Some(top) = stack.pop() else {
                break;
            };
            let node = &self.nodes[top];
            if *low <= node.key && node.key <= *high {
                out.push((node.key, node.value));
            }
            cur = if node.key < *high { node.right } else { NIL };
        }

        out
    }

    /// Every entry, ascending by key.
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = Vec::new();
        let mut cur = self.root;

        loop {
            while cur != NIL {
                stack.push(cur);
                cur = self.nodes[cur].left;
            }
            let Some(top) = stack.pop() else {
                break;
            };
            out.push((self.nodes[top].key, self.nodes[top].value));
            cur = self.nodes[top].right;
        }

        out
    }

    /// Checks the red-black rules, parent links and key order.
    pub fn validate(&self) -> Result<(), InvariantError> {
        if self.nodes[NIL].color != Color::Black {
            return Err(InvariantError::RedSentinel);
        }
        if self.nodes[self.root].color != Color::Black {
            return Err(InvariantError::RedRoot);
        }
        if self.root != NIL && self.nodes[self.root].parent != NIL {
            return Err(InvariantError::BrokenParent(self.root));
        }

        self.black_height(self.root)?;

        let entries = self.entries();
        if entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(InvariantError::UnorderedKeys);
        }
        if entries.len() != self.len {
            return Err(InvariantError::SizeMismatch {
                expected: self.len,
                found: entries.len(),
            });
        }
        Ok(())
    }

    fn black_height(&self, node: NodeId) -> Result<usize, InvariantError> {
        if node == NIL {
            return Ok(1);
        }

        let n = &self.nodes[node];
        for child in [n.left, n.right] {
            if child == NIL {
                continue;
            }
            if self.nodes[child].parent != node {
                return Err(InvariantError::BrokenParent(child));
            }
            if n.color == Color::Red && self.nodes[child].color == Color::Red {
                return Err(InvariantError::RedRedEdge(node));
            }
        }

        let left = self.black_height(n.left)?;
        let right = self.black_height(n.right)?;
        if left != right {
            return Err(InvariantError::BlackHeight(node));
        }
        Ok(left + usize::from(n.color == Color::Black))
    }

    fn alloc(&mut self, key: K, value: V, parent: NodeId) -> NodeId {
        let node = Node {
            key,
            value,
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
            live: true,
        };

        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, node: NodeId) {
        let n = &mut self.nodes[node];
        n.live = false;
        n.parent = NIL;
        n.left = NIL;
        n.right = NIL;
        n.color = Color::Black;
        self.free.push(node);
    }

    fn minimum(&self, mut node: NodeId) -> NodeId {
        while self.nodes[node].left != NIL {
            node = self.nodes[node].left;
        }
        node
    }

    fn color(&self, node: NodeId) -> Color {
        self.nodes[node].color
    }

    fn set_color(&mut self, node: NodeId, color: Color) {
        self.nodes[node].color = color;
    }

    fn parent(&self, node: NodeId) -> NodeId {
        self.nodes[node].parent
    }

    fn left(&self, node: NodeId) -> NodeId {
        self.nodes[node].left
    }

    fn right(&self, node: NodeId) -> NodeId {
        self.nodes[node].right
    }

    /// Puts `v` where `u` hangs. `v` may be the sentinel, whose parent link
    /// is then used by the delete fixup.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let parent = self.parent(u);
        if parent == NIL {
            self.root = v;
        } else if u == self.left(parent) {
            self.nodes[parent].left = v;
        } else {
            self.nodes[parent].right = v;
        }
        self.nodes[v].parent = parent;
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        let inner = self.left(y);

        self.nodes[x].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }

        let parent = self.parent(x);
        self.nodes[y].parent = parent;
        if parent == NIL {
            self.root = y;
        } else if x == self.left(parent) {
            self.nodes[parent].left = y;
        } else {
            self.nodes[parent].right = y;
        }

        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x);
        let inner = self.right(y);

        self.nodes[x].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }

        let parent = self.parent(x);
        self.nodes[y].parent = parent;
        if parent == NIL {
            self.root = y;
        } else if x == self.right(parent) {
            self.nodes[parent].right = y;
        } else {
            self.nodes[parent].left = y;
        }

        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.color(self.parent(z)) == Color::Red {
            let parent = self.parent(z);
            let grand = self.parent(parent);

            if parent == self.left(grand) {
                let uncle = self.right(grand);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    if z == self.right(parent) {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.parent(z);
                    let grand = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.left(grand);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    if z == self.left(parent) {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.parent(z);
                    let grand = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn delete_fixup(&mut self, mut x: NodeId) {
        while x != self.root && self.color(x) == Color::Black {
            let parent = self.parent(x);

            if x == self.left(parent) {
                let mut sibling = self.right(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.right(self.parent(x));
                }

                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.right(sibling)) == Color::Black {
                        let near = self.left(sibling);
                        self.set_color(near, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right(self.parent(x));
                    }

                    let parent = self.parent(x);
                    let far = self.right(sibling);
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(far, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut sibling = self.left(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.left(self.parent(x));
                }

                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.left(sibling)) == Color::Black {
                        let near = self.right(sibling);
                        self.set_color(near, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left(self.parent(x));
                    }

                    let parent = self.parent(x);
                    let far = self.left(sibling);
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(far, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }
}
