//! Balanced ordered map used for directory sibling sets.
//!
//! The compound file format stores the children of every storage as a
//! red-black tree, so sibling lookup and the on-disk left/right/color
//! fields both fall out of the same structure. This module provides one
//! generic implementation; the format's name ordering is supplied by the
//! key type's `Ord` implementation.
//!
//! # Implementation Notes
//!
//! Nodes live in an arena and are addressed by `u32` index, with index 0
//! reserved for the NIL sentinel (always black, holds no key). Keys and
//! values are kept in a parallel vector so the sentinel does not need a
//! placeholder key. The tree supports insertion and lookup only; the
//! writer never removes entries once they are discovered.

use std::cmp::Ordering;

/// Index of the NIL sentinel node.
const NIL: u32 = 0;

/// Node color for red-black balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Structural links of one tree node.
///
/// `links[0]` belongs to the NIL sentinel; node `i` (for `i >= 1`) stores
/// its key/value pair at `entries[i - 1]`.
#[derive(Debug, Clone)]
struct Links {
    parent: u32,
    left: u32,
    right: u32,
    color: Color,
}

/// Rejected key returned when an equal key is already present.
#[derive(Debug)]
pub struct DuplicateKey<K>(pub K);

/// Arena-backed red-black tree keyed by `K`.
#[derive(Debug, Clone)]
pub struct RbTree<K, V> {
    entries: Vec<(K, V)>,
    links: Vec<Links>,
    root: u32,
}

/// Sibling links of one node as they appear in the binary projection.
#[derive(Debug)]
pub struct NodeProjection<'a, V> {
    /// Value stored at the node
    pub value: &'a V,
    /// Value of the left child, if any
    pub left: Option<&'a V>,
    /// Value of the right child, if any
    pub right: Option<&'a V>,
    /// Node color
    pub color: Color,
}

impl<K: Ord, V> RbTree<K, V> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            links: vec![Links {
                parent: NIL,
                left: NIL,
                right: NIL,
                color: Color::Black,
            }],
            root: NIL,
        }
    }

    /// Number of entries in the tree.
    #[allow(dead_code)] // Exercised by the test suite
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn key(&self, node: u32) -> &K {
        &self.entries[(node - 1) as usize].0
    }

    #[inline]
    fn value(&self, node: u32) -> &V {
        &self.entries[(node - 1) as usize].1
    }

    /// Look up a value by key.
    ///
    /// Returns `None` when no equal key exists in the tree.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.root;

        while current != NIL {
            match key.cmp(self.key(current)) {
                Ordering::Less => current = self.links[current as usize].left,
                Ordering::Greater => current = self.links[current as usize].right,
                Ordering::Equal => return Some(self.value(current)),
            }
        }

        None
    }

    /// Value stored at the tree root, if the tree is not empty.
    pub fn root_value(&self) -> Option<&V> {
        if self.root == NIL {
            None
        } else {
            Some(self.value(self.root))
        }
    }

    /// Insert a key/value pair, keeping the tree balanced.
    ///
    /// The descent rejects an equal key before any mutation, so a failed
    /// insert leaves the tree exactly as it was.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), DuplicateKey<K>> {
        let mut parent = NIL;
        let mut current = self.root;
        let mut went_left = false;

        while current != NIL {
            parent = current;

            match key.cmp(self.key(current)) {
                Ordering::Less => {
                    current = self.links[current as usize].left;
                    went_left = true;
                },
                Ordering::Greater => {
                    current = self.links[current as usize].right;
                    went_left = false;
                },
                Ordering::Equal => return Err(DuplicateKey(key)),
            }
        }

        self.entries.push((key, value));
        let node = self.entries.len() as u32;
        self.links.push(Links {
            parent,
            left: NIL,
            right: NIL,
            color: Color::Red,
        });

        if parent == NIL {
            self.root = node;
        } else if went_left {
            self.links[parent as usize].left = node;
        } else {
            self.links[parent as usize].right = node;
        }

        self.fix_insert(node);

        Ok(())
    }

    /// Restore the red-black invariants after inserting `node`.
    ///
    /// While the parent is red: recolor if the uncle is red and continue
    /// from the grandparent, otherwise rotate the node into the outer
    /// position (at most once), recolor parent and grandparent, and rotate
    /// the grandparent. The NIL sentinel is black, so the loop terminates
    /// at the root.
    fn fix_insert(&mut self, mut node: u32) {
        loop {
            let parent = self.links[node as usize].parent;
            if self.links[parent as usize].color != Color::Red {
                break;
            }

            let grand = self.links[parent as usize].parent;

            if parent == self.links[grand as usize].left {
                let uncle = self.links[grand as usize].right;

                if self.links[uncle as usize].color == Color::Red {
                    // Case 1: uncle is red
                    self.links[parent as usize].color = Color::Black;
                    self.links[uncle as usize].color = Color::Black;
                    self.links[grand as usize].color = Color::Red;
                    node = grand;
                } else {
                    // Case 2: node is an inner (right) child
                    if node == self.links[parent as usize].right {
                        node = parent;
                        self.rotate_left(node);
                    }

                    // Case 3: node is an outer (left) child
                    let parent = self.links[node as usize].parent;
                    let grand = self.links[parent as usize].parent;
                    self.links[parent as usize].color = Color::Black;
                    self.links[grand as usize].color = Color::Red;
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.links[grand as usize].left;

                if self.links[uncle as usize].color == Color::Red {
                    // Case 1: uncle is red
                    self.links[parent as usize].color = Color::Black;
                    self.links[uncle as usize].color = Color::Black;
                    self.links[grand as usize].color = Color::Red;
                    node = grand;
                } else {
                    // Case 2: node is an inner (left) child
                    if node == self.links[parent as usize].left {
                        node = parent;
                        self.rotate_right(node);
                    }

                    // Case 3: node is an outer (right) child
                    let parent = self.links[node as usize].parent;
                    let grand = self.links[parent as usize].parent;
                    self.links[parent as usize].color = Color::Black;
                    self.links[grand as usize].color = Color::Red;
                    self.rotate_left(grand);
                }
            }
        }

        let root = self.root;
        self.links[root as usize].color = Color::Black;
    }

    fn rotate_left(&mut self, node: u32) {
        let pivot = self.links[node as usize].right;
        let inner = self.links[pivot as usize].left;

        self.links[node as usize].right = inner;
        if inner != NIL {
            self.links[inner as usize].parent = node;
        }

        let parent = self.links[node as usize].parent;
        self.links[pivot as usize].parent = parent;

        if parent == NIL {
            self.root = pivot;
        } else if node == self.links[parent as usize].left {
            self.links[parent as usize].left = pivot;
        } else {
            self.links[parent as usize].right = pivot;
        }

        self.links[pivot as usize].left = node;
        self.links[node as usize].parent = pivot;
    }

    fn rotate_right(&mut self, node: u32) {
        let pivot = self.links[node as usize].left;
        let inner = self.links[pivot as usize].right;

        self.links[node as usize].left = inner;
        if inner != NIL {
            self.links[inner as usize].parent = node;
        }

        let parent = self.links[node as usize].parent;
        self.links[pivot as usize].parent = parent;

        if parent == NIL {
            self.root = pivot;
        } else if node == self.links[parent as usize].right {
            self.links[parent as usize].right = pivot;
        } else {
            self.links[parent as usize].left = pivot;
        }

        self.links[pivot as usize].right = node;
        self.links[node as usize].parent = pivot;
    }

    /// In-order iterator over the tree's key/value pairs.
    ///
    /// The iterator is lazy and restartable; calling `iter` again starts a
    /// fresh traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            stack: Vec::new(),
            current: self.root,
        }
    }

    /// Per-node sibling links and colors, in arena order.
    ///
    /// Used to fill the left/right/color fields of the directory binary
    /// projection; traversal order does not matter for that purpose.
    pub fn projections(&self) -> impl Iterator<Item = NodeProjection<'_, V>> + '_ {
        (1..=self.entries.len() as u32).map(move |node| {
            let links = &self.links[node as usize];
            NodeProjection {
                value: self.value(node),
                left: (links.left != NIL).then(|| self.value(links.left)),
                right: (links.right != NIL).then(|| self.value(links.right)),
                color: links.color,
            }
        })
    }
}

impl<K: Ord, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order traversal state.
pub struct Iter<'a, K, V> {
    tree: &'a RbTree<K, V>,
    stack: Vec<u32>,
    current: u32,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current != NIL {
            self.stack.push(self.current);
            self.current = self.tree.links[self.current as usize].left;
        }

        let node = self.stack.pop()?;
        self.current = self.tree.links[node as usize].right;

        let (key, value) = &self.tree.entries[(node - 1) as usize];
        Some((key, value))
    }
}
