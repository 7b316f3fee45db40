//! Canonical hash-tree encoding of domain records.
//!
//! Every hashed structure is first lowered into a [`HashTree`]: a leaf
//! (one canonical field element), an already-computed digest injected
//! verbatim, or a tuple of subtrees. Field orderings are fixed per record
//! type, and maps always encode their entries in ascending key order, the
//! iteration order of the underlying `BTreeMap`. This is the documented
//! tap order that cross-node agreement depends on.

use crate::based::BasedList;
use crate::felt::{Felt, P};
use crate::hash::Digest;
use crate::tip5::hash_varlen;
use alloy_primitives::U256;

const TAG_LEAF: Felt = match Felt::new(1) {
    Some(tag) => tag,
    None => unreachable!(),
};
const TAG_TUPLE: Felt = match Felt::new(2) {
    Some(tag) => tag,
    None => unreachable!(),
};

/// A canonical encoding node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HashTree {
    /// A single canonical field element.
    Leaf(Felt),
    /// A precomputed digest, injected verbatim.
    Digest(Digest),
    /// An ordered sequence of subtrees.
    Tuple(Vec<HashTree>),
}

impl HashTree {
    /// Encodes a 64-bit atom. Values at or above the modulus split into
    /// their based-list chunks so every leaf stays canonical.
    pub fn atom_u64(value: u64) -> Self {
        match Felt::new(value) {
            Some(felt) => Self::Leaf(felt),
            None => Self::wide(U256::from(value)),
        }
    }

    /// Encodes a wide atom through the based-list codec.
    pub fn wide(value: U256) -> Self {
        Self::based(&BasedList::from_atom(value))
    }

    /// Encodes an existing based list as a tuple of leaves.
    pub fn based(list: &BasedList) -> Self {
        Self::Tuple(list.chunks().iter().copied().map(Self::Leaf).collect())
    }

    /// Encodes an optional subtree: absent is a zero leaf, present wraps
    /// the subtree in a tagged tuple. The two shapes are disjoint.
    pub fn option(value: Option<HashTree>) -> Self {
        match value {
            None => Self::Leaf(Felt::ZERO),
            Some(tree) => Self::Tuple(vec![Self::Leaf(Felt::ONE), tree]),
        }
    }
}

/// Hashes a canonical tree.
///
/// Leaves and tuples live in disjoint tag domains; a `Digest` node is its
/// own hash, which is what lets a record embed the identity of another
/// record without re-encoding it.
pub fn tree_hash(tree: &HashTree) -> Digest {
    match tree {
        HashTree::Digest(digest) => *digest,
        HashTree::Leaf(atom) => {
            debug_assert!(atom.value() < P);
            Digest::from_tip5(hash_varlen(&[TAG_LEAF, *atom]))
        }
        HashTree::Tuple(items) => {
            let mut felts = Vec::with_capacity(2 + items.len() * 4);
            felts.push(TAG_TUPLE);
            felts.push(Felt::reduce(items.len() as u128));
            for item in items {
                felts.extend(tree_hash(item).to_felts());
            }
            Digest::from_tip5(hash_varlen(&felts))
        }
    }
}

/// Lowering into the canonical encoding.
pub trait AsHashTree {
    /// The canonical tree for this value, with a fixed field ordering.
    fn as_hash_tree(&self) -> HashTree;

    /// The structural hash of this value.
    fn tree_hash(&self) -> Digest {
        tree_hash(&self.as_hash_tree())
    }
}
