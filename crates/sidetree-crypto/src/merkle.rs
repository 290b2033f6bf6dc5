use crate::multihash::{HashAlgorithm, Multihash};

/// Side of a sibling in a Merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Binary Merkle tree over multihashes.
///
/// Leaves are the multihashes of the committed items, in the order given.
/// An internal node is `multihash(left_bytes ‖ right_bytes)`, hashed with the
/// algorithm of its left child, where
/// the bytes are binary multihashes and positions are fixed by index (never
/// sorted). A node without a right sibling is paired with itself. A tree with
/// one leaf has that leaf as its root.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// The root hash of the tree.
    root: Multihash,
    /// All tree nodes, stored level by level.
    /// Level 0 = leaves, last level = [root].
    levels: Vec<Vec<Multihash>>,
}

impl MerkleTree {
    /// Build a Merkle tree from leaf hashes.
    ///
    /// Returns `None` for no leaves, or when a node would have to be hashed
    /// with a deprecated algorithm.
    pub fn from_leaves(leaves: Vec<Multihash>) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let mut levels: Vec<Vec<Multihash>> = vec![leaves];

        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [odd] => hash_pair(odd, odd),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect::<Option<Vec<Multihash>>>()?;
            levels.push(next);
        }

        let root = levels.last()?.first()?.clone();
        Some(Self { root, levels })
    }

    /// Build a tree whose leaves are the SHA2-256 multihashes of `items`.
    pub fn from_data<T: AsRef<[u8]>>(items: &[T]) -> Option<Self> {
        Self::from_leaves(items.iter().map(|i| Multihash::sha256(i.as_ref())).collect())
    }

    /// Build a tree whose leaves and nodes are hashed with `algorithm`.
    /// Returns `None` for no items or a deprecated algorithm.
    pub fn from_data_with<T: AsRef<[u8]>>(algorithm: HashAlgorithm, items: &[T]) -> Option<Self> {
        let leaves = items
            .iter()
            .map(|i| Multihash::compute(algorithm, i.as_ref()).ok())
            .collect::<Option<Vec<_>>>()?;
        Self::from_leaves(leaves)
    }

    /// Algorithm of the root hash.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.root.algorithm()
    }

    /// The root hash of the tree.
    pub fn root(&self) -> &Multihash {
        &self.root
    }

    /// The leaf hashes, in order.
    pub fn leaves(&self) -> &[Multihash] {
        &self.levels[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Generate an inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = self.leaves().get(index)?.clone();

        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            // Odd level: the last node is paired with itself.
            let sibling = level.get(sibling_idx).unwrap_or(&level[idx]).clone();
            let side = if idx % 2 == 0 {
                Side::Right
            } else {
                Side::Left
            };
            path.push((sibling, side));
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            path,
            root: self.root.clone(),
        })
    }
}

/// Merkle inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Multihash,
    /// Path of (sibling_hash, sibling_side) pairs from leaf to root.
    pub path: Vec<(Multihash, Side)>,
    /// Expected root hash.
    pub root: Multihash,
}

impl MerkleProof {
    /// Verify the proof: recompute the root from the leaf and path.
    pub fn verify(&self) -> bool {
        let mut current = self.leaf.clone();
        for (sibling, side) in &self.path {
            let next = match side {
                Side::Left => hash_pair(sibling, &current),
                Side::Right => hash_pair(&current, sibling),
            };
            match next {
                Some(node) => current = node,
                None => return false,
            }
        }
        current == self.root
    }
}

fn hash_pair(left: &Multihash, right: &Multihash) -> Option<Multihash> {
    let mut buf = left.to_bytes();
    buf.extend_from_slice(&right.to_bytes());
    Multihash::compute(left.algorithm(), &buf).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(seed: u8) -> Multihash {
        Multihash::sha256(&[seed])
    }

    #[test]
    fn empty_tree_is_none() {
        assert!(MerkleTree::from_leaves(vec![]).is_none());
    }

    #[test]
    fn single_leaf_is_root() {
        let l = leaf(1);
        let tree = MerkleTree::from_leaves(vec![l.clone()]).unwrap();
        assert_eq!(tree.root(), &l);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn two_leaves_hash_left_then_right() {
        let tree = MerkleTree::from_leaves(vec![leaf(1), leaf(2)]).unwrap();
        let mut expected = leaf(1).to_bytes();
        expected.extend_from_slice(&leaf(2).to_bytes());
        assert_eq!(tree.root(), &Multihash::sha256(&expected));
    }

    #[test]
    fn order_matters() {
        let a = MerkleTree::from_leaves(vec![leaf(1), leaf(2)]).unwrap();
        let b = MerkleTree::from_leaves(vec![leaf(2), leaf(1)]).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn odd_node_pairs_with_itself() {
        let tree = MerkleTree::from_leaves(vec![leaf(1), leaf(2), leaf(3)]).unwrap();
        let left = hash_pair(&leaf(1), &leaf(2)).unwrap();
        let right = hash_pair(&leaf(3), &leaf(3)).unwrap();
        assert_eq!(tree.root(), &hash_pair(&left, &right).unwrap());
    }

    #[test]
    fn from_data_hashes_items() {
        let tree = MerkleTree::from_data(&[b"a".as_slice(), b"b".as_slice()]).unwrap();
        assert_eq!(tree.leaves()[0], Multihash::sha256(b"a"));
        assert_eq!(tree.leaves()[1], Multihash::sha256(b"b"));
    }

    #[test]
    fn sha512_tree_hashes_nodes_with_sha512() {
        let items = [b"a".as_slice(), b"b".as_slice(), b"c".as_slice()];
        let tree = MerkleTree::from_data_with(HashAlgorithm::Sha2_512, &items).unwrap();
        assert_eq!(tree.algorithm(), HashAlgorithm::Sha2_512);
        assert_eq!(tree.root().digest().len(), 64);

        let leaf = |d: &[u8]| Multihash::compute(HashAlgorithm::Sha2_512, d).unwrap();
        let node = |l: &Multihash, r: &Multihash| {
            Multihash::compute(HashAlgorithm::Sha2_512, &[l.to_bytes(), r.to_bytes()].concat()).unwrap()
        };
        let expected = node(&node(&leaf(b"a"), &leaf(b"b")), &node(&leaf(b"c"), &leaf(b"c")));
        assert_eq!(tree.root(), &expected);
        assert_ne!(tree.root(), MerkleTree::from_data(&items).unwrap().root());

        for i in 0..items.len() {
            assert!(tree.proof(i).unwrap().verify());
        }
    }

    #[test]
    fn deprecated_algorithm_builds_no_tree() {
        assert!(MerkleTree::from_data_with(HashAlgorithm::Sha1, &[b"a".as_slice(), b"b".as_slice()]).is_none());
    }

    #[test]
    fn proof_verifies_for_all_leaves() {
        let leaves: Vec<Multihash> = (0..7).map(leaf).collect();
        let tree = MerkleTree::from_leaves(leaves.clone()).unwrap();

        for i in 0..leaves.len() {
            let proof = tree.proof(i).expect("proof should exist");
            assert_eq!(proof.leaf, leaves[i]);
            assert!(proof.verify(), "proof for leaf {i} should verify");
        }
    }

    #[test]
    fn proof_out_of_bounds_returns_none() {
        let tree = MerkleTree::from_leaves(vec![leaf(1), leaf(2)]).unwrap();
        assert!(tree.proof(5).is_none());
    }

    #[test]
    fn tampered_proof_fails_verification() {
        let tree = MerkleTree::from_leaves(vec![leaf(1), leaf(2), leaf(3), leaf(4)]).unwrap();
        let mut proof = tree.proof(0).unwrap();
        proof.leaf = leaf(99);
        assert!(!proof.verify());
    }

    #[test]
    fn power_of_two_leaves() {
        let leaves: Vec<Multihash> = (0..8).map(leaf).collect();
        let tree = MerkleTree::from_leaves(leaves).unwrap();
        for i in 0..8 {
            let proof = tree.proof(i).unwrap();
            assert!(proof.verify());
            assert_eq!(proof.path.len(), 3); // log2(8) = 3
        }
    }

    #[test]
    fn deterministic_root() {
        let leaves: Vec<Multihash> = (0..10).map(leaf).collect();
        let tree1 = MerkleTree::from_leaves(leaves.clone()).unwrap();
        let tree2 = MerkleTree::from_leaves(leaves).unwrap();
        assert_eq!(tree1.root(), tree2.root());
    }
}
