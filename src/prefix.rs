use std::cmp::min;

use smallvec::SmallVec;

/// The compressed path a node shares with every key stored below it.
///
/// Convention (shared with every traversal routine in this crate): the
/// prefix of a non-root node begins with the byte its parent keys it under.
/// Path compression then degenerates to plain concatenation, and
/// concatenating the prefixes along any root-to-leaf path reconstructs that
/// leaf's full encoded key.
///
/// Short prefixes live inline; long key suffixes on leaves spill to the
/// heap.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct Prefix {
    data: SmallVec<[u8; 16]>,
}

impl Prefix {
    pub fn from_slice(src: &[u8]) -> Self {
        Self {
            data: SmallVec::from_slice(src),
        }
    }

    /// The first `length` bytes.
    pub fn partial_before(&self, length: usize) -> Self {
        debug_assert!(length <= self.data.len());
        Self::from_slice(&self.data[..length])
    }

    /// Everything from `start` onwards.
    pub fn partial_after(&self, start: usize) -> Self {
        debug_assert!(start <= self.data.len());
        Self::from_slice(&self.data[start..])
    }

    /// Concatenation, used when a level is collapsed into its sole child.
    pub fn extended_with(&self, other: &Prefix) -> Self {
        let mut data = SmallVec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Self { data }
    }

    #[inline(always)]
    pub fn at(&self, pos: usize) -> u8 {
        self.data[pos]
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length of the common prefix of `self` and `slice`.
    pub fn prefix_length_slice(&self, slice: &[u8]) -> usize {
        let len = min(self.data.len(), slice.len());
        let mut idx = 0;
        while idx < len {
            if self.data[idx] != slice[idx] {
                break;
            }
            idx += 1;
        }
        idx
    }

    pub fn to_slice(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for Prefix {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::Prefix;

    #[test]
    fn before_after_extend() {
        let p = Prefix::from_slice(b"hello");
        assert_eq!(p.partial_before(3).to_slice(), b"hel");
        assert_eq!(p.partial_after(3).to_slice(), b"lo");
        let q = p.partial_before(3).extended_with(&p.partial_after(3));
        assert_eq!(q.to_slice(), b"hello");
        assert_eq!(q, p);
    }

    #[test]
    fn common_prefix_lengths() {
        let p = Prefix::from_slice(b"abcd");
        assert_eq!(p.prefix_length_slice(b"abxy"), 2);
        assert_eq!(p.prefix_length_slice(b"abcd"), 4);
        assert_eq!(p.prefix_length_slice(b"abcdef"), 4);
        assert_eq!(p.prefix_length_slice(b""), 0);
        assert_eq!(Prefix::from_slice(b"").prefix_length_slice(b"abc"), 0);
    }

    #[test]
    fn long_prefix_spills() {
        let long: Vec<u8> = (0..64).collect();
        let p = Prefix::from_slice(&long);
        assert_eq!(p.len(), 64);
        assert_eq!(p.to_slice(), &long[..]);
        assert_eq!(p.at(63), 63);
    }
}
