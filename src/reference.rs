use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Handle to a BDD node with a complement bit.
///
/// The lowest bit marks a negated edge; the remaining bits hold the node index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(u32);

impl Ref {
    pub const fn new(index: u32, negated: bool) -> Self {
        Self((index << 1) | negated as u32)
    }

    pub const fn positive(index: u32) -> Self {
        Self::new(index, false)
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    /// Return the index of the referenced node.
    pub const fn index(self) -> usize {
        (self.0 >> 1) as usize
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}
