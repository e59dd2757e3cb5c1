//! The 3D iteration interval [`BlockRange`].

use std::fmt;

/// A half-open 3D index-space interval `[begin, end)` per axis.
///
/// The unit of iteration for the portable loops: a loop invokes its
/// functor once per integer triple inside the range. A zero extent in
/// any dimension yields zero iterations — empty boundary ranges occur
/// routinely and must not fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRange {
    offset: [i32; 3],
    dim: [i32; 3],
}

impl BlockRange {
    /// Number of axes.
    pub const RANK: usize = 3;

    /// Build a range from two corners, normalizing so `begin <= end`
    /// on every axis.
    pub fn new(c0: [i32; 3], c1: [i32; 3]) -> Self {
        let mut offset = [0; 3];
        let mut dim = [0; 3];
        for d in 0..Self::RANK {
            offset[d] = c0[d].min(c1[d]);
            dim[d] = c0[d].max(c1[d]) - offset[d];
        }
        Self { offset, dim }
    }

    /// Build a range from an offset and per-axis extents.
    ///
    /// Negative extents are treated as zero.
    pub fn from_extent(offset: [i32; 3], extent: [i32; 3]) -> Self {
        Self {
            offset,
            dim: [extent[0].max(0), extent[1].max(0), extent[2].max(0)],
        }
    }

    /// The canonical empty range.
    pub fn empty() -> Self {
        Self {
            offset: [0; 3],
            dim: [0; 3],
        }
    }

    /// First index on axis `d`.
    pub fn begin(&self, d: usize) -> i32 {
        self.offset[d]
    }

    /// One past the last index on axis `d`.
    pub fn end(&self, d: usize) -> i32 {
        self.offset[d] + self.dim[d]
    }

    /// Extent on axis `d`.
    pub fn extent(&self, d: usize) -> i32 {
        self.dim[d]
    }

    /// Total number of index triples in the range.
    pub fn size(&self) -> usize {
        self.dim.iter().product::<i32>().max(0) as usize
    }

    /// Whether the range contains zero triples.
    pub fn is_empty(&self) -> bool {
        self.dim.iter().any(|&d| d == 0)
    }

    /// Whether `(i, j, k)` lies inside the range.
    pub fn contains(&self, i: i32, j: i32, k: i32) -> bool {
        let p = [i, j, k];
        (0..Self::RANK).all(|d| p[d] >= self.begin(d) && p[d] < self.end(d))
    }

    /// The range grown by `g` on every face. Negative `g` shrinks;
    /// extents clamp at zero.
    pub fn grow(&self, g: i32) -> Self {
        Self::from_extent(
            [self.offset[0] - g, self.offset[1] - g, self.offset[2] - g],
            [
                self.dim[0] + 2 * g,
                self.dim[1] + 2 * g,
                self.dim[2] + 2 * g,
            ],
        )
    }

    /// The overlap of two ranges, possibly empty.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut offset = [0; 3];
        let mut dim = [0; 3];
        for d in 0..Self::RANK {
            let begin = self.begin(d).max(other.begin(d));
            let end = self.end(d).min(other.end(d));
            offset[d] = begin;
            dim[d] = (end - begin).max(0);
        }
        Self { offset, dim }
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})x[{}, {})x[{}, {})",
            self.begin(0),
            self.end(0),
            self.begin(1),
            self.end(1),
            self.begin(2),
            self.end(2),
        )
    }
}
