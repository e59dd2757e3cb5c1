//! The [`Level`]: a full decomposition of the domain into patches.

use indexmap::IndexMap;
use smallvec::SmallVec;

use strata_core::PatchId;
use strata_exec::BlockRange;

use crate::error::GridError;
use crate::patch::Patch;

/// A complete tiling of the simulation domain by [`Patch`]es.
///
/// Built once at grid setup by [`Level::decompose`] and read-only for
/// the rest of the run. Neighbor adjacency (face, edge, and corner) is
/// wired at construction so ghost resolution is a lookup, not a search.
#[derive(Debug)]
pub struct Level {
    patches: Vec<Patch>,
    by_id: IndexMap<PatchId, usize>,
    domain: BlockRange,
    extra_cells: i32,
    max_ghost: i32,
}

impl Level {
    /// Split `domain` into `divisions[0] × divisions[1] × divisions[2]`
    /// patches.
    ///
    /// Uneven splits give the remainder cells to low-index patches.
    /// `extra_cells` widens allocations on domain-boundary faces;
    /// `max_ghost` bounds the ghost extent any dependency may request
    /// and controls how far adjacency reaches.
    pub fn decompose(
        domain: BlockRange,
        divisions: [u32; 3],
        extra_cells: i32,
        max_ghost: i32,
        spacing: [f64; 3],
    ) -> Result<Self, GridError> {
        if domain.is_empty() {
            return Err(GridError::EmptyDomain { domain });
        }
        if extra_cells < 0 {
            return Err(GridError::NegativeWidth {
                what: "extra_cells",
                value: extra_cells,
            });
        }
        if max_ghost < 0 {
            return Err(GridError::NegativeWidth {
                what: "max_ghost",
                value: max_ghost,
            });
        }
        for d in 0..3 {
            if divisions[d] == 0 || divisions[d] as i32 > domain.extent(d) {
                return Err(GridError::InvalidDivisions {
                    axis: d,
                    extent: domain.extent(d),
                    divisions: divisions[d],
                });
            }
        }

        // Per-axis cut positions: base width plus one remainder cell
        // for the first `extent % divisions` patches.
        let cuts: Vec<Vec<i32>> = (0..3)
            .map(|d| {
                let n = divisions[d] as i32;
                let extent = domain.extent(d);
                let base = extent / n;
                let remainder = extent % n;
                let mut positions = Vec::with_capacity(n as usize + 1);
                let mut at = domain.begin(d);
                positions.push(at);
                for p in 0..n {
                    at += base + i32::from(p < remainder);
                    positions.push(at);
                }
                positions
            })
            .collect();

        let mut patches = Vec::new();
        let mut by_id = IndexMap::new();
        for kz in 0..divisions[2] as usize {
            for jy in 0..divisions[1] as usize {
                for ix in 0..divisions[0] as usize {
                    let low = [cuts[0][ix], cuts[1][jy], cuts[2][kz]];
                    let high = [cuts[0][ix + 1], cuts[1][jy + 1], cuts[2][kz + 1]];
                    let interior = BlockRange::new(low, high);
                    let allocation = boundary_allocation(interior, domain, extra_cells);
                    let id = PatchId(patches.len() as u32);
                    by_id.insert(id, patches.len());
                    patches.push(Patch::new(id, interior, allocation, spacing));
                }
            }
        }

        // Adjacency by box intersection of the ghost-grown interior.
        // Reach at least one cell so face neighbors are wired even when
        // max_ghost is zero.
        let reach = max_ghost.max(1);
        let neighbor_sets: Vec<SmallVec<[PatchId; 26]>> = patches
            .iter()
            .map(|p| {
                patches
                    .iter()
                    .filter(|q| {
                        q.id() != p.id()
                            && !p.interior().grow(reach).intersect(&q.interior()).is_empty()
                    })
                    .map(Patch::id)
                    .collect()
            })
            .collect();
        for (patch, neighbors) in patches.iter_mut().zip(neighbor_sets) {
            patch.set_neighbors(neighbors);
        }

        Ok(Self {
            patches,
            by_id,
            domain,
            extra_cells,
            max_ghost,
        })
    }

    /// Look up a patch by id.
    pub fn patch(&self, id: PatchId) -> Option<&Patch> {
        self.by_id.get(&id).map(|&i| &self.patches[i])
    }

    /// All patches in id order.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// The decomposed domain box (interiors only).
    pub fn domain(&self) -> BlockRange {
        self.domain
    }

    /// Extra-cell width on domain-boundary faces.
    pub fn extra_cells(&self) -> i32 {
        self.extra_cells
    }

    /// The largest ghost extent any dependency may request.
    pub fn max_ghost(&self) -> i32 {
        self.max_ghost
    }

    /// Number of patches.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Whether the level holds no patches.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// The index window a ghost-inclusive view of `patch` covers.
    ///
    /// The interior grown by `g`, clipped per axis: at a domain
    /// boundary the window extends only into the patch's own extra
    /// cells; elsewhere it stays inside the domain, where neighbor
    /// interiors tile every cell.
    pub fn ghost_window(&self, patch: &Patch, g: i32) -> BlockRange {
        let interior = patch.interior();
        let mut low = [0; 3];
        let mut high = [0; 3];
        for d in 0..3 {
            low[d] = if interior.begin(d) == self.domain.begin(d) {
                interior.begin(d) - g.min(self.extra_cells)
            } else {
                (interior.begin(d) - g).max(self.domain.begin(d))
            };
            high[d] = if interior.end(d) == self.domain.end(d) {
                interior.end(d) + g.min(self.extra_cells)
            } else {
                (interior.end(d) + g).min(self.domain.end(d))
            };
        }
        BlockRange::new(low, high)
    }
}

/// Interior plus `extra` cells on each face that touches the domain
/// boundary.
fn boundary_allocation(interior: BlockRange, domain: BlockRange, extra: i32) -> BlockRange {
    let mut low = [0; 3];
    let mut high = [0; 3];
    for d in 0..3 {
        low[d] = interior.begin(d)
            - if interior.begin(d) == domain.begin(d) {
                extra
            } else {
                0
            };
        high[d] = interior.end(d)
            + if interior.end(d) == domain.end(d) {
                extra
            } else {
                0
            };
    }
    BlockRange::new(low, high)
}
