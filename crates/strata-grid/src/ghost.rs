//! Ghost-region geometry: which neighbor cells a ghost-inclusive view
//! pulls in.

use strata_core::PatchId;
use strata_exec::BlockRange;

use crate::level::Level;
use crate::patch::Patch;

/// A box of cells a view borrows from a neighboring patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostRegion {
    /// Patch that owns the cells.
    pub source: PatchId,
    /// The borrowed index box, in global coordinates.
    pub region: BlockRange,
}

/// The regions a ghost-inclusive view of `patch` with extent `g` draws
/// from its neighbors.
///
/// Each region is the intersection of the grown interior with a
/// neighbor's interior. Empty intersections are dropped, so with `g`
/// of zero the result is empty. Regions are returned in neighbor
/// registration order, which follows patch id order.
pub fn ghost_regions(level: &Level, patch: &Patch, g: i32) -> Vec<GhostRegion> {
    if g <= 0 {
        return Vec::new();
    }
    let grown = patch.interior().grow(g);
    patch
        .neighbors()
        .iter()
        .filter_map(|&id| {
            let neighbor = level.patch(id)?;
            let overlap = grown.intersect(&neighbor.interior());
            (!overlap.is_empty()).then_some(GhostRegion {
                source: id,
                region: overlap,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_patch_level() -> Level {
        let domain = BlockRange::from_extent([0, 0, 0], [8, 4, 4]);
        Level::decompose(domain, [2, 1, 1], 1, 2, [1.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn one_layer_pulls_a_face_slab() {
        let level = two_patch_level();
        let p0 = level.patch(PatchId(0)).unwrap();

        let regions = ghost_regions(&level, p0, 1);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].source, PatchId(1));
        assert_eq!(
            regions[0].region,
            BlockRange::from_extent([4, 0, 0], [1, 4, 4])
        );
    }

    #[test]
    fn wider_ghost_pulls_a_wider_slab() {
        let level = two_patch_level();
        let p1 = level.patch(PatchId(1)).unwrap();

        let regions = ghost_regions(&level, p1, 2);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0].region,
            BlockRange::from_extent([2, 0, 0], [2, 4, 4])
        );
    }

    #[test]
    fn zero_ghost_pulls_nothing() {
        let level = two_patch_level();
        let p0 = level.patch(PatchId(0)).unwrap();
        assert!(ghost_regions(&level, p0, 0).is_empty());
    }

    #[test]
    fn corner_neighbor_contributes_corner_cells() {
        let domain = BlockRange::from_extent([0, 0, 0], [4, 4, 1]);
        let level = Level::decompose(domain, [2, 2, 1], 0, 1, [1.0, 1.0, 1.0]).unwrap();
        let p0 = level.patch(PatchId(0)).unwrap();

        let regions = ghost_regions(&level, p0, 1);
        assert_eq!(regions.len(), 3);
        let corner = regions
            .iter()
            .find(|r| r.source == PatchId(3))
            .expect("diagonal neighbor present");
        assert_eq!(
            corner.region,
            BlockRange::from_extent([2, 2, 0], [1, 1, 1])
        );
    }
}
