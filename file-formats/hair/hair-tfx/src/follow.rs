//! Follow-strand synthesis
//!
//! Follow strands are cheap visual density: copies of a guide strand shifted by
//! a random offset in the plane orthogonal to the guide's root edge. The
//! offset grows towards the tip by [`spread_factor`], which has to match the
//! factor the real-time follow update applies; otherwise rest pose and
//! simulated pose drift apart.

use glam::Vec3;
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::{HairVertex, Strand, StrandLayout, StrandRole};

/// Spread added between root and tip, see [`spread_factor`]
pub const FOLLOW_SPREAD_SCALE: f32 = 5.0;

/// Spread at the root, see [`spread_factor`]
pub const FOLLOW_SPREAD_BASE: f32 = 1.0;

/// Threshold on `|n.z|` above which the tangent basis is built from `(y, z)`
const TANGENT_BRANCH_Z: f32 = 0.707;

/// Two unit vectors orthogonal to `n` and to each other
///
/// `n` must be unit length. The basis is taken from whichever coordinate pair
/// keeps the normalisation well away from zero.
pub fn tangent_vectors(n: Vec3) -> (Vec3, Vec3) {
    if n.z.abs() > TANGENT_BRANCH_Z {
        let a = n.y * n.y + n.z * n.z;
        let k = 1.0 / a.sqrt();
        let t0 = Vec3::new(0.0, -n.z * k, n.y * k);
        let t1 = Vec3::new(a * k, -n.x * t0.z, n.x * t0.y);
        (t0, t1)
    } else {
        let a = n.x * n.x + n.y * n.y;
        let k = 1.0 / a.sqrt();
        let t0 = Vec3::new(-n.y * k, n.x * k, 0.0);
        let t1 = Vec3::new(-n.z * t0.y, n.z * t0.x, a * k);
        (t0, t1)
    }
}

/// Per-vertex scale applied to a follow strand's offset
///
/// `1.0` at the root, rising linearly towards `6.0` at the tip.
pub fn spread_factor(vertex: usize, vertex_count: usize) -> f32 {
    FOLLOW_SPREAD_SCALE * vertex as f32 / vertex_count as f32 + FOLLOW_SPREAD_BASE
}

/// Build one follow strand from a guide and a root offset
pub fn follow_strand(guide: &Strand, guide_index: usize, offset: Vec3) -> Strand {
    let count = guide.len();
    let vertices = guide
        .vertices
        .iter()
        .enumerate()
        .map(|(k, v)| HairVertex::new(v.position + offset * spread_factor(k, count), v.inv_mass))
        .collect::<Vec<_>>();

    let root_offset = match (vertices.first(), guide.vertices.first()) {
        (Some(follow_root), Some(guide_root)) => follow_root.position - guide_root.position,
        _ => Vec3::ZERO,
    };

    Strand {
        vertices,
        role: StrandRole::Follow {
            guide_index,
            root_offset,
        },
        group_id: guide.group_id,
        texcoord: guide.texcoord,
    }
}

/// Expand guides into the interleaved guide/follow collection
///
/// With `follows_per_guide == 0` the guides are returned unchanged. Otherwise
/// the guide order is shuffled with `rng`, and each guide is followed by
/// `follows_per_guide` generated strands. `max_radius` returns the sampling
/// radius for a strand's group.
pub fn generate_follow_strands<R, F>(
    mut guides: Vec<Strand>,
    follows_per_guide: usize,
    max_radius: F,
    rng: &mut R,
) -> Vec<Strand>
where
    R: Rng + ?Sized,
    F: Fn(u32) -> f32,
{
    if follows_per_guide == 0 {
        return guides;
    }

    guides.shuffle(rng);

    let layout = StrandLayout::new(follows_per_guide);
    let mut strands = Vec::with_capacity(layout.strand_count(guides.len()));

    for (ordinal, guide) in guides.into_iter().enumerate() {
        let guide_index = layout.guide_index(ordinal);
        debug_assert_eq!(strands.len(), guide_index);

        let root_dir = match guide.vertices.as_slice() {
            [first, second, ..] => (second.position - first.position)
                .try_normalize()
                .unwrap_or(Vec3::X),
            _ => Vec3::X,
        };
        let (t0, t1) = tangent_vectors(root_dir);
        let radius = max_radius(guide.group_id).abs();

        let follows = (0..follows_per_guide)
            .map(|_| {
                let r0 = rng.random_range(-radius..=radius);
                let r1 = rng.random_range(-radius..=radius);
                follow_strand(&guide, guide_index, r0 * t0 + r1 * t1)
            })
            .collect::<Vec<_>>();

        strands.push(guide);
        strands.extend(follows);
    }

    debug!(
        "Generated {} follow strands for {} guides",
        strands.len() - strands.len() / layout.block_size(),
        strands.len() / layout.block_size()
    );

    strands
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f32 = 1.0e-5;

    fn guide(group_id: u32, x: f32) -> Strand {
        let vertices = (0..5)
            .map(|i| {
                let p = Vec3::new(x, i as f32, 0.0);
                if i < 2 {
                    HairVertex::pinned(p)
                } else {
                    HairVertex::free(p)
                }
            })
            .collect();
        Strand::guide(vertices, group_id, Vec2::new(x, 0.5))
    }

    fn assert_basis(n: Vec3) {
        let (t0, t1) = tangent_vectors(n);
        assert!((t0.length() - 1.0).abs() < EPS, "t0 not unit: {t0:?}");
        assert!((t1.length() - 1.0).abs() < EPS, "t1 not unit: {t1:?}");
        assert!(t0.dot(t1).abs() < EPS);
        assert!(t0.dot(n).abs() < EPS);
        assert!(t1.dot(n).abs() < EPS);
    }

    #[test]
    fn test_tangent_vectors_both_branches() {
        assert_basis(Vec3::Z);
        assert_basis(-Vec3::Z);
        assert_basis(Vec3::X);
        assert_basis(Vec3::Y);
        assert_basis(Vec3::new(0.1, 0.2, 0.9).normalize());
        assert_basis(Vec3::new(0.6, -0.5, 0.3).normalize());
    }

    #[test]
    fn test_spread_factor() {
        assert_eq!(spread_factor(0, 10), 1.0);
        assert_eq!(spread_factor(5, 10), 3.5);
        assert!(spread_factor(9, 10) < 6.0);
    }

    #[test]
    fn test_follow_strand_offsets() {
        let g = guide(2, 0.0);
        let offset = Vec3::new(0.25, 0.0, -0.1);
        let follow = follow_strand(&g, 6, offset);

        assert_eq!(follow.len(), g.len());
        assert_eq!(follow.group_id, 2);
        assert_eq!(follow.texcoord, g.texcoord);
        assert_eq!(follow.vertices[0].position, g.vertices[0].position + offset);
        assert_eq!(follow.root_offset(), offset);
        assert_eq!(follow.guide_index(99), 6);
        for (f, g) in follow.vertices.iter().zip(&g.vertices) {
            assert_eq!(f.inv_mass, g.inv_mass);
        }
        let tip = follow.vertices[4].position - g.vertices[4].position;
        assert!(tip.abs_diff_eq(offset * spread_factor(4, 5), EPS));
    }

    #[test]
    fn test_no_follows_keeps_order() {
        let guides = vec![guide(0, 0.0), guide(0, 1.0), guide(0, 2.0)];
        let mut rng = StdRng::seed_from_u64(7);
        let strands = generate_follow_strands(guides.clone(), 0, |_| 0.5, &mut rng);
        assert_eq!(strands, guides);
    }

    #[test]
    fn test_interleaved_layout() {
        let guides: Vec<Strand> = (0..4).map(|i| guide(i, i as f32)).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let strands = generate_follow_strands(guides, 3, |_| 0.5, &mut rng);

        let layout = StrandLayout::new(3);
        assert_eq!(strands.len(), layout.strand_count(4));

        for (index, strand) in strands.iter().enumerate() {
            let slot = layout.slot(index);
            assert_eq!(strand.is_guide(), slot.is_guide());
            assert_eq!(strand.guide_index(index), slot.guide_index);

            let owner = &strands[slot.guide_index];
            assert_eq!(strand.len(), owner.len());
            assert_eq!(strand.group_id, owner.group_id);
            assert!(
                strand.vertices[0]
                    .position
                    .abs_diff_eq(owner.vertices[0].position + strand.root_offset(), EPS)
            );
        }
    }

    #[test]
    fn test_offsets_stay_within_radius() {
        let guides = vec![guide(0, 0.0), guide(1, 5.0)];
        let mut rng = StdRng::seed_from_u64(3);
        let radius = |group: u32| if group == 0 { 0.1 } else { 2.0 };
        let strands = generate_follow_strands(guides, 8, radius, &mut rng);

        for strand in strands.iter().filter(|s| !s.is_guide()) {
            let offset = strand.root_offset();
            // Guide roots run along +Y, so offsets live in the XZ plane
            assert!(offset.y.abs() < EPS);
            let bound = radius(strand.group_id) * std::f32::consts::SQRT_2 + EPS;
            assert!(offset.length() <= bound);
        }
    }

    #[test]
    fn test_zero_radius_stacks_follows_on_guide() {
        let guides = vec![guide(0, 0.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let strands = generate_follow_strands(guides, 2, |_| 0.0, &mut rng);
        assert_eq!(strands[1].vertices, strands[0].vertices);
        assert_eq!(strands[2].root_offset(), Vec3::ZERO);
    }

    #[test]
    fn test_same_seed_same_output() {
        let guides: Vec<Strand> = (0..6).map(|i| guide(0, i as f32)).collect();
        let a = generate_follow_strands(guides.clone(), 2, |_| 0.5, &mut StdRng::seed_from_u64(9));
        let b = generate_follow_strands(guides, 2, |_| 0.5, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_tangent_basis_is_orthonormal(
            x in -1.0f32..1.0, y in -1.0f32..1.0, z in -1.0f32..1.0
        ) {
            let v = Vec3::new(x, y, z);
            prop_assume!(v.length() > 0.1);
            let n = v.normalize();
            let (t0, t1) = tangent_vectors(n);
            prop_assert!((t0.length() - 1.0).abs() < 1.0e-4);
            prop_assert!((t1.length() - 1.0).abs() < 1.0e-4);
            prop_assert!(t0.dot(t1).abs() < 1.0e-4);
            prop_assert!(t0.dot(n).abs() < 1.0e-4);
            prop_assert!(t1.dot(n).abs() < 1.0e-4);
        }
    }
}
