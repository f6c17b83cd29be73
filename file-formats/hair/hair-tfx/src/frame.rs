//! Per-vertex reference frames along a strand
//!
//! Every vertex gets a local rigid transform relative to its parent vertex and
//! a global transform relative to the strand's root space. Local rotations are
//! the minimal rotation taking the canonical +X axis onto the incoming edge,
//! expressed in the parent's frame, so the chain never introduces roll. The
//! simulation rebuilds strand shape from these rotations, which makes the
//! degenerate-case thresholds below part of the asset format.

use glam::{Mat3, Quat, Vec3};
use std::ops::Mul;

/// Below this squared length the root cross product is considered degenerate
const ROOT_AXIS_EPSILON_SQ: f32 = 1.0e-4;

/// Rotations smaller than this angle (radians) are stored as identity
const MIN_ROTATION_ANGLE: f32 = 1.0e-3;

/// Below this squared length the rotation axis is considered degenerate
const MIN_ROTATION_AXIS_SQ: f32 = 1.0e-3;

/// Rotation followed by translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Rotation part
    pub rotation: Quat,
    /// Translation part
    pub translation: Vec3,
}

impl RigidTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Create a transform from its parts
    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Map a point from this transform's local space into its parent space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for RigidTransform {
    type Output = Self;

    /// `parent * child`: apply `child` first, then `parent`
    fn mul(self, child: Self) -> Self {
        Self {
            rotation: self.rotation * child.rotation,
            translation: self.rotation * child.translation + self.translation,
        }
    }
}

/// Reference frames for all vertices of one strand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrandFrames {
    /// Transform of each vertex relative to its parent (root: relative to world)
    pub local: Vec<RigidTransform>,
    /// Transform of each vertex relative to world
    pub global: Vec<RigidTransform>,
    /// Rest-pose edge vector of each vertex in its parent's frame (root: zero)
    pub ref_vectors: Vec<Vec3>,
}

impl StrandFrames {
    /// Number of vertices covered
    pub fn len(&self) -> usize {
        self.local.len()
    }

    /// Check if no frames were built
    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}

/// Build the frame chain for a strand given its vertex positions
///
/// The global translation of vertex `i` reproduces `positions[i]`.
pub fn construct_frames(positions: &[Vec3]) -> StrandFrames {
    let count = positions.len();
    let mut frames = StrandFrames {
        local: Vec::with_capacity(count),
        global: Vec::with_capacity(count),
        ref_vectors: Vec::with_capacity(count),
    };

    let Some(&root) = positions.first() else {
        return frames;
    };

    let root_dir = positions.get(1).map_or(Vec3::ZERO, |&next| next - root);
    let root_frame = RigidTransform::new(root_rotation(root_dir), root);
    frames.local.push(root_frame);
    frames.global.push(root_frame);
    frames.ref_vectors.push(Vec3::ZERO);

    for i in 1..count {
        let parent = frames.global[i - 1];
        let edge = positions[i] - positions[i - 1];
        let edge_local = parent.rotation.inverse() * edge;

        let local = RigidTransform::new(edge_rotation(edge_local), edge_local);
        frames.local.push(local);
        frames.global.push(parent * local);
        frames.ref_vectors.push(edge_local);
    }

    frames
}

/// Orientation of the root vertex: +X along the first edge
fn root_rotation(edge: Vec3) -> Quat {
    let x = edge.try_normalize().unwrap_or(Vec3::X);

    let mut z = x.cross(Vec3::X);
    if z.length_squared() < ROOT_AXIS_EPSILON_SQ {
        z = x.cross(Vec3::Y);
    }
    let z = z.normalize();
    let y = z.cross(x).normalize();

    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Minimal rotation taking +X onto `edge_local`
fn edge_rotation(edge_local: Vec3) -> Quat {
    let dir = edge_local.normalize_or_zero();
    let axis = Vec3::X.cross(dir);
    let angle = Vec3::X.dot(dir).clamp(-1.0, 1.0).acos();

    if angle.abs() < MIN_ROTATION_ANGLE || axis.length_squared() < MIN_ROTATION_AXIS_SQ {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(axis.normalize(), angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1.0e-4;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, EPS), "{a:?} != {b:?}");
    }

    fn curl() -> Vec<Vec3> {
        (0..12)
            .map(|i| {
                let t = i as f32 * 0.4;
                Vec3::new(t.cos(), t * 0.3, t.sin())
            })
            .collect()
    }

    #[test]
    fn test_frame_counts_and_root() {
        let positions = curl();
        let frames = construct_frames(&positions);

        assert_eq!(frames.local.len(), positions.len());
        assert_eq!(frames.global.len(), positions.len());
        assert_eq!(frames.ref_vectors.len(), positions.len());
        assert_eq!(frames.global[0], frames.local[0]);
        assert_eq!(frames.ref_vectors[0], Vec3::ZERO);
    }

    #[test]
    fn test_root_x_axis_follows_first_edge() {
        let positions = [Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0)];
        let frames = construct_frames(&positions);
        let x_axis = frames.global[0].rotation * Vec3::X;
        assert_vec_close(x_axis, Vec3::Y);
    }

    #[test]
    fn test_root_along_world_x_uses_fallback_axis() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)];
        let frames = construct_frames(&positions);
        let rot = frames.global[0].rotation;

        assert!(rot.is_normalized());
        assert_vec_close(rot * Vec3::X, Vec3::X);
        // Z = X x Y = +Z, Y = Z x X = +Y
        assert_vec_close(rot * Vec3::Z, Vec3::Z);
    }

    #[test]
    fn test_straight_strand_has_identity_local_rotations() {
        let positions: Vec<Vec3> = (0..5).map(|i| Vec3::new(0.0, 0.0, i as f32)).collect();
        let frames = construct_frames(&positions);

        for local in &frames.local[1..] {
            assert_eq!(local.rotation, Quat::IDENTITY);
        }
        for (i, reference) in frames.ref_vectors.iter().enumerate().skip(1) {
            assert_vec_close(*reference, Vec3::X);
            assert_vec_close(frames.local[i].translation, Vec3::X);
        }
    }

    #[test]
    fn test_right_angle_bend() {
        let positions = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let frames = construct_frames(&positions);
        let bend = frames.local[2].rotation;

        assert_vec_close(bend * Vec3::X, Vec3::Y);
        assert!((bend.angle_between(Quat::IDENTITY) - std::f32::consts::FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_reversal_is_degenerate_identity() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::ZERO];
        let frames = construct_frames(&positions);
        assert_eq!(frames.local[2].rotation, Quat::IDENTITY);
        assert_vec_close(frames.global[2].translation, Vec3::ZERO);
    }

    #[test]
    fn test_zero_length_segment_falls_back_to_identity() {
        let positions = [Vec3::ZERO, Vec3::Y, Vec3::Y, Vec3::new(0.0, 2.0, 0.0)];
        let frames = construct_frames(&positions);
        assert_eq!(frames.local[2].rotation, Quat::IDENTITY);
        assert!(frames.global.iter().all(|g| g.rotation.is_finite()));
    }

    #[test]
    fn test_chain_reproduces_positions() {
        let positions = curl();
        let frames = construct_frames(&positions);

        let mut chained = frames.local[0];
        assert_vec_close(chained.translation, positions[0]);
        for (i, local) in frames.local.iter().enumerate().skip(1) {
            chained = chained * *local;
            assert_vec_close(chained.translation, positions[i]);
            assert_vec_close(frames.global[i].translation, positions[i]);
        }
    }

    #[test]
    fn test_empty_and_single_vertex() {
        assert!(construct_frames(&[]).is_empty());

        let frames = construct_frames(&[Vec3::ONE]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames.global[0].translation, Vec3::ONE);
    }

    proptest! {
        #[test]
        fn prop_chain_is_lossless(
            coords in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0), 2..16)
        ) {
            let positions: Vec<Vec3> = coords.into_iter().map(|(x, y, z)| Vec3::new(x, y, z)).collect();
            let frames = construct_frames(&positions);

            prop_assert_eq!(frames.local.len(), positions.len());
            prop_assert_eq!(frames.global[0], frames.local[0]);

            let mut chained = frames.local[0];
            for i in 1..positions.len() {
                chained = chained * frames.local[i];
                let tolerance = 1.0e-3 * (1.0 + positions[i].length());
                prop_assert!(chained.translation.abs_diff_eq(positions[i], tolerance));
            }
        }
    }
}
