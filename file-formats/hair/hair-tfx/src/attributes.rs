//! Per-vertex attributes derived from strand rest positions
//!
//! Everything here is strand-local: tangents, normalised distance to the root,
//! rest lengths between consecutive vertices and the thickness taper. The
//! [`AffineTransform`] applied to all strands before derivation also lives
//! here.

use glam::{Quat, Vec3};

/// Attributes for every vertex of one strand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrandAttributes {
    /// Unit tangent along the strand
    pub tangents: Vec<Vec3>,
    /// Arc length from the root divided by strand length, in `[0, 1]`
    pub distance_to_root: Vec<f32>,
    /// Distance to the next vertex; the last vertex stores 0
    pub rest_lengths: Vec<f32>,
    /// Thickness taper, 1 at the root and 0 at the tip
    pub thickness: Vec<f32>,
}

/// Derive all attributes for one strand
pub fn derive_attributes(positions: &[Vec3]) -> StrandAttributes {
    let distance_to_root = compute_distance_to_root(positions);
    let thickness = distance_to_root
        .iter()
        .map(|&t| thickness_coefficient(t))
        .collect();

    StrandAttributes {
        tangents: compute_tangents(positions),
        distance_to_root,
        rest_lengths: compute_rest_lengths(positions),
        thickness,
    }
}

/// Tangents: averaged edge directions inside, edge direction at the ends
pub fn compute_tangents(positions: &[Vec3]) -> Vec<Vec3> {
    let count = positions.len();
    if count < 2 {
        return vec![Vec3::ZERO; count];
    }

    let mut tangents = Vec::with_capacity(count);
    tangents.push((positions[1] - positions[0]).normalize_or_zero());

    for k in 1..count - 1 {
        let prev = (positions[k] - positions[k - 1]).normalize_or_zero();
        let next = (positions[k + 1] - positions[k]).normalize_or_zero();
        tangents.push((prev + next).normalize_or_zero());
    }

    tangents.push((positions[count - 1] - positions[count - 2]).normalize_or_zero());
    tangents
}

/// Normalised arc length from the root for each vertex
///
/// The caller must ensure the strand has a non-zero length; loading discards
/// strands that do not.
pub fn compute_distance_to_root(positions: &[Vec3]) -> Vec<f32> {
    let mut distances = Vec::with_capacity(positions.len());
    let mut travelled = 0.0f32;

    for (k, position) in positions.iter().enumerate() {
        if k > 0 {
            travelled += position.distance(positions[k - 1]);
        }
        distances.push(travelled);
    }

    let total = travelled;
    for distance in &mut distances {
        *distance /= total;
    }

    distances
}

/// Distance from each vertex to the next, with a 0 sentinel for the last vertex
pub fn compute_rest_lengths(positions: &[Vec3]) -> Vec<f32> {
    let mut lengths: Vec<f32> = positions
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .collect();

    if !positions.is_empty() {
        lengths.push(0.0);
    }

    lengths
}

/// Thickness taper for a normalised distance to root: `sqrt(1 - t^2)`
pub fn thickness_coefficient(distance_to_root: f32) -> f32 {
    (1.0 - distance_to_root * distance_to_root).max(0.0).sqrt()
}

/// Uniform scale, then roll/pitch/yaw rotation, then translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// Uniform scale factor
    pub scale: f32,
    /// Rotation angles in radians about X (pitch), Y (yaw) and Z (roll)
    pub rotation: Vec3,
    /// Translation applied last
    pub translation: Vec3,
}

impl AffineTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        rotation: Vec3::ZERO,
        translation: Vec3::ZERO,
    };

    /// Create a transform from its parts
    pub fn new(scale: f32, rotation: Vec3, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Check whether applying the transform would change anything
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Rotation as a quaternion: roll about Z first, then pitch about X, then yaw about Y
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.rotation.y)
            * Quat::from_rotation_x(self.rotation.x)
            * Quat::from_rotation_z(self.rotation.z)
    }

    /// Scale, rotate and translate a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation_quat() * (point * self.scale) + self.translation
    }

    /// Scale and rotate a direction; translation does not apply
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation_quat() * (vector * self.scale)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
