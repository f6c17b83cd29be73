//! The flattened hair asset as consumed by the simulation
//!
//! [`HairAsset::assemble`] turns a finished strand collection into one array
//! per attribute, with every per-vertex array indexed by global vertex id and
//! every per-strand array indexed by strand id.

use glam::{Quat, Vec3, Vec4};
use log::debug;

use crate::attributes::derive_attributes;
use crate::bounds::{BoundingBox, BoundingSphere};
use crate::error::{HairError, Result};
use crate::frame::construct_frames;
use crate::types::Strand;

/// Render vertex: position, tangent and texture coordinate
///
/// `texcoord.xy` is the strand's root texture coordinate, `texcoord.z` the
/// normalised distance to the root and `texcoord.w` is unused.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TriangleVertex {
    /// Rest position
    pub position: Vec3,
    /// Unit tangent
    pub tangent: Vec3,
    /// Root texcoord, distance to root, 0
    pub texcoord: Vec4,
}

impl TriangleVertex {
    /// Serialized size in bytes
    pub const SIZE: usize = 40;
}

/// A complete hair asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HairAsset {
    /// Largest number of vertices any strand may have
    pub max_vertices_per_strand: usize,
    /// Number of vertices belonging to guide strands
    pub guide_vertex_count: usize,
    /// Number of guide strands
    pub guide_strand_count: usize,
    /// Follow strands generated per guide
    pub follows_per_guide: usize,
    /// Group (input file) of each strand
    pub group_ids: Vec<u32>,
    /// Rest edge vector in the parent frame, per vertex
    pub ref_vectors: Vec<Vec3>,
    /// Global rotation, per vertex
    pub global_rotations: Vec<Quat>,
    /// Rotation relative to the parent vertex, per vertex
    pub local_rotations: Vec<Quat>,
    /// Position with inverse mass in `w`, per vertex
    pub positions: Vec<Vec4>,
    /// Unit tangent, per vertex
    pub tangents: Vec<Vec3>,
    /// Render vertex, per vertex
    pub triangle_vertices: Vec<TriangleVertex>,
    /// Thickness taper, per vertex
    pub thickness: Vec<f32>,
    /// Root offset from the owning guide, with the guide's strand index in `w`
    pub follow_root_offsets: Vec<Vec4>,
    /// Distance to the next vertex, 0 for the last vertex of a strand
    pub rest_lengths: Vec<f32>,
    /// Sphere enclosing every vertex
    pub bounding_sphere: BoundingSphere,
    /// Two triangles per edge over a ribbon of two render vertices per hair vertex
    pub triangle_indices: Vec<u32>,
    /// One line per edge
    pub line_indices: Vec<u32>,
}

impl HairAsset {
    /// Flatten a strand collection into an asset
    ///
    /// Strands must already be in their final interleaved order and pose.
    pub fn assemble(
        strands: &[Strand],
        follows_per_guide: usize,
        max_vertices_per_strand: usize,
    ) -> Result<Self> {
        let vertex_count: usize = strands.iter().map(Strand::len).sum();
        // Triangle indices reach 2 * vertex_count - 1
        if vertex_count > (i32::MAX as usize) / 2 {
            return Err(HairError::TooLarge(format!(
                "{vertex_count} vertices exceed the index range"
            )));
        }

        let mut asset = Self {
            max_vertices_per_strand,
            follows_per_guide,
            ..Self::default()
        };
        asset.reserve(strands.len(), vertex_count);

        let mut bounds = BoundingBox::EMPTY;
        let mut id = 0u32;

        for (strand_index, strand) in strands.iter().enumerate() {
            if strand.is_guide() {
                asset.guide_strand_count += 1;
                asset.guide_vertex_count += strand.len();
            }

            for _ in 1..strand.len() {
                asset.line_indices.extend([id, id + 1]);
                asset.triangle_indices.extend([
                    2 * id,
                    2 * id + 1,
                    2 * id + 2,
                    2 * id + 2,
                    2 * id + 1,
                    2 * id + 3,
                ]);
                id += 1;
            }
            id += 1;

            let positions = strand.positions();
            let frames = construct_frames(&positions);
            let attributes = derive_attributes(&positions);

            for (k, vertex) in strand.vertices.iter().enumerate() {
                let tangent = attributes.tangents[k];
                bounds = bounds.union_point(vertex.position);

                asset.positions.push(vertex.position.extend(vertex.inv_mass));
                asset.tangents.push(tangent);
                asset.global_rotations.push(frames.global[k].rotation);
                asset.local_rotations.push(frames.local[k].rotation);
                asset.ref_vectors.push(frames.ref_vectors[k]);
                asset.triangle_vertices.push(TriangleVertex {
                    position: vertex.position,
                    tangent,
                    texcoord: Vec4::new(
                        strand.texcoord.x,
                        strand.texcoord.y,
                        attributes.distance_to_root[k],
                        0.0,
                    ),
                });
            }
            asset.thickness.extend(attributes.thickness);
            asset.rest_lengths.extend(attributes.rest_lengths);

            asset.group_ids.push(strand.group_id);
            asset.follow_root_offsets.push(
                strand
                    .root_offset()
                    .extend(strand.guide_index(strand_index) as f32),
            );
        }

        asset.bounding_sphere = bounds.bounding_sphere();

        debug!(
            "Assembled asset: {} strands ({} guides), {} vertices, {} triangle indices",
            asset.strand_count(),
            asset.guide_strand_count,
            asset.vertex_count(),
            asset.triangle_indices.len()
        );

        Ok(asset)
    }

    fn reserve(&mut self, strand_count: usize, vertex_count: usize) {
        self.group_ids.reserve(strand_count);
        self.follow_root_offsets.reserve(strand_count);
        self.ref_vectors.reserve(vertex_count);
        self.global_rotations.reserve(vertex_count);
        self.local_rotations.reserve(vertex_count);
        self.positions.reserve(vertex_count);
        self.tangents.reserve(vertex_count);
        self.triangle_vertices.reserve(vertex_count);
        self.thickness.reserve(vertex_count);
        self.rest_lengths.reserve(vertex_count);
        self.line_indices.reserve(vertex_count * 2);
        self.triangle_indices.reserve(vertex_count * 6);
    }

    /// Total number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Total number of strands, guides and follows
    pub fn strand_count(&self) -> usize {
        self.group_ids.len()
    }

    /// Size of the asset in the binary format
    pub fn serialized_size(&self) -> usize {
        const HEADER: usize = 6 * 4;
        const VEC4: usize = 16;

        let vertices = self.vertex_count();
        let strands = self.strand_count();

        HEADER
            + strands * 4
            + vertices * VEC4 * 5
            + vertices * TriangleVertex::SIZE
            + vertices * 4
            + strands * VEC4
            + vertices * 4
            + VEC4
            + 4
            + self.triangle_indices.len() * 4
            + 4
            + self.line_indices.len() * 4
    }
}
