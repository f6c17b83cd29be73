//! Core strand data types
//!
//! A hair asset is made of strands, each an ordered chain of vertices running
//! from root to tip. Authored strands are *guides*; generated strands are
//! *follows* that trail a guide at a fixed offset. Once follows exist the
//! strands are kept in a flat, interleaved collection whose grouping is
//! described by [`StrandLayout`].

use glam::{Vec2, Vec3};

/// Inverse mass of a vertex that the simulation must never move
pub const PINNED_INV_MASS: f32 = 0.0;

/// Inverse mass of a free vertex
pub const FREE_INV_MASS: f32 = 1.0;

/// Minimum number of vertices a strand needs to survive loading
pub const MIN_VERTICES_PER_STRAND: usize = 3;

/// A single strand vertex in rest pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HairVertex {
    /// Rest position
    pub position: Vec3,
    /// 0 for pinned vertices, 1 otherwise
    pub inv_mass: f32,
}

impl HairVertex {
    /// Create a vertex with the given inverse mass
    pub fn new(position: Vec3, inv_mass: f32) -> Self {
        Self { position, inv_mass }
    }

    /// Create a vertex that is free to move
    pub fn free(position: Vec3) -> Self {
        Self::new(position, FREE_INV_MASS)
    }

    /// Create a vertex that is pinned in place
    pub fn pinned(position: Vec3) -> Self {
        Self::new(position, PINNED_INV_MASS)
    }

    /// Check whether the vertex is immovable
    pub fn is_pinned(&self) -> bool {
        self.inv_mass == PINNED_INV_MASS
    }
}

/// Role of a strand within the collection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrandRole {
    /// Authored, simulation-driving strand
    Guide,
    /// Generated strand trailing a guide
    Follow {
        /// Strand index of the owning guide in the interleaved collection
        guide_index: usize,
        /// Offset of this strand's root from the guide's root
        root_offset: Vec3,
    },
}

/// A hair strand: vertices from root to tip plus per-strand metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Strand {
    /// Vertices, root first
    pub vertices: Vec<HairVertex>,
    /// Guide or follow
    pub role: StrandRole,
    /// Provenance tag (index of the input file the strand came from)
    pub group_id: u32,
    /// Texture coordinate of the strand root
    pub texcoord: Vec2,
}

impl Strand {
    /// Create a guide strand
    pub fn guide(vertices: Vec<HairVertex>, group_id: u32, texcoord: Vec2) -> Self {
        Self {
            vertices,
            role: StrandRole::Guide,
            group_id,
            texcoord,
        }
    }

    /// Check whether this is a guide strand
    pub fn is_guide(&self) -> bool {
        matches!(self.role, StrandRole::Guide)
    }

    /// Number of vertices in the strand
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the strand has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex positions, root first
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Total arc length of the strand
    pub fn length(&self) -> f32 {
        self.vertices
            .windows(2)
            .map(|pair| pair[0].position.distance(pair[1].position))
            .sum()
    }

    /// Strand index of the guide that owns this strand
    ///
    /// A guide owns itself, so `own_index` is returned for guides.
    pub fn guide_index(&self, own_index: usize) -> usize {
        match self.role {
            StrandRole::Guide => own_index,
            StrandRole::Follow { guide_index, .. } => guide_index,
        }
    }

    /// Offset of the root from the owning guide's root (zero for guides)
    pub fn root_offset(&self) -> Vec3 {
        match self.role {
            StrandRole::Guide => Vec3::ZERO,
            StrandRole::Follow { root_offset, .. } => root_offset,
        }
    }
}

/// Where a strand sits in the interleaved collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrandSlot {
    /// Ordinal of the owning guide among guides (0, 1, 2, ...)
    pub guide_ordinal: usize,
    /// Strand index of the owning guide
    pub guide_index: usize,
    /// `None` for the guide itself, `Some(j)` for its `j`-th follow strand
    pub follow: Option<usize>,
}

impl StrandSlot {
    /// Check whether the slot holds a guide strand
    pub fn is_guide(&self) -> bool {
        self.follow.is_none()
    }
}

/// Mapping between strand indices and guide/follow blocks
///
/// Guides and their follows are stored in blocks of `1 + follows_per_guide`
/// strands: the guide first, then its follows in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrandLayout {
    follows_per_guide: usize,
}

impl StrandLayout {
    /// Create a layout for the given number of follows per guide
    pub fn new(follows_per_guide: usize) -> Self {
        Self { follows_per_guide }
    }

    /// Number of follow strands per guide
    pub fn follows_per_guide(&self) -> usize {
        self.follows_per_guide
    }

    /// Number of strands in one guide block
    pub fn block_size(&self) -> usize {
        self.follows_per_guide + 1
    }

    /// Total number of strands for the given number of guides
    pub fn strand_count(&self, guide_count: usize) -> usize {
        guide_count * self.block_size()
    }

    /// Strand index of the guide with the given ordinal
    pub fn guide_index(&self, guide_ordinal: usize) -> usize {
        guide_ordinal * self.block_size()
    }

    /// Strand index of follow `follow` of guide `guide_ordinal`
    pub fn follow_index(&self, guide_ordinal: usize, follow: usize) -> usize {
        debug_assert!(follow < self.follows_per_guide);
        self.guide_index(guide_ordinal) + 1 + follow
    }

    /// Resolve a strand index into its slot
    pub fn slot(&self, strand_index: usize) -> StrandSlot {
        let block = self.block_size();
        let guide_ordinal = strand_index / block;
        let within = strand_index % block;

        StrandSlot {
            guide_ordinal,
            guide_index: guide_ordinal * block,
            follow: within.checked_sub(1),
        }
    }
}
