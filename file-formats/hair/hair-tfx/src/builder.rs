//! End-to-end asset construction
//!
//! ```no_run
//! use hair_tfx::{BuildOptions, HairAssetBuilder};
//!
//! let mut builder = HairAssetBuilder::new(BuildOptions::default().with_seed(7))?;
//! builder.load_path("head.tfx")?;
//! builder.load_path("beard.tfx")?;
//! let asset = builder.build()?;
//! hair_tfx::tfxb::write_asset_to_path("head.tfxb", &asset)?;
//! # Ok::<(), hair_tfx::HairError>(())
//! ```

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

use crate::asset::HairAsset;
use crate::error::Result;
use crate::follow::generate_follow_strands;
use crate::store::{DEFAULT_THREAD_GROUP_SIZE, StrandStore};
use crate::tfx::TfxFile;
use crate::types::{Strand, StrandRole};

/// Options that apply to a whole build rather than to one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Guides per load are truncated to a multiple of this
    pub thread_group_size: usize,
    /// Seed for follow-strand placement; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            thread_group_size: DEFAULT_THREAD_GROUP_SIZE,
            seed: None,
        }
    }
}

impl BuildOptions {
    /// Set the thread-group size
    pub fn with_thread_group_size(mut self, thread_group_size: usize) -> Self {
        self.thread_group_size = thread_group_size;
        self
    }

    /// Set a fixed seed for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Loads `.tfx` files and turns them into a [`HairAsset`]
#[derive(Debug, Clone)]
pub struct HairAssetBuilder {
    store: StrandStore,
    options: BuildOptions,
}

impl HairAssetBuilder {
    /// Create a builder with no strands loaded
    pub fn new(options: BuildOptions) -> Result<Self> {
        Ok(Self {
            store: StrandStore::new(options.thread_group_size)?,
            options,
        })
    }

    /// Add a parsed file as the next group
    pub fn load(&mut self, file: &TfxFile) -> Result<usize> {
        self.store.load_append(file)
    }

    /// Parse a `.tfx` file from disk and add it as the next group
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        info!("Loading {}", path.display());
        let file = TfxFile::open(path)?;
        self.load(&file)
    }

    /// Strands loaded so far
    pub fn store(&self) -> &StrandStore {
        &self.store
    }

    /// Synthesize follows and apply each group's transform
    ///
    /// The result is the final interleaved collection in its rest pose.
    pub fn build_strands(&self) -> Vec<Strand> {
        let mut rng = self.options.rng();
        let store = &self.store;

        let mut strands = generate_follow_strands(
            store.guides().to_vec(),
            store.follows_per_guide(),
            |group| store.group(group).map_or(0.0, |g| g.max_radius),
            &mut rng,
        );

        for strand in &mut strands {
            let Some(group) = store.group(strand.group_id) else {
                continue;
            };
            let transform = group.transform;
            if transform.is_identity() {
                continue;
            }

            for vertex in &mut strand.vertices {
                vertex.position = transform.transform_point(vertex.position);
            }
            if let StrandRole::Follow { root_offset, .. } = &mut strand.role {
                *root_offset = transform.transform_vector(*root_offset);
            }
        }

        strands
    }

    /// Run the whole pipeline and produce the asset
    pub fn build(&self) -> Result<HairAsset> {
        let strands = self.build_strands();
        let asset = HairAsset::assemble(
            &strands,
            self.store.follows_per_guide(),
            self.store.max_vertices_per_strand(),
        )?;

        info!(
            "Built asset: {} strands, {} vertices, bounding radius {:.3}",
            asset.strand_count(),
            asset.vertex_count(),
            asset.bounding_sphere.radius
        );

        Ok(asset)
    }
}
