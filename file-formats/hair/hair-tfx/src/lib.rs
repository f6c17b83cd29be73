//! Builder for simulation-ready hair strand assets.
//!
//! This crate reads authored guide strands from `.tfx` text files, generates
//! follow strands around them, derives the per-vertex reference frames and
//! attributes a strand simulation needs, and writes everything as a binary
//! `.tfxb` asset.
//!
//! # Examples
//!
//! ```no_run
//! use hair_tfx::{BuildOptions, HairAssetBuilder, tfxb, validate_asset};
//!
//! let mut builder = HairAssetBuilder::new(BuildOptions::default())?;
//! builder.load_path("ponytail.tfx")?;
//!
//! let asset = builder.build()?;
//! validate_asset(&asset)?;
//! tfxb::write_asset_to_path("ponytail.tfxb", &asset)?;
//! # Ok::<(), hair_tfx::HairError>(())
//! ```

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod asset;
pub mod attributes;
pub mod bounds;
pub mod builder;
pub mod error;
pub mod follow;
pub mod frame;
pub mod store;
pub mod tfx;
pub mod tfxb;
pub mod types;
pub mod validation;

pub use asset::{HairAsset, TriangleVertex};
pub use attributes::{AffineTransform, StrandAttributes, derive_attributes};
pub use bounds::{BoundingBox, BoundingSphere};
pub use builder::{BuildOptions, HairAssetBuilder};
pub use error::{HairError, Result};
pub use follow::{generate_follow_strands, tangent_vectors};
pub use frame::{RigidTransform, StrandFrames, construct_frames};
pub use store::{GroupSettings, StrandStore};
pub use tfx::{TfxFile, TfxParser, TfxSettings, TfxStrand};
pub use tfxb::{read_asset, write_asset};
pub use types::{HairVertex, Strand, StrandLayout, StrandRole, StrandSlot};
pub use validation::validate_asset;
