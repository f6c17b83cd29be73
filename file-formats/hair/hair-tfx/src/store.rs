//! Guide strand storage across one or more loaded `.tfx` files
//!
//! Each load appends one group of guides. Loading applies the vertex limit,
//! pins root (and optionally tip) vertices, discards strands too short to
//! simulate and truncates the group to a multiple of the thread-group size.

use log::{debug, info, trace, warn};

use crate::attributes::AffineTransform;
use crate::error::{HairError, Result};
use crate::tfx::{TfxFile, TfxStrand};
use crate::types::{HairVertex, MIN_VERTICES_PER_STRAND, Strand};

/// Default number of strands processed per simulation thread group
pub const DEFAULT_THREAD_GROUP_SIZE: usize = 64;

/// Maximum number of groups (input files) in one asset
pub const MAX_GROUPS: usize = 4;

/// Starting value of the running vertex limit
const INITIAL_MAX_VERTICES: usize = 2;

/// Settings that stay attached to the group they were loaded with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSettings {
    /// Transform applied to this group's strands after synthesis
    pub transform: AffineTransform,
    /// Radius used when placing this group's follow roots
    pub max_radius: f32,
}

/// Guide strands loaded so far, plus the settings that govern them
#[derive(Debug, Clone)]
pub struct StrandStore {
    guides: Vec<Strand>,
    groups: Vec<GroupSettings>,
    thread_group_size: usize,
    max_vertices_per_strand: usize,
    follows_per_guide: Option<usize>,
}

impl StrandStore {
    /// Create an empty store truncating each load to `thread_group_size` guides
    pub fn new(thread_group_size: usize) -> Result<Self> {
        if thread_group_size == 0 {
            return Err(HairError::InvalidSetting(
                "thread group size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            guides: Vec::new(),
            groups: Vec::new(),
            thread_group_size,
            max_vertices_per_strand: INITIAL_MAX_VERTICES,
            follows_per_guide: None,
        })
    }

    /// Append the strands of `file` as a new group
    ///
    /// Returns the number of guides kept from this file.
    pub fn load_append(&mut self, file: &TfxFile) -> Result<usize> {
        if self.groups.len() >= MAX_GROUPS {
            return Err(HairError::InvalidSetting(format!(
                "at most {MAX_GROUPS} input files can be combined"
            )));
        }
        let group_id = self.groups.len() as u32;
        let settings = &file.settings;

        let limit = settings
            .max_vertices_per_strand
            .unwrap_or_else(|| file.longest_strand());
        self.max_vertices_per_strand = self.max_vertices_per_strand.max(limit);

        match self.follows_per_guide {
            Some(previous) if previous != settings.follows_per_guide => warn!(
                "Follow strand count {} in group {} overrides {} from an earlier file",
                settings.follows_per_guide, group_id, previous
            ),
            _ => {}
        }
        self.follows_per_guide = Some(settings.follows_per_guide);

        let transform = settings.transform();
        let mut loaded = Vec::with_capacity(file.strands.len());
        let mut too_short = 0usize;
        for (index, source) in file.strands.iter().enumerate() {
            match self.make_guide(source, group_id, settings.both_ends_immovable) {
                Some(strand) if is_zero_length(&strand, &transform) => {
                    warn!("Discarding zero-length strand {index} in group {group_id}");
                }
                Some(strand) => loaded.push(strand),
                None => {
                    trace!(
                        "Discarding strand {index} in group {group_id}: {} vertices",
                        source.positions.len()
                    );
                    too_short += 1;
                }
            }
        }
        if too_short > 0 {
            debug!("Discarded {too_short} strands with fewer than {MIN_VERTICES_PER_STRAND} vertices");
        }

        let kept = loaded.len() - loaded.len() % self.thread_group_size;
        if kept < loaded.len() {
            info!(
                "Dropping {} trailing strands of group {} to fill whole thread groups of {}",
                loaded.len() - kept,
                group_id,
                self.thread_group_size
            );
            loaded.truncate(kept);
        }

        self.guides.extend(loaded);
        self.groups.push(GroupSettings {
            transform,
            max_radius: settings.max_radius,
        });

        info!(
            "Loaded group {group_id}: {kept} guides, max {} vertices per strand",
            self.max_vertices_per_strand
        );

        Ok(kept)
    }

    /// Clamp and pin by vertex line, so skipped lines still count
    fn make_guide(&self, source: &TfxStrand, group_id: u32, both_ends: bool) -> Option<Strand> {
        let declared = source.declared_vertices;
        let vertices: Vec<HairVertex> = source
            .indexed_positions()
            .take_while(|&(line, _)| line < self.max_vertices_per_strand)
            .map(|(line, p)| {
                if line < 2 || (both_ends && line + 2 >= declared) {
                    HairVertex::pinned(p)
                } else {
                    HairVertex::free(p)
                }
            })
            .collect();
        if vertices.len() < MIN_VERTICES_PER_STRAND {
            return None;
        }

        Some(Strand::guide(vertices, group_id, source.texcoord))
    }

    /// Guides in load order
    pub fn guides(&self) -> &[Strand] {
        &self.guides
    }

    /// Number of guides loaded
    pub fn guide_count(&self) -> usize {
        self.guides.len()
    }

    /// Follow strands per guide, taken from the most recent load
    pub fn follows_per_guide(&self) -> usize {
        self.follows_per_guide.unwrap_or(0)
    }

    /// Running maximum of the per-file vertex limits
    pub fn max_vertices_per_strand(&self) -> usize {
        self.max_vertices_per_strand
    }

    /// Settings of one group
    pub fn group(&self, group_id: u32) -> Option<&GroupSettings> {
        self.groups.get(group_id as usize)
    }

    /// Number of groups loaded
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Zero length either as authored or once the group transform is applied
fn is_zero_length(strand: &Strand, transform: &AffineTransform) -> bool {
    let posed: f32 = strand
        .vertices
        .windows(2)
        .map(|pair| {
            transform
                .transform_point(pair[0].position)
                .distance(transform.transform_point(pair[1].position))
        })
        .sum();
    strand.length() <= f32::EPSILON || posed <= f32::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfx::TfxSettings;
    use glam::{Vec2, Vec3};
    use pretty_assertions::assert_eq;

    fn line(len: usize, x: f32) -> TfxStrand {
        TfxStrand::new(
            (0..len).map(|i| Vec3::new(x, i as f32, 0.0)).collect(),
            Vec2::new(x, 0.0),
        )
    }

    fn file(strands: Vec<TfxStrand>, settings: TfxSettings) -> TfxFile {
        TfxFile {
            version: 2.0,
            settings,
            strands,
        }
    }

    fn limited(max: usize) -> TfxSettings {
        TfxSettings {
            max_vertices_per_strand: Some(max),
            ..TfxSettings::default()
        }
    }

    #[test]
    fn test_zero_thread_group_size_rejected() {
        assert!(matches!(
            StrandStore::new(0),
            Err(HairError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_root_pinning() {
        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![line(5, 0.0)], limited(8))).unwrap();

        let masses: Vec<f32> = store.guides()[0].vertices.iter().map(|v| v.inv_mass).collect();
        assert_eq!(masses, vec![0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    fn both_ends(max: usize) -> TfxSettings {
        TfxSettings {
            both_ends_immovable: true,
            ..limited(max)
        }
    }

    #[test]
    fn test_both_ends_pinned() {
        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![line(6, 0.0)], both_ends(8))).unwrap();

        let masses: Vec<f32> = store.guides()[0].vertices.iter().map(|v| v.inv_mass).collect();
        assert_eq!(masses, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clamp_cuts_off_pinned_tip() {
        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![line(10, 0.0)], both_ends(6))).unwrap();

        let strand = &store.guides()[0];
        assert_eq!(strand.len(), 6);
        let masses: Vec<f32> = strand.vertices.iter().map(|v| v.inv_mass).collect();
        assert_eq!(masses, vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_skipped_lines_count_for_pinning_and_clamp() {
        // Declared 6 vertex lines; lines 1 and 5 were blank
        let source = TfxStrand {
            positions: (0..4).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect(),
            texcoord: Vec2::ZERO,
            vertex_lines: vec![0, 2, 3, 4],
            declared_vertices: 6,
        };

        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![source.clone()], both_ends(8))).unwrap();
        let masses: Vec<f32> = store.guides()[0].vertices.iter().map(|v| v.inv_mass).collect();
        assert_eq!(masses, vec![0.0, 1.0, 1.0, 0.0]);

        // A limit of 4 keeps lines 0, 2 and 3
        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![source], both_ends(4))).unwrap();
        assert_eq!(store.guides()[0].len(), 3);
    }

    #[test]
    fn test_zero_scale_collapse_discarded() {
        let settings = TfxSettings {
            scale: 1.0e-30,
            ..limited(4)
        };
        let mut store = StrandStore::new(1).unwrap();
        assert_eq!(store.load_append(&file(vec![line(4, 0.0)], settings)).unwrap(), 0);
        assert_eq!(store.guide_count(), 0);
    }

    #[test]
    fn test_short_and_zero_length_strands_discarded() {
        let degenerate = TfxStrand::new(vec![Vec3::ONE; 4], Vec2::ZERO);
        let strands = vec![line(2, 0.0), line(3, 1.0), degenerate, line(1, 2.0)];
        let mut store = StrandStore::new(1).unwrap();

        assert_eq!(store.load_append(&file(strands, limited(4))).unwrap(), 1);
        assert_eq!(store.guides()[0].texcoord, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_clamp_below_minimum_discards_everything() {
        let mut store = StrandStore::new(1).unwrap();
        let kept = store
            .load_append(&file(vec![line(5, 0.0), line(6, 1.0)], limited(0)))
            .unwrap();
        assert_eq!(kept, 0);
        assert_eq!(store.max_vertices_per_strand(), 2);
    }

    #[test]
    fn test_running_vertex_limit() {
        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![line(10, 0.0)], limited(4))).unwrap();
        store.load_append(&file(vec![line(10, 0.0)], limited(3))).unwrap();
        store.load_append(&file(vec![line(10, 0.0)], limited(7))).unwrap();

        let lengths: Vec<usize> = store.guides().iter().map(Strand::len).collect();
        assert_eq!(lengths, vec![4, 4, 7]);
        assert_eq!(store.max_vertices_per_strand(), 7);
    }

    #[test]
    fn test_legacy_file_uses_longest_strand() {
        let legacy = TfxFile {
            version: 0.0,
            settings: TfxSettings::default(),
            strands: vec![line(12, 0.0), line(5, 1.0)],
        };
        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&legacy).unwrap();
        assert_eq!(store.max_vertices_per_strand(), 12);
        assert_eq!(store.guides()[0].len(), 12);
    }

    #[test]
    fn test_truncation_per_load() {
        let mut store = StrandStore::new(4).unwrap();
        let five = (0..5).map(|i| line(4, i as f32)).collect();
        let three = (0..3).map(|i| line(4, i as f32)).collect();

        assert_eq!(store.load_append(&file(five, limited(4))).unwrap(), 4);
        assert_eq!(store.load_append(&file(three, limited(4))).unwrap(), 0);
        assert_eq!(store.guide_count(), 4);
        // The tail is dropped, the head survives
        assert_eq!(store.guides()[3].texcoord.x, 3.0);
    }

    #[test]
    fn test_group_settings_and_follow_count() {
        let first = TfxSettings {
            scale: 2.0,
            max_radius: 0.1,
            follows_per_guide: 3,
            ..limited(4)
        };
        let second = TfxSettings {
            max_radius: 0.7,
            follows_per_guide: 1,
            ..limited(4)
        };

        let mut store = StrandStore::new(1).unwrap();
        store.load_append(&file(vec![line(4, 0.0)], first)).unwrap();
        store.load_append(&file(vec![line(4, 1.0)], second)).unwrap();

        assert_eq!(store.group_count(), 2);
        assert_eq!(store.follows_per_guide(), 1);
        assert_eq!(store.group(0).unwrap().max_radius, 0.1);
        assert_eq!(store.group(0).unwrap().transform.scale, 2.0);
        assert_eq!(store.group(1).unwrap().max_radius, 0.7);
        assert!(store.group(2).is_none());
        assert_eq!(store.guides()[1].group_id, 1);
    }

    #[test]
    fn test_group_limit() {
        let mut store = StrandStore::new(1).unwrap();
        for _ in 0..MAX_GROUPS {
            store.load_append(&file(vec![line(4, 0.0)], limited(4))).unwrap();
        }
        assert!(matches!(
            store.load_append(&file(vec![line(4, 0.0)], limited(4))),
            Err(HairError::InvalidSetting(_))
        ));
    }
}
