//! Binary hair assets (`.tfxb`)
//!
//! The layout is positional with no magic, version or padding, all values in
//! native byte order:
//!
//! | Field | Type |
//! |---|---|
//! | vertex count, strand count, max vertices per strand | `i32` × 3 |
//! | guide vertex count, guide strand count, follows per guide | `i32` × 3 |
//! | group ids | `i32[strands]` |
//! | reference vectors (`w` = 0) | `f32x4[vertices]` |
//! | global rotations, local rotations (`x y z w`) | `f32x4[vertices]` × 2 |
//! | positions (`w` = inverse mass) | `f32x4[vertices]` |
//! | tangents (`w` = 0) | `f32x4[vertices]` |
//! | triangle vertices | 40 bytes × vertices |
//! | thickness | `f32[vertices]` |
//! | follow root offsets (`w` = guide strand index) | `f32x4[strands]` |
//! | rest lengths | `f32[vertices]` |
//! | bounding sphere centre, radius | `f32` × 4 |
//! | triangle index count, indices | `i32`, `i32[]` |
//! | line index count, indices | `i32`, `i32[]` |

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3, Vec4};
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::asset::{HairAsset, TriangleVertex};
use crate::bounds::BoundingSphere;
use crate::error::{HairError, Result};

/// Cap on capacity reserved from counts read from the header
const MAX_PREALLOCATION: usize = 1 << 20;

/// A fixed-size value in the binary layout
trait TfxbValue: Sized {
    fn read<R: Read>(reader: &mut R) -> Result<Self>;
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl TfxbValue for f32 {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        reader.read_f32::<NativeEndian>().map_err(HairError::from_read)
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32::<NativeEndian>(*self)?;
        Ok(())
    }
}

/// Non-negative values stored in `i32` fields
impl TfxbValue for u32 {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let value = reader.read_i32::<NativeEndian>().map_err(HairError::from_read)?;
        u32::try_from(value)
            .map_err(|_| HairError::ValidationError(format!("negative value {value}")))
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let value = i32::try_from(*self)
            .map_err(|_| HairError::TooLarge(format!("{self} does not fit in i32")))?;
        writer.write_i32::<NativeEndian>(value)?;
        Ok(())
    }
}

impl TfxbValue for Vec3 {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Vec3::new(f32::read(reader)?, f32::read(reader)?, f32::read(reader)?))
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.x.write(writer)?;
        self.y.write(writer)?;
        self.z.write(writer)
    }
}

impl TfxbValue for Vec4 {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Vec3::read(reader)?.extend(f32::read(reader)?))
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.truncate().write(writer)?;
        self.w.write(writer)
    }
}

impl TfxbValue for Quat {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Quat::from_vec4(Vec4::read(reader)?))
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        Vec4::from(*self).write(writer)
    }
}

impl TfxbValue for TriangleVertex {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            position: Vec3::read(reader)?,
            tangent: Vec3::read(reader)?,
            texcoord: Vec4::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.position.write(writer)?;
        self.tangent.write(writer)?;
        self.texcoord.write(writer)
    }
}

impl TfxbValue for BoundingSphere {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            center: Vec3::read(reader)?,
            radius: f32::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.center.write(writer)?;
        self.radius.write(writer)
    }
}

fn write_count<W: Write>(writer: &mut W, count: usize) -> Result<()> {
    let count = u32::try_from(count)
        .map_err(|_| HairError::TooLarge(format!("count {count} does not fit in i32")))?;
    count.write(writer)
}

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let value = reader.read_i32::<NativeEndian>().map_err(HairError::from_read)?;
    usize::try_from(value)
        .map_err(|_| HairError::ValidationError(format!("negative {what}: {value}")))
}

fn write_array<W: Write, T: TfxbValue>(writer: &mut W, values: &[T]) -> Result<()> {
    values.iter().try_for_each(|value| value.write(writer))
}

fn read_array<R: Read, T: TfxbValue>(reader: &mut R, count: usize) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATION));
    for _ in 0..count {
        values.push(T::read(reader)?);
    }
    Ok(values)
}

/// Write `asset` in the binary layout
pub fn write_asset<W: Write>(writer: &mut W, asset: &HairAsset) -> Result<()> {
    let vertices = asset.vertex_count();

    write_count(writer, vertices)?;
    write_count(writer, asset.strand_count())?;
    write_count(writer, asset.max_vertices_per_strand)?;
    write_count(writer, asset.guide_vertex_count)?;
    write_count(writer, asset.guide_strand_count)?;
    write_count(writer, asset.follows_per_guide)?;

    write_array(writer, &asset.group_ids)?;
    for reference in &asset.ref_vectors {
        reference.extend(0.0).write(writer)?;
    }
    write_array(writer, &asset.global_rotations)?;
    write_array(writer, &asset.local_rotations)?;
    write_array(writer, &asset.positions)?;
    for tangent in &asset.tangents {
        tangent.extend(0.0).write(writer)?;
    }
    write_array(writer, &asset.triangle_vertices)?;
    write_array(writer, &asset.thickness)?;
    write_array(writer, &asset.follow_root_offsets)?;
    write_array(writer, &asset.rest_lengths)?;
    asset.bounding_sphere.write(writer)?;

    write_count(writer, asset.triangle_indices.len())?;
    write_array(writer, &asset.triangle_indices)?;
    write_count(writer, asset.line_indices.len())?;
    write_array(writer, &asset.line_indices)?;

    debug!(
        "Wrote .tfxb: {} strands, {} vertices",
        asset.strand_count(),
        vertices
    );

    Ok(())
}

/// Write `asset` to a file, replacing any existing content
pub fn write_asset_to_path<P: AsRef<Path>>(path: P, asset: &HairAsset) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_asset(&mut writer, asset)?;
    writer.flush()?;
    Ok(())
}

/// Read an asset from the binary layout
pub fn read_asset<R: Read>(reader: &mut R) -> Result<HairAsset> {
    let vertices = read_count(reader, "vertex count")?;
    let strands = read_count(reader, "strand count")?;
    let max_vertices_per_strand = read_count(reader, "max vertices per strand")?;
    let guide_vertex_count = read_count(reader, "guide vertex count")?;
    let guide_strand_count = read_count(reader, "guide strand count")?;
    let follows_per_guide = read_count(reader, "follows per guide")?;

    let group_ids = read_array(reader, strands)?;
    let ref_vectors = read_array::<_, Vec4>(reader, vertices)?
        .into_iter()
        .map(Vec4::truncate)
        .collect();
    let global_rotations = read_array(reader, vertices)?;
    let local_rotations = read_array(reader, vertices)?;
    let positions = read_array(reader, vertices)?;
    let tangents = read_array::<_, Vec4>(reader, vertices)?
        .into_iter()
        .map(Vec4::truncate)
        .collect();
    let triangle_vertices = read_array(reader, vertices)?;
    let thickness = read_array(reader, vertices)?;
    let follow_root_offsets = read_array(reader, strands)?;
    let rest_lengths = read_array(reader, vertices)?;
    let bounding_sphere = BoundingSphere::read(reader)?;

    let triangle_count = read_count(reader, "triangle index count")?;
    let triangle_indices = read_array(reader, triangle_count)?;
    let line_count = read_count(reader, "line index count")?;
    let line_indices = read_array(reader, line_count)?;

    Ok(HairAsset {
        max_vertices_per_strand,
        guide_vertex_count,
        guide_strand_count,
        follows_per_guide,
        group_ids,
        ref_vectors,
        global_rotations,
        local_rotations,
        positions,
        tangents,
        triangle_vertices,
        thickness,
        follow_root_offsets,
        rest_lengths,
        bounding_sphere,
        triangle_indices,
        line_indices,
    })
}

/// Read an asset from a file
pub fn read_asset_from_path<P: AsRef<Path>>(path: P) -> Result<HairAsset> {
    let mut reader = BufReader::new(File::open(path)?);
    read_asset(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HairVertex, Strand};
    use glam::Vec2;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sample_asset() -> HairAsset {
        let vertices = (0..4)
            .map(|i| {
                let p = Vec3::new(i as f32, 0.5 * i as f32, 0.0);
                if i < 2 {
                    HairVertex::pinned(p)
                } else {
                    HairVertex::free(p)
                }
            })
            .collect();
        let strand = Strand::guide(vertices, 0, Vec2::new(0.1, 0.2));
        HairAsset::assemble(&[strand], 0, 4).unwrap()
    }

    fn i32_at(bytes: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_layout() {
        let asset = sample_asset();
        let mut bytes = Vec::new();
        write_asset(&mut bytes, &asset).unwrap();

        assert_eq!(bytes.len(), asset.serialized_size());
        let header: Vec<i32> = (0..6).map(|i| i32_at(&bytes, i * 4)).collect();
        assert_eq!(header, vec![4, 1, 4, 4, 1, 0]);
        // Group id
        assert_eq!(i32_at(&bytes, 24), 0);

        // Positions follow the ref vectors and both rotation arrays
        let positions = 28 + 3 * 4 * 16;
        assert_eq!(f32_at(&bytes, positions + 16), 1.0);
        assert_eq!(f32_at(&bytes, positions + 16 + 12), 0.0);
        assert_eq!(f32_at(&bytes, positions + 3 * 16 + 12), 1.0);

        // Line indices close the file
        let tail = bytes.len() - 7 * 4;
        assert_eq!(i32_at(&bytes, tail), 6);
        let lines: Vec<i32> = (1..7).map(|i| i32_at(&bytes, tail + i * 4)).collect();
        assert_eq!(lines, vec![0, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_read_back() {
        let asset = sample_asset();
        let mut bytes = Vec::new();
        write_asset(&mut bytes, &asset).unwrap();

        let decoded = read_asset(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(decoded, asset);
    }

    #[test]
    fn test_truncated_input() {
        let mut bytes = Vec::new();
        write_asset(&mut bytes, &sample_asset()).unwrap();
        bytes.truncate(bytes.len() - 3);

        assert!(matches!(
            read_asset(&mut Cursor::new(&bytes)),
            Err(HairError::UnexpectedEof)
        ));
        assert!(matches!(
            read_asset(&mut Cursor::new(&[0u8; 10])),
            Err(HairError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_negative_count() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i32).to_ne_bytes());
        bytes.extend_from_slice(&[0u8; 64]);

        assert!(matches!(
            read_asset(&mut Cursor::new(&bytes)),
            Err(HairError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_asset() {
        let asset = HairAsset::default();
        let mut bytes = Vec::new();
        write_asset(&mut bytes, &asset).unwrap();
        assert_eq!(bytes.len(), 24 + 16 + 8);
        assert_eq!(read_asset(&mut Cursor::new(&bytes)).unwrap(), asset);
    }
}
