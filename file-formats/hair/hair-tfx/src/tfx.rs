//! Text strand files (`.tfx`)
//!
//! A `.tfx` file lists strands as plain vertex positions, optionally preceded
//! by a settings block (format version 2.0 and later):
//!
//! ```text
//! version 2.0
//! scale 1.0
//! rotation 0 0 0
//! translation 0 0 0
//! bothEndsImmovable 0
//! maxNumVerticesInStrand 32
//! numFollowHairsPerGuideHair 4
//! maxRadiusAroundGuideHair 0.5
//! numStrands 1
//! is sorted 1
//! strand 0 numVerts 3 texcoord 0.0 0.5
//! 0.0 0.0 0.0
//! 0.0 1.0 0.0
//! 0.0 2.0 0.0
//! ```
//!
//! Files without the settings block use [`TfxSettings::default`].

use glam::{Vec2, Vec3};
use log::{debug, trace};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

use crate::attributes::AffineTransform;
use crate::error::{HairError, Result};
use crate::types::Strand;

/// First format version that carries the settings block
pub const SETTINGS_VERSION: f32 = 2.0;

/// Default number of follow strands generated per guide
pub const DEFAULT_FOLLOWS_PER_GUIDE: usize = 4;

/// Default radius around a guide in which follow roots are placed
pub const DEFAULT_MAX_RADIUS: f32 = 0.5;

/// Vertex lines starting with this token carry no position and are skipped
const INVALID_VERTEX_TOKEN: &str = "-1.#INF";

/// Cap on capacity reserved from counts declared in the file
const MAX_PREALLOCATION: usize = 1 << 16;

/// Per-file settings block
#[derive(Debug, Clone, PartialEq)]
pub struct TfxSettings {
    /// Uniform scale applied to positions
    pub scale: f32,
    /// Rotation in radians about X, Y and Z
    pub rotation: Vec3,
    /// Translation applied after scale and rotation
    pub translation: Vec3,
    /// Pin the last two vertices as well as the first two
    pub both_ends_immovable: bool,
    /// Vertex limit per strand; `None` when the file does not set one
    pub max_vertices_per_strand: Option<usize>,
    /// Follow strands to generate for each guide
    pub follows_per_guide: usize,
    /// Maximum offset of a follow root from its guide root
    pub max_radius: f32,
}

impl Default for TfxSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            both_ends_immovable: false,
            max_vertices_per_strand: None,
            follows_per_guide: DEFAULT_FOLLOWS_PER_GUIDE,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

impl TfxSettings {
    /// The scale/rotation/translation part of the settings
    pub fn transform(&self) -> AffineTransform {
        AffineTransform::new(self.scale, self.rotation, self.translation)
    }
}

/// One strand as read from text
#[derive(Debug, Clone, PartialEq)]
pub struct TfxStrand {
    /// Vertex positions, root first
    pub positions: Vec<Vec3>,
    /// Texture coordinate of the root
    pub texcoord: Vec2,
    /// Vertex line each position was read from, counting skipped lines
    pub vertex_lines: Vec<usize>,
    /// Vertex count from the strand header
    pub declared_vertices: usize,
}

impl TfxStrand {
    /// A strand whose vertex lines were all valid
    pub fn new(positions: Vec<Vec3>, texcoord: Vec2) -> Self {
        let count = positions.len();
        Self {
            positions,
            texcoord,
            vertex_lines: (0..count).collect(),
            declared_vertices: count,
        }
    }

    /// Positions paired with the vertex line they came from
    pub fn indexed_positions(&self) -> impl Iterator<Item = (usize, Vec3)> + '_ {
        self.vertex_lines
            .iter()
            .copied()
            .zip(self.positions.iter().copied())
    }
}

/// A parsed `.tfx` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TfxFile {
    /// Format version (0.0 when the file has no version line)
    pub version: f32,
    /// Settings, defaulted when the file has none
    pub settings: TfxSettings,
    /// Strands in file order
    pub strands: Vec<TfxStrand>,
}

impl TfxFile {
    /// Parse a `.tfx` file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        TfxParser::new().parse(BufReader::new(file))
    }

    /// Length of the longest strand
    pub fn longest_strand(&self) -> usize {
        self.strands
            .iter()
            .map(|s| s.positions.len())
            .max()
            .unwrap_or(0)
    }
}

/// Parser for `.tfx` text
#[derive(Debug, Default)]
pub struct TfxParser {
    _private: (),
}

impl TfxParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.tfx` file from a buffered reader
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<TfxFile> {
        let mut lines = LineReader::new(reader);
        let mut file = TfxFile::default();

        let mut tokens = lines.expect_tokens()?;
        if tokens.first().map(String::as_str) == Some("version") {
            file.version = lines.number(tokens.get(1), "version")?;
            if file.version >= SETTINGS_VERSION {
                file.settings = parse_settings(&mut lines)?;
            }
            tokens = lines.expect_tokens()?;
        }

        if tokens.first().map(String::as_str) != Some("numStrands") {
            return Err(lines.error("expected 'numStrands'"));
        }
        let num_strands: usize = lines.number(tokens.get(1), "numStrands")?;

        // "is sorted 1"
        lines.expect_line()?;

        file.strands.reserve(num_strands.min(MAX_PREALLOCATION));
        for _ in 0..num_strands {
            file.strands.push(parse_strand(&mut lines)?);
        }

        debug!(
            "Parsed .tfx v{}: {} strands, longest {} vertices",
            file.version,
            file.strands.len(),
            file.longest_strand()
        );

        Ok(file)
    }
}

fn parse_settings<R: BufRead>(lines: &mut LineReader<R>) -> Result<TfxSettings> {
    let scale: f32 = lines.key_value("scale")?;
    let rotation = lines.key_vec3("rotation")?;
    let translation = lines.key_vec3("translation")?;
    let both_ends: i64 = lines.key_value("bothEndsImmovable")?;
    let max_vertices: i64 = lines.key_value("maxNumVerticesInStrand")?;
    let follows: i64 = lines.key_value("numFollowHairsPerGuideHair")?;
    let max_radius: f32 = lines.key_value("maxRadiusAroundGuideHair")?;

    let follows_per_guide = usize::try_from(follows).map_err(|_| {
        HairError::InvalidSetting(format!(
            "numFollowHairsPerGuideHair must not be negative, got {follows}"
        ))
    })?;
    if !(max_radius >= 0.0 && max_radius.is_finite()) {
        return Err(HairError::InvalidSetting(format!(
            "maxRadiusAroundGuideHair must be a finite non-negative number, got {max_radius}"
        )));
    }
    if !(scale.is_finite() && rotation.is_finite() && translation.is_finite()) {
        return Err(HairError::InvalidSetting(
            "scale, rotation and translation must be finite".to_string(),
        ));
    }
    if scale == 0.0 {
        return Err(HairError::InvalidSetting("scale must not be zero".to_string()));
    }

    Ok(TfxSettings {
        scale,
        rotation,
        translation,
        both_ends_immovable: both_ends != 0,
        // Negative limits behave like the minimum limit
        max_vertices_per_strand: Some(usize::try_from(max_vertices).unwrap_or(0)),
        follows_per_guide,
        max_radius,
    })
}

fn parse_strand<R: BufRead>(lines: &mut LineReader<R>) -> Result<TfxStrand> {
    // strand <i> numVerts <n> texcoord <u> <v>
    let header = lines.expect_tokens()?;
    if header.first().map(String::as_str) != Some("strand") {
        return Err(lines.error("expected 'strand'"));
    }
    let num_verts: usize = lines.number(header.get(3), "numVerts")?;
    let texcoord = match (header.get(5), header.get(6)) {
        (Some(u), Some(v)) => Vec2::new(
            lines.number(Some(u), "texcoord")?,
            lines.number(Some(v), "texcoord")?,
        ),
        _ => Vec2::ZERO,
    };

    let mut positions = Vec::with_capacity(num_verts.min(MAX_PREALLOCATION));
    let mut vertex_lines = Vec::with_capacity(num_verts.min(MAX_PREALLOCATION));
    for vertex in 0..num_verts {
        let tokens = lines.expect_tokens()?;
        match tokens.first().map(String::as_str) {
            None | Some(INVALID_VERTEX_TOKEN) => {
                trace!("Skipping empty vertex at line {}", lines.line_no);
            }
            Some(_) => {
                positions.push(lines.vec3(&tokens, "vertex")?);
                vertex_lines.push(vertex);
            }
        }
    }

    Ok(TfxStrand {
        positions,
        texcoord,
        vertex_lines,
        declared_vertices: num_verts,
    })
}

/// Line-by-line tokenizer that tracks the current line number
struct LineReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> HairError {
        HairError::parse(self.line_no, message)
    }

    fn expect_line(&mut self) -> Result<String> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(line?)
            }
            None => Err(HairError::parse(
                self.line_no + 1,
                "unexpected end of input",
            )),
        }
    }

    fn expect_tokens(&mut self) -> Result<Vec<String>> {
        let line = self.expect_line()?;
        Ok(line.split_whitespace().map(str::to_string).collect())
    }

    /// Read a `key value...` line, returning the values
    fn expect_key(&mut self, key: &str) -> Result<Vec<String>> {
        let mut tokens = self.expect_tokens()?;
        if tokens.first().map(String::as_str) != Some(key) {
            return Err(self.error(format!("expected '{key}'")));
        }
        tokens.remove(0);
        Ok(tokens)
    }

    fn key_value<T: std::str::FromStr>(&mut self, key: &str) -> Result<T> {
        let values = self.expect_key(key)?;
        self.number(values.first(), key)
    }

    fn key_vec3(&mut self, key: &str) -> Result<Vec3> {
        let values = self.expect_key(key)?;
        self.vec3(&values, key)
    }

    fn number<T: std::str::FromStr>(&self, token: Option<&String>, what: &str) -> Result<T> {
        let token = token.ok_or_else(|| self.error(format!("missing value for {what}")))?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid value for {what}: '{token}'")))
    }

    fn vec3(&self, tokens: &[String], what: &str) -> Result<Vec3> {
        Ok(Vec3::new(
            self.number(tokens.first(), what)?,
            self.number(tokens.get(1), what)?,
            self.number(tokens.get(2), what)?,
        ))
    }
}

/// Write strands back out as a `.tfx` file without a settings block
pub fn write_strands<W: Write>(writer: &mut W, strands: &[Strand]) -> Result<()> {
    writeln!(writer, "numStrands {}", strands.len())?;
    writeln!(writer, "is sorted 1")?;

    for (index, strand) in strands.iter().enumerate() {
        writeln!(
            writer,
            "strand {} numVerts {} texcoord {:.6} {:.6}",
            index,
            strand.len(),
            strand.texcoord.x,
            strand.texcoord.y
        )?;
        for vertex in &strand.vertices {
            let p = vertex.position;
            writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
        }
    }

    Ok(())
}

/// Write strands to a `.tfx` file on disk
pub fn write_strands_to_path<P: AsRef<Path>>(path: P, strands: &[Strand]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_strands(&mut writer, strands)?;
    writer.flush()?;
    Ok(())
}
