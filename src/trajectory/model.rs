use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use super::error::TrajectoryError;
use super::reader::{FrameReader, TrajectoryHeader};

/// Cartesian 3-vector.
pub type Vec3 = [f64; 3];

// ---------------------------------------------------------------------------
// AtomType / MolFrame
// ---------------------------------------------------------------------------

/// An atom species and how many atoms of it each frame holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomType {
    pub name: String,
    pub count: usize,
}

/// One snapshot of all atom positions, grouped by atom type in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolFrame {
    coords: Vec<Vec<Vec3>>,
}

impl MolFrame {
    pub(crate) fn from_coords(coords: Vec<Vec<Vec3>>) -> Self {
        Self { coords }
    }

    /// Number of atom types in this frame.
    pub fn num_atom_types(&self) -> usize {
        self.coords.len()
    }

    /// Positions of all atoms of the given type.
    pub fn coords(&self, atom_type: usize) -> &[Vec3] {
        self.coords.get(atom_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_atoms(&self) -> usize {
        self.coords.iter().map(Vec::len).sum()
    }

    /// Whether this frame has exactly the declared number of atoms per type.
    pub fn matches(&self, atom_types: &[AtomType]) -> bool {
        self.coords.len() == atom_types.len()
            && self
                .coords
                .iter()
                .zip(atom_types)
                .all(|(c, t)| c.len() == t.count)
    }
}

// ---------------------------------------------------------------------------
// MolDyn – a complete (possibly thinned) trajectory
// ---------------------------------------------------------------------------

/// Counters reported after loading a trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Frames encountered in the stream, skipped ones included.
    pub frames_read: usize,
    /// Frames kept in the trajectory.
    pub frames_kept: usize,
    /// Lines consumed.
    pub lines: usize,
}

/// Lattice, atom types and retained frames of a molecular dynamics run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolDyn {
    name: String,
    scale: f64,
    base_a: Vec3,
    base_b: Vec3,
    base_c: Vec3,
    atom_types: Vec<AtomType>,
    frames: Vec<MolFrame>,
}

impl MolDyn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Lattice vectors A, B and C, already multiplied by the scale factor.
    pub fn base_vectors(&self) -> [Vec3; 3] {
        [self.base_a, self.base_b, self.base_c]
    }

    pub fn base_a(&self) -> Vec3 {
        self.base_a
    }

    pub fn base_b(&self) -> Vec3 {
        self.base_b
    }

    pub fn base_c(&self) -> Vec3 {
        self.base_c
    }

    pub fn atom_types(&self) -> &[AtomType] {
        &self.atom_types
    }

    pub fn atom_name(&self, atom_type: usize) -> Option<&str> {
        self.atom_types.get(atom_type).map(|t| t.name.as_str())
    }

    /// Atoms per frame, summed over all types.
    pub fn atoms_per_frame(&self) -> usize {
        self.atom_types.iter().map(|t| t.count).sum()
    }

    pub fn frames(&self) -> &[MolFrame] {
        &self.frames
    }

    pub fn frame(&self, idx: usize) -> Option<&MolFrame> {
        self.frames.get(idx)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn set_header(&mut self, header: &TrajectoryHeader) {
        self.name = header.name.clone();
        self.scale = header.scale;
        [self.base_a, self.base_b, self.base_c] = header.base_vectors();
        self.atom_types = header.atom_types.clone();
    }

    /// Load a trajectory file, keeping every `frameskip + 1`-th frame.
    ///
    /// On error the frames read before the malformed one stay available.
    pub fn load_file(&mut self, path: &Path, frameskip: usize) -> Result<LoadStats, TrajectoryError> {
        let file = File::open(path)?;
        let stats = self.read_from(BufReader::new(file), frameskip)?;
        info!(
            "{}: {} of {} frame(s) kept, {} atom(s) per frame",
            path.display(),
            stats.frames_kept,
            stats.frames_read,
            self.atoms_per_frame()
        );
        Ok(stats)
    }

    /// Read a trajectory from any buffered stream, replacing the current
    /// content.
    pub fn read_from<R: BufRead>(&mut self, reader: R, frameskip: usize) -> Result<LoadStats, TrajectoryError> {
        self.clear();

        let reader = FrameReader::new(reader)?;
        self.set_header(reader.header());

        let mut frames = reader.frames(frameskip);
        for frame in frames.by_ref() {
            let frame = frame?;
            debug_assert!(frame.matches(&self.atom_types));
            self.frames.push(frame);
        }

        Ok(LoadStats {
            frames_read: frames.frames_read(),
            frames_kept: self.frames.len(),
            lines: frames.line_no(),
        })
    }
}
