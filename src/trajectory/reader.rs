//! Streaming reader for text trajectories.
//!
//! Layout:
//!
//! ```text
//! TestSys                 system name
//! 2.0                     scale factor
//! 1 0 0                   \
//! 0 1 0                    } basis matrix, vectors are the columns
//! 0 0 1                   /
//! A B                     atom type names
//! 1 2                     atoms per type
//! Direct configuration= 1 frame marker
//! 1 1 1                   \
//! 2 2 2                    } one line per atom, types in header order
//! 3 3 3                   /
//! Direct configuration= 2
//! ...
//! ```

use std::io::BufRead;

use log::debug;

use super::error::TrajectoryError;
use super::model::{AtomType, MolFrame, Vec3};

/// Log progress every this many frames.
const PROGRESS_INTERVAL: usize = 1000;

// ---------------------------------------------------------------------------
// TrajectoryHeader
// ---------------------------------------------------------------------------

/// Everything in front of the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryHeader {
    pub name: String,
    pub scale: f64,
    /// Basis matrix as read, row by row.
    pub basis_rows: [Vec3; 3],
    pub atom_types: Vec<AtomType>,
}

impl TrajectoryHeader {
    /// Scaled lattice vectors: vector `j` has component `k` from row `k`,
    /// column `j` of the basis matrix.
    pub fn base_vectors(&self) -> [Vec3; 3] {
        let m = &self.basis_rows;
        std::array::from_fn(|j| std::array::from_fn(|k| m[k][j] * self.scale))
    }

    pub fn atoms_per_frame(&self) -> usize {
        self.atom_types.iter().map(|t| t.count).sum()
    }
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

/// Parse a line holding a single real.
fn parse_scalar(line: &str) -> Option<f64> {
    let mut tokens = line.split_whitespace();
    let v = tokens.next()?.parse().ok()?;
    tokens.next().is_none().then_some(v)
}

/// Parse a line of exactly three whitespace-separated reals.
fn parse_vec3(line: &str) -> Option<Vec3> {
    let mut tokens = line.split_whitespace();
    let v: Vec3 = [
        tokens.next()?.parse().ok()?,
        tokens.next()?.parse().ok()?,
        tokens.next()?.parse().ok()?,
    ];
    tokens.next().is_none().then_some(v)
}

// ---------------------------------------------------------------------------
// FrameReader
// ---------------------------------------------------------------------------

/// Reads the header eagerly and the frames one at a time.
pub struct FrameReader<R: BufRead> {
    reader: R,
    header: TrajectoryHeader,
    line: String,
    line_no: usize,
    frames_read: usize,
}

impl<R: BufRead> FrameReader<R> {
    /// Parse the header; the stream is left at the first frame marker.
    pub fn new(reader: R) -> Result<Self, TrajectoryError> {
        let mut this = Self {
            reader,
            header: TrajectoryHeader {
                name: String::new(),
                scale: 1.0,
                basis_rows: [[0.0; 3]; 3],
                atom_types: Vec::new(),
            },
            line: String::new(),
            line_no: 0,
            frames_read: 0,
        };
        this.header = this.read_header()?;
        debug!(
            "trajectory '{}': {} atom type(s), {} atom(s) per frame",
            this.header.name,
            this.header.atom_types.len(),
            this.header.atoms_per_frame()
        );
        Ok(this)
    }

    pub fn header(&self) -> &TrajectoryHeader {
        &self.header
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Number of frames consumed so far, parsed or skipped.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Read the next line into `self.line`. Returns `false` at end of stream.
    fn next_line(&mut self) -> Result<bool, TrajectoryError> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        if n == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        Ok(true)
    }

    fn header_line(&mut self, what: &str) -> Result<(), TrajectoryError> {
        if self.next_line()? {
            Ok(())
        } else {
            Err(TrajectoryError::header(
                self.line_no + 1,
                format!("end of stream while reading {what}"),
            ))
        }
    }

    fn read_header(&mut self) -> Result<TrajectoryHeader, TrajectoryError> {
        self.header_line("system name")?;
        let name = self.line.trim().to_string();

        self.header_line("scale factor")?;
        let scale = parse_scalar(&self.line)
            .ok_or_else(|| TrajectoryError::header(self.line_no, "invalid scale factor"))?;

        let mut basis_rows = [[0.0; 3]; 3];
        for row in basis_rows.iter_mut() {
            self.header_line("base vectors")?;
            *row = parse_vec3(&self.line)
                .ok_or_else(|| TrajectoryError::header(self.line_no, "invalid base vector"))?;
        }

        self.header_line("atom names")?;
        let names: Vec<String> = self.line.split_whitespace().map(str::to_string).collect();
        let names_line = self.line_no;

        self.header_line("atom counts")?;
        let counts = self
            .line
            .split_whitespace()
            .map(|tok| tok.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| TrajectoryError::header(self.line_no, "invalid atom count"))?;

        if names.len() != counts.len() {
            return Err(TrajectoryError::AtomCountMismatch {
                line: names_line,
                names: names.len(),
                counts: counts.len(),
            });
        }

        let atom_types = names
            .into_iter()
            .zip(counts)
            .map(|(name, count)| AtomType { name, count })
            .collect();

        Ok(TrajectoryHeader {
            name,
            scale,
            basis_rows,
            atom_types,
        })
    }

    /// Consume a frame marker. Returns `false` when the trajectory has ended.
    ///
    /// Blank lines in front of a marker are skipped, so any number of
    /// trailing blank lines ends the stream cleanly.
    fn next_marker(&mut self) -> Result<bool, TrajectoryError> {
        loop {
            if !self.next_line()? {
                return Ok(false);
            }
            if !self.line.trim().is_empty() {
                return Ok(true);
            }
        }
    }

    fn count_frame(&mut self) {
        self.frames_read += 1;
        if self.frames_read % PROGRESS_INTERVAL == 0 {
            debug!("{} frame(s) read, line {}", self.frames_read, self.line_no);
        }
    }

    /// Parse the next frame. `Ok(None)` at the regular end of the stream.
    pub fn next_frame(&mut self) -> Result<Option<MolFrame>, TrajectoryError> {
        if !self.next_marker()? {
            return Ok(None);
        }
        let frame_idx = self.frames_read;

        let counts: Vec<usize> = self.header.atom_types.iter().map(|t| t.count).collect();
        let mut coords = Vec::with_capacity(counts.len());
        for count in counts {
            let mut positions = Vec::with_capacity(count);
            for _ in 0..count {
                if !self.next_line()? {
                    return Err(TrajectoryError::coordinate(
                        frame_idx,
                        self.line_no + 1,
                        "unexpected end of stream",
                    ));
                }
                let pos = parse_vec3(&self.line).ok_or_else(|| {
                    TrajectoryError::coordinate(
                        frame_idx,
                        self.line_no,
                        format!("expected 3 reals, got '{}'", self.line.trim()),
                    )
                })?;
                positions.push(pos);
            }
            coords.push(positions);
        }

        self.count_frame();
        Ok(Some(MolFrame::from_coords(coords)))
    }

    /// Consume the next frame without parsing it. Returns `false` when the
    /// stream ends first.
    pub fn skip_frame(&mut self) -> Result<bool, TrajectoryError> {
        if !self.next_marker()? {
            return Ok(false);
        }
        for _ in 0..self.header.atoms_per_frame() {
            if !self.next_line()? {
                return Ok(false);
            }
        }
        self.count_frame();
        Ok(true)
    }

    /// Iterate over the frames, dropping `frameskip` frames after each one
    /// that is returned.
    pub fn frames(self, frameskip: usize) -> Frames<R> {
        Frames {
            reader: self,
            frameskip,
            skip_pending: false,
            done: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Frames – lazy iterator with frame skipping
// ---------------------------------------------------------------------------

/// Iterator over retained frames. Stops after the first error.
pub struct Frames<R: BufRead> {
    reader: FrameReader<R>,
    frameskip: usize,
    skip_pending: bool,
    done: bool,
}

impl<R: BufRead> Frames<R> {
    pub fn header(&self) -> &TrajectoryHeader {
        self.reader.header()
    }

    pub fn line_no(&self) -> usize {
        self.reader.line_no()
    }

    pub fn frames_read(&self) -> usize {
        self.reader.frames_read()
    }

    fn advance(&mut self) -> Result<Option<MolFrame>, TrajectoryError> {
        if self.skip_pending {
            self.skip_pending = false;
            for _ in 0..self.frameskip {
                if !self.reader.skip_frame()? {
                    return Ok(None);
                }
            }
        }

        let frame = self.reader.next_frame()?;
        self.skip_pending = frame.is_some();
        Ok(frame)
    }
}

impl<R: BufRead> Iterator for Frames<R> {
    type Item = Result<MolFrame, TrajectoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
