use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Counting noise, Gaussian approximation of a Poisson draw.
    fn counts(&mut self, expected: f64) -> i64 {
        self.gauss(expected, expected.sqrt()).round().max(0.0) as i64
    }
}

/// Energy scan through a magnon, measured in two interleaved spin-flip
/// channels: rows alternate non-spin-flip / spin-flip.
fn write_scan(rng: &mut SimpleRng, output_path: &str) -> usize {
    let energies: Vec<f64> = (0..41).map(|i| 0.5 + i as f64 * 0.1).collect();
    let monitor = 50_000i64;

    let mut qh = Vec::new();
    let mut en = Vec::new();
    let mut cnts = Vec::new();
    let mut mon = Vec::new();

    for &e in &energies {
        // nsf: phonon at 2.0 meV, sf: magnon at 3.1 meV
        let nsf = 5.0 + gaussian(e, 2.0, 0.25, 300.0);
        let sf = 3.0 + gaussian(e, 3.1, 0.3, 120.0);
        for expected in [nsf, sf] {
            qh.push(1.0);
            en.push(e);
            cnts.push(rng.counts(expected));
            mon.push(monitor);
        }
    }
    let rows = cnts.len();

    let metadata = HashMap::from([
        ("scan_vars".to_string(), "EN".to_string()),
        ("count_var".to_string(), "CNTS".to_string()),
        ("mon_var".to_string(), "M1".to_string()),
        ("polarization".to_string(), "p1=1 i11=1; p1=1 i10=1".to_string()),
    ]);

    let schema = Arc::new(Schema::new_with_metadata(
        vec![
            Field::new("QH", DataType::Float64, false),
            Field::new("EN", DataType::Float64, false),
            Field::new("CNTS", DataType::Int64, false),
            Field::new("M1", DataType::Int64, false),
        ],
        metadata,
    ));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(qh)),
            Arc::new(Float64Array::from(en)),
            Arc::new(Int64Array::from(cnts)),
            Arc::new(Int64Array::from(mon)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
    rows
}

/// Thermal motion of a small rock-salt cell.
fn write_trajectory(rng: &mut SimpleRng, output_path: &str, frames: usize) {
    let cations = [[0.0, 0.0, 0.0], [0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5]];
    let anions = [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5], [0.5, 0.5, 0.5]];

    let mut text = String::new();
    text.push_str("NaCl\n5.64\n");
    text.push_str("1.0 0.0 0.0\n0.0 1.0 0.0\n0.0 0.0 1.0\n");
    text.push_str("Na Cl\n4 4\n");

    for frame in 1..=frames {
        let _ = writeln!(text, "Direct configuration= {frame:6}");
        for site in cations.iter().chain(&anions) {
            let _ = writeln!(
                text,
                "  {:.8}  {:.8}  {:.8}",
                site[0] + rng.gauss(0.0, 0.01),
                site[1] + rng.gauss(0.0, 0.01),
                site[2] + rng.gauss(0.0, 0.01)
            );
        }
    }

    std::fs::write(output_path, text).expect("Failed to write trajectory");
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let scan_path = "sample_scan.parquet";
    let rows = write_scan(&mut rng, scan_path);
    println!("Wrote {rows} interleaved rows (2 channels) to {scan_path}");

    let traj_path = "sample_traj.txt";
    let frames = 500;
    write_trajectory(&mut rng, traj_path, frames);
    println!("Wrote {frames} frames (8 atoms each) to {traj_path}");
}
