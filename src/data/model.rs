use std::ops::{Add, Div, Mul, Neg, Sub};

use super::error::DataError;

/// Values closer to zero than this get the unit error of an empty bin.
pub const ZERO_COUNT_EPS: f64 = 1e-6;

/// Poisson counting error of a single count value.
///
/// An empty bin (`y == 0`) still carries an uncertainty of one count,
/// everything else gets `sqrt(y)`.
pub fn poisson_error(y: f64) -> f64 {
    if y.abs() < ZERO_COUNT_EPS {
        1.0
    } else {
        y.sqrt()
    }
}

/// Apply [`poisson_error`] element-wise.
pub fn poisson_errors(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(poisson_error).collect()
}

// ---------------------------------------------------------------------------
// Axis / CountSeries – the individual series of one channel
// ---------------------------------------------------------------------------

/// An independent-variable series (scan axis).
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<f64>,
}

/// A count series (detector or monitor) with its statistical errors.
/// `errors` always has the same length as `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSeries {
    pub values: Vec<f64>,
    pub errors: Vec<f64>,
}

impl CountSeries {
    /// Pair values with their Poisson errors.
    pub fn with_poisson_errors(values: Vec<f64>) -> Self {
        let errors = poisson_errors(&values);
        Self { values, errors }
    }

    fn checked(values: Vec<f64>, errors: Vec<f64>) -> Result<Self, DataError> {
        if values.len() != errors.len() {
            return Err(DataError::LengthMismatch {
                values: values.len(),
                errors: errors.len(),
            });
        }
        Ok(Self { values, errors })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            values: self.values.iter().map(|v| v * factor).collect(),
            errors: self.errors.iter().map(|e| e * factor.abs()).collect(),
        }
    }

    fn shifted(&self, offset: f64, offset_err: f64) -> Self {
        Self {
            values: self.values.iter().map(|v| v + offset).collect(),
            errors: self
                .errors
                .iter()
                .map(|e| (e * e + offset_err * offset_err).sqrt())
                .collect(),
        }
    }

    /// Point-wise sum, errors added in quadrature.
    fn summed(&self, other: &Self) -> Self {
        Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a + b)
                .collect(),
            errors: self
                .errors
                .iter()
                .zip(&other.errors)
                .map(|(a, b)| (a * a + b * b).sqrt())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Data – one polarisation channel
// ---------------------------------------------------------------------------

/// The measured series of one polarisation channel.
///
/// A detector or monitor can appear multiple times, e.g. for instruments
/// with several detector tubes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    axes: Vec<Axis>,
    counters: Vec<CountSeries>,
    monitors: Vec<CountSeries>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    pub fn num_counters(&self) -> usize {
        self.counters.len()
    }

    pub fn num_monitors(&self) -> usize {
        self.monitors.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn counters(&self) -> &[CountSeries] {
        &self.counters
    }

    pub fn monitors(&self) -> &[CountSeries] {
        &self.monitors
    }

    pub fn axis(&self, i: usize) -> Option<&Axis> {
        self.axes.get(i)
    }

    pub fn counter(&self, i: usize) -> Option<&CountSeries> {
        self.counters.get(i)
    }

    pub fn monitor(&self, i: usize) -> Option<&CountSeries> {
        self.monitors.get(i)
    }

    /// Append a scan axis. An empty name becomes `ax<n>`, `n` being the
    /// number of axes including the new one.
    pub fn add_axis(&mut self, values: Vec<f64>, name: impl Into<String>) {
        let mut name = name.into();
        if name.is_empty() {
            name = format!("ax{}", self.axes.len() + 1);
        }
        self.axes.push(Axis { name, values });
    }

    /// Append a counter with explicit errors, which must match `values` in
    /// length.
    pub fn add_counter(&mut self, values: Vec<f64>, errors: Vec<f64>) -> Result<(), DataError> {
        self.counters.push(CountSeries::checked(values, errors)?);
        Ok(())
    }

    pub fn add_monitor(&mut self, values: Vec<f64>, errors: Vec<f64>) -> Result<(), DataError> {
        self.monitors.push(CountSeries::checked(values, errors)?);
        Ok(())
    }

    /// Append a counter whose errors follow from counting statistics.
    pub fn add_poisson_counter(&mut self, values: Vec<f64>) {
        self.counters.push(CountSeries::with_poisson_errors(values));
    }

    pub fn add_poisson_monitor(&mut self, values: Vec<f64>) {
        self.monitors.push(CountSeries::with_poisson_errors(values));
    }

    /// Number of points, taken from the first non-empty series.
    pub fn num_points(&self) -> usize {
        self.axes
            .iter()
            .map(|a| a.values.len())
            .chain(self.counters.iter().map(CountSeries::len))
            .chain(self.monitors.iter().map(CountSeries::len))
            .find(|&n| n > 0)
            .unwrap_or(0)
    }

    /// Whether all non-empty series have the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.num_points();
        self.axes
            .iter()
            .map(|a| a.values.len())
            .chain(self.counters.iter().map(CountSeries::len))
            .chain(self.monitors.iter().map(CountSeries::len))
            .all(|len| len == 0 || len == n)
    }

    /// Point-wise sum of two channels. Axes are taken from `self`.
    ///
    /// Counter and monitor errors are added in quadrature.
    pub fn try_add(&self, other: &Data) -> Result<Data, DataError> {
        self.check_shape(other)?;
        Ok(Data {
            axes: self.axes.clone(),
            counters: self
                .counters
                .iter()
                .zip(&other.counters)
                .map(|(a, b)| a.summed(b))
                .collect(),
            monitors: self
                .monitors
                .iter()
                .zip(&other.monitors)
                .map(|(a, b)| a.summed(b))
                .collect(),
        })
    }

    /// Point-wise difference, e.g. for background subtraction.
    pub fn try_sub(&self, other: &Data) -> Result<Data, DataError> {
        self.try_add(&-other)
    }

    fn check_shape(&self, other: &Data) -> Result<(), DataError> {
        let same_counters = self.counters.len() == other.counters.len()
            && self
                .counters
                .iter()
                .zip(&other.counters)
                .all(|(a, b)| a.len() == b.len());
        let same_monitors = self.monitors.len() == other.monitors.len()
            && self
                .monitors
                .iter()
                .zip(&other.monitors)
                .all(|(a, b)| a.len() == b.len());

        if same_counters && same_monitors {
            Ok(())
        } else {
            Err(DataError::ShapeMismatch {
                left: (self.num_counters(), self.num_monitors(), self.num_points()),
                right: (other.num_counters(), other.num_monitors(), other.num_points()),
            })
        }
    }

    fn map_counts(
        &self,
        ctr: impl Fn(&CountSeries) -> CountSeries,
        mon: impl Fn(&CountSeries) -> CountSeries,
    ) -> Data {
        Data {
            axes: self.axes.clone(),
            counters: self.counters.iter().map(ctr).collect(),
            monitors: self.monitors.iter().map(mon).collect(),
        }
    }
}

// -- Scalar arithmetic --
//
// Adding a constant treats it as a number of counts with Poisson error on
// the detectors; monitors stay untouched. Scaling applies to both.

impl Neg for &Data {
    type Output = Data;

    fn neg(self) -> Data {
        self.map_counts(|s| s.scaled(-1.0), |s| s.scaled(-1.0))
    }
}

impl Add<f64> for &Data {
    type Output = Data;

    fn add(self, d: f64) -> Data {
        let d_err = d.abs().sqrt();
        self.map_counts(|s| s.shifted(d, d_err), CountSeries::clone)
    }
}

impl Sub<f64> for &Data {
    type Output = Data;

    fn sub(self, d: f64) -> Data {
        self + (-d)
    }
}

impl Mul<f64> for &Data {
    type Output = Data;

    fn mul(self, d: f64) -> Data {
        self.map_counts(|s| s.scaled(d), |s| s.scaled(d))
    }
}

impl Div<f64> for &Data {
    type Output = Data;

    fn div(self, d: f64) -> Data {
        self * (1.0 / d)
    }
}

// ---------------------------------------------------------------------------
// Dataset – all polarisation channels of one measurement
// ---------------------------------------------------------------------------

/// Collection of [`Data`], one per polarisation channel, in channel order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    channels: Vec<Data>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel(&self, channel: usize) -> Option<&Data> {
        self.channels.get(channel)
    }

    pub fn channels(&self) -> &[Data] {
        &self.channels
    }

    pub fn add_channel(&mut self, data: Data) {
        self.channels.push(data);
    }

    pub fn into_channels(self) -> Vec<Data> {
        self.channels
    }

    /// Channel-wise sum over the channels both datasets have.
    pub fn try_add(&self, other: &Dataset) -> Result<Dataset, DataError> {
        self.zip_channels(other, Data::try_add)
    }

    /// Channel-wise difference over the channels both datasets have.
    pub fn try_sub(&self, other: &Dataset) -> Result<Dataset, DataError> {
        self.zip_channels(other, Data::try_sub)
    }

    fn zip_channels(
        &self,
        other: &Dataset,
        op: impl Fn(&Data, &Data) -> Result<Data, DataError>,
    ) -> Result<Dataset, DataError> {
        let channels = self
            .channels
            .iter()
            .zip(&other.channels)
            .map(|(a, b)| op(a, b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset { channels })
    }

    fn map_channels(&self, op: impl Fn(&Data) -> Data) -> Dataset {
        Dataset {
            channels: self.channels.iter().map(op).collect(),
        }
    }
}

impl FromIterator<Data> for Dataset {
    fn from_iter<I: IntoIterator<Item = Data>>(iter: I) -> Self {
        Dataset {
            channels: iter.into_iter().collect(),
        }
    }
}

impl Neg for &Dataset {
    type Output = Dataset;

    fn neg(self) -> Dataset {
        self.map_channels(|d| -d)
    }
}

impl Add<f64> for &Dataset {
    type Output = Dataset;

    fn add(self, d: f64) -> Dataset {
        self.map_channels(|data| data + d)
    }
}

impl Sub<f64> for &Dataset {
    type Output = Dataset;

    fn sub(self, d: f64) -> Dataset {
        self.map_channels(|data| data - d)
    }
}

impl Mul<f64> for &Dataset {
    type Output = Dataset;

    fn mul(self, d: f64) -> Dataset {
        self.map_channels(|data| data * d)
    }
}

impl Div<f64> for &Dataset {
    type Output = Dataset;

    fn div(self, d: f64) -> Dataset {
        self.map_channels(|data| data / d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(counts: &[f64]) -> Data {
        let mut data = Data::new();
        data.add_axis((0..counts.len()).map(|i| i as f64).collect(), "QH");
        data.add_poisson_counter(counts.to_vec());
        data
    }

    #[test]
    fn test_poisson_error_rule() {
        assert_eq!(poisson_error(0.0), 1.0);
        assert_eq!(poisson_error(4.0), 2.0);
        assert_eq!(poisson_error(1e-9), 1.0);
        assert!((poisson_error(2.0) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_default_axis_names() {
        let mut data = Data::new();
        data.add_axis(vec![1.0], "");
        data.add_axis(vec![2.0], "EN");
        data.add_axis(vec![3.0], "");
        let names: Vec<&str> = data.axes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["ax1", "EN", "ax3"]);
    }

    #[test]
    fn test_add_series_rejects_length_mismatch() {
        let mut data = Data::new();
        assert!(matches!(
            data.add_counter(vec![1.0, 2.0], vec![1.0]),
            Err(DataError::LengthMismatch { values: 2, errors: 1 })
        ));
        assert!(matches!(
            data.add_monitor(vec![1.0], vec![]),
            Err(DataError::LengthMismatch { values: 1, errors: 0 })
        ));
        assert_eq!(data.num_counters(), 0);
        assert_eq!(data.num_monitors(), 0);

        data.add_counter(vec![4.0], vec![3.0]).unwrap();
        assert_eq!(data.counter(0).unwrap().errors, vec![3.0]);
    }

    #[test]
    fn test_num_points_and_consistency() {
        let mut data = channel(&[1.0, 4.0, 9.0]);
        assert_eq!(data.num_points(), 3);
        assert!(data.is_consistent());

        data.add_monitor(vec![1.0], vec![1.0]).unwrap();
        assert!(!data.is_consistent());
    }

    #[test]
    fn test_add_propagates_errors_in_quadrature() {
        let a = channel(&[9.0, 16.0]);
        let b = channel(&[16.0, 9.0]);
        let sum = a.try_add(&b).unwrap();

        let ctr = sum.counter(0).unwrap();
        assert_eq!(ctr.values, vec![25.0, 25.0]);
        assert!((ctr.errors[0] - 5.0).abs() < 1e-12);
        assert!((ctr.errors[1] - 5.0).abs() < 1e-12);
        assert_eq!(sum.axes(), a.axes());
    }

    #[test]
    fn test_sub_keeps_errors_positive() {
        let a = channel(&[9.0]);
        let b = channel(&[16.0]);
        let diff = a.try_sub(&b).unwrap();
        let ctr = diff.counter(0).unwrap();
        assert_eq!(ctr.values, vec![-7.0]);
        assert!((ctr.errors[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_rejects_shape_mismatch() {
        let a = channel(&[1.0, 2.0]);
        let b = channel(&[1.0]);
        assert!(matches!(
            a.try_add(&b),
            Err(DataError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_scalar_ops() {
        let data = channel(&[4.0]);

        let scaled = &data * 2.0;
        assert_eq!(scaled.counter(0).unwrap().values, vec![8.0]);
        assert_eq!(scaled.counter(0).unwrap().errors, vec![4.0]);

        let divided = &data / -2.0;
        assert_eq!(divided.counter(0).unwrap().values, vec![-2.0]);
        assert_eq!(divided.counter(0).unwrap().errors, vec![1.0]);

        let shifted = &data + 9.0;
        assert_eq!(shifted.counter(0).unwrap().values, vec![13.0]);
        assert!((shifted.counter(0).unwrap().errors[0] - 13f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_add_leaves_monitors() {
        let mut data = channel(&[4.0]);
        data.add_monitor(vec![100.0], vec![10.0]).unwrap();
        let shifted = &data - 1.0;
        assert_eq!(shifted.monitor(0).unwrap().values, vec![100.0]);
        assert_eq!(shifted.counter(0).unwrap().values, vec![3.0]);
    }

    #[test]
    fn test_dataset_ops_use_common_channels() {
        let a: Dataset = vec![channel(&[1.0]), channel(&[2.0])].into_iter().collect();
        let b: Dataset = vec![channel(&[3.0])].into_iter().collect();

        let sum = a.try_add(&b).unwrap();
        assert_eq!(sum.num_channels(), 1);
        assert_eq!(sum.channel(0).unwrap().counter(0).unwrap().values, vec![4.0]);

        let neg = -&a;
        assert_eq!(neg.num_channels(), 2);
        assert_eq!(neg.channel(1).unwrap().counter(0).unwrap().values, vec![-2.0]);
    }
}
