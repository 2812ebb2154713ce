//! Classification of continuous values into ordered color classes.
//!
//! The default method is ckmeans: optimal 1-D k-means computed by dynamic
//! programming over the sorted values, which yields Jenks-style natural breaks
//! without any random seeding.

use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use ratatui::style::Color;
use serde::Deserialize;

use crate::palette::Palette;

/// How breakpoints are derived from the data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    #[default]
    NaturalBreaks,
    Quantile,
    EqualInterval,
}

impl Method {
    /// Next method in the cycle used by the `m` key
    pub fn next(self) -> Self {
        match self {
            Method::NaturalBreaks => Method::Quantile,
            Method::Quantile => Method::EqualInterval,
            Method::EqualInterval => Method::NaturalBreaks,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::NaturalBreaks => "natural breaks",
            Method::Quantile => "quantile",
            Method::EqualInterval => "equal interval",
        };
        f.write_str(name)
    }
}

/// Result of classifying a single value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    /// Index into the palette's class colors
    Bucket(usize),
    /// Missing or non-numeric value
    Fallback,
}

/// Threshold scale: `breakpoints[i]` starts class `i + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorScale {
    breakpoints: Vec<f64>,
    palette: Palette,
    method: Method,
}

impl ColorScale {
    /// Build a scale over `values`. Non-finite values are left out of the domain.
    pub fn build(values: &[f64], method: Method, palette: Palette) -> Self {
        let domain: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let classes = palette.len();

        let breakpoints = match method {
            Method::NaturalBreaks => natural_breaks(&domain, classes),
            Method::Quantile => quantile_breaks(&domain, classes),
            Method::EqualInterval => equal_interval_breaks(&domain, classes),
        };

        Self {
            breakpoints,
            palette,
            method,
        }
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Class of a value; a value equal to a breakpoint falls in the class that starts there.
    pub fn classify(&self, value: f64) -> Class {
        if !value.is_finite() {
            return Class::Fallback;
        }
        let idx = self.breakpoints.partition_point(|b| *b <= value);
        Class::Bucket(idx.min(self.palette.len() - 1))
    }

    /// Classify an optional value; `None` is a missing attribute
    pub fn classify_opt(&self, value: Option<f64>) -> Class {
        value.map_or(Class::Fallback, |v| self.classify(v))
    }

    pub fn class_color(&self, class: Class) -> Color {
        match class {
            Class::Bucket(i) => self.palette.classes[i],
            Class::Fallback => self.palette.fallback,
        }
    }

    pub fn color(&self, value: f64) -> Color {
        self.class_color(self.classify(value))
    }

    pub fn color_opt(&self, value: Option<f64>) -> Color {
        self.class_color(self.classify_opt(value))
    }

    /// Number of classes actually reachable with the current breakpoints
    pub fn active_classes(&self) -> usize {
        (self.breakpoints.len() + 1).min(self.palette.len())
    }

    /// Legend rows `(lower, upper, color)`; open ends are `None`.
    /// Classes squeezed empty by repeated breakpoints are left out.
    pub fn legend(&self) -> Vec<(Option<f64>, Option<f64>, Color)> {
        (0..self.active_classes())
            .filter_map(|i| {
                let lower = i.checked_sub(1).map(|j| self.breakpoints[j]);
                let upper = self.breakpoints.get(i).copied();
                if let (Some(lo), Some(hi)) = (lower, upper) {
                    if lo >= hi {
                        return None;
                    }
                }
                Some((lower, upper, self.palette.classes[i]))
            })
            .collect()
    }
}

/// Cluster minimums without the global minimum
fn natural_breaks(domain: &[f64], classes: usize) -> Vec<f64> {
    ckmeans(domain, classes)
        .iter()
        .skip(1)
        .filter_map(|cluster| cluster.first().copied())
        .collect()
}

/// Thresholds at the i/k quantiles (linear interpolation between order statistics)
fn quantile_breaks(domain: &[f64], classes: usize) -> Vec<f64> {
    if domain.is_empty() || classes < 2 {
        return Vec::new();
    }
    let sorted = sorted(domain);
    (1..classes)
        .map(|i| quantile_sorted(&sorted, i as f64 / classes as f64))
        .collect()
}

/// Thresholds splitting `[min, max]` into equal widths
fn equal_interval_breaks(domain: &[f64], classes: usize) -> Vec<f64> {
    if domain.is_empty() || classes < 2 {
        return Vec::new();
    }
    let min = domain.iter().copied().fold(f64::INFINITY, f64::min);
    let max = domain.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (1..classes)
        .map(|i| min + (max - min) * i as f64 / classes as f64)
        .collect()
}

fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Optimal partition of `values` into at most `k` contiguous clusters of the
/// sorted input, minimising the total within-cluster sum of squares.
///
/// `k` is clamped to the number of distinct values, so every returned cluster
/// is non-empty. Clusters come back in ascending order, each sorted.
pub fn ckmeans(values: &[f64], k: usize) -> Vec<Vec<f64>> {
    if values.is_empty() || k == 0 {
        return Vec::new();
    }

    let sorted = sorted(values);
    let n = sorted.len();
    let distinct = 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count();
    let k = k.min(distinct);

    if k == 1 {
        return vec![sorted];
    }

    // Prefix sums for O(1) segment cost, taken around the median so large
    // values that sit close together keep their precision
    let shift = sorted[n / 2];
    let mut sum = vec![0.0; n + 1];
    let mut sum_sq = vec![0.0; n + 1];
    for (i, &v) in sorted.iter().enumerate() {
        let d = v - shift;
        sum[i + 1] = sum[i] + d;
        sum_sq[i + 1] = sum_sq[i] + d * d;
    }
    let ssq = |a: usize, b: usize| -> f64 {
        let len = (b - a + 1) as f64;
        let s = sum[b + 1] - sum[a];
        (sum_sq[b + 1] - sum_sq[a] - s * s / len).max(0.0)
    };

    // cost[c][j]: best cost of splitting sorted[0..=j] into c + 1 clusters
    // start[c][j]: first index of the last cluster in that split
    let mut cost = vec![vec![f64::INFINITY; n]; k];
    let mut start = vec![vec![0usize; n]; k];

    for j in 0..n {
        cost[0][j] = ssq(0, j);
    }

    for c in 1..k {
        for j in c..n {
            let mut best = f64::INFINITY;
            let mut best_m = c;
            for m in c..=j {
                let candidate = cost[c - 1][m - 1] + ssq(m, j);
                if candidate < best {
                    best = candidate;
                    best_m = m;
                }
            }
            cost[c][j] = best;
            start[c][j] = best_m;
        }
    }

    let mut clusters = vec![Vec::new(); k];
    let mut right = n - 1;
    for c in (0..k).rev() {
        let left = start[c][right];
        clusters[c] = sorted[left..=right].to_vec();
        if c > 0 {
            right = left - 1;
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(values: &[f64]) -> ColorScale {
        ColorScale::build(values, Method::NaturalBreaks, Palette::default())
    }

    #[test]
    fn test_ckmeans_separates_obvious_groups() {
        let values = [1.0, 2.0, 1.5, 10.0, 11.0, 10.5, 50.0, 51.0];
        let clusters = ckmeans(&values, 3);
        assert_eq!(clusters, vec![vec![1.0, 1.5, 2.0], vec![10.0, 10.5, 11.0], vec![50.0, 51.0]]);
    }

    #[test]
    fn test_ckmeans_keeps_precision_for_large_values() {
        let base = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        let offset = 1e9;
        let shifted: Vec<f64> = base.iter().map(|v| v + offset).collect();

        let expected = ckmeans(&base, 2);
        assert_eq!(expected, vec![vec![0.0, 1.0, 2.0], vec![10.0, 11.0, 12.0]]);

        let clusters = ckmeans(&shifted, 2);
        let unshifted: Vec<Vec<f64>> = clusters
            .iter()
            .map(|c| c.iter().map(|v| v - offset).collect())
            .collect();
        assert_eq!(unshifted, expected);
    }

    #[test]
    fn test_ckmeans_clamps_to_distinct_values() {
        let clusters = ckmeans(&[3.0, 3.0, 7.0], 5);
        assert_eq!(clusters, vec![vec![3.0, 3.0], vec![7.0]]);
    }

    #[test]
    fn test_ckmeans_single_value_and_empty() {
        assert_eq!(ckmeans(&[4.0, 4.0, 4.0], 5), vec![vec![4.0, 4.0, 4.0]]);
        assert!(ckmeans(&[], 5).is_empty());
    }

    #[test]
    fn test_three_values_two_breakpoints() {
        let s = scale(&[10.0, 20.0, 100.0]);
        assert_eq!(s.breakpoints(), &[20.0, 100.0]);
        assert_eq!(s.classify(10.0), Class::Bucket(0));
        assert_eq!(s.classify(20.0), Class::Bucket(1));
        assert_eq!(s.classify(100.0), Class::Bucket(2));
        assert_eq!(s.active_classes(), 3);
    }

    #[test]
    fn test_five_breaks_from_spread_data() {
        let values = [1.0, 2.0, 20.0, 21.0, 40.0, 41.0, 60.0, 61.0, 80.0, 81.0];
        let s = scale(&values);
        assert_eq!(s.breakpoints(), &[20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_breakpoints_non_decreasing() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 37) % 101) as f64 * 0.7).collect();
        for method in [Method::NaturalBreaks, Method::Quantile, Method::EqualInterval] {
            let s = ColorScale::build(&values, method, Palette::default());
            assert!(s.breakpoints().windows(2).all(|w| w[0] <= w[1]), "{method}");
            assert!(s.breakpoints().len() <= 4);
        }
    }

    #[test]
    fn test_boundary_goes_to_upper_class() {
        let s = scale(&[1.0, 2.0, 20.0, 21.0, 40.0, 41.0, 60.0, 61.0, 80.0, 81.0]);
        for (i, b) in s.breakpoints().iter().enumerate() {
            assert_eq!(s.classify(*b), Class::Bucket(i + 1));
            assert_eq!(s.classify(b - 1e-9), Class::Bucket(i));
        }
    }

    #[test]
    fn test_coverage_and_fallback() {
        let s = scale(&[5.0, 15.0, 25.0, 35.0, 45.0, 55.0]);
        for v in [-1000.0, 0.0, 5.0, 17.3, 44.9, 1e9] {
            assert!(matches!(s.classify(v), Class::Bucket(i) if i < 5));
        }
        assert_eq!(s.classify(f64::NAN), Class::Fallback);
        assert_eq!(s.classify_opt(None), Class::Fallback);
        assert_eq!(s.color_opt(None), Color::Rgb(0xCC, 0xCC, 0xCC));
        assert_eq!(s.color(0.0), Color::Rgb(0xD4, 0xB9, 0xDA));
    }

    #[test]
    fn test_nan_excluded_from_domain() {
        let with_nan = scale(&[10.0, f64::NAN, 20.0, 100.0]);
        let without = scale(&[10.0, 20.0, 100.0]);
        assert_eq!(with_nan.breakpoints(), without.breakpoints());
    }

    #[test]
    fn test_degenerate_all_equal() {
        let s = scale(&[7.0, 7.0, 7.0]);
        assert!(s.breakpoints().is_empty());
        assert_eq!(s.classify(7.0), Class::Bucket(0));
        assert_eq!(s.legend().len(), 1);
    }

    #[test]
    fn test_deterministic_rebuild() {
        let values = [3.2, 8.8, 1.1, 9.9, 4.4, 6.1, 7.7, 2.0, 5.5];
        let a = scale(&values);
        let b = scale(&values);
        assert_eq!(a.breakpoints(), b.breakpoints());
        for v in values {
            assert_eq!(a.color(v), b.color(v));
        }
    }

    #[test]
    fn test_quantile_and_equal_interval() {
        let values = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        let q = ColorScale::build(&values, Method::Quantile, Palette::default());
        assert_eq!(q.breakpoints(), &[10.0, 20.0, 30.0, 40.0]);

        let e = ColorScale::build(&[0.0, 100.0, 35.0], Method::EqualInterval, Palette::default());
        assert_eq!(e.breakpoints(), &[20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_legend_ranges() {
        let s = scale(&[10.0, 20.0, 100.0]);
        let legend = s.legend();
        assert_eq!(legend.len(), 3);
        assert_eq!((legend[0].0, legend[0].1), (None, Some(20.0)));
        assert_eq!((legend[1].0, legend[1].1), (Some(20.0), Some(100.0)));
        assert_eq!((legend[2].0, legend[2].1), (Some(100.0), None));
    }

    #[test]
    fn test_legend_skips_empty_quantile_classes() {
        let s = ColorScale::build(&[20.0, 20.0, 20.0, 20.0, 20.0, 100.0], Method::Quantile, Palette::default());
        assert_eq!(s.breakpoints(), &[20.0, 20.0, 20.0, 20.0]);

        let classes = Palette::default().classes;
        assert_eq!(
            s.legend(),
            vec![(None, Some(20.0), classes[0]), (Some(20.0), None, classes[4])]
        );
        // Legend colors are the ones values actually get
        assert_eq!(s.color(20.0), classes[4]);
        assert_eq!(s.color(100.0), classes[4]);
        assert_eq!(s.color(5.0), classes[0]);
    }

    #[test]
    fn test_method_cycle() {
        assert_eq!(Method::NaturalBreaks.next().next().next(), Method::NaturalBreaks);
    }
}
