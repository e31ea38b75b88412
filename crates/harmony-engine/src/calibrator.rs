//! Score calibration: Platt scaling, isotonic regression (PAVA), and the
//! identity fallback, gated by empirical quality checks (§4.8).
//!
//! Fitting never fails: a candidate mapping that does not clear the gates
//! is rejected in favor of the identity fallback, with `passed_gates` on
//! the returned `CalibrationMapping` recording which happened.

use harmony_config::CalibrationGates;
use log::warn;
use serde::{Deserialize, Serialize};

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn mean(xs: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = xs.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    xs.iter().sum::<f64>() / n
}

fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    mean(&xs.iter().map(|x| (x - m).powi(2)).collect::<Vec<_>>())
}

fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let mx = mean(xs);
    let my = mean(ys);
    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let sx = xs.iter().map(|x| (x - mx).powi(2)).sum::<f64>().sqrt();
    let sy = ys.iter().map(|y| (y - my).powi(2)).sum::<f64>().sqrt();
    if sx <= 0.0 || sy <= 0.0 {
        0.0
    } else {
        cov / (sx * sy)
    }
}

/// Expected calibration error over equal-width bins of the raw score.
#[must_use]
pub fn expected_calibration_error(scores: &[f64], targets: &[f64], bins: usize) -> f64 {
    if scores.is_empty() || bins == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = scores.len() as f64;
    let mut bin_score_sum = vec![0.0; bins];
    let mut bin_target_sum = vec![0.0; bins];
    let mut bin_count = vec![0usize; bins];

    for (&s, &t) in scores.iter().zip(targets) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = ((s.clamp(0.0, 1.0) * bins as f64) as usize).min(bins - 1);
        bin_score_sum[idx] += s;
        bin_target_sum[idx] += t;
        bin_count[idx] += 1;
    }

    let mut ece = 0.0;
    for i in 0..bins {
        if bin_count[i] == 0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = bin_count[i] as f64;
        let avg_score = bin_score_sum[i] / count;
        let avg_target = bin_target_sum[i] / count;
        ece += (count / n) * (avg_score - avg_target).abs();
    }
    ece
}

/// Mean squared error between predicted scores and binary/graded targets.
#[must_use]
pub fn brier_score(scores: &[f64], targets: &[f64]) -> f64 {
    mean(&scores.iter().zip(targets).map(|(s, t)| (s - t).powi(2)).collect::<Vec<_>>())
}

fn bin_means(scores: &[f64], targets: &[f64], bins: usize) -> Vec<f64> {
    let mut sums = vec![0.0; bins];
    let mut counts = vec![0usize; bins];
    for (&s, &t) in scores.iter().zip(targets) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = ((s.clamp(0.0, 1.0) * bins as f64) as usize).min(bins - 1);
        sums[idx] += t;
        counts[idx] += 1;
    }
    sums.iter()
        .zip(&counts)
        .filter(|(_, &c)| c > 0)
        .map(|(&s, &c)| {
            #[allow(clippy::cast_precision_loss)]
            let c = c as f64;
            s / c
        })
        .collect()
}

fn monotonicity_violation_fraction(scores: &[f64], targets: &[f64], bins: usize) -> f64 {
    let means = bin_means(scores, targets, bins);
    if means.len() < 2 {
        return 0.0;
    }
    let violations = means.windows(2).filter(|w| w[1] < w[0]).count();
    #[allow(clippy::cast_precision_loss)]
    {
        violations as f64 / (means.len() - 1) as f64
    }
}

/// Fit a Platt (logistic) mapping `p = sigmoid(a * raw + b)` via fixed-count
/// Newton-Raphson iterations on the binomial log-likelihood.
fn fit_platt(scores: &[f64], targets: &[f64]) -> (f64, f64) {
    let mut a = 1.0_f64;
    let mut b = 0.0_f64;

    for _ in 0..100 {
        let mut grad_a = 0.0;
        let mut grad_b = 0.0;
        let mut hess_aa = 0.0;
        let mut hess_ab = 0.0;
        let mut hess_bb = 0.0;

        for (&s, &t) in scores.iter().zip(targets) {
            let p = sigmoid(a * s + b);
            let residual = p - t;
            grad_a += residual * s;
            grad_b += residual;
            let w = (p * (1.0 - p)).max(1e-6);
            hess_aa += w * s * s;
            hess_ab += w * s;
            hess_bb += w;
        }

        let det = hess_aa * hess_bb - hess_ab * hess_ab;
        if det.abs() < 1e-12 {
            break;
        }
        let delta_a = (grad_a * hess_bb - grad_b * hess_ab) / det;
        let delta_b = (grad_b * hess_aa - grad_a * hess_ab) / det;
        a -= delta_a;
        b -= delta_b;
        if delta_a.abs() < 1e-9 && delta_b.abs() < 1e-9 {
            break;
        }
    }

    (a, b)
}

/// Fit an isotonic (monotonic, piecewise-linear) mapping via the pool
/// adjacent violators algorithm.
fn fit_isotonic(scores: &[f64], targets: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = scores.iter().copied().zip(targets.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let mut ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let mut weights: Vec<f64> = vec![1.0; ys.len()];

    let mut i = 0;
    while i + 1 < ys.len() {
        if ys[i] > ys[i + 1] {
            let pooled = (ys[i] * weights[i] + ys[i + 1] * weights[i + 1]) / (weights[i] + weights[i + 1]);
            ys[i] = pooled;
            weights[i] += weights[i + 1];
            ys.remove(i + 1);
            weights.remove(i + 1);
            xs.remove(i + 1);
            if i > 0 {
                i -= 1;
            }
        } else {
            i += 1;
        }
    }

    (xs, ys)
}

fn isotonic_apply(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if xs.is_empty() {
        return x.clamp(0.0, 1.0);
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= *xs.last().expect("non-empty") {
        return *ys.last().expect("non-empty");
    }
    for w in xs.windows(2).zip(ys.windows(2)) {
        let (xw, yw) = w;
        if x >= xw[0] && x <= xw[1] {
            let span = xw[1] - xw[0];
            let t = if span.abs() < 1e-12 { 0.0 } else { (x - xw[0]) / span };
            return yw[0] + t * (yw[1] - yw[0]);
        }
    }
    *ys.last().expect("non-empty")
}

/// A fitted calibration mapping for a single track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalibrationMethod {
    /// `p = sigmoid(a * raw + b)`.
    Platt { a: f64, b: f64 },
    /// Piecewise-linear monotonic mapping over `(raw, calibrated)` knots.
    Isotonic { xs: Vec<f64>, ys: Vec<f64> },
    /// No transformation; the raw score is already well-calibrated or too
    /// little data was available to fit anything else.
    Identity,
}

impl CalibrationMethod {
    /// Apply this mapping to a raw score, clamping the result to `[0, 1]`.
    #[must_use]
    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            CalibrationMethod::Platt { a, b } => sigmoid(a * raw + b),
            CalibrationMethod::Isotonic { xs, ys } => isotonic_apply(xs, ys, raw).clamp(0.0, 1.0),
            CalibrationMethod::Identity => raw.clamp(0.0, 1.0),
        }
    }
}

/// A fitted mapping plus the diagnostics that justified accepting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMapping {
    /// The track this mapping was fit for.
    pub track: String,
    /// The accepted mapping (possibly the identity fallback).
    pub method: CalibrationMethod,
    /// Number of (score, target) samples used to fit this mapping.
    pub sample_count: usize,
    /// Pearson correlation between raw score and target.
    pub correlation: f64,
    /// Whether a non-identity mapping cleared every quality gate.
    pub passed_gates: bool,
    /// ECE of the raw scores, before calibration.
    pub ece_before: f64,
    /// ECE of the calibrated scores, after applying `method`.
    pub ece_after: f64,
    /// Brier score of the raw scores, before calibration.
    pub brier_before: f64,
    /// Brier score of the calibrated scores, after applying `method`.
    pub brier_after: f64,
}

/// Which family of calibration mapping to attempt fitting first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMethodKind {
    Platt,
    Isotonic,
}

impl CalibrationMethodKind {
    const fn other(self) -> Self {
        match self {
            CalibrationMethodKind::Platt => CalibrationMethodKind::Isotonic,
            CalibrationMethodKind::Isotonic => CalibrationMethodKind::Platt,
        }
    }
}

fn fit_method(kind: CalibrationMethodKind, scores: &[f64], targets: &[f64]) -> CalibrationMethod {
    match kind {
        CalibrationMethodKind::Platt => {
            let (a, b) = fit_platt(scores, targets);
            CalibrationMethod::Platt { a, b }
        }
        CalibrationMethodKind::Isotonic => {
            let (xs, ys) = fit_isotonic(scores, targets);
            CalibrationMethod::Isotonic { xs, ys }
        }
    }
}

/// Try fitting `kind` and evaluate it against the ECE-regression and (for
/// isotonic) monotonicity gates. Returns `None` if either fails.
fn try_fit(
    kind: CalibrationMethodKind,
    scores: &[f64],
    targets: &[f64],
    gates: &CalibrationGates,
    ece_before: f64,
) -> Option<(CalibrationMethod, f64, f64)> {
    let method = fit_method(kind, scores, targets);
    let calibrated: Vec<f64> = scores.iter().map(|&s| method.apply(s)).collect();
    let ece_after = expected_calibration_error(&calibrated, targets, gates.ece_bins);
    let brier_after = brier_score(&calibrated, targets);

    if ece_after > ece_before + gates.max_ece_regression {
        return None;
    }
    if kind == CalibrationMethodKind::Isotonic {
        let violation = monotonicity_violation_fraction(&calibrated, targets, gates.ece_bins);
        if violation > gates.max_monotonicity_violation_fraction {
            return None;
        }
    }
    Some((method, ece_after, brier_after))
}

/// Fit a calibration mapping for `track`. Attempts `preferred` first; if it
/// fails a gate, attempts the other method; if both fail, falls back to the
/// identity mapping. Never fails: fitting always returns a usable mapping,
/// with `passed_gates` recording whether a non-identity method was admitted
/// (§4.8, §8 "Calibrator quality-gate safety").
#[must_use]
pub fn fit_calibration(
    track: &str,
    scores: &[f64],
    targets: &[f64],
    preferred: CalibrationMethodKind,
    gates: &CalibrationGates,
) -> CalibrationMapping {
    let ece_before = expected_calibration_error(scores, targets, gates.ece_bins);
    let brier_before = brier_score(scores, targets);
    let correlation = pearson_correlation(scores, targets);

    if scores.len() < gates.min_sample_count {
        warn!(
            "track '{track}': only {} samples (< {}), using identity calibration",
            scores.len(),
            gates.min_sample_count
        );
        return identity_mapping(track, scores, correlation, ece_before, brier_before);
    }
    if variance(targets) < gates.min_target_variance {
        warn!("track '{track}': target variance below gate, using identity calibration");
        return identity_mapping(track, scores, correlation, ece_before, brier_before);
    }
    if correlation.abs() < gates.min_abs_correlation {
        warn!("track '{track}': |correlation| below gate, using identity calibration");
        return identity_mapping(track, scores, correlation, ece_before, brier_before);
    }

    let admitted = try_fit(preferred, scores, targets, gates, ece_before)
        .or_else(|| try_fit(preferred.other(), scores, targets, gates, ece_before));

    match admitted {
        Some((method, ece_after, brier_after)) => CalibrationMapping {
            track: track.to_string(),
            method,
            sample_count: scores.len(),
            correlation,
            passed_gates: true,
            ece_before,
            ece_after,
            brier_before,
            brier_after,
        },
        None => {
            warn!("track '{track}': no mapping cleared the quality gates, using identity calibration");
            identity_mapping(track, scores, correlation, ece_before, brier_before)
        }
    }
}

fn identity_mapping(track: &str, scores: &[f64], correlation: f64, ece_before: f64, brier_before: f64) -> CalibrationMapping {
    CalibrationMapping {
        track: track.to_string(),
        method: CalibrationMethod::Identity,
        sample_count: scores.len(),
        correlation,
        passed_gates: false,
        ece_before,
        ece_after: ece_before,
        brier_before,
        brier_after: brier_before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use harmony_config::CALIBRATION_GATES;

    #[test]
    fn test_identity_apply() {
        assert_relative_eq!(CalibrationMethod::Identity.apply(0.7), 0.7);
    }

    #[test]
    fn test_brier_perfect_predictions() {
        assert_relative_eq!(brier_score(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_ece_zero_when_perfectly_calibrated_bins() {
        let scores = vec![0.1, 0.1, 0.9, 0.9];
        let targets = vec![0.1, 0.1, 0.9, 0.9];
        assert_relative_eq!(expected_calibration_error(&scores, &targets, 10), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_calibration_falls_back_with_few_samples() {
        let scores = vec![0.3, 0.6];
        let targets = vec![0.0, 1.0];
        let mapping = fit_calibration("functional", &scores, &targets, CalibrationMethodKind::Platt, &CALIBRATION_GATES);
        assert_eq!(mapping.method, CalibrationMethod::Identity);
        assert!(!mapping.passed_gates);
    }

    #[test]
    fn test_fit_isotonic_monotonic_output() {
        let scores: Vec<f64> = (0..60).map(|i| f64::from(i) / 60.0).collect();
        let targets: Vec<f64> = scores.iter().map(|s| if *s > 0.5 { 1.0 } else { 0.0 }).collect();
        let mapping = fit_calibration("functional", &scores, &targets, CalibrationMethodKind::Isotonic, &CALIBRATION_GATES);
        if let CalibrationMethod::Isotonic { ys, .. } = &mapping.method {
            assert!(ys.windows(2).all(|w| w[1] >= w[0] - 1e-9));
            assert!(mapping.passed_gates);
        }
    }

    #[test]
    fn test_fit_platt_improves_or_maintains_ece() {
        let scores: Vec<f64> = (0..80).map(|i| f64::from(i) / 80.0).collect();
        let targets: Vec<f64> = scores.iter().map(|s| if *s > 0.5 { 1.0 } else { 0.0 }).collect();
        let mapping = fit_calibration("functional", &scores, &targets, CalibrationMethodKind::Platt, &CALIBRATION_GATES);
        assert!(mapping.ece_after <= mapping.ece_before + CALIBRATION_GATES.max_ece_regression);
    }

    #[test]
    fn test_fit_calibration_never_errors_on_pathological_input() {
        let scores = vec![0.5; 60];
        let targets = vec![0.5; 60];
        let mapping = fit_calibration("modal", &scores, &targets, CalibrationMethodKind::Platt, &CALIBRATION_GATES);
        assert_eq!(mapping.method, CalibrationMethod::Identity);
        assert!(!mapping.passed_gates);
    }
}
