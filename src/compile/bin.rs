//! Fixed-width binning.
//!
//! Buckets are half-open `[start, start + step)` intervals aligned to
//! multiples of `step`, labelled `[start-end]`.

use crate::grammar::Value;

/// Slack for bucket index computation, absorbing float drift at bucket edges.
const EPSILON: f64 = 1e-9;

/// Upper bound on step widenings while fitting `maxbins`.
const MAX_WIDENINGS: usize = 64;

/// Chosen bucket width and alignment for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    /// Bucket width.
    pub step: f64,
    /// Lower edge of the first bucket.
    pub start: f64,
}

impl Binning {
    /// Fit buckets over the finite numbers in `values`.
    ///
    /// Uses `step` when given, otherwise the smallest nice width whose aligned
    /// buckets number at most `maxbins`. A range straddling zero always needs
    /// two buckets. Returns `None` when no value is a finite number.
    #[must_use]
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a Value>, step: Option<f64>, maxbins: usize) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter_map(Value::as_f64)
            .filter(|n| n.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, n| match acc {
                None => Some((n, n)),
                Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
            })?;
        let Some(step) = step else {
            let mut bins = Self::aligned(min, nice_step(max - min, maxbins));
            for _ in 0..MAX_WIDENINGS {
                // Past the magnitude of both ends the alignment no longer moves.
                if bins.bucket_count(max) <= maxbins.max(1) || bins.step > min.abs().max(max.abs()) {
                    break;
                }
                bins = Self::aligned(min, widen(bins.step));
            }
            return Some(bins);
        };
        Some(Self::aligned(min, step))
    }

    fn aligned(min: f64, step: f64) -> Self {
        let start = (min / step + EPSILON).floor() * step;
        Self {
            step,
            start: round_to_step(start, step),
        }
    }

    /// Number of buckets from `start` up to the one holding `max`.
    #[must_use]
    pub fn bucket_count(&self, max: f64) -> usize {
        ((max - self.start) / self.step + EPSILON).floor().max(0.0) as usize + 1
    }

    /// Bucket label for a value; non-numbers map to null.
    #[must_use]
    pub fn label(&self, value: &Value) -> Value {
        let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
            return Value::Null;
        };
        let index = ((n - self.start) / self.step + EPSILON).floor();
        let lo = round_to_step(self.start + index * self.step, self.step);
        let hi = round_to_step(lo + self.step, self.step);
        Value::String(format!("[{lo}-{hi}]"))
    }
}

/// Smallest width of the form 1, 2 or 5 × 10^k with `ceil(span / width) <= maxbins`.
#[must_use]
pub fn nice_step(span: f64, maxbins: usize) -> f64 {
    let maxbins = maxbins.max(1) as f64;
    if !(span.is_finite() && span > 0.0) {
        return 1.0;
    }
    let level = maxbins.log10().ceil();
    let mut step = 10f64.powf(span.log10().round() - level);
    while (span / step).ceil() > maxbins {
        step *= 10.0;
    }
    for divisor in [5.0, 2.0] {
        let candidate = step / divisor;
        if (span / candidate).ceil() <= maxbins {
            return candidate;
        }
    }
    step
}

/// Next nice width above `step`: 1 -> 2 -> 5 -> 10.
fn widen(step: f64) -> f64 {
    let scale = 10f64.powf(step.log10().floor());
    let mantissa = (step / scale).round();
    if mantissa < 2.0 {
        2.0 * scale
    } else if mantissa < 5.0 {
        5.0 * scale
    } else {
        10.0 * scale
    }
}

/// Round `x` to the decimal precision of `step`, removing float drift.
fn round_to_step(x: f64, step: f64) -> f64 {
    let decimals = (-step.log10().floor()).max(0.0) as i32 + 1;
    let scale = 10f64.powi(decimals);
    let rounded = (x * scale).round() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
