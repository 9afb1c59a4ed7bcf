//! Regression with ARIMA(1,1,1) errors: the statistical model behind the
//! interval forecaster.
//!
//! ```text
//! y_t = beta * x_t + u_t,      u_t ~ ARIMA(1,1,1)
//!
//! differenced:  w_t = dy_t - beta * dx_t
//!               w_t = phi * w_{t-1} + e_t + theta * e_{t-1}
//! ```
//!
//! `y` is the gap in days and `x` the recall point. Coefficients are fitted
//! by minimising the conditional sum of squares (CSS) with the first
//! innovation conditioned to zero. `phi` and `theta` are searched through a
//! scaled `tanh` reparametrisation so the fit stays stationary and invertible.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::optimize::NelderMead;

/// Smallest series the fitter accepts.
pub const MIN_SAMPLES: usize = 5;

/// Largest magnitude allowed for `phi` and `theta`.
const BOUND: f64 = 0.995;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArimaxCoefficients {
    /// Exogenous regression weight.
    pub beta: f64,
    /// AR(1) weight on the differenced errors.
    pub phi: f64,
    /// MA(1) weight on the previous innovation.
    pub theta: f64,
    /// Innovation variance estimate.
    pub sigma2: f64,
}

/// A fitted model plus the filter state needed for the next one-step forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaxModel {
    pub coefficients: ArimaxCoefficients,
    /// Last observed gap.
    pub last_level: f64,
    /// Last observed recall point.
    pub last_exog: f64,
    /// Last differenced regression error `w_T`.
    pub last_error: f64,
    /// Last innovation `e_T`.
    pub last_innovation: f64,
}

/// Diagnostics produced alongside a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub samples: usize,
    pub css: f64,
    pub mae: f64,
    pub iterations: usize,
}

struct Filtered {
    errors: Vec<f64>,
    innovations: Vec<f64>,
    css: f64,
}

fn filter(y: &[f64], x: &[f64], beta: f64, phi: f64, theta: f64) -> Filtered {
    let m = y.len().saturating_sub(1);
    let mut errors = Vec::with_capacity(m);
    for k in 0..m {
        errors.push((y[k + 1] - y[k]) - beta * (x[k + 1] - x[k]));
    }

    let mut innovations = vec![0.0; m];
    let mut css = 0.0;
    for k in 1..m {
        let e = errors[k] - phi * errors[k - 1] - theta * innovations[k - 1];
        innovations[k] = e;
        css += e * e;
    }

    Filtered { errors, innovations, css }
}

/// Map an unconstrained search coordinate into (-BOUND, BOUND).
fn bounded(v: f64) -> f64 {
    BOUND * v.tanh()
}

fn ols_slope(y: &[f64], x: &[f64]) -> f64 {
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for k in 1..y.len() {
        let dx = x[k] - x[k - 1];
        sxy += dx * (y[k] - y[k - 1]);
        sxx += dx * dx;
    }
    if sxx > 1e-12 { sxy / sxx } else { 0.0 }
}

impl ArimaxModel {
    /// Fit on a gap series `y` with its exogenous series `x`.
    pub fn fit(y: &[f64], x: &[f64]) -> Result<(Self, FitSummary), ModelError> {
        let n = y.len().min(x.len());
        if n < MIN_SAMPLES {
            return Err(ModelError::InsufficientData { needed: MIN_SAMPLES, got: n });
        }
        let (y, x) = (&y[..n], &x[..n]);
        if y.iter().chain(x).any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        let start = [ols_slope(y, x), 0.0, 0.0];
        let objective = |p: &[f64]| filter(y, x, p[0], bounded(p[1]), bounded(p[2])).css;
        let min = NelderMead::default().minimize(objective, &start);

        let (beta, phi, theta) = (min.point[0], bounded(min.point[1]), bounded(min.point[2]));
        let f = filter(y, x, beta, phi, theta);
        let terms = (n - 2) as f64;
        let coefficients = ArimaxCoefficients {
            beta,
            phi,
            theta,
            sigma2: f.css / terms,
        };
        if [beta, phi, theta, coefficients.sigma2].iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        // One-step in-sample error of gap k + 1 is the innovation e_k.
        let abs_sum: f64 = f.innovations.iter().skip(1).map(|e| e.abs()).sum();

        let model = ArimaxModel {
            coefficients,
            last_level: y[n - 1],
            last_exog: x[n - 1],
            last_error: f.errors[f.errors.len() - 1],
            last_innovation: f.innovations[f.innovations.len() - 1],
        };
        let summary = FitSummary {
            samples: n,
            css: f.css,
            mae: abs_sum / terms,
            iterations: min.iterations,
        };
        Ok((model, summary))
    }

    /// One-step-ahead forecast of the next gap given its exogenous value.
    pub fn forecast_one(&self, next_exog: f64) -> f64 {
        let c = &self.coefficients;
        self.last_level
            + c.beta * (next_exog - self.last_exog)
            + c.phi * self.last_error
            + c.theta * self.last_innovation
    }
}
