//! Derivative-free minimisation (Nelder-Mead simplex).
//!
//! Used to fit forecaster coefficients by conditional sum of squares. The
//! objective may return NaN for pathological points; those are treated as
//! +inf so the simplex moves away from them.

#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    pub max_iter: usize,
    /// Relative spread of objective values across the simplex allowed at convergence.
    pub tolerance: f64,
    /// Largest coordinate distance from the best vertex allowed at convergence.
    pub x_tolerance: f64,
    /// Offset applied to each coordinate to build the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iter: 2_000,
            tolerance: 1e-12,
            x_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

fn eval<F: Fn(&[f64]) -> f64>(f: &F, x: &[f64]) -> f64 {
    let v = f(x);
    if v.is_nan() { f64::INFINITY } else { v }
}

/// `a + t * (b - a)` componentwise.
fn lerp(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(ai, bi)| ai + t * (bi - ai)).collect()
}

impl NelderMead {
    /// Both the values and the vertices must have collapsed. Equal values
    /// alone also occur when the simplex straddles the minimum.
    fn converged(&self, simplex: &[(Vec<f64>, f64)]) -> bool {
        let (best_point, best) = (&simplex[0].0, simplex[0].1);
        let value_spread = simplex
            .iter()
            .skip(1)
            .map(|(_, v)| (v - best).abs())
            .fold(0.0, f64::max);
        if !(value_spread <= self.tolerance * (1.0 + best.abs())) {
            return false;
        }
        let point_spread = simplex
            .iter()
            .skip(1)
            .flat_map(|(p, _)| p.iter().zip(best_point).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        point_spread <= self.x_tolerance
    }

    pub fn minimize<F: Fn(&[f64]) -> f64>(&self, f: F, x0: &[f64]) -> Minimum {
        let n = x0.len();
        if n == 0 {
            return Minimum { point: vec![], value: eval(&f, x0), iterations: 0 };
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((x0.to_vec(), eval(&f, x0)));
        for i in 0..n {
            let mut p = x0.to_vec();
            p[i] += if p[i].abs() > 1e-8 { self.initial_step * p[i].abs().max(1.0) } else { self.initial_step };
            let v = eval(&f, &p);
            simplex.push((p, v));
        }

        let mut iterations = 0;
        while iterations < self.max_iter {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            if self.converged(&simplex) {
                break;
            }
            iterations += 1;

            // Centroid of all but the worst vertex.
            let mut centroid = vec![0.0; n];
            for (p, _) in simplex.iter().take(n) {
                for (c, pi) in centroid.iter_mut().zip(p) {
                    *c += pi / n as f64;
                }
            }

            let worst_point = simplex[n].0.clone();
            let worst = simplex[n].1;
            let reflected = lerp(&centroid, &worst_point, -REFLECT);
            let fr = eval(&f, &reflected);

            if fr < simplex[0].1 {
                let expanded = lerp(&centroid, &worst_point, -EXPAND);
                let fe = eval(&f, &expanded);
                simplex[n] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
                continue;
            }

            if fr < simplex[n - 1].1 {
                simplex[n] = (reflected, fr);
                continue;
            }

            // Contract towards the better of the worst and reflected points.
            let (toward, f_toward) = if fr < worst { (reflected, fr) } else { (worst_point, worst) };
            let contracted = lerp(&centroid, &toward, CONTRACT);
            let fc = eval(&f, &contracted);
            if fc < f_toward {
                simplex[n] = (contracted, fc);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                let p = lerp(&anchor, &vertex.0, SHRINK);
                let v = eval(&f, &p);
                *vertex = (p, v);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (point, value) = simplex.swap_remove(0);
        Minimum { point, value, iterations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_quadratic_bowl_minimum() {
        let nm = NelderMead::default();
        let min = nm.minimize(|x| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.5).powi(2), &[0.0, 0.0]);
        assert!((min.point[0] - 3.0).abs() < 1e-4, "{:?}", min.point);
        assert!((min.point[1] + 1.5).abs() < 1e-4, "{:?}", min.point);
        assert!(min.value < 1e-8);
    }

    #[test]
    fn rosenbrock_converges() {
        let nm = NelderMead { max_iter: 10_000, ..Default::default() };
        let min = nm.minimize(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.2, 1.0],
        );
        assert!((min.point[0] - 1.0).abs() < 1e-3, "{:?}", min.point);
        assert!((min.point[1] - 1.0).abs() < 1e-3, "{:?}", min.point);
    }

    #[test]
    fn nan_regions_are_avoided() {
        let nm = NelderMead::default();
        let min = nm.minimize(|x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 2.0).powi(2) }, &[1.0]);
        assert!((min.point[0] - 2.0).abs() < 1e-4, "{:?}", min);
    }

    #[test]
    fn equal_values_either_side_of_minimum_do_not_stop_the_search() {
        // Initial vertices -1 and 1 score the same.
        let nm = NelderMead { initial_step: 2.0, ..Default::default() };
        let min = nm.minimize(|x| x[0] * x[0], &[-1.0]);
        assert!(min.iterations > 0);
        assert!(min.point[0].abs() < 1e-6, "{:?}", min);

        let min = nm.minimize(|x| (x[0] - 2.0).powi(2), &[1.9]);
        assert!((min.point[0] - 2.0).abs() < 1e-6, "{:?}", min);
    }
}
