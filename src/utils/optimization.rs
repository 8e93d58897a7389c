//! Bounded Nelder-Mead simplex minimisation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop when the spread of objective values (or of the simplex) drops below this.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// A point of the simplex with its cached objective value.
#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

struct Simplex<'a, F> {
    objective: F,
    bounds: Option<&'a [(f64, f64)]>,
    vertices: Vec<Vertex>,
}

impl<'a, F> Simplex<'a, F>
where
    F: Fn(&[f64]) -> f64,
{
    fn new(objective: F, initial: &[f64], bounds: Option<&'a [(f64, f64)]>, step: f64) -> Self {
        let mut simplex = Self {
            objective,
            bounds,
            vertices: Vec::with_capacity(initial.len() + 1),
        };
        let start = simplex.vertex(initial.to_vec());
        simplex.vertices.push(start);
        for i in 0..initial.len() {
            let mut point = initial.to_vec();
            point[i] += if initial[i].abs() > 1e-10 {
                step * initial[i].abs()
            } else {
                step
            };
            let v = simplex.vertex(point);
            simplex.vertices.push(v);
        }
        simplex
    }

    /// Clamp to the bounds and evaluate.
    fn vertex(&self, mut point: Vec<f64>) -> Vertex {
        if let Some(bounds) = self.bounds {
            for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
                *x = x.clamp(lo, hi);
            }
        }
        let value = (self.objective)(&point);
        let value = if value.is_nan() { f64::INFINITY } else { value };
        Vertex { point, value }
    }

    fn sort(&mut self) {
        self.vertices
            .sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
    }

    /// Centroid of every vertex but the worst (the simplex must be sorted).
    fn centroid(&self) -> Vec<f64> {
        let keep = &self.vertices[..self.vertices.len() - 1];
        let mut centroid = vec![0.0; keep[0].point.len()];
        for v in keep {
            for (c, x) in centroid.iter_mut().zip(&v.point) {
                *c += x;
            }
        }
        for c in &mut centroid {
            *c /= keep.len() as f64;
        }
        centroid
    }

    /// Point `centroid + t · (toward - centroid)`.
    fn along(&self, centroid: &[f64], toward: &[f64], t: f64) -> Vertex {
        let point = centroid
            .iter()
            .zip(toward)
            .map(|(c, p)| c + t * (p - c))
            .collect();
        self.vertex(point)
    }

    fn spread(&self, centroid: &[f64]) -> f64 {
        self.vertices
            .iter()
            .map(|v| {
                v.point
                    .iter()
                    .zip(centroid)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }

    fn shrink(&mut self, sigma: f64) {
        let best = self.vertices[0].point.clone();
        for i in 1..self.vertices.len() {
            let point: Vec<f64> = best
                .iter()
                .zip(&self.vertices[i].point)
                .map(|(b, x)| b + sigma * (x - b))
                .collect();
            self.vertices[i] = self.vertex(point);
        }
    }
}

/// Minimise `objective` starting from `initial`.
///
/// Points are clamped into `bounds` (one `(min, max)` pair per dimension)
/// before every evaluation. `NaN` objective values count as `+inf`.
///
/// # Example
/// ```
/// use arima_prophet::utils::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let mut simplex = Simplex::new(objective, initial, bounds, config.initial_step);
    let last = simplex.vertices.len() - 1;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort();

        let best = simplex.vertices[0].value;
        let second_worst = simplex.vertices[last - 1].value;
        let worst = simplex.vertices[last].value;
        let centroid = simplex.centroid();

        if (worst - best).abs() < config.tolerance || simplex.spread(&centroid) < config.tolerance
        {
            converged = true;
            break;
        }

        let worst_point = simplex.vertices[last].point.clone();
        let reflected = simplex.along(&centroid, &worst_point, -config.alpha);

        if reflected.value < best {
            let expanded = simplex.along(&centroid, &reflected.point, config.gamma);
            simplex.vertices[last] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex.vertices[last] = reflected;
            continue;
        }

        let (contracted, threshold) = if reflected.value < worst {
            let outside = simplex.along(&centroid, &reflected.point, config.rho);
            let threshold = reflected.value;
            (outside, threshold)
        } else {
            (simplex.along(&centroid, &worst_point, config.rho), worst)
        };

        if contracted.value < threshold {
            simplex.vertices[last] = contracted;
        } else {
            simplex.shrink(config.sigma);
        }
    }

    simplex.sort();
    let best = simplex.vertices.swap_remove(0);
    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations,
        converged,
    }
}
