//! Policy vector helpers shared by both search engines and self-play.

use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::search::SearchError;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let mut out: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = out.iter().sum();
    for p in &mut out {
        *p /= sum;
    }
    out
}

/// Zero illegal entries, then renormalize in place.
///
/// Fails if the shapes disagree or no probability mass is left on legal
/// actions.
pub fn mask_and_normalize(policy: &mut [f32], valid: &[bool]) -> Result<(), SearchError> {
    if policy.len() != valid.len() {
        return Err(SearchError::MaskShape {
            expected: policy.len(),
            actual: valid.len(),
        });
    }

    for (p, &legal) in policy.iter_mut().zip(valid) {
        if !legal {
            *p = 0.0;
        }
    }

    let sum: f32 = policy.iter().sum();
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(SearchError::DegeneratePolicy);
    }
    for p in policy.iter_mut() {
        *p /= sum;
    }
    Ok(())
}

/// Draw a Dirichlet(alpha, ..., alpha) sample of length `n` from Gamma variates.
pub fn dirichlet_noise<R: Rng + ?Sized>(
    n: usize,
    alpha: f32,
    rng: &mut R,
) -> Result<Vec<f32>, SearchError> {
    let gamma = Gamma::new(alpha as f64, 1.0).map_err(|e| {
        SearchError::InvalidConfig(format!("dirichlet_alpha {}: {}", alpha, e))
    })?;
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    } else if n > 0 {
        // Every variate underflowed; fall back to the symmetric mean
        samples.fill(1.0 / n as f32);
    }
    Ok(samples)
}

/// Mix root noise into a prior: `(1 - epsilon) * p + epsilon * noise`.
pub fn apply_root_noise<R: Rng + ?Sized>(
    policy: &mut [f32],
    alpha: f32,
    epsilon: f32,
    rng: &mut R,
) -> Result<(), SearchError> {
    let noise = dirichlet_noise(policy.len(), alpha, rng)?;
    for (p, n) in policy.iter_mut().zip(noise) {
        *p = (1.0 - epsilon) * *p + epsilon * n;
    }
    Ok(())
}

/// Normalize visit counts into a distribution over the action space.
pub fn visit_distribution(visit_counts: &[u32]) -> Result<Vec<f32>, SearchError> {
    let total: u64 = visit_counts.iter().map(|&v| v as u64).sum();
    if total == 0 {
        return Err(SearchError::EmptyDistribution);
    }
    Ok(visit_counts
        .iter()
        .map(|&v| v as f32 / total as f32)
        .collect())
}

/// Sharpen or flatten a distribution with `p^(1/T)`.
///
/// Temperatures below 1e-6 collapse to a one-hot on the first maximum.
pub fn temperature_scale(probs: &[f32], temperature: f32) -> Result<Vec<f32>, SearchError> {
    let mut out = vec![0.0; probs.len()];

    if temperature < 1e-6 {
        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in probs.iter().enumerate() {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((i, p)),
            }
        }
        match best {
            Some((i, p)) if p > 0.0 => out[i] = 1.0,
            _ => return Err(SearchError::EmptyDistribution),
        }
        return Ok(out);
    }

    let inv_t = 1.0 / temperature;
    for (o, &p) in out.iter_mut().zip(probs) {
        *o = if temperature == 1.0 { p } else { p.powf(inv_t) };
    }
    let sum: f32 = out.iter().sum();
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(SearchError::EmptyDistribution);
    }
    for o in &mut out {
        *o /= sum;
    }
    Ok(out)
}

/// Sample an index from a probability distribution.
pub fn sample_action<R: Rng + ?Sized>(probs: &[f32], rng: &mut R) -> Result<usize, SearchError> {
    let r: f32 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &p) in probs.iter().enumerate() {
        cumsum += p;
        if r < cumsum {
            return Ok(i);
        }
    }

    // Fallback to last non-zero action (handles floating point issues)
    for (i, &p) in probs.iter().enumerate().rev() {
        if p > 0.0 {
            return Ok(i);
        }
    }

    Err(SearchError::EmptyDistribution)
}
