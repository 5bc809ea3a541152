//! Point-in-time distribution summaries.

/// Statistical summary of a histogram or timer at the moment it was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
}

impl Snapshot {
    /// Summarize a set of samples. An empty set yields all zeroes.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std_dev = if sorted.len() > 1 {
            let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            max: sorted[sorted.len() - 1],
            mean,
            min: sorted[0],
            std_dev,
            median: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            p95: quantile(&sorted, 0.95),
            p98: quantile(&sorted, 0.98),
            p99: quantile(&sorted, 0.99),
            p999: quantile(&sorted, 0.999),
        }
    }
}

// Linear interpolation between closest ranks, `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() as f64 + 1.0);
    let index = pos as usize;

    if index < 1 {
        return sorted[0];
    }
    if index >= sorted.len() {
        return sorted[sorted.len() - 1];
    }

    let lower = sorted[index - 1];
    let upper = sorted[index];
    lower + (pos - pos.floor()) * (upper - lower)
}
