use crate::error::EngineError;
use crate::models::{ChunkTask, ParameterDimension};
use std::collections::{HashMap, HashSet};

/// Extract a parameter as f64 with a default value
pub fn get_param_f64(params: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

/// Extract a parameter as a non-negative share count with a default value
pub fn get_param_u32(params: &HashMap<String, f64>, key: &str, default: u32) -> u32 {
    params
        .get(key)
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.round().max(0.0) as u32)
        .unwrap_or(default)
}

/// Extract a parameter as a rounded signed offset with a default value
pub fn get_param_i64(params: &HashMap<String, f64>, key: &str, default: i64) -> i64 {
    params
        .get(key)
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
        .unwrap_or(default)
}

/// An ordered, discretized parameter grid: the cartesian product of evenly
/// spaced sample points per dimension. Enumeration is exhaustive by design
/// (no pruning) and ordered with the first dimension varying slowest, so a
/// flat grid index identifies a candidate deterministically — which is what
/// chunk partitioning and first-seen tie-breaks are defined against.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    dimensions: Vec<ParameterDimension>,
    total: usize,
}

impl ParameterSpace {
    pub fn new(dimensions: Vec<ParameterDimension>) -> Result<Self, EngineError> {
        if dimensions.is_empty() {
            return Err(EngineError::InvalidParameterSpace(
                "no dimensions".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let mut total: usize = 1;
        for dim in &dimensions {
            if !seen.insert(dim.name.clone()) {
                return Err(EngineError::InvalidParameterSpace(format!(
                    "duplicate dimension `{}`",
                    dim.name
                )));
            }
            if dim.samples == 0 {
                return Err(EngineError::InvalidParameterSpace(format!(
                    "dimension `{}` has zero samples",
                    dim.name
                )));
            }
            if !dim.min.is_finite() || !dim.max.is_finite() || dim.min > dim.max {
                return Err(EngineError::InvalidParameterSpace(format!(
                    "dimension `{}` has malformed bounds [{}, {}]",
                    dim.name, dim.min, dim.max
                )));
            }
            total = total.checked_mul(dim.samples).ok_or_else(|| {
                EngineError::InvalidParameterSpace("grid size overflows usize".to_string())
            })?;
        }
        Ok(Self { dimensions, total })
    }

    pub fn dimensions(&self) -> &[ParameterDimension] {
        &self.dimensions
    }

    /// Total number of candidate vectors in the grid.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Decodes a flat grid index into a parameter map via an iterative
    /// multi-radix counter over the per-dimension sample counts.
    pub fn candidate(&self, index: usize) -> HashMap<String, f64> {
        debug_assert!(index < self.total);
        let mut params = HashMap::with_capacity(self.dimensions.len());
        let mut remainder = index;
        for dim in self.dimensions.iter().rev() {
            let step = remainder % dim.samples;
            remainder /= dim.samples;
            params.insert(dim.name.clone(), Self::sample_value(dim, step));
        }
        params
    }

    fn sample_value(dim: &ParameterDimension, step: usize) -> f64 {
        if dim.samples == 1 {
            dim.min
        } else {
            dim.min + step as f64 * (dim.max - dim.min) / (dim.samples - 1) as f64
        }
    }

    /// Splits the grid into at most `parallelism` contiguous chunks covering
    /// every index exactly once.
    pub fn chunks(&self, parallelism: usize) -> Vec<ChunkTask> {
        if self.total == 0 {
            return Vec::new();
        }
        let workers = parallelism.max(1).min(self.total);
        let chunk_size = self.total.div_ceil(workers);
        (0..workers)
            .map(|chunk_index| {
                let start = chunk_index * chunk_size;
                let end = ((chunk_index + 1) * chunk_size).min(self.total);
                ChunkTask {
                    chunk_index,
                    start,
                    end,
                }
            })
            .filter(|task| task.start < task.end)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(name: &str, min: f64, max: f64, samples: usize) -> ParameterDimension {
        ParameterDimension {
            name: name.to_string(),
            min,
            max,
            samples,
        }
    }

    fn example_space() -> ParameterSpace {
        ParameterSpace::new(vec![
            dim("lot", 1.0, 1.0, 1),
            dim("buy_percent", -0.1, 0.1, 3),
            dim("sell_percent", -0.1, 0.1, 3),
            dim("time_comp", -10.0, -10.0, 1),
        ])
        .unwrap()
    }

    #[test]
    fn grid_is_the_full_cartesian_product() {
        assert_eq!(example_space().len(), 9);
    }

    #[test]
    fn single_sample_dimension_collapses_to_lower_bound() {
        let space = example_space();
        for index in 0..space.len() {
            let params = space.candidate(index);
            assert_eq!(params["lot"], 1.0);
            assert_eq!(params["time_comp"], -10.0);
        }
    }

    #[test]
    fn first_dimension_varies_slowest() {
        let space = ParameterSpace::new(vec![dim("a", 0.0, 1.0, 2), dim("b", 0.0, 2.0, 3)]).unwrap();
        let values: Vec<(f64, f64)> = (0..space.len())
            .map(|i| {
                let p = space.candidate(i);
                (p["a"], p["b"])
            })
            .collect();
        assert_eq!(
            values,
            vec![
                (0.0, 0.0),
                (0.0, 1.0),
                (0.0, 2.0),
                (1.0, 0.0),
                (1.0, 1.0),
                (1.0, 2.0),
            ]
        );
    }

    #[test]
    fn sample_points_are_evenly_spaced() {
        let space = example_space();
        let mut buys: Vec<f64> = (0..space.len()).map(|i| space.candidate(i)["buy_percent"]).collect();
        buys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        buys.dedup();
        assert_eq!(buys.len(), 3);
        assert!((buys[0] + 0.1).abs() < 1e-12);
        assert!(buys[1].abs() < 1e-12);
        assert!((buys[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn chunks_cover_the_grid_without_overlap() {
        let space = example_space();
        for parallelism in 1..=5 {
            let chunks = space.chunks(parallelism);
            let mut covered = Vec::new();
            for task in &chunks {
                covered.extend(task.start..task.end);
            }
            assert_eq!(covered, (0..space.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        assert!(matches!(
            ParameterSpace::new(vec![dim("a", 1.0, 0.0, 2)]),
            Err(EngineError::InvalidParameterSpace(_))
        ));
        assert!(matches!(
            ParameterSpace::new(vec![dim("a", 0.0, 1.0, 0)]),
            Err(EngineError::InvalidParameterSpace(_))
        ));
        assert!(matches!(
            ParameterSpace::new(vec![dim("a", 0.0, 1.0, 2), dim("a", 0.0, 1.0, 2)]),
            Err(EngineError::InvalidParameterSpace(_))
        ));
        assert!(matches!(
            ParameterSpace::new(vec![dim("a", f64::NAN, 1.0, 2)]),
            Err(EngineError::InvalidParameterSpace(_))
        ));
    }
}
