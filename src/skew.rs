//! Frame lag accounting for remote actors
//!
//! Remote decisions arrive an unpredictable number of ticks late. The
//! accountant compares the tick a snapshot was rendered at with the frame
//! the applied action was computed against, separating intentional
//! pipeline delay from genuine lag. Purely observational: the summary
//! never feeds back into physics.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

/// Per-level-run skew tracker. Samples are append-only and summarized once
/// at the end of the run.
pub struct FrameAccountant {
    /// Expected ticks between rendering a snapshot and applying the action
    /// computed against it; lag up to this is intentional
    pipeline_delay: u64,
    /// Extra lag beyond the pipeline delay, one entry per counted sample
    extra_lag: Vec<u64>,
}

impl FrameAccountant {
    pub fn new(pipeline_delay: u64) -> Self {
        Self {
            pipeline_delay,
            extra_lag: Vec::new(),
        }
    }

    /// Record one tick's skew. `acted_frame` is the frame echo of the most
    /// recently applied action; `None` (nothing received yet) contributes
    /// no sample. An action referencing a future tick is a leftover from a
    /// previous session and is discarded rather than counted.
    pub fn record(&mut self, rendered_tick: u64, acted_frame: Option<u64>) {
        let Some(acted) = acted_frame else {
            return;
        };
        if acted > rendered_tick {
            debug!("discarding stale frame echo {acted} (rendered tick {rendered_tick})");
            return;
        }
        let lag = rendered_tick - acted;
        let extra = lag.saturating_sub(self.pipeline_delay);
        self.extra_lag.push(extra);
    }

    pub fn samples(&self) -> usize {
        self.extra_lag.len()
    }

    /// Summarize the run. `None` when no sample was counted.
    pub fn summary(&self) -> Option<SkewSummary> {
        if self.extra_lag.is_empty() {
            return None;
        }
        let n = self.extra_lag.len() as f64;
        let mean = self.extra_lag.iter().sum::<u64>() as f64 / n;
        let variance = self
            .extra_lag
            .iter()
            .map(|&lag| {
                let d = lag as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let mut histogram = BTreeMap::new();
        for &lag in &self.extra_lag {
            *histogram.entry(lag).or_insert(0usize) += 1;
        }
        Some(SkewSummary {
            mean,
            stdev: variance.sqrt(),
            max: *self.extra_lag.iter().max().unwrap_or(&0),
            histogram,
            samples: self.extra_lag.len(),
        })
    }
}

/// End-of-run skew statistics (population stdev)
#[derive(Debug, Clone, PartialEq)]
pub struct SkewSummary {
    pub mean: f64,
    pub stdev: f64,
    pub max: u64,
    /// Distinct extra-lag value -> occurrence count
    pub histogram: BTreeMap<u64, usize>,
    pub samples: usize,
}

impl fmt::Display for SkewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "behind frames: {:.3} mean, {:.3} stdev, {} max over {} samples; histogram {:?}",
            self.mean, self.stdev, self.max, self.samples, self.histogram
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_classification() {
        let mut accountant = FrameAccountant::new(3);

        // Within the pipeline delay: zero extra lag
        accountant.record(10, Some(8));
        // Six behind with delay three: three extra
        accountant.record(10, Some(4));
        // Future frame: stale, discarded entirely
        accountant.record(10, Some(12));
        // Nothing received yet: no sample
        accountant.record(10, None);

        let summary = accountant.summary().unwrap();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.max, 3);
        assert_eq!(summary.histogram.get(&0), Some(&1));
        assert_eq!(summary.histogram.get(&3), Some(&1));
    }

    #[test]
    fn test_exact_boundary_counts_as_pipeline() {
        let mut accountant = FrameAccountant::new(3);
        accountant.record(10, Some(7)); // lag exactly equal to the delay
        accountant.record(10, Some(10)); // zero lag
        let summary = accountant.summary().unwrap();
        assert_eq!(summary.max, 0);
        assert_eq!(summary.histogram.get(&0), Some(&2));
    }

    #[test]
    fn test_summary_statistics() {
        let mut accountant = FrameAccountant::new(0);
        for lag in [0u64, 0, 2, 6] {
            accountant.record(lag, Some(0));
        }
        let summary = accountant.summary().unwrap();
        assert!((summary.mean - 2.0).abs() < 1e-9);
        // Population stdev of [0, 0, 2, 6]
        assert!((summary.stdev - 6.0f64.sqrt()).abs() < 1e-9);
        assert_eq!(summary.max, 6);
    }

    #[test]
    fn test_empty_run_has_no_summary() {
        let accountant = FrameAccountant::new(3);
        assert_eq!(accountant.samples(), 0);
        assert!(accountant.summary().is_none());
    }
}
