//! Metrics collection for Worker Pool cycles

use std::time::Duration;

/// What happened to one unit in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The enrichment call produced a usable result
    Enriched,

    /// The enrichment call produced nothing and the segmenter result was stored
    Fallback,

    /// Nothing usable came back; the unit stays pending for a later cycle
    Requeued,

    /// Unexpected error or panic; the unit was abandoned
    Failed,
}

/// Counts for a single pool cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Units leased at the start of the cycle
    pub leased: usize,

    /// Units with an enrichment result
    pub enriched: usize,

    /// Units that fell back to the segmenter
    pub fallbacks: usize,

    /// Units left pending
    pub requeued: usize,

    /// Units abandoned after an unexpected failure
    pub failed: usize,

    /// Wall-clock time of the cycle
    pub elapsed: Duration,
}

impl CycleReport {
    /// Whether the lease came back empty
    pub fn is_idle(&self) -> bool {
        self.leased == 0
    }

    /// Units that reached any outcome
    pub fn processed(&self) -> usize {
        self.enriched + self.fallbacks + self.requeued + self.failed
    }

    /// Count one unit outcome
    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Enriched => self.enriched += 1,
            UnitOutcome::Fallback => self.fallbacks += 1,
            UnitOutcome::Requeued => self.requeued += 1,
            UnitOutcome::Failed => self.failed += 1,
        }
    }
}

/// Totals accumulated across cycles
#[derive(Debug, Clone, Default)]
pub struct PoolMetrics {
    /// Cycles run, idle ones included
    pub cycles: usize,

    /// Cycles whose lease was empty
    pub idle_cycles: usize,

    /// Units leased
    pub leased: usize,

    /// Units enriched
    pub enriched: usize,

    /// Segmenter fallbacks
    pub fallbacks: usize,

    /// Units left pending
    pub requeued: usize,

    /// Units abandoned
    pub failed: usize,

    /// Time spent inside cycles
    pub busy_time: Duration,
}

impl PoolMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cycle into the totals
    pub fn record_cycle(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.is_idle() {
            self.idle_cycles += 1;
        }
        self.leased += report.leased;
        self.enriched += report.enriched;
        self.fallbacks += report.fallbacks;
        self.requeued += report.requeued;
        self.failed += report.failed;
        self.busy_time += report.elapsed;
    }

    /// Units that reached a terminal or retry outcome
    pub fn total_processed(&self) -> usize {
        self.enriched + self.fallbacks + self.requeued + self.failed
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = [
            "Pool Metrics Summary".to_string(),
            "====================".to_string(),
            format!("Cycles: {} ({} idle)", self.cycles, self.idle_cycles),
            format!("Busy time: {}ms", self.busy_time.as_millis()),
            format!("Leased: {}", self.leased),
            format!("Enriched: {}", self.enriched),
            format!("Fallbacks: {}", self.fallbacks),
            format!("Requeued: {}", self.requeued),
            format!("Failed: {}", self.failed),
        ];
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = PoolMetrics::new();
        assert_eq!(metrics.cycles, 0);
        assert_eq!(metrics.total_processed(), 0);
    }

    #[test]
    fn test_cycle_report_counts() {
        let mut report = CycleReport {
            leased: 4,
            ..Default::default()
        };
        report.record(UnitOutcome::Enriched);
        report.record(UnitOutcome::Fallback);
        report.record(UnitOutcome::Requeued);
        report.record(UnitOutcome::Failed);

        assert!(!report.is_idle());
        assert_eq!(report.processed(), 4);
    }

    #[test]
    fn test_record_cycles() {
        let mut metrics = PoolMetrics::new();
        metrics.record_cycle(&CycleReport::default());
        metrics.record_cycle(&CycleReport {
            leased: 3,
            enriched: 2,
            fallbacks: 1,
            elapsed: Duration::from_millis(40),
            ..Default::default()
        });

        assert_eq!(metrics.cycles, 2);
        assert_eq!(metrics.idle_cycles, 1);
        assert_eq!(metrics.leased, 3);
        assert_eq!(metrics.total_processed(), 3);
        assert_eq!(metrics.busy_time, Duration::from_millis(40));
    }

    #[test]
    fn test_summary() {
        let mut metrics = PoolMetrics::new();
        metrics.record_cycle(&CycleReport {
            leased: 2,
            enriched: 1,
            requeued: 1,
            ..Default::default()
        });

        let summary = metrics.summary();
        assert!(summary.contains("Cycles: 1 (0 idle)"));
        assert!(summary.contains("Enriched: 1"));
        assert!(summary.contains("Requeued: 1"));
    }
}
