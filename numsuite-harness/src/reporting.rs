//! Test result reporting and statistics

use chrono::{DateTime, Utc};
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::runner::{Outcome, PairResult};
use crate::HarnessError;

/// Overall run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Total number of pairs
    pub total: usize,
    /// Number of passed pairs
    pub passed: usize,
    /// Number of failed pairs (comparison or tolerance)
    pub failed: usize,
    /// Number of errored pairs (entry raised, fixture unreadable)
    pub errored: usize,
    /// Number of skipped pairs (unavailable capabilities)
    pub skipped: usize,
    /// Sum of per-pair execution time
    pub total_duration: Duration,
    /// Average per-pair execution time
    pub average_duration: Duration,
}

impl RunStatistics {
    /// Compute statistics from pair results
    pub fn from_results(results: &[PairResult]) -> Self {
        let mut stats = Self {
            total: results.len(),
            passed: 0,
            failed: 0,
            errored: 0,
            skipped: 0,
            total_duration: Duration::ZERO,
            average_duration: Duration::ZERO,
        };

        for result in results {
            match result.outcome {
                Outcome::Passed => stats.passed += 1,
                Outcome::Failed => stats.failed += 1,
                Outcome::Errored => stats.errored += 1,
                Outcome::Skipped => stats.skipped += 1,
            }
            stats.total_duration += result.duration;
        }

        stats.average_duration = if stats.total > 0 {
            stats.total_duration / stats.total as u32
        } else {
            Duration::ZERO
        };

        stats
    }

    /// Zero non-OK outcomes (skipped pairs do not fail the run)
    pub fn all_ok(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Passed pairs as a percentage of all pairs
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Complete report of one test run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Every pair result, in execution order
    pub results: Vec<PairResult>,
    /// Overall statistics
    pub statistics: RunStatistics,
    /// Wall-clock duration of the whole run
    pub duration: Duration,
    /// Timestamp when the run finished
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    pub fn from_results(results: Vec<PairResult>, duration: Duration) -> Self {
        let statistics = RunStatistics::from_results(&results);
        Self {
            results,
            statistics,
            duration,
            timestamp: Utc::now(),
        }
    }

    pub fn failed_pairs(&self) -> impl Iterator<Item = &PairResult> {
        self.results.iter().filter(|r| r.outcome == Outcome::Failed)
    }

    pub fn errored_pairs(&self) -> impl Iterator<Item = &PairResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Errored)
    }

    pub fn skipped_pairs(&self) -> impl Iterator<Item = &PairResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Skipped)
    }

    /// Identities of every non-OK pair, in execution order
    pub fn non_ok_identities(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed | Outcome::Errored))
            .map(|r| r.identity())
            .collect()
    }

    /// Print a summary to stdout
    pub fn print_summary(&self) {
        self.print_header();
        self.print_statistics();

        if !self.statistics.all_ok() {
            self.print_failures();
        }

        self.print_footer();
    }

    /// Print a detailed report with every pair
    pub fn print_detailed(&self) {
        self.print_header();
        self.print_statistics();
        self.print_all_results();
        self.print_footer();
    }

    /// Print just the non-OK pairs with their diagnostics
    pub fn print_failures(&self) {
        let failed: Vec<_> = self.failed_pairs().collect();
        let errored: Vec<_> = self.errored_pairs().collect();

        if !failed.is_empty() {
            println!("\n{}", style("FAILED PAIRS:").bold().red());
            for pair in failed {
                self.print_pair_detail(pair);
            }
        }

        if !errored.is_empty() {
            println!("\n{}", style("ERRORED PAIRS:").bold().red());
            for pair in errored {
                self.print_pair_detail(pair);
            }
        }
    }

    fn print_header(&self) {
        println!("{}", style("NUMSUITE TEST REPORT").bold().cyan());
        println!(
            "{}",
            style(format!(
                "Run at: {}",
                self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ))
            .dim()
        );
        println!("{}", style(format!("Duration: {:.2?}", self.duration)).dim());
        println!();
    }

    fn print_statistics(&self) {
        let stats = &self.statistics;

        println!("{}", style("SUMMARY").bold());
        println!("  Total pairs: {}", stats.total);
        println!(
            "  {} {}",
            style("OK:").green(),
            style(stats.passed).bold().green()
        );

        if stats.failed > 0 {
            println!(
                "  {} {}",
                style("Failed:").red(),
                style(stats.failed).bold().red()
            );
        }

        if stats.errored > 0 {
            println!(
                "  {} {}",
                style("Errored:").red(),
                style(stats.errored).bold().red()
            );
        }

        if stats.skipped > 0 {
            println!(
                "  {} {}",
                style("Skipped:").yellow(),
                style(stats.skipped).bold().yellow()
            );
        }

        println!("  Success rate: {:.1}%", stats.success_rate());
        println!("  Average duration: {:.2?}", stats.average_duration);
        println!();
    }

    fn print_all_results(&self) {
        println!("{}", style("ALL RESULTS").bold());

        for result in &self.results {
            let status_icon = match result.outcome {
                Outcome::Passed => style("✓").green(),
                Outcome::Failed => style("✗").red(),
                Outcome::Errored => style("!").red(),
                Outcome::Skipped => style("~").yellow(),
            };

            println!(
                "  {} {} [{:.2?}]",
                status_icon,
                result.identity(),
                result.duration
            );
        }

        println!();
    }

    fn print_pair_detail(&self, pair: &PairResult) {
        let icon = match pair.outcome {
            Outcome::Errored => style("!").red(),
            _ => style("✗").red(),
        };
        println!("\n  {} {}", icon, pair.identity());

        if let Some(detail) = &pair.detail {
            for line in detail.lines() {
                if line.starts_with('+') {
                    println!("    {}", style(line).green());
                } else if line.starts_with('-') {
                    println!("    {}", style(line).red());
                } else {
                    println!("    {}", style(line).dim());
                }
            }
        }
    }

    fn print_footer(&self) {
        let success_rate = self.statistics.success_rate();
        let styled_result = if self.statistics.all_ok() {
            style(format!("RESULT: {:.1}% success rate", success_rate))
                .bold()
                .green()
        } else if success_rate >= 90.0 {
            style(format!("RESULT: {:.1}% success rate", success_rate))
                .bold()
                .yellow()
        } else {
            style(format!("RESULT: {:.1}% success rate", success_rate))
                .bold()
                .red()
        };

        println!("{}", styled_result);
    }

    /// Export report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save report to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), HarnessError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Results Summary:")?;
        writeln!(f, "  Total: {}", self.statistics.total)?;
        writeln!(f, "  OK: {}", self.statistics.passed)?;
        writeln!(f, "  Failed: {}", self.statistics.failed)?;
        writeln!(f, "  Errored: {}", self.statistics.errored)?;
        writeln!(f, "  Skipped: {}", self.statistics.skipped)?;
        writeln!(f, "  Success Rate: {:.1}%", self.statistics.success_rate())?;
        writeln!(f, "  Duration: {:.2?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(unit: &str, index: usize, outcome: Outcome) -> PairResult {
        PairResult {
            unit: unit.to_string(),
            index,
            outcome,
            detail: None,
            duration: Duration::from_millis(2),
        }
    }

    #[test]
    fn statistics_count_every_outcome() {
        let results = vec![
            pair("a", 0, Outcome::Passed),
            pair("a", 1, Outcome::Failed),
            pair("b", 0, Outcome::Errored),
            pair("c", 0, Outcome::Skipped),
        ];
        let stats = RunStatistics::from_results(&results);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.errored, 1);
        assert_eq!(stats.skipped, 1);
        assert!(!stats.all_ok());
        assert_eq!(stats.success_rate(), 25.0);
    }

    #[test]
    fn skipped_pairs_do_not_fail_the_run() {
        let results = vec![pair("a", 0, Outcome::Passed), pair("b", 0, Outcome::Skipped)];
        let stats = RunStatistics::from_results(&results);
        assert!(stats.all_ok());
    }

    #[test]
    fn non_ok_identities_preserve_execution_order() {
        let report = RunReport::from_results(
            vec![
                pair("a", 0, Outcome::Errored),
                pair("b", 0, Outcome::Passed),
                pair("c", 0, Outcome::Failed),
            ],
            Duration::from_millis(6),
        );
        assert_eq!(
            report.non_ok_identities(),
            vec!["a setting 0", "c setting 0"]
        );
    }

    #[test]
    fn report_serializes_to_json() {
        let report = RunReport::from_results(
            vec![pair("a", 0, Outcome::Passed)],
            Duration::from_millis(1),
        );
        let json = report.to_json().unwrap();
        assert!(json.contains("\"passed\": 1"));
    }

    #[test]
    fn empty_run_has_full_success_rate() {
        let stats = RunStatistics::from_results(&[]);
        assert_eq!(stats.success_rate(), 100.0);
        assert!(stats.all_ok());
    }
}
