//! Suite results.

use std::time::Duration;

use crate::checksum::relative_difference;
use crate::error::Result;
use crate::timer::TimingStats;
use crate::variant::VariantId;

/// Measurement of one (kernel, variant, tuning).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultRecord {
    pub kernel_id: u32,
    pub kernel: String,
    pub variant: VariantId,
    pub tuning: String,
    /// Total time over all passes.
    pub elapsed: Duration,
    pub timing: TimingStats,
    /// Checksum averaged over passes.
    pub checksum: f64,
    pub checksum_tolerance: f64,
    pub problem_size: usize,
    pub reps: usize,
}

/// Why a (kernel, variant) produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// The kernel does not implement the variant.
    UnsupportedVariant,
    /// The block-size allow-list excluded every candidate.
    NoValidTuning,
    /// Data could not be allocated; remaining variants of the kernel were skipped.
    SetUpFailed { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVariant => f.write_str("variant not implemented"),
            Self::NoValidTuning => f.write_str("no tuning passes the block-size allow-list"),
            Self::SetUpFailed { message } => write!(f, "set-up failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub kernel_id: u32,
    pub kernel: String,
    pub variant: VariantId,
    pub reason: SkipReason,
}

/// Agreement of one record's checksum with its kernel's reference record.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecksumCheck {
    pub kernel: String,
    pub variant: VariantId,
    pub tuning: String,
    pub reference_variant: VariantId,
    pub reference_tuning: String,
    pub relative_difference: f64,
    pub passed: bool,
}

/// Records and diagnostics of one suite run, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuiteReport {
    records: Vec<ResultRecord>,
    diagnostics: Vec<Diagnostic>,
    data_init_count: u64,
}

impl SuiteReport {
    pub(crate) fn push_record(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn set_data_init_count(&mut self, count: u64) {
        self.data_init_count = count;
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Host-to-space initializations performed during the run.
    pub fn data_init_count(&self) -> u64 {
        self.data_init_count
    }

    pub fn records_for<'a>(&'a self, kernel: &'a str) -> impl Iterator<Item = &'a ResultRecord> + 'a {
        self.records.iter().filter(move |record| record.kernel == kernel)
    }

    pub fn record(&self, kernel: &str, variant: VariantId, tuning: &str) -> Option<&ResultRecord> {
        self.records
            .iter()
            .find(|record| record.kernel == kernel && record.variant == variant && record.tuning == tuning)
    }

    /// Compare every record against the first record of the same kernel.
    pub fn checksum_consistency(&self) -> Vec<ChecksumCheck> {
        let mut checks = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let Some(reference) = self.records.iter().find(|r| r.kernel == record.kernel) else {
                continue;
            };
            let difference = relative_difference(record.checksum, reference.checksum);
            checks.push(ChecksumCheck {
                kernel: record.kernel.clone(),
                variant: record.variant,
                tuning: record.tuning.clone(),
                reference_variant: reference.variant,
                reference_tuning: reference.tuning.clone(),
                relative_difference: difference,
                passed: difference <= record.checksum_tolerance,
            });
        }
        checks
    }

    pub fn all_checksums_consistent(&self) -> bool {
        self.checksum_consistency().iter().all(|check| check.passed)
    }
}

/// Consumer of finished suite reports.
pub trait ReportSink {
    fn receive(&mut self, report: &SuiteReport) -> Result<()>;
}

/// Sink that keeps every report in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Vec<SuiteReport>,
}

impl CollectingSink {
    pub fn reports(&self) -> &[SuiteReport] {
        &self.reports
    }

    pub fn last(&self) -> Option<&SuiteReport> {
        self.reports.last()
    }
}

impl ReportSink for CollectingSink {
    fn receive(&mut self, report: &SuiteReport) -> Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}
