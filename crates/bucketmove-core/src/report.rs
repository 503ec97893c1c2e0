//! End-of-run report: derived metrics plus the persisted summary file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use eyre::{Result, WrapErr};

use crate::job::TransferMethod;
use crate::stats::StatsSnapshot;

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Share of successful jobs handled by one method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodShare {
    pub method: TransferMethod,
    pub count: u64,
    /// Percentage of successful jobs; zero when nothing succeeded.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration: Duration,
    pub source_bucket: String,
    pub dest_bucket: String,
    pub workers: usize,
    pub total_jobs: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub success_rate: f64,
    pub total_bytes: u64,
    pub files_per_sec: f64,
    pub mb_per_sec: f64,
    pub methods: Vec<MethodShare>,
}

impl Report {
    /// Compute the report from a finalised snapshot. An unfinalised snapshot is
    /// treated as ending at its start time.
    pub fn from_snapshot(
        snapshot: &StatsSnapshot,
        source_bucket: &str,
        dest_bucket: &str,
        workers: usize,
    ) -> Self {
        let duration = snapshot.elapsed();
        let secs = duration.as_secs_f64();

        let (files_per_sec, mb_per_sec) = if secs > 0.0 {
            (
                snapshot.success_count as f64 / secs,
                snapshot.total_bytes as f64 / MIB / secs,
            )
        } else {
            (0.0, 0.0)
        };

        let success_rate = if snapshot.total_jobs > 0 {
            snapshot.success_count as f64 / snapshot.total_jobs as f64 * 100.0
        } else {
            0.0
        };

        let methods = snapshot
            .methods
            .iter()
            .map(|(&method, &count)| MethodShare {
                method,
                count,
                percent: if snapshot.success_count > 0 {
                    count as f64 / snapshot.success_count as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            started_at: snapshot.started_at,
            ended_at: snapshot.ended_at.unwrap_or(snapshot.started_at),
            duration,
            source_bucket: source_bucket.to_string(),
            dest_bucket: dest_bucket.to_string(),
            workers,
            total_jobs: snapshot.total_jobs,
            success_count: snapshot.success_count,
            error_count: snapshot.error_count,
            success_rate,
            total_bytes: snapshot.total_bytes,
            files_per_sec,
            mb_per_sec,
            methods,
        }
    }

    /// `transfer_summary_<start>.log`, keyed by run start time.
    pub fn file_name(&self) -> String {
        format!(
            "transfer_summary_{}.log",
            self.started_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "S3 TRANSFER SUMMARY REPORT
=====================================

TRANSFER DETAILS:
- Start Time: {start}
- End Time: {end}
- Duration: {duration:?}
- Source Bucket: {src}
- Destination Bucket: {dst}

FILE STATISTICS:
- Total Files Found: {total}
- Successfully Transferred: {ok}
- Failed Transfers: {err}
- Success Rate: {rate:.2}%

PERFORMANCE METRICS:
- Total Data Transferred: {mb:.2} MB ({gb:.2} GB)
- Average Speed: {fps:.2} files/second
- Data Transfer Rate: {mbps:.2} MB/second

TRANSFER METHODS:
",
            start = self.started_at.format("%Y-%m-%d %H:%M:%S"),
            end = self.ended_at.format("%Y-%m-%d %H:%M:%S"),
            duration = self.duration,
            src = self.source_bucket,
            dst = self.dest_bucket,
            total = self.total_jobs,
            ok = self.success_count,
            err = self.error_count,
            rate = self.success_rate,
            mb = self.total_bytes as f64 / MIB,
            gb = self.total_bytes as f64 / GIB,
            fps = self.files_per_sec,
            mbps = self.mb_per_sec,
        );

        if self.methods.is_empty() {
            out.push_str("- none\n");
        }
        for share in &self.methods {
            let _ = writeln!(
                out,
                "- {}: {} files ({:.1}%)",
                share.method, share.count, share.percent
            );
        }

        let _ = write!(
            out,
            "
SYSTEM INFORMATION:
- Worker Threads: {workers}
- Storage Method: Zero local storage (direct bucket-to-bucket transfer)
- Timestamp: {generated}

=====================================
Report generated by bucketmove
",
            workers = self.workers,
            generated = generated_at.format("%Y-%m-%d %H:%M:%S %Z"),
        );
        out
    }
}

/// Render `report` into `dir`, creating the directory if needed.
pub fn write_report(dir: &Path, report: &Report) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .wrap_err_with(|| format!("failed to create report directory {}", dir.display()))?;
    let path = dir.join(report.file_name());
    fs::write(&path, report.render(Local::now()))
        .wrap_err_with(|| format!("failed to write report {}", path.display()))?;
    Ok(path)
}
