//! Benchmark result summaries.
//!
//! Reads per-concurrency search benchmark results (Google Benchmark style
//! JSON, one `search_concurrency_*.json` file per thread count), sorts them
//! by concurrency and renders a table plus a CSV export.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name prefix of per-concurrency result files.
pub const RESULT_FILE_PREFIX: &str = "search_concurrency_";

/// Name of the CSV written next to the results.
pub const SUMMARY_CSV_NAME: &str = "summary.csv";

/// Neighbors per query used by the search benchmarks.
pub const SEARCH_K: usize = 10;

/// One benchmark run at a given concurrency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub name: String,
    pub threads: u32,
    pub iterations: u64,
    pub real_time: f64,
    pub cpu_time: f64,
    pub time_unit: String,
    pub queries_per_second: f64,
    pub recall: f64,
    pub latency_ms: f64,
    pub total_queries: u64,
    pub end_to_end: f64,
    /// Search parameters; `None` when the run reported no counters at all.
    pub itopk: Option<u64>,
    pub search_width: Option<u64>,
    pub refine_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ResultFile {
    #[serde(default)]
    benchmarks: Vec<RawBenchmark>,
}

#[derive(Debug, Deserialize)]
struct RawBenchmark {
    #[serde(default)]
    name: String,
    #[serde(default = "default_threads")]
    threads: u32,
    #[serde(default)]
    iterations: u64,
    #[serde(default)]
    real_time: f64,
    #[serde(default)]
    cpu_time: f64,
    #[serde(default = "default_time_unit")]
    time_unit: String,
    #[serde(default)]
    counters: Option<Counters>,
}

// Benchmark counters are always emitted as doubles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Counters {
    #[serde(rename = "Recall")]
    recall: f64,
    items_per_second: f64,
    total_queries: f64,
    #[serde(rename = "Latency")]
    latency: f64,
    end_to_end: f64,
    itopk: f64,
    search_width: f64,
    refine_ratio: f64,
}

fn default_threads() -> u32 {
    1
}

fn default_time_unit() -> String {
    "ms".to_string()
}

impl From<RawBenchmark> for BenchmarkRecord {
    fn from(raw: RawBenchmark) -> Self {
        let has_counters = raw.counters.is_some();
        let c = raw.counters.unwrap_or_default();
        Self {
            name: raw.name,
            threads: raw.threads,
            iterations: raw.iterations,
            real_time: raw.real_time,
            cpu_time: raw.cpu_time,
            time_unit: raw.time_unit,
            queries_per_second: c.items_per_second,
            recall: c.recall,
            latency_ms: c.latency,
            total_queries: c.total_queries as u64,
            end_to_end: c.end_to_end,
            itopk: has_counters.then_some(c.itopk as u64),
            search_width: has_counters.then_some(c.search_width as u64),
            refine_ratio: has_counters.then_some(c.refine_ratio),
        }
    }
}

impl BenchmarkRecord {
    /// CSV header for the summary export.
    pub fn csv_header() -> &'static str {
        "Concurrency,QPS,Recall,Latency_ms,Total_Queries"
    }

    /// Convert record to a CSV row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{:.2},{:.4},{:.3},{}",
            self.threads, self.queries_per_second, self.recall, self.latency_ms, self.total_queries
        )
    }
}

/// Parse one result file. Returns `None` when it holds no benchmarks;
/// only the first benchmark is used otherwise.
pub fn parse_result_file(path: &Path) -> Result<Option<BenchmarkRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read benchmark result {}", path.display()))?;
    let file: ResultFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse benchmark JSON in {}", path.display()))?;

    Ok(file.benchmarks.into_iter().next().map(BenchmarkRecord::from))
}

/// `search_concurrency_*.json` files in `dir`, sorted by name.
pub fn find_result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list results directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_result = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(RESULT_FILE_PREFIX) && n.ends_with(".json"))
            .unwrap_or(false);
        if is_result && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every result in `dir`, sorted by concurrency.
pub fn collect_results(dir: &Path) -> Result<Vec<BenchmarkRecord>> {
    let files = find_result_files(dir)?;
    if files.is_empty() {
        anyhow::bail!("No result files found in {}", dir.display());
    }

    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        match parse_result_file(path)? {
            Some(record) => records.push(record),
            None => debug!(path = %path.display(), "No benchmarks in result file"),
        }
    }

    if records.is_empty() {
        anyhow::bail!("No valid results found in {}", dir.display());
    }

    sort_by_concurrency(&mut records);
    Ok(records)
}

/// Stable sort, ascending by thread count.
pub fn sort_by_concurrency(records: &mut [BenchmarkRecord]) {
    records.sort_by_key(|r| r.threads);
}

/// Fixed-width results table.
pub fn render_table(records: &[BenchmarkRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>12} {:>12} {:>10} {:>15} {:>15}",
        "Concurrency", "QPS", "Recall", "Latency(ms)", "Total Queries"
    );
    let _ = writeln!(out, "{}", "-".repeat(80));
    for r in records {
        let _ = writeln!(
            out,
            "{:>12} {:>12.2} {:>10.4} {:>15.3} {:>15}",
            r.threads, r.queries_per_second, r.recall, r.latency_ms, r.total_queries
        );
    }
    out
}

/// Search parameters of a run. Parameters the run did not report print as `N/A`.
pub fn render_search_parameters(record: &BenchmarkRecord) -> String {
    format!(
        "Search Parameters:\n  k: {}\n  itopk_size: {}\n  search_width: {}\n  refine_ratio: {}\n",
        SEARCH_K,
        or_na(record.itopk),
        or_na(record.search_width),
        or_na(record.refine_ratio)
    )
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// Write the CSV summary.
pub fn save_summary_csv(records: &[BenchmarkRecord], csv_path: &Path) -> Result<()> {
    let mut file = File::create(csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    writeln!(file, "{}", BenchmarkRecord::csv_header())?;
    for record in records {
        writeln!(file, "{}", record.to_csv_row())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn result_json(threads: u32, qps: f64, recall: f64) -> String {
        format!(
            r#"{{
  "context": {{ "date": "2025-01-01" }},
  "benchmarks": [
    {{
      "name": "search/threads:{threads}",
      "threads": {threads},
      "iterations": 50,
      "real_time": 12.5,
      "cpu_time": 11.0,
      "time_unit": "ms",
      "counters": {{
        "Recall": {recall},
        "items_per_second": {qps},
        "total_queries": 10000.0,
        "Latency": 1.25,
        "end_to_end": 3.0,
        "itopk": 64.0,
        "search_width": 1.0,
        "refine_ratio": 2.0
      }}
    }}
  ]
}}"#
        )
    }

    #[test]
    fn test_parse_result_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("search_concurrency_4.json");
        fs::write(&path, result_json(4, 1234.5, 0.95)).unwrap();

        let record = parse_result_file(&path).unwrap().unwrap();
        assert_eq!(record.name, "search/threads:4");
        assert_eq!(record.threads, 4);
        assert_eq!(record.iterations, 50);
        assert_eq!(record.queries_per_second, 1234.5);
        assert_eq!(record.recall, 0.95);
        assert_eq!(record.latency_ms, 1.25);
        assert_eq!(record.total_queries, 10000);
        assert_eq!(record.itopk, Some(64));
        assert_eq!(record.search_width, Some(1));
        assert_eq!(record.refine_ratio, Some(2.0));
    }

    #[test]
    fn test_missing_fields_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("search_concurrency_1.json");
        fs::write(&path, r#"{"benchmarks": [{"name": "bare"}]}"#).unwrap();

        let record = parse_result_file(&path).unwrap().unwrap();
        assert_eq!(record.threads, 1);
        assert_eq!(record.time_unit, "ms");
        assert_eq!(record.queries_per_second, 0.0);
        assert_eq!(record.total_queries, 0);
        assert_eq!(record.itopk, None);

        let params = render_search_parameters(&record);
        assert!(params.contains("itopk_size: N/A"));
        assert!(params.contains("search_width: N/A"));
        assert!(params.contains("refine_ratio: N/A"));
    }

    #[test]
    fn test_partial_counters_default_to_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("search_concurrency_2.json");
        fs::write(
            &path,
            r#"{"benchmarks": [{"name": "s", "counters": {"itopk": 32.0}}]}"#,
        )
        .unwrap();

        let record = parse_result_file(&path).unwrap().unwrap();
        assert_eq!(record.itopk, Some(32));
        assert_eq!(record.search_width, Some(0));
        assert_eq!(record.refine_ratio, Some(0.0));
        assert_eq!(record.recall, 0.0);
    }

    #[test]
    fn test_empty_benchmarks_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("search_concurrency_1.json");
        fs::write(&path, r#"{"benchmarks": []}"#).unwrap();
        assert!(parse_result_file(&path).unwrap().is_none());

        fs::write(&path, r#"{"context": {}}"#).unwrap();
        assert!(parse_result_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_collect_sorts_by_threads() {
        let dir = tempdir().unwrap();
        // Lexicographic order (1, 16, 2, 8) differs from numeric order.
        for threads in [1u32, 16, 2, 8] {
            let path = dir.path().join(format!("search_concurrency_{threads}.json"));
            fs::write(path, result_json(threads, 100.0 * threads as f64, 0.9)).unwrap();
        }
        fs::write(dir.path().join("build.json"), "not json").unwrap();
        fs::write(
            dir.path().join("search_concurrency_32.json"),
            r#"{"benchmarks": []}"#,
        )
        .unwrap();

        let records = collect_results(dir.path()).unwrap();
        let threads: Vec<_> = records.iter().map(|r| r.threads).collect();
        assert_eq!(threads, [1, 2, 8, 16]);
    }

    #[test]
    fn test_collect_errors() {
        let dir = tempdir().unwrap();
        let err = collect_results(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No result files"));

        fs::write(
            dir.path().join("search_concurrency_1.json"),
            r#"{"benchmarks": []}"#,
        )
        .unwrap();
        let err = collect_results(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No valid results"));
    }

    #[test]
    fn test_csv_row_format() {
        let record = BenchmarkRecord {
            name: String::new(),
            threads: 8,
            iterations: 1,
            real_time: 0.0,
            cpu_time: 0.0,
            time_unit: "ms".to_string(),
            queries_per_second: 15234.567,
            recall: 0.98766,
            latency_ms: 0.52349,
            total_queries: 10000,
            end_to_end: 0.0,
            itopk: Some(64),
            search_width: Some(1),
            refine_ratio: Some(2.0),
        };
        assert_eq!(record.to_csv_row(), "8,15234.57,0.9877,0.523,10000");
        assert_eq!(
            BenchmarkRecord::csv_header(),
            "Concurrency,QPS,Recall,Latency_ms,Total_Queries"
        );

        let table = render_table(std::slice::from_ref(&record));
        let row = table.lines().nth(2).unwrap();
        assert_eq!(
            row,
            "           8     15234.57     0.9877           0.523           10000"
        );

        let params = render_search_parameters(&record);
        assert!(params.contains("itopk_size: 64"));
        assert!(params.contains("k: 10"));
    }

    #[test]
    fn test_save_summary_csv() {
        let dir = tempdir().unwrap();
        for threads in [2u32, 1] {
            let path = dir.path().join(format!("search_concurrency_{threads}.json"));
            fs::write(path, result_json(threads, 500.0, 0.5)).unwrap();
        }
        let records = collect_results(dir.path()).unwrap();
        let csv_path = dir.path().join(SUMMARY_CSV_NAME);
        save_summary_csv(&records, &csv_path).unwrap();

        let csv = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(
            csv,
            "Concurrency,QPS,Recall,Latency_ms,Total_Queries\n\
             1,500.00,0.5000,1.250,10000\n\
             2,500.00,0.5000,1.250,10000\n"
        );
    }
}
