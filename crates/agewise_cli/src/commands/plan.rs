//! Plan command implementation.

use super::{CliError, SelectorKind};
use agewise_core::timefmt::{fmt_micros, fmt_seconds};
use agewise_core::{
    AgingOptions, AgingSelector, CompactionSelector, ExpiryFilterOptions, ExpiryFilteredSelector,
    StatsSnapshot,
};
use agewise_window::{
    Clock, InMemoryWindowPolicy, ManualClock, OptionMap, SystemClock, Table, TableCatalog,
    TimeWindowOptions,
};
use serde::Serialize;
use std::fmt::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Result of one planned selection.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    /// Selector that ran.
    pub selector: SelectorKind,
    /// GC horizon in seconds.
    pub horizon: i32,
    /// GC horizon as UTC `yyyyMMdd.HHmm`.
    pub horizon_utc: String,
    /// Number of live tables loaded.
    pub live_tables: usize,
    /// Selected tables, in selection order.
    pub selected: Vec<Table>,
    /// Total bytes of the selected tables.
    pub selected_bytes: u64,
    /// Selector counters after the run.
    pub stats: StatsSnapshot,
}

/// Runs the plan command.
pub fn run(
    path: &Path,
    horizon: i32,
    kind: SelectorKind,
    options: &OptionMap,
    format: &str,
    now_millis: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if format != "text" && format != "json" {
        return Err(CliError::UnknownFormat(format.to_string()).into());
    }

    let raw = std::fs::read_to_string(path)?;
    let tables: Vec<Table> = serde_json::from_str(&raw)?;
    info!(path = %path.display(), tables = tables.len(), "loaded table listing");

    let report = plan(tables, horizon, kind, options, now_millis)?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

/// Runs one selection over `tables` against an in-memory baseline.
pub fn plan(
    tables: Vec<Table>,
    horizon: i32,
    kind: SelectorKind,
    options: &OptionMap,
    now_millis: Option<i64>,
) -> Result<PlanReport, Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = match now_millis {
        Some(millis) => Arc::new(ManualClock::new(millis)),
        None => Arc::new(SystemClock),
    };
    let catalog = Arc::new(TableCatalog::with_tables(tables.into_iter().map(|table| {
        if table.filename.is_empty() {
            let name = format!("nb-{}-big-Data.db", table.id);
            table.with_filename(name)
        } else {
            table
        }
    })));
    let live_tables = catalog.len();

    let (selected, stats) = match kind {
        SelectorKind::Aging => {
            AgingSelector::<InMemoryWindowPolicy>::validate_options(options)?;
            let base_options = TimeWindowOptions::from_map(&AgingOptions::strip(options))?;
            let base = InMemoryWindowPolicy::new(Arc::clone(&catalog), base_options)
                .with_clock(Arc::clone(&clock));
            let selector = AgingSelector::new(base, options)?.with_clock(clock);
            (selector.select_candidates(horizon), selector.stats().snapshot())
        }
        SelectorKind::Expiry => {
            ExpiryFilteredSelector::<InMemoryWindowPolicy>::validate_options(options)?;
            let base_options = TimeWindowOptions::from_map(&ExpiryFilterOptions::strip(options))?;
            let base = InMemoryWindowPolicy::new(Arc::clone(&catalog), base_options)
                .with_clock(Arc::clone(&clock));
            let selector = ExpiryFilteredSelector::new(base, options)?.with_clock(clock);
            (selector.select_candidates(horizon), selector.stats().snapshot())
        }
    };

    let selected: Vec<Table> = selected.iter().map(|table| Table::clone(table)).collect();
    Ok(PlanReport {
        selector: kind,
        horizon,
        horizon_utc: fmt_seconds(i64::from(horizon)),
        live_tables,
        selected_bytes: selected.iter().map(|table| table.size_on_disk).sum(),
        selected,
        stats,
    })
}

fn print_text(report: &PlanReport) {
    print!("{}", render_text(report));
}

fn render_text(report: &PlanReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_text(&mut out, report);
    out
}

fn write_text(out: &mut String, report: &PlanReport) -> fmt::Result {
    writeln!(out, "Selector:    {:?}", report.selector)?;
    writeln!(out, "Horizon:     {} ({})", report.horizon, report.horizon_utc)?;
    writeln!(out, "Live tables: {}", report.live_tables)?;
    writeln!(out)?;

    if report.selected.is_empty() {
        writeln!(out, "No tables selected")?;
    } else {
        writeln!(
            out,
            "Selected {} tables ({} bytes):",
            report.selected.len(),
            report.selected_bytes
        )?;
        for table in &report.selected {
            writeln!(
                out,
                "  {:<24} max_ts={} max_ldt={} size={}",
                table.filename,
                fmt_micros(table.max_timestamp),
                fmt_seconds(i64::from(table.max_local_deletion_time)),
                table.size_on_disk
            )?;
        }
    }

    let stats = &report.stats;
    writeln!(out)?;
    writeln!(out, "Stats:")?;
    writeln!(out, "  Expiry scans:      {}", stats.expiry_scans)?;
    writeln!(out, "  Scans skipped:     {}", stats.expiry_scans_skipped)?;
    writeln!(out, "  Aged out:          {}", stats.tables_aged_out)?;
    writeln!(out, "  Dry run (ignored): {}", stats.tables_dry_run)?;
    writeln!(out, "  Oversized skipped: {}", stats.oversized_skipped)?;
    writeln!(out, "  Scan drops:        {}", stats.scan_drops)
}
