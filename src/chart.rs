//! Timeline feed for recorded runs.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Local;
use chrono::TimeZone;
use chrono::Utc;
use parking_lot::RwLock;

use crate::cells::CellId;
use crate::runs::CellRun;
use crate::runs::Run;
use crate::runs::RunStatus;

const CHART_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// `seconds` since the epoch as local wall-clock time. Invalid input gives
/// an empty string.
pub fn format_chart_time(seconds: f64) -> String {
    format_chart_time_in(seconds, &Local)
}

pub fn format_chart_time_in<Tz: TimeZone>(seconds: f64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if !seconds.is_finite() {
        return String::new();
    }
    let millis = (seconds * 1000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return String::new();
    }
    match DateTime::<Utc>::from_timestamp_millis(millis as i64) {
        Some(utc) => utc.with_timezone(tz).format(CHART_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Human readable duration of `ms` milliseconds, `-` when unknown.
pub fn format_elapsed_time(ms: Option<f64>) -> String {
    let Some(ms) = ms.filter(|ms| ms.is_finite() && *ms >= 0.0) else {
        return "-".to_owned();
    };
    // Round at each unit's precision before picking the unit.
    let millis = ms.round() as u64;
    if millis < 1_000 {
        return format!("{millis}ms");
    }
    let centis = (ms / 10.0).round() as u64;
    if centis < 6_000 {
        return format!("{}.{:02}s", centis / 100, centis % 100);
    }
    let seconds = (ms / 1_000.0).round() as u64;
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Bar color channel. Queued and running rows are told apart by icon only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarTone {
    Success,
    Error,
}

impl From<RunStatus> for BarTone {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Error => BarTone::Error,
            RunStatus::Queued | RunStatus::Running | RunStatus::Success => BarTone::Success,
        }
    }
}

/// One timeline row.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartValues {
    pub cell: CellId,
    /// Position of the cell in the notebook, if it still exists.
    pub cell_num: Option<usize>,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub elapsed_time: String,
    pub status: RunStatus,
}

impl ChartValues {
    pub fn tone(&self) -> BarTone {
        self.status.into()
    }

    pub fn is_in_flight(&self) -> bool {
        !self.status.is_terminal()
    }

    fn sort_key(&self) -> f64 {
        if self.is_in_flight() {
            f64::INFINITY
        } else {
            self.start_time
        }
    }
}

/// Rows for `run` in local time, finished cells by start time, in-flight
/// cells last.
pub fn chart_values(run: &Run, cell_ids: &[CellId]) -> Vec<ChartValues> {
    chart_values_in(run, cell_ids, &Local)
}

pub fn chart_values_in<Tz: TimeZone>(run: &Run, cell_ids: &[CellId], tz: &Tz) -> Vec<ChartValues>
where
    Tz::Offset: std::fmt::Display,
{
    let mut rows: Vec<ChartValues> = run
        .cell_runs
        .iter()
        .map(|cell_run| chart_row(cell_run, cell_ids, tz))
        .collect();
    rows.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    rows
}

fn chart_row<Tz: TimeZone>(cell_run: &CellRun, cell_ids: &[CellId], tz: &Tz) -> ChartValues
where
    Tz::Offset: std::fmt::Display,
{
    let end_time = cell_run.end_time();
    ChartValues {
        cell: cell_run.cell_id.clone(),
        cell_num: cell_ids.iter().position(|id| id == &cell_run.cell_id),
        start_time: cell_run.start_time,
        end_time,
        start_timestamp: format_chart_time_in(cell_run.start_time, tz),
        end_timestamp: end_time
            .map(|end| format_chart_time_in(end, tz))
            .unwrap_or_default(),
        elapsed_time: format_elapsed_time(cell_run.elapsed_time.map(|seconds| seconds * 1000.0)),
        status: cell_run.status,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HoveredCell {
    #[default]
    None,
    Cell(CellId),
}

impl HoveredCell {
    pub fn cell(&self) -> Option<&CellId> {
        match self {
            HoveredCell::None => None,
            HoveredCell::Cell(cell) => Some(cell),
        }
    }
}

/// Hovered cell shared between the timeline chart and the row list.
#[derive(Clone, Debug, Default)]
pub struct SharedHover(Arc<RwLock<HoveredCell>>);

impl SharedHover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> HoveredCell {
        self.0.read().clone()
    }

    pub fn set(&self, cell: CellId) {
        *self.0.write() = HoveredCell::Cell(cell);
    }

    pub fn clear(&self) {
        *self.0.write() = HoveredCell::None;
    }

    pub fn is_hovered(&self, cell: &CellId) -> bool {
        self.0.read().cell() == Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::RunEvent;
    use crate::runs::RunsState;

    #[test]
    fn chart_time_is_millisecond_precise() {
        assert_eq!(
            format_chart_time_in(1_700_000_000.0, &Utc),
            "2023-11-14 22:13:20.000"
        );
        assert_eq!(
            format_chart_time_in(1_700_000_000.25, &Utc),
            "2023-11-14 22:13:20.250"
        );
    }

    #[test]
    fn invalid_chart_time_is_empty() {
        assert_eq!(format_chart_time(f64::NAN), "");
        assert_eq!(format_chart_time(f64::INFINITY), "");
        assert_eq!(format_chart_time(1e300), "");
    }

    #[test]
    fn elapsed_time_picks_a_unit() {
        assert_eq!(format_elapsed_time(None), "-");
        assert_eq!(format_elapsed_time(Some(123.4)), "123ms");
        assert_eq!(format_elapsed_time(Some(1234.0)), "1.23s");
        assert_eq!(format_elapsed_time(Some(125_000.0)), "2m 5s");
    }

    #[test]
    fn elapsed_time_rounds_before_picking_a_unit() {
        assert_eq!(format_elapsed_time(Some(999.4)), "999ms");
        assert_eq!(format_elapsed_time(Some(999.6)), "1.00s");
        assert_eq!(format_elapsed_time(Some(59_994.0)), "59.99s");
        assert_eq!(format_elapsed_time(Some(59_999.0)), "1m 0s");
    }

    #[test]
    fn in_flight_rows_sort_last() {
        let mut runs = RunsState::new();
        for event in [
            RunEvent::new("r", "late", RunStatus::Running, 1.0),
            RunEvent::new("r", "b", RunStatus::Running, 5.0),
            RunEvent::new("r", "b", RunStatus::Success, 6.0),
            RunEvent::new("r", "a", RunStatus::Running, 2.0),
            RunEvent::new("r", "a", RunStatus::Error, 3.0),
            RunEvent::new("r", "waiting", RunStatus::Queued, 0.5),
        ] {
            runs.apply(&event);
        }
        let run = runs.run(&"r".into()).unwrap();
        let cells: Vec<CellId> = ["a", "b", "late"].into_iter().map(CellId::from).collect();

        let rows = chart_values_in(run, &cells, &Utc);

        let order: Vec<&str> = rows.iter().map(|row| row.cell.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "late", "waiting"]);
        assert_eq!(rows[0].tone(), BarTone::Error);
        assert_eq!(rows[1].elapsed_time, "1.00s");
        assert_eq!(rows[2].elapsed_time, "-");
        assert_eq!(rows[2].end_timestamp, "");
        assert_eq!(rows[2].cell_num, Some(2));
        assert_eq!(rows[3].cell_num, None);
    }

    #[test]
    fn hover_clears_to_none() {
        let chart = SharedHover::new();
        let list = chart.clone();

        chart.set("a".into());
        assert!(list.is_hovered(&"a".into()));
        list.clear();
        assert_eq!(chart.get(), HoveredCell::None);
    }
}
