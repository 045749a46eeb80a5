//! Per-run execution traces fed by kernel status messages.
//!
//! Every cell run moves `queued → running → success | error`. Messages may
//! arrive twice; repeats and regressions are dropped instead of rewinding
//! a record.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::str::FromStr;

use crate::cells::CellId;
use crate::settings::ParseError;

pub const DEFAULT_MAX_RUNS: usize = 50;
/// Longest code snapshot kept per cell run, in characters.
pub const MAX_CODE_LENGTH: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum RunStatus {
    Queued,
    Running,
    Success,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Error)
    }

    fn stage(self) -> u8 {
        match self {
            RunStatus::Queued => 0,
            RunStatus::Running => 1,
            RunStatus::Success | RunStatus::Error => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

impl FromStr for RunStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(RunStatus::Queued),
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "error" => Ok(RunStatus::Error),
            other => Err(ParseError::RunStatus(other.to_owned())),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and status of one cell within one run. Times are in seconds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRun {
    pub cell_id: CellId,
    /// Code as it was when the run started, truncated to [`MAX_CODE_LENGTH`].
    pub code: String,
    pub start_time: f64,
    /// Set once the cell reaches a terminal status.
    pub elapsed_time: Option<f64>,
    pub status: RunStatus,
}

impl CellRun {
    pub fn end_time(&self) -> Option<f64> {
        self.elapsed_time.map(|elapsed| self.start_time + elapsed)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Run {
    pub run_id: RunId,
    pub run_start_time: f64,
    /// In the order cells joined the run.
    pub cell_runs: Vec<CellRun>,
}

impl Run {
    pub fn cell_run(&self, cell: &CellId) -> Option<&CellRun> {
        self.cell_runs.iter().find(|run| &run.cell_id == cell)
    }

    pub fn is_finished(&self) -> bool {
        self.cell_runs.iter().all(|run| run.status.is_terminal())
    }
}

/// One status transition reported by the kernel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunEvent {
    pub cell_id: CellId,
    pub run_id: RunId,
    pub status: RunStatus,
    /// When the transition happened, in seconds since the epoch.
    pub timestamp: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub elapsed_time: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub code: Option<String>,
}

impl RunEvent {
    pub fn new(
        run_id: impl Into<RunId>,
        cell_id: impl Into<CellId>,
        status: RunStatus,
        timestamp: f64,
    ) -> Self {
        Self {
            cell_id: cell_id.into(),
            run_id: run_id.into(),
            status,
            timestamp,
            elapsed_time: None,
            code: None,
        }
    }

    pub fn elapsed_time(mut self, elapsed: f64) -> Self {
        self.elapsed_time = Some(elapsed);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// What [`RunsState::apply`] did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event opened a new run.
    RunStarted,
    /// The cell joined an existing run.
    CellAdded,
    Updated,
    /// Duplicate or out-of-order delivery.
    Ignored,
}

/// Recorded runs, newest first.
#[derive(Clone, Debug)]
pub struct RunsState {
    run_ids: VecDeque<RunId>,
    run_map: HashMap<RunId, Run>,
    /// Ids dropped by retention, newest first. Late deliveries for these
    /// are ignored instead of reopening the run.
    evicted: VecDeque<RunId>,
    max_runs: usize,
}

impl Default for RunsState {
    fn default() -> Self {
        Self::with_max_runs(DEFAULT_MAX_RUNS)
    }
}

impl RunsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_runs(max_runs: usize) -> Self {
        Self {
            run_ids: VecDeque::new(),
            run_map: HashMap::new(),
            evicted: VecDeque::new(),
            max_runs: max_runs.max(1),
        }
    }

    pub fn apply(&mut self, event: &RunEvent) -> EventOutcome {
        let mut outcome = EventOutcome::CellAdded;
        if !self.run_map.contains_key(&event.run_id) {
            if self.evicted.contains(&event.run_id) {
                log::debug!("ignoring late {} for evicted run {}", event.status, event.run_id);
                return EventOutcome::Ignored;
            }
            self.start_run(&event.run_id, event.timestamp);
            outcome = EventOutcome::RunStarted;
        }
        let Some(run) = self.run_map.get_mut(&event.run_id) else {
            return EventOutcome::Ignored;
        };

        let Some(cell_run) = run
            .cell_runs
            .iter_mut()
            .find(|cell_run| cell_run.cell_id == event.cell_id)
        else {
            run.cell_runs.push(CellRun {
                cell_id: event.cell_id.clone(),
                code: truncate_code(event.code.as_deref().unwrap_or_default()),
                start_time: event.timestamp,
                elapsed_time: event
                    .status
                    .is_terminal()
                    .then(|| event.elapsed_time.unwrap_or(0.0).max(0.0)),
                status: event.status,
            });
            return outcome;
        };

        if cell_run.status.is_terminal() || event.status.stage() <= cell_run.status.stage() {
            if cell_run.status != event.status {
                log::debug!(
                    "ignoring {} -> {} for cell {} in run {}",
                    cell_run.status,
                    event.status,
                    event.cell_id,
                    event.run_id
                );
            }
            return EventOutcome::Ignored;
        }

        if cell_run.code.is_empty() {
            if let Some(code) = &event.code {
                cell_run.code = truncate_code(code);
            }
        }
        match event.status {
            RunStatus::Queued => {}
            RunStatus::Running => cell_run.start_time = event.timestamp,
            RunStatus::Success | RunStatus::Error => {
                let elapsed = event
                    .elapsed_time
                    .unwrap_or(event.timestamp - cell_run.start_time);
                cell_run.elapsed_time = Some(elapsed.max(0.0));
            }
        }
        cell_run.status = event.status;
        EventOutcome::Updated
    }

    fn start_run(&mut self, run_id: &RunId, timestamp: f64) {
        self.run_ids.push_front(run_id.clone());
        self.run_map.insert(
            run_id.clone(),
            Run {
                run_id: run_id.clone(),
                run_start_time: timestamp,
                cell_runs: Vec::new(),
            },
        );
        while self.run_ids.len() > self.max_runs {
            if let Some(evicted) = self.run_ids.pop_back() {
                log::debug!("evicting run {evicted}");
                self.run_map.remove(&evicted);
                self.evicted.push_front(evicted);
                self.evicted.truncate(self.max_runs);
            }
        }
    }

    pub fn run_ids(&self) -> impl Iterator<Item = &RunId> {
        self.run_ids.iter()
    }

    /// Runs, newest first.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.run_ids.iter().filter_map(|id| self.run_map.get(id))
    }

    pub fn run(&self, run_id: &RunId) -> Option<&Run> {
        self.run_map.get(run_id)
    }

    /// Most recent record of `cell` across all runs.
    pub fn latest_cell_run(&self, cell: &CellId) -> Option<&CellRun> {
        self.runs().find_map(|run| run.cell_run(cell))
    }

    pub fn remove_run(&mut self, run_id: &RunId) -> Option<Run> {
        self.run_ids.retain(|id| id != run_id);
        self.run_map.remove(run_id)
    }

    /// Forgets every run. In-flight cells keep running in the kernel.
    pub fn clear_runs(&mut self) {
        self.run_ids.clear();
        self.run_map.clear();
    }

    pub fn len(&self) -> usize {
        self.run_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.run_ids.is_empty()
    }
}

fn truncate_code(code: &str) -> String {
    match code.char_indices().nth(MAX_CODE_LENGTH) {
        Some((end, _)) => code[..end].to_owned(),
        None => code.to_owned(),
    }
}
