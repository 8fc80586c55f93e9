//! Rule check execution
//!
//! `run_drc` drives the checks in their fixed order, emits progress and
//! status through the injected observer, observes the cancel token between
//! checks and owns the per-run copper cache.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::board::{BoardModel, Layer};
use crate::drc::checks;
use crate::drc::geometry::BoardPathGenerator;
use crate::drc::settings::BoardDesignRuleCheckSettings;
use crate::drc::types::{DrcError, RuleCheckMessage};
use crate::geometry::{Length, PolygonSet, PositiveLength};

/// Chord error bound for arc flattening, shared by every check so all
/// geometry is seen within the same tolerance
pub fn max_arc_tolerance() -> PositiveLength {
    PositiveLength::clamped(Length::new(5_000))
}

/// Receives progress, status and messages while a run executes
pub trait DrcObserver: Sync {
    fn started(&self) {}
    fn progress(&self, _percent: u8) {}
    fn status(&self, _status: &str) {}
    fn message(&self, _message: &RuleCheckMessage) {}
    fn finished(&self, _cancelled: bool) {}
}

/// Observer that ignores everything
pub struct NullObserver;

impl DrcObserver for NullObserver {}

/// Cooperative cancellation flag, observed between checks only
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one rule check run. A cancelled or fatally terminated run keeps
/// the messages emitted so far.
#[derive(Debug)]
pub struct RunOutcome {
    pub messages: Vec<RuleCheckMessage>,
    pub cancelled: bool,
    pub status_log: Vec<String>,
    pub fatal_error: Option<DrcError>,
}

/// Shared state of one run, handed to every check
pub(crate) struct CheckContext<'a> {
    pub model: &'a BoardModel,
    pub settings: &'a BoardDesignRuleCheckSettings,
    pub ignore_planes: bool,
    generator: BoardPathGenerator<'a>,
    observer: &'a dyn DrcObserver,
    messages: Vec<RuleCheckMessage>,
    status_log: Vec<String>,
    progress: u8,
    copper_cache: IndexMap<(Layer, Vec<Option<Uuid>>), PolygonSet>,
}

impl<'a> CheckContext<'a> {
    fn new(
        model: &'a BoardModel,
        settings: &'a BoardDesignRuleCheckSettings,
        ignore_planes: bool,
        observer: &'a dyn DrcObserver,
    ) -> Self {
        CheckContext {
            model,
            settings,
            ignore_planes,
            generator: BoardPathGenerator::new(model, max_arc_tolerance()),
            observer,
            messages: Vec::new(),
            status_log: Vec::new(),
            progress: 0,
            copper_cache: IndexMap::new(),
        }
    }

    pub fn generator(&self) -> &BoardPathGenerator<'a> {
        &self.generator
    }

    pub fn status(&mut self, text: &str) {
        self.status_log.push(text.to_string());
        self.observer.status(text);
    }

    pub fn emit(&mut self, message: RuleCheckMessage) {
        self.observer.message(&message);
        self.messages.push(message);
    }

    fn set_progress(&mut self, percent: u8) {
        // progress is monotone even if a caller passes a stale checkpoint
        self.progress = self.progress.max(percent);
        self.observer.progress(self.progress);
    }

    /// Copper union on one layer filtered by nets, cached per run
    pub fn copper_area(&mut self, layer: Layer, net_filter: &[Option<Uuid>]) -> PolygonSet {
        let key = (layer, net_filter.to_vec());
        if let Some(cached) = self.copper_cache.get(&key) {
            return cached.clone();
        }
        let area = self
            .generator
            .copper_area(layer, net_filter, self.ignore_planes);
        self.copper_cache.insert(key, area.clone());
        area
    }
}

enum Stop {
    Cancelled,
    Fatal(DrcError),
}

fn run_step(
    ctx: &mut CheckContext,
    cancel: &CancelToken,
    check: fn(&mut CheckContext),
    progress_end: u8,
) -> Result<(), Stop> {
    if cancel.is_cancelled() {
        return Err(Stop::Cancelled);
    }
    let result = catch_unwind(AssertUnwindSafe(|| check(ctx)));
    match result {
        Ok(()) => {
            ctx.set_progress(progress_end);
            Ok(())
        }
        Err(payload) => {
            let text = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "geometry computation failed".into());
            eprintln!("[DRC] Fatal error, terminating run: {}", text);
            Err(Stop::Fatal(DrcError::Runtime(text)))
        }
    }
}

/// Runs the design rule check. In quick mode only the copper width and the
/// three clearance checks execute and planes are ignored.
pub fn run_drc(
    model: &BoardModel,
    settings: &BoardDesignRuleCheckSettings,
    quick: bool,
    cancel: &CancelToken,
    observer: &dyn DrcObserver,
) -> RunOutcome {
    let start = std::time::Instant::now();
    observer.started();

    let mut ctx = CheckContext::new(model, settings, quick, observer);
    ctx.set_progress(2);

    let outcome = execute(&mut ctx, model, quick, cancel);
    let (cancelled, fatal_error) = match outcome {
        Ok(()) => {
            ctx.status(&format!(
                "Finished with {} message(s)!",
                ctx.messages.len()
            ));
            ctx.set_progress(100);
            (false, None)
        }
        Err(Stop::Cancelled) => (true, None),
        Err(Stop::Fatal(error)) => (false, Some(error)),
    };

    eprintln!(
        "[DRC] Run finished: {} message(s), cancelled = {}, in {:?}",
        ctx.messages.len(),
        cancelled,
        start.elapsed()
    );
    observer.finished(cancelled);

    RunOutcome {
        messages: ctx.messages,
        cancelled,
        status_log: ctx.status_log,
        fatal_error,
    }
}

fn execute(
    ctx: &mut CheckContext,
    model: &BoardModel,
    quick: bool,
    cancel: &CancelToken,
) -> Result<(), Stop> {
    if !quick {
        if cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        ctx.status("Rebuild planes...");
        let rebuilt = catch_unwind(AssertUnwindSafe(|| {
            model.rebuild_planes(max_arc_tolerance())
        }));
        if rebuilt.is_err() {
            return Err(Stop::Fatal(DrcError::Runtime(
                "plane rebuild failed".into(),
            )));
        }
        ctx.set_progress(12);
    }

    run_step(ctx, cancel, checks::check_minimum_copper_width, 14)?;
    run_step(ctx, cancel, checks::check_copper_copper_clearances, 24)?;
    run_step(ctx, cancel, checks::check_copper_board_clearances, 34)?;
    run_step(ctx, cancel, checks::check_copper_hole_clearances, 44)?;

    if !quick {
        run_step(ctx, cancel, checks::check_drill_drill_clearances, 49)?;
        run_step(ctx, cancel, checks::check_drill_board_clearances, 54)?;
        run_step(ctx, cancel, checks::check_minimum_pth_annular_ring, 64)?;
        run_step(ctx, cancel, checks::check_minimum_npth_drill_diameter, 66)?;
        run_step(ctx, cancel, checks::check_minimum_npth_slot_width, 68)?;
        run_step(ctx, cancel, checks::check_minimum_pth_drill_diameter, 70)?;
        run_step(ctx, cancel, checks::check_minimum_pth_slot_width, 72)?;
        run_step(ctx, cancel, checks::check_allowed_npth_slots, 74)?;
        run_step(ctx, cancel, checks::check_allowed_pth_slots, 76)?;
        run_step(ctx, cancel, checks::check_invalid_pad_connections, 78)?;
        run_step(ctx, cancel, checks::check_courtyard_clearances, 88)?;
        run_step(ctx, cancel, checks::check_board_outline, 91)?;
        run_step(ctx, cancel, checks::check_for_unplaced_components, 92)?;
        run_step(ctx, cancel, checks::check_circuit_default_devices, 93)?;
        run_step(ctx, cancel, checks::check_for_missing_connections, 95)?;
        run_step(ctx, cancel, checks::check_for_stale_objects, 97)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_empty_board_quick_run() {
        let model = BoardModel::new("empty", 0);
        let settings = BoardDesignRuleCheckSettings::default();
        let outcome = run_drc(&model, &settings, true, &CancelToken::new(), &NullObserver);
        assert!(!outcome.cancelled);
        assert!(outcome.fatal_error.is_none());
        // all checks disabled: only the final status entry
        assert_eq!(outcome.status_log.len(), 1);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let model = BoardModel::new("empty", 0);
        let settings = BoardDesignRuleCheckSettings::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = run_drc(&model, &settings, false, &cancel, &NullObserver);
        assert!(outcome.cancelled);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_progress_monotone_and_complete() {
        use std::sync::Mutex;
        struct Recorder(Mutex<Vec<u8>>);
        impl DrcObserver for Recorder {
            fn progress(&self, percent: u8) {
                self.0.lock().unwrap().push(percent);
            }
        }
        let model = BoardModel::new("empty", 1);
        let settings = BoardDesignRuleCheckSettings::default();
        let recorder = Recorder(Mutex::new(Vec::new()));
        let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &recorder);
        assert!(!outcome.cancelled);
        let seen = recorder.0.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.first().unwrap(), 2);
        assert_eq!(*seen.last().unwrap(), 100);
    }
}
