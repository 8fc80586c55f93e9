//! Design rule checking
//!
//! # Submodules
//! - `settings` - check parameters
//! - `types` - messages, severities, errors
//! - `messages` - constructors for every violation kind
//! - `geometry` - board object to polygon extraction
//! - `checks` - the individual checks
//! - `runners` - run orchestration, progress, cancellation
//! - `approval` - approval filtering and report formatting

pub mod approval;
mod checks;
pub mod geometry;
pub mod messages;
pub mod runners;
pub mod settings;
pub mod types;

pub use approval::{format_report, resolve_approvals, sort_for_presentation};
pub use runners::{max_arc_tolerance, run_drc, CancelToken, DrcObserver, NullObserver, RunOutcome};
pub use settings::{AllowedSlots, BoardDesignRuleCheckSettings};
pub use types::{DrcError, RuleCheckMessage, Severity};
