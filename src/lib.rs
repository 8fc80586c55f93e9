//! Deterministic design rule checker core for PCB layouts
//!
//! Consumes a fully described [`BoardModel`](board::BoardModel) and produces
//! a stable list of rule violations with polygonal location hints. All
//! geometry lives in signed integer nanometres; two runs over the same model
//! and settings yield byte-identical messages and approval keys, so user
//! approvals stay valid across runs.
//!
//! ```no_run
//! use boardcheck::board::BoardModel;
//! use boardcheck::drc::{run_drc, BoardDesignRuleCheckSettings, CancelToken, NullObserver};
//!
//! let model = BoardModel::new("demo", 0);
//! let settings = BoardDesignRuleCheckSettings::default();
//! let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
//! for message in &outcome.messages {
//!     println!("[{}] {}", message.severity.label(), message.message);
//! }
//! ```

pub mod board;
pub mod drc;
pub mod geometry;
pub mod sexpr;

pub use board::BoardModel;
pub use drc::{
    run_drc, BoardDesignRuleCheckSettings, CancelToken, DrcObserver, NullObserver,
    RuleCheckMessage, RunOutcome, Severity,
};
pub use sexpr::SExpr;
