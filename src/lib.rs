//! # expr-match
//!
//! Candidate matching for event-driven expression engines.
//!
//! Workflows subscribe to events with boolean expressions. Evaluating every
//! expression against every incoming event does not scale, so expressions are
//! compiled upstream into predicates ([`ExpressionPart`]s) and indexed by
//! matching engines. For each event, the engines report which expressions
//! *may* match; only those candidates are handed to exact evaluation.
//!
//! Engines narrow, they never decide: false positives are tolerated, false
//! negatives are not.
//!
//! ## Quick Start
//!
//! ```rust
//! use expr_match::ir::{ExpressionPart, GroupId, Predicate, OPTIMIZE_NONE};
//! use expr_match::{EngineConfig, MatchResult, MatchingEngine, StringHashEngine};
//! use serde_json::json;
//! use uuid::Uuid;
//!
//! let engine = StringHashEngine::with_config(EngineConfig::default())?;
//!
//! // status == "active"
//! let active = Uuid::new_v4();
//! engine.add(&ExpressionPart::new(
//!     active,
//!     GroupId::new(1, OPTIMIZE_NONE),
//!     Predicate::equals("status", "active"),
//! ))?;
//!
//! // status != "inactive"
//! let not_inactive = Uuid::new_v4();
//! engine.add(&ExpressionPart::new(
//!     not_inactive,
//!     GroupId::new(1, OPTIMIZE_NONE),
//!     Predicate::not_equals("status", "inactive"),
//! ))?;
//!
//! let result = MatchResult::new();
//! engine.match_event(&json!({"status": "active"}), &result)?;
//! assert!(result.contains(active));
//! assert!(result.contains(not_inactive));
//! # Ok::<(), expr_match::ExprError>(())
//! ```
//!
//! ## Sharing Engines
//!
//! Engines are `Send + Sync` and are meant to be shared, typically as
//! `Arc<dyn MatchingEngine>`, between the threads registering expressions and
//! the threads matching events. Several engines can write into the same
//! [`MatchResult`] for one event.

pub mod config;
pub mod error;
pub mod ir;
pub mod matcher;
pub mod result;
pub mod task_group;

pub use config::{EngineConfig, MAX_CONCURRENCY};
pub use error::{ExprError, Result};
pub use ir::{
    EvaluableId, ExpressionPart, GroupId, Operator, Predicate, StoredExpressionPart, OPTIMIZE_NONE,
};
pub use matcher::{EngineStats, EngineType, FieldPath, MatchingEngine, StringHashEngine};
pub use result::MatchResult;
pub use task_group::TaskGroup;
