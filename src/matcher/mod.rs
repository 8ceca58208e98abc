//! Pluggable matching engines.
//!
//! A matching engine indexes expression parts and, given an event, writes every
//! part that *may* match into a shared [`MatchResult`]. Engines only narrow the
//! candidate set: false positives are expected and are removed later by exact
//! evaluation, false negatives are not allowed.
//!
//! ## Core Components
//!
//! - [`MatchingEngine`] - Contract shared by every strategy
//! - [`StringHashEngine`] - Hashed string equality/inequality lookups
//! - [`FieldPath`] - JSON-path style field extraction from events
//!
//! ## Example Usage
//!
//! ```rust
//! use expr_match::ir::{ExpressionPart, GroupId, Predicate, OPTIMIZE_NONE};
//! use expr_match::matcher::{MatchingEngine, StringHashEngine};
//! use expr_match::MatchResult;
//! use serde_json::json;
//! use uuid::Uuid;
//!
//! let engine = StringHashEngine::new()?;
//! let id = Uuid::new_v4();
//! engine.add(&ExpressionPart::new(
//!     id,
//!     GroupId::new(1, OPTIMIZE_NONE),
//!     Predicate::equals("event.name", "app/signup"),
//! ))?;
//!
//! let result = MatchResult::new();
//! engine.match_event(&json!({"event": {"name": "app/signup"}}), &result)?;
//! assert!(result.contains(id));
//! # Ok::<(), expr_match::ExprError>(())
//! ```

pub mod fields;
pub mod string_hash;

pub use fields::{string_at, FieldPath};
pub use string_hash::{EngineStats, StringHashEngine};

use crate::error::Result;
use crate::ir::ExpressionPart;
use crate::result::MatchResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable identifier of a matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EngineType {
    #[serde(rename = "string-hash")]
    StringHash,
}

impl EngineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::StringHash => "string-hash",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract implemented by every matching strategy.
///
/// Implementations are shared between threads: `match_event` may run
/// concurrently with `add`, `remove` and other `match_event` calls.
pub trait MatchingEngine: Send + Sync {
    fn engine_type(&self) -> EngineType;

    /// Index a part. Fails with `UnsupportedOperator` for operators the
    /// engine cannot handle. Engines may also reject parts they could never
    /// evaluate with `InvalidPredicate`; [`StringHashEngine`] does so for a
    /// `!=` predicate without a field identifier.
    fn add(&self, part: &ExpressionPart) -> Result<()>;

    /// Remove a previously added part. Fails with `PartNotFound` when no
    /// matching part is indexed.
    fn remove(&self, part: &ExpressionPart) -> Result<()>;

    /// Record every part that may match `event` into `result`.
    fn match_event(&self, event: &Value, result: &MatchResult) -> Result<()>;

    /// Record parts matching `value` directly, without extracting it from an event.
    fn search(&self, variable: &str, value: &Value, result: &MatchResult);
}
