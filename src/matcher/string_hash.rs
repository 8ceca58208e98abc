//! Hashed string equality/inequality matching.
//!
//! This engine does nothing fancy: string literals from `==` and `!=`
//! predicates are hashed into map keys pointing at the parts that reference
//! them. For an incoming event, the value at every known field path is hashed
//! and looked up directly instead of evaluating each expression.
//!
//! Literals are stored as xxHash64 digests, so memory grows predictably even for
//! long strings. Two different literals can share a digest; that only ever adds
//! candidates, since each bucket keeps every part for the digest and exact
//! evaluation filters them afterwards.
//!
//! # Matching
//!
//! Matching runs in two phases, each resolving its field paths concurrently:
//!
//! 1. **Equality**: for every field path referenced by an `==` part, hash the
//!    event value and record each part in the bucket whose declared identifier
//!    is that path (or which declares none).
//! 2. **Inequality**: for every field path referenced by a `!=` part, record
//!    the parts of every bucket except the one matching the event value.
//!
//! When phase 1 records a part whose group carries an optimization flag, phase
//! 2 only records inequality parts whose group already has at least `flag`
//! hits. Groups below that threshold cannot complete, so their parts are
//! skipped.

use super::fields;
use super::{EngineType, MatchingEngine};
use crate::config::EngineConfig;
use crate::error::{ExprError, Result};
use crate::ir::{ExpressionPart, Operator, StoredExpressionPart, OPTIMIZE_NONE};
use crate::result::MatchResult;
use crate::task_group::TaskGroup;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, instrument, trace, warn};
use xxhash_rust::xxh64::xxh64;

type Buckets = HashMap<String, Vec<StoredExpressionPart>>;

#[derive(Debug, Default)]
struct Index {
    /// Field paths declared by equality parts, with the number of parts using each.
    vars: HashMap<String, usize>,
    /// Literal digest to equality parts.
    equality: Buckets,
    /// Field path to literal digest to inequality parts.
    inequality: HashMap<String, Buckets>,
}

/// Snapshot of index sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Distinct literal digests in the equality index
    pub equality_buckets: usize,
    /// Equality parts across all buckets
    pub equality_parts: usize,
    /// Field paths resolved during the equality phase
    pub observed_paths: usize,
    /// Field paths with at least one inequality bucket
    pub inequality_paths: usize,
    /// Inequality parts across all paths and buckets
    pub inequality_parts: usize,
}

impl EngineStats {
    pub fn total_parts(&self) -> usize {
        self.equality_parts + self.inequality_parts
    }
}

/// Matching engine for string `==` and `!=` predicates.
#[derive(Debug)]
pub struct StringHashEngine {
    index: RwLock<Index>,
    tasks: TaskGroup,
    strict_inequality_removal: bool,
}

impl StringHashEngine {
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let tasks = TaskGroup::with_thread_name(config.concurrency, &config.thread_name_prefix)?;

        debug!(
            concurrency = config.concurrency,
            strict_inequality_removal = config.strict_inequality_removal,
            "created string-hash engine"
        );

        Ok(Self {
            index: RwLock::new(Index::default()),
            tasks,
            strict_inequality_removal: config.strict_inequality_removal,
        })
    }

    pub fn stats(&self) -> EngineStats {
        let index = self.read();
        EngineStats {
            equality_buckets: index.equality.len(),
            equality_parts: index.equality.values().map(Vec::len).sum(),
            observed_paths: index.vars.len(),
            inequality_paths: index.inequality.len(),
            inequality_parts: index
                .inequality
                .values()
                .flat_map(HashMap::values)
                .map(Vec::len)
                .sum(),
        }
    }

    /// Field paths currently resolved during the equality phase, sorted.
    pub fn observed_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.read().vars.keys().cloned().collect();
        paths.sort();
        paths
    }

    // Index mutations never leave a half-applied state, so poisoned locks are recovered.
    fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record equality parts whose literal hashes like `input`.
    ///
    /// With a `variable`, parts declaring a different identifier are skipped.
    /// Returns whether any recorded part's group carries an optimization flag.
    fn equality_search(&self, variable: Option<&str>, input: &str, result: &MatchResult) -> bool {
        let key = hash(input);
        let index = self.read();
        let Some(bucket) = index.equality.get(&key) else {
            return false;
        };

        let mut optimized = false;
        let matched: Vec<&StoredExpressionPart> = bucket
            .iter()
            .filter(|part| match (variable, part.ident.as_deref()) {
                (Some(variable), Some(ident)) => ident == variable,
                _ => true,
            })
            .inspect(|part| optimized |= part.group_id.flag() != OPTIMIZE_NONE)
            .collect();

        result.add_parts(matched);
        optimized
    }

    /// Record inequality parts on `variable` whose literal differs from `input`.
    fn inequality_search(
        &self,
        variable: &str,
        input: &str,
        neq_optimized: bool,
        result: &MatchResult,
    ) {
        let key = hash(input);
        let index = self.read();
        let Some(buckets) = index.inequality.get(variable) else {
            return;
        };

        for (value, parts) in buckets {
            if *value == key {
                continue;
            }

            if !neq_optimized {
                result.add_parts(parts);
                continue;
            }

            for part in parts {
                let matches = result.group_matches(part.evaluable_id, part.group_id);
                if matches < usize::from(part.group_id.flag()) {
                    continue;
                }
                result.add(part.evaluable_id, part.group_id);
            }
        }
    }
}

impl MatchingEngine for StringHashEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::StringHash
    }

    fn add(&self, part: &ExpressionPart) -> Result<()> {
        let predicate = &part.predicate;

        match predicate.operator {
            Operator::Equals => {
                let key = hash(predicate.literal_as_string());
                let stored = part.to_stored();

                let mut guard = self.write();
                let index = &mut *guard;
                let bucket = index.equality.entry(key).or_default();
                if bucket.iter().any(|existing| part.equals_stored(existing)) {
                    return Ok(());
                }
                if let Some(ident) = &stored.ident {
                    *index.vars.entry(ident.clone()).or_insert(0) += 1;
                }
                bucket.push(stored);
            }
            Operator::NotEquals => {
                if predicate.ident.is_empty() {
                    return Err(ExprError::InvalidPredicate(
                        "inequality predicates require a field identifier".to_string(),
                    ));
                }
                let key = hash(predicate.literal_as_string());
                let stored = part.to_stored();

                let mut index = self.write();
                let bucket = index
                    .inequality
                    .entry(predicate.ident.clone())
                    .or_default()
                    .entry(key)
                    .or_default();
                if bucket.iter().any(|existing| part.equals_stored(existing)) {
                    return Ok(());
                }
                bucket.push(stored);
            }
            operator => return Err(ExprError::UnsupportedOperator(operator)),
        }

        debug!(
            evaluable_id = %part.evaluable_id,
            group_id = %part.group_id,
            operator = %predicate.operator,
            ident = %predicate.ident,
            "indexed expression part"
        );
        Ok(())
    }

    fn remove(&self, part: &ExpressionPart) -> Result<()> {
        let predicate = &part.predicate;

        match predicate.operator {
            Operator::Equals => {
                let key = hash(predicate.literal_as_string());

                let mut guard = self.write();
                let index = &mut *guard;
                let bucket = index
                    .equality
                    .get_mut(&key)
                    .ok_or(ExprError::PartNotFound)?;
                let position = bucket
                    .iter()
                    .position(|existing| part.equals_stored(existing))
                    .ok_or(ExprError::PartNotFound)?;

                let removed = bucket.remove(position);
                if let Some(ident) = removed.ident {
                    release_path(&mut index.vars, &ident);
                }
            }
            Operator::NotEquals => {
                let key = hash(predicate.literal_as_string());

                let mut index = self.write();
                let buckets = index
                    .inequality
                    .get_mut(&predicate.ident)
                    .ok_or(ExprError::PartNotFound)?;
                let Some(bucket) = buckets.get_mut(&key) else {
                    if self.strict_inequality_removal {
                        return Err(ExprError::PartNotFound);
                    }
                    return Ok(());
                };
                let position = bucket
                    .iter()
                    .position(|existing| part.equals_stored(existing))
                    .ok_or(ExprError::PartNotFound)?;

                bucket.remove(position);
            }
            operator => return Err(ExprError::UnsupportedOperator(operator)),
        }

        debug!(
            evaluable_id = %part.evaluable_id,
            group_id = %part.group_id,
            operator = %predicate.operator,
            ident = %predicate.ident,
            "removed expression part"
        );
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(engine = %EngineType::StringHash))]
    fn match_event(&self, event: &Value, result: &MatchResult) -> Result<()> {
        let neq_optimized = AtomicUsize::new(0);

        let paths: Vec<String> = self.read().vars.keys().cloned().collect();
        trace!(paths = paths.len(), "equality phase");
        self.tasks
            .for_each(paths, |path| -> Result<()> {
                let value = fields::string_at(&path, event)?;
                if self.equality_search(Some(path.as_str()), value, result) {
                    neq_optimized.fetch_add(1, Ordering::Relaxed);
                }
                Ok(())
            })
            .map_err(|err| {
                warn!(error = %err, phase = "equality", "match phase aborted");
                err
            })?;

        // The task group has joined, so every increment is visible here.
        let neq_optimized = neq_optimized.load(Ordering::Relaxed) > 0;

        let paths: Vec<String> = self.read().inequality.keys().cloned().collect();
        trace!(paths = paths.len(), neq_optimized, "inequality phase");
        self.tasks
            .for_each(paths, |path| -> Result<()> {
                let value = fields::string_at(&path, event)?;
                self.inequality_search(&path, value, neq_optimized, result);
                Ok(())
            })
            .map_err(|err| {
                warn!(error = %err, phase = "inequality", "match phase aborted");
                err
            })
    }

    fn search(&self, _variable: &str, value: &Value, result: &MatchResult) {
        // Identifiers are ignored: the caller already resolved the value.
        if let Some(input) = value.as_str() {
            self.equality_search(None, input, result);
        }
    }
}

fn release_path(vars: &mut HashMap<String, usize>, path: &str) {
    if let Some(count) = vars.get_mut(path) {
        *count -= 1;
        if *count == 0 {
            vars.remove(path);
        }
    }
}

/// Digest of a literal, rendered in base 36.
pub(crate) fn hash(input: &str) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut value = xxh64(input.as_bytes(), 0);
    if value == 0 {
        return "0".to_string();
    }

    let mut buf = [0u8; 13];
    let mut pos = buf.len();
    while value > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    buf[pos..].iter().map(|&digit| digit as char).collect()
}
