//! Intermediate representation of indexed expression parts.
//!
//! An expression compiled upstream is broken into predicates. Each predicate is
//! tagged with the expression it belongs to ([`EvaluableId`]) and the group of
//! parts that must jointly match ([`GroupId`]), forming an [`ExpressionPart`].
//! Engines retain the compact [`StoredExpressionPart`] form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;
use xxhash_rust::xxh64::Xxh64;

/// Identifier of the expression that owns a part.
pub type EvaluableId = Uuid;

/// Group flag meaning "no threshold": any hit makes the group a candidate.
pub const OPTIMIZE_NONE: u8 = 0x0;

/// Comparison operators produced by the expression compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Greater,
    GreaterEquals,
    Less,
    LessEquals,
    In,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Greater => ">",
            Operator::GreaterEquals => ">=",
            Operator::Less => "<",
            Operator::LessEquals => "<=",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison between an event field and a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field path the predicate reads. Empty when no identifier was declared.
    pub ident: String,
    pub operator: Operator,
    pub literal: Value,
}

impl Predicate {
    pub fn new(ident: impl Into<String>, operator: Operator, literal: impl Into<Value>) -> Self {
        Self {
            ident: ident.into(),
            operator,
            literal: literal.into(),
        }
    }

    pub fn equals(ident: impl Into<String>, literal: impl Into<Value>) -> Self {
        Self::new(ident, Operator::Equals, literal)
    }

    pub fn not_equals(ident: impl Into<String>, literal: impl Into<Value>) -> Self {
        Self::new(ident, Operator::NotEquals, literal)
    }

    /// String form of the literal. Non-string literals map to the empty string.
    pub fn literal_as_string(&self) -> &str {
        self.literal.as_str().unwrap_or("")
    }

    /// 64-bit digest of identifier, operator and literal.
    pub fn predicate_id(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        hasher.update(self.ident.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.operator.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(self.literal.to_string().as_bytes());
        hasher.digest()
    }
}

/// Identifier of a group of parts within an expression.
///
/// Layout, in bytes:
/// - `0..2`: group size as a little endian `u16`
/// - `2`: optimization flag
/// - `3..8`: random
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId([u8; 8]);

impl GroupId {
    pub fn new(size: u16, flag: u8) -> Self {
        let mut id = [0u8; 8];
        id[0..2].copy_from_slice(&size.to_le_bytes());
        id[2] = flag;
        id[3..8].copy_from_slice(&Uuid::new_v4().as_bytes()[..5]);
        Self(id)
    }

    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Number of parts that must match for the group to be satisfied.
    pub fn size(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    /// Optimization flag. Non-zero values are a match-count threshold.
    pub fn flag(&self) -> u8 {
        self.0[2]
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({self})")
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A predicate tagged with its owning expression and group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionPart {
    pub evaluable_id: EvaluableId,
    pub group_id: GroupId,
    pub predicate: Predicate,
}

impl ExpressionPart {
    pub fn new(evaluable_id: EvaluableId, group_id: GroupId, predicate: Predicate) -> Self {
        Self {
            evaluable_id,
            group_id,
            predicate,
        }
    }

    pub fn to_stored(&self) -> StoredExpressionPart {
        let ident = if self.predicate.ident.is_empty() {
            None
        } else {
            Some(self.predicate.ident.clone())
        };

        StoredExpressionPart {
            evaluable_id: self.evaluable_id,
            group_id: self.group_id,
            predicate_id: self.predicate.predicate_id(),
            ident,
        }
    }

    /// Whether `stored` was produced from a part equal to this one.
    pub fn equals_stored(&self, stored: &StoredExpressionPart) -> bool {
        self.evaluable_id == stored.evaluable_id
            && self.group_id == stored.group_id
            && self.predicate.predicate_id() == stored.predicate_id
    }
}

/// Compact, immutable form of an [`ExpressionPart`] kept inside engine indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredExpressionPart {
    pub evaluable_id: EvaluableId,
    pub group_id: GroupId,
    pub predicate_id: u64,
    pub ident: Option<String>,
}
