//! # Domain filters
//!
//! Odoo filters ("domains") are ordered sequences of terms. A term is either
//! a `(field, operator, value)` condition or a logical operator in Polish
//! prefix notation: `&` and `|` consume the two following sub-expressions,
//! `!` consumes one. Several top-level expressions in a row are combined
//! with an implicit AND, as the server does.
//!
//! ```rust
//! use odoo_rpc::{Domain, DomainOperator};
//!
//! // name ilike "%inc%" OR is_company = true
//! let domain = Domain::new()
//!     .or()
//!     .filter("name", DomainOperator::Ilike, "%inc%")
//!     .filter("is_company", DomainOperator::Eq, true);
//!
//! assert!(domain.validate().is_ok());
//! ```
//!
//! The server is the final arbiter of domain semantics, but well-formedness
//! of the prefix structure is checked client-side by [`Domain::validate`]
//! before a filter ever reaches the wire.
use serde_json::{Value, json};
use std::fmt;

/// A scalar, or a homogeneous list of scalars, usable on the right-hand side
/// of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<DomainValue>),
}

impl DomainValue {
    /// Wire form of the value.
    pub fn to_value(&self) -> Value {
        match self {
            DomainValue::Str(s) => json!(s),
            DomainValue::Int(i) => json!(i),
            DomainValue::Float(f) => json!(f),
            DomainValue::Bool(b) => json!(b),
            DomainValue::Null => Value::Null,
            DomainValue::List(items) => {
                Value::Array(items.iter().map(DomainValue::to_value).collect())
            }
        }
    }
}

impl From<&str> for DomainValue {
    fn from(value: &str) -> Self {
        DomainValue::Str(value.to_string())
    }
}

impl From<String> for DomainValue {
    fn from(value: String) -> Self {
        DomainValue::Str(value)
    }
}

impl From<i64> for DomainValue {
    fn from(value: i64) -> Self {
        DomainValue::Int(value)
    }
}

impl From<i32> for DomainValue {
    fn from(value: i32) -> Self {
        DomainValue::Int(value.into())
    }
}

impl From<f64> for DomainValue {
    fn from(value: f64) -> Self {
        DomainValue::Float(value)
    }
}

impl From<bool> for DomainValue {
    fn from(value: bool) -> Self {
        DomainValue::Bool(value)
    }
}

impl<T: Into<DomainValue>> From<Vec<T>> for DomainValue {
    fn from(values: Vec<T>) -> Self {
        DomainValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Comparison operators accepted in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainOperator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    /// `=?`: unset or equals.
    EqOrUnset,
    EqLike,
    Like,
    NotLike,
    Ilike,
    EqIlike,
    NotIlike,
    In,
    NotIn,
    ChildOf,
}

impl DomainOperator {
    /// Wire string of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainOperator::Eq => "=",
            DomainOperator::NotEq => "!=",
            DomainOperator::Gt => ">",
            DomainOperator::Ge => ">=",
            DomainOperator::Lt => "<",
            DomainOperator::Le => "<=",
            DomainOperator::EqOrUnset => "=?",
            DomainOperator::EqLike => "=like",
            DomainOperator::Like => "like",
            DomainOperator::NotLike => "not like",
            DomainOperator::Ilike => "ilike",
            DomainOperator::EqIlike => "=ilike",
            DomainOperator::NotIlike => "not ilike",
            DomainOperator::In => "in",
            DomainOperator::NotIn => "not in",
            DomainOperator::ChildOf => "child_of",
        }
    }
}

impl fmt::Display for DomainOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One term of a domain sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainTerm {
    /// A `(field, operator, value)` leaf condition.
    Condition(String, DomainOperator, DomainValue),
    /// Prefix AND over the next two sub-expressions (wire `"&"`).
    And,
    /// Prefix OR over the next two sub-expressions (wire `"|"`).
    Or,
    /// Prefix NOT over the next sub-expression (wire `"!"`).
    Not,
}

impl DomainTerm {
    /// Builds a leaf condition term.
    pub fn condition(
        field: impl Into<String>,
        operator: DomainOperator,
        value: impl Into<DomainValue>,
    ) -> Self {
        DomainTerm::Condition(field.into(), operator, value.into())
    }

    /// Number of following sub-expressions a logical operator consumes.
    fn arity(&self) -> Option<usize> {
        match self {
            DomainTerm::Condition(..) => None,
            DomainTerm::And | DomainTerm::Or => Some(2),
            DomainTerm::Not => Some(1),
        }
    }

    /// Wire token of a logical operator.
    fn token(&self) -> Option<&'static str> {
        match self {
            DomainTerm::Condition(..) => None,
            DomainTerm::And => Some("&"),
            DomainTerm::Or => Some("|"),
            DomainTerm::Not => Some("!"),
        }
    }
}

/// A malformed prefix expression, rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A logical operator ran out of following sub-expressions.
    #[error("logical operator '{operator}' expects {expected} operand(s) but the domain ended early")]
    MissingOperands {
        operator: &'static str,
        expected: usize,
    },
}

/// An ordered filter expression over model fields.
///
/// An empty domain matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Domain {
    terms: Vec<DomainTerm>,
}

impl Domain {
    /// The empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-condition domain.
    pub fn condition(
        field: impl Into<String>,
        operator: DomainOperator,
        value: impl Into<DomainValue>,
    ) -> Self {
        Self {
            terms: vec![DomainTerm::condition(field, operator, value)],
        }
    }

    /// Appends a condition term.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: DomainOperator,
        value: impl Into<DomainValue>,
    ) -> Self {
        self.terms.push(DomainTerm::condition(field, operator, value));
        self
    }

    /// Appends a prefix AND token consuming the next two sub-expressions.
    pub fn and(mut self) -> Self {
        self.terms.push(DomainTerm::And);
        self
    }

    /// Appends a prefix OR token consuming the next two sub-expressions.
    pub fn or(mut self) -> Self {
        self.terms.push(DomainTerm::Or);
        self
    }

    /// Appends a prefix NOT token consuming the next sub-expression.
    pub fn not(mut self) -> Self {
        self.terms.push(DomainTerm::Not);
        self
    }

    /// Appends an arbitrary term.
    pub fn push(&mut self, term: DomainTerm) {
        self.terms.push(term);
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[DomainTerm] {
        &self.terms
    }

    /// Checks that the sequence is a well-formed prefix expression: every
    /// logical operator finds its full operand count. Trailing complete
    /// expressions are fine (the server ANDs them implicitly).
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut index = 0;
        while index < self.terms.len() {
            index = consume_expression(&self.terms, index)?;
        }
        Ok(())
    }

    /// Wire form: an array of 3-element condition arrays and operator
    /// tokens.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.terms
                .iter()
                .map(|term| match term {
                    DomainTerm::Condition(field, operator, value) => {
                        json!([field, operator.as_str(), value.to_value()])
                    }
                    logical => json!(logical.token().expect("logical term")),
                })
                .collect(),
        )
    }
}

impl From<Vec<DomainTerm>> for Domain {
    fn from(terms: Vec<DomainTerm>) -> Self {
        Self { terms }
    }
}

impl FromIterator<DomainTerm> for Domain {
    fn from_iter<I: IntoIterator<Item = DomainTerm>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Consumes one complete sub-expression starting at `at`, returning the
/// index just past it.
fn consume_expression(terms: &[DomainTerm], at: usize) -> Result<usize, DomainError> {
    let term = &terms[at];
    match term.arity() {
        None => Ok(at + 1),
        Some(arity) => {
            let mut next = at + 1;
            for _ in 0..arity {
                if next >= terms.len() {
                    return Err(DomainError::MissingOperands {
                        operator: term.token().expect("logical term"),
                        expected: arity,
                    });
                }
                next = consume_expression(terms, next)?;
            }
            Ok(next)
        }
    }
}
