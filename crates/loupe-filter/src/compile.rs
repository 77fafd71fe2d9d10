//! Lowering of filter ASTs to executable Tantivy queries.
//!
//! The compiler is a pure function of (attrs field, filter string): it never
//! touches the index contents, and the same inputs always produce the same
//! query. Malformed grammar surfaces as a parse error.
//!
//! Documents are indexed under a single JSON field, so every leaf comparison
//! addresses a JSON path. JSON values are indexed by their native type —
//! a filter value `2004` must match both the number `2004` and the string
//! `"2004"`, so equality leaves expand into an OR group of typed terms.

use std::ops::Bound;

use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, RangeQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use loupe_core::Result;

use crate::ast::{CmpOp, FilterExpr, FilterValue};
use crate::parser;

/// Compile a filter expression string into an executable query against the
/// given JSON attributes field.
pub fn compile(attrs: Field, input: &str) -> Result<Box<dyn Query>> {
    let expr = parser::parse(input)?;
    Ok(lower(attrs, &expr))
}

/// Lower a parsed filter AST into a Tantivy query.
pub fn lower(attrs: Field, expr: &FilterExpr) -> Box<dyn Query> {
    match expr {
        FilterExpr::And(clauses) => {
            Box::new(BooleanQuery::intersection(
                clauses.iter().map(|c| lower(attrs, c)).collect(),
            ))
        }
        FilterExpr::Or(clauses) => {
            Box::new(BooleanQuery::union(
                clauses.iter().map(|c| lower(attrs, c)).collect(),
            ))
        }
        FilterExpr::Not(inner) => negate(lower(attrs, inner)),
        FilterExpr::Cmp { field, op, value } => match op {
            CmpOp::Eq => eq_query(attrs, field, value),
            CmpOp::Ne => negate(eq_query(attrs, field, value)),
            CmpOp::Lt => ordering_query(attrs, field, Bound::Unbounded, exclusive(value)),
            CmpOp::Le => ordering_query(attrs, field, Bound::Unbounded, inclusive(value)),
            CmpOp::Gt => ordering_query(attrs, field, exclusive(value), Bound::Unbounded),
            CmpOp::Ge => ordering_query(attrs, field, inclusive(value), Bound::Unbounded),
        },
        FilterExpr::Range { field, lo, hi } => {
            ordering_query(attrs, field, Bound::Included(*lo), Bound::Included(*hi))
        }
    }
}

fn inclusive(value: &FilterValue) -> Bound<f64> {
    match value {
        FilterValue::Num(n) => Bound::Included(*n),
        // The parser rejects string operands for ordering comparisons.
        FilterValue::Str(_) => Bound::Unbounded,
    }
}

fn exclusive(value: &FilterValue) -> Bound<f64> {
    match value {
        FilterValue::Num(n) => Bound::Excluded(*n),
        FilterValue::Str(_) => Bound::Unbounded,
    }
}

/// Wrap a query in match-all-minus-matches.
fn negate(query: Box<dyn Query>) -> Box<dyn Query> {
    Box::new(BooleanQuery::new(vec![
        (Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
        (Occur::MustNot, query),
    ]))
}

fn str_term(attrs: Field, path: &str, value: &str) -> Term {
    let mut term = Term::from_field_json_path(attrs, path, true);
    term.append_type_and_str(value);
    term
}

fn i64_term(attrs: Field, path: &str, value: i64) -> Term {
    let mut term = Term::from_field_json_path(attrs, path, true);
    term.append_type_and_fast_value(value);
    term
}

fn f64_term(attrs: Field, path: &str, value: f64) -> Term {
    let mut term = Term::from_field_json_path(attrs, path, true);
    term.append_type_and_fast_value(value);
    term
}

fn bool_term(attrs: Field, path: &str, value: bool) -> Term {
    let mut term = Term::from_field_json_path(attrs, path, true);
    term.append_type_and_fast_value(value);
    term
}

fn term_query(term: Term) -> Box<dyn Query> {
    Box::new(TermQuery::new(term, IndexRecordOption::Basic))
}

/// Equality across the JSON value types the operand could have been
/// indexed as.
fn eq_query(attrs: Field, path: &str, value: &FilterValue) -> Box<dyn Query> {
    let mut alternates: Vec<Box<dyn Query>> = Vec::new();

    match value {
        FilterValue::Str(s) => {
            alternates.push(term_query(str_term(attrs, path, s)));
            if let Ok(b) = s.parse::<bool>() {
                alternates.push(term_query(bool_term(attrs, path, b)));
            }
            if let Ok(i) = s.parse::<i64>() {
                alternates.push(term_query(i64_term(attrs, path, i)));
            } else if let Ok(f) = s.parse::<f64>() {
                alternates.push(term_query(f64_term(attrs, path, f)));
            }
        }
        FilterValue::Num(n) => {
            if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                alternates.push(term_query(i64_term(attrs, path, *n as i64)));
            }
            alternates.push(term_query(f64_term(attrs, path, *n)));
            // numbers stored as strings in the document
            alternates.push(term_query(str_term(attrs, path, &format_num(*n))));
        }
    }

    if alternates.len() == 1 {
        alternates.pop().unwrap()
    } else {
        Box::new(BooleanQuery::union(alternates))
    }
}

/// Render a filter number the way it would appear as a document string.
fn format_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Ordering comparison over numeric fast values.
///
/// Integers and floats index into distinct columns, so the query is the
/// union of an integer range (when the bounds are representable) and a
/// float range.
fn ordering_query(
    attrs: Field,
    path: &str,
    lo: Bound<f64>,
    hi: Bound<f64>,
) -> Box<dyn Query> {
    let mut alternates: Vec<Box<dyn Query>> = Vec::new();

    if let Some((ilo, ihi)) = integer_bounds(&lo, &hi) {
        let lower = map_bound(ilo, |v| i64_term(attrs, path, v));
        let upper = map_bound(ihi, |v| i64_term(attrs, path, v));
        alternates.push(Box::new(RangeQuery::new(lower, upper)));
    }

    let lower = map_bound(lo, |v| f64_term(attrs, path, v));
    let upper = map_bound(hi, |v| f64_term(attrs, path, v));
    alternates.push(Box::new(RangeQuery::new(lower, upper)));

    if alternates.len() == 1 {
        alternates.pop().unwrap()
    } else {
        Box::new(BooleanQuery::union(alternates))
    }
}

fn map_bound<T, U>(bound: Bound<T>, f: impl Fn(T) -> U) -> Bound<U> {
    match bound {
        Bound::Included(v) => Bound::Included(f(v)),
        Bound::Excluded(v) => Bound::Excluded(f(v)),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Tighten float bounds into equivalent integer-column bounds.
///
/// Returns `None` when either bound falls outside the i64 range.
fn integer_bounds(lo: &Bound<f64>, hi: &Bound<f64>) -> Option<(Bound<i64>, Bound<i64>)> {
    const MIN: f64 = i64::MIN as f64;
    const MAX: f64 = i64::MAX as f64;

    let lower = match lo {
        Bound::Unbounded => Bound::Unbounded,
        Bound::Included(v) if (MIN..=MAX).contains(v) => Bound::Included(v.ceil() as i64),
        Bound::Excluded(v) if (MIN..=MAX).contains(v) => {
            if v.fract() == 0.0 {
                Bound::Excluded(*v as i64)
            } else {
                Bound::Included(v.ceil() as i64)
            }
        }
        _ => return None,
    };

    let upper = match hi {
        Bound::Unbounded => Bound::Unbounded,
        Bound::Included(v) if (MIN..=MAX).contains(v) => Bound::Included(v.floor() as i64),
        Bound::Excluded(v) if (MIN..=MAX).contains(v) => {
            if v.fract() == 0.0 {
                Bound::Excluded(*v as i64)
            } else {
                Bound::Included(v.floor() as i64)
            }
        }
        _ => return None,
    };

    Some((lower, upper))
}

// ============================================================================
// Tests
// ============================================================================
