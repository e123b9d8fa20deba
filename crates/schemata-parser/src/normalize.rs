//! Content-model normalization.
//!
//! Quantifiers as written (`optional`, `n >= 1`, `0 < n < 5`, ...) are turned
//! into canonical [`Cardinality`] ranges here, and unordered groups are
//! checked for children that appear more than once.

use indexmap::IndexMap;
use log::trace;

use schemata_core::Cardinality;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    parser_types::{Bound, Comparison, Quantifier},
    span::{Span, Spanned},
};

/// A reference together with its normalized cardinality.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Occurrence<'src> {
    pub name: Spanned<&'src str>,
    pub cardinality: Cardinality,
}

impl Occurrence<'_> {
    pub fn span(&self) -> Span {
        self.name.span()
    }
}

fn invalid(quantifier: &Spanned<Quantifier>, reason: impl Into<String>) -> Diagnostic {
    Diagnostic::error(format!("invalid quantifier `({})`", quantifier.inner()))
        .with_code(ErrorCode::E200)
        .with_label(quantifier.span(), reason)
}

fn count(quantifier: &Spanned<Quantifier>, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(invalid(quantifier, "occurrence counts cannot be negative"));
    }
    u32::try_from(value).map_err(|_| invalid(quantifier, "occurrence count is too large"))
}

/// Normalize an optional quantifier into a cardinality.
///
/// A missing quantifier means exactly one occurrence.
pub(crate) fn cardinality(quantifier: Option<&Spanned<Quantifier>>) -> Result<Cardinality> {
    let Some(quantifier) = quantifier else {
        return Ok(Cardinality::ONE);
    };

    match quantifier.inner() {
        Quantifier::Optional => Ok(Cardinality::OPTIONAL),
        Quantifier::Exact(value) => count(quantifier, *value).map(Cardinality::exactly),
        Quantifier::Bounds(bounds) => from_bounds(quantifier, bounds),
    }
}

fn from_bounds(quantifier: &Spanned<Quantifier>, bounds: &[Bound]) -> Result<Cardinality> {
    let mut lower: Option<u32> = None;
    let mut upper: Option<u32> = None;

    for bound in bounds {
        let value = count(quantifier, bound.value)?;
        let (new_lower, new_upper) = match bound.comparison {
            Comparison::GreaterEqual => (Some(value), None),
            Comparison::Greater => {
                let value = value
                    .checked_add(1)
                    .ok_or_else(|| invalid(quantifier, "occurrence count is too large"))?;
                (Some(value), None)
            }
            Comparison::LessEqual => (None, Some(value)),
            Comparison::Less => {
                let value = value
                    .checked_sub(1)
                    .ok_or_else(|| invalid(quantifier, "no count is less than zero"))?;
                (None, Some(value))
            }
            Comparison::Equal => (Some(value), Some(value)),
        };

        if new_lower.is_some() {
            if lower.is_some() {
                return Err(invalid(quantifier, "lower bound given twice"));
            }
            lower = new_lower;
        }
        if new_upper.is_some() {
            if upper.is_some() {
                return Err(invalid(quantifier, "upper bound given twice"));
            }
            upper = new_upper;
        }
    }

    let min = lower.unwrap_or(0);
    Cardinality::new(min, upper).ok_or_else(|| {
        invalid(quantifier, "lower bound exceeds upper bound")
            .with_help("the range must satisfy `min <= max`")
    })
}

/// Collapse repeated children of an unordered group.
///
/// Identical repeats are dropped with a warning. Repeats with different
/// cardinalities make the group ambiguous and are reported as errors.
pub(crate) fn collapse_unordered<'src>(
    owner: &str,
    items: Vec<Occurrence<'src>>,
    collector: &mut DiagnosticCollector,
) -> Vec<Occurrence<'src>> {
    let mut seen: IndexMap<&'src str, Occurrence<'src>> = IndexMap::with_capacity(items.len());

    for item in items {
        let name = *item.name.inner();
        match seen.get(name) {
            None => {
                seen.insert(name, item);
            }
            Some(first) if first.cardinality == item.cardinality => {
                trace!(owner = owner, child = name; "Collapsing repeated unordered child");
                collector.emit(
                    Diagnostic::warning(format!(
                        "`{name}` is listed twice in the unordered content of `{owner}`"
                    ))
                    .with_label(item.span(), "repeated here")
                    .with_secondary_label(first.span(), "first listed here"),
                );
            }
            Some(first) => {
                collector.emit(
                    Diagnostic::error(format!(
                        "`{name}` appears in the unordered content of `{owner}` with cardinalities {} and {}",
                        first.cardinality, item.cardinality
                    ))
                    .with_code(ErrorCode::E201)
                    .with_label(item.span(), "conflicting occurrence")
                    .with_secondary_label(first.span(), "first listed here")
                    .with_help("merge the entries into a single quantified reference"),
                );
            }
        }
    }

    seen.into_values().collect()
}
