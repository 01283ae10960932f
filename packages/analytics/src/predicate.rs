//! The filter predicate shared by every read operation.
//!
//! A [`Predicate`] is an ordered conjunction of conditions. Each condition
//! owns its column, operator and bound value, so fragment text and bind
//! parameters cannot drift apart: placeholders are numbered only when the
//! predicate is rendered, and values are emitted in the same order.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ops_dashboard_analytics_models::{FilterSpec, ParameterError};
use switchy_database::DatabaseValue;

#[derive(Debug, Clone)]
struct Condition {
    column: &'static str,
    operator: &'static str,
    value: DatabaseValue,
}

/// A conjunctive `WHERE` predicate with its bound values.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Builds the predicate for `filter`.
    ///
    /// Conditions are appended in a fixed order: from, to, sector,
    /// direction, event type, minimum intensity. The `to` day is
    /// inclusive, so it is bound as the start of the following day with a
    /// strict `<`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if `to` is the last representable date.
    pub fn from_filter(filter: &FilterSpec) -> Result<Self, ParameterError> {
        let mut predicate = Self::default();

        if let Some(from) = filter.from {
            predicate.push("occurred_at", ">=", DatabaseValue::DateTime(start_of(from)));
        }

        if let Some(to) = filter.to {
            let next_day = to
                .succ_opt()
                .ok_or_else(|| ParameterError::new("to", "'to' is out of range"))?;
            predicate.push("occurred_at", "<", DatabaseValue::DateTime(start_of(next_day)));
        }

        if let Some(sector) = &filter.sector {
            predicate.push("sector", "=", DatabaseValue::String(sector.clone()));
        }

        if let Some(direction) = &filter.direction {
            predicate.push("direction", "=", DatabaseValue::String(direction.clone()));
        }

        if let Some(event_type) = &filter.event_type {
            predicate.push("event_type", "=", DatabaseValue::String(event_type.clone()));
        }

        if let Some(min_intensity) = filter.min_intensity {
            predicate.push(
                "intensity",
                ">=",
                DatabaseValue::Int32(min_intensity.value()),
            );
        }

        Ok(predicate)
    }

    fn push(&mut self, column: &'static str, operator: &'static str, value: DatabaseValue) {
        self.conditions.push(Condition {
            column,
            operator,
            value,
        });
    }

    /// Returns `true` if the predicate matches every row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders each condition with `$1..$n` placeholders.
    #[must_use]
    pub fn fragments(&self) -> Vec<String> {
        self.conditions
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} {} ${}", c.column, c.operator, i + 1))
            .collect()
    }

    /// The bound values, positionally matching [`Self::fragments`].
    #[must_use]
    pub fn values(&self) -> Vec<DatabaseValue> {
        self.conditions.iter().map(|c| c.value.clone()).collect()
    }

    /// Renders ` WHERE f1 AND f2 ...`, or an empty string when there are
    /// no conditions.
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.fragments().join(" AND "))
        }
    }

    /// The first placeholder index free for parameters appended after the
    /// predicate's own (e.g. `LIMIT` / `OFFSET`).
    #[must_use]
    pub fn next_placeholder(&self) -> usize {
        self.conditions.len() + 1
    }

    /// The predicate's values followed by `extra`, ready to bind against a
    /// query whose extra placeholders start at [`Self::next_placeholder`].
    #[must_use]
    pub fn values_with(&self, extra: impl IntoIterator<Item = DatabaseValue>) -> Vec<DatabaseValue> {
        let mut values = self.values();
        values.extend(extra);
        values
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
