//! Parameterized partial updates.
//!
//! Column names come only from a [`Field`] implementation, never from caller
//! input; values are always bound as placeholders.

use tokio_rusqlite::rusqlite::types::Value;

/// An updatable column of a table.
pub trait Field: Copy + PartialEq {
    const TABLE: &'static str;

    fn column(self) -> &'static str;
}

/// Collects `column = ?` assignments for a single-row update.
#[derive(Debug, Clone)]
pub struct UpdateBuilder<F: Field> {
    assignments: Vec<(F, Value)>,
}

impl<F: Field> Default for UpdateBuilder<F> {
    fn default() -> Self {
        Self { assignments: Vec::new() }
    }
}

impl<F: Field> UpdateBuilder<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value, replacing any earlier assignment of the same field.
    pub fn set(&mut self, field: F, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.assignments.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((field, value)),
        }
        self
    }

    /// Assign only when a value is present.
    pub fn set_some<V: Into<Value>>(&mut self, field: F, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set(field, value);
        }
        self
    }

    /// Render `UPDATE <table> SET ... WHERE id = ?`, also bumping `updated_at`.
    ///
    /// Returns `None` when nothing was assigned.
    pub fn build(self, id: i64) -> Option<(String, Vec<Value>)> {
        if self.assignments.is_empty() {
            return None;
        }

        let columns: Vec<String> = self
            .assignments
            .iter()
            .map(|(field, _)| format!("{} = ?", field.column()))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            F::TABLE,
            columns.join(", ")
        );

        let mut params: Vec<Value> = self.assignments.into_iter().map(|(_, value)| value).collect();
        params.push(Value::Integer(id));
        Some((sql, params))
    }
}
