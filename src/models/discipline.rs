//! Discipline model.
//!
//! A discipline is the course being taught in a cell. Disciplines are
//! reference data: they are drawn from a palette and copied onto the
//! grid, never consumed by it.

use serde::{Deserialize, Serialize};

/// A course that can occupy a timetable cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discipline {
    /// Unique discipline identifier.
    pub id: String,
    /// Human-readable name (e.g., "Mathematics").
    pub name: String,
    /// Catalogue code (e.g., "MATH101").
    pub code: String,
    /// Display color (e.g., "#3B82F6").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Nominal lesson duration in minutes.
    pub duration: u32,
}

impl Discipline {
    /// Creates a discipline with the given ID and code.
    ///
    /// Duration defaults to 60 minutes.
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            code: code.into(),
            color: None,
            duration: 60,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the lesson duration (minutes).
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = minutes;
        self
    }

    /// Label shown on a cell: `"<name> (<code>)"`, or just the code when
    /// the name is blank.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.code.clone()
        } else {
            format!("{} ({})", self.name, self.code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discipline_builder() {
        let d = Discipline::new("1", "MATH101")
            .with_name("Mathematics")
            .with_color("#3B82F6")
            .with_duration(90);
        assert_eq!(d.id, "1");
        assert_eq!(d.code, "MATH101");
        assert_eq!(d.color.as_deref(), Some("#3B82F6"));
        assert_eq!(d.duration, 90);
    }

    #[test]
    fn test_discipline_label() {
        let d = Discipline::new("1", "MATH101");
        assert_eq!(d.label(), "MATH101");
        let d = d.with_name("Mathematics");
        assert_eq!(d.label(), "Mathematics (MATH101)");
    }

    #[test]
    fn test_discipline_wire_shape() {
        let json = r##"{"id":"2","name":"Physics","code":"PHYS101","color":"#EF4444","duration":60}"##;
        let d: Discipline = serde_json::from_str(json).unwrap();
        assert_eq!(d.code, "PHYS101");

        let no_color = r#"{"id":"3","name":"Chemistry","code":"CHEM101","duration":45}"#;
        let d: Discipline = serde_json::from_str(no_color).unwrap();
        assert!(d.color.is_none());
        assert_eq!(d.duration, 45);
    }
}
