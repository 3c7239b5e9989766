//! Status → badge presentation. This table is the only place statuses turn into visual attributes.

#![forbid(unsafe_code)]

use serde::Serialize;

use crate::Status;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticClass {
    Success,
    Danger,
    Warning,
    Neutral,
}

impl SemanticClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticClass::Success => "success",
            SemanticClass::Danger => "danger",
            SemanticClass::Warning => "warning",
            SemanticClass::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub label: &'static str,
    pub class: SemanticClass,
    pub icon: &'static str,
}

const UP: Presentation = Presentation { label: "Online", class: SemanticClass::Success, icon: "✅" };
const DOWN: Presentation = Presentation { label: "Offline", class: SemanticClass::Danger, icon: "❌" };
const ERROR: Presentation = Presentation { label: "Error", class: SemanticClass::Warning, icon: "⚠️" };
const UNKNOWN: Presentation = Presentation { label: "Unknown", class: SemanticClass::Neutral, icon: "❓" };

pub fn for_status(status: Status) -> Presentation {
    match status {
        Status::Up => UP,
        Status::Down => DOWN,
        Status::Error => ERROR,
        Status::Unknown => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_dashboard_badges() {
        let rows: Vec<(&str, &str)> = Status::ALL
            .iter()
            .map(|s| (s.presentation().label, s.presentation().class.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![("Online", "success"), ("Offline", "danger"), ("Error", "warning"), ("Unknown", "neutral")]
        );
    }
}
