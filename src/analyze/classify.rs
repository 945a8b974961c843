// src/analyze/classify.rs
//! Keyword-tier severity and status classification.
//!
//! Tiers are checked in priority order and the first tier with any hit wins.
//! No scoring: one high-severity term outweighs any number of medium ones.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::High, Severity::Medium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Contained,
    #[serde(rename = "Under Control")]
    UnderControl,
    Active,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Contained, Status::UnderControl, Status::Active];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Contained => "Contained",
            Status::UnderControl => "Under Control",
            Status::Active => "Active",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeveritySection {
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusSection {
    #[serde(default)]
    pub contained: Vec<String>,
    #[serde(default)]
    pub under_control: Vec<String>,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

#[derive(Debug, Clone)]
pub struct Classifier {
    high: Vec<String>,
    medium: Vec<String>,
    contained: Vec<String>,
    under_control: Vec<String>,
}

impl Classifier {
    pub fn new(severity: &SeveritySection, status: &StatusSection) -> Self {
        Self {
            high: lowered(&severity.high),
            medium: lowered(&severity.medium),
            contained: lowered(&status.contained),
            under_control: lowered(&status.under_control),
        }
    }

    pub fn classify_severity(&self, title: &str, summary: &str) -> Severity {
        let text = normalize(&format!("{title} {summary}"));
        if contains_any(&text, &self.high) {
            Severity::Critical
        } else if contains_any(&text, &self.medium) {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    pub fn classify_status(&self, title: &str, summary: &str) -> Status {
        let text = normalize(&format!("{title} {summary}"));
        if contains_any(&text, &self.contained) {
            Status::Contained
        } else if contains_any(&text, &self.under_control) {
            Status::UnderControl
        } else {
            Status::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(
            &SeveritySection {
                high: vec!["évacuation".into(), "Destroyed".into()],
                medium: vec!["pompiers".into(), "helicopter".into()],
            },
            &StatusSection {
                contained: vec!["maîtrisé".into()],
                under_control: vec!["sous contrôle".into()],
            },
        )
    }

    #[test]
    fn severity_tiers_in_priority_order() {
        let c = classifier();
        assert_eq!(c.classify_severity("Pompiers et hélicos", "évacuation du village"), Severity::Critical);
        assert_eq!(c.classify_severity("HOUSES DESTROYED", ""), Severity::Critical);
        assert_eq!(c.classify_severity("Les pompiers mobilisés", ""), Severity::High);
        assert_eq!(c.classify_severity("Feu de broussailles", ""), Severity::Medium);
    }

    #[test]
    fn status_tiers_in_priority_order() {
        let c = classifier();
        assert_eq!(c.classify_status("Feu maîtrisé", "situation sous contrôle"), Status::Contained);
        assert_eq!(c.classify_status("Situation sous contrôle", ""), Status::UnderControl);
        assert_eq!(c.classify_status("Le feu progresse", ""), Status::Active);
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&Status::UnderControl).unwrap(), "\"Under Control\"");
        assert_eq!(Severity::Critical.to_string(), "Critical");
    }
}
