use serde::{Deserialize, Serialize};

use crate::users::Principal;

/// Report domain model - one visit report owned by the user who created it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Report {
    pub report_id: String,
    pub owner_id: String,
    /// Owner display label (the owner's email at creation time)
    pub owner_email: String,
    pub title: String,
    /// Free-text area / location tag
    pub area: String,
    pub created_at: String,
    #[serde(default)]
    pub points: Vec<Point>,
}

/// One observation inside a report. Images are storage paths, in display order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Point {
    pub point_id: String,
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Report {
    /// Empty report for `owner`, stamped now.
    pub fn new_for(owner: &Principal) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner.user_id.clone(),
            owner_email: owner.email.clone(),
            title: String::new(),
            area: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
            points: Vec::new(),
        }
    }

    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        self.owner_id == principal.user_id
    }

    pub fn point(&self, point_id: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.point_id == point_id)
    }

    pub fn point_mut(&mut self, point_id: &str) -> Option<&mut Point> {
        self.points.iter_mut().find(|p| p.point_id == point_id)
    }

    /// Creation time for ordering. Unparseable timestamps sort last.
    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

impl Point {
    pub fn new() -> Self {
        Self {
            point_id: uuid::Uuid::new_v4().to_string(),
            text: String::new(),
            images: Vec::new(),
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first; reports without a readable timestamp go to the end.
pub fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| match (a.created_at_utc(), b.created_at_utc()) {
        (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_at(id: &str, created_at: &str) -> Report {
        Report {
            report_id: id.to_string(),
            owner_id: "u1".to_string(),
            owner_email: "u1@example.com".to_string(),
            title: String::new(),
            area: String::new(),
            created_at: created_at.to_string(),
            points: vec![],
        }
    }

    #[test]
    fn sorts_newest_first_with_unparseable_last() {
        let mut reports = vec![
            report_at("old", "2024-01-01T08:00:00+00:00"),
            report_at("broken", "yesterday"),
            report_at("new", "2024-03-01T08:00:00+00:00"),
            report_at("mid", "2024-02-01T10:00:00+02:00"),
        ];
        sort_newest_first(&mut reports);
        let ids: Vec<_> = reports.iter().map(|r| r.report_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "broken"]);
    }

    #[test]
    fn new_report_is_empty_and_owned() {
        let owner = Principal {
            user_id: "abc".to_string(),
            email: "agent@example.com".to_string(),
        };
        let report = Report::new_for(&owner);
        assert!(report.is_owned_by(&owner));
        assert!(report.points.is_empty());
        assert_eq!(report.owner_email, "agent@example.com");
        assert!(report.created_at_utc().is_some());
    }
}
