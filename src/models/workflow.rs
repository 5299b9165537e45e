// src/models/workflow.rs

//! Status machines shared by the QMS records.
//!
//! Each status enum declares its happy path (`FLOW`), the statuses reachable
//! from any open state (`EXITS`), extra edges such as rework loops, and its
//! terminal statuses. `can_transition_to` derives the legal moves from that.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

pub trait WorkflowStatus: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    const FLOW: &'static [Self];
    const EXITS: &'static [Self] = &[];
    const EXTRA_EDGES: &'static [(Self, Self)] = &[];
    const TERMINAL: &'static [Self];
    /// Whether a record may jump more than one step forward along `FLOW`.
    const ALLOW_SKIP: bool = false;

    fn as_str(self) -> &'static str;

    fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    fn can_transition_to(self, next: Self) -> bool {
        if self == next || self.is_terminal() {
            return false;
        }
        if Self::EXITS.contains(&next) || Self::EXTRA_EDGES.contains(&(self, next)) {
            return true;
        }
        let position = |s: Self| Self::FLOW.iter().position(|f| *f == s);
        match (position(self), position(next)) {
            (Some(from), Some(to)) if Self::ALLOW_SKIP => to > from,
            (Some(from), Some(to)) => to == from + 1,
            _ => false,
        }
    }

    fn ensure_transition(self, next: Self) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    /// Statuses reachable in one move, in declaration order (drives the UI button row).
    fn next_statuses(self) -> Vec<Self> {
        Self::FLOW
            .iter()
            .chain(Self::EXITS.iter())
            .chain(Self::EXTRA_EDGES.iter().map(|(_, to)| to))
            .copied()
            .filter(|s| self.can_transition_to(*s))
            .fold(Vec::new(), |mut acc, s| {
                if !acc.contains(&s) {
                    acc.push(s);
                }
                acc
            })
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub comment: Option<String>,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountEntry {
    #[schema(example = "open")]
    pub key: String,
    #[schema(example = 3)]
    pub count: i64,
}

/// Summary cards above each list view.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStats {
    pub total: i64,
    pub by_status: Vec<CountEntry>,
    /// Secondary breakdown (severity, priority, risk level, type...).
    pub breakdown: Vec<CountEntry>,
}

impl ModuleStats {
    pub fn new(by_status: Vec<CountEntry>, breakdown: Vec<CountEntry>) -> Self {
        Self {
            total: by_status.iter().map(|c| c.count).sum(),
            by_status,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Amber,
        Green,
        Broken,
        Off,
    }

    impl WorkflowStatus for Light {
        const FLOW: &'static [Self] = &[Light::Red, Light::Amber, Light::Green, Light::Off];
        const EXITS: &'static [Self] = &[Light::Broken];
        const EXTRA_EDGES: &'static [(Self, Self)] = &[(Light::Green, Light::Red)];
        const TERMINAL: &'static [Self] = &[Light::Off, Light::Broken];

        fn as_str(self) -> &'static str {
            match self {
                Light::Red => "red",
                Light::Amber => "amber",
                Light::Green => "green",
                Light::Broken => "broken",
                Light::Off => "off",
            }
        }
    }

    #[test]
    fn steps_forward_one_at_a_time() {
        assert!(Light::Red.can_transition_to(Light::Amber));
        assert!(!Light::Red.can_transition_to(Light::Green));
        assert!(!Light::Amber.can_transition_to(Light::Red));
    }

    #[test]
    fn exits_and_extra_edges() {
        assert!(Light::Amber.can_transition_to(Light::Broken));
        assert!(Light::Green.can_transition_to(Light::Red));
        assert!(!Light::Off.can_transition_to(Light::Broken));
    }

    #[test]
    fn same_status_is_not_a_transition() {
        assert!(!Light::Red.can_transition_to(Light::Red));
        let err = Light::Off.ensure_transition(Light::Red).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn lists_next_statuses_without_duplicates() {
        assert_eq!(Light::Green.next_statuses(), vec![Light::Red, Light::Off, Light::Broken]);
        assert!(Light::Broken.next_statuses().is_empty());
    }

    #[test]
    fn stats_total_sums_status_counts() {
        let stats = ModuleStats::new(
            vec![
                CountEntry { key: "open".into(), count: 2 },
                CountEntry { key: "closed".into(), count: 5 },
            ],
            vec![],
        );
        assert_eq!(stats.total, 7);
    }
}
