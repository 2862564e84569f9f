use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::order::OrderItem;

/// Processing stations in their fixed sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkerType {
    Washing,
    Ironing,
    Packing,
}

impl WorkerType {
    /// Zero-based position in the fixed Washing → Ironing → Packing order.
    pub fn position(&self) -> usize {
        match self {
            WorkerType::Washing => 0,
            WorkerType::Ironing => 1,
            WorkerType::Packing => 2,
        }
    }

    /// The station that must have completed before this one may start.
    pub fn previous(&self) -> Option<WorkerType> {
        match self {
            WorkerType::Washing => None,
            WorkerType::Ironing => Some(WorkerType::Washing),
            WorkerType::Packing => Some(WorkerType::Ironing),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerType::Washing => "Washing",
            WorkerType::Ironing => "Ironing",
            WorkerType::Packing => "Packing",
        }
    }
}

impl std::fmt::Display for WorkerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Washing" => Ok(WorkerType::Washing),
            "Ironing" => Ok(WorkerType::Ironing),
            "Packing" => Ok(WorkerType::Packing),
            other => Err(format!("unknown worker type: {}", other)),
        }
    }
}

/// One row per (order, station) verification actually started.
///
/// Open while `completed_at` is None and `superseded` is false; at most one
/// open process may exist per (order, station). A re-verification cycle after
/// a rejected bypass supersedes the old process with a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWorkProcess {
    pub id: Uuid,
    pub order_id: Uuid,
    pub worker_type: WorkerType,
    pub employee_id: Uuid,
    pub bypass_id: Option<Uuid>,
    /// What the worker counted at intake to this station.
    pub verified_items: Vec<OrderItem>,
    pub mismatched: bool,
    pub superseded: bool,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl OrderWorkProcess {
    pub fn new(
        order_id: Uuid,
        worker_type: WorkerType,
        employee_id: Uuid,
        verified_items: Vec<OrderItem>,
        mismatched: bool,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            worker_type,
            employee_id,
            bypass_id: None,
            verified_items,
            mismatched,
            superseded: false,
            notes,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completed_at.is_none() && !self.superseded
    }

    pub fn close(&mut self, notes: Option<String>) {
        if notes.is_some() {
            self.notes = notes;
        }
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_sequence() {
        assert_eq!(WorkerType::Washing.previous(), None);
        assert_eq!(WorkerType::Ironing.previous(), Some(WorkerType::Washing));
        assert_eq!(WorkerType::Packing.previous(), Some(WorkerType::Ironing));
        assert!(WorkerType::Washing.position() < WorkerType::Packing.position());
    }

    #[test]
    fn test_process_open_until_closed() {
        let mut process = OrderWorkProcess::new(
            Uuid::new_v4(),
            WorkerType::Washing,
            Uuid::new_v4(),
            vec![],
            false,
            None,
        );
        assert!(process.is_open());
        process.close(Some("done".into()));
        assert!(!process.is_open());
        assert_eq!(process.notes.as_deref(), Some("done"));
    }
}
