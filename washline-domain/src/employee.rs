use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Employee role; authorization in this core is role plus ownership checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Worker,
    Driver,
    OutletAdmin,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "Worker",
            Role::Driver => "Driver",
            Role::OutletAdmin => "OutletAdmin",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user with a role and an outlet affiliation. Account management lives
/// with the external identity provider; the engine only ever sees verified
/// (id, role, outlet) triples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub outlet_id: Uuid,
}
