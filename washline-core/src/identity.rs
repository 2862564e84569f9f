use serde::{Deserialize, Serialize};
use uuid::Uuid;

use washline_domain::employee::{Employee, Role};

/// Every caller of the engine, employee or not. The external identity
/// provider verifies credentials and hands the engine one of these; the
/// engine itself never sees tokens or sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActorRole {
    Customer,
    Worker,
    Driver,
    OutletAdmin,
    Admin,
    /// Scheduled sweeps and the payment gate act as the system.
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "Customer",
            ActorRole::Worker => "Worker",
            ActorRole::Driver => "Driver",
            ActorRole::OutletAdmin => "OutletAdmin",
            ActorRole::Admin => "Admin",
            ActorRole::System => "System",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for ActorRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Worker => ActorRole::Worker,
            Role::Driver => ActorRole::Driver,
            Role::OutletAdmin => ActorRole::OutletAdmin,
            Role::Admin => ActorRole::Admin,
        }
    }
}

/// A verified caller identity: who, acting as what, affiliated where.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
    pub outlet_id: Option<Uuid>,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self {
            id,
            role,
            outlet_id: None,
        }
    }

    pub fn with_outlet(id: Uuid, role: ActorRole, outlet_id: Uuid) -> Self {
        Self {
            id,
            role,
            outlet_id: Some(outlet_id),
        }
    }

    /// The system actor used by scheduled sweeps and the payment gate.
    pub fn system() -> Self {
        Self {
            id: Uuid::nil(),
            role: ActorRole::System,
            outlet_id: None,
        }
    }
}

impl From<&Employee> for Actor {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            role: employee.role.into(),
            outlet_id: Some(employee.outlet_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_resolves_to_actor() {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: "Sari".into(),
            role: Role::OutletAdmin,
            outlet_id: Uuid::new_v4(),
        };
        let actor = Actor::from(&employee);
        assert_eq!(actor.id, employee.id);
        assert_eq!(actor.role, ActorRole::OutletAdmin);
        assert_eq!(actor.outlet_id, Some(employee.outlet_id));
    }
}
