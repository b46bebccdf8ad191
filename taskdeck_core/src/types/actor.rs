//! Actors and the role model.
//!
//! Roles form a closed enum with a fixed rank order. There is deliberately
//! no string-based role handling here: every role comparison in the system
//! goes through `rank()` or the explicit predicates on [`Role`].

use crate::id::{DepartmentId, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// The closed set of roles known to the system.
///
/// Rank order (ascending authority): `Employee < TeamLead <
/// {ManagingDirector, ItAdmin}`. The latter two are co-equal
/// full-authority roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Regular department member.
    Employee,

    /// Leads a team inside a department.
    TeamLead,

    /// Full authority over all resources.
    ManagingDirector,

    /// Full authority over all resources (technical administration).
    ItAdmin,
}

impl Role {
    /// Numeric authority rank. Higher means more authority; the two
    /// full-authority roles share the top rank.
    pub fn rank(&self) -> u8 {
        match self {
            Role::Employee => 0,
            Role::TeamLead => 1,
            Role::ManagingDirector | Role::ItAdmin => 2,
        }
    }

    /// Whether this role bypasses all capability checks.
    pub fn is_full_authority(&self) -> bool {
        matches!(self, Role::ManagingDirector | Role::ItAdmin)
    }
}

/// The authenticated principal of a request.
///
/// Immutable per request; loaded once per authenticated call by the
/// identity provider (out of scope for this core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User identifier.
    pub id: UserId,

    /// Role of the actor.
    pub role: Role,

    /// Department the actor belongs to.
    pub department_id: DepartmentId,

    /// Team the actor belongs to, if any.
    pub team_id: Option<TeamId>,
}

impl Actor {
    /// Create a new actor.
    pub fn new(id: UserId, role: Role, department_id: DepartmentId) -> Self {
        Self {
            id,
            role,
            department_id,
            team_id: None,
        }
    }

    /// Set the team membership.
    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Whether the actor is a team lead of the given department.
    pub fn is_team_lead_of(&self, department_id: DepartmentId) -> bool {
        self.role == Role::TeamLead && self.department_id == department_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(Role::Employee.rank() < Role::TeamLead.rank());
        assert!(Role::TeamLead.rank() < Role::ManagingDirector.rank());
        assert_eq!(Role::ManagingDirector.rank(), Role::ItAdmin.rank());
    }

    #[test]
    fn test_full_authority() {
        assert!(Role::ManagingDirector.is_full_authority());
        assert!(Role::ItAdmin.is_full_authority());
        assert!(!Role::TeamLead.is_full_authority());
        assert!(!Role::Employee.is_full_authority());
    }

    #[test]
    fn test_is_team_lead_of() {
        let dept = DepartmentId::new();
        let other = DepartmentId::new();
        let lead = Actor::new(UserId::new(), Role::TeamLead, dept);
        assert!(lead.is_team_lead_of(dept));
        assert!(!lead.is_team_lead_of(other));

        let employee = Actor::new(UserId::new(), Role::Employee, dept);
        assert!(!employee.is_team_lead_of(dept));
    }
}
