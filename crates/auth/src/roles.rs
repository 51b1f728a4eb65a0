use serde::{Deserialize, Serialize};

use tavolo_core::DomainError;

/// Staff role, as assigned to each authenticated user.
///
/// This is a closed set: authorization decisions are made against an explicit
/// action→roles table rather than ad hoc string comparisons, so an unknown
/// role cannot slip through as "sort of allowed".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Chef,
    Receptionist,
    Staff,
}

impl Role {
    /// All known roles, in declaration order.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Chef,
        Role::Receptionist,
        Role::Staff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Chef => "Chef",
            Role::Receptionist => "Receptionist",
            Role::Staff => "Staff",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "chef" => Ok(Role::Chef),
            "receptionist" => Ok(Role::Receptionist),
            "staff" => Ok(Role::Staff),
            _ => Err(DomainError::validation(format!("unknown role '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Receptionist".parse::<Role>().unwrap(), Role::Receptionist);
        assert!("customer".parse::<Role>().is_err());
    }
}
