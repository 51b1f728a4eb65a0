use thiserror::Error;

use crate::{Action, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' may not perform '{action}'")]
    Forbidden { role: Role, action: Action },
}

/// The explicit action→allowed-roles table.
///
/// Every order-handling action is open to the whole staff; catalog, customer
/// and staff management are restricted to the role groups below.
pub fn allowed_roles(action: Action) -> &'static [Role] {
    match action {
        Action::ManageProducts => &[Role::Admin, Role::Manager, Role::Chef],
        Action::ManageCustomers => &[Role::Admin, Role::Manager, Role::Receptionist],
        Action::ManageStaff => &[Role::Admin],
        Action::HandleOrders | Action::ViewDashboard => &Role::ALL,
    }
}

/// Authorize a caller's role for an action.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(role: Role, action: Action) -> Result<(), AuthzError> {
    if allowed_roles(action).contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { role, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_allowed_everything() {
        for action in [
            Action::ManageProducts,
            Action::ManageCustomers,
            Action::ManageStaff,
            Action::HandleOrders,
            Action::ViewDashboard,
        ] {
            assert!(authorize(Role::Admin, action).is_ok());
        }
    }

    #[test]
    fn chef_manages_products_but_not_customers() {
        assert!(authorize(Role::Chef, Action::ManageProducts).is_ok());
        let err = authorize(Role::Chef, Action::ManageCustomers).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                role: Role::Chef,
                action: Action::ManageCustomers
            }
        );
    }

    #[test]
    fn receptionist_manages_customers_but_not_products() {
        assert!(authorize(Role::Receptionist, Action::ManageCustomers).is_ok());
        assert!(authorize(Role::Receptionist, Action::ManageProducts).is_err());
    }

    #[test]
    fn every_role_handles_orders() {
        for role in Role::ALL {
            assert!(authorize(role, Action::HandleOrders).is_ok());
            assert!(authorize(role, Action::ViewDashboard).is_ok());
        }
    }

    #[test]
    fn only_admin_manages_staff() {
        for role in Role::ALL {
            let outcome = authorize(role, Action::ManageStaff);
            if role == Role::Admin {
                assert!(outcome.is_ok());
            } else {
                assert!(outcome.is_err());
            }
        }
    }
}
