use serde::{Deserialize, Serialize};

/// An action a caller may attempt, checked by the access gate.
///
/// Actions are coarse route-group capabilities, not per-record permissions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    ManageProducts,
    ManageCustomers,
    ManageStaff,
    HandleOrders,
    ViewDashboard,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ManageProducts => "products.manage",
            Action::ManageCustomers => "customers.manage",
            Action::ManageStaff => "staff.manage",
            Action::HandleOrders => "orders.handle",
            Action::ViewDashboard => "dashboard.view",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
