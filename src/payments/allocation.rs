use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// how a single payment was split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Allocation {
    pub interest_paid: Money,
    pub principal_paid: Money,
    /// interest left owing, carried into the next period
    pub unpaid_interest: Money,
}

impl Allocation {
    pub fn total_applied(&self) -> Money {
        self.interest_paid + self.principal_paid
    }

    pub fn has_shortfall(&self) -> bool {
        self.unpaid_interest.is_positive()
    }
}

/// split a payment between interest and principal
///
/// Carried-over interest and this period's interest are settled first; only the
/// remainder reduces principal. A payment that cannot cover all interest goes
/// entirely to interest and the shortfall carries forward.
pub fn allocate_payment(
    payment: Money,
    period_interest: Money,
    carried_interest: Money,
) -> Allocation {
    let total_due = carried_interest + period_interest;

    if payment >= total_due {
        Allocation {
            interest_paid: total_due,
            principal_paid: payment - total_due,
            unpaid_interest: Money::ZERO,
        }
    } else {
        Allocation {
            interest_paid: payment,
            principal_paid: Money::ZERO,
            unpaid_interest: total_due - payment,
        }
    }
}
