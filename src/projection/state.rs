//! Per-facility balance tracking during debt scheduling

use crate::parameters::DebtFacility;

/// Outstanding position of one facility between scheduling years
#[derive(Debug, Clone)]
pub struct FacilityState {
    /// Opening principal, native currency
    pub original_principal: f64,

    /// Outstanding balance, native currency
    pub balance: f64,

    /// Principal repaid so far, native currency
    pub cumulative_principal: f64,
}

impl FacilityState {
    pub fn from_facility(facility: &DebtFacility) -> Self {
        let principal = facility.principal.max(0.0);
        Self {
            original_principal: principal,
            balance: principal,
            cumulative_principal: 0.0,
        }
    }

    /// Interest accrued on the opening balance of the coming year
    pub fn interest(&self, rate: f64) -> f64 {
        self.balance * rate
    }

    /// Close out a year by repaying `principal`.
    ///
    /// Negative principal is treated as zero and the balance never goes below
    /// zero. Returns the principal actually applied.
    pub fn repay(&mut self, principal: f64) -> f64 {
        let applied = principal.max(0.0).min(self.balance);
        self.balance = (self.balance - applied).max(0.0);
        self.cumulative_principal += applied;
        applied
    }

    /// Share of the opening principal still outstanding
    pub fn unpaid_share(&self) -> f64 {
        if self.original_principal <= 0.0 {
            0.0
        } else {
            self.balance / self.original_principal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::DebtStructure;

    #[test]
    fn test_repay_never_increases_balance() {
        let mut state = FacilityState::from_facility(&DebtStructure::default().usd);
        let opening = state.balance;

        assert_eq!(state.repay(-5.0), 0.0);
        assert_eq!(state.balance, opening);

        assert_eq!(state.repay(opening * 2.0), opening);
        assert_eq!(state.balance, 0.0);
        assert_eq!(state.unpaid_share(), 0.0);
        assert_eq!(state.cumulative_principal, opening);
    }
}
