//! Trial balance data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use crate::ledger::LedgerError;

/// Account classes used to check the accounting equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    /// Asset account (debit-normal).
    Asset,
    /// Liability account (credit-normal).
    Liability,
    /// Equity account (credit-normal).
    Equity,
    /// Revenue account (credit-normal).
    Revenue,
    /// Expense account (debit-normal).
    Expense,
}

/// Side on which an account class normally carries its balance.
///
/// - Asset/Expense: balance = debit - credit (debit-normal)
/// - Liability/Equity/Revenue: balance = credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    Credit,
}

impl NormalBalance {
    /// Net balance of the given totals, signed by the normal side.
    #[must_use]
    pub fn balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

impl AccountClass {
    /// Returns the normal balance side.
    #[must_use]
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }
}

impl std::fmt::Display for AccountClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asset => write!(f, "asset"),
            Self::Liability => write!(f, "liability"),
            Self::Equity => write!(f, "equity"),
            Self::Revenue => write!(f, "revenue"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// Trial balance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialBalanceStatus {
    /// Snapshot may still be refreshed.
    Draft,
    /// Confirmed correct (terminal).
    Finalized,
}

/// What the equity side of the accounting equation includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EquityBasis {
    /// Assets = Liabilities + Equity.
    #[default]
    Strict,
    /// Assets = Liabilities + Equity + (Revenue - Expenses).
    IncludeNetIncome,
}

impl EquityBasis {
    /// Maps the `include_net_income_in_equity` flag.
    #[must_use]
    pub fn from_flag(include_net_income: bool) -> Self {
        if include_net_income {
            Self::IncludeNetIncome
        } else {
            Self::Strict
        }
    }
}

/// One account's row in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account class.
    pub class: AccountClass,
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
    /// Net balance on the class's normal side.
    pub balance: Decimal,
}

impl TrialBalanceLine {
    /// Builds a line and computes its normal-side balance.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        class: AccountClass,
        total_debit: Decimal,
        total_credit: Decimal,
    ) -> Self {
        Self {
            account_id,
            class,
            total_debit,
            total_credit,
            balance: class.normal_balance().balance(total_debit, total_credit),
        }
    }

    /// Returns true if debits and credits cancel out.
    #[must_use]
    pub fn is_zero_balance(&self) -> bool {
        self.balance.is_zero()
    }
}

/// Per-class balance totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTotals {
    /// Total assets.
    pub assets: Decimal,
    /// Total liabilities.
    pub liabilities: Decimal,
    /// Total equity.
    pub equity: Decimal,
    /// Total revenue.
    pub revenue: Decimal,
    /// Total expenses.
    pub expenses: Decimal,
}

impl ClassTotals {
    /// Adds a line's balance to its class.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the class total leaves the decimal range;
    /// the totals are unchanged.
    pub fn add(&mut self, line: &TrialBalanceLine) -> Result<(), LedgerError> {
        let total = match line.class {
            AccountClass::Asset => &mut self.assets,
            AccountClass::Liability => &mut self.liabilities,
            AccountClass::Equity => &mut self.equity,
            AccountClass::Revenue => &mut self.revenue,
            AccountClass::Expense => &mut self.expenses,
        };
        *total = total
            .checked_add(line.balance)
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(())
    }

    /// Revenue minus expenses.
    #[must_use]
    pub fn net_income(&self) -> Decimal {
        self.revenue - self.expenses
    }

    /// Right-hand side of the accounting equation.
    #[must_use]
    pub fn equity_side(&self, basis: EquityBasis) -> Decimal {
        match basis {
            EquityBasis::Strict => self.liabilities + self.equity,
            EquityBasis::IncludeNetIncome => self.liabilities + self.equity + self.net_income(),
        }
    }

    /// Assets minus the equity side.
    #[must_use]
    pub fn equation_difference(&self, basis: EquityBasis) -> Decimal {
        self.assets - self.equity_side(basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normal_balance_sides() {
        assert_eq!(AccountClass::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountClass::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountClass::Liability.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountClass::Equity.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountClass::Revenue.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_line_balance_follows_class() {
        let asset =
            TrialBalanceLine::new(AccountId::new(), AccountClass::Asset, dec!(500), dec!(200));
        assert_eq!(asset.balance, dec!(300));
        let liability =
            TrialBalanceLine::new(AccountId::new(), AccountClass::Liability, dec!(200), dec!(500));
        assert_eq!(liability.balance, dec!(300));
    }

    #[test]
    fn test_class_totals_equation() {
        let mut totals = ClassTotals::default();
        for line in [
            TrialBalanceLine::new(AccountId::new(), AccountClass::Asset, dec!(1000), dec!(0)),
            TrialBalanceLine::new(AccountId::new(), AccountClass::Liability, dec!(0), dec!(400)),
            TrialBalanceLine::new(AccountId::new(), AccountClass::Equity, dec!(0), dec!(500)),
            TrialBalanceLine::new(AccountId::new(), AccountClass::Revenue, dec!(0), dec!(150)),
            TrialBalanceLine::new(AccountId::new(), AccountClass::Expense, dec!(50), dec!(0)),
        ] {
            totals.add(&line).unwrap();
        }
        assert_eq!(totals.net_income(), dec!(100));
        assert_eq!(totals.equation_difference(EquityBasis::Strict), dec!(100));
        assert_eq!(totals.equation_difference(EquityBasis::IncludeNetIncome), dec!(0));
    }

    #[test]
    fn test_class_total_overflow_is_an_error() {
        let mut totals = ClassTotals {
            assets: Decimal::MAX,
            ..ClassTotals::default()
        };
        let line = TrialBalanceLine::new(AccountId::new(), AccountClass::Asset, dec!(1), dec!(0));
        assert!(matches!(totals.add(&line), Err(LedgerError::AmountOverflow)));
        assert_eq!(totals.assets, Decimal::MAX);
    }

    #[test]
    fn test_equity_basis_from_flag() {
        assert_eq!(EquityBasis::from_flag(false), EquityBasis::Strict);
        assert_eq!(EquityBasis::from_flag(true), EquityBasis::IncludeNetIncome);
    }
}
