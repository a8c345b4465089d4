//! Trial balance aggregate and computation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, AccountingPeriodId, DateRange, Tolerance, TrialBalanceId};

use super::classifier::AccountClassifier;
use super::types::{ClassTotals, EquityBasis, TrialBalanceLine, TrialBalanceStatus};
use crate::fiscal::AccountingPeriod;
use crate::ledger::error::LedgerError;
use crate::ledger::types::BalanceTotals;
use crate::ledger::validation::require_text;
use crate::ledger::JournalEntry;

/// Point-in-time aggregation of posted lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSnapshot {
    /// Per-account rows, ordered by account id.
    pub lines: Vec<TrialBalanceLine>,
    /// Raw debit and credit sums over every posted line.
    pub totals: BalanceTotals,
    /// Per-class balances.
    pub class_totals: ClassTotals,
}

/// Sums the posted lines of the entries dated inside `range`.
///
/// Draft entries and entries outside the range are ignored.
///
/// # Errors
///
/// Returns `AmountOverflow` if a total leaves the decimal range.
pub fn posted_totals(
    entries: &[JournalEntry],
    range: DateRange,
) -> Result<BalanceTotals, LedgerError> {
    entries
        .iter()
        .filter(|entry| entry.is_posted() && range.contains(entry.date()))
        .flat_map(JournalEntry::lines)
        .try_fold(BalanceTotals::ZERO, |totals, line| {
            totals.checked_add(line.debit(), line.credit())
        })
}

/// Builds a snapshot from posted entries dated inside `range`.
///
/// Accounts whose debits and credits cancel out are dropped unless
/// `include_zero_balances` is set. Totals always cover every posted line.
///
/// # Errors
///
/// - `AccountNotClassified` for the first account the classifier does not know
/// - `AmountOverflow` if a total leaves the decimal range
pub fn compute_snapshot(
    entries: &[JournalEntry],
    range: DateRange,
    classifier: &dyn AccountClassifier,
    include_zero_balances: bool,
) -> Result<TrialBalanceSnapshot, LedgerError> {
    let mut per_account: BTreeMap<AccountId, BalanceTotals> = BTreeMap::new();
    let mut totals = BalanceTotals::ZERO;

    for entry in entries
        .iter()
        .filter(|entry| entry.is_posted() && range.contains(entry.date()))
    {
        for line in entry.lines() {
            let account = per_account.entry(line.account_id()).or_default();
            *account = account.checked_add(line.debit(), line.credit())?;
            totals = totals.checked_add(line.debit(), line.credit())?;
        }
    }

    let mut lines = Vec::with_capacity(per_account.len());
    let mut class_totals = ClassTotals::default();
    for (account_id, sums) in per_account {
        let class = classifier
            .classify(account_id)
            .ok_or(LedgerError::AccountNotClassified(account_id))?;
        let line = TrialBalanceLine::new(account_id, class, sums.total_debit, sums.total_credit);
        class_totals.add(&line)?;
        if include_zero_balances || !line.is_zero_balance() {
            lines.push(line);
        }
    }

    Ok(TrialBalanceSnapshot {
        lines,
        totals,
        class_totals,
    })
}

/// A trial balance for one accounting period.
///
/// `Draft --finalize--> Finalized`. A draft can be refreshed from the
/// current ledger; a finalized one never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    id: TrialBalanceId,
    number: String,
    period_id: AccountingPeriodId,
    range: DateRange,
    status: TrialBalanceStatus,
    snapshot: TrialBalanceSnapshot,
    include_zero_balances: bool,
    generated_on: DateTime<Utc>,
    finalized_by: Option<String>,
    finalized_on: Option<DateTime<Utc>>,
    version: u64,
}

impl TrialBalance {
    /// Creates a draft trial balance for a period.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the number is blank.
    pub fn generate(
        number: &str,
        period: &AccountingPeriod,
        snapshot: TrialBalanceSnapshot,
        include_zero_balances: bool,
    ) -> Result<Self, LedgerError> {
        require_text("trial_balance_number", number)?;
        Ok(Self {
            id: TrialBalanceId::new(),
            number: number.trim().to_string(),
            period_id: period.id(),
            range: period.range(),
            status: TrialBalanceStatus::Draft,
            snapshot,
            include_zero_balances,
            generated_on: Utc::now(),
            finalized_by: None,
            finalized_on: None,
            version: 0,
        })
    }

    /// Trial balance id.
    #[must_use]
    pub fn id(&self) -> TrialBalanceId {
        self.id
    }

    /// Trial balance number.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Period the snapshot covers.
    #[must_use]
    pub fn period_id(&self) -> AccountingPeriodId {
        self.period_id
    }

    /// Period dates as of the last generation or refresh.
    #[must_use]
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TrialBalanceStatus {
        self.status
    }

    /// Returns true once finalized.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status == TrialBalanceStatus::Finalized
    }

    /// Per-account rows.
    #[must_use]
    pub fn lines(&self) -> &[TrialBalanceLine] {
        &self.snapshot.lines
    }

    /// Total debits.
    #[must_use]
    pub fn total_debits(&self) -> Decimal {
        self.snapshot.totals.total_debit
    }

    /// Total credits.
    #[must_use]
    pub fn total_credits(&self) -> Decimal {
        self.snapshot.totals.total_credit
    }

    /// Per-class balances.
    #[must_use]
    pub fn class_totals(&self) -> ClassTotals {
        self.snapshot.class_totals
    }

    /// Total debits minus total credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.snapshot.totals.difference()
    }

    /// Returns true if the totals agree within the tolerance.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Tolerance) -> bool {
        self.snapshot.totals.is_balanced(tolerance)
    }

    /// Whether zero-balance accounts are listed.
    #[must_use]
    pub fn include_zero_balances(&self) -> bool {
        self.include_zero_balances
    }

    /// When the snapshot was last computed.
    #[must_use]
    pub fn generated_on(&self) -> DateTime<Utc> {
        self.generated_on
    }

    /// Who finalized it.
    #[must_use]
    pub fn finalized_by(&self) -> Option<&str> {
        self.finalized_by.as_deref()
    }

    /// When it was finalized.
    #[must_use]
    pub fn finalized_on(&self) -> Option<DateTime<Utc>> {
        self.finalized_on
    }

    /// Optimistic concurrency version. Zero until first saved.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stamps the version assigned by a successful save.
    ///
    /// Only persistence adapters call this.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Replaces the snapshot of a draft, computed over the period's
    /// current dates.
    ///
    /// # Errors
    ///
    /// Returns `TrialBalanceFinalized` once finalized.
    pub fn refresh(
        &mut self,
        range: DateRange,
        snapshot: TrialBalanceSnapshot,
    ) -> Result<(), LedgerError> {
        if self.is_finalized() {
            return Err(LedgerError::TrialBalanceFinalized(self.id));
        }
        self.range = range;
        self.snapshot = snapshot;
        self.generated_on = Utc::now();
        Ok(())
    }

    /// Confirms the snapshot. Terminal.
    ///
    /// On failure the trial balance stays a draft.
    ///
    /// # Errors
    ///
    /// - `TrialBalanceFinalized` if already finalized
    /// - `MissingField` if `finalized_by` is blank
    /// - `TrialBalanceNotBalanced` if |debits - credits| >= tolerance
    /// - `AccountingEquationViolation` if |assets - equity side| > tolerance
    pub fn finalize(
        &mut self,
        finalized_by: &str,
        tolerance: Tolerance,
        basis: EquityBasis,
    ) -> Result<(), LedgerError> {
        if self.is_finalized() {
            return Err(LedgerError::TrialBalanceFinalized(self.id));
        }
        require_text("finalized_by", finalized_by)?;

        if !self.is_balanced(tolerance) {
            return Err(LedgerError::TrialBalanceNotBalanced {
                debit: self.total_debits(),
                credit: self.total_credits(),
            });
        }

        let classes = self.snapshot.class_totals;
        if classes.equation_difference(basis).abs() > tolerance.value() {
            return Err(LedgerError::AccountingEquationViolation {
                assets: classes.assets,
                liabilities: classes.liabilities,
                equity: classes.equity_side(basis) - classes.liabilities,
            });
        }

        self.status = TrialBalanceStatus::Finalized;
        self.finalized_by = Some(finalized_by.trim().to_string());
        self.finalized_on = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::{NewAccountingPeriod, PeriodType};
    use crate::reports::classifier::ChartOfAccounts;
    use crate::reports::types::AccountClass;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> AccountingPeriod {
        AccountingPeriod::create(NewAccountingPeriod {
            name: "January 2026".to_string(),
            range: DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap(),
            fiscal_year: 2026,
            period_type: PeriodType::Monthly,
            is_adjustment_period: false,
        })
        .unwrap()
    }

    struct Accounts {
        cash: AccountId,
        loan: AccountId,
        capital: AccountId,
        chart: ChartOfAccounts,
    }

    fn accounts() -> Accounts {
        let cash = AccountId::new();
        let loan = AccountId::new();
        let capital = AccountId::new();
        let chart = ChartOfAccounts::new()
            .with(cash, AccountClass::Asset)
            .with(loan, AccountClass::Liability)
            .with(capital, AccountClass::Equity);
        Accounts {
            cash,
            loan,
            capital,
            chart,
        }
    }

    fn posted(day: u32, lines: &[(AccountId, Decimal, Decimal)]) -> JournalEntry {
        let mut entry = JournalEntry::new(date(2026, 1, day), "test");
        for (account, debit, credit) in lines {
            entry.add_line(*account, *debit, *credit, None).unwrap();
        }
        entry.post("tester", Tolerance::penny()).unwrap();
        entry
    }

    #[test]
    fn test_snapshot_sums_posted_entries_in_range() {
        let a = accounts();
        let mut draft = JournalEntry::new(date(2026, 1, 20), "draft");
        draft.add_line(a.cash, dec!(999), Decimal::ZERO, None).unwrap();
        let outside = {
            let mut e = JournalEntry::new(date(2026, 2, 1), "february");
            e.add_line(a.cash, dec!(50), Decimal::ZERO, None).unwrap();
            e.add_line(a.capital, Decimal::ZERO, dec!(50), None).unwrap();
            e.post("tester", Tolerance::penny()).unwrap();
            e
        };
        let entries = vec![
            posted(5, &[(a.cash, dec!(1000), dec!(0)), (a.capital, dec!(0), dec!(1000))]),
            posted(10, &[(a.cash, dec!(400), dec!(0)), (a.loan, dec!(0), dec!(400))]),
            draft,
            outside,
        ];

        let snapshot = compute_snapshot(&entries, january().range(), &a.chart, false).unwrap();

        assert_eq!(snapshot.totals, BalanceTotals::new(dec!(1400), dec!(1400)));
        assert_eq!(snapshot.lines.len(), 3);
        assert_eq!(snapshot.class_totals.assets, dec!(1400));
        assert_eq!(snapshot.class_totals.liabilities, dec!(400));
        assert_eq!(snapshot.class_totals.equity, dec!(1000));
        assert_eq!(
            posted_totals(&entries, january().range()).unwrap(),
            BalanceTotals::new(dec!(1400), dec!(1400))
        );
    }

    #[test]
    fn test_unclassified_account_fails() {
        let a = accounts();
        let stranger = AccountId::new();
        let lines = [(a.cash, dec!(10), dec!(0)), (stranger, dec!(0), dec!(10))];
        let entries = vec![posted(5, &lines)];
        assert!(matches!(
            compute_snapshot(&entries, january().range(), &a.chart, false),
            Err(LedgerError::AccountNotClassified(id)) if id == stranger
        ));
    }

    #[test]
    fn test_zero_balance_accounts_dropped_unless_requested() {
        let a = accounts();
        let entries = vec![
            posted(5, &[(a.cash, dec!(100), dec!(0)), (a.loan, dec!(0), dec!(100))]),
            posted(6, &[(a.loan, dec!(100), dec!(0)), (a.cash, dec!(0), dec!(100))]),
        ];
        let range = january().range();

        let without = compute_snapshot(&entries, range, &a.chart, false).unwrap();
        assert!(without.lines.is_empty());
        assert_eq!(without.totals, BalanceTotals::new(dec!(200), dec!(200)));

        let with = compute_snapshot(&entries, range, &a.chart, true).unwrap();
        assert_eq!(with.lines.len(), 2);
    }

    #[test]
    fn test_finalize_balanced() {
        let a = accounts();
        let lines = [(a.cash, dec!(1000), dec!(0)), (a.capital, dec!(0), dec!(1000))];
        let entries = vec![posted(5, &lines)];
        let period = january();
        let snapshot = compute_snapshot(&entries, period.range(), &a.chart, false).unwrap();
        let mut tb = TrialBalance::generate("TB-2026-01", &period, snapshot, false).unwrap();

        tb.finalize(" auditor ", Tolerance::penny(), EquityBasis::Strict).unwrap();

        assert!(tb.is_finalized());
        assert_eq!(tb.finalized_by(), Some("auditor"));
        assert!(tb.finalized_on().is_some());
    }

    #[test]
    fn test_finalize_rejects_drift() {
        let a = accounts();
        let entries = vec![
            posted(5, &[(a.cash, dec!(100.00), dec!(0)), (a.capital, dec!(0), dec!(99.995))]),
            posted(6, &[(a.cash, dec!(100.00), dec!(0)), (a.capital, dec!(0), dec!(99.995))]),
        ];
        let period = january();
        let snapshot = compute_snapshot(&entries, period.range(), &a.chart, false).unwrap();
        let mut tb = TrialBalance::generate("TB-1", &period, snapshot, false).unwrap();
        assert_eq!(tb.difference(), dec!(0.010));

        let result = tb.finalize("auditor", Tolerance::penny(), EquityBasis::Strict);

        assert!(matches!(
            result,
            Err(LedgerError::TrialBalanceNotBalanced { debit, credit })
                if debit == dec!(200.00) && credit == dec!(199.990)
        ));
        assert_eq!(tb.status(), TrialBalanceStatus::Draft);
    }

    #[test]
    fn test_finalize_rejects_equation_violation() {
        let a = accounts();
        let sales = AccountId::new();
        let chart = a.chart.clone().with(sales, AccountClass::Revenue);
        let entries = vec![posted(5, &[(a.cash, dec!(300), dec!(0)), (sales, dec!(0), dec!(300))])];
        let period = january();

        let snapshot = compute_snapshot(&entries, period.range(), &chart, false).unwrap();
        let mut strict = TrialBalance::generate("TB-1", &period, snapshot.clone(), false).unwrap();
        assert!(matches!(
            strict.finalize("auditor", Tolerance::penny(), EquityBasis::Strict),
            Err(LedgerError::AccountingEquationViolation { assets, liabilities, equity })
                if assets == dec!(300) && liabilities == dec!(0) && equity == dec!(0)
        ));
        assert!(!strict.is_finalized());

        let mut with_income = TrialBalance::generate("TB-2", &period, snapshot, false).unwrap();
        with_income
            .finalize("auditor", Tolerance::penny(), EquityBasis::IncludeNetIncome)
            .unwrap();
    }

    #[test]
    fn test_finalized_is_terminal() {
        let a = accounts();
        let period = january();
        let snapshot = compute_snapshot(&[], period.range(), &a.chart, false).unwrap();
        let mut tb = TrialBalance::generate("TB-1", &period, snapshot.clone(), false).unwrap();
        tb.finalize("auditor", Tolerance::penny(), EquityBasis::Strict).unwrap();

        assert!(matches!(
            tb.finalize("auditor", Tolerance::penny(), EquityBasis::Strict),
            Err(LedgerError::TrialBalanceFinalized(_))
        ));
        assert!(matches!(
            tb.refresh(period.range(), snapshot),
            Err(LedgerError::TrialBalanceFinalized(_))
        ));
    }

    #[test]
    fn test_generate_requires_number_and_finalize_requires_actor() {
        let a = accounts();
        let period = january();
        let snapshot = compute_snapshot(&[], period.range(), &a.chart, false).unwrap();
        assert!(matches!(
            TrialBalance::generate(" ", &period, snapshot.clone(), false),
            Err(LedgerError::MissingField("trial_balance_number"))
        ));

        let mut tb = TrialBalance::generate("TB-1", &period, snapshot, false).unwrap();
        assert!(matches!(
            tb.finalize("", Tolerance::penny(), EquityBasis::Strict),
            Err(LedgerError::MissingField("finalized_by"))
        ));
    }

    #[test]
    fn test_refresh_replaces_snapshot() {
        let a = accounts();
        let period = january();
        let empty = compute_snapshot(&[], period.range(), &a.chart, false).unwrap();
        let mut tb = TrialBalance::generate("TB-1", &period, empty, false).unwrap();
        assert_eq!(tb.total_debits(), Decimal::ZERO);

        let entries = vec![posted(
            7,
            &[(a.cash, dec!(25), dec!(0)), (a.capital, dec!(0), dec!(25))],
        )];
        let wider = DateRange::new(date(2026, 1, 1), date(2026, 2, 5)).unwrap();
        let snapshot = compute_snapshot(&entries, wider, &a.chart, false).unwrap();
        tb.refresh(wider, snapshot).unwrap();
        assert_eq!(tb.total_debits(), dec!(25));
        assert_eq!(tb.lines().len(), 2);
        assert_eq!(tb.range(), wider);
    }
}
