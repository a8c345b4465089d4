//! Property-based tests for the journal entry aggregate.
//!
//! - Balance invariant: posting succeeds iff |debits - credits| < tolerance
//! - Immutability: a posted entry rejects every mutation
//! - Line validation: negative, two-sided and empty lines are rejected

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, Tolerance};

use super::entry::JournalEntry;
use super::error::{LedgerError, LineRejection};
use super::types::EntryStatus;

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Strategy for sub-cent and multi-cent drifts, in thousandths.
fn cent_drift() -> impl Strategy<Value = Decimal> {
    (-100i64..=100i64).prop_map(|mills| Decimal::new(mills, 3))
}

fn draft() -> JournalEntry {
    JournalEntry::new(
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        "Property entry",
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* debits and a credit that drifts from their sum, posting
    /// succeeds exactly when the drift is under one cent.
    #[test]
    fn prop_post_succeeds_iff_balanced(
        debits in prop::collection::vec(positive_amount(), 1..5),
        drift in cent_drift(),
    ) {
        let total: Decimal = debits.iter().copied().sum();
        let credit = total + drift;
        prop_assume!(credit > Decimal::ZERO);

        let mut entry = draft();
        for amount in &debits {
            entry.add_line(AccountId::new(), *amount, Decimal::ZERO, None).unwrap();
        }
        entry.add_line(AccountId::new(), Decimal::ZERO, credit, None).unwrap();

        let result = entry.post("tester", Tolerance::penny());
        if drift.abs() < Decimal::new(1, 2) {
            prop_assert!(result.is_ok(), "drift {} should post, got {:?}", drift, result);
            prop_assert_eq!(entry.status(), EntryStatus::Posted);
        } else {
            let is_not_balanced = matches!(result, Err(LedgerError::NotBalanced { .. }));
            prop_assert!(is_not_balanced, "drift {} should be rejected", drift);
            prop_assert_eq!(entry.status(), EntryStatus::Draft);
        }
    }

    /// *For any* posted entry, adding a line fails and leaves lines unchanged.
    #[test]
    fn prop_posted_entry_rejects_new_lines(
        amount in positive_amount(),
        extra in positive_amount(),
    ) {
        let mut entry = draft();
        entry.add_line(AccountId::new(), amount, Decimal::ZERO, None).unwrap();
        entry.add_line(AccountId::new(), Decimal::ZERO, amount, None).unwrap();
        entry.post("tester", Tolerance::penny()).unwrap();
        let before = entry.lines().to_vec();

        let result = entry.add_line(AccountId::new(), extra, Decimal::ZERO, None);
        let is_immutable = matches!(result, Err(LedgerError::EntryImmutable(_)));
        prop_assert!(is_immutable);
        prop_assert_eq!(entry.lines(), before.as_slice());
    }

    /// *For any* line with a negative side, the line is rejected.
    #[test]
    fn prop_negative_amount_rejected(
        negative in negative_amount(),
        debit_side in any::<bool>(),
    ) {
        let mut entry = draft();
        let (debit, credit) = if debit_side {
            (negative, Decimal::ZERO)
        } else {
            (Decimal::ZERO, negative)
        };
        let result = entry.add_line(AccountId::new(), debit, credit, None);
        let is_negative = matches!(
            result,
            Err(LedgerError::InvalidLine(LineRejection::NegativeAmount))
        );
        prop_assert!(is_negative);
        prop_assert!(entry.lines().is_empty());
    }

    /// *For any* two positive amounts on one line, the line is rejected.
    #[test]
    fn prop_two_sided_line_rejected(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        let mut entry = draft();
        let result = entry.add_line(AccountId::new(), debit, credit, None);
        let is_two_sided = matches!(
            result,
            Err(LedgerError::InvalidLine(LineRejection::BothSides))
        );
        prop_assert!(is_two_sided);
    }

    /// *For any* set of lines, the totals equal the per-side sums and the
    /// difference is their subtraction.
    #[test]
    fn prop_balance_matches_line_sums(
        lines in prop::collection::vec((positive_amount(), any::<bool>()), 0..10),
    ) {
        let mut entry = draft();
        let mut debits = Decimal::ZERO;
        let mut credits = Decimal::ZERO;
        for (amount, is_debit) in &lines {
            if *is_debit {
                entry.add_line(AccountId::new(), *amount, Decimal::ZERO, None).unwrap();
                debits += *amount;
            } else {
                entry.add_line(AccountId::new(), Decimal::ZERO, *amount, None).unwrap();
                credits += *amount;
            }
        }

        let totals = entry.balance();
        prop_assert_eq!(totals.total_debit, debits);
        prop_assert_eq!(totals.total_credit, credits);
        prop_assert_eq!(entry.difference(), debits - credits);
    }
}
