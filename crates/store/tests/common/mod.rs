//! Shared fixtures for the posting integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tally_core::fiscal::{AccountingPeriod, NewAccountingPeriod, PeriodType};
use tally_core::ledger::{LineInput, NewJournalEntry};
use tally_core::posting::{CollectingEventSink, PostingService};
use tally_core::reports::{AccountClass, ChartOfAccounts};
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountId, DateRange};
use tally_store::InMemoryLedgerStore;
use tokio_util::sync::CancellationToken;

/// Posting service wired to one in-memory store.
pub type Service = PostingService<InMemoryLedgerStore, InMemoryLedgerStore, InMemoryLedgerStore>;

/// Accounts of a small chart, one per class plus a spare asset.
pub struct Accounts {
    pub cash: AccountId,
    pub bank: AccountId,
    pub loan: AccountId,
    pub capital: AccountId,
    pub sales: AccountId,
    pub rent: AccountId,
}

impl Accounts {
    fn new() -> Self {
        Self {
            cash: AccountId::new(),
            bank: AccountId::new(),
            loan: AccountId::new(),
            capital: AccountId::new(),
            sales: AccountId::new(),
            rent: AccountId::new(),
        }
    }

    fn chart(&self) -> ChartOfAccounts {
        ChartOfAccounts::new()
            .with(self.cash, AccountClass::Asset)
            .with(self.bank, AccountClass::Asset)
            .with(self.loan, AccountClass::Liability)
            .with(self.capital, AccountClass::Equity)
            .with(self.sales, AccountClass::Revenue)
            .with(self.rent, AccountClass::Expense)
    }
}

/// Everything a test needs to drive the ledger.
pub struct TestLedger {
    pub store: InMemoryLedgerStore,
    pub service: Service,
    pub events: Arc<CollectingEventSink>,
    pub accounts: Accounts,
}

pub fn ledger() -> TestLedger {
    ledger_with(LedgerConfig::default())
}

pub fn ledger_with(config: LedgerConfig) -> TestLedger {
    build(config, CancellationToken::new())
}

/// A ledger whose writes stop once `cancel` fires.
pub fn cancellable_ledger(cancel: CancellationToken) -> TestLedger {
    build(LedgerConfig::default(), cancel)
}

fn build(config: LedgerConfig, cancel: CancellationToken) -> TestLedger {
    let store = InMemoryLedgerStore::new();
    let accounts = Accounts::new();
    let events = Arc::new(CollectingEventSink::new());
    let service = PostingService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(accounts.chart()),
    )
    .with_config(config)
    .with_event_sink(events.clone())
    .with_cancellation(cancel);

    TestLedger {
        store,
        service,
        events,
        accounts,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn month(name: &str, start: NaiveDate, end: NaiveDate) -> NewAccountingPeriod {
    NewAccountingPeriod {
        name: name.to_string(),
        range: DateRange::new(start, end).unwrap(),
        fiscal_year: start.year(),
        period_type: PeriodType::Monthly,
        is_adjustment_period: false,
    }
}

pub fn january() -> NewAccountingPeriod {
    month("January 2026", date(2026, 1, 1), date(2026, 1, 31))
}

pub async fn open_january(ledger: &TestLedger) -> AccountingPeriod {
    ledger.service.open_period(january()).await.unwrap()
}

/// A two-line entry: debit one account, credit another.
pub fn transfer(
    day: NaiveDate,
    debit_account: AccountId,
    debit: Decimal,
    credit_account: AccountId,
    credit: Decimal,
) -> NewJournalEntry {
    NewJournalEntry {
        date: day,
        reference_number: None,
        description: "Test entry".to_string(),
        source: None,
        lines: vec![
            LineInput::debit(debit_account, debit),
            LineInput::credit(credit_account, credit),
        ],
    }
}
