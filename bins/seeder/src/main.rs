//! Demo ledger seeder for Tally development and testing.
//!
//! Opens a monthly fiscal calendar, books and posts a handful of January
//! entries plus the entry closing January's income statement into retained
//! earnings, leaves one February draft awaiting approval, closes January and
//! finalizes its trial balance. The finished trial balance is printed as JSON.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::fiscal::PeriodType;
use tally_core::ledger::{LineInput, NewJournalEntry};
use tally_core::posting::PostingService;
use tally_core::reports::{AccountClass, ChartOfAccounts};
use tally_shared::AppConfig;
use tally_shared::types::{AccountId, DateRange};
use tally_store::InMemoryLedgerStore;

const FISCAL_YEAR: i32 = 2026;

type Service = PostingService<InMemoryLedgerStore, InMemoryLedgerStore, InMemoryLedgerStore>;

/// Demo chart of accounts.
struct Accounts {
    cash: AccountId,
    receivables: AccountId,
    bank_loan: AccountId,
    owner_capital: AccountId,
    retained_earnings: AccountId,
    sales: AccountId,
    rent: AccountId,
    salaries: AccountId,
}

impl Accounts {
    fn new() -> Self {
        Self {
            cash: AccountId::new(),
            receivables: AccountId::new(),
            bank_loan: AccountId::new(),
            owner_capital: AccountId::new(),
            retained_earnings: AccountId::new(),
            sales: AccountId::new(),
            rent: AccountId::new(),
            salaries: AccountId::new(),
        }
    }

    fn chart(&self) -> ChartOfAccounts {
        ChartOfAccounts::new()
            .with(self.cash, AccountClass::Asset)
            .with(self.receivables, AccountClass::Asset)
            .with(self.bank_loan, AccountClass::Liability)
            .with(self.owner_capital, AccountClass::Equity)
            .with(self.retained_earnings, AccountClass::Equity)
            .with(self.sales, AccountClass::Revenue)
            .with(self.rent, AccountClass::Expense)
            .with(self.salaries, AccountClass::Expense)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling remaining writes");
                cancel.cancel();
            }
        }
    });

    let accounts = Accounts::new();
    let store = InMemoryLedgerStore::new();
    let service: Service = PostingService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(accounts.chart()),
    )
    .with_config(config.ledger.clone())
    .with_cancellation(cancel);

    println!("Seeding fiscal calendar...");
    let year = DateRange::new(date(FISCAL_YEAR, 1, 1)?, date(FISCAL_YEAR, 12, 31)?)?;
    let periods = service
        .generate_calendar(FISCAL_YEAR, year, PeriodType::Monthly)
        .await?;
    let january = periods.first().context("Calendar has no periods")?;

    println!("Seeding January entries...");
    seed_january(&service, &accounts).await?;

    println!("Seeding February draft...");
    service
        .record_entry(entry(
            date(FISCAL_YEAR, 2, 3)?,
            "February rent",
            vec![
                LineInput::debit(accounts.rent, dec!(1200.00)),
                LineInput::credit(accounts.cash, dec!(1200.00)),
            ],
        ))
        .await?;

    println!("Closing {}...", january.name());
    service.close_period(january.id(), "seeder").await?;

    println!("Generating trial balance...");
    let number = format!("TB-{FISCAL_YEAR}-01");
    let trial_balance = service
        .generate_trial_balance(january.id(), &number, false)
        .await?;

    let trial_balance = service
        .finalize_trial_balance(trial_balance.id(), "seeder")
        .await?;

    info!(
        entries = store.entry_count().await,
        trial_balances = store.trial_balance_count().await,
        "Seeding complete"
    );
    println!("{}", serde_json::to_string_pretty(&trial_balance)?);

    Ok(())
}

async fn seed_january(service: &Service, accounts: &Accounts) -> anyhow::Result<()> {
    let a = accounts;
    let entries = [
        (2, "Owner capital injection", a.cash, a.owner_capital, dec!(50000.00)),
        (5, "Bank loan drawdown", a.cash, a.bank_loan, dec!(20000.00)),
        (10, "January rent", a.rent, a.cash, dec!(1200.00)),
        (18, "Invoice 2026-001", a.receivables, a.sales, dec!(8400.00)),
        (31, "January payroll", a.salaries, a.cash, dec!(4300.00)),
    ];

    for (day, description, debit_account, credit_account, amount) in entries {
        let lines = vec![
            LineInput::debit(debit_account, amount),
            LineInput::credit(credit_account, amount),
        ];
        book(service, date(FISCAL_YEAR, 1, day)?, description, lines).await?;
    }

    // Revenue and expenses into retained earnings: 8400 - 1200 - 4300.
    let closing = vec![
        LineInput::debit(a.sales, dec!(8400.00)),
        LineInput::credit(a.rent, dec!(1200.00)),
        LineInput::credit(a.salaries, dec!(4300.00)),
        LineInput::credit(a.retained_earnings, dec!(2900.00)),
    ];
    book(service, date(FISCAL_YEAR, 1, 31)?, "Close January income", closing).await
}

async fn book(
    service: &Service,
    date: NaiveDate,
    description: &str,
    lines: Vec<LineInput>,
) -> anyhow::Result<()> {
    let booked = service.record_entry(entry(date, description, lines)).await?;
    service.approve_entry(booked.id(), "controller").await?;
    service.post_entry(booked.id(), "seeder").await?;
    Ok(())
}

fn entry(date: NaiveDate, description: &str, lines: Vec<LineInput>) -> NewJournalEntry {
    NewJournalEntry {
        date,
        reference_number: None,
        description: description.to_string(),
        source: Some("Seeder".to_string()),
        lines,
    }
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("Invalid date {year}-{month:02}-{day:02}"))
}
