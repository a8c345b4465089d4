//! Account classification seam.

use std::collections::HashMap;

use tally_shared::types::AccountId;

use super::types::AccountClass;

/// Maps accounts to their class.
///
/// The chart of accounts lives outside the posting core; this trait is how
/// the trial balance learns which side of the equation an account is on.
pub trait AccountClassifier: Send + Sync {
    /// Returns the account's class, or `None` if it is unknown.
    fn classify(&self, account_id: AccountId) -> Option<AccountClass>;
}

/// In-memory chart of accounts.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    classes: HashMap<AccountId, AccountClass>,
}

impl ChartOfAccounts {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account, builder style.
    #[must_use]
    pub fn with(mut self, account_id: AccountId, class: AccountClass) -> Self {
        self.classes.insert(account_id, class);
        self
    }

    /// Adds or reclassifies an account.
    pub fn insert(&mut self, account_id: AccountId, class: AccountClass) {
        self.classes.insert(account_id, class);
    }

    /// Number of classified accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no accounts are classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl AccountClassifier for ChartOfAccounts {
    fn classify(&self, account_id: AccountId) -> Option<AccountClass> {
        self.classes.get(&account_id).copied()
    }
}

impl FromIterator<(AccountId, AccountClass)> for ChartOfAccounts {
    fn from_iter<I: IntoIterator<Item = (AccountId, AccountClass)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}
