use serde::{Deserialize, Serialize};

use coins_core::{AccountId, DomainError, DomainResult};

/// Account holder record.
///
/// The ledger only ever refers to accounts by `id`; names live here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
}

/// Validated input for creating an account (id assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    first_name: String,
    last_name: String,
}

impl NewAccount {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> DomainResult<Self> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();

        if first_name.is_empty() {
            return Err(DomainError::validation("first_name must not be blank"));
        }
        if last_name.is_empty() {
            return Err(DomainError::validation("last_name must not be blank"));
        }

        Ok(Self {
            first_name,
            last_name,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Attach the store-assigned identifier.
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        let new = NewAccount::new("  Ada ", "Lovelace\n").unwrap();
        let account = new.into_account(AccountId::new(7));
        assert_eq!(account.first_name, "Ada");
        assert_eq!(account.last_name, "Lovelace");
        assert_eq!(account.id, AccountId::new(7));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            NewAccount::new("   ", "Lovelace"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            NewAccount::new("Ada", ""),
            Err(DomainError::Validation(_))
        ));
    }
}
