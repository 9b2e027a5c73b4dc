use std::sync::{Arc, Mutex, PoisonError};

use bankledger_core::{
    Account, AccountStore, Entity, EntityId, StoreError, Transaction, TransactionStore,
    TransactionType,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::dto::{AccountCreateDto, AccountDto, AmountDto, TransferDto};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("insufficient funds in account {account}: balance {available}, requested {requested}")]
    InsufficientFunds {
        account: String,
        available: Decimal,
        requested: Decimal,
    },
    #[error("currency mismatch: cannot move {from} into a {to} account")]
    CurrencyMismatch { from: String, to: String },
    #[error("source and destination are the same account: {0}")]
    SameAccount(String),
    #[error("amount {amount} would overflow the balance {balance} of account {account}")]
    AmountOverflow {
        account: String,
        balance: Decimal,
        amount: Decimal,
    },
}

/// One balance change together with the ledger entry that records it.
struct Posting {
    uuid: Uuid,
    total: Decimal,
    delta: Decimal,
    target: Decimal,
    transaction: Transaction,
}

impl Posting {
    fn new(
        uuid: Uuid,
        total: Decimal,
        delta: Decimal,
        transaction: Transaction,
    ) -> Result<Self, ServiceError> {
        let target = total
            .checked_add(delta)
            .ok_or_else(|| ServiceError::AmountOverflow {
                account: uuid.to_string(),
                balance: total,
                amount: delta,
            })?;
        Ok(Self {
            uuid,
            total,
            delta,
            target,
            transaction,
        })
    }
}

/// Coordinates the account and transaction stores.
///
/// Each store is only atomic on its own, so every operation that changes a
/// balance runs under `balance_lock` and either updates both stores or
/// neither.
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    balance_lock: Mutex<()>,
}

fn parse_uuid(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| StoreError::not_found(Account::KIND, id).into())
}

fn positive(amount: Decimal) -> Result<Decimal, ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(amount));
    }
    Ok(amount)
}

fn identity_of(account: &Account) -> Result<(Uuid, EntityId), ServiceError> {
    match (account.uuid(), account.id()) {
        (Some(uuid), Some(id)) => Ok((uuid, id)),
        _ => Err(StoreError::not_found(Account::KIND, "<unsaved>").into()),
    }
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            accounts,
            transactions,
            balance_lock: Mutex::new(()),
        }
    }

    pub fn get_all(&self) -> Vec<AccountDto> {
        self.accounts
            .get_all()
            .into_iter()
            .map(AccountDto::from)
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Result<AccountDto, ServiceError> {
        let uuid = parse_uuid(id)?;
        Ok(self.accounts.get_by_id(&uuid)?.into())
    }

    /// Opens an account. A positive opening amount is booked as a credit so
    /// the ledger always explains the balance.
    pub fn create_account(&self, request: AccountCreateDto) -> Result<AccountDto, ServiceError> {
        let opening = request.amount.unwrap_or(Decimal::ZERO);
        Account::new(request.currency.as_str(), opening).validate()?;

        let _guard = self.balance_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let account = self.accounts.create(&request.currency, Decimal::ZERO)?;
        let (uuid, id) = identity_of(&account)?;
        metrics::increment_counter!("bankledger_accounts_created_total");
        tracing::info!(%uuid, currency = %account.currency, %opening, "Account created");

        if opening > Decimal::ZERO {
            self.apply(vec![Posting::new(
                uuid,
                account.total,
                opening,
                Transaction::new(
                    id,
                    id,
                    opening,
                    account.currency.clone(),
                    TransactionType::Credit,
                )
                .with_description(Some("opening balance".to_string())),
            )?])?;
        }

        Ok(self.accounts.get_by_id(&uuid)?.into())
    }

    pub fn deposit(&self, id: &str, request: AmountDto) -> Result<AccountDto, ServiceError> {
        let uuid = parse_uuid(id)?;
        let amount = positive(request.amount)?;

        let _guard = self.balance_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let account = self.accounts.get_by_id(&uuid)?;
        let (_, account_id) = identity_of(&account)?;
        self.apply(vec![Posting::new(
            uuid,
            account.total,
            amount,
            Transaction::new(
                account_id,
                account_id,
                amount,
                account.currency.clone(),
                TransactionType::Credit,
            )
            .with_description(request.description),
        )?])?;
        tracing::info!(%uuid, %amount, "Deposit recorded");

        Ok(self.accounts.get_by_id(&uuid)?.into())
    }

    pub fn withdraw(&self, id: &str, request: AmountDto) -> Result<AccountDto, ServiceError> {
        let uuid = parse_uuid(id)?;
        let amount = positive(request.amount)?;

        let _guard = self.balance_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let account = self.accounts.get_by_id(&uuid)?;
        let (_, account_id) = identity_of(&account)?;
        self.apply(vec![Posting::new(
            uuid,
            account.total,
            -amount,
            Transaction::new(
                account_id,
                account_id,
                -amount,
                account.currency.clone(),
                TransactionType::Debit,
            )
            .with_description(request.description),
        )?])?;
        tracing::info!(%uuid, %amount, "Withdrawal recorded");

        Ok(self.accounts.get_by_id(&uuid)?.into())
    }

    /// Moves money between two accounts of the same currency and returns the
    /// source account. Each side gets its own ledger entry.
    pub fn transfer(&self, request: TransferDto) -> Result<AccountDto, ServiceError> {
        let from_uuid = parse_uuid(&request.from)?;
        let to_uuid = parse_uuid(&request.to)?;
        if from_uuid == to_uuid {
            return Err(ServiceError::SameAccount(request.from));
        }
        let amount = positive(request.amount)?;

        let _guard = self.balance_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let from = self.accounts.get_by_id(&from_uuid)?;
        let to = self.accounts.get_by_id(&to_uuid)?;
        if from.currency != to.currency {
            return Err(ServiceError::CurrencyMismatch {
                from: from.currency,
                to: to.currency,
            });
        }
        let (_, from_id) = identity_of(&from)?;
        let (_, to_id) = identity_of(&to)?;

        self.apply(vec![
            Posting::new(
                from_uuid,
                from.total,
                -amount,
                Transaction::new(
                    from_id,
                    to_id,
                    -amount,
                    from.currency.clone(),
                    TransactionType::Transfer,
                )
                .with_description(request.description.clone()),
            )?,
            Posting::new(
                to_uuid,
                to.total,
                amount,
                Transaction::new(
                    to_id,
                    from_id,
                    amount,
                    to.currency.clone(),
                    TransactionType::Transfer,
                )
                .with_description(request.description),
            )?,
        ])?;
        tracing::info!(from = %from_uuid, to = %to_uuid, %amount, "Transfer recorded");

        Ok(self.accounts.get_by_id(&from_uuid)?.into())
    }

    /// Writes a set of postings all-or-nothing. Must be called with
    /// `balance_lock` held.
    ///
    /// Everything that can be rejected is checked before the first write.
    /// Balances are written before ledger entries because a balance can be
    /// put back and a ledger entry cannot.
    fn apply(&self, postings: Vec<Posting>) -> Result<(), ServiceError> {
        for posting in &postings {
            posting.transaction.validate()?;
            if posting.target < Decimal::ZERO {
                return Err(ServiceError::InsufficientFunds {
                    account: posting.uuid.to_string(),
                    available: posting.total,
                    requested: -posting.delta,
                });
            }
        }

        let mut applied = Vec::with_capacity(postings.len());
        if let Err(e) = self.write_postings(&postings, &mut applied) {
            for (uuid, previous) in applied.into_iter().rev() {
                if let Err(restore) = self.accounts.update_total(&uuid, previous) {
                    tracing::error!(%uuid, error = %restore, "Failed to restore balance");
                }
            }
            return Err(e.into());
        }

        metrics::counter!("bankledger_transactions_recorded_total", postings.len() as u64);
        Ok(())
    }

    fn write_postings(
        &self,
        postings: &[Posting],
        applied: &mut Vec<(Uuid, Decimal)>,
    ) -> Result<(), StoreError> {
        for posting in postings {
            self.accounts
                .update_total(&posting.uuid, posting.target)?;
            applied.push((posting.uuid, posting.total));
        }
        for posting in postings {
            let saved = self.transactions.save(&posting.transaction)?;
            tracing::debug!(id = ?saved.id(), owner = ?saved.owner_account_id, "Ledger entry saved");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankledger_memory::{InMemoryAccountStore, InMemoryTransactionStore};
    use rust_decimal_macros::dec;

    fn setup() -> (Arc<InMemoryTransactionStore>, AccountService) {
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let accounts = Arc::new(InMemoryAccountStore::new(transactions.clone()));
        (transactions.clone(), AccountService::new(accounts, transactions))
    }

    fn open(service: &AccountService, currency: &str, amount: Decimal) -> AccountDto {
        service
            .create_account(AccountCreateDto {
                currency: currency.to_string(),
                amount: Some(amount),
            })
            .unwrap()
    }

    fn amount(value: Decimal) -> AmountDto {
        AmountDto {
            amount: value,
            description: None,
        }
    }

    #[test]
    fn test_create_account_without_amount() {
        let (transactions, service) = setup();
        let account = service
            .create_account(AccountCreateDto {
                currency: "USD".to_string(),
                amount: None,
            })
            .unwrap();
        assert_eq!(account.total, dec!(0));
        assert!(account.transaction_history.is_empty());
        assert!(transactions.get_all().is_empty());
    }

    #[test]
    fn test_opening_amount_is_booked() {
        let (_, service) = setup();
        let account = open(&service, "USD", dec!(50));
        assert_eq!(account.total, dec!(50));
        assert_eq!(account.transaction_history.len(), 1);
        assert_eq!(account.transaction_history[0].amount, dec!(50));
        assert_eq!(
            account.transaction_history[0].transaction_type,
            Some(TransactionType::Credit)
        );
    }

    #[test]
    fn test_create_account_reports_all_violations() {
        let (_, service) = setup();
        let err = service
            .create_account(AccountCreateDto {
                currency: "".to_string(),
                amount: Some(dec!(-1)),
            })
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("currency is missing"), "{}", message);
        assert!(message.contains("total is negative"), "{}", message);
        assert!(service.get_all().is_empty());
    }

    #[test]
    fn test_get_by_id_with_malformed_uuid() {
        let (_, service) = setup();
        let err = service.get_by_id("not-a-uuid").unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound { .. })));
        assert_eq!(err.to_string(), "account not found: not-a-uuid");
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let (_, service) = setup();
        let account = open(&service, "EUR", dec!(0));

        let account = service.deposit(&account.id, amount(dec!(40))).unwrap();
        assert_eq!(account.total, dec!(40));

        let account = service.withdraw(&account.id, amount(dec!(15.25))).unwrap();
        assert_eq!(account.total, dec!(24.75));

        let amounts: Vec<_> = account
            .transaction_history
            .iter()
            .map(|tx| tx.amount)
            .collect();
        assert_eq!(amounts, vec![dec!(40), dec!(-15.25)]);
    }

    #[test]
    fn test_withdraw_insufficient_funds_changes_nothing() {
        let (transactions, service) = setup();
        let account = open(&service, "EUR", dec!(10));

        let err = service.withdraw(&account.id, amount(dec!(10.01))).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds { .. }));

        let after = service.get_by_id(&account.id).unwrap();
        assert_eq!(after.total, dec!(10));
        assert_eq!(transactions.get_all().len(), 1);
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        let (_, service) = setup();
        let account = open(&service, "EUR", dec!(10));
        assert!(matches!(
            service.deposit(&account.id, amount(dec!(0))),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            service.withdraw(&account.id, amount(dec!(-3))),
            Err(ServiceError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_transfer_moves_money_and_records_both_sides() {
        let (_, service) = setup();
        let a = open(&service, "USD", dec!(100));
        let b = open(&service, "USD", dec!(0));

        let source = service
            .transfer(TransferDto {
                from: a.id.clone(),
                to: b.id.clone(),
                amount: dec!(30),
                description: Some("rent".to_string()),
            })
            .unwrap();
        assert_eq!(source.total, dec!(70));

        let destination = service.get_by_id(&b.id).unwrap();
        assert_eq!(destination.total, dec!(30));

        let outgoing = source.transaction_history.last().unwrap();
        assert_eq!(outgoing.amount, dec!(-30));
        assert_eq!(outgoing.transaction_type, Some(TransactionType::Transfer));
        assert_eq!(outgoing.description.as_deref(), Some("rent"));

        assert_eq!(destination.transaction_history.len(), 1);
        assert_eq!(destination.transaction_history[0].amount, dec!(30));
    }

    #[test]
    fn test_failed_transfers_leave_both_stores_untouched() {
        let (transactions, service) = setup();
        let a = open(&service, "USD", dec!(20));
        let b = open(&service, "USD", dec!(0));
        let c = open(&service, "EUR", dec!(0));
        let ledger_before = transactions.get_all();

        let transfer = |from: &str, to: &str, value: Decimal| {
            service.transfer(TransferDto {
                from: from.to_string(),
                to: to.to_string(),
                amount: value,
                description: None,
            })
        };

        assert!(matches!(
            transfer(&a.id, &b.id, dec!(20.01)),
            Err(ServiceError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            transfer(&a.id, &c.id, dec!(5)),
            Err(ServiceError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            transfer(&a.id, &a.id, dec!(5)),
            Err(ServiceError::SameAccount(_))
        ));
        assert!(matches!(
            transfer(&a.id, &Uuid::new_v4().to_string(), dec!(5)),
            Err(ServiceError::Store(StoreError::NotFound { .. }))
        ));

        assert_eq!(service.get_by_id(&a.id).unwrap().total, dec!(20));
        assert_eq!(service.get_by_id(&b.id).unwrap().total, dec!(0));
        assert_eq!(transactions.get_all(), ledger_before);
    }

    #[test]
    fn test_deposit_overflow_is_rejected_without_writes() {
        let (transactions, service) = setup();
        let account = open(&service, "USD", dec!(1));

        let err = service
            .deposit(&account.id, amount(Decimal::MAX))
            .unwrap_err();
        assert!(matches!(err, ServiceError::AmountOverflow { .. }));

        assert_eq!(service.get_by_id(&account.id).unwrap().total, dec!(1));
        assert_eq!(transactions.get_all().len(), 1);
    }

    #[test]
    fn test_transfer_overflow_is_rejected_without_writes() {
        let (transactions, service) = setup();
        let source = open(&service, "USD", dec!(5));
        let destination = open(&service, "USD", Decimal::MAX);
        let ledger_before = transactions.get_all();

        let err = service
            .transfer(TransferDto {
                from: source.id.clone(),
                to: destination.id.clone(),
                amount: dec!(1),
                description: None,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::AmountOverflow { .. }));

        assert_eq!(service.get_by_id(&source.id).unwrap().total, dec!(5));
        assert_eq!(
            service.get_by_id(&destination.id).unwrap().total,
            Decimal::MAX
        );
        assert_eq!(transactions.get_all(), ledger_before);
    }

    #[test]
    fn test_concurrent_transfers_conserve_money() {
        let (transactions, service) = setup();
        let a = open(&service, "USD", dec!(1000));
        let b = open(&service, "USD", dec!(1000));

        std::thread::scope(|scope| {
            for i in 0..8 {
                let (from, to) = if i % 2 == 0 { (&a, &b) } else { (&b, &a) };
                let service = &service;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let _ = service.transfer(TransferDto {
                            from: from.id.clone(),
                            to: to.id.clone(),
                            amount: dec!(7),
                            description: None,
                        });
                    }
                });
            }
        });

        let a = service.get_by_id(&a.id).unwrap();
        let b = service.get_by_id(&b.id).unwrap();
        assert_eq!(a.total + b.total, dec!(2000));

        let ledger_sum = |dto: &AccountDto| -> Decimal {
            dto.transaction_history.iter().map(|tx| tx.amount).sum()
        };
        assert_eq!(ledger_sum(&a), a.total);
        assert_eq!(ledger_sum(&b), b.total);
        let all: Decimal = transactions
            .get_all()
            .iter()
            .filter_map(|tx| tx.amount)
            .sum();
        assert_eq!(all, dec!(2000));
    }
}
