//! Creates, amends and deletes transactions while keeping account balances in step.
//!
//! Each operation runs as one atomic unit: the transaction row and every
//! balance it touches are written together, or the unit is rolled back and
//! no balance has moved.

use crate::{
    Error, ValidationError,
    booking::engine::{Direction, Legs, amendment_postings, apply_postings, book_postings},
    database_id::{AccountId, TransactionId},
    gateway::{BookingStore, Gateway},
    transaction::{Transaction, TransactionBuilder},
};

/// Record a new transaction and book it against its accounts.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the amount is zero or the accounts do not form a
///   transfer, withdrawal or deposit,
/// - [Error::AccountNotFound] if a referenced account does not exist,
/// - [Error::CategoryNotFound] if the category does not exist,
/// - or any persistence error from `gateway`.
pub fn create_transaction(
    builder: TransactionBuilder,
    gateway: &mut impl Gateway,
) -> Result<Transaction, Error> {
    let kind = builder.validate()?;
    let legs = Legs::from(&builder);

    let transaction = gateway.with_atomic_unit(|store| {
        store.lock_accounts(&referenced_accounts(&[legs]))?;
        check_category(store, &builder)?;

        let transaction = store.insert_transaction(&builder)?;
        apply_postings(store, &book_postings(legs, Direction::Book))?;

        Ok(transaction)
    })?;

    tracing::info!(
        "Created {kind:?} transaction {} of {}",
        transaction.id,
        transaction.amount
    );

    Ok(transaction)
}

/// Replace the fields of the transaction `id` with `builder` and rebook the difference.
///
/// Amending a transaction with its current values leaves every balance as it is.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if `id` is not a valid ID, or `builder` is invalid
///   as for [create_transaction],
/// - [Error::TransactionNotFound] if the transaction does not exist,
/// - [Error::AccountNotFound] if an old or new account does not exist,
/// - [Error::CategoryNotFound] if the new category does not exist,
/// - or any persistence error from `gateway`.
pub fn amend_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    gateway: &mut impl Gateway,
) -> Result<Transaction, Error> {
    require_transaction_id(id)?;
    builder.validate()?;
    let new = Legs::from(&builder);

    let transaction = gateway.with_atomic_unit(|store| {
        let old = Legs::from(&store.load_transaction(id)?);
        store.lock_accounts(&referenced_accounts(&[old, new]))?;
        check_category(store, &builder)?;

        let transaction = store.update_transaction(id, &builder)?;
        apply_postings(store, &amendment_postings(old, new)?)?;

        Ok(transaction)
    })?;

    tracing::info!("Amended transaction {id}");

    Ok(transaction)
}

/// Un-book the transaction `id` and delete it.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if `id` is not a valid ID,
/// - [Error::TransactionNotFound] if the transaction does not exist,
/// - or any persistence error from `gateway`.
pub fn delete_transaction(id: TransactionId, gateway: &mut impl Gateway) -> Result<(), Error> {
    require_transaction_id(id)?;

    gateway.with_atomic_unit(|store| {
        let legs = Legs::from(&store.load_transaction(id)?);
        store.lock_accounts(&referenced_accounts(&[legs]))?;

        apply_postings(store, &book_postings(legs, Direction::Reverse))?;
        store.delete_transaction_row(id)
    })?;

    tracing::info!("Deleted transaction {id}");

    Ok(())
}

fn require_transaction_id(id: TransactionId) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::MissingTransactionId(id));
    }

    Ok(())
}

fn check_category(store: &dyn BookingStore, builder: &TransactionBuilder) -> Result<(), Error> {
    if let Some(category_id) = builder.category_id {
        store.load_category(category_id)?;
    }

    Ok(())
}

fn referenced_accounts(legs: &[Legs]) -> Vec<AccountId> {
    legs.iter().flat_map(Legs::accounts).collect()
}
