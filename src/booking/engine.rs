//! The booking engine: turns transactions into signed balance deltas and applies them.
//!
//! Sign convention, for a transaction moving `amount` from source to destination:
//!
//! | side        | book      | reverse   |
//! |-------------|-----------|-----------|
//! | source      | `-amount` | `+amount` |
//! | destination | `+amount` | `-amount` |
//!
//! A missing side is the outside world and never receives a delta.

use rust_decimal::Decimal;

use crate::{
    Error, ValidationError,
    account::Account,
    database_id::AccountId,
    gateway::BookingStore,
    transaction::{Transaction, TransactionBuilder},
};

/// Which end of a transaction an account sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The account the money leaves.
    Source,
    /// The account the money enters.
    Destination,
}

/// Whether a booking is being made or undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply the transaction.
    Book,
    /// Undo a previous booking of the transaction.
    Reverse,
}

/// The delta an account on `side` receives when `amount` is booked in `direction`.
pub fn signed_amount(side: Side, direction: Direction, amount: Decimal) -> Decimal {
    match (side, direction) {
        (Side::Source, Direction::Book) | (Side::Destination, Direction::Reverse) => -amount,
        (Side::Destination, Direction::Book) | (Side::Source, Direction::Reverse) => amount,
    }
}

/// A signed change to one account's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// The account to change.
    pub account_id: AccountId,
    /// The amount added to both `balance` and `balance_forecast`.
    pub delta: Decimal,
}

/// The parts of a transaction that affect balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Legs {
    /// The amount moved.
    pub amount: Decimal,
    /// The account the money leaves.
    pub source: Option<AccountId>,
    /// The account the money enters.
    pub destination: Option<AccountId>,
}

impl Legs {
    /// The accounts these legs reference, source first.
    pub fn accounts(&self) -> impl Iterator<Item = AccountId> {
        self.source.into_iter().chain(self.destination)
    }
}

impl From<&Transaction> for Legs {
    fn from(transaction: &Transaction) -> Self {
        Self {
            amount: transaction.amount,
            source: transaction.source,
            destination: transaction.destination,
        }
    }
}

impl From<&TransactionBuilder> for Legs {
    fn from(builder: &TransactionBuilder) -> Self {
        Self {
            amount: builder.amount,
            source: builder.source,
            destination: builder.destination,
        }
    }
}

fn push_posting(
    postings: &mut Vec<Posting>,
    account_id: Option<AccountId>,
    side: Side,
    direction: Direction,
    amount: Decimal,
) {
    let Some(account_id) = account_id else {
        return;
    };

    let delta = signed_amount(side, direction, amount);
    if !delta.is_zero() {
        postings.push(Posting { account_id, delta });
    }
}

/// The postings that book (or reverse) `legs` in full.
pub fn book_postings(legs: Legs, direction: Direction) -> Vec<Posting> {
    let mut postings = Vec::with_capacity(2);
    push_posting(&mut postings, legs.source, Side::Source, direction, legs.amount);
    push_posting(
        &mut postings,
        legs.destination,
        Side::Destination,
        direction,
        legs.amount,
    );

    postings
}

/// The postings that move the booking of `old` to the booking of `new`.
///
/// A side whose account changed is reversed in full on the old account and
/// booked in full on the new one. Only sides whose account did not change
/// receive the difference in amount, otherwise the new amount would be booked
/// twice.
///
/// # Errors
/// Returns [ValidationError::AmountOutOfRange] if the difference between the
/// amounts cannot be represented.
pub fn amendment_postings(old: Legs, new: Legs) -> Result<Vec<Posting>, ValidationError> {
    let mut postings = Vec::with_capacity(4);

    let source_changed = old.source != new.source;
    if source_changed {
        push_posting(&mut postings, old.source, Side::Source, Direction::Reverse, old.amount);
        push_posting(&mut postings, new.source, Side::Source, Direction::Book, new.amount);
    }

    let destination_changed = old.destination != new.destination;
    if destination_changed {
        push_posting(
            &mut postings,
            old.destination,
            Side::Destination,
            Direction::Reverse,
            old.amount,
        );
        push_posting(
            &mut postings,
            new.destination,
            Side::Destination,
            Direction::Book,
            new.amount,
        );
    }

    let difference = new
        .amount
        .checked_sub(old.amount)
        .ok_or(ValidationError::AmountOutOfRange)?;
    if !difference.is_zero() {
        if !source_changed {
            push_posting(&mut postings, new.source, Side::Source, Direction::Book, difference);
        }
        if !destination_changed {
            push_posting(
                &mut postings,
                new.destination,
                Side::Destination,
                Direction::Book,
                difference,
            );
        }
    }

    Ok(postings)
}

/// Add `delta` to the balances of the account `account_id`.
///
/// `balance` and `balance_forecast` always move together.
///
/// # Errors
/// Returns [Error::AccountNotFound] if the account does not exist, or
/// [ValidationError::AmountOutOfRange] if a balance would overflow. Nothing is
/// written in either case. Any error from the store is passed through.
pub fn apply_delta(
    store: &mut dyn BookingStore,
    account_id: AccountId,
    delta: Decimal,
) -> Result<Account, Error> {
    let mut account = store.load_account(account_id)?;
    account.balance = account
        .balance
        .checked_add(delta)
        .ok_or(ValidationError::AmountOutOfRange)?;
    account.balance_forecast = account
        .balance_forecast
        .checked_add(delta)
        .ok_or(ValidationError::AmountOutOfRange)?;
    store.save_account_balances(&account)?;

    tracing::debug!(
        "Applied {delta} to account {account_id}, balance is now {}",
        account.balance
    );

    Ok(account)
}

/// Apply every posting in order.
///
/// # Errors
/// Stops at the first failing posting. The caller's atomic unit is
/// responsible for undoing the postings applied before it.
pub fn apply_postings(store: &mut dyn BookingStore, postings: &[Posting]) -> Result<(), Error> {
    for posting in postings {
        apply_delta(store, posting.account_id, posting.delta)?;
    }

    Ok(())
}
