//! Recomputes balances from transactions to detect drift in the stored balances.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error, ValidationError,
    account::list_accounts,
    booking::engine::{Direction, Legs, book_postings},
    database_id::AccountId,
    transaction::{TransactionQuery, list_transactions},
};

/// An account whose stored balances differ from the sum of its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceMismatch {
    /// The account with the wrong balance.
    pub account_id: AccountId,
    /// The balance derived from the transactions.
    pub expected: Decimal,
    /// The stored balance.
    pub balance: Decimal,
    /// The stored forecast balance.
    pub balance_forecast: Decimal,
}

/// Sum the bookings of every transaction per account.
///
/// # Errors
/// Returns an [Error::SqlError] if the transactions cannot be read, or
/// [ValidationError::AmountOutOfRange] if a running sum overflows.
pub fn expected_balances(connection: &Connection) -> Result<HashMap<AccountId, Decimal>, Error> {
    let mut balances = HashMap::new();

    for transaction in list_transactions(&TransactionQuery::default(), connection)? {
        for posting in book_postings(Legs::from(&transaction), Direction::Book) {
            let balance = balances.entry(posting.account_id).or_insert(Decimal::ZERO);
            *balance = balance
                .checked_add(posting.delta)
                .ok_or(ValidationError::AmountOutOfRange)?;
        }
    }

    Ok(balances)
}

/// Find every account whose `balance` or `balance_forecast` is not the sum of its transactions.
///
/// An empty list means the stored balances are consistent.
///
/// # Errors
/// Returns an [Error::SqlError] if the accounts or transactions cannot be read.
pub fn find_balance_mismatches(connection: &Connection) -> Result<Vec<BalanceMismatch>, Error> {
    let expected = expected_balances(connection)?;

    let mismatches: Vec<_> = list_accounts(connection)?
        .into_iter()
        .filter_map(|account| {
            let expected = expected
                .get(&account.id)
                .copied()
                .unwrap_or(Decimal::ZERO);

            (account.balance != expected || account.balance_forecast != expected).then_some(
                BalanceMismatch {
                    account_id: account.id,
                    expected,
                    balance: account.balance,
                    balance_forecast: account.balance_forecast,
                },
            )
        })
        .collect();

    for mismatch in &mismatches {
        tracing::warn!(
            "Account {} has balance {} (forecast {}) but its transactions sum to {}",
            mismatch.account_id,
            mismatch.balance,
            mismatch.balance_forecast,
            mismatch.expected
        );
    }

    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        account::{AccountDetails, create_account},
        booking::{
            audit::{BalanceMismatch, expected_balances, find_balance_mismatches},
            create_transaction,
        },
        db::initialize,
        gateway::SqliteGateway,
        transaction::Transaction,
    };

    fn get_test_connection() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_account(&AccountDetails::new("Checking"), &conn).unwrap();
        create_account(&AccountDetails::new("Savings"), &conn).unwrap();
        create_account(&AccountDetails::new("Unused"), &conn).unwrap();

        let mut gateway = SqliteGateway::new(&mut conn);
        create_transaction(
            Transaction::build(Decimal::from(200), date!(2025 - 02 - 01), "Salary")
                .destination(Some(1)),
            &mut gateway,
        )
        .unwrap();
        create_transaction(
            Transaction::build(Decimal::from(75), date!(2025 - 02 - 02), "Save")
                .source(Some(1))
                .destination(Some(2)),
            &mut gateway,
        )
        .unwrap();

        conn
    }

    #[test]
    fn expected_balances_sum_bookings() {
        let conn = get_test_connection();

        let balances = expected_balances(&conn).unwrap();

        assert_eq!(balances.get(&1), Some(&Decimal::from(125)));
        assert_eq!(balances.get(&2), Some(&Decimal::from(75)));
        assert_eq!(balances.get(&3), None);
    }

    #[test]
    fn consistent_books_have_no_mismatches() {
        let conn = get_test_connection();

        assert_eq!(find_balance_mismatches(&conn), Ok(vec![]));
    }

    #[test]
    fn tampered_balance_is_reported() {
        let conn = get_test_connection();
        conn.execute("UPDATE account SET balance = '999' WHERE id = 2", ())
            .unwrap();

        let mismatches = find_balance_mismatches(&conn).unwrap();

        assert_eq!(
            mismatches,
            vec![BalanceMismatch {
                account_id: 2,
                expected: Decimal::from(75),
                balance: Decimal::from(999),
                balance_forecast: Decimal::from(75),
            }]
        );
    }
}
