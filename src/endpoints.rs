//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to get, update and delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to get the sum of every account balance.
pub const ACCOUNTS_TOTAL: &str = "/api/accounts/total";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to get, update and delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, amend and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Assumes the path has exactly one parameter, e.g. `/api/accounts/{account_id}`.
/// Paths without a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => format!(
            "{}{id}{}",
            &endpoint_path[..start],
            &endpoint_path[end + 1..]
        ),
        _ => endpoint_path.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ACCOUNT, ACCOUNTS, CATEGORY, TRANSACTION, format_endpoint};

    #[test]
    fn replaces_parameter() {
        assert_eq!(format_endpoint(ACCOUNT, 42), "/api/accounts/42");
        assert_eq!(format_endpoint(CATEGORY, 3), "/api/categories/3");
        assert_eq!(format_endpoint(TRANSACTION, 7), "/api/transactions/7");
    }

    #[test]
    fn leaves_paths_without_parameters_alone() {
        assert_eq!(format_endpoint(ACCOUNTS, 1), ACCOUNTS);
    }
}
