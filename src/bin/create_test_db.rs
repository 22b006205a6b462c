use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use bookkeeper_rs::{
    Transaction,
    account::{AccountDetails, BankType, create_account},
    booking::{amend_transaction, create_transaction, delete_transaction, find_balance_mismatches},
    category::{CategoryDetails, create_category},
    gateway::SqliteGateway,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of bookkeeper_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test accounts...");
    let checking = create_account(
        &AccountDetails::new("Checking").iban("DE89370400440532013000"),
        &conn,
    )?;
    let savings = create_account(&AccountDetails::new("Savings"), &conn)?;
    let paypal = create_account(
        &AccountDetails::new("PayPal").bank_type(BankType::Online),
        &conn,
    )?;

    println!("Creating test categories...");
    let income = create_category(&CategoryDetails::new("Income").colour("#2e7d32"), &conn)?;
    let housing = create_category(&CategoryDetails::new("Housing").colour("#1565c0"), &conn)?;
    let shopping = create_category(&CategoryDetails::new("Shopping"), &conn)?;

    println!("Creating test transactions...");
    let today = OffsetDateTime::now_utc().date();
    let mut gateway = SqliteGateway::new(&mut conn);

    create_transaction(
        Transaction::build(Decimal::new(320_000, 2), today - Duration::days(30), "Salary")
            .destination(Some(checking.id))
            .category(Some(income.id)),
        &mut gateway,
    )?;
    let rent = create_transaction(
        Transaction::build(Decimal::new(115_000, 2), today - Duration::days(28), "Rent")
            .source(Some(checking.id))
            .category(Some(housing.id)),
        &mut gateway,
    )?;
    let saving = create_transaction(
        Transaction::build(Decimal::new(50_000, 2), today - Duration::days(20), "Save")
            .source(Some(checking.id))
            .destination(Some(savings.id)),
        &mut gateway,
    )?;
    create_transaction(
        Transaction::build(Decimal::new(10_000, 2), today - Duration::days(10), "Top up")
            .source(Some(checking.id))
            .destination(Some(paypal.id)),
        &mut gateway,
    )?;
    let order = create_transaction(
        Transaction::build(Decimal::new(4_299, 2), today - Duration::days(3), "Online order")
            .source(Some(paypal.id))
            .category(Some(shopping.id)),
        &mut gateway,
    )?;

    amend_transaction(
        rent.id,
        rent.to_builder()
            .amount(Decimal::new(120_000, 2))
            .description("Rent went up"),
        &mut gateway,
    )?;
    amend_transaction(
        saving.id,
        saving.to_builder().amount(Decimal::new(60_000, 2)),
        &mut gateway,
    )?;
    delete_transaction(order.id, &mut gateway)?;

    let mismatches = find_balance_mismatches(&conn)?;
    if !mismatches.is_empty() {
        eprintln!("Balances do not match transactions: {mismatches:#?}");
        exit(1);
    }

    println!("Success!");

    Ok(())
}
