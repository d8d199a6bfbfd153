use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use family_ledger::{
    Amount, Category, DayOfMonth, FamilyCode, IncomeCategory, Memo, NewRecurringRule,
    PaymentMethod, SpendingCategory, Transaction, UserName, create_rule, create_transaction,
    initialize_db, join_family,
};

/// A utility for creating a test database for the family ledger server.
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
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test family...");

    let code = FamilyCode::new("demo123")?;
    let parent = UserName::new("지훈")?;
    let child = UserName::new("민지")?;
    join_family(&code, &parent, &conn)?;
    join_family(&code, &child, &conn)?;

    println!("Creating test transactions...");

    let today = OffsetDateTime::now_utc().date();
    let last_week = today - Duration::weeks(1);

    let transactions = [
        Transaction::build(
            Amount::new(3_200_000)?,
            Category::Income(IncomeCategory::SalaryRegular),
            code.clone(),
            parent.clone(),
            last_week,
        )
        .payment_method(PaymentMethod::Transfer),
        Transaction::build(
            Amount::new(54_000)?,
            Category::Spending(SpendingCategory::FoodGroceries),
            code.clone(),
            parent.clone(),
            last_week,
        )
        .memo(Some(Memo::new("주말 장보기")?)),
        Transaction::build(
            Amount::new(4_500)?,
            Category::Spending(SpendingCategory::CafeCoffee),
            code.clone(),
            child.clone(),
            today,
        )
        .payment_method(PaymentMethod::Cash),
    ];

    for transaction in transactions {
        create_transaction(transaction, &conn)?;
    }

    println!("Creating test recurring rules...");

    create_rule(
        NewRecurringRule {
            amount: Amount::new(650_000)?,
            category: SpendingCategory::HousingRent,
            memo: Some(Memo::new("월세")?),
            user_name: parent.clone(),
            family_code: code.clone(),
            day_of_month: DayOfMonth::new(25)?,
            payment_method: PaymentMethod::Transfer,
        },
        &conn,
    )?;
    create_rule(
        NewRecurringRule {
            amount: Amount::new(33_000)?,
            category: SpendingCategory::HousingInternet,
            memo: None,
            user_name: parent,
            family_code: code.clone(),
            day_of_month: DayOfMonth::new(31)?,
            payment_method: PaymentMethod::Card,
        },
        &conn,
    )?;
    create_rule(
        NewRecurringRule {
            amount: Amount::new(19_900)?,
            category: SpendingCategory::EducationOnline,
            memo: Some(Memo::new("인강 구독")?),
            user_name: child,
            family_code: code,
            day_of_month: DayOfMonth::new(1)?,
            payment_method: PaymentMethod::Card,
        },
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
