//! Budgets cap the spending in a category over a range of dates.
//!
//! How much has been spent is never stored: it is summed from the owner's
//! transactions in the budget's category whenever a budget is read.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Amount, Error,
    auth::UserID,
    category::get_category,
    database_id::{BudgetId, CategoryId},
    date_range::{DateRange, iso_date},
};

/// A spending limit for a category between two dates, inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: BudgetId,
    #[serde(skip)]
    pub user_id: UserID,
    #[serde(rename = "category")]
    pub category_id: CategoryId,
    /// The most that should be spent.
    pub amount: Amount,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A budget with its category and how much of it has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetDetails {
    #[serde(flatten)]
    pub budget: Budget,
    pub category_name: String,
    pub category_color: String,
    /// The sum of the transactions in the category within the budget's dates.
    pub spent: Amount,
    /// `amount - spent`, negative once the budget is exceeded.
    pub remaining: Amount,
    /// `spent` as a percentage of `amount`, rounded to one decimal place.
    pub percentage: f64,
}

impl BudgetDetails {
    fn new(budget: Budget, category_name: String, category_color: String, spent: Amount) -> Self {
        Self {
            remaining: budget.amount - spent,
            percentage: percentage_spent(spent, budget.amount),
            budget,
            category_name,
            category_color,
            spent,
        }
    }
}

/// How much of `amount` has been spent as a percentage.
///
/// A zero budget is 0% used until anything is spent, and 100% after.
pub fn percentage_spent(spent: Amount, amount: Amount) -> f64 {
    if amount == Amount::ZERO {
        return if spent > Amount::ZERO { 100.0 } else { 0.0 };
    }

    let percentage = spent.cents() as f64 / amount.cents() as f64 * 100.0;

    (percentage * 10.0).round() / 10.0
}

/// The data needed to create a budget, or replace all of its fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBudget {
    #[serde(rename = "category")]
    pub category_id: CategoryId,
    pub amount: Amount,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            amount INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            CHECK (end_date >= start_date)
        )",
        (),
    )?;

    Ok(())
}

const BUDGET_DETAILS_QUERY: &str = "SELECT b.id, b.user_id, b.category_id, b.amount, \
    b.start_date, b.end_date, b.created_at, c.name, c.color, \
    COALESCE((SELECT SUM(t.amount) FROM \"transaction\" t \
        WHERE t.user_id = b.user_id AND t.category_id = b.category_id \
        AND t.date BETWEEN b.start_date AND b.end_date), 0) \
    FROM budget b INNER JOIN category c ON c.id = b.category_id";

fn map_budget_details_row(row: &Row) -> Result<BudgetDetails, rusqlite::Error> {
    let budget = Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        amount: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        created_at: row.get(6)?,
    };

    Ok(BudgetDetails::new(budget, row.get(7)?, row.get(8)?, row.get(9)?))
}

fn validate_budget(
    budget: &NewBudget,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    DateRange::new(budget.start_date, budget.end_date)?;

    if budget.amount < Amount::ZERO {
        return Err(Error::InvalidAmount(budget.amount.to_string()));
    }

    get_category(budget.category_id, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory,
        error => error,
    })?;

    Ok(())
}

/// Create a budget for one of the categories the user can use.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidDateRange] if the end date is before the start date,
/// - [Error::InvalidAmount] if the amount is negative,
/// - [Error::InvalidCategory] if the category is not visible to the user.
pub fn create_budget(
    user_id: UserID,
    budget: &NewBudget,
    connection: &Connection,
) -> Result<BudgetDetails, Error> {
    validate_budget(budget, user_id, connection)?;

    let id: BudgetId = connection.query_row(
        "INSERT INTO budget (user_id, category_id, amount, start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
        (
            user_id,
            budget.category_id,
            budget.amount,
            budget.start_date,
            budget.end_date,
            OffsetDateTime::now_utc(),
        ),
        |row| row.get(0),
    )?;

    get_budget(id, user_id, connection)
}

/// Get one of the user's budgets with the amount spent so far.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not belong to the user.
pub fn get_budget(
    id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<BudgetDetails, Error> {
    connection
        .query_row(
            &format!("{BUDGET_DETAILS_QUERY} WHERE b.id = ?1 AND b.user_id = ?2"),
            (id, user_id),
            map_budget_details_row,
        )
        .map_err(|error| error.into())
}

/// Get the user's budgets, latest start date first.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<BudgetDetails>, Error> {
    connection
        .prepare(&format!(
            "{BUDGET_DETAILS_QUERY} WHERE b.user_id = ?1 ORDER BY b.start_date DESC, b.id DESC"
        ))?
        .query_map((user_id,), map_budget_details_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Get the user's budgets whose dates overlap `range`, latest start date first.
pub fn get_budgets_overlapping(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<BudgetDetails>, Error> {
    connection
        .prepare(&format!(
            "{BUDGET_DETAILS_QUERY}
             WHERE b.user_id = ?1 AND b.start_date <= ?3 AND b.end_date >= ?2
             ORDER BY b.start_date DESC, b.id DESC"
        ))?
        .query_map((user_id, range.start, range.end), map_budget_details_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Replace the fields of one of the user's budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not belong to the user, or the
/// same validation errors as [create_budget].
pub fn update_budget(
    id: BudgetId,
    user_id: UserID,
    budget: &NewBudget,
    connection: &Connection,
) -> Result<BudgetDetails, Error> {
    validate_budget(budget, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE budget SET category_id = ?1, amount = ?2, start_date = ?3, end_date = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            budget.category_id,
            budget.amount,
            budget.start_date,
            budget.end_date,
            id,
            user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_budget(id, user_id, connection)
}

/// Delete one of the user's budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not belong to the user.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Amount, Error,
        account::{NewAccount, create_account},
        auth::UserID,
        category::{Category, CategoryType, NewCategory, create_category},
        date_range::DateRange,
        test_utils::{get_test_connection, must_create_test_user},
        transaction::{NewTransaction, create_transaction},
    };

    use super::{
        NewBudget, create_budget, delete_budget, get_budget, get_budgets,
        get_budgets_overlapping, percentage_spent, update_budget,
    };

    fn setup() -> (Connection, UserID, Category) {
        let connection = get_test_connection();
        let user_id = must_create_test_user(&connection, "alice").id;
        let category = create_category(
            Some(user_id),
            &NewCategory {
                name: "Food".to_owned(),
                category_type: CategoryType::Expense,
                color: Some("#ff0000".to_owned()),
            },
            &connection,
        )
        .unwrap();

        (connection, user_id, category)
    }

    fn january_budget(category: &Category, cents: i64) -> NewBudget {
        NewBudget {
            category_id: category.id,
            amount: Amount::from_cents(cents),
            start_date: date!(2025 - 01 - 01),
            end_date: date!(2025 - 01 - 31),
        }
    }

    #[track_caller]
    fn must_spend(
        connection: &Connection,
        user_id: UserID,
        category: Option<&Category>,
        cents: i64,
        date: time::Date,
    ) {
        let account = match connection.query_row(
            "SELECT id FROM account WHERE user_id = ?1",
            (user_id,),
            |row| row.get(0),
        ) {
            Ok(id) => id,
            Err(_) => {
                create_account(
                    user_id,
                    &NewAccount {
                        name: "Wallet".to_owned(),
                        account_type: Default::default(),
                        currency: None,
                        balance: Amount::ZERO,
                    },
                    connection,
                )
                .unwrap()
                .id
            }
        };

        create_transaction(
            user_id,
            &NewTransaction {
                account_id: account,
                category_id: category.map(|category| category.id),
                amount: Amount::from_cents(cents),
                date,
                notes: String::new(),
            },
            connection,
        )
        .unwrap();
    }

    #[test]
    fn spent_sums_category_transactions_within_inclusive_range() {
        let (connection, user_id, category) = setup();
        let budget = create_budget(user_id, &january_budget(&category, 50_000), &connection)
            .unwrap();
        must_spend(&connection, user_id, Some(&category), 1_000, date!(2025 - 01 - 01));
        must_spend(&connection, user_id, Some(&category), 2_000, date!(2025 - 01 - 31));
        must_spend(&connection, user_id, Some(&category), 4_000, date!(2025 - 02 - 01));
        must_spend(&connection, user_id, None, 8_000, date!(2025 - 01 - 15));

        let budget = get_budget(budget.budget.id, user_id, &connection).unwrap();

        assert_eq!(budget.spent, Amount::from_cents(3_000));
        assert_eq!(budget.remaining, Amount::from_cents(47_000));
        assert_eq!(budget.percentage, 6.0);
        assert_eq!(budget.category_name, "Food");
        assert_eq!(budget.category_color, "#ff0000");
    }

    #[test]
    fn rejects_end_before_start() {
        let (connection, user_id, category) = setup();
        let new_budget = NewBudget {
            start_date: date!(2025 - 02 - 01),
            end_date: date!(2025 - 01 - 01),
            ..january_budget(&category, 100)
        };

        assert_eq!(
            create_budget(user_id, &new_budget, &connection),
            Err(Error::InvalidDateRange {
                start: date!(2025 - 02 - 01),
                end: date!(2025 - 01 - 01)
            })
        );
    }

    #[test]
    fn rejects_another_users_category() {
        let (connection, _, category) = setup();
        let bob = must_create_test_user(&connection, "bob").id;

        assert_eq!(
            create_budget(bob, &january_budget(&category, 100), &connection),
            Err(Error::InvalidCategory)
        );
    }

    #[test]
    fn lists_latest_start_first_and_filters_by_overlap() {
        let (connection, user_id, category) = setup();
        let january = create_budget(user_id, &january_budget(&category, 100), &connection)
            .unwrap();
        let march = create_budget(
            user_id,
            &NewBudget {
                start_date: date!(2025 - 03 - 01),
                end_date: date!(2025 - 03 - 31),
                ..january_budget(&category, 100)
            },
            &connection,
        )
        .unwrap();

        let all = get_budgets(user_id, &connection).unwrap();
        let february_onwards = get_budgets_overlapping(
            user_id,
            DateRange::new(date!(2025 - 01 - 31), date!(2025 - 02 - 28)).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(all, vec![march, january.clone()]);
        assert_eq!(february_onwards, vec![january]);
    }

    #[test]
    fn update_and_delete_only_own_budget() {
        let (connection, user_id, category) = setup();
        let bob = must_create_test_user(&connection, "bob").id;
        let budget = create_budget(user_id, &january_budget(&category, 100), &connection)
            .unwrap();

        assert_eq!(
            update_budget(budget.budget.id, bob, &january_budget(&category, 1), &connection),
            Err(Error::InvalidCategory)
        );
        assert_eq!(
            delete_budget(budget.budget.id, bob, &connection),
            Err(Error::NotFound)
        );

        let updated =
            update_budget(budget.budget.id, user_id, &january_budget(&category, 250), &connection)
                .unwrap();
        assert_eq!(updated.budget.amount, Amount::from_cents(250));

        delete_budget(budget.budget.id, user_id, &connection).unwrap();
        assert_eq!(
            get_budget(budget.budget.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn percentage_handles_zero_and_overspent_budgets() {
        assert_eq!(percentage_spent(Amount::ZERO, Amount::ZERO), 0.0);
        assert_eq!(percentage_spent(Amount::from_cents(1), Amount::ZERO), 100.0);
        assert_eq!(
            percentage_spent(Amount::from_cents(15_000), Amount::from_cents(10_000)),
            150.0
        );
        assert_eq!(
            percentage_spent(Amount::from_cents(1), Amount::from_cents(3)),
            33.3
        );
    }
}
