//! Read-only aggregations over a user's accounts and transactions.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{
    Amount, Error,
    account::get_total_account_balance,
    auth::UserID,
    category::CategoryType,
    date_range::DateRange,
};

/// The totals shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of the balances of all of the user's accounts.
    pub total_balance: Amount,
    /// The sum of income transactions in the month.
    pub monthly_income: Amount,
    /// The sum of expense transactions in the month.
    pub monthly_expenses: Amount,
}

/// The amount spent in one category over a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    /// The category's name.
    pub name: String,
    /// The category's colour, e.g. "#4caf50".
    pub color: String,
    /// The total spent in the category.
    pub amount: Amount,
}

fn sum_by_category_type(
    user_id: UserID,
    category_type: CategoryType,
    range: DateRange,
    connection: &Connection,
) -> Result<Amount, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(t.amount), 0)
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             WHERE t.user_id = ?1 AND c.type = ?2 AND t.date BETWEEN ?3 AND ?4",
            (user_id, category_type, range.start, range.end),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the total balance and the month's income and expenses.
///
/// Uncategorized transactions count towards neither income nor expenses.
pub fn get_summary(
    user_id: UserID,
    month: DateRange,
    connection: &Connection,
) -> Result<Summary, Error> {
    Ok(Summary {
        total_balance: get_total_account_balance(user_id, connection)?,
        monthly_income: sum_by_category_type(user_id, CategoryType::Income, month, connection)?,
        monthly_expenses: sum_by_category_type(
            user_id,
            CategoryType::Expense,
            month,
            connection,
        )?,
    })
}

fn map_category_spending_row(row: &Row) -> Result<CategorySpending, rusqlite::Error> {
    Ok(CategorySpending {
        name: row.get(0)?,
        color: row.get(1)?,
        amount: row.get(2)?,
    })
}

/// Get the month's expenses grouped by category, largest first.
pub fn get_spending_by_category(
    user_id: UserID,
    month: DateRange,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    connection
        .prepare(
            "SELECT c.name, c.color, SUM(t.amount) AS total
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             WHERE t.user_id = ?1 AND c.type = ?2 AND t.date BETWEEN ?3 AND ?4
             GROUP BY c.id
             ORDER BY total DESC, c.name",
        )?
        .query_map(
            (user_id, CategoryType::Expense, month.start, month.end),
            map_category_spending_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, Month, macros::date};

    use crate::{
        Amount,
        account::{Account, NewAccount, create_account},
        auth::UserID,
        category::{Category, CategoryType, NewCategory, create_category},
        date_range::month_bounds,
        test_utils::{get_test_connection, must_create_test_user},
        transaction::{NewTransaction, create_transaction},
    };

    use super::{CategorySpending, Summary, get_spending_by_category, get_summary};

    struct Fixture {
        connection: Connection,
        user_id: UserID,
        account: Account,
    }

    impl Fixture {
        fn new() -> Self {
            let connection = get_test_connection();
            let user_id = must_create_test_user(&connection, "alice").id;
            let account = create_account(
                user_id,
                &NewAccount {
                    name: "Everyday".to_owned(),
                    account_type: Default::default(),
                    currency: None,
                    balance: Amount::from_cents(100_000),
                },
                &connection,
            )
            .unwrap();

            Self {
                connection,
                user_id,
                account,
            }
        }

        fn category(&self, name: &str, category_type: CategoryType, color: &str) -> Category {
            create_category(
                Some(self.user_id),
                &NewCategory {
                    name: name.to_owned(),
                    category_type,
                    color: Some(color.to_owned()),
                },
                &self.connection,
            )
            .unwrap()
        }

        fn transaction(&self, category: Option<&Category>, cents: i64, date: Date) {
            create_transaction(
                self.user_id,
                &NewTransaction {
                    account_id: self.account.id,
                    category_id: category.map(|category| category.id),
                    amount: Amount::from_cents(cents),
                    date,
                    notes: String::new(),
                },
                &self.connection,
            )
            .unwrap();
        }
    }

    #[test]
    fn summary_sums_the_month_by_category_type() {
        let fixture = Fixture::new();
        let salary = fixture.category("Salary", CategoryType::Income, "#00ff00");
        let food = fixture.category("Food", CategoryType::Expense, "#ff0000");
        fixture.transaction(Some(&salary), 300_000, date!(2025 - 02 - 01));
        fixture.transaction(Some(&food), 2_500, date!(2025 - 02 - 28));
        fixture.transaction(Some(&food), 9_900, date!(2025 - 03 - 01));
        fixture.transaction(None, 1_000, date!(2025 - 02 - 10));

        let summary = get_summary(
            fixture.user_id,
            month_bounds(2025, Month::February).unwrap(),
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(
            summary,
            Summary {
                total_balance: Amount::from_cents(100_000 + 300_000 - 2_500 - 9_900 + 1_000),
                monthly_income: Amount::from_cents(300_000),
                monthly_expenses: Amount::from_cents(2_500),
            }
        );
    }

    #[test]
    fn summary_of_empty_month_is_zero() {
        let fixture = Fixture::new();

        let summary = get_summary(
            fixture.user_id,
            month_bounds(2025, Month::February).unwrap(),
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(summary.monthly_income, Amount::ZERO);
        assert_eq!(summary.monthly_expenses, Amount::ZERO);
        assert_eq!(summary.total_balance, Amount::from_cents(100_000));
    }

    #[test]
    fn spending_is_grouped_and_largest_first() {
        let fixture = Fixture::new();
        let food = fixture.category("Food", CategoryType::Expense, "#ff0000");
        let rent = fixture.category("Rent", CategoryType::Expense, "#0000ff");
        let salary = fixture.category("Salary", CategoryType::Income, "#00ff00");
        fixture.transaction(Some(&food), 2_000, date!(2025 - 02 - 01));
        fixture.transaction(Some(&food), 3_000, date!(2025 - 02 - 15));
        fixture.transaction(Some(&rent), 40_000, date!(2025 - 02 - 01));
        fixture.transaction(Some(&rent), 40_000, date!(2025 - 01 - 01));
        fixture.transaction(Some(&salary), 300_000, date!(2025 - 02 - 01));

        let spending = get_spending_by_category(
            fixture.user_id,
            month_bounds(2025, Month::February).unwrap(),
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(
            spending,
            vec![
                CategorySpending {
                    name: "Rent".to_owned(),
                    color: "#0000ff".to_owned(),
                    amount: Amount::from_cents(40_000),
                },
                CategorySpending {
                    name: "Food".to_owned(),
                    color: "#ff0000".to_owned(),
                    amount: Amount::from_cents(5_000),
                },
            ]
        );
    }

    #[test]
    fn other_users_transactions_are_excluded() {
        let fixture = Fixture::new();
        let food = fixture.category("Food", CategoryType::Expense, "#ff0000");
        fixture.transaction(Some(&food), 2_000, date!(2025 - 02 - 01));
        let bob = must_create_test_user(&fixture.connection, "bob").id;

        let spending = get_spending_by_category(
            bob,
            month_bounds(2025, Month::February).unwrap(),
            &fixture.connection,
        )
        .unwrap();

        assert!(spending.is_empty());
    }
}
