//! How transactions move account balances.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{Amount, Error, category::CategoryType, database_id::AccountId};

/// The signed amount by which a transaction changes its account's balance.
///
/// Expenses take money out of the account and income puts money in. An uncategorized
/// transaction is taken at face value, so a negative amount reduces the balance.
pub fn balance_effect(amount: Amount, category_type: Option<CategoryType>) -> Amount {
    match category_type {
        Some(CategoryType::Expense) => -amount,
        Some(CategoryType::Income) | None => amount,
    }
}

/// Atomically add `delta` to the balance of `account_id`.
///
/// Should be called within the same SQL transaction as the change that caused it.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist.
pub fn apply_balance_delta(
    account_id: AccountId,
    delta: Amount,
    connection: &Connection,
) -> Result<(), Error> {
    if delta == Amount::ZERO {
        return Ok(());
    }

    let rows_affected = connection.execute(
        "UPDATE account SET balance = balance + ?1, updated_at = ?2 WHERE id = ?3",
        (delta, OffsetDateTime::now_utc(), account_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    tracing::debug!("Adjusted balance of account {account_id} by {delta}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        Amount, Error,
        account::{NewAccount, create_account, get_account},
        category::CategoryType,
        test_utils::{get_test_connection, must_create_test_user},
    };

    use super::{apply_balance_delta, balance_effect};

    #[test]
    fn expenses_reduce_and_income_increases_balance() {
        let amount = Amount::from_cents(2500);

        assert_eq!(
            balance_effect(amount, Some(CategoryType::Expense)),
            Amount::from_cents(-2500)
        );
        assert_eq!(balance_effect(amount, Some(CategoryType::Income)), amount);
    }

    #[test]
    fn uncategorized_uses_sign_of_amount() {
        assert_eq!(
            balance_effect(Amount::from_cents(-700), None),
            Amount::from_cents(-700)
        );
        assert_eq!(
            balance_effect(Amount::from_cents(700), None),
            Amount::from_cents(700)
        );
    }

    #[test]
    fn negative_expense_is_a_refund() {
        assert_eq!(
            balance_effect(Amount::from_cents(-500), Some(CategoryType::Expense)),
            Amount::from_cents(500)
        );
    }

    #[test]
    fn apply_delta_increments_balance() {
        let connection = get_test_connection();
        let user = must_create_test_user(&connection, "alice");
        let account = create_account(
            user.id,
            &NewAccount {
                name: "Wallet".to_owned(),
                account_type: Default::default(),
                currency: None,
                balance: Amount::from_cents(10_000),
            },
            &connection,
        )
        .unwrap();

        apply_balance_delta(account.id, Amount::from_cents(-2_500), &connection).unwrap();
        apply_balance_delta(account.id, Amount::from_cents(500), &connection).unwrap();

        assert_eq!(
            get_account(account.id, user.id, &connection).unwrap().balance,
            Amount::from_cents(8_000)
        );
    }

    #[test]
    fn apply_delta_to_missing_account_fails() {
        let connection = get_test_connection();

        assert_eq!(
            apply_balance_delta(999, Amount::from_cents(1), &connection),
            Err(Error::NotFound)
        );
    }
}
