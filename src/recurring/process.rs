//! Turning due occurrences of recurring transactions into transactions.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    recurring::{
        RecurringTransaction,
        core::{RECURRING_TRANSACTION_COLUMNS, map_recurring_transaction_row},
        next_occurrence,
    },
    transaction::{NewTransaction, create_transaction},
};

/// The outcome of processing recurring transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// The number of recurring transactions that had at least one due occurrence.
    pub recurring_processed: usize,
    /// The number of transactions created.
    pub transactions_created: usize,
}

impl ProcessSummary {
    fn add(&mut self, transactions_created: usize) {
        if transactions_created > 0 {
            self.recurring_processed += 1;
            self.transactions_created += transactions_created;
        }
    }
}

/// The most occurrences one recurring transaction materializes per run.
///
/// Any occurrences left over stay due and are created by the next run.
pub const MAX_OCCURRENCES_PER_RUN: usize = 1_000;

fn is_due(recurring: &RecurringTransaction, today: Date) -> bool {
    recurring.active
        && recurring.next_date <= today
        && recurring
            .end_date
            .is_none_or(|end_date| recurring.next_date <= end_date)
}

/// Create a transaction for every occurrence of `recurring` up to and including
/// `today`, advancing its next date after each one.
///
/// At most [MAX_OCCURRENCES_PER_RUN] transactions are created per call.
/// Each occurrence and the advancement of the next date commit together, so an
/// error part way through leaves the earlier occurrences in place. Must not be
/// called inside another SQL transaction.
///
/// Returns the number of transactions created.
pub fn materialize_due_occurrences(
    mut recurring: RecurringTransaction,
    today: Date,
    connection: &Connection,
) -> Result<usize, Error> {
    let mut created = 0;
    let notes = if recurring.notes.is_empty() {
        format!("Recurring: {}", recurring.id)
    } else {
        recurring.notes.clone()
    };

    while created < MAX_OCCURRENCES_PER_RUN && is_due(&recurring, today) {
        let sql_transaction = connection.unchecked_transaction()?;

        create_transaction(
            recurring.user_id,
            &NewTransaction {
                account_id: recurring.account_id,
                category_id: recurring.category_id,
                amount: recurring.amount,
                date: recurring.next_date,
                notes: notes.clone(),
            },
            &sql_transaction,
        )?;

        match next_occurrence(recurring.next_date, recurring.frequency, recurring.start_date) {
            Some(next_date) => {
                sql_transaction.execute(
                    "UPDATE recurring_transaction SET next_date = ?1 WHERE id = ?2",
                    (next_date, recurring.id),
                )?;
                recurring.next_date = next_date;
            }
            None => {
                tracing::warn!(
                    "Recurring transaction {} ran out of dates, deactivating it",
                    recurring.id
                );
                sql_transaction.execute(
                    "UPDATE recurring_transaction SET active = 0 WHERE id = ?1",
                    (recurring.id,),
                )?;
                recurring.active = false;
            }
        }

        sql_transaction.commit()?;
        created += 1;
    }

    if created == MAX_OCCURRENCES_PER_RUN && is_due(&recurring, today) {
        tracing::info!(
            "Recurring transaction {} still has occurrences due from {}, \
             they will be created on the next run",
            recurring.id,
            recurring.next_date
        );
    }

    if created > 0 {
        tracing::debug!(
            "Created {created} transactions for recurring transaction {}",
            recurring.id
        );
    }

    Ok(created)
}

fn get_due_recurring_transactions(
    user_id: Option<UserID>,
    today: Date,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_TRANSACTION_COLUMNS} FROM recurring_transaction
             WHERE active = 1
                AND next_date <= ?1
                AND (end_date IS NULL OR next_date <= end_date)
                AND (?2 IS NULL OR user_id = ?2)
             ORDER BY id"
        ))?
        .query_map((today, user_id), map_recurring_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Materialize the due occurrences of one user's recurring transactions.
pub fn process_due_recurring_transactions(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<ProcessSummary, Error> {
    let mut summary = ProcessSummary::default();

    for recurring in get_due_recurring_transactions(Some(user_id), today, connection)? {
        summary.add(materialize_due_occurrences(recurring, today, connection)?);
    }

    Ok(summary)
}

/// Materialize the due occurrences of every user's recurring transactions.
///
/// A recurring transaction that fails is logged and skipped so that one bad
/// schedule does not hold up everyone else's.
pub fn process_all_due_recurring_transactions(
    today: Date,
    connection: &Connection,
) -> Result<ProcessSummary, Error> {
    let mut summary = ProcessSummary::default();

    for recurring in get_due_recurring_transactions(None, today, connection)? {
        let id = recurring.id;
        match materialize_due_occurrences(recurring, today, connection) {
            Ok(created) => summary.add(created),
            Err(error) => {
                tracing::error!("Could not process recurring transaction {id}: {error}")
            }
        }
    }

    Ok(summary)
}
