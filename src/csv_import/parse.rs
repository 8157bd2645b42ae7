//! Reading rows of transactions out of a CSV file.

use serde::Serialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Amount, Error, category::CategoryType};

/// The layouts tried when reading a date, in order. The first one that fits wins,
/// so "03/04/2025" is the 3rd of April.
const DATE_FORMATS: [&[BorrowedFormatItem]; 7] = [
    format_description!("[year]-[month padding:none]-[day padding:none]"),
    format_description!("[year]/[month padding:none]/[day padding:none]"),
    format_description!("[day padding:none]/[month padding:none]/[year]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
    format_description!("[day padding:none]-[month padding:none]-[year]"),
    format_description!("[day padding:none].[month padding:none].[year]"),
    format_description!("[day padding:none] [month repr:short case_sensitive:false] [year]"),
];

/// Parse a date written in one of several common layouts, e.g. "2025-01-31",
/// "31/01/2025" or "31 Jan 2025".
///
/// # Errors
/// Returns [Error::InvalidDate] if none of the layouts fit.
pub fn parse_flexible_date(text: &str) -> Result<Date, Error> {
    let trimmed = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| Date::parse(trimmed, format).ok())
        .ok_or_else(|| Error::InvalidDate(text.to_owned()))
}

/// A row of the CSV file that was read successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// The line number of the row in the file, the header is line 1.
    pub row: u64,
    /// `None` if the date cell was empty.
    pub date: Option<Date>,
    pub amount: Amount,
    pub account: String,
    pub category: Option<String>,
    /// Used when the category has to be created.
    pub category_type: CategoryType,
    pub notes: String,
}

/// A row that could not be imported and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// The line of the file the row is on, counting the header as line 1.
    pub row: u64,
    /// Why the row was rejected.
    pub error: String,
}

/// The rows read from a CSV file, split into good and bad.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedCsv {
    pub rows: Vec<ImportRow>,
    pub errors: Vec<RowError>,
}

struct Columns {
    date: Option<usize>,
    amount: usize,
    account: usize,
    category: Option<usize>,
    category_type: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, Error> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::InvalidCSV(format!("missing the \"{name}\" column")))
        };

        Ok(Self {
            date: find("date"),
            amount: require("amount")?,
            account: require("account")?,
            category: find("category"),
            category_type: find("category_type"),
            notes: find("notes"),
        })
    }
}

/// Read transactions from CSV text with a header row.
///
/// The header names the columns, in any order and any case: `date`, `amount`,
/// `account`, `category`, `category_type` and `notes`. Only `amount` and
/// `account` are required. Rows that cannot be read are returned as
/// [RowError]s rather than failing the whole file.
///
/// # Errors
/// Returns [Error::InvalidCSV] if the header is missing or lacks a required column.
pub fn parse_import_csv(text: &str) -> Result<ParsedCsv, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;
    let columns = Columns::from_headers(headers)?;

    let mut parsed = ParsedCsv::default();

    for (index, result) in reader.records().enumerate() {
        let fallback_row = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(error) => {
                let row = error
                    .position()
                    .map_or(fallback_row, |position| position.line());
                parsed.errors.push(RowError {
                    row,
                    error: error.to_string(),
                });
                continue;
            }
        };

        let row = record
            .position()
            .map_or(fallback_row, |position| position.line());

        match parse_record(&record, &columns, row) {
            Ok(import_row) => parsed.rows.push(import_row),
            Err(error) => parsed.errors.push(RowError {
                row,
                error: error.to_string(),
            }),
        }
    }

    Ok(parsed)
}

fn parse_record(record: &csv::StringRecord, columns: &Columns, row: u64) -> Result<ImportRow, Error> {
    let cell = |index: Option<usize>| {
        index
            .and_then(|index| record.get(index))
            .filter(|text| !text.is_empty())
    };

    let account = cell(Some(columns.account)).ok_or(Error::EmptyField("account"))?;
    let amount = cell(Some(columns.amount)).ok_or(Error::EmptyField("amount"))?;
    let amount = Amount::parse_lenient(amount)?;
    let date = cell(columns.date).map(parse_flexible_date).transpose()?;
    let category_type = cell(columns.category_type)
        .map(str::parse::<CategoryType>)
        .transpose()?
        .unwrap_or(CategoryType::Expense);

    Ok(ImportRow {
        row,
        date,
        amount,
        account: account.to_owned(),
        category: cell(columns.category).map(str::to_owned),
        category_type,
        notes: cell(columns.notes).unwrap_or_default().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Amount, Error, category::CategoryType};

    use super::{ImportRow, RowError, parse_flexible_date, parse_import_csv};

    #[test]
    fn reads_each_date_layout() {
        for text in [
            "2025-01-31",
            "2025/01/31",
            "31/01/2025",
            "01/31/2025",
            "31-01-2025",
            "31.01.2025",
            "31 Jan 2025",
            "31 JAN 2025",
        ] {
            assert_eq!(parse_flexible_date(text), Ok(date!(2025 - 01 - 31)), "{text}");
        }
    }

    #[test]
    fn ambiguous_dates_are_day_first() {
        assert_eq!(parse_flexible_date("03/04/2025"), Ok(date!(2025 - 04 - 03)));
    }

    #[test]
    fn unpadded_dates_are_accepted() {
        assert_eq!(parse_flexible_date("2025-1-5"), Ok(date!(2025 - 01 - 05)));
        assert_eq!(parse_flexible_date("5/1/2025"), Ok(date!(2025 - 01 - 05)));
    }

    #[test]
    fn nonsense_date_is_invalid() {
        assert_eq!(
            parse_flexible_date("yesterday"),
            Err(Error::InvalidDate("yesterday".to_owned()))
        );
    }

    #[test]
    fn reads_rows_with_headers_in_any_order_and_case() {
        let text = "Notes,ACCOUNT,Amount,Date,Category,Category_Type\n\
            weekly shop,Wallet,\"$1,050.00\",2025-09-01,Groceries,expense\n\
            ,Wallet,(5.00),,,\n";

        let parsed = parse_import_csv(text).unwrap();

        assert_eq!(parsed.errors, vec![]);
        assert_eq!(
            parsed.rows,
            vec![
                ImportRow {
                    row: 2,
                    date: Some(date!(2025 - 09 - 01)),
                    amount: Amount::from_cents(105_000),
                    account: "Wallet".to_owned(),
                    category: Some("Groceries".to_owned()),
                    category_type: CategoryType::Expense,
                    notes: "weekly shop".to_owned(),
                },
                ImportRow {
                    row: 3,
                    date: None,
                    amount: Amount::from_cents(-500),
                    account: "Wallet".to_owned(),
                    category: None,
                    category_type: CategoryType::Expense,
                    notes: String::new(),
                },
            ]
        );
    }

    #[test]
    fn bad_rows_are_reported_and_skipped() {
        let text = "date,amount,account,category_type\n\
            2025-09-01,abc,Wallet,\n\
            not a date,1.00,Wallet,\n\
            2025-09-01,1.00,,\n\
            2025-09-01,1.00,Wallet,transfer\n\
            2025-09-01,1.00,Wallet,income\n";

        let parsed = parse_import_csv(text).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].row, 6);
        assert_eq!(parsed.rows[0].category_type, CategoryType::Income);
        let error_rows: Vec<u64> = parsed.errors.iter().map(|error| error.row).collect();
        assert_eq!(error_rows, vec![2, 3, 4, 5]);
        assert_eq!(
            parsed.errors[2],
            RowError {
                row: 4,
                error: "account cannot be empty".to_owned()
            }
        );
    }

    #[test]
    fn missing_required_column_fails_the_file() {
        let result = parse_import_csv("date,amount,notes\n2025-09-01,1.00,hi\n");

        assert_eq!(
            result,
            Err(Error::InvalidCSV("missing the \"account\" column".to_owned()))
        );
    }
}
