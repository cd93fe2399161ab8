//! Generic bank CSV export parser.
//!
//! Banks disagree on headers, so columns are inferred:
//!   date:        Date | Transaction Date | Tx Date | Posting Date
//!   description: Description | Details | Narrative | Merchant | Payee | Particulars | Reference
//!   amount:      Amount | Amt | Value, or Credit - Debit when split
//!   category:    Category (optional)

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use rust_decimal::Decimal;
use sniffer_core::Transaction;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::normalizer::{collapse_whitespace, parse_amount, parse_date};

const DATE_HEADERS: [&str; 4] = ["date", "transaction date", "tx date", "posting date"];
const DESC_HEADERS: [&str; 7] = [
    "description",
    "details",
    "narrative",
    "merchant",
    "payee",
    "particulars",
    "reference",
];
const AMOUNT_HEADERS: [&str; 3] = ["amount", "amt", "value"];
const DEBIT_HEADERS: [&str; 3] = ["debit", "withdrawal", "debits"];
const CREDIT_HEADERS: [&str; 3] = ["credit", "deposit", "credits"];
const CATEGORY_HEADERS: [&str; 1] = ["category"];

#[derive(Debug, Clone, Copy)]
enum AmountColumns {
    Single(usize),
    Split { debit: usize, credit: usize },
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    description: usize,
    amount: AmountColumns,
    category: Option<usize>,
}

impl Columns {
    fn infer(headers: &StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |candidates: &[&str]| position(&names, candidates);

        let amount = match find(&AMOUNT_HEADERS[..]) {
            Some(idx) => Some(AmountColumns::Single(idx)),
            None => match (find(&DEBIT_HEADERS[..]), find(&CREDIT_HEADERS[..])) {
                (Some(debit), Some(credit)) => Some(AmountColumns::Split { debit, credit }),
                _ => None,
            },
        };

        match (find(&DATE_HEADERS[..]), find(&DESC_HEADERS[..]), amount) {
            (Some(date), Some(description), Some(amount)) => Ok(Self {
                date,
                description,
                amount,
                category: find(&CATEGORY_HEADERS[..]),
            }),
            _ => bail!(
                "could not infer columns (need Date, Description, Amount or Debit+Credit), found: {}",
                names.join(", ")
            ),
        }
    }

    fn amount(&self, record: &StringRecord) -> Option<Decimal> {
        match self.amount {
            AmountColumns::Single(idx) => parse_amount(record.get(idx)?).ok(),
            AmountColumns::Split { debit, credit } => {
                let cell = |idx: usize| match record.get(idx).map(str::trim) {
                    None | Some("") => Some(Decimal::ZERO),
                    Some(raw) => parse_amount(raw).ok(),
                };
                Some(cell(credit)? - cell(debit)?.abs())
            }
        }
    }
}

/// Index of the first header matching any candidate, in candidate order.
fn position(names: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| names.iter().position(|n| n == c))
}

/// Parse a bank CSV export file.
pub fn parse_bank_csv(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_bank_csv_reader(file).with_context(|| format!("parsing {}", path.display()))
}

/// Parse CSV text from any reader. Rows with an unreadable date or amount
/// are skipped.
pub fn parse_bank_csv_reader<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::infer(rdr.headers()?)?;
    let mut txns = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = result?;

        let date = record.get(columns.date).and_then(parse_date);
        let amount = columns.amount(&record);
        let (Some(date), Some(amount)) = (date, amount) else {
            skipped += 1;
            continue;
        };

        let category = columns
            .category
            .and_then(|idx| record.get(idx))
            .unwrap_or("");

        txns.push(
            Transaction::new(date, amount, category).with_description(collapse_whitespace(
                record.get(columns.description).unwrap_or(""),
            )),
        );
    }

    if skipped > 0 {
        debug!(skipped, parsed = txns.len(), "skipped unreadable statement rows");
    }
    Ok(txns)
}
