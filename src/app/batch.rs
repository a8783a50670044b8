use crate::core::deal::{deal_score, DealLevel};
use crate::core::valuation::ValuationEngine;
use crate::utils::error::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct BatchRow {
    full_value: String,
    beneficiary_age: String,
    #[serde(default)]
    asking_price: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Ok,
    OutOfRange,
    Invalid,
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    full_value: String,
    beneficiary_age: String,
    bare_property_value: Option<Decimal>,
    usufruct_value: Option<Decimal>,
    savings: Option<Decimal>,
    bare_pct: Option<Decimal>,
    usufruct_pct: Option<Decimal>,
    coefficient: Option<Decimal>,
    deal_level: Option<DealLevel>,
    deal_deviation_pct: Option<Decimal>,
    status: RowStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub quoted: usize,
    pub out_of_range: usize,
    pub invalid: usize,
}

impl BatchSummary {
    pub fn rejected(&self) -> usize {
        self.out_of_range + self.invalid
    }
}

fn parse_inputs(row: &BatchRow) -> Option<(Decimal, u32, Option<Decimal>)> {
    let value = Decimal::from_str(row.full_value.trim()).ok()?;
    let age = row.beneficiary_age.trim().parse::<i64>().ok()?;
    let asking = match row.asking_price.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Decimal::from_str(raw).ok()?),
    };
    // negative ages are well-formed but never quotable
    Some((value, u32::try_from(age).unwrap_or(u32::MAX), asking))
}

/// Quotes every `full_value,beneficiary_age[,asking_price]` row of `input`
/// and writes one output row per input row. Unparseable rows are marked
/// `invalid` rather than aborting the batch.
pub fn quote_csv<R: Read, W: Write>(engine: &ValuationEngine, input: R, output: W) -> Result<BatchSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for row in reader.deserialize::<BatchRow>() {
        let row = row?;
        summary.rows += 1;

        let mut out = BatchOutput {
            full_value: row.full_value.clone(),
            beneficiary_age: row.beneficiary_age.clone(),
            bare_property_value: None,
            usufruct_value: None,
            savings: None,
            bare_pct: None,
            usufruct_pct: None,
            coefficient: None,
            deal_level: None,
            deal_deviation_pct: None,
            status: RowStatus::Invalid,
        };

        match parse_inputs(&row) {
            None => {
                tracing::warn!("Skipping malformed row {}: {:?}", summary.rows, row);
                summary.invalid += 1;
            }
            Some((value, age, asking)) => match engine.quote(value, age) {
                None => {
                    out.status = RowStatus::OutOfRange;
                    summary.out_of_range += 1;
                }
                Some(quote) => {
                    if let Some(score) = asking.and_then(|a| deal_score(a, quote.bare_property_value)) {
                        out.deal_level = Some(score.level);
                        out.deal_deviation_pct = Some(score.deviation_pct);
                    }
                    out.bare_property_value = Some(quote.bare_property_value);
                    out.usufruct_value = Some(quote.usufruct_value);
                    out.savings = Some(quote.savings);
                    out.bare_pct = Some(quote.bare_pct);
                    out.usufruct_pct = Some(quote.usufruct_pct);
                    out.coefficient = Some(quote.coefficient);
                    out.status = RowStatus::Ok;
                    summary.quoted += 1;
                }
            },
        }

        writer.serialize(&out)?;
    }

    writer.flush()?;
    tracing::info!(
        "Batch quoted {} of {} rows ({} out of range, {} invalid)",
        summary.quoted,
        summary.rows,
        summary.out_of_range,
        summary.invalid
    );
    Ok(summary)
}
