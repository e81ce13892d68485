//! Summary cards computed over a whole collection

use std::fmt;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::Collection;
use crate::schema::FieldSchema;

/// What a card computes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryKind {
    /// Number of records
    Total,
    /// Count per distinct value of `field`, in first-seen order
    Distribution { field: String },
    /// Count and percentage per select option of `field`
    OptionShare { field: String },
    /// Records divided by the number of options of `field`
    PerOption { field: String },
    /// Mean of the per-option percentages of `field`
    MeanOptionShare { field: String },
    /// Mean age in whole years of the dates in `field`
    AverageAge { field: String },
}

/// A titled summary card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSpec {
    pub title: String,
    #[serde(flatten)]
    pub kind: SummaryKind,
}

impl CardSpec {
    pub fn new(title: impl Into<String>, kind: SummaryKind) -> Self {
        Self {
            title: title.into(),
            kind,
        }
    }

    /// Compute the card with today's local date
    pub fn compute(&self, collection: &Collection, schema: &FieldSchema) -> Summary {
        self.compute_at(collection, schema, Local::now().date_naive())
    }

    pub fn compute_at(&self, collection: &Collection, schema: &FieldSchema, today: NaiveDate) -> Summary {
        let total = collection.len();
        let value = match &self.kind {
            SummaryKind::Total => SummaryValue::Count(total),
            SummaryKind::Distribution { field } => {
                let mut shares: Vec<Share> = Vec::new();
                for record in collection {
                    let value = record.value(field);
                    let label = if value.is_blank() {
                        "N/A".to_string()
                    } else {
                        value.to_string()
                    };
                    match shares.iter_mut().find(|s| s.label == label) {
                        Some(share) => share.count += 1,
                        None => shares.push(Share {
                            label,
                            count: 1,
                            percent: 0.0,
                        }),
                    }
                }
                for share in &mut shares {
                    share.percent = percent(share.count, total);
                }
                SummaryValue::Breakdown(shares)
            }
            SummaryKind::OptionShare { field } => {
                let options = schema.field(field).map(|f| f.options.as_slice()).unwrap_or(&[]);
                let shares = options
                    .iter()
                    .map(|option| {
                        let count = collection
                            .iter()
                            .filter(|r| r.value(field).key() == option.value)
                            .count();
                        Share {
                            label: option.label.clone(),
                            count,
                            percent: percent(count, total),
                        }
                    })
                    .collect();
                SummaryValue::Breakdown(shares)
            }
            SummaryKind::PerOption { field } => {
                let options = schema.field(field).map(|f| f.options.len()).unwrap_or(0);
                let ratio = if options == 0 {
                    0.0
                } else {
                    total as f64 / options as f64
                };
                SummaryValue::Ratio(ratio)
            }
            SummaryKind::MeanOptionShare { field } => {
                let options = schema.field(field).map(|f| f.options.as_slice()).unwrap_or(&[]);
                let mean = if options.is_empty() {
                    0.0
                } else {
                    // each share is shown with two decimals, so average those
                    let sum: f64 = options
                        .iter()
                        .map(|option| {
                            let count = collection
                                .iter()
                                .filter(|r| r.value(field).key() == option.value)
                                .count();
                            (percent(count, total) * 100.0).round() / 100.0
                        })
                        .sum();
                    sum / options.len() as f64
                };
                SummaryValue::Percent(mean)
            }
            SummaryKind::AverageAge { field } => {
                let ages: Vec<u32> = collection
                    .iter()
                    .filter_map(|r| r.value(field).as_datetime())
                    .filter_map(|dt| today.years_since(dt.date()))
                    .collect();
                let mean = if ages.is_empty() {
                    0.0
                } else {
                    ages.iter().map(|&a| a as f64).sum::<f64>() / ages.len() as f64
                };
                SummaryValue::Ratio(mean)
            }
        };

        Summary {
            title: self.title.clone(),
            value,
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// One labelled count of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryValue {
    Count(usize),
    Ratio(f64),
    Percent(f64),
    Breakdown(Vec<Share>),
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Count(n) => write!(f, "{}", n),
            SummaryValue::Ratio(r) => write!(f, "{:.2}", r),
            SummaryValue::Percent(p) => write!(f, "{:.2}%", p),
            SummaryValue::Breakdown(shares) => {
                for (i, share) in shares.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {} ({:.2}%)", share.label, share.count, share.percent)?;
                }
                Ok(())
            }
        }
    }
}

/// A computed card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub value: SummaryValue,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.value)
    }
}
