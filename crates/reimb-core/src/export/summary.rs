//! Aggregate report over a batch of processed forms.

use serde::{Deserialize, Serialize};

use crate::models::form::FieldId;
use crate::pipeline::ProcessedFile;

/// Expense categories summed into the grand total.
pub const CATEGORIES: [FieldId; 4] = [
    FieldId::TransportCost,
    FieldId::LodgingCost,
    FieldId::MealCost,
    FieldId::OtherCost,
];

/// Total and share for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub field: FieldId,
    pub total: u64,
    /// Percentage of the grand total, 0 when the grand total is 0.
    pub share: f64,
}

/// Reported total for one claimant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimantTotal {
    pub file_name: String,
    pub name: Option<String>,
    pub total: u64,
    pub share: f64,
}

/// Batch-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub categories: Vec<CategoryTotal>,
    /// Sum of the four category totals.
    pub grand_total: u64,
    pub claimants: usize,
    /// Grand total per claimant, rounded; 0 for an empty batch.
    pub average: u64,
    /// Largest reported `total_cost`; absent totals count as 0.
    pub max_total: u64,
    pub per_claimant: Vec<ClaimantTotal>,
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl ExpenseSummary {
    pub fn from_results(results: &[ProcessedFile]) -> Self {
        let sum_of = |field: FieldId| -> u64 {
            results
                .iter()
                .filter_map(|r| r.data.amount(field))
                .fold(0u64, u64::saturating_add)
        };

        let totals: Vec<(FieldId, u64)> = CATEGORIES.iter().map(|&f| (f, sum_of(f))).collect();
        let grand_total = totals
            .iter()
            .fold(0u64, |acc, (_, total)| acc.saturating_add(*total));

        let categories = totals
            .into_iter()
            .map(|(field, total)| CategoryTotal {
                field,
                total,
                share: percentage(total, grand_total),
            })
            .collect();

        let claimants = results.len();
        let average = if claimants == 0 {
            0
        } else {
            (grand_total as f64 / claimants as f64).round() as u64
        };

        let per_claimant: Vec<ClaimantTotal> = results
            .iter()
            .map(|r| {
                let total = r.data.amount(FieldId::TotalCost).unwrap_or(0);
                ClaimantTotal {
                    file_name: r.file_name.clone(),
                    name: r.data.name.clone(),
                    total,
                    share: percentage(total, grand_total),
                }
            })
            .collect();

        let max_total = per_claimant.iter().map(|c| c.total).max().unwrap_or(0);

        Self {
            categories,
            grand_total,
            claimants,
            average,
            max_total,
            per_claimant,
        }
    }

    /// Total for one category, 0 for non-category fields.
    pub fn total_for(&self, field: FieldId) -> u64 {
        self.categories
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.total)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::parse_expense_form;
    use pretty_assertions::assert_eq;

    fn processed(name: &str, text: &str) -> ProcessedFile {
        ProcessedFile {
            file_name: name.to_string(),
            data: parse_expense_form(text),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let results = vec![
            processed(
                "a.png",
                "姓名: 王小明\n交通費: 1500\n住宿費: 2000\n總計: 3500",
            ),
            processed("b.png", "姓名: 李大華\n餐費: 300\n其他: 200\n總計: 500"),
            processed("c.png", "無法辨識"),
        ];

        let summary = ExpenseSummary::from_results(&results);

        assert_eq!(summary.total_for(FieldId::TransportCost), 1500);
        assert_eq!(summary.total_for(FieldId::LodgingCost), 2000);
        assert_eq!(summary.total_for(FieldId::MealCost), 300);
        assert_eq!(summary.total_for(FieldId::OtherCost), 200);
        assert_eq!(summary.total_for(FieldId::Name), 0);
        assert_eq!(summary.grand_total, 4000);
        assert_eq!(summary.claimants, 3);
        assert_eq!(summary.average, 1333);
        assert_eq!(summary.max_total, 3500);
        assert_eq!(summary.per_claimant[2].total, 0);
        assert_eq!(summary.per_claimant[0].name.as_deref(), Some("王小明"));
        assert!((summary.categories[0].share - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_empty() {
        let summary = ExpenseSummary::from_results(&[]);
        assert_eq!(summary.grand_total, 0);
        assert_eq!(summary.claimants, 0);
        assert_eq!(summary.average, 0);
        assert_eq!(summary.max_total, 0);
        assert!(summary.categories.iter().all(|c| c.share == 0.0));
    }
}
