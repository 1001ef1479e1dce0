//! Expense form data model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReimbError, Result};

/// Identifier of an expense-form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    /// Claimant name (姓名).
    Name,
    /// Department (部門).
    Department,
    /// Date of the claim (日期).
    Date,
    /// Transport cost (交通費).
    TransportCost,
    /// Lodging cost (住宿費).
    LodgingCost,
    /// Meal cost (餐費).
    MealCost,
    /// Other costs (其他).
    OtherCost,
    /// Total claimed (總計).
    TotalCost,
}

impl FieldId {
    /// All fields in canonical order.
    pub const ALL: [FieldId; 8] = [
        FieldId::Name,
        FieldId::Department,
        FieldId::Date,
        FieldId::TransportCost,
        FieldId::LodgingCost,
        FieldId::MealCost,
        FieldId::OtherCost,
        FieldId::TotalCost,
    ];

    /// Stable machine key, identical to the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::Department => "department",
            FieldId::Date => "date",
            FieldId::TransportCost => "transportCost",
            FieldId::LodgingCost => "lodgingCost",
            FieldId::MealCost => "mealCost",
            FieldId::OtherCost => "otherCost",
            FieldId::TotalCost => "totalCost",
        }
    }

    /// Label printed on the paper form.
    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Name => "姓名",
            FieldId::Department => "部門",
            FieldId::Date => "日期",
            FieldId::TransportCost => "交通費",
            FieldId::LodgingCost => "住宿費",
            FieldId::MealCost => "餐費",
            FieldId::OtherCost => "其他",
            FieldId::TotalCost => "總計",
        }
    }

    /// Whether the field holds an amount of money.
    pub fn is_monetary(&self) -> bool {
        matches!(
            self,
            FieldId::TransportCost
                | FieldId::LodgingCost
                | FieldId::MealCost
                | FieldId::OtherCost
                | FieldId::TotalCost
        )
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldId {
    type Err = ReimbError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        FieldId::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(s) || f.label() == s)
            .ok_or_else(|| ReimbError::InvalidValue {
                field: "field".to_string(),
                value: s.to_string(),
            })
    }
}

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(u64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Amount(n) => write!(f, "{}", n),
        }
    }
}

/// Review tier for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Above 0.9.
    High,
    /// Above 0.85.
    Medium,
    /// Everything else, including unextracted fields.
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.9 {
            Self::High
        } else if score > 0.85 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Structured record extracted from one expense report.
///
/// Absent values are `None`; a monetary field read as zero is `Some(0)`.
/// Every field always has a confidence entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedForm {
    pub name: Option<String>,
    pub department: Option<String>,
    pub date: Option<String>,
    pub transport_cost: Option<u64>,
    pub lodging_cost: Option<u64>,
    pub meal_cost: Option<u64>,
    pub other_cost: Option<u64>,
    pub total_cost: Option<u64>,
    /// Heuristic certainty per field, 0.0 when unextracted.
    #[serde(default)]
    pub confidence: BTreeMap<FieldId, f64>,
}

impl Default for ExtractedForm {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExtractedForm {
    /// A form with every field absent and every confidence at zero.
    pub fn empty() -> Self {
        Self {
            name: None,
            department: None,
            date: None,
            transport_cost: None,
            lodging_cost: None,
            meal_cost: None,
            other_cost: None,
            total_cost: None,
            confidence: FieldId::ALL.iter().map(|f| (*f, 0.0)).collect(),
        }
    }

    /// Value of a field, if present.
    pub fn value(&self, field: FieldId) -> Option<FieldValue> {
        match field {
            FieldId::Name => self.name.clone().map(FieldValue::Text),
            FieldId::Department => self.department.clone().map(FieldValue::Text),
            FieldId::Date => self.date.clone().map(FieldValue::Text),
            FieldId::TransportCost => self.transport_cost.map(FieldValue::Amount),
            FieldId::LodgingCost => self.lodging_cost.map(FieldValue::Amount),
            FieldId::MealCost => self.meal_cost.map(FieldValue::Amount),
            FieldId::OtherCost => self.other_cost.map(FieldValue::Amount),
            FieldId::TotalCost => self.total_cost.map(FieldValue::Amount),
        }
    }

    /// Amount of a monetary field; `None` for absent or non-monetary fields.
    pub fn amount(&self, field: FieldId) -> Option<u64> {
        match self.value(field) {
            Some(FieldValue::Amount(n)) => Some(n),
            _ => None,
        }
    }

    pub fn confidence_of(&self, field: FieldId) -> f64 {
        self.confidence.get(&field).copied().unwrap_or(0.0)
    }

    pub fn confidence_level(&self, field: FieldId) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence_of(field))
    }

    /// Fields whose confidence is below `threshold`, in canonical order.
    pub fn low_confidence_fields(&self, threshold: f64) -> Vec<FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(|f| self.confidence_of(*f) < threshold)
            .collect()
    }

    /// Return a copy with `field` replaced by a reviewer-supplied value.
    ///
    /// An empty `raw` clears the field. The corrected field is marked as fully
    /// confident since a person has checked it.
    pub fn with_correction(&self, field: FieldId, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let mut copy = self.clone();

        let value = if raw.is_empty() {
            None
        } else if field.is_monetary() {
            let digits: String = raw.chars().filter(|c| !matches!(c, ',' | '，')).collect();
            let amount = digits.parse::<u64>().map_err(|_| ReimbError::InvalidValue {
                field: field.key().to_string(),
                value: raw.to_string(),
            })?;
            Some(FieldValue::Amount(amount))
        } else {
            Some(FieldValue::Text(raw.to_string()))
        };

        copy.set(field, value, 1.0);
        Ok(copy)
    }

    pub(crate) fn set(&mut self, field: FieldId, value: Option<FieldValue>, confidence: f64) {
        let text = |v: Option<FieldValue>| match v {
            Some(FieldValue::Text(s)) => Some(s),
            Some(FieldValue::Amount(n)) => Some(n.to_string()),
            None => None,
        };
        let amount = |v: Option<FieldValue>| match v {
            Some(FieldValue::Amount(n)) => Some(n),
            _ => None,
        };

        match field {
            FieldId::Name => self.name = text(value),
            FieldId::Department => self.department = text(value),
            FieldId::Date => self.date = text(value),
            FieldId::TransportCost => self.transport_cost = amount(value),
            FieldId::LodgingCost => self.lodging_cost = amount(value),
            FieldId::MealCost => self.meal_cost = amount(value),
            FieldId::OtherCost => self.other_cost = amount(value),
            FieldId::TotalCost => self.total_cost = amount(value),
        }
        self.confidence.insert(field, confidence);
    }
}
