//! Pattern table for expense-form extraction.
//!
//! Each field owns an ordered list of candidates; earlier candidates are
//! stricter and score higher.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::form::FieldId;

use super::FieldRule;

lazy_static! {
    // Claimant name: "姓名: 王小明", then "姓名 王小明"
    pub static ref NAME_LABELED: Regex = Regex::new(
        r"姓名[:：]\s*([^\s，,。]+)"
    ).unwrap();

    pub static ref NAME_SPACED: Regex = Regex::new(
        r"姓名\s+([^\s，,。]+)"
    ).unwrap();

    // Department: labeled, then any token ending in 部
    pub static ref DEPARTMENT_LABELED: Regex = Regex::new(
        r"部門[:：]\s*([^\s，,。]+)"
    ).unwrap();

    pub static ref DEPARTMENT_SUFFIX: Regex = Regex::new(
        r"([^\s，,。]+部)"
    ).unwrap();

    // Dates: labeled with -, / or 年月日 separators, then a bare y-m-d
    pub static ref DATE_LABELED: Regex = Regex::new(
        r"日期[:：]\s*([0-9]{4}[-/年][0-9]{1,2}[-/月][0-9]{1,2}日?)"
    ).unwrap();

    pub static ref DATE_BARE: Regex = Regex::new(
        r"([0-9]{4}[-/][0-9]{1,2}[-/][0-9]{1,2})"
    ).unwrap();

    /// Ordered candidates for every field, in canonical field order.
    pub static ref FIELD_RULES: Vec<FieldRule> = vec![
        FieldRule::new(FieldId::Name, vec![NAME_LABELED.clone(), NAME_SPACED.clone()]),
        FieldRule::new(
            FieldId::Department,
            vec![DEPARTMENT_LABELED.clone(), DEPARTMENT_SUFFIX.clone()],
        ),
        FieldRule::new(FieldId::Date, vec![DATE_LABELED.clone(), DATE_BARE.clone()]),
        FieldRule::new(FieldId::TransportCost, amount_candidates(FieldId::TransportCost)),
        FieldRule::new(FieldId::LodgingCost, amount_candidates(FieldId::LodgingCost)),
        FieldRule::new(FieldId::MealCost, amount_candidates(FieldId::MealCost)),
        FieldRule::new(FieldId::OtherCost, amount_candidates(FieldId::OtherCost)),
        FieldRule::new(FieldId::TotalCost, amount_candidates(FieldId::TotalCost)),
    ];
}

/// Labeled amount candidates: "交通費: NT$1,500" first, then "交通費: 1500".
fn amount_candidates(field: FieldId) -> Vec<Regex> {
    let label = regex::escape(field.label());
    vec![
        Regex::new(&format!(
            r"{label}[:：]\s*[Nn][Tt]?\$?\s*([0-9]+(?:[,，][0-9]{{3}})*)"
        ))
        .unwrap(),
        Regex::new(&format!(r"{label}[:：]\s*([0-9]+)")).unwrap(),
    ]
}

/// Look up the rule for a field.
pub fn rule_for(field: FieldId) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|r| r.field == field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_one_or_two_candidates() {
        assert_eq!(FIELD_RULES.len(), FieldId::ALL.len());
        for (rule, field) in FIELD_RULES.iter().zip(FieldId::ALL) {
            assert_eq!(rule.field, field);
            assert!((1..=2).contains(&rule.candidates.len()));
        }
    }

    #[test]
    fn test_amount_primary_requires_currency_prefix() {
        let rule = rule_for(FieldId::MealCost).unwrap();
        assert!(rule.candidates[0].is_match("餐費: NT$800"));
        assert!(rule.candidates[0].is_match("餐費：N 800"));
        assert!(!rule.candidates[0].is_match("餐費: 800"));
        assert!(rule.candidates[1].is_match("餐費: 800"));
    }

    #[test]
    fn test_date_labeled_accepts_cjk_separators() {
        let caps = DATE_LABELED.captures("日期：2024年7月15日").unwrap();
        assert_eq!(&caps[1], "2024年7月15日");
    }
}
