//! Narrative commentary for a finished report.
//!
//! The core only defines what a generator receives and how its free-text answer is
//! turned into [`CommentSection`]s. The HTTP-backed generator lives behind the
//! `gemini` feature.

pub mod prompts;

#[cfg(feature = "gemini")]
pub mod gemini;

use crate::error::{ReportError, Result};
use crate::schema::{CommentSection, MonthlyRecord, ReportData, YoyComparison};
use futures::future::BoxFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub use prompts::build_prompt;

/// Everything a commentary generator is given about the report month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryInput {
    pub store_name: String,
    pub report_month: String,
    pub latest: MonthlyRecord,
    pub previous: Option<MonthlyRecord>,
    pub yoy: YoyComparison,
}

impl CommentaryInput {
    /// Returns `None` for a report without any monthly record.
    pub fn from_report(report: &ReportData) -> Option<Self> {
        Some(Self {
            store_name: report.store_name.clone(),
            report_month: report.report_month.clone(),
            latest: report.latest()?.clone(),
            previous: report.previous().cloned(),
            yoy: report.yoy_comparison.clone(),
        })
    }
}

pub trait CommentaryGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        input: &'a CommentaryInput,
    ) -> BoxFuture<'a, Result<Vec<CommentSection>>>;
}

/// A section as returned by the model, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionDraft {
    pub title: String,
    pub content: String,
}

fn json_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[\s\S]*\]").expect("valid regex"))
}

/// Pulls the JSON array of `{title, content}` objects out of a model answer, which
/// may be wrapped in prose or a code fence.
pub fn parse_section_drafts(text: &str) -> Result<Vec<SectionDraft>> {
    let array = json_array_regex().find(text).ok_or_else(|| {
        ReportError::CommentaryError("response contains no JSON array".to_string())
    })?;
    Ok(serde_json::from_str(array.as_str())?)
}

/// Assigns ids `ai-<n>` starting at `first_id`.
pub fn number_sections(drafts: Vec<SectionDraft>, first_id: usize) -> Vec<CommentSection> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| CommentSection {
            id: format!("ai-{}", first_id + i),
            title: draft.title,
            content: draft.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MomTrend, YoyChange, YoyRow};

    fn input(previous: bool) -> CommentaryInput {
        let latest = MonthlyRecord {
            month: "26/1月".to_string(),
            sales: 7645,
            cost: 2191,
            labor_cost: 2678,
            operating_cf: 1384,
            profit_rate: 18.0,
            f_cost_rate: 28.7,
            l_cost_rate: 35.0,
            r_cost_rate: 6.4,
            flr_total: 70.1,
            mom_trend: MomTrend::Worse,
        };
        let prior = MonthlyRecord {
            month: "25/12月".to_string(),
            sales: 12345,
            flr_total: 66.6,
            profit_rate: 23.2,
            ..latest.clone()
        };
        CommentaryInput {
            store_name: "かね子".to_string(),
            report_month: "2026年1月".to_string(),
            latest,
            previous: previous.then_some(prior),
            yoy: YoyComparison {
                previous_year: YoyRow {
                    sales: 6_316_000,
                    operating_cf: 1_243_000,
                    profit_rate: 23.1,
                },
                current_year: YoyRow {
                    sales: 7_645_000,
                    operating_cf: 1_384_000,
                    profit_rate: 18.0,
                },
                change: YoyChange {
                    sales_amount: 1_329_000,
                    sales_rate: 21.0,
                    cf_amount: 141_000,
                    cf_rate: 11.3,
                    profit_rate_change: -5.1,
                },
            },
        }
    }

    #[test]
    fn test_prompt_contains_figures_and_benchmarks() {
        let prompt = build_prompt(&input(true));
        assert!(prompt.contains("- 店舗名: かね子"));
        assert!(prompt.contains("- 対象月: 2026年1月"));
        assert!(prompt.contains("- 売上高: 7,645千円"));
        assert!(prompt.contains("- FLR合計: 70.1%"));
        assert!(prompt.contains("- 営業利益率: 18%"));
        assert!(prompt.contains("## 前月実績\n- 売上高: 12,345千円"));
        assert!(prompt.contains("- 売上高変動: +21.0%"));
        assert!(prompt.contains("- 営業利益率変動: -5.1pt"));
        assert!(prompt.contains("70%超は危険水準"));
    }

    #[test]
    fn test_prompt_omits_previous_month_when_absent() {
        let prompt = build_prompt(&input(false));
        assert!(!prompt.contains("## 前月実績"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(prompts::group_thousands(0), "0");
        assert_eq!(prompts::group_thousands(999), "999");
        assert_eq!(prompts::group_thousands(1000), "1,000");
        assert_eq!(prompts::group_thousands(-1234567), "-1,234,567");
    }

    #[test]
    fn test_parse_fenced_answer() {
        let text = "```json\n[\n  {\"title\": \"原価率の上昇\", \"content\": \"Fコストが28.7%です。\"},\n  {\"title\": \"FLR改善提案\", \"content\": \"70.1%は危険水準です。\"}\n]\n```";
        let sections = number_sections(parse_section_drafts(text).unwrap(), 100);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "ai-100");
        assert_eq!(sections[1].id, "ai-101");
        assert_eq!(sections[1].title, "FLR改善提案");
    }

    #[test]
    fn test_parse_rejects_answer_without_array() {
        let err = parse_section_drafts("申し訳ありません。").unwrap_err();
        assert!(matches!(err, ReportError::CommentaryError(_)));

        let err = parse_section_drafts("[{\"title\": 1}]").unwrap_err();
        assert!(matches!(err, ReportError::SerializationError(_)));
    }
}
