use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Month-over-month movement of the FLR total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema, Default)]
pub enum MomTrend {
    #[default]
    #[serde(rename = "-")]
    #[schemars(description = "No previous month to compare against")]
    NoPrior,

    #[serde(rename = "改善")]
    #[schemars(description = "FLR total fell by more than 0.5pt")]
    Improved,

    #[serde(rename = "維持")]
    #[schemars(description = "FLR total moved by at most 0.5pt either way")]
    Steady,

    #[serde(rename = "やや悪化")]
    #[schemars(description = "FLR total rose by more than 0.5pt and at most 2pt")]
    SlightlyWorse,

    #[serde(rename = "悪化")]
    #[schemars(description = "FLR total rose by more than 2pt")]
    Worse,
}

impl MomTrend {
    pub fn label(&self) -> &'static str {
        match self {
            MomTrend::NoPrior => "-",
            MomTrend::Improved => "改善",
            MomTrend::Steady => "維持",
            MomTrend::SlightlyWorse => "やや悪化",
            MomTrend::Worse => "悪化",
        }
    }
}

/// One calendar month of normalized P&L data. Currency is in thousands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    #[schemars(description = "Display label, e.g. \"25/1月\"")]
    pub month: String,

    #[schemars(description = "Sales (thousands)")]
    pub sales: i64,

    #[schemars(description = "Cost of goods (thousands)")]
    pub cost: i64,

    #[schemars(description = "Labor cost (thousands)")]
    pub labor_cost: i64,

    #[serde(rename = "operatingCF")]
    #[schemars(description = "Operating cash flow (thousands)")]
    pub operating_cf: i64,

    #[schemars(description = "Operating cash flow over sales (%)")]
    pub profit_rate: f64,

    #[schemars(description = "F cost: cost over sales (%)")]
    pub f_cost_rate: f64,

    #[schemars(description = "L cost: labor cost over sales (%)")]
    pub l_cost_rate: f64,

    #[schemars(description = "R cost: rent, lease and fees over sales (%)")]
    pub r_cost_rate: f64,

    #[schemars(description = "F + L + R (%)")]
    pub flr_total: f64,

    #[serde(default)]
    pub mom_trend: MomTrend,
}

/// ① Headline figures for the report month. Currency is in yen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryData {
    pub sales: i64,
    pub sales_yoy_label: String,
    pub operating_profit_rate: f64,
    pub profit_rate_yoy_change: f64,
    #[serde(rename = "operatingCF")]
    pub operating_cf: i64,
    pub f_cost_rate: f64,
    pub f_cost_rate_change: f64,
    pub flr_cost_rate: f64,
    pub flr_cost_rate_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct YoyRow {
    pub sales: i64,
    #[serde(rename = "operatingCF")]
    pub operating_cf: i64,
    pub profit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct YoyChange {
    pub sales_amount: i64,
    pub sales_rate: f64,
    pub cf_amount: i64,
    pub cf_rate: f64,
    pub profit_rate_change: f64,
}

/// ② Report month against the same month one year earlier. Currency is in yen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct YoyComparison {
    pub previous_year: YoyRow,
    pub current_year: YoyRow,
    pub change: YoyChange,
}

/// ④ A titled narrative block. Produced by the commentary collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommentSection {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub store_name: String,
    #[schemars(description = "e.g. \"2026年1月\"")]
    pub report_month: String,
    #[schemars(description = "e.g. \"2026年1月度\"")]
    pub report_period: String,
    #[schemars(description = "e.g. \"2026年2月5日\"")]
    pub created_date: String,
    pub summary: SummaryData,
    pub yoy_comparison: YoyComparison,
    #[schemars(description = "Up to 13 months, oldest first")]
    pub monthly_trend: Vec<MonthlyRecord>,
    pub comments: Vec<CommentSection>,
}

impl ReportData {
    pub fn latest(&self) -> Option<&MonthlyRecord> {
        self.monthly_trend.last()
    }

    pub fn previous(&self) -> Option<&MonthlyRecord> {
        let len = self.monthly_trend.len();
        if len >= 2 {
            self.monthly_trend.get(len - 2)
        } else {
            None
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportData)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(month: &str) -> MonthlyRecord {
        MonthlyRecord {
            month: month.to_string(),
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
        }
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ReportData::schema_as_json().unwrap();
        assert!(schema_json.contains("monthlyTrend"));
        assert!(schema_json.contains("yoyComparison"));
        assert!(schema_json.contains("operatingCF"));
    }

    #[test]
    fn test_monthly_record_wire_names() {
        let json = serde_json::to_value(record("26/1月")).unwrap();
        assert_eq!(json["month"], "26/1月");
        assert_eq!(json["laborCost"], 2678);
        assert_eq!(json["operatingCF"], 1384);
        assert_eq!(json["flrTotal"], 70.1);
        assert_eq!(json["momTrend"], "悪化");
    }

    #[test]
    fn test_mom_trend_labels_match_serialization() {
        for trend in [
            MomTrend::NoPrior,
            MomTrend::Improved,
            MomTrend::Steady,
            MomTrend::SlightlyWorse,
            MomTrend::Worse,
        ] {
            let json = serde_json::to_string(&trend).unwrap();
            assert_eq!(json, format!("\"{}\"", trend.label()));
        }
    }

    #[test]
    fn test_latest_and_previous() {
        let mut report = ReportData {
            store_name: "かね子".to_string(),
            report_month: "2026年1月".to_string(),
            report_period: "2026年1月度".to_string(),
            created_date: "2026年2月5日".to_string(),
            summary: SummaryData {
                sales: 0,
                sales_yoy_label: String::new(),
                operating_profit_rate: 0.0,
                profit_rate_yoy_change: 0.0,
                operating_cf: 0,
                f_cost_rate: 0.0,
                f_cost_rate_change: 0.0,
                flr_cost_rate: 0.0,
                flr_cost_rate_change: 0.0,
            },
            yoy_comparison: YoyComparison {
                previous_year: YoyRow {
                    sales: 0,
                    operating_cf: 0,
                    profit_rate: 0.0,
                },
                current_year: YoyRow {
                    sales: 0,
                    operating_cf: 0,
                    profit_rate: 0.0,
                },
                change: YoyChange {
                    sales_amount: 0,
                    sales_rate: 0.0,
                    cf_amount: 0,
                    cf_rate: 0.0,
                    profit_rate_change: 0.0,
                },
            },
            monthly_trend: vec![record("26/1月")],
            comments: vec![],
        };

        assert_eq!(report.latest().unwrap().month, "26/1月");
        assert!(report.previous().is_none());

        report.monthly_trend.insert(0, record("12月"));
        assert_eq!(report.previous().unwrap().month, "12月");
    }
}
