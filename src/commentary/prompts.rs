// Analysis prompt for the monthly commentary sections

use super::CommentaryInput;

pub const ANALYST_ROLE: &str =
    "あなたは飲食業界の経営コンサルタントです。以下の月次業績データを分析し、経営者向けのコメントセクションを生成してください。";

pub const FLR_BENCHMARKS: &str = r#"## FLRコスト基準（飲食業界）
- Fコスト目標: 25-30%
- Lコスト目標: 25-30%
- FLR合計目標: 60-65%（70%超は危険水準）"#;

pub const INSTRUCTIONS: &str = r#"## 指示
上記データを分析し、経営者にとって**最も重要な発見・課題・アクション**を2〜4セクションにまとめてください。
- セクション名はデータに応じて動的に決定してください（固定名不要）
- 例: 「原価率の異常上昇」「売上増加の要因分析」「FLRコスト改善提案」「人件費構造の問題点」等
- 各セクションは具体的な数値を引用し、簡潔にまとめてください（各150字以内）
- 改善点には具体的なアクション提案を含めてください

## 出力フォーマット
以下のJSON配列のみを返してください（マークダウンやコードブロック不要）:
[
  {"title": "セクション名1", "content": "本文1"},
  {"title": "セクション名2", "content": "本文2"}
]"#;

/// "7645" -> "7,645"
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.1}", value)
    } else {
        format!("{:.1}", value)
    }
}

pub fn build_prompt(input: &CommentaryInput) -> String {
    let current = &input.latest;
    let change = &input.yoy.change;

    let mut prompt = format!(
        "{}\n\n## 店舗情報\n- 店舗名: {}\n- 対象月: {}\n\n## 当月実績\n\
         - 売上高: {}千円\n- 営業利益率: {}%\n- Fコスト(原価率): {}%\n\
         - Lコスト(人件費率): {}%\n- Rコスト(固定費率): {}%\n- FLR合計: {}%\n- 営業CF: {}千円\n",
        ANALYST_ROLE,
        input.store_name,
        input.report_month,
        group_thousands(current.sales),
        current.profit_rate,
        current.f_cost_rate,
        current.l_cost_rate,
        current.r_cost_rate,
        current.flr_total,
        group_thousands(current.operating_cf),
    );

    if let Some(previous) = &input.previous {
        prompt.push_str(&format!(
            "\n## 前月実績\n- 売上高: {}千円\n- FLR合計: {}%\n- 営業利益率: {}%\n",
            group_thousands(previous.sales),
            previous.flr_total,
            previous.profit_rate
        ));
    }

    prompt.push_str(&format!(
        "\n## 前年同月比\n- 売上高変動: {}%\n- 営業CF変動: {}%\n- 営業利益率変動: {}pt\n\n",
        signed(change.sales_rate),
        signed(change.cf_rate),
        signed(change.profit_rate_change)
    ));
    prompt.push_str(FLR_BENCHMARKS);
    prompt.push_str("\n\n");
    prompt.push_str(INSTRUCTIONS);
    prompt
}
