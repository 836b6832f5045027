//! Application-document rendering.
//!
//! The base template is a fixed layout: a header, a basic-info block, and
//! six narrative sections holding human-guidance placeholders. Enhanced
//! rendering swaps each placeholder block for AI-generated prose by exact
//! substitution, so the placeholder texts are load-bearing constants.

use crate::currency::format_currency;
use crate::dates::{period_date, NO_INFO};
use crate::subsidy::{AiContent, SubsidyInfo};

/// Header title used when the program name is unknown.
pub const UNKNOWN_TITLE: &str = "不明な補助金";

/// Per-section notice when the AI produced nothing for that section.
pub const SECTION_UNAVAILABLE: &str = "情報を生成できませんでした。";

/// Trailing disclaimer appended to every AI-enhanced document.
pub const AI_DISCLAIMER: &str =
    "※このテンプレートは生成AIによって作成されました。内容を確認し、必要に応じて修正してください。";

/// Notice appended to the base template when AI enhancement failed.
pub const AI_UNAVAILABLE_NOTICE: &str =
    "※AI拡張機能は現在利用できません。基本テンプレートをご利用ください。";

struct NarrativeSection {
    key: &'static str,
    heading: &'static str,
    placeholder: &'static str,
}

const NARRATIVE_SECTIONS: [NarrativeSection; 6] = [
    NarrativeSection {
        key: "application_reason",
        heading: "■申請理由：",
        placeholder: "[ここに補助金申請の具体的な理由を記入してください。例：\n・事業の現状と課題\n・補助金を活用した事業計画の概要\n・期待される効果や成果\n・予算計画の概要]",
    },
    NarrativeSection {
        key: "business_plan",
        heading: "■事業計画概要：",
        placeholder: "[ここに具体的な事業計画を記入してください。計画の実現可能性、革新性、市場性、社会的意義などを明確に説明すると効果的です。]",
    },
    NarrativeSection {
        key: "implementation_structure",
        heading: "■実施体制：",
        placeholder: "[ここに事業実施体制について記入してください。担当者の役割や外部との連携体制などを含めると良いでしょう。]",
    },
    NarrativeSection {
        key: "schedule",
        heading: "■スケジュール：",
        placeholder: "[ここに事業の実施スケジュールを記入してください。マイルストーンとなる重要な日程も含めると良いでしょう。]",
    },
    NarrativeSection {
        key: "budget_plan",
        heading: "■予算計画：",
        placeholder: "[ここに予算計画の詳細を記入してください。各費目ごとの金額と、その積算根拠を明確に示すことが重要です。]",
    },
    NarrativeSection {
        key: "expected_effects",
        heading: "■期待される効果：",
        placeholder: "[ここに補助金による事業実施で期待される具体的な効果を記入してください。定量的な指標と定性的な効果の両方を含めると良いでしょう。]",
    },
];

/// Renders the base application document for a subsidy record.
pub fn render(info: &SubsidyInfo) -> String {
    let title = info.title.as_deref().unwrap_or(UNKNOWN_TITLE);
    let area = info.target_area_search.as_deref().unwrap_or(NO_INFO);
    let limit = info
        .subsidy_max_limit
        .map(format_currency)
        .unwrap_or_else(|| NO_INFO.to_string());

    let mut document = format!("【申請書類：{title}】\n");
    document.push_str("\n■基本情報\n");
    document.push_str(&format!("申請期間：{}\n", application_period(info)));
    document.push_str(&format!("対象地域：{area}\n"));
    document.push_str(&format!("補助上限額：{limit}"));
    if let Some(employees) = info.target_number_of_employees.as_deref() {
        document.push_str(&format!("\n従業員数制限：{employees}"));
    }

    for section in &NARRATIVE_SECTIONS {
        document.push_str(&format!("\n\n{}\n{}", section.heading, section.placeholder));
    }

    document
}

/// Renders the document with AI prose substituted for the placeholders.
///
/// Sections missing from `content` render the per-section unavailable
/// notice. A keyword note is appended when the record carries target-field
/// or target-type hints, followed by the AI disclaimer.
pub fn render_enhanced(info: &SubsidyInfo, content: &AiContent) -> String {
    let mut document = render(info);

    for section in &NARRATIVE_SECTIONS {
        let block = format!("{}\n{}", section.heading, section.placeholder);
        let prose = content.get(section.key).unwrap_or(SECTION_UNAVAILABLE);
        let replacement = format!("{}\n{}", section.heading, prose);
        document = document.replace(&block, &replacement);
    }

    let keywords: Vec<&str> = [info.target_field.as_deref(), info.target_type.as_deref()]
        .into_iter()
        .flatten()
        .filter(|keyword| !keyword.is_empty())
        .collect();
    if !keywords.is_empty() {
        document.push_str(&format!(
            "\n\n※この申請書は以下のキーワードを考慮して作成されています: {}",
            keywords.join(", ")
        ));
    }

    document.push_str(&format!("\n\n{AI_DISCLAIMER}"));
    document
}

// The period line prints only a complete window; a lone start or end, or
// an unparsable timestamp, renders as 情報なし.
fn application_period(info: &SubsidyInfo) -> String {
    let start = period_date(info.acceptance_start_datetime.as_deref());
    let end = period_date(info.acceptance_end_datetime.as_deref());
    match (start, end) {
        (Some(start), Some(end)) => format!("{start}～{end}"),
        _ => NO_INFO.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{render, render_enhanced, AI_DISCLAIMER, SECTION_UNAVAILABLE, UNKNOWN_TITLE};
    use crate::subsidy::{AiContent, SubsidyInfo, NARRATIVE_SECTION_KEYS};

    fn full_info() -> SubsidyInfo {
        SubsidyInfo {
            title: Some("小規模事業者持続化補助金".to_string()),
            target_area_search: Some("東京都".to_string()),
            subsidy_max_limit: Some(50_000_000),
            acceptance_start_datetime: Some("2024-04-01T10:00:00Z".to_string()),
            acceptance_end_datetime: Some("2024-05-30T17:00:00Z".to_string()),
            target_number_of_employees: Some("20名以下".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn full_record_renders_every_basic_info_line() {
        let document = render(&full_info());

        assert!(document.contains("【申請書類：小規模事業者持続化補助金】"));
        assert!(document.contains("申請期間：2024年4月1日～2024年5月30日"));
        assert!(document.contains("対象地域：東京都"));
        assert!(document.contains("補助上限額：5,000万円"));
        assert!(document.contains("従業員数制限：20名以下"));
        assert!(document.contains("■申請理由："));
    }

    #[test]
    fn title_only_record_renders_defaults_and_placeholders() {
        let info =
            SubsidyInfo { title: Some("起業支援補助金".to_string()), ..Default::default() };
        let document = render(&info);

        assert!(document.contains("【申請書類：起業支援補助金】"));
        assert!(document.contains("申請期間：情報なし"));
        assert!(document.contains("対象地域：情報なし"));
        assert!(document.contains("補助上限額：情報なし"));
        assert!(!document.contains("従業員数制限"));
        assert!(document.contains("[ここに補助金申請の具体的な理由を記入してください。例："));
        assert!(document.contains("[ここに具体的な事業計画を記入してください。"));
        assert!(document.contains("[ここに事業実施体制について記入してください。"));
        assert!(document.contains("[ここに事業の実施スケジュールを記入してください。"));
        assert!(document.contains("[ここに予算計画の詳細を記入してください。"));
        assert!(document.contains("[ここに補助金による事業実施で期待される具体的な効果を記入してください。"));
    }

    #[test]
    fn missing_title_falls_back_to_unknown_program() {
        let info = SubsidyInfo { subsidy_max_limit: Some(1_000_000), ..Default::default() };
        let document = render(&info);

        assert!(document.contains(&format!("【申請書類：{UNKNOWN_TITLE}】")));
        assert!(document.contains("補助上限額：100万円"));
    }

    #[test]
    fn period_requires_both_endpoints() {
        let mut info = full_info();
        info.acceptance_end_datetime = None;
        assert!(render(&info).contains("申請期間：情報なし"));

        let mut info = full_info();
        info.acceptance_start_datetime = Some("not-a-date".to_string());
        assert!(render(&info).contains("申請期間：情報なし"));
    }

    #[test]
    fn enhanced_rendering_substitutes_every_placeholder() {
        let mut content = AiContent::default();
        for key in NARRATIVE_SECTION_KEYS {
            content.set(key, format!("{key}のための生成文です。"));
        }
        let document = render_enhanced(&full_info(), &content);

        assert!(!document.contains("[ここに"));
        for key in NARRATIVE_SECTION_KEYS {
            assert!(document.contains(&format!("{key}のための生成文です。")));
        }
        assert_eq!(document.matches(AI_DISCLAIMER).count(), 1);
    }

    #[test]
    fn missing_sections_render_the_unavailable_notice() {
        let content = AiContent {
            application_reason: Some("現状の課題を解決するため。".to_string()),
            ..Default::default()
        };
        let document = render_enhanced(&full_info(), &content);

        assert!(document.contains("■申請理由：\n現状の課題を解決するため。"));
        assert!(document.contains(&format!("■事業計画概要：\n{SECTION_UNAVAILABLE}")));
        assert!(document.contains(&format!("■期待される効果：\n{SECTION_UNAVAILABLE}")));
    }

    #[test]
    fn keyword_note_lists_target_field_and_type() {
        let mut info = full_info();
        info.target_field = Some("IT導入".to_string());
        info.target_type = Some("中小企業".to_string());
        let document = render_enhanced(&info, &AiContent::default());

        assert!(document
            .contains("※この申請書は以下のキーワードを考慮して作成されています: IT導入, 中小企業"));
    }

    #[test]
    fn keyword_note_is_omitted_without_hints() {
        let document = render_enhanced(&full_info(), &AiContent::default());
        assert!(!document.contains("キーワードを考慮して"));
        assert!(document.contains(AI_DISCLAIMER));
    }
}
