//! Narrative-content generation for application documents.
//!
//! Builds the generation prompt from the subsidy record, sends it through
//! the subsidy-search agent, and parses the reply into [`AiContent`]. The
//! reply format is unreliable: JSON in a fenced block, bare JSON, or
//! loosely labeled prose all occur in practice.

use hojokin_core::currency::format_currency;
use hojokin_core::subsidy::{AiContent, SubsidyInfo, NARRATIVE_SECTION_KEYS};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

use crate::error::AiContentError;
use crate::runtime::{AgentRuntime, ToolDescriptor};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid pattern"));

/// Requests the six narrative sections from the agent platform.
///
/// Remote and parse failures are logged here and wrapped as
/// [`AiContentError`]; the caller decides whether to fall back.
pub async fn request_ai_content(
    runtime: &AgentRuntime,
    tool: ToolDescriptor,
    info: &SubsidyInfo,
    business_description: &str,
) -> Result<AiContent, AiContentError> {
    let prompt = build_prompt(info, business_description);
    let reply = runtime.ask(&prompt, Some(tool)).await.map_err(|source| {
        let wrapped = AiContentError::from(source);
        error!(event_name = "content.request_failed", error = %wrapped, "AI content generation error");
        wrapped
    })?;

    parse_ai_content(&reply.text).map_err(|parse_error| {
        error!(event_name = "content.parse_failed", error = %parse_error, "AI content generation error");
        parse_error
    })
}

/// The fixed-structure generation prompt.
pub fn build_prompt(info: &SubsidyInfo, business_description: &str) -> String {
    let title = info.title.as_deref().unwrap_or("不明");
    let summary = info.summary.as_deref().unwrap_or("情報なし");
    let target_field = info.target_field.as_deref().unwrap_or("情報なし");
    let target_type = info.target_type.as_deref().unwrap_or("情報なし");
    let limit = info
        .subsidy_max_limit
        .map(format_currency)
        .unwrap_or_else(|| "情報なし".to_string());

    format!(
        "補助金申請書の主要セクションの内容を生成してください。以下の補助金情報とビジネス概要に基づいて、申請に適した内容を作成してください。\n\
         \n\
         ## 補助金情報\n\
         - 名称: {title}\n\
         - 概要: {summary}\n\
         - 対象分野: {target_field}\n\
         - 対象者: {target_type}\n\
         - 補助上限額: {limit}\n\
         \n\
         ## ビジネス概要\n\
         {business_description}\n\
         \n\
         以下の各セクションの内容を、明確かつ説得力のある形で日本語で生成してください：\n\
         \n\
         1. application_reason: 申請理由（事業の現状と課題、補助金活用の目的）\n\
         2. business_plan: 事業計画の概要（実現可能性、革新性、市場性、社会的意義）\n\
         3. implementation_structure: 実施体制（担当者の役割や外部との連携）\n\
         4. schedule: 実施スケジュール（主要なマイルストーン）\n\
         5. budget_plan: 予算計画（主要な費目と金額）\n\
         6. expected_effects: 期待される効果（定量的・定性的な効果）\n\
         \n\
         それぞれのセクションは具体的かつ簡潔に、150字程度で記述してください。JSONフォーマットで返答してください。"
    )
}

/// Parses an agent reply into narrative content.
///
/// Order: a fenced ```json block, then the whole reply as JSON, then
/// line-oriented extraction by section label. A fenced block that is not
/// valid JSON is an error rather than a fallthrough.
pub fn parse_ai_content(response: &str) -> Result<AiContent, AiContentError> {
    if let Some(caps) = FENCED_JSON.captures(response) {
        let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        return serde_json::from_str(block)
            .map_err(|source| AiContentError::new(format!("fenced JSON block is invalid: {source}")));
    }

    if let Ok(content) = serde_json::from_str::<AiContent>(response.trim()) {
        return Ok(content);
    }

    Ok(labeled_sections(response))
}

fn labeled_sections(response: &str) -> AiContent {
    let mut content = AiContent::default();
    for key in NARRATIVE_SECTION_KEYS {
        let pattern =
            Regex::new(&format!(r"(?s){key}[:：]\s*(.*?)(?:\n\n|\z)")).expect("valid pattern");
        let value = pattern
            .captures(response)
            .map(|caps| caps[1].trim().to_string())
            .filter(|section| !section.is_empty())
            .unwrap_or_else(|| format!("{key}の情報は生成できませんでした。"));
        content.set(key, value);
    }
    content
}
