//! Application-document generation, with optional AI enrichment.

use std::path::PathBuf;
use std::sync::Arc;

use hojokin_core::document::{self, AI_UNAVAILABLE_NOTICE};
use hojokin_core::subsidy::{AiContent, SubsidyInfo};
use tracing::{error, info};

use crate::content::request_ai_content;
use crate::error::AiContentError;
use crate::runtime::AgentRuntime;
use crate::spec;

/// A rendered document plus whether AI prose actually made it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnhancedDocument {
    pub template: String,
    pub ai_enhanced: bool,
}

pub struct ApplicationFormGenerator {
    runtime: Arc<AgentRuntime>,
    subsidies_spec_path: PathBuf,
}

impl ApplicationFormGenerator {
    pub fn new(runtime: Arc<AgentRuntime>, subsidies_spec_path: PathBuf) -> Self {
        Self { runtime, subsidies_spec_path }
    }

    /// The base template, filled from the record alone.
    pub fn generate(&self, info: &SubsidyInfo) -> String {
        document::render(info)
    }

    /// The AI-enhanced template.
    ///
    /// Never fails: when content generation errors out, the base template
    /// is returned with the unavailability notice appended.
    pub async fn generate_ai_enhanced(
        &self,
        info: &SubsidyInfo,
        business_description: &str,
    ) -> EnhancedDocument {
        match self.request_content(info, business_description).await {
            Ok(content) => {
                info!(
                    event_name = "application.enhanced",
                    title = info.title.as_deref().unwrap_or("unknown"),
                    "AI-enhanced application document generated"
                );
                EnhancedDocument {
                    template: document::render_enhanced(info, &content),
                    ai_enhanced: true,
                }
            }
            Err(generation_error) => {
                error!(
                    event_name = "application.enhancement_failed",
                    error = %generation_error,
                    "failed to generate AI-enhanced application"
                );
                let template = format!("{}\n\n{AI_UNAVAILABLE_NOTICE}", document::render(info));
                EnhancedDocument { template, ai_enhanced: false }
            }
        }
    }

    async fn request_content(
        &self,
        info: &SubsidyInfo,
        business_description: &str,
    ) -> Result<AiContent, AiContentError> {
        let tool = spec::subsidies_tool(&self.subsidies_spec_path).map_err(AiContentError::from)?;
        request_ai_content(&self.runtime, tool, info, business_description).await
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use hojokin_core::document::AI_UNAVAILABLE_NOTICE;
    use hojokin_core::subsidy::SubsidyInfo;
    use tempfile::TempDir;

    use super::{ApplicationFormGenerator, EnhancedDocument};
    use crate::platform::{RunError, RunStatus};
    use crate::runtime::{AgentRuntime, RuntimeOptions};
    use crate::testing::{assistant_message, run_with_status, MockPlatform};

    fn spec_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("subsidies.json");
        fs::write(
            &path,
            r#"{"openapi": "3.0.0", "info": {"title": "Subsidies API", "version": "1.0.0"}, "paths": {}}"#,
        )
        .expect("write spec");
        path
    }

    fn generator(platform: Arc<MockPlatform>, spec_path: PathBuf) -> ApplicationFormGenerator {
        let runtime = AgentRuntime::new(
            platform,
            RuntimeOptions {
                model: "gpt-4o".to_string(),
                poll_interval: Duration::from_millis(1),
                run_timeout: Duration::from_millis(50),
            },
        );
        ApplicationFormGenerator::new(Arc::new(runtime), spec_path)
    }

    fn info() -> SubsidyInfo {
        SubsidyInfo {
            title: Some("小規模事業者持続化補助金".to_string()),
            subsidy_max_limit: Some(2_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn base_generation_is_pure_rendering() {
        let platform = Arc::new(MockPlatform::default());
        let dir = TempDir::new().expect("tempdir");
        let generator = generator(platform, spec_file(&dir));

        let document = generator.generate(&info());
        assert!(document.contains("【申請書類：小規模事業者持続化補助金】"));
        assert!(document.contains("補助上限額：200万円"));
    }

    #[tokio::test]
    async fn successful_content_generation_enhances_the_document() {
        let platform =
            Arc::new(MockPlatform::with_run_states(vec![run_with_status(RunStatus::Completed)]));
        platform.push_message(assistant_message(
            "```json\n{\"application_reason\": \"販路拡大と売上回復のためです。\"}\n```",
            vec![],
        ));
        let dir = TempDir::new().expect("tempdir");
        let generator = generator(platform, spec_file(&dir));

        let EnhancedDocument { template, ai_enhanced } =
            generator.generate_ai_enhanced(&info(), "地域密着の小売業").await;

        assert!(ai_enhanced);
        assert!(template.contains("■申請理由：\n販路拡大と売上回復のためです。"));
        assert!(template.contains("※このテンプレートは生成AIによって作成されました。"));
    }

    #[tokio::test]
    async fn failed_run_falls_back_to_the_base_template() {
        let mut failed = run_with_status(RunStatus::Failed);
        failed.last_error = Some(RunError { code: None, message: "モデル過負荷".to_string() });
        let platform = Arc::new(MockPlatform::with_run_states(vec![failed]));
        let dir = TempDir::new().expect("tempdir");
        let generator = generator(platform, spec_file(&dir));

        let EnhancedDocument { template, ai_enhanced } =
            generator.generate_ai_enhanced(&info(), "地域密着の小売業").await;

        assert!(!ai_enhanced);
        assert!(template.contains("【申請書類：小規模事業者持続化補助金】"));
        assert!(template.contains("[ここに補助金申請の具体的な理由を記入してください。例："));
        assert!(template.ends_with(AI_UNAVAILABLE_NOTICE));
    }

    #[tokio::test]
    async fn missing_spec_file_also_falls_back() {
        let platform =
            Arc::new(MockPlatform::with_run_states(vec![run_with_status(RunStatus::Completed)]));
        let generator = generator(platform, PathBuf::from("/nonexistent/subsidies.json"));

        let EnhancedDocument { template, ai_enhanced } =
            generator.generate_ai_enhanced(&info(), "地域密着の小売業").await;

        assert!(!ai_enhanced);
        assert!(template.ends_with(AI_UNAVAILABLE_NOTICE));
    }
}
