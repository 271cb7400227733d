//! 相似题生成服务 - 业务能力层
//!
//! 只负责"按已确定的分类出一道新题"。生成的是自然语言文本，
//! 除非为空否则不做结构校验。

use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{CompletionClient, CompletionRequest};
use crate::error::{AppResult, GenerationError};
use crate::models::{Classification, VariantProblem};
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = "너는 중학교 수학 문제를 출제하는 교사야.";

/// 相似题生成服务
pub struct VariantService {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
}

impl VariantService {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }

    /// 生成一道相似题
    ///
    /// # 参数
    /// - `classification`: 已提交的分类
    /// - `classification_revision`: 该分类的提交版本，写入结果用于过期检查
    pub async fn generate(
        &self,
        classification: &Classification,
        classification_revision: u64,
    ) -> AppResult<VariantProblem> {
        let request = CompletionRequest::text(build_instruction(classification))
            .with_system_message(SYSTEM_MESSAGE)
            .with_temperature(self.temperature);

        let text = self.client.complete(request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        debug!("相似题: {}", truncate_text(text, 120));
        info!("✓ 相似题生成完成 ({} 字)", text.chars().count());

        Ok(VariantProblem::new(
            text,
            classification.clone(),
            classification_revision,
        ))
    }
}

/// 把分类作为硬性约束写进指令
fn build_instruction(classification: &Classification) -> String {
    let core_concept = classification
        .core_concept
        .as_deref()
        .unwrap_or("(문제 유형과 동일)");

    format!(
        r#"다음 조건을 반드시 지켜 유사 문제를 만들어라.

- 학년: {}
- 대단원: {}
- 소단원: {}
- 문제 유형: {}
- 핵심 개념: {}

⚠️ 위 학년·대단원·소단원·문제 유형을 벗어나지 마라. 더 넓은 개념이나 다른 개념으로 바꾸지 마라.
⚠️ 원 문제와 동일한 개념·유형을 유지하되, 수나 조건만 살짝 바꾼 문제를 정확히 1문제만 출제하라.
⚠️ 문제만 출력하라. 정답이나 풀이는 절대 포함하지 마라."#,
        classification.grade,
        classification.unit,
        classification.sub_unit,
        classification.problem_type,
        core_concept
    )
}
