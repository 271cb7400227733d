//! 解答服务 - 业务能力层
//!
//! 按需为相似题生成"只要答案"或"答案 + 分步讲解"，两种请求互相独立。
//! 每次都是只包含相似题文本的新请求，不复用分类时的对话。

use std::sync::Arc;
use tracing::info;

use crate::clients::{CompletionClient, CompletionRequest};
use crate::error::{AppResult, SolutionError};
use crate::models::{SolutionKind, SolutionPart, VariantProblem};

/// 解答服务
pub struct SolutionService {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
}

impl SolutionService {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }

    pub async fn solve(
        &self,
        variant: &VariantProblem,
        variant_revision: u64,
        kind: SolutionKind,
    ) -> AppResult<SolutionPart> {
        let request = CompletionRequest::text(build_instruction(variant, kind))
            .with_temperature(self.temperature);

        let text = self.client.complete(request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SolutionError::EmptyResponse { part: kind.label() }.into());
        }

        info!("✓ {}生成完成 ({} 字)", kind.label(), text.chars().count());

        Ok(SolutionPart {
            kind,
            text: text.to_string(),
            variant_revision,
        })
    }
}

fn build_instruction(variant: &VariantProblem, kind: SolutionKind) -> String {
    let task = match kind {
        SolutionKind::AnswerOnly => "다음 문제의 정답만 구하라.",
        SolutionKind::Walkthrough => "다음 문제의 정답을 구하고 풀이를 단계별로 설명하라.",
    };
    let output_rule = match kind {
        SolutionKind::AnswerOnly => "- 풀이 과정 없이 최종 정답만 한 줄로 출력한다.",
        SolutionKind::Walkthrough => "- 먼저 정답을 밝히고, 이어서 풀이 과정을 단계별로 설명한다.",
    };

    format!(
        r#"{}

[문제]
{}

규칙:
- 숫자와 숫자의 곱셈은 × 기호를 쓴다. (예: 3 × 4)
- 숫자와 문자, 문자와 문자의 곱셈은 곱셈 기호를 생략한다. (예: 3a, ab)
- {} 학생 눈높이에 맞춰 설명한다.
{}"#,
        task, variant.text, variant.source.grade, output_rule
    )
}
