//! 题目分类服务 - 业务能力层
//!
//! 只负责"看图分类"能力：构建指令 → 调用 Vision 模型 → 严格解析 JSON。
//! 不接触会话状态，失败时由流程层决定如何展示。

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::{CompletionClient, CompletionRequest};
use crate::error::{AppResult, ClassificationError};
use crate::models::{Classification, ClassificationPolicy, ProblemImage, Taxonomy};
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = "너는 대한민국 중학교 수학 교과 과정을 정확히 알고 있는 AI 교사야.";

/// 题目分类服务
pub struct ClassificationService {
    client: Arc<dyn CompletionClient>,
    taxonomy: Arc<Taxonomy>,
    policy: ClassificationPolicy,
    temperature: f32,
}

impl ClassificationService {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        taxonomy: Arc<Taxonomy>,
        policy: ClassificationPolicy,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            taxonomy,
            policy,
            temperature,
        }
    }

    /// 对题目图片进行分类
    pub async fn classify(&self, image: &ProblemImage) -> AppResult<Classification> {
        let request = CompletionRequest::text(self.build_instruction())
            .with_system_message(SYSTEM_MESSAGE)
            .with_image(image)
            .with_temperature(self.temperature);

        let raw = self.client.complete(request).await?;
        debug!("分类原始输出: {}", truncate_text(&raw, 200));

        let classification = parse_classification(&raw, &self.taxonomy, self.policy)?;
        info!("✓ 分类完成: {}", classification);

        Ok(classification)
    }

    /// 构建分类指令（附带完整课程目录，要求只输出 JSON）
    fn build_instruction(&self) -> String {
        format!(
            r#"주어진 문제 이미지를 보고 아래 교육과정 목록에서 가장 알맞은 단원을 골라 다음 형식의 JSON 객체 하나만 출력해.
설명, 인사말, 코드 블록 없이 JSON만 출력해.

{{
  "grade": "학년 (목록의 이름 그대로)",
  "unit": "대단원명 (목록의 이름 그대로)",
  "sub_unit": "소단원명 (목록의 이름 그대로)",
  "problem_type": "구체적인 문제 유형 (예: 정비례 관계인지 판단하기)",
  "core_concept": "핵심 개념 (선택)"
}}

[교육과정 목록]
{}

⚠️ grade, unit, sub_unit 값은 반드시 위 목록에 있는 이름 중에서만 골라.
⚠️ 반드시 실제 교과 단원 체계에 맞게 가장 적합한 것으로 판단해."#,
            self.taxonomy.outline()
        )
    }
}

/// 去掉 markdown 代码块包裹
///
/// 输出中有代码块时取第一个代码块的内容，前后的说明文字一并丢弃。
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Ok(re) = Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```") {
        if let Some(body) = re.captures(trimmed).and_then(|caps| caps.get(1)) {
            return body.as_str();
        }
    }
    trimmed
}

/// 严格解析模型输出
///
/// 依次检查：JSON 语法 → 顶层对象 → 必填字段存在 → 字段类型 → 非空 → 课程体系成员。
pub fn parse_classification(
    raw: &str,
    taxonomy: &Taxonomy,
    policy: ClassificationPolicy,
) -> Result<Classification, ClassificationError> {
    let body = strip_code_fence(raw);

    let value: Value =
        serde_json::from_str(body).map_err(|e| ClassificationError::MalformedJson {
            detail: e.to_string(),
        })?;
    let object = value.as_object().ok_or(ClassificationError::NotAnObject)?;

    let grade = required_str(object, "grade")?;
    let unit = required_str(object, "unit")?;
    let sub_unit = required_str(object, "sub_unit")?;
    let problem_type = required_str(object, "problem_type")?;
    let core_concept = optional_str(object, "core_concept")?;

    let (grade, unit, sub_unit) = match policy {
        ClassificationPolicy::Strict => {
            if !taxonomy.contains_grade(grade) {
                return Err(outside("grade", grade));
            }
            if !taxonomy.contains_unit(grade, unit) {
                return Err(outside("unit", unit));
            }
            if !taxonomy.is_valid(grade, unit, sub_unit) {
                return Err(outside("sub_unit", sub_unit));
            }
            (grade, unit, sub_unit)
        }
        ClassificationPolicy::Coerce => {
            let node = taxonomy.clamp(grade, unit, sub_unit);
            if (node.grade, node.unit, node.sub_unit) != (grade, unit, sub_unit) {
                warn!(
                    "⚠️ 分类超出课程体系，已收敛: {} / {} / {} → {} / {} / {}",
                    grade, unit, sub_unit, node.grade, node.unit, node.sub_unit
                );
            }
            (node.grade, node.unit, node.sub_unit)
        }
    };

    Ok(Classification {
        grade: grade.to_string(),
        unit: unit.to_string(),
        sub_unit: sub_unit.to_string(),
        problem_type: problem_type.to_string(),
        core_concept: core_concept.map(str::to_string),
    })
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ClassificationError> {
    let value = object
        .get(field)
        .ok_or(ClassificationError::MissingField { field })?;
    let text = value.as_str().ok_or(ClassificationError::WrongType {
        field,
        expected: "string",
    })?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ClassificationError::EmptyField { field });
    }
    Ok(text)
}

fn optional_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ClassificationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => {
            let text = text.trim();
            Ok((!text.is_empty()).then_some(text))
        }
        Some(_) => Err(ClassificationError::WrongType {
            field,
            expected: "string or null",
        }),
    }
}

fn outside(field: &'static str, value: &str) -> ClassificationError {
    ClassificationError::OutsideTaxonomy {
        field,
        value: value.to_string(),
    }
}
