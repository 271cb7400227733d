//! 错误类型
//!
//! 每个阶段一个错误枚举，统一汇总到 [`AppError`]。
//! 阶段失败在 `TutorFlow` 边界被捕获，通过 [`AppError::user_message`] 转成给学生看的提示。

use thiserror::Error;

use crate::workflow::session_state::PipelineStage;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 题目分类失败
    #[error("分类错误: {0}")]
    Classification(#[from] ClassificationError),
    /// 学生修改的分类不合法
    #[error("修改错误: {0}")]
    Correction(#[from] CorrectionError),
    /// 相似题生成失败
    #[error("出题错误: {0}")]
    Generation(#[from] GenerationError),
    /// 解答生成失败
    #[error("解答错误: {0}")]
    Solution(#[from] SolutionError),
    /// LLM 服务调用失败
    #[error("服务错误: {0}")]
    Service(#[from] ServiceError),
    /// 阶段顺序错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
    /// 图片读取错误
    #[error("图片错误: {0}")]
    Image(#[from] ImageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 分类阶段错误
///
/// 每种模型输出问题对应一个独立的原因，方便定位和测试
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// JSON 解析失败
    #[error("模型输出不是合法的 JSON: {detail}")]
    MalformedJson { detail: String },
    /// 顶层不是对象
    #[error("模型输出不是 JSON 对象")]
    NotAnObject,
    /// 缺少必填字段
    #[error("缺少必填字段: {field}")]
    MissingField { field: &'static str },
    /// 字段类型错误
    #[error("字段 {field} 类型错误，期望 {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    /// 必填字段为空字符串
    #[error("字段 {field} 为空")]
    EmptyField { field: &'static str },
    /// 值不在课程体系内
    #[error("字段 {field} 的值 '{value}' 不在课程体系中")]
    OutsideTaxonomy { field: &'static str, value: String },
}

/// 修改阶段错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrectionError {
    /// 选择的值不在当前可选项中
    #[error("{field} 不能选择 '{value}'")]
    NotAnOption { field: &'static str, value: String },
    /// 题型为空
    #[error("题型不能为空")]
    EmptyProblemType,
    /// 提交时三元组校验失败
    #[error("课程节点无效: {grade} / {unit} / {sub_unit}")]
    InvalidNode {
        grade: String,
        unit: String,
        sub_unit: String,
    },
}

/// 相似题生成错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// 模型返回空文本
    #[error("LLM 返回的相似题为空")]
    EmptyResponse,
}

/// 解答生成错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolutionError {
    /// 模型返回空文本
    #[error("LLM 返回的{part}为空")]
    EmptyResponse { part: &'static str },
}

/// LLM 服务错误（对核心逻辑不透明）
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 请求构建失败
    #[error("请求构建失败: {message}")]
    InvalidRequest { message: String },
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回结果为空
    #[error("LLM返回结果为空 (模型: {model})")]
    EmptyChoices { model: String },
}

/// 阶段顺序错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// 前置阶段尚未完成
    #[error("当前阶段为 {current}，需要先完成 {required}")]
    OutOfOrder {
        required: PipelineStage,
        current: PipelineStage,
    },
    /// 相似题所依据的分类已被重新提交
    #[error("相似题所依据的分类已过期 (相似题版本 {found}, 当前版本 {current})")]
    StaleVariant { found: u64, current: u64 },
    /// 解答所依据的相似题已被替换
    #[error("解答所依据的相似题已过期 (解答版本 {found}, 当前版本 {current})")]
    StaleSolution { found: u64, current: u64 },
}

/// 图片错误
#[derive(Debug, Error)]
pub enum ImageError {
    /// 读取文件失败
    #[error("读取图片失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 不是 JPEG / PNG
    #[error("不支持的图片格式: {hint}")]
    Unsupported { hint: String },
    /// 图片数据为空
    #[error("图片数据为空")]
    Empty,
}

/// 配置错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少 API 密钥
    #[error("未设置 API 密钥 (OPENAI_API_KEY 或 LLM_API_KEY)")]
    MissingApiKey,
    /// 数值超出范围
    #[error("{name} 超出范围: {value}")]
    OutOfRange { name: String, value: String },
    /// 课程体系数据不合法
    #[error("课程体系不合法: {reason}")]
    InvalidTaxonomy { reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建阶段顺序错误
    pub fn out_of_order(required: PipelineStage, current: PipelineStage) -> Self {
        AppError::Workflow(WorkflowError::OutOfOrder { required, current })
    }

    /// 转换为给学生看的提示信息
    pub fn user_message(&self) -> String {
        match self {
            AppError::Classification(_) => {
                "❗ 문제 분석에 실패했습니다. 사진을 확인한 뒤 다시 시도해 주세요.".to_string()
            }
            AppError::Correction(CorrectionError::EmptyProblemType) => {
                "⚠️ 문제 유형을 입력해 주세요.".to_string()
            }
            AppError::Correction(CorrectionError::NotAnOption { value, .. }) => {
                format!("⚠️ '{}'은(는) 선택할 수 없는 항목입니다.", value)
            }
            AppError::Correction(CorrectionError::InvalidNode { .. }) => {
                "⚠️ 학년·대단원·소단원 조합이 교육과정과 맞지 않습니다.".to_string()
            }
            AppError::Generation(_) => "❗ 유사 문제 생성에 실패했습니다. 다시 시도해 주세요.".to_string(),
            AppError::Solution(_) => "❗ 풀이 생성에 실패했습니다. 다시 시도해 주세요.".to_string(),
            AppError::Service(_) => "❗ AI 서비스 호출에 실패했습니다. 잠시 후 다시 시도해 주세요.".to_string(),
            AppError::Workflow(WorkflowError::OutOfOrder { required, .. }) => match required {
                PipelineStage::Classified => "⚠️ 먼저 문제 이미지를 분석해 주세요.".to_string(),
                PipelineStage::Corrected => "⚠️ 먼저 분석 결과를 확정해 주세요.".to_string(),
                _ => "⚠️ 먼저 유사 문제를 출제해 주세요.".to_string(),
            },
            AppError::Workflow(_) => {
                "⚠️ 분류가 변경되어 이전 결과를 사용할 수 없습니다. 다시 진행해 주세요.".to_string()
            }
            AppError::Image(_) => "⚠️ 이미지를 읽을 수 없습니다 (JPG, PNG만 지원).".to_string(),
            AppError::Config(_) => "⚠️ OpenAI API 설정을 확인해 주세요.".to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
