//! # Math Tutor
//!
//! 中学数学 AI 辅导：拍照上传题目 → 按课程体系分类 → 学生修正 → 生成同类相似题 → 按需给出答案和讲解
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 与补全服务的唯一接缝
//! - `CompletionClient` - 补全能力 trait
//! - `OpenAiCompletionClient` - 基于 async-openai 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不持有会话状态
//! - `ClassificationService` - 看图分类 + 严格解析
//! - `CorrectionForm` - 分类修改表单
//! - `VariantService` - 相似题生成
//! - `SolutionService` - 答案 / 讲解生成
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一次辅导的完整流程
//! - `SessionState` - 阶段与产物，统一处理下游失效
//! - `TutorFlow` - 事件处理（classify → correct → generate → solve）
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{CompletionClient, CompletionRequest, OpenAiCompletionClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Classification, ProblemImage, SolutionKind, Taxonomy, VariantProblem};
pub use services::{ClassificationEdit, CorrectionForm};
pub use workflow::{PipelineStage, Presenter, SessionState, TutorFlow, UserEvent};
