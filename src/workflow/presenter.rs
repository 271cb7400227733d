//! 与界面的接口
//!
//! 核心只向界面发出展示命令，界面只向核心发送离散事件。

use crate::models::{ProblemImage, SolutionKind, VariantProblem};
use crate::services::{ClassificationEdit, CorrectionForm};

/// 学生触发的事件
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// 上传图片并请求分类
    Classify(ProblemImage),
    /// 修改分类表单
    Edit(ClassificationEdit),
    /// 确认分类
    CommitCorrection,
    /// 生成相似题
    Generate,
    /// 请求答案或讲解
    Solve(SolutionKind),
    /// 重新开始
    Reset,
}

/// 展示层
pub trait Presenter {
    /// 显示预填好的分类表单
    fn show_classification_form(&mut self, form: &CorrectionForm);

    /// 显示相似题（附题型说明）
    fn show_variant(&mut self, variant: &VariantProblem);

    fn show_solution(&mut self, kind: SolutionKind, text: &str);

    fn show_error(&mut self, message: &str);

    fn show_notice(&mut self, message: &str);
}
