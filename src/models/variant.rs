use chrono::{DateTime, Local};

use crate::models::classification::Classification;

/// 生成的相似题
#[derive(Debug, Clone, PartialEq)]
pub struct VariantProblem {
    pub text: String,
    /// 出题所依据的分类
    pub source: Classification,
    /// 出题时分类的提交版本
    pub classification_revision: u64,
    pub generated_at: DateTime<Local>,
}

impl VariantProblem {
    pub fn new(text: impl Into<String>, source: Classification, classification_revision: u64) -> Self {
        Self {
            text: text.into(),
            source,
            classification_revision,
            generated_at: Local::now(),
        }
    }
}

/// 解答的种类，两种可以分别请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionKind {
    /// 只要最终答案
    AnswerOnly,
    /// 答案 + 分步讲解
    Walkthrough,
}

impl SolutionKind {
    pub fn label(self) -> &'static str {
        match self {
            SolutionKind::AnswerOnly => "정답",
            SolutionKind::Walkthrough => "풀이",
        }
    }
}

/// 单次解答请求的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionPart {
    pub kind: SolutionKind,
    pub text: String,
    /// 对应的相似题版本
    pub variant_revision: u64,
}

/// 某道相似题的解答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub variant_revision: u64,
    pub answer: Option<String>,
    pub walkthrough: Option<String>,
}

impl Solution {
    pub fn new(variant_revision: u64) -> Self {
        Self {
            variant_revision,
            answer: None,
            walkthrough: None,
        }
    }

    pub fn get(&self, kind: SolutionKind) -> Option<&str> {
        match kind {
            SolutionKind::AnswerOnly => self.answer.as_deref(),
            SolutionKind::Walkthrough => self.walkthrough.as_deref(),
        }
    }

    pub(crate) fn insert(&mut self, kind: SolutionKind, text: String) {
        match kind {
            SolutionKind::AnswerOnly => self.answer = Some(text),
            SolutionKind::Walkthrough => self.walkthrough = Some(text),
        }
    }
}
