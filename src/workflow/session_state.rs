//! 会话状态
//!
//! 持有当前阶段和各阶段产物。每种状态迁移只有一个入口，
//! 上游重新提交时由这里统一清理下游产物，调用方不能单独清字段。

use std::fmt::Display;

use crate::error::WorkflowError;
use crate::models::{Classification, Solution, SolutionPart, VariantProblem};

/// 流程阶段（有序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PipelineStage {
    #[default]
    None,
    Classified,
    Corrected,
    Generated,
    Solved,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::None => "none",
            PipelineStage::Classified => "classified",
            PipelineStage::Corrected => "corrected",
            PipelineStage::Generated => "generated",
            PipelineStage::Solved => "solved",
        };
        f.write_str(name)
    }
}

/// 分类的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationOrigin {
    /// 模型给出的分类
    Model,
    /// 学生确认或修改后的分类
    Learner,
}

/// 会话状态
#[derive(Debug, Default)]
pub struct SessionState {
    stage: PipelineStage,
    classification: Option<Classification>,
    variant: Option<VariantProblem>,
    solution: Option<Solution>,
    /// 每次提交分类递增
    classification_revision: u64,
    /// 每次提交相似题递增
    variant_revision: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn variant(&self) -> Option<&VariantProblem> {
        self.variant.as_ref()
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn classification_revision(&self) -> u64 {
        self.classification_revision
    }

    pub fn variant_revision(&self) -> u64 {
        self.variant_revision
    }

    /// 当前阶段至少达到 `required`
    pub fn ensure_reached(&self, required: PipelineStage) -> Result<(), WorkflowError> {
        if self.stage >= required {
            Ok(())
        } else {
            Err(WorkflowError::OutOfOrder {
                required,
                current: self.stage,
            })
        }
    }

    /// 提交分类：清空相似题和解答
    pub fn commit_classification(
        &mut self,
        classification: Classification,
        origin: ClassificationOrigin,
    ) {
        self.discard_after(PipelineStage::Corrected);
        self.classification = Some(classification);
        self.classification_revision += 1;
        self.stage = match origin {
            ClassificationOrigin::Model => PipelineStage::Classified,
            ClassificationOrigin::Learner => PipelineStage::Corrected,
        };
    }

    /// 提交相似题：清空解答
    ///
    /// 要求分类已确认，且相似题是基于当前版本的分类生成的。
    pub fn commit_variant(&mut self, variant: VariantProblem) -> Result<(), WorkflowError> {
        self.ensure_reached(PipelineStage::Corrected)?;
        if variant.classification_revision != self.classification_revision {
            return Err(WorkflowError::StaleVariant {
                found: variant.classification_revision,
                current: self.classification_revision,
            });
        }

        self.discard_after(PipelineStage::Corrected);
        self.variant = Some(variant);
        self.variant_revision += 1;
        self.stage = PipelineStage::Generated;
        Ok(())
    }

    /// 提交解答的一部分（答案或讲解）
    pub fn commit_solution(&mut self, part: SolutionPart) -> Result<(), WorkflowError> {
        self.ensure_reached(PipelineStage::Generated)?;
        if part.variant_revision != self.variant_revision {
            return Err(WorkflowError::StaleSolution {
                found: part.variant_revision,
                current: self.variant_revision,
            });
        }

        let revision = self.variant_revision;
        self.solution
            .get_or_insert_with(|| Solution::new(revision))
            .insert(part.kind, part.text);
        self.stage = PipelineStage::Solved;
        Ok(())
    }

    /// 回到初始状态（版本号保持递增）
    pub fn reset(&mut self) {
        self.discard_after(PipelineStage::None);
        self.stage = PipelineStage::None;
    }

    /// 清空 `stage` 之后各阶段的产物
    fn discard_after(&mut self, stage: PipelineStage) {
        if stage < PipelineStage::Classified {
            self.classification = None;
        }
        if stage < PipelineStage::Generated {
            self.variant = None;
        }
        self.solution = None;
    }
}
