//! 辅导流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整辅导流程
//!
//! 流程顺序：
//! 1. 上传图片 → 分类（一次 Vision 调用）
//! 2. 学生修改并确认分类（本地）
//! 3. 生成相似题（一次文本调用）
//! 4. 按需生成答案 / 讲解（每次一次文本调用）
//!
//! 每一步失败都只展示错误，会话状态保持失败前的样子。

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::CompletionClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ProblemImage, SolutionKind, Taxonomy};
use crate::services::{
    ClassificationEdit, ClassificationService, CorrectionForm, SolutionService, VariantService,
};
use crate::workflow::presenter::{Presenter, UserEvent};
use crate::workflow::session_state::{ClassificationOrigin, PipelineStage, SessionState};

/// 辅导流程
///
/// - 独占会话状态，所有状态迁移都经过 `SessionState`
/// - 只依赖业务能力（services）
/// - 一次只处理一个事件
pub struct TutorFlow {
    taxonomy: Arc<Taxonomy>,
    classifier: ClassificationService,
    variants: VariantService,
    solver: SolutionService,
    session: SessionState,
    form: Option<CorrectionForm>,
}

impl TutorFlow {
    pub fn new(config: &Config, client: Arc<dyn CompletionClient>, taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            classifier: ClassificationService::new(
                client.clone(),
                taxonomy.clone(),
                config.classification_policy,
                config.classify_temperature,
            ),
            variants: VariantService::new(client.clone(), config.generate_temperature),
            solver: SolutionService::new(client, config.solve_temperature),
            taxonomy,
            session: SessionState::new(),
            form: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// 当前的修改表单（分类成功后才有）
    pub fn form(&self) -> Option<&CorrectionForm> {
        self.form.as_ref()
    }

    /// 处理一个事件，并把结果或错误交给展示层
    pub async fn handle(&mut self, event: UserEvent, presenter: &mut dyn Presenter) -> AppResult<()> {
        let result = match event {
            UserEvent::Classify(image) => self.classify(image).await.map(|_| {
                if let Some(form) = &self.form {
                    presenter.show_classification_form(form);
                }
            }),
            UserEvent::Edit(edit) => self.edit(&edit).map(|_| {
                if let Some(form) = &self.form {
                    presenter.show_classification_form(form);
                }
            }),
            UserEvent::CommitCorrection => self.commit_correction().map(|_| {
                presenter.show_notice("✅ 분석 결과가 확정되었습니다.");
            }),
            UserEvent::Generate => self.generate().await.map(|_| {
                if let Some(variant) = self.session.variant() {
                    presenter.show_variant(variant);
                }
            }),
            UserEvent::Solve(kind) => self.solve(kind).await.map(|_| {
                if let Some(text) = self.session.solution().and_then(|s| s.get(kind)) {
                    presenter.show_solution(kind, text);
                }
            }),
            UserEvent::Reset => {
                self.reset();
                presenter.show_notice("🔄 처음부터 다시 시작합니다.");
                Ok(())
            }
        };

        if let Err(e) = &result {
            match e {
                AppError::Service(_) => error!("❌ {}", e),
                _ => warn!("⚠️ {}", e),
            }
            presenter.show_error(&e.user_message());
        }

        result
    }

    /// 分类阶段：成功后重建修改表单，失败时什么都不改
    pub async fn classify(&mut self, image: ProblemImage) -> AppResult<()> {
        info!("🔍 正在分析题目图片 ({} 字节)...", image.len());

        let classification = self.classifier.classify(&image).await?;
        drop(image);

        self.form = Some(CorrectionForm::new(self.taxonomy.clone(), &classification));
        self.session
            .commit_classification(classification, ClassificationOrigin::Model);

        info!("✓ 当前阶段: {}", self.session.stage());
        Ok(())
    }

    /// 修改表单（不影响已提交的分类）
    pub fn edit(&mut self, edit: &ClassificationEdit) -> AppResult<()> {
        let current = self.session.stage();
        let form = self
            .form
            .as_mut()
            .ok_or_else(|| AppError::out_of_order(PipelineStage::Classified, current))?;

        form.apply(edit)?;
        Ok(())
    }

    /// 确认分类：覆盖会话中的分类，并清掉旧的相似题和解答
    pub fn commit_correction(&mut self) -> AppResult<()> {
        let current = self.session.stage();
        let form = self
            .form
            .as_ref()
            .ok_or_else(|| AppError::out_of_order(PipelineStage::Classified, current))?;

        let classification = form.commit()?;
        if self.session.variant().is_some() {
            info!("分类重新确认，丢弃旧的相似题和解答");
        }
        self.session
            .commit_classification(classification, ClassificationOrigin::Learner);

        info!("✓ 分类已确认: {}", self.committed_summary());
        Ok(())
    }

    /// 相似题阶段
    pub async fn generate(&mut self) -> AppResult<()> {
        self.session.ensure_reached(PipelineStage::Corrected)?;
        let classification = self
            .session
            .classification()
            .cloned()
            .ok_or_else(|| AppError::out_of_order(PipelineStage::Corrected, self.session.stage()))?;

        if self
            .form
            .as_ref()
            .is_some_and(|form| form.differs_from(&classification))
        {
            warn!("⚠️ 表单有未确认的修改，按已确认的分类出题");
        }

        info!("🧩 正在生成相似题...");
        let variant = self
            .variants
            .generate(&classification, self.session.classification_revision())
            .await?;
        self.session.commit_variant(variant)?;

        Ok(())
    }

    /// 解答阶段
    pub async fn solve(&mut self, kind: SolutionKind) -> AppResult<()> {
        self.session.ensure_reached(PipelineStage::Generated)?;
        let variant = self
            .session
            .variant()
            .cloned()
            .ok_or_else(|| AppError::out_of_order(PipelineStage::Generated, self.session.stage()))?;

        info!("✅ 正在生成{}...", kind.label());
        let part = self
            .solver
            .solve(&variant, self.session.variant_revision(), kind)
            .await?;
        self.session.commit_solution(part)?;

        Ok(())
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.form = None;
        info!("🔄 会话已重置");
    }

    fn committed_summary(&self) -> String {
        self.session
            .classification()
            .map(|c| c.to_string())
            .unwrap_or_default()
    }
}
