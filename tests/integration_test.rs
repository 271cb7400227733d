use std::sync::Arc;

use math_tutor::clients::ScriptedCompletionClient;
use math_tutor::config::Config;
use math_tutor::error::{AppError, ClassificationError, SolutionError, WorkflowError};
use math_tutor::models::{ClassificationPolicy, MediaType, ProblemImage, SolutionKind, Taxonomy, VariantProblem};
use math_tutor::services::{ClassificationEdit, CorrectionForm};
use math_tutor::workflow::{PipelineStage, Presenter, TutorFlow, UserEvent};

const CLASSIFIED: &str = r#"```json
{"grade":"1학년","unit":"1. 소인수분해","sub_unit":"1.2 소인수분해","problem_type":"최대공약수 구하기","core_concept":"공약수"}
```"#;

const VARIANT: &str = "두 수 18과 24의 최대공약수를 구하시오.";

/// 记录展示命令
#[derive(Default)]
struct RecordingPresenter {
    forms: Vec<(String, String, String, String)>,
    variants: Vec<String>,
    solutions: Vec<(SolutionKind, String)>,
    errors: Vec<String>,
    notices: Vec<String>,
}

impl Presenter for RecordingPresenter {
    fn show_classification_form(&mut self, form: &CorrectionForm) {
        self.forms.push((
            form.grade().to_string(),
            form.unit().to_string(),
            form.sub_unit().to_string(),
            form.problem_type().to_string(),
        ));
    }

    fn show_variant(&mut self, variant: &VariantProblem) {
        self.variants.push(variant.text.clone());
    }

    fn show_solution(&mut self, kind: SolutionKind, text: &str) {
        self.solutions.push((kind, text.to_string()));
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

fn test_config() -> Config {
    Config {
        llm_api_key: "test-key".to_string(),
        ..Config::default()
    }
}

fn setup(config: &Config) -> (Arc<ScriptedCompletionClient>, TutorFlow, RecordingPresenter) {
    let client = Arc::new(ScriptedCompletionClient::new());
    let flow = TutorFlow::new(config, client.clone(), Arc::new(Taxonomy::builtin()));
    (client, flow, RecordingPresenter::default())
}

fn photo() -> ProblemImage {
    ProblemImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10], MediaType::Jpeg).unwrap()
}

/// 走到 generated 阶段（相似题已生成）
async fn run_to_generated(client: &ScriptedCompletionClient, flow: &mut TutorFlow, presenter: &mut RecordingPresenter) {
    client.push_reply(CLASSIFIED).push_reply(VARIANT);

    flow.handle(UserEvent::Classify(photo()), presenter).await.unwrap();
    flow.handle(UserEvent::CommitCorrection, presenter).await.unwrap();
    flow.handle(UserEvent::Generate, presenter).await.unwrap();
}

/// 走到 solved 阶段（讲解已生成）
async fn run_to_solved(client: &ScriptedCompletionClient, flow: &mut TutorFlow, presenter: &mut RecordingPresenter) {
    client
        .push_reply(CLASSIFIED)
        .push_reply(VARIANT)
        .push_reply("정답: 6\n1단계: 18 = 2 × 3², 24 = 2³ × 3");

    flow.handle(UserEvent::Classify(photo()), presenter).await.unwrap();
    flow.handle(UserEvent::CommitCorrection, presenter).await.unwrap();
    flow.handle(UserEvent::Generate, presenter).await.unwrap();
    flow.handle(UserEvent::Solve(SolutionKind::Walkthrough), presenter)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_tutoring_session() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_solved(&client, &mut flow, &mut presenter).await;

    assert_eq!(flow.session().stage(), PipelineStage::Solved);
    assert_eq!(
        presenter.forms,
        vec![(
            "1학년".to_string(),
            "1. 소인수분해".to_string(),
            "1.2 소인수분해".to_string(),
            "최대공약수 구하기".to_string(),
        )]
    );
    assert_eq!(presenter.variants, vec![VARIANT.to_string()]);
    assert_eq!(presenter.solutions.len(), 1);
    assert!(presenter.solutions[0].1.starts_with("정답: 6"));
    assert!(presenter.errors.is_empty());

    // 三次调用：分类带图片，其余两次只有文本
    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].image_media_type, Some(MediaType::Jpeg));
    assert_eq!(requests[0].temperature, Some(0.1));
    assert!(requests[1].image_media_type.is_none());
    assert!(requests[1].instruction.contains("최대공약수 구하기"));
    assert_eq!(requests[1].temperature, Some(0.3));
    assert!(requests[2].instruction.contains(VARIANT));
    assert_eq!(requests[2].temperature, Some(0.2));
}

#[tokio::test]
async fn test_malformed_json_leaves_session_untouched() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    client.push_reply("죄송하지만 이 문제는 1학년 소인수분해 단원입니다.");

    let result = flow.handle(UserEvent::Classify(photo()), &mut presenter).await;

    assert!(matches!(
        result,
        Err(AppError::Classification(ClassificationError::MalformedJson { .. }))
    ));
    assert_eq!(flow.session().stage(), PipelineStage::None);
    assert!(flow.session().classification().is_none());
    assert!(flow.form().is_none());
    assert_eq!(presenter.errors.len(), 1);
    assert!(presenter.forms.is_empty());
}

#[tokio::test]
async fn test_reclassify_after_solved_discards_downstream() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_solved(&client, &mut flow, &mut presenter).await;

    client.push_reply(
        r#"{"grade":"2학년","unit":"1. 유리수와 순환소수","sub_unit":"1.2 순환소수","problem_type":"순환소수를 분수로 나타내기"}"#,
    );
    flow.handle(UserEvent::Classify(photo()), &mut presenter)
        .await
        .unwrap();

    let session = flow.session();
    assert_eq!(session.stage(), PipelineStage::Classified);
    assert!(session.variant().is_none());
    assert!(session.solution().is_none());
    assert_eq!(session.classification().unwrap().grade, "2학년");
}

#[tokio::test]
async fn test_service_failure_keeps_previous_state() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    client.push_reply(CLASSIFIED);
    flow.handle(UserEvent::Classify(photo()), &mut presenter)
        .await
        .unwrap();
    flow.handle(UserEvent::CommitCorrection, &mut presenter)
        .await
        .unwrap();

    client.push_failure("connection reset");
    let result = flow.handle(UserEvent::Generate, &mut presenter).await;

    assert!(matches!(result, Err(AppError::Service(_))));
    assert_eq!(flow.session().stage(), PipelineStage::Corrected);
    assert!(flow.session().variant().is_none());
    assert_eq!(presenter.errors.len(), 1);
}

#[tokio::test]
async fn test_generate_requires_committed_classification() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    client.push_reply(CLASSIFIED);
    flow.handle(UserEvent::Classify(photo()), &mut presenter)
        .await
        .unwrap();

    let result = flow.handle(UserEvent::Generate, &mut presenter).await;

    assert!(matches!(
        result,
        Err(AppError::Workflow(WorkflowError::OutOfOrder {
            required: PipelineStage::Corrected,
            current: PipelineStage::Classified,
        }))
    ));
    // 没有发出生成请求
    assert_eq!(client.requests().len(), 1);
    assert_eq!(presenter.errors.len(), 1);
}

#[tokio::test]
async fn test_solve_before_generate_is_rejected() {
    let (_client, mut flow, mut presenter) = setup(&test_config());

    let result = flow
        .handle(UserEvent::Solve(SolutionKind::AnswerOnly), &mut presenter)
        .await;

    assert!(matches!(result, Err(AppError::Workflow(WorkflowError::OutOfOrder { .. }))));
    assert!(flow.session().solution().is_none());
}

#[tokio::test]
async fn test_edit_then_commit_discards_variant() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_solved(&client, &mut flow, &mut presenter).await;

    // 只改表单，不影响已生成的内容
    flow.handle(
        UserEvent::Edit(ClassificationEdit::problem_type("공약수 구하기")),
        &mut presenter,
    )
    .await
    .unwrap();
    assert_eq!(flow.session().stage(), PipelineStage::Solved);
    assert!(flow.session().variant().is_some());

    flow.handle(UserEvent::CommitCorrection, &mut presenter)
        .await
        .unwrap();

    let session = flow.session();
    assert_eq!(session.stage(), PipelineStage::Corrected);
    assert!(session.variant().is_none());
    assert!(session.solution().is_none());
    assert_eq!(session.classification().unwrap().problem_type, "공약수 구하기");
}

#[tokio::test]
async fn test_changing_grade_resets_dependent_fields() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    client.push_reply(CLASSIFIED);
    flow.handle(UserEvent::Classify(photo()), &mut presenter)
        .await
        .unwrap();

    flow.handle(UserEvent::Edit(ClassificationEdit::grade("3학년")), &mut presenter)
        .await
        .unwrap();

    let form = flow.form().unwrap();
    let taxonomy = Taxonomy::builtin();
    assert_eq!(form.grade(), "3학년");
    assert!(taxonomy.is_valid(form.grade(), form.unit(), form.sub_unit()));

    let result = flow
        .handle(UserEvent::Edit(ClassificationEdit::grade("4학년")), &mut presenter)
        .await;
    assert!(matches!(result, Err(AppError::Correction(_))));
    assert_eq!(flow.form().unwrap().grade(), "3학년");
}

#[tokio::test]
async fn test_answer_and_walkthrough_are_independent() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_solved(&client, &mut flow, &mut presenter).await;

    client.push_reply("6");
    flow.handle(UserEvent::Solve(SolutionKind::AnswerOnly), &mut presenter)
        .await
        .unwrap();

    let solution = flow.session().solution().unwrap();
    assert_eq!(solution.get(SolutionKind::AnswerOnly), Some("6"));
    assert!(solution
        .get(SolutionKind::Walkthrough)
        .is_some_and(|text| text.starts_with("정답: 6")));

    let requests = client.requests();
    assert_ne!(requests[2].instruction, requests[3].instruction);
}

#[tokio::test]
async fn test_out_of_taxonomy_grade_rejected_by_default() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    client.push_reply(
        r#"{"grade":"4학년","unit":"1. 소인수분해","sub_unit":"1.2 소인수분해","problem_type":"x"}"#,
    );

    let result = flow.handle(UserEvent::Classify(photo()), &mut presenter).await;

    assert!(matches!(
        result,
        Err(AppError::Classification(ClassificationError::OutsideTaxonomy { field: "grade", .. }))
    ));
    assert_eq!(flow.session().stage(), PipelineStage::None);
}

#[tokio::test]
async fn test_out_of_taxonomy_grade_coerced_when_configured() {
    let config = Config {
        classification_policy: ClassificationPolicy::Coerce,
        ..test_config()
    };
    let (client, mut flow, mut presenter) = setup(&config);
    client.push_reply(
        r#"{"grade":"4학년","unit":"1. 소인수분해","sub_unit":"1.2 소인수분해","problem_type":"x"}"#,
    );

    flow.handle(UserEvent::Classify(photo()), &mut presenter)
        .await
        .unwrap();

    let classification = flow.session().classification().unwrap();
    assert!(classification.is_within(&Taxonomy::builtin()));
    assert_eq!(classification.grade, "1학년");
}

#[tokio::test]
async fn test_reset_returns_to_start() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_solved(&client, &mut flow, &mut presenter).await;

    flow.handle(UserEvent::Reset, &mut presenter).await.unwrap();

    assert_eq!(flow.session().stage(), PipelineStage::None);
    assert!(flow.session().classification().is_none());
    assert!(flow.form().is_none());
    assert_eq!(presenter.notices.len(), 2);
}

#[tokio::test]
async fn test_failed_solve_keeps_variant() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_generated(&client, &mut flow, &mut presenter).await;

    client.push_reply("   ");
    let result = flow
        .handle(UserEvent::Solve(SolutionKind::Walkthrough), &mut presenter)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Solution(SolutionError::EmptyResponse { .. }))
    ));

    client.push_failure("rate limited");
    let result = flow
        .handle(UserEvent::Solve(SolutionKind::AnswerOnly), &mut presenter)
        .await;
    assert!(matches!(result, Err(AppError::Service(_))));

    let session = flow.session();
    assert_eq!(session.stage(), PipelineStage::Generated);
    assert_eq!(session.variant().unwrap().text, VARIANT);
    assert!(session.solution().is_none());
    assert!(presenter.solutions.is_empty());
    assert_eq!(presenter.errors.len(), 2);
}

#[tokio::test]
async fn test_failed_answer_keeps_existing_walkthrough() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_solved(&client, &mut flow, &mut presenter).await;

    client.push_failure("timeout");
    let result = flow
        .handle(UserEvent::Solve(SolutionKind::AnswerOnly), &mut presenter)
        .await;

    assert!(matches!(result, Err(AppError::Service(_))));
    let solution = flow.session().solution().unwrap();
    assert_eq!(flow.session().stage(), PipelineStage::Solved);
    assert_eq!(solution.get(SolutionKind::AnswerOnly), None);
    assert!(solution.get(SolutionKind::Walkthrough).is_some());
}

#[tokio::test]
async fn test_malformed_reclassify_keeps_generated_variant() {
    let (client, mut flow, mut presenter) = setup(&test_config());
    run_to_generated(&client, &mut flow, &mut presenter).await;
    let revision = flow.session().classification_revision();

    client.push_reply("{grade: 1학년");
    let result = flow.handle(UserEvent::Classify(photo()), &mut presenter).await;

    assert!(matches!(
        result,
        Err(AppError::Classification(ClassificationError::MalformedJson { .. }))
    ));
    let session = flow.session();
    assert_eq!(session.stage(), PipelineStage::Generated);
    assert_eq!(session.variant().unwrap().text, VARIANT);
    assert_eq!(session.classification_revision(), revision);
    assert_eq!(session.classification().unwrap().problem_type, "최대공약수 구하기");
    assert_eq!(flow.form().unwrap().problem_type(), "최대공약수 구하기");
}
