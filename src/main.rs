use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use math_tutor::clients::OpenAiCompletionClient;
use math_tutor::config::Config;
use math_tutor::error::AppError;
use math_tutor::models::{load_taxonomy_from_toml, ProblemImage, SolutionKind, Taxonomy, VariantProblem};
use math_tutor::services::{ClassificationEdit, CorrectionForm};
use math_tutor::utils::logging;
use math_tutor::workflow::{Presenter, TutorFlow, UserEvent};

const DISCLAIMER: &str = "⚠️ 본 서비스는 교육용 학습 보조 도구입니다. AI가 생성한 분류와 풀이는 틀릴 수 있으니 반드시 확인하세요.";
const FOOTER: &str = "© 중학 수학 AI 튜터 · 교육 목적 외 사용을 금합니다.";

const HELP: &str = "\
명령어:
  classify <이미지 경로>   문제 사진 분석
  grade <값>               학년 수정
  unit <값>                대단원 수정
  sub <값>                 소단원 수정
  type <값>                문제 유형 수정
  concept <값>             핵심 개념 수정
  commit                   분석 결과 확정
  generate                 유사 문제 만들기
  answer                   정답만 보기
  solve                    풀이 보기
  reset                    처음부터 다시
  help                     도움말
  quit                     종료";

/// 中学数学 AI 辅导（终端版）
#[derive(Parser, Debug)]
#[command(name = "math-tutor", version, about)]
struct Args {
    /// 启动后立即分析的题目图片
    image: Option<PathBuf>,

    /// 课程体系 TOML 文件（覆盖 TAXONOMY_FILE）
    #[arg(long)]
    taxonomy: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置
    let mut config = Config::from_env()?;
    if let Some(path) = &args.taxonomy {
        config.taxonomy_file = Some(path.display().to_string());
    }

    // 初始化日志
    logging::init(config.verbose_logging);
    config.validate()?;

    let taxonomy = match &config.taxonomy_file {
        Some(path) => load_taxonomy_from_toml(Path::new(path)).await?,
        None => Taxonomy::builtin(),
    };
    logging::log_startup(&config, taxonomy.grades().len(), taxonomy.nodes().count());

    let client = Arc::new(OpenAiCompletionClient::new(&config));
    let mut flow = TutorFlow::new(&config, client, Arc::new(taxonomy));
    let mut presenter = TerminalPresenter;

    println!("{}", DISCLAIMER);
    println!("{}", HELP);

    if let Some(path) = &args.image {
        classify_path(&mut flow, &mut presenter, path).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, value) = match line.split_once(char::is_whitespace) {
            Some((command, value)) => (command, value.trim()),
            None => (line, ""),
        };

        let event = match command {
            "classify" => {
                classify_path(&mut flow, &mut presenter, Path::new(value)).await;
                continue;
            }
            "grade" => UserEvent::Edit(ClassificationEdit::grade(value)),
            "unit" => UserEvent::Edit(ClassificationEdit::unit(value)),
            "sub" => UserEvent::Edit(ClassificationEdit::sub_unit(value)),
            "type" => UserEvent::Edit(ClassificationEdit::problem_type(value)),
            "concept" => UserEvent::Edit(ClassificationEdit::core_concept(value)),
            "commit" => UserEvent::CommitCorrection,
            "generate" => UserEvent::Generate,
            "answer" => UserEvent::Solve(SolutionKind::AnswerOnly),
            "solve" => UserEvent::Solve(SolutionKind::Walkthrough),
            "reset" => UserEvent::Reset,
            "help" => {
                println!("{}", HELP);
                continue;
            }
            "quit" | "exit" => break,
            other => {
                presenter.show_error(&format!("알 수 없는 명령어입니다: {}", other));
                continue;
            }
        };

        // 错误已由流程记录并展示
        let _ = flow.handle(event, &mut presenter).await;
    }

    println!("{}", FOOTER);
    info!("👋 程序结束");
    Ok(())
}

async fn classify_path(flow: &mut TutorFlow, presenter: &mut TerminalPresenter, path: &Path) {
    match ProblemImage::load(path).await {
        Ok(image) => {
            let _ = flow.handle(UserEvent::Classify(image), presenter).await;
        }
        Err(e) => presenter.show_error(&AppError::from(e).user_message()),
    }
}

/// 终端展示
struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show_classification_form(&mut self, form: &CorrectionForm) {
        println!("\n📋 분석 결과 (수정 후 commit 으로 확정하세요)");
        println!("  학년:   {}   [{}]", form.grade(), form.grade_options().join(" | "));
        println!("  대단원: {}   [{}]", form.unit(), form.unit_options().join(" | "));
        println!("  소단원: {}   [{}]", form.sub_unit(), form.sub_unit_options().join(" | "));
        println!("  유형:   {}", form.problem_type());
        if let Some(concept) = form.core_concept() {
            println!("  핵심 개념: {}", concept);
        }
    }

    fn show_variant(&mut self, variant: &VariantProblem) {
        println!("\n🧩 유사 문제");
        println!("{}", variant.text);
        println!("  (유형: {})", variant.source.problem_type);
    }

    fn show_solution(&mut self, kind: SolutionKind, text: &str) {
        println!("\n✅ {}", kind.label());
        println!("{}", text);
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("❌ {}", message);
    }

    fn show_notice(&mut self, message: &str) {
        println!("{}", message);
    }
}
