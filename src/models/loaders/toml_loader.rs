use crate::models::taxonomy::{GradeEntry, Taxonomy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// TOML 文件结构：
///
/// ```toml
/// [[grades]]
/// name = "1학년"
///
/// [[grades.units]]
/// name = "1. 소인수분해"
/// sub_units = ["1.1 소수와 합성수", "1.2 소인수분해"]
/// ```
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    grades: Vec<GradeEntry>,
}

/// 从 TOML 文本解析课程体系
pub fn parse_taxonomy_toml(content: &str) -> Result<Taxonomy> {
    let file: TaxonomyFile = toml::from_str(content).context("无法解析课程体系 TOML")?;
    let taxonomy = Taxonomy::new(file.grades)?;
    Ok(taxonomy)
}

/// 从 TOML 文件加载课程体系（只在启动时调用一次）
pub async fn load_taxonomy_from_toml(toml_file_path: &Path) -> Result<Taxonomy> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let taxonomy = parse_taxonomy_toml(&content)
        .with_context(|| format!("无法加载课程体系: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载课程体系: {} 个学年, {} 个小单元",
        taxonomy.grades().len(),
        taxonomy.nodes().count()
    );

    Ok(taxonomy)
}
