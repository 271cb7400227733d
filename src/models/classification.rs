use std::fmt::Display;
use std::str::FromStr;

use crate::models::taxonomy::Taxonomy;

/// 题目分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub grade: String,
    pub unit: String,
    pub sub_unit: String,
    pub problem_type: String,
    pub core_concept: Option<String>,
}

impl Classification {
    /// 三元组是否落在课程体系内
    pub fn is_within(&self, taxonomy: &Taxonomy) -> bool {
        taxonomy.is_valid(&self.grade, &self.unit, &self.sub_unit)
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} > {} > {} [{}]",
            self.grade, self.unit, self.sub_unit, self.problem_type
        )
    }
}

/// 模型给出课程体系外的值时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationPolicy {
    /// 直接判定为分类失败
    #[default]
    Strict,
    /// 逐层收敛到第一个合法选项
    Coerce,
}

impl FromStr for ClassificationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "coerce" => Ok(Self::Coerce),
            other => Err(format!("未知的分类策略: {}", other)),
        }
    }
}
