//! 分类修改表单 - 业务能力层
//!
//! 学生在提交前可以逐项修改分类。所有 setter 都会校验，
//! 上层选项变化后，失效的下层选项重置为第一个合法值。

use std::sync::Arc;

use crate::error::CorrectionError;
use crate::models::{Classification, Taxonomy};

/// 学生提交的一次修改，未填写的字段保持不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationEdit {
    pub grade: Option<String>,
    pub unit: Option<String>,
    pub sub_unit: Option<String>,
    pub problem_type: Option<String>,
    /// 空字符串表示清除
    pub core_concept: Option<String>,
}

impl ClassificationEdit {
    pub fn grade(value: impl Into<String>) -> Self {
        Self {
            grade: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn unit(value: impl Into<String>) -> Self {
        Self {
            unit: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn sub_unit(value: impl Into<String>) -> Self {
        Self {
            sub_unit: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn problem_type(value: impl Into<String>) -> Self {
        Self {
            problem_type: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn core_concept(value: impl Into<String>) -> Self {
        Self {
            core_concept: Some(value.into()),
            ..Self::default()
        }
    }
}

/// 分类修改表单
#[derive(Debug, Clone)]
pub struct CorrectionForm {
    taxonomy: Arc<Taxonomy>,
    grade: String,
    unit: String,
    sub_unit: String,
    problem_type: String,
    core_concept: Option<String>,
}

impl CorrectionForm {
    /// 用当前分类预填表单
    pub fn new(taxonomy: Arc<Taxonomy>, classification: &Classification) -> Self {
        let mut form = Self {
            taxonomy,
            grade: classification.grade.clone(),
            unit: classification.unit.clone(),
            sub_unit: classification.sub_unit.clone(),
            problem_type: classification.problem_type.clone(),
            core_concept: classification.core_concept.clone(),
        };
        form.clamp_dependents();
        form
    }

    pub fn grade(&self) -> &str {
        &self.grade
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn sub_unit(&self) -> &str {
        &self.sub_unit
    }

    pub fn problem_type(&self) -> &str {
        &self.problem_type
    }

    pub fn core_concept(&self) -> Option<&str> {
        self.core_concept.as_deref()
    }

    pub fn grade_options(&self) -> Vec<&str> {
        self.taxonomy.grades()
    }

    pub fn unit_options(&self) -> Vec<&str> {
        self.taxonomy.units_for(&self.grade)
    }

    pub fn sub_unit_options(&self) -> Vec<&str> {
        self.taxonomy.sub_units_for(&self.grade, &self.unit)
    }

    pub fn set_grade(&mut self, grade: &str) -> Result<(), CorrectionError> {
        if !self.taxonomy.contains_grade(grade) {
            return Err(not_an_option("grade", grade));
        }
        self.grade = grade.to_string();
        self.clamp_dependents();
        Ok(())
    }

    pub fn set_unit(&mut self, unit: &str) -> Result<(), CorrectionError> {
        if !self.taxonomy.contains_unit(&self.grade, unit) {
            return Err(not_an_option("unit", unit));
        }
        self.unit = unit.to_string();
        self.clamp_dependents();
        Ok(())
    }

    pub fn set_sub_unit(&mut self, sub_unit: &str) -> Result<(), CorrectionError> {
        if !self.taxonomy.is_valid(&self.grade, &self.unit, sub_unit) {
            return Err(not_an_option("sub_unit", sub_unit));
        }
        self.sub_unit = sub_unit.to_string();
        Ok(())
    }

    pub fn set_problem_type(&mut self, problem_type: &str) -> Result<(), CorrectionError> {
        let problem_type = problem_type.trim();
        if problem_type.is_empty() {
            return Err(CorrectionError::EmptyProblemType);
        }
        self.problem_type = problem_type.to_string();
        Ok(())
    }

    pub fn set_core_concept(&mut self, core_concept: &str) {
        let core_concept = core_concept.trim();
        self.core_concept = (!core_concept.is_empty()).then(|| core_concept.to_string());
    }

    /// 按 学年 → 大单元 → 小单元 → 题型 的顺序应用修改
    ///
    /// 任意一项失败则整个修改不生效。
    pub fn apply(&mut self, edit: &ClassificationEdit) -> Result<(), CorrectionError> {
        let mut draft = self.clone();
        if let Some(grade) = &edit.grade {
            draft.set_grade(grade)?;
        }
        if let Some(unit) = &edit.unit {
            draft.set_unit(unit)?;
        }
        if let Some(sub_unit) = &edit.sub_unit {
            draft.set_sub_unit(sub_unit)?;
        }
        if let Some(problem_type) = &edit.problem_type {
            draft.set_problem_type(problem_type)?;
        }
        if let Some(core_concept) = &edit.core_concept {
            draft.set_core_concept(core_concept);
        }
        *self = draft;
        Ok(())
    }

    /// 重新校验并生成最终分类
    pub fn commit(&self) -> Result<Classification, CorrectionError> {
        if !self.taxonomy.is_valid(&self.grade, &self.unit, &self.sub_unit) {
            return Err(CorrectionError::InvalidNode {
                grade: self.grade.clone(),
                unit: self.unit.clone(),
                sub_unit: self.sub_unit.clone(),
            });
        }
        if self.problem_type.trim().is_empty() {
            return Err(CorrectionError::EmptyProblemType);
        }

        Ok(Classification {
            grade: self.grade.clone(),
            unit: self.unit.clone(),
            sub_unit: self.sub_unit.clone(),
            problem_type: self.problem_type.clone(),
            core_concept: self.core_concept.clone(),
        })
    }

    /// 与已提交的分类是否不同
    pub fn differs_from(&self, classification: &Classification) -> bool {
        self.grade != classification.grade
            || self.unit != classification.unit
            || self.sub_unit != classification.sub_unit
            || self.problem_type != classification.problem_type
            || self.core_concept != classification.core_concept
    }

    fn clamp_dependents(&mut self) {
        let node = self.taxonomy.clamp(&self.grade, &self.unit, &self.sub_unit);
        let (grade, unit, sub_unit) = (
            node.grade.to_string(),
            node.unit.to_string(),
            node.sub_unit.to_string(),
        );
        self.grade = grade;
        self.unit = unit;
        self.sub_unit = sub_unit;
    }
}

fn not_an_option(field: &'static str, value: &str) -> CorrectionError {
    CorrectionError::NotAnOption {
        field,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> CorrectionForm {
        let classification = Classification {
            grade: "1학년".to_string(),
            unit: "1. 소인수분해".to_string(),
            sub_unit: "1.3 최대공약수".to_string(),
            problem_type: "최대공약수 구하기".to_string(),
            core_concept: None,
        };
        CorrectionForm::new(Arc::new(Taxonomy::builtin()), &classification)
    }

    #[test]
    fn test_prefilled_from_classification() {
        let form = sample_form();
        assert_eq!(form.grade(), "1학년");
        assert_eq!(form.sub_unit(), "1.3 최대공약수");
        assert_eq!(form.unit_options().len(), 4);
        assert_eq!(form.sub_unit_options()[0], "1.1 소수와 합성수");
    }

    #[test]
    fn test_grade_change_resets_dependents() {
        let mut form = sample_form();
        form.set_grade("3학년").unwrap();

        assert_eq!(form.unit(), "1. 이차방정식");
        assert_eq!(form.sub_unit(), "1.1 이차방정식의 풀이");
        assert_eq!(form.unit_options()[3], "4. 통계");
        assert_eq!(form.problem_type(), "최대공약수 구하기");
    }

    #[test]
    fn test_unit_change_resets_sub_unit() {
        let mut form = sample_form();
        form.set_unit("2. 정수와 유리수").unwrap();
        assert_eq!(form.sub_unit(), "2.1 정수와 유리수");

        form.set_sub_unit("2.4 뺄셈").unwrap();
        assert_eq!(form.sub_unit(), "2.4 뺄셈");
    }

    #[test]
    fn test_invalid_selection_leaves_form_unchanged() {
        let mut form = sample_form();

        assert_eq!(
            form.set_grade("4학년"),
            Err(CorrectionError::NotAnOption {
                field: "grade",
                value: "4학년".to_string()
            })
        );
        // 其他学年的大单元不能直接选
        assert!(form.set_unit("1. 이차방정식").is_err());
        assert!(form.set_sub_unit("2.4 뺄셈").is_err());
        assert_eq!(form.set_problem_type("   "), Err(CorrectionError::EmptyProblemType));

        assert_eq!(form.commit().unwrap(), sample_form().commit().unwrap());
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut form = sample_form();
        let edit = ClassificationEdit {
            grade: Some("2학년".to_string()),
            unit: Some("없는 단원".to_string()),
            ..ClassificationEdit::default()
        };
        assert!(form.apply(&edit).is_err());
        assert_eq!(form.grade(), "1학년");

        let edit = ClassificationEdit {
            grade: Some("2학년".to_string()),
            unit: Some("3. 일차함수와 그래프".to_string()),
            sub_unit: Some("3.3 기울기".to_string()),
            problem_type: Some("기울기 구하기".to_string()),
            core_concept: Some("변화율".to_string()),
        };
        form.apply(&edit).unwrap();

        let committed = form.commit().unwrap();
        assert_eq!(committed.grade, "2학년");
        assert_eq!(committed.unit, "3. 일차함수와 그래프");
        assert_eq!(committed.sub_unit, "3.3 기울기");
        assert_eq!(committed.problem_type, "기울기 구하기");
        assert_eq!(committed.core_concept.as_deref(), Some("변화율"));
    }

    #[test]
    fn test_prefill_clamps_invalid_values() {
        let classification = Classification {
            grade: "4학년".to_string(),
            unit: "?".to_string(),
            sub_unit: "?".to_string(),
            problem_type: "유형".to_string(),
            core_concept: None,
        };
        let form = CorrectionForm::new(Arc::new(Taxonomy::builtin()), &classification);
        assert!(form.differs_from(&classification));

        let committed = form.commit().unwrap();
        assert!(committed.is_within(&Taxonomy::builtin()));
        assert_eq!(committed.grade, "1학년");
    }

    #[test]
    fn test_core_concept_can_be_cleared() {
        let mut form = sample_form();
        form.apply(&ClassificationEdit::core_concept("공약수")).unwrap();
        assert_eq!(form.core_concept(), Some("공약수"));
        form.apply(&ClassificationEdit::core_concept("")).unwrap();
        assert_eq!(form.core_concept(), None);

        // 空修改不改变表单
        let before = form.clone();
        form.apply(&ClassificationEdit::default()).unwrap();
        assert_eq!(form.commit().unwrap(), before.commit().unwrap());
    }
}
