//! 课程体系
//!
//! 学年 → 大单元 → 小单元，三层都保持原有顺序。
//! 进程启动后只读，所有查询都不会报错：找不到的键返回空列表或 `false`。

use serde::Deserialize;

use crate::error::ConfigError;

/// 大单元
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitEntry {
    pub name: String,
    pub sub_units: Vec<String>,
}

/// 学年
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradeEntry {
    pub name: String,
    pub units: Vec<UnitEntry>,
}

/// 课程体系中的一个节点 (学年, 大单元, 小单元)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyNode<'a> {
    pub grade: &'a str,
    pub unit: &'a str,
    pub sub_unit: &'a str,
}

/// 课程体系
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    grades: Vec<GradeEntry>,
}

type BuiltinUnit = (&'static str, &'static [&'static str]);

/// 内置的中学数学课程体系
const BUILTIN: &[(&str, &[BuiltinUnit])] = &[
    (
        "1학년",
        &[
            (
                "1. 소인수분해",
                &["1.1 소수와 합성수", "1.2 소인수분해", "1.3 최대공약수", "1.4 최소공배수"],
            ),
            (
                "2. 정수와 유리수",
                &[
                    "2.1 정수와 유리수",
                    "2.2 대소 관계",
                    "2.3 덧셈",
                    "2.4 뺄셈",
                    "2.5 곱셈",
                    "2.6 나눗셈",
                ],
            ),
            (
                "3. 문자의 사용과 식",
                &["3.1 문자의 사용", "3.2 식의 값", "3.3 일차식의 계산"],
            ),
            (
                "4. 좌표평면과 그래프",
                &["4.1 순서쌍", "4.2 그래프의 뜻과 표현"],
            ),
        ],
    ),
    (
        "2학년",
        &[
            ("1. 유리수와 순환소수", &["1.1 유한소수", "1.2 순환소수"]),
            ("2. 식의 계산", &["2.1 지수법칙", "2.2 다항식의 덧셈과 뺄셈"]),
            (
                "3. 일차함수와 그래프",
                &["3.1 일차함수의 뜻", "3.2 일차함수의 그래프", "3.3 기울기"],
            ),
            ("4. 삼각형의 성질", &["4.1 삼각형의 외심", "4.2 삼각형의 내심"]),
        ],
    ),
    (
        "3학년",
        &[
            ("1. 이차방정식", &["1.1 이차방정식의 풀이", "1.2 근의 공식"]),
            (
                "2. 이차함수와 그래프",
                &["2.1 y=ax²의 그래프", "2.2 y=a(x-p)²의 그래프"],
            ),
            ("3. 삼각비", &["3.1 sin, cos, tan", "3.2 삼각비의 활용"]),
            ("4. 통계", &["4.1 대푯값", "4.2 산포도"]),
        ],
    ),
];

impl Taxonomy {
    /// 创建课程体系并校验结构
    ///
    /// 要求：至少一个学年、每个学年至少一个大单元、每个大单元至少一个小单元，
    /// 同一层级内名称不能为空也不能重复。
    pub fn new(grades: Vec<GradeEntry>) -> Result<Self, ConfigError> {
        if grades.is_empty() {
            return Err(invalid("没有任何学年"));
        }
        check_names("学年", grades.iter().map(|g| g.name.as_str()))?;

        for grade in &grades {
            if grade.units.is_empty() {
                return Err(invalid(format!("学年 {} 没有大单元", grade.name)));
            }
            check_names("大单元", grade.units.iter().map(|u| u.name.as_str()))?;

            for unit in &grade.units {
                if unit.sub_units.is_empty() {
                    return Err(invalid(format!("大单元 {} 没有小单元", unit.name)));
                }
                check_names("小单元", unit.sub_units.iter().map(String::as_str))?;
            }
        }

        Ok(Self { grades })
    }

    /// 内置课程体系
    pub fn builtin() -> Self {
        let grades = BUILTIN
            .iter()
            .map(|(grade, units)| GradeEntry {
                name: grade.to_string(),
                units: units
                    .iter()
                    .map(|(unit, sub_units)| UnitEntry {
                        name: unit.to_string(),
                        sub_units: sub_units.iter().map(|s| s.to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self { grades }
    }

    pub fn grades(&self) -> Vec<&str> {
        self.grades.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn units_for(&self, grade: &str) -> Vec<&str> {
        self.grade(grade)
            .map(|g| g.units.iter().map(|u| u.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn sub_units_for(&self, grade: &str, unit: &str) -> Vec<&str> {
        self.unit(grade, unit)
            .map(|u| u.sub_units.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_valid(&self, grade: &str, unit: &str, sub_unit: &str) -> bool {
        self.unit(grade, unit)
            .is_some_and(|u| u.sub_units.iter().any(|s| s == sub_unit))
    }

    pub fn contains_grade(&self, grade: &str) -> bool {
        self.grade(grade).is_some()
    }

    pub fn contains_unit(&self, grade: &str, unit: &str) -> bool {
        self.unit(grade, unit).is_some()
    }

    pub fn first_grade(&self) -> &str {
        self.grades.first().map(|g| g.name.as_str()).unwrap_or_default()
    }

    pub fn first_unit(&self, grade: &str) -> Option<&str> {
        self.grade(grade)?.units.first().map(|u| u.name.as_str())
    }

    pub fn first_sub_unit(&self, grade: &str, unit: &str) -> Option<&str> {
        self.unit(grade, unit)?.sub_units.first().map(String::as_str)
    }

    /// 把任意三元组收敛到最近的合法节点
    ///
    /// 逐层检查：无效的学年换成第一个学年，无效的大单元换成该学年的第一个大单元，
    /// 无效的小单元换成该大单元的第一个小单元。已合法的层级保持不变。
    pub fn clamp(&self, grade: &str, unit: &str, sub_unit: &str) -> TaxonomyNode<'_> {
        let grade_entry = match self.grade(grade) {
            Some(g) => g.name.as_str(),
            None => self.first_grade(),
        };

        let unit_entry = if self.contains_unit(grade_entry, unit) {
            unit
        } else {
            self.first_unit(grade_entry).unwrap_or_default()
        };
        // 指回体系内部的字符串，保证生命周期与 self 一致
        let unit_entry = self
            .unit(grade_entry, unit_entry)
            .map(|u| u.name.as_str())
            .unwrap_or_default();

        let sub_unit_entry = self
            .unit(grade_entry, unit_entry)
            .and_then(|u| u.sub_units.iter().find(|s| s.as_str() == sub_unit))
            .map(String::as_str)
            .or_else(|| self.first_sub_unit(grade_entry, unit_entry))
            .unwrap_or_default();

        TaxonomyNode {
            grade: grade_entry,
            unit: unit_entry,
            sub_unit: sub_unit_entry,
        }
    }

    /// 按顺序遍历所有节点
    pub fn nodes(&self) -> impl Iterator<Item = TaxonomyNode<'_>> {
        self.grades.iter().flat_map(|g| {
            g.units.iter().flat_map(move |u| {
                u.sub_units.iter().map(move |s| TaxonomyNode {
                    grade: &g.name,
                    unit: &u.name,
                    sub_unit: s,
                })
            })
        })
    }

    /// 生成给 LLM 看的课程目录
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();
        for grade in &self.grades {
            lines.push(format!("- {}", grade.name));
            for unit in &grade.units {
                lines.push(format!("  - {}: {}", unit.name, unit.sub_units.join(", ")));
            }
        }
        lines.join("\n")
    }

    fn grade(&self, grade: &str) -> Option<&GradeEntry> {
        self.grades.iter().find(|g| g.name == grade)
    }

    fn unit(&self, grade: &str, unit: &str) -> Option<&UnitEntry> {
        self.grade(grade)?.units.iter().find(|u| u.name == unit)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidTaxonomy {
        reason: reason.into(),
    }
}

fn check_names<'a>(level: &str, names: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(format!("{}名称为空", level)));
        }
        if !seen.insert(name) {
            return Err(invalid(format!("{}名称重复: {}", level, name)));
        }
    }
    Ok(())
}
