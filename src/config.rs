use std::str::FromStr;

use crate::error::ConfigError;
use crate::models::ClassificationPolicy;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次回复的最大 token 数
    pub max_tokens: u32,
    // --- 各阶段采样温度 ---
    pub classify_temperature: f32,
    pub generate_temperature: f32,
    pub solve_temperature: f32,
    /// 模型给出课程体系外的值时的处理策略
    pub classification_policy: ClassificationPolicy,
    /// 自定义课程体系 TOML 文件（为空时使用内置课程体系）
    pub taxonomy_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            classify_temperature: 0.1,
            generate_temperature: 0.3,
            solve_temperature: 0.2,
            classification_policy: ClassificationPolicy::Strict,
            taxonomy_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取配置，未设置的项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            llm_api_key: lookup("OPENAI_API_KEY")
                .or_else(|| lookup("LLM_API_KEY"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            max_tokens: parse_var(&lookup, "MAX_TOKENS", "u32", default.max_tokens)?,
            classify_temperature: parse_var(
                &lookup,
                "CLASSIFY_TEMPERATURE",
                "f32",
                default.classify_temperature,
            )?,
            generate_temperature: parse_var(
                &lookup,
                "GENERATE_TEMPERATURE",
                "f32",
                default.generate_temperature,
            )?,
            solve_temperature: parse_var(
                &lookup,
                "SOLVE_TEMPERATURE",
                "f32",
                default.solve_temperature,
            )?,
            classification_policy: parse_var(
                &lookup,
                "CLASSIFICATION_POLICY",
                "strict|coerce",
                default.classification_policy,
            )?,
            taxonomy_file: lookup("TAXONOMY_FILE").or(default.taxonomy_file),
            verbose_logging: parse_var(
                &lookup,
                "VERBOSE_LOGGING",
                "bool",
                default.verbose_logging,
            )?,
        })
    }

    /// 校验配置，失败时整个会话不应启动
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::OutOfRange {
                name: "MAX_TOKENS".to_string(),
                value: self.max_tokens.to_string(),
            });
        }
        for (name, value) in [
            ("CLASSIFY_TEMPERATURE", self.classify_temperature),
            ("GENERATE_TEMPERATURE", self.generate_temperature),
            ("SOLVE_TEMPERATURE", self.solve_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var_name: &str, expected_type: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
