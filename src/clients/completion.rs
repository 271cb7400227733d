use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::ProblemImage;

/// 一次补全请求
///
/// 图片只借用，请求结束后不保留。
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub instruction: String,
    pub system_message: Option<String>,
    pub image: Option<&'a ProblemImage>,
    pub temperature: Option<f32>,
}

impl<'a> CompletionRequest<'a> {
    /// 纯文本请求
    pub fn text(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            system_message: None,
            image: None,
            temperature: None,
        }
    }

    pub fn with_image(mut self, image: &'a ProblemImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// 补全服务
///
/// 返回模型的原始文本（已去掉首尾空白），是否为空由调用方判断。
/// 传输或服务端失败统一返回 [`ServiceError`]，不做重试。
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, ServiceError>;
}
