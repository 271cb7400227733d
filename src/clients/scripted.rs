//! 按脚本回复的补全客户端
//!
//! 不访问网络，按顺序返回预先排好的回复，并记录收到的每个请求。
//! 用于测试。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::clients::completion::{CompletionClient, CompletionRequest};
use crate::error::ServiceError;
use crate::models::MediaType;

/// 收到的请求摘要
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub instruction: String,
    pub system_message: Option<String>,
    pub image_media_type: Option<MediaType>,
    pub temperature: Option<f32>,
}

#[derive(Default)]
pub struct ScriptedCompletionClient {
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条成功回复
    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        self.lock_replies().push_back(Ok(text.into()));
        self
    }

    /// 追加一条服务失败
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.lock_replies().push_back(Err(ServiceError::ApiCallFailed {
            model: "scripted".to_string(),
            message: message.into(),
        }));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock_requests().clone()
    }

    fn lock_replies(&self) -> MutexGuard<'_, VecDeque<Result<String, ServiceError>>> {
        // 锁中毒时继续使用内部数据
        self.replies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_requests(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, ServiceError> {
        let recorded = RecordedRequest {
            instruction: request.instruction,
            system_message: request.system_message,
            image_media_type: request.image.map(|image| image.media_type()),
            temperature: request.temperature,
        };
        self.lock_requests().push(recorded);

        self.lock_replies()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ServiceError::ApiCallFailed {
                    model: "scripted".to_string(),
                    message: "没有剩余的脚本回复".to_string(),
                })
            })
            .map(|text| text.trim().to_string())
    }
}
