//! 题目图片
//!
//! 只持有字节和媒体类型，不做解码；仅在分类请求期间存在。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

use crate::error::ImageError;

/// 支持的图片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    /// 根据文件头识别格式
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(MediaType::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(MediaType::Jpeg)
        } else {
            None
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }
}

/// 学生上传的题目图片
#[derive(Clone, PartialEq, Eq)]
pub struct ProblemImage {
    bytes: Vec<u8>,
    media_type: MediaType,
}

impl ProblemImage {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self { bytes, media_type })
    }

    /// 从磁盘读取图片，文件头无法识别时退回扩展名
    pub async fn load(path: &Path) -> Result<Self, ImageError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ImageError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;

        let media_type = MediaType::sniff(&bytes)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(MediaType::from_extension)
            })
            .ok_or_else(|| ImageError::Unsupported {
                hint: path.display().to_string(),
            })?;

        Self::new(bytes, media_type)
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 编码成 `data:<mime>;base64,<payload>` 形式
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type.mime(),
            STANDARD.encode(&self.bytes)
        )
    }
}

impl std::fmt::Debug for ProblemImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProblemImage")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
