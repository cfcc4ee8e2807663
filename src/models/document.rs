use std::path::Path;

use tokio::fs;

use crate::error::FileError;

/// 用户选择的待分析文档
///
/// 只保存原始字节，不做文件类型校验；类型是否支持由分析服务决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    /// 由内存中的字节创建文档，MIME 类型按扩展名推断
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime_type(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// 从磁盘读取文档
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .await
            .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
