use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 后端服务调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 会话状态机拒绝了本次操作
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 后端服务调用错误
///
/// `Display` 面向日志；展示给用户的文本统一走 [`ApiError::user_message`]。
#[derive(Debug, Error)]
pub enum ApiError {
    /// 服务返回非 2xx 响应
    #[error("服务返回错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        /// 服务端提供的错误信息，或固定的兜底文案
        message: String,
    },
    /// 请求没有完成（连接失败、读取中断等）
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 2xx 响应体无法解析
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 超过配置的等待时间仍未收到响应
    #[error("API请求超时 ({endpoint}): {secs}秒")]
    Timeout { endpoint: String, secs: u64 },
}

impl ApiError {
    /// 展示给用户的错误文本
    ///
    /// - 服务错误：服务端原文，或兜底文案
    /// - 传输/解析错误：底层错误的原始文本
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadResponse { message, .. } => message.clone(),
            ApiError::RequestFailed { source, .. } | ApiError::JsonParseFailed { source, .. } => {
                source.to_string()
            }
            ApiError::Timeout { secs, .. } => format!("request timed out after {} seconds", secs),
        }
    }

    /// 出错的接口
    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::BadResponse { endpoint, .. }
            | ApiError::RequestFailed { endpoint, .. }
            | ApiError::JsonParseFailed { endpoint, .. }
            | ApiError::Timeout { endpoint, .. } => endpoint,
        }
    }
}

/// 会话状态机的准入错误
///
/// 这些错误只表示"此刻不能做这件事"，返回时状态没有任何变化。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 还没有选择文档
    #[error("尚未选择文档")]
    NoDocumentSelected,
    /// 已有分析请求在进行中
    #[error("文档正在分析中")]
    AnalysisInProgress,
    /// 没有已完成分析的文档
    #[error("当前没有可用的分析结果")]
    NoActiveSession,
    /// 闪卡索引超出范围
    #[error("闪卡索引 {index} 超出范围 (共 {len} 张)")]
    FlashcardOutOfRange { index: usize, len: usize },
    /// 推荐问题索引超出范围
    #[error("推荐问题索引 {index} 超出范围 (共 {len} 个)")]
    SuggestionOutOfRange { index: usize, len: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 配置项取值非法
    #[error("配置项 {key} 取值非法: '{value}' (期望: {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}

// ========== 便捷构造函数 ==========

impl ApiError {
    /// 创建请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建解析失败错误
    pub fn json_parse_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::JsonParseFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }
}

impl FileError {
    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
