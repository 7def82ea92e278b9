use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 前置校验失败，未发起任何远程调用
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 保存到表格失败
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 登录/授权错误
    #[error("授权错误: {0}")]
    Auth(#[from] AuthError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 状态机非法转换
    #[error("状态错误: {0}")]
    Transition(#[from] TransitionError),
}

/// 前置校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("请至少选择一个 PDF 文件")]
    EmptyBatch,
    #[error("请先选择用于存储文件的云端硬盘文件夹")]
    NoDestinationFolder,
    #[error("没有可保存的有效数据")]
    NoEligibleRows,
    #[error("已有批次正在处理中")]
    RunInProgress,
    #[error("正在保存到表格，请稍候")]
    SaveInProgress,
    #[error("批次在处理过程中被替换")]
    BatchReplaced,
}

/// 远程服务（提取 / 存储 / 表格）调用失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// 服务端拒绝，附带上游错误信息
    #[error("{0}")]
    Rejected(String),
    /// 响应无法解析为约定结构
    #[error("响应格式无效: {0}")]
    Malformed(String),
    /// 网络层失败（连接、超时等）
    #[error("网络请求失败: {0}")]
    Transport(String),
    /// 失败但没有任何错误信息
    #[error("远程服务未返回错误信息")]
    Unspecified,
}

impl RemoteError {
    /// 可展示给用户的上游错误信息；没有信息时返回 `None`
    pub fn upstream_message(&self) -> Option<String> {
        match self {
            RemoteError::Rejected(msg) if msg.trim().is_empty() => None,
            RemoteError::Unspecified => None,
            other => Some(other.to_string()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        RemoteError::Rejected(message.into())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Malformed(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Malformed(err.to_string())
    }
}

/// 导出到表格失败
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("保存到表格 \"{sheet_name}\" 失败，请重试")]
    SaveFailed {
        sheet_name: String,
        #[source]
        source: RemoteError,
    },
}

/// 登录/授权错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("未配置访问令牌")]
    MissingCredential,
    #[error("获取用户信息失败: {0}")]
    ProfileFetchFailed(#[source] RemoteError),
    #[error("撤销访问令牌失败: {0}")]
    RevokeFailed(#[source] RemoteError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置文件解析失败 ({path}): {message}")]
    FileParseFailed { path: String, message: String },
    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 状态机非法转换
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("文档 {id} 无法从 {from} 转换到 {to}")]
pub struct TransitionError {
    pub id: String,
    pub from: &'static str,
    pub to: &'static str,
}

// ========== 便捷构造函数 ==========

impl FileError {
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
