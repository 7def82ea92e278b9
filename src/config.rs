/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 文档提取服务的后端类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionBackend {
    /// Gemini 原生 generateContent 接口
    Gemini,
    /// 兼容 OpenAI 的 chat completions 接口
    OpenAi,
}

impl FromStr for ExtractionBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ExtractionBackend::Gemini),
            "openai" | "openai-compatible" => Ok(ExtractionBackend::OpenAi),
            other => Err(ConfigError::EnvVarParseFailed {
                var_name: "EXTRACTION_BACKEND".to_string(),
                value: other.to_string(),
                expected_type: "gemini | openai".to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// 待处理 PDF 所在目录
    pub input_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 提取服务配置 ---
    pub extraction_backend: ExtractionBackend,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- Google 配置 ---
    pub google_access_token: String,
    pub drive_api_base_url: String,
    pub sheets_api_base_url: String,
    pub oauth_api_base_url: String,
    pub sheet_range: String,
    // --- 预设目标（留空则在运行时询问）---
    pub drive_folder_id: Option<String>,
    pub drive_folder_name: Option<String>,
    pub sheet_id: Option<String>,
    pub sheet_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: "input_pdf".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            request_timeout_secs: 120,
            extraction_backend: ExtractionBackend::Gemini,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
            google_access_token: String::new(),
            drive_api_base_url: "https://www.googleapis.com".to_string(),
            sheets_api_base_url: "https://sheets.googleapis.com".to_string(),
            oauth_api_base_url: "https://www.googleapis.com".to_string(),
            sheet_range: "A1".to_string(),
            drive_folder_id: None,
            drive_folder_name: None,
            sheet_id: None,
            sheet_name: None,
        }
    }
}

/// TOML 配置文件结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub input_folder: Option<String>,
    pub verbose_logging: Option<bool>,
    pub output_log_file: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub extraction_backend: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: Option<String>,
    pub llm_model_name: Option<String>,
    pub google_access_token: Option<String>,
    pub drive_api_base_url: Option<String>,
    pub sheets_api_base_url: Option<String>,
    pub oauth_api_base_url: Option<String>,
    pub sheet_range: Option<String>,
    pub drive_folder_id: Option<String>,
    pub drive_folder_name: Option<String>,
    pub sheet_id: Option<String>,
    pub sheet_name: Option<String>,
}

impl Config {
    /// 加载完整配置：默认值 → 配置文件 → 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadFailed {
                    path: path.clone(),
                    source: e,
                })?;
            Self::default().merge_file(Self::parse_file(&content, &path)?)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 解析 TOML 配置内容
    pub fn parse_file(content: &str, path: &str) -> Result<ConfigFile, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::FileParseFailed {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// 用配置文件中出现的字段覆盖当前值
    pub fn merge_file(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(v) = file.input_folder {
            self.input_folder = v;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        if let Some(v) = file.output_log_file {
            self.output_log_file = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.extraction_backend {
            self.extraction_backend = v.parse()?;
        }
        if let Some(v) = file.llm_api_key {
            self.llm_api_key = v;
        }
        if let Some(v) = file.llm_api_base_url {
            self.llm_api_base_url = v;
        }
        if let Some(v) = file.llm_model_name {
            self.llm_model_name = v;
        }
        if let Some(v) = file.google_access_token {
            self.google_access_token = v;
        }
        if let Some(v) = file.drive_api_base_url {
            self.drive_api_base_url = v;
        }
        if let Some(v) = file.sheets_api_base_url {
            self.sheets_api_base_url = v;
        }
        if let Some(v) = file.oauth_api_base_url {
            self.oauth_api_base_url = v;
        }
        if let Some(v) = file.sheet_range {
            self.sheet_range = v;
        }
        self.drive_folder_id = file.drive_folder_id.or(self.drive_folder_id);
        self.drive_folder_name = file.drive_folder_name.or(self.drive_folder_name);
        self.sheet_id = file.sheet_id.or(self.sheet_id);
        self.sheet_name = file.sheet_name.or(self.sheet_name);
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("INPUT_FOLDER") {
            self.input_folder = v;
        }
        if let Ok(v) = std::env::var("VERBOSE_LOGGING") {
            self.verbose_logging = parse_env("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Ok(v) = std::env::var("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        if let Ok(v) = std::env::var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Ok(v) = std::env::var("EXTRACTION_BACKEND") {
            self.extraction_backend = v.parse()?;
        }
        if let Ok(v) = std::env::var("LLM_API_KEY") {
            self.llm_api_key = v;
        }
        if let Ok(v) = std::env::var("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Ok(v) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            self.google_access_token = v;
        }
        if let Ok(v) = std::env::var("DRIVE_API_BASE_URL") {
            self.drive_api_base_url = v;
        }
        if let Ok(v) = std::env::var("SHEETS_API_BASE_URL") {
            self.sheets_api_base_url = v;
        }
        if let Ok(v) = std::env::var("OAUTH_API_BASE_URL") {
            self.oauth_api_base_url = v;
        }
        if let Ok(v) = std::env::var("DRIVE_FOLDER_ID") {
            self.drive_folder_id = Some(v);
        }
        if let Ok(v) = std::env::var("DRIVE_FOLDER_NAME") {
            self.drive_folder_name = Some(v);
        }
        if let Ok(v) = std::env::var("SHEET_ID") {
            self.sheet_id = Some(v);
        }
        if let Ok(v) = std::env::var("SHEET_NAME") {
            self.sheet_name = Some(v);
        }
        Ok(())
    }

    /// 检查必填项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::EnvVarParseFailed {
                var_name: "REQUEST_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                expected_type: "正整数".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: expected_type.to_string(),
    })
}
