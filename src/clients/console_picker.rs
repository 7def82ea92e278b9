//! 控制台目标选择器
//!
//! 配置中有预设目标时直接返回；否则在终端提示输入 `ID [名称]`，空行表示取消

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::DestinationPicker;
use crate::config::Config;
use crate::models::Destination;

type InputLines = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

pub struct ConsolePicker {
    preset_folder: Option<Destination>,
    preset_sheet: Option<Destination>,
    /// 所有提示共用一个读取器，首次提示时创建
    input: Mutex<Option<InputLines>>,
}

impl ConsolePicker {
    pub fn new(config: &Config) -> Self {
        Self {
            preset_folder: preset(&config.drive_folder_id, &config.drive_folder_name),
            preset_sheet: preset(&config.sheet_id, &config.sheet_name),
            input: Mutex::new(None),
        }
    }

    /// 从指定来源读取输入（不使用标准输入）
    pub fn with_input(config: &Config, reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            input: Mutex::new(Some(reader.lines())),
            ..Self::new(config)
        }
    }

    async fn prompt(&self, label: &str) -> Option<Destination> {
        let mut stdout = tokio::io::stdout();
        let prompt = format!("请输入{} ID 和名称（用空格分隔，留空取消）: ", label);
        if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return None;
        }

        let mut input = self.input.lock().await;
        let lines = input.get_or_insert_with(|| {
            let stdin: Box<dyn AsyncBufRead + Send + Unpin> =
                Box::new(BufReader::new(tokio::io::stdin()));
            stdin.lines()
        });
        match lines.next_line().await {
            Ok(Some(line)) => parse_selection(&line),
            Ok(None) => None,
            Err(e) => {
                warn!("读取输入失败: {}", e);
                None
            }
        }
    }
}

fn preset(id: &Option<String>, name: &Option<String>) -> Option<Destination> {
    let id = id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let name = name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(id);
    Some(Destination::new(id, name))
}

/// 解析 `ID [名称]`；名称缺省时与 ID 相同
pub fn parse_selection(line: &str) -> Option<Destination> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (id, name) = match line.split_once(char::is_whitespace) {
        Some((id, rest)) if !rest.trim().is_empty() => (id, rest.trim()),
        _ => (line, line),
    };
    Some(Destination::new(id, name))
}

#[async_trait]
impl DestinationPicker for ConsolePicker {
    async fn pick_folder(&self) -> Option<Destination> {
        if let Some(folder) = &self.preset_folder {
            info!("📁 使用预设文件夹: {}", folder.name);
            return Some(folder.clone());
        }
        self.prompt("云端硬盘文件夹").await
    }

    async fn pick_sheet(&self) -> Option<Destination> {
        if let Some(sheet) = &self.preset_sheet {
            info!("📊 使用预设表格: {}", sheet.name);
            return Some(sheet.clone());
        }
        self.prompt("表格").await
    }
}
