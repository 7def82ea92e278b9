use crate::clients::{
    ConsolePicker, CredentialStore, DriveStorageClient, ExtractionClient, GeminiExtractionClient,
    GoogleAuthGateway, OpenAiExtractionClient, SheetsClient,
};
use crate::config::{Config, ExtractionBackend};
use crate::error::{AppError, ValidationError};
use crate::models::{load_input_files, SubmissionView};
use crate::orchestrator::{Session, SessionClients};
use crate::utils::logging;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    session: Arc<Session>,
}

impl App {
    /// 初始化应用：校验配置、组装外部服务
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        let (backend, extractor): (&str, Arc<dyn ExtractionClient>) =
            match config.extraction_backend {
                ExtractionBackend::Gemini => {
                    ("Gemini", Arc::new(GeminiExtractionClient::new(&config)?))
                }
                ExtractionBackend::OpenAi => {
                    ("OpenAI 兼容", Arc::new(OpenAiExtractionClient::new(&config)))
                }
            };
        logging::log_startup(backend, &config.llm_model_name);

        let credentials = CredentialStore::new();
        let session = Session::new(SessionClients {
            extractor,
            storage: Arc::new(DriveStorageClient::new(&config, credentials.clone())?),
            spreadsheet: Arc::new(SheetsClient::new(&config, credentials.clone())?),
            picker: Arc::new(ConsolePicker::new(&config)),
            auth: Arc::new(GoogleAuthGateway::new(&config, credentials)?),
        });

        Ok(Self {
            config,
            session: Arc::new(session),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        info!("\n📁 正在扫描待处理的文件: {}", self.config.input_folder);
        let files = load_input_files(&self.config.input_folder).await?;

        let intake = self.session.select_files(files).await?;
        if intake.accepted == 0 {
            warn!("⚠️ 没有找到待处理的 PDF 文件，程序结束");
            return Ok(());
        }

        if self.session.choose_folder().await?.is_none() {
            warn!("⚠️ 未选择云端硬盘文件夹，程序结束");
            return Ok(());
        }

        let listener = spawn_progress_listener(&self.session);
        let run_result = self.session.start_run().await;
        listener.abort();

        let summary = match run_result {
            Ok(summary) => summary,
            Err(AppError::Validation(e)) => {
                warn!("⚠️ {}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = self.session.snapshot().await;
        log_result_table(&snapshot.submissions);

        match self.session.save_to_sheet().await {
            Ok(Some(outcome)) => info!("✅ {}", outcome.message()),
            Ok(None) => info!("未保存到表格"),
            Err(AppError::Validation(ValidationError::NoEligibleRows)) => {
                warn!("⚠️ 没有提取成功的文档，跳过保存到表格");
            }
            Err(e) => error!("❌ {}", e),
        }

        logging::print_final_stats(&summary, &self.config.output_log_file);

        Ok(())
    }
}

/// 把进度事件写入调试日志
fn spawn_progress_listener(session: &Session) -> tokio::task::JoinHandle<()> {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => debug!("进度: {}", line),
                    Err(e) => debug!("进度事件序列化失败: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => debug!("进度事件丢失 {} 条", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_result_table(views: &[SubmissionView]) {
    info!("\n{}", "─".repeat(60));
    info!("📋 处理结果");
    for (idx, view) in views.iter().enumerate() {
        let detail = match (&view.extracted_data, &view.error_message) {
            (Some(fields), _) => format!(
                "{} | {} | {}",
                fields.document_type,
                fields.document_number,
                logging::truncate_text(&fields.subject, 30)
            ),
            (None, Some(msg)) => msg.clone(),
            (None, None) => String::new(),
        };
        info!(
            "{:>3}. {} [提取: {} / 上传: {}] {}",
            idx + 1,
            view.file_name,
            view.status.as_str(),
            view.drive_upload_status.as_str(),
            detail
        );
        if let Some(drive_error) = &view.drive_error_message {
            warn!("     上传错误: {}", drive_error);
        }
    }
    info!("{}", "─".repeat(60));
}
