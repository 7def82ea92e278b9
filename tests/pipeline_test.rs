use async_trait::async_trait;
use doc_extract_pipeline::clients::{
    AuthGateway, DestinationPicker, ExtractionClient, SignIn, SpreadsheetClient, StorageClient,
};
use doc_extract_pipeline::error::{AppError, AuthError, ExportError, RemoteError, ValidationError};
use doc_extract_pipeline::models::{
    Batch, Destination, DocumentPayload, ExtractedFields, ExtractionStatus, StorageStatus,
    UserProfile, PDF_MEDIA_TYPE,
};
use doc_extract_pipeline::orchestrator::{
    export_successful, ProgressEvent, Session, SessionClients, EXPORT_HEADER,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_test::{assert_err, assert_ok};

// ========== 测试替身 ==========

fn pdf(name: &str) -> DocumentPayload {
    DocumentPayload::new(name, PDF_MEDIA_TYPE, 1_700_000_000_000, b"%PDF-1.7".to_vec())
}

fn fields_for(name: &str) -> ExtractedFields {
    ExtractedFields {
        document_type: "Công văn".to_string(),
        document_number: format!("{}/UBND", name.len()),
        issue_date: "2024-03-01".to_string(),
        subject: format!("Trích yếu {}", name),
        signer: "Nguyễn Văn A".to_string(),
        recipients: "Sở Tài chính".to_string(),
    }
}

/// 按文件名返回预设结果，并记录调用顺序与最大并发数
#[derive(Default)]
struct ScriptedExtractor {
    failures: HashMap<String, RemoteError>,
    calls: Mutex<Vec<String>>,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedExtractor {
    fn failing(failures: &[(&str, RemoteError)]) -> Self {
        Self {
            failures: failures
                .iter()
                .map(|(name, err)| (name.to_string(), err.clone()))
                .collect(),
            ..Default::default()
        }
    }

    fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionClient for ScriptedExtractor {
    async fn extract(&self, payload: &DocumentPayload) -> Result<ExtractedFields, RemoteError> {
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(payload.file_name.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        tokio::task::yield_now().await;

        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        match self.failures.get(&payload.file_name) {
            Some(err) => Err(err.clone()),
            None => Ok(fields_for(&payload.file_name)),
        }
    }
}

#[derive(Default)]
struct FakeStorage {
    failures: HashMap<String, RemoteError>,
    uploads: Mutex<Vec<(String, String)>>,
}

impl FakeStorage {
    fn failing(failures: &[(&str, RemoteError)]) -> Self {
        Self {
            failures: failures
                .iter()
                .map(|(name, err)| (name.to_string(), err.clone()))
                .collect(),
            ..Default::default()
        }
    }

    fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn upload(
        &self,
        folder_id: &str,
        payload: &DocumentPayload,
    ) -> Result<String, RemoteError> {
        self.uploads
            .lock()
            .unwrap()
            .push((folder_id.to_string(), payload.file_name.clone()));
        match self.failures.get(&payload.file_name) {
            Some(err) => Err(err.clone()),
            None => Ok(format!("drive-{}", payload.file_name)),
        }
    }
}

#[derive(Default)]
struct RecordingSheets {
    fail: Option<RemoteError>,
    calls: Mutex<Vec<(String, Vec<Vec<String>>)>>,
}

impl RecordingSheets {
    fn calls(&self) -> Vec<(String, Vec<Vec<String>>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpreadsheetClient for RecordingSheets {
    async fn append_rows(&self, sheet_id: &str, rows: &[Vec<String>]) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((sheet_id.to_string(), rows.to_vec()));
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

struct FakePicker {
    folder: Option<Destination>,
    sheet: Option<Destination>,
    sheet_prompts: AtomicUsize,
    sheet_gate: Option<Arc<Semaphore>>,
}

impl FakePicker {
    fn new(folder: Option<Destination>, sheet: Option<Destination>) -> Self {
        Self {
            folder,
            sheet,
            sheet_prompts: AtomicUsize::new(0),
            sheet_gate: None,
        }
    }

    /// 表格选择在放行前一直挂起
    fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            sheet_gate: Some(gate),
            ..Self::new(Some(folder()), Some(sheet()))
        }
    }
}

#[async_trait]
impl DestinationPicker for FakePicker {
    async fn pick_folder(&self) -> Option<Destination> {
        self.folder.clone()
    }

    async fn pick_sheet(&self) -> Option<Destination> {
        self.sheet_prompts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.sheet_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.sheet.clone()
    }
}

struct FakeAuth {
    grant: bool,
    revoke_fails: bool,
}

#[async_trait]
impl AuthGateway for FakeAuth {
    async fn sign_in(&self) -> Result<Option<SignIn>, AuthError> {
        Ok(self.grant.then(|| SignIn {
            profile: UserProfile {
                name: "Tester".to_string(),
                email: "tester@example.com".to_string(),
                picture: String::new(),
            },
        }))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.revoke_fails {
            Err(AuthError::RevokeFailed(RemoteError::Transport(
                "connection reset".to_string(),
            )))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    session: Arc<Session>,
    extractor: Arc<ScriptedExtractor>,
    storage: Arc<FakeStorage>,
    sheets: Arc<RecordingSheets>,
    picker: Arc<FakePicker>,
}

fn folder() -> Destination {
    Destination::new("folder-1", "Văn bản đến")
}

fn sheet() -> Destination {
    Destination::new("sheet-1", "Sổ theo dõi")
}

fn harness(extractor: ScriptedExtractor, storage: FakeStorage) -> Harness {
    harness_with(
        extractor,
        storage,
        RecordingSheets::default(),
        FakePicker::new(Some(folder()), Some(sheet())),
        FakeAuth {
            grant: true,
            revoke_fails: false,
        },
    )
}

fn harness_with(
    extractor: ScriptedExtractor,
    storage: FakeStorage,
    sheets: RecordingSheets,
    picker: FakePicker,
    auth: FakeAuth,
) -> Harness {
    let extractor = Arc::new(extractor);
    let storage = Arc::new(storage);
    let sheets = Arc::new(sheets);
    let picker = Arc::new(picker);
    let session = Session::new(SessionClients {
        extractor: extractor.clone(),
        storage: storage.clone(),
        spreadsheet: sheets.clone(),
        picker: picker.clone(),
        auth: Arc::new(auth),
    });
    Harness {
        session: Arc::new(session),
        extractor,
        storage,
        sheets,
        picker,
    }
}

async fn ready(h: &Harness, names: &[&str]) {
    let files = names.iter().map(|n| pdf(n)).collect();
    assert_ok!(h.session.select_files(files).await);
    assert_ok!(h.session.choose_folder().await);
}

// ========== 批次处理 ==========

#[tokio::test]
async fn test_every_submission_ends_in_terminal_states() {
    let h = harness(
        ScriptedExtractor::failing(&[
            ("b.pdf", RemoteError::rejected("quota exceeded")),
            ("d.pdf", RemoteError::Unspecified),
        ]),
        FakeStorage::failing(&[("c.pdf", RemoteError::rejected("storage full"))]),
    );
    ready(&h, &["a.pdf", "b.pdf", "c.pdf", "d.pdf"]).await;

    let summary = assert_ok!(h.session.start_run().await);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.extraction_failed, 2);
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.upload_failed, 1);

    let batch = h.session.batch();
    let batch = batch.read().await;
    for sub in batch.iter() {
        assert!(matches!(
            sub.extraction_status(),
            ExtractionStatus::Success | ExtractionStatus::Error
        ));
        if sub.extraction_status() != ExtractionStatus::Success {
            assert_eq!(sub.storage_status(), StorageStatus::Idle);
        } else {
            assert!(matches!(
                sub.storage_status(),
                StorageStatus::Success | StorageStatus::Error
            ));
        }
    }

    // 没有任何错误信息时使用通用提示
    let d = batch.iter().find(|s| s.file_name() == "d.pdf").unwrap();
    assert_eq!(d.extraction_error(), Some("处理文件时发生未知错误"));
}

#[tokio::test]
async fn test_extraction_calls_follow_input_order_without_overlap() {
    let h = harness(ScriptedExtractor::default(), FakeStorage::default());
    let names = ["03.pdf", "01.pdf", "02.pdf", "10.pdf", "07.pdf"];
    ready(&h, &names).await;

    assert_ok!(h.session.start_run().await);

    assert_eq!(h.extractor.calls(), names.to_vec());
    assert_eq!(h.extractor.max_outstanding.load(Ordering::SeqCst), 1);

    let uploads: Vec<String> = h.storage.uploads().into_iter().map(|(_, n)| n).collect();
    assert_eq!(uploads, names.to_vec());
    assert!(h
        .storage
        .uploads()
        .iter()
        .all(|(folder_id, _)| folder_id == "folder-1"));
}

#[tokio::test]
async fn test_rejected_extraction_keeps_storage_idle() {
    let h = harness(
        ScriptedExtractor::failing(&[("only.pdf", RemoteError::rejected("rate limited"))]),
        FakeStorage::default(),
    );
    ready(&h, &["only.pdf"]).await;

    assert_ok!(h.session.start_run().await);

    let batch = h.session.batch();
    let batch = batch.read().await;
    let sub = batch.at(0).unwrap();
    assert_eq!(sub.extraction_status(), ExtractionStatus::Error);
    assert_eq!(sub.extraction_error(), Some("rate limited"));
    assert_eq!(sub.storage_status(), StorageStatus::Idle);
    assert!(h.storage.uploads().is_empty());
}

#[tokio::test]
async fn test_rejected_upload_keeps_extracted_fields() {
    let h = harness(
        ScriptedExtractor::default(),
        FakeStorage::failing(&[("only.pdf", RemoteError::rejected("insufficient permissions"))]),
    );
    ready(&h, &["only.pdf"]).await;

    assert_ok!(h.session.start_run().await);

    let batch = h.session.batch();
    let batch = batch.read().await;
    let sub = batch.at(0).unwrap();
    assert_eq!(sub.extraction_status(), ExtractionStatus::Success);
    assert_eq!(sub.extracted_fields(), Some(&fields_for("only.pdf")));
    assert_eq!(sub.storage_status(), StorageStatus::Error);
    assert_eq!(sub.storage_error(), Some("insufficient permissions"));
    assert_eq!(sub.storage_file_id(), None);
}

#[tokio::test]
async fn test_upload_without_message_uses_fallback() {
    let h = harness(
        ScriptedExtractor::default(),
        FakeStorage::failing(&[("only.pdf", RemoteError::rejected(""))]),
    );
    ready(&h, &["only.pdf"]).await;

    assert_ok!(h.session.start_run().await);

    let batch = h.session.batch();
    let sub = batch.read().await.at(0).cloned().unwrap();
    assert_eq!(sub.storage_error(), Some("上传到云端硬盘时发生未知错误"));
}

#[tokio::test]
async fn test_run_preconditions() {
    let h = harness_with(
        ScriptedExtractor::default(),
        FakeStorage::default(),
        RecordingSheets::default(),
        FakePicker::new(None, None),
        FakeAuth {
            grant: true,
            revoke_fails: false,
        },
    );

    // 空批次
    let err = assert_err!(h.session.start_run().await);
    assert!(matches!(err, AppError::Validation(ValidationError::EmptyBatch)));

    // 未选择文件夹
    assert_ok!(h.session.select_files(vec![pdf("a.pdf")]).await);
    assert_eq!(assert_ok!(h.session.choose_folder().await), None);
    let err = assert_err!(h.session.start_run().await);
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::NoDestinationFolder)
    ));

    assert!(h.extractor.calls().is_empty());
    let batch = h.session.batch();
    assert_eq!(
        batch.read().await.at(0).unwrap().extraction_status(),
        ExtractionStatus::Pending
    );
}

#[tokio::test]
async fn test_second_run_rejected_while_processing() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness(ScriptedExtractor::gated(gate.clone()), FakeStorage::default());
    ready(&h, &["a.pdf", "b.pdf", "c.pdf"]).await;

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.start_run().await });

    // 等待第一个提取调用开始
    while h.extractor.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(h.session.is_processing());

    let err = assert_err!(h.session.start_run().await);
    assert!(matches!(err, AppError::Validation(ValidationError::RunInProgress)));

    let err = assert_err!(h.session.select_files(vec![pdf("x.pdf")]).await);
    assert!(matches!(err, AppError::Validation(ValidationError::RunInProgress)));

    let err = assert_err!(h.session.save_to_sheet().await);
    assert!(matches!(err, AppError::Validation(ValidationError::RunInProgress)));

    gate.add_permits(3);
    let summary = assert_ok!(first.await.unwrap());
    assert_eq!(summary.extracted, 3);

    assert_eq!(h.extractor.calls(), vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(h.extractor.max_outstanding.load(Ordering::SeqCst), 1);
    assert!(!h.session.is_processing());
}

#[tokio::test]
async fn test_rerun_same_selection_processes_every_file_again() {
    let h = harness(ScriptedExtractor::default(), FakeStorage::default());
    ready(&h, &["a.pdf", "b.pdf"]).await;

    let first = assert_ok!(h.session.start_run().await);
    let second = assert_ok!(h.session.start_run().await);

    assert_eq!(first.extracted, 2);
    assert_eq!(second.extracted, 2);
    assert_eq!(second.uploaded, 2);
    assert_eq!(
        h.extractor.calls(),
        vec!["a.pdf", "b.pdf", "a.pdf", "b.pdf"]
    );
    assert_eq!(h.storage.uploads().len(), 4);

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.submissions.len(), 2);
    assert!(snapshot
        .submissions
        .iter()
        .all(|v| v.status == ExtractionStatus::Success
            && v.drive_upload_status == StorageStatus::Success));
}

#[tokio::test]
async fn test_rerun_starts_from_pending_states() {
    let gate = Arc::new(Semaphore::new(2));
    let h = harness(ScriptedExtractor::gated(gate.clone()), FakeStorage::default());
    ready(&h, &["a.pdf", "b.pdf"]).await;
    assert_ok!(h.session.start_run().await);

    let session = h.session.clone();
    let rerun = tokio::spawn(async move { session.start_run().await });

    // 第二次运行卡在 a.pdf 的提取上
    while h.extractor.calls().len() < 3 {
        tokio::task::yield_now().await;
    }
    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.submissions[0].status, ExtractionStatus::Processing);
    assert_eq!(snapshot.submissions[0].drive_upload_status, StorageStatus::Idle);
    assert_eq!(snapshot.submissions[1].status, ExtractionStatus::Pending);
    assert!(!snapshot.has_successful_files);

    gate.add_permits(2);
    assert_ok!(rerun.await.unwrap());
}

#[tokio::test]
async fn test_run_and_selection_rejected_while_sheet_picker_open() {
    let picker_gate = Arc::new(Semaphore::new(0));
    let h = harness_with(
        ScriptedExtractor::default(),
        FakeStorage::default(),
        RecordingSheets::default(),
        FakePicker::gated(picker_gate.clone()),
        FakeAuth {
            grant: true,
            revoke_fails: false,
        },
    );
    ready(&h, &["a.pdf", "b.pdf"]).await;
    assert_ok!(h.session.start_run().await);

    let session = h.session.clone();
    let save = tokio::spawn(async move { session.save_to_sheet().await });
    while h.picker.sheet_prompts.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(h.session.snapshot().await.is_saving);

    let err = assert_err!(h.session.select_files(vec![pdf("x.pdf"), pdf("y.pdf")]).await);
    assert!(matches!(err, AppError::Validation(ValidationError::SaveInProgress)));

    let err = assert_err!(h.session.start_run().await);
    assert!(matches!(err, AppError::Validation(ValidationError::SaveInProgress)));
    assert!(!h.session.is_processing());

    let err = assert_err!(h.session.save_to_sheet().await);
    assert!(matches!(err, AppError::Validation(ValidationError::SaveInProgress)));

    picker_gate.add_permits(1);
    let outcome = assert_ok!(save.await.unwrap()).unwrap();
    assert_eq!(outcome.appended_rows, 2);

    // 只处理过第一次选择的文件
    assert_eq!(h.extractor.calls(), vec!["a.pdf", "b.pdf"]);
    let calls = h.sheets.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1[1][6], "a.pdf");
    assert_eq!(calls[0].1[2][6], "b.pdf");

    // 保存结束后可以重新选择
    assert_ok!(h.session.select_files(vec![pdf("x.pdf")]).await);
}

#[tokio::test]
async fn test_progress_events_follow_state_changes() {
    let h = harness(
        ScriptedExtractor::failing(&[("b.pdf", RemoteError::rejected("bad scan"))]),
        FakeStorage::default(),
    );
    ready(&h, &["a.pdf", "b.pdf"]).await;
    let mut events = h.session.subscribe();

    assert_ok!(h.session.start_run().await);

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert_eq!(received.first(), Some(&ProgressEvent::RunStarted { total: 2 }));
    assert_eq!(
        received.last(),
        Some(&ProgressEvent::RunFinished {
            extracted: 1,
            uploaded: 1
        })
    );
    let storage_events = received
        .iter()
        .filter(|e| matches!(e, ProgressEvent::StorageChanged { .. }))
        .count();
    // a.pdf: uploading + success；b.pdf 不上传
    assert_eq!(storage_events, 2);
}

// ========== 文件选择 ==========

#[tokio::test]
async fn test_select_files_rejects_non_pdf() {
    let h = harness(ScriptedExtractor::default(), FakeStorage::default());
    let files = vec![
        pdf("a.pdf"),
        DocumentPayload::new("notes.docx", "application/msword", 1, b"doc".to_vec()),
        pdf("b.pdf"),
    ];

    let intake = assert_ok!(h.session.select_files(files).await);
    assert_eq!(intake.accepted, 2);
    assert_eq!(intake.rejected, 1);

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.submissions.len(), 2);
    assert!(snapshot
        .submissions
        .iter()
        .all(|v| v.status == ExtractionStatus::Pending));
}

#[tokio::test]
async fn test_new_selection_replaces_previous_results() {
    let h = harness(ScriptedExtractor::default(), FakeStorage::default());
    ready(&h, &["a.pdf"]).await;
    assert_ok!(h.session.start_run().await);
    assert!(h.session.snapshot().await.has_successful_files);

    assert_ok!(h.session.select_files(vec![pdf("b.pdf")]).await);
    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.submissions.len(), 1);
    assert_eq!(snapshot.submissions[0].file_name, "b.pdf");
    assert!(!snapshot.has_successful_files);
}

// ========== 导出 ==========

#[tokio::test]
async fn test_export_without_success_makes_no_calls() {
    let sheets = RecordingSheets::default();
    let (batch, _) = Batch::select_files(vec![pdf("a.pdf")]);

    let err = assert_err!(export_successful(&batch, &sheet(), &sheets).await);
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::NoEligibleRows)
    ));
    assert!(sheets.calls().is_empty());
}

#[tokio::test]
async fn test_save_without_success_skips_picker() {
    let h = harness(
        ScriptedExtractor::failing(&[("a.pdf", RemoteError::rejected("unreadable"))]),
        FakeStorage::default(),
    );
    ready(&h, &["a.pdf"]).await;
    assert_ok!(h.session.start_run().await);

    let err = assert_err!(h.session.save_to_sheet().await);
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::NoEligibleRows)
    ));
    assert_eq!(h.picker.sheet_prompts.load(Ordering::SeqCst), 0);
    assert!(h.sheets.calls().is_empty());
}

#[tokio::test]
async fn test_export_only_successful_rows_in_order() {
    let h = harness(
        ScriptedExtractor::failing(&[("b.pdf", RemoteError::rejected("unreadable"))]),
        FakeStorage::failing(&[("a.pdf", RemoteError::rejected("storage full"))]),
    );
    ready(&h, &["a.pdf", "b.pdf", "c.pdf"]).await;
    assert_ok!(h.session.start_run().await);

    let outcome = assert_ok!(h.session.save_to_sheet().await).unwrap();
    assert_eq!(outcome.appended_rows, 2);
    assert_eq!(outcome.message(), "已成功保存 2 条记录到 \"Sổ theo dõi\"");

    let calls = h.sheets.calls();
    assert_eq!(calls.len(), 1);
    let (sheet_id, rows) = &calls[0];
    assert_eq!(sheet_id, "sheet-1");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], EXPORT_HEADER.map(String::from).to_vec());
    assert_eq!(rows[1][6], "a.pdf");
    assert_eq!(rows[2][6], "c.pdf");
    assert_eq!(rows[1][3], "Trích yếu a.pdf");

    assert_eq!(h.session.sheet().await, Some(sheet()));
}

#[tokio::test]
async fn test_save_failure_reports_sheet_name() {
    let h = harness_with(
        ScriptedExtractor::default(),
        FakeStorage::default(),
        RecordingSheets {
            fail: Some(RemoteError::rejected("The caller does not have permission")),
            ..Default::default()
        },
        FakePicker::new(Some(folder()), Some(sheet())),
        FakeAuth {
            grant: true,
            revoke_fails: false,
        },
    );
    ready(&h, &["a.pdf"]).await;
    assert_ok!(h.session.start_run().await);

    let err = assert_err!(h.session.save_to_sheet().await);
    match err {
        AppError::Export(ExportError::SaveFailed { sheet_name, .. }) => {
            assert_eq!(sheet_name, "Sổ theo dõi")
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // 批次不受影响，可以重试
    assert!(h.session.snapshot().await.has_successful_files);
    assert!(!h.session.snapshot().await.is_saving);
}

#[tokio::test]
async fn test_cancelled_sheet_picker_is_not_an_error() {
    let h = harness_with(
        ScriptedExtractor::default(),
        FakeStorage::default(),
        RecordingSheets::default(),
        FakePicker::new(Some(folder()), None),
        FakeAuth {
            grant: true,
            revoke_fails: false,
        },
    );
    ready(&h, &["a.pdf"]).await;
    assert_ok!(h.session.start_run().await);

    assert_eq!(assert_ok!(h.session.save_to_sheet().await), None);
    assert!(h.sheets.calls().is_empty());
}

// ========== 登录 ==========

#[tokio::test]
async fn test_cancelled_sign_in_skips_folder_picker() {
    let h = harness_with(
        ScriptedExtractor::default(),
        FakeStorage::default(),
        RecordingSheets::default(),
        FakePicker::new(Some(folder()), Some(sheet())),
        FakeAuth {
            grant: false,
            revoke_fails: false,
        },
    );

    assert_eq!(assert_ok!(h.session.choose_folder().await), None);
    assert!(!h.session.is_signed_in().await);
    assert_eq!(h.session.folder().await, None);
}

#[tokio::test]
async fn test_sign_out_clears_user_and_folder_even_if_revoke_fails() {
    let h = harness_with(
        ScriptedExtractor::default(),
        FakeStorage::default(),
        RecordingSheets::default(),
        FakePicker::new(Some(folder()), Some(sheet())),
        FakeAuth {
            grant: true,
            revoke_fails: true,
        },
    );
    assert_eq!(assert_ok!(h.session.choose_folder().await), Some(folder()));
    assert!(h.session.is_signed_in().await);

    let err = assert_err!(h.session.sign_out().await);
    assert!(matches!(err, AppError::Auth(AuthError::RevokeFailed(_))));

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.user, None);
    assert_eq!(snapshot.drive_folder, None);
}
