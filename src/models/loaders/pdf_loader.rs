use crate::error::FileError;
use crate::models::document::DocumentPayload;
use crate::models::media_type;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// 读取单个文件并转换为 DocumentPayload
///
/// 媒体类型由扩展名推断，修改时间取文件元数据（毫秒）
pub async fn load_single_file(path: &Path) -> Result<DocumentPayload, FileError> {
    let display = path.display().to_string();

    let bytes = fs::read(path)
        .await
        .map_err(|e| FileError::read_failed(&display, e))?;
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| FileError::read_failed(&display, e))?;

    let last_modified = metadata
        .modified()
        .map(to_millis)
        .unwrap_or_default();

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let media_type = path
        .extension()
        .and_then(|s| s.to_str())
        .map(media_type::from_extension)
        .unwrap_or(media_type::OCTET_STREAM);

    Ok(DocumentPayload::new(file_name, media_type, last_modified, bytes))
}

/// 从文件夹中加载所有文件（按文件名排序）
///
/// 非 PDF 文件也会返回，由批次选择阶段负责过滤和计数；子目录被忽略
pub async fn load_input_files(folder_path: &str) -> Result<Vec<DocumentPayload>, FileError> {
    let folder = PathBuf::from(folder_path);

    let is_dir = fs::metadata(&folder)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        });
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| FileError::read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FileError::read_failed(folder_path, e))?
    {
        let path = entry.path();
        let is_file = fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        match load_single_file(&path).await {
            Ok(file) => files.push(file),
            Err(e) => tracing::warn!("加载文件失败 {}: {}", path.display(), e),
        }
    }

    Ok(files)
}

fn to_millis(time: SystemTime) -> i64 {
    chrono::DateTime::<chrono::Utc>::from(time).timestamp_millis()
}
