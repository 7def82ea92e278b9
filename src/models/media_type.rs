/// 文件扩展名 → 媒体类型
///
/// 只用于从目录读取文件时声明媒体类型，未知扩展名返回通用二进制类型
static MEDIA_TYPES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "pdf" => "application/pdf",
    "doc" => "application/msword",
    "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "xls" => "application/vnd.ms-excel",
    "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "txt" => "text/plain",
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// 根据扩展名（不区分大小写）推断媒体类型
pub fn from_extension(ext: &str) -> &'static str {
    MEDIA_TYPES
        .get(ext.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(from_extension("pdf"), "application/pdf");
        assert_eq!(from_extension("PDF"), "application/pdf");
        assert!(from_extension("docx").starts_with("application/vnd."));
        assert_eq!(from_extension("bin"), OCTET_STREAM);
    }
}
