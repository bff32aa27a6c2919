use crate::models::document::SelectedFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从磁盘读取一个文件作为 SelectedFile，类型按扩展名推断
pub async fn load_selected_file(path: &Path) -> Result<SelectedFile> {
    let content = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("无效的文件路径: {}", path.display()))?;

    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();

    Ok(SelectedFile::new(name, mime_type, content))
}

/// 从文件夹中加载所有 PDF 文件，按文件名排序
pub async fn load_all_pdf_files(folder_path: &str) -> Result<Vec<SelectedFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
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

        match load_selected_file(&path).await {
            Ok(file) => {
                tracing::info!("成功加载 {} ({})", file.name(), file.size_label());
                files.push(file);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_selected_file_guesses_pdf_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let file = load_selected_file(&path).await.unwrap();
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.mime_type(), "application/pdf");
        assert_eq!(file.size(), 8);
    }

    #[tokio::test]
    async fn test_load_all_pdf_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"b").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = load_all_pdf_files(dir.path().to_str().unwrap()).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        assert!(load_all_pdf_files("/definitely/not/here").await.is_err());
    }
}
