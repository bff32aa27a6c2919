//! 文本提取服务 - 业务能力层
//!
//! 只负责"PDF → 纯文本"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `lopdf` 解析 PDF
//! - 上传内容先落到 `tempfile` 临时文件，成功或失败都会在作用域结束时删除

use async_trait::async_trait;
use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::models::SelectedFile;

/// 文本提取结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub pages: usize,
    /// PDF Info 字典（Title、Author、Producer 等）
    #[serde(default)]
    pub info: BTreeMap<String, String>,
}

/// 文本提取能力
///
/// 实现方可以是本地解析，也可以是远程上传接口。
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, file: &SelectedFile) -> PipelineResult<ExtractedText>;
}

/// 本地 PDF 文本提取
///
/// 职责：
/// - 校验类型与大小
/// - 写临时文件并用 lopdf 解析
/// - 逐页提取文本，合并后去除首尾空白
/// - 读取 Info 字典
#[derive(Debug, Default, Clone)]
pub struct PdfTextExtractor {
    temp_dir: Option<PathBuf>,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定临时文件目录（默认使用系统临时目录）
    pub fn with_temp_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    fn parse(&self, file: &SelectedFile) -> PipelineResult<ExtractedText> {
        let upload_failed = |cause: String| PipelineError::stage_failed(Stage::Upload, file.name(), cause);

        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(".pdf");
        let mut temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| upload_failed(format!("无法创建临时文件: {}", e)))?;

        temp.write_all(file.content())
            .and_then(|_| temp.flush())
            .map_err(|e| upload_failed(format!("无法写入临时文件: {}", e)))?;

        debug!("临时文件: {}", temp.path().display());

        let doc = Document::load(temp.path()).map_err(|e| {
            warn!("PDF 解析失败 ({}): {}", file.name(), e);
            upload_failed(
                "Failed to parse PDF file. Please ensure the file is a valid PDF.".to_string(),
            )
        })?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut text = String::new();
        for page_number in &page_numbers {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => debug!("第 {} 页文本提取失败: {}", page_number, e),
            }
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(upload_failed("No text content found in PDF".to_string()));
        }

        Ok(ExtractedText {
            text,
            pages: page_numbers.len(),
            info: read_info(&doc),
        })
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, file: &SelectedFile) -> PipelineResult<ExtractedText> {
        file.validate()?;

        debug!(
            "本地解析 PDF: {} | 类型: {} | 大小: {} 字节",
            file.name(),
            file.mime_type(),
            file.size()
        );

        let extractor = self.clone();
        let owned = file.clone();
        tokio::task::spawn_blocking(move || extractor.parse(&owned))
            .await
            .map_err(|e| PipelineError::stage_failed(Stage::Upload, file.name(), e.to_string()))?
    }
}

/// 读取 trailer 中的 Info 字典，只保留字符串值
fn read_info(doc: &Document) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();

    let dict = match doc
        .trailer
        .get(b"Info")
        .and_then(|obj| obj.as_reference())
        .and_then(|id| doc.get_dictionary(id))
    {
        Ok(dict) => dict,
        Err(_) => return info,
    };

    for (key, value) in dict.iter() {
        if let Object::String(bytes, _) = value {
            info.insert(
                String::from_utf8_lossy(key).to_string(),
                decode_pdf_string(bytes),
            );
        }
    }

    info
}

/// PDF 文本字符串：带 BOM 的 UTF-16BE，否则按 UTF-8 宽松解码
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    /// 生成一页带文字的 PDF
    fn sample_pdf(line: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Discharge summary"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn temp_dir_is_empty(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_extracts_text_pages_and_info() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfTextExtractor::with_temp_dir(dir.path());
        let file = SelectedFile::new("a.pdf", "application/pdf", sample_pdf("Patient Jane Citizen"));

        let extracted = extractor.extract_text(&file).await.unwrap();

        assert!(extracted.text.contains("Jane Citizen"), "{:?}", extracted.text);
        assert_eq!(extracted.pages, 1);
        assert_eq!(
            extracted.info.get("Title").map(String::as_str),
            Some("Discharge summary")
        );
        assert!(temp_dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_upload_error_and_temp_removed() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfTextExtractor::with_temp_dir(dir.path());
        let file = SelectedFile::new("broken.pdf", "application/pdf", b"not a pdf".to_vec());

        let err = extractor.extract_text(&file).await.unwrap_err();

        assert!(matches!(err, PipelineError::Upload { ref file, .. } if file == "broken.pdf"));
        assert!(temp_dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_rejects_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfTextExtractor::with_temp_dir(dir.path());
        let file = SelectedFile::new("photo.jpg", "image/jpeg", vec![0xFF, 0xD8]);

        let err = extractor.extract_text(&file).await.unwrap_err();

        assert!(matches!(err, PipelineError::Validation { .. }));
        assert!(temp_dir_is_empty(dir.path()));
    }

    #[test]
    fn test_decode_pdf_string_utf16() {
        let bytes = [0xFE, 0xFF, 0x00, 0x45, 0x00, 0x43, 0x00, 0x47];
        assert_eq!(decode_pdf_string(&bytes), "ECG");
        assert_eq!(decode_pdf_string(b"Letter"), "Letter");
    }
}
