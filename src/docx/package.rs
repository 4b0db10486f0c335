//! docx 压缩包读写
//!
//! 所有条目按原顺序读入内存，修改过的 XML 部件写回时替换原内容。

use crate::error::{ReportError, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        let package = Self { entries };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(ReportError::InvalidTemplate(format!("缺少 {}", DOCUMENT_PART)));
        }
        Ok(package)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn part_str(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| ReportError::InvalidTemplate(format!("缺少 {}", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| ReportError::InvalidTemplate(format!("{} 不是 UTF-8: {}", name, e)))
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// 需要替换文字的部件：正文、页眉、页脚
    pub fn text_parts(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(n, _)| n.as_str())
            .filter(|n| is_text_part(n))
            .map(str::to_string)
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, data) in &self.entries {
            if name.ends_with('/') {
                writer.add_directory(name.as_str(), options)?;
                continue;
            }
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn is_text_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && file.ends_with(".xml")
        && (file.starts_with("header") || file.starts_with("footer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_text_parts() {
        assert!(is_text_part("word/document.xml"));
        assert!(is_text_part("word/header1.xml"));
        assert!(is_text_part("word/footer2.xml"));
        assert!(!is_text_part("word/_rels/header1.xml.rels"));
        assert!(!is_text_part("word/styles.xml"));
    }

    #[test]
    fn test_roundtrip_replaces_part() {
        let bytes = build_zip(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", "<w:document/>"),
            ("word/header1.xml", "<w:hdr/>"),
        ]);
        let mut package = DocxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(package.text_parts(), vec!["word/document.xml", "word/header1.xml"]);

        package.set_part(DOCUMENT_PART, b"<w:document><w:body/></w:document>".to_vec());
        let reopened = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reopened.part_str(DOCUMENT_PART).unwrap(),
            "<w:document><w:body/></w:document>"
        );
        assert_eq!(reopened.part("[Content_Types].xml"), Some(&b"<Types/>"[..]));
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = build_zip(&[("[Content_Types].xml", "<Types/>")]);
        assert!(matches!(
            DocxPackage::from_bytes(&bytes),
            Err(ReportError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            DocxPackage::from_bytes(b"plain text"),
            Err(ReportError::Zip(_))
        ));
    }
}
