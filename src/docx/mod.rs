//! Word（docx）模板的读写
//!
//! - `package`: 压缩包条目
//! - `xml`: 部件的元素树
//! - `text`: 段落和 run 的文字操作
//! - `table`: 表格行列操作

pub mod package;
pub mod table;
pub mod text;
pub mod xml;

pub use package::{DocxPackage, DOCUMENT_PART};
pub use xml::{XmlDocument, XmlElement, XmlNode};
