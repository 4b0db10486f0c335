//! NDT Report
//!
//! Excel 检测数据按委托单编号分组，批量填入 Word 报告模板。

pub mod cli;
pub mod config;
pub mod docx;
pub mod error;
pub mod excel;
pub mod report;

pub use config::Config;
pub use error::{ReportError, Result};
