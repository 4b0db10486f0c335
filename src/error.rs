use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("Excel 读取错误: {0}")]
    ExcelRead(String),

    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("缺少必需的列: {0}")]
    MissingColumn(String),

    #[error("模板无效: {0}")]
    InvalidTemplate(String),

    #[error("XML 解析错误: {0}")]
    Xml(String),

    #[error("docx 压缩包错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Excel 生成错误: {0}")]
    ExcelGeneration(String),

    #[error("JSON 解析错误: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("没有生成任何报告: {0}")]
    NoReportsGenerated(String),

    #[error(transparent)]
    Common(#[from] ndt_report_common::Error),
}

impl From<quick_xml::Error> for ReportError {
    fn from(err: quick_xml::Error) -> Self {
        ReportError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ReportError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ReportError::Xml(err.to_string())
    }
}

impl From<calamine::Error> for ReportError {
    fn from(err: calamine::Error) -> Self {
        ReportError::ExcelRead(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
