//! 报表配置
//!
//! 每种报表（委托台账、结果通知单、表面检测通知单、射线检测记录）
//! 的列规则、占位符、表格列和复选框组。内置预设之外也可以从 JSON 读取。

use crate::checkbox::{PatternDictionary, RAY_SOURCE_PATTERNS, TIMING_PATTERNS};
use crate::columns::ColumnSpec;
use crate::error::{Error, Result};
use crate::types::Field;
use serde::{Deserialize, Serialize};

pub const PARAM_PROJECT_NAME: &str = "project_name";
pub const PARAM_CLIENT: &str = "client";
pub const PARAM_INSPECTION_STANDARD: &str = "inspection_standard";
pub const PARAM_INSPECTION_METHOD: &str = "inspection_method";
pub const PARAM_ACCEPTANCE_LEVEL: &str = "acceptance_level";

/// 报表种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    /// 射线检测委托台账
    RequestLog,
    /// 射线检测结果通知单
    ResultNotice,
    /// 表面检测结果通知单
    SurfaceNotice,
    /// 射线检测记录
    ExposureRecord,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::RequestLog,
        ReportKind::ResultNotice,
        ReportKind::SurfaceNotice,
        ReportKind::ExposureRecord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::RequestLog => "request-log",
            ReportKind::ResultNotice => "result-notice",
            ReportKind::SurfaceNotice => "surface-notice",
            ReportKind::ExposureRecord => "exposure-record",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::RequestLog => "射线检测委托台账",
            ReportKind::ResultNotice => "射线检测结果通知单",
            ReportKind::SurfaceNotice => "表面检测结果通知单",
            ReportKind::ExposureRecord => "射线检测记录",
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "request-log" | "request" | "委托台账" => Ok(ReportKind::RequestLog),
            "result-notice" | "result" | "结果通知单" => Ok(ReportKind::ResultNotice),
            "surface-notice" | "surface" | "表面检测" => Ok(ReportKind::SurfaceNotice),
            "exposure-record" | "exposure" | "射线检测记录" => Ok(ReportKind::ExposureRecord),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 占位符的取值来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderSource {
    /// 命令行参数
    Param(String),
    /// 命令行参数，未指定时取组内字段值
    ParamOrField { param: String, field: Field },
    /// 组内第一个非空字段值
    Field(Field),
    /// 组内最大日期（无法解析时为当天）
    MaxDate(Field),
    OrderNo,
    RayType,
    Today,
    RecordCount,
    SheetTotal,
}

/// 模板中的占位符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    pub token: String,
    pub source: PlaceholderSource,
}

impl PlaceholderSpec {
    pub fn new(token: &str, source: PlaceholderSource) -> Self {
        Self {
            token: token.to_string(),
            source,
        }
    }
}

/// 数据表格中的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumnSpec {
    pub field: Field,
    /// 表头单元格关键字
    pub keywords: Vec<String>,
}

impl TableColumnSpec {
    pub fn new(field: Field, keywords: &[&str]) -> Self {
        Self {
            field,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// 复选框组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxGroupSpec {
    /// 选项所在行的标题关键字，如 "检测时机"
    pub keyword: String,
    pub field: Field,
    #[serde(default)]
    pub patterns: PatternDictionary,
}

/// 一种报表的全部规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProfile {
    pub kind: ReportKind,
    pub title: String,
    /// 按射线类型再分组
    #[serde(default)]
    pub group_by_ray_type: bool,
    pub columns: Vec<ColumnSpec>,
    /// 定位数据表格的表头关键字
    pub table_keywords: Vec<String>,
    pub table_columns: Vec<TableColumnSpec>,
    /// 表尾行（备注、签字等）的关键字
    #[serde(default)]
    pub footer_keywords: Vec<String>,
    #[serde(default)]
    pub placeholders: Vec<PlaceholderSpec>,
    #[serde(default)]
    pub checkboxes: Vec<CheckboxGroupSpec>,
    /// 按张数展开行和片号
    #[serde(default)]
    pub expand_by_sheet_count: bool,
    /// 表头跨页重复
    #[serde(default)]
    pub repeat_header: bool,
    /// 写在第一空行的文字，如 "以下空白"
    #[serde(default)]
    pub blank_marker: Option<String>,
    /// 日期格式（未指定时使用用户配置）
    #[serde(default)]
    pub date_format: Option<String>,
}

impl ReportProfile {
    /// 内置预设
    pub fn preset(kind: ReportKind) -> Self {
        match kind {
            ReportKind::RequestLog => request_log_preset(),
            ReportKind::ResultNotice => result_notice_preset(),
            ReportKind::SurfaceNotice => surface_notice_preset(),
            ReportKind::ExposureRecord => exposure_record_preset(),
        }
    }

    /// JSON 文件读取
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON 字符串读取
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 缺少分组列或表格关键字的配置无法生成报告
    pub fn validate(&self) -> Result<()> {
        if !self.columns.iter().any(|c| c.field == Field::OrderNo) {
            return Err(Error::Config(format!(
                "{}: 缺少委托单编号的列规则",
                self.title
            )));
        }
        if self.group_by_ray_type && !self.columns.iter().any(|c| c.field == Field::RayType) {
            return Err(Error::Config(format!(
                "{}: 按射线类型分组但缺少射线类型的列规则",
                self.title
            )));
        }
        if self.table_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::Config(format!("{}: 缺少表格关键字", self.title)));
        }
        Ok(())
    }

    pub fn column_spec(&self, field: Field) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }
}

/// 输入表格的标准列（`sample` 命令按此顺序输出表头）
pub fn standard_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(Field::OrderNo, &["委托单编号", "委托单号", "委托编号"], Some("A")),
        ColumnSpec::new(Field::Date, &["完成日期", "检测日期", "委托日期", "日期"], Some("B")),
        ColumnSpec::new(Field::InspectionNo, &["检件编号", "检件号"], Some("C")),
        ColumnSpec::new(Field::WeldNo, &["焊口号", "焊口编号", "焊缝编号"], Some("D")),
        ColumnSpec::new(Field::WelderNo, &["焊工号", "焊工代号", "焊工"], Some("E")),
        ColumnSpec::new(Field::Specification, &["规格"], Some("F")),
        ColumnSpec::new(Field::Material, &["材质"], Some("G")),
        ColumnSpec::new(Field::QualifiedLevel, &["合格级别"], Some("H")),
        ColumnSpec::new(Field::DetectionRatio, &["检测比例"], Some("I")),
        ColumnSpec::new(Field::DetectionMethod, &["检测方法"], Some("J")),
        ColumnSpec::new(Field::DetectionTiming, &["检测时机"], Some("K")),
        ColumnSpec::new(Field::SheetCount, &["张数", "拍片数", "片数"], Some("L")),
        ColumnSpec::new(Field::RayType, &["射线类型", "射线种类", "射线源"], Some("M")),
        ColumnSpec::new(Field::UnitName, &["单位名称", "施工单位"], Some("N")),
        ColumnSpec::new(Field::Evaluation, &["检测结果", "评定级别", "评定结果"], Some("O")),
        ColumnSpec::new(Field::Remarks, &["备注"], Some("P")),
    ]
}

fn columns_for(fields: &[Field]) -> Vec<ColumnSpec> {
    standard_columns()
        .into_iter()
        .filter(|c| fields.contains(&c.field))
        .collect()
}

fn footer_keywords() -> Vec<String> {
    ["备注", "评定人", "评片人", "审核", "检测人", "签字", "以下空白"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn common_placeholders() -> Vec<PlaceholderSpec> {
    vec![
        PlaceholderSpec::new(
            "工程名称参数值",
            PlaceholderSource::Param(PARAM_PROJECT_NAME.into()),
        ),
        PlaceholderSpec::new(
            "委托单位参数值",
            PlaceholderSource::ParamOrField {
                param: PARAM_CLIENT.into(),
                field: Field::UnitName,
            },
        ),
        PlaceholderSpec::new("委托单编号值", PlaceholderSource::OrderNo),
        PlaceholderSpec::new(
            "检测标准值",
            PlaceholderSource::Param(PARAM_INSPECTION_STANDARD.into()),
        ),
    ]
}

fn request_log_preset() -> ReportProfile {
    let mut placeholders = common_placeholders();
    placeholders.extend([
        PlaceholderSpec::new("委托日期值", PlaceholderSource::MaxDate(Field::Date)),
        PlaceholderSpec::new(
            "检测方法值",
            PlaceholderSource::ParamOrField {
                param: PARAM_INSPECTION_METHOD.into(),
                field: Field::DetectionMethod,
            },
        ),
        PlaceholderSpec::new("检测比例值", PlaceholderSource::Field(Field::DetectionRatio)),
        PlaceholderSpec::new(
            "合格级别值",
            PlaceholderSource::ParamOrField {
                param: PARAM_ACCEPTANCE_LEVEL.into(),
                field: Field::QualifiedLevel,
            },
        ),
        PlaceholderSpec::new("检件数量值", PlaceholderSource::RecordCount),
    ]);

    ReportProfile {
        kind: ReportKind::RequestLog,
        title: ReportKind::RequestLog.title().into(),
        group_by_ray_type: false,
        columns: columns_for(&[
            Field::OrderNo,
            Field::Date,
            Field::InspectionNo,
            Field::WeldNo,
            Field::WelderNo,
            Field::Specification,
            Field::Material,
            Field::QualifiedLevel,
            Field::DetectionRatio,
            Field::DetectionMethod,
            Field::DetectionTiming,
            Field::UnitName,
        ]),
        table_keywords: vec!["检件编号".into(), "焊口号".into()],
        table_columns: vec![
            TableColumnSpec::new(Field::SerialNo, &["序号"]),
            TableColumnSpec::new(Field::InspectionNo, &["检件编号"]),
            TableColumnSpec::new(Field::WeldNo, &["焊口号", "焊缝编号"]),
            TableColumnSpec::new(Field::WelderNo, &["焊工号", "焊工代号"]),
            TableColumnSpec::new(Field::Specification, &["规格"]),
            TableColumnSpec::new(Field::Material, &["材质"]),
            TableColumnSpec::new(Field::DetectionRatio, &["检测比例"]),
            TableColumnSpec::new(Field::DetectionTiming, &["检测时机"]),
        ],
        footer_keywords: footer_keywords(),
        placeholders,
        checkboxes: Vec::new(),
        expand_by_sheet_count: false,
        repeat_header: true,
        blank_marker: Some("以下空白".into()),
        date_format: None,
    }
}

fn result_notice_preset() -> ReportProfile {
    let mut placeholders = common_placeholders();
    placeholders.extend([
        PlaceholderSpec::new("检测日期值", PlaceholderSource::MaxDate(Field::Date)),
        PlaceholderSpec::new(
            "合格级别值",
            PlaceholderSource::ParamOrField {
                param: PARAM_ACCEPTANCE_LEVEL.into(),
                field: Field::QualifiedLevel,
            },
        ),
        PlaceholderSpec::new("检测数量值", PlaceholderSource::RecordCount),
        PlaceholderSpec::new("底片张数值", PlaceholderSource::SheetTotal),
        PlaceholderSpec::new("签发日期值", PlaceholderSource::Today),
    ]);

    ReportProfile {
        kind: ReportKind::ResultNotice,
        title: ReportKind::ResultNotice.title().into(),
        group_by_ray_type: false,
        columns: columns_for(&[
            Field::OrderNo,
            Field::Date,
            Field::InspectionNo,
            Field::WeldNo,
            Field::WelderNo,
            Field::Specification,
            Field::QualifiedLevel,
            Field::SheetCount,
            Field::UnitName,
            Field::Evaluation,
            Field::Remarks,
        ]),
        table_keywords: vec!["检件编号".into(), "焊口号".into()],
        table_columns: vec![
            TableColumnSpec::new(Field::SerialNo, &["序号"]),
            TableColumnSpec::new(Field::InspectionNo, &["检件编号"]),
            TableColumnSpec::new(Field::WeldNo, &["焊口号", "焊缝编号"]),
            TableColumnSpec::new(Field::WelderNo, &["焊工号", "焊工代号"]),
            TableColumnSpec::new(Field::Specification, &["规格"]),
            TableColumnSpec::new(Field::SheetCount, &["张数", "拍片数"]),
            TableColumnSpec::new(Field::Evaluation, &["评定级别", "检测结果", "评定结果"]),
            TableColumnSpec::new(Field::Remarks, &["备注"]),
        ],
        footer_keywords: footer_keywords(),
        placeholders,
        checkboxes: Vec::new(),
        expand_by_sheet_count: false,
        repeat_header: true,
        blank_marker: Some("以下空白".into()),
        date_format: None,
    }
}

fn surface_notice_preset() -> ReportProfile {
    let mut placeholders = common_placeholders();
    placeholders.extend([
        PlaceholderSpec::new("检测日期值", PlaceholderSource::MaxDate(Field::Date)),
        PlaceholderSpec::new(
            "检测方法值",
            PlaceholderSource::ParamOrField {
                param: PARAM_INSPECTION_METHOD.into(),
                field: Field::DetectionMethod,
            },
        ),
        PlaceholderSpec::new(
            "合格级别值",
            PlaceholderSource::ParamOrField {
                param: PARAM_ACCEPTANCE_LEVEL.into(),
                field: Field::QualifiedLevel,
            },
        ),
        PlaceholderSpec::new("检测数量值", PlaceholderSource::RecordCount),
    ]);

    ReportProfile {
        kind: ReportKind::SurfaceNotice,
        title: ReportKind::SurfaceNotice.title().into(),
        group_by_ray_type: false,
        columns: columns_for(&[
            Field::OrderNo,
            Field::Date,
            Field::InspectionNo,
            Field::WeldNo,
            Field::WelderNo,
            Field::Specification,
            Field::Material,
            Field::QualifiedLevel,
            Field::DetectionMethod,
            Field::UnitName,
            Field::Evaluation,
            Field::Remarks,
        ]),
        table_keywords: vec!["检件编号".into(), "焊口号".into()],
        table_columns: vec![
            TableColumnSpec::new(Field::SerialNo, &["序号"]),
            TableColumnSpec::new(Field::InspectionNo, &["检件编号"]),
            TableColumnSpec::new(Field::WeldNo, &["焊口号", "焊缝编号"]),
            TableColumnSpec::new(Field::WelderNo, &["焊工号", "焊工代号"]),
            TableColumnSpec::new(Field::Specification, &["规格"]),
            TableColumnSpec::new(Field::Material, &["材质"]),
            TableColumnSpec::new(Field::Evaluation, &["检测结果", "评定结果"]),
            TableColumnSpec::new(Field::Remarks, &["备注"]),
        ],
        footer_keywords: footer_keywords(),
        placeholders,
        checkboxes: Vec::new(),
        expand_by_sheet_count: false,
        repeat_header: true,
        blank_marker: Some("以下空白".into()),
        date_format: None,
    }
}

fn exposure_record_preset() -> ReportProfile {
    let mut placeholders = common_placeholders();
    placeholders.extend([
        PlaceholderSpec::new("射线类型值", PlaceholderSource::RayType),
        PlaceholderSpec::new("检测日期值", PlaceholderSource::MaxDate(Field::Date)),
        PlaceholderSpec::new(
            "合格级别值",
            PlaceholderSource::ParamOrField {
                param: PARAM_ACCEPTANCE_LEVEL.into(),
                field: Field::QualifiedLevel,
            },
        ),
        PlaceholderSpec::new("底片张数值", PlaceholderSource::SheetTotal),
    ]);

    ReportProfile {
        kind: ReportKind::ExposureRecord,
        title: ReportKind::ExposureRecord.title().into(),
        group_by_ray_type: true,
        columns: columns_for(&[
            Field::OrderNo,
            Field::Date,
            Field::InspectionNo,
            Field::WeldNo,
            Field::WelderNo,
            Field::Specification,
            Field::Material,
            Field::QualifiedLevel,
            Field::DetectionTiming,
            Field::SheetCount,
            Field::RayType,
            Field::UnitName,
        ]),
        table_keywords: vec!["检件编号".into(), "焊口号".into()],
        table_columns: vec![
            TableColumnSpec::new(Field::SerialNo, &["序号"]),
            TableColumnSpec::new(Field::InspectionNo, &["检件编号"]),
            TableColumnSpec::new(Field::WeldNo, &["焊口号", "焊缝编号"]),
            TableColumnSpec::new(Field::WelderNo, &["焊工号", "焊工代号"]),
            TableColumnSpec::new(Field::Specification, &["规格"]),
            TableColumnSpec::new(Field::FilmNo, &["片号", "底片号"]),
        ],
        footer_keywords: footer_keywords(),
        placeholders,
        checkboxes: vec![
            CheckboxGroupSpec {
                keyword: "检测时机".into(),
                field: Field::DetectionTiming,
                patterns: TIMING_PATTERNS.clone(),
            },
            CheckboxGroupSpec {
                keyword: "射线源".into(),
                field: Field::RayType,
                patterns: RAY_SOURCE_PATTERNS.clone(),
            },
        ],
        expand_by_sheet_count: true,
        repeat_header: true,
        blank_marker: None,
        date_format: None,
    }
}
