//! 检测数据的类型定义
//!
//! - Field: 报表中使用的逻辑字段
//! - Record: Excel 中的一行检测数据
//! - ReportGroup: 生成一份报告所需的数据行集合

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 逻辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    OrderNo,          // 委托单编号
    RayType,          // 射线类型
    Date,             // 完成日期 / 委托日期
    InspectionNo,     // 检件编号
    WeldNo,           // 焊口号
    WelderNo,         // 焊工号
    Specification,    // 规格
    Material,         // 材质
    QualifiedLevel,   // 合格级别
    DetectionRatio,   // 检测比例
    DetectionMethod,  // 检测方法
    DetectionTiming,  // 检测时机
    SheetCount,       // 张数
    UnitName,         // 单位名称
    Evaluation,       // 检测结果 / 评定级别
    Remarks,          // 备注
    SerialNo,         // 序号（表格专用）
    FilmNo,           // 片号（表格专用）
}

impl Field {
    /// 由表格生成、不从 Excel 读取的字段
    pub fn is_derived(&self) -> bool {
        matches!(self, Field::SerialNo | Field::FilmNo)
    }

    /// 中文名称
    pub fn label(&self) -> &'static str {
        match self {
            Field::OrderNo => "委托单编号",
            Field::RayType => "射线类型",
            Field::Date => "日期",
            Field::InspectionNo => "检件编号",
            Field::WeldNo => "焊口号",
            Field::WelderNo => "焊工号",
            Field::Specification => "规格",
            Field::Material => "材质",
            Field::QualifiedLevel => "合格级别",
            Field::DetectionRatio => "检测比例",
            Field::DetectionMethod => "检测方法",
            Field::DetectionTiming => "检测时机",
            Field::SheetCount => "张数",
            Field::UnitName => "单位名称",
            Field::Evaluation => "检测结果",
            Field::Remarks => "备注",
            Field::SerialNo => "序号",
            Field::FilmNo => "片号",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Excel 中的一行检测数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Excel 行号（1 起始）
    pub row_number: usize,
    values: HashMap<Field, String>,
}

impl Record {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            values: HashMap::new(),
        }
    }

    /// 设置字段值（去除首尾空白）
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        self.values.insert(field, value.trim().to_string());
    }

    /// 字段值，未解析的字段返回空字符串
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// 张数，无法解析为正整数时返回 None
    pub fn sheet_count(&self) -> Option<u32> {
        parse_count(self.get(Field::SheetCount))
    }
}

/// 一个检件的张数上限，超过时按无法解析处理
pub const MAX_SHEET_COUNT: u32 = 999;

/// 将 "3"、"3.0"、"7张" 等张数写法转换为整数
pub fn parse_count(value: &str) -> Option<u32> {
    let trimmed = value.trim().trim_end_matches('张').trim();
    if trimmed.is_empty() {
        return None;
    }
    let count = match trimmed.parse::<u64>() {
        Ok(n) => u32::try_from(n).ok()?,
        Err(_) => match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
                f as u32
            }
            _ => return None,
        },
    };
    (count <= MAX_SHEET_COUNT).then_some(count)
}

/// 一份报告的数据（同一委托单编号，可选同一射线类型）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportGroup {
    pub order_no: String,
    pub ray_type: Option<String>,
    pub records: Vec<Record>,
}

impl ReportGroup {
    /// 组内第一个非空的字段值
    pub fn first_value(&self, field: Field) -> Option<&str> {
        self.records
            .iter()
            .map(|r| r.get(field))
            .find(|v| !v.is_empty())
    }

    /// 组内张数合计（无张数的行按 1 计）
    pub fn total_sheets(&self) -> u32 {
        self.records
            .iter()
            .map(|r| r.sheet_count().unwrap_or(1))
            .sum()
    }

    /// 日志用的组标识
    pub fn describe(&self) -> String {
        match &self.ray_type {
            Some(ray) => format!("{} ({})", self.order_no, ray),
            None => self.order_no.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_get_missing_field_is_empty() {
        let record = Record::new(2);
        assert_eq!(record.get(Field::WeldNo), "");
    }

    #[test]
    fn test_record_set_trims() {
        let record = Record::new(2).with(Field::OrderNo, "  WT-001 ");
        assert_eq!(record.get(Field::OrderNo), "WT-001");
    }

    #[test]
    fn test_parse_count_variants() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_count("7张"), Some(7));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count("abc"), None);
    }

    #[test]
    fn test_parse_count_rejects_huge_values() {
        assert_eq!(parse_count("999"), Some(MAX_SHEET_COUNT));
        assert_eq!(parse_count("1000"), None);
        assert_eq!(parse_count("1e10"), None);
        assert_eq!(parse_count("99999999999"), None);
        assert_eq!(parse_count("4294967296"), None);
        assert!(Record::new(2).with(Field::SheetCount, "1e10").sheet_count().is_none());
    }

    #[test]
    fn test_field_serde_snake_case() {
        let json = serde_json::to_string(&Field::InspectionNo).unwrap();
        assert_eq!(json, "\"inspection_no\"");
        let field: Field = serde_json::from_str("\"sheet_count\"").unwrap();
        assert_eq!(field, Field::SheetCount);
    }

    #[test]
    fn test_group_first_value_skips_empty() {
        let group = ReportGroup {
            order_no: "A".into(),
            ray_type: None,
            records: vec![
                Record::new(2),
                Record::new(3).with(Field::UnitName, "一公司"),
            ],
        };
        assert_eq!(group.first_value(Field::UnitName), Some("一公司"));
        assert_eq!(group.first_value(Field::Material), None);
    }

    #[test]
    fn test_group_total_sheets() {
        let group = ReportGroup {
            order_no: "A".into(),
            ray_type: Some("X射线".into()),
            records: vec![
                Record::new(2).with(Field::SheetCount, "3"),
                Record::new(3),
            ],
        };
        assert_eq!(group.total_sheets(), 4);
        assert_eq!(group.describe(), "A (X射线)");
    }
}
