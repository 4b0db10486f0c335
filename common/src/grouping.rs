//! 按委托单编号（和射线类型）分组，以及组内日期的处理

use crate::types::{Field, Record, ReportGroup};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// 将数据行分成报告单位
///
/// 委托单编号为空的行被跳过。组按 (委托单编号, 射线类型) 排序，
/// 组内保持 Excel 中的顺序。
pub fn group_records(records: &[Record], by_ray_type: bool) -> Vec<ReportGroup> {
    let mut groups: BTreeMap<(String, Option<String>), Vec<Record>> = BTreeMap::new();

    for record in records {
        let order_no = record.get(Field::OrderNo);
        if order_no.is_empty() {
            continue;
        }

        let ray_type = if by_ray_type {
            Some(record.get(Field::RayType).to_string()).filter(|r| !r.is_empty())
        } else {
            None
        };

        groups
            .entry((order_no.to_string(), ray_type))
            .or_default()
            .push(record.clone());
    }

    groups
        .into_iter()
        .map(|((order_no, ray_type), records)| ReportGroup {
            order_no,
            ray_type,
            records,
        })
        .collect()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// 日期文本解析
///
/// 支持常见的日期写法、带时间的写法以及 Excel 序列值。
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    // "2024-05-01 00:00:00" 以外的时间后缀
    let date_part = value.split_whitespace().next().unwrap_or(value);
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(date);
        }
    }

    value.parse::<f64>().ok().and_then(excel_serial_to_date)
}

/// Excel 序列值（1900 日期系统）→ 日期
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // 8 位纯数字按 YYYYMMDD 处理，已在上面解析
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// 组内最大日期，全部无法解析时返回 None
pub fn max_date(group: &ReportGroup, field: Field) -> Option<NaiveDate> {
    group
        .records
        .iter()
        .filter_map(|r| parse_date(r.get(field)))
        .max()
}

/// 组内最大日期，无法解析时使用当天
pub fn max_date_or_today(group: &ReportGroup, field: Field) -> NaiveDate {
    max_date(group, field).unwrap_or_else(|| chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, order: &str, ray: &str) -> Record {
        Record::new(row)
            .with(Field::OrderNo, order)
            .with(Field::RayType, ray)
    }

    #[test]
    fn test_group_by_order_number() {
        let records = vec![
            record(2, "B-1", "X"),
            record(3, "A-1", "X"),
            record(4, "B-1", "γ"),
        ];
        let groups = group_records(&records, false);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].order_no, "A-1");
        assert_eq!(groups[1].order_no, "B-1");
        assert_eq!(groups[1].records.len(), 2);
        assert_eq!(groups[1].records[0].row_number, 2);
        assert!(groups[1].ray_type.is_none());
    }

    #[test]
    fn test_group_by_order_and_ray_type() {
        let records = vec![
            record(2, "B-1", "X射线"),
            record(3, "B-1", "γ射线"),
            record(4, "B-1", "X射线"),
        ];
        let groups = group_records(&records, true);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].ray_type.as_deref(), Some("X射线"));
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups[1].ray_type.as_deref(), Some("γ射线"));
    }

    #[test]
    fn test_rows_without_order_number_are_skipped() {
        let records = vec![record(2, "", "X"), record(3, "A", "")];
        let groups = group_records(&records, true);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ray_type, None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_date("2024-05-01"), Some(expected));
        assert_eq!(parse_date("2024/5/1"), Some(expected));
        assert_eq!(parse_date("2024.05.01"), Some(expected));
        assert_eq!(parse_date("2024年5月1日"), Some(expected));
        assert_eq!(parse_date("20240501"), Some(expected));
        assert_eq!(parse_date("2024-05-01 13:45:00"), Some(expected));
        assert_eq!(parse_date("45413"), Some(expected));
        assert_eq!(parse_date("未完成"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_max_date_ignores_unparsable() {
        let group = ReportGroup {
            order_no: "A".into(),
            ray_type: None,
            records: vec![
                Record::new(2).with(Field::Date, "2024-03-01"),
                Record::new(3).with(Field::Date, "待定"),
                Record::new(4).with(Field::Date, "2024-04-15"),
            ],
        };
        assert_eq!(max_date(&group, Field::Date), NaiveDate::from_ymd_opt(2024, 4, 15));
    }

    #[test]
    fn test_max_date_or_today_falls_back() {
        let group = ReportGroup {
            order_no: "A".into(),
            ray_type: None,
            records: vec![Record::new(2).with(Field::Date, "待定")],
        };
        assert_eq!(
            max_date_or_today(&group, Field::Date),
            chrono::Local::now().date_naive()
        );
    }
}
