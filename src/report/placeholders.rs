//! 占位符的取值和替换

use crate::config::FontStyle;
use crate::docx::text::replace_in_paragraph;
use crate::docx::XmlElement;
use ndt_report_common::grouping::max_date_or_today;
use ndt_report_common::{PlaceholderSource, ReportGroup, ReportProfile};
use std::collections::HashMap;
use tracing::debug;

/// 命令行参数（键 → 值）
pub type Params = HashMap<String, String>;

fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// 一个占位符的值
pub fn resolve_source(
    source: &PlaceholderSource,
    group: &ReportGroup,
    params: &Params,
    date_format: &str,
) -> String {
    match source {
        PlaceholderSource::Param(key) => param(params, key).unwrap_or("").to_string(),
        PlaceholderSource::ParamOrField { param: key, field } => param(params, key)
            .or_else(|| group.first_value(*field))
            .unwrap_or("")
            .to_string(),
        PlaceholderSource::Field(field) => group.first_value(*field).unwrap_or("").to_string(),
        PlaceholderSource::MaxDate(field) => max_date_or_today(group, *field)
            .format(date_format)
            .to_string(),
        PlaceholderSource::OrderNo => group.order_no.clone(),
        PlaceholderSource::RayType => group.ray_type.clone().unwrap_or_default(),
        PlaceholderSource::Today => chrono::Local::now()
            .date_naive()
            .format(date_format)
            .to_string(),
        PlaceholderSource::RecordCount => group.records.len().to_string(),
        PlaceholderSource::SheetTotal => group.total_sheets().to_string(),
    }
}

/// 本组的 (占位符, 值) 列表
///
/// 长的占位符排在前面，避免被其中包含的短占位符先行替换。
pub fn resolve_placeholders(
    profile: &ReportProfile,
    group: &ReportGroup,
    params: &Params,
    date_format: &str,
) -> Vec<(String, String)> {
    let mut replacements: Vec<(String, String)> = profile
        .placeholders
        .iter()
        .filter(|p| !p.token.is_empty())
        .map(|p| (p.token.clone(), resolve_source(&p.source, group, params, date_format)))
        .collect();
    replacements.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    replacements
}

/// 部件内所有段落（含表格、文本框）替换占位符，返回替换次数
pub fn fill_placeholders(
    root: &mut XmlElement,
    replacements: &[(String, String)],
    font: &FontStyle,
) -> usize {
    let mut total = 0;
    root.for_each_mut("w:p", &mut |p: &mut XmlElement| {
        total += replace_in_paragraph(p, replacements, Some(font));
    });
    debug!(total, "占位符替换");
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::text::paragraph_text;
    use crate::docx::XmlDocument;
    use ndt_report_common::{Field, Record, ReportKind};

    fn group() -> ReportGroup {
        ReportGroup {
            order_no: "WT-2024-01".into(),
            ray_type: Some("X射线".into()),
            records: vec![
                Record::new(2)
                    .with(Field::Date, "2024-05-01")
                    .with(Field::SheetCount, "3"),
                Record::new(3)
                    .with(Field::Date, "2024/05/09")
                    .with(Field::UnitName, "一公司"),
            ],
        }
    }

    #[test]
    fn test_resolve_sources() {
        let g = group();
        let mut params = Params::new();
        params.insert("client".into(), "  ".into());
        params.insert("project_name".into(), "乙烯装置".into());

        let fmt = "%Y-%m-%d";
        assert_eq!(resolve_source(&PlaceholderSource::Param("project_name".into()), &g, &params, fmt), "乙烯装置");
        // 空白参数按未指定处理
        let client = PlaceholderSource::ParamOrField {
            param: "client".into(),
            field: Field::UnitName,
        };
        assert_eq!(resolve_source(&client, &g, &params, fmt), "一公司");
        assert_eq!(resolve_source(&PlaceholderSource::MaxDate(Field::Date), &g, &params, fmt), "2024-05-09");
        assert_eq!(resolve_source(&PlaceholderSource::SheetTotal, &g, &params, fmt), "4");
        assert_eq!(resolve_source(&PlaceholderSource::RecordCount, &g, &params, fmt), "2");
        assert_eq!(resolve_source(&PlaceholderSource::RayType, &g, &params, fmt), "X射线");
    }

    #[test]
    fn test_fill_placeholders_in_body_and_table() {
        let mut doc = XmlDocument::parse(
            "<w:document><w:body>\
             <w:p><w:r><w:t>编号：委托单编号值</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>工程名称参数</w:t></w:r><w:r><w:t>值</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             </w:body></w:document>",
        )
        .unwrap();

        let profile = ReportProfile::preset(ReportKind::RequestLog);
        let mut params = Params::new();
        params.insert("project_name".into(), "乙烯装置".into());
        let replacements = resolve_placeholders(&profile, &group(), &params, "%Y-%m-%d");

        let n = fill_placeholders(&mut doc.root, &replacements, &FontStyle::default());
        assert_eq!(n, 2);
        let texts: Vec<String> = doc.root.find_all("w:p").into_iter().map(paragraph_text).collect();
        assert_eq!(texts, vec!["编号：WT-2024-01", "乙烯装置"]);
    }
}
