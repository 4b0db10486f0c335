//! 数据表格的定位、扩展和写入

use crate::config::FontStyle;
use crate::docx::table::{
    cell_at_grid_mut, find_column_in_row, find_row_with_keyword, insert_rows, mark_header_rows,
    row_count, row_mut, set_cell_text,
};
use crate::docx::XmlElement;
use crate::error::{ReportError, Result};
use ndt_report_common::row_plan::{requirement_for, single_row, total_rows};
use ndt_report_common::{
    plan_expansion, Field, ReportGroup, ReportProfile, RowRequirement, TableCapacity,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 数据表格的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    /// 前序遍历中 w:tbl 的序号
    pub table_index: usize,
    pub header_row: usize,
}

/// 写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFillSummary {
    pub capacity: TableCapacity,
    pub rows_written: usize,
    pub rows_added: usize,
}

/// 第一个含表头关键字的表格
pub fn locate_data_table(root: &XmlElement, keywords: &[String]) -> Option<TableLocation> {
    root.find_all("w:tbl")
        .into_iter()
        .enumerate()
        .find_map(|(table_index, tbl)| {
            find_row_with_keyword(tbl, keywords, 0).map(|header_row| TableLocation {
                table_index,
                header_row,
            })
        })
}

/// 表格列位置: 先找表头行，找不到再找下一行（两级表头）
///
/// 下一行是表尾时只看表头行。
pub fn column_positions(
    tbl: &XmlElement,
    header_row: usize,
    profile: &ReportProfile,
) -> BTreeMap<Field, usize> {
    let next = header_row + 1;
    let next_is_footer = is_footer_row(tbl, next, profile);
    let mut positions = BTreeMap::new();
    for spec in &profile.table_columns {
        let found = find_column_in_row(tbl, header_row, &spec.keywords).or_else(|| {
            if next_is_footer {
                None
            } else {
                find_column_in_row(tbl, next, &spec.keywords)
            }
        });
        match found {
            Some(col) => {
                positions.insert(spec.field, col);
            }
            None => debug!(field = %spec.field, "表格中没有该列"),
        }
    }
    positions
}

/// 表头下一行也是表头（两级表头）时返回 true
///
/// 下一行含表尾关键字时视为表尾，不算表头。
fn has_sub_header(tbl: &XmlElement, header_row: usize, profile: &ReportProfile) -> bool {
    let next = header_row + 1;
    if next >= row_count(tbl) {
        return false;
    }
    if is_footer_row(tbl, next, profile) {
        return false;
    }
    profile.table_columns.iter().any(|spec| {
        find_column_in_row(tbl, header_row, &spec.keywords).is_none()
            && find_column_in_row(tbl, header_row + 1, &spec.keywords).is_some()
    })
}

fn is_footer_row(tbl: &XmlElement, index: usize, profile: &ReportProfile) -> bool {
    find_row_with_keyword(tbl, &profile.footer_keywords, index) == Some(index)
}

/// 表格容量分析
pub fn analyze_capacity(tbl: &XmlElement, header_row: usize, profile: &ReportProfile) -> TableCapacity {
    let first_data_row = if has_sub_header(tbl, header_row, profile) {
        header_row + 2
    } else {
        header_row + 1
    };
    let rows = row_count(tbl);
    let footer_row = find_row_with_keyword(tbl, &profile.footer_keywords, first_data_row);
    let data_end = footer_row.unwrap_or(rows).max(first_data_row);

    TableCapacity {
        header_row,
        first_data_row,
        available_rows: data_end.saturating_sub(first_data_row).min(rows.saturating_sub(first_data_row)),
        footer_row,
    }
}

/// 组内每个检件所需的行
pub fn row_requirements(group: &ReportGroup, expand_by_sheet_count: bool) -> Vec<RowRequirement> {
    group
        .records
        .iter()
        .map(|r| {
            let id = r.get(Field::InspectionNo);
            if expand_by_sheet_count {
                requirement_for(id, r.sheet_count())
            } else {
                single_row(id)
            }
        })
        .collect()
}

/// 表格写入
///
/// 容量不足时在表尾前插入行，然后按检件逐行写入。
/// 多张的检件每行都写检件信息，序号只写在第一行。
pub fn populate_table(
    tbl: &mut XmlElement,
    header_row: usize,
    profile: &ReportProfile,
    group: &ReportGroup,
    font: &FontStyle,
) -> Result<TableFillSummary> {
    let positions = column_positions(tbl, header_row, profile);
    if positions.is_empty() {
        return Err(ReportError::InvalidTemplate(format!(
            "数据表格中找不到任何列（{}）",
            profile
                .table_columns
                .iter()
                .map(|c| c.field.label())
                .collect::<Vec<_>>()
                .join("、")
        )));
    }

    let mut capacity = analyze_capacity(tbl, header_row, profile);
    let requirements = row_requirements(group, profile.expand_by_sheet_count);
    let required = total_rows(&requirements);
    debug!(
        header_row = capacity.header_row,
        first_data_row = capacity.first_data_row,
        available = capacity.available_rows,
        footer_row = ?capacity.footer_row,
        required,
        "表格容量"
    );

    let mut rows_added = 0;
    if let Some(request) = plan_expansion(&capacity, required) {
        if !insert_rows(tbl, request.insert_at, request.rows_to_add, request.reference_row) {
            return Err(ReportError::InvalidTemplate(format!(
                "无法复制第 {} 行",
                request.reference_row + 1
            )));
        }
        rows_added = request.rows_to_add;
        capacity.available_rows += rows_added;
        capacity.footer_row = capacity.footer_row.map(|f| f + rows_added);
    }

    if profile.repeat_header {
        mark_header_rows(tbl, capacity.first_data_row.saturating_sub(1));
    }

    let mut cursor = capacity.first_data_row;
    for (index, (record, requirement)) in group.records.iter().zip(&requirements).enumerate() {
        for offset in 0..requirement.rows {
            let Some(tr) = row_mut(tbl, cursor) else {
                warn!(row = cursor, "表格行不足，剩余数据未写入");
                break;
            };
            for (&field, &col) in &positions {
                let value = match field {
                    Field::SerialNo if offset == 0 => (index + 1).to_string(),
                    Field::SerialNo => String::new(),
                    Field::FilmNo => requirement.film_number(offset).unwrap_or("").to_string(),
                    _ => record.get(field).to_string(),
                };
                if let Some(tc) = cell_at_grid_mut(tr, col) {
                    set_cell_text(tc, &value, Some(font));
                }
            }
            cursor += 1;
        }
    }

    let rows_written = cursor - capacity.first_data_row;
    if let Some(marker) = profile.blank_marker.as_deref().filter(|m| !m.is_empty()) {
        if rows_written < capacity.available_rows {
            let col = marker_column(profile, &positions);
            if let Some(tc) = row_mut(tbl, cursor).and_then(|tr| cell_at_grid_mut(tr, col)) {
                set_cell_text(tc, marker, Some(font));
            }
        }
    }

    Ok(TableFillSummary {
        capacity,
        rows_written,
        rows_added,
    })
}

/// 写 "以下空白" 的列: 第一个非序号列
fn marker_column(profile: &ReportProfile, positions: &BTreeMap<Field, usize>) -> usize {
    profile
        .table_columns
        .iter()
        .filter(|c| c.field != Field::SerialNo)
        .find_map(|c| positions.get(&c.field).copied())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::table::table_cells;
    use crate::docx::XmlDocument;
    use ndt_report_common::{Record, ReportKind};

    fn cell(text: &str) -> String {
        format!("<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>", text)
    }

    fn row(cells: &[&str]) -> String {
        format!("<w:tr>{}</w:tr>", cells.iter().map(|c| cell(c)).collect::<String>())
    }

    /// 表头 + `data_rows` 个空行 + 表尾
    fn template(headers: &[&str], data_rows: usize) -> XmlElement {
        let mut xml = String::from("<w:tbl>");
        xml.push_str(&row(&["射线检测记录"]));
        xml.push_str(&row(headers));
        for _ in 0..data_rows {
            xml.push_str(&row(&vec![""; headers.len()]));
        }
        xml.push_str(&row(&["评定人：", "审核："]));
        xml.push_str("</w:tbl>");
        XmlDocument::parse(&xml).unwrap().root
    }

    fn group(records: Vec<Record>) -> ReportGroup {
        ReportGroup {
            order_no: "A-1".into(),
            ray_type: None,
            records,
        }
    }

    #[test]
    fn test_locate_data_table_skips_layout_tables() {
        let doc = XmlDocument::parse(&format!(
            "<w:body><w:tbl>{}</w:tbl><w:tbl>{}</w:tbl></w:body>",
            row(&["工程名称"]),
            row(&["序号", "检件编号"])
        ))
        .unwrap();
        let location = locate_data_table(&doc.root, &["检件编号".into()]).unwrap();
        assert_eq!(location, TableLocation { table_index: 1, header_row: 0 });
    }

    #[test]
    fn test_capacity_stops_at_footer() {
        let tbl = template(&["序号", "检件编号"], 2);
        let profile = ReportProfile::preset(ReportKind::RequestLog);
        let capacity = analyze_capacity(&tbl, 1, &profile);
        assert_eq!(capacity.first_data_row, 2);
        assert_eq!(capacity.available_rows, 2);
        assert_eq!(capacity.footer_row, Some(4));
    }

    #[test]
    fn test_populate_expands_table_with_blank_marker() {
        let mut tbl = template(&["序号", "检件编号", "焊口号"], 1);
        let profile = ReportProfile::preset(ReportKind::RequestLog);
        let g = group(vec![
            Record::new(2).with(Field::InspectionNo, "W1").with(Field::WeldNo, "H1"),
            Record::new(3).with(Field::InspectionNo, "W2").with(Field::WeldNo, "H2"),
        ]);

        let summary = populate_table(&mut tbl, 1, &profile, &g, &FontStyle::default()).unwrap();
        assert_eq!(summary.rows_added, 1);
        assert_eq!(summary.rows_written, 2);

        let cells = table_cells(&tbl);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[2].iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), vec!["1", "W1", "H1"]);
        assert_eq!(cells[3].iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), vec!["2", "W2", "H2"]);
        assert_eq!(cells[4][0].text, "评定人：");
    }

    #[test]
    fn test_blank_marker_in_first_unused_row() {
        let mut tbl = template(&["序号", "检件编号"], 3);
        let profile = ReportProfile::preset(ReportKind::RequestLog);
        let g = group(vec![Record::new(2).with(Field::InspectionNo, "W1")]);

        populate_table(&mut tbl, 1, &profile, &g, &FontStyle::default()).unwrap();
        let cells = table_cells(&tbl);
        assert_eq!(cells[3][1].text, "以下空白");
        assert_eq!(cells[4][1].text, "");
    }

    #[test]
    fn test_film_numbers_for_exposure_record() {
        let mut tbl = template(&["序号", "检件编号", "片号"], 1);
        let profile = ReportProfile::preset(ReportKind::ExposureRecord);
        let g = group(vec![
            Record::new(2).with(Field::InspectionNo, "W1").with(Field::SheetCount, "2"),
            Record::new(3).with(Field::InspectionNo, "W2").with(Field::SheetCount, "1"),
        ]);

        let summary = populate_table(&mut tbl, 1, &profile, &g, &FontStyle::default()).unwrap();
        assert_eq!(summary.rows_written, 3);

        let cells = table_cells(&tbl);
        let text = |r: usize| cells[r].iter().map(|c| c.text.clone()).collect::<Vec<_>>();
        assert_eq!(text(2), vec!["1", "W1", "1"]);
        assert_eq!(text(3), vec!["", "W1", "2"]);
        assert_eq!(text(4), vec!["2", "W2", ""]);
    }

    #[test]
    fn test_footer_right_after_header_is_not_sub_header() {
        let xml = format!(
            "<w:tbl>{}{}</w:tbl>",
            row(&["序号", "检件编号", "焊口号", "评定级别"]),
            row(&["备注：", "", "", ""])
        );
        let mut tbl = XmlDocument::parse(&xml).unwrap().root;
        let profile = ReportProfile::preset(ReportKind::ResultNotice);

        let capacity = analyze_capacity(&tbl, 0, &profile);
        assert_eq!(capacity.first_data_row, 1);
        assert_eq!(capacity.available_rows, 0);
        assert_eq!(capacity.footer_row, Some(1));
        assert!(!column_positions(&tbl, 0, &profile).contains_key(&Field::Remarks));

        let g = group(vec![Record::new(2).with(Field::InspectionNo, "W1")]);
        let summary = populate_table(&mut tbl, 0, &profile, &g, &FontStyle::default()).unwrap();
        assert_eq!(summary.rows_added, 1);

        let cells = table_cells(&tbl);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1][0].text, "1");
        assert_eq!(cells[1][1].text, "W1");
        assert_eq!(cells[2][0].text, "备注：");
    }

    #[test]
    fn test_two_level_header() {
        let xml = format!(
            "<w:tbl>{}{}{}</w:tbl>",
            row(&["检件编号", "焊口信息"]),
            row(&["", "焊口号"]),
            row(&["", ""])
        );
        let tbl = XmlDocument::parse(&xml).unwrap().root;
        let profile = ReportProfile::preset(ReportKind::RequestLog);
        let capacity = analyze_capacity(&tbl, 0, &profile);
        assert_eq!(capacity.first_data_row, 2);
        assert_eq!(column_positions(&tbl, 0, &profile).get(&Field::WeldNo), Some(&1));
    }
}
