//! 表格（w:tbl）操作
//!
//! 行号指 w:tbl 下 w:tr 的序号，列号指网格列（考虑 gridSpan）。

use super::text::{paragraph_text, set_paragraph_text, text_paths, element_at_path_mut, set_t_text};
use super::xml::{XmlElement, XmlNode};
use crate::config::FontStyle;

/// 单元格快照
#[derive(Debug, Clone, PartialEq)]
pub struct CellInfo {
    pub grid_col: usize,
    pub span: usize,
    pub text: String,
}

/// w:tr 在 children 中的位置
pub fn row_positions(tbl: &XmlElement) -> Vec<usize> {
    tbl.child_positions("w:tr")
}

pub fn row_count(tbl: &XmlElement) -> usize {
    row_positions(tbl).len()
}

pub fn row(tbl: &XmlElement, index: usize) -> Option<&XmlElement> {
    let position = *row_positions(tbl).get(index)?;
    tbl.element_at(position)
}

pub fn row_mut(tbl: &mut XmlElement, index: usize) -> Option<&mut XmlElement> {
    let position = *row_positions(tbl).get(index)?;
    tbl.element_at_mut(position)
}

fn grid_span(tc: &XmlElement) -> usize {
    tc.child("w:tcPr")
        .and_then(|p| p.child("w:gridSpan"))
        .and_then(|g| g.attr("w:val"))
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

/// 单元格文字（段落间以换行连接）
pub fn cell_text(tc: &XmlElement) -> String {
    tc.children_named("w:p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 行内各单元格
pub fn row_cells(tr: &XmlElement) -> Vec<CellInfo> {
    let mut grid_col = tr
        .child("w:trPr")
        .and_then(|p| p.child("w:gridBefore"))
        .and_then(|g| g.attr("w:val"))
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    tr.children_named("w:tc")
        .map(|tc| {
            let span = grid_span(tc);
            let info = CellInfo {
                grid_col,
                span,
                text: cell_text(tc),
            };
            grid_col += span;
            info
        })
        .collect()
}

/// 覆盖网格列 `grid_col` 的单元格
pub fn cell_at_grid_mut(tr: &mut XmlElement, grid_col: usize) -> Option<&mut XmlElement> {
    let cells = row_cells(tr);
    let index = cells
        .iter()
        .position(|c| grid_col >= c.grid_col && grid_col < c.grid_col + c.span)?;
    let position = *tr.child_positions("w:tc").get(index)?;
    tr.element_at_mut(position)
}

/// 所有行的单元格快照
pub fn table_cells(tbl: &XmlElement) -> Vec<Vec<CellInfo>> {
    tbl.children_named("w:tr").map(row_cells).collect()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `from` 行起第一个包含任一关键字的行（忽略空白）
pub fn find_row_with_keyword(tbl: &XmlElement, keywords: &[String], from: usize) -> Option<usize> {
    let keywords: Vec<String> = keywords.iter().map(|k| compact(k)).filter(|k| !k.is_empty()).collect();
    table_cells(tbl)
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, cells)| {
            cells.iter().any(|cell| {
                let text = compact(&cell.text);
                keywords.iter().any(|k| text.contains(k.as_str()))
            })
        })
        .map(|(i, _)| i)
}

/// 行内第一个包含关键字的单元格的网格列
pub fn find_column_in_row(tbl: &XmlElement, row_index: usize, keywords: &[String]) -> Option<usize> {
    let tr = row(tbl, row_index)?;
    let keywords: Vec<String> = keywords.iter().map(|k| compact(k)).filter(|k| !k.is_empty()).collect();
    row_cells(tr)
        .into_iter()
        .find(|cell| {
            let text = compact(&cell.text);
            keywords.iter().any(|k| text.contains(k.as_str()))
        })
        .map(|cell| cell.grid_col)
}

/// 单元格文字改写，只保留第一个段落
pub fn set_cell_text(tc: &mut XmlElement, text: &str, font: Option<&FontStyle>) {
    let paragraphs = tc.child_positions("w:p");
    if paragraphs.is_empty() {
        tc.children.push(XmlNode::Element(XmlElement::new("w:p")));
    } else {
        // 从后往前删，前面的下标不变
        for &position in paragraphs.iter().skip(1).rev() {
            tc.children.remove(position);
        }
    }
    if let Some(p) = tc.child_mut("w:p") {
        set_paragraph_text(p, text, font);
    }
}

/// 行内所有文字清空（保留格式）
pub fn clear_row_text(tr: &mut XmlElement) {
    tr.for_each_mut("w:p", &mut |p: &mut XmlElement| {
        for path in text_paths(p) {
            if let Some(t) = element_at_path_mut(p, &path) {
                set_t_text(t, "");
            }
        }
    });
}

/// 以 `reference` 行为样板在 `insert_at` 行处插入 `count` 行
///
/// 新行清空文字并去掉纵向合并。`insert_at` 等于行数时追加到末尾。
pub fn insert_rows(tbl: &mut XmlElement, insert_at: usize, count: usize, reference: usize) -> bool {
    let positions = row_positions(tbl);
    let Some(template) = positions.get(reference).and_then(|&p| tbl.element_at(p)).cloned() else {
        return false;
    };

    let mut template = template;
    clear_row_text(&mut template);
    template.for_each_mut("w:tcPr", &mut |tc_pr: &mut XmlElement| {
        tc_pr.remove_children_named("w:vMerge");
    });
    if let Some(tr_pr) = template.child_mut("w:trPr") {
        tr_pr.remove_children_named("w:tblHeader");
    }

    let child_position = match positions.get(insert_at) {
        Some(&p) => p,
        None => positions.last().map(|&p| p + 1).unwrap_or(tbl.children.len()),
    };

    for offset in 0..count {
        tbl.children
            .insert(child_position + offset, XmlNode::Element(template.clone()));
    }
    true
}

/// 0..=last 行设为跨页重复的标题行
pub fn mark_header_rows(tbl: &mut XmlElement, last: usize) {
    for index in 0..=last {
        let Some(tr) = row_mut(tbl, index) else { break };
        // trPr 在 tblPrEx 之后
        let position = usize::from(tr.child("w:tblPrEx").is_some());
        let tr_pr = tr.ensure_child("w:trPr", position);
        if tr_pr.child("w:tblHeader").is_none() {
            tr_pr.children.push(XmlNode::Element(XmlElement::new("w:tblHeader")));
        }
    }
}
