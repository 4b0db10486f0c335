//! Excel 读取
//!
//! calamine 读取工作表，定位表头行，按列映射生成 Record。

mod sample;

pub use sample::write_sample_workbook;

use crate::error::{ReportError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use ndt_report_common::columns::{column_letter_from_index, ColumnMapping};
use ndt_report_common::grouping::excel_serial_to_date;
use ndt_report_common::types::parse_count;
use ndt_report_common::{Field, Record};
use std::path::Path;
use tracing::{debug, warn};

/// 查找表头行时扫描的行数
const HEADER_SCAN_ROWS: usize = 10;

/// 读取后的工作表（单元格均已转为文本）
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub name: String,
    /// 表头所在行（0 起始）
    pub header_row: usize,
    pub headers: Vec<String>,
    /// (Excel 行号, 单元格文本)
    pub rows: Vec<(usize, Vec<String>)>,
}

/// 单元格 → 文本
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE".into() } else { "FALSE".into() },
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match excel_serial_to_date(serial) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => format_number(serial),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

/// 整数值的浮点数不带小数
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// 工作表读取
///
/// `sheet` 未指定时读取第一个工作表。`header_keywords` 用于在前几行中
/// 定位表头行，找不到时第一行作为表头。
pub fn load_sheet(path: &Path, sheet: Option<&str>, header_keywords: &[String]) -> Result<SheetData> {
    if !path.exists() {
        return Err(ReportError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReportError::ExcelRead(format!("{}: {}", path.display(), e)))?;

    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(s) => names
            .iter()
            .find(|n| n.as_str() == s)
            .cloned()
            .ok_or_else(|| ReportError::SheetNotFound(s.to_string()))?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| ReportError::ExcelRead("工作簿中没有工作表".into()))?,
    };

    let range = workbook.worksheet_range(&name)?;

    // Range 不一定从 A1 开始，补齐前面的空行空列
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<String>> = Vec::new();
    for _ in 0..start_row {
        grid.push(Vec::new());
    }
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col];
        cells.extend(row.iter().map(cell_to_string));
        grid.push(cells);
    }

    Ok(sheet_from_grid(name, grid, header_keywords))
}

/// 文本网格 → SheetData（表头定位 + 去掉空行）
pub fn sheet_from_grid(name: String, grid: Vec<Vec<String>>, header_keywords: &[String]) -> SheetData {
    let header_row = locate_header_row(&grid, header_keywords).unwrap_or(0);
    let headers = grid
        .get(header_row)
        .map(|r| r.iter().map(|h| h.trim().to_string()).collect())
        .unwrap_or_default();

    let rows = grid
        .into_iter()
        .enumerate()
        .skip(header_row + 1)
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(index, cells)| (index + 1, cells))
        .collect();

    debug!(sheet = %name, header_row, "工作表读取完成");

    SheetData {
        name,
        header_row,
        headers,
        rows,
    }
}

/// 前几行中包含关键字的第一行
pub fn locate_header_row(grid: &[Vec<String>], keywords: &[String]) -> Option<usize> {
    let lowered: Vec<String> = keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect();

    grid.iter().take(HEADER_SCAN_ROWS).position(|row| {
        row.iter().any(|cell| {
            let cell = cell.to_lowercase();
            lowered.iter().any(|k| cell.contains(k.as_str()))
        })
    })
}

/// 数据行 → Record
///
/// 位置推测的张数列如果出现无法解析的值会记录警告，
/// 该行按无张数（1 行）处理。
pub fn build_records(sheet: &SheetData, mapping: &ColumnMapping) -> Vec<Record> {
    let mut records = Vec::with_capacity(sheet.rows.len());
    let mut bad_counts: Vec<usize> = Vec::new();

    for (row_number, cells) in &sheet.rows {
        let mut record = Record::new(*row_number);
        for (field, resolution) in mapping.iter() {
            let value = cells.get(resolution.index()).map(String::as_str).unwrap_or("");
            record.set(*field, value);
        }

        let count = record.get(Field::SheetCount);
        if !count.is_empty() && parse_count(count).is_none() {
            bad_counts.push(*row_number);
        }

        records.push(record);
    }

    if !bad_counts.is_empty() {
        if let Some(resolution) = mapping.get(Field::SheetCount) {
            let column = column_letter_from_index(resolution.index());
            if resolution.is_fallback() {
                warn!(
                    "张数列是按位置推测的 {} 列，但第 {:?} 行的值不是整数，请检查列是否正确",
                    column, bad_counts
                );
            } else {
                warn!("张数列 {} 第 {:?} 行的值不是整数，按 1 行处理", column, bad_counts);
            }
        }
    }

    records
}
