//! 输入表格样本生成
//!
//! 按标准列顺序写出表头，列位置与位置推测的列字母一致。

use crate::error::{ReportError, Result};
use ndt_report_common::columns::column_index_from_letter;
use ndt_report_common::profile::standard_columns;
use ndt_report_common::ReportProfile;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use std::path::Path;

pub fn write_sample_workbook(profile: &ReportProfile, output: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(&profile.title)
        .map_err(|e| ReportError::ExcelGeneration(e.to_string()))?;

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_background_color(Color::RGB(0xD9E1F2));
    let unused_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_font_color(Color::Gray);

    for spec in standard_columns() {
        let Some(col) = spec.fallback.as_deref().and_then(column_index_from_letter) else {
            continue;
        };
        let label = spec.keywords.first().cloned().unwrap_or_else(|| spec.field.label().to_string());
        // 本报表不使用的列以灰色表示
        let format = if profile.column_spec(spec.field).is_some() {
            &header_format
        } else {
            &unused_format
        };

        worksheet
            .write_string_with_format(0, col as u16, &label, format)
            .map_err(|e| ReportError::ExcelGeneration(e.to_string()))?;
        worksheet
            .set_column_width(col as u16, 14)
            .map_err(|e| ReportError::ExcelGeneration(e.to_string()))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| ReportError::ExcelGeneration(e.to_string()))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    workbook
        .save(output)
        .map_err(|e| ReportError::ExcelGeneration(format!("{}: {}", output.display(), e)))?;

    Ok(())
}
