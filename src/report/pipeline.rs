//! 报告生成的整体流程
//!
//! Excel 读取 → 列解析 → 分组 → 每组打开模板副本、替换、写表格、勾选 → 保存

use super::checkboxes::apply_checkboxes;
use super::placeholders::{fill_placeholders, resolve_placeholders, Params};
use super::table_fill::{locate_data_table, populate_table};
use crate::config::{validate_date_format, Config};
use crate::docx::{DocxPackage, XmlDocument, DOCUMENT_PART};
use crate::error::{ReportError, Result};
use crate::excel::{build_records, load_sheet, SheetData};
use indicatif::{ProgressBar, ProgressStyle};
use ndt_report_common::columns::{resolve_columns, ColumnMapping};
use ndt_report_common::naming::{default_output_dir, output_path};
use ndt_report_common::{group_records, Field, ReportGroup, ReportProfile};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// generate 命令的输入
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub excel: PathBuf,
    pub template: PathBuf,
    /// 未指定时为 `<模板目录>/<配置的输出文件夹>`
    pub output_dir: Option<PathBuf>,
    pub sheet: Option<String>,
    pub params: Params,
    /// 显示进度条
    pub progress: bool,
}

/// 一组生成失败的信息
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub group: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSummary {
    pub output_dir: PathBuf,
    pub generated: Vec<PathBuf>,
    pub failed: Vec<GroupFailure>,
}

impl GenerationSummary {
    /// 至少生成一份即视为成功
    pub fn exit_code(&self) -> u8 {
        if self.generated.is_empty() {
            1
        } else {
            0
        }
    }
}

/// 工作表和列映射（columns 命令也使用）
pub fn load_mapped_sheet(
    profile: &ReportProfile,
    excel: &Path,
    sheet: Option<&str>,
) -> Result<(SheetData, ColumnMapping)> {
    let header_keywords = profile
        .column_spec(Field::OrderNo)
        .map(|c| c.keywords.clone())
        .unwrap_or_default();
    let data = load_sheet(excel, sheet, &header_keywords)?;
    let mapping = resolve_columns(&data.headers, &profile.columns);
    Ok((data, mapping))
}

/// 报告生成
///
/// 单组的失败记入 `failed` 后继续处理下一组。
/// 输入文件不存在、缺少委托单编号列、没有任何数据时返回错误。
pub fn generate_reports(
    profile: &ReportProfile,
    config: &Config,
    request: &GenerateRequest,
) -> Result<GenerationSummary> {
    if !request.template.exists() {
        return Err(ReportError::FileNotFound(request.template.display().to_string()));
    }
    let template_bytes = std::fs::read(&request.template)?;
    // 模板无效时在读取 Excel 之前报错
    DocxPackage::from_bytes(&template_bytes)?;

    let date_format = profile.date_format.as_deref().unwrap_or(&config.date_format);
    validate_date_format(date_format)?;

    let (sheet, mapping) = load_mapped_sheet(profile, &request.excel, request.sheet.as_deref())?;
    if mapping.get(Field::OrderNo).is_none() {
        return Err(ReportError::MissingColumn(Field::OrderNo.label().to_string()));
    }
    for field in mapping.fallbacks() {
        if let Some(resolution) = mapping.get(field) {
            warn!("找不到「{}」列，按位置使用 {}", field.label(), resolution);
        }
    }
    for field in mapping.missing() {
        warn!("找不到「{}」列，该字段留空", field.label());
    }

    let records = build_records(&sheet, &mapping);
    let groups = group_records(&records, profile.group_by_ray_type);
    if groups.is_empty() {
        return Err(ReportError::NoReportsGenerated(format!(
            "工作表「{}」中没有委托单编号",
            sheet.name
        )));
    }
    info!(records = records.len(), groups = groups.len(), "数据分组完成");

    let output_dir = request
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&request.template, &config.output_folder));
    std::fs::create_dir_all(&output_dir)?;

    let progress = progress_bar(groups.len(), request.progress);
    let mut summary = GenerationSummary {
        output_dir: output_dir.clone(),
        ..Default::default()
    };

    for group in &groups {
        progress.set_message(group.describe());
        let path = output_path(
            &output_dir,
            &request.template,
            &group.order_no,
            group.ray_type.as_deref(),
        );

        match render_group(&template_bytes, profile, config, date_format, group, &request.params)
            .and_then(|package| package.save(&path))
        {
            Ok(()) => {
                info!(group = %group.describe(), path = %path.display(), "报告已生成");
                summary.generated.push(path);
            }
            Err(e) => {
                error!(group = %group.describe(), "生成失败: {}", e);
                summary.failed.push(GroupFailure {
                    group: group.describe(),
                    message: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(summary)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("##-"));
    }
    bar
}

/// 一组数据写入模板副本
pub fn render_group(
    template_bytes: &[u8],
    profile: &ReportProfile,
    config: &Config,
    date_format: &str,
    group: &ReportGroup,
    params: &Params,
) -> Result<DocxPackage> {
    let mut package = DocxPackage::from_bytes(template_bytes)?;
    let replacements = resolve_placeholders(profile, group, params, date_format);

    for part in package.text_parts() {
        let mut doc = XmlDocument::parse(&package.part_str(&part)?)?;
        fill_placeholders(&mut doc.root, &replacements, &config.font);

        if part == DOCUMENT_PART {
            fill_document_body(&mut doc, profile, config, group)?;
        }

        package.set_part(&part, doc.to_xml().into_bytes());
    }

    Ok(package)
}

fn fill_document_body(
    doc: &mut XmlDocument,
    profile: &ReportProfile,
    config: &Config,
    group: &ReportGroup,
) -> Result<()> {
    let location = locate_data_table(&doc.root, &profile.table_keywords).ok_or_else(|| {
        ReportError::InvalidTemplate(format!(
            "找不到包含「{}」的表格",
            profile.table_keywords.join("」或「")
        ))
    })?;

    let tbl = doc
        .root
        .nth_descendant_mut("w:tbl", location.table_index)
        .ok_or_else(|| ReportError::InvalidTemplate("数据表格定位失败".into()))?;
    populate_table(tbl, location.header_row, profile, group, &config.font)?;

    apply_checkboxes(&mut doc.root, &profile.checkboxes, group);
    Ok(())
}
