use clap::{Parser, Subcommand};
use ndt_report_common::profile::{
    PARAM_ACCEPTANCE_LEVEL, PARAM_CLIENT, PARAM_INSPECTION_METHOD, PARAM_INSPECTION_STANDARD,
    PARAM_PROJECT_NAME,
};
use ndt_report_common::ReportKind;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ndt-report")]
#[command(about = "无损检测 Excel 数据批量生成 Word 报告", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 输出详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 按委托单编号分组生成报告
    Generate {
        /// 报告种类 (request-log/result-notice/surface-notice/exposure-record)
        #[arg(short, long)]
        kind: ReportKind,

        /// 输入 Excel 文件
        #[arg(short, long)]
        excel: PathBuf,

        /// Word 模板
        #[arg(short, long)]
        word: PathBuf,

        /// 输出目录（默认: 模板目录/生成结果）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 工作表名（默认: 第一个工作表）
        #[arg(long)]
        sheet: Option<String>,

        /// 报告规则 JSON（默认: 内置规则）
        #[arg(long)]
        profile: Option<PathBuf>,

        /// 工程名称
        #[arg(long)]
        project_name: Option<String>,

        /// 委托单位
        #[arg(long)]
        client: Option<String>,

        /// 检测标准
        #[arg(long)]
        inspection_standard: Option<String>,

        /// 检测方法
        #[arg(long)]
        inspection_method: Option<String>,

        /// 合格级别
        #[arg(long)]
        acceptance_level: Option<String>,

        /// 其他占位符参数 (KEY=VALUE，可重复)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// 显示 Excel 列的解析结果
    Columns {
        #[arg(short, long)]
        kind: ReportKind,

        #[arg(short, long)]
        excel: PathBuf,

        #[arg(long)]
        sheet: Option<String>,

        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// 输出内置报告规则 JSON
    Profile {
        #[arg(short, long)]
        kind: ReportKind,

        /// 输出文件（默认: 标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 生成输入 Excel 的样本表头
    Sample {
        #[arg(short, long)]
        kind: ReportKind,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// 设置管理
    Config {
        /// 替换文字的字体
        #[arg(long)]
        set_font: Option<String>,

        /// 字号（磅）
        #[arg(long)]
        set_font_size: Option<f32>,

        /// 日期格式（chrono 格式，如 %Y年%m月%d日）
        #[arg(long)]
        set_date_format: Option<String>,

        /// 显示当前设置
        #[arg(long)]
        show: bool,
    },
}

/// `--param KEY=VALUE`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("需要 KEY=VALUE 形式: {}", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("参数名为空: {}", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// 命名参数与 --param 合并（命名参数优先）
pub fn collect_params(
    project_name: Option<String>,
    client: Option<String>,
    inspection_standard: Option<String>,
    inspection_method: Option<String>,
    acceptance_level: Option<String>,
    extra: Vec<(String, String)>,
) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = extra.into_iter().collect();
    let named = [
        (PARAM_PROJECT_NAME, project_name),
        (PARAM_CLIENT, client),
        (PARAM_INSPECTION_STANDARD, inspection_standard),
        (PARAM_INSPECTION_METHOD, inspection_method),
        (PARAM_ACCEPTANCE_LEVEL, acceptance_level),
    ];
    for (key, value) in named {
        if let Some(value) = value {
            params.insert(key.to_string(), value);
        }
    }
    params
}
