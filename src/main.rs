use anyhow::Context;
use clap::Parser;
use ndt_report::{cli, config, excel, report};
use ndt_report_common::{ReportKind, ReportProfile};
use cli::{Cli, Commands};
use config::Config;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✖ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// 未设置 RUST_LOG 时默认 warn（-v 时 debug）
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ndt_report=debug,ndt_report_common=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_profile(kind: ReportKind, path: Option<&Path>) -> anyhow::Result<ReportProfile> {
    match path {
        Some(path) => {
            let profile = ReportProfile::from_file(path)
                .with_context(|| format!("报告规则读取失败: {}", path.display()))?;
            if profile.kind != kind {
                tracing::warn!("规则文件的种类 {} 与 --kind {} 不一致，按规则文件处理", profile.kind, kind);
            }
            Ok(profile)
        }
        None => Ok(ReportProfile::preset(kind)),
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;

    match cli.command {
        Commands::Generate {
            kind,
            excel,
            word,
            output,
            sheet,
            profile,
            project_name,
            client,
            inspection_standard,
            inspection_method,
            acceptance_level,
            params,
        } => {
            let profile = load_profile(kind, profile.as_deref())?;
            println!("📄 ndt-report - {}\n", profile.title);

            let request = report::GenerateRequest {
                excel,
                template: word,
                output_dir: output,
                sheet,
                params: cli::collect_params(
                    project_name,
                    client,
                    inspection_standard,
                    inspection_method,
                    acceptance_level,
                    params,
                ),
                progress: !cli.verbose,
            };

            let summary = report::generate_reports(&profile, &config, &request)?;
            for path in &summary.generated {
                println!("✔ {}", path.display());
            }
            for failure in &summary.failed {
                println!("⚠ {}: {}", failure.group, failure.message);
            }
            println!(
                "\n生成 {} 份，失败 {} 份（输出目录: {}）",
                summary.generated.len(),
                summary.failed.len(),
                summary.output_dir.display()
            );

            return Ok(ExitCode::from(summary.exit_code()));
        }

        Commands::Columns { kind, excel, sheet, profile } => {
            let profile = load_profile(kind, profile.as_deref())?;
            let (data, mapping) = report::load_mapped_sheet(&profile, &excel, sheet.as_deref())?;

            println!("工作表: {}（表头在第 {} 行，数据 {} 行）", data.name, data.header_row + 1, data.rows.len());
            for (field, resolution) in mapping.iter() {
                let marker = if resolution.is_fallback() { "⚠" } else { "✔" };
                println!("{} {:<8} {}", marker, field.label(), resolution);
            }
            for field in mapping.missing() {
                println!("✖ {:<8} 未找到", field.label());
            }
        }

        Commands::Profile { kind, output } => {
            let json = ReportProfile::preset(kind).to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("写入失败: {}", path.display()))?;
                    println!("✔ 报告规则已保存: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Sample { kind, output } => {
            let profile = ReportProfile::preset(kind);
            excel::write_sample_workbook(&profile, &output)?;
            println!("✔ 样本已保存: {}", output.display());
        }

        Commands::Config { set_font, set_font_size, set_date_format, show } => {
            let mut config = config;

            if set_font.is_some() || set_font_size.is_some() {
                config.set_font(set_font, set_font_size)?;
                println!("✔ 字体已设置");
            }

            if let Some(format) = set_date_format {
                config.set_date_format(format)?;
                println!("✔ 日期格式已设置");
            }

            if show {
                println!("设置:");
                println!("  字体: {}", config.font.name);
                println!("  字号: {}pt", config.font.size_pt);
                println!("  加粗: {}", if config.font.bold { "是" } else { "否" });
                println!("  日期格式: {}", config.date_format);
                println!("  输出文件夹: {}", config.output_folder);
                if let Ok(path) = Config::config_path() {
                    println!("  配置文件: {}", path.display());
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
