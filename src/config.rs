use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 替换后文字的字体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    /// 中文和西文共用的字体名
    pub name: String,
    /// 字号（磅）
    pub size_pt: f32,
    #[serde(default)]
    pub bold: bool,
}

impl FontStyle {
    /// Word 的字号单位是半磅
    pub fn half_points(&self) -> u32 {
        (self.size_pt * 2.0).round().max(1.0) as u32
    }
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            name: "宋体".into(),
            size_pt: 10.5, // 五号
            bold: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub font: FontStyle,
    pub date_format: String,
    /// 未指定 --output 时在模板目录下创建的文件夹名
    pub output_folder: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: FontStyle::default(),
            date_format: "%Y年%m月%d日".into(),
            output_folder: ndt_report_common::naming::OUTPUT_SUFFIX.into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReportError::Config("找不到用户主目录".into()))?;
        Ok(home.join(".config").join("ndt-report").join("config.json"))
    }

    pub fn set_font(&mut self, name: Option<String>, size_pt: Option<f32>) -> Result<()> {
        if let Some(size) = size_pt {
            if !(1.0..=200.0).contains(&size) {
                return Err(ReportError::Config(format!("字号无效: {}", size)));
            }
            self.font.size_pt = size;
        }
        if let Some(name) = name {
            self.font.name = name;
        }
        self.save()
    }

    pub fn set_date_format(&mut self, format: String) -> Result<()> {
        validate_date_format(&format)?;
        self.date_format = format;
        self.save()
    }
}

/// chrono 遇到无效格式时在 Display 阶段才报错，这里先试一次
pub fn validate_date_format(format: &str) -> Result<()> {
    use std::fmt::Write;
    let sample = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
        .ok_or_else(|| ReportError::Config("日期初始化失败".into()))?;
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(format))
        .map_err(|_| ReportError::Config(format!("日期格式无效: {}", format)))?;
    Ok(())
}
