//! 输出文件名

use std::path::{Path, PathBuf};

/// 结果文件名的后缀
pub const OUTPUT_SUFFIX: &str = "生成结果";

/// 文件名中不能使用的字符替换为 "_"
pub fn sanitize_file_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// 输出文件名: `<模板名>_<委托单编号>[_<射线类型>]_生成结果.docx`
pub fn output_file_name(template: &Path, order_no: &str, ray_type: Option<&str>) -> String {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());

    let mut parts = vec![stem, sanitize_file_component(order_no)];
    if let Some(ray) = ray_type.filter(|r| !r.trim().is_empty()) {
        parts.push(sanitize_file_component(ray));
    }
    parts.push(OUTPUT_SUFFIX.to_string());

    format!("{}.docx", parts.join("_"))
}

/// 输出文件路径
pub fn output_path(
    output_dir: &Path,
    template: &Path,
    order_no: &str,
    ray_type: Option<&str>,
) -> PathBuf {
    output_dir.join(output_file_name(template, order_no, ray_type))
}

/// 未指定输出目录时的默认值: `<模板所在目录>/<folder_name>`
pub fn default_output_dir(template: &Path, folder_name: &str) -> PathBuf {
    template
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(folder_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        let name = output_file_name(Path::new("/tmp/templates/T.docx"), "X-1", None);
        assert_eq!(name, "T_X-1_生成结果.docx");
    }

    #[test]
    fn test_output_file_name_with_ray_type() {
        let name = output_file_name(Path::new("T.docx"), "X-1", Some("X射线"));
        assert_eq!(name, "T_X-1_X射线_生成结果.docx");
    }

    #[test]
    fn test_empty_ray_type_is_ignored() {
        let name = output_file_name(Path::new("T.docx"), "X-1", Some(" "));
        assert_eq!(name, "T_X-1_生成结果.docx");
    }

    #[test]
    fn test_order_number_is_sanitized() {
        let name = output_file_name(Path::new("记录.docx"), "WT/2024:01", None);
        assert_eq!(name, "记录_WT_2024_01_生成结果.docx");
    }

    #[test]
    fn test_output_path_joins_dir() {
        let path = output_path(Path::new("/out"), Path::new("/tpl/T.docx"), "A", None);
        assert_eq!(path, PathBuf::from("/out/T_A_生成结果.docx"));
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/tpl/T.docx"), "生成结果"),
            PathBuf::from("/tpl/生成结果")
        );
        assert_eq!(
            default_output_dir(Path::new("T.docx"), "生成结果"),
            PathBuf::from("./生成结果")
        );
    }
}
