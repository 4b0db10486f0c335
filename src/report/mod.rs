//! 模板填充和报告生成

pub mod checkboxes;
pub mod pipeline;
pub mod placeholders;
pub mod table_fill;

pub use pipeline::{
    generate_reports, load_mapped_sheet, render_group, GenerateRequest, GenerationSummary,
    GroupFailure,
};
pub use placeholders::Params;
