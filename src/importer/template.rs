// ==========================================
// 实体数据导入引擎 - 导入模板生成
// ==========================================
// 模板仅含表头行: isTemplateColumn 字段的显示名（描述符顺序）
// ==========================================

use crate::domain::FieldDescriptor;
use crate::importer::error::{ImportError, ImportResult};
use csv::Writer;

pub fn template_headers(descriptors: &[FieldDescriptor]) -> Vec<&str> {
    descriptors
        .iter()
        .filter(|f| f.is_template_column)
        .map(|f| f.display_name.as_str())
        .collect()
}

pub fn build_template_csv(descriptors: &[FieldDescriptor]) -> ImportResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(template_headers(descriptors))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::InternalError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataType;
    use crate::importer::file_parser::CsvParser;
    use crate::importer::import_traits::FileParser;

    #[test]
    fn test_template_headers() {
        let fields = vec![
            FieldDescriptor::new("name", "Full Name", DataType::Text),
            FieldDescriptor::new("id", "ID", DataType::Text).without_template(),
            FieldDescriptor::new("note", "Note, optional", DataType::Text),
        ];

        let csv = build_template_csv(&fields).unwrap();
        assert_eq!(csv, "Full Name,\"Note, optional\"\n");

        // 模板可被解析器读回（无数据行）
        let records = CsvParser.parse_bytes(csv.as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
