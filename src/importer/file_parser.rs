// ==========================================
// 实体数据导入引擎 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls) / CSV (.csv)，文件路径或上传字节流
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_traits::{FileParser, RawRecord};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

// ==========================================
// FileFormat - 文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    /// 根据文件名扩展名判断格式
    pub fn from_file_name(file_name: &str) -> ImportResult<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Excel),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 按表头组装一行；返回 None 表示完全空白的行
fn build_record<I>(headers: &[String], cells: I) -> Option<RawRecord>
where
    I: IntoIterator<Item = String>,
{
    let mut cells = cells.into_iter();
    let mut row_map = RawRecord::new();
    for header in headers {
        // 短行缺失的尾部单元格补为空串，各行表头集合一致
        let value = cells.next().unwrap_or_default();
        // 空表头的列无法对齐，直接忽略
        if header.is_empty() {
            continue;
        }
        row_map.insert(header.clone(), value.trim().to_string());
    }

    if row_map.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row_map)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    fn read_records<R: Read>(&self, source: R) -> ImportResult<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for result in reader.records() {
            let record = result?;
            match build_record(&headers, record.iter().map(str::to_string)) {
                Some(row_map) => records.push(row_map),
                None => skipped += 1,
            }
        }

        debug!(rows = records.len(), skipped_blank = skipped, "CSV 解析完成");
        Ok(records)
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        ensure_exists(file_path)?;

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        self.read_records(file)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        self.read_records(bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格转文本；日期单元格输出 ISO 格式，交由类型规范化阶段处理
    fn cell_to_string(cell: &Data) -> String {
        let text = match cell {
            Data::Empty => String::new(),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) if naive.time() == chrono::NaiveTime::MIN => {
                    naive.date().format("%Y-%m-%d").to_string()
                }
                Some(naive) => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => cell.to_string(),
            },
            Data::DateTimeIso(s) => s.clone(),
            _ => cell.to_string(),
        };
        text.trim().to_string()
    }

    /// 读取第一个工作表
    fn read_first_sheet<RS: Read + Seek>(
        &self,
        workbook: &mut Sheets<RS>,
    ) -> ImportResult<Vec<RawRecord>> {
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::MissingHeader)?;
        let headers: Vec<String> = header_row.iter().map(Self::cell_to_string).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let records: Vec<RawRecord> = rows
            .filter_map(|data_row| {
                build_record(&headers, data_row.iter().map(Self::cell_to_string))
            })
            .collect();

        debug!(sheet = %sheet_name, rows = records.len(), "Excel 解析完成");
        Ok(records)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        ensure_exists(file_path)?;

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        self.read_first_sheet(&mut workbook)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        self.read_first_sheet(&mut workbook)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    fn parser_for(format: FileFormat) -> Box<dyn FileParser> {
        match format {
            FileFormat::Csv => Box::new(CsvParser),
            FileFormat::Excel => Box::new(ExcelParser),
        }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRecord>> {
        let path = file_path.as_ref();
        let file_name = path.to_string_lossy();
        let format = FileFormat::from_file_name(&file_name)?;
        Self::parser_for(format).parse_to_raw_records(path)
    }

    pub fn parse_bytes(&self, bytes: &[u8], format: FileFormat) -> ImportResult<Vec<RawRecord>> {
        Self::parser_for(format).parse_bytes(bytes)
    }
}
