// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、实体注册、测试文件生成等功能
// ==========================================
#![allow(dead_code)]

use entity_import::domain::{DataType, EntityTarget, FieldDescriptor, ForeignKeyRef};
use entity_import::repository::SqliteEntityStore;
use std::error::Error;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

pub fn customer_target() -> EntityTarget {
    EntityTarget::new("customers", "main", "customer")
}

pub fn region_ref() -> ForeignKeyRef {
    ForeignKeyRef::new("main", "regions", "id", "name")
}

/// 客户实体字段（声明顺序即对齐优先级）
pub fn customer_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("name", "Name", DataType::Text).mandatory(),
        FieldDescriptor::new("start_date", "Start Date", DataType::Date).mandatory(),
        FieldDescriptor::new("region", "Region", DataType::Text).with_foreign_key(region_ref()),
        FieldDescriptor::new("details.contact_email", "Contact Email", DataType::Text),
        FieldDescriptor::new("details.vip", "VIP", DataType::Boolean),
        FieldDescriptor::new("internal_id", "Internal Id", DataType::Text)
            .hidden()
            .without_template(),
    ]
}

/// 打开测试库，注册客户实体并写入区域外键源表
pub fn create_seeded_store(db_path: &str) -> Result<SqliteEntityStore, Box<dyn Error>> {
    let store = SqliteEntityStore::new(db_path)?;
    store.execute_script(
        r#"
        CREATE TABLE IF NOT EXISTS regions (id TEXT PRIMARY KEY, name TEXT NOT NULL);
        INSERT OR IGNORE INTO regions (id, name) VALUES ('r1', 'North'), ('r2', 'South');
        "#,
    )?;
    store.register_entity(&customer_target(), Some("Customers"), &customer_fields())?;
    Ok(store)
}

/// 写入临时 CSV 文件
pub fn write_csv(lines: &[&str]) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut temp_file = Builder::new().suffix(".csv").tempfile()?;
    for line in lines {
        writeln!(temp_file, "{}", line)?;
    }
    temp_file.flush()?;
    Ok(temp_file)
}
