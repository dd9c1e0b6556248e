// ==========================================
// 实体数据导入引擎 - SQLite 参考存储实现
// ==========================================
// 职责: 实现 SchemaStore + BatchWriter（使用 rusqlite）
// - 字段描述符: entity_registry / entity_field
// - 外键候选项: 动态表查询（标识符校验 + 引号包裹）
// - 批量写入: import_batch + import_record（单事务）
// 红线: Repository 不含校验规则，只做数据读写
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::{
    CellValue, DataType, EntityTarget, FieldDescriptor, ForeignKeyOption, ForeignKeyRef,
};
use crate::repository::batch_writer::BatchWriter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schema_store::{EntitySummary, SchemaStore};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// 标识符加引号（拒绝空串 / 双引号 / NUL）
fn quote_ident(ident: &str) -> RepositoryResult<String> {
    if ident.is_empty() || ident.contains('"') || ident.contains('\0') {
        return Err(RepositoryError::InvalidIdentifier(ident.to_string()));
    }
    Ok(format!("\"{}\"", ident))
}

/// 外键源表引用: main / 空 schema → 裸表名；其余 → "schema"."table"（附加库）
fn table_ref(schema: &str, table: &str) -> RepositoryResult<String> {
    let table = quote_ident(table)?;
    if schema.is_empty() || schema.eq_ignore_ascii_case("main") {
        Ok(table)
    } else {
        Ok(format!("{}.{}", quote_ident(schema)?, table))
    }
}

fn sql_to_cell(value: SqlValue) -> CellValue {
    match value {
        SqlValue::Null => CellValue::Null,
        SqlValue::Integer(i) => CellValue::Number(i as f64),
        SqlValue::Real(f) => CellValue::Number(f),
        SqlValue::Text(s) => CellValue::Text(s),
        SqlValue::Blob(b) => CellValue::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// 记录键: 载荷中的 "id"（字符串或数字），否则生成 uuid
fn record_key(row: &Value) -> String {
    match row.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

// ==========================================
// SqliteEntityStore
// ==========================================
pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntityStore {
    /// 打开（或创建）数据库并初始化 schema
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 使用已有连接（如内存库）
    pub fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 执行 SQL 脚本（建外键源表 / 初始化数据）
    pub fn execute_script(&self, sql: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// 注册实体及其有序字段描述符（覆盖已有定义）
    pub fn register_entity(
        &self,
        target: &EntityTarget,
        display_name: Option<&str>,
        fields: &[FieldDescriptor],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO entity_registry (entity_id, entity_schema, entity_type, display_name)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(entity_id) DO UPDATE SET
                entity_schema = excluded.entity_schema,
                entity_type = excluded.entity_type,
                display_name = excluded.display_name
            "#,
            params![target.entity_id, target.schema, target.table, display_name],
        )?;
        tx.execute(
            "DELETE FROM entity_field WHERE entity_id = ?1",
            params![target.entity_id],
        )?;
        Self::insert_fields_tx(&tx, &target.entity_id, fields)?;

        tx.commit()?;
        info!(entity_id = %target.entity_id, fields = fields.len(), "实体注册完成");
        Ok(())
    }

    fn insert_fields_tx(
        tx: &Transaction,
        entity_id: &str,
        fields: &[FieldDescriptor],
    ) -> RepositoryResult<()> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO entity_field (
                entity_id, field_key, display_name, data_type,
                is_mandatory, is_displayable, is_template_column, sort_order,
                fk_source_schema, fk_source_table, fk_source_column, fk_display_column
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )?;

        for (idx, field) in fields.iter().enumerate() {
            let fk = field.foreign_key.as_ref();
            stmt.execute(params![
                entity_id,
                field.key,
                field.display_name,
                field.data_type.to_string(),
                field.is_mandatory,
                field.is_displayable,
                field.is_template_column,
                idx as i64,
                fk.map(|f| f.source_schema.as_str()),
                fk.map(|f| f.source_table.as_str()),
                fk.map(|f| f.source_column.as_str()),
                fk.map(|f| f.display_column.as_str()),
            ])?;
        }
        Ok(())
    }

    /// 读取某目标表已写入的载荷（按记录键排序）
    pub fn fetch_records(&self, qualified_table: &str) -> RepositoryResult<Vec<Value>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT payload_json FROM import_record WHERE target_table = ?1 ORDER BY record_key",
        )?;
        let payloads = stmt
            .query_map(params![qualified_table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(RepositoryError::from))
            .collect()
    }

    /// 统计某目标表的写入批次数
    pub fn count_batches(&self, qualified_table: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM import_batch WHERE target_table = ?1",
            params![qualified_table],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl SchemaStore for SqliteEntityStore {
    async fn list_entities(&self) -> RepositoryResult<Vec<EntitySummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT entity_id, entity_schema, entity_type, display_name
            FROM entity_registry
            ORDER BY entity_id
            "#,
        )?;
        let entities = stmt
            .query_map([], |row| {
                Ok(EntitySummary {
                    entity_id: row.get(0)?,
                    entity_schema: row.get(1)?,
                    entity_type: row.get(2)?,
                    display_name: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entities)
    }

    async fn fetch_field_descriptors(
        &self,
        entity_id: &str,
    ) -> RepositoryResult<Vec<FieldDescriptor>> {
        let conn = self.get_conn()?;

        let registered: Option<String> = conn
            .query_row(
                "SELECT entity_id FROM entity_registry WHERE entity_id = ?1",
                params![entity_id],
                |row| row.get(0),
            )
            .optional()?;
        if registered.is_none() {
            return Err(RepositoryError::EntityNotRegistered(entity_id.to_string()));
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT field_key, display_name, data_type,
                   is_mandatory, is_displayable, is_template_column,
                   fk_source_schema, fk_source_table, fk_source_column, fk_display_column
            FROM entity_field
            WHERE entity_id = ?1
            ORDER BY sort_order, rowid
            "#,
        )?;

        let fields = stmt
            .query_map(params![entity_id], |row| {
                let data_type: String = row.get(2)?;
                let fk_parts: (
                    Option<String>,
                    Option<String>,
                    Option<String>,
                    Option<String>,
                ) = (row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?);

                let foreign_key = match fk_parts {
                    (Some(schema), Some(table), Some(column), Some(display)) => {
                        Some(ForeignKeyRef::new(schema, table, column, display))
                    }
                    _ => None,
                };

                Ok(FieldDescriptor {
                    key: row.get(0)?,
                    display_name: row.get(1)?,
                    data_type: DataType::from_type_name(&data_type),
                    is_mandatory: row.get(3)?,
                    is_displayable: row.get(4)?,
                    is_template_column: row.get(5)?,
                    foreign_key,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(entity_id, fields = fields.len(), "字段描述符加载完成");
        Ok(fields)
    }

    async fn fetch_foreign_key_options(
        &self,
        fk: &ForeignKeyRef,
    ) -> RepositoryResult<Vec<ForeignKeyOption>> {
        let sql = format!(
            "SELECT {}, {} FROM {}",
            quote_ident(&fk.display_column)?,
            quote_ident(&fk.source_column)?,
            table_ref(&fk.source_schema, &fk.source_table)?,
        );

        let lookup_err = |e: rusqlite::Error| RepositoryError::LookupSourceError {
            table: fk.qualified_table(),
            message: e.to_string(),
        };

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql).map_err(lookup_err)?;
        let pairs = stmt
            .query_map([], |row| {
                Ok((row.get::<_, SqlValue>(0)?, row.get::<_, SqlValue>(1)?))
            })
            .map_err(lookup_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(lookup_err)?;

        // 标签为空的候选项无法被匹配，直接丢弃
        let options: Vec<ForeignKeyOption> = pairs
            .into_iter()
            .map(|(label, id)| (sql_to_cell(label), sql_to_cell(id)))
            .filter(|(label, _)| !label.is_null())
            .map(|(label, id)| ForeignKeyOption::new(label.to_string(), id))
            .collect();

        debug!(table = %fk.qualified_table(), options = options.len(), "外键候选项加载完成");
        Ok(options)
    }
}

#[async_trait]
impl BatchWriter for SqliteEntityStore {
    async fn upsert_batch(&self, qualified_table: &str, rows: Vec<Value>) -> RepositoryResult<usize> {
        let batch_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO import_batch (batch_id, target_table, row_count, imported_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![batch_id, qualified_table, rows.len() as i64, now],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO import_record (target_table, record_key, batch_id, payload_json, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(target_table, record_key) DO UPDATE SET
                    batch_id = excluded.batch_id,
                    payload_json = excluded.payload_json,
                    updated_at = excluded.updated_at
                "#,
            )?;

            for row in &rows {
                let payload = serde_json::to_string(row)?;
                stmt.execute(params![qualified_table, record_key(row), batch_id, payload, now])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(batch_id = %batch_id, table = qualified_table, rows = rows.len(), "批量写入完成");
        Ok(rows.len())
    }
}
