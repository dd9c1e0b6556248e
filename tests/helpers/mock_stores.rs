// ==========================================
// Mock 外部边界实现 - 用于集成测试
// ==========================================
// 内存版 SchemaStore + BatchWriter，可注入查询 / 写入失败
// ==========================================

use async_trait::async_trait;
use entity_import::domain::{EntityTarget, FieldDescriptor, ForeignKeyOption, ForeignKeyRef};
use entity_import::repository::{
    BatchWriter, EntitySummary, RepositoryError, RepositoryResult, SchemaStore,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    entities: Vec<(EntitySummary, Vec<FieldDescriptor>)>,
    fk_options: HashMap<ForeignKeyRef, Vec<ForeignKeyOption>>,
    failing_tables: HashSet<String>,
    fail_writes: AtomicBool,
    fk_calls: AtomicUsize,
    batches: Mutex<Vec<(String, Vec<Value>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, target: &EntityTarget, fields: Vec<FieldDescriptor>) -> Self {
        self.entities.push((
            EntitySummary {
                entity_id: target.entity_id.clone(),
                entity_schema: target.schema.clone(),
                entity_type: target.table.clone(),
                display_name: None,
            },
            fields,
        ));
        self
    }

    pub fn with_options(mut self, fk: ForeignKeyRef, options: Vec<(&str, &str)>) -> Self {
        self.fk_options.insert(
            fk,
            options
                .into_iter()
                .map(|(label, id)| ForeignKeyOption::new(label, id))
                .collect(),
        );
        self
    }

    /// 指定源表的外键查询返回错误
    pub fn with_failing_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fk_calls(&self) -> usize {
        self.fk_calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<(String, Vec<Value>)> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchemaStore for InMemoryStore {
    async fn list_entities(&self) -> RepositoryResult<Vec<EntitySummary>> {
        Ok(self.entities.iter().map(|(e, _)| e.clone()).collect())
    }

    async fn fetch_field_descriptors(
        &self,
        entity_id: &str,
    ) -> RepositoryResult<Vec<FieldDescriptor>> {
        self.entities
            .iter()
            .find(|(e, _)| e.entity_id == entity_id)
            .map(|(_, fields)| fields.clone())
            .ok_or_else(|| RepositoryError::EntityNotRegistered(entity_id.to_string()))
    }

    async fn fetch_foreign_key_options(
        &self,
        fk: &ForeignKeyRef,
    ) -> RepositoryResult<Vec<ForeignKeyOption>> {
        self.fk_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_tables.contains(&fk.source_table) {
            return Err(RepositoryError::DatabaseQueryError(format!(
                "no such table: {}",
                fk.source_table
            )));
        }
        Ok(self.fk_options.get(fk).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl BatchWriter for InMemoryStore {
    async fn upsert_batch(&self, qualified_table: &str, rows: Vec<Value>) -> RepositoryResult<usize> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseTransactionError(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }
        let count = rows.len();
        self.batches
            .lock()
            .unwrap()
            .push((qualified_table.to_string(), rows));
        Ok(count)
    }
}
