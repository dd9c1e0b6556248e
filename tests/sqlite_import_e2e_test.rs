// ==========================================
// 端到端测试: CSV 文件 → SQLite 参考存储
// ==========================================
// 测试目标: 元数据读取 / 外键源表查询 / 配置覆写 / 事务化批量写入
// ==========================================

mod test_helpers;

use entity_import::api::ImportApi;
use entity_import::config::{config_keys, ConfigManager};
use entity_import::domain::CellValue;
use entity_import::logging;
use entity_import::repository::SqliteEntityStore;
use serde_json::json;
use std::sync::Arc;
use test_helpers::{create_seeded_store, create_test_db, customer_target, write_csv};

fn build_api(store: &Arc<SqliteEntityStore>) -> ImportApi<SqliteEntityStore, SqliteEntityStore> {
    let config = ConfigManager::from_connection(store.shared_connection())
        .expect("Failed to create ConfigManager");
    ImportApi::new(Arc::clone(store), Arc::clone(store), Arc::new(config))
}

#[tokio::test]
async fn test_full_import_flow() {
    logging::init_test();
    let (_temp_db, db_path) = create_test_db().unwrap();
    let store = Arc::new(create_seeded_store(&db_path).unwrap());
    let mut api = build_api(&store);

    let entities = api.list_entities().await.unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].display_name.as_deref(), Some("Customers"));

    api.select_entity(customer_target()).await.unwrap();

    let csv = write_csv(&[
        "Customer Name,Start Date,Region,Contact Email",
        "Ann,03/15/2024,North,ann@x.io",
        "Bob,2024-04-01,Mars,",
        "Cy,,South,cy@x.io",
    ])
    .unwrap();

    let summary = api.load_file(csv.path()).unwrap();
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.error_rows, 2);

    // "Customer Name" 经子串匹配对齐到 name
    assert_eq!(api.rows()[0].get("name"), Some(&CellValue::from("Ann")));
    assert_eq!(
        api.rows()[1].errors,
        vec!["Invalid Region: 'Mars' not found.".to_string()]
    );
    assert_eq!(api.rows()[2].errors, vec!["Start Date is mandatory.".to_string()]);

    // 修正第 2 行，第 3 行保持错误
    api.edit_cell(1, "region", "North").unwrap();

    let report = api.submit().await.unwrap();
    assert_eq!(report.uploaded, 2);

    let records = store.fetch_records("main.customer").unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.contains(&json!({
        "name": "Ann",
        "start_date": "2024-03-15",
        "region": "r1",
        "details": {"contact_email": "ann@x.io"}
    })));
    assert!(records.contains(&json!({
        "name": "Bob",
        "start_date": "2024-04-01",
        "region": "r1"
    })));
    assert_eq!(store.count_batches("main.customer").unwrap(), 1);
    assert!(api.session().is_none());
}

#[tokio::test]
async fn test_configured_date_formats_are_used() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let store = Arc::new(create_seeded_store(&db_path).unwrap());

    let config = ConfigManager::new(&db_path).unwrap();
    config
        .set_global_config_value(config_keys::DATE_FORMATS, r#"["%d/%m/%Y"]"#)
        .unwrap();

    let mut api = build_api(&store);
    api.select_entity(customer_target()).await.unwrap();
    assert_eq!(api.settings().date_formats, vec!["%d/%m/%Y".to_string()]);

    let csv = write_csv(&["Name,Start Date", "Ann,15/03/2024"]).unwrap();
    api.load_file(csv.path()).unwrap();

    assert_eq!(
        api.rows()[0].get("start_date"),
        Some(&CellValue::from("2024-03-15"))
    );
}

#[tokio::test]
async fn test_missing_lookup_table_degrades_to_not_found() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let store = Arc::new(create_seeded_store(&db_path).unwrap());
    store.execute_script("DROP TABLE regions;").unwrap();

    let mut api = build_api(&store);
    api.select_entity(customer_target()).await.unwrap();

    let csv = write_csv(&["Name,Start Date,Region", "Ann,2024-01-01,North"]).unwrap();
    api.load_file(csv.path()).unwrap();

    assert_eq!(
        api.rows()[0].errors,
        vec!["Invalid Region: 'North' not found.".to_string()]
    );
}
