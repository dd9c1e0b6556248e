// ==========================================
// 实体数据导入引擎 - 命令行入口
// ==========================================
// entity-import entities                          列出可导入实体
// entity-import template --entity <id>            输出导入模板 CSV
// entity-import import --entity <id> <file>       校验文件并输出行错误
//               [--set ROW:FIELD=VALUE]... [--commit]
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use entity_import::config::ConfigManager;
use entity_import::db::get_default_db_path;
use entity_import::repository::{SchemaStore, SqliteEntityStore};
use entity_import::{logging, ApiError, ImportApi};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "entity-import")]
#[command(version, about = "将 CSV/XLSX 文件对齐目标实体 Schema 并批量导入", long_about = None)]
struct Cli {
    /// SQLite 数据库路径（默认: ENTITY_IMPORT_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出已注册的可导入实体
    Entities,

    /// 输出实体的导入模板（仅表头）
    Template {
        /// 实体 ID
        #[arg(short, long)]
        entity: String,

        /// 输出文件（默认: stdout）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 导入文件: 对齐 / 规范化 / 校验，可选提交
    Import {
        /// 实体 ID
        #[arg(short, long)]
        entity: String,

        /// 输入文件（.csv / .xlsx / .xls）
        input: PathBuf,

        /// 单元格修正，格式 ROW:FIELD=VALUE（ROW 为 0 起始行键）
        #[arg(long = "set", value_name = "ROW:FIELD=VALUE")]
        edits: Vec<String>,

        /// 校验后提交干净行
        #[arg(long)]
        commit: bool,
    },
}

/// 解析 "ROW:FIELD=VALUE"
fn parse_edit(raw: &str) -> Result<(usize, String, String)> {
    let (target, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("修正格式应为 ROW:FIELD=VALUE: {}", raw))?;
    let (row, field) = target
        .split_once(':')
        .ok_or_else(|| anyhow!("修正格式应为 ROW:FIELD=VALUE: {}", raw))?;
    let row_key = row
        .trim()
        .parse::<usize>()
        .with_context(|| format!("无效的行键: {}", row))?;
    Ok((row_key, field.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, version = entity_import::VERSION, "使用数据库");

    let store = Arc::new(
        SqliteEntityStore::new(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?,
    );
    let config = ConfigManager::from_connection(store.shared_connection())
        .map_err(|e| anyhow!("配置初始化失败: {}", e))?;
    let mut api = ImportApi::new(Arc::clone(&store), Arc::clone(&store), Arc::new(config));

    match cli.command {
        Commands::Entities => {
            for entity in store.list_entities().await? {
                println!(
                    "{}\t{}\t{}",
                    entity.entity_id,
                    entity.target().qualified_name(),
                    entity.display_name.unwrap_or_default()
                );
            }
        }

        Commands::Template { entity, output } => {
            let target = find_target(&api, &entity).await?;
            api.select_entity(target).await?;
            let csv = api.template_csv()?;
            match output {
                Some(path) => std::fs::write(&path, csv)
                    .with_context(|| format!("无法写入模板: {}", path.display()))?,
                None => print!("{}", csv),
            }
        }

        Commands::Import {
            entity,
            input,
            edits,
            commit,
        } => {
            let target = find_target(&api, &entity).await?;
            api.select_entity(target).await?;
            api.load_file(&input)?;

            for raw in &edits {
                let (row_key, field, value) = parse_edit(raw)?;
                api.edit_cell(row_key, &field, value)?;
            }

            for row in api.rows().iter().filter(|r| !r.is_clean()) {
                for message in &row.errors {
                    println!("row {}: {}", row.row_key, message);
                }
            }

            let summary = api
                .session()
                .map(|s| s.summary())
                .ok_or(ApiError::NoActiveSession)?;
            println!(
                "total={} clean={} errors={} blank={}",
                summary.total_rows, summary.clean_rows, summary.error_rows, summary.blank_rows
            );

            if commit {
                match api.submit().await {
                    Ok(report) => println!("uploaded={}", report.uploaded),
                    Err(ApiError::NoValidData) => bail!("没有可提交的有效数据"),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    Ok(())
}

async fn find_target(
    api: &ImportApi<SqliteEntityStore, SqliteEntityStore>,
    entity_id: &str,
) -> Result<entity_import::EntityTarget> {
    api.list_entities()
        .await?
        .into_iter()
        .find(|e| e.entity_id == entity_id)
        .map(|e| e.target())
        .ok_or_else(|| anyhow!("实体未注册: {}", entity_id))
}
