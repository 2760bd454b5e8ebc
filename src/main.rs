// ==========================================
// IT 项目治理核心 - 命令行入口
// ==========================================
// 用法:
//   project-governance rescore [db_path]
//   project-governance gate <project_id> <PHASE> [db_path]
//   project-governance init [db_path]
// ==========================================

use anyhow::{anyhow, Context};
use project_governance::app::{get_default_db_path, AppState};
use project_governance::db::{init_schema, open_sqlite_connection};
use project_governance::{i18n, logging, Phase};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();

    match command.as_str() {
        "rescore" => {
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            let state = AppState::new(db_path).await.map_err(|e| anyhow!(e))?;

            let now = chrono::Local::now().naive_local();
            let report = state.portfolio_api.rescore_portfolio_concurrent(now).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            eprintln!(
                "{}",
                i18n::t_with_args(
                    "rescore.summary",
                    &[
                        ("scored", &report.updated.len().to_string()),
                        ("failed", &report.failed.len().to_string()),
                        ("skipped", &report.skipped.len().to_string()),
                    ],
                )
            );
        }
        "gate" => {
            let project_id = args.next().context(i18n::t("cli.usage"))?;
            let raw_phase = args.next().context(i18n::t("cli.usage"))?;
            let target = Phase::from_str(&raw_phase).ok_or_else(|| {
                anyhow!(i18n::t_with_args("cli.invalid_phase", &[("value", &raw_phase)]))
            })?;
            let db_path = args.next().unwrap_or_else(get_default_db_path);

            let state = AppState::new(db_path).await.map_err(|e| anyhow!(e))?;
            let result = state.governance_api.evaluate_transition(&project_id, target)?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            eprintln!("{}", result.message);
        }
        "init" => {
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            let conn = open_sqlite_connection(&db_path)
                .with_context(|| format!("无法打开数据库: {}", db_path))?;
            init_schema(&conn)?;

            tracing::info!(db_path = %db_path, "数据库初始化完成");
            println!("{}", i18n::t_with_args("cli.schema_ready", &[("path", &db_path)]));
        }
        _ => {
            eprintln!("{} {}", project_governance::APP_NAME, project_governance::VERSION);
            eprintln!("{}", i18n::t("cli.usage"));
            std::process::exit(2);
        }
    }

    Ok(())
}
