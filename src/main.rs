// ==========================================
// 仓库物资管理系统 - 启动入口
// ==========================================
// 职责: 初始化日志与应用状态, 打印启动概要
// 说明: 本进程只承载核心服务装配, 不带界面
// ==========================================

use std::sync::Arc;

use warehouse_stores::app::{get_default_db_path, AppState};
use warehouse_stores::identity::FixedIdentityProvider;
use warehouse_stores::{logging, APP_NAME, VERSION};

fn main() {
    logging::init();

    tracing::info!("{} v{} 启动", APP_NAME, VERSION);

    let db_path = get_default_db_path();
    let identity = Arc::new(FixedIdentityProvider::anonymous());

    let state = match AppState::new(db_path, identity) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("应用初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("数据库就绪: {}", state.get_db_path());

    // 启动概要: 当前补货水位
    match state.mrp_api.replenishment_summary() {
        Ok(summary) => tracing::info!(
            critical = summary.critical_count,
            warning = summary.warning_count,
            estimated_cost = summary.estimated_total_cost,
            "补货水位概要"
        ),
        Err(e) => tracing::warn!("补货水位查询失败: {}", e),
    }
}
