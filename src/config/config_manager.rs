// ==========================================
// 服装生产排程系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================
// 规则:
// 1) key='intelligence_config' 存整体 JSON（可缺省字段）
// 2) optimizer./detector./pipeline. 前缀 key 逐项覆写
// 3) 每次读取都重新查询，调参无需重启
// ==========================================

use crate::config::config_reader::IntelligenceConfigReader;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::intelligence_config::IntelligenceConfig;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// 配置键常量
pub mod config_keys {
    /// 整体配置 JSON
    pub const INTELLIGENCE_CONFIG: &str = "intelligence_config";

    /// 可逐项覆写的前缀
    pub const OVERRIDE_PREFIXES: [&str; 3] = ["optimizer.", "detector.", "pipeline."];

    pub const BOTTLENECK_THRESHOLD: &str = "detector.bottleneck_threshold";
    pub const OPTIMAL_THROUGHPUT_MODE: &str = "detector.optimal_throughput_mode";
    pub const HORIZON_DAYS: &str = "optimizer.horizon_days";
}

/// 全局 scope
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_config_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            crate::db::ensure_config_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| ConfigError::ReadError {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 删除 global scope 的配置值
    pub fn remove_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 组装生效配置：默认值 → 整体 JSON → 逐项覆写 → 校验
    pub fn resolve_intelligence_config(&self) -> ConfigResult<IntelligenceConfig> {
        let snapshot = self.get_config_snapshot()?;

        let mut config = match snapshot.get(config_keys::INTELLIGENCE_CONFIG) {
            Some(raw) => serde_json::from_str::<IntelligenceConfig>(raw).map_err(|e| {
                ConfigError::ValueError {
                    key: config_keys::INTELLIGENCE_CONFIG.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                }
            })?,
            None => IntelligenceConfig::default(),
        };

        for (key, value) in snapshot.iter() {
            if !config_keys::OVERRIDE_PREFIXES
                .iter()
                .any(|p| key.starts_with(p))
            {
                continue;
            }
            match config.apply_override(key, value) {
                Ok(()) => debug!(key = %key, value = %value, "应用配置覆写"),
                Err(e) => {
                    warn!(key = %key, error = %e, "配置覆写失败");
                    return Err(e);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl IntelligenceConfigReader for ConfigManager {
    async fn load_intelligence_config(&self) -> ConfigResult<IntelligenceConfig> {
        self.resolve_intelligence_config()
    }
}
