// ==========================================
// 服装生产排程系统 - 配置读取 Trait
// ==========================================
// 职责: 定义生产智能层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::config::intelligence_config::IntelligenceConfig;
use async_trait::async_trait;

// ==========================================
// IntelligenceConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）/ StaticConfigReader（固定配置）
#[async_trait]
pub trait IntelligenceConfigReader: Send + Sync {
    /// 读取当前生效的生产智能层配置
    ///
    /// # 返回
    /// - 已通过 validate() 的配置
    async fn load_intelligence_config(&self) -> ConfigResult<IntelligenceConfig>;
}

/// 固定配置读取器（测试 / 嵌入式调用）
#[derive(Debug, Clone, Default)]
pub struct StaticConfigReader {
    config: IntelligenceConfig,
}

impl StaticConfigReader {
    pub fn new(config: IntelligenceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IntelligenceConfigReader for StaticConfigReader {
    async fn load_intelligence_config(&self) -> ConfigResult<IntelligenceConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }
}
