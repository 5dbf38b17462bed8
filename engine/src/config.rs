//! 引擎配置
//!
//! 配置决定加密时写入容器头的参数（算法、chunk 大小、KDF 成本），
//! 以及解密时接受的 KDF 参数范围。可以直接构造，也可以从 TOML 加载：
//!
//! ```toml
//! algorithm = "aes-256-gcm"
//! chunk_size = 65536
//!
//! [kdf]
//! mem_cost_kib = 65536
//! time_cost = 3
//! parallelism = 1
//!
//! [kdf_limits]
//! min_mem_cost_kib = 19456
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::algorithm::AeadAlgorithm;
use crate::crypto::kdf::{KdfLimits, KdfParams};
use crate::error::{Result, StreamSealError};
use crate::format::header::MAX_CHUNK_SIZE;
use crate::format::stream::DEFAULT_CHUNK_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub algorithm: AeadAlgorithm,
    /// 明文 chunk 大小（字节）
    pub chunk_size: u32,
    /// 加密时使用的 KDF 参数
    pub kdf: KdfParams,
    /// 加解密时接受的 KDF 参数范围
    pub kdf_limits: KdfLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithm: AeadAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            kdf: KdfParams::default(),
            kdf_limits: KdfLimits::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_algorithm(mut self, algorithm: AeadAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_kdf_limits(mut self, kdf_limits: KdfLimits) -> Self {
        self.kdf_limits = kdf_limits;
        self
    }

    /// 校验配置是否可以用于加密
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(StreamSealError::InvalidConfig(format!(
                "chunk_size must be within 1..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }

        if !self.kdf_limits.is_consistent() {
            return Err(StreamSealError::InvalidConfig(
                "kdf_limits minimum exceeds maximum".into(),
            ));
        }

        self.kdf_limits
            .check(&self.kdf)
            .map_err(|e| StreamSealError::InvalidConfig(format!("kdf parameters rejected: {e}")))
    }

    /// 解析 TOML 配置，缺省字段取默认值
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StreamSealError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn toml_overrides_and_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            algorithm = "aes-256-gcm"
            chunk_size = 4096

            [kdf]
            time_cost = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.algorithm, AeadAlgorithm::Aes256Gcm);
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.kdf.time_cost, 4);
        assert_eq!(config.kdf.mem_cost_kib, KdfParams::default().mem_cost_kib);
        assert_eq!(config.kdf_limits, KdfLimits::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = EngineConfig::from_toml_str("compression = true");
        assert!(matches!(result, Err(StreamSealError::InvalidConfig(_))));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let zero_chunk = EngineConfig::default().with_chunk_size(0);
        assert!(matches!(zero_chunk.validate(), Err(StreamSealError::InvalidConfig(_))));

        let huge_chunk = EngineConfig::default().with_chunk_size(MAX_CHUNK_SIZE + 1);
        assert!(matches!(huge_chunk.validate(), Err(StreamSealError::InvalidConfig(_))));

        let weak_kdf = EngineConfig::default().with_kdf(KdfParams::argon2id(1024, 1, 1));
        assert!(matches!(weak_kdf.validate(), Err(StreamSealError::InvalidConfig(_))));

        let inverted = EngineConfig::default().with_kdf_limits(KdfLimits {
            min_time_cost: 10,
            max_time_cost: 2,
            ..KdfLimits::default()
        });
        assert!(matches!(inverted.validate(), Err(StreamSealError::InvalidConfig(_))));
    }
}
