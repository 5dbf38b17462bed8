//! StreamSeal 密钥派生函数（KDF）模块
//!
//! 本模块负责将用户口令通过 Argon2id 派生为 256-bit 对称密钥，
//! 供 chunk AEAD 使用。
//!
//! 设计目标：
//! - 抵抗暴力破解、GPU / ASIC 攻击（成本可调）
//! - 每个容器使用独立的随机 salt
//! - 参数随容器头保存，解密时从容器读取而非由调用方提供
//! - 解密前按配置的上下限校验参数，拒绝被篡改为弱参数的容器
//!
//! 输出：
//! - 32 字节 `DerivedKey`（drop 时清零）

use argon2::{Algorithm, Argon2, Block, Params, Version};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::algorithm::KEY_SIZE;
use crate::crypto::secret::{DerivedKey, Secret};
use crate::error::{Result, StreamSealError};

/// 支持的 KDF 算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum KdfAlgorithm {
    #[default]
    #[serde(rename = "argon2id")]
    Argon2id,
}

impl KdfAlgorithm {
    pub const ARGON2ID_ID: u8 = 1;

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Argon2id => Self::ARGON2ID_ID,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            Self::ARGON2ID_ID => Some(Self::Argon2id),
            _ => None,
        }
    }
}

/// KDF 成本参数（随容器头保存）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    /// 内存成本（KiB）
    pub mem_cost_kib: u32,
    /// 时间成本（迭代次数）
    pub time_cost: u32,
    /// 并行度
    pub parallelism: u32,
}

impl KdfParams {
    pub const fn argon2id(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            mem_cost_kib,
            time_cost,
            parallelism,
        }
    }
}

impl Default for KdfParams {
    /// 64 MiB / 3 次迭代 / 单线程
    fn default() -> Self {
        Self::argon2id(64 * 1024, 3, 1)
    }
}

/// KDF 参数允许范围
///
/// 低于下限视为降级攻击（`WeakParameter`）；
/// 高于上限视为不合理的容器（`MalformedContainer`），避免恶意头部耗尽内存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KdfLimits {
    pub min_mem_cost_kib: u32,
    pub min_time_cost: u32,
    pub min_parallelism: u32,
    pub max_mem_cost_kib: u32,
    pub max_time_cost: u32,
    pub max_parallelism: u32,
}

impl Default for KdfLimits {
    fn default() -> Self {
        Self {
            min_mem_cost_kib: 19 * 1024,
            min_time_cost: 2,
            min_parallelism: 1,
            max_mem_cost_kib: 1024 * 1024,
            max_time_cost: 64,
            max_parallelism: 16,
        }
    }
}

impl KdfLimits {
    /// 校验参数是否位于允许范围内
    pub fn check(&self, params: &KdfParams) -> Result<()> {
        if params.mem_cost_kib < self.min_mem_cost_kib
            || params.time_cost < self.min_time_cost
            || params.parallelism < self.min_parallelism
        {
            return Err(StreamSealError::WeakParameter(format!(
                "m={} KiB, t={}, p={} (minimum m={} KiB, t={}, p={})",
                params.mem_cost_kib,
                params.time_cost,
                params.parallelism,
                self.min_mem_cost_kib,
                self.min_time_cost,
                self.min_parallelism,
            )));
        }

        if params.mem_cost_kib > self.max_mem_cost_kib
            || params.time_cost > self.max_time_cost
            || params.parallelism > self.max_parallelism
        {
            return Err(StreamSealError::malformed(format!(
                "KDF cost exceeds limits: m={} KiB, t={}, p={}",
                params.mem_cost_kib, params.time_cost, params.parallelism,
            )));
        }

        Ok(())
    }

    /// 下限不得高于上限
    pub fn is_consistent(&self) -> bool {
        self.min_mem_cost_kib <= self.max_mem_cost_kib
            && self.min_time_cost <= self.max_time_cost
            && self.min_parallelism <= self.max_parallelism
    }
}

/// 根据口令、salt 与参数派生对称密钥
///
/// 相同输入总是得到相同输出，无副作用。
///
/// #### 错误
/// - 口令为空：`EmptySecret`
/// - 参数低于下限：`WeakParameter`
/// - 参数超出上限或被 Argon2 拒绝：`MalformedContainer`
pub fn derive(
    secret: &Secret,
    salt: &[u8],
    params: &KdfParams,
    limits: &KdfLimits,
) -> Result<DerivedKey> {
    if secret.is_empty() {
        return Err(StreamSealError::EmptySecret);
    }

    limits.check(params)?;

    let (argon2, block_count) = match params.algorithm {
        KdfAlgorithm::Argon2id => {
            let argon2_params = Params::new(
                params.mem_cost_kib,
                params.time_cost,
                params.parallelism,
                Some(KEY_SIZE),
            )
            .map_err(|e| StreamSealError::malformed(format!("invalid Argon2 parameters: {e}")))?;
            let block_count = argon2_params.block_count();

            (
                Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params),
                block_count,
            )
        }
    };

    // 工作内存由这里持有，派生结束后随 drop 清零
    let mut memory = Zeroizing::new(vec![Block::default(); block_count]);
    let mut key = DerivedKey::zeroed();

    argon2
        .hash_password_into_with_memory(
            secret.expose(),
            salt,
            key.as_mut_bytes(),
            &mut memory[..],
        )
        .map_err(|_| StreamSealError::Internal)?;

    Ok(key)
}
