//! StreamSeal v1 容器头实现
//!
//! 容器头的职责：
//! - 标识文件类型（magic）
//! - 指明格式版本号
//! - 指明 AEAD 算法
//! - 提供 chunk nonce 所需的 nonce base
//! - 提供密钥派生所需的 salt 与 KDF 参数
//! - 指明明文 chunk 大小
//!
//! 容器头是整个容器的“格式锚点”：
//! - 解密前必须完整读取并校验
//! - 版本号未知时立即拒绝，不尝试解析后续字段
//! - 序列化结果作为每个 chunk AAD 的前缀，任何字段被改动都会导致认证失败

use std::io::{self, Read, Write};

use zeroize::Zeroize;

use crate::algorithm::AeadAlgorithm;
use crate::crypto::kdf::{KdfAlgorithm, KdfParams};
use crate::error::{Result, StreamSealError};

/// StreamSeal 魔数（ASCII）
pub const MAGIC: &[u8; 8] = b"STRMSEAL";

/// 当前支持的版本号
pub const VERSION: u8 = 1;

/// chunk nonce base 长度（字节）
pub const NONCE_BASE_SIZE: usize = 16;

/// KDF 使用的 salt 长度（字节）
pub const SALT_SIZE: usize = 16;

/// 允许声明的最大 chunk 大小：16 MiB
pub const MAX_CHUNK_SIZE: u32 = 16 * 1024 * 1024;

/// v1 容器头固定大小
///
/// 8  (magic)
/// 1  (version)
/// 1  (aead id)
/// 16 (nonce base)
/// 16 (salt)
/// 1  (kdf id)
/// 12 (kdf m / t / p)
/// 4  (chunk size)
pub const HEADER_SIZE: usize = 8 + 1 + 1 + NONCE_BASE_SIZE + SALT_SIZE + 1 + 12 + 4;

/// v1 容器头
///
/// 该结构仅表示头部的语义内容，字节布局由 `to_bytes` / `read` 负责。
/// salt 与 nonce base 在 drop 时清零。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    pub algorithm: AeadAlgorithm,
    pub nonce_base: [u8; NONCE_BASE_SIZE],
    pub salt: [u8; SALT_SIZE],
    pub kdf: KdfParams,
    pub chunk_size: u32,
}

impl ContainerHeader {
    /// 创建新的 v1 容器头，通常在加密时调用。
    pub fn new(
        algorithm: AeadAlgorithm,
        nonce_base: [u8; NONCE_BASE_SIZE],
        salt: [u8; SALT_SIZE],
        kdf: KdfParams,
        chunk_size: u32,
    ) -> Self {
        Self {
            version: VERSION,
            algorithm,
            nonce_base,
            salt,
            kdf,
            chunk_size,
        }
    }

    /// 按 v1 布局序列化（整数一律大端）
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut pos = 0;

        let mut put = |bytes: &[u8]| {
            out[pos..pos + bytes.len()].copy_from_slice(bytes);
            pos += bytes.len();
        };

        put(MAGIC);
        put(&[self.version]);
        put(&[self.algorithm.to_u8()]);
        put(&self.nonce_base);
        put(&self.salt);
        put(&[self.kdf.algorithm.to_u8()]);
        put(&self.kdf.mem_cost_kib.to_be_bytes());
        put(&self.kdf.time_cost.to_be_bytes());
        put(&self.kdf.parallelism.to_be_bytes());
        put(&self.chunk_size.to_be_bytes());

        out
    }

    /// 将容器头写入输出流
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// 从输入流读取并解析容器头，通常在解密时调用。
    ///
    /// #### 错误
    /// - 输入在头部中途结束：`TruncatedContainer`
    /// - magic 不符、算法标识未知、chunk 大小不合理：`MalformedContainer`
    /// - 版本号未知：`UnsupportedVersion`
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        read_field(&mut reader, &mut magic)?;

        if &magic != MAGIC {
            return Err(StreamSealError::malformed("invalid StreamSeal magic"));
        }

        let mut version_buf = [0u8; 1];
        read_field(&mut reader, &mut version_buf)?;
        let version = version_buf[0];

        if version != VERSION {
            return Err(StreamSealError::UnsupportedVersion(version));
        }

        let mut algorithm_buf = [0u8; 1];
        read_field(&mut reader, &mut algorithm_buf)?;
        let algorithm = AeadAlgorithm::from_u8(algorithm_buf[0]).ok_or_else(|| {
            StreamSealError::malformed(format!("unknown AEAD algorithm id {}", algorithm_buf[0]))
        })?;

        let mut nonce_base = [0u8; NONCE_BASE_SIZE];
        read_field(&mut reader, &mut nonce_base)?;

        let mut salt = [0u8; SALT_SIZE];
        read_field(&mut reader, &mut salt)?;

        let mut kdf_id_buf = [0u8; 1];
        read_field(&mut reader, &mut kdf_id_buf)?;
        let kdf_algorithm = KdfAlgorithm::from_u8(kdf_id_buf[0]).ok_or_else(|| {
            StreamSealError::malformed(format!("unknown KDF algorithm id {}", kdf_id_buf[0]))
        })?;

        let mem_cost_kib = read_u32(&mut reader)?;
        let time_cost = read_u32(&mut reader)?;
        let parallelism = read_u32(&mut reader)?;

        let chunk_size = read_u32(&mut reader)?;
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            return Err(StreamSealError::malformed(format!(
                "invalid chunk size {chunk_size}"
            )));
        }

        Ok(Self {
            version,
            algorithm,
            nonce_base,
            salt,
            kdf: KdfParams {
                algorithm: kdf_algorithm,
                mem_cost_kib,
                time_cost,
                parallelism,
            },
            chunk_size,
        })
    }
}

impl Drop for ContainerHeader {
    fn drop(&mut self) {
        self.salt.zeroize();
        self.nonce_base.zeroize();
    }
}

fn read_field<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            StreamSealError::TruncatedContainer
        } else {
            StreamSealError::from(e)
        }
    })
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_field(reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}
