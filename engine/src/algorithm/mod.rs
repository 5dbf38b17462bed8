//! StreamSeal AEAD 算法模块。
//!
//! 统一管理可选算法与算法标识，具体实现见子模块。
//! 两种算法都使用 32 字节密钥、16 字节标签，密文与明文等长（detached tag）。

pub mod aes_256_gcm;
pub mod xchacha20_poly1305;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Result, StreamSealError};
use crate::format::header::NONCE_BASE_SIZE;

/// AEAD 密钥长度（256 bit）
pub const KEY_SIZE: usize = 32;

/// AEAD 认证标签长度
pub const TAG_SIZE: usize = 16;

/// 支持的 AEAD 算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum AeadAlgorithm {
    #[default]
    #[serde(rename = "xchacha20-poly1305")]
    XChaCha20Poly1305,
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl AeadAlgorithm {
    pub const XCHACHA20_POLY1305_ID: u8 = 1;
    pub const AES_256_GCM_ID: u8 = 2;

    pub fn to_u8(self) -> u8 {
        match self {
            Self::XChaCha20Poly1305 => Self::XCHACHA20_POLY1305_ID,
            Self::Aes256Gcm => Self::AES_256_GCM_ID,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            Self::XCHACHA20_POLY1305_ID => Some(Self::XChaCha20Poly1305),
            Self::AES_256_GCM_ID => Some(Self::Aes256Gcm),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => "xchacha20-poly1305",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }

    pub fn nonce_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => xchacha20_poly1305::NONCE_SIZE,
            Self::Aes256Gcm => aes_256_gcm::NONCE_SIZE,
        }
    }

    /// 由 nonce base 与计数字（chunk 序号 + final 位）构造 chunk nonce
    pub(crate) fn derive_nonce(self, base: &[u8; NONCE_BASE_SIZE], counter: u64) -> Vec<u8> {
        match self {
            Self::XChaCha20Poly1305 => xchacha20_poly1305::derive_nonce(base, counter).to_vec(),
            Self::Aes256Gcm => aes_256_gcm::derive_nonce(base, counter).to_vec(),
        }
    }

    /// 原地加密 `buffer`，返回独立的认证标签
    pub(crate) fn seal_in_place(
        self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8],
        aad: &[u8],
        buffer: &mut [u8],
    ) -> Result<[u8; TAG_SIZE]> {
        match self {
            Self::XChaCha20Poly1305 => {
                xchacha20_poly1305::seal_in_place(key, fixed_nonce(nonce)?, aad, buffer)
            }
            Self::Aes256Gcm => aes_256_gcm::seal_in_place(key, fixed_nonce(nonce)?, aad, buffer),
        }
    }

    /// 校验标签后原地解密 `buffer`
    ///
    /// 校验失败时返回 `Authentication`，`buffer` 内容不可再使用。
    pub(crate) fn open_in_place(
        self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8],
        aad: &[u8],
        buffer: &mut [u8],
        tag: &[u8; TAG_SIZE],
    ) -> Result<()> {
        match self {
            Self::XChaCha20Poly1305 => {
                xchacha20_poly1305::open_in_place(key, fixed_nonce(nonce)?, aad, buffer, tag)
            }
            Self::Aes256Gcm => {
                aes_256_gcm::open_in_place(key, fixed_nonce(nonce)?, aad, buffer, tag)
            }
        }
    }
}

impl fmt::Display for AeadAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AeadAlgorithm {
    type Err = StreamSealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xchacha20-poly1305" | "xchacha" => Ok(Self::XChaCha20Poly1305),
            "aes-256-gcm" | "aes" => Ok(Self::Aes256Gcm),
            other => Err(StreamSealError::InvalidConfig(format!(
                "unknown AEAD algorithm: {other}"
            ))),
        }
    }
}

fn fixed_nonce<const N: usize>(nonce: &[u8]) -> Result<&[u8; N]> {
    nonce.try_into().map_err(|_| StreamSealError::Internal)
}
