//! StreamSeal 密码学原语
//!
//! - `secret`：口令与派生密钥的持有与清零
//! - `kdf`：Argon2id 密钥派生与参数策略
//! - `chunk`：单个 chunk 的 AEAD 封装 / 解封（位置与终结标志绑定）
//! - `aead`：基于原始密钥的一次性加解密
//! - `mac`：HMAC-SHA256 签名与校验

pub mod aead;
pub mod chunk;
pub mod kdf;
pub mod mac;
pub mod secret;

pub use secret::{DerivedKey, Secret};

use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::algorithm::KEY_SIZE;

/// 默认生成的密钥长度（AES-256 / XChaCha20 均为 32 字节）
pub const DEFAULT_KEY_LEN: usize = KEY_SIZE;

/// 从操作系统 CSPRNG 生成指定长度的随机密钥
pub fn generate_key(len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; len]);
    OsRng.fill_bytes(&mut key);
    key
}
