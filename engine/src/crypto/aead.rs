//! 基于原始密钥的一次性 AEAD 加解密
//!
//! 适用于已经持有 32 字节随机密钥、且数据可以整体放入内存的场景。
//! 与流式容器不同，这里不涉及口令与 KDF。
//!
//! 输出格式：
//! ```text
//! nonce (12 或 24 字节) || ciphertext || tag (16 字节)
//! ```
//!
//! 安全约束：
//! - 每次加密都使用全新的随机 nonce
//! - 认证未通过前不返回任何明文

use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroize;

use crate::algorithm::{AeadAlgorithm, KEY_SIZE, TAG_SIZE};
use crate::error::{Result, StreamSealError};

/// 加密数据
///
/// #### 参数
/// - `key`：32 字节对称密钥
/// - `plaintext`：待加密的数据
/// - `algorithm`：AEAD 算法
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    plaintext: &[u8],
    algorithm: AeadAlgorithm,
) -> Result<Vec<u8>> {
    let nonce_len = algorithm.nonce_len();

    let mut nonce = vec![0u8; nonce_len];
    OsRng.fill_bytes(&mut nonce);

    let mut out = Vec::with_capacity(nonce_len + plaintext.len() + TAG_SIZE);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(plaintext);

    let tag = algorithm.seal_in_place(key, &nonce, &[], &mut out[nonce_len..])?;
    out.extend_from_slice(&tag);

    Ok(out)
}

/// 解密 `encrypt` 的输出
///
/// #### 错误
/// - 数据短于 nonce + tag：`MalformedContainer`
/// - 密钥错误或数据被篡改：`Authentication`
pub fn decrypt(key: &[u8; KEY_SIZE], data: &[u8], algorithm: AeadAlgorithm) -> Result<Vec<u8>> {
    let nonce_len = algorithm.nonce_len();

    if data.len() < nonce_len + TAG_SIZE {
        return Err(StreamSealError::malformed(format!(
            "sealed data too short: {} bytes (minimum {})",
            data.len(),
            nonce_len + TAG_SIZE
        )));
    }

    let (nonce, rest) = data.split_at(nonce_len);
    let (ciphertext, tag_bytes) = rest.split_at(rest.len() - TAG_SIZE);

    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(tag_bytes);

    let mut plaintext = ciphertext.to_vec();
    if let Err(err) = algorithm.open_in_place(key, nonce, &[], &mut plaintext, &tag) {
        plaintext.zeroize();
        return Err(err);
    }

    Ok(plaintext)
}
