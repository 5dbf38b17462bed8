//! Chunk 编解码器
//!
//! 对单个有界 chunk 做 AEAD 封装与解封。每个 chunk 的 nonce 与 AAD
//! 都由三部分决定：容器头（含 nonce base）、chunk 序号、是否为最后一个 chunk。
//!
//! ```text
//! counter = index | (final << 63)
//! nonce   = derive_nonce(nonce_base, counter)      （按算法构造，见 algorithm 模块）
//! AAD     = header_bytes || index (u64 BE) || final (u8)
//! ```
//!
//! 因此：
//! - 同一密钥下 nonce 不会重复（序号单调、final 位只出现一次）
//! - 交换、截断、跨文件拼接 chunk 均会导致认证失败
//! - 修改容器头任意字段都会导致所有 chunk 认证失败

use zeroize::{Zeroize, Zeroizing};

use crate::algorithm::{AeadAlgorithm, TAG_SIZE};
use crate::crypto::secret::DerivedKey;
use crate::error::{Result, StreamSealError};
use crate::format::header::NONCE_BASE_SIZE;

/// counter 的最高位用作 final 标志
pub const FINAL_FLAG: u64 = 1 << 63;

/// 可用的最大 chunk 序号
pub const MAX_CHUNK_INDEX: u64 = FINAL_FLAG - 1;

pub struct ChunkCodec {
    key: DerivedKey,
    algorithm: AeadAlgorithm,
    nonce_base: Zeroizing<[u8; NONCE_BASE_SIZE]>,
    header: Zeroizing<Vec<u8>>,
}

impl ChunkCodec {
    /// 创建编解码器
    ///
    /// - key: KDF 派生的密钥，所有权转移给编解码器，随其 drop 清零
    /// - nonce_base: 容器头中的随机 nonce base
    /// - header: 序列化后的容器头，作为每个 chunk AAD 的前缀
    pub fn new(
        key: DerivedKey,
        algorithm: AeadAlgorithm,
        nonce_base: [u8; NONCE_BASE_SIZE],
        header: &[u8],
    ) -> Self {
        Self {
            key,
            algorithm,
            nonce_base: Zeroizing::new(nonce_base),
            header: Zeroizing::new(header.to_vec()),
        }
    }

    /// 原地加密一个 chunk，返回认证标签
    ///
    /// 密文长度与明文相同，标签单独返回。
    pub fn seal(&self, index: u64, is_final: bool, buffer: &mut [u8]) -> Result<[u8; TAG_SIZE]> {
        let counter = counter(index, is_final).ok_or(StreamSealError::Internal)?;
        let nonce = self.algorithm.derive_nonce(&self.nonce_base, counter);
        let aad = self.aad(index, is_final);

        self.algorithm
            .seal_in_place(self.key.as_bytes(), &nonce, &aad, buffer)
    }

    /// 校验并解密一个 chunk
    ///
    /// 标签校验失败时返回 `Authentication`，且已写入缓冲区的数据随即清零，
    /// 调用方拿不到任何未经认证的明文。
    pub fn open(
        &self,
        index: u64,
        is_final: bool,
        ciphertext: Vec<u8>,
        tag: &[u8; TAG_SIZE],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let counter = counter(index, is_final)
            .ok_or_else(|| StreamSealError::malformed("chunk index out of range"))?;
        let nonce = self.algorithm.derive_nonce(&self.nonce_base, counter);
        let aad = self.aad(index, is_final);

        let mut buffer = Zeroizing::new(ciphertext);
        if let Err(err) =
            self.algorithm
                .open_in_place(self.key.as_bytes(), &nonce, &aad, &mut buffer, tag)
        {
            buffer.zeroize();
            return Err(err);
        }

        Ok(buffer)
    }

    fn aad(&self, index: u64, is_final: bool) -> Vec<u8> {
        let mut aad = Vec::with_capacity(self.header.len() + 8 + 1);
        aad.extend_from_slice(&self.header);
        aad.extend_from_slice(&index.to_be_bytes());
        aad.push(u8::from(is_final));
        aad
    }
}

fn counter(index: u64, is_final: bool) -> Option<u64> {
    if index > MAX_CHUNK_INDEX {
        return None;
    }

    Some(if is_final { index | FINAL_FLAG } else { index })
}
