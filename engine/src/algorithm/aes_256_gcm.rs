//! StreamSeal AES-256-GCM 加解密算法

use aes_gcm::{
    Aes256Gcm, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};

use super::{KEY_SIZE, TAG_SIZE};
use crate::error::{Result, StreamSealError};
use crate::format::header::NONCE_BASE_SIZE;

pub const NONCE_SIZE: usize = 12;

pub fn seal_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    buffer: &mut [u8],
) -> Result<[u8; TAG_SIZE]> {
    let cipher = Aes256Gcm::new(key.into());

    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), aad, buffer)
        .map_err(|_| StreamSealError::Internal)?;

    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(&tag);
    Ok(out)
}

pub fn open_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    buffer: &mut [u8],
    tag: &[u8; TAG_SIZE],
) -> Result<()> {
    let cipher = Aes256Gcm::new(key.into());

    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), aad, buffer, Tag::from_slice(tag))
        .map_err(|_| StreamSealError::Authentication)
}

/// 取 base 前 12 字节，后 8 字节与计数字异或
///
/// 异或对固定 base 是单射，同一文件内不同计数字得到不同 nonce。
pub fn derive_nonce(base: &[u8; NONCE_BASE_SIZE], counter: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&base[..NONCE_SIZE]);

    for (byte, idx) in nonce[4..].iter_mut().zip(counter.to_be_bytes()) {
        *byte ^= idx;
    }

    nonce
}
