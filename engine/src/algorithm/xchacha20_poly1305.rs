//! StreamSeal XChaCha20-Poly1305 加解密算法

use chacha20poly1305::{
    Tag, XChaCha20Poly1305, XNonce,
    aead::{AeadInPlace, KeyInit},
};

use super::{KEY_SIZE, TAG_SIZE};
use crate::error::{Result, StreamSealError};
use crate::format::header::NONCE_BASE_SIZE;

pub const NONCE_SIZE: usize = 24;

pub fn seal_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    buffer: &mut [u8],
) -> Result<[u8; TAG_SIZE]> {
    let cipher = XChaCha20Poly1305::new(key.into());

    let tag = cipher
        .encrypt_in_place_detached(XNonce::from_slice(nonce), aad, buffer)
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
    let cipher = XChaCha20Poly1305::new(key.into());

    cipher
        .decrypt_in_place_detached(XNonce::from_slice(nonce), aad, buffer, Tag::from_slice(tag))
        .map_err(|_| StreamSealError::Authentication)
}

/// nonce = base (16 字节) || counter (8 字节，大端)
pub fn derive_nonce(base: &[u8; NONCE_BASE_SIZE], counter: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..NONCE_BASE_SIZE].copy_from_slice(base);
    nonce[NONCE_BASE_SIZE..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_in_place() {
        let key = [9u8; KEY_SIZE];
        let nonce = derive_nonce(&[3u8; NONCE_BASE_SIZE], 7);
        let plaintext = b"xchacha chunk payload".to_vec();
        let mut buffer = plaintext.clone();

        let tag = seal_in_place(&key, &nonce, b"aad", &mut buffer).unwrap();
        assert_eq!(buffer.len(), plaintext.len());
        assert_ne!(buffer, plaintext);

        open_in_place(&key, &nonce, b"aad", &mut buffer, &tag).unwrap();
        assert_eq!(buffer, plaintext);
    }

    #[test]
    fn wrong_aad_fails() {
        let key = [9u8; KEY_SIZE];
        let nonce = derive_nonce(&[3u8; NONCE_BASE_SIZE], 0);
        let mut buffer = b"bound to aad".to_vec();

        let tag = seal_in_place(&key, &nonce, b"index-0", &mut buffer).unwrap();
        let result = open_in_place(&key, &nonce, b"index-1", &mut buffer, &tag);
        assert!(matches!(result, Err(StreamSealError::Authentication)));
    }
}
