//! HMAC-SHA256 签名与校验

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, StreamSealError};

type HmacSha256 = Hmac<Sha256>;

/// 签名长度（SHA-256 输出）
pub const SIGNATURE_LEN: usize = 32;

/// 计算 `data` 在 `key` 下的 HMAC-SHA256
pub fn sign(data: &[u8], key: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
    let mut mac = new_mac(key)?;
    mac.update(data);

    let mut signature = [0u8; SIGNATURE_LEN];
    signature.copy_from_slice(&mac.finalize().into_bytes());
    Ok(signature)
}

/// 常数时间校验签名
pub fn verify(data: &[u8], signature: &[u8], key: &[u8]) -> Result<bool> {
    let mut mac = new_mac(key)?;
    mac.update(data);
    Ok(mac.verify_slice(signature).is_ok())
}

fn new_mac(key: &[u8]) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| StreamSealError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let signature = sign(b"message", b"key").unwrap();

        assert!(verify(b"message", &signature, b"key").unwrap());
        assert!(!verify(b"message!", &signature, b"key").unwrap());
        assert!(!verify(b"message", &signature, b"other key").unwrap());
        assert!(!verify(b"message", &signature[..16], b"key").unwrap());
    }

    #[test]
    fn rfc4231_case_2() {
        let signature = sign(b"what do ya want for nothing?", b"Jefe").unwrap();
        let expected = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
            0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
            0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(signature, expected);
    }
}
