//! StreamSeal：基于口令的流式认证加密
//!
//! 将任意长度的字节流加密为自描述容器，内存占用与输入大小无关。
//! 解密时逐 chunk 校验，任何篡改、重排、截断或追加都会被拒绝。
//!
//! ```no_run
//! use std::io::Read;
//! use streamseal::{Engine, EngineConfig};
//!
//! # fn main() -> streamseal::Result<()> {
//! let engine = Engine::new(EngineConfig::default())?;
//!
//! let mut container = Vec::new();
//! engine.encrypt("correct horse", &b"hello"[..], &mut container)?;
//!
//! let mut plaintext = Vec::new();
//! let mut stream = engine.decrypt_stream("correct horse", container.as_slice())?;
//! stream.read_to_end(&mut plaintext)?;
//! assert!(stream.is_finished());
//! # Ok(())
//! # }
//! ```

mod decrypt;
mod encrypt;

pub mod algorithm;
pub mod config;
pub mod crypto;
pub mod error;
pub mod format;
pub mod fs;

pub use algorithm::AeadAlgorithm;
pub use config::EngineConfig;
pub use crypto::kdf::{KdfAlgorithm, KdfLimits, KdfParams};
pub use crypto::{DerivedKey, Secret};
pub use decrypt::{DecryptState, DecryptStream};
pub use encrypt::EncryptStream;
pub use error::{Result, StreamSealError};

use std::io::Read;
use std::path::Path;

/// 加解密引擎
///
/// 只持有不可变配置，可以在线程间共享；每次加解密调用互相独立。
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// 以校验过的配置创建引擎
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// 使用默认配置加密字节流
pub fn encrypt_stream<R: Read>(
    secret: impl Into<Secret>,
    input: R,
) -> Result<EncryptStream<R>> {
    Engine::default().encrypt_stream(secret, input)
}

/// 使用默认配置解密字节流
pub fn decrypt_stream<R: Read>(
    secret: impl Into<Secret>,
    input: R,
) -> Result<DecryptStream<R>> {
    Engine::default().decrypt_stream(secret, input)
}

pub fn encrypt(input: &Path, output: &Path, password: &str) -> Result<()> {
    Engine::default().encrypt_file(input, output, password)?;
    Ok(())
}

pub fn decrypt(input: &Path, output: &Path, password: &str) -> Result<()> {
    Engine::default().decrypt_file(input, output, password)?;
    Ok(())
}
