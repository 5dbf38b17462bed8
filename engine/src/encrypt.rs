//! StreamSeal 加密流程实现
//!
//! 将任意字节流加密为 StreamSeal 容器，容器字节按需（惰性）产出。
//!
//! 加密流程（严格顺序）：
//! 1. 从调用方注入的 CSPRNG 生成 salt 与 nonce base
//! 2. 使用 KDF 从口令派生密钥，随后立即丢弃口令
//! 3. 产出容器头
//! 4. 按 chunk_size 读满明文，逐个封装为 chunk 记录
//! 5. 第一次读不满（可能为 0 字节）的 chunk 标记为 final，之后结束
//!
//! 内存占用为 O(chunk_size)，与输入总大小无关。

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use rand::{CryptoRng, RngCore, rngs::OsRng};
use tracing::{debug, trace};
use zeroize::{Zeroize, Zeroizing};

use crate::Engine;
use crate::crypto::Secret;
use crate::crypto::chunk::ChunkCodec;
use crate::crypto::kdf;
use crate::error::{Result, StreamSealError};
use crate::format::header::{ContainerHeader, NONCE_BASE_SIZE, SALT_SIZE};
use crate::format::stream::{read_full, write_record};
use crate::fs::atomic::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncryptState {
    Streaming,
    Finished,
    Failed,
}

/// 惰性产出容器字节的加密流
///
/// 实现 `Read`：依次读出容器头与各个 chunk 记录。
/// drop 时密钥随之清零，调用方中途放弃读取即视为取消。
pub struct EncryptStream<R> {
    input: R,
    codec: ChunkCodec,
    chunk_size: usize,
    chunk: Zeroizing<Vec<u8>>,
    out: Vec<u8>,
    out_pos: usize,
    index: u64,
    state: EncryptState,
}

impl<R: Read> EncryptStream<R> {
    fn new<G: RngCore + CryptoRng>(
        engine: &Engine,
        secret: Secret,
        input: R,
        rng: &mut G,
    ) -> Result<Self> {
        let config = engine.config();
        config.validate()?;

        if secret.is_empty() {
            return Err(StreamSealError::EmptySecret);
        }

        // ---------- 生成 salt / nonce base ----------
        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);

        let mut nonce_base = [0u8; NONCE_BASE_SIZE];
        rng.fill_bytes(&mut nonce_base);

        let header = ContainerHeader::new(
            config.algorithm,
            nonce_base,
            salt,
            config.kdf,
            config.chunk_size,
        );
        salt.zeroize();
        nonce_base.zeroize();

        // ---------- KDF 派生密钥 ----------
        let key = kdf::derive(&secret, &header.salt, &header.kdf, &config.kdf_limits)?;
        drop(secret);

        let header_bytes = header.to_bytes();
        let codec = ChunkCodec::new(key, header.algorithm, header.nonce_base, &header_bytes);

        debug!(
            algorithm = %header.algorithm,
            chunk_size = header.chunk_size,
            mem_cost_kib = header.kdf.mem_cost_kib,
            time_cost = header.kdf.time_cost,
            parallelism = header.kdf.parallelism,
            "container header prepared"
        );

        let chunk_size = header.chunk_size as usize;

        Ok(Self {
            input,
            codec,
            chunk_size,
            chunk: Zeroizing::new(vec![0u8; chunk_size]),
            out: header_bytes.to_vec(),
            out_pos: 0,
            index: 0,
            state: EncryptState::Streaming,
        })
    }

    /// 已封装的 chunk 数量
    pub fn chunks_sealed(&self) -> u64 {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.state == EncryptState::Finished && self.out_pos == self.out.len()
    }

    /// 读满一个明文 chunk，封装后放入输出缓冲
    fn seal_next_chunk(&mut self) -> Result<()> {
        let filled = read_full(&mut self.input, &mut self.chunk[..])?;
        let is_final = filled < self.chunk_size;

        let body = &mut self.chunk[..filled];
        let tag = self.codec.seal(self.index, is_final, body)?;

        self.out.clear();
        self.out_pos = 0;
        write_record(&mut self.out, body, &tag)?;

        trace!(index = self.index, len = filled, is_final, "chunk sealed");

        self.index += 1;
        if is_final {
            self.state = EncryptState::Finished;
            debug!(chunks = self.index, "encryption finished");
        }

        Ok(())
    }
}

impl<R: Read> Read for EncryptStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.out_pos < self.out.len() {
                let n = buf.len().min(self.out.len() - self.out_pos);
                buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }

            match self.state {
                EncryptState::Finished => return Ok(0),
                EncryptState::Failed => return Err(StreamSealError::Aborted.into()),
                EncryptState::Streaming => {}
            }

            if buf.is_empty() {
                return Ok(0);
            }

            if let Err(err) = self.seal_next_chunk() {
                self.state = EncryptState::Failed;
                self.chunk.zeroize();
                debug!(index = self.index, error = %err, "encryption aborted");
                return Err(err.into());
            }
        }
    }
}

impl Engine {
    /// 加密字节流，随机数取自操作系统 CSPRNG
    pub fn encrypt_stream<R: Read>(
        &self,
        secret: impl Into<Secret>,
        input: R,
    ) -> Result<EncryptStream<R>> {
        self.encrypt_stream_with_rng(secret, input, &mut OsRng)
    }

    /// 加密字节流，随机数取自调用方注入的 CSPRNG
    ///
    /// 每次调用各自持有随机源，并行调用之间不共享生成器状态。
    pub fn encrypt_stream_with_rng<R: Read, G: RngCore + CryptoRng>(
        &self,
        secret: impl Into<Secret>,
        input: R,
        rng: &mut G,
    ) -> Result<EncryptStream<R>> {
        EncryptStream::new(self, secret.into(), input, rng)
    }

    /// 推模式：从 `input` 读取明文，把完整容器写入 `output`
    ///
    /// 返回写出的容器字节数。
    pub fn encrypt<R: Read, W: Write>(
        &self,
        secret: impl Into<Secret>,
        input: R,
        mut output: W,
    ) -> Result<u64> {
        let mut stream = self.encrypt_stream(secret, input)?;
        let written = io::copy(&mut stream, &mut output)?;
        output.flush()?;
        Ok(written)
    }

    /// 加密文件
    ///
    /// 输出先写入同目录临时文件，成功后再替换目标文件。
    pub fn encrypt_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        secret: impl Into<Secret>,
    ) -> Result<u64> {
        // ---------- 打开输入文件 ----------
        let input = File::open(input_path)?;
        let mut stream = self.encrypt_stream(secret, BufReader::new(input))?;

        // ---------- Stream 加密 + 原子写出 ----------
        let mut written = 0;
        write_atomic(output_path, |file| {
            let mut writer = BufWriter::new(file);
            written = io::copy(&mut stream, &mut writer)?;
            writer.flush()
        })?;

        debug!(
            input = %input_path.display(),
            output = %output_path.display(),
            bytes = written,
            "file encrypted"
        );

        Ok(written)
    }
}
