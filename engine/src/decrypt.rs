//! StreamSeal 解密流程实现
//!
//! 将 StreamSeal 容器还原为明文字节流，明文按需（惰性）产出。
//!
//! 解密流程（严格顺序）：
//! 1. 读取并校验容器头（版本、算法、chunk 大小）
//! 2. 按配置校验头部中的 KDF 参数，派生密钥，随后立即丢弃口令
//! 3. 逐个读取 chunk 记录，校验标签通过后才放出该 chunk 的明文
//! 4. 读到并校验通过 final chunk、且其后没有多余数据时，进入 Finished
//!
//! 状态机：
//!
//! ```text
//! HeaderParsed ──> Streaming ──> Finished
//!       │              │
//!       └──────────────┴──────> Failed（终止）
//! ```
//!
//! 注意：
//! - 任一 chunk 校验失败或结构错误都立即终止，不做尽力恢复
//! - 流式输出无法撤回：失败前已经放出的明文必须由调用方视为未认证数据丢弃。
//!   需要原子性的调用方应先写入临时位置，只在 `is_finished()` 之后落盘
//!   （`Engine::decrypt_file` 即如此）

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::Engine;
use crate::crypto::Secret;
use crate::crypto::chunk::ChunkCodec;
use crate::crypto::kdf;
use crate::error::{Result, StreamSealError};
use crate::format::header::ContainerHeader;
use crate::format::stream::RecordReader;
use crate::fs::atomic::write_atomic;

/// 解密流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptState {
    /// 容器头已解析、密钥已派生，尚未读取任何 chunk
    HeaderParsed,
    /// 正在逐个校验 chunk
    Streaming,
    /// final chunk 已读取并校验通过
    Finished,
    /// 校验或解析失败（终止状态）
    Failed,
}

/// 惰性产出明文的解密流
pub struct DecryptStream<R> {
    records: RecordReader<R>,
    codec: ChunkCodec,
    chunk_size: usize,
    pending: Zeroizing<Vec<u8>>,
    pending_pos: usize,
    index: u64,
    state: DecryptState,
}

impl<R: Read> DecryptStream<R> {
    fn new(engine: &Engine, secret: Secret, mut input: R) -> Result<Self> {
        if secret.is_empty() {
            return Err(StreamSealError::EmptySecret);
        }

        // ---------- 读取并校验容器头 ----------
        let header = ContainerHeader::read(&mut input)?;

        debug!(
            algorithm = %header.algorithm,
            chunk_size = header.chunk_size,
            mem_cost_kib = header.kdf.mem_cost_kib,
            time_cost = header.kdf.time_cost,
            parallelism = header.kdf.parallelism,
            "container header parsed"
        );

        // ---------- KDF 派生密钥（参数取自容器头）----------
        let key = kdf::derive(
            &secret,
            &header.salt,
            &header.kdf,
            &engine.config().kdf_limits,
        )?;
        drop(secret);

        let codec = ChunkCodec::new(
            key,
            header.algorithm,
            header.nonce_base,
            &header.to_bytes(),
        );
        let chunk_size = header.chunk_size as usize;

        Ok(Self {
            records: RecordReader::new(input, chunk_size),
            codec,
            chunk_size,
            pending: Zeroizing::new(Vec::new()),
            pending_pos: 0,
            index: 0,
            state: DecryptState::HeaderParsed,
        })
    }

    pub fn state(&self) -> DecryptState {
        self.state
    }

    /// final chunk 是否已经校验通过
    ///
    /// 只有返回 true 之后，已读出的全部明文才构成完整且经过认证的结果。
    pub fn is_finished(&self) -> bool {
        self.state == DecryptState::Finished
    }

    /// 已校验通过的 chunk 数量
    pub fn chunks_verified(&self) -> u64 {
        self.index
    }

    /// 读取并校验下一个 chunk，通过后放入待输出缓冲
    fn open_next_chunk(&mut self) -> Result<()> {
        let record = self
            .records
            .next_record()?
            .ok_or(StreamSealError::TruncatedContainer)?;
        self.state = DecryptState::Streaming;

        let is_final = record.is_final(self.chunk_size);
        let plaintext = self
            .codec
            .open(self.index, is_final, record.ciphertext, &record.tag)?;

        trace!(index = self.index, len = plaintext.len(), is_final, "chunk verified");
        self.index += 1;

        if is_final {
            // final chunk 之后不允许再有数据，确认后才放出最后一段明文
            self.records.expect_end()?;
            self.state = DecryptState::Finished;
            debug!(chunks = self.index, "decryption finished");
        }

        self.pending = plaintext;
        self.pending_pos = 0;

        Ok(())
    }
}

impl<R: Read> Read for DecryptStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pending_pos < self.pending.len() {
                let n = buf.len().min(self.pending.len() - self.pending_pos);
                buf[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                return Ok(n);
            }

            match self.state {
                DecryptState::Finished => return Ok(0),
                DecryptState::Failed => return Err(StreamSealError::Aborted.into()),
                DecryptState::HeaderParsed | DecryptState::Streaming => {}
            }

            if buf.is_empty() {
                return Ok(0);
            }

            if let Err(err) = self.open_next_chunk() {
                self.state = DecryptState::Failed;
                self.pending = Zeroizing::new(Vec::new());
                self.pending_pos = 0;
                debug!(index = self.index, error = %err, "decryption failed");
                return Err(err.into());
            }
        }
    }
}

impl Engine {
    /// 解密容器字节流
    ///
    /// 容器头与密钥派生在此处完成，头部错误（版本、参数）会立即返回；
    /// chunk 级错误在读取返回的流时出现。
    pub fn decrypt_stream<R: Read>(
        &self,
        secret: impl Into<Secret>,
        input: R,
    ) -> Result<DecryptStream<R>> {
        DecryptStream::new(self, secret.into(), input)
    }

    /// 推模式：从 `input` 读取容器，把明文写入 `output`
    ///
    /// 返回写出的明文字节数。出错时 `output` 中可能已有部分未认证的明文。
    pub fn decrypt<R: Read, W: Write>(
        &self,
        secret: impl Into<Secret>,
        input: R,
        mut output: W,
    ) -> Result<u64> {
        let mut stream = self.decrypt_stream(secret, input)?;
        let written = io::copy(&mut stream, &mut output)?;
        output.flush()?;

        if !stream.is_finished() {
            return Err(StreamSealError::Internal);
        }

        Ok(written)
    }

    /// 解密文件
    ///
    /// 明文先写入同目录临时文件，只有到达 Finished 后才替换目标文件；
    /// 任何失败都不会在目标路径留下未认证的明文。
    pub fn decrypt_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        secret: impl Into<Secret>,
    ) -> Result<u64> {
        // ---------- 打开输入文件 / 读取容器头 ----------
        let input = File::open(input_path)?;
        let mut stream = self.decrypt_stream(secret, BufReader::new(input))?;

        // ---------- Stream 解密 + 原子写出 ----------
        let mut written = 0;
        write_atomic(output_path, |file| {
            let mut writer = BufWriter::new(file);
            written = io::copy(&mut stream, &mut writer)?;
            writer.flush()?;

            if !stream.is_finished() {
                return Err(StreamSealError::Internal.into());
            }
            Ok(())
        })?;

        debug!(
            input = %input_path.display(),
            output = %output_path.display(),
            bytes = written,
            "file decrypted"
        );

        Ok(written)
    }
}
