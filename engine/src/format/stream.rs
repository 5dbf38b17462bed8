//! StreamSeal v1 chunk 记录流
//!
//! 容器头之后是按序排列的 chunk 记录：
//!
//! ```text
//! [len: u32 BE][ciphertext: len 字节][tag: 16 字节]
//! ```
//!
//! 终结约定：
//! - 非最后一个记录的密文长度必须恰好等于 chunk_size
//! - 第一个长度小于 chunk_size 的记录（可以为 0）即为最后一个记录
//! - 最后一个记录之后不允许再有任何字节
//!
//! final 标志不单独存储，而是由长度推出，并通过 nonce / AAD 绑定到密文。
//!
//! 本模块只负责记录的序列化与反序列化，不涉及加解密。
//! 读取端按需逐个产出记录，写入端每次接收一个记录，两侧内存占用都是 O(chunk_size)。

use std::io::{self, Read, Write};

use crate::algorithm::TAG_SIZE;
use crate::error::{Result, StreamSealError};

// 每个记录前的长度字段大小（u32，大端）
pub const LEN_SIZE: usize = 4;

// 推荐的默认明文 chunk 大小：64 KiB
pub const DEFAULT_CHUNK_SIZE: u32 = 64 * 1024;

/// 一个已从输入中读出的 chunk 记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

impl ChunkRecord {
    /// 是否为最后一个记录（长度小于 chunk_size）
    pub fn is_final(&self, chunk_size: usize) -> bool {
        self.ciphertext.len() < chunk_size
    }

    pub fn encoded_len(&self) -> usize {
        LEN_SIZE + self.ciphertext.len() + TAG_SIZE
    }
}

/// 写入一个 chunk 记录
pub fn write_record<W: Write>(
    mut writer: W,
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<()> {
    let len = u32::try_from(ciphertext.len()).map_err(|_| StreamSealError::Internal)?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(ciphertext)?;
    writer.write_all(tag)?;

    Ok(())
}

/// 逐个读取 chunk 记录
pub struct RecordReader<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self { reader, chunk_size }
    }

    /// 读取下一个记录
    ///
    /// - 在记录边界处遇到 EOF：返回 `Ok(None)`，由调用方判断是否截断
    /// - 在记录中途遇到 EOF：`TruncatedContainer`
    /// - 声明长度超过 chunk_size：`MalformedContainer`（先校验再分配）
    pub fn next_record(&mut self) -> Result<Option<ChunkRecord>> {
        let mut len_buf = [0u8; LEN_SIZE];

        match read_full(&mut self.reader, &mut len_buf)? {
            0 => return Ok(None),
            LEN_SIZE => {}
            _ => return Err(StreamSealError::TruncatedContainer),
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > self.chunk_size {
            return Err(StreamSealError::malformed(format!(
                "chunk record of {len} bytes exceeds chunk size {}",
                self.chunk_size
            )));
        }

        let mut ciphertext = vec![0u8; len];
        self.read_exact_or_truncated(&mut ciphertext)?;

        let mut tag = [0u8; TAG_SIZE];
        self.read_exact_or_truncated(&mut tag)?;

        Ok(Some(ChunkRecord { ciphertext, tag }))
    }

    /// 确认最后一个记录之后没有多余数据
    pub fn expect_end(&mut self) -> Result<()> {
        let mut probe = [0u8; 1];

        if read_full(&mut self.reader, &mut probe)? != 0 {
            return Err(StreamSealError::malformed(
                "trailing data after the final chunk",
            ));
        }

        Ok(())
    }

    fn read_exact_or_truncated(&mut self, buf: &mut [u8]) -> Result<()> {
        if read_full(&mut self.reader, buf)? < buf.len() {
            return Err(StreamSealError::TruncatedContainer);
        }
        Ok(())
    }
}

/// 尽量填满 `buf`，返回实际读到的字节数；只有到达 EOF 时才会少于 `buf.len()`
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 每次最多返回 3 字节的 reader，用于覆盖短读
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    fn encoded(records: &[(&[u8], [u8; TAG_SIZE])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (ciphertext, tag) in records {
            write_record(&mut out, ciphertext, tag).unwrap();
        }
        out
    }

    #[test]
    fn records_are_read_back_in_order() {
        let bytes = encoded(&[(&b"abcd"[..], [1; TAG_SIZE]), (&b"ef"[..], [2; TAG_SIZE])]);
        assert_eq!(bytes.len(), (4 + 4 + 16) + (4 + 2 + 16));

        let mut reader = RecordReader::new(Trickle(&bytes), 4);

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.ciphertext, b"abcd");
        assert_eq!(first.tag, [1; TAG_SIZE]);
        assert!(!first.is_final(4));
        assert_eq!(first.encoded_len(), 24);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.ciphertext, b"ef");
        assert!(second.is_final(4));

        reader.expect_end().unwrap();
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn empty_record_is_final() {
        let bytes = encoded(&[(&b""[..], [0; TAG_SIZE])]);
        let mut reader = RecordReader::new(bytes.as_slice(), 16);

        let record = reader.next_record().unwrap().unwrap();
        assert!(record.ciphertext.is_empty());
        assert!(record.is_final(16));
    }

    #[test]
    fn oversized_record_is_malformed() {
        let bytes = encoded(&[(&b"too long"[..], [0; TAG_SIZE])]);
        let mut reader = RecordReader::new(bytes.as_slice(), 4);

        assert!(matches!(
            reader.next_record(),
            Err(StreamSealError::MalformedContainer(_))
        ));
    }

    #[test]
    fn cut_inside_record_is_truncated() {
        let bytes = encoded(&[(&b"abcd"[..], [1; TAG_SIZE])]);

        for cut in [2, LEN_SIZE + 2, bytes.len() - 1] {
            let mut reader = RecordReader::new(&bytes[..cut], 4);
            assert!(matches!(
                reader.next_record(),
                Err(StreamSealError::TruncatedContainer)
            ));
        }
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = encoded(&[(&b"ab"[..], [1; TAG_SIZE])]);
        bytes.push(0);

        let mut reader = RecordReader::new(bytes.as_slice(), 4);
        reader.next_record().unwrap().unwrap();

        assert!(matches!(
            reader.expect_end(),
            Err(StreamSealError::MalformedContainer(_))
        ));
    }
}
