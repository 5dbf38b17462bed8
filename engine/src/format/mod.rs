//! StreamSeal v1 容器格式
//!
//! ```text
//! [ContainerHeader: 59 字节][chunk record 0][chunk record 1]...[final record]
//! ```
//!
//! - `header`：容器头的序列化与校验
//! - `stream`：chunk 记录的序列化与逐个读取

pub mod header;
pub mod stream;
