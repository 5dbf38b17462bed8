//! 文件系统辅助工具

pub mod atomic;
