//! 数据集读取与取样的错误

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// 原始 IDX 文件和对应的 .gz 都不存在
    #[error("找不到数据文件{0}（及其.gz版本）")]
    FileNotFound(PathBuf),

    #[error("读取数据文件失败：{0}")]
    IoError(#[from] std::io::Error),

    /// IDX 头部魔数或尺寸不对、文件被截断、标签值越界等
    #[error("IDX文件格式错误：{0}")]
    FormatError(String),

    /// 验证集会占掉全部训练样本
    #[error("验证集大小{validation_size}须小于训练文件的样本数{len}")]
    InvalidSplit { validation_size: usize, len: usize },

    #[error("样本下标{index}越界（共{len}个样本）")]
    IndexOutOfBounds { index: usize, len: usize },

    /// 图像与标签张量的形状对不上
    #[error("数据形状不匹配：期望{expected:?}，实际{got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}
