use thiserror::Error;
mod ops;
pub use self::ops::*;

use crate::adversarial::AdversarialError;
use crate::checkpoint::CheckpointError;
use crate::data::DataError;
use crate::nn::GraphError;

/// 张量层面的错误。张量运算符无法返回`Result`，故这些错误通常以panic消息的形式出现
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    // 数字比较用
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: usize,
    },
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },
    #[error("数据长度{data_len}与形状{shape:?}不符")]
    DataLengthMismatch { data_len: usize, shape: Vec<usize> },
    #[error("张量形状不兼容：无法从{from:?}变形为{to:?}")]
    IncompatibleShape { from: Vec<usize>, to: Vec<usize> },
    #[error("该操作仅支持{expected}阶张量，实际为{got}阶")]
    RankMismatch { expected: usize, got: usize },
    #[error("索引{index}越界（上限为{bound}）")]
    IndexOutOfBounds { index: usize, bound: usize },
    #[error("作为除数的张量中存在为零元素")]
    DivByZeroElement,
}

/// 程序入口处的总错误：任何一种错误都会中止本次运行
#[derive(Error, Debug)]
pub enum RunError {
    #[error("数据集错误：{0}")]
    Data(#[from] DataError),
    #[error("计算图错误：{0}")]
    Graph(#[from] GraphError),
    #[error("检查点错误：{0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("对抗样本生成错误：{0}")]
    Adversarial(#[from] AdversarialError),
}
