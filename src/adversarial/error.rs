/*
 * @Description  : 对抗样本生成的错误类型
 */

use thiserror::Error;

use crate::nn::GraphError;

#[derive(Debug, Error)]
pub enum AdversarialError {
    #[error("攻击配置无效：{0}")]
    InvalidConfig(String),
    #[error("类别{class}的样本只有{available}个，不足{needed}个")]
    NotEnoughSamples {
        class: usize,
        needed: usize,
        available: usize,
    },
    #[error("输入缓冲区形状须为{expected:?}，实际为{got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("保存快照失败：{0}")]
    Snapshot(#[from] image::ImageError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
