/*
 * @Description  : 检查点模块的错误类型
 */

use std::path::PathBuf;
use thiserror::Error;

use crate::nn::GraphError;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("检查点不存在：{0}")]
    NotFound(PathBuf),
    #[error("检查点读写失败：{0}")]
    Io(#[from] std::io::Error),
    #[error("检查点元数据无效：{0}")]
    Metadata(#[from] serde_json::Error),
    #[error("{detail}：模型为{expected:?}，检查点为{got:?}")]
    ShapeMismatch {
        detail: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("检查点中缺少参数：{0}")]
    MissingParameter(String),
    #[error("检查点格式错误：{0}")]
    Format(String),
    #[error(transparent)]
    Graph(GraphError),
}

impl From<GraphError> for CheckpointError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::ShapeMismatch {
                expected,
                got,
                message,
            } => Self::ShapeMismatch {
                detail: message,
                expected,
                got,
            },
            GraphError::MissingParameter(names) => Self::MissingParameter(names),
            GraphError::Serialization(msg) => Self::Format(msg),
            other => Self::Graph(other),
        }
    }
}
