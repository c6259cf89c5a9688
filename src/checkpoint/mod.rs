//! 检查点：按训练步数保存、恢复模型参数
//!
//! 每个检查点由两个文件组成：
//! - `<base>-<step>`：参数二进制文件（见 [`Graph::save_params`](crate::nn::Graph::save_params)）
//! - `<base>-<step>.json`：元数据（步数、各参数的名称与形状）

mod error;
mod store;

pub use error::CheckpointError;
pub use store::{CheckpointMeta, DEFAULT_CHECKPOINT_BASE, ParameterStore};

#[cfg(test)]
mod tests;
