//! 数据加载模块
//!
//! 提供数据集加载、变换和批处理功能。
//!
//! # 主要组件
//!
//! - [`MnistDataset`]: MNIST 手写数字数据集，图像 [N, 784]，标签 [N, 10] one-hot
//! - [`BatchSource`]/[`MnistBatchSource`]: 训练时循环取批次，按类别挑选图像
//! - [`DataLoader`]: 单个 epoch 的批量加载器，最后一批可补齐（测试集评估）
//! - [`transforms`]: 数据变换函数（归一化、one-hot、补齐批次）
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use mnist_adv::data::{BatchSource, MnistBatchSource, read_data_sets};
//!
//! let splits = read_data_sets("/tmp/tensorflow/mnist/input_data", 5000)?;
//! let mut source = MnistBatchSource::new(splits.train, 42);
//! let (images, labels) = source.next_batch(50);
//! ```

mod batch_source;
mod dataloader;
pub mod datasets;
pub mod error;
pub mod transforms;

#[cfg(test)]
mod tests;

pub use batch_source::{BatchSource, MnistBatchSource};
pub use dataloader::{Batch, DataLoader, TensorDataset};
pub use datasets::{
    DEFAULT_VALIDATION_SIZE, MnistDataset, MnistSplits, default_data_dir, read_data_sets,
};
pub use error::DataError;
