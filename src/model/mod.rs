//! 分类模型：固定结构的 MNIST 卷积网络

mod cnn;

pub use cnn::{CnnMnist, InputMode, KEEP_PROB_EVAL, KEEP_PROB_TRAIN};

#[cfg(test)]
mod tests;
