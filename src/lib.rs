//! # mnist_adv
//!
//! 用纯rust实现的 MNIST 卷积分类器，以及针对它的对抗样本生成：
//! 冻结训练好的分类器，沿目标类别交叉熵对输入图像的梯度反复更新图像，
//! 直到分类器以高置信度把原本的“2”判为目标类别。
//!
//! 计算图、自动微分与张量均在本 crate 内实现（见 [`nn`]、[`tensor`]）。

pub mod adversarial;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod errors;
pub mod model;
pub mod nn;
pub mod tensor;
pub mod train;
pub mod utils;
pub mod vision;
