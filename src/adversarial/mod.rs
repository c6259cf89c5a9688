//! 对抗样本生成
//!
//! 冻结分类器参数，反复求目标类别交叉熵对输入图像的梯度，
//! 用普通梯度下降更新图像，使分类器把它们判为目标类别。
//!
//! ```ignore
//! let model = CnnMnist::new(&graph, 50, InputMode::Differentiable)?;
//! store.restore_step(&graph, 200)?;
//! model.freeze()?;
//! let report = AdversarialOptimizer::new(&model, AttackConfig::default())?.run(&twos)?;
//! ```

mod buffer;
mod driver;
mod error;
mod optimizer;

pub use buffer::InputBuffer;
pub use driver::run_attack_mode;
pub use error::AdversarialError;
pub use optimizer::{AdversarialOptimizer, AttackConfig, AttackReport, AttackStep};

#[cfg(test)]
mod tests;
