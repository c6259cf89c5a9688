/*
 * @Description  : 优化器模块，基于梯度更新参数
 */

mod core;

pub use core::{Adam, AdamConfig, Optimizer};
