/*
 * @Description  : Var 扩展 trait 模块
 *
 * 按功能领域组织 Var 的扩展方法，用户按需 import。
 *
 * # 模块结构
 * - `activation`: 激活函数（relu, leaky_relu）
 * - `loss`: 损失函数（cross_entropy）
 * - `matrix`: 矩阵运算（matmul, add_bias, add_channel_bias）
 * - `regularization`: 正则化（dropout）
 * - `shape`: 形状变换（reshape, flatten）
 */

mod activation;
mod loss;
mod matrix;
mod regularization;
mod shape;

pub use activation::VarActivationOps;
pub use loss::VarLossOps;
pub use matrix::VarMatrixOps;
pub use regularization::VarRegularizationOps;
pub use shape::VarShapeOps;
