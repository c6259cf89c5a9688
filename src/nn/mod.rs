/*
 * @Description  : 负责神经网络（neural network）的构建：计算图、节点、层与优化器
 */

mod graph;
pub mod layer;
mod module;
mod nodes;
pub mod optimizer;
mod var;
mod var_ops;

pub use graph::{Graph, GraphError, GraphInner, ParamSpec};
pub use layer::{Conv2d, Linear, MaxPool2d};
pub use module::Module;
pub use nodes::NodeId;
pub use optimizer::{Adam, AdamConfig, Optimizer};
pub use var::{Init, Var};
pub use var_ops::{
    VarActivationOps, VarLossOps, VarMatrixOps, VarRegularizationOps, VarShapeOps,
};

#[cfg(test)]
mod tests;
