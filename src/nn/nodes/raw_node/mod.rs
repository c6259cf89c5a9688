mod input;
mod loss;
mod ops;
mod parameter;

pub(crate) use input::{Input, InputVariant};
pub(crate) use loss::*;
pub(crate) use ops::*;
pub(crate) use parameter::Parameter;

use super::NodeHandle;
use crate::nn::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub(crate) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Add(Add),
    MatMul(MatMul),
    Conv2d(Conv2d),
    ChannelBiasAdd(ChannelBiasAdd),
    MaxPool2d(MaxPool2d),
    LeakyReLU(LeakyReLU),
    Reshape(Reshape),
    Dropout(Dropout),
    SoftmaxCrossEntropy(SoftmaxCrossEntropy),
}

#[enum_dispatch(NodeType)]
pub(crate) trait TraitNode {
    fn type_name(&self) -> &'static str;

    /// 节点值的预期形状（建图时即确定，batch 固定）
    fn value_expected_shape(&self) -> &[usize];

    // 根据父节点的值计算本节点的值（调用时所有父节点的值都已算好，顺序与建图时传入的父节点一致）
    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError>;

    fn value(&self) -> Option<&Tensor>;

    fn set_value(&mut self, _value: Option<&Tensor>) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}节点的值由父节点计算得出，不能手动设置",
            self.type_name()
        )))
    }

    /// VJP：给定本节点的上游梯度，求损失对`target_parent`的梯度。
    /// `assistant_parent`为另一个父节点（若有），部分二元运算需要用到它的值
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError>;

    fn grad(&self) -> Option<&Tensor>;

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError>;
}

/// 取父节点的值，没有则报错
pub(super) fn parent_value<'a>(
    node_type: &str,
    parent: &'a NodeHandle,
) -> Result<&'a Tensor, GraphError> {
    parent.value().ok_or_else(|| {
        GraphError::ComputationError(format!("{node_type}节点的父{parent}没有值"))
    })
}
