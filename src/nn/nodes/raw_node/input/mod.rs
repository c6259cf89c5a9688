/*
 * @Description  : Input 节点：所有"接收外部数据"的叶子节点。
 *
 * 通过 InputVariant 区分用途：
 * - Data: 普通数据（如训练图像、dropout 的保留概率），不接收梯度
 * - Target: 损失的目标值（标签），不接收梯度
 * - Differentiable: 值由外部赋入、但反向传播时需要对其求梯度（如对抗样本的图像输入）
 */

use super::TraitNode;
use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputVariant {
    Data,
    Target,
    Differentiable,
}

pub(crate) struct Input {
    variant: InputVariant,
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

impl Input {
    pub(crate) fn new(shape: &[usize], variant: InputVariant) -> Result<Self, GraphError> {
        if shape.is_empty() || shape.contains(&0) {
            return Err(GraphError::InvalidOperation(format!(
                "输入节点的形状必须非空且每一维大于0，得到{shape:?}"
            )));
        }
        Ok(Self {
            variant,
            value: None,
            grad: None,
            shape: shape.to_vec(),
        })
    }

    pub(crate) const fn variant(&self) -> InputVariant {
        self.variant
    }
}

impl TraitNode for Input {
    fn type_name(&self) -> &'static str {
        match self.variant {
            InputVariant::Data => "Input",
            InputVariant::Target => "Target",
            InputVariant::Differentiable => "DifferentiableInput",
        }
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, _parents: &[&NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}节点的值应通过 set_value 设置",
            self.type_name()
        )))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        if let Some(v) = value {
            if v.shape() != self.shape.as_slice() {
                return Err(GraphError::ShapeMismatch {
                    expected: self.shape.clone(),
                    got: v.shape().to_vec(),
                    message: format!("{}节点的形状在建图时已固定", self.type_name()),
                });
            }
        }
        self.value = value.cloned();
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}节点没有父节点",
            self.type_name()
        )))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        match (self.variant, grad) {
            (InputVariant::Data | InputVariant::Target, Some(_)) => {
                Err(GraphError::InvalidOperation(format!(
                    "{}节点不接收梯度",
                    self.type_name()
                )))
            }
            _ => {
                self.grad = grad.cloned();
                Ok(())
            }
        }
    }
}
