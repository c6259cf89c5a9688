/*
 * @Description  : 变形节点（如把 [batch, 784] 还原为 [batch, 1, 28, 28]，或把特征图展平），元素总数不变
 */

use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::tensor::Tensor;

pub(crate) struct Reshape {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

impl Reshape {
    pub(crate) fn new(parents: &[&NodeHandle], target_shape: &[usize]) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "Reshape节点只需要1个父节点".to_string(),
            ));
        }
        let parent_shape = parents[0].value_expected_shape();
        let from: usize = parent_shape.iter().product();
        let to: usize = target_shape.iter().product();
        if from != to {
            return Err(GraphError::ShapeMismatch {
                expected: parent_shape.to_vec(),
                got: target_shape.to_vec(),
                message: format!("Reshape前后元素总数不一致：{from} != {to}"),
            });
        }
        Ok(Self {
            value: None,
            grad: None,
            shape: target_shape.to_vec(),
        })
    }
}

impl TraitNode for Reshape {
    fn type_name(&self) -> &'static str {
        "Reshape"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let x = parent_value(self.type_name(), parents[0])?;
        self.value = Some(x.reshape(&self.shape));
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Ok(upstream_grad.reshape(target_parent.value_expected_shape()))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
