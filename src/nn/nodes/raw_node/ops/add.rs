/*
 * @Description  : 加法节点，支持 NumPy 风格的广播（如 [batch, n] + [1, n] 的偏置相加）。
 *                 反向传播时把上游梯度沿被广播的维度求和，还原到父节点的形状。
 */

use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::tensor::Tensor;

pub(crate) struct Add {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

impl Add {
    pub(crate) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "Add节点需要2个父节点".to_string(),
            ));
        }
        let a = parents[0].value_expected_shape();
        let b = parents[1].value_expected_shape();
        if a.len() != b.len() {
            return Err(GraphError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
                message: "Add节点的两个父节点阶数必须一致".to_string(),
            });
        }
        let mut shape = Vec::with_capacity(a.len());
        for (&da, &db) in a.iter().zip(b) {
            match (da, db) {
                _ if da == db => shape.push(da),
                (1, _) => shape.push(db),
                (_, 1) => shape.push(da),
                _ => {
                    return Err(GraphError::ShapeMismatch {
                        expected: a.to_vec(),
                        got: b.to_vec(),
                        message: "Add节点的两个父节点形状无法广播".to_string(),
                    });
                }
            }
        }
        Ok(Self {
            value: None,
            grad: None,
            shape,
        })
    }
}

impl TraitNode for Add {
    fn type_name(&self) -> &'static str {
        "Add"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let a = parent_value(self.type_name(), parents[0])?;
        let b = parent_value(self.type_name(), parents[1])?;
        self.value = Some(a + b);
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
        Ok(upstream_grad.sum_to_shape(target_parent.value_expected_shape()))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
