/*
 * @Description  : 矩阵乘法节点 C = A · B，A 为 [m, k]，B 为 [k, n]。
 *                 dL/dA = G · Bᵀ，dL/dB = Aᵀ · G
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

pub(crate) struct MatMul {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: [NodeId; 2],
}

impl MatMul {
    pub(crate) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "MatMul节点需要2个父节点".to_string(),
            ));
        }
        let a = parents[0].value_expected_shape();
        let b = parents[1].value_expected_shape();
        if a.len() != 2 || b.len() != 2 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: if a.len() == 2 { b.len() } else { a.len() },
                message: "MatMul节点只支持2阶张量".to_string(),
            });
        }
        if a[1] != b[0] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![a[1], b[1]],
                got: b.to_vec(),
                message: format!("前一个矩阵{a:?}的列数必须等于后一个矩阵的行数"),
            });
        }
        Ok(Self {
            value: None,
            grad: None,
            shape: vec![a[0], b[1]],
            parents_ids: [parents[0].id(), parents[1].id()],
        })
    }
}

impl TraitNode for MatMul {
    fn type_name(&self) -> &'static str {
        "MatMul"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let a = parent_value(self.type_name(), parents[0])?;
        let b = parent_value(self.type_name(), parents[1])?;
        self.value = Some(a.mat_mul(b));
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let other = assistant_parent.unwrap_or(target_parent);
        let other_value = parent_value(self.type_name(), other)?;
        if target_parent.id() == self.parents_ids[0] {
            Ok(upstream_grad.mat_mul(&other_value.transpose()))
        } else {
            Ok(other_value.transpose().mat_mul(upstream_grad))
        }
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
