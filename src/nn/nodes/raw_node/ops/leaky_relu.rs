/*
 * @Description  : LeakyReLU 激活：x if x > 0 else slope * x。slope 为 0 时即 ReLU
 */

use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::tensor::Tensor;

pub(crate) struct LeakyReLU {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    slope: f32,
}

impl LeakyReLU {
    pub(crate) fn new(parents: &[&NodeHandle], slope: f32) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "LeakyReLU节点只需要1个父节点".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&slope) {
            return Err(GraphError::InvalidOperation(format!(
                "LeakyReLU的负半轴斜率须在[0, 1)内，得到{slope}"
            )));
        }
        Ok(Self {
            value: None,
            grad: None,
            shape: parents[0].value_expected_shape().to_vec(),
            slope,
        })
    }
}

impl TraitNode for LeakyReLU {
    fn type_name(&self) -> &'static str {
        if self.slope == 0.0 { "ReLU" } else { "LeakyReLU" }
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let x = parent_value(self.type_name(), parents[0])?;
        let slope = self.slope;
        self.value = Some(x.map(|v| if v > 0.0 { v } else { slope * v }));
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
        let x = parent_value(self.type_name(), target_parent)?;
        let slope = self.slope;
        let derivative = x.map(|v| if v > 0.0 { 1.0 } else { slope });
        Ok(upstream_grad * &derivative)
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
