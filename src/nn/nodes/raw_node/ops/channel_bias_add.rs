/*
 * @Description  : 通道偏置相加：[batch, C, H, W] 的每个通道加上偏置 [1, C] 中对应的值。
 *                 卷积层的偏置通过本节点接入；偏置梯度为上游梯度在 batch、H、W 上的和。
 *
 * 父节点：
 * - parents[0]: 特征图
 * - parents[1]: 偏置参数 [1, C]
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

pub(crate) struct ChannelBiasAdd {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: [NodeId; 2],
}

impl ChannelBiasAdd {
    pub(crate) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "ChannelBiasAdd节点需要2个父节点：[特征图, 偏置]".to_string(),
            ));
        }
        let input_shape = parents[0].value_expected_shape();
        let bias_shape = parents[1].value_expected_shape();
        if input_shape.len() != 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: input_shape.len(),
                message: "ChannelBiasAdd的输入必须是 4D [batch, C, H, W]".to_string(),
            });
        }
        if bias_shape != [1, input_shape[1]] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![1, input_shape[1]],
                got: bias_shape.to_vec(),
                message: "偏置形状须为 [1, C]".to_string(),
            });
        }
        Ok(Self {
            value: None,
            grad: None,
            shape: input_shape.to_vec(),
            parents_ids: [parents[0].id(), parents[1].id()],
        })
    }

    /// 每个通道对应的连续元素个数（H * W）
    fn plane(&self) -> usize {
        self.shape[2] * self.shape[3]
    }
}

impl TraitNode for ChannelBiasAdd {
    fn type_name(&self) -> &'static str {
        "ChannelBiasAdd"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value(self.type_name(), parents[0])?;
        let bias = parent_value(self.type_name(), parents[1])?.data_as_slice();
        let channels = self.shape[1];
        let mut out = input.clone();
        for (i, plane) in out.data_as_mut_slice().chunks_mut(self.plane()).enumerate() {
            let b = bias[i % channels];
            plane.iter_mut().for_each(|v| *v += b);
        }
        self.value = Some(out);
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
        if target_parent.id() == self.parents_ids[0] {
            return Ok(upstream_grad.clone());
        }
        let channels = self.shape[1];
        let mut grad = vec![0.0f32; channels];
        for (i, plane) in upstream_grad.data_as_slice().chunks(self.plane()).enumerate() {
            grad[i % channels] += plane.iter().sum::<f32>();
        }
        Ok(Tensor::from_vec(grad, &[1, channels]))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
