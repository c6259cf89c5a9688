use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

/// Softmax + CrossEntropy 融合损失节点
///
/// ## 输入
/// - 父节点 0: logits [batch, num_classes]（未经 softmax 的原始分数）
/// - 父节点 1: labels [batch, num_classes]（one-hot 标签）
///
/// ## 输出
/// 标量损失 [1, 1]，为 batch 内的平均值：
/// ```text
/// L = -(1/N) Σ_n Σ_i y_ni * log(softmax(x_n)_i)
/// ```
/// 用 log-sum-exp 技巧计算以避免溢出。对 logits 的梯度为 (softmax(x) - y) / N。
pub(crate) struct SoftmaxCrossEntropy {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    /// 缓存 softmax 结果，用于反向传播
    softmax_cache: Option<Tensor>,
    parents_ids: [NodeId; 2],
}

impl SoftmaxCrossEntropy {
    pub(crate) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "SoftmaxCrossEntropy节点需要2个父节点（logits 和 labels）".to_string(),
            ));
        }
        let logits_shape = parents[0].value_expected_shape();
        let labels_shape = parents[1].value_expected_shape();
        if logits_shape.len() != 2 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: logits_shape.len(),
                message: "logits必须是 [batch, num_classes]".to_string(),
            });
        }
        if logits_shape != labels_shape {
            return Err(GraphError::ShapeMismatch {
                expected: logits_shape.to_vec(),
                got: labels_shape.to_vec(),
                message: "labels的形状必须与logits一致".to_string(),
            });
        }
        Ok(Self {
            value: None,
            grad: None,
            shape: vec![1, 1],
            softmax_cache: None,
            parents_ids: [parents[0].id(), parents[1].id()],
        })
    }
}

impl TraitNode for SoftmaxCrossEntropy {
    fn type_name(&self) -> &'static str {
        "SoftmaxCrossEntropy"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let logits = parent_value(self.type_name(), parents[0])?;
        let labels = parent_value(self.type_name(), parents[1])?;
        let classes = logits.shape()[1];
        let batch = logits.shape()[0];

        let mut total = 0.0f32;
        for (z, y) in logits
            .data_as_slice()
            .chunks(classes)
            .zip(labels.data_as_slice().chunks(classes))
        {
            let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let log_sum_exp = max + z.iter().map(|v| (v - max).exp()).sum::<f32>().ln();
            total += z
                .iter()
                .zip(y)
                .map(|(zi, yi)| yi * (log_sum_exp - zi))
                .sum::<f32>();
        }

        self.softmax_cache = Some(logits.softmax_rows());
        self.value = Some(Tensor::new(&[total / batch as f32], &[1, 1]));
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
        if target_parent.id() != self.parents_ids[0] {
            return Err(GraphError::InvalidOperation(
                "SoftmaxCrossEntropy只对logits求梯度".to_string(),
            ));
        }
        let softmax = self.softmax_cache.as_ref().ok_or_else(|| {
            GraphError::ComputationError("缺少softmax缓存，请先执行前向传播".to_string())
        })?;
        let labels_node = assistant_parent.ok_or_else(|| {
            GraphError::ComputationError("求梯度时缺少labels父节点".to_string())
        })?;
        let labels = parent_value(self.type_name(), labels_node)?;
        let batch = softmax.shape()[0] as f32;
        let scale = upstream_grad.number().unwrap_or(1.0) / batch;
        Ok((softmax - labels) * scale)
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
