/*
 * @Description  : Dropout 节点（inverted dropout）。
 *
 * 保留概率 keep_prob 不是建图常量，而是第二个父节点（形状 [1, 1] 的输入节点）的值，
 * 每次前向传播时读取：训练时喂 0.5，评估/生成对抗样本时喂 1.0（此时本节点为恒等映射）。
 * 被保留的元素放大 1/keep_prob，使期望不变；掩码缓存到反向传播使用。
 *
 * 父节点：
 * - parents[0]: 输入
 * - parents[1]: keep_prob
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;
use rand::Rng;
use rand::rngs::StdRng;

pub(crate) struct Dropout {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: [NodeId; 2],
    rng: StdRng,
    /// 上次前向传播的掩码（已含 1/keep_prob 缩放）；keep_prob 为 1 时为 None
    mask: Option<Tensor>,
}

impl Dropout {
    pub(crate) fn new(parents: &[&NodeHandle], rng: StdRng) -> Result<Self, GraphError> {
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "Dropout节点需要2个父节点：[输入, keep_prob]".to_string(),
            ));
        }
        let keep_prob_shape = parents[1].value_expected_shape();
        if keep_prob_shape.iter().product::<usize>() != 1 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![1, 1],
                got: keep_prob_shape.to_vec(),
                message: "keep_prob必须是标量".to_string(),
            });
        }
        Ok(Self {
            value: None,
            grad: None,
            shape: parents[0].value_expected_shape().to_vec(),
            parents_ids: [parents[0].id(), parents[1].id()],
            rng,
            mask: None,
        })
    }
}

impl TraitNode for Dropout {
    fn type_name(&self) -> &'static str {
        "Dropout"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let x = parent_value(self.type_name(), parents[0])?;
        let keep_prob = parent_value(self.type_name(), parents[1])?
            .number()
            .unwrap_or(f32::NAN);
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(GraphError::InvalidOperation(format!(
                "keep_prob须在(0, 1]内，得到{keep_prob}"
            )));
        }
        if keep_prob == 1.0 {
            self.mask = None;
            self.value = Some(x.clone());
            return Ok(());
        }
        let scale = 1.0 / keep_prob;
        let mask_data = (0..x.size())
            .map(|_| {
                if self.rng.r#gen::<f32>() < keep_prob {
                    scale
                } else {
                    0.0
                }
            })
            .collect::<Vec<_>>();
        let mask = Tensor::from_vec(mask_data, x.shape());
        self.value = Some(x * &mask);
        self.mask = Some(mask);
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
        if target_parent.id() != self.parents_ids[0] {
            return Err(GraphError::InvalidOperation(
                "Dropout节点不对keep_prob求梯度".to_string(),
            ));
        }
        Ok(match &self.mask {
            Some(mask) => upstream_grad * mask,
            None => upstream_grad.clone(),
        })
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
