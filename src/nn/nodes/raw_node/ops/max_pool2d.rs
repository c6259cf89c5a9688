/*
 * @Description  : 2D 最大池化节点
 *
 * 设计决策：
 * - 记录每个输出位置的最大值在输入中的（样本内）偏移，反向传播时只把梯度交给该位置
 * - Batch-First 格式：输入 [batch, C, H, W]，输出 [batch, C, H', W']
 * - `ceil_mode` 为 true 时，输出尺寸向上取整，末尾不完整的窗口被截断（等价于 "SAME" 填充）
 * - 使用 Rayon 在 batch 维度并行加速
 */

use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::tensor::Tensor;
use rayon::prelude::*;

pub(crate) struct MaxPool2d {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    input_shape: Vec<usize>,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    /// 与输出同形，值为对应最大值在单个样本内的展平偏移
    max_indices: Option<Vec<usize>>,
}

impl MaxPool2d {
    pub(crate) fn new(
        parents: &[&NodeHandle],
        kernel_size: (usize, usize),
        stride: Option<(usize, usize)>,
        ceil_mode: bool,
    ) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "MaxPool2d节点需要1个父节点".to_string(),
            ));
        }
        let input_shape = parents[0].value_expected_shape();
        if input_shape.len() != 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: input_shape.len(),
                message: format!("MaxPool2d输入必须是 4D [batch, C, H, W]，得到{input_shape:?}"),
            });
        }
        let stride = stride.unwrap_or(kernel_size);
        if kernel_size.0 == 0 || kernel_size.1 == 0 || stride.0 == 0 || stride.1 == 0 {
            return Err(GraphError::InvalidOperation(
                "池化窗口与步长必须大于0".to_string(),
            ));
        }
        let (in_h, in_w) = (input_shape[2], input_shape[3]);
        if kernel_size.0 > in_h || kernel_size.1 > in_w {
            return Err(GraphError::InvalidOperation(format!(
                "池化窗口{kernel_size:?}大于输入尺寸{in_h}x{in_w}"
            )));
        }
        let out_len = |input: usize, k: usize, s: usize| {
            if ceil_mode {
                (input - k).div_ceil(s) + 1
            } else {
                (input - k) / s + 1
            }
        };
        let out_h = out_len(in_h, kernel_size.0, stride.0);
        let out_w = out_len(in_w, kernel_size.1, stride.1);
        Ok(Self {
            value: None,
            grad: None,
            shape: vec![input_shape[0], input_shape[1], out_h, out_w],
            input_shape: input_shape.to_vec(),
            kernel_size,
            stride,
            max_indices: None,
        })
    }
}

impl TraitNode for MaxPool2d {
    fn type_name(&self) -> &'static str {
        "MaxPool2d"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value(self.type_name(), parents[0])?.data_as_slice();
        let (channels, in_h, in_w) = (self.input_shape[1], self.input_shape[2], self.input_shape[3]);
        let (out_h, out_w) = (self.shape[2], self.shape[3]);
        let (k_h, k_w) = self.kernel_size;
        let (s_h, s_w) = self.stride;
        let in_sample = channels * in_h * in_w;
        let out_sample = channels * out_h * out_w;

        let per_sample: Vec<(Vec<f32>, Vec<usize>)> = input
            .par_chunks(in_sample)
            .map(|x_b| {
                let mut values = vec![f32::NEG_INFINITY; out_sample];
                let mut indices = vec![0usize; out_sample];
                for c in 0..channels {
                    for oh in 0..out_h {
                        for ow in 0..out_w {
                            let o = (c * out_h + oh) * out_w + ow;
                            for ih in (oh * s_h)..(oh * s_h + k_h).min(in_h) {
                                for iw in (ow * s_w)..(ow * s_w + k_w).min(in_w) {
                                    let i = (c * in_h + ih) * in_w + iw;
                                    if x_b[i] > values[o] {
                                        values[o] = x_b[i];
                                        indices[o] = i;
                                    }
                                }
                            }
                        }
                    }
                }
                (values, indices)
            })
            .collect();

        let (values, indices): (Vec<Vec<f32>>, Vec<Vec<usize>>) = per_sample.into_iter().unzip();
        self.value = Some(Tensor::from_vec(values.concat(), &self.shape));
        self.max_indices = Some(indices.concat());
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let indices = self.max_indices.as_ref().ok_or_else(|| {
            GraphError::ComputationError("MaxPool2d缺少最大值位置缓存，请先执行前向传播".to_string())
        })?;
        let in_sample: usize = self.input_shape[1..].iter().product();
        let out_sample: usize = self.shape[1..].iter().product();
        let upstream = upstream_grad.data_as_slice();

        let mut grad = vec![0.0f32; self.input_shape[0] * in_sample];
        grad.par_chunks_mut(in_sample)
            .enumerate()
            .for_each(|(b, grad_b)| {
                let range = b * out_sample..(b + 1) * out_sample;
                for (&i, &g) in indices[range.clone()].iter().zip(&upstream[range]) {
                    grad_b[i] += g;
                }
            });
        Ok(Tensor::from_vec(grad, &self.input_shape))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
