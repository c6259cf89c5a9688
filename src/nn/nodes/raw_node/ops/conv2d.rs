/*
 * @Description  : 2D 卷积节点（PyTorch 风格，实为互相关）
 *
 * 设计决策：
 * - 单节点处理多通道
 * - Batch-First 格式：输入 [batch, C_in, H, W]，卷积核 [C_out, C_in, kH, kW]，输出 [batch, C_out, H', W']
 * - 零填充不物化，越界位置在循环中直接跳过
 * - 使用 Rayon 在 batch 维度并行加速；dK 跨样本用 reduce 累加
 *
 * 父节点：
 * - parents[0]: 输入数据
 * - parents[1]: 卷积核参数
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, parent_value};
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;
use rayon::prelude::*;

/// 一次卷积涉及的全部尺寸，建图时确定
#[derive(Debug, Clone, Copy)]
struct ConvGeometry {
    batch: usize,
    in_c: usize,
    in_h: usize,
    in_w: usize,
    out_c: usize,
    k_h: usize,
    k_w: usize,
    stride: (usize, usize),
    padding: (usize, usize),
    out_h: usize,
    out_w: usize,
}

impl ConvGeometry {
    const fn in_sample_len(&self) -> usize {
        self.in_c * self.in_h * self.in_w
    }

    const fn out_sample_len(&self) -> usize {
        self.out_c * self.out_h * self.out_w
    }

    const fn kernel_len(&self) -> usize {
        self.out_c * self.in_c * self.k_h * self.k_w
    }

    /// 输出位置(o)与核偏移(k)对应的输入坐标；落在填充区则返回None
    fn input_coord(&self, o: usize, k: usize, stride: usize, pad: usize, bound: usize) -> Option<usize> {
        (o * stride + k).checked_sub(pad).filter(|&i| i < bound)
    }
}

pub(crate) struct Conv2d {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: [NodeId; 2],
    geometry: ConvGeometry,
}

impl Conv2d {
    pub(crate) fn new(
        parents: &[&NodeHandle],
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, GraphError> {
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "Conv2d节点需要2个父节点：[输入, 卷积核]".to_string(),
            ));
        }
        let input_shape = parents[0].value_expected_shape();
        let kernel_shape = parents[1].value_expected_shape();
        if kernel_shape.len() != 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: kernel_shape.len(),
                message: format!("卷积核必须是 4D [C_out, C_in, kH, kW]，得到{kernel_shape:?}"),
            });
        }
        if input_shape.len() != 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: input_shape.len(),
                message: format!(
                    "Conv2d输入必须是 4D [batch, C_in, H, W]，得到{input_shape:?}。单样本请使用 [1, C_in, H, W]"
                ),
            });
        }
        if input_shape[1] != kernel_shape[1] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![kernel_shape[1]],
                got: vec![input_shape[1]],
                message: "输入通道数与卷积核输入通道数不匹配".to_string(),
            });
        }
        if stride.0 == 0 || stride.1 == 0 {
            return Err(GraphError::InvalidOperation(
                "卷积步长必须大于0".to_string(),
            ));
        }
        let (k_h, k_w) = (kernel_shape[2], kernel_shape[3]);
        let (padded_h, padded_w) = (input_shape[2] + 2 * padding.0, input_shape[3] + 2 * padding.1);
        if k_h > padded_h || k_w > padded_w {
            return Err(GraphError::InvalidOperation(format!(
                "卷积核{k_h}x{k_w}大于填充后的输入{padded_h}x{padded_w}"
            )));
        }
        let geometry = ConvGeometry {
            batch: input_shape[0],
            in_c: input_shape[1],
            in_h: input_shape[2],
            in_w: input_shape[3],
            out_c: kernel_shape[0],
            k_h,
            k_w,
            stride,
            padding,
            out_h: (padded_h - k_h) / stride.0 + 1,
            out_w: (padded_w - k_w) / stride.1 + 1,
        };
        Ok(Self {
            value: None,
            grad: None,
            shape: vec![geometry.batch, geometry.out_c, geometry.out_h, geometry.out_w],
            parents_ids: [parents[0].id(), parents[1].id()],
            geometry,
        })
    }

    fn convolve(&self, input: &[f32], kernel: &[f32]) -> Vec<f32> {
        let g = self.geometry;
        let mut out = vec![0.0f32; g.batch * g.out_sample_len()];
        out.par_chunks_mut(g.out_sample_len())
            .enumerate()
            .for_each(|(b, out_b)| {
                let x_b = &input[b * g.in_sample_len()..(b + 1) * g.in_sample_len()];
                for oc in 0..g.out_c {
                    let k_oc = &kernel[oc * g.in_c * g.k_h * g.k_w..];
                    for oh in 0..g.out_h {
                        for ow in 0..g.out_w {
                            let mut sum = 0.0f32;
                            for ic in 0..g.in_c {
                                for kh in 0..g.k_h {
                                    let Some(ih) = g.input_coord(oh, kh, g.stride.0, g.padding.0, g.in_h)
                                    else {
                                        continue;
                                    };
                                    let x_row = &x_b[(ic * g.in_h + ih) * g.in_w..];
                                    let k_row = &k_oc[(ic * g.k_h + kh) * g.k_w..];
                                    for kw in 0..g.k_w {
                                        if let Some(iw) =
                                            g.input_coord(ow, kw, g.stride.1, g.padding.1, g.in_w)
                                        {
                                            sum += x_row[iw] * k_row[kw];
                                        }
                                    }
                                }
                            }
                            out_b[(oc * g.out_h + oh) * g.out_w + ow] = sum;
                        }
                    }
                }
            });
        out
    }

    /// dL/dX：把每个输出位置的梯度按卷积核权重散回输入
    fn grad_to_input(&self, upstream: &[f32], kernel: &[f32]) -> Vec<f32> {
        let g = self.geometry;
        let mut grad = vec![0.0f32; g.batch * g.in_sample_len()];
        grad.par_chunks_mut(g.in_sample_len())
            .enumerate()
            .for_each(|(b, grad_b)| {
                let up_b = &upstream[b * g.out_sample_len()..(b + 1) * g.out_sample_len()];
                for oc in 0..g.out_c {
                    let k_oc = &kernel[oc * g.in_c * g.k_h * g.k_w..];
                    for oh in 0..g.out_h {
                        for ow in 0..g.out_w {
                            let up = up_b[(oc * g.out_h + oh) * g.out_w + ow];
                            if up == 0.0 {
                                continue;
                            }
                            for ic in 0..g.in_c {
                                for kh in 0..g.k_h {
                                    let Some(ih) = g.input_coord(oh, kh, g.stride.0, g.padding.0, g.in_h)
                                    else {
                                        continue;
                                    };
                                    let row_start = (ic * g.in_h + ih) * g.in_w;
                                    let k_row = &k_oc[(ic * g.k_h + kh) * g.k_w..];
                                    for kw in 0..g.k_w {
                                        if let Some(iw) =
                                            g.input_coord(ow, kw, g.stride.1, g.padding.1, g.in_w)
                                        {
                                            grad_b[row_start + iw] += up * k_row[kw];
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            });
        grad
    }

    /// dL/dK：逐样本求相关后跨 batch 累加
    fn grad_to_kernel(&self, upstream: &[f32], input: &[f32]) -> Vec<f32> {
        let g = self.geometry;
        (0..g.batch)
            .into_par_iter()
            .map(|b| {
                let mut grad_k = vec![0.0f32; g.kernel_len()];
                let x_b = &input[b * g.in_sample_len()..(b + 1) * g.in_sample_len()];
                let up_b = &upstream[b * g.out_sample_len()..(b + 1) * g.out_sample_len()];
                for oc in 0..g.out_c {
                    for oh in 0..g.out_h {
                        for ow in 0..g.out_w {
                            let up = up_b[(oc * g.out_h + oh) * g.out_w + ow];
                            if up == 0.0 {
                                continue;
                            }
                            for ic in 0..g.in_c {
                                for kh in 0..g.k_h {
                                    let Some(ih) = g.input_coord(oh, kh, g.stride.0, g.padding.0, g.in_h)
                                    else {
                                        continue;
                                    };
                                    let x_row = &x_b[(ic * g.in_h + ih) * g.in_w..];
                                    let k_start = ((oc * g.in_c + ic) * g.k_h + kh) * g.k_w;
                                    for kw in 0..g.k_w {
                                        if let Some(iw) =
                                            g.input_coord(ow, kw, g.stride.1, g.padding.1, g.in_w)
                                        {
                                            grad_k[k_start + kw] += up * x_row[iw];
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                grad_k
            })
            .reduce(
                || vec![0.0f32; g.kernel_len()],
                |mut acc, sample| {
                    acc.iter_mut().zip(sample).for_each(|(a, s)| *a += s);
                    acc
                },
            )
    }
}

impl TraitNode for Conv2d {
    fn type_name(&self) -> &'static str {
        "Conv2d"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value(self.type_name(), parents[0])?;
        let kernel = parent_value(self.type_name(), parents[1])?;
        let out = self.convolve(input.data_as_slice(), kernel.data_as_slice());
        self.value = Some(Tensor::from_vec(out, &self.shape));
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
        let assistant = assistant_parent.ok_or_else(|| {
            GraphError::ComputationError("Conv2d节点求梯度时缺少另一个父节点".to_string())
        })?;
        let assistant_value = parent_value(self.type_name(), assistant)?;
        if target_parent.id() == self.parents_ids[0] {
            let grad = self.grad_to_input(upstream_grad.data_as_slice(), assistant_value.data_as_slice());
            Ok(Tensor::from_vec(grad, target_parent.value_expected_shape()))
        } else {
            let grad = self.grad_to_kernel(upstream_grad.data_as_slice(), assistant_value.data_as_slice());
            Ok(Tensor::from_vec(grad, target_parent.value_expected_shape()))
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
