/*
 * @Description  : Conv2d (2D 卷积) 层
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding_h - kernel_h) / stride_h + 1
 * W' = (W + 2*padding_w - kernel_w) / stride_w + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarMatrixOps};

/// Conv2d (2D 卷积) 层：`output = conv2d(x, K) + b`
///
/// ```ignore
/// let conv = Conv2d::new(&graph, 1, 32, (5, 5), (1, 1), (2, 2), weight_init, bias_init, "conv1")?;
/// let h = conv.forward(&x)?.relu()?;
/// ```
pub struct Conv2d {
    /// 卷积核参数 [out_channels, in_channels, kernel_h, kernel_w]
    kernel: Var,
    /// 偏置参数 [1, out_channels]
    bias: Var,
    stride: (usize, usize),
    padding: (usize, usize),
    name: String,
}

impl Conv2d {
    /// 创建新的 Conv2d 层，参数命名为`{name}_K`和`{name}_b`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        weight_init: Init,
        bias_init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let (k_h, k_w) = kernel_size;
        let kernel = graph.parameter(
            &[out_channels, in_channels, k_h, k_w],
            weight_init,
            &format!("{name}_K"),
        )?;
        let bias = graph.parameter(&[1, out_channels], bias_init, &format!("{name}_b"))?;

        Ok(Self {
            kernel,
            bias,
            stride,
            padding,
            name: name.to_string(),
        })
    }

    /// 前向传播（建图）：`conv2d(x, K) + b`
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        x.check_same_graph(&self.kernel)?;
        let conv_id = x.graph().borrow_mut().new_conv2d_node(
            x.node_id(),
            self.kernel.node_id(),
            self.stride,
            self.padding,
            Some(&format!("{}_conv", self.name)),
        )?;
        x.derive(conv_id).add_channel_bias(&self.bias)
    }

    pub fn kernel(&self) -> &Var {
        &self.kernel
    }

    pub fn bias(&self) -> &Var {
        &self.bias
    }
}

impl Module for Conv2d {
    fn parameters(&self) -> Vec<Var> {
        vec![self.kernel.clone(), self.bias.clone()]
    }
}
