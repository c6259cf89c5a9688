/*
 * @Description  : MaxPool2d (2D 最大池化) 层，无可学习参数
 *
 * - 输入格式：[batch_size, channels, H, W]
 * - 输出格式：[batch_size, channels, H', W']
 *
 * 输出尺寸：floor 模式 H' = (H - kernel_h) / stride_h + 1；
 * ceil 模式 H' = ceil(H / stride_h)，越界的窗口只在有效区域内取最大值（相当于 SAME 填充）
 */

use crate::nn::{GraphError, Var};

#[derive(Debug, Clone, Copy)]
pub struct MaxPool2d {
    kernel_size: (usize, usize),
    stride: Option<(usize, usize)>,
    ceil_mode: bool,
}

impl MaxPool2d {
    /// `stride`为 None 时等于`kernel_size`
    pub const fn new(
        kernel_size: (usize, usize),
        stride: Option<(usize, usize)>,
        ceil_mode: bool,
    ) -> Self {
        Self {
            kernel_size,
            stride,
            ceil_mode,
        }
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let id = x.graph().borrow_mut().new_max_pool2d_node(
            x.node_id(),
            self.kernel_size,
            self.stride,
            self.ceil_mode,
            None,
        )?;
        Ok(x.derive(id))
    }
}
