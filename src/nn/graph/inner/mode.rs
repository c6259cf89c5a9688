/*
 * @Description  : GraphInner 参数冻结：冻结后参数只读，反向传播只为 Differentiable 输入求梯度
 */

use super::super::error::GraphError;
use super::GraphInner;

impl GraphInner {
    /// 冻结所有参数，并清除它们已有的梯度
    pub fn freeze_params(&mut self) -> Result<(), GraphError> {
        self.params_frozen = true;
        self.zero_grad()
    }

    pub const fn unfreeze_params(&mut self) {
        self.params_frozen = false;
    }

    pub const fn is_params_frozen(&self) -> bool {
        self.params_frozen
    }
}
