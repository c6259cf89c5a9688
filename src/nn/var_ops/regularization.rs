/*
 * @Description  : Var 正则化扩展 trait
 */

use crate::nn::{GraphError, Var};

pub trait VarRegularizationOps {
    /// Dropout：以`keep_prob`的概率保留每个元素，并按 1/keep_prob 放大（inverted dropout）。
    ///
    /// `keep_prob`是一个`[1, 1]`的数据输入节点，每次前向传播前由调用方设置：
    /// 训练时通常为 0.5，评估和生成对抗样本时为 1.0（此时 dropout 为恒等映射）。
    fn dropout(&self, keep_prob: &Var) -> Result<Var, GraphError>;
}

impl VarRegularizationOps for Var {
    fn dropout(&self, keep_prob: &Var) -> Result<Var, GraphError> {
        self.check_same_graph(keep_prob)?;
        let id =
            self.graph()
                .borrow_mut()
                .new_dropout_node(self.node_id(), keep_prob.node_id(), None)?;
        Ok(self.derive(id))
    }
}
