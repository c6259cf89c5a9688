/*
 * @Description  : Var 损失函数扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 损失函数扩展 trait
pub trait VarLossOps {
    /// Softmax 交叉熵（批内取平均）
    ///
    /// # 参数
    /// - `target`: one-hot 标签，形状与 logits 相同
    ///
    /// # 返回
    /// `[1, 1]` 的标量损失节点
    fn cross_entropy(&self, target: &Var) -> Result<Var, GraphError>;
}

impl VarLossOps for Var {
    fn cross_entropy(&self, target: &Var) -> Result<Var, GraphError> {
        self.check_same_graph(target)?;
        let id = self.graph().borrow_mut().new_softmax_cross_entropy_node(
            self.node_id(),
            target.node_id(),
            None,
        )?;
        Ok(self.derive(id))
    }
}
