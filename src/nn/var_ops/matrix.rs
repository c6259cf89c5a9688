/*
 * @Description  : Var 矩阵运算扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 矩阵运算扩展 trait
pub trait VarMatrixOps {
    /// 矩阵乘法：self [m, k] × other [k, n] -> [m, n]
    fn matmul(&self, other: &Var) -> Result<Var, GraphError>;

    /// 行向量偏置：self [m, n] + bias [1, n]
    fn add_bias(&self, bias: &Var) -> Result<Var, GraphError>;

    /// 通道偏置：self [N, C, H, W] + bias [1, C]（每个通道加同一个值）
    fn add_channel_bias(&self, bias: &Var) -> Result<Var, GraphError>;
}

impl VarMatrixOps for Var {
    fn matmul(&self, other: &Var) -> Result<Var, GraphError> {
        self.check_same_graph(other)?;
        let id =
            self.graph()
                .borrow_mut()
                .new_mat_mul_node(self.node_id(), other.node_id(), None)?;
        Ok(self.derive(id))
    }

    fn add_bias(&self, bias: &Var) -> Result<Var, GraphError> {
        self.try_add(bias)
    }

    fn add_channel_bias(&self, bias: &Var) -> Result<Var, GraphError> {
        self.check_same_graph(bias)?;
        let id = self.graph().borrow_mut().new_channel_bias_add_node(
            self.node_id(),
            bias.node_id(),
            None,
        )?;
        Ok(self.derive(id))
    }
}
