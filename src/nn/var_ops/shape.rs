/*
 * @Description  : Var 形状变换扩展 trait
 */

use crate::nn::{GraphError, Var};

pub trait VarShapeOps {
    /// Reshape 变形，元素总数必须保持一致
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError>;

    /// 展平为 `[batch, 其余元素]`，如 `[N, C, H, W]` -> `[N, C*H*W]`
    fn flatten(&self) -> Result<Var, GraphError>;
}

impl VarShapeOps for Var {
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_reshape_node(self.node_id(), shape, None)?;
        Ok(self.derive(id))
    }

    fn flatten(&self) -> Result<Var, GraphError> {
        let shape = self.value_expected_shape()?;
        let batch = shape.first().copied().unwrap_or(1);
        let rest: usize = shape.iter().skip(1).product();
        self.reshape(&[batch, rest])
    }
}
