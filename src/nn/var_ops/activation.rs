/*
 * @Description  : Var 激活函数扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 激活函数扩展 trait
///
/// ```ignore
/// use mnist_adv::nn::{Var, VarActivationOps};
///
/// let h = x.relu()?;
/// ```
pub trait VarActivationOps {
    /// `ReLU` 激活：max(0, x)
    fn relu(&self) -> Result<Var, GraphError>;

    /// `LeakyReLU` 激活：x if x > 0 else slope * x，`slope`须在[0, 1)内
    fn leaky_relu(&self, slope: f32) -> Result<Var, GraphError>;
}

impl VarActivationOps for Var {
    fn relu(&self) -> Result<Var, GraphError> {
        self.leaky_relu(0.0)
    }

    fn leaky_relu(&self, slope: f32) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_leaky_relu_node(self.node_id(), slope, None)?;
        Ok(self.derive(id))
    }
}
