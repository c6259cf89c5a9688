mod graph_basic;
mod node_dropout;

use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

/// 中心差分求 loss 对 x 的数值梯度（x 的值在结束时复原）
pub(super) fn numerical_grad(loss: &Var, x: &Var, eps: f32) -> Result<Tensor, GraphError> {
    let origin = x.value()?.ok_or_else(|| {
        GraphError::ComputationError("数值梯度需要 x 先有值".to_string())
    })?;
    let mut grad = Tensor::zeros(origin.shape());
    for i in 0..origin.size() {
        let mut plus = origin.clone();
        plus.data_as_mut_slice()[i] += eps;
        x.set_value(&plus)?;
        loss.forward()?;
        let loss_plus = loss.item()?;

        let mut minus = origin.clone();
        minus.data_as_mut_slice()[i] -= eps;
        x.set_value(&minus)?;
        loss.forward()?;
        let loss_minus = loss.item()?;

        grad.data_as_mut_slice()[i] = (loss_plus - loss_minus) / (2.0 * eps);
    }
    x.set_value(&origin)?;
    loss.forward()?;
    Ok(grad)
}
