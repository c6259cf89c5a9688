/*
 * @Description  : Module trait 定义
 */

use super::Var;

/// 模块 trait
///
/// - `forward()` 与 `new()` 签名各异，不放入 trait
/// - `parameters()` 签名一致，放入 trait，供优化器和参数统计使用
pub trait Module {
    fn parameters(&self) -> Vec<Var>;

    /// 参数张量的个数
    fn num_params(&self) -> usize {
        self.parameters().len()
    }

    /// 标量参数的总个数
    fn num_scalars(&self) -> usize {
        self.parameters()
            .iter()
            .filter_map(|p| p.value_expected_shape().ok())
            .map(|shape| shape.iter().product::<usize>())
            .sum()
    }
}
