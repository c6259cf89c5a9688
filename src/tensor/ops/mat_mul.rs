use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::Ix2;

impl Tensor {
    /// 实现矩阵乘法。只接受2阶张量，且前一个张量的列数须等于后一个张量的行数，否则panic。
    pub fn mat_mul(&self, other: &Self) -> Self {
        self.assert_rank(2);
        other.assert_rank(2);
        assert!(
            self.shape()[1] == other.shape()[0],
            "{}",
            TensorError::OperatorError {
                operator: Operator::MatMul,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        let (Ok(a), Ok(b)) = (
            self.data.view().into_dimensionality::<Ix2>(),
            other.data.view().into_dimensionality::<Ix2>(),
        ) else {
            unreachable!("阶数已校验")
        };
        Self {
            data: a.dot(&b).into_dyn(),
        }
    }

    /// 2阶张量的转置
    pub fn transpose(&self) -> Self {
        self.assert_rank(2);
        Self {
            data: self.data.t().as_standard_layout().into_owned(),
        }
    }
}
