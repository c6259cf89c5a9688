/*
 * @Description  : 张量的复合赋值运算（+=、-=、*=）。
 *                 右操作数为张量时，其形状须能广播到左操作数的形状，且结果形状不变。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::{AddAssign, MulAssign, SubAssign};

impl AddAssign<f32> for Tensor {
    fn add_assign(&mut self, scalar: f32) {
        self.data.mapv_inplace(|x| x + scalar);
    }
}
impl AddAssign<&Tensor> for Tensor {
    fn add_assign(&mut self, other: &Tensor) {
        assert_assignable(self, other, Operator::AddAssign);
        self.data += &other.data;
    }
}
impl AddAssign<Tensor> for Tensor {
    fn add_assign(&mut self, other: Tensor) {
        *self += &other;
    }
}

impl SubAssign<f32> for Tensor {
    fn sub_assign(&mut self, scalar: f32) {
        self.data.mapv_inplace(|x| x - scalar);
    }
}
impl SubAssign<&Tensor> for Tensor {
    fn sub_assign(&mut self, other: &Tensor) {
        assert_assignable(self, other, Operator::SubAssign);
        self.data -= &other.data;
    }
}
impl SubAssign<Tensor> for Tensor {
    fn sub_assign(&mut self, other: Tensor) {
        *self -= &other;
    }
}

impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, scalar: f32) {
        self.data.mapv_inplace(|x| x * scalar);
    }
}
impl MulAssign<&Tensor> for Tensor {
    fn mul_assign(&mut self, other: &Tensor) {
        assert_assignable(self, other, Operator::MulAssign);
        self.data *= &other.data;
    }
}

fn assert_assignable(target: &Tensor, other: &Tensor, operator: Operator) {
    let fits = other.dimension() <= target.dimension()
        && other
            .shape()
            .iter()
            .rev()
            .zip(target.shape().iter().rev())
            .all(|(&o, &t)| o == t || o == 1);
    assert!(
        fits,
        "{}",
        TensorError::OperatorError {
            operator,
            tensor1_shape: target.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        }
    );
}
