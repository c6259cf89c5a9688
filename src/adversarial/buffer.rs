/*
 * @Description  : 对抗样本的可变输入缓冲区，形状恒为 [batch_size, 784]
 */

use super::error::AdversarialError;
use crate::data::datasets::IMAGE_SIZE;
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct InputBuffer {
    value: Tensor,
}

impl InputBuffer {
    /// 全零缓冲区
    pub fn new(batch_size: usize) -> Self {
        Self {
            value: Tensor::zeros(&[batch_size, IMAGE_SIZE]),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.value.shape()[0]
    }

    /// 覆盖缓冲区内容；形状不符时报错且内容不变
    pub fn assign(&mut self, images: &Tensor) -> Result<(), AdversarialError> {
        if images.shape() != self.value.shape() {
            return Err(AdversarialError::ShapeMismatch {
                expected: self.value.shape().to_vec(),
                got: images.shape().to_vec(),
            });
        }
        self.value = images.clone();
        Ok(())
    }

    pub const fn value(&self) -> &Tensor {
        &self.value
    }

    /// 读出当前内容的副本
    pub fn read(&self) -> Tensor {
        self.value.clone()
    }

    pub fn into_inner(self) -> Tensor {
        self.value
    }
}
