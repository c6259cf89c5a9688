/*
 * @Description  : 张量的属性、归约及按行操作。除`set_row`外均不修改自身
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::Axis;

impl Tensor {
    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断张量是否为标量
    pub fn is_scalar(&self) -> bool {
        self.shape().is_empty() || self.shape().iter().all(|x| *x == 1)
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 以行优先顺序借出底层数据
    pub fn data_as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("张量数据总以标准（行优先）布局存储")
    }

    pub fn data_as_mut_slice(&mut self) -> &mut [f32] {
        self.data
            .as_slice_mut()
            .expect("张量数据总以标准（行优先）布局存储")
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    pub fn mean(&self) -> f32 {
        if self.size() == 0 {
            0.0
        } else {
            self.sum() / self.size() as f32
        }
    }

    /// 所有元素的L2范数
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// 逐元素映射，返回新张量
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.mapv(f),
        }
    }

    /// 广播的逆操作：把本张量沿被广播过的维度求和，归约到`shape`。
    /// 两者阶数须相同，且`shape`中每一维要么与本张量相等、要么为1。
    pub fn sum_to_shape(&self, shape: &[usize]) -> Self {
        if self.shape() == shape {
            return self.clone();
        }
        assert!(
            self.dimension() == shape.len(),
            "{}",
            TensorError::IncompatibleShape {
                from: self.shape().to_vec(),
                to: shape.to_vec(),
            }
        );
        let mut data = self.data.clone();
        for (axis, (&have, &want)) in self.shape().iter().zip(shape).enumerate() {
            if have == want {
                continue;
            }
            assert!(
                want == 1,
                "{}",
                TensorError::IncompatibleShape {
                    from: self.shape().to_vec(),
                    to: shape.to_vec(),
                }
            );
            data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
        }
        Self {
            data: data.as_standard_layout().into_owned(),
        }
    }
}

// 按行（首维）操作
impl Tensor {
    /// 首维长度
    pub fn rows(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    /// 取第`i`行，返回去掉首维后的张量（如[b, 784]的第i行形状为[784]）
    pub fn row(&self, i: usize) -> Self {
        assert!(
            i < self.rows(),
            "{}",
            TensorError::IndexOutOfBounds {
                index: i,
                bound: self.rows(),
            }
        );
        Self {
            data: self.data.index_axis(Axis(0), i).to_owned(),
        }
    }

    /// 按给定行号（可重复、可乱序）挑选若干行，组成新张量
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let bound = self.rows();
        if let Some(&bad) = indices.iter().find(|&&i| i >= bound) {
            panic!(
                "{}",
                TensorError::IndexOutOfBounds {
                    index: bad,
                    bound,
                }
            );
        }
        Self {
            data: self
                .data
                .select(Axis(0), indices)
                .as_standard_layout()
                .into_owned(),
        }
    }

    /// 用`row`覆盖第`i`行，`row`的形状须为去掉首维后的形状
    pub fn set_row(&mut self, i: usize, row: &Self) {
        assert!(
            i < self.rows(),
            "{}",
            TensorError::IndexOutOfBounds {
                index: i,
                bound: self.rows(),
            }
        );
        assert!(
            row.shape() == &self.shape()[1..],
            "{}",
            TensorError::IncompatibleShape {
                from: row.shape().to_vec(),
                to: self.shape()[1..].to_vec(),
            }
        );
        self.data.index_axis_mut(Axis(0), i).assign(&row.data);
    }

    /// 每行最大值的下标（并列时取最靠前者）。仅支持2阶张量
    pub fn argmax_rows(&self) -> Vec<usize> {
        self.assert_rank(2);
        self.data
            .outer_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
                        if v > best_v { (i, v) } else { (best_i, best_v) }
                    })
                    .0
            })
            .collect()
    }

    /// 按行做数值稳定的softmax。仅支持2阶张量
    pub fn softmax_rows(&self) -> Self {
        self.assert_rank(2);
        let mut out = self.data.clone();
        for mut row in out.outer_iter_mut() {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        Self { data: out }
    }

    /// 每行的L2范数。仅支持2阶张量
    pub fn row_norms(&self) -> Vec<f32> {
        self.assert_rank(2);
        self.data
            .outer_iter()
            .map(|row| row.iter().map(|x| x * x).sum::<f32>().sqrt())
            .collect()
    }

    pub(crate) fn assert_rank(&self, expected: usize) {
        assert!(
            self.dimension() == expected,
            "{}",
            TensorError::RankMismatch {
                expected,
                got: self.dimension(),
            }
        );
    }
}
