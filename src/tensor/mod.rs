/*
 * @Description  : 张量（Tensor）：基于 ndarray 的稠密 f32 多维数组。
 *                 是计算图中所有节点值、梯度以及数据集样本的统一载体。
 */

use ndarray::{Array, IxDyn};
use rand::Rng;
use rand::rngs::StdRng;

use crate::errors::{ComparisonOperator, TensorError};

mod ops {
    pub mod add;
    pub mod assign;
    pub mod div;
    pub mod mat_mul;
    pub mod mul;
    pub mod sub;
}

mod image;
mod index;
mod print;
mod property;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、f32等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量，`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    /// 若为标量，`shape`可以是[]、[1]、[1,1]...
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert!(
            data.len() == expected,
            "{}",
            TensorError::DataLengthMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        Self {
            data: Array::from_shape_vec(IxDyn(shape), data.to_vec())
                .unwrap_or_else(|_| unreachable!("长度已校验")),
        }
    }

    /// 同`new`，但直接接管`Vec`的所有权，避免一次拷贝
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert!(
            data.len() == expected,
            "{}",
            TensorError::DataLengthMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        Self {
            data: Array::from_shape_vec(IxDyn(shape), data)
                .unwrap_or_else(|_| unreachable!("长度已校验")),
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 所有元素均为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// 用给定的随机数生成器创建服从正态分布N(mean, std_dev²)的张量（Box-Muller变换）
    pub fn normal_with_rng(mean: f32, std_dev: f32, shape: &[usize], rng: &mut StdRng) -> Self {
        let len = shape.iter().product::<usize>();
        let data = (0..len)
            .map(|_| mean + std_dev * standard_normal(rng))
            .collect::<Vec<_>>();
        Self::from_vec(data, shape)
    }

    /// 截断正态分布：落在 mean ± 2·std_dev 之外的样本会被重新采样。
    /// `std_dev`须大于0，否则panic。
    pub fn truncated_normal_with_rng(
        mean: f32,
        std_dev: f32,
        shape: &[usize],
        rng: &mut StdRng,
    ) -> Self {
        assert!(
            std_dev > 0.0,
            "{}",
            TensorError::ValueMustSatisfyComparison {
                value_name: "std_dev".to_string(),
                operator: ComparisonOperator::GreaterThan,
                threshold: 0,
            }
        );
        let len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            let z = standard_normal(rng);
            if z.abs() <= 2.0 {
                data.push(mean + std_dev * z);
            }
        }
        Self::from_vec(data, shape)
    }

    /// 构造一批one-hot行向量：共`rows`行，每行在`class`处为1
    pub fn one_hot_rows(class: usize, num_classes: usize, rows: usize) -> Self {
        assert!(
            class < num_classes,
            "{}",
            TensorError::ValueMustSatisfyComparison {
                value_name: "class".to_string(),
                operator: ComparisonOperator::LessThan,
                threshold: num_classes,
            }
        );
        let mut t = Self::zeros(&[rows, num_classes]);
        for r in 0..rows {
            t[[r, class]] = 1.0;
        }
        t
    }
}

fn standard_normal(rng: &mut StdRng) -> f32 {
    loop {
        let u1: f32 = rng.r#gen();
        let u2: f32 = rng.r#gen();
        if u1 <= f32::MIN_POSITIVE {
            continue;
        }
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        if z.is_finite() {
            return z;
        }
    }
}
