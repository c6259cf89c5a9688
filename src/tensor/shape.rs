use super::Tensor;
use crate::errors::TensorError;
use ndarray::IxDyn;

impl Tensor {
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数，即`shape()`的元素个数
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为 [1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 返回变形后的新张量，元素总数必须一致，否则panic
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let new_total: usize = shape.iter().product();
        assert!(
            self.size() == new_total,
            "{}",
            TensorError::IncompatibleShape {
                from: self.shape().to_vec(),
                to: shape.to_vec(),
            }
        );
        Self::from_vec(self.to_vec(), shape)
    }

    /// 原地变形，不拷贝数据
    pub fn reshape_mut(&mut self, shape: &[usize]) {
        let new_total: usize = shape.iter().product();
        assert!(
            self.size() == new_total,
            "{}",
            TensorError::IncompatibleShape {
                from: self.shape().to_vec(),
                to: shape.to_vec(),
            }
        );
        let data = std::mem::take(&mut self.data);
        let raw = if data.is_standard_layout() {
            data.into_raw_vec()
        } else {
            data.iter().copied().collect()
        };
        self.data = ndarray::Array::from_shape_vec(IxDyn(shape), raw)
            .unwrap_or_else(|_| unreachable!("元素总数已校验"));
    }

    /// 把除首维外的所有维度展平：[b, d1, d2, ...] -> [b, d1*d2*...]
    pub fn flatten_rows(&self) -> Self {
        let rows = self.shape().first().copied().unwrap_or(1);
        let cols = if rows == 0 { 0 } else { self.size() / rows };
        self.reshape(&[rows, cols])
    }
}

impl Tensor {
    /// 按NumPy规则（右对齐，每一维相等或其一为1）判断两个张量能否广播
    pub fn is_broadcast_compatible(&self, other: &Self) -> bool {
        self.shape()
            .iter()
            .rev()
            .zip(other.shape().iter().rev())
            .all(|(&a, &b)| a == b || a == 1 || b == 1)
    }
}
