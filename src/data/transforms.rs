//! 数据变换函数
//!
//! 提供常用的数据预处理操作，如归一化、one-hot 编码、补齐批次等。

use crate::tensor::Tensor;

/// 将 0-255 像素值归一化到 0-1
pub fn normalize_pixels(tensor: &Tensor) -> Tensor {
    tensor / 255.0
}

/// 将类别索引转换为 one-hot 编码，返回 [N, num_classes]；超出范围的索引得到全零行
///
/// ```ignore
/// let one_hot = one_hot(&[0, 2, 1], 3);
/// // 结果: [[1,0,0], [0,0,1], [0,1,0]]
/// ```
pub fn one_hot(labels: &[usize], num_classes: usize) -> Tensor {
    let n = labels.len();
    let mut data = vec![0.0; n * num_classes];
    for (i, &class_idx) in labels.iter().enumerate() {
        if class_idx < num_classes {
            data[i * num_classes + class_idx] = 1.0;
        }
    }
    Tensor::from_vec(data, &[n, num_classes])
}

/// 用零行把`[k, ...]`补齐到`[rows, ...]`（k <= rows），返回补齐后的张量与有效行数。
/// 用于把最后一个不完整的批次喂给固定 batch 的计算图
pub fn pad_rows(tensor: &Tensor, rows: usize) -> (Tensor, usize) {
    let valid = tensor.shape()[0];
    assert!(valid <= rows, "待补齐的行数{valid}超过目标行数{rows}");
    if valid == rows {
        return (tensor.clone(), valid);
    }
    let mut shape = tensor.shape().to_vec();
    shape[0] = rows;
    let mut data = tensor.to_vec();
    data.resize(shape.iter().product(), 0.0);
    (Tensor::from_vec(data, &shape), valid)
}
