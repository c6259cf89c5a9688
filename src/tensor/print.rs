use crate::tensor::Tensor;
use approx::AbsDiffEq;
use std::fmt;

/// 标量直接输出数值；一、二阶张量逐行输出（保留 4 位小数）；更高阶只输出形状
impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self.shape();
        if let Some(number) = self.number() {
            return write!(f, "{number:.4}");
        }
        let cols = match shape {
            [n] => *n,
            [_, n] => *n,
            _ => return write!(f, "<张量，形状 {shape:?}>"),
        };
        let rows: Vec<String> = self
            .data_as_slice()
            .chunks(cols.max(1))
            .map(|row| {
                let cells: Vec<String> = row.iter().map(|x| format!("{x:.4}")).collect();
                format!("[{}]", cells.join(", "))
            })
            .collect();
        if shape.len() == 1 {
            write!(f, "{}", rows.join(""))
        } else {
            write!(f, "[{}]", rows.join(",\n "))
        }
    }
}

// 供单元测试中的`assert_abs_diff_eq!`使用：形状必须严格一致，且逐元素误差不超过epsilon
impl AbsDiffEq for Tensor {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.is_same_shape(other)
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}
