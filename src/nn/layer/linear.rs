/*
 * @Description  : Linear (全连接) 层
 *
 * 输入 [batch, in_features]，输出 [batch, out_features]
 * 计算：output = x · W + b
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarMatrixOps};

pub struct Linear {
    /// 权重 [in_features, out_features]
    weight: Var,
    /// 偏置 [1, out_features]
    bias: Var,
}

impl Linear {
    /// 创建新的 Linear 层，参数命名为`{name}_W`和`{name}_b`
    pub fn new(
        graph: &Graph,
        in_features: usize,
        out_features: usize,
        weight_init: Init,
        bias_init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let weight = graph.parameter(
            &[in_features, out_features],
            weight_init,
            &format!("{name}_W"),
        )?;
        let bias = graph.parameter(&[1, out_features], bias_init, &format!("{name}_b"))?;
        Ok(Self { weight, bias })
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        x.matmul(&self.weight)?.add_bias(&self.bias)
    }

    pub fn weight(&self) -> &Var {
        &self.weight
    }

    pub fn bias(&self) -> &Var {
        &self.bias
    }
}

impl Module for Linear {
    fn parameters(&self) -> Vec<Var> {
        vec![self.weight.clone(), self.bias.clone()]
    }
}
