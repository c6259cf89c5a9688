/*
 * @Description  : Optimizer API
 *
 * - Optimizer 持有 Rc<RefCell<GraphInner>> 引用，只更新绑定的参数
 * - minimize(&mut self, loss: &Var) 一步完成 zero_grad → backward → step
 */

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::nn::graph::GraphInner;
use crate::nn::{Graph, GraphError, NodeId, Var};
use crate::tensor::Tensor;

/// Optimizer trait
///
/// ```ignore
/// let mut optimizer = Adam::new(&graph, &model.parameters(), 1e-4);
/// let loss_val = optimizer.minimize(&loss)?;
/// ```
pub trait Optimizer {
    /// 清零绑定参数的梯度
    fn zero_grad(&mut self) -> Result<(), GraphError>;

    /// 用已算好的梯度更新参数；没有梯度的参数（如冻结时）保持不变
    fn step(&mut self) -> Result<(), GraphError>;

    /// `zero_grad` → backward(ensure-forward) → step，返回损失值。
    /// zero_grad 必须在前，因为 backward 会累加参数梯度
    fn minimize(&mut self, loss: &Var) -> Result<f32, GraphError> {
        self.zero_grad()?;
        let loss_val = loss.backward()?;
        self.step()?;
        Ok(loss_val)
    }

    /// 重置累积状态（如 Adam 的矩估计）
    fn reset(&mut self);
}

/// Adam 超参数，默认值同 TF `AdamOptimizer`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// Adam 优化器
///
/// - m = β1 * m + (1 - β1) * g
/// - v = β2 * v + (1 - β2) * g²
/// - θ = θ - α * `m_hat` / (√`v_hat` + ε)
pub struct Adam {
    graph: Rc<RefCell<GraphInner>>,
    params: Vec<Var>,
    lr: f32,
    config: AdamConfig,
    /// 每个参数的（一阶矩, 二阶矩）估计
    moments: HashMap<NodeId, (Tensor, Tensor)>,
    t: usize,
}

impl Adam {
    pub fn new(graph: &Graph, params: &[Var], lr: f32) -> Self {
        Self::with_config(graph, params, lr, AdamConfig::default())
    }

    pub fn with_config(graph: &Graph, params: &[Var], lr: f32, config: AdamConfig) -> Self {
        Self {
            graph: graph.inner_rc(),
            params: params.to_vec(),
            lr,
            config,
            moments: HashMap::new(),
            t: 0,
        }
    }

    /// 已执行的`step`次数
    pub const fn timestep(&self) -> usize {
        self.t
    }
}

impl Optimizer for Adam {
    fn zero_grad(&mut self) -> Result<(), GraphError> {
        let mut g = self.graph.borrow_mut();
        for param in &self.params {
            g.clear_node_grad(param.node_id())?;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<(), GraphError> {
        self.t += 1;
        let AdamConfig {
            beta1,
            beta2,
            epsilon,
        } = self.config;
        let bias_correction1 = 1.0 - beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - beta2.powi(self.t as i32);
        let mut g = self.graph.borrow_mut();

        for param in &self.params {
            let node_id = param.node_id();
            // 冻结或未参与本次反向传播的参数没有梯度
            let Some(grad) = g.get_node_grad(node_id)?.cloned() else {
                continue;
            };
            let current = g.get_node_value(node_id)?.cloned().ok_or_else(|| {
                GraphError::ComputationError(format!("参数节点 {node_id:?} 没有值"))
            })?;

            let (m, v) = self
                .moments
                .entry(node_id)
                .or_insert_with(|| (Tensor::zeros(grad.shape()), Tensor::zeros(grad.shape())));
            *m *= beta1;
            *m += &(&grad * (1.0 - beta1));
            *v *= beta2;
            *v += &(&(&grad * &grad) * (1.0 - beta2));

            let m_hat = &*m / bias_correction1;
            let denom = (&*v / bias_correction2).map(f32::sqrt) + epsilon;
            let new_value = current - self.lr * &(&m_hat / &denom);
            g.set_node_value(node_id, Some(&new_value))?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.moments.clear();
        self.t = 0;
    }
}
