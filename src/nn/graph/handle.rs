/*
 * @Description  : Graph 句柄（用户级 API）
 */

use super::error::GraphError;
use super::inner::{GraphInner, ParamSpec};
use crate::nn::NodeId;
use crate::nn::nodes::InputVariant;
use crate::nn::var::{Init, Var};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Graph - 计算图句柄
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    // ==================== 创建 ====================

    pub fn new() -> Self {
        Self::from_inner(GraphInner::new())
    }

    /// 创建带种子的图（用于确定性的参数初始化和 dropout）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::from_inner(GraphInner::new_with_seed(seed))
    }

    pub fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    pub fn inner_mut(&self) -> std::cell::RefMut<'_, GraphInner> {
        self.inner.borrow_mut()
    }

    pub(crate) fn inner_rc(&self) -> Rc<RefCell<GraphInner>> {
        Rc::clone(&self.inner)
    }

    /// 将 NodeId 包装成 Var
    pub fn wrap_node_id(&self, node_id: NodeId) -> Var {
        Var::new(node_id, Rc::clone(&self.inner))
    }

    // ==================== 创建变量 ====================

    fn input_of(
        &self,
        shape: &[usize],
        variant: InputVariant,
        name: Option<&str>,
    ) -> Result<Var, GraphError> {
        let node_id = self
            .inner
            .borrow_mut()
            .new_input_node(shape, variant, name)?;
        Ok(self.wrap_node_id(node_id))
    }

    /// 数据输入：值由外部每次喂入，不接收梯度
    pub fn input(&self, shape: &[usize], name: Option<&str>) -> Result<Var, GraphError> {
        self.input_of(shape, InputVariant::Data, name)
    }

    /// 标签输入：同数据输入，语义上表示监督目标
    pub fn target(&self, shape: &[usize], name: Option<&str>) -> Result<Var, GraphError> {
        self.input_of(shape, InputVariant::Target, name)
    }

    /// 可微输入：反向传播时会计算损失对它的梯度（如对抗样本的图像缓冲区）
    pub fn differentiable_input(
        &self,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<Var, GraphError> {
        self.input_of(shape, InputVariant::Differentiable, name)
    }

    /// 创建参数节点，初始值取自图的 rng
    pub fn parameter(&self, shape: &[usize], init: Init, name: &str) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let init_data = init.generate_with_rng(shape, g.rng_mut());
        let node_id = g.new_parameter_node(shape, &init_data, Some(name))?;
        Ok(Var::new(node_id, Rc::clone(&self.inner)))
    }

    // ==================== 执行 ====================

    pub fn forward(&self, output: &Var) -> Result<(), GraphError> {
        self.inner.borrow_mut().forward(output.node_id())
    }

    pub fn backward(&self, loss: &Var) -> Result<f32, GraphError> {
        loss.backward()
    }

    /// 清零所有参数的梯度
    pub fn zero_grad(&self) -> Result<(), GraphError> {
        self.inner.borrow_mut().zero_grad()
    }

    pub fn freeze_params(&self) -> Result<(), GraphError> {
        self.inner.borrow_mut().freeze_params()
    }

    pub fn unfreeze_params(&self) {
        self.inner.borrow_mut().unfreeze_params();
    }

    pub fn is_params_frozen(&self) -> bool {
        self.inner.borrow().is_params_frozen()
    }

    /// 所有参数节点（按创建顺序）
    pub fn parameters(&self) -> Vec<Var> {
        let ids = self.inner.borrow().get_trainable_nodes();
        ids.into_iter().map(|id| self.wrap_node_id(id)).collect()
    }

    // ==================== 参数保存/加载 ====================

    pub fn param_specs(&self) -> Vec<ParamSpec> {
        self.inner.borrow().param_specs()
    }

    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        self.inner.borrow().save_params(path)
    }

    pub fn load_params<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        self.inner.borrow_mut().load_params(path)
    }
}
