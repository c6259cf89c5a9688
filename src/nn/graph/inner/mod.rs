/*
 * @Description  : GraphInner 计算图的底层实现
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 基础操作 + forward
 * - backward.rs: VJP 反向传播
 * - mode.rs: 参数冻结
 * - node_builders.rs: new_*_node
 * - serialization.rs: save_params/load_params 参数序列化
 */

mod backward;
mod core;
mod mode;
mod node_builders;
mod serialization;

pub use serialization::ParamSpec;

use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// 图的完整定义（核心实现）
///
/// 用户通常通过 `Graph` 句柄使用此结构。
pub struct GraphInner {
    pub(in crate::nn::graph) name: String,
    pub(in crate::nn::graph) nodes: HashMap<NodeId, NodeHandle>,
    /// 正向边：parent_id -> child_ids
    pub(in crate::nn::graph) forward_edges: HashMap<NodeId, Vec<NodeId>>,
    /// 反向边：child_id -> parent_ids（顺序即建图时父节点的顺序）
    pub(in crate::nn::graph) backward_edges: HashMap<NodeId, Vec<NodeId>>,
    pub(in crate::nn::graph) last_forward_pass_id: u64,
    pub(in crate::nn::graph) last_backward_pass_id: u64,
    pub(in crate::nn::graph) next_id: u64,
    /// 冻结后反向传播不再为参数计算梯度（参数只读）
    pub(in crate::nn::graph) params_frozen: bool,
    /// 图级别的随机数生成器（参数初始化、dropout 掩码的种子都从这里派生）
    pub(in crate::nn::graph) rng: StdRng,
}

impl Default for GraphInner {
    fn default() -> Self {
        Self::new()
    }
}
