/*
 * @Description  : GraphInner VJP 反向传播
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::{InputVariant, NodeType};
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

impl GraphInner {
    // ========== VJP 反向传播核心 ==========

    /// 从标量损失节点反向传播，返回损失值。
    ///
    /// - 参数节点的梯度会累加（直到 `zero_grad`），冻结时不计算
    /// - Differentiable 输入节点的梯度每次反向传播都重新计算
    /// - Data/Target 输入节点不接收梯度
    pub fn backward(&mut self, loss_id: NodeId) -> Result<f32, GraphError> {
        let loss_node = self.get_node(loss_id)?;
        let loss_value = loss_node.value().ok_or_else(|| {
            GraphError::ComputationError(format!("损失{loss_node}没有值，请先执行 forward"))
        })?;
        if loss_value.size() != 1 {
            return Err(GraphError::InvalidOperation(format!(
                "反向传播要求损失为标量 [1, 1]，但得到 {:?}",
                loss_value.shape()
            )));
        }
        let loss_scalar = loss_value.data_as_slice()[0];

        self.reset_intermediate_grad()?;
        self.get_node_mut(loss_id)?
            .set_grad(Some(&Tensor::ones(&[1, 1])))?;

        let needs_grad = self.nodes_needing_grad(loss_id)?;
        let topo_order = self.topological_sort_backward(loss_id)?;
        for node_id in topo_order {
            self.propagate_grad_to_parents(node_id, &needs_grad)?;
        }

        self.last_backward_pass_id += 1;
        Ok(loss_scalar)
    }

    /// 将梯度从当前节点传播到其父节点（只传给`needs_grad`中的父节点）
    fn propagate_grad_to_parents(
        &mut self,
        node_id: NodeId,
        needs_grad: &HashSet<NodeId>,
    ) -> Result<(), GraphError> {
        let parent_ids = self.get_node_parents(node_id)?;
        if parent_ids.is_empty() {
            return Ok(());
        }

        let parent_grads: Vec<(NodeId, Tensor)> = {
            let node = self.get_node(node_id)?;
            let Some(upstream_grad) = node.grad() else {
                return Ok(());
            };

            let mut grads = Vec::with_capacity(parent_ids.len());
            for parent_id in &parent_ids {
                if !needs_grad.contains(parent_id) {
                    continue;
                }
                let parent = self.get_node(*parent_id)?;
                let assistant = parent_ids
                    .iter()
                    .find(|&&id| id != *parent_id)
                    .map(|&id| self.get_node(id))
                    .transpose()?;
                let parent_grad = node.calc_grad_to_parent(parent, upstream_grad, assistant)?;
                grads.push((*parent_id, parent_grad));
            }
            grads
        };

        for (parent_id, parent_grad) in parent_grads {
            let parent_node = self.get_node_mut(parent_id)?;
            let new_grad = match parent_node.grad() {
                Some(existing_grad) => existing_grad + &parent_grad,
                None => parent_grad,
            };
            parent_node.set_grad(Some(&new_grad))?;
        }

        Ok(())
    }

    /// 找出`loss_id`的祖先中需要梯度的节点：
    /// 未冻结的参数、Differentiable 输入，以及以它们为祖先的运算节点
    fn nodes_needing_grad(&self, loss_id: NodeId) -> Result<HashSet<NodeId>, GraphError> {
        fn visit(
            graph: &GraphInner,
            node_id: NodeId,
            memo: &mut HashMap<NodeId, bool>,
        ) -> Result<bool, GraphError> {
            if let Some(&known) = memo.get(&node_id) {
                return Ok(known);
            }
            let needs = match graph.get_node(node_id)?.node_type() {
                NodeType::Parameter(_) => !graph.params_frozen,
                NodeType::Input(input) => input.variant() == InputVariant::Differentiable,
                _ => {
                    let mut any = false;
                    for parent_id in graph.get_node_parents(node_id)? {
                        // 不能短路：每个父节点都要记入 memo
                        any |= visit(graph, parent_id, memo)?;
                    }
                    any
                }
            };
            memo.insert(node_id, needs);
            Ok(needs)
        }

        let mut memo = HashMap::new();
        visit(self, loss_id, &mut memo)?;
        Ok(memo
            .into_iter()
            .filter_map(|(id, needs)| needs.then_some(id))
            .collect())
    }

    /// 反向拓扑序：保证一个节点在其所有子节点（在损失的祖先范围内）都传完梯度后才向父节点传播
    fn topological_sort_backward(&self, loss_id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        fn dfs(
            graph: &GraphInner,
            node_id: NodeId,
            visited: &mut HashSet<NodeId>,
            post_order: &mut Vec<NodeId>,
        ) -> Result<(), GraphError> {
            if !visited.insert(node_id) {
                return Ok(());
            }
            for parent_id in graph.get_node_parents(node_id)? {
                dfs(graph, parent_id, visited, post_order)?;
            }
            post_order.push(node_id);
            Ok(())
        }

        let mut visited = HashSet::new();
        let mut post_order = Vec::new();
        dfs(self, loss_id, &mut visited, &mut post_order)?;
        post_order.reverse();
        Ok(post_order)
    }

    /// 清除除参数以外所有节点的梯度
    fn reset_intermediate_grad(&mut self) -> Result<(), GraphError> {
        for node in self.nodes.values_mut() {
            if !matches!(node.node_type(), NodeType::Parameter(_)) {
                node.clear_grad()?;
            }
        }
        Ok(())
    }

    pub fn clear_node_grad(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        self.get_node_mut(node_id)?.clear_grad()
    }

    /// 清零所有参数的梯度
    pub fn zero_grad(&mut self) -> Result<(), GraphError> {
        for node in self.nodes.values_mut() {
            if matches!(node.node_type(), NodeType::Parameter(_)) {
                node.clear_grad()?;
            }
        }
        Ok(())
    }
}
