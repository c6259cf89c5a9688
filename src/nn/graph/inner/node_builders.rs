/*
 * @Description  : GraphInner 节点构建方法（new_*_node）
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::{
    Add, ChannelBiasAdd, Conv2d, Dropout, Input, LeakyReLU, MatMul, MaxPool2d, NodeType,
    Parameter, Reshape, SoftmaxCrossEntropy, TraitNode,
};
use crate::nn::nodes::InputVariant;
use crate::tensor::Tensor;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

impl GraphInner {
    /// 添加节点到列表
    pub(in crate::nn::graph) fn add_node_to_list(
        &mut self,
        raw_node: NodeType,
        name: Option<&str>,
        node_type: &str,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let node_name = self.generate_valid_new_node_name(name.unwrap_or(""), node_type)?;
        let node_id = self.generate_valid_node_id();

        for &parent_id in parents {
            self.forward_edges
                .entry(parent_id)
                .or_default()
                .push(node_id);
        }
        self.backward_edges
            .entry(node_id)
            .or_default()
            .extend(parents);

        self.nodes
            .insert(node_id, NodeHandle::new(node_id, &node_name, raw_node));
        Ok(node_id)
    }

    /// 先取父节点句柄构建具体节点，再登记到图中
    fn add_op_node<T, F>(
        &mut self,
        parents: &[NodeId],
        name: Option<&str>,
        node_type: &str,
        build: F,
    ) -> Result<NodeId, GraphError>
    where
        T: Into<NodeType>,
        F: FnOnce(&[&NodeHandle]) -> Result<T, GraphError>,
    {
        let raw_node = {
            let parent_handles = self.get_nodes(parents)?;
            build(&parent_handles)?.into()
        };
        self.add_node_to_list(raw_node, name, node_type, parents)
    }

    pub fn new_input_node(
        &mut self,
        shape: &[usize],
        variant: InputVariant,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let prefix = match variant {
            InputVariant::Data => "input",
            InputVariant::Target => "target",
            InputVariant::Differentiable => "diff_input",
        };
        let node = Input::new(shape, variant)?;
        self.add_node_to_list(node.into(), name, prefix, &[])
    }

    /// 创建参数节点，初始值由调用方给出（形状须与`shape`一致）
    pub fn new_parameter_node(
        &mut self,
        shape: &[usize],
        init_value: &Tensor,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let mut node = Parameter::new(shape)?;
        node.set_value(Some(init_value))?;
        self.add_node_to_list(node.into(), name, "parameter", &[])
    }

    pub fn new_add_node(
        &mut self,
        parents: &[NodeId],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(parents, name, "add", Add::new)
    }

    pub fn new_mat_mul_node(
        &mut self,
        left: NodeId,
        right: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(&[left, right], name, "mat_mul", MatMul::new)
    }

    /// 卷积节点：父节点为 [输入 [N,C,H,W], 卷积核 [C_out,C_in,kH,kW]]
    pub fn new_conv2d_node(
        &mut self,
        input: NodeId,
        kernel: NodeId,
        stride: (usize, usize),
        padding: (usize, usize),
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(&[input, kernel], name, "conv2d", |parents| {
            Conv2d::new(parents, stride, padding)
        })
    }

    pub fn new_channel_bias_add_node(
        &mut self,
        input: NodeId,
        bias: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(&[input, bias], name, "channel_bias_add", ChannelBiasAdd::new)
    }

    pub fn new_max_pool2d_node(
        &mut self,
        input: NodeId,
        kernel_size: (usize, usize),
        stride: Option<(usize, usize)>,
        ceil_mode: bool,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(&[input], name, "max_pool2d", |parents| {
            MaxPool2d::new(parents, kernel_size, stride, ceil_mode)
        })
    }

    pub fn new_leaky_relu_node(
        &mut self,
        input: NodeId,
        slope: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let prefix = if slope == 0.0 { "relu" } else { "leaky_relu" };
        self.add_op_node(&[input], name, prefix, |parents| {
            LeakyReLU::new(parents, slope)
        })
    }

    pub fn new_reshape_node(
        &mut self,
        input: NodeId,
        target_shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(&[input], name, "reshape", |parents| {
            Reshape::new(parents, target_shape)
        })
    }

    /// Dropout 节点：父节点为 [输入, keep_prob（[1,1]的 Data 输入）]，掩码的随机种子取自图的 rng
    pub fn new_dropout_node(
        &mut self,
        input: NodeId,
        keep_prob: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let rng = StdRng::seed_from_u64(self.rng.r#gen());
        self.add_op_node(&[input, keep_prob], name, "dropout", |parents| {
            Dropout::new(parents, rng)
        })
    }

    pub fn new_softmax_cross_entropy_node(
        &mut self,
        logits: NodeId,
        labels: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(
            &[logits, labels],
            name,
            "softmax_cross_entropy",
            SoftmaxCrossEntropy::new,
        )
    }

    /// 图级别 rng 的可变引用，供参数初始化使用
    pub(in crate::nn) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
