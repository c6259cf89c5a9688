/*
 * @Description  : MNIST 卷积分类网络
 *
 * 网络结构（batch 固定为建图时的 batch_size）：
 * [b,784] -> reshape [b,1,28,28]
 *   -> Conv2d(1→32, 5x5, same) -> ReLU -> MaxPool(2x2) -> [b,32,14,14]
 *   -> Conv2d(32→64, 5x5, same) -> ReLU -> MaxPool(2x2) -> [b,64,7,7]
 *   -> flatten [b,3136] -> Linear(1024) -> ReLU -> Dropout(keep_prob)
 *   -> Linear(10) -> logits [b,10]
 *
 * 图只建一次；每次求值前把图像、标签、keep_prob 喂给对应的输入节点。
 */

use crate::nn::{
    Conv2d, Graph, GraphError, Init, Linear, MaxPool2d, Module, Optimizer, Var,
    VarActivationOps, VarLossOps, VarRegularizationOps, VarShapeOps,
};
use crate::tensor::Tensor;

pub const KEEP_PROB_TRAIN: f32 = 0.5;
pub const KEEP_PROB_EVAL: f32 = 1.0;

const IMAGE_SIZE: usize = 784;
const NUM_CLASSES: usize = 10;

/// 图像输入节点的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// 训练：普通数据输入，不求梯度
    Placeholder,
    /// 对抗样本生成：可微输入，反向传播时得到损失对图像的梯度
    Differentiable,
}

/// MNIST 卷积分类网络
///
/// ```ignore
/// let graph = Graph::new_with_seed(42);
/// let model = CnnMnist::new(&graph, 50, InputMode::Placeholder)?;
/// let mut adam = Adam::new(&graph, &model.parameters(), 1e-4);
/// let loss = model.train_step(&mut adam, &images, &labels, KEEP_PROB_TRAIN)?;
/// ```
pub struct CnnMnist {
    graph: Graph,
    batch_size: usize,
    mode: InputMode,
    conv1: Conv2d,
    conv2: Conv2d,
    fc1: Linear,
    fc2: Linear,
    /// 图像 [b, 784]
    images: Var,
    /// one-hot 标签 [b, 10]
    labels: Var,
    /// dropout 保留概率 [1, 1]
    keep_prob: Var,
    logits: Var,
    loss: Var,
}

impl CnnMnist {
    pub fn new(graph: &Graph, batch_size: usize, mode: InputMode) -> Result<Self, GraphError> {
        let weight_init = Init::TruncatedNormal { std: 0.1 };
        let bias_init = Init::Constant(0.1);

        let images = match mode {
            InputMode::Placeholder => graph.input(&[batch_size, IMAGE_SIZE], Some("images"))?,
            InputMode::Differentiable => {
                graph.differentiable_input(&[batch_size, IMAGE_SIZE], Some("images"))?
            }
        };
        let labels = graph.target(&[batch_size, NUM_CLASSES], Some("labels"))?;
        let keep_prob = graph.input(&[1, 1], Some("keep_prob"))?;

        let conv1 = Conv2d::new(
            graph,
            1,
            32,
            (5, 5),
            (1, 1),
            (2, 2),
            weight_init.clone(),
            bias_init.clone(),
            "conv1",
        )?;
        let conv2 = Conv2d::new(
            graph,
            32,
            64,
            (5, 5),
            (1, 1),
            (2, 2),
            weight_init.clone(),
            bias_init.clone(),
            "conv2",
        )?;
        let fc1 = Linear::new(
            graph,
            64 * 7 * 7,
            1024,
            weight_init.clone(),
            bias_init.clone(),
            "fc1",
        )?;
        let fc2 = Linear::new(graph, 1024, NUM_CLASSES, weight_init, bias_init, "fc2")?;

        let pool = MaxPool2d::new((2, 2), Some((2, 2)), true);
        let x = images.reshape(&[batch_size, 1, 28, 28])?;
        let h1 = pool.forward(&conv1.forward(&x)?.relu()?)?;
        let h2 = pool.forward(&conv2.forward(&h1)?.relu()?)?;
        let h_fc1 = fc1.forward(&h2.flatten()?)?.relu()?;
        let logits = fc2.forward(&h_fc1.dropout(&keep_prob)?)?;
        let loss = logits.cross_entropy(&labels)?;

        Ok(Self {
            graph: graph.clone(),
            batch_size,
            mode,
            conv1,
            conv2,
            fc1,
            fc2,
            images,
            labels,
            keep_prob,
            logits,
            loss,
        })
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// 图像输入节点
    pub const fn input(&self) -> &Var {
        &self.images
    }

    /// 把一批图像写入输入节点，形状须为 [batch_size, 784]
    pub fn assign_input(&self, images: &Tensor) -> Result<(), GraphError> {
        self.images.set_value(images)
    }

    fn feed(
        &self,
        images: &Tensor,
        labels: Option<&Tensor>,
        keep_prob: f32,
    ) -> Result<(), GraphError> {
        self.assign_input(images)?;
        if let Some(labels) = labels {
            self.labels.set_value(labels)?;
        }
        self.keep_prob.set_value(&Tensor::new(&[keep_prob], &[1, 1]))
    }

    fn value_of(var: &Var) -> Result<Tensor, GraphError> {
        var.value()?.ok_or_else(|| {
            GraphError::ComputationError(format!("节点{:?}前向传播后仍没有值", var.node_id()))
        })
    }

    /// logits [b, 10]
    pub fn logits(&self, images: &Tensor, keep_prob: f32) -> Result<Tensor, GraphError> {
        self.feed(images, None, keep_prob)?;
        self.logits.forward()?;
        Self::value_of(&self.logits)
    }

    /// 各类别概率 [b, 10]（不使用 dropout）
    pub fn probabilities(&self, images: &Tensor) -> Result<Tensor, GraphError> {
        Ok(self.logits(images, KEEP_PROB_EVAL)?.softmax_rows())
    }

    /// 平均 softmax 交叉熵
    pub fn loss(
        &self,
        images: &Tensor,
        labels: &Tensor,
        keep_prob: f32,
    ) -> Result<f32, GraphError> {
        self.feed(images, Some(labels), keep_prob)?;
        self.loss.forward()?;
        self.loss.item()
    }

    /// 每一行预测是否正确（不使用 dropout）
    pub fn correct_mask(&self, images: &Tensor, labels: &Tensor) -> Result<Vec<bool>, GraphError> {
        if labels.shape() != [self.batch_size, NUM_CLASSES] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![self.batch_size, NUM_CLASSES],
                got: labels.shape().to_vec(),
                message: "标签须为 one-hot 形式".to_string(),
            });
        }
        let predicted = self.logits(images, KEEP_PROB_EVAL)?.argmax_rows();
        Ok(predicted
            .into_iter()
            .zip(labels.argmax_rows())
            .map(|(p, t)| p == t)
            .collect())
    }

    /// 准确率，取值 [0, 1]
    pub fn accuracy(&self, images: &Tensor, labels: &Tensor) -> Result<f32, GraphError> {
        let mask = self.correct_mask(images, labels)?;
        let correct = mask.iter().filter(|&&c| c).count();
        Ok(correct as f32 / mask.len() as f32)
    }

    /// 交叉熵对输入图像的梯度 [b, 784]，仅在`Differentiable`模式下可用
    pub fn input_gradient(
        &self,
        images: &Tensor,
        labels: &Tensor,
        keep_prob: f32,
    ) -> Result<Tensor, GraphError> {
        if self.mode != InputMode::Differentiable {
            return Err(GraphError::InvalidOperation(
                "只有 Differentiable 输入模式才能求输入梯度".to_string(),
            ));
        }
        self.feed(images, Some(labels), keep_prob)?;
        self.loss.backward()?;
        self.images.grad()?.ok_or_else(|| {
            GraphError::ComputationError("反向传播后输入节点没有梯度".to_string())
        })
    }

    /// 执行一次优化器更新，返回本批次的损失
    pub fn train_step<O: Optimizer + ?Sized>(
        &self,
        optimizer: &mut O,
        images: &Tensor,
        labels: &Tensor,
        keep_prob: f32,
    ) -> Result<f32, GraphError> {
        self.feed(images, Some(labels), keep_prob)?;
        optimizer.minimize(&self.loss)
    }

    /// 冻结参数：之后的反向传播不再计算参数梯度
    pub fn freeze(&self) -> Result<(), GraphError> {
        self.graph.freeze_params()
    }
}

impl Module for CnnMnist {
    fn parameters(&self) -> Vec<Var> {
        [
            self.conv1.parameters(),
            self.conv2.parameters(),
            self.fc1.parameters(),
            self.fc2.parameters(),
        ]
        .concat()
    }
}
