/*
 * @Description  : 对抗样本优化器
 *
 * 目标：让冻结的分类器把一批图像判为目标类别 T。
 * 每次迭代：
 *   g = ∂CE(T)/∂images（keep_prob = 1.0）
 *   images ← images - lr * g
 * 即在 -CE(T) 上做梯度上升，提高 p(T)。没有动量、没有截断、没有收敛判断，
 * 所有图像共用同一个学习率。
 */

use std::path::PathBuf;

use super::buffer::InputBuffer;
use super::error::AdversarialError;
use crate::data::datasets::NUM_CLASSES;
use crate::model::{CnnMnist, InputMode, KEEP_PROB_EVAL};
use crate::tensor::Tensor;
use crate::vision::Vision;

/// 快照图像的放大倍数
const SNAPSHOT_SCALE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AttackConfig {
    /// 目标类别
    pub target_class: usize,
    pub iterations: usize,
    pub learning_rate: f32,
    /// 记录概率与保存快照所用的样本下标
    pub log_index: usize,
    /// 快照目录，None 时不保存
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_prefix: String,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            target_class: 5,
            iterations: 50,
            learning_rate: 0.1,
            log_index: 2,
            snapshot_dir: Some(PathBuf::from("plots")),
            snapshot_prefix: "two_adv".to_string(),
        }
    }
}

impl AttackConfig {
    /// 第`iteration`次迭代的快照路径：`<dir>/<prefix><iteration>.png`
    pub fn snapshot_path(&self, iteration: usize) -> Option<PathBuf> {
        self.snapshot_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}{iteration}.png", self.snapshot_prefix)))
    }
}

/// 单次迭代的记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackStep {
    /// 从 0 开始
    pub iteration: usize,
    /// 更新后`log_index`号样本属于目标类别的概率
    pub target_probability: f32,
    /// 本次梯度（整批）的 L2 范数
    pub gradient_norm: f32,
}

#[derive(Debug, Clone)]
pub struct AttackReport {
    /// 更新前`log_index`号样本属于目标类别的概率
    pub initial_probability: f32,
    pub steps: Vec<AttackStep>,
    pub final_images: Tensor,
    /// 初始图像上每张图梯度的 L2 范数
    pub initial_gradient_norms: Vec<f32>,
}

impl AttackReport {
    pub fn final_probability(&self) -> f32 {
        self.steps
            .last()
            .map_or(self.initial_probability, |s| s.target_probability)
    }
}

pub struct AdversarialOptimizer<'a> {
    model: &'a CnnMnist,
    config: AttackConfig,
}

impl<'a> AdversarialOptimizer<'a> {
    /// 校验配置后创建；分类器须为`Differentiable`输入模式
    pub fn new(model: &'a CnnMnist, config: AttackConfig) -> Result<Self, AdversarialError> {
        if config.target_class >= NUM_CLASSES {
            return Err(AdversarialError::InvalidConfig(format!(
                "目标类别须小于{NUM_CLASSES}，实际为{}",
                config.target_class
            )));
        }
        if config.log_index >= model.batch_size() {
            return Err(AdversarialError::InvalidConfig(format!(
                "记录下标须小于 batch 大小{}，实际为{}",
                model.batch_size(),
                config.log_index
            )));
        }
        if !config.learning_rate.is_finite() {
            return Err(AdversarialError::InvalidConfig(format!(
                "学习率须为有限值，实际为{}",
                config.learning_rate
            )));
        }
        if model.mode() != InputMode::Differentiable {
            return Err(AdversarialError::InvalidConfig(
                "分类器须以 Differentiable 输入模式构建".to_string(),
            ));
        }
        Ok(Self { model, config })
    }

    pub const fn config(&self) -> &AttackConfig {
        &self.config
    }

    fn target_probability(&self, images: &Tensor) -> Result<(Tensor, f32), AdversarialError> {
        let probs = self.model.probabilities(images)?;
        let p = probs[[self.config.log_index, self.config.target_class]];
        Ok((probs, p))
    }

    /// 从`start_images`（[batch_size, 784]）出发执行固定次数的迭代
    pub fn run(&self, start_images: &Tensor) -> Result<AttackReport, AdversarialError> {
        let config = &self.config;
        let batch_size = self.model.batch_size();
        let mut buffer = InputBuffer::new(batch_size);
        buffer.assign(start_images)?;

        let targets = Tensor::one_hot_rows(config.target_class, NUM_CLASSES, batch_size);
        let (_, initial_probability) = self.target_probability(buffer.value())?;
        log::info!(
            "开始生成对抗样本：目标类别{}，样本{}的初始概率{initial_probability:.6}",
            config.target_class,
            config.log_index
        );

        let mut steps = Vec::with_capacity(config.iterations);
        let mut initial_gradient_norms = Vec::new();
        for iteration in 0..config.iterations {
            let grad = self
                .model
                .input_gradient(buffer.value(), &targets, KEEP_PROB_EVAL)?;
            if iteration == 0 {
                initial_gradient_norms = grad.row_norms();
            }
            let updated = buffer.value() - &(&grad * config.learning_rate);
            buffer.assign(&updated)?;

            let (probs, target_probability) = self.target_probability(buffer.value())?;
            log::debug!(
                "迭代{iteration}：样本{}的概率分布{}",
                config.log_index,
                probs.row(config.log_index)
            );
            log::info!("迭代{iteration}：p({})={target_probability:.6}", config.target_class);

            if let Some(path) = config.snapshot_path(iteration) {
                Vision::save_digit(&buffer.value().row(config.log_index), &path, SNAPSHOT_SCALE)?;
            }
            steps.push(AttackStep {
                iteration,
                target_probability,
                gradient_norm: grad.norm(),
            });
        }

        Ok(AttackReport {
            initial_probability,
            steps,
            final_images: buffer.into_inner(),
            initial_gradient_norms,
        })
    }
}
