/*
 * @Description  : 训练流程
 *
 * 每步取一批数据：
 * - 每`log_every`步用该批数据（keep_prob = 1.0）记录训练准确率
 * - 每`checkpoint_every`步保存检查点（含第 0 步，保存发生在该步更新之前）
 * - 以 keep_prob = 0.5 执行一次 Adam 更新
 * 结束后在整个测试集上做带掩码的准确率评估：最后一个不满的批次补零行，补的行不计入。
 */

use std::path::PathBuf;

use crate::checkpoint::ParameterStore;
use crate::config::RunConfig;
use crate::data::{BatchSource, DataLoader, MnistDataset, TensorDataset};
use crate::errors::RunError;
use crate::model::{CnnMnist, InputMode, KEEP_PROB_TRAIN};
use crate::nn::{Adam, Graph, GraphError, Module};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub steps: usize,
    pub log_every: usize,
    pub checkpoint_every: usize,
    /// Adam 学习率
    pub learning_rate: f32,
    pub keep_prob: f32,
    /// 训练结束后是否评估测试集
    pub evaluate_test: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            steps: 20000,
            log_every: 100,
            checkpoint_every: 100,
            learning_rate: 1e-4,
            keep_prob: KEEP_PROB_TRAIN,
            evaluate_test: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    /// 最后一步的训练损失（0 步时为 None）
    pub final_loss: Option<f32>,
    /// (步数, 该步批次上的训练准确率)
    pub train_accuracies: Vec<(usize, f32)>,
    pub checkpoints: Vec<PathBuf>,
    pub test_accuracy: Option<f32>,
}

pub struct Trainer<'a> {
    model: &'a CnnMnist,
    source: &'a mut dyn BatchSource,
    store: &'a ParameterStore,
    config: TrainConfig,
    optimizer: Adam,
}

impl<'a> Trainer<'a> {
    pub fn new(
        model: &'a CnnMnist,
        source: &'a mut dyn BatchSource,
        store: &'a ParameterStore,
        config: TrainConfig,
    ) -> Self {
        let optimizer = Adam::new(model.graph(), &model.parameters(), config.learning_rate);
        Self {
            model,
            source,
            store,
            config,
            optimizer,
        }
    }

    /// 训练`steps`步；`test`不为 None 且开启评估时，最后计算测试集准确率
    pub fn run(&mut self, test: Option<&MnistDataset>) -> Result<TrainReport, RunError> {
        let batch_size = self.model.batch_size();
        let mut report = TrainReport::default();

        for step in 0..self.config.steps {
            let (images, labels) = self.source.next_batch(batch_size);
            if self.config.log_every > 0 && step % self.config.log_every == 0 {
                let accuracy = self.model.accuracy(&images, &labels)?;
                log::info!("step {step}, training accuracy {accuracy}");
                report.train_accuracies.push((step, accuracy));
            }
            if self.config.checkpoint_every > 0 && step % self.config.checkpoint_every == 0 {
                let path = self.store.save(self.model.graph(), step)?;
                report.checkpoints.push(path);
            }
            let loss = self.model.train_step(
                &mut self.optimizer,
                &images,
                &labels,
                self.config.keep_prob,
            )?;
            report.final_loss = Some(loss);
        }

        if self.config.evaluate_test {
            if let Some(test) = test {
                let accuracy = evaluate_masked(self.model, test)?;
                log::info!("test accuracy {accuracy}");
                report.test_accuracy = Some(accuracy);
            }
        }
        Ok(report)
    }
}

/// 整个数据集上的准确率（keep_prob = 1.0）。
/// 按模型的固定 batch 分批，最后一批补零行，补的行不计入
pub fn evaluate_masked(model: &CnnMnist, dataset: &MnistDataset) -> Result<f32, GraphError> {
    if dataset.is_empty() {
        log::warn!("评估集为空，准确率记为 0");
        return Ok(0.0);
    }
    let loader = DataLoader::new(
        TensorDataset::new(dataset.images(), dataset.labels()),
        model.batch_size(),
    )
    .pad_last(true);

    let mut correct = 0usize;
    for batch in loader.iter() {
        let mask = model.correct_mask(&batch.images, &batch.labels)?;
        correct += mask[..batch.valid].iter().filter(|&&c| c).count();
    }
    Ok(correct as f32 / dataset.len() as f32)
}

/// 训练模式：建图、训练、保存检查点，最后评估测试集
pub fn run_train_mode(
    config: &RunConfig,
    source: &mut dyn BatchSource,
    test: Option<&MnistDataset>,
) -> Result<TrainReport, RunError> {
    let graph = Graph::new_with_seed(config.seed);
    let model = CnnMnist::new(&graph, config.batch_size, InputMode::Placeholder)?;
    let store = ParameterStore::new(&config.checkpoint_base);
    log::info!(
        "开始训练：{} 步，batch {}，学习率 {}",
        config.train.steps,
        config.batch_size,
        config.train.learning_rate
    );
    Trainer::new(&model, source, &store, config.train.clone()).run(test)
}
