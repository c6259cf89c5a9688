/*
 * @Description  : 对抗模式入口：恢复检查点 → 冻结参数 → 训练批次准确率自检 → 取起始类别图像 → 攻击
 */

use super::error::AdversarialError;
use super::optimizer::{AdversarialOptimizer, AttackReport};
use crate::checkpoint::ParameterStore;
use crate::config::RunConfig;
use crate::data::BatchSource;
use crate::errors::RunError;
use crate::model::{CnnMnist, InputMode};
use crate::nn::Graph;
use crate::tensor::Tensor;

pub fn run_attack_mode(
    config: &RunConfig,
    source: &mut dyn BatchSource,
) -> Result<AttackReport, RunError> {
    log::info!("开始生成对抗样本");
    let graph = Graph::new_with_seed(config.seed);
    let model = CnnMnist::new(&graph, config.batch_size, InputMode::Differentiable)?;
    ParameterStore::new(&config.checkpoint_base).restore_step(&graph, config.restore_step)?;
    model.freeze()?;

    let (images, labels) = source.next_batch(config.batch_size);
    let accuracy = model.accuracy(&images, &labels)?;
    log::info!("training accuracy {accuracy}");

    let start = first_of_class(source, config.source_class, config.batch_size)?;
    let report = AdversarialOptimizer::new(&model, config.attack.clone())?.run(&start)?;
    log::info!(
        "对抗样本生成完成：p({}) 从 {:.6} 变为 {:.6}",
        config.attack.target_class,
        report.initial_probability,
        report.final_probability()
    );
    Ok(report)
}

/// 按数据集顺序取前`n`张类别为`class`的图像
fn first_of_class(
    source: &dyn BatchSource,
    class: usize,
    n: usize,
) -> Result<Tensor, AdversarialError> {
    let available = source.label_count(class);
    if available < n {
        return Err(AdversarialError::NotEnoughSamples {
            class,
            needed: n,
            available,
        });
    }
    let indices: Vec<usize> = (0..n).collect();
    Ok(source.select_by_label(class).select_rows(&indices))
}
