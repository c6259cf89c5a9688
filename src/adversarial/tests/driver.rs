use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use super::random_images;
use crate::adversarial::{AdversarialError, AttackConfig, run_attack_mode};
use crate::assert_err;
use crate::checkpoint::{CheckpointError, ParameterStore};
use crate::config::{Mode, RunConfig};
use crate::data::{BatchSource, MnistBatchSource, MnistDataset};
use crate::errors::RunError;
use crate::model::{CnnMnist, InputMode};
use crate::nn::Graph;
use crate::tensor::Tensor;
use crate::train::TrainConfig;

/// 记录调用次数的批次来源
struct CountingSource {
    inner: MnistBatchSource,
    calls: Cell<usize>,
}

impl BatchSource for CountingSource {
    fn next_batch(&mut self, n: usize) -> (Tensor, Tensor) {
        self.calls.set(self.calls.get() + 1);
        self.inner.next_batch(n)
    }

    fn select_by_label(&self, class: usize) -> Tensor {
        self.calls.set(self.calls.get() + 1);
        self.inner.select_by_label(class)
    }

    fn label_count(&self, class: usize) -> usize {
        self.calls.set(self.calls.get() + 1);
        self.inner.label_count(class)
    }
}

fn counting_source(classes: &[usize]) -> CountingSource {
    let images = random_images(classes.len(), 21);
    let mut labels = Tensor::zeros(&[classes.len(), 10]);
    for (i, &c) in classes.iter().enumerate() {
        labels[[i, c]] = 1.0;
    }
    let dataset = MnistDataset::from_tensors(images, labels).unwrap();
    CountingSource {
        inner: MnistBatchSource::new(dataset, 0),
        calls: Cell::new(0),
    }
}

fn run_config(dir: &PathBuf, batch_size: usize) -> RunConfig {
    RunConfig {
        mode: Mode::Adversarial,
        data_dir: dir.clone(),
        validation_size: 0,
        batch_size,
        checkpoint_base: dir.join("mnist_deep.ckpt"),
        restore_step: 200,
        source_class: 2,
        seed: 1,
        train: TrainConfig::default(),
        attack: AttackConfig {
            iterations: 2,
            log_index: 1,
            snapshot_dir: None,
            ..AttackConfig::default()
        },
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mnist_adv_driver_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 以另一个 batch 大小建图并保存第 200 步检查点，参数形状与 batch 无关
fn save_checkpoint(config: &RunConfig) {
    let graph = Graph::new_with_seed(99);
    CnnMnist::new(&graph, 1, InputMode::Placeholder).unwrap();
    ParameterStore::new(&config.checkpoint_base)
        .save(&graph, 200)
        .unwrap();
}

#[test]
fn test_missing_checkpoint_aborts_before_computation() {
    let dir = temp_dir("missing");
    let config = run_config(&dir, 2);
    let mut source = counting_source(&[2, 2, 2]);

    assert_err!(
        run_attack_mode(&config, &mut source),
        RunError::Checkpoint(CheckpointError::NotFound(_))
    );
    assert_eq!(source.calls.get(), 0);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_not_enough_source_samples() {
    let dir = temp_dir("not_enough");
    let config = run_config(&dir, 3);
    save_checkpoint(&config);
    let mut source = counting_source(&[2, 7, 2, 1]);

    assert_err!(
        run_attack_mode(&config, &mut source),
        RunError::Adversarial(AdversarialError::NotEnoughSamples {
            class: 2,
            needed: 3,
            available: 2
        })
    );
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_attack_mode_runs_on_restored_model() {
    let dir = temp_dir("runs");
    let config = run_config(&dir, 2);
    save_checkpoint(&config);
    let mut source = counting_source(&[2, 0, 2, 2, 9]);

    let report = run_attack_mode(&config, &mut source).unwrap();
    assert_eq!(report.steps.len(), 2);
    // 起始图像为数据集中前两张“2”（第 0、2 张）
    assert_eq!(report.final_images.shape(), &[2, 784]);
    assert!(report.initial_probability > 0.0 && report.initial_probability < 1.0);
    fs::remove_dir_all(&dir).unwrap();
}
