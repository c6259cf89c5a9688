/*
 * @Description  : 训练用的批次来源：循环遍历数据集，每个 epoch 重新打乱，
 *                 跨 epoch 的批次由旧排列的尾部接上新排列的头部组成
 */

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::datasets::{MnistDataset, NUM_CLASSES};
use crate::tensor::Tensor;

/// 带标签图像批次的来源
pub trait BatchSource {
    /// 取`n`个样本：(images [n, 784], labels [n, 10])
    fn next_batch(&mut self, n: usize) -> (Tensor, Tensor);

    /// 所有类别为`class`的图像 [k, 784]，按数据集原有顺序
    fn select_by_label(&self, class: usize) -> Tensor;

    /// 类别为`class`的样本数
    fn label_count(&self, class: usize) -> usize;
}

/// 基于 [`MnistDataset`] 的批次来源
pub struct MnistBatchSource {
    dataset: MnistDataset,
    rng: StdRng,
    perm: Vec<usize>,
    cursor: usize,
    epochs_completed: usize,
}

impl MnistBatchSource {
    /// # Panics
    /// 如果数据集为空
    pub fn new(dataset: MnistDataset, seed: u64) -> Self {
        assert!(!dataset.is_empty(), "MnistBatchSource: 数据集不能为空");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut perm: Vec<usize> = (0..dataset.len()).collect();
        perm.shuffle(&mut rng);
        Self {
            dataset,
            rng,
            perm,
            cursor: 0,
            epochs_completed: 0,
        }
    }

    pub const fn dataset(&self) -> &MnistDataset {
        &self.dataset
    }

    /// 已完整遍历的 epoch 数
    pub const fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    fn reshuffle(&mut self) {
        self.perm.shuffle(&mut self.rng);
        self.cursor = 0;
        self.epochs_completed += 1;
    }

    fn class_indices(&self, class: usize) -> Vec<usize> {
        self.dataset
            .classes()
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == class)
            .map(|(i, _)| i)
            .collect()
    }
}

impl BatchSource for MnistBatchSource {
    fn next_batch(&mut self, n: usize) -> (Tensor, Tensor) {
        let mut indices = Vec::with_capacity(n);
        while indices.len() < n {
            if self.cursor == self.perm.len() {
                self.reshuffle();
            }
            let take = (n - indices.len()).min(self.perm.len() - self.cursor);
            indices.extend_from_slice(&self.perm[self.cursor..self.cursor + take]);
            self.cursor += take;
        }
        // 恰好取完时立即换新排列，与下一批的取法保持一致
        if self.cursor == self.perm.len() {
            self.reshuffle();
        }
        (
            self.dataset.images().select_rows(&indices),
            self.dataset.labels().select_rows(&indices),
        )
    }

    fn select_by_label(&self, class: usize) -> Tensor {
        if class >= NUM_CLASSES {
            log::warn!("类别 {class} 超出范围 0..{NUM_CLASSES}，返回空张量");
        }
        self.dataset.images().select_rows(&self.class_indices(class))
    }

    fn label_count(&self, class: usize) -> usize {
        self.dataset.classes().iter().filter(|&&c| c == class).count()
    }
}
