/*
 * @Description  : DataLoader：单个 epoch 的批量遍历，最后一批可补齐到固定 batch
 *
 * 与 BatchSource 的区别：DataLoader 只走一遍数据集，用于测试集评估；
 * 训练时循环取数据用 BatchSource。
 */

use super::transforms::pad_rows;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// 借用一对按行对应的（样本，标签）张量
#[derive(Debug, Clone, Copy)]
pub struct TensorDataset<'a> {
    features: &'a Tensor,
    labels: &'a Tensor,
}

impl<'a> TensorDataset<'a> {
    /// # Panics
    /// 样本数与标签数不一致时
    pub fn new(features: &'a Tensor, labels: &'a Tensor) -> Self {
        assert_eq!(
            features.rows(),
            labels.rows(),
            "TensorDataset：样本数（{}）与标签数（{}）不一致",
            features.rows(),
            labels.rows()
        );
        Self { features, labels }
    }

    pub fn len(&self) -> usize {
        self.features.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一个批次；`valid`之后的行是补齐用的零行
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub images: Tensor,
    pub labels: Tensor,
    pub valid: usize,
}

/// ```ignore
/// let loader = DataLoader::new(TensorDataset::new(&x, &y), 50).pad_last(true);
/// for batch in loader.iter() {
///     // batch.images 总是 [50, ..]，只有前 batch.valid 行是真实样本
/// }
/// ```
pub struct DataLoader<'a> {
    dataset: TensorDataset<'a>,
    batch_size: usize,
    shuffle_seed: Option<u64>,
    drop_last: bool,
    pad_last: bool,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: TensorDataset<'a>, batch_size: usize) -> Self {
        assert!(batch_size > 0, "DataLoader：batch_size 必须大于 0");
        Self {
            dataset,
            batch_size,
            shuffle_seed: None,
            drop_last: false,
            pad_last: false,
        }
    }

    /// 按给定种子打乱遍历顺序
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// 丢弃最后一个不满的批次
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// 最后一个不满的批次补零行到`batch_size`（与`drop_last`同时开启时以`drop_last`为准）
    pub fn pad_last(mut self, pad_last: bool) -> Self {
        self.pad_last = pad_last;
        self
    }

    pub fn num_batches(&self) -> usize {
        if self.drop_last {
            self.dataset.len() / self.batch_size
        } else {
            self.dataset.len().div_ceil(self.batch_size)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Batch> + '_ {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            order.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        let batch_size = self.batch_size;
        let keep = self.num_batches();
        let mut chunks: Vec<Vec<usize>> = order.chunks(batch_size).map(<[usize]>::to_vec).collect();
        chunks.truncate(keep);

        chunks.into_iter().map(move |indices| {
            let images = self.dataset.features.select_rows(&indices);
            let labels = self.dataset.labels.select_rows(&indices);
            if self.pad_last && indices.len() < batch_size {
                let (images, valid) = pad_rows(&images, batch_size);
                let (labels, _) = pad_rows(&labels, batch_size);
                Batch {
                    images,
                    labels,
                    valid,
                }
            } else {
                Batch {
                    images,
                    labels,
                    valid: indices.len(),
                }
            }
        })
    }
}
