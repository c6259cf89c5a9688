//! MNIST 手写数字数据集
//!
//! 支持：
//! - IDX 二进制格式解析（原始文件或 .gz 压缩）
//! - 像素归一化 (0-255 → 0-1)，图像展平为 [N, 784]
//! - 标签 one-hot 编码为 [N, 10]
//! - 从训练集头部划出验证集（默认 5000 张）

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::data::error::DataError;
use crate::data::transforms::{normalize_pixels, one_hot};
use crate::tensor::Tensor;

pub const IMAGE_SIZE: usize = 28 * 28;
pub const NUM_CLASSES: usize = 10;
/// 从训练文件头部划出的验证集大小
pub const DEFAULT_VALIDATION_SIZE: usize = 5000;

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// MNIST 手写数字数据集
///
/// 图像为 [N, 784]，像素在 [0, 1]；标签为 [N, 10] one-hot。
#[derive(Debug, Clone)]
pub struct MnistDataset {
    images: Tensor,
    labels: Tensor,
    /// 每个样本的类别号，与 labels 的 one-hot 行一一对应
    classes: Vec<usize>,
}

/// 训练/验证/测试三份数据
#[derive(Debug, Clone)]
pub struct MnistSplits {
    pub train: MnistDataset,
    pub validation: MnistDataset,
    pub test: MnistDataset,
}

impl MnistDataset {
    /// 从`data_dir`加载训练集（`train`=true，60000 张）或测试集（10000 张）。
    /// 每个文件优先找未压缩版本，其次找`.gz`；都不存在时返回`DataError::FileNotFound`
    pub fn load(data_dir: impl AsRef<Path>, train: bool) -> Result<Self, DataError> {
        let data_dir = data_dir.as_ref();
        let (images_file, labels_file) = if train {
            ("train-images-idx3-ubyte", "train-labels-idx1-ubyte")
        } else {
            ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte")
        };

        let images_path = locate_file(data_dir, images_file)?;
        let labels_path = locate_file(data_dir, labels_file)?;

        let images_raw = parse_idx_images(&images_path)?;
        let classes = parse_idx_labels(&labels_path)?;
        if images_raw.shape()[0] != classes.len() {
            return Err(DataError::FormatError(format!(
                "图像数量 {} 与标签数量 {} 不一致",
                images_raw.shape()[0],
                classes.len()
            )));
        }

        log::debug!(
            "已加载 MNIST {}集：{} 张（{:?}）",
            if train { "训练" } else { "测试" },
            classes.len(),
            images_path
        );
        Ok(Self {
            images: normalize_pixels(&images_raw),
            labels: one_hot(&classes, NUM_CLASSES),
            classes,
        })
    }

    /// 用已有张量构造数据集：`images`须为 [N, 784]，`labels`须为 [N, 10] one-hot
    pub fn from_tensors(images: Tensor, labels: Tensor) -> Result<Self, DataError> {
        if images.dimension() != 2 || images.shape()[1] != IMAGE_SIZE {
            return Err(DataError::ShapeMismatch {
                expected: vec![images.rows(), IMAGE_SIZE],
                got: images.shape().to_vec(),
            });
        }
        let expected_labels = vec![images.shape()[0], NUM_CLASSES];
        if labels.shape() != expected_labels.as_slice() {
            return Err(DataError::ShapeMismatch {
                expected: expected_labels,
                got: labels.shape().to_vec(),
            });
        }
        let classes = if labels.shape()[0] == 0 {
            Vec::new()
        } else {
            labels.argmax_rows()
        };
        Ok(Self {
            images,
            labels,
            classes,
        })
    }

    /// 把前`n`个样本拆出来，返回 (前 n 个, 其余)
    pub fn split_at(&self, n: usize) -> Result<(Self, Self), DataError> {
        let len = self.len();
        if n > len {
            return Err(DataError::IndexOutOfBounds { index: n, len });
        }
        let head: Vec<usize> = (0..n).collect();
        let tail: Vec<usize> = (n..len).collect();
        Ok((self.subset(&head), self.subset(&tail)))
    }

    /// 按行号挑选子集
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            images: self.images.select_rows(indices),
            labels: self.labels.select_rows(indices),
            classes: indices.iter().map(|&i| self.classes[i]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// 获取第 index 个样本：(image [784], label [10])
    pub fn get(&self, index: usize) -> Result<(Tensor, Tensor), DataError> {
        if index >= self.len() {
            return Err(DataError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok((self.images.row(index), self.labels.row(index)))
    }

    /// 输入的形状（不含 batch 维度）
    pub fn input_shape(&self) -> Vec<usize> {
        vec![IMAGE_SIZE]
    }

    pub fn images(&self) -> &Tensor {
        &self.images
    }

    pub fn labels(&self) -> &Tensor {
        &self.labels
    }

    /// 每个样本的类别号
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }
}

/// 读取训练、验证、测试三份数据。
/// 验证集取训练文件的前`validation_size`张，其余作训练集；训练集不能因此为空
pub fn read_data_sets(
    data_dir: impl AsRef<Path>,
    validation_size: usize,
) -> Result<MnistSplits, DataError> {
    let data_dir = data_dir.as_ref();
    let full_train = MnistDataset::load(data_dir, true)?;
    if validation_size >= full_train.len() {
        return Err(DataError::InvalidSplit {
            validation_size,
            len: full_train.len(),
        });
    }
    let test = MnistDataset::load(data_dir, false)?;
    let (validation, train) = full_train.split_at(validation_size)?;
    log::info!(
        "MNIST 数据就绪：训练 {}，验证 {}，测试 {}",
        train.len(),
        validation.len(),
        test.len()
    );
    Ok(MnistSplits {
        train,
        validation,
        test,
    })
}

/// 获取默认数据目录
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("/tmp/tensorflow/mnist/input_data")
}

/// 优先返回未压缩文件，其次`.gz`
fn locate_file(data_dir: &Path, base_name: &str) -> Result<PathBuf, DataError> {
    let uncompressed_path = data_dir.join(base_name);
    if uncompressed_path.exists() {
        return Ok(uncompressed_path);
    }
    let gz_path = data_dir.join(format!("{base_name}.gz"));
    if gz_path.exists() {
        return Ok(gz_path);
    }
    Err(DataError::FileNotFound(uncompressed_path))
}

fn open_idx(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    Ok(if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

fn read_word(reader: &mut dyn Read) -> Result<u32, DataError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| DataError::FormatError(format!("读取头部失败: {e}")))?;
    Ok(u32::from_be_bytes(buf))
}

/// 先单独校验 magic number，再读其余`N - 1`个头部字段
fn read_header<const N: usize>(reader: &mut dyn Read, magic: u32) -> Result<[u32; N], DataError> {
    let found = read_word(reader)?;
    if found != magic {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {found} (期望 {magic})"
        )));
    }
    let mut words = [magic; N];
    for word in words.iter_mut().skip(1) {
        *word = read_word(reader)?;
    }
    Ok(words)
}

/// 读取头部声明的`len`字节数据。按实际内容增长缓冲区，头部数量被篡改时不会预先分配巨量内存
fn read_body(reader: &mut dyn Read, len: u64, what: &str) -> Result<Vec<u8>, DataError> {
    let mut body = Vec::new();
    reader
        .take(len)
        .read_to_end(&mut body)
        .map_err(|e| DataError::FormatError(format!("读取{what}数据失败: {e}")))?;
    if (body.len() as u64) < len {
        return Err(DataError::FormatError(format!(
            "读取{what}数据失败: 头部声明{len}字节，文件只有{}字节",
            body.len()
        )));
    }
    Ok(body)
}

/// 解析 IDX 图像文件，返回未归一化的 [N, 784]
///
/// IDX 格式（大端序）：
/// - [0-3] magic number (0x00000803 = 2051)
/// - [4-7] number of images
/// - [8-11] number of rows
/// - [12-15] number of columns
/// - [16+] pixel data (unsigned byte)
fn parse_idx_images(path: &Path) -> Result<Tensor, DataError> {
    let mut reader = open_idx(path)?;
    let [_, num_images, num_rows, num_cols] = read_header::<4>(&mut reader, IMAGES_MAGIC)?;
    if num_rows != 28 || num_cols != 28 {
        return Err(DataError::FormatError(format!(
            "无效的图像尺寸: {num_rows}x{num_cols} (期望 28x28)"
        )));
    }

    let pixels = read_body(
        &mut reader,
        u64::from(num_images) * IMAGE_SIZE as u64,
        "像素",
    )?;
    let num_images = num_images as usize;

    let data: Vec<f32> = pixels.into_iter().map(f32::from).collect();
    Ok(Tensor::from_vec(data, &[num_images, IMAGE_SIZE]))
}

/// 解析 IDX 标签文件，返回类别号
///
/// IDX 格式（大端序）：
/// - [0-3] magic number (0x00000801 = 2049)
/// - [4-7] number of labels
/// - [8+] label data (unsigned byte, 0-9)
fn parse_idx_labels(path: &Path) -> Result<Vec<usize>, DataError> {
    let mut reader = open_idx(path)?;
    let [_, num_labels] = read_header::<2>(&mut reader, LABELS_MAGIC)?;

    let labels = read_body(&mut reader, u64::from(num_labels), "标签")?;

    if let Some(&bad) = labels.iter().find(|&&l| usize::from(l) >= NUM_CLASSES) {
        return Err(DataError::FormatError(format!("无效的标签值: {bad}")));
    }
    Ok(labels.into_iter().map(usize::from).collect())
}
