//! MNIST 数据集单元测试（使用临时目录中合成的 IDX 文件）

use std::fs;

use approx::assert_abs_diff_eq;

use super::{fresh_temp_dir, idx_image_bytes, idx_label_bytes, write_file, write_mnist_files};
use crate::assert_err;
use crate::data::{DataError, MnistDataset, read_data_sets};
use crate::tensor::Tensor;

#[test]
fn test_load_raw_files() {
    let dir = fresh_temp_dir("load_raw");
    write_mnist_files(&dir, &[3, 1, 4, 1, 5], &[9, 2], false);

    let train = MnistDataset::load(&dir, true).unwrap();
    assert_eq!(train.len(), 5);
    assert_eq!(train.images().shape(), &[5, 784]);
    assert_eq!(train.labels().shape(), &[5, 10]);
    assert_eq!(train.classes(), &[3, 1, 4, 1, 5]);
    assert_eq!(train.input_shape(), vec![784]);

    // 第 i 张图像素为 i*10，归一化后为 i*10/255
    let (image, label) = train.get(3).unwrap();
    assert_eq!(image.shape(), &[784]);
    assert_abs_diff_eq!(image[[0]], 30.0 / 255.0, epsilon = 1e-6);
    assert_abs_diff_eq!(image[[783]], 30.0 / 255.0, epsilon = 1e-6);
    assert_eq!(label[[1]], 1.0);
    assert_abs_diff_eq!(label.sum(), 1.0);

    let test = MnistDataset::load(&dir, false).unwrap();
    assert_eq!(test.classes(), &[9, 2]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_gz_files() {
    let dir = fresh_temp_dir("load_gz");
    write_mnist_files(&dir, &[0, 7], &[8], true);

    let train = MnistDataset::load(&dir, true).unwrap();
    assert_eq!(train.classes(), &[0, 7]);
    assert_abs_diff_eq!(train.images()[[1, 100]], 10.0 / 255.0, epsilon = 1e-6);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_files() {
    let dir = fresh_temp_dir("missing");
    assert_err!(MnistDataset::load(&dir, true), DataError::FileNotFound(_));

    // 只有图像没有标签
    write_file(&dir, "t10k-images-idx3-ubyte", &idx_image_bytes(2), false);
    assert_err!(
        MnistDataset::load(&dir, false),
        DataError::FileNotFound(path) if path.ends_with("t10k-labels-idx1-ubyte")
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_bad_magic_and_truncated_files() {
    let dir = fresh_temp_dir("bad_format");
    // 图像文件与标签文件互换：标签文件（10 字节）比图像头部（16 字节）还短，仍应先报 magic 错误
    write_file(&dir, "train-images-idx3-ubyte", &idx_label_bytes(&[1, 2]), false);
    write_file(&dir, "train-labels-idx1-ubyte", &idx_image_bytes(2), false);
    assert_err!(
        MnistDataset::load(&dir, true),
        DataError::FormatError(msg) if msg.contains("magic")
    );

    // 像素数据被截断
    let mut images = idx_image_bytes(2);
    images.truncate(100);
    write_file(&dir, "train-images-idx3-ubyte", &images, false);
    write_file(&dir, "train-labels-idx1-ubyte", &idx_label_bytes(&[1, 2]), false);
    assert_err!(
        MnistDataset::load(&dir, true),
        DataError::FormatError(msg) if msg.contains("像素")
    );

    // 数量不一致
    write_file(&dir, "train-images-idx3-ubyte", &idx_image_bytes(3), false);
    assert_err!(
        MnistDataset::load(&dir, true),
        DataError::FormatError(msg) if msg.contains("不一致")
    );

    // 标签超出 0-9
    write_file(&dir, "train-images-idx3-ubyte", &idx_image_bytes(2), false);
    write_file(&dir, "train-labels-idx1-ubyte", &idx_label_bytes(&[1, 12]), false);
    assert_err!(
        MnistDataset::load(&dir, true),
        DataError::FormatError(msg) if msg.contains("12")
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_read_data_sets_splits_validation_from_front() {
    let dir = fresh_temp_dir("splits");
    write_mnist_files(&dir, &[0, 1, 2, 3, 4, 5], &[6, 7], false);

    let splits = read_data_sets(&dir, 2).unwrap();
    assert_eq!(splits.validation.classes(), &[0, 1]);
    assert_eq!(splits.train.classes(), &[2, 3, 4, 5]);
    assert_eq!(splits.test.classes(), &[6, 7]);
    // 训练集第 0 张原本是文件中的第 2 张
    assert_abs_diff_eq!(splits.train.images()[[0, 0]], 20.0 / 255.0, epsilon = 1e-6);

    // 验证集不能吃掉全部训练样本
    assert_err!(
        read_data_sets(&dir, 6),
        DataError::InvalidSplit { validation_size: 6, len: 6 }
    );
    assert_err!(
        read_data_sets(&dir, 7),
        DataError::InvalidSplit { validation_size: 7, len: 6 }
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_from_tensors() {
    let images = Tensor::zeros(&[3, 784]);
    let labels = Tensor::one_hot_rows(4, 10, 3);
    let dataset = MnistDataset::from_tensors(images, labels).unwrap();
    assert_eq!(dataset.classes(), &[4, 4, 4]);

    assert_err!(
        MnistDataset::from_tensors(Tensor::zeros(&[3, 28, 28]), Tensor::zeros(&[3, 10])),
        DataError::ShapeMismatch { .. }
    );
    assert_err!(
        MnistDataset::from_tensors(Tensor::zeros(&[3, 784]), Tensor::zeros(&[2, 10])),
        DataError::ShapeMismatch { expected, .. } if expected == &[3, 10]
    );
    assert_err!(
        dataset.get(3),
        DataError::IndexOutOfBounds { index: 3, len: 3 }
    );

    let (head, tail) = dataset.split_at(1).unwrap();
    assert_eq!((head.len(), tail.len()), (1, 2));
    assert_err!(
        dataset.split_at(4),
        DataError::IndexOutOfBounds { index: 4, len: 3 }
    );
}

#[test]
fn test_header_count_larger_than_file() {
    let dir = fresh_temp_dir("huge_count");
    // 头部声明 u32::MAX 张图像，实际只有 1 张
    let mut images = idx_image_bytes(1);
    images[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
    write_file(&dir, "train-images-idx3-ubyte", &images, false);
    write_file(&dir, "train-labels-idx1-ubyte", &idx_label_bytes(&[1]), false);
    assert_err!(
        MnistDataset::load(&dir, true),
        DataError::FormatError(msg) if msg.contains("像素") && msg.contains("784")
    );

    let mut labels = idx_label_bytes(&[1]);
    labels[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
    write_file(&dir, "train-images-idx3-ubyte", &idx_image_bytes(1), false);
    write_file(&dir, "train-labels-idx1-ubyte", &labels, false);
    assert_err!(
        MnistDataset::load(&dir, true),
        DataError::FormatError(msg) if msg.contains("标签")
    );

    fs::remove_dir_all(&dir).unwrap();
}
