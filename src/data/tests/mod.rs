mod mnist;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

/// 在临时目录下建一个本测试专用的空目录
pub(super) fn fresh_temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mnist_adv_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 第 i 张图的所有像素都取`(i * 10) % 256`，标签取`classes[i]`
pub(super) fn idx_image_bytes(count: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    for word in [2051u32, count as u32, 28, 28] {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    for i in 0..count {
        bytes.extend(std::iter::repeat_n(((i * 10) % 256) as u8, 28 * 28));
    }
    bytes
}

pub(super) fn idx_label_bytes(classes: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2049u32.to_be_bytes());
    bytes.extend_from_slice(&(classes.len() as u32).to_be_bytes());
    bytes.extend_from_slice(classes);
    bytes
}

/// 写文件，`gz`为 true 时写成`<name>.gz`
pub(super) fn write_file(dir: &Path, name: &str, bytes: &[u8], gz: bool) {
    if gz {
        let file = File::create(dir.join(format!("{name}.gz"))).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap();
    } else {
        fs::write(dir.join(name), bytes).unwrap();
    }
}

/// 写一套完整的 MNIST 文件：训练集按`train_classes`，测试集按`test_classes`
pub(super) fn write_mnist_files(dir: &Path, train_classes: &[u8], test_classes: &[u8], gz: bool) {
    write_file(dir, "train-images-idx3-ubyte", &idx_image_bytes(train_classes.len()), gz);
    write_file(dir, "train-labels-idx1-ubyte", &idx_label_bytes(train_classes), gz);
    write_file(dir, "t10k-images-idx3-ubyte", &idx_image_bytes(test_classes.len()), gz);
    write_file(dir, "t10k-labels-idx1-ubyte", &idx_label_bytes(test_classes), gz);
}
