//! 内置数据集

mod mnist;

pub use mnist::{
    DEFAULT_VALIDATION_SIZE, IMAGE_SIZE, MnistDataset, MnistSplits, NUM_CLASSES, default_data_dir,
    read_data_sets,
};
