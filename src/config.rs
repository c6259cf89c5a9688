/*
 * @Description  : 命令行参数与运行配置
 *
 * 参数名沿用下划线形式（`--data_dir`、`--batch_size`...），
 * 另外接受单横线的`-batch_size`写法。
 */

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueHint};

use crate::adversarial::AttackConfig;
use crate::checkpoint::DEFAULT_CHECKPOINT_BASE;
use crate::data::DEFAULT_VALIDATION_SIZE;
use crate::train::TrainConfig;

/// 需要从单横线改写为双横线的长参数
const LEGACY_SINGLE_DASH_FLAGS: [&str; 1] = ["batch_size"];

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about = "MNIST 卷积分类器训练，以及针对该分类器的对抗样本生成")]
pub struct Args {
    /// MNIST 数据目录（IDX 文件，可为 .gz）
    #[arg(long = "data_dir", default_value = "/tmp/tensorflow/mnist/input_data", value_hint = ValueHint::DirPath)]
    pub data_dir: PathBuf,

    /// 生成对抗样本（默认为训练）
    #[arg(long = "create_adv")]
    pub create_adv: bool,

    #[arg(long = "batch_size", default_value_t = 50)]
    pub batch_size: usize,

    /// 检查点路径前缀，实际文件为`<checkpoint>-<step>`
    #[arg(long = "checkpoint", default_value = DEFAULT_CHECKPOINT_BASE, value_hint = ValueHint::FilePath)]
    pub checkpoint: PathBuf,

    /// 对抗模式下恢复的检查点步数
    #[arg(long = "restore_step", default_value_t = 200)]
    pub restore_step: usize,

    #[arg(long = "train_steps", default_value_t = 20000)]
    pub train_steps: usize,

    /// 训练用 Adam 的学习率
    #[arg(long = "learning_rate", default_value_t = 1e-4)]
    pub learning_rate: f32,

    #[arg(long = "adv_steps", default_value_t = 50)]
    pub adv_steps: usize,

    /// 对抗样本梯度步长
    #[arg(long = "adv_lr", default_value_t = 0.1)]
    pub adv_lr: f32,

    /// 对抗样本的起始类别
    #[arg(long = "source_class", default_value_t = 2)]
    pub source_class: usize,

    #[arg(long = "target_class", default_value_t = 5)]
    pub target_class: usize,

    /// 记录概率与保存快照的样本下标
    #[arg(long = "log_index", default_value_t = 2)]
    pub log_index: usize,

    #[arg(long = "plots_dir", default_value = "plots", value_hint = ValueHint::DirPath)]
    pub plots_dir: PathBuf,

    /// 不保存快照图像
    #[arg(long = "no_plots")]
    pub no_plots: bool,

    /// 从训练文件头部划出的验证集大小
    #[arg(long = "validation_size", default_value_t = DEFAULT_VALIDATION_SIZE)]
    pub validation_size: usize,

    /// 数据打乱、参数初始化与 dropout 的随机种子
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Adversarial,
}

/// 一次运行所需的全部配置
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub mode: Mode,
    pub data_dir: PathBuf,
    pub validation_size: usize,
    pub batch_size: usize,
    pub checkpoint_base: PathBuf,
    pub restore_step: usize,
    pub source_class: usize,
    pub seed: u64,
    pub train: TrainConfig,
    pub attack: AttackConfig,
}

/// 把`-batch_size`（及`-batch_size=N`）改写为`--batch_size`，其余参数原样保留
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let is_legacy = text.strip_prefix('-').is_some_and(|rest| {
                !rest.starts_with('-')
                    && LEGACY_SINGLE_DASH_FLAGS
                        .iter()
                        .any(|flag| rest == *flag || rest.starts_with(&format!("{flag}=")))
            });
            if is_legacy {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

impl Args {
    /// 规范化旧式参数后解析；解析失败时由 clap 打印用法并退出
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }

    /// 同上，但解析失败时返回错误
    pub fn try_parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_legacy_flags(args))
    }

    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            mode: if self.create_adv {
                Mode::Adversarial
            } else {
                Mode::Train
            },
            data_dir: self.data_dir.clone(),
            validation_size: self.validation_size,
            batch_size: self.batch_size,
            checkpoint_base: self.checkpoint.clone(),
            restore_step: self.restore_step,
            source_class: self.source_class,
            seed: self.seed,
            train: TrainConfig {
                steps: self.train_steps,
                learning_rate: self.learning_rate,
                ..TrainConfig::default()
            },
            attack: AttackConfig {
                target_class: self.target_class,
                iterations: self.adv_steps,
                learning_rate: self.adv_lr,
                log_index: self.log_index,
                snapshot_dir: (!self.no_plots).then(|| self.plots_dir.clone()),
                ..AttackConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_normalized(["mnist_adv"]).unwrap();
        assert_eq!(args.data_dir, PathBuf::from("/tmp/tensorflow/mnist/input_data"));
        assert!(!args.create_adv);
        assert_eq!(args.batch_size, 50);

        let config = args.to_run_config();
        assert_eq!(config.mode, Mode::Train);
        assert_eq!(config.checkpoint_base, PathBuf::from("model_checkpoints/mnist_deep.ckpt"));
        assert_eq!(config.restore_step, 200);
        assert_eq!(config.source_class, 2);
        assert_eq!(config.validation_size, 5000);
        assert_eq!(config.train, TrainConfig::default());
        assert_eq!(config.attack, AttackConfig::default());
    }

    #[test]
    fn test_single_dash_batch_size() {
        let args = Args::try_parse_normalized(["mnist_adv", "-batch_size", "8", "--create_adv"])
            .unwrap();
        assert_eq!(args.batch_size, 8);
        assert_eq!(args.to_run_config().mode, Mode::Adversarial);

        let args = Args::try_parse_normalized(["mnist_adv", "-batch_size=16"]).unwrap();
        assert_eq!(args.batch_size, 16);

        let args = Args::try_parse_normalized(["mnist_adv", "--batch_size", "32"]).unwrap();
        assert_eq!(args.batch_size, 32);
    }

    #[test]
    fn test_normalize_leaves_other_args_alone() {
        let normalized = normalize_legacy_flags(["prog", "--data_dir", "-batch_size", "-x", "--batch_size=3"]);
        assert_eq!(
            normalized,
            ["prog", "--data_dir", "--batch_size", "-x", "--batch_size=3"]
                .map(OsString::from)
                .to_vec()
        );
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Args::try_parse_normalized(["mnist_adv", "--epochs", "3"]).is_err());
        assert!(Args::try_parse_normalized(["mnist_adv", "-batch_size", "many"]).is_err());
    }

    #[test]
    fn test_attack_flags() {
        let args = Args::try_parse_normalized([
            "mnist_adv",
            "--create_adv",
            "--target_class",
            "7",
            "--adv_lr",
            "0.5",
            "--no_plots",
        ])
        .unwrap();
        let attack = args.to_run_config().attack;
        assert_eq!(attack.target_class, 7);
        assert_eq!(attack.learning_rate, 0.5);
        assert_eq!(attack.snapshot_dir, None);
    }
}
