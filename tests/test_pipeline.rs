/*
 * @Description  : 端到端集成测试：合成 IDX 数据 → 训练并保存检查点 → 带掩码测试评估 → 恢复检查点生成对抗样本
 */

use std::fs;
use std::path::{Path, PathBuf};

use mnist_adv::adversarial::{AttackConfig, run_attack_mode};
use mnist_adv::config::{Args, Mode};
use mnist_adv::data::{BatchSource, MnistBatchSource, read_data_sets};
use mnist_adv::errors::RunError;
use mnist_adv::train::{TrainConfig, run_train_mode};

/// 第 i 张图在第`classes[i]`行（28 个像素）涂黑，其余为白
fn write_idx(dir: &Path, prefix: &str, classes: &[u8]) {
    let mut images = Vec::new();
    for word in [2051u32, classes.len() as u32, 28, 28] {
        images.extend_from_slice(&word.to_be_bytes());
    }
    for &class in classes {
        let mut pixels = [0u8; 784];
        let row = usize::from(class) * 2 + 4;
        pixels[row * 28..(row + 1) * 28].fill(255);
        images.extend_from_slice(&pixels);
    }
    fs::write(dir.join(format!("{prefix}-images-idx3-ubyte")), images).unwrap();

    let mut labels = Vec::new();
    labels.extend_from_slice(&2049u32.to_be_bytes());
    labels.extend_from_slice(&(classes.len() as u32).to_be_bytes());
    labels.extend_from_slice(classes);
    fs::write(dir.join(format!("{prefix}-labels-idx1-ubyte")), labels).unwrap();
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mnist_adv_it_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_train_then_attack_on_synthetic_data() -> Result<(), RunError> {
    let dir = temp_dir("pipeline");
    let train_classes: Vec<u8> = (0..24).map(|i| (i % 10) as u8).collect();
    write_idx(&dir, "train", &train_classes);
    write_idx(&dir, "t10k", &[2, 5, 7, 2, 0, 1]);

    let dir_arg = dir.to_string_lossy().into_owned();
    let ckpt_arg = dir.join("ckpt").join("mnist_deep.ckpt").to_string_lossy().into_owned();
    let args = Args::try_parse_normalized([
        "mnist_adv",
        "--data_dir",
        &dir_arg,
        "-batch_size",
        "4",
        "--checkpoint",
        &ckpt_arg,
        "--validation_size",
        "4",
        "--train_steps",
        "3",
        "--no_plots",
    ])
    .unwrap();
    let mut config = args.to_run_config();
    assert_eq!(config.mode, Mode::Train);
    config.train = TrainConfig {
        log_every: 1,
        checkpoint_every: 2,
        ..config.train
    };

    let splits = read_data_sets(&config.data_dir, config.validation_size)?;
    assert_eq!(splits.train.len(), 20);
    assert_eq!(splits.validation.len(), 4);
    let mut source = MnistBatchSource::new(splits.train, config.seed);

    let report = run_train_mode(&config, &mut source, Some(&splits.test))?;
    assert_eq!(report.train_accuracies.len(), 3);
    assert!(
        report
            .train_accuracies
            .iter()
            .all(|&(_, acc)| (0.0..=1.0).contains(&acc))
    );
    assert_eq!(report.checkpoints.len(), 2);
    assert!(report.checkpoints[1].to_string_lossy().ends_with("mnist_deep.ckpt-2"));
    assert!(report.final_loss.is_some_and(f32::is_finite));
    // 6 张测试图，batch 4，最后一批补 2 行
    let test_accuracy = report.test_accuracy.unwrap();
    assert!((0.0..=1.0).contains(&test_accuracy));
    assert_eq!((test_accuracy * 6.0).round() / 6.0, test_accuracy);

    // 对抗模式：恢复第 2 步的检查点，把“2”推向 5
    config.mode = Mode::Adversarial;
    config.restore_step = 2;
    config.attack = AttackConfig {
        iterations: 3,
        log_index: 1,
        snapshot_dir: Some(dir.join("plots")),
        ..AttackConfig::default()
    };
    let twos = source.label_count(2);
    assert_eq!(twos, 2);

    // 训练集（去掉验证集后）只有 2 张“2”，batch 取 2
    config.batch_size = 2;
    let attack = run_attack_mode(&config, &mut source)?;
    assert_eq!(attack.steps.len(), 3);
    assert_eq!(attack.final_images.shape(), &[2, 784]);
    for i in 0..3 {
        assert!(dir.join("plots").join(format!("two_adv{i}.png")).exists());
    }

    fs::remove_dir_all(&dir).unwrap();
    Ok(())
}

#[test]
fn test_missing_dataset_fails_at_load() {
    let dir = temp_dir("no_data");
    assert!(matches!(
        read_data_sets(&dir, 0).map_err(RunError::from),
        Err(RunError::Data(_))
    ));
    fs::remove_dir_all(&dir).unwrap();
}
