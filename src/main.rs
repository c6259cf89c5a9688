/*
 * @Description  : 命令行入口：默认训练分类器，`--create_adv`时生成对抗样本
 */

use std::process::ExitCode;

use mnist_adv::adversarial::run_attack_mode;
use mnist_adv::config::{Args, Mode, RunConfig};
use mnist_adv::data::{MnistBatchSource, read_data_sets};
use mnist_adv::errors::RunError;
use mnist_adv::train::run_train_mode;

fn run(config: &RunConfig) -> Result<(), RunError> {
    let splits = read_data_sets(&config.data_dir, config.validation_size)?;
    let mut source = MnistBatchSource::new(splits.train, config.seed);
    match config.mode {
        Mode::Train => {
            run_train_mode(config, &mut source, Some(&splits.test))?;
        }
        Mode::Adversarial => {
            run_attack_mode(config, &mut source)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse_normalized().to_run_config();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
