/*
 * @Description  : ParameterStore - 以`<base>-<step>`命名的检查点读写
 *
 * 所有历史检查点都保留，不做清理。
 */

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::CheckpointError;
use crate::nn::{Graph, ParamSpec};

pub const DEFAULT_CHECKPOINT_BASE: &str = "model_checkpoints/mnist_deep.ckpt";

/// 检查点元数据（写入`<base>-<step>.json`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub step: usize,
    pub params: Vec<ParamMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMeta {
    pub name: String,
    pub shape: Vec<usize>,
}

impl From<ParamSpec> for ParamMeta {
    fn from(spec: ParamSpec) -> Self {
        Self {
            name: spec.name,
            shape: spec.shape,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterStore {
    base: PathBuf,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_BASE)
    }
}

impl ParameterStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `<base>-<step>`
    pub fn path_for_step(&self, step: usize) -> PathBuf {
        let mut path: OsString = self.base.clone().into_os_string();
        path.push(format!("-{step}"));
        PathBuf::from(path)
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut meta: OsString = path.as_os_str().to_owned();
        meta.push(".json");
        PathBuf::from(meta)
    }

    /// 保存`graph`的全部参数，返回参数文件路径。父目录不存在时自动创建
    pub fn save(&self, graph: &Graph, step: usize) -> Result<PathBuf, CheckpointError> {
        let path = self.path_for_step(step);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        graph.save_params(&path)?;

        let meta = CheckpointMeta {
            step,
            params: graph.param_specs().into_iter().map(ParamMeta::from).collect(),
        };
        fs::write(Self::meta_path(&path), serde_json::to_string_pretty(&meta)?)?;
        log::info!("已保存检查点：{}", path.display());
        Ok(path)
    }

    /// 把`path`处的检查点载入`graph`。
    /// 文件不存在、格式无效、形状不一致或缺少参数时报错，且图中参数保持不变
    pub fn restore(&self, graph: &Graph, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CheckpointError::NotFound(path.to_path_buf()));
        }

        let meta_path = Self::meta_path(path);
        if meta_path.is_file() {
            let meta: CheckpointMeta = serde_json::from_str(&fs::read_to_string(&meta_path)?)?;
            Self::check_meta(graph, &meta)?;
        } else {
            log::warn!("检查点{}缺少元数据文件，仅按参数文件校验", path.display());
        }

        graph.load_params(path)?;
        log::info!("已恢复检查点：{}", path.display());
        Ok(())
    }

    /// 恢复`<base>-<step>`
    pub fn restore_step(&self, graph: &Graph, step: usize) -> Result<(), CheckpointError> {
        self.restore(graph, self.path_for_step(step))
    }

    /// 已保存的所有步数（升序）
    pub fn list_steps(&self) -> Result<Vec<usize>, CheckpointError> {
        let dir = match self.base.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Some(stem) = self.base.file_name().map(|s| s.to_string_lossy().into_owned()) else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = format!("{stem}-");
        let mut steps = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(step) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.parse::<usize>().ok())
            {
                steps.push(step);
            }
        }
        steps.sort_unstable();
        Ok(steps)
    }

    fn check_meta(graph: &Graph, meta: &CheckpointMeta) -> Result<(), CheckpointError> {
        let mut missing = Vec::new();
        for spec in graph.param_specs() {
            match meta.params.iter().find(|p| p.name == spec.name) {
                Some(stored) if stored.shape != spec.shape => {
                    return Err(CheckpointError::ShapeMismatch {
                        detail: format!("参数 {} 的形状与模型不一致", spec.name),
                        expected: spec.shape,
                        got: stored.shape.clone(),
                    });
                }
                Some(_) => {}
                None => missing.push(spec.name),
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckpointError::MissingParameter(missing.join(", ")))
        }
    }
}
