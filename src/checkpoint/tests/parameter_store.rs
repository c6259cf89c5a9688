//! ParameterStore 单元测试

use std::fs;
use std::path::PathBuf;

use crate::assert_err;
use crate::checkpoint::{CheckpointError, CheckpointMeta, ParameterStore};
use crate::nn::{Graph, GraphError, Init, Linear, Module};

fn temp_base(name: &str) -> (PathBuf, ParameterStore) {
    let dir = std::env::temp_dir().join(format!("mnist_adv_ckpt_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    let store = ParameterStore::new(dir.join("nested").join("model.ckpt"));
    (dir, store)
}

fn linear_graph(seed: u64, in_features: usize) -> Result<(Graph, Linear), GraphError> {
    let graph = Graph::new_with_seed(seed);
    let fc = Linear::new(
        &graph,
        in_features,
        2,
        Init::Normal { mean: 0.0, std: 1.0 },
        Init::Normal { mean: 0.0, std: 1.0 },
        "fc",
    )?;
    Ok((graph, fc))
}

#[test]
fn test_save_and_restore_roundtrip() -> Result<(), CheckpointError> {
    let (dir, store) = temp_base("roundtrip");
    let (graph, fc) = linear_graph(1, 3)?;
    let path = store.save(&graph, 100)?;
    assert_eq!(path, store.path_for_step(100));
    assert!(path.to_string_lossy().ends_with("model.ckpt-100"));

    let meta: CheckpointMeta =
        serde_json::from_str(&fs::read_to_string(format!("{}.json", path.display()))?)?;
    assert_eq!(meta.step, 100);
    assert_eq!(meta.params.len(), 2);
    assert_eq!(meta.params[0].name, "fc_W");
    assert_eq!(meta.params[0].shape, vec![3, 2]);

    let (other, other_fc) = linear_graph(2, 3)?;
    assert_ne!(other_fc.weight().value()?, fc.weight().value()?);
    store.restore_step(&other, 100)?;
    for (a, b) in fc.parameters().iter().zip(other_fc.parameters()) {
        assert_eq!(a.value()?, b.value()?);
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_restore_missing_checkpoint() -> Result<(), CheckpointError> {
    let (_dir, store) = temp_base("missing");
    let (graph, fc) = linear_graph(3, 3)?;
    let before = fc.weight().value()?;
    assert_err!(
        store.restore_step(&graph, 200),
        CheckpointError::NotFound(path) if path.ends_with("model.ckpt-200")
    );
    assert_eq!(fc.weight().value()?, before);
    Ok(())
}

#[test]
fn test_restore_into_mismatched_architecture() -> Result<(), CheckpointError> {
    let (dir, store) = temp_base("mismatch");
    let (graph, _) = linear_graph(4, 3)?;
    let path = store.save(&graph, 0)?;

    let (wider, wider_fc) = linear_graph(5, 4)?;
    let before = wider_fc.weight().value()?;
    assert_err!(
        store.restore(&wider, &path),
        CheckpointError::ShapeMismatch { expected, got, .. }
            if expected == &[4, 2] && got == &[3, 2]
    );
    assert_eq!(wider_fc.weight().value()?, before);

    // 没有元数据时由参数文件本身校验
    fs::remove_file(format!("{}.json", path.display()))?;
    assert_err!(
        store.restore(&wider, &path),
        CheckpointError::ShapeMismatch { expected, .. } if expected == &[4, 2]
    );

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_restore_missing_parameter() -> Result<(), CheckpointError> {
    let (dir, store) = temp_base("missing_param");
    let (graph, _) = linear_graph(6, 3)?;
    let path = store.save(&graph, 0)?;

    // 多出一个检查点里没有的参数
    let (bigger, _) = linear_graph(7, 3)?;
    bigger.parameter(&[1, 1], Init::Zeros, "extra")?;
    assert_err!(
        store.restore(&bigger, &path),
        CheckpointError::MissingParameter(names) if names == "extra"
    );

    fs::remove_file(format!("{}.json", path.display()))?;
    assert_err!(
        store.restore(&bigger, &path),
        CheckpointError::MissingParameter(names) if names == "extra"
    );

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_restore_corrupt_files() -> Result<(), CheckpointError> {
    let (dir, store) = temp_base("corrupt");
    let (graph, _) = linear_graph(8, 3)?;
    let path = store.save(&graph, 1)?;

    fs::write(format!("{}.json", path.display()), "not json")?;
    assert_err!(store.restore(&graph, &path), CheckpointError::Metadata(_));

    fs::remove_file(format!("{}.json", path.display()))?;
    fs::write(&path, b"XXXXjunk")?;
    assert_err!(
        store.restore(&graph, &path),
        CheckpointError::Format(msg) if msg.contains("魔数")
    );

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_list_steps_keeps_every_checkpoint() -> Result<(), CheckpointError> {
    let (dir, store) = temp_base("list");
    assert!(store.list_steps()?.is_empty());

    let (graph, _) = linear_graph(9, 3)?;
    for step in [200, 0, 100] {
        store.save(&graph, step)?;
    }
    assert_eq!(store.list_steps()?, vec![0, 100, 200]);

    fs::remove_dir_all(&dir)?;
    Ok(())
}
