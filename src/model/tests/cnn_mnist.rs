//! CnnMnist 单元测试（batch 取 2，保持测试速度）

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assert_err;
use crate::model::{CnnMnist, InputMode, KEEP_PROB_EVAL, KEEP_PROB_TRAIN};
use crate::nn::{Adam, Graph, GraphError, Module, ParamSpec};
use crate::tensor::Tensor;

fn random_images(rows: usize, seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::normal_with_rng(0.5, 0.25, &[rows, 784], &mut rng)
}

fn labels_of(classes: &[usize]) -> Tensor {
    let mut labels = Tensor::zeros(&[classes.len(), 10]);
    for (i, &c) in classes.iter().enumerate() {
        labels[[i, c]] = 1.0;
    }
    labels
}

#[test]
fn test_parameter_names_and_shapes() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(1);
    let model = CnnMnist::new(&graph, 2, InputMode::Placeholder)?;

    let spec = |name: &str, shape: &[usize]| ParamSpec {
        name: name.to_string(),
        shape: shape.to_vec(),
    };
    assert_eq!(
        graph.param_specs(),
        vec![
            spec("conv1_K", &[32, 1, 5, 5]),
            spec("conv1_b", &[1, 32]),
            spec("conv2_K", &[64, 32, 5, 5]),
            spec("conv2_b", &[1, 64]),
            spec("fc1_W", &[3136, 1024]),
            spec("fc1_b", &[1, 1024]),
            spec("fc2_W", &[1024, 10]),
            spec("fc2_b", &[1, 10]),
        ]
    );
    assert_eq!(model.num_params(), 8);

    // 偏置初始化为 0.1，权重在 ±0.2 以内
    let conv1_b = model.parameters()[1].value()?.unwrap();
    assert!(conv1_b.to_vec().iter().all(|&b| b == 0.1));
    let fc2_w = model.parameters()[6].value()?.unwrap();
    assert!(fc2_w.to_vec().iter().all(|w| w.abs() <= 0.2));
    Ok(())
}

#[test]
fn test_logits_probabilities_and_accuracy() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(2);
    let model = CnnMnist::new(&graph, 2, InputMode::Placeholder)?;
    let images = random_images(2, 3);
    let labels = labels_of(&[3, 7]);

    let logits = model.logits(&images, KEEP_PROB_EVAL)?;
    assert_eq!(logits.shape(), &[2, 10]);

    let probs = model.probabilities(&images)?;
    for i in 0..2 {
        assert_abs_diff_eq!(probs.row(i).sum(), 1.0, epsilon = 1e-5);
    }
    assert_eq!(probs.argmax_rows(), logits.argmax_rows());

    let mask = model.correct_mask(&images, &labels)?;
    let accuracy = model.accuracy(&images, &labels)?;
    assert!((0.0..=1.0).contains(&accuracy));
    assert_abs_diff_eq!(
        accuracy,
        mask.iter().filter(|&&c| c).count() as f32 / 2.0
    );

    // 以模型自己的预测作标签，准确率为 1
    let predicted = labels_of(&logits.argmax_rows());
    assert_abs_diff_eq!(model.accuracy(&images, &predicted)?, 1.0);

    assert!(model.loss(&images, &labels, KEEP_PROB_EVAL)? > 0.0);
    Ok(())
}

#[test]
fn test_eval_is_deterministic_and_dropout_is_not() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(4);
    let model = CnnMnist::new(&graph, 2, InputMode::Placeholder)?;
    let images = random_images(2, 5);

    let a = model.logits(&images, KEEP_PROB_EVAL)?;
    let b = model.logits(&images, KEEP_PROB_EVAL)?;
    assert_eq!(a, b);

    let c = model.logits(&images, KEEP_PROB_TRAIN)?;
    let d = model.logits(&images, KEEP_PROB_TRAIN)?;
    assert_ne!(c, d);
    Ok(())
}

#[test]
fn test_assign_input_rejects_wrong_shape() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(6);
    let model = CnnMnist::new(&graph, 2, InputMode::Differentiable)?;
    let images = random_images(2, 7);
    model.assign_input(&images)?;

    assert_err!(
        model.assign_input(&Tensor::zeros(&[3, 784])),
        GraphError::ShapeMismatch { expected, .. } if expected == &[2, 784]
    );
    assert_eq!(model.input().value()?, Some(images));

    assert_err!(
        model.logits(&Tensor::zeros(&[2, 28, 28]), KEEP_PROB_EVAL),
        GraphError::ShapeMismatch { .. }
    );
    Ok(())
}

#[test]
fn test_input_gradient_requires_differentiable_mode() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(8);
    let model = CnnMnist::new(&graph, 2, InputMode::Placeholder)?;
    assert_err!(
        model.input_gradient(&random_images(2, 9), &labels_of(&[0, 1]), KEEP_PROB_EVAL),
        GraphError::InvalidOperation(msg) if msg.contains("Differentiable")
    );
    Ok(())
}

#[test]
fn test_input_gradient_matches_numerical() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(10);
    let model = CnnMnist::new(&graph, 2, InputMode::Differentiable)?;
    model.freeze()?;
    let images = random_images(2, 11);
    let labels = labels_of(&[5, 5]);

    let grad = model.input_gradient(&images, &labels, KEEP_PROB_EVAL)?;
    assert_eq!(grad.shape(), &[2, 784]);
    // 冻结后参数没有梯度
    for param in model.parameters() {
        assert!(param.grad()?.is_none());
    }

    // 取梯度绝对值最大的几个像素做中心差分
    let mut order: Vec<usize> = (0..grad.size()).collect();
    order.sort_by(|&a, &b| grad.data_as_slice()[b].abs().total_cmp(&grad.data_as_slice()[a].abs()));
    let eps = 1e-2;
    for &idx in order.iter().take(3) {
        let mut plus = images.clone();
        plus.data_as_mut_slice()[idx] += eps;
        let mut minus = images.clone();
        minus.data_as_mut_slice()[idx] -= eps;
        let numerical = (model.loss(&plus, &labels, KEEP_PROB_EVAL)?
            - model.loss(&minus, &labels, KEEP_PROB_EVAL)?)
            / (2.0 * eps);
        let analytic = grad.data_as_slice()[idx];
        assert!(
            (numerical - analytic).abs() <= 0.1 * analytic.abs() + 1e-3,
            "像素{idx}：数值梯度{numerical}，解析梯度{analytic}"
        );
    }
    Ok(())
}

#[test]
fn test_train_step_reduces_loss() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(12);
    let model = CnnMnist::new(&graph, 2, InputMode::Placeholder)?;
    let mut adam = Adam::new(&graph, &model.parameters(), 1e-3);
    let images = random_images(2, 13);
    let labels = labels_of(&[1, 8]);

    let before = model.loss(&images, &labels, KEEP_PROB_EVAL)?;
    for _ in 0..5 {
        model.train_step(&mut adam, &images, &labels, KEEP_PROB_EVAL)?;
    }
    let after = model.loss(&images, &labels, KEEP_PROB_EVAL)?;
    assert!(after < before, "训练后损失应下降：{before} -> {after}");
    Ok(())
}

#[test]
fn test_frozen_model_is_not_updated_by_train_step() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(14);
    let model = CnnMnist::new(&graph, 2, InputMode::Placeholder)?;
    let mut adam = Adam::new(&graph, &model.parameters(), 1e-3);
    model.freeze()?;

    let before = model.parameters()[7].value()?;
    model.train_step(&mut adam, &random_images(2, 15), &labels_of(&[0, 9]), KEEP_PROB_EVAL)?;
    assert_eq!(model.parameters()[7].value()?, before);
    Ok(())
}
