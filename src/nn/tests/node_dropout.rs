use crate::assert_err;
use crate::nn::{Graph, GraphError, VarLossOps, VarRegularizationOps, VarShapeOps};
use crate::tensor::Tensor;

#[test]
fn test_dropout_keep_prob_one_is_identity() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[2, 3], Some("x"))?;
    let keep_prob = graph.input(&[1, 1], Some("keep_prob"))?;
    let h = x.dropout(&keep_prob)?;

    let data = Tensor::new(&[1., -2., 3., 4., 5., -6.], &[2, 3]);
    x.set_value(&data)?;
    keep_prob.set_value(&Tensor::new(&[1.0], &[1, 1]))?;
    h.forward()?;
    assert_eq!(h.value()?, Some(data));
    Ok(())
}

#[test]
fn test_dropout_scales_kept_elements() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[10, 100], Some("x"))?;
    let keep_prob = graph.input(&[1, 1], Some("keep_prob"))?;
    let h = x.dropout(&keep_prob)?;
    x.set_value(&Tensor::ones(&[10, 100]))?;
    keep_prob.set_value(&Tensor::new(&[0.5], &[1, 1]))?;
    h.forward()?;

    let out = h.value()?.expect("应有值");
    assert!(out.data_as_slice().iter().all(|&v| v == 0.0 || v == 2.0));
    let kept = out.data_as_slice().iter().filter(|&&v| v == 2.0).count();
    assert!((400..600).contains(&kept), "保留了{kept}个元素");
    Ok(())
}

#[test]
fn test_dropout_grad_uses_same_mask() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(1);
    let x = graph.differentiable_input(&[1, 8], Some("x"))?;
    let keep_prob = graph.input(&[1, 1], Some("keep_prob"))?;
    let y = graph.target(&[1, 8], Some("y"))?;
    let h = x.dropout(&keep_prob)?;
    let loss = h.reshape(&[1, 8])?.cross_entropy(&y)?;
    x.set_value(&Tensor::ones(&[1, 8]))?;
    keep_prob.set_value(&Tensor::new(&[0.5], &[1, 1]))?;
    let mut labels = Tensor::zeros(&[1, 8]);
    labels[[0, 0]] = 1.;
    y.set_value(&labels)?;

    loss.backward()?;
    let out = h.value()?.expect("应有值");
    let grad = x.grad()?.expect("应有梯度");
    for (v, g) in out.data_as_slice().iter().zip(grad.data_as_slice()) {
        if *v == 0.0 {
            assert_eq!(*g, 0.0);
        }
    }
    Ok(())
}

#[test]
fn test_dropout_invalid_keep_prob() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[1, 2], Some("x"))?;
    let keep_prob = graph.input(&[1, 1], Some("keep_prob"))?;
    let h = x.dropout(&keep_prob)?;
    x.set_value(&Tensor::ones(&[1, 2]))?;
    for bad in [0.0, 1.5, -0.1] {
        keep_prob.set_value(&Tensor::new(&[bad], &[1, 1]))?;
        assert_err!(h.forward(), GraphError::InvalidOperation(msg) if msg.contains("keep_prob"));
    }

    let wide = graph.input(&[1, 2], Some("wide_keep_prob"))?;
    assert_err!(x.dropout(&wide), GraphError::ShapeMismatch { .. });
    Ok(())
}
