use crate::assert_err;
use crate::nn::{Graph, GraphError, GraphInner, Init, NodeId, VarMatrixOps};
use crate::tensor::Tensor;

#[test]
fn test_node_ids_and_default_names() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[2, 3], None)?;
    let y = graph.target(&[2, 3], None)?;
    let d = graph.differentiable_input(&[2, 3], None)?;
    let w = graph.parameter(&[3, 4], Init::Zeros, "w")?;

    assert_eq!(x.node_id(), NodeId(1));
    assert_eq!(w.node_id(), NodeId(4));
    assert_eq!(x.name()?, "input_1");
    assert_eq!(y.name()?, "target_1");
    assert_eq!(d.name()?, "diff_input_1");
    assert_eq!(w.name()?, "w");
    assert_eq!(graph.inner().nodes_count(), 4);
    Ok(())
}

#[test]
fn test_duplicate_node_name() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    graph.parameter(&[1, 1], Init::Zeros, "b")?;
    assert_err!(
        graph.parameter(&[1, 1], Init::Zeros, "b"),
        GraphError::DuplicateNodeName(_)
    );
    Ok(())
}

#[test]
fn test_input_shape_is_fixed() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[2, 2], Some("x"))?;
    assert_err!(
        x.set_value(&Tensor::zeros(&[3, 2])),
        GraphError::ShapeMismatch { expected, got, .. } if expected == &[2, 2] && got == &[3, 2]
    );
    x.set_value(&Tensor::ones(&[2, 2]))?;
    assert_eq!(x.value()?, Some(Tensor::ones(&[2, 2])));
    Ok(())
}

#[test]
fn test_forward_matmul_add_bias() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[2, 2], Some("x"))?;
    let w = graph.parameter(&[2, 1], Init::Constant(1.0), "w")?;
    let b = graph.parameter(&[1, 1], Init::Constant(0.5), "b")?;
    let y = x.matmul(&w)?.add_bias(&b)?;

    x.set_value(&Tensor::new(&[1., 2., 3., 4.], &[2, 2]))?;
    graph.forward(&y)?;
    assert_eq!(y.value()?, Some(Tensor::new(&[3.5, 7.5], &[2, 1])));

    // 喂入新数据后再次前向传播，结果随之更新
    x.set_value(&Tensor::zeros(&[2, 2]))?;
    y.forward()?;
    assert_eq!(y.value()?, Some(Tensor::new(&[0.5, 0.5], &[2, 1])));
    Ok(())
}

#[test]
fn test_forward_without_input_value() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[1, 2], Some("x"))?;
    let w = graph.parameter(&[2, 2], Init::Zeros, "w")?;
    let y = x.matmul(&w)?;
    assert_err!(y.forward(), GraphError::InvalidOperation(msg) if msg.contains("没有值"));
    Ok(())
}

#[test]
fn test_mismatched_matmul_shapes() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&[2, 3], None)?;
    let w = graph.parameter(&[2, 2], Init::Zeros, "w")?;
    assert_err!(x.matmul(&w), GraphError::ShapeMismatch { .. });
    Ok(())
}

#[test]
fn test_vars_from_different_graphs() -> Result<(), GraphError> {
    let g1 = Graph::new_with_seed(0);
    let g2 = Graph::new_with_seed(0);
    let x = g1.input(&[1, 2], None)?;
    let w = g2.parameter(&[2, 2], Init::Zeros, "w")?;
    assert_err!(x.matmul(&w), GraphError::InvalidOperation(_));
    Ok(())
}

#[test]
fn test_same_seed_gives_same_parameters() -> Result<(), GraphError> {
    let init = Init::TruncatedNormal { std: 0.1 };
    let a = Graph::new_with_seed(3).parameter(&[4, 4], init.clone(), "w")?;
    let b = Graph::new_with_seed(3).parameter(&[4, 4], init, "w")?;
    assert_eq!(a.value()?, b.value()?);
    Ok(())
}

#[test]
fn test_graph_inner_name_and_parents() -> Result<(), GraphError> {
    let mut inner = GraphInner::with_name_and_seed("mnist", 1);
    assert_eq!(inner.name(), "mnist");
    let a = inner.new_input_node(&[1, 2], crate::nn::nodes::InputVariant::Data, None)?;
    let b = inner.new_input_node(&[1, 2], crate::nn::nodes::InputVariant::Data, None)?;
    let sum = inner.new_add_node(&[a, b], Some("sum"))?;
    assert_eq!(inner.get_node_parents(sum)?, vec![a, b]);
    assert_eq!(inner.get_node_children(a)?, vec![sum]);
    assert_err!(inner.get_node_parents(NodeId(99)), GraphError::NodeNotFound(NodeId(99)));
    Ok(())
}
