/*
 * @Description  : GraphInner 底层参数序列化（save_params/load_params）
 *
 * 职责：纯二进制序列化，只处理参数的读写。
 * 格式：魔数 + 版本 + 参数个数，随后每个参数依次为 名称长度/名称/维数/各维大小/f32 数据（均为小端）。
 * 参数按名称排序写出，同一张图多次保存得到的文件逐字节相同。
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeType;
use crate::tensor::Tensor;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 参数的名称与形状，供检查点元数据使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub shape: Vec<usize>,
}

fn io_err(what: &str) -> impl FnOnce(std::io::Error) -> GraphError + '_ {
    move |e| GraphError::Serialization(format!("{what}: {e}"))
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32, GraphError> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes).map_err(io_err(what))?;
    Ok(u32::from_le_bytes(bytes))
}

impl GraphInner {
    /// 参数文件魔数
    const PARAMS_MAGIC: &'static [u8; 4] = b"MNPR";
    /// 参数文件版本
    const PARAMS_VERSION: u32 = 1;

    /// 按名称排序的参数节点
    fn sorted_param_nodes(&self) -> Vec<(NodeId, &str)> {
        let mut params: Vec<(NodeId, &str)> = self
            .nodes
            .iter()
            .filter(|(_, node)| matches!(node.node_type(), NodeType::Parameter(_)))
            .map(|(&id, node)| (id, node.name()))
            .collect();
        params.sort_by(|a, b| a.1.cmp(b.1));
        params
    }

    /// 所有参数的名称和形状（按名称排序）
    pub fn param_specs(&self) -> Vec<ParamSpec> {
        self.sorted_param_nodes()
            .into_iter()
            .filter_map(|(id, name)| {
                self.get_node(id).ok().map(|node| ParamSpec {
                    name: name.to_string(),
                    shape: node.value_expected_shape().to_vec(),
                })
            })
            .collect()
    }

    /// 保存所有参数到二进制文件
    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let file = File::create(path.as_ref()).map_err(io_err("无法创建参数文件"))?;
        let mut writer = BufWriter::new(file);
        let params = self.sorted_param_nodes();

        writer
            .write_all(Self::PARAMS_MAGIC)
            .map_err(io_err("写入魔数失败"))?;
        writer
            .write_all(&Self::PARAMS_VERSION.to_le_bytes())
            .map_err(io_err("写入版本失败"))?;
        writer
            .write_all(&(params.len() as u32).to_le_bytes())
            .map_err(io_err("写入参数数量失败"))?;

        for (id, name) in params {
            let value = self.get_node(id)?.value().ok_or_else(|| {
                GraphError::Serialization(format!("参数 {name} 没有值"))
            })?;
            let shape = value.shape();

            let name_bytes = name.as_bytes();
            writer
                .write_all(&(name_bytes.len() as u32).to_le_bytes())
                .map_err(io_err("写入名称长度失败"))?;
            writer.write_all(name_bytes).map_err(io_err("写入名称失败"))?;

            writer
                .write_all(&(shape.len() as u32).to_le_bytes())
                .map_err(io_err("写入形状维度失败"))?;
            for &dim in shape {
                writer
                    .write_all(&(dim as u32).to_le_bytes())
                    .map_err(io_err("写入形状失败"))?;
            }

            let bytes: Vec<u8> = value
                .data_as_slice()
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect();
            writer.write_all(&bytes).map_err(io_err("写入数据失败"))?;
        }

        writer.flush().map_err(io_err("刷新缓冲区失败"))?;
        Ok(())
    }

    /// 从二进制文件加载参数。
    ///
    /// 严格模式：图中每个参数都必须在文件里出现且形状一致，文件里也不能有图中不存在的参数。
    /// 所有记录校验通过后才统一赋值，失败时图中参数保持不变。
    pub fn load_params<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GraphError> {
        let file = File::open(path.as_ref()).map_err(io_err("无法打开参数文件"))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(io_err("读取魔数失败"))?;
        if &magic != Self::PARAMS_MAGIC {
            return Err(GraphError::Serialization(
                "无效的参数文件：魔数不符，请确认文件由 save_params() 保存".to_string(),
            ));
        }

        let version = read_u32(&mut reader, "读取版本失败")?;
        if version != Self::PARAMS_VERSION {
            return Err(GraphError::Serialization(format!(
                "不支持的参数文件版本: {version}"
            )));
        }

        let param_count = read_u32(&mut reader, "读取参数数量失败")?;
        let name_to_id: HashMap<String, NodeId> = self
            .sorted_param_nodes()
            .into_iter()
            .map(|(id, name)| (name.to_string(), id))
            .collect();

        let mut loaded: HashMap<NodeId, Tensor> = HashMap::with_capacity(name_to_id.len());
        for _ in 0..param_count {
            let name_len = read_u32(&mut reader, "读取名称长度失败")? as usize;
            let mut name_bytes = vec![0u8; name_len];
            reader
                .read_exact(&mut name_bytes)
                .map_err(io_err("读取名称失败"))?;
            let name = String::from_utf8(name_bytes)
                .map_err(|e| GraphError::Serialization(format!("名称编码无效: {e}")))?;

            let shape_dims = read_u32(&mut reader, "读取形状维度失败")? as usize;
            let mut shape = Vec::with_capacity(shape_dims);
            for _ in 0..shape_dims {
                shape.push(read_u32(&mut reader, "读取形状失败")? as usize);
            }

            let data_len: usize = shape.iter().product();
            let mut bytes = vec![0u8; data_len * 4];
            reader
                .read_exact(&mut bytes)
                .map_err(io_err("读取数据失败"))?;
            let data: Vec<f32> = bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();

            let &node_id = name_to_id.get(&name).ok_or_else(|| {
                GraphError::Serialization(format!("参数文件中的参数 {name} 在图中不存在"))
            })?;
            let expected = self.get_node_value_expected_shape(node_id)?;
            if expected != shape.as_slice() {
                return Err(GraphError::ShapeMismatch {
                    expected: expected.to_vec(),
                    got: shape,
                    message: format!("参数 {name} 的形状与图中不一致"),
                });
            }
            loaded.insert(node_id, Tensor::from_vec(data, &shape));
        }

        let mut missing: Vec<&str> = name_to_id
            .iter()
            .filter(|(_, id)| !loaded.contains_key(id))
            .map(|(name, _)| name.as_str())
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(GraphError::MissingParameter(missing.join(", ")));
        }

        for (node_id, tensor) in loaded {
            self.set_node_value(node_id, Some(&tensor))?;
        }
        Ok(())
    }
}
