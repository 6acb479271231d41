//! Node metadata: shape, dtype, memory-format and constant-value hints.

use serde::{Deserialize, Serialize};

/// Element type of a tensor value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    F16,
    F32,
    F64,
    I32,
    I64,
    Bool,
}

/// Physical memory layout of a tensor value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryFormat {
    /// Row-major NCHW (the default).
    Contiguous,
    /// NHWC.
    ChannelsLast,
    /// NDHWC, for 5-D tensors.
    ChannelsLast3d,
    /// Keep whatever layout the input has.
    Preserve,
}

/// Payload of a parameter/buffer/constant placeholder.
///
/// `Opaque` marks a value that exists in the exported program but whose
/// elements cannot be concretized at encode time (shape-dependent or
/// otherwise data-dependent scalars).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    Dense { shape: Vec<i64>, data: Vec<f64> },
    Opaque,
}

impl ConstantValue {
    pub fn scalar(v: f64) -> Self {
        ConstantValue::Dense {
            shape: vec![],
            data: vec![v],
        }
    }

    /// Number of elements, when known.
    pub fn numel(&self) -> Option<usize> {
        match self {
            ConstantValue::Dense { data, .. } => Some(data.len()),
            ConstantValue::Opaque => None,
        }
    }

    /// The first element, when the payload is concrete and non-empty.
    pub fn first_element(&self) -> Option<f64> {
        match self {
            ConstantValue::Dense { data, .. } => data.first().copied(),
            ConstantValue::Opaque => None,
        }
    }
}

/// The metadata bag attached to a node.
///
/// Every key is optional; encoders that require a key fail (or fall back)
/// explicitly rather than assuming presence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub shape: Option<Vec<i64>>,
    pub dtype: Option<DType>,
    pub memory_format: Option<MemoryFormat>,
    /// Set on nodes whose stored axis orders are expressed in channels-last
    /// terms and need remapping before use.
    #[serde(default)]
    pub channels_last_node: bool,
    /// Constant payload for parameter/buffer/constant placeholders.
    pub value: Option<ConstantValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Metadata::default()
    }

    pub fn with_shape(mut self, shape: Vec<i64>) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_memory_format(mut self, format: MemoryFormat) -> Self {
        self.memory_format = Some(format);
        self
    }

    pub fn with_channels_last_node(mut self) -> Self {
        self.channels_last_node = true;
        self
    }

    pub fn with_value(mut self, value: ConstantValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn rank(&self) -> Option<usize> {
        self.shape.as_ref().map(|s| s.len())
    }
}
