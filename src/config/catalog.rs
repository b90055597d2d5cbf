//! 杂草类别表与配色表
//!
//! 启动时构造一次,之后只读,显式传给标注器

use phf::phf_map;
use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// 帧缓冲区中的三个通道字节,顺序与归一化后的帧一致 (B, G, R)
pub type Bgr = [u8; 3];

/// 配色表中找不到类别时使用的颜色 (红色)
pub const FALLBACK_COLOR: Bgr = [0, 0, 255];

/// 杂草检测模型的类别 (顺序即模型输出的类别编号)
pub const WEED_CLASSES: [&str; 16] = [
    "Broadleaf Weed",
    "Carpet Weed",
    "Crabgrass Weed",
    "Eclipta Weed",
    "Goosegrass Weed",
    "Morningglory Weed",
    "Nutsedge Weed",
    "Palmer Amaranth Weed",
    "Prickly Sida Weed",
    "Purslane Weed",
    "Ragweed Weed",
    "Sicklepod Weed",
    "SpottedSpurge Weed",
    "Spurred Anoda Weed",
    "Swinecress Weed",
    "Waterhemp Weed",
];

static WEED_COLORS: phf::Map<&'static str, Bgr> = phf_map! {
    "Broadleaf Weed" => [0, 0, 255],       // 红色
    "Carpet Weed" => [0, 255, 0],          // 绿色
    "Crabgrass Weed" => [255, 0, 0],       // 蓝色
    "Eclipta Weed" => [255, 255, 0],       // 青色
    "Goosegrass Weed" => [0, 255, 255],    // 黄色
    "Morningglory Weed" => [255, 0, 255],  // 品红
    "Nutsedge Weed" => [255, 255, 255],    // 白色
    "Palmer Amaranth Weed" => [128, 0, 128], // 紫色
    "Prickly Sida Weed" => [128, 128, 0],  // 橄榄
    "Purslane Weed" => [0, 128, 128],      // 蓝绿
    "Ragweed Weed" => [0, 64, 128],        // 藏青
    "Sicklepod Weed" => [128, 64, 0],      // 栗色
    "SpottedSpurge Weed" => [64, 128, 0],  // 黄绿
    "Spurred Anoda Weed" => [128, 0, 64],  // 紫红
    "Swinecress Weed" => [0, 128, 64],     // 水绿
    "Waterhemp Weed" => [255, 165, 0],     // 橙色
};

/// 类别表 + 配色表
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    names: Vec<String>,
    colors: HashMap<String, Bgr>,
    fallback: Bgr,
}

impl Catalog {
    pub fn new<N, C>(names: N, colors: C) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        C: IntoIterator<Item = (String, Bgr)>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            colors: colors.into_iter().collect(),
            fallback: FALLBACK_COLOR,
        }
    }

    /// 默认的 16 类杂草配置
    pub fn weeds() -> Self {
        Self::new(
            WEED_CLASSES,
            WEED_COLORS
                .entries()
                .map(|(name, color)| (name.to_string(), *color)),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按类别编号取名称,越界即失败 (不降级为 "unknown")
    pub fn class_name(&self, class_id: usize) -> Result<&str> {
        self.names
            .get(class_id)
            .map(String::as_str)
            .ok_or(PipelineError::UnknownClass {
                class_id,
                catalog_len: self.names.len(),
            })
    }

    pub fn color(&self, class_name: &str) -> Bgr {
        self.colors.get(class_name).copied().unwrap_or(self.fallback)
    }
}
