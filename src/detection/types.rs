/// 检测结果数据结构

/// 检测框 (整数像素坐标, 左上 + 右下)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 浮点坐标向零截断为整数像素
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = xyxy;
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// 单个检测目标 (框 + 类别编号 + 置信度)
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BBox, class_id: usize, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_xyxy_truncates_toward_zero() {
        let bbox = BBox::from_xyxy([10.9, 10.2, 49.99, 50.5]);
        assert_eq!(bbox, BBox::new(10, 10, 49, 50));
        assert_eq!(bbox.width(), 39);
        assert_eq!(bbox.height(), 40);
    }
}
